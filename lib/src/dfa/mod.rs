/*! Deterministic finite automata.

A [`Dfa`] is produced from an [`Nfa`] by [`subset::subset_construction`],
and can be reduced to its minimal form with [`Dfa::minimize`]. Transitions
are labeled with [`RangeSet`]s, and the sets leaving any single state are
pairwise disjoint, so at most one transition can be taken for any symbol.

The automaton may have a dead state: a non-accepting state without outgoing
transitions, reached when no continuation of the input could ever match.
Matching stops as soon as the dead state is reached.

[`Nfa`]: crate::nfa::Nfa
*/

use serde::{Deserialize, Serialize};

use crate::rangeset::{RangeSet, Symbol};

pub use subset::{subset_construction, SubsetResult};

mod minimize;
mod subset;

#[cfg(test)]
mod tests;

/// Identifies a state in a [`Dfa`]. States are numbered densely, starting at
/// zero.
pub type StateId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize, A: Serialize",
    deserialize = "T: Ord + Deserialize<'de>, A: Deserialize<'de>"
))]
struct DfaState<T, A> {
    transitions: Vec<(RangeSet<T>, StateId)>,
    accept_code: Option<A>,
}

/// A deterministic finite automaton with accept codes.
///
/// Deserialization doesn't check the structure of the DFA, use
/// [`Dfa::is_well_formed`] before matching with a DFA that comes from an
/// untrusted source. [`Lexer`] does this for you.
///
/// [`Lexer`]: crate::lexer::Lexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize, A: Serialize",
    deserialize = "T: Ord + Deserialize<'de>, A: Deserialize<'de>"
))]
pub struct Dfa<T, A> {
    start: StateId,
    dead: Option<StateId>,
    states: Vec<DfaState<T, A>>,
}

impl<T: Symbol, A> Dfa<T, A> {
    /// Number of states in the DFA.
    #[inline]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// The start state.
    #[inline]
    pub fn start_state(&self) -> StateId {
        self.start
    }

    /// Returns true if every state id in the DFA refers to an existing
    /// state and the transitions leaving each state are pairwise disjoint.
    ///
    /// DFAs created by [`DfaBuilder`] always satisfy this.
    pub fn is_well_formed(&self) -> bool {
        let valid = |state: StateId| state < self.states.len();

        valid(self.start)
            && self.dead.map_or(true, valid)
            && self.states.iter().all(|state| {
                state.transitions.iter().enumerate().all(|(i, (set, target))| {
                    valid(*target)
                        && state.transitions[i + 1..]
                            .iter()
                            .all(|(other, _)| set.is_disjoint(other))
                })
            })
    }

    /// The dead state, if the DFA has one.
    #[inline]
    pub fn dead_state(&self) -> Option<StateId> {
        self.dead
    }

    /// Returns the accept code for `state`, if any.
    #[inline]
    pub fn accept_code(&self, state: StateId) -> Option<&A> {
        self.states[state].accept_code.as_ref()
    }

    /// Returns the transitions leaving `state`.
    #[inline]
    pub fn transitions(&self, state: StateId) -> &[(RangeSet<T>, StateId)] {
        self.states[state].transitions.as_slice()
    }

    /// Returns the state reached from `state` with `symbol`, or `None` if
    /// no transition accepts `symbol`.
    ///
    /// # Panics
    ///
    /// If more than one transition accepts `symbol`. That can't happen with
    /// a DFA built by this crate.
    pub fn next_state(&self, state: StateId, symbol: T) -> Option<StateId> {
        let mut matching = self.states[state]
            .transitions
            .iter()
            .filter(|(set, _)| set.contains(symbol))
            .map(|(_, target)| *target);

        let next = matching.next();

        assert!(
            matching.next().is_none(),
            "multiple transitions from state {} accept {:?}",
            state,
            symbol
        );

        next
    }

    /// Returns the states reachable from `state` with some symbol in `set`.
    pub fn possible_next_states(
        &self,
        state: StateId,
        set: &RangeSet<T>,
    ) -> Vec<StateId> {
        self.states[state]
            .transitions
            .iter()
            .filter(|(s, _)| !s.is_disjoint(set))
            .map(|(_, target)| *target)
            .collect()
    }

    /// Finds the longest prefix of `input` that takes the DFA from its start
    /// state into an accepting state.
    ///
    /// Returns the length of the prefix together with the accept code of the
    /// state where it ends, or `None` if no non-empty prefix is accepted.
    pub fn longest_match(&self, input: &[T]) -> Option<(usize, &A)> {
        let mut state = self.start;
        let mut longest = None;

        for (pos, symbol) in input.iter().enumerate() {
            match self.next_state(state, *symbol) {
                Some(next) if Some(next) != self.dead => state = next,
                _ => break,
            }
            if let Some(code) = self.accept_code(state) {
                longest = Some((pos + 1, code));
            }
        }

        longest
    }

    /// Returns a DFA with the same structure but where every accept code has
    /// been transformed with `f`.
    pub fn map_accept_codes<B, F>(self, mut f: F) -> Dfa<T, B>
    where
        F: FnMut(A) -> B,
    {
        Dfa {
            start: self.start,
            dead: self.dead,
            states: self
                .states
                .into_iter()
                .map(|state| DfaState {
                    transitions: state.transitions,
                    accept_code: state.accept_code.map(&mut f),
                })
                .collect(),
        }
    }
}

/// Creates the states and transitions of a [`Dfa`].
pub struct DfaBuilder<T, A> {
    states: Vec<DfaState<T, A>>,
}

impl<T: Symbol, A> DfaBuilder<T, A> {
    /// Creates a new, empty builder.
    pub fn new() -> Self {
        Self { states: Vec::new() }
    }

    /// Allocates a new state with the given accept code.
    pub fn new_state(&mut self, accept_code: Option<A>) -> StateId {
        self.states.push(DfaState { transitions: Vec::new(), accept_code });
        self.states.len() - 1
    }

    /// Adds a transition from `from` to `to` labeled with `set`.
    ///
    /// # Panics
    ///
    /// If `set` overlaps with some other transition leaving `from`.
    pub fn add_transition(&mut self, from: StateId, set: RangeSet<T>, to: StateId) {
        if set.is_empty() {
            return;
        }
        let transitions = &mut self.states[from].transitions;
        assert!(
            transitions.iter().all(|(existing, _)| existing.is_disjoint(&set)),
            "overlapping transitions leaving state {}",
            from
        );
        transitions.push((set, to));
    }

    /// Consumes the builder and returns the DFA.
    pub fn build(self, start: StateId, dead: Option<StateId>) -> Dfa<T, A> {
        Dfa { start, dead, states: self.states }
    }
}

impl<T: Symbol, A> Default for DfaBuilder<T, A> {
    fn default() -> Self {
        Self::new()
    }
}
