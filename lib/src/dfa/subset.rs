use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::dfa::{Dfa, DfaBuilder, StateId};
use crate::nfa::{Nfa, StateSet};
use crate::rangeset::{RangeSet, Symbol};

/// The result of [`subset_construction`].
pub struct SubsetResult<T, A> {
    /// The DFA equivalent to the NFA.
    pub dfa: Dfa<T, A>,
    /// NFA state set that corresponds to each DFA state, indexed by
    /// DFA state.
    dfa_to_nfa: Vec<StateSet>,
    nfa_to_dfa: FxHashMap<StateSet, StateId>,
}

impl<T, A> SubsetResult<T, A> {
    /// Returns the set of NFA states that corresponds to a DFA state.
    pub fn nfa_states(&self, dfa_state: StateId) -> &StateSet {
        &self.dfa_to_nfa[dfa_state]
    }

    /// Returns the DFA state that corresponds to a set of NFA states, if the
    /// set was ever reached during the construction.
    pub fn dfa_state(&self, nfa_states: &StateSet) -> Option<StateId> {
        self.nfa_to_dfa.get(nfa_states).copied()
    }
}

/// Converts an NFA into an equivalent DFA.
///
/// Each DFA state stands for the epsilon closure of a set of NFA states, and
/// its accept code is the greatest accept code in that set. The empty set,
/// if reached, becomes the DFA's dead state.
///
/// State sets are explored in the order they are discovered, starting with
/// the closure of the NFA's start state, which becomes DFA state 0. A
/// transition whose destination hasn't been explored yet is recorded as
/// pending, and it is added once the destination gets its DFA state.
pub fn subset_construction<T, A>(nfa: &Nfa<T, A>) -> SubsetResult<T, A>
where
    T: Symbol,
    A: Ord + Clone,
{
    let mut builder = DfaBuilder::new();
    let mut dfa_to_nfa: Vec<StateSet> = Vec::new();
    let mut nfa_to_dfa: FxHashMap<StateSet, StateId> = FxHashMap::default();
    let mut pending: FxHashMap<StateSet, Vec<(StateId, RangeSet<T>)>> =
        FxHashMap::default();
    let mut dead = None;

    let start_set = nfa.epsilon_closure(&StateSet::from([nfa.start_state()]));
    let mut worklist = VecDeque::from([start_set]);

    while let Some(nfa_states) = worklist.pop_front() {
        // The same set may have been queued more than once before it was
        // explored.
        if nfa_to_dfa.contains_key(&nfa_states) {
            continue;
        }

        let accept_code = nfa.deterministic_accept_code(&nfa_states).cloned();
        let state = builder.new_state(accept_code);

        nfa_to_dfa.insert(nfa_states.clone(), state);
        dfa_to_nfa.push(nfa_states.clone());

        for (from, set) in pending.remove(&nfa_states).unwrap_or_default() {
            builder.add_transition(from, set, state);
        }

        if nfa_states.is_empty() {
            dead = Some(state);
            continue;
        }

        for (set, destination) in nfa.deterministic_transitions(&nfa_states) {
            match nfa_to_dfa.get(&destination) {
                Some(to) => builder.add_transition(state, set, *to),
                None => {
                    pending
                        .entry(destination.clone())
                        .or_default()
                        .push((state, set));
                    worklist.push_back(destination);
                }
            }
        }
    }

    debug_assert!(pending.is_empty());

    SubsetResult { dfa: builder.build(0, dead), dfa_to_nfa, nfa_to_dfa }
}
