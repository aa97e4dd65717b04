/*! Non-deterministic finite automata built with Thompson's construction.

Rules are first described as [`Fragment`]s, a small algebra of automaton
shapes (sequence, alternative, optional/repeat, etc). An [`NfaBuilder`]
turns each fragment into states and transitions, where every fragment ends up
with a single entry state and a single exit state. Finally,
[`Nfa::from_rules`] joins the fragments for all rules under a common root
state, labeling each rule's exit state with the rule's accept code.

Transitions are either labeled with a [`RangeSet`] or are epsilon transitions
(transitions that don't consume any input). The resulting [`Nfa`] is
immutable and can be shared between threads. Epsilon closures are memoized
internally, see [`Nfa::epsilon_closure`].
*/

use std::collections::{BTreeSet, VecDeque};
use std::ops::Range;
use std::sync::RwLock;

use bitvec::prelude::*;
use rustc_hash::FxHashMap;

use crate::rangeset::{RangeSet, Splitter, Symbol};


/// Identifies a state in an [`Nfa`]. States are numbered densely, starting
/// at zero.
pub type StateId = usize;

/// A set of NFA states.
pub type StateSet = BTreeSet<StateId>;

/// Describes the shape of an automaton before it is turned into states and
/// transitions.
///
/// The constructors [`Fragment::sequence`], [`Fragment::alternative`] and
/// [`Fragment::opt_rep`] normalize the trivial cases, so that building them
/// never produces useless states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment<T> {
    /// Matches nothing at all, not even the empty string.
    Nothing,
    /// Matches the empty string only.
    EmptyString,
    /// Matches exactly one symbol from the set.
    CharFromSet(RangeSet<T>),
    /// Matches each fragment one after the other.
    Sequence(Vec<Fragment<T>>),
    /// Matches any of the fragments.
    Alternative(Vec<Fragment<T>>),
    /// Matches the body optionally, repeatedly, or both.
    OptRep { body: Box<Fragment<T>>, optional: bool, repeating: bool },
}

impl<T: Symbol> Fragment<T> {
    /// Creates a fragment that matches each of `items` in order. With no
    /// items it matches the empty string.
    pub fn sequence(mut items: Vec<Fragment<T>>) -> Self {
        match items.len() {
            0 => Self::EmptyString,
            1 => items.remove(0),
            _ => Self::Sequence(items),
        }
    }

    /// Creates a fragment that matches any of `items`. With no items it
    /// matches nothing.
    pub fn alternative(mut items: Vec<Fragment<T>>) -> Self {
        match items.len() {
            0 => Self::Nothing,
            1 => items.remove(0),
            _ => Self::Alternative(items),
        }
    }

    /// Creates a fragment that matches `body` zero or one times (`optional`),
    /// one or more times (`repeating`), or zero or more times (both). When
    /// both flags are false it returns `body` as is.
    pub fn opt_rep(body: Fragment<T>, optional: bool, repeating: bool) -> Self {
        if !optional && !repeating {
            body
        } else {
            Self::OptRep { body: Box::new(body), optional, repeating }
        }
    }

    /// Adds the states and transitions for this fragment to `builder`.
    /// Returns the fragment's entry and exit states.
    pub fn build<A>(&self, builder: &mut NfaBuilder<T, A>) -> (StateId, StateId) {
        match self {
            Fragment::Nothing => (builder.new_state(), builder.new_state()),
            Fragment::EmptyString => {
                let start = builder.new_state();
                let accept = builder.new_state();
                builder.add_epsilon(start, accept);
                (start, accept)
            }
            Fragment::CharFromSet(set) => {
                let start = builder.new_state();
                let accept = builder.new_state();
                builder.add_transition(start, set.clone(), accept);
                (start, accept)
            }
            Fragment::Sequence(items) => {
                let start = builder.new_state();
                let mut last = start;
                for item in items {
                    let (item_start, item_accept) = item.build(builder);
                    builder.add_epsilon(last, item_start);
                    last = item_accept;
                }
                let accept = builder.new_state();
                builder.add_epsilon(last, accept);
                (start, accept)
            }
            Fragment::Alternative(items) => {
                let start = builder.new_state();
                let accept = builder.new_state();
                for item in items {
                    let (item_start, item_accept) = item.build(builder);
                    builder.add_epsilon(start, item_start);
                    builder.add_epsilon(item_accept, accept);
                }
                (start, accept)
            }
            Fragment::OptRep { body, optional, repeating } => {
                let start = builder.new_state();
                let (body_start, body_accept) = body.build(builder);
                let accept = builder.new_state();
                builder.add_epsilon(start, body_start);
                builder.add_epsilon(body_accept, accept);
                if *optional {
                    builder.add_epsilon(start, accept);
                }
                if *repeating {
                    builder.add_epsilon(accept, start);
                }
                (start, accept)
            }
        }
    }
}

impl Fragment<char> {
    /// Creates a fragment that matches the string `s` literally.
    pub fn literal(s: &str) -> Self {
        Self::sequence(
            s.chars()
                .map(|c| Fragment::CharFromSet(RangeSet::only(c)))
                .collect(),
        )
    }
}

/// A transition between NFA states. A transition without a set is an
/// epsilon transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<T> {
    pub set: Option<RangeSet<T>>,
    pub target: StateId,
}

/// Allocates NFA states and records their transitions and accept codes.
pub struct NfaBuilder<T, A> {
    transitions: Vec<Vec<Transition<T>>>,
    accept_codes: Vec<Option<A>>,
}

impl<T: Symbol, A> NfaBuilder<T, A> {
    /// Creates a new, empty builder.
    pub fn new() -> Self {
        Self { transitions: Vec::new(), accept_codes: Vec::new() }
    }

    /// Allocates a new state and returns its identifier.
    pub fn new_state(&mut self) -> StateId {
        self.transitions.push(Vec::new());
        self.accept_codes.push(None);
        self.transitions.len() - 1
    }

    /// Adds a transition from `from` to `to` labeled with `set`. Transitions
    /// with an empty set are never taken, so they are not recorded.
    pub fn add_transition(&mut self, from: StateId, set: RangeSet<T>, to: StateId) {
        if !set.is_empty() {
            self.transitions[from].push(Transition { set: Some(set), target: to });
        }
    }

    /// Adds an epsilon transition from `from` to `to`.
    pub fn add_epsilon(&mut self, from: StateId, to: StateId) {
        self.transitions[from].push(Transition { set: None, target: to });
    }

    /// Labels `state` with an accept code.
    pub fn set_accept_code(&mut self, state: StateId, code: A) {
        self.accept_codes[state] = Some(code);
    }

    /// Consumes the builder and returns an NFA that starts at `start`.
    pub fn build(self, start: StateId) -> Nfa<T, A> {
        Nfa {
            start,
            transitions: self.transitions,
            accept_codes: self.accept_codes,
            closure_cache: RwLock::new(FxHashMap::default()),
        }
    }
}

impl<T: Symbol, A> Default for NfaBuilder<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

/// A non-deterministic finite automaton with accept codes.
pub struct Nfa<T, A> {
    start: StateId,
    transitions: Vec<Vec<Transition<T>>>,
    accept_codes: Vec<Option<A>>,
    /// Memoized epsilon closures, keyed by the exact set that was requested.
    closure_cache: RwLock<FxHashMap<StateSet, StateSet>>,
}

impl<T: Symbol, A> Nfa<T, A> {
    /// Builds an NFA that recognizes all the given rules.
    ///
    /// A root state is connected through epsilon transitions to the entry
    /// state of every rule, and the exit state of each rule is labeled with
    /// the rule's accept code.
    pub fn from_rules<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = (Fragment<T>, A)>,
    {
        let mut builder = NfaBuilder::new();
        let root = builder.new_state();
        for (fragment, code) in rules {
            let (start, accept) = fragment.build(&mut builder);
            builder.add_epsilon(root, start);
            builder.set_accept_code(accept, code);
        }
        builder.build(root)
    }

    /// The start state.
    #[inline]
    pub fn start_state(&self) -> StateId {
        self.start
    }

    /// Number of states in the NFA.
    #[inline]
    pub fn state_count(&self) -> usize {
        self.transitions.len()
    }

    /// Returns every state in the NFA.
    pub fn all_states(&self) -> Range<StateId> {
        0..self.transitions.len()
    }

    /// Returns the transitions that leave `state`.
    #[inline]
    pub fn transitions(&self, state: StateId) -> &[Transition<T>] {
        self.transitions[state].as_slice()
    }

    /// Returns the accept code for `state`, if any.
    #[inline]
    pub fn accept_code(&self, state: StateId) -> Option<&A> {
        self.accept_codes[state].as_ref()
    }

    /// Returns the states that can be reached from the start state by
    /// following any kind of transition.
    pub fn reachable_states(&self) -> StateSet {
        let mut visited = bitvec![0; self.state_count()];
        let mut queue = VecDeque::from([self.start]);

        visited.set(self.start, true);

        while let Some(state) = queue.pop_front() {
            for transition in &self.transitions[state] {
                if !visited[transition.target] {
                    visited.set(transition.target, true);
                    queue.push_back(transition.target);
                }
            }
        }

        visited.iter_ones().collect()
    }

    /// Returns the states that can be reached from the states in `set`
    /// through epsilon transitions only. The result always includes `set`
    /// itself.
    ///
    /// Results are memoized. Concurrent callers asking for the same set may
    /// compute it more than once, but the first result to be published is
    /// the one returned to every caller afterwards.
    pub fn epsilon_closure(&self, set: &StateSet) -> StateSet {
        if let Some(closure) = self.cached_closure(set) {
            return closure;
        }

        let closure = self.compute_epsilon_closure(set);

        match self.closure_cache.write() {
            Ok(mut cache) => {
                cache.entry(set.clone()).or_insert(closure).clone()
            }
            // The cache is only a shortcut, a poisoned lock simply means that
            // the result is not memoized.
            Err(_) => closure,
        }
    }

    fn cached_closure(&self, set: &StateSet) -> Option<StateSet> {
        self.closure_cache.read().ok()?.get(set).cloned()
    }

    fn compute_epsilon_closure(&self, set: &StateSet) -> StateSet {
        let mut visited = bitvec![0; self.state_count()];
        let mut stack: Vec<StateId> = set.iter().copied().collect();

        for state in set {
            visited.set(*state, true);
        }

        while let Some(state) = stack.pop() {
            for transition in &self.transitions[state] {
                if transition.set.is_none() && !visited[transition.target] {
                    visited.set(transition.target, true);
                    stack.push(transition.target);
                }
            }
        }

        visited.iter_ones().collect()
    }

    /// Computes the deterministic transitions leaving the state set `set`.
    ///
    /// The symbol domain is partitioned into pieces that are either fully
    /// inside or fully outside of each transition leaving `set`. For each
    /// piece, the destination is the epsilon closure of the targets of all
    /// transitions that accept the piece. Pieces that lead to the same
    /// destination are merged, so the returned sets are pairwise disjoint,
    /// cover the whole domain, and have distinct destinations. Symbols that
    /// lead nowhere have the empty set as destination.
    pub fn deterministic_transitions(
        &self,
        set: &StateSet,
    ) -> Vec<(RangeSet<T>, StateSet)> {
        let outgoing: Vec<(&RangeSet<T>, StateId)> = set
            .iter()
            .flat_map(|state| self.transitions[*state].iter())
            .filter_map(|t| t.set.as_ref().map(|s| (s, t.target)))
            .collect();

        let mut splitter = Splitter::new();
        splitter.split_all(outgoing.iter().map(|(s, _)| *s));

        let mut result: Vec<(RangeSet<T>, StateSet)> = Vec::new();

        for piece in splitter.into_pieces() {
            let targets: StateSet = outgoing
                .iter()
                .filter(|(s, _)| !s.is_disjoint(&piece))
                .map(|(_, target)| *target)
                .collect();

            let destination = self.epsilon_closure(&targets);

            match result.iter_mut().find(|(_, dest)| *dest == destination) {
                Some((existing, _)) => *existing = existing.union(&piece),
                None => result.push((piece, destination)),
            }
        }

        result
    }
}

impl<T: Symbol, A: Ord> Nfa<T, A> {
    /// Returns the greatest accept code among the states in `set`, or `None`
    /// if no state in `set` accepts.
    pub fn deterministic_accept_code(&self, set: &StateSet) -> Option<&A> {
        set.iter().filter_map(|state| self.accept_code(*state)).max()
    }
}
