#[cfg(feature = "logging")]
use log::*;

use crate::dfa::{Dfa, DfaBuilder, StateId};
use crate::rangeset::{RangeSet, Splitter, Symbol};

/// A partition of the DFA states. Groups are listed in the order of their
/// smallest member, and members are sorted, so two partitions are equal if
/// and only if they group the states in the same way.
type Partition = Vec<Vec<StateId>>;

impl<T: Symbol, A: Clone + Eq> Dfa<T, A> {
    /// Returns the minimal DFA that is equivalent to this one.
    ///
    /// States are grouped by partition refinement: initially, states are
    /// grouped by their accept codes, then groups are split repeatedly until
    /// no input distinguishes two states in the same group. If every group
    /// ends up with a single state the DFA is already minimal and it's
    /// returned as is.
    pub fn minimize(self) -> Self {
        let (partition, rounds) = self.equivalence_classes();

        #[cfg(feature = "logging")]
        debug!(
            "DFA minimization: {} states, {} groups after {} rounds",
            self.state_count(),
            partition.len(),
            rounds
        );

        #[cfg(not(feature = "logging"))]
        let _ = rounds;

        if partition.len() == self.state_count() {
            return self;
        }

        self.merge_groups(&partition)
    }

    /// Computes the coarsest partition of states where the states in each
    /// group can't be distinguished by any input. Also returns the number of
    /// refinement rounds it took.
    fn equivalence_classes(&self) -> (Partition, usize) {
        let mut partition = group_states(self.state_count(), |a, b| {
            self.accept_code(a) != self.accept_code(b)
        });
        let mut rounds = 0;

        loop {
            rounds += 1;
            let group_of = group_index(&partition, self.state_count());
            let refined = group_states(self.state_count(), |a, b| {
                group_of[a] != group_of[b]
                    || self.distinguishable_by_successors(a, b, &group_of)
            });
            if refined == partition {
                return (partition, rounds);
            }
            partition = refined;
        }
    }

    /// Returns true if some input takes `a` and `b` into states that belong
    /// to different groups.
    fn distinguishable_by_successors(
        &self,
        a: StateId,
        b: StateId,
        group_of: &[usize],
    ) -> bool {
        let mut splitter = Splitter::new();
        splitter.split_all(self.transitions(a).iter().map(|(set, _)| set));
        splitter.split_all(self.transitions(b).iter().map(|(set, _)| set));

        splitter.pieces().iter().any(|piece| {
            self.successor_group(a, piece, group_of)
                != self.successor_group(b, piece, group_of)
        })
    }

    /// Returns the group of the state reached from `state` with the symbols
    /// in `piece`. The piece must be either fully inside or fully outside of
    /// every transition leaving `state`. A missing transition is equivalent
    /// to a transition to the dead state.
    fn successor_group(
        &self,
        state: StateId,
        piece: &RangeSet<T>,
        group_of: &[usize],
    ) -> Option<usize> {
        let successors = self.possible_next_states(state, piece);
        assert!(
            successors.len() <= 1,
            "multiple transitions from state {} accept the same symbols",
            state
        );
        successors.first().copied().or(self.dead).map(|s| group_of[s])
    }

    /// Builds a DFA with one state per group in `partition`.
    fn merge_groups(&self, partition: &Partition) -> Self {
        let group_of = group_index(partition, self.state_count());
        let dead = self.dead.map(|s| group_of[s]);
        let mut builder = DfaBuilder::new();

        for group in partition {
            builder.new_state(self.accept_code(group[0]).cloned());
        }

        for (new_state, group) in partition.iter().enumerate() {
            if Some(new_state) == dead {
                continue;
            }

            // Every member of the group behaves the same, the first one is
            // as good as any other.
            let mut by_destination: Vec<(usize, RangeSet<T>)> = Vec::new();
            for (set, target) in self.transitions(group[0]) {
                let target_group = group_of[*target];
                match by_destination.iter_mut().find(|(g, _)| *g == target_group)
                {
                    Some((_, existing)) => *existing = existing.union(set),
                    None => by_destination.push((target_group, set.clone())),
                }
            }

            for (target_group, set) in by_destination {
                builder.add_transition(new_state, set, target_group);
            }
        }

        builder.build(group_of[self.start], dead)
    }
}

/// Groups the states `0..count`, placing each state in the first group whose
/// first member is not distinguishable from it, or in a new group.
fn group_states<F>(count: usize, distinguishable: F) -> Partition
where
    F: Fn(StateId, StateId) -> bool,
{
    let mut partition: Partition = Vec::new();
    for state in 0..count {
        match partition
            .iter_mut()
            .find(|group| !distinguishable(group[0], state))
        {
            Some(group) => group.push(state),
            None => partition.push(vec![state]),
        }
    }
    partition
}

/// Maps every state to the index of its group in `partition`.
fn group_index(partition: &Partition, count: usize) -> Vec<usize> {
    let mut group_of = vec![0; count];
    for (i, group) in partition.iter().enumerate() {
        for state in group {
            group_of[*state] = i;
        }
    }
    group_of
}
