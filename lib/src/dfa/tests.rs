use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::dfa::{subset_construction, Dfa, DfaBuilder, DfaState};
use crate::nfa::{Fragment, Nfa, StateSet};
use crate::rangeset::RangeSet;

fn literals<A: Ord + Clone>(rules: &[(&str, A)]) -> Dfa<char, A> {
    let nfa = Nfa::from_rules(
        rules.iter().map(|(s, code)| (Fragment::literal(s), code.clone())),
    );
    subset_construction(&nfa).dfa
}

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

fn assert_deterministic<A>(dfa: &Dfa<char, A>) {
    for state in 0..dfa.state_count() {
        let transitions = dfa.transitions(state);
        for (i, (a, _)) in transitions.iter().enumerate() {
            for (b, _) in &transitions[i + 1..] {
                assert!(a.is_disjoint(b), "overlap in state {}", state);
            }
        }
    }
}

#[test]
fn literal_matching() {
    let dfa = literals(&[("dog", 1), ("pig", 2), ("horse", 3)]);

    assert_deterministic(&dfa);
    assert_eq!(dfa.longest_match(&chars("dog")), Some((3, &1)));
    assert_eq!(dfa.longest_match(&chars("horse")), Some((5, &3)));
    assert_eq!(dfa.longest_match(&chars("doggy")), Some((3, &1)));
    assert_eq!(dfa.longest_match(&chars("banana")), None);
    assert_eq!(dfa.longest_match(&chars("do")), None);
    assert_eq!(dfa.longest_match(&[]), None);
}

#[test]
fn longest_match_remembers_last_accepting_state() {
    let dfa = literals(&[("a", 1), ("abc", 2)]);

    assert_eq!(dfa.longest_match(&chars("abc")), Some((3, &2)));
    // `ab` leads to a non-accepting state and `abd` to the dead state, so
    // the best match is `a`.
    assert_eq!(dfa.longest_match(&chars("abd")), Some((1, &1)));
    assert_eq!(dfa.longest_match(&chars("ab")), Some((1, &1)));
}

#[test]
fn subset_construction_result() {
    let nfa = Nfa::from_rules([(Fragment::literal("ab"), 'x')]);
    let result = subset_construction(&nfa);
    let dfa = &result.dfa;

    // start, after `a`, after `ab` and the dead state.
    assert_eq!(dfa.state_count(), 4);
    assert_eq!(dfa.start_state(), 0);
    assert_eq!(
        result.nfa_states(0),
        &nfa.epsilon_closure(&StateSet::from([nfa.start_state()]))
    );

    let dead = dfa.dead_state().unwrap();
    assert_eq!(result.dfa_state(&StateSet::new()), Some(dead));
    assert!(dfa.transitions(dead).is_empty());
    assert_eq!(dfa.accept_code(dead), None);

    let after_a = dfa.next_state(0, 'a').unwrap();
    let after_ab = dfa.next_state(after_a, 'b').unwrap();
    assert_eq!(dfa.accept_code(after_a), None);
    assert_eq!(dfa.accept_code(after_ab), Some(&'x'));
    assert_eq!(dfa.next_state(0, 'z'), Some(dead));
    assert_eq!(dfa.next_state(after_ab, 'a'), Some(dead));

    let mut found = dfa.possible_next_states(0, &RangeSet::range('a', 'b'));
    let mut expected = vec![after_a, dead];
    found.sort();
    expected.sort();
    assert_eq!(found, expected);
}

#[test]
fn minimize_merges_equivalent_states() {
    let dfa = literals(&[("ac", 1), ("bc", 1)]);

    // start, after `a`, after `b`, after `ac`, after `bc` and dead.
    assert_eq!(dfa.state_count(), 6);

    let minimal = dfa.clone().minimize();

    // start, after `a` or `b`, after `ac` or `bc` and dead.
    assert_eq!(minimal.state_count(), 4);
    assert_deterministic(&minimal);

    for input in ["ac", "bc", "a", "cc", "acc", ""] {
        assert_eq!(
            minimal.longest_match(&chars(input)),
            dfa.longest_match(&chars(input)),
            "input: {:?}",
            input
        );
    }

    let dead = minimal.dead_state().unwrap();
    assert!(minimal.transitions(dead).is_empty());
    assert_eq!(minimal.accept_code(dead), None);
    assert_eq!(minimal.start_state(), 0);
}

#[test]
fn minimize_keeps_distinct_accept_codes() {
    let dfa = literals(&[("ac", 1), ("bc", 2)]);
    let minimal = dfa.clone().minimize();

    // After `a` and after `b` lead to states with different codes, so
    // nothing can be merged.
    assert_eq!(minimal, dfa);
}

#[test]
fn minimize_is_idempotent() {
    let dfa = literals(&[("for", 1), ("fork", 2), ("if", 3), ("iff", 3)]);
    let once = dfa.minimize();
    let twice = once.clone().minimize();
    assert_eq!(once, twice);
}

#[test]
fn map_accept_codes() {
    let dfa = literals(&[("a", 1), ("b", 2)]).map_accept_codes(|c| c * 10);
    assert_eq!(dfa.longest_match(&chars("a")), Some((1, &10)));
    assert_eq!(dfa.longest_match(&chars("b")), Some((1, &20)));
}

#[test]
#[should_panic(expected = "overlapping transitions")]
fn overlapping_transitions() {
    let mut builder = DfaBuilder::<char, ()>::new();
    let a = builder.new_state(None);
    let b = builder.new_state(None);
    builder.add_transition(a, RangeSet::range('a', 'm'), b);
    builder.add_transition(a, RangeSet::range('k', 'z'), a);
}

#[test]
fn missing_transition_stops_matching() {
    let mut builder = DfaBuilder::<char, u8>::new();
    let start = builder.new_state(None);
    let accept = builder.new_state(Some(7));
    builder.add_transition(start, RangeSet::only('x'), accept);
    builder.add_transition(accept, RangeSet::only('x'), accept);
    let dfa = builder.build(start, None);

    assert_eq!(dfa.next_state(start, 'y'), None);
    assert_eq!(dfa.longest_match(&chars("xxy")), Some((2, &7)));
    assert_eq!(dfa.longest_match(&chars("y")), None);
}

/// Longest prefix of `input` that equals some rule, the rule with the
/// highest code wins among rules with the same text.
fn brute_force(rules: &[String], input: &str) -> Option<(usize, usize)> {
    (1..=input.len()).rev().find_map(|len| {
        rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.as_str() == &input[..len])
            .map(|(code, _)| (len, code))
            .max()
    })
}

proptest! {
    #[test]
    fn literal_rules_agree_with_brute_force(
        rules in prop::collection::vec("[abc]{1,4}", 1..6),
        inputs in prop::collection::vec("[abcd]{0,6}", 1..10),
    ) {
        let nfa = Nfa::from_rules(
            rules.iter().enumerate().map(|(code, s)| (Fragment::literal(s), code)),
        );
        let dfa = subset_construction(&nfa).dfa;
        let minimal = dfa.clone().minimize();

        prop_assert!(minimal.state_count() <= dfa.state_count());
        prop_assert_eq!(&minimal.clone().minimize(), &minimal);

        for input in &inputs {
            let expected = brute_force(&rules, input);
            let symbols = chars(input);
            prop_assert_eq!(dfa.longest_match(&symbols).map(|(l, c)| (l, *c)), expected);
            prop_assert_eq!(minimal.longest_match(&symbols).map(|(l, c)| (l, *c)), expected);
        }
    }
}

#[test]
fn well_formed() {
    let dfa = literals(&[("dog", 1), ("pig", 2)]);
    assert!(dfa.is_well_formed());
    assert!(dfa.clone().minimize().is_well_formed());

    // A transition to a state that doesn't exist.
    let mut builder = DfaBuilder::<char, i32>::new();
    let start = builder.new_state(None);
    builder.add_transition(start, RangeSet::only('a'), 99);
    assert!(!builder.build(start, None).is_well_formed());

    // Start and dead states out of range.
    let mut builder = DfaBuilder::<char, i32>::new();
    builder.new_state(Some(1));
    assert!(!builder.build(1, None).is_well_formed());

    let mut builder = DfaBuilder::<char, i32>::new();
    let start = builder.new_state(Some(1));
    assert!(!builder.build(start, Some(3)).is_well_formed());

    // Overlapping transitions leaving the same state.
    let overlapping: Dfa<char, i32> = Dfa {
        start: 0,
        dead: None,
        states: vec![DfaState {
            transitions: vec![
                (RangeSet::range('a', 'c'), 0),
                (RangeSet::only('b'), 0),
            ],
            accept_code: None,
        }],
    };
    assert!(!overlapping.is_well_formed());
}

#[test]
fn debug_format() {
    let mut builder = DfaBuilder::<char, i32>::new();
    let start = builder.new_state(None);
    let end = builder.new_state(Some(7));
    builder.add_transition(start, RangeSet::only('a'), end);
    let dfa = builder.build(start, None);

    let debug = format!("{:?}", dfa);
    assert!(debug.contains("RangeSet['a', 'b']"), "{}", debug);
    assert!(debug.contains("Some(7)"), "{}", debug);
}
