use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::compiler::{compile, Compiler, Error, LexerRule};
use crate::config::{Config, TieBreak};
use crate::dfa::Dfa;
use crate::lexer::Lexer;
use crate::nfa::Nfa;
use crate::re::RegexParser;

fn matches<A: Clone>(dfa: &Dfa<char, A>, input: &str) -> Option<(usize, A)> {
    let input: Vec<char> = input.chars().collect();
    dfa.longest_match(&input).map(|(len, code)| (len, code.clone()))
}

#[test]
fn literals() {
    let dfa = compile(&[
        LexerRule::literal("dog", 1),
        LexerRule::literal("pig", 2),
        LexerRule::literal("horse", 3),
    ])
    .unwrap();

    assert_eq!(matches(&dfa, "dog"), Some((3, 1)));
    assert_eq!(matches(&dfa, "pig"), Some((3, 2)));
    assert_eq!(matches(&dfa, "horses"), Some((5, 3)));
    assert_eq!(matches(&dfa, "banana"), None);
    assert_eq!(matches(&dfa, "do"), None);
    assert_eq!(matches(&dfa, ""), None);
}

#[test]
fn letters() {
    let dfa = compile(&[LexerRule::regex("[A-Z|a-z]+", ())]).unwrap();

    assert_eq!(matches(&dfa, "Hello"), Some((5, ())));
    assert_eq!(matches(&dfa, "abc123"), Some((3, ())));
    assert_eq!(matches(&dfa, ""), None);
    assert_eq!(matches(&dfa, "1abc"), None);
}

#[test]
fn string_content() {
    let dfa = compile(&[LexerRule::regex("[~\"&~\\\\]+", ())]).unwrap();

    assert_eq!(matches(&dfa, "hello world"), Some((11, ())));
    assert_eq!(matches(&dfa, "hello\"world"), Some((5, ())));
    assert_eq!(matches(&dfa, "say \\n"), Some((4, ())));
    assert_eq!(matches(&dfa, "\"quoted\""), None);
    assert_eq!(matches(&dfa, "\u{1F600}\u{10FFFF}"), Some((2, ())));
}

#[test]
fn regex_features() {
    let compiler = Compiler::new();
    let dfa = |re: &str| compiler.compile(&[LexerRule::regex(re, ())]).unwrap();

    let integer = dfa("-?(0|[1-9][0-9]*)");
    assert_eq!(matches(&integer, "0123"), Some((1, ())));
    assert_eq!(matches(&integer, "-42,"), Some((3, ())));
    assert_eq!(matches(&integer, "-"), None);

    let hex = dfa("\\x41;+\\t");
    assert_eq!(matches(&hex, "AAA\t"), Some((4, ())));
    assert_eq!(matches(&hex, "AAA"), None);

    let shifted = dfa("[a>-<e]*");
    assert_eq!(matches(&shifted, "bcdbe"), Some((4, ())));
    // Empty matches are not reported.
    assert_eq!(matches(&shifted, "abc"), None);

    let open_ranges = dfa("[-9|x-]");
    assert_eq!(matches(&open_ranges, "5"), Some((1, ())));
    assert_eq!(matches(&open_ranges, "z"), Some((1, ())));
    assert_eq!(matches(&open_ranges, "a"), None);

    let empty = dfa("");
    assert_eq!(matches(&empty, "abc"), None);
}

#[test]
fn errors() {
    let compiler = Compiler::new();

    assert_eq!(
        compiler.compile(&[
            LexerRule::literal("(", 1),
            LexerRule::regex("(a|b", 2),
        ]),
        Err(Error::SyntaxError { pattern: "(a|b".to_string(), offset: 0 })
    );

    assert_eq!(
        compiler.compile(&[LexerRule::regex("\\xD800;", 1)]),
        Err(Error::InvalidCodePoint { value: 0xD800 })
    );

    // Metacharacters have no special meaning in literal rules.
    let dfa = compiler.compile(&[LexerRule::literal("(a|b", 1)]).unwrap();
    assert_eq!(matches(&dfa, "(a|b"), Some((4, 1)));

    let rules = BTreeMap::from([
        ("main", vec![LexerRule::literal("x", 1)]),
        ("other", vec![LexerRule::regex("x)", 1)]),
    ]);
    assert_eq!(
        compiler.build_lexer(&rules).err(),
        Some(Error::SyntaxError { pattern: "x)".to_string(), offset: 1 })
    );
}

#[test]
fn tie_break() {
    let rules = [
        LexerRule::literal("if", 1),
        LexerRule::regex("[a-z]+", 5),
    ];

    let dfa = Compiler::new().compile(&rules).unwrap();
    assert_eq!(matches(&dfa, "if"), Some((2, 5)));
    assert_eq!(matches(&dfa, "iffy"), Some((4, 5)));

    let compiler = Compiler::with_config(Config {
        tie_break: TieBreak::FirstDeclared,
        ..Config::default()
    });
    assert_eq!(compiler.config().tie_break, TieBreak::FirstDeclared);

    let dfa = compiler.compile(&rules).unwrap();
    assert_eq!(matches(&dfa, "if"), Some((2, 1)));
    assert_eq!(matches(&dfa, "iffy"), Some((4, 5)));
    assert_eq!(matches(&dfa, "i"), Some((1, 5)));

    // With distinct patterns both policies produce the same codes.
    let dfa = compiler
        .compile(&[LexerRule::literal("a", 1), LexerRule::literal("b", 2)])
        .unwrap();
    assert_eq!(matches(&dfa, "a"), Some((1, 1)));
    assert_eq!(matches(&dfa, "b"), Some((1, 2)));
}

#[test]
fn minimization() {
    let rules = [
        LexerRule::regex("(a|b)c", 1),
        LexerRule::regex("[0-9]+|x[0-9]*", 2),
    ];

    let minimized = Compiler::new().compile(&rules).unwrap();
    let unminimized = Compiler::with_config(Config {
        minimize: false,
        ..Config::default()
    })
    .compile(&rules)
    .unwrap();

    assert!(minimized.state_count() < unminimized.state_count());

    for input in ["ac", "bc", "cc", "123x", "x", "x12", "xx", ""] {
        assert_eq!(
            matches(&minimized, input),
            matches(&unminimized, input),
            "input: {:?}",
            input
        );
    }
}

#[test]
fn compile_states() {
    let rules = BTreeMap::from([
        (0, vec![LexerRule::literal("a", 'a')]),
        (1, vec![LexerRule::literal("b", 'b'), LexerRule::regex("c+", 'c')]),
        (2, vec![]),
    ]);

    let dfas = Compiler::default().compile_states(&rules).unwrap();

    assert_eq!(dfas.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(matches(&dfas[&0], "ab"), Some((1, 'a')));
    assert_eq!(matches(&dfas[&1], "ccc"), Some((3, 'c')));
    assert_eq!(matches(&dfas[&1], "a"), None);
    // A state without rules never matches.
    assert_eq!(matches(&dfas[&2], "abc"), None);
}

#[test]
fn rule_accessors() {
    let rule = LexerRule::regex("[0-9]+", "Integer");
    assert_eq!(rule, LexerRule::Regex("[0-9]+".to_string(), "Integer"));
    assert_eq!(rule.accept_code(), &"Integer");
    assert_eq!(LexerRule::literal("if", 7).accept_code(), &7);
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn thread_safety() {
    assert_send_sync::<Nfa<char, u32>>();
    assert_send_sync::<Dfa<char, u32>>();
    assert_send_sync::<Lexer<String, u32>>();
    assert_send_sync::<RegexParser>();
    assert_send_sync::<Compiler>();

    // A compiler can be shared by threads compiling different rule sets.
    let compiler = Compiler::new();
    std::thread::scope(|scope| {
        let handles: Vec<_> = ["[0-9]+", "[a-z]+", "(a|b)*c"]
            .into_iter()
            .map(|re| {
                let compiler = &compiler;
                scope.spawn(move || {
                    compiler.compile(&[LexerRule::regex(re, 1)]).unwrap()
                })
            })
            .collect();

        let dfas: Vec<_> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(matches(&dfas[0], "123a"), Some((3, 1)));
        assert_eq!(matches(&dfas[1], "abc1"), Some((3, 1)));
        assert_eq!(matches(&dfas[2], "abac"), Some((4, 1)));
    });
}

/// Finds the longest non-empty prefix of `input` that is equal to some word,
/// and the greatest code among the words equal to that prefix.
fn brute_force(words: &[(String, u8)], input: &str) -> Option<(usize, u8)> {
    let input: Vec<char> = input.chars().collect();
    (1..=input.len()).rev().find_map(|len| {
        let prefix: String = input[..len].iter().collect();
        words
            .iter()
            .filter(|(word, _)| *word == prefix)
            .map(|(_, code)| *code)
            .max()
            .map(|code| (len, code))
    })
}

proptest! {
    #[test]
    fn literal_rules_match_longest_word(
        words in prop::collection::vec(("[abc]{0,4}", 0u8..4), 1..6),
        input in "[abcd]{0,8}",
    ) {
        let rules: Vec<_> = words
            .iter()
            .map(|(word, code)| LexerRule::literal(word.clone(), *code))
            .collect();

        let minimized = compile(&rules).unwrap();
        let unminimized = Compiler::with_config(Config {
            minimize: false,
            ..Config::default()
        })
        .compile(&rules)
        .unwrap();

        let expected = brute_force(&words, &input);

        prop_assert_eq!(matches(&minimized, &input), expected);
        prop_assert_eq!(matches(&unminimized, &input), expected);
    }
}
