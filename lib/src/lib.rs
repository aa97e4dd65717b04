/*! A lexer generator completely written in Rust.

Lexical rules are either literal strings or regular expressions, each one
tagged with an accept code that identifies the kind of token the rule
recognizes. The [`Compiler`] turns a set of rules into a minimal
deterministic finite automaton ([`Dfa`]), and the DFA is used for splitting
text into tokens, always choosing the longest prefix that matches some rule.

Rules can be grouped into lexer states (also known as start conditions),
each one with its own DFA. A [`Lexer`] switches from one state to another
depending on the tokens it finds, which allows context-sensitive
tokenization, like treating the text inside a quoted string differently.

# Example

```rust
use std::collections::BTreeMap;
use lexgen::{Compiler, LexerRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Token { Space, Word, Quote, Text }

let rules = BTreeMap::from([
    ("main", vec![
        LexerRule::regex("[ |\\t]+", Token::Space),
        LexerRule::regex("[a-z]+", Token::Word),
        LexerRule::literal("\"", Token::Quote),
    ]),
    ("string", vec![
        LexerRule::literal("\"", Token::Quote),
        LexerRule::regex("[~\"]+", Token::Text),
    ]),
]);

let lexer = Compiler::new().build_lexer(&rules).unwrap();

let mut in_string = false;
let (tokens, _) = lexer
    .lex("main", "say \"hi there\"", 0, |token| {
        if *token == Token::Quote {
            in_string = !in_string;
        }
        if in_string { "string" } else { "main" }
    })
    .unwrap();

let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
assert_eq!(texts, ["say", " ", "\"", "hi there", "\""]);
```
*/

pub use compiler::compile;
pub use compiler::Compiler;
pub use compiler::Error;
pub use compiler::LexerRule;
pub use compiler::SerializationError;

pub use config::load_config_from_file;
pub use config::Config;
pub use config::TieBreak;

pub use dfa::Dfa;
pub use lexer::lex;
pub use lexer::Lexer;
pub use lexer::Token;
pub use rangeset::RangeSet;
pub use rangeset::Symbol;
pub use re::RegexParser;

mod compiler;

pub mod config;
pub mod dfa;
pub mod lexer;
pub mod nfa;
pub mod rangeset;
pub mod re;

mod utils {
    /// Tries to match `target` as the enum variant `pat`. Returns the
    /// inner value contained in the variant, or panics if `target` does
    /// not match `pat`.
    ///
    /// For example...
    ///
    /// ```ignore
    /// cast!(target, pat)
    /// ```
    ///
    /// expands to...
    ///
    /// ```ignore
    /// if let pat(inner) = target {
    ///     inner
    /// } else {
    ///     panic!("mismatch variant when cast to {}", stringify!($pat));
    /// }
    /// ```
    macro_rules! cast {
        ($target: expr, $pat: path) => {{
            if let $pat(inner) = $target {
                inner
            } else {
                panic!("mismatch variant when cast to {}", stringify!($pat));
            }
        }};
    }

    pub(crate) use cast;
}
