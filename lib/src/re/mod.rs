/*! This module parses regular expressions used in lexical rules.

The regular expression dialect is deliberately small: literal characters,
escapes, hex escapes, character classes with set operations, grouping,
greedy quantifiers, concatenation and alternation. See [`RegexParser`] for
the complete syntax.

Parsing is done by a stack-machine driven by parser combinators (see the
`combinator` module). Each level of the grammar pushes the syntax it
recognizes into a stack, and reductions combine the items on the top of the
stack into bigger ones. The result is a [`RegexSyntax`] tree which can be
turned into an NFA [`crate::nfa::Fragment`] with
[`RegexSyntax::to_fragment`].
*/

pub use ast::{RegexCharForSet, RegexCharSet, RegexSyntax};
pub use parser::RegexParser;

pub mod ast;
mod combinator;
mod parser;
