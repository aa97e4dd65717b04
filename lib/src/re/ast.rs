/*! Abstract syntax tree for regular expressions.

The tree is produced by [`crate::re::RegexParser`]. Regular expressions are
represented by [`RegexSyntax`], character classes (the `[...]` construct) by
[`RegexCharSet`], and the characters that appear inside a character class by
[`RegexCharForSet`].

Escapes and hex escapes are kept as they were written, and are resolved into
actual characters only when the tree is evaluated, either into a
[`RangeSet`] or into an NFA [`Fragment`].
*/

use serde::{Deserialize, Serialize};

use crate::nfa::Fragment;
use crate::rangeset::RangeSet;
use crate::Error;

/// A regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegexSyntax {
    /// Matches the empty string.
    EmptyString,
    /// A literal character.
    SingleChar(char),
    /// An escaped character (e.g: `\n`, `\(`).
    CharEscape(char),
    /// A hex escape (e.g: `\x1B;`), with its digits as written.
    HexEscape(Vec<char>),
    /// A character class (e.g: `[a-z]`).
    CharFromSet(RegexCharSet),
    /// Concatenation.
    Sequence(Vec<RegexSyntax>),
    /// Alternation (`a|b`).
    Alternative(Vec<RegexSyntax>),
    /// `?` is optional, `+` is repeating, `*` is both.
    OptRep { body: Box<RegexSyntax>, optional: bool, repeating: bool },
}

impl RegexSyntax {
    /// Creates the concatenation of `items`.
    ///
    /// Nested sequences are flattened and empty strings are removed. If a
    /// single item remains, it's returned as is, and if no items remain the
    /// result is [`RegexSyntax::EmptyString`].
    pub fn sequence(items: Vec<RegexSyntax>) -> Self {
        let mut flattened = Vec::with_capacity(items.len());
        for item in items {
            match item {
                RegexSyntax::EmptyString => {}
                RegexSyntax::Sequence(inner) => flattened.extend(inner),
                item => flattened.push(item),
            }
        }
        match flattened.len() {
            0 => RegexSyntax::EmptyString,
            1 => flattened.remove(0),
            _ => RegexSyntax::Sequence(flattened),
        }
    }

    /// Converts the regular expression into an NFA fragment.
    pub fn to_fragment(&self) -> Result<Fragment<char>, Error> {
        Ok(match self {
            RegexSyntax::EmptyString => Fragment::EmptyString,
            RegexSyntax::SingleChar(c) => {
                Fragment::CharFromSet(RangeSet::only(*c))
            }
            RegexSyntax::CharEscape(c) => {
                Fragment::CharFromSet(RangeSet::only(unescape(*c)))
            }
            RegexSyntax::HexEscape(digits) => {
                Fragment::CharFromSet(RangeSet::only(hex_to_char(digits)?))
            }
            RegexSyntax::CharFromSet(set) => Fragment::CharFromSet(set.eval()?),
            RegexSyntax::Sequence(items) => Fragment::sequence(
                items
                    .iter()
                    .map(|item| item.to_fragment())
                    .collect::<Result<_, _>>()?,
            ),
            RegexSyntax::Alternative(items) => Fragment::alternative(
                items
                    .iter()
                    .map(|item| item.to_fragment())
                    .collect::<Result<_, _>>()?,
            ),
            RegexSyntax::OptRep { body, optional, repeating } => {
                Fragment::opt_rep(body.to_fragment()?, *optional, *repeating)
            }
        })
    }
}

/// A character class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegexCharSet {
    /// `a-z`. If the end precedes the start, they are swapped.
    ClosedRange(RegexCharForSet, RegexCharForSet),
    /// `a-`
    GreaterEqual(RegexCharForSet),
    /// `-z`
    LessEqual(RegexCharForSet),
    /// `a`
    Only(RegexCharForSet),
    /// `~set`
    Complement(Box<RegexCharSet>),
    /// `set|set`
    Union(Vec<RegexCharSet>),
    /// `set&set`
    Intersection(Vec<RegexCharSet>),
}

impl RegexCharSet {
    /// Evaluates the character class into the set of characters it matches.
    pub fn eval(&self) -> Result<RangeSet<char>, Error> {
        Ok(match self {
            RegexCharSet::ClosedRange(start, end) => {
                let (start, end) = (start.eval()?, end.eval()?);
                if start <= end {
                    RangeSet::range(start, end)
                } else {
                    RangeSet::range(end, start)
                }
            }
            RegexCharSet::GreaterEqual(start) => {
                RangeSet::greater_equal(start.eval()?)
            }
            RegexCharSet::LessEqual(end) => RangeSet::less_equal(end.eval()?),
            RegexCharSet::Only(c) => RangeSet::only(c.eval()?),
            RegexCharSet::Complement(set) => set.eval()?.complement(),
            RegexCharSet::Union(sets) => RangeSet::union_all(
                sets.iter().map(|s| s.eval()).collect::<Result<Vec<_>, _>>()?,
            ),
            RegexCharSet::Intersection(sets) => RangeSet::intersection_all(
                sets.iter().map(|s| s.eval()).collect::<Result<Vec<_>, _>>()?,
            ),
        })
    }
}

/// A character inside a character class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegexCharForSet {
    /// A literal character.
    SingleChar(char),
    /// An escaped character (e.g: `\-`, `\t`).
    CharEscape(char),
    /// A hex escape (e.g: `\x7F;`), with its digits as written.
    HexEscape(Vec<char>),
    /// A character shifted by `offset` code points. Each `<` before the
    /// character subtracts one, each `>` after it adds one.
    Offset { offset: i32, item: Box<RegexCharForSet> },
}

impl RegexCharForSet {
    /// Shifts `item` by `offset` code points. A zero offset returns `item`
    /// unchanged.
    pub fn offset(offset: i32, item: RegexCharForSet) -> Self {
        if offset == 0 {
            item
        } else {
            RegexCharForSet::Offset { offset, item: Box::new(item) }
        }
    }

    /// Evaluates the character.
    pub fn eval(&self) -> Result<char, Error> {
        match self {
            RegexCharForSet::SingleChar(c) => Ok(*c),
            RegexCharForSet::CharEscape(c) => Ok(unescape(*c)),
            RegexCharForSet::HexEscape(digits) => hex_to_char(digits),
            RegexCharForSet::Offset { offset, item } => {
                code_point_to_char(item.eval()? as i64 + *offset as i64)
            }
        }
    }
}

/// Returns the character represented by the escape sequence `\c`. Escapes
/// without a special meaning represent the escaped character itself.
pub(crate) fn unescape(c: char) -> char {
    match c {
        'a' => '\x07',
        'b' => '\x08',
        't' => '\t',
        'n' => '\n',
        'v' => '\x0B',
        'f' => '\x0C',
        'r' => '\r',
        c => c,
    }
}

fn hex_to_char(digits: &[char]) -> Result<char, Error> {
    let value = digits.iter().try_fold(0_i64, |value, digit| {
        digit
            .to_digit(16)
            .map(|d| value.saturating_mul(16).saturating_add(d as i64))
            .ok_or(Error::InvalidHexDigit { digit: *digit })
    })?;
    code_point_to_char(value)
}

fn code_point_to_char(value: i64) -> Result<char, Error> {
    u32::try_from(value)
        .ok()
        .and_then(char::from_u32)
        .ok_or(Error::InvalidCodePoint { value })
}
