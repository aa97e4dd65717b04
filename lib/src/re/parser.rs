use crate::rangeset::RangeSet;
use crate::re::ast::{RegexCharForSet, RegexCharSet, RegexSyntax};
use crate::re::combinator::{
    Combinator, Grammar, ParserState, RuleId, StackItem,
};
use crate::utils::cast;
use crate::Error;

/// Characters that must be escaped in a regular expression.
const REGEX_META: &str = "()+?*|\\[]";

/// Characters that can be escaped in a regular expression.
const REGEX_ESCAPABLE: &str = "()+?*|\\[]abtnvfrsS";

/// Characters that must be escaped inside a character class.
const SET_META: &str = "()<>~&|[]\\-";

/// Characters that can be escaped inside a character class.
const SET_ESCAPABLE: &str = "()<>~&|[]\\-abtnvfr";

/// Parses regular expressions into [`RegexSyntax`] trees.
///
/// The grammar is built once when the parser is created, and the parser can
/// be shared and used from multiple threads.
///
/// # Syntax
///
/// | Syntax          | Meaning                                          |
/// |-----------------|--------------------------------------------------|
/// | `c`             | a literal character (control characters and `()+?*\|\[]` must be escaped) |
/// | `\c`            | an escape: `\a \b \t \n \v \f \r`, or one of `()+?*\|\[]sS` literally |
/// | `\x1F;`         | a character given by its hexadecimal code point   |
/// | `[...]`         | a character class, see below                     |
/// | `(r)`           | grouping                                         |
/// | `r?` `r+` `r*`  | greedy quantifiers                               |
/// | `rs`            | concatenation                                    |
/// | `r\|s`          | alternation                                      |
///
/// Inside a character class, from lowest to highest precedence: `s\|t` is
/// the union, `s&t` the intersection, `~s` the complement, and the atoms are
/// `a-b` (a range), `a-` (`a` and above), `-b` (`b` and below), `a` (a single
/// character), and `(s)`. Characters in a class can be shifted with angle
/// brackets: `<a` is the character before `a` and `a>` the one after it.
#[derive(Debug)]
pub struct RegexParser {
    grammar: Grammar,
    regex: RuleId,
}

impl RegexParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        let mut grammar = Grammar::new();

        let regex = grammar.declare();
        let sequence = grammar.declare();
        let quantified = grammar.declare();
        let atom = grammar.declare();

        let set = grammar.declare();
        let set_intersection = grammar.declare();
        let set_complement = grammar.declare();
        let set_atom = grammar.declare();
        let set_char = grammar.declare();
        let set_literal = grammar.declare();

        // regex := sequence ('|' sequence)*
        grammar.define(
            regex,
            Combinator::seq(vec![
                Combinator::Rule(sequence),
                Combinator::many(Combinator::seq(vec![
                    Combinator::exact('|'),
                    Combinator::Rule(sequence),
                    Combinator::reduce(2, alternative),
                ])),
            ]),
        );

        // sequence := quantified*
        grammar.define(
            sequence,
            Combinator::seq(vec![
                Combinator::push(StackItem::Syntax(RegexSyntax::EmptyString)),
                Combinator::many(Combinator::seq(vec![
                    Combinator::Rule(quantified),
                    Combinator::reduce(2, sequence_of_two),
                ])),
            ]),
        );

        // quantified := atom ('?' | '+' | '*')?
        grammar.define(
            quantified,
            Combinator::seq(vec![
                Combinator::Rule(atom),
                Combinator::opt(Combinator::alt(vec![
                    Combinator::seq(vec![
                        Combinator::exact('?'),
                        Combinator::reduce(1, optional),
                    ]),
                    Combinator::seq(vec![
                        Combinator::exact('+'),
                        Combinator::reduce(1, one_or_more),
                    ]),
                    Combinator::seq(vec![
                        Combinator::exact('*'),
                        Combinator::reduce(1, zero_or_more),
                    ]),
                ])),
            ]),
        );

        // atom := literal | '\' escape | '\x' hex ';' | '[' set ']' | '(' regex ')'
        grammar.define(
            atom,
            Combinator::alt(vec![
                Combinator::char_from_set(literal_chars(REGEX_META), |c| {
                    StackItem::Syntax(RegexSyntax::SingleChar(c))
                }),
                Combinator::seq(vec![
                    Combinator::exact('\\'),
                    Combinator::alt(vec![
                        Combinator::char_from_set(
                            RangeSet::any_of(REGEX_ESCAPABLE.chars()),
                            |c| StackItem::Syntax(RegexSyntax::CharEscape(c)),
                        ),
                        Combinator::seq(vec![
                            hex_digits(),
                            Combinator::reduce(1, |items| {
                                let [digits] = take::<1>(items);
                                StackItem::Syntax(RegexSyntax::HexEscape(cast!(
                                    digits,
                                    StackItem::CharList
                                )))
                            }),
                        ]),
                    ]),
                ]),
                Combinator::seq(vec![
                    Combinator::exact('['),
                    Combinator::Rule(set),
                    Combinator::exact(']'),
                    Combinator::reduce(1, |items| {
                        let [set] = take::<1>(items);
                        StackItem::Syntax(RegexSyntax::CharFromSet(cast!(
                            set,
                            StackItem::CharSet
                        )))
                    }),
                ]),
                Combinator::seq(vec![
                    Combinator::exact('('),
                    Combinator::Rule(regex),
                    Combinator::exact(')'),
                ]),
            ]),
        );

        // set := set_intersection ('|' set_intersection)*
        grammar.define(
            set,
            Combinator::seq(vec![
                Combinator::Rule(set_intersection),
                Combinator::many(Combinator::seq(vec![
                    Combinator::exact('|'),
                    Combinator::Rule(set_intersection),
                    Combinator::reduce(2, |items| {
                        let [a, b] = take::<2>(items).map(|i| cast!(i, StackItem::CharSet));
                        StackItem::CharSet(RegexCharSet::Union(vec![a, b]))
                    }),
                ])),
            ]),
        );

        // set_intersection := set_complement ('&' set_complement)*
        grammar.define(
            set_intersection,
            Combinator::seq(vec![
                Combinator::Rule(set_complement),
                Combinator::many(Combinator::seq(vec![
                    Combinator::exact('&'),
                    Combinator::Rule(set_complement),
                    Combinator::reduce(2, |items| {
                        let [a, b] = take::<2>(items).map(|i| cast!(i, StackItem::CharSet));
                        StackItem::CharSet(RegexCharSet::Intersection(vec![a, b]))
                    }),
                ])),
            ]),
        );

        // set_complement := '~' set_atom | set_atom
        grammar.define(
            set_complement,
            Combinator::alt(vec![
                Combinator::seq(vec![
                    Combinator::exact('~'),
                    Combinator::Rule(set_atom),
                    Combinator::reduce(1, |items| {
                        let [set] = take::<1>(items);
                        StackItem::CharSet(RegexCharSet::Complement(Box::new(
                            cast!(set, StackItem::CharSet),
                        )))
                    }),
                ]),
                Combinator::Rule(set_atom),
            ]),
        );

        // set_atom := set_char ('-' set_char?)? | '-' set_char | '(' set ')'
        grammar.define(
            set_atom,
            Combinator::alt(vec![
                Combinator::seq(vec![
                    Combinator::Rule(set_char),
                    Combinator::alt(vec![
                        Combinator::seq(vec![
                            Combinator::exact('-'),
                            Combinator::alt(vec![
                                Combinator::seq(vec![
                                    Combinator::Rule(set_char),
                                    Combinator::reduce(2, |items| {
                                        let [start, end] = take::<2>(items)
                                            .map(|i| cast!(i, StackItem::CharForSet));
                                        StackItem::CharSet(closed_range(start, end))
                                    }),
                                ]),
                                Combinator::reduce(1, |items| {
                                    let [start] = take::<1>(items);
                                    StackItem::CharSet(RegexCharSet::GreaterEqual(
                                        cast!(start, StackItem::CharForSet),
                                    ))
                                }),
                            ]),
                        ]),
                        Combinator::reduce(1, |items| {
                            let [c] = take::<1>(items);
                            StackItem::CharSet(RegexCharSet::Only(cast!(
                                c,
                                StackItem::CharForSet
                            )))
                        }),
                    ]),
                ]),
                Combinator::seq(vec![
                    Combinator::exact('-'),
                    Combinator::Rule(set_char),
                    Combinator::reduce(1, |items| {
                        let [end] = take::<1>(items);
                        StackItem::CharSet(RegexCharSet::LessEqual(cast!(
                            end,
                            StackItem::CharForSet
                        )))
                    }),
                ]),
                Combinator::seq(vec![
                    Combinator::exact('('),
                    Combinator::Rule(set),
                    Combinator::exact(')'),
                ]),
            ]),
        );

        // set_char := '<'* set_literal '>'*
        grammar.define(
            set_char,
            Combinator::seq(vec![
                Combinator::push(StackItem::Int(0)),
                Combinator::many(Combinator::seq(vec![
                    Combinator::exact('<'),
                    Combinator::reduce(1, |items| {
                        let [n] = take::<1>(items);
                        StackItem::Int(cast!(n, StackItem::Int) - 1)
                    }),
                ])),
                Combinator::Rule(set_literal),
                Combinator::push(StackItem::Int(0)),
                Combinator::many(Combinator::seq(vec![
                    Combinator::exact('>'),
                    Combinator::reduce(1, |items| {
                        let [n] = take::<1>(items);
                        StackItem::Int(cast!(n, StackItem::Int) + 1)
                    }),
                ])),
                Combinator::reduce(3, |items| {
                    let [left, c, right] = take::<3>(items);
                    let offset =
                        cast!(left, StackItem::Int) + cast!(right, StackItem::Int);
                    StackItem::CharForSet(RegexCharForSet::offset(
                        offset,
                        cast!(c, StackItem::CharForSet),
                    ))
                }),
            ]),
        );

        // set_literal := literal | '\' escape | '\x' hex ';'
        grammar.define(
            set_literal,
            Combinator::alt(vec![
                Combinator::char_from_set(literal_chars(SET_META), |c| {
                    StackItem::CharForSet(RegexCharForSet::SingleChar(c))
                }),
                Combinator::seq(vec![
                    Combinator::exact('\\'),
                    Combinator::alt(vec![
                        Combinator::char_from_set(
                            RangeSet::any_of(SET_ESCAPABLE.chars()),
                            |c| StackItem::CharForSet(RegexCharForSet::CharEscape(c)),
                        ),
                        Combinator::seq(vec![
                            hex_digits(),
                            Combinator::reduce(1, |items| {
                                let [digits] = take::<1>(items);
                                StackItem::CharForSet(RegexCharForSet::HexEscape(
                                    cast!(digits, StackItem::CharList),
                                ))
                            }),
                        ]),
                    ]),
                ]),
            ]),
        );

        Self { grammar, regex }
    }

    /// Parses a regular expression.
    ///
    /// The whole pattern must be consumed, otherwise the result is
    /// [`Error::SyntaxError`] with the offset where parsing stopped.
    pub fn parse(&self, pattern: &str) -> Result<RegexSyntax, Error> {
        let input: Vec<char> = pattern.chars().collect();

        let state = self.grammar.run(
            &Combinator::Rule(self.regex),
            &input,
            ParserState::default(),
        );

        match state {
            Some(state) if state.pos == input.len() => {
                match state.stack.pop() {
                    Some((item, rest)) if rest.len() == 0 => {
                        Ok(cast!(item.clone(), StackItem::Syntax))
                    }
                    _ => panic!("unbalanced parser stack"),
                }
            }
            Some(state) => Err(Error::SyntaxError {
                pattern: pattern.to_string(),
                offset: state.pos,
            }),
            None => Err(Error::SyntaxError {
                pattern: pattern.to_string(),
                offset: 0,
            }),
        }
    }
}

impl Default for RegexParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Printable characters, except the ones in `meta`.
fn literal_chars(meta: &str) -> RangeSet<char> {
    RangeSet::greater_equal(' ').difference(&RangeSet::any_of(meta.chars()))
}

/// Matches `x`, one or more hex digits and `;`, leaving the digits in the
/// stack as a single [`StackItem::CharList`].
fn hex_digits() -> Combinator {
    let hex = RangeSet::range('0', '9')
        .union(&RangeSet::range('A', 'F'))
        .union(&RangeSet::range('a', 'f'));

    Combinator::seq(vec![
        Combinator::exact('x'),
        Combinator::push(StackItem::CharList(Vec::new())),
        Combinator::one_or_more(Combinator::seq(vec![
            Combinator::char_from_set(hex, StackItem::Char),
            Combinator::reduce(2, |items| {
                let [list, c] = take::<2>(items);
                let mut list = cast!(list, StackItem::CharList);
                list.push(cast!(c, StackItem::Char));
                StackItem::CharList(list)
            }),
        ])),
        Combinator::char_from_set(RangeSet::only(';'), StackItem::Char),
        Combinator::Drop,
    ])
}

fn take<const N: usize>(items: Vec<StackItem>) -> [StackItem; N] {
    match items.try_into() {
        Ok(items) => items,
        Err(items) => panic!("expected {} stack items, got {:?}", N, items),
    }
}

fn alternative(items: Vec<StackItem>) -> StackItem {
    let [a, b] = take::<2>(items).map(|i| cast!(i, StackItem::Syntax));
    StackItem::Syntax(RegexSyntax::Alternative(vec![a, b]))
}

fn sequence_of_two(items: Vec<StackItem>) -> StackItem {
    let [a, b] = take::<2>(items).map(|i| cast!(i, StackItem::Syntax));
    StackItem::Syntax(RegexSyntax::sequence(vec![a, b]))
}

fn quantify(items: Vec<StackItem>, optional: bool, repeating: bool) -> StackItem {
    let [body] = take::<1>(items);
    StackItem::Syntax(RegexSyntax::OptRep {
        body: Box::new(cast!(body, StackItem::Syntax)),
        optional,
        repeating,
    })
}

fn optional(items: Vec<StackItem>) -> StackItem {
    quantify(items, true, false)
}

fn one_or_more(items: Vec<StackItem>) -> StackItem {
    quantify(items, false, true)
}

fn zero_or_more(items: Vec<StackItem>) -> StackItem {
    quantify(items, true, true)
}

/// A range whose endpoints are the same character is just that character.
fn closed_range(start: RegexCharForSet, end: RegexCharForSet) -> RegexCharSet {
    if start == end {
        RegexCharSet::Only(start)
    } else {
        RegexCharSet::ClosedRange(start, end)
    }
}
