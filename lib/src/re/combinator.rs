/*! A tiny parser-combinator engine driven by an explicit stack.

Parsers are described as [`Combinator`] values and interpreted by a
[`Grammar`]. Every combinator takes a [`ParserState`] (a stack of
[`StackItem`]s plus the current position in the input) and either produces
a new state or fails. States are immutable: the stack is a persistent linked
list, so keeping an old state around for trying another alternative costs
nothing.

Combinators can refer to grammar rules by [`RuleId`]. A rule is declared
before its body is known and defined later, which allows mutually recursive
rules such as a parenthesized sub-expression referring back to the top-level
expression.
*/

use std::rc::Rc;
use std::sync::OnceLock;

use crate::rangeset::RangeSet;
use crate::re::ast::{RegexCharForSet, RegexCharSet, RegexSyntax};

/// An item in the parser stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StackItem {
    Char(char),
    Int(i32),
    CharList(Vec<char>),
    CharForSet(RegexCharForSet),
    CharSet(RegexCharSet),
    Syntax(RegexSyntax),
}

/// A persistent stack. Pushing and popping create new stacks that share
/// their tail with the original one.
#[derive(Debug, Clone, Default)]
pub(crate) struct Stack(Option<Rc<Node>>);

#[derive(Debug)]
struct Node {
    item: StackItem,
    next: Stack,
}

impl Stack {
    /// Returns a new stack with `item` on top of `self`.
    pub fn push(&self, item: StackItem) -> Stack {
        Stack(Some(Rc::new(Node { item, next: self.clone() })))
    }

    /// Returns the item on top of the stack and the stack below it.
    pub fn pop(&self) -> Option<(&StackItem, Stack)> {
        self.0.as_ref().map(|node| (&node.item, node.next.clone()))
    }

    /// Removes the `n` items at the top of the stack. The items are returned
    /// in the order they were pushed.
    ///
    /// # Panics
    ///
    /// If the stack has less than `n` items.
    pub fn pop_n(&self, n: usize) -> (Vec<StackItem>, Stack) {
        let mut items = Vec::with_capacity(n);
        let mut stack = self.clone();
        for _ in 0..n {
            let (item, rest) = match stack.pop() {
                Some((item, rest)) => (item.clone(), rest),
                None => panic!("parser stack underflow"),
            };
            items.push(item);
            stack = rest;
        }
        items.reverse();
        (items, stack)
    }

    /// Number of items in the stack.
    pub fn len(&self) -> usize {
        let mut len = 0;
        let mut current = self;
        while let Some(node) = &current.0 {
            len += 1;
            current = &node.next;
        }
        len
    }
}

/// State threaded through the combinators.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParserState {
    pub stack: Stack,
    /// Position in the input, in characters.
    pub pos: usize,
}

/// Identifies a rule in a [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RuleId(usize);

/// Function that converts a matched character into a stack item.
pub(crate) type Converter = fn(char) -> StackItem;

/// Function that replaces the top items in the stack with a new item.
pub(crate) type Reducer = fn(Vec<StackItem>) -> StackItem;

#[derive(Debug, Clone)]
pub(crate) enum Combinator {
    /// Matches a single character from the set, optionally pushing it into
    /// the stack after converting it.
    CharFromSet { set: RangeSet<char>, convert: Option<Converter> },
    /// Matches every combinator in order.
    Sequence(Vec<Combinator>),
    /// Tries each combinator in order, and commits to the first one that
    /// matches.
    Alternative(Vec<Combinator>),
    /// Greedy optional/repeat. Never backtracks into the body.
    OptRep { body: Box<Combinator>, optional: bool, repeating: bool },
    /// Discards the top of the stack.
    Drop,
    /// Pushes a copy of the item into the stack.
    Push(StackItem),
    /// Replaces the top `count` stack items with the reducer's result.
    Reduce { count: usize, reducer: Reducer },
    /// Runs a grammar rule.
    Rule(RuleId),
}

impl Combinator {
    /// Matches `c` without touching the stack.
    pub fn exact(c: char) -> Self {
        Self::CharFromSet { set: RangeSet::only(c), convert: None }
    }

    /// Matches any character in `set`, pushing it converted by `convert`.
    pub fn char_from_set(set: RangeSet<char>, convert: Converter) -> Self {
        Self::CharFromSet { set, convert: Some(convert) }
    }

    pub fn seq(items: Vec<Combinator>) -> Self {
        Self::Sequence(items)
    }

    pub fn alt(items: Vec<Combinator>) -> Self {
        Self::Alternative(items)
    }

    /// Zero or one times.
    pub fn opt(body: Combinator) -> Self {
        Self::OptRep { body: Box::new(body), optional: true, repeating: false }
    }

    /// Zero or more times.
    pub fn many(body: Combinator) -> Self {
        Self::OptRep { body: Box::new(body), optional: true, repeating: true }
    }

    /// One or more times.
    pub fn one_or_more(body: Combinator) -> Self {
        Self::OptRep { body: Box::new(body), optional: false, repeating: true }
    }

    pub fn push(item: StackItem) -> Self {
        Self::Push(item)
    }

    pub fn reduce(count: usize, reducer: Reducer) -> Self {
        Self::Reduce { count, reducer }
    }
}

/// A set of rules that may refer to each other.
#[derive(Debug, Default)]
pub(crate) struct Grammar {
    rules: Vec<OnceLock<Combinator>>,
}

impl Grammar {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Declares a new rule without defining it. The returned identifier can
    /// be used right away in other combinators with [`Combinator::Rule`].
    pub fn declare(&mut self) -> RuleId {
        self.rules.push(OnceLock::new());
        RuleId(self.rules.len() - 1)
    }

    /// Defines the body of a rule previously declared.
    ///
    /// # Panics
    ///
    /// If the rule was already defined.
    pub fn define(&self, rule: RuleId, body: Combinator) {
        if self.rules[rule.0].set(body).is_err() {
            panic!("grammar rule {} defined twice", rule.0);
        }
    }

    /// Runs `combinator` over `input` starting at `state`.
    pub fn run(
        &self,
        combinator: &Combinator,
        input: &[char],
        state: ParserState,
    ) -> Option<ParserState> {
        match combinator {
            Combinator::CharFromSet { set, convert } => {
                let c = *input.get(state.pos)?;
                if !set.contains(c) {
                    return None;
                }
                let stack = match convert {
                    Some(convert) => state.stack.push(convert(c)),
                    None => state.stack,
                };
                Some(ParserState { stack, pos: state.pos + 1 })
            }
            Combinator::Sequence(items) => items
                .iter()
                .try_fold(state, |state, item| self.run(item, input, state)),
            Combinator::Alternative(items) => items
                .iter()
                .find_map(|item| self.run(item, input, state.clone())),
            Combinator::OptRep { body, optional, repeating } => {
                let mut current = match self.run(body, input, state.clone()) {
                    Some(next) => next,
                    None if *optional => return Some(state),
                    None => return None,
                };
                if *repeating {
                    while let Some(next) = self.run(body, input, current.clone())
                    {
                        // A body that doesn't consume input would match
                        // forever.
                        if next.pos == current.pos {
                            break;
                        }
                        current = next;
                    }
                }
                Some(current)
            }
            Combinator::Drop => {
                let (_, stack) = match state.stack.pop() {
                    Some(popped) => popped,
                    None => panic!("parser stack underflow"),
                };
                Some(ParserState { stack, pos: state.pos })
            }
            Combinator::Push(item) => Some(ParserState {
                stack: state.stack.push(item.clone()),
                pos: state.pos,
            }),
            Combinator::Reduce { count, reducer } => {
                let (items, stack) = state.stack.pop_n(*count);
                Some(ParserState { stack: stack.push(reducer(items)), pos: state.pos })
            }
            Combinator::Rule(rule) => match self.rules[rule.0].get() {
                Some(body) => self.run(body, input, state),
                None => panic!("grammar rule {} used but not defined", rule.0),
            },
        }
    }
}
