/*! Sets of symbols represented as sorted lists of boundaries.

A [`RangeSet`] describes a set of symbols (characters, bytes) as an ascending
list of boundary points. Each boundary toggles membership: a symbol `x`
belongs to the set when the number of boundaries that are less than or equal
to `x` is odd. For instance, over `char`, the list `['a', 'g', 'x']` stands
for `a-f` plus every character from `x` up to `char::MAX`.

All the boolean operations walk two boundary lists together (see
[`RangeSet::merge`]), keeping track of whether each operand is "inside" at the
current point, and emit a boundary whenever the combined state flips. The
result is always canonical: strictly increasing, with no repeated boundaries,
so two sets are equal if and only if their boundary lists are equal.

The [`Splitter`] partitions the symbol domain into the coarsest collection
of pairwise-disjoint pieces that respects every set it has been fed. Subset
construction and minimization use it for deriving deterministic transitions.
*/

use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;
use std::ops::RangeInclusive;

use itertools::{EitherOrBoth, Itertools};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

pub use splitter::Splitter;

mod splitter;


/// A totally ordered symbol domain with a first element and a successor
/// function.
///
/// The domain is finite, [`Symbol::successor`] returns `None` for its last
/// element.
pub trait Symbol: Copy + Ord + Hash + Debug {
    /// The smallest symbol in the domain.
    const MIN: Self;

    /// The largest symbol in the domain.
    const MAX: Self;

    /// Returns the symbol that immediately follows `self`, or `None` if
    /// `self` is the largest symbol in the domain.
    fn successor(self) -> Option<Self>;

    /// Returns the symbol that immediately precedes `self`, or `None` if
    /// `self` is [`Symbol::MIN`].
    fn predecessor(self) -> Option<Self>;
}

impl Symbol for char {
    const MIN: Self = '\0';
    const MAX: Self = char::MAX;

    #[inline]
    fn successor(self) -> Option<Self> {
        match self {
            // Surrogates are not valid `char` values.
            '\u{D7FF}' => Some('\u{E000}'),
            c => char::from_u32(c as u32 + 1),
        }
    }

    #[inline]
    fn predecessor(self) -> Option<Self> {
        match self {
            '\0' => None,
            '\u{E000}' => Some('\u{D7FF}'),
            c => char::from_u32(c as u32 - 1),
        }
    }
}

impl Symbol for u8 {
    const MIN: Self = 0;
    const MAX: Self = u8::MAX;

    #[inline]
    fn successor(self) -> Option<Self> {
        self.checked_add(1)
    }

    #[inline]
    fn predecessor(self) -> Option<Self> {
        self.checked_sub(1)
    }
}

/// A set of symbols represented by its boundaries.
///
/// See the [module documentation](self) for details about the
/// representation.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(
    try_from = "Vec<T>",
    bound(deserialize = "T: Ord + Deserialize<'de>")
)]
pub struct RangeSet<T> {
    boundaries: Vec<T>,
}

/// Error returned when building a [`RangeSet`] from a boundary list that is
/// not strictly increasing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("range set boundaries are not strictly increasing")]
pub struct InvalidBoundaries;

impl<T: Ord> TryFrom<Vec<T>> for RangeSet<T> {
    type Error = InvalidBoundaries;

    fn try_from(boundaries: Vec<T>) -> Result<Self, Self::Error> {
        if boundaries.windows(2).all(|w| w[0] < w[1]) {
            Ok(Self { boundaries })
        } else {
            Err(InvalidBoundaries)
        }
    }
}

impl<T: Serialize> Serialize for RangeSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.boundaries.serialize(serializer)
    }
}

impl<T: Symbol> RangeSet<T> {
    /// The set that contains no symbols.
    pub fn empty() -> Self {
        Self { boundaries: Vec::new() }
    }

    /// The set that contains every symbol in the domain.
    pub fn full() -> Self {
        Self { boundaries: vec![T::MIN] }
    }

    /// The set that contains `item` only.
    pub fn only(item: T) -> Self {
        let mut boundaries = vec![item];
        boundaries.extend(item.successor());
        Self { boundaries }
    }

    /// The set that contains every symbol except `item`.
    pub fn all_except(item: T) -> Self {
        Self::only(item).complement()
    }

    /// The set of symbols that are strictly less than `item`.
    pub fn less_than(item: T) -> Self {
        if item == T::MIN {
            // Nothing is less than the first symbol.
            Self::empty()
        } else {
            Self { boundaries: vec![T::MIN, item] }
        }
    }

    /// The set of symbols that are less than or equal to `item`.
    pub fn less_equal(item: T) -> Self {
        match item.successor() {
            Some(next) => Self { boundaries: vec![T::MIN, next] },
            // Everything is less than or equal to the last symbol.
            None => Self::full(),
        }
    }

    /// The set of symbols that are strictly greater than `item`.
    pub fn greater_than(item: T) -> Self {
        match item.successor() {
            Some(next) => Self { boundaries: vec![next] },
            None => Self::empty(),
        }
    }

    /// The set of symbols that are greater than or equal to `item`.
    pub fn greater_equal(item: T) -> Self {
        Self { boundaries: vec![item] }
    }

    /// The set of symbols in the inclusive range `start..=end`. Returns an
    /// empty set if `start > end`.
    pub fn range(start: T, end: T) -> Self {
        Self::greater_equal(start).intersection(&Self::less_equal(end))
    }

    /// The set that contains every symbol in `items`.
    pub fn any_of<I: IntoIterator<Item = T>>(items: I) -> Self {
        Self::union_all(items.into_iter().map(Self::only))
    }

    /// The set that contains every symbol except the ones in `items`.
    pub fn any_except<I: IntoIterator<Item = T>>(items: I) -> Self {
        Self::intersection_all(items.into_iter().map(Self::all_except))
    }

    /// Union of all the sets produced by `sets`. Empty if there are no sets.
    pub fn union_all<I: IntoIterator<Item = Self>>(sets: I) -> Self {
        sets.into_iter().fold(Self::empty(), |acc, set| acc.union(&set))
    }

    /// Intersection of all the sets produced by `sets`. Full if there are no
    /// sets.
    pub fn intersection_all<I: IntoIterator<Item = Self>>(sets: I) -> Self {
        sets.into_iter()
            .fold(Self::full(), |acc, set| acc.intersection(&set))
    }

    /// Returns true if the set contains no symbols.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Returns true if the set contains every symbol in the domain.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.boundaries.len() == 1 && self.boundaries[0] == T::MIN
    }

    /// Returns true if `item` is in the set.
    pub fn contains(&self, item: T) -> bool {
        self.boundaries.partition_point(|b| *b <= item) & 1 == 1
    }

    /// Returns the boundaries that define this set.
    #[inline]
    pub fn boundaries(&self) -> &[T] {
        self.boundaries.as_slice()
    }

    /// Returns the set of symbols that are not in `self`.
    pub fn complement(&self) -> Self {
        let mut boundaries = self.boundaries.clone();
        if boundaries.first() == Some(&T::MIN) {
            boundaries.remove(0);
        } else {
            boundaries.insert(0, T::MIN);
        }
        Self { boundaries }
    }

    /// Symbols that are in `self`, in `other`, or in both.
    pub fn union(&self, other: &Self) -> Self {
        self.merge(other, |a, b| a || b)
    }

    /// Symbols that are both in `self` and `other`.
    pub fn intersection(&self, other: &Self) -> Self {
        self.merge(other, |a, b| a && b)
    }

    /// Symbols that are in `self` but not in `subtrahend`.
    pub fn difference(&self, subtrahend: &Self) -> Self {
        self.merge(subtrahend, |a, b| a && !b)
    }

    /// Symbols that are either in `self` or in `other`, but not in both.
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        self.merge(other, |a, b| a != b)
    }

    /// Returns true if `self` and `other` have no symbols in common.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.intersection(other).is_empty()
    }

    /// Returns a set that agrees with `self` on every symbol that is not in
    /// `ignored`. Inside `ignored` the result simply extends whatever state
    /// it had right before entering the ignored region, so no boundaries
    /// fall strictly inside `ignored`.
    pub fn dont_care(&self, ignored: &Self) -> Self {
        let mut boundaries = Vec::new();
        let mut inside_self = false;
        let mut inside_result = false;
        let mut care = true;

        for item in self
            .boundaries
            .iter()
            .merge_join_by(ignored.boundaries.iter(), |a, b| a.cmp(b))
        {
            let (b, toggles_self, toggles_care) = match item {
                EitherOrBoth::Left(b) => (b, true, false),
                EitherOrBoth::Right(b) => (b, false, true),
                EitherOrBoth::Both(b, _) => (b, true, true),
            };
            if toggles_self {
                inside_self = !inside_self;
            }
            if toggles_care {
                care = !care;
            }
            // Boundaries are only emitted where the symbols matter, and only
            // if the result disagrees with `self` at that point.
            if care && inside_result != inside_self {
                boundaries.push(*b);
                inside_result = !inside_result;
            }
        }

        Self { boundaries }
    }

    /// Combines `self` and `other` with a boolean function.
    ///
    /// Walks both boundary lists in order, toggling the "inside" state of the
    /// operand(s) that have a boundary at each point. A boundary is emitted
    /// in the result exactly when `f(inside_self, inside_other)` changes.
    pub fn merge<F>(&self, other: &Self, f: F) -> Self
    where
        F: Fn(bool, bool) -> bool,
    {
        let mut boundaries = Vec::new();
        let mut left = false;
        let mut right = false;
        let mut state = f(false, false);

        // Operations where `f(false, false)` is true (i.e: complement-like
        // operations) start "inside" at the domain's first symbol.
        if state {
            boundaries.push(T::MIN);
        }

        for item in self
            .boundaries
            .iter()
            .merge_join_by(other.boundaries.iter(), |a, b| a.cmp(b))
        {
            let b = match item {
                EitherOrBoth::Left(b) => {
                    left = !left;
                    b
                }
                EitherOrBoth::Right(b) => {
                    right = !right;
                    b
                }
                EitherOrBoth::Both(b, _) => {
                    left = !left;
                    right = !right;
                    b
                }
            };
            let new_state = f(left, right);
            if new_state != state {
                // A boundary at `T::MIN` may coincide with the implicit one
                // pushed above, in which case both cancel out.
                if boundaries.last() == Some(b) {
                    boundaries.pop();
                } else {
                    boundaries.push(*b);
                }
                state = new_state;
            }
        }

        Self { boundaries }
    }

    /// Returns an iterator over the maximal inclusive ranges in the set, in
    /// ascending order.
    pub fn ranges(&self) -> impl Iterator<Item = RangeInclusive<T>> + '_ {
        self.boundaries.chunks(2).filter_map(|chunk| match chunk {
            [start, end] => end.predecessor().map(|end| *start..=end),
            [start] => Some(*start..=T::MAX),
            _ => None,
        })
    }
}

impl<T: Symbol> Default for RangeSet<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Debug> Debug for RangeSet<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RangeSet{:?}", self.boundaries)
    }
}

impl Display for RangeSet<char> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, range) in self.ranges().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let (start, end) = range.into_inner();
            if start == end {
                write!(f, "{}", start.escape_debug())?;
            } else {
                write!(f, "{}-{}", start.escape_debug(), end.escape_debug())?;
            }
        }
        write!(f, "]")
    }
}

impl Display for RangeSet<u8> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, range) in self.ranges().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let (start, end) = range.into_inner();
            if start == end {
                write!(f, "{:#04x}", start)?;
            } else {
                write!(f, "{:#04x}-{:#04x}", start, end)?;
            }
        }
        write!(f, "]")
    }
}
