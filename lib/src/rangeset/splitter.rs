use crate::rangeset::{RangeSet, Symbol};

/// Partitions the symbol domain into pairwise-disjoint pieces.
///
/// The splitter starts with a single piece covering the whole domain. Each
/// call to [`Splitter::split`] breaks every existing piece in two: the part
/// inside the given set and the part outside it. Empty parts are dropped, so
/// the pieces are always non-empty, pairwise disjoint, and their union is the
/// whole domain.
///
/// After feeding it the sets `s1..sn`, every piece is either fully inside or
/// fully outside each `si`, and no two pieces could be merged without
/// breaking that property.
#[derive(Debug, Clone)]
pub struct Splitter<T> {
    pieces: Vec<RangeSet<T>>,
}

impl<T: Symbol> Splitter<T> {
    /// Creates a splitter with a single piece covering the whole domain.
    pub fn new() -> Self {
        Self { pieces: vec![RangeSet::full()] }
    }

    /// Refines the current pieces with `set`.
    pub fn split(&mut self, set: &RangeSet<T>) {
        let mut pieces = Vec::with_capacity(self.pieces.len() * 2);
        for piece in self.pieces.drain(..) {
            let inside = piece.intersection(set);
            let outside = piece.difference(set);
            if !inside.is_empty() {
                pieces.push(inside);
            }
            if !outside.is_empty() {
                pieces.push(outside);
            }
        }
        self.pieces = pieces;
    }

    /// Refines the current pieces with every set in `sets`.
    pub fn split_all<'a, I>(&mut self, sets: I)
    where
        I: IntoIterator<Item = &'a RangeSet<T>>,
        T: 'a,
    {
        for set in sets {
            self.split(set);
        }
    }

    /// Returns the current pieces.
    #[inline]
    pub fn pieces(&self) -> &[RangeSet<T>] {
        self.pieces.as_slice()
    }

    /// Consumes the splitter and returns its pieces.
    #[inline]
    pub fn into_pieces(self) -> Vec<RangeSet<T>> {
        self.pieces
    }
}

impl<T: Symbol> Default for Splitter<T> {
    fn default() -> Self {
        Self::new()
    }
}
