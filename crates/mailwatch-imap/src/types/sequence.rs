//! Sequence sets for message ranges.

use super::SeqNum;

/// Messages addressed by a FETCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// Single sequence number.
    Single(SeqNum),
    /// Range of sequence numbers (inclusive).
    Range(SeqNum, SeqNum),
}

impl SequenceSet {
    /// Creates a range sequence set; a one-element range collapses to
    /// [`SequenceSet::Single`].
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        if start == end {
            return SeqNum::new(start).map(Self::Single);
        }
        Some(Self::Range(SeqNum::new(start)?, SeqNum::new(end)?))
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
        }
    }
}
