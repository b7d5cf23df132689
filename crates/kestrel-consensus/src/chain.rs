//! Read-only, height-indexed view of historical headers.
//!
//! Retargeting only ever walks backwards from the tip, one height at a time,
//! for at most one adjustment interval. A chain view therefore only needs
//! lookup by height; the predecessor of a record is whatever the view holds one
//! height below it.

use crate::error::ConsensusError;
use kestrel_core::BlockHeaderRecord;

/// Lookup of header records by height.
///
/// Implementations must return a record whose `height` equals the requested
/// height, and must not change while a retarget computation is reading them.
pub trait HeaderChain {
    /// The record at `height`, if the view holds it.
    fn header_at(&self, height: u64) -> Option<BlockHeaderRecord>;

    /// The record one height below `record`; `None` only for genesis.
    fn predecessor(
        &self,
        record: &BlockHeaderRecord,
    ) -> Result<Option<BlockHeaderRecord>, ConsensusError> {
        if record.is_genesis() {
            return Ok(None);
        }
        let height = record.height - 1;
        self.header_at(height)
            .map(Some)
            .ok_or(ConsensusError::MissingAncestor { height })
    }

    /// The record `steps` heights below `record`.
    fn ancestor(
        &self,
        record: &BlockHeaderRecord,
        steps: u64,
    ) -> Result<BlockHeaderRecord, ConsensusError> {
        if steps == 0 {
            return Ok(*record);
        }
        let height = record
            .height
            .checked_sub(steps)
            .ok_or(ConsensusError::MissingAncestor { height: 0 })?;
        self.header_at(height)
            .ok_or(ConsensusError::MissingAncestor { height })
    }
}

impl<T: HeaderChain + ?Sized> HeaderChain for &T {
    fn header_at(&self, height: u64) -> Option<BlockHeaderRecord> {
        (**self).header_at(height)
    }
}

/// A slice is a chain view when element `i` is the record at height `i`.
impl HeaderChain for [BlockHeaderRecord] {
    fn header_at(&self, height: u64) -> Option<BlockHeaderRecord> {
        let idx = usize::try_from(height).ok()?;
        self.get(idx).copied().filter(|r| r.height == height)
    }
}

/// Append-only, contiguous run of header records starting at `base_height`.
///
/// Holding only the most recent interval's worth of headers is enough for
/// every retarget rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    base_height: u64,
    headers: Vec<BlockHeaderRecord>,
}

impl HeaderIndex {
    /// Empty index starting at genesis.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty index whose first record will be at `base_height`.
    pub fn with_base_height(base_height: u64) -> Self {
        Self {
            base_height,
            headers: Vec::new(),
        }
    }

    /// Build from records ordered oldest to newest. The first record fixes the base height.
    pub fn from_records<I>(records: I) -> Result<Self, ConsensusError>
    where
        I: IntoIterator<Item = BlockHeaderRecord>,
    {
        let mut iter = records.into_iter().peekable();
        let base = iter.peek().map(|r| r.height).unwrap_or(0);
        let mut index = Self::with_base_height(base);
        for record in iter {
            index.push(record)?;
        }
        Ok(index)
    }

    /// Append the next record. Its height must follow the current tip.
    pub fn push(&mut self, record: BlockHeaderRecord) -> Result<(), ConsensusError> {
        let expected = self.next_height().ok_or(ConsensusError::HeightOverflow)?;
        if record.height != expected {
            return Err(ConsensusError::NonContiguousHeight {
                expected,
                got: record.height,
            });
        }
        self.headers.push(record);
        Ok(())
    }

    /// Height the next pushed record must carry; `None` once the tip is at `u64::MAX`.
    pub fn next_height(&self) -> Option<u64> {
        self.base_height.checked_add(self.headers.len() as u64)
    }

    /// Lowest height held.
    pub fn base_height(&self) -> u64 {
        self.base_height
    }

    /// Newest record.
    pub fn tip(&self) -> Option<&BlockHeaderRecord> {
        self.headers.last()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Records oldest to newest.
    pub fn as_slice(&self) -> &[BlockHeaderRecord] {
        &self.headers
    }
}

impl HeaderChain for HeaderIndex {
    fn header_at(&self, height: u64) -> Option<BlockHeaderRecord> {
        let offset = height.checked_sub(self.base_height)?;
        let idx = usize::try_from(offset).ok()?;
        self.headers.get(idx).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(height: u64) -> BlockHeaderRecord {
        BlockHeaderRecord::new(height, 1_700_000_000 + 150 * height as i64, 0x1e0f_ffff)
    }

    #[test]
    fn index_requires_contiguous_heights() {
        let mut index = HeaderIndex::new();
        index.push(rec(0)).expect("genesis");
        index.push(rec(1)).expect("next");
        let err = index.push(rec(3)).expect_err("gap");
        assert!(matches!(
            err,
            ConsensusError::NonContiguousHeight {
                expected: 2,
                got: 3
            }
        ));
        assert_eq!(index.len(), 2);
        assert_eq!(index.tip().map(|r| r.height), Some(1));
    }

    #[test]
    fn index_stops_at_max_height() {
        let mut index = HeaderIndex::with_base_height(u64::MAX);
        index
            .push(BlockHeaderRecord::new(u64::MAX, 1_700_000_000, 0x1e0f_ffff))
            .expect("last representable height");
        assert_eq!(index.next_height(), None);

        let err = index.push(rec(0)).expect_err("no height after u64::MAX");
        assert!(matches!(err, ConsensusError::HeightOverflow));
        assert_eq!(index.len(), 1);
        assert_eq!(index.header_at(0), None);
    }

    #[test]
    fn windowed_index_resolves_by_height() {
        let index = HeaderIndex::from_records((100..110).map(rec)).expect("window");
        assert_eq!(index.base_height(), 100);
        assert_eq!(index.header_at(105), Some(rec(105)));
        assert_eq!(index.header_at(99), None);
        assert_eq!(index.header_at(110), None);

        let tip = *index.tip().expect("tip");
        assert_eq!(index.ancestor(&tip, 9).expect("in window"), rec(100));
        assert!(matches!(
            index.ancestor(&tip, 10),
            Err(ConsensusError::MissingAncestor { height: 99 })
        ));
    }

    #[test]
    fn predecessor_stops_at_genesis() {
        let records: Vec<_> = (0..3).map(rec).collect();
        let chain = records.as_slice();
        assert_eq!(chain.predecessor(&rec(2)).expect("ok"), Some(rec(1)));
        assert_eq!(chain.predecessor(&rec(0)).expect("ok"), None);
    }

    #[test]
    fn slice_view_checks_heights() {
        // Element 1 claims height 5, so it is not the record at height 1.
        let records = vec![rec(0), rec(5)];
        assert_eq!(records.as_slice().header_at(1), None);
        assert!(matches!(
            records.as_slice().predecessor(&rec(2)),
            Err(ConsensusError::MissingAncestor { height: 1 })
        ));
    }
}
