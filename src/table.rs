//! Per-handle chunk coverage table.
//!
//! Each physical chunk file stores a contiguous run of items of the logical
//! array. The table records, in chunk-index order, which global item range
//! each file covers and where its item data begins.
use crate::read::ReadError;

//-----------------------------------------------------------------------------
/// Coverage and layout of one physical chunk file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    /// Global index of the first item stored in the chunk (inclusive).
    pub start: u64,
    /// Global index of the last item stored in the chunk (inclusive).
    pub last: u64,
    /// Number of items physically stored in the chunk.
    pub step: u64,
    /// Byte offset within the chunk file where item data begins.
    pub header_offset: u64,
}

impl ChunkDescriptor {
    /// `true` if global item `pos` falls inside `[start, last]`.
    pub fn contains(&self, pos: u64) -> bool {
        self.start <= pos && pos <= self.last
    }
}

//-----------------------------------------------------------------------------
/// Ordered sequence of chunk descriptors, fixed at handle creation.
///
/// Ranges are expected to be contiguous, non-overlapping and gap free.
/// Reading never checks this; call [`ChunkTable::validate`] when the table
/// comes from untrusted headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkTable {
    chunks: Vec<ChunkDescriptor>,
}

impl ChunkTable {
    pub fn new(chunks: Vec<ChunkDescriptor>) -> Self {
        Self { chunks }
    }

    /// Number of chunk files.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&ChunkDescriptor> {
        self.chunks.get(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChunkDescriptor> {
        self.chunks.iter()
    }

    /// Total number of items stored across all chunks.
    pub fn total_items(&self) -> u64 {
        self.chunks.iter().map(|c| c.step).sum()
    }

    /// Check ordering, contiguity and per-chunk capacity.
    pub fn validate(&self) -> Result<(), ReadError> {
        let mut expected_start = self.chunks.first().map(|c| c.start);
        for (i, c) in self.chunks.iter().enumerate() {
            if c.start > c.last {
                return Err(ReadError::InvalidTable(format!(
                    "chunk {}: start {} > last {}",
                    i, c.start, c.last
                )));
            }
            if Some(c.start) != expected_start {
                return Err(ReadError::InvalidTable(format!(
                    "chunk {}: starts at {}, expected {}",
                    i,
                    c.start,
                    expected_start.unwrap_or(0)
                )));
            }
            if c.last - c.start + 1 != c.step {
                return Err(ReadError::InvalidTable(format!(
                    "chunk {}: covers {} items but stores {}",
                    i,
                    c.last - c.start + 1,
                    c.step
                )));
            }
            expected_start = Some(c.last + 1);
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ChunkTable {
    type Item = &'a ChunkDescriptor;
    type IntoIter = std::slice::Iter<'a, ChunkDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

impl From<Vec<ChunkDescriptor>> for ChunkTable {
    fn from(chunks: Vec<ChunkDescriptor>) -> Self {
        Self::new(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(start: u64, last: u64) -> ChunkDescriptor {
        ChunkDescriptor {
            start,
            last,
            step: last - start + 1,
            header_offset: 0,
        }
    }

    #[test]
    fn contiguous_table_is_valid() {
        let table = ChunkTable::new(vec![chunk(0, 9), chunk(10, 19), chunk(20, 24)]);
        assert!(table.validate().is_ok());
        assert_eq!(table.total_items(), 25);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn gap_is_rejected() {
        let table = ChunkTable::new(vec![chunk(0, 9), chunk(11, 19)]);
        assert!(matches!(table.validate(), Err(ReadError::InvalidTable(_))));
    }

    #[test]
    fn step_mismatch_is_rejected() {
        let mut c = chunk(0, 9);
        c.step = 4;
        assert!(ChunkTable::new(vec![c]).validate().is_err());
    }

    #[test]
    fn empty_table_is_valid() {
        assert!(ChunkTable::default().validate().is_ok());
        assert_eq!(ChunkTable::default().total_items(), 0);
    }
}
