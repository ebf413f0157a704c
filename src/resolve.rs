//! Mapping of a global read request onto per-chunk `(skip, take)` slices.
//!
//! Resolution is purely local: it looks only at the calling member's
//! position and count. Group agreement on which chunks get opened happens
//! afterwards, in the read engine.
use crate::table::ChunkTable;

//-----------------------------------------------------------------------------
/// What one chunk contributes to one read call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSlice {
    /// Chunk index, also the numeric suffix of the chunk file name.
    pub chunk: usize,
    /// Items to bypass at the start of the chunk's local storage.
    pub skip: u64,
    /// Items to read from the chunk.
    pub take: u64,
    /// Items already placed in the caller's buffer by earlier chunks.
    pub buffer_items: u64,
}

/// Result of resolving one read request against a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// One entry per chunk, in chunk order, including chunks with `take == 0`.
    pub slices: Vec<ChunkSlice>,
    /// Running position after every chunk has been evaluated.
    pub end: u64,
    /// Sum of `take` over all slices.
    pub items: u64,
}

//-----------------------------------------------------------------------------
/// Resolve `count` items starting at global item `pos` against `table`.
///
/// Every chunk is evaluated exactly once, in ascending order. A chunk whose
/// coverage contains the running position yields
/// `skip = pos - start` and `take = min(remaining, step - skip)`; any other
/// chunk yields an empty slice. `skip + take` never exceeds `step`.
pub fn resolve(mut pos: u64, count: u64, table: &ChunkTable) -> Resolution {
    let mut remaining = count;
    let mut items = 0;
    let slices = table
        .iter()
        .enumerate()
        .map(|(chunk, c)| {
            let (skip, take) = if c.contains(pos) {
                let skip = pos - c.start;
                (skip, remaining.min(c.step.saturating_sub(skip)))
            } else {
                (0, 0)
            };
            let slice = ChunkSlice {
                chunk,
                skip,
                take,
                buffer_items: items,
            };
            pos += take;
            remaining -= take;
            items += take;
            slice
        })
        .collect();
    Resolution {
        slices,
        end: pos,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ChunkDescriptor;

    fn table(bounds: &[(u64, u64)]) -> ChunkTable {
        bounds
            .iter()
            .map(|&(start, last)| ChunkDescriptor {
                start,
                last,
                step: last - start + 1,
                header_offset: 16,
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn takes(r: &Resolution) -> Vec<(u64, u64)> {
        r.slices.iter().map(|s| (s.skip, s.take)).collect()
    }

    #[test]
    fn spans_two_chunks() {
        let t = table(&[(0, 9), (10, 19)]);
        let r = resolve(5, 8, &t);
        assert_eq!(takes(&r), vec![(5, 5), (0, 3)]);
        assert_eq!(r.end, 13);
        assert_eq!(r.items, 8);
        assert_eq!(r.slices[1].buffer_items, 5);
    }

    #[test]
    fn satisfied_by_prefix() {
        let t = table(&[(0, 9), (10, 19), (20, 29)]);
        let r = resolve(2, 3, &t);
        assert_eq!(takes(&r), vec![(2, 3), (0, 0), (0, 0)]);
        assert_eq!(r.end, 5);
    }

    #[test]
    fn starts_in_later_chunk() {
        let t = table(&[(0, 9), (10, 19), (20, 29)]);
        let r = resolve(12, 15, &t);
        assert_eq!(takes(&r), vec![(0, 0), (2, 8), (0, 7)]);
        assert_eq!(r.end, 27);
    }

    #[test]
    fn zero_count_reads_nothing() {
        let t = table(&[(0, 9), (10, 19)]);
        let r = resolve(10, 0, &t);
        assert!(r.slices.iter().all(|s| s.take == 0));
        assert_eq!(r.end, 10);
        assert_eq!(r.items, 0);
    }

    #[test]
    fn past_end_reads_nothing() {
        let t = table(&[(0, 9), (10, 19)]);
        let r = resolve(20, 5, &t);
        assert_eq!(r.items, 0);
        assert_eq!(r.end, 20);
    }

    #[test]
    fn exhausted_table_truncates() {
        let t = table(&[(0, 9), (10, 19)]);
        let r = resolve(15, 10, &t);
        assert_eq!(r.items, 5);
        assert_eq!(r.end, 20);
    }

    #[test]
    fn step_smaller_than_coverage_never_over_reads() {
        let t: ChunkTable = vec![ChunkDescriptor {
            start: 0,
            last: 9,
            step: 4,
            header_offset: 0,
        }]
        .into();
        let r = resolve(6, 3, &t);
        assert_eq!(takes(&r), vec![(6, 0)]);
    }

    #[test]
    fn exact_sum_and_capacity_over_all_requests() {
        let t = table(&[(0, 6), (7, 7), (8, 19), (20, 32)]);
        let total = 33;
        for cursor in 0..total {
            for count in 0..=(total - cursor) {
                let r = resolve(cursor, count, &t);
                assert_eq!(r.items, count, "cursor {} count {}", cursor, count);
                assert_eq!(r.end, cursor + count);
                for (s, c) in r.slices.iter().zip(t.iter()) {
                    assert!(s.skip + s.take <= c.step);
                }
                assert_eq!(r, resolve(cursor, count, &t));
            }
        }
    }
}
