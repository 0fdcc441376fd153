use std::cmp::min;
use std::iter::Zip;
use std::slice::Iter;

use serde::Serialize;

use virtual_offset::VirtualOffset;

/// First read of a ZMW that also begins a new compressed block. Cutting
/// the BAM file at `byte_offset` keeps every ZMW in one piece without
/// touching any compressed block.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize)]
pub struct ZmwBoundary {
    pub record_index: usize,
    pub hole_number: i32,
    pub byte_offset: u64,
}

/// Lazy iterator over ZMW boundaries, produced by
/// `locate_zmw_boundaries`.
pub struct ZmwBoundaries<'a> {
    entries: Zip<Iter<'a, i32>, Iter<'a, VirtualOffset>>,
    record_index: usize,
    prev: Option<(i32, u64)>,
}

/// Finds safe cut points in a BAM file from its per-read hole numbers and
/// virtual offsets, which must be given in file order.
///
/// The first read is always a boundary. Any later read is a boundary only
/// when both its hole number and its compressed block differ from those of
/// the read before it.
pub fn locate_zmw_boundaries<'a>(
    hole_numbers: &'a [i32],
    virtual_offsets: &'a [VirtualOffset],
) -> ZmwBoundaries<'a> {
    ZmwBoundaries {
        entries: hole_numbers.iter().zip(virtual_offsets.iter()),
        record_index: 0,
        prev: None,
    }
}

impl<'a> Iterator for ZmwBoundaries<'a> {
    type Item = ZmwBoundary;

    fn next(&mut self) -> Option<ZmwBoundary> {
        while let Some((&hole_number, voffset)) = self.entries.next() {
            let record_index = self.record_index;
            let byte_offset = voffset.block_offset();
            self.record_index += 1;

            let is_boundary = match self.prev {
                None => true,
                Some((prev_hole, prev_offset)) => hole_number != prev_hole && byte_offset != prev_offset,
            };
            self.prev = Some((hole_number, byte_offset));

            if is_boundary {
                if record_index > 0 && voffset.within_block() != 0 {
                    warn!("Read {} (ZMW {}) starts {} bytes into block {}",
                          record_index, hole_number, voffset.within_block(), byte_offset);
                }
                return Some(ZmwBoundary {
                    record_index: record_index,
                    hole_number: hole_number,
                    byte_offset: byte_offset,
                });
            }
        }
        None
    }
}

/// Picks at most `requested_chunks` boundaries by striding evenly through
/// `boundaries`. The first boundary is always chosen when any are.
pub fn select_chunk_boundaries(boundaries: &[ZmwBoundary], requested_chunks: usize) -> Vec<ZmwBoundary> {
    let nchunks = min(requested_chunks, boundaries.len());
    if nchunks == 0 {
        return Vec::new();
    }

    let stride = (boundaries.len() + nchunks - 1) / nchunks;
    boundaries.iter().step_by(stride).take(nchunks).cloned().collect()
}

/// Byte offsets where chunks begin; see `select_chunk_boundaries`.
pub fn select_chunk_offsets(boundaries: &[ZmwBoundary], requested_chunks: usize) -> Vec<u64> {
    select_chunk_boundaries(boundaries, requested_chunks)
        .into_iter()
        .map(|b| b.byte_offset)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voffsets(blocks: &[(u64, u16)]) -> Vec<VirtualOffset> {
        blocks.iter().map(|&(block, within)| VirtualOffset::from_parts(block, within)).collect()
    }

    fn boundaries_at(offsets: &[u64]) -> Vec<ZmwBoundary> {
        offsets
            .iter()
            .enumerate()
            .map(|(idx, &off)| ZmwBoundary {
                record_index: 10 * idx,
                hole_number: idx as i32,
                byte_offset: off,
            })
            .collect()
    }

    #[test]
    fn empty() {
        assert_eq!(locate_zmw_boundaries(&[], &[]).count(), 0);
        assert!(select_chunk_offsets(&[], 4).is_empty());
    }

    #[test]
    fn zmw_within_block_is_not_a_boundary() {
        let holes = vec![5, 5, 6, 6, 7, 8, 8, 9];
        let vos = voffsets(&[(396, 0), (396, 200), (396, 900), // 6 starts mid-block
                             (1000, 0),                        // same ZMW, new block
                             (1000, 300),                      // new ZMW, same block
                             (2000, 0), (2000, 80),
                             (3000, 0)]);
        let found: Vec<ZmwBoundary> = locate_zmw_boundaries(&holes, &vos).collect();
        let exp = vec![
            ZmwBoundary { record_index: 0, hole_number: 5, byte_offset: 396 },
            ZmwBoundary { record_index: 5, hole_number: 8, byte_offset: 2000 },
            ZmwBoundary { record_index: 7, hole_number: 9, byte_offset: 3000 },
        ];
        assert_eq!(found, exp);
    }

    #[test]
    fn boundary_safety() {
        let holes: Vec<i32> = (0..500).map(|i| i / 3).collect();
        let vos: Vec<VirtualOffset> = (0..500u64).map(|i| VirtualOffset::from_parts(396 + 1000 * (i / 7), 0)).collect();
        let found: Vec<ZmwBoundary> = locate_zmw_boundaries(&holes, &vos).collect();

        assert_eq!(found[0].record_index, 0);
        for b in found.iter().filter(|b| b.record_index > 0) {
            let i = b.record_index;
            assert!(holes[i] != holes[i - 1]);
            assert!(vos[i].block_offset() != vos[i - 1].block_offset());
        }
        for pair in found.windows(2) {
            assert!(pair[0].record_index < pair[1].record_index);
            assert!(pair[0].byte_offset < pair[1].byte_offset);
        }
    }

    #[test]
    fn clamp_to_available() {
        let bounds = boundaries_at(&[396, 26575, 77209]);
        assert_eq!(select_chunk_offsets(&bounds, 4), vec![396, 26575, 77209]);
        assert_eq!(select_chunk_offsets(&bounds, 3), vec![396, 26575, 77209]);
        assert_eq!(select_chunk_offsets(&bounds, 2), vec![396, 77209]);
        assert_eq!(select_chunk_offsets(&bounds, 1), vec![396]);
        assert!(select_chunk_offsets(&bounds, 0).is_empty());
    }

    #[test]
    fn chunk_count_bound() {
        let offsets: Vec<u64> = (0..37).map(|i| 396 + 1000 * i).collect();
        let bounds = boundaries_at(&offsets);
        for requested in 1..50 {
            let chosen = select_chunk_offsets(&bounds, requested);
            assert!(chosen.len() >= 1);
            assert!(chosen.len() <= requested);
            assert!(chosen.len() <= bounds.len());
            assert_eq!(chosen[0], 396);
            assert!(chosen.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn selected_boundaries_keep_reads() {
        let bounds = boundaries_at(&[396, 500, 600, 700, 800]);
        let chosen = select_chunk_boundaries(&bounds, 2);
        assert_eq!(chosen.len(), 2);
        assert_eq!(chosen[0].record_index, 0);
        assert_eq!(chosen[1].record_index, 30);
    }
}
