//! Block-chained bump arena holding the records of one display list.
//!
//! The arena owns a vector of fixed-capacity byte blocks. Records are bump
//! allocated inside the current block; when it is full the arena moves on to
//! the next block, reusing blocks kept by [`Arena::clear`] before allocating a
//! new one that is `growth_factor` times larger than the last.
//!
//! Every record starts with an 8-byte header:
//!
//! ```text
//! [u32 total_size (LE, header included)][u8 tag][3 bytes padding]
//! ```
//!
//! followed by the payload. Record sizes are rounded up to [`RECORD_ALIGN`]
//! so a walk can hop from header to header. Payload locations are handed out
//! as [`Span`]s (`block`, `offset`, `len`) rather than addresses; a span stays
//! valid until the next [`Arena::clear`] or [`Arena::release_all`].

use log::debug;
use thiserror::Error;

/// Size of a record header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Alignment of every record.
pub const RECORD_ALIGN: usize = 8;

/// Tag of raw payload records (point lists, strings, parameter blocks).
pub const DATA_TAG: u8 = 0;

/// Default capacity of the first block.
pub const DEFAULT_BLOCK_SIZE: usize = 16 * 1024;

/// Default geometric growth factor for chained blocks.
pub const DEFAULT_GROWTH_FACTOR: f64 = 2.0;

/// Errors produced by the arena.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArenaError {
    #[error("Out of memory allocating {requested} bytes ({allocated} bytes already held)")]
    OutOfMemory { requested: usize, allocated: usize },

    #[error("Corrupt record header in block {block} at offset {offset}")]
    CorruptRecord { block: u32, offset: u32 },

    #[error("Span {0:?} does not point into live arena memory")]
    InvalidSpan(Span),
}

/// Location of a payload inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub block: u32,
    pub offset: u32,
    pub len: u32,
}

impl Span {
    /// Returns true if the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One contiguous memory region.
#[derive(Debug)]
pub struct Block {
    data: Vec<u8>,
    free: usize,
}

impl Block {
    fn try_new(size: usize) -> Option<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(size).ok()?;
        data.resize(size, 0);
        Some(Self { data, free: 0 })
    }

    /// Capacity in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Bytes consumed so far.
    pub fn used(&self) -> usize {
        self.free
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.free
    }
}

/// A record found while walking the arena.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub tag: u8,
    /// Payload location (header excluded, padding included)
    pub span: Span,
    pub payload: &'a [u8],
}

/// Block-chained bump allocator.
#[derive(Debug)]
pub struct Arena {
    blocks: Vec<Block>,
    current: usize,
    block_size: usize,
    growth_factor: f64,
    max_bytes: Option<usize>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE)
    }
}

impl Arena {
    /// Creates an arena whose first block holds `block_size` bytes.
    ///
    /// No memory is allocated until the first record is written.
    pub fn new(block_size: usize) -> Self {
        Self::with_config(block_size, DEFAULT_GROWTH_FACTOR, None)
    }

    /// Creates an arena with explicit growth and an optional byte ceiling.
    pub fn with_config(block_size: usize, growth_factor: f64, max_bytes: Option<usize>) -> Self {
        Self {
            blocks: Vec::new(),
            current: 0,
            block_size: align_up(block_size.max(HEADER_SIZE)),
            growth_factor: growth_factor.max(1.0),
            max_bytes,
        }
    }

    /// Bump-allocates `size` bytes (rounded up to [`RECORD_ALIGN`]).
    ///
    /// # Errors
    /// Returns [`ArenaError::OutOfMemory`] when a new block cannot be
    /// obtained or would exceed the configured ceiling.
    pub fn allocate(&mut self, size: usize) -> Result<Span, ArenaError> {
        let size = align_up(size);
        self.reserve_or_grow(size)?;

        let block = &mut self.blocks[self.current];
        let offset = block.free;
        block.free += size;

        Ok(Span {
            block: self.current as u32,
            offset: offset as u32,
            len: size as u32,
        })
    }

    /// Makes sure the next `size` bytes can be allocated contiguously in the
    /// current block, moving to a reused or freshly chained block if needed.
    pub fn reserve_or_grow(&mut self, size: usize) -> Result<(), ArenaError> {
        let size = align_up(size);

        if self
            .blocks
            .get(self.current)
            .is_some_and(|block| block.remaining() >= size)
        {
            return Ok(());
        }

        // Blocks kept by `clear` are reused in order before growing.
        while self.current + 1 < self.blocks.len() {
            self.current += 1;
            if self.blocks[self.current].remaining() >= size {
                return Ok(());
            }
        }

        let next_size = match self.blocks.last() {
            Some(last) => (last.size() as f64 * self.growth_factor) as usize,
            None => self.block_size,
        };
        let next_size = align_up(next_size.max(size));
        let allocated = self.capacity();

        if self
            .max_bytes
            .is_some_and(|limit| allocated.saturating_add(next_size) > limit)
        {
            return Err(ArenaError::OutOfMemory {
                requested: size,
                allocated,
            });
        }

        let block = Block::try_new(next_size).ok_or(ArenaError::OutOfMemory {
            requested: size,
            allocated,
        })?;

        debug!(
            "Arena chained block #{} ({} bytes, {} held)",
            self.blocks.len(),
            next_size,
            allocated + next_size
        );

        self.blocks.push(block);
        self.current = self.blocks.len() - 1;
        Ok(())
    }

    /// Writes a record with the given tag and payload.
    ///
    /// Returns the payload span, whose `len` is the exact payload length.
    pub fn push_record(&mut self, tag: u8, payload: &[u8]) -> Result<Span, ArenaError> {
        let total = align_up(HEADER_SIZE + payload.len());
        let span = self.allocate(total)?;

        let block = &mut self.blocks[span.block as usize];
        let start = span.offset as usize;
        let header = &mut block.data[start..start + HEADER_SIZE];
        header[..4].copy_from_slice(&(total as u32).to_le_bytes());
        header[4] = tag;
        header[5..].fill(0);

        let body = start + HEADER_SIZE;
        block.data[body..body + payload.len()].copy_from_slice(payload);
        block.data[body + payload.len()..start + total].fill(0);

        Ok(Span {
            block: span.block,
            offset: body as u32,
            len: payload.len() as u32,
        })
    }

    /// Writes a zero-filled raw data record of `len` bytes.
    pub fn push_data(&mut self, len: usize) -> Result<Span, ArenaError> {
        let total = align_up(HEADER_SIZE + len);
        let span = self.allocate(total)?;

        let block = &mut self.blocks[span.block as usize];
        let start = span.offset as usize;
        block.data[start..start + 4].copy_from_slice(&(total as u32).to_le_bytes());
        block.data[start + 4..start + total].fill(0);

        Ok(Span {
            block: span.block,
            offset: (start + HEADER_SIZE) as u32,
            len: len as u32,
        })
    }

    /// Returns the bytes covered by `span`.
    pub fn get(&self, span: Span) -> Result<&[u8], ArenaError> {
        let block = self
            .blocks
            .get(span.block as usize)
            .ok_or(ArenaError::InvalidSpan(span))?;
        let start = span.offset as usize;
        let end = start + span.len as usize;
        if end > block.free {
            return Err(ArenaError::InvalidSpan(span));
        }
        Ok(&block.data[start..end])
    }

    /// Returns the bytes covered by `span` for in-place updates.
    pub fn get_mut(&mut self, span: Span) -> Result<&mut [u8], ArenaError> {
        let block = self
            .blocks
            .get_mut(span.block as usize)
            .ok_or(ArenaError::InvalidSpan(span))?;
        let start = span.offset as usize;
        let end = start + span.len as usize;
        if end > block.free {
            return Err(ArenaError::InvalidSpan(span));
        }
        Ok(&mut block.data[start..end])
    }

    /// Rewinds every block without releasing memory.
    pub fn clear(&mut self) {
        for block in &mut self.blocks {
            block.free = 0;
        }
        self.current = 0;
    }

    /// Frees every block.
    pub fn release_all(&mut self) {
        self.blocks.clear();
        self.current = 0;
    }

    /// Walks every record in allocation order.
    pub fn records(&self) -> Records<'_> {
        Records {
            arena: self,
            block: 0,
            offset: 0,
            failed: false,
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Bytes consumed across all blocks.
    pub fn bytes_used(&self) -> usize {
        self.blocks.iter().map(Block::used).sum()
    }

    /// Bytes held across all blocks.
    pub fn capacity(&self) -> usize {
        self.blocks.iter().map(Block::size).sum()
    }

    /// Returns true if no record has been written since the last clear.
    pub fn is_empty(&self) -> bool {
        self.bytes_used() == 0
    }
}

/// Iterator over the records of an [`Arena`].
pub struct Records<'a> {
    arena: &'a Arena,
    block: usize,
    offset: usize,
    failed: bool,
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>, ArenaError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let block = self.arena.blocks.get(self.block)?;
            if self.offset + HEADER_SIZE > block.free {
                self.block += 1;
                self.offset = 0;
                continue;
            }

            let start = self.offset;
            let header = &block.data[start..start + HEADER_SIZE];
            let total = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
            let tag = header[4];

            if total < HEADER_SIZE || total % RECORD_ALIGN != 0 || start + total > block.free {
                self.failed = true;
                return Some(Err(ArenaError::CorruptRecord {
                    block: self.block as u32,
                    offset: start as u32,
                }));
            }

            self.offset += total;
            let body = start + HEADER_SIZE;
            return Some(Ok(Record {
                tag,
                span: Span {
                    block: self.block as u32,
                    offset: body as u32,
                    len: (total - HEADER_SIZE) as u32,
                },
                payload: &block.data[body..start + total],
            }));
        }
    }
}

fn align_up(size: usize) -> usize {
    size.div_ceil(RECORD_ALIGN) * RECORD_ALIGN
}

/// Bytes a record with a `payload_len`-byte payload occupies, header and
/// padding included.
pub fn record_size(payload_len: usize) -> usize {
    align_up(HEADER_SIZE + payload_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_aligned_and_bump() {
        let mut arena = Arena::new(64);
        let a = arena.allocate(3).unwrap();
        let b = arena.allocate(8).unwrap();
        assert_eq!((a.block, a.offset, a.len), (0, 0, 8));
        assert_eq!((b.block, b.offset), (0, 8));
        assert_eq!(arena.bytes_used(), 16);
    }

    #[test]
    fn full_block_chains_a_larger_one() {
        let mut arena = Arena::new(32);
        arena.allocate(24).unwrap();
        let span = arena.allocate(16).unwrap();
        assert_eq!(span.block, 1);
        assert_eq!(arena.block_count(), 2);
        assert_eq!(arena.capacity(), 32 + 64);
    }

    #[test]
    fn oversized_request_gets_its_own_block() {
        let mut arena = Arena::new(32);
        let span = arena.allocate(200).unwrap();
        assert_eq!(span.block, 0);
        assert!(arena.capacity() >= 200);
    }

    #[test]
    fn clear_keeps_blocks_and_reuses_them() {
        let mut arena = Arena::new(32);
        arena.allocate(24).unwrap();
        arena.allocate(24).unwrap();
        assert_eq!(arena.block_count(), 2);

        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.block_count(), 2);

        arena.allocate(24).unwrap();
        let second = arena.allocate(24).unwrap();
        assert_eq!(second.block, 1);
        assert_eq!(arena.block_count(), 2);
    }

    #[test]
    fn release_all_drops_memory() {
        let mut arena = Arena::new(32);
        arena.allocate(8).unwrap();
        arena.release_all();
        assert_eq!(arena.block_count(), 0);
        assert_eq!(arena.capacity(), 0);
    }

    #[test]
    fn byte_ceiling_reports_out_of_memory() {
        let mut arena = Arena::with_config(32, 2.0, Some(64));
        arena.allocate(32).unwrap();
        let err = arena.allocate(8).unwrap_err();
        assert!(matches!(err, ArenaError::OutOfMemory { .. }));
    }

    #[test]
    fn records_walk_in_allocation_order() {
        let mut arena = Arena::new(32);
        arena.push_record(3, &[1, 2, 3]).unwrap();
        arena.push_data(20).unwrap();
        arena.push_record(5, &[9; 12]).unwrap();

        let tags: Vec<u8> = arena.records().map(|r| r.unwrap().tag).collect();
        assert_eq!(tags, vec![3, DATA_TAG, 5]);

        let first = arena.records().next().unwrap().unwrap();
        assert_eq!(&first.payload[..3], &[1, 2, 3]);
    }

    #[test]
    fn spans_allow_in_place_updates() {
        let mut arena = Arena::new(64);
        let span = arena.push_data(8).unwrap();
        arena.get_mut(span).unwrap()[0] = 42;
        assert_eq!(arena.get(span).unwrap()[0], 42);

        arena.clear();
        assert!(matches!(arena.get(span), Err(ArenaError::InvalidSpan(_))));
    }
}
