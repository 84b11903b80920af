// Surrogate keys for the songplays fact table
//
// Rows are split into fixed-size shards. Each id is the shard index in the
// upper bits plus the row's offset inside the shard in the lower 33 bits, so
// ids grow strictly within a run without any cross-shard coordination.
// Ids are neither contiguous nor stable across runs.

/// Bits reserved for the in-shard offset
pub const OFFSET_BITS: u32 = 33;

/// Default number of rows per shard
pub const DEFAULT_SHARD_ROWS: usize = 32 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonotonicIdGenerator {
    shard_rows: usize,
}

impl Default for MonotonicIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SHARD_ROWS)
    }
}

impl MonotonicIdGenerator {
    /// Shard size is clamped to `1..=2^33` so offsets always fit their bits.
    pub fn new(shard_rows: usize) -> Self {
        let max = usize::try_from(1u64 << OFFSET_BITS).unwrap_or(usize::MAX);
        Self {
            shard_rows: shard_rows.clamp(1, max),
        }
    }

    pub fn shard_rows(&self) -> usize {
        self.shard_rows
    }

    /// Id for the row at `index` in the run's output order
    pub fn id_for(&self, index: usize) -> i64 {
        let shard = (index / self.shard_rows) as i64;
        let offset = (index % self.shard_rows) as i64;
        (shard << OFFSET_BITS) + offset
    }

    /// Ids for `count` rows, in order
    pub fn ids(&self, count: usize) -> impl Iterator<Item = i64> + '_ {
        (0..count).map(move |i| self.id_for(i))
    }
}
