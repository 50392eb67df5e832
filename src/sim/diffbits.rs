//! Sparse per-lane output divergence record.
//!
//! A [`DiffBits`] records, for one simulation lane, which PO/PPO output
//! indices differ from the good machine. Most faults are observed at only a
//! handful of outputs, so a sorted `Vec<u32>` beats a bitset for both memory
//! and iteration cost at the scale this crate targets.

use fxhash::FxHashMap;

/// The set of output indices (POs first, then PPOs, per
/// [`crate::sim::node::build_arena`]) that differ from the good machine for
/// one (pattern, fault) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DiffBits {
    outputs: Vec<u32>,
}

impl DiffBits {
    pub fn new() -> Self {
        DiffBits::default()
    }

    /// Record that `output_index` differs from the good machine. Idempotent
    /// and order-independent; the internal order is normalized on read.
    pub(crate) fn add_output(&mut self, output_index: u32) {
        if let Err(pos) = self.outputs.binary_search(&output_index) {
            self.outputs.insert(pos, output_index);
        }
    }

    /// Number of differing outputs.
    pub fn elem_num(&self) -> usize {
        self.outputs.len()
    }

    /// Whether any output differs.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// The `i`-th differing output index, in increasing order.
    pub fn output(&self, i: usize) -> u32 {
        self.outputs[i]
    }

    /// Iterate the differing output indices in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.outputs.iter().copied()
    }
}

/// Per-pattern, per-fault detection results accumulated by the batch modes
/// (SPPFP/PPSFP).
#[derive(Debug, Clone, Default)]
pub struct FsimResults {
    /// Keyed by `(pattern_index, fault_index)`. A fault/pattern pair absent
    /// from the map produced an empty (undetected) [`DiffBits`].
    entries: FxHashMap<(u32, u32), DiffBits>,
}

impl FsimResults {
    pub(crate) fn new() -> Self {
        FsimResults::default()
    }

    pub(crate) fn record(&mut self, pattern: u32, fault: u32, diff: DiffBits) {
        if !diff.is_empty() {
            self.entries.insert((pattern, fault), diff);
        }
    }

    /// The recorded divergence for `(pattern, fault)`, or an empty
    /// [`DiffBits`] if that pair was never observed to differ.
    pub fn get(&self, pattern: u32, fault: u32) -> DiffBits {
        self.entries
            .get(&(pattern, fault))
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `fault` was detected (diverged on any output) for `pattern`.
    pub fn detected(&self, pattern: u32, fault: u32) -> bool {
        self.entries.contains_key(&(pattern, fault))
    }

    /// All `(pattern, fault)` pairs that diverged on at least one output.
    pub fn detections(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.entries.keys().copied()
    }
}
