//! The simulator's internal per-fault simulation record.

use crate::fault::FaultKind;
use crate::ids::{FaultId, SimId};
use crate::packed::Bits64;

/// Per-fault simulation state, derived from a public [`crate::fault::Fault`]
/// at installation time and owned by the [`super::SimCore`] that installed it.
pub(crate) struct SimFault {
    /// Gate at whose output the fault's effect is injected: for a branch
    /// fault this is the fanout gate reading the faulty branch, for a stem
    /// fault it is the faulty gate itself.
    pub(crate) origin_node: SimId,
    /// Fanin position at `origin_node` for a branch fault; `None` for a stem
    /// fault (the whole gate output is stuck or delayed).
    pub(crate) branch_ipos: Option<usize>,
    /// The node whose good-machine value the excitation condition is
    /// computed from: `origin_node` itself for a stem fault, the driver of
    /// `branch_ipos` for a branch fault.
    pub(crate) input_node: SimId,
    /// `false` = stuck-at-0 / rising transition, `true` = stuck-at-1 / falling.
    pub(crate) polarity: bool,
    pub(crate) kind: FaultKind,
    pub(crate) skip: bool,
    /// Lane this fault occupies in the current 64-wide batch of its FFR, once
    /// assigned by the most recent `eval_faults_batched` pass that included
    /// it. `None` if it has never been batched.
    pub(crate) lane: Option<u32>,
    /// Observability mask at the FFR root computed by the last FFR-local
    /// pass that included this fault: at most the fault's own lane bit is
    /// ever set.
    pub(crate) obs_mask: Bits64,
    /// Representative fault of this fault's equivalence class, for fault
    /// collapsing bookkeeping. Purely informational: every live entry is
    /// simulated independently regardless of this field.
    pub(crate) rep_fault: FaultId,
}

impl SimFault {
    pub(crate) fn new(
        origin_node: SimId,
        branch_ipos: Option<usize>,
        input_node: SimId,
        polarity: bool,
        kind: FaultKind,
        rep_fault: FaultId,
    ) -> Self {
        SimFault {
            origin_node,
            branch_ipos,
            input_node,
            polarity,
            kind,
            skip: false,
            lane: None,
            obs_mask: Bits64::all_zero(),
            rep_fault,
        }
    }

    /// Whether this fault is currently excluded from simulation.
    pub(crate) fn is_skipped(&self) -> bool {
        self.skip
    }

    /// The observability mask computed by the most recent FFR-local pass
    /// that included this fault.
    pub(crate) fn obs_mask(&self) -> Bits64 {
        self.obs_mask
    }

    /// The lane this fault was assigned in its most recent FFR-local batch.
    pub(crate) fn lane(&self) -> Option<u32> {
        self.lane
    }

    /// The representative fault of this fault's equivalence class.
    pub(crate) fn rep_fault(&self) -> FaultId {
        self.rep_fault
    }
}
