//! Fanout-Free Region partitioning.

use super::node::SimNode;
use crate::ids::{FaultId, FfrId, SimId};
use crate::packed::PackedValue;

/// A maximal subtree whose internal edges have fanout 1, rooted at a node
/// that is either an output or has two or more fanouts.
pub struct Ffr {
    pub(crate) root: SimId,
    /// Faults installed in this FFR, in insertion order (determines lane
    /// assignment in the FFR-local propagator).
    pub(crate) fault_ids: Vec<FaultId>,
}

impl Ffr {
    /// The root node of this FFR.
    pub fn root(&self) -> SimId {
        self.root
    }

    /// Faults currently installed in this FFR.
    pub fn fault_ids(&self) -> &[FaultId] {
        &self.fault_ids
    }
}

/// Build the FFR partition by a reverse topological walk: a node whose
/// fanout count is 1 and which is not an output joins its unique fanout's
/// FFR; every other node (fanout != 1, or an output) starts a new FFR
/// rooted at itself.
///
/// Walking in reverse order guarantees a node's fanout (which has a
/// strictly higher id) has already been assigned an FFR by the time the
/// node itself is visited.
pub(crate) fn build_ffrs<V: PackedValue>(nodes: &mut [SimNode<V>]) -> Vec<Ffr> {
    let mut ffrs: Vec<Ffr> = Vec::new();
    for i in (0..nodes.len()).rev() {
        let is_root = nodes[i].is_output() || nodes[i].fanout.len() != 1;
        if is_root {
            let ffr_id = FfrId::new(ffrs.len());
            ffrs.push(Ffr {
                root: SimId::new(i),
                fault_ids: Vec::new(),
            });
            nodes[i].ffr = ffr_id;
        } else {
            let parent = nodes[i].fanout[0];
            nodes[i].ffr = nodes[parent.index()].ffr;
        }
    }
    ffrs
}
