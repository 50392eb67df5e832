//! The input circuit: an acyclic gate-level netlist, immutable once built.
//!
//! The simulator core does not parse netlist files (that is a DTPG/CLI
//! concern); [`CircuitBuilder`] is the programmatic construction API a
//! caller uses to assemble the netlist the rest of this crate consumes.

mod builder;
mod gate;

pub use builder::CircuitBuilder;
pub use gate::GateKind;

use crate::ids::NodeId;

/// One node of the circuit: its gate kind and ordered fanin.
///
/// Fanin order is preserved exactly as given to the builder; it matters for
/// branch faults (`SimFault::branch_ipos`) and for `Mux`-like
/// asymmetric gates... this crate's primitive set has none, but fanin order
/// is kept regardless since it is part of the netlist's identity.
#[derive(Debug, Clone)]
pub struct CircuitNode {
    kind: GateKind,
    fanin: Box<[NodeId]>,
    level: u32,
}

impl CircuitNode {
    /// This node's gate kind.
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    /// Ordered fanin of this node (empty for leaves).
    pub fn fanin(&self) -> &[NodeId] {
        &self.fanin
    }

    /// Topological level: the longest input-to-node path length. Leaves
    /// (inputs, PPIs, constants) are level 0.
    pub fn level(&self) -> u32 {
        self.level
    }
}

/// An acyclic gate-level netlist with flip-flops modeled as PPI/PPO pairs
/// (full-scan assumption).
#[derive(Debug, Clone)]
pub struct Circuit {
    nodes: Vec<CircuitNode>,
    input_num: usize,
    dff_ppi: Vec<NodeId>,
    dff_ppo: Vec<NodeId>,
    outputs: Vec<NodeId>,
}

impl Circuit {
    /// Start building a new circuit.
    pub fn builder() -> CircuitBuilder {
        CircuitBuilder::new()
    }

    /// Number of primary inputs (excludes PPIs).
    pub fn input_num(&self) -> usize {
        self.input_num
    }

    /// Number of flip-flops (PPI/PPO pairs).
    pub fn dff_num(&self) -> usize {
        self.dff_ppi.len()
    }

    /// Number of primary outputs (excludes PPOs).
    pub fn output_num(&self) -> usize {
        self.outputs.len()
    }

    /// Total number of nodes, including leaves (PI/PPI/constants) and gates.
    pub fn node_num(&self) -> usize {
        self.nodes.len()
    }

    /// Node at the given index.
    pub fn node(&self, id: NodeId) -> &CircuitNode {
        &self.nodes[id.index()]
    }

    /// Iterate all node ids in construction order (a valid topological
    /// order: every fanin index is strictly less than its user's index).
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// The node id of primary output `i`.
    pub fn output(&self, i: usize) -> NodeId {
        self.outputs[i]
    }

    /// The node id of the PPI (`Q`) side of flip-flop `i`.
    pub fn dff_output(&self, i: usize) -> NodeId {
        self.dff_ppi[i]
    }

    /// The node id of the PPO (`D`) side of flip-flop `i`.
    pub fn dff_input(&self, i: usize) -> NodeId {
        self.dff_ppo[i]
    }

    /// Whether `id` is a PI or PPI (acts as a pseudo-primary-input).
    pub fn is_input_like(&self, id: NodeId) -> bool {
        self.nodes[id.index()].kind == GateKind::Input
    }

    /// Whether `id` is a primary or pseudo-primary output.
    pub fn is_output(&self, id: NodeId) -> bool {
        self.outputs.contains(&id) || self.dff_ppo.contains(&id)
    }

    /// Whether the netlist is purely combinational (no flip-flops).
    pub fn is_comb(&self) -> bool {
        self.dff_ppi.is_empty()
    }
}
