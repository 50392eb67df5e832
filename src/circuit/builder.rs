use super::{Circuit, CircuitNode, GateKind};
use crate::error::{DruidError, Result};
use crate::ids::NodeId;

/// Mutable construction API for a [`Circuit`].
///
/// Nodes are assigned dense ids in the order they are added. A gate's fanin
/// must reference nodes already added (lower ids), which makes construction
/// order a valid topological order for free -- the same discipline the
/// teacher crate's `Network::add` enforces for its `Signal` indices.
#[derive(Debug, Clone, Default)]
pub struct CircuitBuilder {
    nodes: Vec<CircuitNode>,
    input_num: usize,
    dff_ppi: Vec<NodeId>,
    dff_ppo: Vec<NodeId>,
    outputs: Vec<NodeId>,
    const0: Option<NodeId>,
    const1: Option<NodeId>,
}

impl CircuitBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn push_leaf(&mut self, kind: GateKind) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(CircuitNode {
            kind,
            fanin: Box::new([]),
            level: 0,
        });
        id
    }

    /// Add a new primary input.
    pub fn add_input(&mut self) -> NodeId {
        self.input_num += 1;
        self.push_leaf(GateKind::Input)
    }

    /// Add a new flip-flop, returning its PPI (`Q`) node. The PPO (`D`)
    /// side must be supplied separately with [`Self::set_dff_input`] before
    /// [`Self::finish`].
    pub fn add_dff(&mut self) -> NodeId {
        let ppi = self.push_leaf(GateKind::Input);
        self.dff_ppi.push(ppi);
        self.dff_ppo.push(NodeId::new(usize::MAX));
        ppi
    }

    /// Wire the data input of flip-flop `dff_index` (in the order its PPI
    /// was created) to `driver`, marking `driver` as a PPO.
    pub fn set_dff_input(&mut self, dff_index: usize, driver: NodeId) -> Result<()> {
        if dff_index >= self.dff_ppo.len() {
            return Err(DruidError::InvalidArgument(format!(
                "no such flip-flop: {dff_index}"
            ))
            .logged());
        }
        self.check_defined(driver)?;
        self.dff_ppo[dff_index] = driver;
        Ok(())
    }

    /// The constant-0 node, creating it on first use.
    pub fn const0(&mut self) -> NodeId {
        if let Some(id) = self.const0 {
            return id;
        }
        let id = self.push_leaf(GateKind::Const0);
        self.const0 = Some(id);
        id
    }

    /// The constant-1 node, creating it on first use.
    pub fn const1(&mut self) -> NodeId {
        if let Some(id) = self.const1 {
            return id;
        }
        let id = self.push_leaf(GateKind::Const1);
        self.const1 = Some(id);
        id
    }

    fn check_defined(&self, id: NodeId) -> Result<()> {
        if id.index() >= self.nodes.len() {
            return Err(DruidError::InvalidArgument(format!(
                "fanin {id} not yet defined"
            ))
            .logged());
        }
        Ok(())
    }

    fn min_arity(kind: GateKind) -> usize {
        match kind {
            GateKind::Buf | GateKind::Inv => 1,
            GateKind::And | GateKind::Nand | GateKind::Or | GateKind::Nor => 2,
            GateKind::Xor | GateKind::Xnor => 2,
            GateKind::Input | GateKind::Const0 | GateKind::Const1 => 0,
        }
    }

    /// Add a gate of the given kind with the given ordered fanin. Every
    /// fanin node must already have been added. Returns the new node's id.
    pub fn add_gate(&mut self, kind: GateKind, fanin: &[NodeId]) -> Result<NodeId> {
        if kind.is_leaf() {
            return Err(DruidError::InvalidArgument(format!(
                "{kind} is a leaf kind, use add_input/const0/const1"
            ))
            .logged());
        }
        let min = Self::min_arity(kind);
        if fanin.len() < min {
            return Err(DruidError::InvalidArgument(format!(
                "{kind} requires at least {min} fanin, got {}",
                fanin.len()
            ))
            .logged());
        }
        if matches!(kind, GateKind::Buf | GateKind::Inv) && fanin.len() != 1 {
            return Err(DruidError::InvalidArgument(format!(
                "{kind} takes exactly one fanin, got {}",
                fanin.len()
            ))
            .logged());
        }
        let mut level = 0u32;
        for &f in fanin {
            self.check_defined(f)?;
            level = level.max(self.nodes[f.index()].level + 1);
        }
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(CircuitNode {
            kind,
            fanin: fanin.into(),
            level,
        });
        Ok(id)
    }

    /// Mark `id` as a primary output.
    pub fn add_output(&mut self, id: NodeId) -> Result<()> {
        self.check_defined(id)?;
        self.outputs.push(id);
        Ok(())
    }

    /// Freeze the builder into an immutable [`Circuit`].
    ///
    /// Fails if any flip-flop added with [`Self::add_dff`] never had its
    /// data input wired with [`Self::set_dff_input`].
    pub fn finish(self) -> Result<Circuit> {
        for (i, ppo) in self.dff_ppo.iter().enumerate() {
            if ppo.index() == usize::MAX {
                return Err(DruidError::InvalidArgument(format!(
                    "flip-flop {i} has no data input wired"
                ))
                .logged());
            }
        }
        Ok(Circuit {
            nodes: self.nodes,
            input_num: self.input_num,
            dff_ppi: self.dff_ppi,
            dff_ppo: self.dff_ppo,
            outputs: self.outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_and_or() {
        let mut b = CircuitBuilder::new();
        let a = b.add_input();
        let c = b.add_input();
        let g = b.add_gate(GateKind::And, &[a, c]).unwrap();
        b.add_output(g).unwrap();
        let circuit = b.finish().unwrap();
        assert_eq!(circuit.input_num(), 2);
        assert_eq!(circuit.output_num(), 1);
        assert_eq!(circuit.dff_num(), 0);
        assert_eq!(circuit.node_num(), 3);
        assert!(circuit.is_comb());
        assert!(circuit.is_output(g));
        assert!(!circuit.is_output(a));
    }

    #[test]
    fn test_dff_roundtrip() {
        let mut b = CircuitBuilder::new();
        let a = b.add_input();
        let q = b.add_dff();
        let inv = b.add_gate(GateKind::Inv, &[a]).unwrap();
        b.set_dff_input(0, inv).unwrap();
        b.add_output(q).unwrap();
        let circuit = b.finish().unwrap();
        assert_eq!(circuit.dff_num(), 1);
        assert_eq!(circuit.dff_output(0), q);
        assert_eq!(circuit.dff_input(0), inv);
        assert!(!circuit.is_comb());
        assert!(circuit.is_output(inv));
    }

    #[test]
    fn test_unwired_dff_rejected() {
        let mut b = CircuitBuilder::new();
        b.add_dff();
        assert!(b.finish().is_err());
    }

    #[test]
    fn test_undefined_fanin_rejected() {
        let mut b = CircuitBuilder::new();
        let ghost = NodeId::new(42);
        assert!(b.add_gate(GateKind::Buf, &[ghost]).is_err());
    }

    #[test]
    fn test_levels() {
        let mut b = CircuitBuilder::new();
        let a = b.add_input();
        let c = b.add_input();
        let g1 = b.add_gate(GateKind::And, &[a, c]).unwrap();
        let g2 = b.add_gate(GateKind::Inv, &[g1]).unwrap();
        let circuit = b.finish().unwrap();
        assert_eq!(circuit.node(a).level(), 0);
        assert_eq!(circuit.node(g1).level(), 1);
        assert_eq!(circuit.node(g2).level(), 2);
    }
}
