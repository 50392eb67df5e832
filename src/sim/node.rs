//! The simulator's internal per-gate record and arena construction.

use crate::circuit::{Circuit, GateKind};
use crate::ids::{FfrId, SimId};
use crate::packed::PackedValue;

/// One gate in the simulator's flattened network.
///
/// Built once from a [`Circuit`] and never moved afterwards; every
/// cross-reference is a dense [`SimId`] into the arena that owns this node.
pub struct SimNode<V> {
    pub(crate) gate_type: GateKind,
    pub(crate) fanin: Box<[SimId]>,
    pub(crate) fanout: Vec<SimId>,
    /// For each entry in `fanout`, the ordinal fanin position at that
    /// fanout node this node drives. Needed to extract side inputs during
    /// the FFR-local propagation-condition walk.
    pub(crate) fanout_ipos: Vec<usize>,
    pub(crate) level: u32,
    pub(crate) ffr: FfrId,
    /// Index into the PO/PPO output ordering used by [`crate::sim::diffbits::DiffBits`],
    /// if this node is a primary or pseudo-primary output.
    pub(crate) output_index: Option<u32>,

    pub(crate) gval: V,
    pub(crate) hval: V,
    pub(crate) fval: V,
}

impl<V: PackedValue> SimNode<V> {
    pub(crate) fn is_output(&self) -> bool {
        self.output_index.is_some()
    }
}

/// Translation from [`Circuit`] node ids to [`SimId`]s, kept around so
/// callers can map circuit-level fault descriptions onto the arena.
pub struct NodeMap {
    /// `circuit_to_sim[i]` is the `SimId` of circuit node `i`.
    circuit_to_sim: Vec<SimId>,
}

impl NodeMap {
    pub(crate) fn get(&self, circuit_id: crate::ids::NodeId) -> SimId {
        self.circuit_to_sim[circuit_id.index()]
    }
}

/// Build the SimNode arena from a circuit, with the following layout
/// contract:
///  1. PIs and PPIs get ids `0..input_num+dff_num`.
///  2. Gates are laid out by increasing topological level, ties broken by
///     original circuit node id.
///  3. POs and PPOs are marked `is_output`.
pub(crate) fn build_arena<V: PackedValue>(circuit: &Circuit) -> (Vec<SimNode<V>>, NodeMap) {
    let n = circuit.node_num();
    let mut order: Vec<crate::ids::NodeId> = Vec::with_capacity(n);

    // Leaves (PI, PPI, constants) first, PI/PPI ahead of constants so that
    // ids 0..input_num+dff_num are exactly the PI/PPI set as required.
    let mut leaves: Vec<crate::ids::NodeId> = Vec::new();
    let mut consts: Vec<crate::ids::NodeId> = Vec::new();
    let mut gates: Vec<crate::ids::NodeId> = Vec::new();
    for id in circuit.node_ids() {
        match circuit.node(id).kind() {
            GateKind::Input => leaves.push(id),
            GateKind::Const0 | GateKind::Const1 => consts.push(id),
            _ => gates.push(id),
        }
    }
    gates.sort_by_key(|id| (circuit.node(*id).level(), id.index()));

    order.extend(leaves);
    order.extend(consts);
    order.extend(gates);
    debug_assert_eq!(order.len(), n);

    let mut circuit_to_sim = vec![SimId::new(0); n];
    for (sim_idx, &circuit_id) in order.iter().enumerate() {
        circuit_to_sim[circuit_id.index()] = SimId::new(sim_idx);
    }
    let map = NodeMap { circuit_to_sim };

    let mut nodes: Vec<SimNode<V>> = Vec::with_capacity(n);
    for &circuit_id in &order {
        let cn = circuit.node(circuit_id);
        let fanin: Box<[SimId]> = cn.fanin().iter().map(|&f| map.get(f)).collect();
        nodes.push(SimNode {
            gate_type: cn.kind(),
            fanin,
            fanout: Vec::new(),
            fanout_ipos: Vec::new(),
            level: cn.level(),
            ffr: FfrId::new(0),
            output_index: None,
            gval: V::all_zero(),
            hval: V::all_zero(),
            fval: V::all_zero(),
        });
    }

    // Fanout lists, built by scanning fanin once the arena exists.
    for sim_idx in 0..nodes.len() {
        let fanin = nodes[sim_idx].fanin.clone();
        for (ipos, f) in fanin.iter().enumerate() {
            let f_idx = f.index();
            nodes[f_idx].fanout.push(SimId::new(sim_idx));
            nodes[f_idx].fanout_ipos.push(ipos);
        }
    }

    // Output marking: POs first, then PPOs, matching DiffBits's output order.
    let mut out_idx = 0u32;
    for i in 0..circuit.output_num() {
        let sim_id = map.get(circuit.output(i));
        nodes[sim_id.index()].output_index = Some(out_idx);
        out_idx += 1;
    }
    for i in 0..circuit.dff_num() {
        let sim_id = map.get(circuit.dff_input(i));
        nodes[sim_id.index()].output_index = Some(out_idx);
        out_idx += 1;
    }

    (nodes, map)
}
