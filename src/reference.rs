//! Naive gate-by-gate reference simulator.
//!
//! Evaluates one node at a time with plain `bool`/`Option<bool>` values and
//! no FFR/event-driven machinery at all. Used only as the test oracle the
//! bit-parallel engine's results are checked against: if this module and
//! [`crate::sim`] ever disagree, the bit-parallel engine is wrong.

use crate::circuit::{Circuit, GateKind};
use crate::fault::{Fault, FaultKind};
use crate::ids::NodeId;

/// Evaluate the good machine for one combinational frame, given primary
/// input and current-state (PPI) values in circuit order (regular inputs
/// and flip-flop `Q` outputs, whichever order they were added to the
/// circuit). Returns every node's value, indexed by `NodeId`.
pub fn eval_good(circuit: &Circuit, inputs: &[(NodeId, Option<bool>)]) -> Vec<Option<bool>> {
    let mut values = vec![None; circuit.node_num()];
    for &(id, v) in inputs {
        values[id.index()] = v;
    }
    for id in circuit.node_ids() {
        let node = circuit.node(id);
        if node.kind().is_leaf() {
            if node.kind() == GateKind::Const0 {
                values[id.index()] = Some(false);
            } else if node.kind() == GateKind::Const1 {
                values[id.index()] = Some(true);
            }
            continue;
        }
        let fanin: Vec<Option<bool>> = node.fanin().iter().map(|&f| values[f.index()]).collect();
        values[id.index()] = eval_gate_tristate(node.kind(), &fanin);
    }
    values
}

/// Evaluate `circuit` with `fault` installed, by forcing the faulty node's
/// value after the rest of the netlist has settled, then reevaluating every
/// node downstream of it. `good` is the already-computed good-machine
/// values for the same frame (and, for a transition-delay fault, `prev` is
/// the previous frame's good-machine values, used to decide whether the
/// fault excites at all).
pub fn eval_faulty(
    circuit: &Circuit,
    good: &[Option<bool>],
    prev: Option<&[Option<bool>]>,
    inputs: &[(NodeId, Option<bool>)],
    fault: &Fault,
) -> Vec<Option<bool>> {
    let mut values = vec![None; circuit.node_num()];
    for &(id, v) in inputs {
        values[id.index()] = v;
    }

    for id in circuit.node_ids() {
        let node = circuit.node(id);
        if node.kind().is_leaf() {
            if node.kind() == GateKind::Const0 {
                values[id.index()] = Some(false);
            } else if node.kind() == GateKind::Const1 {
                values[id.index()] = Some(true);
            }
        } else {
            let fanin: Vec<Option<bool>> = node
                .fanin()
                .iter()
                .enumerate()
                .map(|(ipos, &f)| {
                    if id == fault.node && fault.branch == Some(ipos) {
                        forced_value(circuit, good, prev, f, fault)
                    } else {
                        values[f.index()]
                    }
                })
                .collect();
            values[id.index()] = eval_gate_tristate(node.kind(), &fanin);
        }

        if id == fault.node && fault.branch.is_none() {
            values[id.index()] = forced_value(circuit, good, prev, id, fault);
        }
    }
    values
}

fn forced_value(
    _circuit: &Circuit,
    good: &[Option<bool>],
    prev: Option<&[Option<bool>]>,
    input_node: NodeId,
    fault: &Fault,
) -> Option<bool> {
    match fault.kind {
        FaultKind::StuckAt => Some(fault.polarity),
        FaultKind::TransitionDelay => {
            let prev_val = prev.map(|p| p[input_node.index()]).unwrap_or(None);
            let cur_val = good[input_node.index()];
            let launched = if fault.polarity {
                prev_val == Some(true) && cur_val == Some(false)
            } else {
                prev_val == Some(false) && cur_val == Some(true)
            };
            if launched {
                // Transition fails to happen: value stays at its frame-1 level.
                prev_val
            } else {
                cur_val
            }
        }
    }
}

fn eval_gate_tristate(kind: GateKind, fanin: &[Option<bool>]) -> Option<bool> {
    match kind {
        GateKind::Input | GateKind::Const0 | GateKind::Const1 => {
            unreachable!("leaf kind {kind} is seeded directly")
        }
        GateKind::Buf => fanin[0],
        GateKind::Inv => fanin[0].map(|v| !v),
        GateKind::And => fanin.iter().copied().reduce(and3),
        GateKind::Nand => fanin.iter().copied().reduce(and3).map(|v| !v),
        GateKind::Or => fanin.iter().copied().reduce(or3),
        GateKind::Nor => fanin.iter().copied().reduce(or3).map(|v| !v),
        GateKind::Xor => fanin.iter().copied().reduce(xor3),
        GateKind::Xnor => fanin.iter().copied().reduce(xor3).map(|v| !v),
    }
}

fn and3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn xor3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x ^ y),
        _ => None,
    }
}

/// Which of `circuit`'s POs/PPOs (in the same PO-then-PPO order
/// [`crate::sim::node::build_arena`] uses) differ between `good` and
/// `faulty`.
pub fn diff_outputs(circuit: &Circuit, good: &[Option<bool>], faulty: &[Option<bool>]) -> Vec<u32> {
    let mut out = Vec::new();
    let mut idx = 0u32;
    for i in 0..circuit.output_num() {
        let id = circuit.output(i);
        if good[id.index()] != faulty[id.index()] {
            out.push(idx);
        }
        idx += 1;
    }
    for i in 0..circuit.dff_num() {
        let id = circuit.dff_input(i);
        if good[id.index()] != faulty[id.index()] {
            out.push(idx);
        }
        idx += 1;
    }
    out
}
