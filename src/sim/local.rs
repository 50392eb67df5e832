//! The FFR-local propagator.
//!
//! Within a Fanout-Free Region every internal node has exactly one fanout,
//! so propagating a fault's effect from its origin to the FFR root is a
//! straight-line walk: at each step, the fault's effect survives only on the
//! lanes where every *other* fanin of the next gate sits at that gate's
//! non-controlling value.

use super::ffr::Ffr;
use super::node::SimNode;
use super::fault::SimFault;
use crate::circuit::GateKind;
use crate::fault::FaultKind;
use crate::ids::SimId;
use crate::packed::{Bits64, PackedValue};

/// Evaluate a gate's function over already-computed fanin values. Leaf kinds
/// (`Input`, `Const0`, `Const1`) carry no fanin and are never evaluated here;
/// their value is seeded directly by the caller.
pub(crate) fn eval_gate<V: PackedValue>(kind: GateKind, fanin: &[V]) -> V {
    match kind {
        GateKind::Input | GateKind::Const0 | GateKind::Const1 => {
            unreachable!("leaf node {kind} has no gate function")
        }
        GateKind::Buf => fanin[0],
        GateKind::Inv => fanin[0].not(),
        GateKind::And => fanin.iter().copied().reduce(V::and).unwrap(),
        GateKind::Nand => fanin.iter().copied().reduce(V::and).unwrap().not(),
        GateKind::Or => fanin.iter().copied().reduce(V::or).unwrap(),
        GateKind::Nor => fanin.iter().copied().reduce(V::or).unwrap().not(),
        GateKind::Xor => fanin.iter().copied().reduce(V::xor).unwrap(),
        GateKind::Xnor => fanin.iter().copied().reduce(V::xor).unwrap().not(),
    }
}

/// Mask of lanes where every fanin of `parent` other than the one at
/// `ipos` sits at `parent`'s non-controlling value, so that the input at
/// `ipos` alone determines `parent`'s output. Gates with no controlling
/// value (`Buf`/`Inv`/`Xor`/`Xnor`) always propagate.
fn step_condition<V: PackedValue>(nodes: &[SimNode<V>], parent: SimId, ipos: usize) -> Bits64 {
    let pnode = &nodes[parent.index()];
    match pnode.gate_type.non_controlling_value() {
        Some(nc) => {
            let mut cond = Bits64::all_one();
            for (j, f) in pnode.fanin.iter().enumerate() {
                if j != ipos {
                    cond &= nodes[f.index()].gval.known_eq(nc);
                }
            }
            cond
        }
        None => Bits64::all_one(),
    }
}

/// Compute the excitation mask: the lanes on which `fault` makes the circuit
/// disagree with the good machine at its own input node, before any
/// propagation through `origin_node` or upward through the FFR.
fn excitation<V: PackedValue>(nodes: &[SimNode<V>], fault: &SimFault) -> Bits64 {
    let input = &nodes[fault.input_node.index()];
    match fault.kind {
        FaultKind::StuckAt => {
            // A stuck-at-`polarity` fault differs from the good machine
            // exactly where the good machine already holds the opposite value.
            input.gval.known_eq(!fault.polarity)
        }
        FaultKind::TransitionDelay => {
            // Rising (polarity = false): good machine must go 0 (frame 1,
            // recorded in `hval`) -> 1 (frame 2, `gval`) for the slow
            // transition to be exercised at all; falling is the mirror.
            if fault.polarity {
                input.hval.known_eq(true) & input.gval.known_eq(false)
            } else {
                input.hval.known_eq(false) & input.gval.known_eq(true)
            }
        }
    }
}

/// Run one fault through its FFR: compute the excitation mask, propagate it
/// through `origin_node` itself for a branch fault, then climb the
/// single-fanout chain to the FFR root, ANDing in the propagation condition
/// at every step. Returns the mask of lanes on which the fault's effect
/// reaches the FFR root.
pub(crate) fn excite_and_propagate<V: PackedValue>(
    nodes: &[SimNode<V>],
    ffrs: &[Ffr],
    fault: &SimFault,
) -> Bits64 {
    let mut active = excitation(nodes, fault);
    let mut cur = fault.origin_node;

    if let Some(ipos) = fault.branch_ipos {
        let origin = &nodes[cur.index()];
        let mut faulty_fanin: Vec<V> = origin.fanin.iter().map(|f| nodes[f.index()].gval).collect();
        faulty_fanin[ipos] = faulty_fanin[ipos].flip(active);
        let faulty_out = eval_gate(origin.gate_type, &faulty_fanin);
        active = faulty_out.diff_mask(origin.gval);
    }

    let root = ffrs[nodes[cur.index()].ffr.index()].root();
    while cur != root {
        let node = &nodes[cur.index()];
        let parent = node.fanout[0];
        let ipos = node.fanout_ipos[0];
        active &= step_condition(nodes, parent, ipos);
        if active == Bits64::all_zero() {
            break;
        }
        cur = parent;
    }
    active
}
