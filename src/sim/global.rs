//! Event-driven global propagator.
//!
//! Takes the aggregate difference an FFR-local pass produced at an FFR root
//! and pushes it through the rest of the circuit, one gate level at a time,
//! stopping as soon as a node's faulty value collapses back to its good
//! value (nothing downstream of it can differ). Visits each node at most
//! once per call, in increasing level order, via [`super::queue::LevelQueue`].

use super::local::eval_gate;
use super::node::SimNode;
use super::queue::LevelQueue;
use crate::ids::SimId;
use crate::packed::PackedValue;
use crate::packed::Bits64;

/// Seed `seed`'s faulty value by flipping `request`'s lanes away from its
/// good value, then fan the difference out through the circuit. Returns the
/// set of touched primary/pseudo-primary outputs together with the mask of
/// lanes that differ from the good machine at each.
///
/// `touched` must be all-`false` on entry and is restored to all-`false` on
/// return; it is caller-owned scratch so repeated calls (one per fault, or
/// one per FFR batch) avoid an O(node count) reset.
pub(crate) fn propagate_global<V: PackedValue>(
    nodes: &mut [SimNode<V>],
    queue: &mut LevelQueue,
    touched: &mut [bool],
    seed: SimId,
    request: Bits64,
) -> Vec<(u32, Bits64)> {
    let mut touched_list = vec![seed];
    touched[seed.index()] = true;
    nodes[seed.index()].fval = nodes[seed.index()].gval.flip(request);

    let mut outputs = Vec::new();

    let seed_diff = nodes[seed.index()].fval.diff_mask(nodes[seed.index()].gval);
    if seed_diff.any() {
        if let Some(out_idx) = nodes[seed.index()].output_index {
            outputs.push((out_idx, seed_diff));
        }
        for fo in nodes[seed.index()].fanout.clone() {
            queue.push(fo, nodes[fo.index()].level);
        }
    }

    while let Some(id) = queue.pop() {
        let idx = id.index();
        let fanin_vals: Vec<V> = nodes[idx]
            .fanin
            .iter()
            .map(|f| {
                if touched[f.index()] {
                    nodes[f.index()].fval
                } else {
                    nodes[f.index()].gval
                }
            })
            .collect();
        let new_fval = eval_gate(nodes[idx].gate_type, &fanin_vals);
        let diff = new_fval.diff_mask(nodes[idx].gval);
        nodes[idx].fval = new_fval;
        if !touched[idx] {
            touched[idx] = true;
            touched_list.push(id);
        }

        if diff.any() {
            if let Some(out_idx) = nodes[idx].output_index {
                outputs.push((out_idx, diff));
            }
            for fo in nodes[idx].fanout.clone() {
                queue.push(fo, nodes[fo.index()].level);
            }
        }
    }

    for id in touched_list {
        touched[id.index()] = false;
    }
    outputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{CircuitBuilder, GateKind};
    use crate::packed::Bits64;
    use crate::sim::ffr::build_ffrs;
    use crate::sim::node::build_arena;

    fn eval_good(nodes: &mut [SimNode<Bits64>]) {
        for i in 0..nodes.len() {
            if nodes[i].gate_type.is_leaf() {
                continue;
            }
            let fanin: Vec<Bits64> = nodes[i].fanin.iter().map(|f| nodes[f.index()].gval).collect();
            nodes[i].gval = eval_gate(nodes[i].gate_type, &fanin);
        }
    }

    #[test]
    fn test_stops_at_controlling_side_input() {
        let mut b = CircuitBuilder::new();
        let a = b.add_input();
        let c = b.add_input();
        let d = b.add_input();
        let g1 = b.add_gate(GateKind::And, &[a, c]).unwrap();
        let g2 = b.add_gate(GateKind::Or, &[g1, d]).unwrap();
        b.add_output(g2).unwrap();
        let circuit = b.finish().unwrap();
        let (mut nodes, map) = build_arena::<Bits64>(&circuit);
        let _ffrs = build_ffrs(&mut nodes);

        nodes[map.get(a).index()].gval = Bits64::all_one();
        nodes[map.get(c).index()].gval = Bits64::all_one();
        nodes[map.get(d).index()].gval = Bits64::all_one();
        eval_good(&mut nodes);

        let level_num = nodes.iter().map(|n| n.level).max().unwrap_or(0) as usize + 1;
        let mut queue = LevelQueue::new(nodes.len(), level_num);
        let mut touched = vec![false; nodes.len()];

        let out = propagate_global(
            &mut nodes,
            &mut queue,
            &mut touched,
            map.get(g1),
            Bits64::all_one(),
        );
        // d=1 is Or's controlling value, so g1's flip never reaches g2.
        assert!(out.is_empty());
        assert!(touched.iter().all(|t| !t));
    }

    #[test]
    fn test_reaches_output_through_noncontrolling_side() {
        let mut b = CircuitBuilder::new();
        let a = b.add_input();
        let c = b.add_input();
        let d = b.add_input();
        let g1 = b.add_gate(GateKind::And, &[a, c]).unwrap();
        let g2 = b.add_gate(GateKind::Or, &[g1, d]).unwrap();
        b.add_output(g2).unwrap();
        let circuit = b.finish().unwrap();
        let (mut nodes, map) = build_arena::<Bits64>(&circuit);
        let _ffrs = build_ffrs(&mut nodes);

        nodes[map.get(a).index()].gval = Bits64::all_one();
        nodes[map.get(c).index()].gval = Bits64::all_one();
        nodes[map.get(d).index()].gval = Bits64::all_zero();
        eval_good(&mut nodes);

        let level_num = nodes.iter().map(|n| n.level).max().unwrap_or(0) as usize + 1;
        let mut queue = LevelQueue::new(nodes.len(), level_num);
        let mut touched = vec![false; nodes.len()];

        let out = propagate_global(
            &mut nodes,
            &mut queue,
            &mut touched,
            map.get(g1),
            Bits64::all_one(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, nodes[map.get(g2).index()].output_index.unwrap());
        assert_eq!(out[0].1, Bits64::all_one());
        assert!(touched.iter().all(|t| !t));
    }
}
