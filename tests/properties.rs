//! Cross-module property and scenario tests.
//!
//! Unlike the in-module unit tests, these exercise the bit-parallel
//! simulator end to end against the naive [`druid_fsim::reference`]
//! oracle, and check the three simulation modes agree with each other.

use druid_fsim::circuit::{CircuitBuilder, GateKind};
use druid_fsim::fault::Fault;
use druid_fsim::reference;
use druid_fsim::sim::{Simulator, TestVector, ValueKind};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Stuck-at-1 on an AND input, excited and
/// observed directly at the gate's own output.
#[test]
fn scenario_a_stuck_at_one_on_and_input_detected() {
    let mut b = CircuitBuilder::new();
    let a = b.add_input();
    let c = b.add_input();
    let g = b.add_gate(GateKind::And, &[a, c]).unwrap();
    b.add_output(g).unwrap();
    let circuit = b.finish().unwrap();

    let mut sim = Simulator::new(&circuit, ValueKind::TwoValued, false);
    // input-0 of the AND (`a`) stuck-at-1.
    let ids = sim.set_fault_list(&[Fault::stuck_at_branch(g, 0, true)]).unwrap();
    let tv = TestVector::new(vec![Some(false), Some(true)], vec![]);
    let diff = sim.spsfp(&tv, ids[0]).unwrap();
    assert_eq!(diff.elem_num(), 1);
    assert_eq!(diff.output(0), 0);
}

/// A variant where the fault excites, but a controlling side
/// input at the downstream OR swallows it before it can be observed.
#[test]
fn scenario_a_prime_masked_by_and_or_tree() {
    let mut b = CircuitBuilder::new();
    let a = b.add_input();
    let c = b.add_input();
    let d = b.add_input();
    let e = b.add_input();
    let and1 = b.add_gate(GateKind::And, &[a, c]).unwrap();
    let and2 = b.add_gate(GateKind::And, &[d, e]).unwrap();
    let out = b.add_gate(GateKind::Or, &[and1, and2]).unwrap();
    b.add_output(out).unwrap();
    let circuit = b.finish().unwrap();

    let mut sim = Simulator::new(&circuit, ValueKind::TwoValued, false);
    // a's branch into and1, stuck-at-1.
    let ids = sim
        .set_fault_list(&[Fault::stuck_at_branch(and1, 0, true)])
        .unwrap();
    let tv = TestVector::new(
        vec![Some(false), Some(true), Some(true), Some(true)],
        vec![],
    );
    let diff = sim.spsfp(&tv, ids[0]).unwrap();
    assert!(diff.is_empty(), "fault should be masked by and2=1 at the OR");
}

/// A rising transition-delay fault on a buffer's
/// input fails to make the frame-1 -> frame-2 transition.
#[test]
fn scenario_c_transition_delay_rising_fault() {
    let mut b = CircuitBuilder::new();
    let a = b.add_input();
    let x = b.add_gate(GateKind::Buf, &[a]).unwrap();
    b.add_output(x).unwrap();
    let circuit = b.finish().unwrap();

    let mut sim = Simulator::new(&circuit, ValueKind::TwoValued, true);
    let ids = sim
        .set_fault_list(&[Fault::transition_delay(a, false)])
        .unwrap();
    let tv = TestVector::with_prev_pi(vec![Some(true)], vec![], vec![Some(false)]);
    let diff = sim.spsfp(&tv, ids[0]).unwrap();
    assert_eq!(diff.elem_num(), 1);
    assert_eq!(diff.output(0), 0);
}

/// A two-frame test vector against a simulator
/// built with `has_prev_state = false` is a contract violation, not a
/// silently-accepted no-op.
#[test]
fn transition_delay_vector_rejected_without_has_prev_state() {
    let mut b = CircuitBuilder::new();
    let a = b.add_input();
    let x = b.add_gate(GateKind::Buf, &[a]).unwrap();
    b.add_output(x).unwrap();
    let circuit = b.finish().unwrap();

    let mut sim = Simulator::new(&circuit, ValueKind::TwoValued, false);
    let ids = sim
        .set_fault_list(&[Fault::transition_delay(a, false)])
        .unwrap();
    let tv = TestVector::with_prev_pi(vec![Some(true)], vec![], vec![Some(false)]);
    let err = sim.spsfp(&tv, ids[0]).unwrap_err();
    assert!(matches!(err, druid_fsim::DruidError::InvalidState(_)));
}

/// An `X` on one AND input is masked by a known-0
/// on the other, so a stuck-at-0 fault on the known-0 input is undetected.
#[test]
fn scenario_d_three_valued_x_masking() {
    let mut b = CircuitBuilder::new();
    let a = b.add_input();
    let c = b.add_input();
    let g = b.add_gate(GateKind::And, &[a, c]).unwrap();
    b.add_output(g).unwrap();
    let circuit = b.finish().unwrap();

    let mut sim = Simulator::new(&circuit, ValueKind::ThreeValued, false);
    let ids = sim.set_fault_list(&[Fault::stuck_at(c, false)]).unwrap();
    let tv = TestVector::new(vec![None, Some(false)], vec![]);
    let diff = sim.spsfp(&tv, ids[0]).unwrap();
    assert!(diff.is_empty());
}

/// A fault feeding a flip-flop's data input is
/// observed at the PPO index, offset past every PO.
#[test]
fn scenario_e_dff_pseudo_output_offset() {
    let mut b = CircuitBuilder::new();
    let a = b.add_input();
    let po_driver = b.add_input();
    let dff_in = b.add_gate(GateKind::Inv, &[a]).unwrap();
    let q = b.add_dff();
    b.set_dff_input(0, dff_in).unwrap();
    b.add_output(po_driver).unwrap();
    let _ = q;
    let circuit = b.finish().unwrap();
    assert_eq!(circuit.output_num(), 1);
    assert_eq!(circuit.dff_num(), 1);

    let mut sim = Simulator::new(&circuit, ValueKind::TwoValued, false);
    let ids = sim.set_fault_list(&[Fault::stuck_at(a, false)]).unwrap();
    let tv = TestVector::new(vec![Some(true), Some(true)], vec![Some(false)]);
    let diff = sim.spsfp(&tv, ids[0]).unwrap();
    assert_eq!(diff.elem_num(), 1);
    // Output index 0 is the PO; the PPO for the one DFF is index 1
    // (`output_num` PO slots come first).
    assert_eq!(diff.output(0), circuit.output_num() as u32);
}

/// PPSFP packing of several patterns against one
/// fault matches calling SPSFP once per pattern, on a small sequential
/// circuit representative of the benchmark used in the source test suite.
#[test]
fn scenario_f_ppsfp_matches_repeated_spsfp() {
    let circuit = small_sequential_circuit();
    let mut sim = Simulator::new(&circuit, ValueKind::TwoValued, false);
    let and_gate = find_and_gate(&circuit);
    let ids = sim
        .set_fault_list(&[Fault::stuck_at(and_gate, false)])
        .unwrap();

    let mut rng = SmallRng::seed_from_u64(42);
    let tvs: Vec<TestVector> = (0..3)
        .map(|_| TestVector::random(&mut rng, circuit.input_num(), circuit.dff_num()))
        .collect();

    let mut expected = Vec::new();
    for tv in &tvs {
        expected.push(sim.spsfp(tv, ids[0]).unwrap());
    }
    let results = sim.ppsfp(&tvs, &ids).unwrap();
    for (i, exp) in expected.iter().enumerate() {
        assert_eq!(results.get(i as u32, ids[0].index() as u32), *exp);
    }
}

fn small_sequential_circuit() -> druid_fsim::Circuit {
    let mut b = CircuitBuilder::new();
    let a = b.add_input();
    let c = b.add_input();
    let (q, _dff_id) = (b.add_dff(), 0usize);
    let and_gate = b.add_gate(GateKind::And, &[a, q]).unwrap();
    let or_gate = b.add_gate(GateKind::Or, &[and_gate, c]).unwrap();
    let next_state = b.add_gate(GateKind::Xor, &[and_gate, c]).unwrap();
    b.set_dff_input(0, next_state).unwrap();
    b.add_output(or_gate).unwrap();
    b.finish().unwrap()
}

fn find_and_gate(circuit: &druid_fsim::Circuit) -> druid_fsim::ids::NodeId {
    circuit
        .node_ids()
        .find(|&id| circuit.node(id).kind() == GateKind::And)
        .expect("circuit has an AND gate")
}

/// For randomly generated small circuits,
/// faults, and vectors, `spsfp`'s `DiffBits` matches a naive gate-by-gate
/// reference evaluator.
#[test]
fn reference_equivalence_random_combinational() {
    let mut rng = SmallRng::seed_from_u64(7);
    for trial in 0..30 {
        let circuit = random_combinational_circuit(&mut rng, 6 + trial % 4);
        let mut sim = Simulator::new(&circuit, ValueKind::TwoValued, false);

        let all_nodes: Vec<_> = circuit.node_ids().collect();
        let fault_node = *all_nodes
            .iter()
            .filter(|&&id| !circuit.node(id).kind().is_leaf())
            .last()
            .unwrap_or(&all_nodes[all_nodes.len() - 1]);
        let polarity = rng.gen::<bool>();
        let fault = Fault::stuck_at(fault_node, polarity);
        let ids = sim.set_fault_list(&[fault]).unwrap();

        let inputs: Vec<(druid_fsim::ids::NodeId, Option<bool>)> = (0..circuit.input_num())
            .map(|_| rng.gen::<bool>())
            .enumerate()
            .map(|(i, v)| (pi_node(&circuit, i), Some(v)))
            .collect();
        let pi_values: Vec<Option<bool>> = inputs.iter().map(|&(_, v)| v).collect();
        let tv = TestVector::new(pi_values, vec![]);

        let engine_diff = sim.spsfp(&tv, ids[0]).unwrap();

        let good = reference::eval_good(&circuit, &inputs);
        let faulty = reference::eval_faulty(&circuit, &good, None, &inputs, &fault);
        let ref_diff = reference::diff_outputs(&circuit, &good, &faulty);

        let mut engine_sorted: Vec<u32> = engine_diff.iter().collect();
        engine_sorted.sort_unstable();
        assert_eq!(
            engine_sorted, ref_diff,
            "trial {trial}: engine and reference disagree"
        );
    }
}

fn pi_node(circuit: &druid_fsim::Circuit, i: usize) -> druid_fsim::ids::NodeId {
    circuit
        .node_ids()
        .filter(|&id| circuit.is_input_like(id))
        .nth(i)
        .unwrap()
}

/// A small random combinational circuit: `width` inputs feeding a
/// tree of randomly chosen two-input gates, topped with a single output.
fn random_combinational_circuit(rng: &mut impl Rng, width: usize) -> druid_fsim::Circuit {
    let kinds = [
        GateKind::And,
        GateKind::Nand,
        GateKind::Or,
        GateKind::Nor,
        GateKind::Xor,
        GateKind::Xnor,
    ];
    let mut b = CircuitBuilder::new();
    let mut frontier: Vec<_> = (0..width).map(|_| b.add_input()).collect();
    while frontier.len() > 1 {
        let mut next = Vec::new();
        for pair in frontier.chunks(2) {
            if pair.len() == 2 {
                let kind = kinds[rng.gen_range(0..kinds.len())];
                next.push(b.add_gate(kind, pair).unwrap());
            } else {
                next.push(pair[0]);
            }
        }
        frontier = next;
    }
    b.add_output(frontier[0]).unwrap();
    b.finish().unwrap()
}

/// `spsfp` and `sppfp` agree on whether a
/// fault is detected for the same pattern.
#[test]
fn mode_agreement_spsfp_sppfp() {
    let circuit = small_sequential_circuit();
    let mut sim = Simulator::new(&circuit, ValueKind::TwoValued, false);
    let and_gate = find_and_gate(&circuit);
    let ids = sim
        .set_fault_list(&[
            Fault::stuck_at(and_gate, false),
            Fault::stuck_at(and_gate, true),
        ])
        .unwrap();

    let mut rng = SmallRng::seed_from_u64(99);
    for _ in 0..10 {
        let tv = TestVector::random(&mut rng, circuit.input_num(), circuit.dff_num());
        let sppfp_result = sim.sppfp(&tv, &ids).unwrap();
        for &id in &ids {
            let spsfp_diff = sim.spsfp(&tv, id).unwrap();
            assert_eq!(
                sppfp_result.detected(0, id.index() as u32),
                !spsfp_diff.is_empty()
            );
            assert_eq!(sppfp_result.get(0, id.index() as u32), spsfp_diff);
        }
    }
}

/// A skipped fault never appears in
/// `sppfp`/`ppsfp` results.
#[test]
fn skip_honored_across_batch_modes() {
    let circuit = small_sequential_circuit();
    let mut sim = Simulator::new(&circuit, ValueKind::TwoValued, false);
    let and_gate = find_and_gate(&circuit);
    let ids = sim
        .set_fault_list(&[
            Fault::stuck_at(and_gate, false),
            Fault::stuck_at(and_gate, true),
        ])
        .unwrap();
    sim.set_skip(ids[0]).unwrap();

    let mut rng = SmallRng::seed_from_u64(5);
    let tv = TestVector::random(&mut rng, circuit.input_num(), circuit.dff_num());
    let sppfp_result = sim.sppfp(&tv, &ids).unwrap();
    assert!(!sppfp_result.detected(0, ids[0].index() as u32));

    let tvs: Vec<TestVector> = (0..4)
        .map(|_| TestVector::random(&mut rng, circuit.input_num(), circuit.dff_num()))
        .collect();
    let ppsfp_result = sim.ppsfp(&tvs, &ids).unwrap();
    for pattern in 0..tvs.len() as u32 {
        assert!(!ppsfp_result.detected(pattern, ids[0].index() as u32));
    }
}

/// No residual state carries over between
/// independent simulation calls.
#[test]
fn no_residual_state_between_calls() {
    let mut b = CircuitBuilder::new();
    let a = b.add_input();
    let c = b.add_input();
    let g = b.add_gate(GateKind::And, &[a, c]).unwrap();
    b.add_output(g).unwrap();
    let circuit = b.finish().unwrap();

    let mut sim = Simulator::new(&circuit, ValueKind::TwoValued, false);
    let ids = sim.set_fault_list(&[Fault::stuck_at(g, false)]).unwrap();

    let tv1 = TestVector::new(vec![Some(true), Some(true)], vec![]);
    let tv2 = TestVector::new(vec![Some(false), Some(true)], vec![]);

    let first = sim.spsfp(&tv1, ids[0]).unwrap();
    let _ = sim.spsfp(&tv2, ids[0]).unwrap();
    let repeat_first = sim.spsfp(&tv1, ids[0]).unwrap();
    assert_eq!(first, repeat_first);

    let mut second_alone_sim = Simulator::new(&circuit, ValueKind::TwoValued, false);
    let second_alone_ids = second_alone_sim
        .set_fault_list(&[Fault::stuck_at(g, false)])
        .unwrap();
    let second_alone = second_alone_sim.spsfp(&tv2, second_alone_ids[0]).unwrap();
    let second_after_first = sim.spsfp(&tv2, ids[0]).unwrap();
    assert_eq!(second_alone, second_after_first);
}
