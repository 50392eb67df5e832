//! Bit-parallel fault simulation engine.
//!
//! [`Simulator`] is the public, non-generic entry point; it wraps a
//! [`SimCore`] monomorphized over either [`Bits64`] (2-valued) or
//! [`Packed3`] (3-valued, Kleene logic), so callers never see the value
//! representation as a type parameter while the propagator itself is
//! written once and shared between both.

mod diffbits;
mod ffr;
mod fault;
mod global;
mod local;
mod node;
mod queue;
mod testvector;

pub use diffbits::{DiffBits, FsimResults};
pub use testvector::TestVector;

use crate::circuit::{Circuit, GateKind};
use crate::error::{DruidError, Result};
use crate::fault::Fault;
use crate::ids::{FaultId, NodeId, SimId};
use crate::packed::{Bits64, Packed3, PackedValue};
use ffr::{build_ffrs, Ffr};
use fault::SimFault;
use local::{eval_gate, excite_and_propagate};
use node::{build_arena, NodeMap, SimNode};
use queue::LevelQueue;

/// Which packed value representation to simulate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// 2-valued: faster, but cannot represent an unknown input.
    TwoValued,
    /// 3-valued (Kleene): carries `X` through the netlist.
    ThreeValued,
}

/// Generic bit-parallel fault simulation engine for one value representation.
struct SimCore<V: PackedValue> {
    nodes: Vec<SimNode<V>>,
    map: NodeMap,
    ffrs: Vec<Ffr>,
    faults: Vec<SimFault>,
    circuit_node_num: usize,

    pi_sim: Vec<SimId>,
    ppi_sim: Vec<SimId>,
    ppo_sim: Vec<SimId>,

    queue: LevelQueue,
    touched: Vec<bool>,

    prev_gval: Vec<V>,
    wsa_toggles: u64,
    wsa_weighted_toggles: u64,
    has_prev_state: bool,
}

impl<V: PackedValue> SimCore<V> {
    fn new(circuit: &Circuit, has_prev_state: bool) -> Self {
        let (mut nodes, map) = build_arena::<V>(circuit);
        let ffrs = build_ffrs(&mut nodes);

        for i in 0..nodes.len() {
            match nodes[i].gate_type {
                GateKind::Const0 => {
                    nodes[i].gval = V::all_zero();
                    nodes[i].hval = V::all_zero();
                }
                GateKind::Const1 => {
                    nodes[i].gval = V::all_one();
                    nodes[i].hval = V::all_one();
                }
                _ => {}
            }
        }

        let dff_ppi_set: std::collections::HashSet<NodeId> =
            (0..circuit.dff_num()).map(|i| circuit.dff_output(i)).collect();
        let mut pi_ids = Vec::with_capacity(circuit.input_num());
        for id in circuit.node_ids() {
            if circuit.node(id).kind() == GateKind::Input && !dff_ppi_set.contains(&id) {
                pi_ids.push(id);
            }
        }
        let pi_sim = pi_ids.iter().map(|&id| map.get(id)).collect();
        let ppi_sim: Vec<SimId> = (0..circuit.dff_num())
            .map(|i| map.get(circuit.dff_output(i)))
            .collect();
        let ppo_sim: Vec<SimId> = (0..circuit.dff_num())
            .map(|i| map.get(circuit.dff_input(i)))
            .collect();

        let level_num = nodes.iter().map(|n| n.level).max().unwrap_or(0) as usize + 1;
        let node_num = nodes.len();
        let prev_gval = vec![V::all_zero(); node_num];

        SimCore {
            nodes,
            map,
            ffrs,
            faults: Vec::new(),
            circuit_node_num: circuit.node_num(),
            pi_sim,
            ppi_sim,
            ppo_sim,
            queue: LevelQueue::new(node_num, level_num),
            touched: vec![false; node_num],
            prev_gval,
            wsa_toggles: 0,
            wsa_weighted_toggles: 0,
            has_prev_state,
        }
    }

    fn resolve_fault(&self, f: &Fault) -> Result<(SimId, Option<usize>, SimId)> {
        if f.node.index() >= self.circuit_node_num {
            return Err(DruidError::InvalidArgument(format!(
                "fault node {} out of range",
                f.node
            ))
            .logged());
        }
        let origin = self.map.get(f.node);
        match f.branch {
            None => Ok((origin, None, origin)),
            Some(b) => {
                let fanin = &self.nodes[origin.index()].fanin;
                if b >= fanin.len() {
                    return Err(DruidError::InvalidArgument(format!(
                        "branch {b} out of range for node {} with {} fanin",
                        f.node,
                        fanin.len()
                    ))
                    .logged());
                }
                Ok((origin, Some(b), fanin[b]))
            }
        }
    }

    /// Replace the installed fault list. Returns the `FaultId` assigned to
    /// each input fault, in the same order.
    fn set_fault_list(&mut self, faults: &[Fault]) -> Result<Vec<FaultId>> {
        for ffr in &mut self.ffrs {
            ffr.fault_ids.clear();
        }
        self.faults.clear();
        let mut ids = Vec::with_capacity(faults.len());
        for f in faults {
            let (origin, branch_ipos, input_node) = self.resolve_fault(f)?;
            let id = FaultId::new(self.faults.len());
            self.faults
                .push(SimFault::new(origin, branch_ipos, input_node, f.polarity, f.kind, id));
            self.ffrs[self.nodes[origin.index()].ffr.index()]
                .fault_ids
                .push(id);
            ids.push(id);
        }
        for (i, f) in faults.iter().enumerate() {
            let Some(rep_pos) = f.rep else { continue };
            if rep_pos >= ids.len() {
                return Err(DruidError::InvalidArgument(format!(
                    "fault {i} names representative position {rep_pos}, out of range for {} \
                     installed faults",
                    ids.len()
                ))
                .logged());
            }
            self.faults[i].rep_fault = ids[rep_pos];
        }
        Ok(ids)
    }

    fn fault(&self, id: FaultId) -> Result<&SimFault> {
        self.faults.get(id.index()).ok_or_else(|| {
            DruidError::InvalidArgument(format!("no such fault: {id}")).logged()
        })
    }

    fn rep_fault(&self, id: FaultId) -> Result<FaultId> {
        Ok(self.fault(id)?.rep_fault())
    }

    fn set_skip(&mut self, id: FaultId, skip: bool) -> Result<()> {
        let idx = id.index();
        if idx >= self.faults.len() {
            return Err(DruidError::InvalidArgument(format!("no such fault: {id}")).logged());
        }
        self.faults[idx].skip = skip;
        Ok(())
    }

    fn set_skip_all(&mut self, skip: bool) {
        for f in &mut self.faults {
            f.skip = skip;
        }
    }

    fn get_skip(&self, id: FaultId) -> Result<bool> {
        Ok(self.fault(id)?.is_skipped())
    }

    fn lift_pi(&self, values: &[Option<bool>]) -> Result<Vec<V>>
    where
        V: LiftValue,
    {
        values.iter().map(|&v| V::lift(v)).collect()
    }

    /// Evaluate the good machine for one frame: seed PI/PPI leaves and
    /// forward-evaluate every gate in level order, tallying switching
    /// activity against the previous frame's values.
    fn eval_good_frame(&mut self, pi: &[V], ppi: &[V]) -> Result<()> {
        if pi.len() != self.pi_sim.len() {
            return Err(DruidError::InvalidArgument(format!(
                "expected {} primary inputs, got {}",
                self.pi_sim.len(),
                pi.len()
            ))
            .logged());
        }
        if ppi.len() != self.ppi_sim.len() {
            return Err(DruidError::InvalidArgument(format!(
                "expected {} state bits, got {}",
                self.ppi_sim.len(),
                ppi.len()
            ))
            .logged());
        }
        for (i, &id) in self.pi_sim.iter().enumerate() {
            self.nodes[id.index()].gval = pi[i];
        }
        for (i, &id) in self.ppi_sim.iter().enumerate() {
            self.nodes[id.index()].gval = ppi[i];
        }
        self.wsa_toggles = 0;
        self.wsa_weighted_toggles = 0;
        for idx in 0..self.nodes.len() {
            if self.nodes[idx].gate_type.is_leaf() {
                continue;
            }
            let fanin: Vec<V> = self.nodes[idx]
                .fanin
                .iter()
                .map(|f| self.nodes[f.index()].gval)
                .collect();
            self.nodes[idx].gval = eval_gate(self.nodes[idx].gate_type, &fanin);
        }
        for idx in 0..self.nodes.len() {
            let toggles = self.nodes[idx]
                .gval
                .diff_mask(self.prev_gval[idx])
                .count_ones() as u64;
            self.wsa_toggles += toggles;
            if toggles > 0 {
                self.wsa_weighted_toggles += toggles * (1 + self.nodes[idx].fanout.len() as u64);
            }
            self.prev_gval[idx] = self.nodes[idx].gval;
        }
        Ok(())
    }

    /// Snapshot every node's current good-machine value into `hval`, the
    /// "previous frame" reference transition-delay faults excite against.
    fn snapshot_hval(&mut self) {
        for n in &mut self.nodes {
            n.hval = n.gval;
        }
    }

    /// Read back the current state (PPO/D-side values) for broadside
    /// capture into the next frame's PPI.
    fn capture_state(&self) -> Vec<V> {
        self.ppo_sim.iter().map(|&id| self.nodes[id.index()].gval).collect()
    }

    fn output_num(&self) -> u32 {
        self.nodes.iter().filter_map(|n| n.output_index).count() as u32
    }

    /// One fault, fully evaluated against the currently-loaded good
    /// machine: FFR-local propagation followed by a global propagate pass
    /// seeded at its own lane. Returns the raw per-output lane masks, shared
    /// by every mode that needs a single fault run to completion (SPSFP
    /// broadcasts one pattern to every lane; PPSFP instead has each lane
    /// carry an independent pattern, and the lane masks returned here are
    /// exactly the per-pattern detections).
    fn eval_one_fault_raw(&mut self, id: FaultId) -> Result<Vec<(u32, Bits64)>> {
        if self.fault(id)?.is_skipped() {
            return Ok(Vec::new());
        }
        let sf = &self.faults[id.index()];
        let local = excite_and_propagate(&self.nodes, &self.ffrs, sf);
        if !local.any() {
            return Ok(Vec::new());
        }
        let ffr_id = self.nodes[sf.origin_node.index()].ffr;
        let root = self.ffrs[ffr_id.index()].root();
        Ok(global::propagate_global(
            &mut self.nodes,
            &mut self.queue,
            &mut self.touched,
            root,
            local,
        ))
    }

    /// SPSFP: collapse [`Self::eval_one_fault_raw`]'s per-lane masks into a
    /// single `DiffBits`, valid because every lane carries the same
    /// broadcast pattern.
    fn eval_one_fault(&mut self, id: FaultId) -> Result<DiffBits> {
        let touched_outputs = self.eval_one_fault_raw(id)?;
        let mut out = DiffBits::new();
        for (out_idx, _mask) in touched_outputs {
            out.add_output(out_idx);
        }
        Ok(out)
    }

    /// PPSFP: one fault at a time, all 64 lanes dedicated to independent
    /// patterns already packed into the good machine by the caller. Splits
    /// [`Self::eval_one_fault_raw`]'s lane masks out into one `DiffBits`
    /// per pattern.
    fn eval_faults_per_pattern(&mut self, ids: &[FaultId], pattern_num: usize) -> Result<FsimResults> {
        let mut results = FsimResults::new();
        for &id in ids {
            let touched_outputs = self.eval_one_fault_raw(id)?;
            if touched_outputs.is_empty() {
                continue;
            }
            for pattern in 0..pattern_num {
                let mut d = DiffBits::new();
                for &(out_idx, mask) in &touched_outputs {
                    if mask.bit(pattern as u32) {
                        d.add_output(out_idx);
                    }
                }
                if !d.is_empty() {
                    results.record(pattern as u32, id.index() as u32, d);
                }
            }
        }
        Ok(results)
    }

    /// SPPFP: many faults, one pattern, grouped into per-FFR batches of up
    /// to 64 lanes each. The good machine must already have been evaluated
    /// by the caller for this pattern.
    fn eval_faults_batched(&mut self, ids: &[FaultId]) -> Result<FsimResults> {
        // Bucket by FFR in FFR-list order (not a hash map) so the pass
        // order, and therefore the order results are recorded in, is
        // reproducible run to run.
        let mut by_ffr: Vec<Vec<FaultId>> = vec![Vec::new(); self.ffrs.len()];
        for &id in ids {
            let sf = self.fault(id)?;
            if sf.is_skipped() {
                continue;
            }
            let ffr_idx = self.nodes[sf.origin_node.index()].ffr.index();
            by_ffr[ffr_idx].push(id);
        }

        let mut results = FsimResults::new();
        for ffr_idx in 0..self.ffrs.len() {
            if by_ffr[ffr_idx].is_empty() {
                continue;
            }
            let fault_ids = std::mem::take(&mut by_ffr[ffr_idx]);
            for chunk in fault_ids.chunks(64) {
                let mut combined = Bits64::all_zero();
                for (lane, &id) in chunk.iter().enumerate() {
                    let local = excite_and_propagate(&self.nodes, &self.ffrs, &self.faults[id.index()]);
                    let obs = if local.any() {
                        Bits64::lane(lane as u32)
                    } else {
                        Bits64::all_zero()
                    };
                    let sf = &mut self.faults[id.index()];
                    sf.lane = Some(lane as u32);
                    sf.obs_mask = obs;
                    combined |= obs;
                }
                if combined == Bits64::all_zero() {
                    continue;
                }
                let root = self.ffrs[ffr_idx].root();
                let touched_outputs = global::propagate_global(
                    &mut self.nodes,
                    &mut self.queue,
                    &mut self.touched,
                    root,
                    combined,
                );
                for (out_idx, mask) in touched_outputs {
                    for &id in chunk {
                        let sf = &self.faults[id.index()];
                        let Some(lane) = sf.lane() else { continue };
                        if sf.obs_mask().any() && mask.bit(lane) {
                            let mut d = results.get(0, id.index() as u32);
                            d.add_output(out_idx);
                            results.record(0, id.index() as u32, d);
                        }
                    }
                }
            }
        }
        Ok(results)
    }
}

/// Lift a per-lane boolean input into a packed value, rejecting `X` where
/// the representation cannot hold it.
trait LiftValue: PackedValue {
    fn lift(v: Option<bool>) -> Result<Self>;
    /// Pack 64 independent per-pattern booleans (PPSFP) into one lane word.
    fn pack_lanes(values: &[Option<bool>]) -> Result<Self>;
}

impl LiftValue for Bits64 {
    fn lift(v: Option<bool>) -> Result<Self> {
        match v {
            Some(b) => Ok(Bits64::broadcast(b)),
            None => Err(DruidError::ValueError(
                "2-valued simulator cannot accept an unknown (X) input".to_string(),
            )
            .logged()),
        }
    }

    fn pack_lanes(values: &[Option<bool>]) -> Result<Self> {
        let mut w = 0u64;
        for (i, v) in values.iter().enumerate() {
            match v {
                Some(true) => w |= 1u64 << i,
                Some(false) => {}
                None => {
                    return Err(DruidError::ValueError(
                        "2-valued simulator cannot accept an unknown (X) input".to_string(),
                    )
                    .logged())
                }
            }
        }
        Ok(Bits64::from_word(w))
    }
}

impl LiftValue for Packed3 {
    fn lift(v: Option<bool>) -> Result<Self> {
        Ok(Packed3::broadcast(v))
    }

    fn pack_lanes(values: &[Option<bool>]) -> Result<Self> {
        let mut v0 = 0u64;
        let mut v1 = 0u64;
        for (i, v) in values.iter().enumerate() {
            match v {
                Some(true) => v1 |= 1u64 << i,
                Some(false) => v0 |= 1u64 << i,
                None => {}
            }
        }
        Ok(Packed3::from_raw(v0, v1))
    }
}

/// Public, non-generic bit-parallel fault simulator.
pub enum Simulator {
    V2(SimCore<Bits64>),
    V3(SimCore<Packed3>),
}

impl Simulator {
    /// Build a new simulator over `circuit` using the given value
    /// representation. The circuit is consumed into the simulator's
    /// internal arena; faults are installed afterwards with
    /// [`Self::set_fault_list`].
    ///
    /// `has_prev_state` must be set to simulate transition-delay faults: it
    /// reserves the `hval` slot each node carries for the previous time
    /// frame's good value. Supplying a two-frame [`TestVector`] (built with
    /// [`TestVector::with_prev_pi`]) to a simulator built with
    /// `has_prev_state = false` is a contract violation and fails with
    /// [`DruidError::InvalidState`].
    pub fn new(circuit: &Circuit, kind: ValueKind, has_prev_state: bool) -> Self {
        match kind {
            ValueKind::TwoValued => Simulator::V2(SimCore::new(circuit, has_prev_state)),
            ValueKind::ThreeValued => Simulator::V3(SimCore::new(circuit, has_prev_state)),
        }
    }

    pub fn set_fault_list(&mut self, faults: &[Fault]) -> Result<Vec<FaultId>> {
        match self {
            Simulator::V2(c) => c.set_fault_list(faults),
            Simulator::V3(c) => c.set_fault_list(faults),
        }
    }

    pub fn set_skip(&mut self, id: FaultId) -> Result<()> {
        match self {
            Simulator::V2(c) => c.set_skip(id, true),
            Simulator::V3(c) => c.set_skip(id, true),
        }
    }

    pub fn clear_skip(&mut self, id: FaultId) -> Result<()> {
        match self {
            Simulator::V2(c) => c.set_skip(id, false),
            Simulator::V3(c) => c.set_skip(id, false),
        }
    }

    pub fn set_skip_all(&mut self) {
        match self {
            Simulator::V2(c) => c.set_skip_all(true),
            Simulator::V3(c) => c.set_skip_all(true),
        }
    }

    pub fn clear_skip_all(&mut self) {
        match self {
            Simulator::V2(c) => c.set_skip_all(false),
            Simulator::V3(c) => c.set_skip_all(false),
        }
    }

    pub fn get_skip(&self, id: FaultId) -> Result<bool> {
        match self {
            Simulator::V2(c) => c.get_skip(id),
            Simulator::V3(c) => c.get_skip(id),
        }
    }

    /// The representative fault of `id`'s equivalence class, as supplied
    /// via `Fault::with_rep` to `set_fault_list`. A fault with no declared
    /// representative is its own.
    pub fn rep_fault(&self, id: FaultId) -> Result<FaultId> {
        match self {
            Simulator::V2(c) => c.rep_fault(id),
            Simulator::V3(c) => c.rep_fault(id),
        }
    }

    fn apply_vector(&mut self, tv: &TestVector) -> Result<()> {
        match self {
            Simulator::V2(c) => apply_vector_generic(c, tv),
            Simulator::V3(c) => apply_vector_generic(c, tv),
        }
    }

    fn apply_vectors(&mut self, tvs: &[TestVector]) -> Result<()> {
        match self {
            Simulator::V2(c) => apply_vectors_packed(c, tvs),
            Simulator::V3(c) => apply_vectors_packed(c, tvs),
        }
    }

    /// SPSFP: single pattern, single fault.
    pub fn spsfp(&mut self, tv: &TestVector, fault: FaultId) -> Result<DiffBits> {
        self.apply_vector(tv)?;
        match self {
            Simulator::V2(c) => c.eval_one_fault(fault),
            Simulator::V3(c) => c.eval_one_fault(fault),
        }
    }

    /// SPPFP: single pattern, all (non-skipped) faults in `ids`.
    pub fn sppfp(&mut self, tv: &TestVector, ids: &[FaultId]) -> Result<FsimResults> {
        self.apply_vector(tv)?;
        match self {
            Simulator::V2(c) => c.eval_faults_batched(ids),
            Simulator::V3(c) => c.eval_faults_batched(ids),
        }
    }

    /// PPSFP: up to 64 patterns packed into lanes, each (non-skipped) fault
    /// in `ids` run once with every lane carrying an independent pattern.
    /// `tv_list` must be non-empty and no longer than 64.
    pub fn ppsfp(&mut self, tv_list: &[TestVector], ids: &[FaultId]) -> Result<FsimResults> {
        self.apply_vectors(tv_list)?;
        let n = tv_list.len();
        match self {
            Simulator::V2(c) => c.eval_faults_per_pattern(ids, n),
            Simulator::V3(c) => c.eval_faults_per_pattern(ids, n),
        }
    }

    /// xSPSFP: single fault against a partial assignment (`None` entries in
    /// `assignment` are unassigned/`X`, requiring a three-valued simulator).
    /// [`TestVector`] already represents such partial assignments, so this
    /// is the same operation as [`Self::spsfp`] under a name that makes the
    /// caller's intent (a don't-care-filled probe, not a fully specified
    /// pattern) explicit.
    pub fn xspsfp(&mut self, assignment: &TestVector, fault: FaultId) -> Result<DiffBits> {
        self.spsfp(assignment, fault)
    }

    /// xSPPFP: many faults against a partial assignment. See [`Self::xspsfp`].
    pub fn xsppfp(&mut self, assignment: &TestVector, ids: &[FaultId]) -> Result<FsimResults> {
        self.sppfp(assignment, ids)
    }

    /// Switching activity of the good machine's last applied pattern: total
    /// single-lane gate-output toggles since the previous pattern. When
    /// `weighted` is set, each toggling gate contributes `1 + fanout_len`
    /// lane-toggles instead of `1`, so a toggle fanning out to many readers
    /// counts for more.
    pub fn calc_wsa(&self, weighted: bool) -> u64 {
        match self {
            Simulator::V2(c) => {
                if weighted {
                    c.wsa_weighted_toggles
                } else {
                    c.wsa_toggles
                }
            }
            Simulator::V3(c) => {
                if weighted {
                    c.wsa_weighted_toggles
                } else {
                    c.wsa_toggles
                }
            }
        }
    }

    /// Total number of observable outputs (POs followed by PPOs).
    pub fn output_num(&self) -> u32 {
        match self {
            Simulator::V2(c) => c.output_num(),
            Simulator::V3(c) => c.output_num(),
        }
    }
}

fn apply_vector_generic<V: PackedValue + LiftValue>(c: &mut SimCore<V>, tv: &TestVector) -> Result<()> {
    if let Some(prev_pi) = &tv.prev_pi {
        if !c.has_prev_state {
            return Err(DruidError::InvalidState(
                "transition-delay test vector supplied to a simulator built without \
                 has_prev_state"
                    .to_string(),
            )
            .logged());
        }
        let prev_pi_v = c.lift_pi(prev_pi)?;
        let ppi_v = c.lift_pi(&tv.ppi)?;
        c.eval_good_frame(&prev_pi_v, &ppi_v)?;
        c.snapshot_hval();
        let captured = c.capture_state();
        let pi_v = c.lift_pi(&tv.pi)?;
        c.eval_good_frame(&pi_v, &captured)?;
    } else {
        let pi_v = c.lift_pi(&tv.pi)?;
        let ppi_v = c.lift_pi(&tv.ppi)?;
        c.eval_good_frame(&pi_v, &ppi_v)?;
    }
    Ok(())
}

/// PPSFP vector loading: pack pattern `i` into lane `i` of
/// every leaf node, lanes beyond `tvs.len()` filled with pattern 0 so they
/// stay harmless rather than floating. All supplied vectors must agree on
/// whether they carry transition-delay framing (`prev_pi`).
fn apply_vectors_packed<V: PackedValue + LiftValue>(
    c: &mut SimCore<V>,
    tvs: &[TestVector],
) -> Result<()> {
    let n = tvs.len();
    if n == 0 {
        return Err(DruidError::InvalidArgument(
            "ppsfp requires at least one test vector".to_string(),
        )
        .logged());
    }
    if n > 64 {
        return Err(DruidError::InvalidArgument(format!(
            "ppsfp accepts at most 64 patterns, got {n}"
        ))
        .logged());
    }
    let input_num = c.pi_sim.len();
    let dff_num = c.ppi_sim.len();
    let is_td = tvs[0].is_transition_delay();
    if is_td && !c.has_prev_state {
        return Err(DruidError::InvalidState(
            "transition-delay test vectors supplied to a simulator built without \
             has_prev_state"
                .to_string(),
        )
        .logged());
    }
    for tv in tvs {
        if tv.pi.len() != input_num {
            return Err(DruidError::InvalidArgument(format!(
                "expected {input_num} primary inputs, got {}",
                tv.pi.len()
            ))
            .logged());
        }
        if tv.ppi.len() != dff_num {
            return Err(DruidError::InvalidArgument(format!(
                "expected {dff_num} state bits, got {}",
                tv.ppi.len()
            ))
            .logged());
        }
        if tv.is_transition_delay() != is_td {
            return Err(DruidError::InvalidArgument(
                "all test vectors in a ppsfp batch must agree on transition-delay framing"
                    .to_string(),
            )
            .logged());
        }
    }

    let gather = |field: &dyn Fn(&TestVector) -> &[Option<bool>], j: usize| -> Result<V> {
        let lanes: Vec<Option<bool>> = (0..64)
            .map(|lane| {
                let tv = if lane < n { &tvs[lane] } else { &tvs[0] };
                field(tv)[j]
            })
            .collect();
        V::pack_lanes(&lanes)
    };

    if is_td {
        let prev_pi: Vec<V> = (0..input_num)
            .map(|j| gather(&|tv| tv.prev_pi.as_deref().unwrap(), j))
            .collect::<Result<_>>()?;
        let ppi: Vec<V> = (0..dff_num).map(|j| gather(&|tv| tv.ppi.as_slice(), j)).collect::<Result<_>>()?;
        c.eval_good_frame(&prev_pi, &ppi)?;
        c.snapshot_hval();
        let captured = c.capture_state();
        let pi: Vec<V> = (0..input_num).map(|j| gather(&|tv| tv.pi.as_slice(), j)).collect::<Result<_>>()?;
        c.eval_good_frame(&pi, &captured)?;
    } else {
        let pi: Vec<V> = (0..input_num).map(|j| gather(&|tv| tv.pi.as_slice(), j)).collect::<Result<_>>()?;
        let ppi: Vec<V> = (0..dff_num).map(|j| gather(&|tv| tv.ppi.as_slice(), j)).collect::<Result<_>>()?;
        c.eval_good_frame(&pi, &ppi)?;
    }
    Ok(())
}
