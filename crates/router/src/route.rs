// This code is part of Qumap.
//
// (C) Copyright Qumap contributors 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

use fixedbitset::FixedBitSet;
use indexmap::IndexMap;
use rustworkx_core::petgraph::graph::NodeIndex;

use qumap_circuit::{Gate, Network, Operation, PhyRef, PhysicalQubit, VirtualQubit, WireRef};

use crate::config::RouterConfig;
use crate::mapped::MappedDag;
use crate::placement::Placement;
use crate::target::RoutingTarget;
use crate::RouteError;

/// Floor on the no-progress guard, so tiny devices still get some slack
/// before the search is declared stuck.
const MIN_SEARCH_CAP: usize = 64;

/// A just-in-time SABRE-style router over a fixed device target.
///
/// The router consumes any [`Network`] circuit and an initial placement in
/// which entries may be left unplaced; those virtual qubits are assigned to
/// physical qubits the first time a two-qubit gate touches them, as close as
/// possible to wherever that gate needs them.
pub struct JitRouter<'a> {
    target: &'a RoutingTarget,
    config: RouterConfig,
}

impl<'a> JitRouter<'a> {
    pub fn new(target: &'a RoutingTarget, config: RouterConfig) -> Self {
        Self { target, config }
    }

    /// Route `original` onto the device, starting from `placement` (`None`
    /// entries are placed just in time).  With `finalize`, any virtual qubit
    /// still unplaced when the circuit is exhausted is assigned to a leftover
    /// free physical, and its deferred one-qubit gates are flushed.
    pub fn route<N: Network>(
        &self,
        original: &N,
        placement: &[Option<PhysicalQubit>],
        finalize: bool,
    ) -> Result<MappedDag<'a>, RouteError> {
        self.config.validate()?;
        let num_qubits = self.target.num_qubits();
        if placement.len() != num_qubits {
            return Err(RouteError::PlacementLength {
                got: placement.len(),
                expected: num_qubits,
            });
        }
        let mut occupied = FixedBitSet::with_capacity(num_qubits);
        for phy in placement.iter().flatten() {
            if phy.index() >= num_qubits {
                return Err(RouteError::PlacementOutOfBounds(*phy));
            }
            if occupied.put(phy.index()) {
                return Err(RouteError::PlacementCollision(*phy));
            }
        }
        if original.num_wires() > num_qubits {
            return Err(RouteError::WidthExceedsDevice {
                wires: original.num_wires(),
                qubits: num_qubits,
            });
        }

        let mapped = MappedDag::new(original, self.target);
        let placement = Placement::new(original, &mapped, placement);
        let mut state = RoutingState {
            target: self.target,
            config: &self.config,
            original,
            mapped,
            placement,
            front_layer: Vec::new(),
            extended_layer: Vec::new(),
            involved_phy: FixedBitSet::with_capacity(num_qubits),
            phy_decay: vec![1.0; num_qubits],
            unexecuted: vec![Vec::new(); num_qubits],
        };
        state.run(finalize)?;

        let RoutingState {
            mut mapped,
            placement,
            ..
        } = state;
        mapped.set_v_to_phy(placement.v_to_phy_vec());
        Ok(mapped)
    }
}

/// Working state of a single routing session.  Everything here is scratch
/// that lives exactly as long as one `route` call.
struct RoutingState<'a, 'b, N: Network> {
    target: &'a RoutingTarget,
    config: &'b RouterConfig,
    original: &'b N,
    mapped: MappedDag<'a>,
    placement: Placement,
    /// Nodes whose predecessors are all discharged but which have not been
    /// emitted yet.
    front_layer: Vec<NodeIndex>,
    /// Bounded look-ahead window of upcoming two-qubit nodes, rebuilt on
    /// demand.
    extended_layer: Vec<NodeIndex>,
    /// Physical qubits pinned under currently-stuck two-qubit gates.
    involved_phy: FixedBitSet,
    /// Per-physical decay multipliers penalising recently swapped qubits.
    phy_decay: Vec<f64>,
    /// One-qubit gates that arrived while their wire was still unplaced, in
    /// arrival order per virtual qubit.
    unexecuted: Vec<Vec<Gate>>,
}

impl<N: Network> RoutingState<'_, '_, N> {
    fn run(&mut self, finalize: bool) -> Result<(), RouteError> {
        let original = self.original;
        original.clear_values();
        let mut front_layer = Vec::new();
        original.foreach_output(|id| {
            let op = original.op(id);
            if op.directive() {
                return;
            }
            if original.incr_value(id) == op.num_wires() {
                front_layer.push(id);
            }
        });
        self.front_layer = front_layer;

        let mut num_swap_searches: u32 = 0;
        let mut searches_since_progress: usize = 0;
        while !self.front_layer.is_empty() {
            if self.advance_front_layer() {
                searches_since_progress = 0;
                continue;
            }
            num_swap_searches += 1;
            searches_since_progress += 1;
            if searches_since_progress > self.search_cap() {
                return Err(RouteError::NoProgress {
                    searches: searches_since_progress,
                });
            }
            let [phy0, phy1] = self.find_swap();
            if num_swap_searches % self.config.num_rounds_decay_reset == 0 {
                self.phy_decay.fill(1.0);
            } else {
                self.phy_decay[phy0.index()] += self.config.decay_delta;
                self.phy_decay[phy1.index()] += self.config.decay_delta;
            }
            self.add_swap(phy0, phy1);
            self.involved_phy.clear();
        }

        if finalize {
            self.finalize_placement();
        }
        Ok(())
    }

    /// Ceiling on consecutive fruitless SWAP searches before routing is
    /// declared stuck.  Repeated swaps along a shortest path reduce the
    /// front layer's total distance well within this bound.
    fn search_cap(&self) -> usize {
        let n = self.target.num_qubits();
        MIN_SEARCH_CAP.max(n * n * self.front_layer.len())
    }

    /// One pass over the front layer: emit everything currently emittable,
    /// keep what is stuck (marking its physicals), and collect the newly
    /// unblocked successors.  Returns whether any gate was emitted.
    fn advance_front_layer(&mut self) -> bool {
        let original = self.original;
        let mut executed = false;
        let mut new_front_layer = Vec::new();
        for id in std::mem::take(&mut self.front_layer) {
            let op = original.op(id);
            if op.directive() {
                continue;
            }
            if op.is_one_qubit() {
                self.add_op(op.gate(), op.target());
            } else if !self.try_add_op2(op.gate(), op.control(), op.target()) {
                new_front_layer.push(id);
                let control = self
                    .placement
                    .wire_to_phy(op.control())
                    .expect("stuck operands were placed just in time");
                let target = self
                    .placement
                    .wire_to_phy(op.target())
                    .expect("stuck operands were placed just in time");
                self.involved_phy.insert(control.index());
                self.involved_phy.insert(target.index());
                continue;
            }
            executed = true;
            original.foreach_child(id, |child| {
                let child_op = original.op(child);
                if child_op.directive() {
                    return;
                }
                if original.incr_value(child) == child_op.num_wires() {
                    new_front_layer.push(child);
                }
            });
        }
        self.front_layer = new_front_layer;
        executed
    }

    /// Emit a one-qubit gate, or buffer it if its wire is not placed yet.
    fn add_op(&mut self, gate: Gate, wire: WireRef) {
        match self.placement.wire_to_phy(wire) {
            Some(phy) => {
                self.mapped.create_op(gate, phy);
            }
            None => {
                let v = self.placement.wire_to_v(wire);
                self.unexecuted[v.index()].push(gate);
            }
        }
    }

    /// Attempt to emit a two-qubit gate, placing unplaced operands first.
    /// Returns false when the operands end up on non-adjacent physicals.
    fn try_add_op2(&mut self, gate: Gate, control: WireRef, target: WireRef) -> bool {
        let mut phy0 = self.placement.wire_to_phy(control);
        let mut phy1 = self.placement.wire_to_phy(target);
        if phy0.is_none() && phy1.is_none() {
            self.place_two(
                self.placement.wire_to_v(control),
                self.placement.wire_to_v(target),
            );
            phy0 = self.placement.wire_to_phy(control);
            phy1 = self.placement.wire_to_phy(target);
        } else if phy0.is_none() || phy1.is_none() {
            self.place_one(
                self.placement.wire_to_v(control),
                self.placement.wire_to_v(target),
            );
            phy0 = self.placement.wire_to_phy(control);
            phy1 = self.placement.wire_to_phy(target);
        }
        let phy0 = phy0.expect("both operands are placed at this point");
        let phy1 = phy1.expect("both operands are placed at this point");
        if !self.target.are_connected(phy0, phy1) {
            return false;
        }
        let mut phy0 = PhyRef::new(phy0);
        if control.complemented {
            phy0 = phy0.complement();
        }
        self.mapped
            .create_op2(gate, phy0, phy1)
            .expect("emitted two-qubit gates act on adjacent physicals");
        true
    }

    /// Place two as-yet-unplaced virtual qubits, preferring the closest pair
    /// of free physicals.  With exactly two free slots they are taken in
    /// enumeration order; otherwise the first minimum-distance pair of the
    /// upper-triangular scan wins.
    fn place_two(&mut self, v0: VirtualQubit, v1: VirtualQubit) {
        let free = self.placement.free_phy();
        assert!(
            free.len() >= 2,
            "a two-qubit gate on unplaced qubits implies two free physicals"
        );
        let (mut phy0, mut phy1) = (free[0], free[1]);
        if free.len() > 2 {
            let mut min_dist = f64::INFINITY;
            for i in 0..free.len() {
                for j in (i + 1)..free.len() {
                    let dist = self.target.distance(free[i], free[j]);
                    if dist < min_dist {
                        min_dist = dist;
                        phy0 = free[i];
                        phy1 = free[j];
                    }
                }
            }
        }
        self.placement.assign(v0, phy0);
        self.placement.assign(v1, phy1);
        self.jit_flush(v0);
        self.jit_flush(v1);
    }

    /// Place the unplaced one of `{v0, v1}` on the free physical nearest to
    /// its already-placed partner; ties break on the first seen.
    fn place_one(&mut self, v0: VirtualQubit, v1: VirtualQubit) {
        let (v_unplaced, p_placed) = match (self.placement.v_to_phy(v0), self.placement.v_to_phy(v1))
        {
            (None, Some(p)) => (v0, p),
            (Some(p), None) => (v1, p),
            _ => unreachable!("place_one requires exactly one unplaced operand"),
        };
        let free = self.placement.free_phy();
        assert!(
            !free.is_empty(),
            "an unplaced virtual qubit implies a free physical"
        );
        let mut best = free[0];
        let mut min_dist = self.target.distance(p_placed, best);
        for &phy in &free[1..] {
            let dist = self.target.distance(p_placed, phy);
            if dist < min_dist {
                min_dist = dist;
                best = phy;
            }
        }
        self.placement.assign(v_unplaced, best);
        self.jit_flush(v_unplaced);
    }

    /// Emit the one-qubit gates buffered while `v` was unplaced, in arrival
    /// order, onto its newly assigned physical.
    fn jit_flush(&mut self, v: VirtualQubit) {
        let phy = self
            .placement
            .v_to_phy(v)
            .expect("flushing happens right after assignment");
        for gate in std::mem::take(&mut self.unexecuted[v.index()]) {
            self.mapped.create_op(gate, phy);
        }
    }

    /// Apply a SWAP between two connected physicals: permute the placement
    /// and emit the gate.
    fn add_swap(&mut self, phy0: PhysicalQubit, phy1: PhysicalQubit) {
        debug_assert!(self.target.are_connected(phy0, phy1));
        self.placement.apply_swap(phy0, phy1);
        self.mapped
            .create_op2(Gate::Swap, phy0, phy1)
            .expect("swaps are only applied along device edges");
    }

    /// Choose the SWAP with minimal decay-weighted heuristic cost among the
    /// device edges that touch a stuck qubit.  Ties break on the earliest
    /// edge in the device's enumeration order.
    fn find_swap(&mut self) -> [PhysicalQubit; 2] {
        let mut candidates = Vec::new();
        for i in 0..self.target.num_edges() {
            let [u, v] = self.target.edge(i);
            if self.involved_phy.contains(u.index()) || self.involved_phy.contains(v.index()) {
                candidates.push([u, v]);
            }
        }
        assert!(
            !candidates.is_empty(),
            "a stuck front layer always pins at least one device edge"
        );

        if self.config.use_look_ahead {
            self.select_extended_layer();
        }

        let mut best = candidates[0];
        let mut best_cost = f64::INFINITY;
        for &[phy0, phy1] in &candidates {
            let mut tmp_v_to_phy = self.placement.v_to_phy_vec();
            if let Some(v0) = self.placement.phy_to_v(phy0) {
                tmp_v_to_phy[v0.index()] = Some(phy1);
            }
            if let Some(v1) = self.placement.phy_to_v(phy1) {
                tmp_v_to_phy[v1.index()] = Some(phy0);
            }
            let mut cost = self.compute_cost(&tmp_v_to_phy, &self.front_layer);
            if !self.extended_layer.is_empty() {
                let f_cost = cost / self.front_layer.len() as f64;
                let e_cost = self.compute_cost(&tmp_v_to_phy, &self.extended_layer)
                    / self.extended_layer.len() as f64;
                cost = f_cost + self.config.e_weight * e_cost;
            }
            let max_decay = self.phy_decay[phy0.index()].max(self.phy_decay[phy1.index()]);
            let cost = max_decay * cost;
            if cost < best_cost {
                best_cost = cost;
                best = [phy0, phy1];
            }
        }
        best
    }

    /// Summed excess distance of a gate list under a trial placement.  Gates
    /// with an unplaced operand have no defined distance and are skipped.
    fn compute_cost(&self, v_to_phy: &[Option<PhysicalQubit>], gates: &[NodeIndex]) -> f64 {
        let mut cost = 0.0;
        for &id in gates {
            let op = self.original.op(id);
            let phy0 = v_to_phy[self.placement.wire_to_v(op.control()).index()];
            let phy1 = v_to_phy[self.placement.wire_to_v(op.target()).index()];
            if let (Some(phy0), Some(phy1)) = (phy0, phy1) {
                cost += self.target.distance(phy0, phy1) - 1.0;
            }
        }
        cost
    }

    /// Rebuild the bounded look-ahead window of upcoming two-qubit nodes.
    ///
    /// The breadth-first walk borrows the circuit's discharge counters to
    /// discover which successors would become ready, recording every
    /// increment so it can be undone; the counters are bit-exact on return.
    /// Expansion halts the moment the window is full.
    fn select_extended_layer(&mut self) {
        let original = self.original;
        self.extended_layer.clear();
        if self.config.e_set_size == 0 {
            return;
        }
        let extended_layer = &mut self.extended_layer;
        let mut incremented: IndexMap<NodeIndex, u32, ahash::RandomState> =
            IndexMap::with_hasher(ahash::RandomState::default());
        let mut tmp_front_layer = self.front_layer.clone();
        'expand: while !tmp_front_layer.is_empty() {
            let mut new_tmp_front_layer = Vec::new();
            for &id in &tmp_front_layer {
                original.foreach_child(id, |child| {
                    let op = original.op(child);
                    if op.directive() {
                        return;
                    }
                    *incremented.entry(child).or_insert(0) += 1;
                    if original.incr_value(child) == op.num_wires() {
                        new_tmp_front_layer.push(child);
                        if op.is_two_qubit() {
                            extended_layer.push(child);
                        }
                    }
                });
                if extended_layer.len() >= self.config.e_set_size {
                    break 'expand;
                }
            }
            tmp_front_layer = new_tmp_front_layer;
        }
        for (&id, &amount) in incremented.iter() {
            for _ in 0..amount {
                original.decr_value(id);
            }
        }
    }

    /// Give every still-unplaced virtual qubit a free physical, in index
    /// order, popping from the back of the ascending free list, and flush
    /// its deferred one-qubit gates.
    fn finalize_placement(&mut self) {
        let mut free = self.placement.free_phy();
        for v in 0..self.placement.num_qubits() {
            let v = VirtualQubit::new(v as u32);
            if self.placement.v_to_phy(v).is_none() {
                let phy = free
                    .pop()
                    .expect("free physicals always match unplaced virtuals");
                self.placement.assign(v, phy);
                self.jit_flush(v);
            }
        }
    }
}
