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

use hashbrown::HashMap;
use smallvec::{smallvec, SmallVec};

use qumap_circuit::{Gate, Network, PhyRef, PhysicalQubit, VirtualQubit};

use crate::target::RoutingTarget;

/// A single emitted operation of the mapped circuit.
#[derive(Clone, Debug, PartialEq)]
pub struct MappedOp {
    pub gate: Gate,
    /// Physical operands, control first for two-qubit gates.
    pub qubits: SmallVec<[PhyRef; 2]>,
}

/// The routed output circuit: an emission-ordered operation list over
/// physical qubits, plus the published virtual-to-physical map.
///
/// The wire table is the input circuit's wires, padded with ancillas up to
/// the device width, so every virtual qubit index has a name on the output
/// side.
#[derive(Clone, Debug)]
pub struct MappedDag<'a> {
    target: &'a RoutingTarget,
    names: Vec<String>,
    wires: HashMap<String, VirtualQubit>,
    ops: Vec<MappedOp>,
    v_to_phy: Vec<Option<PhysicalQubit>>,
}

impl<'a> MappedDag<'a> {
    /// An empty mapped circuit over the full device width.
    pub fn new<N: Network>(original: &N, target: &'a RoutingTarget) -> Self {
        let num_qubits = target.num_qubits();
        let mut names = Vec::with_capacity(num_qubits);
        original.foreach_wire(|_, name| names.push(name.to_string()));
        let mut ancilla = 0usize;
        while names.len() < num_qubits {
            let name = format!("ancilla{ancilla}");
            ancilla += 1;
            if !names.contains(&name) {
                names.push(name);
            }
        }
        let wires = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), VirtualQubit::new(i as u32)))
            .collect();
        Self {
            target,
            names,
            wires,
            ops: Vec::new(),
            v_to_phy: vec![None; num_qubits],
        }
    }

    /// The output-side virtual qubit carrying the named wire.
    pub fn wire(&self, name: &str) -> Option<VirtualQubit> {
        self.wires.get(name).copied()
    }

    pub fn wire_name(&self, v: VirtualQubit) -> &str {
        &self.names[v.index()]
    }

    pub fn num_wires(&self) -> usize {
        self.names.len()
    }

    /// Append a one-qubit operation.  This never fails.
    pub fn create_op(&mut self, gate: Gate, phy: impl Into<PhyRef>) -> usize {
        self.ops.push(MappedOp {
            gate,
            qubits: smallvec![phy.into()],
        });
        self.ops.len() - 1
    }

    /// Append a two-qubit operation.  Returns `None` when the two physicals
    /// do not share a device edge; such an operation would not be
    /// executable.
    pub fn create_op2(
        &mut self,
        gate: Gate,
        phy0: impl Into<PhyRef>,
        phy1: impl Into<PhyRef>,
    ) -> Option<usize> {
        let (phy0, phy1) = (phy0.into(), phy1.into());
        if !self.target.are_connected(phy0.qubit, phy1.qubit) {
            return None;
        }
        self.ops.push(MappedOp {
            gate,
            qubits: smallvec![phy0, phy1],
        });
        Some(self.ops.len() - 1)
    }

    /// Publish the circuit's virtual-to-physical map.
    pub fn set_v_to_phy(&mut self, map: Vec<Option<PhysicalQubit>>) {
        self.v_to_phy = map;
    }

    pub fn v_to_phy(&self) -> &[Option<PhysicalQubit>] {
        &self.v_to_phy
    }

    pub fn ops(&self) -> &[MappedOp] {
        &self.ops
    }

    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Number of SWAPs routing inserted.
    pub fn swap_count(&self) -> usize {
        self.ops.iter().filter(|op| op.gate == Gate::Swap).count()
    }
}
