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

use std::cell::Cell;

use rustworkx_core::petgraph::prelude::*;
use rustworkx_core::petgraph::visit::EdgeRef;
use smallvec::{smallvec, SmallVec};

use crate::gate::Gate;
use crate::{WireId, WireRef};

/// Per-operation metadata the router needs: arity, directive classification
/// and operand accessors.
pub trait Operation {
    /// The gate this operation applies.
    fn gate(&self) -> Gate;
    /// True for structural markers that are never emitted.
    fn directive(&self) -> bool;
    /// Number of wires the operation acts on.
    fn num_wires(&self) -> u32;
    /// The target operand.  For two-qubit operations this is the second
    /// wire.
    fn target(&self) -> WireRef;
    /// The control operand of a two-qubit operation.
    ///
    /// # Panics
    ///
    /// If the operation acts on fewer than two wires.
    fn control(&self) -> WireRef;

    fn is_one_qubit(&self) -> bool {
        !self.directive() && self.num_wires() == 1
    }

    fn is_two_qubit(&self) -> bool {
        !self.directive() && self.num_wires() == 2
    }
}

/// The capability set of a routable input circuit.
///
/// Anything that exposes named wires, a topological node structure and
/// per-node discharge counters can be routed; the router is written against
/// this interface rather than against a concrete DAG type.
///
/// Two multiplicity rules make the counter arithmetic work out:
///
/// * [`Network::foreach_output`] visits the first operation of every wire,
///   so an operation that begins two wires is visited twice;
/// * [`Network::foreach_child`] visits a successor once per wire the two
///   operations share.
///
/// A node is ready for traversal when its discharge counter reaches its
/// arity.  The counters are interior-mutable: traversals increment them
/// through a shared reference, and a speculative walk is expected to undo
/// every increment it made.
pub trait Network {
    type Op: Operation;

    /// Number of wires in the circuit.
    fn num_wires(&self) -> usize;
    /// Visit every wire with its name, in index order.
    fn foreach_wire(&self, f: impl FnMut(WireId, &str));
    /// The operation stored on a node.
    fn op(&self, id: NodeIndex) -> &Self::Op;
    /// Visit the traversal roots, once per root wire.
    fn foreach_output(&self, f: impl FnMut(NodeIndex));
    /// Visit the successors of `id`, once per shared wire.
    fn foreach_child(&self, id: NodeIndex, f: impl FnMut(NodeIndex));
    /// Reset every discharge counter to zero.
    fn clear_values(&self);
    /// Increment a node's discharge counter, returning the new value.
    fn incr_value(&self, id: NodeIndex) -> u32;
    /// Decrement a node's discharge counter.
    fn decr_value(&self, id: NodeIndex);
}

/// A single operation in a [`Netlist`]: the applied gate and its wire
/// operands, control first.
#[derive(Debug, Clone)]
pub struct NetOp {
    gate: Gate,
    wires: SmallVec<[WireRef; 2]>,
}

impl NetOp {
    fn one_qubit(gate: Gate, target: WireRef) -> Self {
        Self {
            gate,
            wires: smallvec![target],
        }
    }

    fn two_qubit(gate: Gate, control: WireRef, target: WireRef) -> Self {
        Self {
            gate,
            wires: smallvec![control, target],
        }
    }

    pub fn wires(&self) -> &[WireRef] {
        &self.wires
    }
}

impl Operation for NetOp {
    fn gate(&self) -> Gate {
        self.gate
    }

    fn directive(&self) -> bool {
        self.gate.directive()
    }

    fn num_wires(&self) -> u32 {
        self.wires.len() as u32
    }

    fn target(&self) -> WireRef {
        *self
            .wires
            .last()
            .expect("operations always have at least one wire")
    }

    fn control(&self) -> WireRef {
        assert!(
            self.wires.len() >= 2,
            "control is only defined for two-qubit operations"
        );
        self.wires[0]
    }
}

#[derive(Debug)]
struct NetNode {
    op: NetOp,
    /// Discharge counter used by the router's topological traversals.
    value: Cell<u32>,
}

/// An input circuit: named wires and a DAG of operations in program order.
///
/// The DAG records one edge per wire shared between consecutive operations
/// on that wire, so parallel edges appear when two operations share both
/// wires.  That multiplicity is what [`Network::foreach_child`] promises.
#[derive(Debug)]
pub struct Netlist {
    dag: DiGraph<NetNode, ()>,
    names: Vec<String>,
    /// First operation on each wire; the traversal roots.
    heads: Vec<Option<NodeIndex>>,
    /// Last operation on each wire, used to chain new operations in.
    tails: Vec<Option<NodeIndex>>,
}

impl Netlist {
    pub fn new() -> Self {
        Self {
            dag: DiGraph::new(),
            names: Vec::new(),
            heads: Vec::new(),
            tails: Vec::new(),
        }
    }

    /// A netlist with `n` wires named `q0`, `q1`, ….
    pub fn with_wires(n: usize) -> Self {
        let mut netlist = Self::new();
        for i in 0..n {
            netlist.add_wire(format!("q{i}"));
        }
        netlist
    }

    pub fn add_wire(&mut self, name: impl Into<String>) -> WireId {
        let id = WireId::new(self.names.len() as u32);
        self.names.push(name.into());
        self.heads.push(None);
        self.tails.push(None);
        id
    }

    pub fn num_ops(&self) -> usize {
        self.dag.node_count()
    }

    /// Count of operations that are not directives.
    pub fn num_gates(&self) -> usize {
        self.dag
            .node_weights()
            .filter(|node| !node.op.directive())
            .count()
    }

    /// The current discharge counter of a node.
    pub fn value(&self, id: NodeIndex) -> u32 {
        self.dag[id].value.get()
    }

    /// Append a one-qubit operation (or a per-wire directive).
    pub fn create_op(&mut self, gate: Gate, target: impl Into<WireRef>) -> NodeIndex {
        assert_eq!(gate.num_qubits(), 1, "{} is not a one-qubit gate", gate);
        self.push(NetOp::one_qubit(gate, target.into()))
    }

    /// Append a two-qubit operation; the control comes first.
    pub fn create_op2(
        &mut self,
        gate: Gate,
        control: impl Into<WireRef>,
        target: impl Into<WireRef>,
    ) -> NodeIndex {
        assert_eq!(gate.num_qubits(), 2, "{} is not a two-qubit gate", gate);
        let (control, target) = (control.into(), target.into());
        assert_ne!(
            control.wire, target.wire,
            "a two-qubit operation needs two distinct wires"
        );
        self.push(NetOp::two_qubit(gate, control, target))
    }

    fn push(&mut self, op: NetOp) -> NodeIndex {
        let wires: SmallVec<[WireRef; 2]> = op.wires.clone();
        let id = self.dag.add_node(NetNode {
            op,
            value: Cell::new(0),
        });
        for wire in &wires {
            let w = wire.index();
            assert!(w < self.names.len(), "operation references an unknown wire");
            if let Some(prev) = self.tails[w] {
                self.dag.add_edge(prev, id, ());
            } else {
                self.heads[w] = Some(id);
            }
            self.tails[w] = Some(id);
        }
        id
    }
}

impl Default for Netlist {
    fn default() -> Self {
        Self::new()
    }
}

impl Network for Netlist {
    type Op = NetOp;

    fn num_wires(&self) -> usize {
        self.names.len()
    }

    fn foreach_wire(&self, mut f: impl FnMut(WireId, &str)) {
        for (i, name) in self.names.iter().enumerate() {
            f(WireId::new(i as u32), name);
        }
    }

    fn op(&self, id: NodeIndex) -> &NetOp {
        &self.dag[id].op
    }

    fn foreach_output(&self, mut f: impl FnMut(NodeIndex)) {
        for head in self.heads.iter().flatten() {
            f(*head);
        }
    }

    fn foreach_child(&self, id: NodeIndex, mut f: impl FnMut(NodeIndex)) {
        for edge in self.dag.edges_directed(id, Direction::Outgoing) {
            f(edge.target());
        }
    }

    fn clear_values(&self) {
        for node in self.dag.node_weights() {
            node.value.set(0);
        }
    }

    fn incr_value(&self, id: NodeIndex) -> u32 {
        let value = &self.dag[id].value;
        value.set(value.get() + 1);
        value.get()
    }

    fn decr_value(&self, id: NodeIndex) {
        let value = &self.dag[id].value;
        value.set(value.get() - 1);
    }
}
