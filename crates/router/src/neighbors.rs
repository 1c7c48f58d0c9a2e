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

use qumap_circuit::PhysicalQubit;
use thiserror::Error;

/// A hash-free fixed-size sparse adjacency-list representation of the
/// neighbors of each physical qubit.
///
/// The storage is one flat vector with its partition points indicated by a
/// separate vector, so each qubit's (sorted) neighbor list is a contiguous
/// slice.  Undirected edges are stored in both directions to keep lookups
/// local.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Neighbors {
    neighbors: Vec<PhysicalQubit>,
    partition: Vec<usize>,
}

impl Neighbors {
    /// Build the adjacency table from an undirected edge list.
    pub fn from_edges(
        num_qubits: usize,
        edges: &[[PhysicalQubit; 2]],
    ) -> Result<Self, ConstructionError> {
        let mut adjacency = vec![Vec::new(); num_qubits];
        for [u, v] in edges {
            if u.index() >= num_qubits || v.index() >= num_qubits {
                return Err(ConstructionError::QubitOutOfBounds);
            }
            if u == v {
                return Err(ConstructionError::SelfLoop);
            }
            adjacency[u.index()].push(*v);
            adjacency[v.index()].push(*u);
        }
        let mut neighbors = Vec::with_capacity(2 * edges.len());
        let mut partition = Vec::with_capacity(num_qubits + 1);
        partition.push(0);
        for mut list in adjacency {
            list.sort();
            if list.windows(2).any(|pair| pair[0] == pair[1]) {
                return Err(ConstructionError::DuplicateEdge);
            }
            neighbors.extend_from_slice(&list);
            partition.push(neighbors.len());
        }
        Ok(Self {
            neighbors,
            partition,
        })
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.partition.len() - 1
    }

    /// Are two qubits neighbors?
    ///
    /// Linear in the degree of `left`; device degrees are small enough that
    /// this beats a binary search.
    #[inline]
    pub fn contains_edge(&self, left: PhysicalQubit, right: PhysicalQubit) -> bool {
        self[left].contains(&right)
    }
}

impl std::ops::Index<PhysicalQubit> for Neighbors {
    type Output = [PhysicalQubit];

    #[inline]
    fn index(&self, index: PhysicalQubit) -> &Self::Output {
        let index = index.index();
        &self.neighbors[self.partition[index]..self.partition[index + 1]]
    }
}

/// The reasons constructing a [`Neighbors`] table can fail.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("an edge references a qubit outside the device")]
    QubitOutOfBounds,
    #[error("an edge connects a qubit to itself")]
    SelfLoop,
    #[error("the edge list contains the same connection twice")]
    DuplicateEdge,
}
