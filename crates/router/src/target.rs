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
use ndarray::{Array2, ArrayView2};

use qumap_circuit::PhysicalQubit;

use crate::neighbors::{ConstructionError, Neighbors};

/// All-pairs hop counts by one BFS per qubit over the adjacency table.
/// Unreachable pairs are left at infinity.
fn distance_matrix(neighbors: &Neighbors) -> Array2<f64> {
    let n = neighbors.num_qubits();
    let adjacency = (0..n)
        .map(|q| {
            neighbors[PhysicalQubit::new(q as u32)]
                .iter()
                .map(|p| p.index())
                .collect::<FixedBitSet>()
        })
        .collect::<Vec<_>>();
    let mut out = Array2::from_elem((n, n), f64::INFINITY);
    let mut seen = FixedBitSet::with_capacity(n);
    let mut cur = FixedBitSet::with_capacity(n);
    let mut next = FixedBitSet::with_capacity(n);
    for start in 0..n {
        seen.clear();
        cur.clear();
        cur.insert(start);
        let mut distance = 0.0;
        while !cur.is_clear() {
            next.clear();
            for found in cur.ones() {
                out[[start, found]] = distance;
                next |= &adjacency[found];
            }
            seen.union_with(&cur);
            next.difference_with(&seen);
            distance += 1.0;
            std::mem::swap(&mut cur, &mut next);
        }
    }
    out
}

/// A routing target: device connectivity plus the derived lookup structures
/// the router needs.
///
/// The edge list keeps its construction order.  That order is observable: it
/// is the tie-break order when several SWAP candidates score equally.
#[derive(Clone, Debug)]
pub struct RoutingTarget {
    neighbors: Neighbors,
    edges: Vec<[PhysicalQubit; 2]>,
    distance: Array2<f64>,
}

impl RoutingTarget {
    pub fn from_edges(num_qubits: usize, edges: &[[u32; 2]]) -> Result<Self, ConstructionError> {
        let edges: Vec<[PhysicalQubit; 2]> = edges
            .iter()
            .map(|[u, v]| [PhysicalQubit::new(*u), PhysicalQubit::new(*v)])
            .collect();
        let neighbors = Neighbors::from_edges(num_qubits, &edges)?;
        let distance = distance_matrix(&neighbors);
        Ok(Self {
            neighbors,
            edges,
            distance,
        })
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.neighbors.num_qubits()
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn edge(&self, index: usize) -> [PhysicalQubit; 2] {
        self.edges[index]
    }

    pub fn edges(&self) -> &[[PhysicalQubit; 2]] {
        &self.edges
    }

    pub fn neighbors(&self) -> &Neighbors {
        &self.neighbors
    }

    /// Whether two physicals share a device edge.  A qubit is never
    /// connected to itself.
    #[inline]
    pub fn are_connected(&self, p: PhysicalQubit, q: PhysicalQubit) -> bool {
        self.neighbors.contains_edge(p, q)
    }

    /// Shortest-path hop count between two physicals.
    #[inline]
    pub fn distance(&self, p: PhysicalQubit, q: PhysicalQubit) -> f64 {
        self.distance[[p.index(), q.index()]]
    }

    pub fn distance_matrix(&self) -> ArrayView2<'_, f64> {
        self.distance.view()
    }

    /// A 0–1–…–(n-1) path.
    pub fn line(n: usize) -> Self {
        let edges: Vec<[u32; 2]> = (1..n as u32).map(|i| [i - 1, i]).collect();
        Self::from_edges(n, &edges).expect("line edges are always valid")
    }

    /// A path closed back onto qubit 0.  Needs at least three qubits.
    pub fn ring(n: usize) -> Self {
        assert!(n >= 3, "a ring needs at least three qubits");
        let mut edges: Vec<[u32; 2]> = (1..n as u32).map(|i| [i - 1, i]).collect();
        edges.push([n as u32 - 1, 0]);
        Self::from_edges(n, &edges).expect("ring edges are always valid")
    }

    /// A `rows` × `cols` grid, row-major.
    pub fn grid(rows: usize, cols: usize) -> Self {
        let mut edges = Vec::new();
        let at = |r: usize, c: usize| (r * cols + c) as u32;
        for r in 0..rows {
            for c in 0..cols {
                if c + 1 < cols {
                    edges.push([at(r, c), at(r, c + 1)]);
                }
                if r + 1 < rows {
                    edges.push([at(r, c), at(r + 1, c)]);
                }
            }
        }
        Self::from_edges(rows * cols, &edges).expect("grid edges are always valid")
    }

    /// All-to-all connectivity.
    pub fn complete(n: usize) -> Self {
        let mut edges = Vec::new();
        for i in 0..n as u32 {
            for j in (i + 1)..n as u32 {
                edges.push([i, j]);
            }
        }
        Self::from_edges(n, &edges).expect("complete-graph edges are always valid")
    }
}
