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

use qumap_circuit::{Network, PhysicalQubit, VirtualQubit, WireRef};

use crate::mapped::MappedDag;

/// The three placement index maps.
///
/// `wire_to_v` is fixed after construction; the other two stay coherent
/// inverses of each other through every swap and assignment:
///
/// * for every placed virtual `v`, `phy_to_v[v_to_phy[v]] == v`;
/// * for every occupied physical `p`, `v_to_phy[phy_to_v[p]] == p`;
/// * the number of free physicals equals the number of unplaced virtuals.
#[derive(Clone, Debug)]
pub struct Placement {
    /// Input wire to mapped virtual qubit.
    wire_to_v: Vec<VirtualQubit>,
    /// Virtual to physical; `None` is "not placed yet".
    v_to_phy: Vec<Option<PhysicalQubit>>,
    /// Physical to virtual; `None` is "free".
    phy_to_v: Vec<Option<VirtualQubit>>,
}

impl Placement {
    /// Build the maps for a fresh routing session.  `placement` must already
    /// be validated against the device size.
    pub(crate) fn new<N: Network>(
        original: &N,
        mapped: &MappedDag,
        placement: &[Option<PhysicalQubit>],
    ) -> Self {
        let mut wire_to_v = vec![VirtualQubit::new(0); original.num_wires()];
        original.foreach_wire(|wire, name| {
            wire_to_v[wire.index()] = mapped
                .wire(name)
                .expect("the mapped DAG carries every input wire");
        });
        let v_to_phy = placement.to_vec();
        let mut phy_to_v = vec![None; placement.len()];
        for (v, phy) in v_to_phy.iter().enumerate() {
            if let Some(phy) = phy {
                phy_to_v[phy.index()] = Some(VirtualQubit::new(v as u32));
            }
        }
        let out = Self {
            wire_to_v,
            v_to_phy,
            phy_to_v,
        };
        out.debug_check();
        out
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.phy_to_v.len()
    }

    #[inline]
    pub fn wire_to_v(&self, w: WireRef) -> VirtualQubit {
        self.wire_to_v[w.index()]
    }

    /// The physical qubit currently hosting a wire's virtual qubit, if that
    /// virtual is placed.
    #[inline]
    pub fn wire_to_phy(&self, w: WireRef) -> Option<PhysicalQubit> {
        self.v_to_phy[self.wire_to_v[w.index()].index()]
    }

    #[inline]
    pub fn v_to_phy(&self, v: VirtualQubit) -> Option<PhysicalQubit> {
        self.v_to_phy[v.index()]
    }

    #[inline]
    pub fn phy_to_v(&self, p: PhysicalQubit) -> Option<VirtualQubit> {
        self.phy_to_v[p.index()]
    }

    /// Snapshot of the virtual-to-physical map, used both for trial-swap
    /// scoring and to publish the final placement.
    pub fn v_to_phy_vec(&self) -> Vec<Option<PhysicalQubit>> {
        self.v_to_phy.clone()
    }

    /// Assign an unplaced virtual qubit to a free physical qubit.
    pub fn assign(&mut self, v: VirtualQubit, p: PhysicalQubit) {
        debug_assert!(self.v_to_phy[v.index()].is_none(), "virtual already placed");
        debug_assert!(self.phy_to_v[p.index()].is_none(), "physical already occupied");
        self.v_to_phy[v.index()] = Some(p);
        self.phy_to_v[p.index()] = Some(v);
        self.debug_check();
    }

    /// Exchange the occupants of two physical qubits.  Either side may be
    /// free.
    pub fn apply_swap(&mut self, p0: PhysicalQubit, p1: PhysicalQubit) {
        if let Some(v0) = self.phy_to_v[p0.index()] {
            self.v_to_phy[v0.index()] = Some(p1);
        }
        if let Some(v1) = self.phy_to_v[p1.index()] {
            self.v_to_phy[v1.index()] = Some(p0);
        }
        self.phy_to_v.swap(p0.index(), p1.index());
        self.debug_check();
    }

    /// Free physical qubits in ascending index order.
    pub fn free_phy(&self) -> Vec<PhysicalQubit> {
        self.phy_to_v
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(p, _)| PhysicalQubit::new(p as u32))
            .collect()
    }

    /// Coherence of the two placement directions; a violation here is a bug
    /// in the router, not a user error.
    fn debug_check(&self) {
        #[cfg(debug_assertions)]
        {
            for (v, phy) in self.v_to_phy.iter().enumerate() {
                if let Some(phy) = phy {
                    debug_assert_eq!(
                        self.phy_to_v[phy.index()].map(|v| v.index()),
                        Some(v),
                        "phy_to_v disagrees with v_to_phy"
                    );
                }
            }
            for (p, v) in self.phy_to_v.iter().enumerate() {
                if let Some(v) = v {
                    debug_assert_eq!(
                        self.v_to_phy[v.index()].map(|p| p.index()),
                        Some(p),
                        "v_to_phy disagrees with phy_to_v"
                    );
                }
            }
            let free = self.phy_to_v.iter().filter(|v| v.is_none()).count();
            let unplaced = self.v_to_phy.iter().filter(|p| p.is_none()).count();
            debug_assert_eq!(free, unplaced, "free physicals must match unplaced virtuals");
        }
    }
}
