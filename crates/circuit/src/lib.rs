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

//! Circuit-side types consumed by the router: wire and qubit indices, the
//! gate library, and the netlist DAG together with the capability traits a
//! routable circuit has to implement.

mod dag;
mod gate;

pub use dag::{NetOp, Netlist, Network, Operation};
pub use gate::Gate;

/// A newtype for the different categories of qubit used while mapping.  This
/// is to enforce significantly more type safety when dealing with mixtures of
/// physical and virtual qubits, as we typically are when dealing with
/// placements: it's not possible to accidentally pass the wrong category of
/// qubit to a lookup.
macro_rules! qubit_newtype {
    ($id: ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $id(u32);

        impl $id {
            #[inline]
            pub fn new(val: u32) -> Self {
                Self(val)
            }
            #[inline]
            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }
    };
}

qubit_newtype!(VirtualQubit);
qubit_newtype!(PhysicalQubit);
qubit_newtype!(WireId);

/// A reference to an input-circuit wire.
///
/// The polarity bit marks a negative control on a two-qubit operation.  It is
/// a property of the reference, never of the wire itself, and takes no part
/// in placement or distance calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireRef {
    pub wire: WireId,
    pub complemented: bool,
}

impl WireRef {
    #[inline]
    pub fn new(wire: WireId) -> Self {
        Self {
            wire,
            complemented: false,
        }
    }

    /// The same reference with the polarity bit flipped.
    #[inline]
    pub fn complement(self) -> Self {
        Self {
            complemented: !self.complemented,
            ..self
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.wire.index()
    }
}

impl From<WireId> for WireRef {
    fn from(wire: WireId) -> Self {
        Self::new(wire)
    }
}

/// A reference to a mapped-circuit physical qubit, with the same polarity
/// semantics as [`WireRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhyRef {
    pub qubit: PhysicalQubit,
    pub complemented: bool,
}

impl PhyRef {
    #[inline]
    pub fn new(qubit: PhysicalQubit) -> Self {
        Self {
            qubit,
            complemented: false,
        }
    }

    /// The same reference with the polarity bit flipped.
    #[inline]
    pub fn complement(self) -> Self {
        Self {
            complemented: !self.complemented,
            ..self
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.qubit.index()
    }
}

impl From<PhysicalQubit> for PhyRef {
    fn from(qubit: PhysicalQubit) -> Self {
        Self::new(qubit)
    }
}
