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

//! A greedy, heuristic router in the spirit of SABRE, with just-in-time
//! placement.
//!
//! The router consumes an abstract circuit (any [`qumap_circuit::Network`]),
//! an initial placement of virtual onto physical qubits, and a device
//! connectivity description ([`RoutingTarget`]); it produces a
//! semantically-equivalent [`MappedDag`] in which every two-qubit gate acts
//! on a physically-connected pair.  Operands that are too far apart are
//! brought together with inserted SWAP gates, chosen by a decay-weighted
//! look-ahead cost; virtual qubits with no initial assignment are placed
//! lazily the first time a two-qubit gate touches them.

mod config;
mod mapped;
mod neighbors;
mod placement;
mod route;
mod target;

pub use config::RouterConfig;
pub use mapped::{MappedDag, MappedOp};
pub use neighbors::{ConstructionError, Neighbors};
pub use route::JitRouter;
pub use target::RoutingTarget;

use qumap_circuit::{Network, PhysicalQubit};
use thiserror::Error;

/// The ways a routing call can fail.
///
/// Nothing is retried internally; every error surfaces to the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    #[error("initial placement has {got} entries, expected {expected}")]
    PlacementLength { got: usize, expected: usize },
    #[error("initial placement references physical qubit {} outside the device", .0.index())]
    PlacementOutOfBounds(PhysicalQubit),
    #[error("initial placement assigns two virtual qubits to physical qubit {}", .0.index())]
    PlacementCollision(PhysicalQubit),
    #[error("decay reset interval cannot be zero")]
    ZeroDecayResetInterval,
    #[error("circuit has {wires} wires but the device only has {qubits} qubits")]
    WidthExceedsDevice { wires: usize, qubits: usize },
    #[error("routing made no progress after {searches} swap searches")]
    NoProgress { searches: usize },
}

/// Route a circuit onto a device with the default configuration, finalising
/// the placement of any virtual qubits left unplaced at the end.
pub fn route<'a, N: Network>(
    target: &'a RoutingTarget,
    original: &N,
    placement: &[Option<PhysicalQubit>],
) -> Result<MappedDag<'a>, RouteError> {
    JitRouter::new(target, RouterConfig::default()).route(original, placement, true)
}
