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

use crate::RouteError;

/// Tunable parameters of the router's heuristic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouterConfig {
    /// Upper bound on the extended-layer size.  0 disables look-ahead.
    pub e_set_size: usize,
    /// Multiplier on the normalised extended-layer cost.
    pub e_weight: f64,
    /// Increment applied to the decay of both qubits of an applied SWAP.
    pub decay_delta: f64,
    /// Number of SWAP searches between global decay resets.  Must be at
    /// least 1.
    pub num_rounds_decay_reset: u32,
    /// Consumed by initial-placement selection upstream; the router itself
    /// never reads it.
    pub randomize_initial_map: bool,
    /// When false the extended layer is never built and the cost reduces to
    /// the raw sum over the front layer.
    pub use_look_ahead: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            e_set_size: 20,
            e_weight: 0.5,
            decay_delta: 0.001,
            num_rounds_decay_reset: 5,
            randomize_initial_map: false,
            use_look_ahead: true,
        }
    }
}

impl RouterConfig {
    pub(crate) fn validate(&self) -> Result<(), RouteError> {
        if self.num_rounds_decay_reset == 0 {
            return Err(RouteError::ZeroDecayResetInterval);
        }
        Ok(())
    }
}
