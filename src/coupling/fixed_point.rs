//! # Mass-Thrust Fixed-Point Resolver
//!
//! Breaks the algebraic loop "total mass → required thrust → component
//! sizing → total mass" by plain fixed-point iteration
//!
//! ```text
//! M_{k+1} = f(M_k),   M_0 = k_os · M_payload
//! ```
//!
//! until `|M_{k+1} - M_k| / M_k < tol`. The sizing map `f` is monotone
//! increasing in the mass, so a run either settles on the smallest fixed
//! point above `M_0` or snowballs. A snowballing run is cut at the mass
//! ceiling and reported as diverged with the iterate capped at the ceiling,
//! which keeps the result finite and monotone in the starting guess.

use serde::{Deserialize, Serialize};

use crate::error::{SizingError, SizingResult};

/// Resolver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Relative change in total mass accepted as converged
    pub tolerance: f64,
    /// Hard iteration cap
    pub max_iterations: usize,
    /// Masses above `divergence_ceiling × payload` count as divergence
    pub divergence_ceiling: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            // tight enough for finite-difference gradients of the total mass
            tolerance: 1e-10,
            max_iterations: 100,
            divergence_ceiling: 1000.0,
        }
    }
}

/// Outcome of a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopStatus {
    #[default]
    Converged,
    /// Ceiling hit, non-finite iterate, or iteration cap reached
    Diverged,
}

/// Result of a fixed-point resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopResolution {
    /// Resolved (or fallback) total mass (kg)
    pub mass: f64,
    pub iterations: usize,
    pub status: LoopStatus,
    /// Relative change of the last step
    pub last_relative_change: f64,
}

impl LoopResolution {
    /// Record for a mass that was imposed rather than iterated
    pub fn fixed(mass: f64) -> Self {
        Self {
            mass,
            iterations: 0,
            status: LoopStatus::Converged,
            last_relative_change: 0.0,
        }
    }

    pub fn converged(&self) -> bool {
        self.status == LoopStatus::Converged
    }

    /// Error form of a diverged resolution
    pub fn to_error(&self) -> Option<SizingError> {
        match self.status {
            LoopStatus::Converged => None,
            LoopStatus::Diverged => Some(SizingError::LoopDivergence {
                iterations: self.iterations,
                last_mass: self.mass,
            }),
        }
    }
}

/// Fixed-point resolver of the mass loop
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopResolver {
    pub config: LoopConfig,
}

impl LoopResolver {
    pub fn new(config: LoopConfig) -> Self {
        Self { config }
    }

    /// Iterates `mass_map` from `initial_mass`.
    ///
    /// Errors from `mass_map` are genuine domain errors and propagate;
    /// runaway masses do not, they come back as `LoopStatus::Diverged`.
    pub fn resolve<F>(
        &self,
        initial_mass: f64,
        payload_mass: f64,
        mut mass_map: F,
    ) -> SizingResult<LoopResolution>
    where
        F: FnMut(f64) -> SizingResult<f64>,
    {
        if !(initial_mass.is_finite() && initial_mass > 0.0) {
            return Err(SizingError::invalid("initial mass", initial_mass));
        }
        let ceiling = self.config.divergence_ceiling * payload_mass;
        let mut mass = initial_mass;
        let mut change = f64::INFINITY;

        for iter in 0..self.config.max_iterations {
            let next = mass_map(mass)?;

            if !next.is_finite() || next > ceiling {
                log::debug!(
                    "mass loop diverged at iteration {} ({:.3} kg -> {:.3e} kg)",
                    iter + 1,
                    mass,
                    next
                );
                return Ok(LoopResolution {
                    mass: ceiling,
                    iterations: iter + 1,
                    status: LoopStatus::Diverged,
                    last_relative_change: change,
                });
            }

            change = (next - mass).abs() / mass;
            if change < self.config.tolerance {
                return Ok(LoopResolution {
                    mass: next,
                    iterations: iter + 1,
                    status: LoopStatus::Converged,
                    last_relative_change: change,
                });
            }
            mass = next;
        }

        log::debug!(
            "mass loop hit the iteration cap ({}) at {:.3} kg, change {:.2e}",
            self.config.max_iterations,
            mass,
            change
        );
        Ok(LoopResolution {
            mass,
            iterations: self.config.max_iterations,
            status: LoopStatus::Diverged,
            last_relative_change: change,
        })
    }
}
