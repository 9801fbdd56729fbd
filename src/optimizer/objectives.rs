//! # Objective Functions
//!
//! Plain total mass, and total mass with an exterior quadratic penalty on
//! violated margins for unconstrained search strategies.

use serde::{Deserialize, Serialize};

use crate::optimizer::constraints::ConstraintVector;
use crate::optimizer::design::DesignPoint;

/// Objective functions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveFunctions {
    /// Weight of Σ min(0, m)² in the penalized objective
    pub penalty_weight: f64,
}

impl Default for ObjectiveFunctions {
    fn default() -> Self {
        Self { penalty_weight: 1e5 }
    }
}

impl ObjectiveFunctions {
    pub fn new(penalty_weight: f64) -> Self {
        Self { penalty_weight }
    }

    /// Total mass (kg) - MINIMIZE
    pub fn mass(design: &DesignPoint) -> f64 {
        design.total_mass
    }

    /// Penalty term alone; exactly zero for a feasible vector
    pub fn penalty(&self, constraints: &ConstraintVector) -> f64 {
        let sq = constraints.violation_sq_sum();
        if sq == 0.0 {
            0.0
        } else {
            self.penalty_weight * sq
        }
    }

    /// Total mass + penalty - MINIMIZE
    pub fn penalized_mass(&self, design: &DesignPoint, constraints: &ConstraintVector) -> f64 {
        Self::mass(design) + self.penalty(constraints)
    }
}
