//! # Mission Requirements
//!
//! Payload, autonomy, take-off acceleration and airframe architecture.

use serde::{Deserialize, Serialize};

use crate::constants::GRAVITY;
use crate::error::{SizingError, SizingResult};

/// Arm and propeller layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Architecture {
    /// Number of arms
    pub arms: u32,
    /// Propellers per arm (2 for coaxial)
    pub propellers_per_arm: u32,
}

impl Architecture {
    /// Total propeller count
    pub fn propellers(&self) -> u32 {
        self.arms * self.propellers_per_arm
    }

    /// Angular separation between arms (rad)
    pub fn arm_separation(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.arms as f64
    }
}

impl Default for Architecture {
    fn default() -> Self {
        Self {
            arms: 4,
            propellers_per_arm: 2,
        }
    }
}

/// Mission specification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionSpec {
    /// Payload mass (kg)
    pub payload_mass: f64,
    /// Hover autonomy (min)
    pub autonomy_min: f64,
    /// Take-off acceleration (m/s²)
    pub takeoff_acceleration: f64,
    /// Maximum take-off weight (kg)
    pub mtow: f64,
    pub architecture: Architecture,
}

impl Default for MissionSpec {
    /// Heavy-lift reference mission: 100 kg for 25 min
    fn default() -> Self {
        Self {
            payload_mass: 100.0,
            autonomy_min: 25.0,
            takeoff_acceleration: 0.25 * GRAVITY,
            mtow: 360.0,
            architecture: Architecture::default(),
        }
    }
}

impl MissionSpec {
    /// Hover autonomy (s)
    pub fn autonomy_s(&self) -> f64 {
        self.autonomy_min * 60.0
    }

    /// Rejects physically meaningless missions
    pub fn validate(&self) -> SizingResult<()> {
        let positive = [
            ("payload_mass", self.payload_mass),
            ("autonomy_min", self.autonomy_min),
            ("mtow", self.mtow),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SizingError::invalid(name, value));
            }
        }
        if !(self.takeoff_acceleration.is_finite() && self.takeoff_acceleration >= 0.0) {
            return Err(SizingError::invalid("takeoff_acceleration", self.takeoff_acceleration));
        }
        if self.mtow <= self.payload_mass {
            return Err(SizingError::invalid("mtow", self.mtow));
        }
        // one arm gives no separation angle for the arm length
        if self.architecture.arms < 2 {
            return Err(SizingError::invalid("arms", self.architecture.arms as f64));
        }
        if self.architecture.propellers_per_arm == 0 {
            return Err(SizingError::invalid("propellers_per_arm", 0.0));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mission() {
        let m = MissionSpec::default();
        assert!(m.validate().is_ok());
        assert_eq!(m.architecture.propellers(), 8);
        assert_eq!(m.autonomy_s(), 1500.0);
        assert!((m.architecture.arm_separation() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_missions() {
        let mut m = MissionSpec::default();
        m.payload_mass = 0.0;
        assert!(matches!(m.validate(), Err(SizingError::InvalidParameter { .. })));

        let mut m = MissionSpec::default();
        m.mtow = 50.0;
        assert!(m.validate().is_err());

        let mut m = MissionSpec::default();
        m.architecture.arms = 1;
        assert!(m.validate().is_err());

        let mut m = MissionSpec::default();
        m.takeoff_acceleration = 0.0;
        assert!(m.validate().is_ok());
    }
}
