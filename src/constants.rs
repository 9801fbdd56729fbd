//! # Physical Constants
//!
//! Environment constants and the reference component catalog used by the
//! scaling laws. All values in SI units unless stated otherwise.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Gravitational acceleration (m/s²)
pub const GRAVITY: f64 = 9.81;

/// Air density at sea level, 15 °C (kg/m³)
pub const RHO_AIR: f64 = 1.18;

/// Inch to meter
pub const INCH: f64 = 0.0254;

/// Ounce to kilogram
pub const OUNCE: f64 = 0.0283;

// ============================================================================
// TECHNOLOGY LIMITS
// ============================================================================

/// Maximum rotational speed × diameter product of APC MR propellers (Hz·m).
/// 105 000 RPM·inch converted.
pub const ND_MAX: f64 = 105_000.0 / 60.0 * INCH;

/// Nominal LiPo cell voltage (V)
pub const CELL_VOLTAGE: f64 = 3.7;

/// ESC efficiency
pub const ESC_EFFICIENCY: f64 = 0.95;

/// Two pi, for Hz → rad/s
pub const TWO_PI: f64 = 2.0 * PI;

// ============================================================================
// REFERENCE COMPONENTS
// ============================================================================

/// Reference propeller (APC MR 11x4.5)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropellerReference {
    /// Diameter (m)
    pub diameter: f64,
    /// Mass (kg)
    pub mass: f64,
    /// Thrust coefficient C_T = a + b·β
    pub ct_coefficients: (f64, f64),
    /// Power coefficient C_P = a + b·β
    pub cp_coefficients: (f64, f64),
}

/// Reference brushless motor (AXI 5325/16)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorReference {
    /// Nominal torque (N·m)
    pub nominal_torque: f64,
    /// Maximum torque (N·m)
    pub max_torque: f64,
    /// Winding resistance (Ω)
    pub resistance: f64,
    /// Mass (kg)
    pub mass: f64,
    /// Torque constant (N·m/A)
    pub torque_constant: f64,
    /// Friction torque (N·m)
    pub friction_torque: f64,
}

/// Reference LiPo battery pack
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryReference {
    /// Mass (kg)
    pub mass: f64,
    /// Stored energy (J)
    pub energy: f64,
    /// Capacity (A·s)
    pub capacity: f64,
    /// Maximum discharge current (A)
    pub max_current: f64,
    /// Usable depth of discharge
    pub depth_of_discharge: f64,
}

/// Reference electronic speed controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscReference {
    /// Corner power (W)
    pub power: f64,
    /// Voltage rating (V)
    pub voltage: f64,
    /// Mass (kg)
    pub mass: f64,
}

/// Reference frame: composite tube arms and central body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameReference {
    /// Body mass (kg)
    pub body_mass: f64,
    /// Arm mass matching the body reference (kg)
    pub arm_mass: f64,
    /// Tensile strength of the arm material (Pa)
    pub max_stress: f64,
    /// Safety reduction applied to `max_stress` for sizing
    pub stress_reduction: f64,
    /// Arm material density (kg/m³)
    pub density: f64,
}

impl FrameReference {
    /// Allowable design stress (Pa)
    pub fn design_stress(&self) -> f64 {
        self.max_stress / self.stress_reduction
    }
}

/// Environment constants and component references, read-only during a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// Gravitational acceleration (m/s²)
    pub gravity: f64,
    /// Air density (kg/m³)
    pub air_density: f64,
    /// Propeller ND limit (Hz·m)
    pub nd_max: f64,
    /// Nominal cell voltage (V)
    pub cell_voltage: f64,
    /// ESC efficiency
    pub esc_efficiency: f64,
    pub propeller: PropellerReference,
    pub motor: MotorReference,
    pub battery: BatteryReference,
    pub esc: EscReference,
    pub frame: FrameReference,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        let battery_mass = 0.329;
        Self {
            gravity: GRAVITY,
            air_density: RHO_AIR,
            nd_max: ND_MAX,
            cell_voltage: CELL_VOLTAGE,
            esc_efficiency: ESC_EFFICIENCY,
            propeller: PropellerReference {
                diameter: 11.0 * INCH,
                mass: 0.53 * OUNCE,
                ct_coefficients: (4.27e-2, 1.44e-1),
                cp_coefficients: (-1.48e-3, 9.72e-2),
            },
            motor: MotorReference {
                nominal_torque: 2.32,
                max_torque: 85.0 / 70.0 * 2.32,
                resistance: 0.03,
                mass: 0.575,
                torque_constant: 0.03,
                friction_torque: 0.03,
            },
            battery: BatteryReference {
                mass: battery_mass,
                // 220 Wh/kg
                energy: 220.0 * 3600.0 * battery_mass,
                // 5000 mAh
                capacity: 5.0 * 3600.0,
                max_current: 50.0,
                depth_of_discharge: 0.8,
            },
            esc: EscReference {
                power: 3108.0,
                voltage: 44.4,
                mass: 0.115,
            },
            frame: FrameReference {
                body_mass: 0.14,
                arm_mass: 0.14,
                max_stress: 280e6,
                stress_reduction: 4.0,
                density: 1700.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nd_max() {
        // 105 000 RPM·inch ≈ 44.45 Hz·m
        assert!((ND_MAX - 44.45).abs() < 1e-9);
    }

    #[test]
    fn test_reference_consistency() {
        let c = PhysicalConstants::default();
        assert!(c.motor.max_torque > c.motor.nominal_torque);
        assert!((c.frame.design_stress() - 70e6).abs() < 1.0);
        // 220 Wh/kg
        assert!((c.battery.energy / c.battery.mass / 3600.0 - 220.0).abs() < 1e-9);
    }

    #[test]
    fn test_serde_roundtrip() {
        let c = PhysicalConstants::default();
        let json = serde_json::to_string(&c).unwrap();
        let back: PhysicalConstants = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
