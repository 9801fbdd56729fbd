//! # Scaling Laws for Multirotor Components
//!
//! Power-law similarity relations `y = y_ref · (x / x_ref)^e` anchored on a
//! reference component per subsystem, plus the closed-form aerodynamic and
//! structural relations used alongside them.
//!
//! | Subsystem | Law                        | Exponent |
//! |-----------|----------------------------|----------|
//! | Propeller | mass vs diameter           | 3        |
//! | Motor     | mass vs nominal torque     | 3/3.5    |
//! | Motor     | max torque vs torque       | 1        |
//! | Motor     | resistance vs torque       | -5/3.5   |
//! | Motor     | friction torque vs torque  | 3/3.5    |
//! | Battery   | energy vs mass             | 1        |
//! | Battery   | max current vs capacity    | 1        |
//! | ESC       | mass vs power              | 1        |
//! | ESC       | voltage vs power           | 1/3      |
//! | Frame     | body mass vs arm mass      | 1        |

use serde::{Deserialize, Serialize};

use crate::constants::PhysicalConstants;
use crate::error::{SizingError, SizingResult};

/// A single similarity relation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingLaw {
    /// Predicted quantity of the reference component
    pub reference_value: f64,
    /// Driving parameter of the reference component
    pub reference_param: f64,
    pub exponent: f64,
}

impl ScalingLaw {
    pub const fn new(reference_value: f64, reference_param: f64, exponent: f64) -> Self {
        Self {
            reference_value,
            reference_param,
            exponent,
        }
    }

    /// Predicts the quantity for `param`. Non-positive or non-finite
    /// inputs are rejected.
    pub fn apply(&self, param: f64) -> SizingResult<f64> {
        if !(param.is_finite() && param > 0.0) {
            return Err(SizingError::invalid("scaling law input", param));
        }
        Ok(self.reference_value * (param / self.reference_param).powf(self.exponent))
    }

    /// Same as [`apply`](Self::apply) with the failing quantity named in the error
    pub fn apply_named(&self, name: &str, param: f64) -> SizingResult<f64> {
        self.apply(param).map_err(|_| SizingError::invalid(name, param))
    }
}

/// Per-subsystem similarity relations built from the reference catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingLawLibrary {
    // ========== PROPELLER ==========
    pub propeller_mass: ScalingLaw,
    /// C_T = a + b·β
    pub thrust_coefficient: (f64, f64),
    /// C_P = a + b·β
    pub power_coefficient: (f64, f64),

    // ========== MOTOR ==========
    pub motor_mass: ScalingLaw,
    pub motor_max_torque: ScalingLaw,
    pub motor_resistance: ScalingLaw,
    /// Resistance correction for the winding's torque constant
    pub motor_resistance_kt: ScalingLaw,
    pub motor_friction: ScalingLaw,

    // ========== BATTERY ==========
    pub battery_energy: ScalingLaw,
    pub battery_max_current: ScalingLaw,

    // ========== ESC ==========
    pub esc_mass: ScalingLaw,
    pub esc_voltage: ScalingLaw,

    // ========== FRAME ==========
    pub frame_mass: ScalingLaw,
}

impl ScalingLawLibrary {
    pub fn from_constants(c: &PhysicalConstants) -> Self {
        let m = &c.motor;
        Self {
            propeller_mass: ScalingLaw::new(c.propeller.mass, c.propeller.diameter, 3.0),
            thrust_coefficient: c.propeller.ct_coefficients,
            power_coefficient: c.propeller.cp_coefficients,

            motor_mass: ScalingLaw::new(m.mass, m.nominal_torque, 3.0 / 3.5),
            motor_max_torque: ScalingLaw::new(m.max_torque, m.nominal_torque, 1.0),
            motor_resistance: ScalingLaw::new(m.resistance, m.nominal_torque, -5.0 / 3.5),
            motor_resistance_kt: ScalingLaw::new(1.0, m.torque_constant, 2.0),
            motor_friction: ScalingLaw::new(m.friction_torque, m.nominal_torque, 3.0 / 3.5),

            battery_energy: ScalingLaw::new(c.battery.energy, c.battery.mass, 1.0),
            battery_max_current: ScalingLaw::new(c.battery.max_current, c.battery.capacity, 1.0),

            esc_mass: ScalingLaw::new(c.esc.mass, c.esc.power, 1.0),
            esc_voltage: ScalingLaw::new(c.esc.voltage, c.esc.power, 1.0 / 3.0),

            frame_mass: ScalingLaw::new(c.frame.body_mass, c.frame.arm_mass, 1.0),
        }
    }

    /// Static thrust coefficient for pitch ratio β
    pub fn ct(&self, beta: f64) -> SizingResult<f64> {
        positive("C_T", self.thrust_coefficient.0 + self.thrust_coefficient.1 * beta)
    }

    /// Static power coefficient for pitch ratio β
    pub fn cp(&self, beta: f64) -> SizingResult<f64> {
        positive("C_P", self.power_coefficient.0 + self.power_coefficient.1 * beta)
    }

    /// Winding resistance for a nominal torque and torque constant
    pub fn resistance(&self, torque: f64, kt: f64) -> SizingResult<f64> {
        Ok(self.motor_resistance.apply_named("motor torque", torque)?
            * self.motor_resistance_kt.apply_named("torque constant", kt)?)
    }
}

impl Default for ScalingLawLibrary {
    fn default() -> Self {
        Self::from_constants(&PhysicalConstants::default())
    }
}

// ========== CLOSED-FORM RELATIONS ==========

/// Battery voltage estimate from take-off mechanical power (V),
/// statistical fit `1.84 · P^0.36` scaled by `k_vb`
pub fn battery_voltage_estimate(k_vb: f64, takeoff_power: f64) -> SizingResult<f64> {
    if !(takeoff_power.is_finite() && takeoff_power > 0.0) {
        return Err(SizingError::invalid("take-off power", takeoff_power));
    }
    Ok(k_vb * 1.84 * takeoff_power.powf(0.36))
}

/// Outer diameter of a hollow circular arm sized in bending (m)
///
/// `D_out = (32·F·L / (π·σ·(1 - k_D⁴)))^(1/3)` with `F` the tip force.
pub fn hollow_beam_diameter(force: f64, length: f64, stress: f64, k_d: f64) -> SizingResult<f64> {
    let shape = 1.0 - k_d.powi(4);
    if !(shape > 0.0) {
        return Err(SizingError::invalid("k_D", k_d));
    }
    positive(
        "arm diameter",
        (force * length * 32.0 / (std::f64::consts::PI * stress * shape)).cbrt(),
    )
}

/// Bending stress at the root of a hollow circular arm (Pa)
pub fn hollow_beam_stress(force: f64, length: f64, outer_diameter: f64, k_d: f64) -> f64 {
    32.0 * force * length / (std::f64::consts::PI * outer_diameter.powi(3) * (1.0 - k_d.powi(4)))
}

fn positive(name: &str, value: f64) -> SizingResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SizingError::invalid(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_point_identity() {
        let lib = ScalingLawLibrary::default();
        let c = PhysicalConstants::default();
        let m = lib.motor_mass.apply(c.motor.nominal_torque).unwrap();
        assert!((m - c.motor.mass).abs() < 1e-12);
        let p = lib.propeller_mass.apply(c.propeller.diameter).unwrap();
        assert!((p - c.propeller.mass).abs() < 1e-12);
    }

    #[test]
    fn test_propeller_mass_cubic() {
        let lib = ScalingLawLibrary::default();
        let d = lib.propeller_mass.reference_param;
        let m1 = lib.propeller_mass.apply(d).unwrap();
        let m2 = lib.propeller_mass.apply(2.0 * d).unwrap();
        assert!((m2 / m1 - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_non_positive() {
        let law = ScalingLaw::new(1.0, 1.0, 2.0);
        assert!(matches!(law.apply(0.0), Err(SizingError::InvalidParameter { .. })));
        assert!(law.apply(-3.0).is_err());
        assert!(law.apply(f64::NAN).is_err());
        assert!(law.apply(f64::INFINITY).is_err());
    }

    #[test]
    fn test_monotonic_laws() {
        let lib = ScalingLawLibrary::default();
        for law in [lib.motor_mass, lib.esc_voltage, lib.battery_energy, lib.frame_mass] {
            let a = law.apply(0.5 * law.reference_param).unwrap();
            let b = law.apply(1.5 * law.reference_param).unwrap();
            assert!(b > a);
        }
        let a = lib.motor_resistance.apply(1.0).unwrap();
        let b = lib.motor_resistance.apply(2.0).unwrap();
        assert!(b < a);
    }

    #[test]
    fn test_propeller_coefficients() {
        let lib = ScalingLawLibrary::default();
        let ct = lib.ct(0.3).unwrap();
        let cp = lib.cp(0.3).unwrap();
        assert!((ct - (4.27e-2 + 1.44e-1 * 0.3)).abs() < 1e-15);
        assert!(cp > 0.0 && cp < ct);
        // negative power coefficient below β ≈ 0.015
        assert!(lib.cp(0.0).is_err());
    }

    #[test]
    fn test_beam_sizing_consistent() {
        let (f, l, s, kd) = (500.0, 0.4, 70e6, 0.9);
        let d = hollow_beam_diameter(f, l, s, kd).unwrap();
        let sigma = hollow_beam_stress(f, l, d, kd);
        assert!((sigma - s).abs() / s < 1e-12);
        assert!(hollow_beam_diameter(f, l, s, 1.0).is_err());
    }

    #[test]
    fn test_voltage_estimate() {
        let v = battery_voltage_estimate(1.0, 1000.0).unwrap();
        assert!((v - 1.84 * 1000f64.powf(0.36)).abs() < 1e-12);
        assert!(battery_voltage_estimate(1.0, 0.0).is_err());
    }
}
