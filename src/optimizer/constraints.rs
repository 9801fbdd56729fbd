//! # Sizing Constraints
//!
//! Normalized signed margins of a design point. A margin `≥ 0` means the
//! limit is respected; the magnitude is the relative distance to it.

use serde::{Deserialize, Serialize};

use crate::constants::PhysicalConstants;
use crate::optimizer::design::DesignPoint;
use crate::optimizer::mission::MissionSpec;

/// Constraint identifiers, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Motor max torque covers take-off torque
    MotorTorque,
    /// Bus voltage covers motor take-off voltage
    MotorVoltage,
    /// Propeller ND product under the technology limit
    PropellerTipSpeed,
    /// Arm stress at max motor thrust under material strength
    FrameStress,
    /// Usable battery energy covers the hover autonomy
    BatteryEnergy,
    /// ESC voltage rating covers the bus voltage
    EscVoltage,
    /// Battery max discharge power covers take-off
    BatteryCurrent,
    /// Total mass under MTOW
    MassBudget,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 8] = [
        ConstraintKind::MotorTorque,
        ConstraintKind::MotorVoltage,
        ConstraintKind::PropellerTipSpeed,
        ConstraintKind::FrameStress,
        ConstraintKind::BatteryEnergy,
        ConstraintKind::EscVoltage,
        ConstraintKind::BatteryCurrent,
        ConstraintKind::MassBudget,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ConstraintKind::MotorTorque => "motor torque",
            ConstraintKind::MotorVoltage => "motor voltage",
            ConstraintKind::PropellerTipSpeed => "propeller tip speed",
            ConstraintKind::FrameStress => "frame stress",
            ConstraintKind::BatteryEnergy => "battery energy",
            ConstraintKind::EscVoltage => "ESC voltage",
            ConstraintKind::BatteryCurrent => "battery current",
            ConstraintKind::MassBudget => "mass budget",
        }
    }
}

/// Ordered signed margins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintVector {
    pub margins: Vec<(ConstraintKind, f64)>,
}

impl ConstraintVector {
    pub fn values(&self) -> Vec<f64> {
        self.margins.iter().map(|(_, m)| *m).collect()
    }

    pub fn get(&self, kind: ConstraintKind) -> Option<f64> {
        self.margins.iter().find(|(k, _)| *k == kind).map(|(_, m)| *m)
    }

    pub fn len(&self) -> usize {
        self.margins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.margins.is_empty()
    }

    /// Smallest margin (most violated or closest constraint)
    pub fn min_margin(&self) -> f64 {
        self.margins.iter().map(|(_, m)| *m).fold(f64::INFINITY, f64::min)
    }

    /// Largest violation, `0` when feasible
    pub fn max_violation(&self) -> f64 {
        (-self.min_margin()).max(0.0)
    }

    /// All margins above `-tolerance`
    pub fn is_feasible(&self, tolerance: f64) -> bool {
        self.margins.iter().all(|(_, m)| *m >= -tolerance)
    }

    /// Σ min(0, m)²
    pub fn violation_sq_sum(&self) -> f64 {
        self.margins.iter().map(|(_, m)| m.min(0.0).powi(2)).sum()
    }
}

/// Violated constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ConstraintKind,
    pub margin: f64,
}

/// Constraint close to its limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: ConstraintKind,
    pub margin: f64,
}

/// Constraint evaluation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintResult {
    /// Is the design feasible?
    pub feasible: bool,
    pub violations: Vec<Violation>,
    /// Satisfied, but within the warning band
    pub warnings: Vec<Warning>,
    pub vector: ConstraintVector,
}

/// Constraint evaluator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintEvaluator {
    /// Margin below which a satisfied constraint is reported as a warning
    pub warning_margin: f64,
}

impl Default for ConstraintEvaluator {
    fn default() -> Self {
        Self { warning_margin: 0.05 }
    }
}

impl ConstraintEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signed margins, all computed, in [`ConstraintKind::ALL`] order
    pub fn margins(
        &self,
        design: &DesignPoint,
        mission: &MissionSpec,
        constants: &PhysicalConstants,
    ) -> ConstraintVector {
        let n_pro = mission.architecture.propellers() as f64;
        let eta = constants.esc_efficiency;
        let prop = &design.propeller;
        let motor = &design.motor;
        let bat = &design.battery;

        let usable_energy = constants.battery.depth_of_discharge * bat.energy;
        let hover_energy = mission.autonomy_s() * motor.power_hover() * n_pro / eta;
        let discharge_power = bat.voltage * bat.max_current;
        let takeoff_power = motor.power_takeoff() * n_pro / eta;
        let strength = constants.frame.max_stress;

        let margins = ConstraintKind::ALL
            .iter()
            .map(|&kind| {
                let m = match kind {
                    ConstraintKind::MotorTorque => {
                        (motor.max_torque - prop.torque_takeoff) / motor.max_torque
                    }
                    ConstraintKind::MotorVoltage => {
                        (bat.voltage - motor.voltage_takeoff) / bat.voltage
                    }
                    ConstraintKind::PropellerTipSpeed => {
                        (constants.nd_max - prop.nd_takeoff()) / constants.nd_max
                    }
                    ConstraintKind::FrameStress => {
                        (strength - design.frame.max_load_stress) / strength
                    }
                    ConstraintKind::BatteryEnergy => (usable_energy - hover_energy) / usable_energy,
                    ConstraintKind::EscVoltage => {
                        (design.esc.voltage - bat.voltage) / design.esc.voltage
                    }
                    ConstraintKind::BatteryCurrent => {
                        (discharge_power - takeoff_power) / discharge_power
                    }
                    ConstraintKind::MassBudget => {
                        (mission.mtow - design.total_mass) / design.total_mass
                    }
                };
                (kind, m)
            })
            .collect();

        ConstraintVector { margins }
    }

    /// Evaluates all constraints for a design
    pub fn evaluate(
        &self,
        design: &DesignPoint,
        mission: &MissionSpec,
        constants: &PhysicalConstants,
    ) -> ConstraintResult {
        let vector = self.margins(design, mission, constants);
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        for &(kind, margin) in &vector.margins {
            if margin < 0.0 {
                violations.push(Violation { kind, margin });
            } else if margin < self.warning_margin {
                warnings.push(Warning { kind, margin });
            }
        }

        ConstraintResult {
            feasible: violations.is_empty(),
            violations,
            warnings,
            vector,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: [f64; 8]) -> ConstraintVector {
        ConstraintVector {
            margins: ConstraintKind::ALL.iter().copied().zip(values).collect(),
        }
    }

    #[test]
    fn test_vector_metrics() {
        let v = vector([0.1, -0.2, 0.3, 0.0, 0.5, 0.6, 0.7, -0.1]);
        assert_eq!(v.min_margin(), -0.2);
        assert_eq!(v.max_violation(), 0.2);
        assert!(!v.is_feasible(1e-3));
        assert!((v.violation_sq_sum() - 0.05).abs() < 1e-15);
        assert_eq!(v.get(ConstraintKind::MassBudget), Some(-0.1));
        assert_eq!(v.len(), 8);
    }

    #[test]
    fn test_feasible_vector() {
        let v = vector([0.1, 0.2, 0.3, 0.0, 0.5, 0.6, 0.7, 0.01]);
        assert!(v.is_feasible(0.0));
        assert_eq!(v.max_violation(), 0.0);
        assert_eq!(v.violation_sq_sum(), 0.0);
    }

    #[test]
    fn test_labels_unique() {
        let mut labels: Vec<_> = ConstraintKind::ALL.iter().map(|k| k.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), ConstraintKind::ALL.len());
    }
}
