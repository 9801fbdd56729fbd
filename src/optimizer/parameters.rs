//! # Design Coefficients and Bounds
//!
//! The 8 dimensionless coefficients the optimizer searches over, their
//! bounds table, and the unit-cube mapping shared by both strategies.

use serde::{Deserialize, Serialize};

use crate::error::{SizingError, SizingResult};

/// Number of design coefficients
pub const N_COEFFICIENTS: usize = 8;

/// Mapping between a coefficient and the unit interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Linear,
    /// Uniform in log(value); used for ranges spanning decades
    Log,
}

/// Definition of an optimizable coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Descriptive name
    pub name: String,
    /// Mathematical symbol
    pub symbol: String,
    /// Minimum allowed value
    pub min: f64,
    /// Maximum allowed value
    pub max: f64,
    /// Default value
    pub default: f64,
    /// Unit-cube mapping
    pub scale: Scale,
    /// Description
    pub description: String,
}

impl ParameterDef {
    /// Creates a coefficient. Ranges spanning more than a decade get a log scale.
    pub fn new(name: &str, symbol: &str, min: f64, max: f64, default: f64) -> Self {
        let scale = if min > 0.0 && max / min > 10.0 {
            Scale::Log
        } else {
            Scale::Linear
        };
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            min,
            max,
            default,
            scale,
            description: String::new(),
        }
    }

    /// Adds a description
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// Overrides the bounds, recomputing the scale
    pub fn with_bounds(self, min: f64, max: f64) -> Self {
        let default = self.default.max(min).min(max);
        let mut def = ParameterDef::new(&self.name, &self.symbol, min, max, default);
        def.description = self.description;
        def
    }

    /// Checks the value lies in range
    pub fn validate(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamps a value to the valid range. NaN maps to the lower bound.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.max(self.min).min(self.max)
    }

    /// Normalizes a value to [0, 1]
    pub fn normalize(&self, value: f64) -> f64 {
        if self.max == self.min {
            return 0.5;
        }
        let v = self.clamp(value);
        match self.scale {
            Scale::Linear => (v - self.min) / (self.max - self.min),
            Scale::Log => (v.ln() - self.min.ln()) / (self.max.ln() - self.min.ln()),
        }
    }

    /// Denormalizes from [0, 1] to the real range
    pub fn denormalize(&self, normalized: f64) -> f64 {
        let u = normalized.clamp(0.0, 1.0);
        let value = match self.scale {
            Scale::Linear => self.min + u * (self.max - self.min),
            Scale::Log => (self.min.ln() + u * (self.max.ln() - self.min.ln())).exp(),
        };
        self.clamp(value)
    }
}

/// What to do with a coefficient vector outside its bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// Clamp to the nearest bound before evaluation
    #[default]
    Clamp,
    /// Refuse with `BoundViolation`
    Reject,
}

/// Ordered 8-tuple of design coefficients
///
/// `[β_pro, k_os, k_ND, k_mot, k_speed_mot, k_mb, k_vb, k_D]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesignCoefficients(pub [f64; N_COEFFICIENTS]);

impl DesignCoefficients {
    pub fn new(values: [f64; N_COEFFICIENTS]) -> Self {
        Self(values)
    }

    /// Builds from a slice of exactly 8 values
    pub fn from_slice(values: &[f64]) -> SizingResult<Self> {
        let arr: [f64; N_COEFFICIENTS] = values.try_into().map_err(|_| {
            SizingError::Config(format!(
                "expected {} coefficients, got {}",
                N_COEFFICIENTS,
                values.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Propeller pitch/diameter ratio β
    pub fn beta(&self) -> f64 {
        self.0[0]
    }

    /// Oversizing coefficient on the sizing mass
    pub fn k_os(&self) -> f64 {
        self.0[1]
    }

    /// Undersizing coefficient on the propeller ND limit
    pub fn k_nd(&self) -> f64 {
        self.0[2]
    }

    /// Oversizing coefficient on motor nominal torque
    pub fn k_mot(&self) -> f64 {
        self.0[3]
    }

    /// Oversizing coefficient on motor speed (winding adaptation)
    pub fn k_speed_mot(&self) -> f64 {
        self.0[4]
    }

    /// Battery to payload mass ratio
    pub fn k_mb(&self) -> f64 {
        self.0[5]
    }

    /// Oversizing coefficient on battery voltage
    pub fn k_vb(&self) -> f64 {
        self.0[6]
    }

    /// Inner/outer diameter ratio of the arm tube
    pub fn k_d(&self) -> f64 {
        self.0[7]
    }

    /// Copy with one coefficient replaced
    pub fn with(mut self, index: usize, value: f64) -> Self {
        self.0[index] = value;
        self
    }
}

impl From<[f64; N_COEFFICIENTS]> for DesignCoefficients {
    fn from(values: [f64; N_COEFFICIENTS]) -> Self {
        Self(values)
    }
}

/// Bounds table of the design coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientSpace {
    pub parameters: Vec<ParameterDef>,
}

impl Default for CoefficientSpace {
    fn default() -> Self {
        Self::multirotor()
    }
}

impl CoefficientSpace {
    /// Standard multirotor bounds
    pub fn multirotor() -> Self {
        Self {
            parameters: vec![
                ParameterDef::new("Propeller pitch ratio", "β_pro", 0.3, 0.6, 0.33)
                    .with_description("Pitch/diameter ratio of the propeller"),
                ParameterDef::new("Load oversizing", "k_os", 1.0, 400.0, 3.2)
                    .with_description("Floor on the sizing mass as a multiple of payload"),
                ParameterDef::new("ND undersizing", "k_ND", 1.0, 100.0, 1.2)
                    .with_description("Take-off speed margin below the ND limit"),
                ParameterDef::new("Motor torque oversizing", "k_mot", 1.0, 100.0, 1.0)
                    .with_description("Nominal motor torque over hover torque"),
                ParameterDef::new("Motor speed oversizing", "k_speed_mot", 1.0, 400.0, 1.2)
                    .with_description("Back-EMF speed margin of the winding"),
                ParameterDef::new("Battery mass ratio", "k_mb", 0.1, 100.0, 1.0)
                    .with_description("Battery mass over payload mass"),
                ParameterDef::new("Battery voltage oversizing", "k_vb", 1.0, 5.0, 1.0)
                    .with_description("Bus voltage over the power-based estimate"),
                ParameterDef::new("Arm diameter ratio", "k_D", 0.1, 0.99, 0.1)
                    .with_description("Inner/outer diameter of the arm tube"),
            ],
        }
    }

    /// Number of dimensions
    pub fn n_dimensions(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameter(&self, index: usize) -> &ParameterDef {
        &self.parameters[index]
    }

    /// Index of a coefficient by symbol (ASCII `beta_pro` accepted for `β_pro`)
    pub fn index_of(&self, symbol: &str) -> SizingResult<usize> {
        let symbol = match symbol {
            "beta" | "beta_pro" => "β_pro",
            s => s,
        };
        self.parameters
            .iter()
            .position(|p| p.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| SizingError::Config(format!("unknown coefficient '{}'", symbol)))
    }

    /// Replaces the bounds of a coefficient
    pub fn set_bounds(&mut self, index: usize, min: f64, max: f64) -> SizingResult<()> {
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 || max < min {
            return Err(SizingError::Config(format!(
                "invalid bounds [{}, {}] for {}",
                min, max, self.parameters[index].symbol
            )));
        }
        let def = self.parameters[index].clone();
        self.parameters[index] = def.with_bounds(min, max);
        Ok(())
    }

    /// Default vector
    pub fn defaults(&self) -> DesignCoefficients {
        let mut values = [0.0; N_COEFFICIENTS];
        for (v, p) in values.iter_mut().zip(&self.parameters) {
            *v = p.default;
        }
        DesignCoefficients(values)
    }

    /// Clamps every coefficient; returns the clamped vector and whether anything moved
    pub fn clamp(&self, c: &DesignCoefficients) -> (DesignCoefficients, bool) {
        let mut out = *c;
        let mut moved = false;
        for (v, p) in out.0.iter_mut().zip(&self.parameters) {
            let clamped = p.clamp(*v);
            if clamped != *v {
                moved = true;
            }
            *v = clamped;
        }
        (out, moved)
    }

    /// First out-of-bounds coefficient as a `BoundViolation`
    pub fn validate(&self, c: &DesignCoefficients) -> SizingResult<()> {
        for (v, p) in c.0.iter().zip(&self.parameters) {
            if !p.validate(*v) {
                return Err(SizingError::BoundViolation {
                    name: p.symbol.clone(),
                    value: *v,
                    min: p.min,
                    max: p.max,
                });
            }
        }
        Ok(())
    }

    /// Applies a bounds policy
    pub fn enforce(
        &self,
        c: &DesignCoefficients,
        policy: BoundsPolicy,
    ) -> SizingResult<DesignCoefficients> {
        match policy {
            BoundsPolicy::Reject => {
                self.validate(c)?;
                Ok(*c)
            }
            BoundsPolicy::Clamp => {
                let (clamped, moved) = self.clamp(c);
                if moved {
                    log::debug!("clamped coefficients {:?} -> {:?}", c.0, clamped.0);
                }
                Ok(clamped)
            }
        }
    }

    /// Coefficients → unit cube
    pub fn normalize(&self, c: &DesignCoefficients) -> Vec<f64> {
        c.0.iter()
            .zip(&self.parameters)
            .map(|(v, p)| p.normalize(*v))
            .collect()
    }

    /// Unit cube → coefficients
    pub fn denormalize(&self, u: &[f64]) -> DesignCoefficients {
        let mut values = [0.0; N_COEFFICIENTS];
        for ((v, ui), p) in values.iter_mut().zip(u).zip(&self.parameters) {
            *v = p.denormalize(*ui);
        }
        DesignCoefficients(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_validation() {
        let param = ParameterDef::new("Test", "t", 1.0, 5.0, 2.0);
        assert!(param.validate(1.0));
        assert!(param.validate(5.0));
        assert!(!param.validate(0.5));
        assert!(!param.validate(5.1));
        assert_eq!(param.scale, Scale::Linear);
    }

    #[test]
    fn test_log_normalization() {
        let param = ParameterDef::new("Test", "t", 1.0, 100.0, 10.0);
        assert_eq!(param.scale, Scale::Log);
        assert!((param.normalize(10.0) - 0.5).abs() < 1e-12);
        assert!((param.denormalize(0.5) - 10.0).abs() < 1e-9);
        assert!((param.denormalize(1.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_normalization() {
        let param = ParameterDef::new("Test", "t", 0.3, 0.6, 0.33);
        assert!((param.normalize(0.45) - 0.5).abs() < 1e-12);
        assert!((param.denormalize(param.normalize(0.33)) - 0.33).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_below_bound() {
        let space = CoefficientSpace::multirotor();
        let c = DesignCoefficients::new([0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.01]);
        let (clamped, moved) = space.clamp(&c);
        assert!(moved);
        assert_eq!(clamped.k_d(), 0.1);
        assert_eq!(clamped.beta(), 0.33);
    }

    #[test]
    fn test_reject_policy() {
        let space = CoefficientSpace::multirotor();
        let c = DesignCoefficients::new([0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.01]);
        match space.enforce(&c, BoundsPolicy::Reject) {
            Err(SizingError::BoundViolation { name, min, .. }) => {
                assert_eq!(name, "k_D");
                assert_eq!(min, 0.1);
            }
            other => panic!("expected BoundViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_scales_of_standard_space() {
        let space = CoefficientSpace::multirotor();
        let scales: Vec<Scale> = space.parameters.iter().map(|p| p.scale).collect();
        assert_eq!(
            scales,
            vec![
                Scale::Linear,
                Scale::Log,
                Scale::Log,
                Scale::Log,
                Scale::Log,
                Scale::Log,
                Scale::Linear,
                Scale::Linear,
            ]
        );
    }

    #[test]
    fn test_set_bounds() {
        let mut space = CoefficientSpace::multirotor();
        space.set_bounds(1, 1.0, 5.0).unwrap();
        assert_eq!(space.parameter(1).scale, Scale::Linear);
        assert!(space.set_bounds(1, 5.0, 1.0).is_err());
    }

    #[test]
    fn test_from_slice() {
        assert!(DesignCoefficients::from_slice(&[1.0; 7]).is_err());
        let c = DesignCoefficients::from_slice(&[1.0; 8]).unwrap();
        assert_eq!(c.k_vb(), 1.0);
    }
}
