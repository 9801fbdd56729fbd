//! # Run Configuration
//!
//! TOML description of one sizing run: mission, starting coefficients,
//! bound overrides, model settings and driver budgets.
//!
//! ```toml
//! strategy = "stochastic"
//! initial = [0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.01]
//!
//! [mission]
//! payload_mass = 100.0
//! autonomy_min = 25.0
//!
//! [[bounds]]
//! symbol = "k_os"
//! min = 1.0
//! max = 10.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coupling::LoopConfig;
use crate::error::{SizingError, SizingResult};
use crate::optimizer::driver::DriverConfig;
use crate::optimizer::mission::MissionSpec;
use crate::optimizer::model::SizingModel;
use crate::optimizer::parameters::{BoundsPolicy, CoefficientSpace, DesignCoefficients};
use crate::repository::BuiltinRepository;

/// Bounds override for one coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundOverride {
    /// Coefficient symbol, e.g. `k_os`
    pub symbol: String,
    pub min: f64,
    pub max: f64,
}

/// One sizing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Builtin preset whose mission replaces `mission`
    pub model: Option<String>,
    pub mission: MissionSpec,
    /// Starting coefficients
    pub initial: DesignCoefficients,
    pub bounds: Vec<BoundOverride>,
    pub bounds_policy: BoundsPolicy,
    pub penalty_weight: f64,
    #[serde(rename = "loop")]
    pub loop_config: LoopConfig,
    #[serde(flatten)]
    pub driver: DriverConfig,
}

impl Default for RunConfig {
    /// Heavy-lift scenario
    fn default() -> Self {
        Self {
            model: None,
            mission: MissionSpec::default(),
            initial: DesignCoefficients::new([0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.01]),
            bounds: Vec::new(),
            bounds_policy: BoundsPolicy::default(),
            penalty_weight: 1e5,
            loop_config: LoopConfig::default(),
            driver: DriverConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(s: &str) -> SizingResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> SizingResult<Self> {
        let path = path.as_ref();
        log::debug!("reading run configuration {}", path.display());
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn to_toml_string(&self) -> SizingResult<String> {
        toml::to_string_pretty(self).map_err(|e| SizingError::Config(e.to_string()))
    }

    fn validate(&self) -> SizingResult<()> {
        if !(self.penalty_weight.is_finite() && self.penalty_weight > 0.0) {
            return Err(SizingError::Config(format!(
                "penalty_weight must be positive and finite, got {}",
                self.penalty_weight
            )));
        }
        if self.loop_config.max_iterations == 0 || !(self.loop_config.tolerance > 0.0) {
            return Err(SizingError::Config(
                "loop needs a positive tolerance and iteration cap".into(),
            ));
        }
        self.space().map(|_| ())
    }

    /// Multirotor bounds with the overrides applied
    pub fn space(&self) -> SizingResult<CoefficientSpace> {
        let mut space = CoefficientSpace::multirotor();
        for b in &self.bounds {
            let index = space.index_of(&b.symbol)?;
            space.set_bounds(index, b.min, b.max)?;
        }
        Ok(space)
    }

    /// Mission of the run, from the preset when `model` is set
    pub fn resolved_mission(&self, repository: &BuiltinRepository) -> SizingResult<MissionSpec> {
        match &self.model {
            Some(id) => Ok(repository.preset(id)?.mission),
            None => Ok(self.mission),
        }
    }

    /// Sizing model with every model-level setting applied
    pub fn build_model(&self, repository: &BuiltinRepository) -> SizingResult<SizingModel> {
        let model = match &self.model {
            Some(id) => repository.build(id)?,
            None => SizingModel::new(self.mission)?,
        };
        Ok(model
            .with_space(self.space()?)
            .with_bounds_policy(self.bounds_policy)
            .with_loop_config(self.loop_config)
            .with_penalty_weight(self.penalty_weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::driver::Strategy;
    use crate::optimizer::model::Evaluator;

    #[test]
    fn test_default_is_scenario() {
        let c = RunConfig::default();
        assert_eq!(c.mission, MissionSpec::default());
        assert_eq!(c.initial.k_os(), 3.2);
        assert_eq!(c.driver.strategy, Strategy::Gradient);
    }

    #[test]
    fn test_parse_partial() {
        let c = RunConfig::from_toml_str(
            r#"
strategy = "stochastic"
max_evaluations = 5000
penalty_weight = 1000

[mission]
payload_mass = 50.0
mtow = 200.0

[stochastic]
population_size = 30
seed = 3

[loop]
max_iterations = 50

[[bounds]]
symbol = "k_os"
min = 1.0
max = 10.0
"#,
        )
        .unwrap();
        assert_eq!(c.driver.strategy, Strategy::Stochastic);
        assert_eq!(c.driver.max_evaluations, Some(5000));
        assert_eq!(c.driver.stochastic.population_size, 30);
        assert_eq!(c.driver.stochastic.seed, Some(3));
        assert_eq!(c.driver.stochastic.f, 0.7);
        assert_eq!(c.penalty_weight, 1000.0);
        assert_eq!(c.loop_config.max_iterations, 50);
        assert_eq!(c.loop_config.tolerance, 1e-10);
        assert_eq!(c.mission.payload_mass, 50.0);
        assert_eq!(c.mission.autonomy_min, 25.0);

        let space = c.space().unwrap();
        assert_eq!(space.parameter(1).max, 10.0);
    }

    #[test]
    fn test_bad_bounds_rejected() {
        let err = RunConfig::from_toml_str("[[bounds]]\nsymbol = \"k_zz\"\nmin = 1.0\nmax = 2.0\n");
        assert!(matches!(err, Err(SizingError::Config(_))));
        let err = RunConfig::from_toml_str("[[bounds]]\nsymbol = \"k_mb\"\nmin = 2.0\nmax = 1.0\n");
        assert!(matches!(err, Err(SizingError::Config(_))));
    }

    #[test]
    fn test_bad_penalty_rejected() {
        assert!(RunConfig::from_toml_str("penalty_weight = -1.0").is_err());
        assert!(matches!(
            RunConfig::from_toml_str("penalty_weight = ["),
            Err(SizingError::Toml(_))
        ));
    }

    #[test]
    fn test_build_model_from_preset() {
        let c = RunConfig {
            model: Some("quadrotor".into()),
            ..Default::default()
        };
        let repo = BuiltinRepository::new();
        let model = c.build_model(&repo).unwrap();
        assert_eq!(model.mission().payload_mass, 20.0);
        assert_eq!(c.resolved_mission(&repo).unwrap().mtow, 80.0);

        let c = RunConfig {
            model: Some("unknown".into()),
            ..Default::default()
        };
        assert!(matches!(c.build_model(&repo), Err(SizingError::ModelNotFound(_))));
    }

    #[test]
    fn test_toml_roundtrip() {
        let c = RunConfig::default();
        let text = c.to_toml_string().unwrap();
        let back = RunConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.initial, c.initial);
        assert_eq!(back.driver.stochastic.population_size, 60);
    }
}
