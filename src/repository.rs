//! # Model Repository
//!
//! Source of ready-to-use evaluators. `BuiltinRepository` ships the
//! reference missions; `FileRepository` reads run configurations from a
//! directory of `<id>.toml` files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RunConfig;
use crate::constants::{PhysicalConstants, GRAVITY};
use crate::error::{SizingError, SizingResult};
use crate::optimizer::mission::{Architecture, MissionSpec};
use crate::optimizer::model::{Evaluator, SizingModel};
use crate::optimizer::parameters::DesignCoefficients;
use crate::optimizer::reports::Reporter;

/// Loads evaluators by identifier
pub trait ModelRepository {
    /// Unknown identifiers fail with `ModelNotFound`
    fn load(&self, id: &str) -> SizingResult<Box<dyn Evaluator>>;

    /// Identifiers this repository can serve
    fn ids(&self) -> Vec<String>;
}

/// Named mission with a starting coefficient vector
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub id: &'static str,
    pub description: &'static str,
    pub mission: MissionSpec,
    pub initial: DesignCoefficients,
}

/// Reference presets
pub struct BuiltinRepository {
    presets: Vec<Preset>,
    constants: PhysicalConstants,
    reporter: Option<Arc<dyn Reporter>>,
}

impl Default for BuiltinRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinRepository {
    pub fn new() -> Self {
        Self {
            presets: vec![
                Preset {
                    id: "heavy-lift",
                    description: "100 kg payload, 25 min hover, coaxial 4x2, MTOW 360 kg",
                    mission: MissionSpec::default(),
                    initial: DesignCoefficients::new([0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.01]),
                },
                Preset {
                    id: "quadrotor",
                    description: "20 kg payload, 20 min hover, quadrotor 4x1, MTOW 80 kg",
                    mission: MissionSpec {
                        payload_mass: 20.0,
                        autonomy_min: 20.0,
                        takeoff_acceleration: 0.25 * GRAVITY,
                        mtow: 80.0,
                        architecture: Architecture {
                            arms: 4,
                            propellers_per_arm: 1,
                        },
                    },
                    initial: DesignCoefficients::new([0.3, 1.0, 1.2, 1.1, 1.5, 1.0, 1.0, 0.9]),
                },
            ],
            constants: PhysicalConstants::default(),
            reporter: None,
        }
    }

    /// Reference catalog used by every loaded model
    pub fn with_constants(mut self, constants: PhysicalConstants) -> Self {
        self.constants = constants;
        self
    }

    /// Reporter attached to every loaded model
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn preset(&self, id: &str) -> SizingResult<&Preset> {
        self.presets
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| SizingError::ModelNotFound(id.to_string()))
    }

    /// Concrete model for a preset
    pub fn build(&self, id: &str) -> SizingResult<SizingModel> {
        let preset = self.preset(id)?;
        let model = SizingModel::with_constants(preset.mission, self.constants)?;
        Ok(match &self.reporter {
            Some(r) => model.with_reporter(r.clone()),
            None => model,
        })
    }
}

impl ModelRepository for BuiltinRepository {
    fn load(&self, id: &str) -> SizingResult<Box<dyn Evaluator>> {
        log::debug!("loading builtin model '{}'", id);
        Ok(Box::new(self.build(id)?))
    }

    fn ids(&self) -> Vec<String> {
        self.presets.iter().map(|p| p.id.to_string()).collect()
    }
}

/// Directory of run configurations, one `<id>.toml` per model
#[derive(Debug, Clone)]
pub struct FileRepository {
    root: PathBuf,
}

impl FileRepository {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.toml", id))
    }
}

impl ModelRepository for FileRepository {
    fn load(&self, id: &str) -> SizingResult<Box<dyn Evaluator>> {
        let path = self.path(id);
        if !path.is_file() {
            return Err(SizingError::ModelNotFound(format!("{} ({})", id, path.display())));
        }
        let config = RunConfig::load(&path)?;
        Ok(Box::new(config.build_model(&BuiltinRepository::new())?))
    }

    fn ids(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut ids: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == "toml"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::model::EvaluationMode;

    #[test]
    fn test_builtin_ids() {
        let repo = BuiltinRepository::new();
        assert_eq!(repo.ids(), vec!["heavy-lift", "quadrotor"]);
    }

    #[test]
    fn test_unknown_model() {
        let repo = BuiltinRepository::new();
        assert!(matches!(repo.load("octocopter"), Err(SizingError::ModelNotFound(_))));
    }

    #[test]
    fn test_quadrotor_preset() {
        let repo = BuiltinRepository::new();
        let preset = repo.preset("quadrotor").unwrap();
        let model = repo.load("quadrotor").unwrap();
        assert_eq!(model.mission().architecture.propellers(), 4);

        let s = model.solve(&preset.initial).unwrap();
        assert!(s.constraints.feasible);
        assert!((s.objective - 52.519).abs() < 0.05, "mass {}", s.objective);
    }

    #[test]
    fn test_heavy_lift_preset() {
        let repo = BuiltinRepository::new();
        let preset = repo.preset("heavy-lift").unwrap();
        let model = repo.load("heavy-lift").unwrap();
        let e = model.evaluate(&preset.initial, EvaluationMode::Obj).unwrap();
        assert!(!e.degraded);
        assert!((e.value.scalar().unwrap() - 349.387).abs() < 0.05);
    }

    #[test]
    fn test_file_repository() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("light.toml"),
            concat!(
                "[mission]\npayload_mass = 5.0\nautonomy_min = 15.0\nmtow = 25.0\n\n",
                "[mission.architecture]\narms = 6\npropellers_per_arm = 1\n",
            ),
        )
        .unwrap();

        let repo = FileRepository::new(dir.path());
        assert_eq!(repo.ids(), vec!["light"]);
        let model = repo.load("light").unwrap();
        assert_eq!(model.mission().payload_mass, 5.0);
        assert_eq!(model.mission().architecture.arms, 6);
        assert!(matches!(repo.load("heavy"), Err(SizingError::ModelNotFound(_))));
    }
}
