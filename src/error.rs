//! # Error Types
//!
//! Error taxonomy shared by the sizing model, the loop resolver and the
//! optimization driver.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SizingError {
    /// A scaling-law or model input outside its valid domain.
    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: String, value: f64 },

    /// The mass/thrust fixed-point loop did not settle.
    #[error("Mass loop diverged after {iterations} iterations (last mass {last_mass:.3} kg)")]
    LoopDivergence { iterations: usize, last_mass: f64 },

    #[error("Coefficient {name} = {value} outside bounds [{min}, {max}]")]
    BoundViolation {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Run aborted by the optimization driver.
    #[error("Optimization failed: {0}")]
    OptimizationFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SizingError {
    pub fn invalid(name: &str, value: f64) -> Self {
        SizingError::InvalidParameter {
            name: name.to_string(),
            value,
        }
    }
}

pub type SizingResult<T> = Result<T, SizingError>;
