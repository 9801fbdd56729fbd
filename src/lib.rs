//! # ROTORSIZE-RS
//!
//! Multirotor drone sizing by scaling laws and constrained optimization
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                          ROTORSIZE-RS                                       │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  LEVEL 1: SCALING LAWS (propeller, motor, battery, ESC, frame)              │
//! │  LEVEL 2: MASS LOOP (mass ↔ thrust fixed point)                             │
//! │  LEVEL 3: CONSTRAINTS + OBJECTIVES (margins, penalized mass)                │
//! │  LEVEL 4: SIZING MODEL (Obj / ObjP / Const / Report)                        │
//! │  LEVEL 5: DRIVER (augmented Lagrangian, differential evolution)             │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use rotorsize_rs::{
//!     DesignCoefficients, DriverConfig, MissionSpec, OptimizationDriver, SizingModel,
//! };
//!
//! let model = SizingModel::new(MissionSpec::default())?;
//! let x0 = DesignCoefficients::new([0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.01]);
//! let outcome = OptimizationDriver::new(&model, DriverConfig::default()).run(&x0)?;
//! println!("{:.2} kg", outcome.objective);
//! # Ok::<(), rotorsize_rs::SizingError>(())
//! ```

pub mod constants;
pub mod error;
pub mod coupling;
pub mod optimizer;
pub mod config;
pub mod repository;

// Re-exports
pub use constants::PhysicalConstants;
pub use error::{SizingError, SizingResult};
pub use coupling::{LoopConfig, LoopResolution, LoopResolver, LoopStatus};
pub use config::RunConfig;
pub use repository::{BuiltinRepository, FileRepository, ModelRepository};
pub use optimizer::{
    DesignCoefficients, DesignPoint, DriverConfig, DriverState, EvaluationMode, Evaluator,
    MissionSpec, OptimizationDriver, OptimizationOutcome, SizingModel, Strategy,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Information about the crate
pub fn info() -> String {
    format!(
        "ROTORSIZE-RS v{}\n\
         Multirotor sizing: scaling laws, mass loop, constrained optimization\n\
         Strategies: gradient (augmented Lagrangian), stochastic (differential evolution)\n\
         Parallel evaluation: {}",
        VERSION,
        if cfg!(feature = "parallel") { "rayon" } else { "off" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info() {
        let info = info();
        assert!(info.contains("ROTORSIZE-RS"));
        assert!(info.contains(VERSION));
    }
}
