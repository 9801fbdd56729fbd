//! # Multirotor Sizing and Optimization
//!
//! Sizes a multirotor drone from eight dimensionless design coefficients
//! and searches those coefficients for the lightest feasible design.
//!
//! ## Layers
//!
//! ```text
//! LAYER 5: Driver (state machine, strategy selection)
//! LAYER 4: Algorithms (augmented Lagrangian, differential evolution)
//! LAYER 3: Model (Obj / ObjP / Const / Report views)
//! LAYER 2: Constraints and objectives (margins, penalty)
//! LAYER 1: Scaling laws and component sizing (propeller, motor, battery, ESC, frame)
//! ```

pub mod parameters;
pub mod mission;
pub mod scaling_laws;
pub mod design;
pub mod constraints;
pub mod objectives;
pub mod model;
pub mod algorithms;
pub mod driver;
pub mod reports;
pub mod utils;

// Main re-exports
pub use parameters::{BoundsPolicy, CoefficientSpace, DesignCoefficients, ParameterDef, Scale};
pub use mission::{Architecture, MissionSpec};
pub use scaling_laws::{ScalingLaw, ScalingLawLibrary};
pub use design::DesignPoint;
pub use constraints::{
    ConstraintEvaluator, ConstraintKind, ConstraintResult, ConstraintVector, Violation, Warning,
};
pub use objectives::ObjectiveFunctions;
pub use model::{Evaluated, Evaluation, EvaluationMode, Evaluator, SizingModel, Solution};
pub use algorithms::{
    AugmentedLagrangian, BoundedOptimizer, DifferentialEvolution, FailurePolicy, MutationStrategy,
    Problem,
};
pub use driver::{DriverConfig, DriverState, OptimizationDriver, OptimizationOutcome, Strategy};
pub use reports::{
    CollectingReporter, DesignReport, LogReporter, ReportExporter, ReportGenerator, Reporter,
    TextReporter,
};
