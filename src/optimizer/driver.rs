//! # Optimization Driver
//!
//! Runs one bounded search over the coefficient space.
//!
//! ```text
//! Initialized ──► Searching ──┬──► Converged   (tolerance met)
//!                             ├──► Exhausted   (budget spent, best returned)
//!                             └──► Failed      (degraded majority / invalid input)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{SizingError, SizingResult};
use crate::optimizer::algorithms::{
    AugmentedLagrangian, BoundedOptimizer, DifferentialEvolution, FailurePolicy, HistoryEntry,
    Problem, SearchResult,
};
use crate::optimizer::constraints::ConstraintVector;
use crate::optimizer::design::DesignPoint;
use crate::optimizer::model::Evaluator;
use crate::optimizer::parameters::DesignCoefficients;

/// Search strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Augmented Lagrangian on Obj + Const
    #[default]
    Gradient,
    /// Differential evolution on ObjP
    Stochastic,
}

impl std::str::FromStr for Strategy {
    type Err = SizingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gradient" => Ok(Strategy::Gradient),
            "stochastic" => Ok(Strategy::Stochastic),
            other => Err(SizingError::Config(format!("unknown strategy '{}'", other))),
        }
    }
}

/// Driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverState {
    Initialized,
    Searching,
    Converged,
    Exhausted,
    Failed,
}

impl DriverState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DriverState::Converged | DriverState::Exhausted | DriverState::Failed)
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub strategy: Strategy,
    pub gradient: AugmentedLagrangian,
    pub stochastic: DifferentialEvolution,
    pub failure: FailurePolicy,
    /// Hard cap on evaluator calls
    pub max_evaluations: Option<usize>,
    /// Evaluate DE populations and FD probes on rayon workers
    pub parallel: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            gradient: AugmentedLagrangian::default(),
            stochastic: DifferentialEvolution::default(),
            failure: FailurePolicy::default(),
            max_evaluations: None,
            parallel: cfg!(feature = "parallel"),
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationOutcome {
    pub strategy: Strategy,
    /// `Converged` or `Exhausted`
    pub status: DriverState,
    pub coefficients: DesignCoefficients,
    pub design: DesignPoint,
    pub constraints: ConstraintVector,
    /// Total mass of the returned design (kg)
    pub objective: f64,
    pub evaluations: usize,
    pub iterations: usize,
    pub degraded_evaluations: usize,
    pub history: Vec<HistoryEntry>,
}

impl OptimizationOutcome {
    /// All margins at least `-tolerance`
    pub fn feasible(&self, tolerance: f64) -> bool {
        self.constraints.is_feasible(tolerance)
    }
}

/// Optimization driver over an evaluator
pub struct OptimizationDriver<'a> {
    evaluator: &'a dyn Evaluator,
    config: DriverConfig,
    state: DriverState,
}

impl<'a> OptimizationDriver<'a> {
    pub fn new(evaluator: &'a dyn Evaluator, config: DriverConfig) -> Self {
        Self {
            evaluator,
            config,
            state: DriverState::Initialized,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    fn transition(&mut self, next: DriverState) {
        log::info!("driver: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Runs the configured strategy from `x0`
    pub fn run(&mut self, x0: &DesignCoefficients) -> SizingResult<OptimizationOutcome> {
        if self.state != DriverState::Initialized {
            return Err(SizingError::Config(format!(
                "driver already ran (state {:?})",
                self.state
            )));
        }
        if let Some((i, v)) = x0.as_slice().iter().enumerate().find(|(_, v)| !v.is_finite()) {
            self.transition(DriverState::Failed);
            return Err(SizingError::invalid(&self.evaluator.space().parameter(i).symbol, *v));
        }

        let problem = Problem::new(self.evaluator)
            .with_policy(self.config.failure)
            .with_max_evaluations(self.config.max_evaluations)
            .with_parallel(self.config.parallel);

        let config = self.config;
        let optimizer: &dyn BoundedOptimizer = match config.strategy {
            Strategy::Gradient => &config.gradient,
            Strategy::Stochastic => &config.stochastic,
        };
        log::info!("starting {} search", optimizer.name());
        self.transition(DriverState::Searching);

        let search = match optimizer.minimize(&problem, x0) {
            Ok(search) => search,
            Err(err) => {
                log::warn!(
                    "search aborted after {} evaluations ({} degraded): {}",
                    problem.evaluations(),
                    problem.degraded_evaluations(),
                    err
                );
                self.transition(DriverState::Failed);
                return Err(err);
            }
        };

        let status = if search.converged {
            DriverState::Converged
        } else {
            log::warn!("budget spent before meeting tolerance, returning best candidate");
            DriverState::Exhausted
        };
        self.transition(status);

        let outcome = self.outcome(search, &problem);
        log::info!(
            "{:?}: {:.3} kg, max violation {:.2e}, {} evaluations ({} degraded)",
            outcome.status,
            outcome.objective,
            outcome.constraints.max_violation(),
            outcome.evaluations,
            outcome.degraded_evaluations
        );
        Ok(outcome)
    }

    fn outcome(&self, search: SearchResult, problem: &Problem<'_>) -> OptimizationOutcome {
        let SearchResult {
            solution,
            iterations,
            history,
            ..
        } = search;
        OptimizationOutcome {
            strategy: self.config.strategy,
            status: self.state,
            coefficients: solution.coefficients(),
            objective: solution.objective,
            constraints: solution.constraints.vector,
            design: solution.design,
            evaluations: problem.evaluations(),
            iterations,
            degraded_evaluations: problem.degraded_evaluations(),
            history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::mission::MissionSpec;
    use crate::optimizer::model::SizingModel;

    fn model() -> SizingModel {
        SizingModel::new(MissionSpec::default()).unwrap()
    }

    fn feasible_base() -> DesignCoefficients {
        DesignCoefficients::new([0.3, 1.0, 1.2, 1.1, 1.5, 1.0, 1.0, 0.9])
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("gradient".parse::<Strategy>().unwrap(), Strategy::Gradient);
        assert_eq!("Stochastic".parse::<Strategy>().unwrap(), Strategy::Stochastic);
        assert!("annealing".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_budget_exhausted() {
        let m = model();
        let config = DriverConfig {
            strategy: Strategy::Stochastic,
            stochastic: DifferentialEvolution {
                population_size: 10,
                ..Default::default()
            },
            max_evaluations: Some(40),
            ..Default::default()
        };
        let mut driver = OptimizationDriver::new(&m, config);
        assert_eq!(driver.state(), DriverState::Initialized);
        let outcome = driver.run(&feasible_base()).unwrap();
        assert_eq!(driver.state(), DriverState::Exhausted);
        assert_eq!(outcome.status, DriverState::Exhausted);
        assert!(outcome.objective.is_finite());
        // budget is checked per generation
        assert!(outcome.evaluations <= 40 + 10 + 1);
    }

    #[test]
    fn test_runs_once() {
        let m = model();
        let config = DriverConfig {
            max_evaluations: Some(20),
            ..Default::default()
        };
        let mut driver = OptimizationDriver::new(&m, config);
        driver.run(&feasible_base()).unwrap();
        assert!(driver.state().is_terminal());
        assert!(matches!(driver.run(&feasible_base()), Err(SizingError::Config(_))));
    }

    #[test]
    fn test_non_finite_start_fails() {
        let m = model();
        let mut driver = OptimizationDriver::new(&m, DriverConfig::default());
        let x0 = feasible_base().with(2, f64::NAN);
        assert!(matches!(driver.run(&x0), Err(SizingError::InvalidParameter { .. })));
        assert_eq!(driver.state(), DriverState::Failed);
    }

    #[test]
    fn test_degraded_majority_fails() {
        let m = model();
        let config = DriverConfig {
            strategy: Strategy::Gradient,
            failure: FailurePolicy {
                max_degraded_fraction: 0.0,
                min_evaluations: 1,
            },
            ..Default::default()
        };
        let mut driver = OptimizationDriver::new(&m, config);
        // the starting point itself snowballs
        let x0 = feasible_base().with(5, 50.0);
        assert!(matches!(driver.run(&x0), Err(SizingError::OptimizationFailed(_))));
        assert_eq!(driver.state(), DriverState::Failed);
    }
}
