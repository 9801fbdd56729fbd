//! # Sizing Model
//!
//! Single entry point `evaluate(coefficients, mode)`: enforces bounds,
//! resolves the mass loop, sizes all components and projects the result
//! onto the requested view.
//!
//! ```text
//! coefficients ─► bounds policy ─► LoopResolver ─► DesignPoint ─► ConstraintResult
//!                                                      │                │
//!                                                      └── Obj / ObjP / Const / Report
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::PhysicalConstants;
use crate::coupling::{LoopConfig, LoopResolver};
use crate::error::{SizingError, SizingResult};
use crate::optimizer::constraints::{ConstraintEvaluator, ConstraintResult, ConstraintVector};
use crate::optimizer::design::DesignPoint;
use crate::optimizer::mission::MissionSpec;
use crate::optimizer::objectives::ObjectiveFunctions;
use crate::optimizer::parameters::{BoundsPolicy, CoefficientSpace, DesignCoefficients};
use crate::optimizer::reports::{DesignReport, Reporter};
use crate::optimizer::scaling_laws::ScalingLawLibrary;

/// Requested view of an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluationMode {
    /// Total mass
    Obj,
    /// Total mass + constraint penalty
    ObjP,
    /// Constraint margins
    Const,
    /// Full report, also pushed to the attached reporter
    Report,
}

/// Tagged result of an evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Objective(f64),
    Penalized(f64),
    Constraints(ConstraintVector),
    Report(Box<DesignReport>),
}

impl Evaluation {
    /// Scalar value of objective views
    pub fn scalar(&self) -> Option<f64> {
        match self {
            Evaluation::Objective(v) | Evaluation::Penalized(v) => Some(*v),
            _ => None,
        }
    }

    pub fn constraints(&self) -> Option<&ConstraintVector> {
        match self {
            Evaluation::Constraints(c) => Some(c),
            Evaluation::Report(r) => Some(&r.constraints.vector),
            _ => None,
        }
    }
}

/// Evaluation plus its degraded flag
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluated {
    pub value: Evaluation,
    /// Mass loop diverged; `value` comes from the fallback mass
    pub degraded: bool,
}

/// Everything one model pass computes
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub design: DesignPoint,
    pub constraints: ConstraintResult,
    pub objective: f64,
    pub penalized_objective: f64,
}

impl Solution {
    pub fn degraded(&self) -> bool {
        self.design.degraded()
    }

    pub fn coefficients(&self) -> DesignCoefficients {
        self.design.coefficients
    }

    /// Projects onto a non-report view
    pub fn project(&self, mode: EvaluationMode, mission: &MissionSpec) -> Evaluation {
        match mode {
            EvaluationMode::Obj => Evaluation::Objective(self.objective),
            EvaluationMode::ObjP => Evaluation::Penalized(self.penalized_objective),
            EvaluationMode::Const => Evaluation::Constraints(self.constraints.vector.clone()),
            EvaluationMode::Report => {
                Evaluation::Report(Box::new(DesignReport::from_solution(self, mission)))
            }
        }
    }
}

/// Black-box evaluator consumed by the optimization driver
pub trait Evaluator: Send + Sync {
    /// Bounds of the coefficients
    fn space(&self) -> &CoefficientSpace;

    fn mission(&self) -> &MissionSpec;

    /// One full model pass
    fn solve(&self, coefficients: &DesignCoefficients) -> SizingResult<Solution>;

    /// One model pass projected onto `mode`
    fn evaluate(
        &self,
        coefficients: &DesignCoefficients,
        mode: EvaluationMode,
    ) -> SizingResult<Evaluated> {
        let solution = self.solve(coefficients)?;
        Ok(Evaluated {
            value: solution.project(mode, self.mission()),
            degraded: solution.degraded(),
        })
    }
}

/// Multirotor sizing model
#[derive(Clone)]
pub struct SizingModel {
    pub constants: PhysicalConstants,
    pub laws: ScalingLawLibrary,
    pub mission: MissionSpec,
    pub space: CoefficientSpace,
    pub bounds_policy: BoundsPolicy,
    pub resolver: LoopResolver,
    pub constraints: ConstraintEvaluator,
    pub objectives: ObjectiveFunctions,
    reporter: Option<Arc<dyn Reporter>>,
}

impl std::fmt::Debug for SizingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizingModel")
            .field("mission", &self.mission)
            .field("bounds_policy", &self.bounds_policy)
            .field("resolver", &self.resolver)
            .field("objectives", &self.objectives)
            .field("reporter", &self.reporter.is_some())
            .finish()
    }
}

impl SizingModel {
    /// Model with the default reference catalog. Invalid missions are fatal.
    pub fn new(mission: MissionSpec) -> SizingResult<Self> {
        Self::with_constants(mission, PhysicalConstants::default())
    }

    pub fn with_constants(
        mission: MissionSpec,
        constants: PhysicalConstants,
    ) -> SizingResult<Self> {
        mission.validate()?;
        Ok(Self {
            laws: ScalingLawLibrary::from_constants(&constants),
            constants,
            mission,
            space: CoefficientSpace::multirotor(),
            bounds_policy: BoundsPolicy::default(),
            resolver: LoopResolver::default(),
            constraints: ConstraintEvaluator::default(),
            objectives: ObjectiveFunctions::default(),
            reporter: None,
        })
    }

    pub fn with_space(mut self, space: CoefficientSpace) -> Self {
        self.space = space;
        self
    }

    pub fn with_bounds_policy(mut self, policy: BoundsPolicy) -> Self {
        self.bounds_policy = policy;
        self
    }

    pub fn with_loop_config(mut self, config: LoopConfig) -> Self {
        self.resolver = LoopResolver::new(config);
        self
    }

    pub fn with_penalty_weight(mut self, weight: f64) -> Self {
        self.objectives = ObjectiveFunctions::new(weight);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Sizes the multirotor for already-enforced coefficients
    fn design(&self, c: &DesignCoefficients) -> SizingResult<DesignPoint> {
        let payload = self.mission.payload_mass;
        let floor = c.k_os() * payload;

        let resolution = self.resolver.resolve(floor, payload, |mass| {
            Ok(DesignPoint::size(&self.laws, &self.constants, &self.mission, c, mass)?.total_mass)
        })?;

        // k_os is a floor on the sizing mass
        let sizing_mass = floor.max(resolution.mass);
        let design = DesignPoint::size(&self.laws, &self.constants, &self.mission, c, sizing_mass)?;
        Ok(design.with_resolution(resolution))
    }

    /// Like [`Evaluator::solve`] but a diverged mass loop is an error
    pub fn solve_strict(&self, coefficients: &DesignCoefficients) -> SizingResult<Solution> {
        let solution = self.solve(coefficients)?;
        match solution.design.resolution.to_error() {
            Some(err) => Err(err),
            None => Ok(solution),
        }
    }

    /// Evaluates and pushes the report to the attached reporter
    pub fn report(&self, coefficients: &DesignCoefficients) -> SizingResult<DesignReport> {
        let solution = self.solve(coefficients)?;
        let report = DesignReport::from_solution(&solution, &self.mission);
        if let Some(reporter) = &self.reporter {
            reporter.emit(&report)?;
        }
        Ok(report)
    }
}

impl Evaluator for SizingModel {
    fn space(&self) -> &CoefficientSpace {
        &self.space
    }

    fn mission(&self) -> &MissionSpec {
        &self.mission
    }

    fn solve(&self, coefficients: &DesignCoefficients) -> SizingResult<Solution> {
        let c = self.space.enforce(coefficients, self.bounds_policy)?;
        let design = self.design(&c)?;
        let constraints = self.constraints.evaluate(&design, &self.mission, &self.constants);

        let objective = ObjectiveFunctions::mass(&design);
        let penalized_objective = self.objectives.penalized_mass(&design, &constraints.vector);
        if !objective.is_finite() {
            return Err(SizingError::invalid("total mass", objective));
        }

        Ok(Solution {
            design,
            constraints,
            objective,
            penalized_objective,
        })
    }

    fn evaluate(
        &self,
        coefficients: &DesignCoefficients,
        mode: EvaluationMode,
    ) -> SizingResult<Evaluated> {
        if mode == EvaluationMode::Report {
            let report = self.report(coefficients)?;
            let degraded = report.degraded;
            return Ok(Evaluated {
                value: Evaluation::Report(Box::new(report)),
                degraded,
            });
        }
        let solution = self.solve(coefficients)?;
        Ok(Evaluated {
            value: solution.project(mode, &self.mission),
            degraded: solution.degraded(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupling::LoopStatus;
    use crate::optimizer::constraints::ConstraintKind;
    use crate::optimizer::reports::CollectingReporter;

    fn scenario() -> DesignCoefficients {
        DesignCoefficients::new([0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.01])
    }

    fn feasible_base() -> DesignCoefficients {
        DesignCoefficients::new([0.3, 1.0, 1.2, 1.1, 1.5, 1.0, 1.0, 0.9])
    }

    fn model() -> SizingModel {
        SizingModel::new(MissionSpec::default()).unwrap()
    }

    #[test]
    fn test_scenario_initial_design() {
        let s = model().solve(&scenario()).unwrap();
        assert!(!s.degraded());
        assert!((s.objective - 349.387).abs() < 0.05, "mass {}", s.objective);
        // k_D below bound was clamped
        assert_eq!(s.coefficients().k_d(), 0.1);
        assert!(!s.constraints.feasible);

        let v = &s.constraints.vector;
        assert!((v.get(ConstraintKind::MotorTorque).unwrap() + 0.029412).abs() < 1e-4);
        assert!((v.get(ConstraintKind::BatteryEnergy).unwrap() + 0.164006).abs() < 1e-3);
        assert!((v.get(ConstraintKind::PropellerTipSpeed).unwrap() - 1.0 / 6.0).abs() < 1e-9);
        assert!(v.get(ConstraintKind::MassBudget).unwrap() > 0.0);
    }

    #[test]
    fn test_feasible_base_design() {
        let s = model().solve(&feasible_base()).unwrap();
        assert!(s.constraints.feasible);
        assert!((s.objective - 304.189).abs() < 0.05);
        assert!(s.constraints.vector.min_margin() > 0.04);
    }

    #[test]
    fn test_saturated_torque_margin() {
        // max torque = (85/70)·k_mot·Q_hover and Q_to = 1.25·Q_hover
        let k_mot = 1.25 * 70.0 / 85.0;
        let c = feasible_base().with(3, k_mot);
        match model().evaluate(&c, EvaluationMode::Const).unwrap().value {
            Evaluation::Constraints(v) => {
                for (kind, m) in &v.margins {
                    if *kind == ConstraintKind::MotorTorque {
                        assert!(m.abs() < 1e-9, "torque margin {}", m);
                    } else {
                        assert!(*m >= 0.0, "{} = {}", kind.label(), m);
                    }
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_single_violation() {
        let c = feasible_base().with(3, 1.0);
        let s = model().solve(&c).unwrap();
        assert_eq!(s.constraints.violations.len(), 1);
        assert_eq!(s.constraints.violations[0].kind, ConstraintKind::MotorTorque);

        let c = feasible_base().with(5, 0.5);
        let s = model().solve(&c).unwrap();
        assert_eq!(s.constraints.violations.len(), 1);
        assert_eq!(s.constraints.violations[0].kind, ConstraintKind::BatteryEnergy);
    }

    #[test]
    fn test_penalty_modes() {
        let m = model();
        let scalar = |c: DesignCoefficients, mode: EvaluationMode| {
            m.evaluate(&c, mode).unwrap().value.scalar().unwrap()
        };
        let obj = scalar(feasible_base(), EvaluationMode::Obj);
        let objp = scalar(feasible_base(), EvaluationMode::ObjP);
        assert_eq!(obj, objp);

        let obj = scalar(scenario(), EvaluationMode::Obj);
        let objp = scalar(scenario(), EvaluationMode::ObjP);
        assert!(objp > obj);
    }

    #[test]
    fn test_degraded_evaluation() {
        // heavy battery snowballs the mass loop
        let c = scenario().with(5, 3.0);
        let m = model();
        let e = m.evaluate(&c, EvaluationMode::Obj).unwrap();
        assert!(e.degraded);
        let mass = e.value.scalar().unwrap();
        assert!(mass.is_finite() && mass > 0.0);

        let s = m.solve(&c).unwrap();
        assert_eq!(s.design.resolution.status, LoopStatus::Diverged);
        assert!(matches!(m.solve_strict(&c), Err(SizingError::LoopDivergence { .. })));
    }

    #[test]
    fn test_reject_policy() {
        let m = model().with_bounds_policy(BoundsPolicy::Reject);
        assert!(matches!(m.solve(&scenario()), Err(SizingError::BoundViolation { .. })));
        assert!(m.solve(&feasible_base()).is_ok());
    }

    #[test]
    fn test_report_mode_emits() {
        let collector = Arc::new(CollectingReporter::new());
        let m = model().with_reporter(collector.clone());
        let e = m.evaluate(&scenario(), EvaluationMode::Report).unwrap();
        match e.value {
            Evaluation::Report(r) => assert!((r.total_mass() - 349.387).abs() < 0.05),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(collector.len(), 1);

        m.evaluate(&scenario(), EvaluationMode::Obj).unwrap();
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_k_os_floor() {
        let m = model();
        let low = m.solve(&feasible_base()).unwrap();
        let high = m.solve(&feasible_base().with(1, 5.0)).unwrap();
        assert!(high.design.sizing_mass >= 500.0);
        assert!(high.objective > low.objective);
    }

    #[test]
    fn test_invalid_mission_is_fatal() {
        let mut mission = MissionSpec::default();
        mission.payload_mass = -1.0;
        assert!(SizingModel::new(mission).is_err());
    }
}
