//! End-to-end heavy-lift scenario: 100 kg payload, 25 min hover,
//! 4 arms × 2 coaxial propellers, MTOW 360 kg.

use std::sync::Arc;

use rotorsize_rs::optimizer::{CollectingReporter, DifferentialEvolution, Evaluation};
use rotorsize_rs::{
    BuiltinRepository, DesignCoefficients, DriverConfig, DriverState, EvaluationMode, Evaluator,
    MissionSpec, ModelRepository, OptimizationDriver, SizingModel, Strategy,
};

fn initial() -> DesignCoefficients {
    DesignCoefficients::new([0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.01])
}

fn model() -> SizingModel {
    SizingModel::new(MissionSpec::default()).unwrap()
}

fn initial_mass() -> f64 {
    model().evaluate(&initial(), EvaluationMode::Obj).unwrap().value.scalar().unwrap()
}

#[test]
fn report_of_initial_design() {
    let collector = Arc::new(CollectingReporter::new());
    let model = model().with_reporter(collector.clone());

    let evaluated = model.evaluate(&initial(), EvaluationMode::Report).unwrap();
    assert!(!evaluated.degraded);
    let report = match evaluated.value {
        Evaluation::Report(r) => r,
        other => panic!("expected a report, got {:?}", other),
    };
    assert!((report.total_mass() - 349.387).abs() < 0.05);
    assert_eq!(report.constraints.vector.len(), 8);
    assert_eq!(collector.len(), 1);
}

#[test]
fn stochastic_run_improves_and_satisfies_constraints() {
    let m = model();
    let config = DriverConfig {
        strategy: Strategy::Stochastic,
        ..Default::default()
    };
    let mut driver = OptimizationDriver::new(&m, config);
    let outcome = driver.run(&initial()).unwrap();

    assert_eq!(outcome.status, DriverState::Converged);
    assert!(outcome.objective <= initial_mass());
    // penalty method: violations shrink with the weight but do not vanish
    assert!(outcome.constraints.min_margin() > -2e-3, "{:?}", outcome.constraints);
    assert!(outcome.degraded_evaluations * 2 < outcome.evaluations);

    let check = m.evaluate(&outcome.coefficients, EvaluationMode::Obj).unwrap();
    assert_eq!(check.value.scalar().unwrap(), outcome.objective);
}

#[test]
fn gradient_run_improves_and_satisfies_constraints() {
    let m = model();
    let mut driver = OptimizationDriver::new(&m, DriverConfig::default());
    let outcome = driver.run(&initial()).unwrap();

    assert_eq!(outcome.status, DriverState::Converged);
    assert!(outcome.objective <= initial_mass());
    assert!(outcome.feasible(1e-4), "{:?}", outcome.constraints);
    assert!(!outcome.history.is_empty());
}

#[test]
fn both_strategies_land_close() {
    let m = model();
    let gradient = OptimizationDriver::new(&m, DriverConfig::default()).run(&initial()).unwrap();
    let stochastic = OptimizationDriver::new(
        &m,
        DriverConfig {
            strategy: Strategy::Stochastic,
            stochastic: DifferentialEvolution {
                seed: Some(7),
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .run(&initial())
    .unwrap();

    let rel = (gradient.objective - stochastic.objective).abs() / gradient.objective;
    assert!(rel < 0.02, "{} vs {}", gradient.objective, stochastic.objective);
}

#[test]
fn quadrotor_preset_from_repository() {
    let repository = BuiltinRepository::new();
    let evaluator = repository.load("quadrotor").unwrap();
    let x0 = repository.preset("quadrotor").unwrap().initial;
    let start = evaluator.solve(&x0).unwrap();
    assert!(start.constraints.feasible);

    let config = DriverConfig {
        strategy: Strategy::Stochastic,
        max_evaluations: Some(6000),
        ..Default::default()
    };
    let outcome = OptimizationDriver::new(evaluator.as_ref(), config).run(&x0).unwrap();
    // a feasible seed member bounds the penalized best
    assert!(outcome.objective <= start.objective + 1e-9);
    assert!(outcome.constraints.min_margin() > -2e-3);
}
