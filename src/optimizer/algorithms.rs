//! # Optimization Algorithms
//!
//! Two bounded search strategies over the normalized coefficient cube:
//!
//! - **Augmented Lagrangian** with a projected-gradient inner solver and
//!   forward finite differences (gradient strategy, uses Obj + Const).
//! - **Differential Evolution** rand/1/bin or best/1/bin on the penalized
//!   objective (stochastic strategy, uses ObjP).
//!
//! Both work in `u ∈ [0, 1]⁸`; see [`CoefficientSpace::normalize`].

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{SizingError, SizingResult};
use crate::optimizer::model::{Evaluator, Solution};
use crate::optimizer::parameters::{CoefficientSpace, DesignCoefficients};
use crate::optimizer::utils::{statistics, unit_cube};

/// When degraded calls abort a search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailurePolicy {
    /// Abort once more than this fraction of calls were degraded while
    /// the best candidate is degraded too
    pub max_degraded_fraction: f64,
    /// Calls made before the fraction is checked
    pub min_evaluations: usize,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            max_degraded_fraction: 0.5,
            min_evaluations: 100,
        }
    }
}

/// Bounded minimization problem on the unit cube
pub struct Problem<'a> {
    evaluator: &'a dyn Evaluator,
    policy: FailurePolicy,
    max_evaluations: Option<usize>,
    parallel: bool,
    evaluations: AtomicUsize,
    degraded: AtomicUsize,
}

impl<'a> Problem<'a> {
    pub fn new(evaluator: &'a dyn Evaluator) -> Self {
        Self {
            evaluator,
            policy: FailurePolicy::default(),
            max_evaluations: None,
            parallel: false,
            evaluations: AtomicUsize::new(0),
            degraded: AtomicUsize::new(0),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_evaluations(mut self, max: Option<usize>) -> Self {
        self.max_evaluations = max;
        self
    }

    /// Evaluate batches on rayon workers (no effect without the `parallel` feature)
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn space(&self) -> &CoefficientSpace {
        self.evaluator.space()
    }

    pub fn dimensions(&self) -> usize {
        self.space().n_dimensions()
    }

    pub fn to_unit(&self, c: &DesignCoefficients) -> Vec<f64> {
        self.space().normalize(c)
    }

    pub fn to_coefficients(&self, u: &[f64]) -> DesignCoefficients {
        self.space().denormalize(u)
    }

    /// One evaluator call at a unit-cube point
    pub fn solve(&self, u: &[f64]) -> SizingResult<Solution> {
        let solution = self.evaluator.solve(&self.to_coefficients(u))?;
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        if solution.degraded() {
            self.degraded.fetch_add(1, Ordering::Relaxed);
        }
        Ok(solution)
    }

    /// Evaluates `points` in order, in parallel when enabled
    pub fn solve_batch(&self, points: &[Vec<f64>]) -> SizingResult<Vec<Solution>> {
        if self.parallel {
            return self.solve_parallel(points);
        }
        points.iter().map(|u| self.solve(u)).collect()
    }

    #[cfg(feature = "parallel")]
    fn solve_parallel(&self, points: &[Vec<f64>]) -> SizingResult<Vec<Solution>> {
        points.par_iter().map(|u| self.solve(u)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn solve_parallel(&self, points: &[Vec<f64>]) -> SizingResult<Vec<Solution>> {
        points.iter().map(|u| self.solve(u)).collect()
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    pub fn degraded_evaluations(&self) -> usize {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Whether the evaluation budget is spent
    pub fn exhausted(&self) -> bool {
        self.max_evaluations.map_or(false, |max| self.evaluations() >= max)
    }

    /// Fails once degraded calls are the majority and the best candidate
    /// found so far is degraded as well
    pub fn checkpoint(&self, best_degraded: bool) -> SizingResult<()> {
        let n = self.evaluations();
        if !best_degraded || n < self.policy.min_evaluations.max(1) {
            return Ok(());
        }
        let fraction = self.degraded_evaluations() as f64 / n as f64;
        if fraction > self.policy.max_degraded_fraction {
            return Err(SizingError::OptimizationFailed(format!(
                "mass loop diverged in {} of {} evaluations",
                self.degraded_evaluations(),
                n
            )));
        }
        Ok(())
    }
}

/// Progress record per iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub iteration: usize,
    pub evaluations: usize,
    /// Total mass of the current best candidate (kg)
    pub best_objective: f64,
    pub max_violation: f64,
}

/// Result of a search
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best point in the unit cube
    pub u: Vec<f64>,
    pub solution: Solution,
    /// Tolerance met (as opposed to budget exhausted)
    pub converged: bool,
    pub iterations: usize,
    pub history: Vec<HistoryEntry>,
}

/// Box-bounded minimizer
pub trait BoundedOptimizer {
    fn name(&self) -> &'static str;

    fn minimize(
        &self,
        problem: &Problem<'_>,
        x0: &DesignCoefficients,
    ) -> SizingResult<SearchResult>;
}

// ============================================================================
// DIFFERENTIAL EVOLUTION
// ============================================================================

/// Mutation base vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationStrategy {
    /// Random base vector
    #[default]
    Rand1Bin,
    /// Current best as base vector
    Best1Bin,
}

/// Differential Evolution configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferentialEvolution {
    pub population_size: usize,
    /// Scale factor
    pub f: f64,
    /// Crossover probability
    pub cr: f64,
    pub generations: usize,
    pub strategy: MutationStrategy,
    /// Stop when std(fitness) ≤ tolerance·|mean(fitness)|
    pub tolerance: f64,
    /// `None` draws the seed from entropy
    pub seed: Option<u64>,
}

impl Default for DifferentialEvolution {
    fn default() -> Self {
        Self {
            population_size: 60,
            f: 0.7,
            cr: 0.9,
            generations: 500,
            strategy: MutationStrategy::Rand1Bin,
            tolerance: 1e-6,
            seed: Some(42),
        }
    }
}

/// Population member
#[derive(Debug, Clone)]
struct Member {
    u: Vec<f64>,
    fitness: f64,
    objective: f64,
    violation: f64,
    degraded: bool,
}

impl Member {
    fn new(u: Vec<f64>, s: &Solution) -> Self {
        Self {
            u,
            fitness: s.penalized_objective,
            objective: s.objective,
            violation: s.constraints.vector.max_violation(),
            degraded: s.degraded(),
        }
    }
}

impl DifferentialEvolution {
    fn validate(&self) -> SizingResult<()> {
        if self.population_size < 4 {
            return Err(SizingError::Config(format!(
                "differential evolution needs at least 4 members, got {}",
                self.population_size
            )));
        }
        if !(self.f > 0.0 && self.f <= 2.0) || !(0.0..=1.0).contains(&self.cr) {
            return Err(SizingError::Config(format!(
                "invalid DE control parameters F={} CR={}",
                self.f, self.cr
            )));
        }
        Ok(())
    }

    fn trial<R: Rng>(&self, population: &[Member], i: usize, best: usize, rng: &mut R) -> Vec<f64> {
        let np = population.len();
        let n = population[i].u.len();

        let mut picked: Vec<usize> = Vec::with_capacity(3);
        while picked.len() < 3 {
            let r = rng.gen_range(0..np);
            if r != i && !picked.contains(&r) {
                picked.push(r);
            }
        }
        let base = match self.strategy {
            MutationStrategy::Rand1Bin => picked[0],
            MutationStrategy::Best1Bin => best,
        };
        let (a, b, c) = (&population[base].u, &population[picked[1]].u, &population[picked[2]].u);

        let j_rand = rng.gen_range(0..n);
        let mut trial = population[i].u.clone();
        for j in 0..n {
            if rng.gen::<f64>() < self.cr || j == j_rand {
                trial[j] = a[j] + self.f * (b[j] - c[j]);
            }
        }
        unit_cube::project(&mut trial);
        trial
    }

    fn best_index(population: &[Member]) -> usize {
        let fitness: Vec<f64> = population.iter().map(|m| m.fitness).collect();
        statistics::argmin(&fitness).unwrap_or(0)
    }
}

impl BoundedOptimizer for DifferentialEvolution {
    fn name(&self) -> &'static str {
        "differential evolution"
    }

    fn minimize(
        &self,
        problem: &Problem<'_>,
        x0: &DesignCoefficients,
    ) -> SizingResult<SearchResult> {
        self.validate()?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let n = problem.dimensions();

        // 1. Initial population, x0 as first member
        let mut points: Vec<Vec<f64>> = (0..self.population_size)
            .map(|_| (0..n).map(|_| rng.gen::<f64>()).collect())
            .collect();
        points[0] = problem.to_unit(x0);

        let solutions = problem.solve_batch(&points)?;
        let mut population: Vec<Member> = points
            .into_iter()
            .zip(&solutions)
            .map(|(u, s)| Member::new(u, s))
            .collect();
        problem.checkpoint(population[Self::best_index(&population)].degraded)?;

        let mut history = Vec::new();
        let mut converged = false;
        let mut generation = 0;

        // 2. Evolutionary loop
        while generation < self.generations && !problem.exhausted() {
            generation += 1;

            // 2.1 Trials, drawn sequentially so the run is seed-reproducible
            let best = Self::best_index(&population);
            let trials: Vec<Vec<f64>> = (0..population.len())
                .map(|i| self.trial(&population, i, best, &mut rng))
                .collect();

            // 2.2 Evaluation
            let solutions = problem.solve_batch(&trials)?;

            // 2.3 Greedy selection
            for (i, (u, s)) in trials.into_iter().zip(&solutions).enumerate() {
                if s.penalized_objective <= population[i].fitness {
                    population[i] = Member::new(u, s);
                }
            }
            problem.checkpoint(population[Self::best_index(&population)].degraded)?;

            // 2.4 Progress
            let best = &population[Self::best_index(&population)];
            history.push(HistoryEntry {
                iteration: generation,
                evaluations: problem.evaluations(),
                best_objective: best.objective,
                max_violation: best.violation,
            });
            if generation % 50 == 0 {
                log::info!(
                    "DE gen {}: fitness {:.4} (mass {:.3} kg, violation {:.2e}), {} evals",
                    generation,
                    best.fitness,
                    best.objective,
                    best.violation,
                    problem.evaluations()
                );
            }

            // 2.5 Stagnation
            let fitness: Vec<f64> = population.iter().map(|m| m.fitness).collect();
            if statistics::std_dev(&fitness) <= self.tolerance * statistics::mean(&fitness).abs() {
                converged = true;
                break;
            }
        }

        let best = population.swap_remove(Self::best_index(&population));
        let solution = problem.solve(&best.u)?;
        Ok(SearchResult {
            u: best.u,
            solution,
            converged,
            iterations: generation,
            history,
        })
    }
}

// ============================================================================
// AUGMENTED LAGRANGIAN
// ============================================================================

/// Augmented Lagrangian configuration (inequality constraints `c ≥ 0`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentedLagrangian {
    /// Multiplier updates
    pub max_outer: usize,
    /// Projected-gradient steps per subproblem
    pub max_inner: usize,
    /// Projected-gradient norm for stationarity
    pub kkt_tolerance: f64,
    /// Largest accepted constraint violation
    pub constraint_tolerance: f64,
    /// Forward-difference step in the unit cube
    pub fd_step: f64,
    /// Initial penalty parameter
    pub mu0: f64,
    pub mu_growth: f64,
    pub mu_max: f64,
    /// Armijo sufficient-decrease constant
    pub armijo: f64,
    pub min_step: f64,
}

impl Default for AugmentedLagrangian {
    fn default() -> Self {
        Self {
            max_outer: 30,
            max_inner: 200,
            kkt_tolerance: 1e-4,
            constraint_tolerance: 1e-5,
            fd_step: 1e-7,
            mu0: 10.0,
            mu_growth: 10.0,
            mu_max: 1e8,
            armijo: 1e-4,
            min_step: 1e-12,
        }
    }
}

/// Multiplier state of the subproblem
struct Lagrangian {
    /// Objective scale (initial mass)
    scale: f64,
    lambda: Vec<f64>,
    mu: f64,
}

impl Lagrangian {
    /// f/scale + Σ ψ(c_i, λ_i, μ)
    fn value(&self, s: &Solution) -> f64 {
        let mut v = s.objective / self.scale;
        for (c, lambda) in s.constraints.vector.values().into_iter().zip(&self.lambda) {
            if c - lambda / self.mu <= 0.0 {
                v += -lambda * c + 0.5 * self.mu * c * c;
            } else {
                v += -lambda * lambda / (2.0 * self.mu);
            }
        }
        v
    }
}

/// Best point seen so far, ranked by violation beyond tolerance, then mass
struct Incumbent {
    u: Vec<f64>,
    solution: Solution,
    tolerance: f64,
}

impl Incumbent {
    fn new(u: &[f64], solution: &Solution, tolerance: f64) -> Self {
        Self {
            u: u.to_vec(),
            solution: solution.clone(),
            tolerance,
        }
    }

    fn excess(&self, s: &Solution) -> f64 {
        (s.constraints.vector.max_violation() - self.tolerance).max(0.0)
    }

    fn offer(&mut self, u: &[f64], s: &Solution) {
        let better = match (s.degraded(), self.solution.degraded()) {
            (false, true) => true,
            (true, false) => false,
            _ => {
                let (candidate, held) = (self.excess(s), self.excess(&self.solution));
                candidate < held || (candidate == held && s.objective < self.solution.objective)
            }
        };
        if better {
            self.u = u.to_vec();
            self.solution = s.clone();
        }
    }
}

impl AugmentedLagrangian {
    fn gradient(
        &self,
        problem: &Problem<'_>,
        lag: &Lagrangian,
        u: &[f64],
        v0: f64,
    ) -> SizingResult<Vec<f64>> {
        let steps: Vec<f64> = u
            .iter()
            .map(|x| if x + self.fd_step <= 1.0 { self.fd_step } else { -self.fd_step })
            .collect();
        let probes: Vec<Vec<f64>> = (0..u.len())
            .map(|j| {
                let mut p = u.to_vec();
                p[j] += steps[j];
                p
            })
            .collect();
        let solutions = problem.solve_batch(&probes)?;
        Ok(solutions
            .iter()
            .zip(&steps)
            .map(|(s, h)| (lag.value(s) - v0) / h)
            .collect())
    }

    /// Projected gradient with Armijo backtracking; returns the final
    /// point, its solution and the last stationarity measure
    fn subproblem(
        &self,
        problem: &Problem<'_>,
        lag: &Lagrangian,
        incumbent: &mut Incumbent,
        mut u: Vec<f64>,
        mut current: Solution,
    ) -> SizingResult<(Vec<f64>, Solution, f64)> {
        let mut v = lag.value(&current);
        let mut pg = f64::INFINITY;

        for _ in 0..self.max_inner {
            if problem.exhausted() {
                break;
            }
            let g = self.gradient(problem, lag, &u, v)?;
            pg = unit_cube::projected_gradient_norm(&u, &g);
            if pg < self.kkt_tolerance {
                break;
            }

            let mut t = 1.0;
            loop {
                let mut trial: Vec<f64> = u.iter().zip(&g).map(|(x, gi)| x - t * gi).collect();
                unit_cube::project(&mut trial);
                let s = problem.solve(&trial)?;
                let vt = lag.value(&s);
                let decrease: f64 =
                    g.iter().zip(&u).zip(&trial).map(|((gi, x), y)| gi * (x - y)).sum();
                if vt <= v - self.armijo * decrease || t < self.min_step {
                    u = trial;
                    v = vt;
                    current = s;
                    incumbent.offer(&u, &current);
                    break;
                }
                t *= 0.5;
            }
            problem.checkpoint(current.degraded())?;
        }
        Ok((u, current, pg))
    }
}

impl BoundedOptimizer for AugmentedLagrangian {
    fn name(&self) -> &'static str {
        "augmented lagrangian"
    }

    fn minimize(
        &self,
        problem: &Problem<'_>,
        x0: &DesignCoefficients,
    ) -> SizingResult<SearchResult> {
        let mut u = problem.to_unit(x0);
        let mut current = problem.solve(&u)?;
        problem.checkpoint(current.degraded())?;
        let mut incumbent = Incumbent::new(&u, &current, self.constraint_tolerance);
        let n_constraints = current.constraints.vector.len();

        let mut lag = Lagrangian {
            scale: current.objective.max(f64::MIN_POSITIVE),
            lambda: vec![0.0; n_constraints],
            mu: self.mu0,
        };
        let mut history = Vec::new();
        let mut prev_violation = f64::INFINITY;
        let mut converged = false;
        let mut outer = 0;

        while outer < self.max_outer && !problem.exhausted() {
            outer += 1;
            let (u_next, s, pg) = self.subproblem(problem, &lag, &mut incumbent, u, current)?;
            u = u_next;
            current = s;

            let margins = current.constraints.vector.values();
            let violation = current.constraints.vector.max_violation();
            for (lambda, c) in lag.lambda.iter_mut().zip(&margins) {
                *lambda = (*lambda - lag.mu * c).max(0.0);
            }

            history.push(HistoryEntry {
                iteration: outer,
                evaluations: problem.evaluations(),
                best_objective: current.objective,
                max_violation: violation,
            });
            log::info!(
                "AL outer {}: mass {:.3} kg, violation {:.2e}, ‖pg‖ {:.2e}, μ {:.0e}, {} evals",
                outer,
                current.objective,
                violation,
                pg,
                lag.mu,
                problem.evaluations()
            );

            if violation < self.constraint_tolerance && pg < 10.0 * self.kkt_tolerance {
                converged = true;
                break;
            }
            if violation > 0.25 * prev_violation {
                lag.mu = (lag.mu * self.mu_growth).min(self.mu_max);
            }
            prev_violation = violation;
        }

        // a run cut short hands back the best point it visited
        let (u, solution) = if converged {
            (u, current)
        } else {
            (incumbent.u, incumbent.solution)
        };
        Ok(SearchResult {
            u,
            solution,
            converged,
            iterations: outer,
            history,
        })
    }
}
