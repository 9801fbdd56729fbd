//! # Report Generation
//!
//! Structured design reports and the sinks that consume them. Formatting
//! and storage stay behind the [`Reporter`] trait; the model only hands
//! over computed quantities.

use std::io::Write;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::SizingResult;
use crate::optimizer::constraints::ConstraintResult;
use crate::optimizer::design::DesignPoint;
use crate::optimizer::driver::OptimizationOutcome;
use crate::optimizer::mission::MissionSpec;
use crate::optimizer::model::Solution;
use crate::optimizer::parameters::CoefficientSpace;

/// Everything computed for one design, ready for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignReport {
    pub mission: MissionSpec,
    pub design: DesignPoint,
    pub constraints: ConstraintResult,
    /// Total mass (kg)
    pub objective: f64,
    /// Total mass with penalty (kg)
    pub penalized_objective: f64,
    /// Mass loop did not converge
    pub degraded: bool,
}

impl DesignReport {
    pub fn from_solution(solution: &Solution, mission: &MissionSpec) -> Self {
        Self {
            mission: *mission,
            design: solution.design.clone(),
            constraints: solution.constraints.clone(),
            objective: solution.objective,
            penalized_objective: solution.penalized_objective,
            degraded: solution.degraded(),
        }
    }

    pub fn total_mass(&self) -> f64 {
        self.design.total_mass
    }

    pub fn feasible(&self) -> bool {
        self.constraints.feasible
    }

    pub fn to_json(&self) -> SizingResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Consumer of design reports
pub trait Reporter: Send + Sync {
    fn emit(&self, report: &DesignReport) -> SizingResult<()>;
}

/// Writes the formatted text report to a stream
pub struct TextReporter<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl TextReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> Reporter for TextReporter<W> {
    fn emit(&self, report: &DesignReport) -> SizingResult<()> {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        out.write_all(ReportGenerator::full_report(report).as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

/// Emits a one-line summary per report through `log`
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn emit(&self, report: &DesignReport) -> SizingResult<()> {
        log::info!(
            "design: {:.2} kg, feasible={}, min margin={:+.4}, loop iterations={}",
            report.total_mass(),
            report.feasible(),
            report.constraints.vector.min_margin(),
            report.design.resolution.iterations
        );
        for v in &report.constraints.violations {
            log::warn!("  violated {}: {:+.4}", v.kind.label(), v.margin);
        }
        Ok(())
    }
}

/// Keeps every report in memory
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reports: Mutex<Vec<DesignReport>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<DesignReport> {
        self.reports.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Reporter for CollectingReporter {
    fn emit(&self, report: &DesignReport) -> SizingResult<()> {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(report.clone());
        Ok(())
    }
}

/// Text report generator
pub struct ReportGenerator;

impl ReportGenerator {
    /// Full report of a design
    pub fn full_report(report: &DesignReport) -> String {
        let mut out = String::new();

        out.push_str(&Self::header(report));
        out.push_str(&Self::mission_section(&report.mission));
        out.push_str(&Self::coefficients_section(report));
        out.push_str(&Self::propeller_section(&report.design));
        out.push_str(&Self::motor_section(&report.design));
        out.push_str(&Self::battery_section(&report.design));
        out.push_str(&Self::esc_section(&report.design));
        out.push_str(&Self::frame_section(&report.design));
        out.push_str(&Self::mass_breakdown(report));
        out.push_str(&Self::constraint_analysis(&report.constraints));

        out
    }

    fn header(report: &DesignReport) -> String {
        format!(
            r#"
================================================================================
                    ROTORSIZE-RS MULTIROTOR DESIGN REPORT
================================================================================
Total mass:   {:.2} kg
Feasible:     {}
Mass loop:    {} after {} iterations
================================================================================

"#,
            report.total_mass(),
            if report.feasible() { "YES" } else { "NO" },
            if report.degraded { "DIVERGED" } else { "converged" },
            report.design.resolution.iterations
        )
    }

    fn mission_section(mission: &MissionSpec) -> String {
        format!(
            r#"MISSION
-------
  Payload:               {:.2} kg
  Hover autonomy:        {:.1} min
  Take-off acceleration: {:.2} m/s²
  MTOW:                  {:.1} kg
  Architecture:          {} arms × {} propellers

"#,
            mission.payload_mass,
            mission.autonomy_min,
            mission.takeoff_acceleration,
            mission.mtow,
            mission.architecture.arms,
            mission.architecture.propellers_per_arm
        )
    }

    fn coefficients_section(report: &DesignReport) -> String {
        let space = CoefficientSpace::multirotor();
        let mut section = String::from("DESIGN COEFFICIENTS\n-------------------\n");
        for (p, v) in space.parameters.iter().zip(report.design.coefficients.as_slice()) {
            section.push_str(&format!("  {:<22} {:>10.4}\n", p.symbol, v));
        }
        section.push('\n');
        section
    }

    fn propeller_section(d: &DesignPoint) -> String {
        let p = &d.propeller;
        format!(
            r#"PROPELLER
---------
  Diameter:              {:.3} m ({:.1} in)
  Pitch:                 {:.3} m
  C_T / C_P:             {:.4} / {:.4}
  Speed (hover / t-o):   {:.0} / {:.0} RPM
  Thrust (hover / t-o):  {:.1} / {:.1} N
  Power (hover / t-o):   {:.0} / {:.0} W
  Mass:                  {:.3} kg

"#,
            p.diameter,
            p.diameter / crate::constants::INCH,
            p.pitch,
            p.ct,
            p.cp,
            p.speed_hover * 60.0,
            p.speed_takeoff * 60.0,
            p.thrust_hover,
            p.thrust_takeoff,
            p.power_hover,
            p.power_takeoff,
            p.mass
        )
    }

    fn motor_section(d: &DesignPoint) -> String {
        let m = &d.motor;
        format!(
            r#"MOTOR
-----
  Nominal / max torque:  {:.2} / {:.2} N·m
  Torque constant:       {:.4} N·m/A
  Resistance:            {:.4} Ω
  Hover:                 {:.1} A at {:.1} V
  Take-off:              {:.1} A at {:.1} V
  Mass:                  {:.3} kg

"#,
            m.nominal_torque,
            m.max_torque,
            m.torque_constant,
            m.resistance,
            m.current_hover,
            m.voltage_hover,
            m.current_takeoff,
            m.voltage_takeoff,
            m.mass
        )
    }

    fn battery_section(d: &DesignPoint) -> String {
        let b = &d.battery;
        format!(
            r#"BATTERY
-------
  Voltage:               {:.1} V ({}S)
  Energy:                {:.0} Wh
  Capacity:              {:.1} Ah
  Max current:           {:.0} A
  Hover current:         {:.0} A
  Hover time:            {:.1} min
  Mass:                  {:.2} kg

"#,
            b.voltage,
            b.cells_series(),
            b.energy / 3600.0,
            b.capacity / 3600.0,
            b.max_current,
            b.current_hover,
            b.hover_time_min,
            b.mass
        )
    }

    fn esc_section(d: &DesignPoint) -> String {
        format!(
            r#"ESC
---
  Power:                 {:.0} W
  Voltage rating:        {:.1} V
  Mass:                  {:.3} kg

"#,
            d.esc.power, d.esc.voltage, d.esc.mass
        )
    }

    fn frame_section(d: &DesignPoint) -> String {
        let f = &d.frame;
        format!(
            r#"FRAME
-----
  Arm length:            {:.3} m
  Arm tube (out / in):   {:.1} / {:.1} mm
  Stress at max thrust:  {:.1} MPa (design {:.1} MPa)
  Arms / body mass:      {:.2} / {:.2} kg

"#,
            f.arm_length,
            f.outer_diameter * 1e3,
            f.inner_diameter * 1e3,
            f.max_load_stress / 1e6,
            f.design_stress / 1e6,
            f.arm_mass,
            f.body_mass
        )
    }

    fn mass_breakdown(report: &DesignReport) -> String {
        let total = report.total_mass();
        let mut section = String::from("MASS BREAKDOWN\n--------------\n");
        for (name, mass) in report.design.mass_breakdown(&report.mission) {
            section.push_str(&format!(
                "  {:<22} {:>10.2} kg  {:>5.1}%\n",
                name,
                mass,
                100.0 * mass / total
            ));
        }
        section.push_str(&format!("  {:<22} {:>10.2} kg\n\n", "total", total));
        section
    }

    fn constraint_analysis(result: &ConstraintResult) -> String {
        let mut section = String::from(
            r#"CONSTRAINT ANALYSIS
-------------------
"#,
        );

        section.push_str("  Margins:\n");
        for (kind, margin) in &result.vector.margins {
            let status = if *margin > 0.2 {
                "OK"
            } else if *margin >= 0.0 {
                "MARGINAL"
            } else {
                "VIOLATED"
            };
            section.push_str(&format!(
                "    {:<20} {:>7.1}%  [{}]\n",
                kind.label(),
                margin * 100.0,
                status
            ));
        }

        if !result.warnings.is_empty() {
            section.push_str("\n  Warnings:\n");
            for w in &result.warnings {
                section.push_str(&format!(
                    "    - {} close to limit ({:+.2}%)\n",
                    w.kind.label(),
                    w.margin * 100.0
                ));
            }
        }

        section.push('\n');
        section
    }

    /// Summary of an optimization run
    pub fn optimization_summary(outcome: &OptimizationOutcome) -> String {
        let mut out = format!(
            r#"================================================================================
                         OPTIMIZATION SUMMARY
================================================================================
Strategy:             {:?}
Status:               {:?}
Best total mass:      {:.3} kg
Max violation:        {:.2e}
Iterations:           {}
Evaluations:          {} ({} degraded)
"#,
            outcome.strategy,
            outcome.status,
            outcome.objective,
            outcome.constraints.max_violation(),
            outcome.iterations,
            outcome.evaluations,
            outcome.degraded_evaluations
        );

        let space = CoefficientSpace::multirotor();
        out.push_str("\nBest coefficients:\n");
        for (p, v) in space.parameters.iter().zip(outcome.coefficients.as_slice()) {
            out.push_str(&format!("  {:<12} {:>10.4}\n", p.symbol, v));
        }
        out.push_str(&"=".repeat(80));
        out.push('\n');
        out
    }
}

/// Exporter to machine-readable formats
pub struct ReportExporter;

impl ReportExporter {
    /// Convergence history as CSV
    pub fn history_csv(outcome: &OptimizationOutcome) -> String {
        let mut csv = String::from("iteration,evaluations,best_objective,max_violation\n");
        for h in &outcome.history {
            csv.push_str(&format!(
                "{},{},{:.6},{:.3e}\n",
                h.iteration, h.evaluations, h.best_objective, h.max_violation
            ));
        }
        csv
    }

    /// Whole outcome as pretty JSON
    pub fn outcome_json(outcome: &OptimizationOutcome) -> SizingResult<String> {
        Ok(serde_json::to_string_pretty(outcome)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::driver::{DriverConfig, OptimizationDriver};
    use crate::optimizer::model::{Evaluator, SizingModel};
    use crate::optimizer::parameters::DesignCoefficients;

    fn scenario_report() -> DesignReport {
        let model = SizingModel::new(MissionSpec::default()).unwrap();
        let c = DesignCoefficients::new([0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.01]);
        model.report(&c).unwrap()
    }

    #[test]
    fn test_full_report_sections() {
        let text = ReportGenerator::full_report(&scenario_report());
        let sections = [
            "MISSION",
            "PROPELLER",
            "MOTOR",
            "BATTERY",
            "ESC",
            "FRAME",
            "MASS BREAKDOWN",
            "CONSTRAINT ANALYSIS",
        ];
        for section in sections {
            assert!(text.contains(section), "missing {}", section);
        }
        assert!(text.contains("Feasible:     NO"));
        assert!(text.contains("VIOLATED"));
    }

    #[test]
    fn test_text_reporter_writes() {
        let reporter = TextReporter::new(Vec::new());
        reporter.emit(&scenario_report()).unwrap();
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(out.contains("ROTORSIZE-RS MULTIROTOR DESIGN REPORT"));
    }

    #[test]
    fn test_report_json() {
        let report = scenario_report();
        let json = report.to_json().unwrap();
        let back: DesignReport = serde_json::from_str(&json).unwrap();
        // float_roundtrip: every mass and margin reads back bit-exact
        assert_eq!(back, report);
        assert_eq!(back.constraints.vector.len(), 8);
    }

    #[test]
    fn test_collecting_and_log_reporters() {
        let report = scenario_report();
        let collector = CollectingReporter::new();
        assert!(collector.is_empty());
        collector.emit(&report).unwrap();
        LogReporter.emit(&report).unwrap();
        assert_eq!(collector.reports()[0].total_mass(), report.total_mass());
    }

    #[test]
    fn test_outcome_exports() {
        let model = SizingModel::new(MissionSpec::default()).unwrap();
        let x0 = model.space().defaults();
        let config = DriverConfig {
            max_evaluations: Some(30),
            ..Default::default()
        };
        let outcome = OptimizationDriver::new(&model, config).run(&x0).unwrap();

        let csv = ReportExporter::history_csv(&outcome);
        assert!(csv.starts_with("iteration,evaluations,best_objective,max_violation\n"));
        assert_eq!(csv.lines().count(), outcome.history.len() + 1);

        let summary = ReportGenerator::optimization_summary(&outcome);
        assert!(summary.contains("OPTIMIZATION SUMMARY"));
        assert!(summary.contains("k_mot"));

        let json = ReportExporter::outcome_json(&outcome).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["strategy"], "gradient");
        assert_eq!(value["coefficients"].as_array().unwrap().len(), 8);
    }
}
