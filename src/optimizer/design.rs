//! # Design Point
//!
//! Complete sizing of a multirotor for one coefficient vector: propeller,
//! motor, battery, ESC and frame, sized for a given total mass.

use serde::{Deserialize, Serialize};

use crate::constants::PhysicalConstants;
use crate::coupling::LoopResolution;
use crate::optimizer::mission::MissionSpec;
use crate::optimizer::parameters::DesignCoefficients;
use crate::optimizer::scaling_laws::{
    battery_voltage_estimate, hollow_beam_diameter, hollow_beam_stress, ScalingLawLibrary,
};
use crate::error::SizingResult;

/// Propeller sizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropellerSizing {
    /// Thrust coefficient
    pub ct: f64,
    /// Power coefficient
    pub cp: f64,
    /// Diameter (m)
    pub diameter: f64,
    /// Pitch (m)
    pub pitch: f64,
    /// Mass (kg)
    pub mass: f64,
    /// Take-off rotational speed (Hz)
    pub speed_takeoff: f64,
    /// Hover rotational speed (Hz)
    pub speed_hover: f64,
    /// Take-off thrust (N)
    pub thrust_takeoff: f64,
    /// Hover thrust (N)
    pub thrust_hover: f64,
    /// Take-off mechanical power (W)
    pub power_takeoff: f64,
    /// Hover mechanical power (W)
    pub power_hover: f64,
    /// Take-off torque (N·m)
    pub torque_takeoff: f64,
    /// Hover torque (N·m)
    pub torque_hover: f64,
}

impl PropellerSizing {
    /// Take-off angular speed (rad/s)
    pub fn omega_takeoff(&self) -> f64 {
        crate::constants::TWO_PI * self.speed_takeoff
    }

    /// Hover angular speed (rad/s)
    pub fn omega_hover(&self) -> f64 {
        crate::constants::TWO_PI * self.speed_hover
    }

    /// Tip speed product n·D at take-off (Hz·m)
    pub fn nd_takeoff(&self) -> f64 {
        self.speed_takeoff * self.diameter
    }
}

/// Motor sizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorSizing {
    /// Nominal torque (N·m)
    pub nominal_torque: f64,
    /// Maximum torque (N·m)
    pub max_torque: f64,
    /// Mass (kg)
    pub mass: f64,
    /// Torque constant (N·m/A)
    pub torque_constant: f64,
    /// Winding resistance (Ω)
    pub resistance: f64,
    /// Friction torque (N·m)
    pub friction_torque: f64,
    /// Hover current (A)
    pub current_hover: f64,
    /// Hover voltage (V)
    pub voltage_hover: f64,
    /// Take-off current (A)
    pub current_takeoff: f64,
    /// Take-off voltage (V)
    pub voltage_takeoff: f64,
}

impl MotorSizing {
    /// Hover electrical power (W)
    pub fn power_hover(&self) -> f64 {
        self.voltage_hover * self.current_hover
    }

    /// Take-off electrical power (W)
    pub fn power_takeoff(&self) -> f64 {
        self.voltage_takeoff * self.current_takeoff
    }
}

/// Battery sizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatterySizing {
    /// Series cell count (continuous)
    pub cells: f64,
    /// Pack voltage (V)
    pub voltage: f64,
    /// Mass (kg)
    pub mass: f64,
    /// Stored energy (J)
    pub energy: f64,
    /// Capacity (A·s)
    pub capacity: f64,
    /// Maximum discharge current (A)
    pub max_current: f64,
    /// Hover current drawn by all motors (A)
    pub current_hover: f64,
    /// Hover time on usable energy (min)
    pub hover_time_min: f64,
}

impl BatterySizing {
    /// Cell count of a buildable pack
    pub fn cells_series(&self) -> u32 {
        self.cells.ceil().max(1.0) as u32
    }
}

/// ESC sizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscSizing {
    /// Corner power (W)
    pub power: f64,
    /// Mass (kg)
    pub mass: f64,
    /// Voltage rating (V)
    pub voltage: f64,
}

/// Frame sizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSizing {
    /// Arm length (m)
    pub arm_length: f64,
    /// Arm tube outer diameter (m)
    pub outer_diameter: f64,
    /// Arm tube inner diameter (m)
    pub inner_diameter: f64,
    /// Mass of all arms (kg)
    pub arm_mass: f64,
    /// Central body mass (kg)
    pub body_mass: f64,
    /// Allowable design stress (Pa)
    pub design_stress: f64,
    /// Maximum thrust the motors can deliver per propeller (N)
    pub max_thrust: f64,
    /// Arm root stress at maximum thrust (Pa)
    pub max_load_stress: f64,
}

/// Fully sized multirotor
///
/// A fresh value per evaluation; nothing mutates it after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignPoint {
    /// Coefficients after bounds enforcement
    pub coefficients: DesignCoefficients,
    /// Mass the components were sized for (kg)
    pub sizing_mass: f64,
    /// Sum of component masses (kg)
    pub total_mass: f64,
    pub propeller: PropellerSizing,
    pub motor: MotorSizing,
    pub battery: BatterySizing,
    pub esc: EscSizing,
    pub frame: FrameSizing,
    /// How the sizing mass was obtained
    pub resolution: LoopResolution,
}

impl DesignPoint {
    /// Sizes every component for a total mass of `sizing_mass`.
    ///
    /// One pass of the mass loop; `total_mass` of the result is the next
    /// iterate.
    pub fn size(
        laws: &ScalingLawLibrary,
        constants: &PhysicalConstants,
        mission: &MissionSpec,
        coefficients: &DesignCoefficients,
        sizing_mass: f64,
    ) -> SizingResult<Self> {
        let c = coefficients;
        let rho = constants.air_density;
        let g = constants.gravity;
        let n_pro = mission.architecture.propellers() as f64;
        let n_per_arm = mission.architecture.propellers_per_arm as f64;
        let n_arms = mission.architecture.arms as f64;

        // ========== PROPELLER ==========
        let thrust_hover = sizing_mass * g / n_pro;
        let thrust_takeoff = sizing_mass * (g + mission.takeoff_acceleration) / n_pro;

        let ct = laws.ct(c.beta())?;
        let cp = laws.cp(c.beta())?;
        let nd = constants.nd_max / c.k_nd();
        let diameter = (thrust_takeoff / (ct * rho * nd * nd)).sqrt();
        let speed_takeoff = nd / diameter;
        let propeller_mass = laws.propeller_mass.apply_named("propeller diameter", diameter)?;

        let power_takeoff = cp * rho * speed_takeoff.powi(3) * diameter.powi(5);
        let speed_hover = (thrust_hover / (ct * rho * diameter.powi(4))).sqrt();
        let power_hover = cp * rho * speed_hover.powi(3) * diameter.powi(5);

        let propeller = PropellerSizing {
            ct,
            cp,
            diameter,
            pitch: c.beta() * diameter,
            mass: propeller_mass,
            speed_takeoff,
            speed_hover,
            thrust_takeoff,
            thrust_hover,
            power_takeoff,
            power_hover,
            torque_takeoff: power_takeoff / (crate::constants::TWO_PI * speed_takeoff),
            torque_hover: power_hover / (crate::constants::TWO_PI * speed_hover),
        };
        let omega_to = propeller.omega_takeoff();
        let omega_hover = propeller.omega_hover();

        // ========== BATTERY VOLTAGE ==========
        let voltage = battery_voltage_estimate(c.k_vb(), power_takeoff)?;
        let cells = voltage / constants.cell_voltage;

        // ========== MOTOR ==========
        let nominal_torque = c.k_mot() * propeller.torque_hover;
        let motor_mass = laws.motor_mass.apply_named("motor torque", nominal_torque)?;
        let max_torque = laws.motor_max_torque.apply_named("motor torque", nominal_torque)?;
        // back-EMF at take-off speed times k_speed reaches the bus voltage
        let kt = voltage / (c.k_speed_mot() * omega_to);
        let resistance = laws.resistance(nominal_torque, kt)?;
        let friction_torque = laws.motor_friction.apply_named("motor torque", nominal_torque)?;

        let current_hover = (propeller.torque_hover + friction_torque) / kt;
        let voltage_hover = resistance * current_hover + omega_hover * kt;
        let current_takeoff = (propeller.torque_takeoff + friction_torque) / kt;
        let voltage_takeoff = resistance * current_takeoff + omega_to * kt;

        let motor = MotorSizing {
            nominal_torque,
            max_torque,
            mass: motor_mass,
            torque_constant: kt,
            resistance,
            friction_torque,
            current_hover,
            voltage_hover,
            current_takeoff,
            voltage_takeoff,
        };

        // ========== BATTERY ==========
        let battery_mass = c.k_mb() * mission.payload_mass;
        let energy = laws.battery_energy.apply_named("battery mass", battery_mass)?;
        let capacity = energy / voltage;
        let max_current = laws.battery_max_current.apply_named("battery capacity", capacity)?;
        let hover_power_total = motor.power_hover() * n_pro / constants.esc_efficiency;
        let usable_energy = constants.battery.depth_of_discharge * energy;

        let battery = BatterySizing {
            cells,
            voltage,
            mass: battery_mass,
            energy,
            capacity,
            max_current,
            current_hover: hover_power_total / voltage,
            hover_time_min: usable_energy / hover_power_total / 60.0,
        };

        // ========== ESC ==========
        let esc_power = motor.power_takeoff() * voltage / voltage_takeoff;
        let esc = EscSizing {
            power: esc_power,
            mass: laws.esc_mass.apply_named("ESC power", esc_power)?,
            voltage: laws.esc_voltage.apply_named("ESC power", esc_power)?,
        };

        // ========== FRAME ==========
        let arm_length = diameter / 2.0 / (mission.architecture.arm_separation() / 2.0).sin();
        let design_stress = constants.frame.design_stress();
        let outer_diameter = hollow_beam_diameter(
            thrust_takeoff * n_per_arm,
            arm_length,
            design_stress,
            c.k_d(),
        )?;
        let inner_diameter = c.k_d() * outer_diameter;
        let arm_mass = std::f64::consts::FRAC_PI_4
            * (outer_diameter.powi(2) - inner_diameter.powi(2))
            * arm_length
            * constants.frame.density
            * n_arms;
        let body_mass = laws.frame_mass.apply_named("arm mass", arm_mass)?;
        let max_thrust = thrust_takeoff * max_torque / propeller.torque_takeoff;
        let max_load_stress =
            hollow_beam_stress(max_thrust * n_per_arm, arm_length, outer_diameter, c.k_d());

        let frame = FrameSizing {
            arm_length,
            outer_diameter,
            inner_diameter,
            arm_mass,
            body_mass,
            design_stress,
            max_thrust,
            max_load_stress,
        };

        let total_mass = (esc.mass + propeller.mass + motor.mass) * n_pro
            + mission.payload_mass
            + battery.mass
            + frame.body_mass
            + frame.arm_mass;

        Ok(Self {
            coefficients: *coefficients,
            sizing_mass,
            total_mass,
            propeller,
            motor,
            battery,
            esc,
            frame,
            resolution: LoopResolution::fixed(sizing_mass),
        })
    }

    /// Attaches the loop record
    pub fn with_resolution(mut self, resolution: LoopResolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Whether the mass loop failed for this design
    pub fn degraded(&self) -> bool {
        !self.resolution.converged()
    }

    /// Mass of everything except the payload (kg)
    pub fn empty_mass(&self, mission: &MissionSpec) -> f64 {
        self.total_mass - mission.payload_mass
    }

    /// Mass breakdown by subsystem, in kg
    pub fn mass_breakdown(&self, mission: &MissionSpec) -> Vec<(&'static str, f64)> {
        let n_pro = mission.architecture.propellers() as f64;
        vec![
            ("payload", mission.payload_mass),
            ("battery", self.battery.mass),
            ("propellers", self.propeller.mass * n_pro),
            ("motors", self.motor.mass * n_pro),
            ("escs", self.esc.mass * n_pro),
            ("arms", self.frame.arm_mass),
            ("body", self.frame.body_mass),
        ]
    }
}
