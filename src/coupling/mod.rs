//! # Mass-Thrust Coupling
//!
//! The component masses depend on the thrust they must deliver, and the
//! thrust depends on the total mass. This module closes that loop.
//!
//! ```text
//!   total mass ──► thrust per propeller ──► propeller / motor / ESC sizing
//!        ▲                                              │
//!        └──────────── Σ component masses ◄─────────────┘
//! ```
//!
//! ## References
//!
//! - Küttler & Wall, "Fixed-point fluid-structure interaction solvers" (2008)
//! - Budinger et al., "Scaling-law-based metamodels for the sizing of
//!   mechatronic systems" (2014)

pub mod fixed_point;

pub use fixed_point::{LoopConfig, LoopResolution, LoopResolver, LoopStatus};
