//! # Vanta-FL: Backdoor-Defense Round Simulator for Federated Learning
//!
//! Vanta simulates one federated-learning round at a time under
//! Byzantine/backdoor attack and screens every client update with
//! importance-weighted anomaly detection before it reaches the global
//! metrics.
//!
//! ## Detection Mechanisms
//!
//! - **Stiffness conflict** — importance-weighted gradient magnitude;
//!   flags tampering on security-sensitive coordinates
//! - **Importance-weighted clustering** — weighted distance to the true
//!   gradient direction; robust under high non-IID dispersion
//! - **Magnitude fallback** — the naive undefended baseline that stealthy
//!   attacks evade
//!
//! ## High-Level API
//!
//! Use [`Simulation`] to own a session: it validates a [`SimConfig`],
//! fixes the true gradient direction, and replaces its [`RoundState`]
//! atomically on every [`Simulation::advance`] call. Every stochastic
//! path runs on a seeded source, so identical seeds and configs produce
//! bit-identical round sequences.

#![deny(missing_docs)]

pub mod audit;
pub mod clients;
pub mod config;
pub mod detection;
pub mod engine;
pub mod error;
pub mod importance;
pub mod math;
pub mod metrics;

// Re-exports
pub use audit::{AuditLog, RoundAuditEntry};
pub use clients::{Client, ClientKind};
pub use config::SimConfig;
pub use detection::{Defense, DetectionEngine};
pub use engine::{RoundState, Simulation};
pub use error::SimError;
pub use metrics::MetricPoint;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
