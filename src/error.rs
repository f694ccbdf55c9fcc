//! Error types for Vanta-FL

use thiserror::Error;

/// All possible errors in Vanta-FL
#[derive(Error, Debug)]
pub enum SimError {
    /// Non-IID level is outside the documented range
    #[error("Invalid non-IID level: {0} (must be 0.0-2.0)")]
    InvalidNonIidLevel(f32),

    /// Attack stealth is outside the documented range
    #[error("Invalid attack stealth: {0} (must be 0.0-0.9)")]
    InvalidStealth(f32),

    /// Malicious ratio is outside the documented range
    #[error("Invalid malicious ratio: {0} (must be 0.0-1.0)")]
    InvalidMaliciousRatio(f32),

    /// A round needs at least one client
    #[error("Client count must be at least 1")]
    NoClients,

    /// Gradient dimension is below the trigger-coordinate count
    #[error("Vector dimension {0} is below the minimum of 5 trigger coordinates")]
    DimensionTooSmall(usize),

    /// Configured dimension no longer matches the session's reference vector
    #[error("Config dimension {config} does not match session dimension {session}")]
    DimensionMismatch {
        /// Dimension requested by the configuration
        config: usize,
        /// Dimension of the session's true-direction vector
        session: usize,
    },
}
