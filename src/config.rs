//! Simulation configuration.
//!
//! All knobs the external control layer can turn between rounds. Values
//! outside their documented ranges are rejected by [`SimConfig::validate`]
//! rather than clamped, so every round runs under auditable assumptions.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Number of leading gradient coordinates treated as the trigger/high-importance set.
pub const TRIGGER_COORDS: usize = 5;

/// Ceiling of the stealth-to-strength conversion: `strength = 1.5 - stealth`.
pub const STRENGTH_CEILING: f32 = 1.5;

/// Configuration read before each round.
///
/// Toggles select which defenses run; numeric fields shape client
/// generation. The config may change between rounds, but its
/// `vector_dim` must keep matching the session it is used with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Update the importance vector by momentum EMA each round.
    pub momentum_fim: bool,
    /// Enable the stiffness-conflict detection mechanism.
    pub stiffness_mask: bool,
    /// Enable the importance-weighted clustering mechanism.
    pub layer_weighted_clustering: bool,
    /// Non-IID data heterogeneity level, in `[0.0, 2.0]`.
    pub non_iid_level: f32,
    /// Attack stealth, in `[0.0, 0.9]`. Higher stealth means a smaller
    /// trigger-coordinate perturbation.
    pub attack_stealth: f32,
    /// Number of clients generated per round (at least 1).
    pub client_count: usize,
    /// Fraction of clients that are malicious, in `[0.0, 1.0]`.
    pub malicious_ratio: f32,
    /// Gradient dimension (at least [`TRIGGER_COORDS`]).
    pub vector_dim: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            momentum_fim: true,
            stiffness_mask: true,
            layer_weighted_clustering: true,
            non_iid_level: 0.5,
            attack_stealth: 0.5,
            client_count: 20,
            malicious_ratio: 0.2,
            vector_dim: 20,
        }
    }
}

impl SimConfig {
    /// Check every field against its documented range.
    ///
    /// Called at session creation and before every round so that invalid
    /// configuration fails fast, before any state is touched.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(0.0..=2.0).contains(&self.non_iid_level) {
            return Err(SimError::InvalidNonIidLevel(self.non_iid_level));
        }
        if !(0.0..=0.9).contains(&self.attack_stealth) {
            return Err(SimError::InvalidStealth(self.attack_stealth));
        }
        if !(0.0..=1.0).contains(&self.malicious_ratio) {
            return Err(SimError::InvalidMaliciousRatio(self.malicious_ratio));
        }
        if self.client_count == 0 {
            return Err(SimError::NoClients);
        }
        if self.vector_dim < TRIGGER_COORDS {
            return Err(SimError::DimensionTooSmall(self.vector_dim));
        }
        Ok(())
    }

    /// Attack strength derived from stealth: `1.5 - stealth`.
    ///
    /// Applied as a flat offset on trigger coordinates; kept verbatim from
    /// the modeled system rather than reinterpreted as a probability.
    pub fn attack_strength(&self) -> f32 {
        STRENGTH_CEILING - self.attack_stealth
    }

    /// Number of malicious clients for this config: `floor(N * ratio)`.
    pub fn malicious_count(&self) -> usize {
        (self.client_count as f32 * self.malicious_ratio).floor() as usize
    }
}
