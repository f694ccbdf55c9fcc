//! Synthetic client generation.
//!
//! Every round produces a fresh population of clients around the session's
//! true gradient direction. Clients carry no identity across rounds; only
//! the `data_distribution` coordinate encodes where a client sits in the
//! non-IID spread.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{SimConfig, TRIGGER_COORDS};
use crate::math::standard_normal;

/// Data-distribution coordinate shared by all malicious clients.
///
/// Models attacker collusion on similar data.
pub const COLLUSION_DISTRIBUTION: f32 = 0.9;

/// Multiplier converting attack strength into the trigger-coordinate pull.
pub const TRIGGER_PULL: f32 = 5.0;

/// Standard deviation of the stealth noise malicious clients add on
/// non-trigger coordinates to blend with benign statistics.
pub const STEALTH_NOISE: f32 = 0.5;

/// Gain applied to the non-IID Gaussian perturbation.
pub const DISPERSION_GAIN: f32 = 2.0;

/// Whether a client behaves honestly or carries the backdoor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientKind {
    /// Honest participant; gradient deviates only through non-IID spread.
    Benign,
    /// Backdoor attacker; pulls trigger coordinates, blends elsewhere.
    Malicious,
}

/// One simulated client within a single round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Positional id, unique within the round only.
    pub id: usize,
    /// Benign or malicious.
    pub kind: ClientKind,
    /// Non-IID positioning coordinate in `[0, 1]`.
    pub data_distribution: f32,
    /// Synthesized gradient update.
    pub gradient: Array1<f32>,
    /// Importance-weighted magnitude score (0 until the stiffness
    /// mechanism runs).
    pub stiffness_score: f32,
    /// Whether the round's detection pipeline accepted this update.
    pub accepted: bool,
}

impl Client {
    /// Whether this client is malicious.
    pub fn is_malicious(&self) -> bool {
        self.kind == ClientKind::Malicious
    }
}

/// Generate one round's client population.
///
/// The first `floor(N * ratio)` indices are malicious, the rest benign.
/// Benign clients spread evenly over `[0, 1)` as `i/N`; malicious clients
/// collude at [`COLLUSION_DISTRIBUTION`].
///
/// Gradient coordinate `j` starts from `reference[j]`, then:
/// - non-IID perturbation: Gaussian noise scaled by the level plus a
///   systematic `sin` bias keyed to the client's distribution coordinate;
/// - malicious, `j < 5`: flat `-strength * 5` trigger pull;
/// - malicious, `j >= 5`: small Gaussian stealth noise.
pub fn generate<R: Rng + ?Sized>(
    config: &SimConfig,
    reference: &Array1<f32>,
    rng: &mut R,
) -> Vec<Client> {
    let n = config.client_count;
    let n_malicious = config.malicious_count();
    let strength = config.attack_strength();
    let level = config.non_iid_level;

    (0..n)
        .map(|i| {
            let kind = if i < n_malicious {
                ClientKind::Malicious
            } else {
                ClientKind::Benign
            };
            let data_distribution = match kind {
                ClientKind::Malicious => COLLUSION_DISTRIBUTION,
                ClientKind::Benign => i as f32 / n as f32,
            };

            let gradient = Array1::from_iter((0..config.vector_dim).map(|j| {
                let mut value = reference[j]
                    + standard_normal(rng) * level * DISPERSION_GAIN
                    + (data_distribution * std::f32::consts::TAU + j as f32).sin() * level;
                if kind == ClientKind::Malicious {
                    if j < TRIGGER_COORDS {
                        value -= strength * TRIGGER_PULL;
                    } else {
                        value += standard_normal(rng) * STEALTH_NOISE;
                    }
                }
                value
            }));

            Client {
                id: i,
                kind,
                data_distribution,
                gradient,
                stiffness_score: 0.0,
                accepted: true,
            }
        })
        .collect()
}
