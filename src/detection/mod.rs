//! Anomaly-detection pipeline for client updates.
//!
//! Two independently toggleable mechanisms plus a naive fallback, evaluated
//! in a fixed order per client; the first rejection wins and a client is
//! never un-rejected:
//!
//! 1. **Stiffness conflict** — importance-weighted mean absolute gradient
//!    magnitude. Large magnitude on sensitive coordinates is the backdoor's
//!    fingerprint.
//! 2. **Importance-weighted clustering** — weighted squared distance to the
//!    true direction. Weighting suppresses noisy low-importance coordinates
//!    that dominate under high non-IID.
//! 3. **Plain magnitude fallback** — only when both mechanisms are off;
//!    models the undefended baseline that stealthy attacks evade.
//!
//! The clustering threshold keeps its `(1 + nonIIDLevel)` scaling whether
//! or not importance weighting is active; the asymmetry is intentional and
//! preserved for behavioral parity with the modeled system.

use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::clients::Client;
use crate::config::SimConfig;
use crate::math::magnitude;

/// Stiffness rejection base when the momentum FIM is enabled.
pub const STIFFNESS_BASE_FILTERED: f32 = 12.0;

/// Stiffness rejection base when the importance vector is unfiltered.
///
/// Higher than the filtered base: without momentum filtering the
/// importance estimate is noisier, so the bar rises to avoid false
/// positives.
pub const STIFFNESS_BASE_UNFILTERED: f32 = 15.0;

/// Clustering-distance rejection base.
pub const CLUSTERING_BASE: f32 = 500.0;

/// Magnitude bound of the undefended fallback check.
pub const MAGNITUDE_BOUND: f32 = 25.0;

/// A toggleable detection mechanism, in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Defense {
    /// Importance-weighted gradient-magnitude screen.
    StiffnessConflict,
    /// Importance-weighted distance-to-reference screen.
    WeightedClustering,
}

impl Defense {
    /// Stable label for audit entries.
    pub fn label(&self) -> &'static str {
        match self {
            Defense::StiffnessConflict => "stiffness_conflict",
            Defense::WeightedClustering => "weighted_clustering",
        }
    }
}

/// Outcome of screening one client.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Screening {
    /// Stiffness score, 0 when the stiffness mechanism never ran.
    pub stiffness_score: f32,
    /// Whether the update survived every evaluated mechanism.
    pub accepted: bool,
}

/// Per-round detection engine.
///
/// Built after the round's importance vector is final; holds the ordered
/// list of active defenses so call sites never branch on toggles.
pub struct DetectionEngine<'a> {
    importance: &'a Array1<f32>,
    reference: &'a Array1<f32>,
    config: &'a SimConfig,
    defenses: Vec<Defense>,
}

impl<'a> DetectionEngine<'a> {
    /// Assemble the pipeline for this round's importance vector and config.
    pub fn new(
        importance: &'a Array1<f32>,
        reference: &'a Array1<f32>,
        config: &'a SimConfig,
    ) -> Self {
        let mut defenses = Vec::with_capacity(2);
        if config.stiffness_mask {
            defenses.push(Defense::StiffnessConflict);
        }
        if config.layer_weighted_clustering {
            defenses.push(Defense::WeightedClustering);
        }
        Self {
            importance,
            reference,
            config,
            defenses,
        }
    }

    /// Active defenses in evaluation order.
    pub fn defenses(&self) -> &[Defense] {
        &self.defenses
    }

    /// Labels of the active defenses, or the fallback's label when none.
    pub fn defense_labels(&self) -> Vec<String> {
        if self.defenses.is_empty() {
            vec!["magnitude_fallback".to_string()]
        } else {
            self.defenses.iter().map(|d| d.label().to_string()).collect()
        }
    }

    /// Stiffness rejection threshold for the current config.
    pub fn stiffness_threshold(&self) -> f32 {
        let base = if self.config.momentum_fim {
            STIFFNESS_BASE_FILTERED
        } else {
            STIFFNESS_BASE_UNFILTERED
        };
        base * (1.0 + self.config.non_iid_level)
    }

    /// Clustering-distance rejection threshold for the current config.
    pub fn clustering_threshold(&self) -> f32 {
        CLUSTERING_BASE * (1.0 + self.config.non_iid_level)
    }

    /// Importance-weighted mean absolute gradient magnitude.
    fn stiffness_score(&self, gradient: &Array1<f32>) -> f32 {
        let weighted: f32 = self
            .importance
            .iter()
            .zip(gradient.iter())
            .map(|(w, g)| w * g.abs())
            .sum();
        weighted / gradient.len() as f32
    }

    /// Importance-weighted squared distance to the reference direction.
    fn weighted_distance(&self, gradient: &Array1<f32>) -> f32 {
        self.importance
            .iter()
            .zip(gradient.iter().zip(self.reference.iter()))
            .map(|(w, (g, t))| w * (g - t) * (g - t))
            .sum()
    }

    /// Screen one gradient through the pipeline.
    pub fn screen(&self, gradient: &Array1<f32>) -> Screening {
        let mut stiffness_score = 0.0;
        let mut accepted = true;

        for defense in &self.defenses {
            match defense {
                Defense::StiffnessConflict => {
                    stiffness_score = self.stiffness_score(gradient);
                    if stiffness_score > self.stiffness_threshold() {
                        accepted = false;
                    }
                }
                Defense::WeightedClustering => {
                    if self.weighted_distance(gradient) > self.clustering_threshold() {
                        accepted = false;
                    }
                }
            }
            if !accepted {
                break;
            }
        }

        if self.defenses.is_empty() && magnitude(gradient) > MAGNITUDE_BOUND {
            accepted = false;
        }

        Screening {
            stiffness_score,
            accepted,
        }
    }

    /// Screen every client in place.
    ///
    /// Clients do not interact, so screening parallelizes without changing
    /// results.
    pub fn screen_all(&self, clients: &mut [Client]) {
        clients.par_iter_mut().for_each(|client| {
            let screening = self.screen(&client.gradient);
            client.stiffness_score = screening.stiffness_score;
            client.accepted = screening.accepted;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ClientKind;
    use ndarray::Array1;

    fn config(stiffness: bool, clustering: bool) -> SimConfig {
        SimConfig {
            stiffness_mask: stiffness,
            layer_weighted_clustering: clustering,
            non_iid_level: 0.0,
            ..SimConfig::default()
        }
    }

    fn flat_importance(dim: usize, value: f32) -> Array1<f32> {
        Array1::from_elem(dim, value)
    }

    #[test]
    fn test_stiffness_rejects_large_weighted_magnitude() {
        // importance 10 everywhere, |g| = 2 everywhere -> score = 20 > 12
        let importance = flat_importance(20, 10.0);
        let reference = Array1::zeros(20);
        let config = config(true, false);
        let engine = DetectionEngine::new(&importance, &reference, &config);

        let gradient = Array1::from_elem(20, 2.0);
        let screening = engine.screen(&gradient);
        assert!(!screening.accepted);
        assert!((screening.stiffness_score - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_stiffness_accepts_below_threshold() {
        let importance = flat_importance(20, 1.0);
        let reference = Array1::zeros(20);
        let config = config(true, false);
        let engine = DetectionEngine::new(&importance, &reference, &config);

        // score = 2.0, threshold = 12
        let gradient = Array1::from_elem(20, 2.0);
        let screening = engine.screen(&gradient);
        assert!(screening.accepted);
        assert!((screening.stiffness_score - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_stiffness_threshold_depends_on_momentum() {
        let importance = flat_importance(20, 1.0);
        let reference = Array1::zeros(20);

        let filtered = SimConfig {
            momentum_fim: true,
            non_iid_level: 0.5,
            ..SimConfig::default()
        };
        let unfiltered = SimConfig {
            momentum_fim: false,
            non_iid_level: 0.5,
            ..SimConfig::default()
        };

        let engine = DetectionEngine::new(&importance, &reference, &filtered);
        assert!((engine.stiffness_threshold() - 18.0).abs() < 1e-5);

        let engine = DetectionEngine::new(&importance, &reference, &unfiltered);
        assert!((engine.stiffness_threshold() - 22.5).abs() < 1e-5);
    }

    #[test]
    fn test_clustering_rejects_distant_gradient() {
        let importance = flat_importance(20, 10.0);
        let reference = Array1::zeros(20);
        let config = config(false, true);
        let engine = DetectionEngine::new(&importance, &reference, &config);

        // dist = 20 * 10 * 4 = 800 > 500
        let far = Array1::from_elem(20, 2.0);
        assert!(!engine.screen(&far).accepted);

        // dist = 20 * 10 * 1 = 200 < 500
        let near = Array1::from_elem(20, 1.0);
        assert!(engine.screen(&near).accepted);
    }

    #[test]
    fn test_clustering_threshold_scales_with_non_iid() {
        let importance = flat_importance(20, 1.0);
        let reference = Array1::zeros(20);
        let config = SimConfig {
            non_iid_level: 1.0,
            ..SimConfig::default()
        };
        let engine = DetectionEngine::new(&importance, &reference, &config);
        assert!((engine.clustering_threshold() - 1000.0).abs() < 1e-4);
    }

    #[test]
    fn test_stiffness_evaluated_before_clustering() {
        // Gradient that trips both mechanisms: the recorded stiffness score
        // proves mechanism order (clustering alone would leave it at 0).
        let importance = flat_importance(20, 10.0);
        let reference = Array1::zeros(20);
        let config = config(true, true);
        let engine = DetectionEngine::new(&importance, &reference, &config);

        let gradient = Array1::from_elem(20, 5.0);
        let screening = engine.screen(&gradient);
        assert!(!screening.accepted);
        assert!(
            screening.stiffness_score > 0.0,
            "Stiffness must run first and record its score"
        );
    }

    #[test]
    fn test_score_zero_when_stiffness_disabled() {
        let importance = flat_importance(20, 10.0);
        let reference = Array1::zeros(20);
        let config = config(false, true);
        let engine = DetectionEngine::new(&importance, &reference, &config);

        let gradient = Array1::from_elem(20, 5.0);
        let screening = engine.screen(&gradient);
        assert_eq!(screening.stiffness_score, 0.0);
    }

    #[test]
    fn test_fallback_magnitude_bound() {
        let importance = flat_importance(20, 1.0);
        let reference = Array1::zeros(20);
        let config = config(false, false);
        let engine = DetectionEngine::new(&importance, &reference, &config);
        assert!(engine.defenses().is_empty());

        // |g| = sqrt(20 * 36) = 26.8 > 25
        let big = Array1::from_elem(20, 6.0);
        assert!(!engine.screen(&big).accepted);

        // |g| = sqrt(20 * 25) = 22.4 < 25
        let small = Array1::from_elem(20, 5.0);
        assert!(engine.screen(&small).accepted);
    }

    #[test]
    fn test_fallback_skipped_when_any_defense_active() {
        // Magnitude 26.8 would trip the fallback, but clustering is active
        // and the gradient sits on the reference, so it passes.
        let importance = flat_importance(20, 1.0);
        let reference = Array1::from_elem(20, 6.0);
        let config = config(false, true);
        let engine = DetectionEngine::new(&importance, &reference, &config);

        let gradient = Array1::from_elem(20, 6.0);
        assert!(engine.screen(&gradient).accepted);
    }

    #[test]
    fn test_defense_labels() {
        let importance = flat_importance(20, 1.0);
        let reference = Array1::zeros(20);

        let both = config(true, true);
        let engine = DetectionEngine::new(&importance, &reference, &both);
        assert_eq!(
            engine.defense_labels(),
            vec!["stiffness_conflict", "weighted_clustering"]
        );

        let none = config(false, false);
        let engine = DetectionEngine::new(&importance, &reference, &none);
        assert_eq!(engine.defense_labels(), vec!["magnitude_fallback"]);
    }

    #[test]
    fn test_screen_all_matches_screen() {
        let importance = flat_importance(20, 10.0);
        let reference = Array1::zeros(20);
        let config = config(true, true);
        let engine = DetectionEngine::new(&importance, &reference, &config);

        let mut clients: Vec<Client> = (0..8)
            .map(|i| Client {
                id: i,
                kind: ClientKind::Benign,
                data_distribution: i as f32 / 8.0,
                gradient: Array1::from_elem(20, i as f32),
                stiffness_score: 0.0,
                accepted: true,
            })
            .collect();

        let expected: Vec<Screening> =
            clients.iter().map(|c| engine.screen(&c.gradient)).collect();

        engine.screen_all(&mut clients);

        for (client, screening) in clients.iter().zip(expected.iter()) {
            assert_eq!(client.accepted, screening.accepted);
            assert_eq!(client.stiffness_score, screening.stiffness_score);
        }
    }
}
