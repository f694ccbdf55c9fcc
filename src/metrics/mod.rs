//! Acceptance statistics and global metric trajectories.
//!
//! Turns a round's accept/reject decisions into smoothed global accuracy
//! and backdoor attack-success-rate updates, and keeps the bounded metric
//! history the presentation layer plots.

use serde::{Deserialize, Serialize};

use crate::clients::Client;

/// Smoothing decay shared by the accuracy and ASR trajectories.
pub const SMOOTHING_DECAY: f32 = 0.8;

/// Accuracy reached when no malicious update is accepted.
pub const ACCURACY_CEILING: f32 = 0.95;

/// Accuracy lost per unit of attack impact.
pub const IMPACT_PENALTY: f32 = 0.5;

/// ASR target while contamination exceeds the threshold.
pub const ASR_TARGET: f32 = 0.9;

/// Attack-impact level above which the backdoor is considered planted.
pub const CONTAMINATION_THRESHOLD: f32 = 0.1;

/// Maximum number of retained history entries.
pub const HISTORY_CAP: usize = 50;

/// One point of the global metric trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Round the metrics were recorded for.
    pub round: u64,
    /// Smoothed global accuracy.
    pub accuracy: f32,
    /// Smoothed backdoor attack success rate.
    pub attack_success: f32,
}

/// Acceptance counts for one screened round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AcceptanceStats {
    /// Clients whose update was accepted.
    pub accepted: usize,
    /// Accepted clients that are malicious.
    pub malicious_accepted: usize,
    /// Clients whose update was rejected.
    pub rejected: usize,
    /// Rejected clients that are malicious.
    pub malicious_rejected: usize,
}

impl AcceptanceStats {
    /// Fraction of accepted updates that are malicious.
    ///
    /// The `max(accepted, 1)` divisor is the defined fallback for a round
    /// that rejects everyone, not an error path.
    pub fn attack_impact(&self) -> f32 {
        self.malicious_accepted as f32 / self.accepted.max(1) as f32
    }
}

/// Count acceptance outcomes over a screened population.
pub fn acceptance_stats(clients: &[Client]) -> AcceptanceStats {
    let mut stats = AcceptanceStats::default();
    for client in clients {
        if client.accepted {
            stats.accepted += 1;
            if client.is_malicious() {
                stats.malicious_accepted += 1;
            }
        } else {
            stats.rejected += 1;
            if client.is_malicious() {
                stats.malicious_rejected += 1;
            }
        }
    }
    stats
}

/// First-order exponential smoothing toward `target`.
pub fn smooth(previous: f32, target: f32) -> f32 {
    SMOOTHING_DECAY * previous + (1.0 - SMOOTHING_DECAY) * target
}

/// Accuracy target for a given attack impact.
pub fn accuracy_target(impact: f32) -> f32 {
    ACCURACY_CEILING - impact * IMPACT_PENALTY
}

/// ASR target: a step on whether contamination exceeds the threshold.
pub fn asr_target(impact: f32) -> f32 {
    if impact > CONTAMINATION_THRESHOLD {
        ASR_TARGET
    } else {
        0.0
    }
}

/// Append a point, dropping the oldest entries beyond [`HISTORY_CAP`].
pub fn push_bounded(history: &mut Vec<MetricPoint>, point: MetricPoint) {
    history.push(point);
    if history.len() > HISTORY_CAP {
        let excess = history.len() - HISTORY_CAP;
        history.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ClientKind;
    use ndarray::Array1;

    fn client(id: usize, kind: ClientKind, accepted: bool) -> Client {
        Client {
            id,
            kind,
            data_distribution: 0.5,
            gradient: Array1::zeros(5),
            stiffness_score: 0.0,
            accepted,
        }
    }

    #[test]
    fn test_acceptance_stats_counting() {
        let clients = vec![
            client(0, ClientKind::Malicious, true),
            client(1, ClientKind::Malicious, false),
            client(2, ClientKind::Benign, true),
            client(3, ClientKind::Benign, true),
            client(4, ClientKind::Benign, false),
        ];
        let stats = acceptance_stats(&clients);
        assert_eq!(stats.accepted, 3);
        assert_eq!(stats.malicious_accepted, 1);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.malicious_rejected, 1);
    }

    #[test]
    fn test_attack_impact() {
        let stats = AcceptanceStats {
            accepted: 10,
            malicious_accepted: 4,
            rejected: 0,
            malicious_rejected: 0,
        };
        assert!((stats.attack_impact() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_attack_impact_all_rejected_guard() {
        // Every client rejected: divisor falls back to 1, impact is 0.
        let stats = acceptance_stats(&[
            client(0, ClientKind::Malicious, false),
            client(1, ClientKind::Benign, false),
        ]);
        assert_eq!(stats.accepted, 0);
        assert_eq!(stats.attack_impact(), 0.0);
    }

    #[test]
    fn test_smoothing_formula() {
        assert!((smooth(0.5, 1.0) - 0.6).abs() < 1e-6);
        assert!((smooth(1.0, 0.0) - 0.8).abs() < 1e-6);
        // Fixed point: smoothing toward the current value is a no-op.
        assert!((smooth(0.7, 0.7) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_accuracy_target() {
        assert!((accuracy_target(0.0) - 0.95).abs() < 1e-6);
        assert!((accuracy_target(0.2) - 0.85).abs() < 1e-6);
        assert!((accuracy_target(1.0) - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_asr_target_step() {
        assert_eq!(asr_target(0.0), 0.0);
        assert_eq!(asr_target(0.1), 0.0); // at the threshold, not above it
        assert_eq!(asr_target(0.11), ASR_TARGET);
        assert_eq!(asr_target(1.0), ASR_TARGET);
    }

    #[test]
    fn test_push_bounded_caps_history() {
        let mut history = Vec::new();
        for round in 1..=120 {
            push_bounded(
                &mut history,
                MetricPoint {
                    round,
                    accuracy: 0.5,
                    attack_success: 0.0,
                },
            );
        }
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history[0].round, 71);
        assert_eq!(history[HISTORY_CAP - 1].round, 120);
        // Entries stay in increasing round order.
        for pair in history.windows(2) {
            assert!(pair[0].round < pair[1].round);
        }
    }

    #[test]
    fn test_metric_point_serde_roundtrip() {
        let point = MetricPoint {
            round: 7,
            accuracy: 0.83,
            attack_success: 0.12,
        };
        let json = serde_json::to_string(&point).unwrap();
        let restored: MetricPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, point);
    }
}
