//! Round-transition engine.
//!
//! [`RoundState`] is the sole unit of engine state and is replaced
//! wholesale each round; no partial-round state is ever observable. The
//! transition itself is a pure function of the previous state, the
//! configuration, the session's immutable true direction, and the random
//! source. [`Simulation`] owns those last two and sequences the calls.

use log::{debug, warn};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::audit::{AuditLog, RoundAuditEntry};
use crate::clients::{self, Client};
use crate::config::SimConfig;
use crate::detection::DetectionEngine;
use crate::error::SimError;
use crate::importance;
use crate::metrics::{self, MetricPoint};

/// Global accuracy at round 0, before any aggregation.
pub const INITIAL_ACCURACY: f32 = 0.1;

/// Complete engine state after one round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    /// Number of completed rounds (0 at initialization).
    pub round: u64,
    /// Smoothed global model accuracy, in `[0, 1]`.
    pub global_accuracy: f32,
    /// Smoothed backdoor attack success rate, in `[0, 1]`.
    pub backdoor_success_rate: f32,
    /// Importance vector carried across rounds (simulated FIM).
    pub importance: Array1<f32>,
    /// This round's clients (empty at round 0).
    pub clients: Vec<Client>,
    /// Metric trajectory, bounded to the most recent 50 rounds.
    pub history: Vec<MetricPoint>,
}

impl RoundState {
    /// The fixed round-0 state for a given gradient dimension.
    pub fn initial(dim: usize) -> Self {
        Self {
            round: 0,
            global_accuracy: INITIAL_ACCURACY,
            backdoor_success_rate: 0.0,
            importance: importance::initial(dim),
            clients: Vec::new(),
            history: Vec::new(),
        }
    }
}

/// Compute the next round from the previous state.
///
/// Pipeline order is fixed: generate clients, advance the importance
/// vector from the *previous* round's estimate, screen every client with
/// the updated vector, then fold acceptance decisions into the global
/// metrics. The previous state is never mutated.
fn next_round<R: Rng + ?Sized>(
    previous: &RoundState,
    config: &SimConfig,
    reference: &Array1<f32>,
    rng: &mut R,
) -> RoundState {
    let mut clients = clients::generate(config, reference, rng);
    let importance = importance::update(&previous.importance, config);

    let detector = DetectionEngine::new(&importance, reference, config);
    detector.screen_all(&mut clients);

    let stats = metrics::acceptance_stats(&clients);
    let impact = stats.attack_impact();
    let accuracy = metrics::smooth(previous.global_accuracy, metrics::accuracy_target(impact));
    let attack_success = metrics::smooth(previous.backdoor_success_rate, metrics::asr_target(impact));

    let round = previous.round + 1;
    let mut history = previous.history.clone();
    metrics::push_bounded(
        &mut history,
        MetricPoint {
            round,
            accuracy,
            attack_success,
        },
    );

    RoundState {
        round,
        global_accuracy: accuracy,
        backdoor_success_rate: attack_success,
        importance,
        clients,
        history,
    }
}

/// One simulation session.
///
/// Owns the immutable true gradient direction, the seeded random source,
/// the current [`RoundState`], and the round audit log. Multiple sessions
/// are fully independent and may run concurrently.
///
/// # Example
///
/// ```rust
/// use vanta_fl::{SimConfig, Simulation};
///
/// let config = SimConfig::default();
/// let mut sim = Simulation::new(&config, 42).unwrap();
///
/// let state = sim.advance(&config).unwrap();
/// assert_eq!(state.round, 1);
/// assert_eq!(state.clients.len(), 20);
/// ```
pub struct Simulation {
    true_direction: Array1<f32>,
    rng: StdRng,
    state: RoundState,
    audit: AuditLog,
}

impl Simulation {
    /// Create a session: validate the config, sample the true direction,
    /// and build the round-0 state.
    pub fn new(config: &SimConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let true_direction = crate::math::standard_normal_vector(config.vector_dim, &mut rng);
        debug!(
            "session created: dim={} seed={} clients={}",
            config.vector_dim, seed, config.client_count
        );
        Ok(Self {
            true_direction,
            rng,
            state: RoundState::initial(config.vector_dim),
            audit: AuditLog::new(),
        })
    }

    /// Current state snapshot.
    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// The session's immutable true gradient direction.
    pub fn true_direction(&self) -> &Array1<f32> {
        &self.true_direction
    }

    /// Per-round audit log.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Advance one round under the given configuration.
    ///
    /// The config is re-validated every round because the control layer
    /// may change it between rounds. On error the held state is untouched.
    pub fn advance(&mut self, config: &SimConfig) -> Result<&RoundState, SimError> {
        self.check_config(config)?;

        let next = next_round(&self.state, config, &self.true_direction, &mut self.rng);

        let stats = metrics::acceptance_stats(&next.clients);
        if stats.accepted == 0 {
            warn!("round {}: every client rejected", next.round);
        }
        debug!(
            "round {}: accepted {}/{} (malicious {}), acc={:.3} asr={:.3}",
            next.round,
            stats.accepted,
            next.clients.len(),
            stats.malicious_accepted,
            next.global_accuracy,
            next.backdoor_success_rate
        );

        let detector = DetectionEngine::new(&next.importance, &self.true_direction, config);
        self.audit.push(RoundAuditEntry {
            round: next.round,
            n_clients: next.clients.len(),
            n_rejected: stats.rejected,
            n_malicious_rejected: stats.malicious_rejected,
            defenses: detector.defense_labels(),
        });

        self.state = next;
        Ok(&self.state)
    }

    /// Restore the initial state, discarding history and importance
    /// accumulation.
    ///
    /// The session's true direction is immutable for its lifetime and is
    /// kept; create a new [`Simulation`] for a fresh direction.
    pub fn reset(&mut self, config: &SimConfig) -> Result<&RoundState, SimError> {
        self.check_config(config)?;
        self.state = RoundState::initial(self.true_direction.len());
        self.audit.clear();
        debug!("session reset");
        Ok(&self.state)
    }

    fn check_config(&self, config: &SimConfig) -> Result<(), SimError> {
        config.validate()?;
        if config.vector_dim != self.true_direction.len() {
            return Err(SimError::DimensionMismatch {
                config: config.vector_dim,
                session: self.true_direction.len(),
            });
        }
        Ok(())
    }
}
