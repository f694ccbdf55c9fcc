//! Momentum-filtered importance estimation (simulated FIM).
//!
//! Maintains a per-coordinate importance profile across rounds. The update
//! is an exponential moving average toward an idealized profile in which
//! trigger coordinates are structurally more important; in a real system
//! the target would come from curvature/Fisher-information statistics of
//! accepted gradients. The idealization isolates detection behavior from
//! estimation noise.

use ndarray::Array1;

use crate::config::{SimConfig, TRIGGER_COORDS};

/// EMA decay: fraction of the previous estimate retained each round.
pub const EMA_DECAY: f32 = 0.9;

/// Ideal importance of a trigger coordinate.
pub const TRIGGER_WEIGHT: f32 = 10.0;

/// Ideal importance of a non-trigger coordinate.
pub const BASE_WEIGHT: f32 = 1.0;

/// The all-ones importance vector used at round 0.
pub fn initial(dim: usize) -> Array1<f32> {
    Array1::from_elem(dim, BASE_WEIGHT)
}

/// Advance the importance vector by one round.
///
/// When momentum filtering is enabled each coordinate moves toward its
/// ideal weight by convex combination, so components never leave the hull
/// of `[BASE_WEIGHT, TRIGGER_WEIGHT]` once initialized inside it. When
/// disabled the previous estimate is carried forward unchanged.
pub fn update(previous: &Array1<f32>, config: &SimConfig) -> Array1<f32> {
    if !config.momentum_fim {
        return previous.clone();
    }

    Array1::from_iter(previous.iter().enumerate().map(|(j, &w)| {
        let ideal = if j < TRIGGER_COORDS {
            TRIGGER_WEIGHT
        } else {
            BASE_WEIGHT
        };
        EMA_DECAY * w + (1.0 - EMA_DECAY) * ideal
    }))
}
