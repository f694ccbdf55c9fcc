//! Standard-normal sampling via the Box–Muller transform.
//!
//! The random source is always supplied by the caller, so every
//! stochastic path in the engine is reproducible from a seed
//! (`StdRng::seed_from_u64`).

use ndarray::Array1;
use rand::Rng;

/// Draw one sample from a standard normal distribution.
///
/// Box–Muller over two uniform(0,1) draws. A draw of exactly 0 is
/// redrawn so the logarithm stays finite.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let mut u1: f32 = rng.gen();
    while u1 == 0.0 {
        u1 = rng.gen();
    }
    let mut u2: f32 = rng.gen();
    while u2 == 0.0 {
        u2 = rng.gen();
    }
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

/// Sample a vector of `dim` independent standard-normal coordinates.
pub fn standard_normal_vector<R: Rng + ?Sized>(dim: usize, rng: &mut R) -> Array1<f32> {
    Array1::from_iter((0..dim).map(|_| standard_normal(rng)))
}
