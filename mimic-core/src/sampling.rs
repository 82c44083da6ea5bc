//! Delay samplers for emission edges.
//!
//! Both samplers draw uniforms clamped to `[0.0001, 0.9999)` so the
//! logarithm never sees zero, and consume a fixed number of uniforms
//! in a fixed order, which keeps the output stream reproducible for a
//! given seed.

use std::f64::consts::PI;

use crate::prng::ModelRng;

/// Lower clamp for uniforms feeding a logarithm.
const UNIFORM_LO: f64 = 0.0001;
/// Upper clamp for uniforms feeding a logarithm.
const UNIFORM_HI: f64 = 0.9999;

/// Sample log-normal(mu, sigma) via the Box-Muller transform.
///
/// Consumes exactly two uniforms; the transform's sine output is
/// discarded.
pub fn log_normal(rng: &mut ModelRng, mu: f64, sigma: f64) -> f64 {
    let u = rng.draw_uniform(UNIFORM_LO, UNIFORM_HI);
    let v = rng.draw_uniform(UNIFORM_LO, UNIFORM_HI);

    // One standard normal from two uniforms.
    let x = (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos();

    (mu + sigma * x).exp()
}

/// Sample exponential(lambda) by inverse transform sampling.
///
/// Consumes exactly one uniform. `lambda == 0` yields infinity, which
/// the engine saturates and caps.
pub fn exponential(rng: &mut ModelRng, lambda: f64) -> f64 {
    let u = rng.draw_uniform(UNIFORM_LO, UNIFORM_HI);
    -u.ln() / lambda
}
