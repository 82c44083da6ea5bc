//! Mimic core library
//!
//! This crate is the Markov emission engine used by the Mimic traffic
//! generator. It loads a GraphML description of a hidden-Markov-like
//! traffic model, validates its structure, and then produces a
//! deterministic, seeded stream of (observation, delay) pairs telling
//! the generator what to send next and how long to wait: a packet
//! toward the origin or the server, a new stream, or end-of-session.
//!
//! The surrounding generator (event loop, transports, configuration)
//! lives outside this crate; it constructs a [`MarkovModel`] with a
//! seed and a graph source, asks it for the next observation, and
//! resets it to begin a new flow.

pub mod chooser;
pub mod errors;
pub mod graph;
pub mod graphml;
pub mod model;
pub mod prng;
pub mod sampling;
pub mod validate;

// Re-export the canonical engine interface
pub use errors::{ModelError, Result};
pub use graph::Observation;
pub use model::{MarkovModel, MAX_DELAY_MICROS};
