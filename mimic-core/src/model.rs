//! The Markov model engine surfaced to the traffic generator.
//!
//! An engine walks the validated graph one step at a time: choose a
//! transition edge to the next state, choose an emission edge from
//! there, sample a delay from the emission's distribution parameters,
//! and map the emission's destination to an observation. The walk is
//! fully determined by the graph bytes, the seed, and the sequence of
//! `next`/`reset` calls.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::chooser;
use crate::errors::Result;
use crate::graph::{DelayParams, EdgeClass, EdgeKind, ModelGraph, Observation, VertexClass, VertexId};
use crate::graphml::{self, RawGraph};
use crate::prng::ModelRng;
use crate::sampling;
use crate::validate;

/// Ceiling applied to every generated delay, in microseconds (60
/// seconds). This is engine policy, not a property of the samplers.
pub const MAX_DELAY_MICROS: u64 = 60_000_000;

/// A loaded, validated Markov traffic model.
///
/// One engine drives one flow. The engine is not safe for concurrent
/// use; callers that need concurrency own one engine per flow, or
/// serialize access themselves.
#[derive(Debug, Clone)]
pub struct MarkovModel {
    name: String,
    graph: ModelGraph,
    rng: ModelRng,
    current: VertexId,
    terminated: bool,
}

impl MarkovModel {
    /// Load, validate, and seed a model from a GraphML file.
    pub fn from_path(name: &str, seed: u32, path: &Path) -> Result<Self> {
        let raw = graphml::load_path(path)?;
        info!(name, path = %path.display(), "read and parsed model graph");
        Self::from_raw(name, seed, &raw)
    }

    /// Load, validate, and seed a model from in-memory GraphML bytes.
    pub fn from_bytes(name: &str, seed: u32, bytes: &[u8]) -> Result<Self> {
        let raw = graphml::load_bytes(bytes)?;
        info!(name, len = bytes.len(), "read and parsed model graph");
        Self::from_raw(name, seed, &raw)
    }

    fn from_raw(name: &str, seed: u32, raw: &RawGraph) -> Result<Self> {
        info!(name, "starting graph validation");
        let graph = validate::validate(raw).map_err(|report| {
            warn!(name, issues = report.issues.len(), "model graph failed validation");
            report
        })?;

        let start = graph.start();
        info!(name, start = start.index(), "validated model graph");

        Ok(Self {
            name: name.to_string(),
            graph,
            rng: ModelRng::new(seed),
            current: start,
            terminated: false,
        })
    }

    /// Advance one step and return the next observation with its
    /// delay in microseconds.
    ///
    /// Once `end-of-session` has been returned, every further call
    /// returns `(End, 0)` without touching the random stream, until
    /// [`reset`](Self::reset).
    pub fn next(&mut self) -> (Observation, u64) {
        if self.terminated {
            return (Observation::End, 0);
        }

        debug!(vertex = self.current.index(), "choosing transition");
        let Some((_, next_state)) =
            chooser::choose_edge(&self.graph, &mut self.rng, self.current, EdgeKind::Transition)
        else {
            return self.terminate_early(EdgeKind::Transition);
        };

        self.current = next_state;

        debug!(vertex = self.current.index(), "choosing emission");
        let Some((emission_edge, observation_vertex)) =
            chooser::choose_edge(&self.graph, &mut self.rng, self.current, EdgeKind::Emission)
        else {
            return self.terminate_early(EdgeKind::Emission);
        };

        let class = self.graph.edge(emission_edge).class;
        let delay = match class {
            EdgeClass::Emission(params) => self.sample_delay(params).min(MAX_DELAY_MICROS),
            EdgeClass::Transition => 0,
        };

        let observation = self.observation_at(observation_vertex);
        if observation == Observation::End {
            self.terminated = true;
        }

        (observation, delay)
    }

    /// Return to the start state for a new flow. The random stream
    /// continues; it is not reseeded.
    pub fn reset(&mut self) {
        self.terminated = false;
        self.current = self.graph.start();
    }

    /// The seed this model was created with.
    pub fn seed(&self) -> u32 {
        self.rng.seed()
    }

    /// The diagnostic name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read-only view of the validated graph.
    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    /// Render the owned graph back to GraphML.
    pub fn to_graphml(&self) -> Result<String> {
        let text = graphml::write_model(&self.graph)?;
        Ok(text)
    }

    fn terminate_early(&mut self, kind: EdgeKind) -> (Observation, u64) {
        warn!(
            vertex = %self.graph.vertex(self.current).name,
            kind = %kind,
            "no weighted outgoing edge to choose; returning end-of-session early"
        );
        self.terminated = true;
        (Observation::End, 0)
    }

    fn sample_delay(&mut self, params: DelayParams) -> u64 {
        let value = if params.lognorm_mu > 0.0 || params.lognorm_sigma > 0.0 {
            sampling::log_normal(&mut self.rng, params.lognorm_mu, params.lognorm_sigma)
        } else {
            sampling::exponential(&mut self.rng, params.exp_lambda)
        };

        // `as` saturates: infinities and overlarge values become
        // `u64::MAX` before the ceiling applies.
        value as u64
    }

    fn observation_at(&self, vertex: VertexId) -> Observation {
        match self.graph.vertex(vertex).class {
            VertexClass::Observation(observation) => observation,
            // The validator guarantees emission edges end at
            // observation vertices.
            VertexClass::Start | VertexClass::State => Observation::End,
        }
    }
}
