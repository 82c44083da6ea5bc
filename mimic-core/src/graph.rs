//! Typed directed multigraph backing a validated model.
//!
//! The loader keeps attributes as strings (`graphml::RawGraph`); the
//! validator resolves them into the sum types here, so runtime code
//! never compares strings. Vertices and edges are addressed through
//! index newtypes, and each vertex's outgoing-edge list preserves
//! document order, which the chooser's weighted walk relies on.

use std::fmt;

/// Index handle for a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexId(pub(crate) usize);

impl VertexId {
    /// Position of the vertex in the loaded document.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index handle for an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    /// Position of the edge in the loaded document.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Discrete output symbol produced by each engine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Observation {
    /// A packet flowing toward the origin side of the flow.
    PacketToOrigin,
    /// A packet flowing toward the server side of the flow.
    PacketToServer,
    /// The start of a new stream.
    Stream,
    /// End of the session; terminal.
    End,
}

impl Observation {
    /// The reserved vertex name carrying this observation.
    pub fn vertex_name(self) -> &'static str {
        match self {
            Observation::PacketToServer => "+",
            Observation::PacketToOrigin => "-",
            Observation::Stream => "$",
            Observation::End => "F",
        }
    }

    /// Resolve a reserved vertex name to its observation.
    pub fn from_vertex_name(name: &str) -> Option<Self> {
        match name {
            "+" => Some(Observation::PacketToServer),
            "-" => Some(Observation::PacketToOrigin),
            "$" => Some(Observation::Stream),
            "F" => Some(Observation::End),
            _ => None,
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::PacketToOrigin => write!(f, "packet-to-origin"),
            Observation::PacketToServer => write!(f, "packet-to-server"),
            Observation::Stream => write!(f, "stream"),
            Observation::End => write!(f, "end-of-session"),
        }
    }
}

/// Name of the unique initial state vertex.
pub const START_VERTEX_NAME: &str = "start";

/// Role of a vertex after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexClass {
    /// The unique entry vertex; carries outgoing transitions only.
    Start,
    /// A hidden state vertex.
    State,
    /// An observation vertex; destination of emission edges only.
    Observation(Observation),
}

impl VertexClass {
    /// Whether this vertex is an observation vertex.
    pub fn is_observation(self) -> bool {
        matches!(self, VertexClass::Observation(_))
    }
}

/// A vertex with its declared name and resolved role.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub name: String,
    pub class: VertexClass,
}

/// Delay distribution parameters carried by an emission edge.
///
/// All three values are validated to be finite and non-negative. An
/// emission samples log-normal(mu, sigma) when either `lognorm_mu` or
/// `lognorm_sigma` is positive, and exponential(`exp_lambda`)
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayParams {
    pub lognorm_mu: f64,
    pub lognorm_sigma: f64,
    pub exp_lambda: f64,
}

/// Role of an edge after validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeClass {
    /// State-to-state edge walking the hidden chain.
    Transition,
    /// State-to-observation edge carrying delay parameters.
    Emission(DelayParams),
}

impl EdgeClass {
    /// The kind selector for this edge, without its payload.
    pub fn kind(&self) -> EdgeKind {
        match self {
            EdgeClass::Transition => EdgeKind::Transition,
            EdgeClass::Emission(_) => EdgeKind::Emission,
        }
    }
}

/// Edge kind selector used when choosing among outgoing edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Transition,
    Emission,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Transition => write!(f, "transition"),
            EdgeKind::Emission => write!(f, "emission"),
        }
    }
}

/// An edge with its endpoints, weight, and resolved role.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
    pub weight: f64,
    pub class: EdgeClass,
}

/// A validated model graph. Construction goes through the validator;
/// the structure is read-only afterwards.
#[derive(Debug, Clone)]
pub struct ModelGraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeId>>,
    start: VertexId,
}

impl ModelGraph {
    pub(crate) fn new(vertices: Vec<Vertex>, edges: Vec<Edge>, start: VertexId) -> Self {
        let mut outgoing = vec![Vec::new(); vertices.len()];
        for (index, edge) in edges.iter().enumerate() {
            outgoing[edge.from.0].push(EdgeId(index));
        }
        Self {
            vertices,
            edges,
            outgoing,
            start,
        }
    }

    /// Handle of the unique `start` vertex.
    pub fn start(&self) -> VertexId {
        self.start
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    /// Endpoints of an edge, source first.
    pub fn endpoints(&self, id: EdgeId) -> (VertexId, VertexId) {
        let edge = &self.edges[id.0];
        (edge.from, edge.to)
    }

    /// All vertices in document order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(index, vertex)| (VertexId(index), vertex))
    }

    /// All edges in document order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(index, edge)| (EdgeId(index), edge))
    }

    /// Outgoing edges of a vertex, in document order.
    pub fn outgoing(&self, id: VertexId) -> impl Iterator<Item = EdgeId> + '_ {
        self.outgoing[id.0].iter().copied()
    }

    /// Find a vertex by its declared name. Names other than the
    /// reserved ones are not required to be unique; the first match
    /// in document order wins.
    pub fn vertex_by_name(&self, name: &str) -> Option<VertexId> {
        self.vertices
            .iter()
            .position(|vertex| vertex.name == name)
            .map(VertexId)
    }
}
