//! GraphML reading and writing.
//!
//! The loader is deliberately dumb: it parses the XML document,
//! resolves `<key>` declarations to attribute names, and yields a
//! [`RawGraph`] of string attribute maps. Every semantic rule lives
//! in the validator. The writer renders a validated [`ModelGraph`]
//! back to GraphML with positional node ids (`n0`, `n1`, ...), so an
//! `id` attribute synthesized by other loaders never survives a
//! round trip.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{LoadError, SerializeError};
use crate::graph::{EdgeClass, ModelGraph, VertexClass};

/// Vertex attribute carrying the declared name.
pub const ATTR_NAME: &str = "name";
/// Vertex and edge attribute carrying the declared type.
pub const ATTR_TYPE: &str = "type";
/// Edge attribute carrying the selection weight.
pub const ATTR_WEIGHT: &str = "weight";
/// Emission edge attribute: log-normal location.
pub const ATTR_LOGNORM_MU: &str = "lognorm_mu";
/// Emission edge attribute: log-normal scale.
pub const ATTR_LOGNORM_SIGMA: &str = "lognorm_sigma";
/// Emission edge attribute: exponential rate.
pub const ATTR_EXP_LAMBDA: &str = "exp_lambda";

const GRAPHML_ROOT: &str = "graphml";
const GRAPHML_XMLNS: &str = "http://graphml.graphdrawing.org/xmlns";
const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// One parsed vertex: its XML id and resolved attribute map.
#[derive(Debug, Clone)]
pub struct RawVertex {
    pub xml_id: String,
    pub attrs: HashMap<String, String>,
}

/// One parsed edge: endpoint positions in the vertex list and its
/// resolved attribute map. Endpoints are resolved during parsing; a
/// dangling reference is a structural error, not a validation issue.
#[derive(Debug, Clone)]
pub struct RawEdge {
    pub from: usize,
    pub to: usize,
    pub attrs: HashMap<String, String>,
}

/// The loader's output: document structure and strings, no
/// semantics.
#[derive(Debug, Clone, Default)]
pub struct RawGraph {
    pub vertices: Vec<RawVertex>,
    pub edges: Vec<RawEdge>,
}

// Serde model of the GraphML document. Attributes are `@`-prefixed,
// element text is `$text`, per quick-xml's serde conventions.

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "graphml")]
struct GraphmlDoc {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    xmlns: Option<String>,
    #[serde(rename = "key", default)]
    keys: Vec<KeyDecl>,
    graph: GraphElem,
}

#[derive(Debug, Serialize, Deserialize)]
struct KeyDecl {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@for", default, skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    #[serde(rename = "@attr.name", default, skip_serializing_if = "Option::is_none")]
    attr_name: Option<String>,
    #[serde(rename = "@attr.type", default, skip_serializing_if = "Option::is_none")]
    attr_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GraphElem {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "@edgedefault", default, skip_serializing_if = "Option::is_none")]
    edgedefault: Option<String>,
    #[serde(rename = "node", default)]
    nodes: Vec<NodeElem>,
    #[serde(rename = "edge", default)]
    edges: Vec<EdgeElem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeElem {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "data", default)]
    data: Vec<DataElem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EdgeElem {
    #[serde(rename = "@source")]
    source: String,
    #[serde(rename = "@target")]
    target: String,
    #[serde(rename = "data", default)]
    data: Vec<DataElem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DataElem {
    #[serde(rename = "@key")]
    key: String,
    #[serde(rename = "$text", default)]
    value: String,
}

/// Read a raw graph from a filesystem path.
pub fn load_path(path: &Path) -> Result<RawGraph, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileMissing {
            path: path.to_path_buf(),
        });
    }
    if !path.is_file() {
        return Err(LoadError::NotRegular {
            path: path.to_path_buf(),
        });
    }

    let bytes = fs::read(path).map_err(|source| LoadError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;

    load_bytes(&bytes)
}

/// Read a raw graph from an in-memory buffer.
pub fn load_bytes(bytes: &[u8]) -> Result<RawGraph, LoadError> {
    let text = std::str::from_utf8(bytes)?;

    if let Some(root) = root_element(text) {
        if root != GRAPHML_ROOT {
            return Err(LoadError::UnsupportedFormat { root });
        }
    }

    let doc: GraphmlDoc = quick_xml::de::from_str(text)?;
    raw_from_doc(doc)
}

/// Name of the first start element in the document, if any.
fn root_element(text: &str) -> Option<String> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) | Ok(Event::Empty(start)) => {
                return Some(String::from_utf8_lossy(start.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn raw_from_doc(doc: GraphmlDoc) -> Result<RawGraph, LoadError> {
    // Key declarations map data ids to attribute names. Data entries
    // referencing an undeclared key keep the raw id as the name.
    let mut key_names: HashMap<String, String> = HashMap::new();
    for key in doc.keys {
        if let Some(attr_name) = key.attr_name {
            key_names.insert(key.id, attr_name);
        }
    }

    let resolve = |data: Vec<DataElem>| -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        for entry in data {
            let name = key_names
                .get(&entry.key)
                .cloned()
                .unwrap_or_else(|| entry.key.clone());
            attrs.insert(name, entry.value);
        }
        attrs
    };

    let mut vertices = Vec::with_capacity(doc.graph.nodes.len());
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (index, node) in doc.graph.nodes.into_iter().enumerate() {
        positions.insert(node.id.clone(), index);
        vertices.push(RawVertex {
            xml_id: node.id,
            attrs: resolve(node.data),
        });
    }

    let mut edges = Vec::with_capacity(doc.graph.edges.len());
    for (index, edge) in doc.graph.edges.into_iter().enumerate() {
        let from = *positions
            .get(&edge.source)
            .ok_or_else(|| LoadError::DanglingEndpoint {
                index,
                endpoint: edge.source.clone(),
            })?;
        let to = *positions
            .get(&edge.target)
            .ok_or_else(|| LoadError::DanglingEndpoint {
                index,
                endpoint: edge.target.clone(),
            })?;
        edges.push(RawEdge {
            from,
            to,
            attrs: resolve(edge.data),
        });
    }

    debug!(
        vertices = vertices.len(),
        edges = edges.len(),
        "parsed graphml document"
    );

    Ok(RawGraph { vertices, edges })
}

/// Render a validated graph back to GraphML text.
pub fn write_model(graph: &ModelGraph) -> Result<String, SerializeError> {
    let body = quick_xml::se::to_string(&doc_from_model(graph))?;
    Ok(format!("{XML_DECLARATION}\n{body}"))
}

fn doc_from_model(graph: &ModelGraph) -> GraphmlDoc {
    let key = |id: &str, domain: &str, attr_name: &str, attr_type: &str| KeyDecl {
        id: id.to_string(),
        domain: Some(domain.to_string()),
        attr_name: Some(attr_name.to_string()),
        attr_type: Some(attr_type.to_string()),
    };

    let keys = vec![
        key("d0", "node", ATTR_NAME, "string"),
        key("d1", "node", ATTR_TYPE, "string"),
        key("d2", "edge", ATTR_TYPE, "string"),
        key("d3", "edge", ATTR_WEIGHT, "double"),
        key("d4", "edge", ATTR_LOGNORM_MU, "double"),
        key("d5", "edge", ATTR_LOGNORM_SIGMA, "double"),
        key("d6", "edge", ATTR_EXP_LAMBDA, "double"),
    ];

    let data = |key: &str, value: String| DataElem {
        key: key.to_string(),
        value,
    };

    let nodes = graph
        .vertices()
        .map(|(id, vertex)| {
            let mut entries = vec![data("d0", vertex.name.clone())];
            match vertex.class {
                // The start vertex carries no type attribute.
                VertexClass::Start => {}
                VertexClass::State => entries.push(data("d1", "state".to_string())),
                VertexClass::Observation(_) => {
                    entries.push(data("d1", "observation".to_string()));
                }
            }
            NodeElem {
                id: format!("n{}", id.index()),
                data: entries,
            }
        })
        .collect();

    let edges = graph
        .edges()
        .map(|(_, edge)| {
            let mut entries = Vec::new();
            match edge.class {
                EdgeClass::Transition => {
                    entries.push(data("d2", "transition".to_string()));
                }
                EdgeClass::Emission(params) => {
                    entries.push(data("d2", "emission".to_string()));
                    entries.push(data("d4", params.lognorm_mu.to_string()));
                    entries.push(data("d5", params.lognorm_sigma.to_string()));
                    entries.push(data("d6", params.exp_lambda.to_string()));
                }
            }
            entries.push(data("d3", edge.weight.to_string()));
            EdgeElem {
                source: format!("n{}", edge.from.index()),
                target: format!("n{}", edge.to.index()),
                data: entries,
            }
        })
        .collect();

    GraphmlDoc {
        xmlns: Some(GRAPHML_XMLNS.to_string()),
        keys,
        graph: GraphElem {
            id: Some("G".to_string()),
            edgedefault: Some("directed".to_string()),
            nodes,
            edges,
        },
    }
}
