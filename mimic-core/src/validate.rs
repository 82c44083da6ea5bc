//! Structural validation of a raw graph.
//!
//! Two passes, both of which keep walking after a failure so the
//! report carries every violation: the vertex pass resolves each
//! vertex to a [`VertexClass`] and locates the unique `start` vertex;
//! the edge pass resolves each edge to an [`EdgeClass`] and checks
//! the endpoint rules. Any violation in either pass means no model
//! graph is built.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::errors::{ValidationIssue, ValidationReport};
use crate::graph::{
    DelayParams, Edge, EdgeClass, ModelGraph, Observation, Vertex, VertexClass, VertexId,
    START_VERTEX_NAME,
};
use crate::graphml::{
    RawGraph, ATTR_EXP_LAMBDA, ATTR_LOGNORM_MU, ATTR_LOGNORM_SIGMA, ATTR_NAME, ATTR_TYPE,
    ATTR_WEIGHT,
};

const VERTEX_TYPE_STATE: &str = "state";
const VERTEX_TYPE_OBSERVATION: &str = "observation";
const EDGE_TYPE_TRANSITION: &str = "transition";
const EDGE_TYPE_EMISSION: &str = "emission";

/// Type attribute values compare case-insensitively; names are
/// literal.
fn value_is(value: &str, expected: &str) -> bool {
    value.eq_ignore_ascii_case(expected)
}

/// An attribute is present only if it is non-empty, mirroring the
/// external format's treatment of empty data elements.
fn attr<'a>(attrs: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    attrs.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

struct VertexPass {
    /// Resolved class per vertex; `None` where classification failed.
    classes: Vec<Option<VertexClass>>,
    /// Display name per vertex: the declared name, or the XML id
    /// when the name is missing.
    names: Vec<String>,
    start: Option<VertexId>,
}

/// Run both validation passes over `raw`. On success the typed model
/// graph is returned; otherwise the accumulated report.
pub fn validate(raw: &RawGraph) -> Result<ModelGraph, ValidationReport> {
    let mut issues = Vec::new();

    let pass = check_vertices(raw, &mut issues);
    let edges = check_edges(raw, &pass, &mut issues);

    if pass.start.is_none() {
        issues.push(ValidationIssue::MissingStart);
    }

    if !issues.is_empty() {
        for issue in &issues {
            warn!(%issue, "graph validation failure");
        }
        return Err(ValidationReport { issues });
    }

    // No issues were recorded, so every classification succeeded.
    let mut vertices = Vec::with_capacity(raw.vertices.len());
    for (name, class) in pass.names.into_iter().zip(pass.classes) {
        let Some(class) = class else {
            return Err(ValidationReport { issues });
        };
        vertices.push(Vertex { name, class });
    }

    let mut typed_edges = Vec::with_capacity(raw.edges.len());
    for edge in edges {
        let Some(edge) = edge else {
            return Err(ValidationReport { issues });
        };
        typed_edges.push(edge);
    }

    let Some(start) = pass.start else {
        return Err(ValidationReport { issues });
    };

    Ok(ModelGraph::new(vertices, typed_edges, start))
}

fn check_vertices(raw: &RawGraph, issues: &mut Vec<ValidationIssue>) -> VertexPass {
    let mut classes = Vec::with_capacity(raw.vertices.len());
    let mut names = Vec::with_capacity(raw.vertices.len());
    let mut start: Option<VertexId> = None;

    for (index, vertex) in raw.vertices.iter().enumerate() {
        let name = match attr(&vertex.attrs, ATTR_NAME) {
            Some(name) => name.to_string(),
            None => {
                issues.push(ValidationIssue::MissingVertexName { index });
                names.push(vertex.xml_id.clone());
                classes.push(None);
                continue;
            }
        };

        debug!(index, name = %name, "found vertex");

        let class = if name == START_VERTEX_NAME {
            // The start vertex needs no further attributes.
            match start {
                Some(first) => {
                    issues.push(ValidationIssue::DuplicateStart {
                        first: first.index(),
                        second: index,
                    });
                    None
                }
                None => {
                    start = Some(VertexId(index));
                    Some(VertexClass::Start)
                }
            }
        } else {
            match attr(&vertex.attrs, ATTR_TYPE) {
                None => {
                    issues.push(ValidationIssue::MissingVertexType {
                        index,
                        name: name.clone(),
                    });
                    None
                }
                Some(found) if value_is(found, VERTEX_TYPE_STATE) => {
                    match Observation::from_vertex_name(&name) {
                        Some(_) => {
                            issues.push(ValidationIssue::ReservedNameNotObservation {
                                index,
                                name: name.clone(),
                                found: found.to_string(),
                            });
                            None
                        }
                        None => Some(VertexClass::State),
                    }
                }
                Some(found) if value_is(found, VERTEX_TYPE_OBSERVATION) => {
                    match Observation::from_vertex_name(&name) {
                        Some(observation) => Some(VertexClass::Observation(observation)),
                        None => {
                            issues.push(ValidationIssue::UnknownObservationName {
                                index,
                                name: name.clone(),
                            });
                            None
                        }
                    }
                }
                Some(found) => {
                    issues.push(ValidationIssue::InvalidVertexType {
                        index,
                        name: name.clone(),
                        found: found.to_string(),
                    });
                    None
                }
            }
        };

        names.push(name);
        classes.push(class);
    }

    VertexPass {
        classes,
        names,
        start,
    }
}

/// Identity of the edge being checked, for diagnostics.
struct EdgeAt<'a> {
    index: usize,
    from: &'a str,
    to: &'a str,
}

impl EdgeAt<'_> {
    fn missing(&self, attribute: &'static str) -> ValidationIssue {
        ValidationIssue::MissingEdgeAttribute {
            index: self.index,
            from: self.from.to_string(),
            to: self.to.to_string(),
            attribute,
        }
    }
}

/// Fetch and range-check one required numeric edge attribute,
/// recording an issue on any failure.
fn required_number(
    attrs: &HashMap<String, String>,
    attribute: &'static str,
    at: &EdgeAt<'_>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<f64> {
    let value = match attr(attrs, attribute) {
        Some(value) => value,
        None => {
            issues.push(at.missing(attribute));
            return None;
        }
    };
    let parsed = match value.parse::<f64>() {
        Ok(parsed) => parsed,
        Err(_) => {
            issues.push(ValidationIssue::MalformedEdgeNumber {
                index: at.index,
                from: at.from.to_string(),
                to: at.to.to_string(),
                attribute,
                value: value.to_string(),
            });
            return None;
        }
    };
    if !parsed.is_finite() || parsed < 0.0 {
        issues.push(ValidationIssue::EdgeNumberOutOfRange {
            index: at.index,
            from: at.from.to_string(),
            to: at.to.to_string(),
            attribute,
            value: parsed,
        });
        return None;
    }
    Some(parsed)
}

fn check_edges(
    raw: &RawGraph,
    pass: &VertexPass,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<Option<Edge>> {
    let mut edges = Vec::with_capacity(raw.edges.len());

    for (index, edge) in raw.edges.iter().enumerate() {
        let from_name = pass.names[edge.from].as_str();
        let to_name = pass.names[edge.to].as_str();
        let at = EdgeAt {
            index,
            from: from_name,
            to: to_name,
        };

        debug!(index, from = from_name, to = to_name, "found edge");

        // Endpoint rules go by reserved observation names, so they
        // apply even when an endpoint vertex failed its own checks.
        let from_is_observation = Observation::from_vertex_name(from_name).is_some();
        let to_is_observation = Observation::from_vertex_name(to_name).is_some();

        let weight = required_number(&edge.attrs, ATTR_WEIGHT, &at, issues);

        let class = match attr(&edge.attrs, ATTR_TYPE) {
            None => {
                issues.push(at.missing(ATTR_TYPE));
                None
            }
            Some(found) if value_is(found, EDGE_TYPE_TRANSITION) => {
                if from_is_observation {
                    issues.push(ValidationIssue::TransitionFromObservation {
                        index,
                        from: from_name.to_string(),
                        to: to_name.to_string(),
                    });
                }
                if to_is_observation {
                    issues.push(ValidationIssue::TransitionToObservation {
                        index,
                        from: from_name.to_string(),
                        to: to_name.to_string(),
                    });
                }
                if from_is_observation || to_is_observation {
                    None
                } else {
                    Some(EdgeClass::Transition)
                }
            }
            Some(found) if value_is(found, EDGE_TYPE_EMISSION) => {
                let mut endpoints_ok = true;
                if from_is_observation {
                    issues.push(ValidationIssue::EmissionFromObservation {
                        index,
                        from: from_name.to_string(),
                        to: to_name.to_string(),
                    });
                    endpoints_ok = false;
                }
                if !to_is_observation {
                    issues.push(ValidationIssue::EmissionToNonObservation {
                        index,
                        from: from_name.to_string(),
                        to: to_name.to_string(),
                    });
                    endpoints_ok = false;
                }

                let lognorm_mu = required_number(&edge.attrs, ATTR_LOGNORM_MU, &at, issues);
                let lognorm_sigma = required_number(&edge.attrs, ATTR_LOGNORM_SIGMA, &at, issues);
                let exp_lambda = required_number(&edge.attrs, ATTR_EXP_LAMBDA, &at, issues);

                match (endpoints_ok, lognorm_mu, lognorm_sigma, exp_lambda) {
                    (true, Some(lognorm_mu), Some(lognorm_sigma), Some(exp_lambda)) => {
                        Some(EdgeClass::Emission(DelayParams {
                            lognorm_mu,
                            lognorm_sigma,
                            exp_lambda,
                        }))
                    }
                    _ => None,
                }
            }
            Some(found) => {
                issues.push(ValidationIssue::InvalidEdgeType {
                    index,
                    from: from_name.to_string(),
                    to: to_name.to_string(),
                    found: found.to_string(),
                });
                None
            }
        };

        edges.push(match (weight, class) {
            (Some(weight), Some(class)) => Some(Edge {
                from: VertexId(edge.from),
                to: VertexId(edge.to),
                weight,
                class,
            }),
            _ => None,
        });
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphml::{RawEdge, RawVertex};

    fn vertex(xml_id: &str, entries: &[(&str, &str)]) -> RawVertex {
        RawVertex {
            xml_id: xml_id.to_string(),
            attrs: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn edge(from: usize, to: usize, entries: &[(&str, &str)]) -> RawEdge {
        RawEdge {
            from,
            to,
            attrs: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn transition(from: usize, to: usize, weight: &str) -> RawEdge {
        edge(from, to, &[("type", "transition"), ("weight", weight)])
    }

    fn emission(from: usize, to: usize, weight: &str) -> RawEdge {
        edge(
            from,
            to,
            &[
                ("type", "emission"),
                ("weight", weight),
                ("lognorm_mu", "0"),
                ("lognorm_sigma", "0"),
                ("exp_lambda", "1"),
            ],
        )
    }

    /// start -> s1 -> F, the smallest valid model.
    fn minimal() -> RawGraph {
        RawGraph {
            vertices: vec![
                vertex("a", &[("name", "start")]),
                vertex("b", &[("name", "s1"), ("type", "state")]),
                vertex("c", &[("name", "F"), ("type", "observation")]),
            ],
            edges: vec![transition(0, 1, "1"), emission(1, 2, "1")],
        }
    }

    fn single_issue(raw: &RawGraph) -> ValidationIssue {
        let report = validate(raw).err().expect("graph should fail validation");
        assert_eq!(report.issues.len(), 1, "issues: {:?}", report.issues);
        report.issues[0].clone()
    }

    #[test]
    fn accepts_a_minimal_valid_graph() {
        let graph = validate(&minimal()).unwrap();

        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.vertex(graph.start()).name, "start");
        assert_eq!(
            graph.vertex(VertexId(2)).class,
            VertexClass::Observation(Observation::End)
        );
    }

    #[test]
    fn type_values_compare_case_insensitively() {
        let mut raw = minimal();
        raw.vertices[1] = vertex("b", &[("name", "s1"), ("type", "State")]);
        raw.vertices[2] = vertex("c", &[("name", "F"), ("type", "OBSERVATION")]);
        raw.edges[0].attrs.insert("type".to_string(), "Transition".to_string());

        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn rejects_vertex_without_name() {
        let mut raw = minimal();
        raw.vertices.push(vertex("d", &[("type", "state")]));

        assert_eq!(
            single_issue(&raw),
            ValidationIssue::MissingVertexName { index: 3 }
        );
    }

    #[test]
    fn rejects_non_start_vertex_without_type() {
        let mut raw = minimal();
        raw.vertices.push(vertex("d", &[("name", "s2")]));

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::MissingVertexType { index: 3, .. }
        ));
    }

    #[test]
    fn start_vertex_needs_no_type() {
        // Already exercised by `minimal`, but state it directly.
        let raw = RawGraph {
            vertices: vec![
                vertex("a", &[("name", "start")]),
                vertex("b", &[("name", "s1"), ("type", "state")]),
                vertex("c", &[("name", "$"), ("type", "observation")]),
            ],
            edges: vec![transition(0, 1, "1"), emission(1, 2, "1")],
        };
        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn rejects_unknown_vertex_type() {
        let mut raw = minimal();
        raw.vertices[1] = vertex("b", &[("name", "s1"), ("type", "hidden")]);

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::InvalidVertexType { index: 1, .. }
        ));
    }

    #[test]
    fn rejects_observation_with_unreserved_name() {
        let mut raw = minimal();
        raw.vertices.push(vertex("d", &[("name", "obs"), ("type", "observation")]));

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::UnknownObservationName { index: 3, .. }
        ));
    }

    #[test]
    fn rejects_reserved_name_typed_as_state() {
        let mut raw = minimal();
        raw.vertices.push(vertex("d", &[("name", "+"), ("type", "state")]));

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::ReservedNameNotObservation { index: 3, .. }
        ));
    }

    #[test]
    fn rejects_graph_without_start() {
        let raw = RawGraph {
            vertices: vec![
                vertex("b", &[("name", "s1"), ("type", "state")]),
                vertex("c", &[("name", "F"), ("type", "observation")]),
            ],
            edges: vec![emission(0, 1, "1")],
        };

        assert_eq!(single_issue(&raw), ValidationIssue::MissingStart);
    }

    #[test]
    fn rejects_duplicate_start() {
        let mut raw = minimal();
        raw.vertices.push(vertex("d", &[("name", "start")]));

        assert_eq!(
            single_issue(&raw),
            ValidationIssue::DuplicateStart { first: 0, second: 3 }
        );
    }

    #[test]
    fn rejects_edge_without_weight() {
        let mut raw = minimal();
        raw.edges[0] = edge(0, 1, &[("type", "transition")]);

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::MissingEdgeAttribute {
                attribute: "weight",
                ..
            }
        ));
    }

    #[test]
    fn rejects_edge_without_type() {
        let mut raw = minimal();
        raw.edges[0] = edge(0, 1, &[("weight", "1")]);

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::MissingEdgeAttribute {
                attribute: "type",
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_edge_type() {
        let mut raw = minimal();
        raw.edges[0] = edge(0, 1, &[("type", "hop"), ("weight", "1")]);

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::InvalidEdgeType { index: 0, .. }
        ));
    }

    #[test]
    fn rejects_non_numeric_weight() {
        let mut raw = minimal();
        raw.edges[0] = edge(0, 1, &[("type", "transition"), ("weight", "heavy")]);

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::MalformedEdgeNumber {
                attribute: "weight",
                ..
            }
        ));
    }

    #[test]
    fn rejects_negative_weight() {
        let mut raw = minimal();
        raw.edges[0] = edge(0, 1, &[("type", "transition"), ("weight", "-1")]);

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::EdgeNumberOutOfRange {
                attribute: "weight",
                ..
            }
        ));
    }

    #[test]
    fn rejects_nan_and_infinite_weights() {
        for bad in ["NaN", "inf"] {
            let mut raw = minimal();
            raw.edges[0] = edge(0, 1, &[("type", "transition"), ("weight", bad)]);

            assert!(matches!(
                single_issue(&raw),
                ValidationIssue::EdgeNumberOutOfRange {
                    attribute: "weight",
                    ..
                }
            ));
        }
    }

    #[test]
    fn rejects_transition_touching_an_observation() {
        let mut raw = minimal();
        raw.edges.push(transition(1, 2, "1"));

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::TransitionToObservation { index: 2, .. }
        ));

        let mut raw = minimal();
        raw.edges.push(transition(2, 1, "1"));

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::TransitionFromObservation { index: 2, .. }
        ));
    }

    #[test]
    fn rejects_emission_from_an_observation() {
        let mut raw = minimal();
        raw.vertices.push(vertex("d", &[("name", "$"), ("type", "observation")]));
        raw.edges.push(emission(2, 3, "1"));

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::EmissionFromObservation { index: 2, .. }
        ));
    }

    #[test]
    fn rejects_emission_into_a_state() {
        let mut raw = minimal();
        raw.edges.push(emission(0, 1, "1"));

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::EmissionToNonObservation { index: 2, .. }
        ));
    }

    #[test]
    fn rejects_emission_missing_distribution_parameters() {
        for dropped in ["lognorm_mu", "lognorm_sigma", "exp_lambda"] {
            let mut raw = minimal();
            raw.edges[1].attrs.remove(dropped);

            match single_issue(&raw) {
                ValidationIssue::MissingEdgeAttribute { attribute, .. } => {
                    assert_eq!(attribute, dropped);
                }
                other => panic!("expected missing attribute issue, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_negative_distribution_parameters() {
        let mut raw = minimal();
        raw.edges[1]
            .attrs
            .insert("lognorm_sigma".to_string(), "-0.5".to_string());

        assert!(matches!(
            single_issue(&raw),
            ValidationIssue::EdgeNumberOutOfRange {
                attribute: "lognorm_sigma",
                ..
            }
        ));
    }

    #[test]
    fn transition_edges_need_no_distribution_parameters() {
        // `minimal` already has a bare transition; make the point
        // with a second one.
        let mut raw = minimal();
        raw.vertices.push(vertex("d", &[("name", "s2"), ("type", "state")]));
        raw.edges.push(transition(1, 3, "0.5"));

        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn accumulates_every_violation_in_one_report() {
        let raw = RawGraph {
            vertices: vec![
                vertex("a", &[("type", "state")]),
                vertex("b", &[("name", "s1"), ("type", "hidden")]),
                vertex("c", &[("name", "obs"), ("type", "observation")]),
            ],
            edges: vec![
                edge(0, 1, &[("type", "hop"), ("weight", "-1")]),
                edge(1, 2, &[("weight", "x")]),
            ],
        };

        let report = validate(&raw).err().expect("graph should fail validation");

        // Three vertex issues, two per bad edge, plus the missing
        // start vertex.
        assert_eq!(report.issues.len(), 8, "issues: {:?}", report.issues);
        assert!(report.issues.contains(&ValidationIssue::MissingStart));
    }

    #[test]
    fn zero_weight_edges_pass_validation() {
        let mut raw = minimal();
        raw.edges[0].attrs.insert("weight".to_string(), "0".to_string());

        assert!(validate(&raw).is_ok());
    }
}
