use std::collections::{HashMap, HashSet};
use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::GraphError;

/// Free-form property bag; key order is preserved for stable exports.
pub type Properties = serde_json::Map<String, Value>;

/// Simulation-space coordinates of a placed node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

/// An extracted entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	/// Unique within the graph.
	pub id: String,
	/// Short display tag.
	#[serde(default)]
	pub label: String,
	/// Category, optionally carrying a parenthetical subtype (`"Person (Employee)"`).
	#[serde(rename = "type")]
	pub node_type: String,
	/// Extracted attributes such as `name` or `title`.
	#[serde(default)]
	pub properties: Properties,
	/// Set once laid out or when loaded with coordinates.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position: Option<Position>,
	/// Keep the node fixed at `position` in new layouts.
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub pinned: bool,
}

impl Node {
	/// Bare node with no properties and no position.
	pub fn new(id: impl Into<String>, label: impl Into<String>, node_type: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			node_type: node_type.into(),
			properties: Properties::new(),
			position: None,
			pinned: false,
		}
	}

	/// Builder-style property setter.
	pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.properties.insert(key.into(), value.into());
		self
	}

	/// Builder-style position setter.
	pub fn at(mut self, x: f64, y: f64) -> Self {
		self.position = Some(Position { x, y });
		self
	}
}

/// A directed, labelled relationship between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	/// Unique within the graph.
	pub id: String,
	/// Id of the node the edge starts at.
	pub source: String,
	/// Id of the node the edge points to.
	pub target: String,
	/// Relationship type.
	#[serde(default)]
	pub label: String,
	/// Attributes of the relationship.
	#[serde(default)]
	pub properties: Properties,
}

impl Edge {
	/// Bare edge with no properties.
	pub fn new(
		id: impl Into<String>,
		source: impl Into<String>,
		target: impl Into<String>,
		label: impl Into<String>,
	) -> Self {
		Self {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			label: label.into(),
			properties: Properties::new(),
		}
	}

	/// Builder-style property setter.
	pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.properties.insert(key.into(), value.into());
		self
	}
}

/// Non-fatal problems found while ingesting or simulating a graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
	/// The edge names an endpoint that is not in the node set; it was dropped.
	DanglingEdge {
		/// The dropped edge.
		edge_id: String,
		/// The endpoint id that was not found.
		missing: String,
	},
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Diagnostic::DanglingEdge { edge_id, missing } => {
				write!(f, "edge `{edge_id}` references missing node `{missing}`")
			}
		}
	}
}

/// A property graph as returned by the extraction backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
	/// Entities, in extraction order.
	#[serde(default)]
	pub nodes: Vec<Node>,
	/// Relationships, in extraction order.
	#[serde(default)]
	pub edges: Vec<Edge>,
	/// Free-form data about the extraction run.
	#[serde(default, skip_serializing_if = "Properties::is_empty")]
	pub metadata: Properties,
}

impl Graph {
	/// Build a graph from parts, validating ids and types and dropping
	/// dangling edges.
	pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphError> {
		let mut graph = Self {
			nodes,
			edges,
			metadata: Properties::new(),
		};
		graph.validate()?;
		graph.prune_dangling_edges();
		Ok(graph)
	}

	/// Parse a `{ nodes, edges, metadata? }` payload.
	pub fn from_json(json: &str) -> Result<Self, GraphError> {
		let mut graph: Graph = serde_json::from_str(json)?;
		graph.validate()?;
		graph.prune_dangling_edges();
		Ok(graph)
	}

	/// Parse a payload destined for [`Graph::merge`]. Edges may name nodes
	/// that only exist in the graph it will be merged into, so nothing is
	/// pruned here.
	pub fn fragment_from_json(json: &str) -> Result<Self, GraphError> {
		let graph: Graph = serde_json::from_str(json)?;
		graph.validate()?;
		Ok(graph)
	}

	/// Checks the structural invariants that cannot be repaired silently.
	pub fn validate(&self) -> Result<(), GraphError> {
		let mut node_ids = HashSet::with_capacity(self.nodes.len());
		for node in &self.nodes {
			if node.node_type.trim().is_empty() {
				return Err(GraphError::EmptyNodeType {
					id: node.id.clone(),
				});
			}
			if !node_ids.insert(node.id.as_str()) {
				return Err(GraphError::DuplicateNodeId(node.id.clone()));
			}
		}
		let mut edge_ids = HashSet::with_capacity(self.edges.len());
		for edge in &self.edges {
			if !edge_ids.insert(edge.id.as_str()) {
				return Err(GraphError::DuplicateEdgeId(edge.id.clone()));
			}
		}
		Ok(())
	}

	/// Removes every edge whose source or target is not a node of this graph.
	pub fn prune_dangling_edges(&mut self) -> Vec<Diagnostic> {
		let node_ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
		let mut diagnostics = Vec::new();
		self.edges.retain(|edge| match dangling_endpoint(edge, &node_ids) {
			Some(missing) => {
				let diagnostic = Diagnostic::DanglingEdge {
					edge_id: edge.id.clone(),
					missing: missing.to_string(),
				};
				warn!("dropping {diagnostic}");
				diagnostics.push(diagnostic);
				false
			}
			None => true,
		});
		diagnostics
	}

	/// No nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Node with `id`.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Edge with `id`.
	pub fn edge(&self, id: &str) -> Option<&Edge> {
		self.edges.iter().find(|e| e.id == id)
	}

	/// Node id → position in `nodes`.
	pub fn node_index(&self) -> HashMap<&str, usize> {
		self.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.as_str(), i))
			.collect()
	}

	/// Ids of nodes joined to `id` by an edge in either direction.
	pub fn neighbors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.edges.iter().filter_map(move |e| {
			if e.source == id {
				Some(e.target.as_str())
			} else if e.target == id {
				Some(e.source.as_str())
			} else {
				None
			}
		})
	}
}

pub(crate) fn dangling_endpoint<'e>(edge: &'e Edge, node_ids: &HashSet<&str>) -> Option<&'e str> {
	if !node_ids.contains(edge.source.as_str()) {
		Some(edge.source.as_str())
	} else if !node_ids.contains(edge.target.as_str()) {
		Some(edge.target.as_str())
	} else {
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_payload_with_metadata_and_subtypes() {
		let graph = Graph::from_json(
			r#"{
				"nodes": [
					{"id": "a", "label": "Ada", "type": "Person (Employee)", "properties": {"name": "Ada Lovelace"}},
					{"id": "b", "label": "Acme", "type": "Organization"}
				],
				"edges": [{"id": "e1", "source": "a", "target": "b", "label": "WORKS_AT"}],
				"metadata": {"source": "extraction"}
			}"#,
		)
		.unwrap();

		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.nodes[0].node_type, "Person (Employee)");
		assert_eq!(graph.nodes[0].properties["name"], "Ada Lovelace");
		assert!(graph.nodes[1].properties.is_empty());
		assert_eq!(graph.edges[0].label, "WORKS_AT");
		assert_eq!(graph.metadata["source"], "extraction");
	}

	#[test]
	fn dangling_edge_is_dropped_not_fatal() {
		let graph = Graph::from_json(
			r#"{"nodes": [{"id": "A", "type": "Thing"}],
				"edges": [{"id": "e1", "source": "A", "target": "B"}]}"#,
		)
		.unwrap();
		assert_eq!(graph.nodes.len(), 1);
		assert!(graph.edges.is_empty());
	}

	#[test]
	fn prune_reports_missing_endpoint() {
		let mut graph = Graph {
			nodes: vec![Node::new("A", "A", "Thing")],
			edges: vec![Edge::new("e1", "A", "B", "rel"), Edge::new("e2", "C", "A", "rel")],
			..Graph::default()
		};
		let diagnostics = graph.prune_dangling_edges();
		assert_eq!(
			diagnostics,
			vec![
				Diagnostic::DanglingEdge {
					edge_id: "e1".into(),
					missing: "B".into()
				},
				Diagnostic::DanglingEdge {
					edge_id: "e2".into(),
					missing: "C".into()
				},
			]
		);
		assert!(graph.edges.is_empty());
	}

	#[test]
	fn rejects_empty_type_and_duplicate_ids() {
		let empty_type = Graph::from_json(r#"{"nodes": [{"id": "a", "type": "  "}]}"#);
		assert!(matches!(empty_type, Err(GraphError::EmptyNodeType { id }) if id == "a"));

		let dup = Graph::from_parts(
			vec![Node::new("a", "", "T"), Node::new("a", "", "T")],
			Vec::new(),
		);
		assert!(matches!(dup, Err(GraphError::DuplicateNodeId(id)) if id == "a"));

		let dup_edge = Graph::from_parts(
			vec![Node::new("a", "", "T")],
			vec![Edge::new("e", "a", "a", ""), Edge::new("e", "a", "a", "")],
		);
		assert!(matches!(dup_edge, Err(GraphError::DuplicateEdgeId(id)) if id == "e"));
	}

	#[test]
	fn fragment_keeps_edges_into_the_wider_graph() {
		let fragment = Graph::fragment_from_json(
			r#"{"nodes": [{"id": "b", "type": "Thing"}],
				"edges": [{"id": "e1", "source": "b", "target": "a"}]}"#,
		)
		.unwrap();
		assert_eq!(fragment.edges.len(), 1);

		let mut current = Graph::from_parts(vec![Node::new("a", "", "Thing")], Vec::new()).unwrap();
		let report = current.merge(&fragment);
		assert_eq!(report.added_edges, 1);
		assert!(report.dropped_edges.is_empty());
	}

	#[test]
	fn malformed_json_is_an_error() {
		assert!(matches!(Graph::from_json("{nodes"), Err(GraphError::Json(_))));
	}

	#[test]
	fn neighbors_follow_both_directions() {
		let graph = Graph::from_parts(
			vec![Node::new("a", "", "T"), Node::new("b", "", "T"), Node::new("c", "", "T")],
			vec![Edge::new("e1", "a", "b", ""), Edge::new("e2", "c", "a", "")],
		)
		.unwrap();
		let mut n: Vec<_> = graph.neighbors("a").collect();
		n.sort();
		assert_eq!(n, vec!["b", "c"]);
	}
}
