//! Structural metrics over a graph snapshot.
//!
//! Everything here is a pure function of the [`Graph`]: no simulation or UI
//! state is read, and ordering is fully determined by node and edge order so
//! repeated runs serialise identically.

use std::collections::HashMap;

use serde::Serialize;

use super::label::{node_display_label, split_type};
use super::model::Graph;

/// How many nodes [`GraphAnalytics::central_nodes`] lists.
pub const CENTRAL_NODE_COUNT: usize = 5;
/// How many relationship types the edge chart shows.
pub const TOP_EDGE_LABELS: usize = 10;

/// A node and how many edge ends touch it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeDegree {
	/// Node id.
	pub id: String,
	/// Display label.
	pub label: String,
	/// Node type.
	#[serde(rename = "type")]
	pub node_type: String,
	/// Incident edge ends; a self-loop counts once.
	pub degree: usize,
}

/// One bar of a distribution chart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Count {
	/// Type or relationship label.
	pub key: String,
	/// Occurrences of `key`.
	pub count: usize,
}

/// Everything the analytics view shows, computed in one pass by [`analyze`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GraphAnalytics {
	/// Number of nodes.
	pub node_count: usize,
	/// Number of edges, duplicates and self-loops included.
	pub edge_count: usize,
	/// See [`density`].
	pub density: f64,
	/// Mean of `degrees`.
	pub average_degree: f64,
	/// Every node in graph order.
	pub degrees: Vec<NodeDegree>,
	/// Highest degree first, ties in graph order, at most [`CENTRAL_NODE_COUNT`].
	pub central_nodes: Vec<NodeDegree>,
	/// Ids of nodes with no edges.
	pub isolated_nodes: Vec<String>,
	/// Full node types, first-seen order.
	pub node_types: Vec<Count>,
	/// Node types with any parenthetical subtype stripped.
	pub base_types: Vec<Count>,
	/// Relationship labels, most frequent first.
	pub edge_labels: Vec<Count>,
	/// `edge_labels` cut to [`TOP_EDGE_LABELS`].
	pub top_edge_labels: Vec<Count>,
}

/// `2|E| / (|V|(|V|-1))`, or 0 with fewer than two nodes.
pub fn density(graph: &Graph) -> f64 {
	let v = graph.nodes.len();
	if v < 2 {
		return 0.0;
	}
	(2 * graph.edges.len()) as f64 / (v * (v - 1)) as f64
}

/// Degree of every node, in node order. An edge counts once for each
/// distinct endpoint, so a self-loop adds one.
pub fn degrees(graph: &Graph) -> Vec<NodeDegree> {
	let index = graph.node_index();
	let mut counts = vec![0usize; graph.nodes.len()];
	for edge in &graph.edges {
		let source = index.get(edge.source.as_str());
		let target = index.get(edge.target.as_str());
		if let Some(&s) = source {
			counts[s] += 1;
		}
		if let Some(&t) = target {
			if source != Some(&t) {
				counts[t] += 1;
			}
		}
	}
	graph
		.nodes
		.iter()
		.zip(counts)
		.map(|(node, degree)| NodeDegree {
			id: node.id.clone(),
			label: node_display_label(node),
			node_type: node.node_type.clone(),
			degree,
		})
		.collect()
}

/// Highest-degree nodes, descending; ties keep node order.
pub fn central_nodes(degrees: &[NodeDegree], n: usize) -> Vec<NodeDegree> {
	let mut ranked = degrees.to_vec();
	ranked.sort_by(|a, b| b.degree.cmp(&a.degree));
	ranked.truncate(n);
	ranked
}

/// Ids of nodes with no incident edge.
pub fn isolated_nodes(degrees: &[NodeDegree]) -> Vec<String> {
	degrees
		.iter()
		.filter(|d| d.degree == 0)
		.map(|d| d.id.clone())
		.collect()
}

/// Occurrences per key, descending; ties keep first-encountered order.
pub fn distribution<'a>(keys: impl IntoIterator<Item = &'a str>) -> Vec<Count> {
	let mut slots: HashMap<&str, usize> = HashMap::new();
	let mut counts: Vec<Count> = Vec::new();
	for key in keys {
		match slots.get(key) {
			Some(&slot) => counts[slot].count += 1,
			None => {
				slots.insert(key, counts.len());
				counts.push(Count {
					key: key.to_string(),
					count: 1,
				});
			}
		}
	}
	counts.sort_by(|a, b| b.count.cmp(&a.count));
	counts
}

/// Full analytics report.
pub fn analyze(graph: &Graph) -> GraphAnalytics {
	let degrees = degrees(graph);
	let edge_labels = distribution(graph.edges.iter().map(|e| e.label.as_str()));
	let average_degree = if degrees.is_empty() {
		0.0
	} else {
		degrees.iter().map(|d| d.degree).sum::<usize>() as f64 / degrees.len() as f64
	};

	GraphAnalytics {
		node_count: graph.nodes.len(),
		edge_count: graph.edges.len(),
		density: density(graph),
		average_degree,
		central_nodes: central_nodes(&degrees, CENTRAL_NODE_COUNT),
		isolated_nodes: isolated_nodes(&degrees),
		node_types: distribution(graph.nodes.iter().map(|n| n.node_type.as_str())),
		base_types: distribution(graph.nodes.iter().map(|n| split_type(&n.node_type).0)),
		top_edge_labels: edge_labels.iter().take(TOP_EDGE_LABELS).cloned().collect(),
		edge_labels,
		degrees,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Edge, Node};

	fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> Graph {
		Graph::from_parts(
			nodes.iter().map(|id| Node::new(*id, *id, "Thing")).collect(),
			edges
				.iter()
				.enumerate()
				.map(|(i, (s, t))| Edge::new(format!("e{i}"), *s, *t, "rel"))
				.collect(),
		)
		.unwrap()
	}

	#[test]
	fn complete_graph_on_four_nodes_has_unit_density() {
		let g = graph(
			&["a", "b", "c", "d"],
			&[("a", "b"), ("a", "c"), ("a", "d"), ("b", "c"), ("b", "d"), ("c", "d")],
		);
		assert_eq!(density(&g), 1.0);
	}

	#[test]
	fn single_node_has_zero_density() {
		let g = graph(&["a"], &[("a", "a"), ("a", "a")]);
		assert_eq!(density(&g), 0.0);
		assert_eq!(density(&Graph::default()), 0.0);
	}

	#[test]
	fn degrees_count_both_directions() {
		let g = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
		let d: Vec<_> = degrees(&g).into_iter().map(|d| (d.id, d.degree)).collect();
		assert_eq!(d, vec![("A".into(), 1), ("B".into(), 2), ("C".into(), 1)]);
		assert!(isolated_nodes(&degrees(&g)).is_empty());
	}

	#[test]
	fn self_loop_counts_once() {
		let g = graph(&["a"], &[("a", "a")]);
		assert_eq!(degrees(&g)[0].degree, 1);
	}

	#[test]
	fn central_ranking_is_stable_and_deterministic() {
		let g = graph(
			&["a", "b", "c", "d", "e", "f", "g"],
			&[("a", "b"), ("c", "d"), ("e", "f"), ("b", "c")],
		);
		let first = analyze(&g);
		let second = analyze(&g);
		let ids: Vec<_> = first.central_nodes.iter().map(|d| d.id.as_str()).collect();
		assert_eq!(ids, vec!["b", "c", "a", "d", "e"]);
		assert_eq!(first, second);
		assert_eq!(
			serde_json::to_string(&first).unwrap(),
			serde_json::to_string(&second).unwrap()
		);
		assert_eq!(first.isolated_nodes, vec!["g".to_string()]);
	}

	#[test]
	fn edge_labels_are_capped_and_tie_broken_by_first_seen() {
		let nodes: Vec<Node> = (0..2).map(|i| Node::new(format!("n{i}"), "", "T")).collect();
		let mut edges = Vec::new();
		for i in 0..12 {
			edges.push(Edge::new(format!("e{i}"), "n0", "n1", format!("L{i}")));
		}
		edges.push(Edge::new("extra", "n0", "n1", "L11"));
		let g = Graph::from_parts(nodes, edges).unwrap();

		let report = analyze(&g);
		assert_eq!(report.edge_labels.len(), 12);
		assert_eq!(report.top_edge_labels.len(), TOP_EDGE_LABELS);
		assert_eq!(report.top_edge_labels[0].key, "L11");
		assert_eq!(report.top_edge_labels[0].count, 2);
		assert_eq!(report.top_edge_labels[1].key, "L0");
		assert_eq!(report.top_edge_labels[9].key, "L8");
	}

	#[test]
	fn type_distributions_split_subtypes() {
		let g = Graph::from_parts(
			vec![
				Node::new("a", "", "Person (Employee)"),
				Node::new("b", "", "Person"),
				Node::new("c", "", "Organization"),
			],
			Vec::new(),
		)
		.unwrap();
		let report = analyze(&g);
		assert_eq!(report.node_types.len(), 3);
		assert_eq!(
			report.base_types,
			vec![
				Count {
					key: "Person".into(),
					count: 2
				},
				Count {
					key: "Organization".into(),
					count: 1
				},
			]
		);
	}

	#[test]
	fn empty_graph_reports_zeroes() {
		let report = analyze(&Graph::default());
		assert_eq!(report.node_count, 0);
		assert_eq!(report.density, 0.0);
		assert_eq!(report.average_degree, 0.0);
		assert!(report.central_nodes.is_empty());
		assert!(report.node_types.is_empty());
	}
}
