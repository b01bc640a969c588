use std::collections::HashMap;

use log::{debug, info};

use super::model::{Diagnostic, Graph, Properties};

/// Outcome of an append-mode merge.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeReport {
	/// Nodes whose id was new.
	pub added_nodes: usize,
	/// Nodes that matched an existing id.
	pub merged_nodes: usize,
	/// Edges whose id was new.
	pub added_edges: usize,
	/// Edges that matched an existing id.
	pub merged_edges: usize,
	/// Edges left without an endpoint after the merge.
	pub dropped_edges: Vec<Diagnostic>,
}

impl Graph {
	/// Append `incoming` into this graph.
	///
	/// Nodes and edges are matched by id. A match keeps its own label, type,
	/// endpoints and position, and takes the incoming property values key by
	/// key (incoming wins). Unmatched entries are appended; new nodes start
	/// unplaced. Merging the same payload twice is the same as merging it once.
	pub fn merge(&mut self, incoming: &Graph) -> MergeReport {
		let mut report = MergeReport::default();

		let mut node_slots: HashMap<String, usize> = self
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();
		for node in &incoming.nodes {
			match node_slots.get(&node.id) {
				Some(&slot) => {
					merge_properties(&mut self.nodes[slot].properties, &node.properties);
					report.merged_nodes += 1;
				}
				None => {
					let mut fresh = node.clone();
					fresh.position = None;
					fresh.pinned = false;
					node_slots.insert(fresh.id.clone(), self.nodes.len());
					self.nodes.push(fresh);
					report.added_nodes += 1;
				}
			}
		}

		let mut edge_slots: HashMap<String, usize> = self
			.edges
			.iter()
			.enumerate()
			.map(|(i, e)| (e.id.clone(), i))
			.collect();
		for edge in &incoming.edges {
			match edge_slots.get(&edge.id) {
				Some(&slot) => {
					merge_properties(&mut self.edges[slot].properties, &edge.properties);
					report.merged_edges += 1;
				}
				None => {
					edge_slots.insert(edge.id.clone(), self.edges.len());
					self.edges.push(edge.clone());
					report.added_edges += 1;
				}
			}
		}

		merge_properties(&mut self.metadata, &incoming.metadata);
		report.dropped_edges = self.prune_dangling_edges();
		report.added_edges -= report.dropped_edges.len().min(report.added_edges);

		info!(
			"merged graph: +{} nodes ({} updated), +{} edges ({} updated)",
			report.added_nodes, report.merged_nodes, report.added_edges, report.merged_edges
		);
		report
	}
}

fn merge_properties(into: &mut Properties, from: &Properties) {
	for (key, value) in from {
		if into.get(key) != Some(value) {
			debug!("property `{key}` updated by merge");
			into.insert(key.clone(), value.clone());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Edge, Node};

	fn payload() -> Graph {
		Graph::from_parts(
			vec![
				Node::new("a", "Ada", "Person").with_property("born", 1815),
				Node::new("b", "Babbage", "Person"),
			],
			vec![Edge::new("e1", "a", "b", "KNOWS")],
		)
		.unwrap()
	}

	#[test]
	fn merging_twice_equals_merging_once() {
		let mut once = Graph::default();
		once.merge(&payload());

		let mut twice = Graph::default();
		twice.merge(&payload());
		let second = twice.merge(&payload());

		assert_eq!(once, twice);
		assert_eq!(second.added_nodes, 0);
		assert_eq!(second.merged_nodes, 2);
		assert_eq!(second.added_edges, 0);
	}

	#[test]
	fn existing_nodes_keep_position_and_take_new_properties() {
		let mut current = Graph::from_parts(
			vec![Node::new("a", "Ada", "Person").at(10.0, 20.0).with_property("born", 1800)],
			Vec::new(),
		)
		.unwrap();
		let mut update = payload();
		update.nodes[0].label = "Someone else".into();
		update.nodes[1] = update.nodes[1].clone().at(5.0, 5.0);

		let report = current.merge(&update);

		let a = current.node("a").unwrap();
		assert_eq!(a.label, "Ada");
		assert_eq!(a.properties["born"], 1815);
		assert_eq!(a.position.map(|p| (p.x, p.y)), Some((10.0, 20.0)));
		assert_eq!(current.node("b").unwrap().position, None);
		assert_eq!(report.added_nodes, 1);
		assert_eq!(report.merged_nodes, 1);
		assert_eq!(report.added_edges, 1);
	}

	#[test]
	fn dangling_incoming_edges_are_dropped() {
		let mut current = Graph::from_parts(vec![Node::new("a", "", "T")], Vec::new()).unwrap();
		let incoming = Graph {
			edges: vec![Edge::new("e9", "a", "ghost", "")],
			..Graph::default()
		};
		let report = current.merge(&incoming);
		assert!(current.edges.is_empty());
		assert_eq!(report.added_edges, 0);
		assert_eq!(report.dropped_edges.len(), 1);
	}
}
