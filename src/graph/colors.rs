//! Node type → display colour.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::GraphError;
use super::model::Graph;

/// Key of the fallback entry in [`DEFAULT_COLORS`].
pub const DEFAULT_COLOR_KEY: &str = "default";

/// Built-in palette (category10).
pub const DEFAULT_COLORS: &[(&str, &str)] = &[
	("Person", "#1f77b4"),
	("Organization", "#ff7f0e"),
	("Location", "#2ca02c"),
	("Event", "#d62728"),
	("Concept", "#9467bd"),
	("Product", "#8c564b"),
	("Technology", "#e377c2"),
	("Document", "#bcbd22"),
	("Date", "#17becf"),
	(DEFAULT_COLOR_KEY, "#7f7f7f"),
];

/// Colour for a type in the built-in table, if it has one.
pub fn default_color_for(node_type: &str) -> Option<&'static str> {
	DEFAULT_COLORS
		.iter()
		.find(|(t, _)| *t == node_type)
		.map(|(_, c)| *c)
}

/// The table's `default` entry.
pub fn fallback_color() -> &'static str {
	default_color_for(DEFAULT_COLOR_KEY).unwrap_or("#7f7f7f")
}

/// Session colour assignments, seeded from [`DEFAULT_COLORS`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorMap {
	entries: BTreeMap<String, String>,
}

impl Default for ColorMap {
	fn default() -> Self {
		Self {
			entries: DEFAULT_COLORS
				.iter()
				.map(|(t, c)| (t.to_string(), c.to_string()))
				.collect(),
		}
	}
}

impl ColorMap {
	/// Defaults restricted to the types present in `graph`.
	pub fn for_graph(graph: &Graph) -> Self {
		let mut map = Self::default();
		map.reset(graph);
		map
	}

	/// Session entry, then built-in table, then the table's `default`.
	pub fn color_for(&self, node_type: &str) -> &str {
		self.entries
			.get(node_type)
			.map(String::as_str)
			.or_else(|| default_color_for(node_type))
			.unwrap_or_else(|| fallback_color())
	}

	/// Override one type's colour; other entries are untouched.
	pub fn set(&mut self, node_type: impl Into<String>, color: &str) -> Result<(), GraphError> {
		let color = color.trim();
		if !is_hex_color(color) {
			return Err(GraphError::InvalidColor(color.to_string()));
		}
		self.entries.insert(node_type.into(), color.to_ascii_lowercase());
		Ok(())
	}

	/// Back to the built-in table, keeping only types that occur in `graph`.
	pub fn reset(&mut self, graph: &Graph) {
		self.entries = graph
			.nodes
			.iter()
			.filter_map(|n| {
				default_color_for(&n.node_type).map(|c| (n.node_type.clone(), c.to_string()))
			})
			.collect();
	}

	/// Every type with a colour, built-in or overridden.
	pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().map(|(t, c)| (t.as_str(), c.as_str()))
	}

	/// Legend rows for the types in `graph`, in first-seen order.
	pub fn legend(&self, graph: &Graph) -> Vec<(String, String)> {
		let mut rows: Vec<(String, String)> = Vec::new();
		for node in &graph.nodes {
			if !rows.iter().any(|(t, _)| *t == node.node_type) {
				rows.push((node.node_type.clone(), self.color_for(&node.node_type).to_string()));
			}
		}
		rows
	}
}

fn is_hex_color(s: &str) -> bool {
	match s.strip_prefix('#') {
		Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::Node;

	#[test]
	fn unknown_type_falls_back_to_default_entry() {
		let map = ColorMap::default();
		assert_eq!(map.color_for("Spaceship"), "#7f7f7f");
		assert_eq!(map.color_for("Person"), "#1f77b4");
	}

	#[test]
	fn override_is_per_type() {
		let mut map = ColorMap::default();
		let before = map.color_for("Organization").to_string();
		map.set("Person", "#ABCDEF").unwrap();
		assert_eq!(map.color_for("Person"), "#abcdef");
		assert_eq!(map.color_for("Organization"), before);
		assert_eq!(map.color_for("Spaceship"), "#7f7f7f");
	}

	#[test]
	fn override_for_unlisted_type() {
		let mut map = ColorMap::default();
		map.set("Spaceship", "#123").unwrap();
		assert_eq!(map.color_for("Spaceship"), "#123");
		assert_eq!(map.color_for("Submarine"), "#7f7f7f");
	}

	#[test]
	fn rejects_non_hex_colors() {
		let mut map = ColorMap::default();
		assert!(matches!(map.set("Person", "red"), Err(GraphError::InvalidColor(_))));
		assert!(map.set("Person", "#12345").is_err());
		assert_eq!(map.color_for("Person"), "#1f77b4");
	}

	#[test]
	fn reset_keeps_only_present_types() {
		let graph = Graph::from_parts(
			vec![Node::new("a", "", "Person"), Node::new("b", "", "Spaceship")],
			Vec::new(),
		)
		.unwrap();
		let mut map = ColorMap::default();
		map.set("Person", "#000000").unwrap();
		map.set("Location", "#111111").unwrap();
		map.reset(&graph);

		let entries: Vec<_> = map.entries().collect();
		assert_eq!(entries, vec![("Person", "#1f77b4")]);
		assert_eq!(map.color_for("Location"), "#2ca02c");
		assert_eq!(map.color_for("Spaceship"), "#7f7f7f");
	}

	#[test]
	fn legend_lists_types_once_in_order() {
		let graph = Graph::from_parts(
			vec![
				Node::new("a", "", "Location"),
				Node::new("b", "", "Person"),
				Node::new("c", "", "Location"),
			],
			Vec::new(),
		)
		.unwrap();
		let legend = ColorMap::for_graph(&graph).legend(&graph);
		assert_eq!(
			legend,
			vec![
				("Location".to_string(), "#2ca02c".to_string()),
				("Person".to_string(), "#1f77b4".to_string()),
			]
		);
	}
}
