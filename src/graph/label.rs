//! Display labels and type taxonomy shared by every view of the graph.
//!
//! Nodes resolve their label through `properties.name`, `properties.title`,
//! `label`, then `id`; edges through `properties.name`, `label`, then `id`.
//! Blank values are skipped. Non-string scalars print as their JSON text.

use serde_json::Value;

use super::model::{Edge, Node, Properties};

/// Text drawn next to a node.
pub fn node_display_label(node: &Node) -> String {
	property_text(&node.properties, "name")
		.or_else(|| property_text(&node.properties, "title"))
		.or_else(|| non_blank(&node.label))
		.unwrap_or_else(|| node.id.clone())
}

/// Text drawn along an edge.
pub fn edge_display_label(edge: &Edge) -> String {
	property_text(&edge.properties, "name")
		.or_else(|| non_blank(&edge.label))
		.unwrap_or_else(|| edge.id.clone())
}

/// Splits `"Person (Employee)"` into `("Person", Some("Employee"))`.
pub fn split_type(node_type: &str) -> (&str, Option<&str>) {
	let trimmed = node_type.trim();
	if let Some(open) = trimmed.find('(') {
		if let Some(rest) = trimmed.strip_suffix(')') {
			let base = trimmed[..open].trim_end();
			let sub = rest[open + 1..].trim();
			if !base.is_empty() && !sub.is_empty() {
				return (base, Some(sub));
			}
		}
	}
	(trimmed, None)
}

fn property_text(properties: &Properties, key: &str) -> Option<String> {
	match properties.get(key)? {
		Value::String(s) => non_blank(s),
		Value::Null | Value::Array(_) | Value::Object(_) => None,
		scalar => Some(scalar.to_string()),
	}
}

fn non_blank(s: &str) -> Option<String> {
	let t = s.trim();
	(!t.is_empty()).then(|| t.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn node_label_fallback_chain() {
		let bare = Node::new("n1", "", "Person");
		assert_eq!(node_display_label(&bare), "n1");

		let labelled = Node::new("n1", "Ada", "Person");
		assert_eq!(node_display_label(&labelled), "Ada");

		let titled = labelled.clone().with_property("title", "Countess");
		assert_eq!(node_display_label(&titled), "Countess");

		let named = titled.with_property("name", "Ada Lovelace");
		assert_eq!(node_display_label(&named), "Ada Lovelace");
	}

	#[test]
	fn blank_and_structured_properties_are_skipped() {
		let node = Node::new("n1", "Ada", "Person")
			.with_property("name", "   ")
			.with_property("title", serde_json::json!(["a", "b"]));
		assert_eq!(node_display_label(&node), "Ada");

		let numeric = Node::new("n2", "", "Year").with_property("name", 1843);
		assert_eq!(node_display_label(&numeric), "1843");
	}

	#[test]
	fn edge_label_fallback_chain() {
		let edge = Edge::new("e1", "a", "b", "");
		assert_eq!(edge_display_label(&edge), "e1");
		let edge = Edge::new("e1", "a", "b", "KNOWS");
		assert_eq!(edge_display_label(&edge), "KNOWS");
		let edge = edge.with_property("name", "knows well");
		assert_eq!(edge_display_label(&edge), "knows well");
	}

	#[test]
	fn splits_parenthetical_subtype() {
		assert_eq!(split_type("Person (Employee)"), ("Person", Some("Employee")));
		assert_eq!(split_type("Organization"), ("Organization", None));
		assert_eq!(split_type("(Odd)"), ("(Odd)", None));
		assert_eq!(split_type("Place ()"), ("Place ()", None));
	}
}
