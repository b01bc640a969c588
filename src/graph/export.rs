//! Download formats. Every function here is a pure serializer.

use serde::Serialize;
use serde_json::Value;

use super::error::GraphError;
use super::model::{Graph, Properties};

#[derive(Serialize)]
struct NodeSummary<'a> {
	id: &'a str,
	label: &'a str,
	#[serde(rename = "type")]
	node_type: &'a str,
}

#[derive(Serialize)]
struct EdgeSummary<'a> {
	id: &'a str,
	source: &'a str,
	target: &'a str,
	label: &'a str,
}

#[derive(Serialize)]
struct GraphSummary<'a> {
	nodes: Vec<NodeSummary<'a>>,
	edges: Vec<EdgeSummary<'a>>,
}

/// Pretty JSON. With `include_properties` the dump is lossless; without it
/// nodes keep only `id`/`label`/`type` and edges `id`/`source`/`target`/`label`.
pub fn graph_json(graph: &Graph, include_properties: bool) -> Result<String, GraphError> {
	if include_properties {
		return Ok(serde_json::to_string_pretty(graph)?);
	}
	let summary = GraphSummary {
		nodes: graph
			.nodes
			.iter()
			.map(|n| NodeSummary {
				id: &n.id,
				label: &n.label,
				node_type: &n.node_type,
			})
			.collect(),
		edges: graph
			.edges
			.iter()
			.map(|e| EdgeSummary {
				id: &e.id,
				source: &e.source,
				target: &e.target,
				label: &e.label,
			})
			.collect(),
	};
	Ok(serde_json::to_string_pretty(&summary)?)
}

/// One `CREATE` per node and per relationship, run as a single statement.
pub fn cypher_script(graph: &Graph, include_properties: bool) -> String {
	let index = graph.node_index();
	let mut lines = Vec::with_capacity(graph.nodes.len() + graph.edges.len());

	for (i, node) in graph.nodes.iter().enumerate() {
		let mut fields = vec![
			format!("id: {}", quoted(&node.id)),
			format!("label: {}", quoted(&node.label)),
		];
		if include_properties {
			fields.extend(cypher_fields(&node.properties));
		}
		lines.push(format!(
			"CREATE (n{i}:{} {{{}}})",
			cypher_name(&node.node_type),
			fields.join(", ")
		));
	}

	for edge in &graph.edges {
		let (Some(s), Some(t)) = (
			index.get(edge.source.as_str()),
			index.get(edge.target.as_str()),
		) else {
			continue;
		};
		let mut fields = vec![format!("id: {}", quoted(&edge.id))];
		if include_properties {
			fields.extend(cypher_fields(&edge.properties));
		}
		lines.push(format!(
			"CREATE (n{s})-[:{} {{{}}}]->(n{t})",
			cypher_name(relationship_type(&edge.label)),
			fields.join(", ")
		));
	}

	if lines.is_empty() {
		return String::new();
	}
	let mut script = lines.join("\n");
	script.push_str(";\n");
	script
}

/// `addV` per node and `addE` per edge, one traversal per line.
pub fn gremlin_script(graph: &Graph, include_properties: bool) -> String {
	let mut script = String::new();

	for node in &graph.nodes {
		script.push_str(&format!(
			"g.addV({}).property('id', {}).property('label_text', {})",
			quoted(&node.node_type),
			quoted(&node.id),
			quoted(&node.label)
		));
		if include_properties {
			script.push_str(&gremlin_chain(&node.properties, &["id", "label_text"]));
		}
		script.push_str(".next()\n");
	}

	for edge in &graph.edges {
		script.push_str(&format!(
			"g.V().has('id', {}).addE({}).to(__.V().has('id', {})).property('id', {})",
			quoted(&edge.source),
			quoted(relationship_type(&edge.label)),
			quoted(&edge.target),
			quoted(&edge.id)
		));
		if include_properties {
			script.push_str(&gremlin_chain(&edge.properties, &["id"]));
		}
		script.push_str(".next()\n");
	}

	script
}

/// Both query languages need a non-empty relationship type.
fn relationship_type(label: &str) -> &str {
	if label.trim().is_empty() { "RELATED_TO" } else { label }
}

fn cypher_fields(properties: &Properties) -> impl Iterator<Item = String> + '_ {
	properties
		.iter()
		.filter(|(key, _)| key.as_str() != "id" && key.as_str() != "label")
		.filter_map(|(key, value)| Some(format!("{}: {}", cypher_name(key), literal(value)?)))
}

/// `.property(..)` steps, skipping keys the traversal already wrote.
fn gremlin_chain(properties: &Properties, written: &[&str]) -> String {
	properties
		.iter()
		.filter(|(key, _)| !written.contains(&key.as_str()))
		.filter_map(|(key, value)| Some(format!(".property({}, {})", quoted(key), literal(value)?)))
		.collect()
}

/// Scalar literal shared by both scripts; nulls are omitted and structured
/// values are embedded as their JSON text.
fn literal(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::Bool(b) => Some(b.to_string()),
		Value::Number(n) => Some(n.to_string()),
		Value::String(s) => Some(quoted(s)),
		structured => Some(quoted(&structured.to_string())),
	}
}

fn quoted(s: &str) -> String {
	let mut out = String::with_capacity(s.len() + 2);
	out.push('\'');
	for c in s.chars() {
		match c {
			'\\' => out.push_str("\\\\"),
			'\'' => out.push_str("\\'"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			_ => out.push(c),
		}
	}
	out.push('\'');
	out
}

fn is_identifier(s: &str) -> bool {
	let mut chars = s.chars();
	matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Label or relationship type, backticked when it is not a bare identifier.
fn cypher_name(s: &str) -> String {
	if is_identifier(s) {
		s.to_string()
	} else {
		format!("`{}`", s.replace('`', "``"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Edge, Node};

	fn sample() -> Graph {
		Graph::from_parts(
			vec![
				Node::new("a", "Ada", "Person (Employee)")
					.with_property("name", "Ada O'Hara")
					.with_property("born", 1815)
					.with_property("alias", serde_json::Value::Null),
				Node::new("b", "Acme", "Organization").with_property("tags", serde_json::json!(["x"])),
			],
			vec![Edge::new("e1", "a", "b", "WORKS_AT").with_property("since", 2020)],
		)
		.unwrap()
	}

	#[test]
	fn lossless_json_round_trip() {
		let graph = sample();
		let json = graph_json(&graph, true).unwrap();
		let parsed = Graph::from_json(&json).unwrap();
		assert_eq!(parsed, graph);
	}

	#[test]
	fn stripped_json_keeps_only_identity_fields() {
		let json = graph_json(&sample(), false).unwrap();
		let value: Value = serde_json::from_str(&json).unwrap();

		let node = value["nodes"][0].as_object().unwrap();
		let mut keys: Vec<_> = node.keys().map(String::as_str).collect();
		keys.sort();
		assert_eq!(keys, vec!["id", "label", "type"]);

		let edge = value["edges"][0].as_object().unwrap();
		let mut keys: Vec<_> = edge.keys().map(String::as_str).collect();
		keys.sort();
		assert_eq!(keys, vec!["id", "label", "source", "target"]);

		let parsed = Graph::from_json(&json).unwrap();
		assert!(parsed.nodes.iter().all(|n| n.properties.is_empty()));
		assert_eq!(parsed.edges.len(), 1);
	}

	#[test]
	fn cypher_inlines_properties() {
		let script = cypher_script(&sample(), true);
		let lines: Vec<_> = script.lines().collect();
		assert_eq!(
			lines[0],
			"CREATE (n0:`Person (Employee)` {id: 'a', label: 'Ada', name: 'Ada O\\'Hara', born: 1815})"
		);
		assert_eq!(lines[1], "CREATE (n1:Organization {id: 'b', label: 'Acme', tags: '[\"x\"]'})");
		assert_eq!(lines[2], "CREATE (n0)-[:WORKS_AT {id: 'e1', since: 2020}]->(n1);");
	}

	#[test]
	fn cypher_without_properties() {
		let script = cypher_script(&sample(), false);
		assert!(script.contains("CREATE (n0:`Person (Employee)` {id: 'a', label: 'Ada'})"));
		assert!(!script.contains("since"));
		assert_eq!(cypher_script(&Graph::default(), true), "");
	}

	#[test]
	fn gremlin_chains_properties() {
		let script = gremlin_script(&sample(), true);
		let lines: Vec<_> = script.lines().collect();
		assert_eq!(
			lines[0],
			"g.addV('Person (Employee)').property('id', 'a').property('label_text', 'Ada')\
			 .property('name', 'Ada O\\'Hara').property('born', 1815).next()"
		);
		assert_eq!(
			lines[2],
			"g.V().has('id', 'a').addE('WORKS_AT').to(__.V().has('id', 'b'))\
			 .property('id', 'e1').property('since', 2020).next()"
		);
		assert!(!gremlin_script(&sample(), false).contains("since"));
	}

	#[test]
	fn gremlin_label_text_is_written_once() {
		let graph = Graph::from_parts(
			vec![Node::new("a", "Ada", "Person").with_property("label_text", "shadow")],
			Vec::new(),
		)
		.unwrap();
		let script = gremlin_script(&graph, true);
		assert_eq!(script.matches("'label_text'").count(), 1);
		assert!(!script.contains("shadow"));
	}
}
