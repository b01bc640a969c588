//! The "current graph" of a browser session and the bookkeeping that keeps
//! late network responses from overwriting newer data.

use std::collections::HashMap;

use log::{debug, info};

use super::error::GraphError;
use super::merge::MergeReport;
use super::model::{Graph, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RequestKind {
	/// Backend extraction producing a whole graph.
	Generation,
	/// Web search / Wikipedia lookups that add to the current graph.
	Enrichment,
}

/// Handed out when a request is issued and presented again on completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTicket {
	kind: RequestKind,
	generation: u64,
	graph_version: u64,
}

/// How a generation result is combined with the current graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeMode {
	/// Discard the current graph.
	#[default]
	Replace,
	/// Merge into the current graph by id.
	Append,
}

/// Result of presenting a ticket.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
	/// The response was applied.
	Applied(T),
	/// The graph the request was issued against has been superseded.
	Stale,
}

impl<T> Outcome<T> {
	/// Whether the response was dropped.
	pub fn is_stale(&self) -> bool {
		matches!(self, Outcome::Stale)
	}
}

/// The current graph plus a counter of structural changes to it. Positions
/// recorded from the layout are not structural.
#[derive(Clone, Debug, Default)]
pub struct GraphSession {
	graph: Graph,
	version: u64,
	latest_generation: u64,
	generation_pending: bool,
}

impl GraphSession {
	/// Start a session on `graph`, as if it had just been generated.
	pub fn new(graph: Graph) -> Self {
		Self {
			graph,
			..Self::default()
		}
	}

	/// The current graph.
	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	/// Bumped on every structural change.
	pub fn version(&self) -> u64 {
		self.version
	}

	fn changed(&mut self) -> &mut Graph {
		self.version = self.version.wrapping_add(1);
		&mut self.graph
	}

	/// True while a generation request is in flight; the canvas must not
	/// keep simulating the graph that is about to be replaced.
	pub fn is_layout_suspended(&self) -> bool {
		self.generation_pending
	}

	/// Issue a generation request. Any earlier generation ticket becomes stale.
	pub fn begin_generation(&mut self) -> RequestTicket {
		self.latest_generation += 1;
		self.generation_pending = true;
		RequestTicket {
			kind: RequestKind::Generation,
			generation: self.latest_generation,
			graph_version: self.version,
		}
	}

	/// Issue an enrichment request against the graph as it is now.
	pub fn begin_enrichment(&self) -> RequestTicket {
		RequestTicket {
			kind: RequestKind::Enrichment,
			generation: self.latest_generation,
			graph_version: self.version,
		}
	}

	/// Whether a response carrying `ticket` may still be applied.
	pub fn is_current(&self, ticket: &RequestTicket) -> bool {
		match ticket.kind {
			RequestKind::Generation => ticket.generation == self.latest_generation,
			RequestKind::Enrichment => {
				ticket.generation == self.latest_generation
					&& ticket.graph_version == self.version
			}
		}
	}

	/// Apply an extraction result, replacing or appending per `mode`.
	pub fn complete_generation(
		&mut self,
		ticket: RequestTicket,
		payload: Graph,
		mode: MergeMode,
	) -> Outcome<MergeReport> {
		if ticket.kind != RequestKind::Generation || !self.is_current(&ticket) {
			debug!("ignoring stale generation response {ticket:?}");
			return Outcome::Stale;
		}
		self.generation_pending = false;
		let report = match mode {
			MergeMode::Append => self.changed().merge(&payload),
			MergeMode::Replace => {
				let mut fresh = payload;
				let dropped_edges = fresh.prune_dangling_edges();
				let report = MergeReport {
					added_nodes: fresh.nodes.len(),
					added_edges: fresh.edges.len(),
					dropped_edges,
					..MergeReport::default()
				};
				*self.changed() = fresh;
				report
			}
		};
		info!(
			"graph v{} now has {} nodes, {} edges",
			self.version,
			self.graph().nodes.len(),
			self.graph().edges.len()
		);
		Outcome::Applied(report)
	}

	/// Abandon the in-flight generation (e.g. the backend call failed).
	pub fn fail_generation(&mut self, ticket: RequestTicket) {
		if ticket.kind == RequestKind::Generation && self.is_current(&ticket) {
			self.generation_pending = false;
		}
	}

	/// Merge an enrichment result. Third-party failures come back as the
	/// error so the host can show them; stale responses are dropped.
	pub fn complete_enrichment(
		&mut self,
		ticket: RequestTicket,
		result: Result<Graph, GraphError>,
	) -> Result<Outcome<MergeReport>, GraphError> {
		if ticket.kind != RequestKind::Enrichment || !self.is_current(&ticket) {
			debug!("ignoring stale enrichment response {ticket:?}");
			return Ok(Outcome::Stale);
		}
		let addition = result?;
		Ok(Outcome::Applied(self.changed().merge(&addition)))
	}

	/// Store laid-out positions without counting it as a structural change.
	pub fn record_positions<'a>(&mut self, positions: impl IntoIterator<Item = (&'a str, Position)>) {
		let graph = &mut self.graph;
		let index: HashMap<String, usize> = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();
		for (id, position) in positions {
			if let Some(&i) = index.get(id) {
				graph.nodes[i].position = Some(position);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Edge, Node};

	fn payload(ids: &[&str]) -> Graph {
		Graph::from_parts(ids.iter().map(|id| Node::new(*id, *id, "Thing")).collect(), Vec::new()).unwrap()
	}

	#[test]
	fn newer_generation_supersedes_older() {
		let mut session = GraphSession::default();
		let first = session.begin_generation();
		let second = session.begin_generation();
		assert!(session.is_layout_suspended());

		let applied = session.complete_generation(second, payload(&["b"]), MergeMode::Replace);
		assert!(!applied.is_stale());
		let late = session.complete_generation(first, payload(&["a"]), MergeMode::Replace);
		assert!(late.is_stale());

		assert_eq!(session.graph().nodes.len(), 1);
		assert_eq!(session.graph().nodes[0].id, "b");
		assert!(!session.is_layout_suspended());
	}

	#[test]
	fn append_keeps_recorded_positions() {
		let mut session = GraphSession::default();
		let t = session.begin_generation();
		session.complete_generation(t, payload(&["a"]), MergeMode::Replace);
		session.record_positions([("a", Position { x: 3.0, y: 4.0 })]);

		let t = session.begin_generation();
		let mut more = payload(&["a", "b"]);
		more.edges.push(Edge::new("e1", "a", "b", "rel"));
		let report = session.complete_generation(t, more, MergeMode::Append);

		assert_eq!(
			report,
			Outcome::Applied(MergeReport {
				added_nodes: 1,
				merged_nodes: 1,
				added_edges: 1,
				..MergeReport::default()
			})
		);
		assert_eq!(session.graph().node("a").unwrap().position, Some(Position { x: 3.0, y: 4.0 }));
		assert_eq!(session.graph().node("b").unwrap().position, None);
	}

	#[test]
	fn recording_positions_does_not_bump_version() {
		let mut session = GraphSession::new(payload(&["a"]));
		let before = session.version();
		session.record_positions([("a", Position { x: 1.0, y: 1.0 })]);
		assert_eq!(session.version(), before);
	}

	#[test]
	fn enrichment_against_changed_graph_is_stale() {
		let mut session = GraphSession::new(payload(&["a"]));
		let enrich = session.begin_enrichment();
		let t = session.begin_generation();
		session.complete_generation(t, payload(&["z"]), MergeMode::Replace);

		let outcome = session.complete_enrichment(enrich, Ok(payload(&["b"]))).unwrap();
		assert!(outcome.is_stale());
		assert!(session.graph().node("b").is_none());
	}

	#[test]
	fn enrichment_failure_is_recoverable() {
		let mut session = GraphSession::new(payload(&["a"]));
		let ticket = session.begin_enrichment();
		let err = session
			.complete_enrichment(
				ticket,
				Err(GraphError::Enrichment {
					service: "Wikipedia".into(),
					message: "HTTP 503".into(),
				}),
			)
			.unwrap_err();
		assert_eq!(err.user_message(), "Wikipedia is unavailable right now. Please try again.");
		assert_eq!(session.graph().nodes.len(), 1);

		let retry = session.begin_enrichment();
		let outcome = session.complete_enrichment(retry, Ok(payload(&["b"]))).unwrap();
		assert!(!outcome.is_stale());
		assert!(session.graph().node("b").is_some());
	}

	#[test]
	fn failed_generation_resumes_layout() {
		let mut session = GraphSession::default();
		let t = session.begin_generation();
		session.fail_generation(t);
		assert!(!session.is_layout_suspended());
	}
}
