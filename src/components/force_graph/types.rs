use crate::graph::{Edge, Graph, Node};

/// Screen = simulation * `k` + (`x`, `y`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
	/// Horizontal offset in pixels.
	pub x: f64,
	/// Vertical offset in pixels.
	pub y: f64,
	/// Scale.
	pub k: f64,
}

impl Default for Transform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl Transform {
	/// No offset, scale 1.
	pub const IDENTITY: Transform = Transform { x: 0.0, y: 0.0, k: 1.0 };

	/// Simulation point to canvas pixel.
	pub fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
		(x * self.k + self.x, y * self.k + self.y)
	}

	/// Canvas pixel to simulation point.
	pub fn to_sim(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Scale as a rounded percentage, for zoom indicators.
	pub fn zoom_percent(&self) -> u32 {
		(self.k * 100.0).round().max(0.0) as u32
	}
}

/// What the user clicked, by id. Resolve against the current graph before use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionTarget {
	/// A node id.
	Node(String),
	/// An edge id.
	Edge(String),
}

impl SelectionTarget {
	/// The full entity, or `None` if it is no longer part of `graph`.
	pub fn resolve(&self, graph: &Graph) -> Option<Selected> {
		match self {
			SelectionTarget::Node(id) => graph.node(id).cloned().map(Selected::Node),
			SelectionTarget::Edge(id) => graph.edge(id).cloned().map(Selected::Edge),
		}
	}
}

/// Payload of a selection event.
#[derive(Clone, Debug, PartialEq)]
pub enum Selected {
	/// A node, as it was in the graph.
	Node(Node),
	/// An edge, as it was in the graph.
	Edge(Edge),
}

impl Selected {
	/// The id reference to keep across graph changes.
	pub fn target(&self) -> SelectionTarget {
		match self {
			Selected::Node(n) => SelectionTarget::Node(n.id.clone()),
			Selected::Edge(e) => SelectionTarget::Edge(e.id.clone()),
		}
	}
}

/// Host-issued viewport requests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewCommand {
	/// Absolute scale, keeping the viewport centre fixed.
	ZoomTo(f64),
	/// One zoom step in.
	ZoomIn,
	/// One zoom step out.
	ZoomOut,
	/// Frame every node.
	FitToView,
}
