//! Pointer gestures: click-to-select, node drag, background pan, wheel zoom.

use super::simulation::Simulation;
use super::types::{SelectionTarget, Transform};
use super::viewport::Viewport;

/// Drawn node radius in simulation units.
pub const NODE_RADIUS: f64 = 5.0;
/// Pick radius in simulation units; scales with zoom like the nodes.
pub const HIT_RADIUS: f64 = 12.0;
/// Edge pick tolerance in screen pixels.
pub const EDGE_HIT_TOLERANCE: f64 = 4.0;
/// Pointer travel in pixels that turns a press into a drag.
pub const DRAG_THRESHOLD: f64 = 3.0;

const WHEEL_ZOOM_OUT: f64 = 0.9;
const WHEEL_ZOOM_IN: f64 = 1.1;

#[derive(Clone, Debug, Default, PartialEq)]
enum Gesture {
	#[default]
	Idle,
	Pressing {
		target: Option<SelectionTarget>,
		node: Option<usize>,
		start: (f64, f64),
		origin: Transform,
	},
	Dragging {
		node: usize,
	},
	Panning {
		start: (f64, f64),
		origin: Transform,
	},
}

/// Gesture in progress on one canvas.
#[derive(Clone, Debug, Default)]
pub struct Interaction {
	gesture: Gesture,
}

impl Interaction {
	/// A node is being dragged.
	pub fn is_dragging(&self) -> bool {
		matches!(self.gesture, Gesture::Dragging { .. })
	}

	/// The background is being dragged.
	pub fn is_panning(&self) -> bool {
		matches!(self.gesture, Gesture::Panning { .. })
	}

	/// Entity under a screen point: nodes win over edges, the last drawn node
	/// wins over earlier ones.
	pub fn target_at(&self, sx: f64, sy: f64, sim: &Simulation, viewport: &Viewport) -> Option<SelectionTarget> {
		let (x, y) = viewport.screen_to_sim(sx, sy);
		if let Some(i) = sim.node_at(x, y, HIT_RADIUS) {
			return Some(SelectionTarget::Node(sim.nodes()[i].id.clone()));
		}
		let tolerance = EDGE_HIT_TOLERANCE / viewport.transform().k;
		sim.link_at(x, y, tolerance)
			.map(|i| SelectionTarget::Edge(sim.links()[i].edge_id.clone()))
	}

	/// Start a press; whether it is a click, drag or pan is decided on move or release.
	pub fn pointer_down(&mut self, sx: f64, sy: f64, sim: &Simulation, viewport: &Viewport) {
		let (x, y) = viewport.screen_to_sim(sx, sy);
		let node = sim.node_at(x, y, HIT_RADIUS);
		self.gesture = Gesture::Pressing {
			target: self.target_at(sx, sy, sim, viewport),
			node,
			start: (sx, sy),
			origin: viewport.transform(),
		};
	}

	/// Returns whether anything moved.
	pub fn pointer_move(&mut self, sx: f64, sy: f64, sim: &mut Simulation, viewport: &mut Viewport) -> bool {
		match self.gesture {
			Gesture::Idle => false,
			Gesture::Pressing {
				node, start, origin, ..
			} => {
				if (sx - start.0).hypot(sy - start.1) < DRAG_THRESHOLD {
					return false;
				}
				match node {
					Some(i) => {
						let (x, y) = viewport.screen_to_sim(sx, sy);
						sim.begin_drag(i, x, y);
						self.gesture = Gesture::Dragging { node: i };
					}
					None => {
						self.gesture = Gesture::Panning { start, origin };
						pan_from(viewport, start, origin, sx, sy);
					}
				}
				true
			}
			Gesture::Dragging { node } => {
				let (x, y) = viewport.screen_to_sim(sx, sy);
				sim.drag_to(node, x, y);
				true
			}
			Gesture::Panning { start, origin } => {
				pan_from(viewport, start, origin, sx, sy);
				true
			}
		}
	}

	/// Ends the gesture. `Some` means it was a click, carrying the clicked
	/// entity or `None` for the background.
	pub fn pointer_up(&mut self, sim: &mut Simulation) -> Option<Option<SelectionTarget>> {
		match std::mem::take(&mut self.gesture) {
			Gesture::Pressing { target, .. } => Some(target),
			Gesture::Dragging { node } => {
				sim.end_drag(node);
				None
			}
			Gesture::Idle | Gesture::Panning { .. } => None,
		}
	}

	/// The pointer left the canvas: abandon the gesture without selecting.
	pub fn pointer_leave(&mut self, sim: &mut Simulation) {
		if let Gesture::Dragging { node } = std::mem::take(&mut self.gesture) {
			sim.end_drag(node);
		}
	}

	/// Zoom one notch about the pointer.
	pub fn wheel(&mut self, delta_y: f64, sx: f64, sy: f64, viewport: &mut Viewport) {
		let factor = if delta_y > 0.0 { WHEEL_ZOOM_OUT } else { WHEEL_ZOOM_IN };
		viewport.zoom_at(factor, sx, sy);
	}

	/// Drop any gesture tied to a simulation that is being replaced.
	pub fn reset(&mut self) {
		self.gesture = Gesture::Idle;
	}
}

fn pan_from(viewport: &mut Viewport, start: (f64, f64), origin: Transform, sx: f64, sy: f64) {
	viewport.jump_to(Transform {
		x: origin.x + (sx - start.0),
		y: origin.y + (sy - start.1),
		k: origin.k,
	});
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Edge, Graph, Node};
	use crate::settings::{LayoutConfig, ViewportConfig};

	/// `a` at (100, 100), `b` at (300, 100), `c` pinned far away; identity
	/// transform so screen and simulation coordinates coincide.
	fn fixture() -> (Simulation, Viewport) {
		let mut graph = Graph::from_parts(
			vec![
				Node::new("a", "A", "T").at(100.0, 100.0),
				Node::new("b", "B", "T").at(300.0, 100.0),
				Node::new("c", "C", "T").at(500.0, 500.0),
			],
			vec![Edge::new("e1", "a", "b", "rel")],
		)
		.unwrap();
		graph.nodes[2].pinned = true;
		let sim = Simulation::new(&graph, 800.0, 600.0, LayoutConfig::default());
		(sim, Viewport::new(800.0, 600.0, ViewportConfig::default()))
	}

	#[test]
	fn click_selects_node_edge_or_background() {
		let (mut sim, viewport) = fixture();
		let mut ix = Interaction::default();

		ix.pointer_down(102.0, 101.0, &sim, &viewport);
		assert_eq!(ix.pointer_up(&mut sim), Some(Some(SelectionTarget::Node("a".into()))));

		ix.pointer_down(200.0, 102.0, &sim, &viewport);
		assert_eq!(ix.pointer_up(&mut sim), Some(Some(SelectionTarget::Edge("e1".into()))));

		ix.pointer_down(200.0, 400.0, &sim, &viewport);
		assert_eq!(ix.pointer_up(&mut sim), Some(None));
	}

	#[test]
	fn small_jitter_is_still_a_click() {
		let (mut sim, mut viewport) = fixture();
		let mut ix = Interaction::default();
		ix.pointer_down(100.0, 100.0, &sim, &viewport);
		assert!(!ix.pointer_move(101.0, 101.0, &mut sim, &mut viewport));
		assert!(!ix.is_dragging());
		assert_eq!(ix.pointer_up(&mut sim), Some(Some(SelectionTarget::Node("a".into()))));
	}

	#[test]
	fn drag_pins_to_pointer_then_releases_only_that_node() {
		let (mut sim, mut viewport) = fixture();
		let mut ix = Interaction::default();

		ix.pointer_down(100.0, 100.0, &sim, &viewport);
		assert!(ix.pointer_move(120.0, 140.0, &mut sim, &mut viewport));
		assert!(ix.is_dragging());
		let a = &sim.nodes()[0];
		assert_eq!((a.fx, a.fy), (Some(120.0), Some(140.0)));
		assert!(sim.is_running());

		ix.pointer_move(150.0, 150.0, &mut sim, &mut viewport);
		assert_eq!(sim.nodes()[0].fx, Some(150.0));

		assert_eq!(ix.pointer_up(&mut sim), None);
		assert!(!sim.nodes()[0].is_pinned());
		assert!(!sim.nodes()[1].is_pinned());
		assert!(sim.nodes()[2].is_pinned());
		assert_eq!(viewport.transform(), Transform::IDENTITY);
	}

	#[test]
	fn background_drag_pans_without_selecting() {
		let (mut sim, mut viewport) = fixture();
		let mut ix = Interaction::default();
		ix.pointer_down(200.0, 400.0, &sim, &viewport);
		ix.pointer_move(230.0, 390.0, &mut sim, &mut viewport);
		assert!(ix.is_panning());
		assert_eq!(viewport.transform(), Transform { x: 30.0, y: -10.0, k: 1.0 });
		assert_eq!(ix.pointer_up(&mut sim), None);
	}

	#[test]
	fn leaving_the_canvas_ends_a_drag() {
		let (mut sim, mut viewport) = fixture();
		let mut ix = Interaction::default();
		ix.pointer_down(300.0, 100.0, &sim, &viewport);
		ix.pointer_move(310.0, 110.0, &mut sim, &mut viewport);
		ix.pointer_leave(&mut sim);
		assert!(!ix.is_dragging());
		assert!(!sim.nodes()[1].is_pinned());
	}

	#[test]
	fn hit_testing_follows_the_transform() {
		let (sim, mut viewport) = fixture();
		viewport.jump_to(Transform { x: 0.0, y: 0.0, k: 2.0 });
		let ix = Interaction::default();
		assert_eq!(ix.target_at(200.0, 200.0, &sim, &viewport), Some(SelectionTarget::Node("a".into())));
		assert_eq!(ix.target_at(100.0, 100.0, &sim, &viewport), None);
	}

	#[test]
	fn wheel_zooms_about_pointer() {
		let (_, mut viewport) = fixture();
		let mut ix = Interaction::default();
		ix.wheel(-1.0, 100.0, 100.0, &mut viewport);
		let t = viewport.transform();
		assert!((t.k - 1.1).abs() < 1e-12);
		let (x, y) = t.to_sim(100.0, 100.0);
		assert!((x - 100.0).abs() < 1e-9 && (y - 100.0).abs() < 1e-9);
	}
}
