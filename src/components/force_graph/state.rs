use std::collections::HashSet;

use log::debug;

use super::interaction::Interaction;
use super::simulation::Simulation;
use super::types::{SelectionTarget, Transform, ViewCommand};
use super::viewport::Viewport;
use crate::graph::colors::ColorMap;
use crate::graph::label::{edge_display_label, node_display_label};
use crate::graph::{Graph, Position};
use crate::settings::CanvasSettings;

const HIGHLIGHT_SPEED: f64 = 1.8;
const FADE_SPEED: f64 = 1.26;

/// Per-node drawing data captured when the simulation is built.
#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub label: String,
	pub node_type: String,
}

#[derive(Clone, Debug, Default)]
pub struct HighlightState {
	pub selection: Option<SelectionTarget>,
	/// Node indices drawn emphasised: the selected node and its neighbours,
	/// or the endpoints of the selected edge.
	pub nodes: HashSet<usize>,
	/// Link index of a selected edge.
	pub link: Option<usize>,
	pub t: f64,
}

/// What one animation frame produced for the host.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
	/// The transform, when it differs from the last reported one.
	pub transform: Option<Transform>,
	/// Final positions, when the layout came to rest this frame.
	pub settled: Option<Vec<(String, Position)>>,
}

/// Everything one mounted canvas owns between frames.
pub struct ForceGraphState {
	pub simulation: Simulation,
	pub viewport: Viewport,
	pub interaction: Interaction,
	pub colors: ColorMap,
	pub nodes: Vec<NodeInfo>,
	pub edge_labels: Vec<String>,
	pub highlight: HighlightState,
	pub paused: bool,
	settings: CanvasSettings,
	was_running: bool,
	reported: Option<Transform>,
}

impl ForceGraphState {
	pub fn new(graph: &Graph, width: f64, height: f64, settings: CanvasSettings, colors: ColorMap) -> Self {
		let settings = settings.clamped();
		let simulation = Simulation::new(graph, width, height, settings.layout.clone());
		let mut state = Self {
			viewport: Viewport::new(width, height, settings.viewport.clone()),
			interaction: Interaction::default(),
			colors,
			nodes: Vec::new(),
			edge_labels: Vec::new(),
			highlight: HighlightState::default(),
			paused: false,
			was_running: simulation.is_running(),
			reported: None,
			simulation,
			settings,
		};
		state.capture_labels(graph);
		state
	}

	/// Replace the simulation for a new graph. Nodes already on screen keep
	/// their current position; the view transform is kept.
	pub fn rebuild(&mut self, graph: &Graph) {
		let (w, h) = self.viewport.size();
		self.simulation = Simulation::carry_over(&self.simulation, graph, w, h, self.settings.layout.clone());
		self.interaction.reset();
		self.was_running = self.simulation.is_running();
		self.capture_labels(graph);
		let selection = self.highlight.selection.take();
		self.set_selection(selection);
		debug!("canvas rebuilt for {} nodes", graph.nodes.len());
	}

	fn capture_labels(&mut self, graph: &Graph) {
		self.nodes = self
			.simulation
			.nodes()
			.iter()
			.filter_map(|n| graph.node(&n.id))
			.map(|n| NodeInfo {
				label: node_display_label(n),
				node_type: n.node_type.clone(),
			})
			.collect();
		self.edge_labels = self
			.simulation
			.links()
			.iter()
			.map(|l| graph.edge(&l.edge_id).map(edge_display_label).unwrap_or_default())
			.collect();
	}

	pub fn node_color(&self, i: usize) -> &str {
		let node_type = self.nodes.get(i).map_or("", |n| n.node_type.as_str());
		self.colors.color_for(node_type)
	}

	/// Highlight `target`; a target that is not in the simulation clears it.
	pub fn set_selection(&mut self, target: Option<SelectionTarget>) {
		let sim = &self.simulation;
		let mut nodes = HashSet::new();
		let mut link = None;
		let resolved = match &target {
			Some(SelectionTarget::Node(id)) => sim.node_index(id).map(|i| {
				nodes.insert(i);
				for l in sim.links() {
					if l.source == i {
						nodes.insert(l.target);
					} else if l.target == i {
						nodes.insert(l.source);
					}
				}
			}),
			Some(SelectionTarget::Edge(id)) => {
				sim.links().iter().position(|l| l.edge_id == *id).map(|i| {
					let l = &sim.links()[i];
					nodes.extend([l.source, l.target]);
					link = Some(i);
				})
			}
			None => None,
		};
		let t = if resolved.is_some() { self.highlight.t } else { 0.0 };
		self.highlight = HighlightState {
			selection: resolved.and(target),
			nodes,
			link,
			t,
		};
	}

	pub fn has_highlight(&self) -> bool {
		self.highlight.selection.is_some()
	}

	pub fn is_highlighted(&self, i: usize) -> bool {
		self.highlight.nodes.contains(&i)
	}

	pub fn apply_command(&mut self, command: ViewCommand) {
		let bounds = self.simulation.bounds();
		self.viewport.apply(command, bounds);
	}

	/// One animation frame: a simulation tick unless paused or idle, the
	/// viewport transition, and the highlight fade.
	pub fn frame(&mut self, dt_ms: f64) -> FrameReport {
		let mut report = FrameReport::default();
		if !self.paused && self.simulation.is_running() {
			self.simulation.step();
		}
		let running = self.simulation.is_running();
		if self.was_running && !running {
			report.settled = Some(
				self.simulation
					.positions()
					.map(|(id, p)| (id.to_string(), p))
					.collect(),
			);
		}
		self.was_running = running;

		self.viewport.advance(dt_ms);
		let transform = self.viewport.transform();
		if self.reported != Some(transform) {
			self.reported = Some(transform);
			report.transform = Some(transform);
		}

		let dt = dt_ms / 1000.0;
		if self.has_highlight() {
			self.highlight.t += (1.0 - self.highlight.t) * (HIGHLIGHT_SPEED * dt).min(1.0);
		} else {
			self.highlight.t -= self.highlight.t * (FADE_SPEED * dt).min(1.0);
			if self.highlight.t < 0.01 {
				self.highlight.t = 0.0;
			}
		}
		report
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		self.interaction.pointer_down(sx, sy, &self.simulation, &self.viewport);
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) -> bool {
		self.interaction
			.pointer_move(sx, sy, &mut self.simulation, &mut self.viewport)
	}

	/// `Some` when the gesture was a click; the highlight follows it.
	pub fn pointer_up(&mut self) -> Option<Option<SelectionTarget>> {
		let click = self.interaction.pointer_up(&mut self.simulation);
		if let Some(target) = &click {
			self.set_selection(target.clone());
		}
		click
	}

	pub fn pointer_leave(&mut self) {
		self.interaction.pointer_leave(&mut self.simulation);
	}

	pub fn wheel(&mut self, delta_y: f64, sx: f64, sy: f64) {
		self.interaction.wheel(delta_y, sx, sy, &mut self.viewport);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport.resize(width, height);
	}

	/// Halt the layout for good, e.g. when the canvas unmounts.
	pub fn stop(&mut self) {
		self.simulation.stop();
		self.was_running = false;
	}
}
