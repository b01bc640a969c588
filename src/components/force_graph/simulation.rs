//! Force-directed layout.
//!
//! Each tick cools `alpha`, lets the link, many-body, centring and collision
//! forces adjust velocities (centring shifts positions directly), then
//! integrates. The forces are free functions over a [`SimNode`] slice so they
//! can be exercised without a renderer. Simulation state is a projection of
//! the [`Graph`], indexed by node order, and is rebuilt whole when the graph
//! changes.

use std::collections::HashMap;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::graph::{Diagnostic, Graph, Position};
use crate::settings::LayoutConfig;

const COLLISION_STRENGTH: f64 = 1.0;
const JIGGLE: f64 = 1e-6;

/// Mutable physics state of one node.
#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
	/// Id of the graph node this projects.
	pub id: String,
	/// Current position.
	pub x: f64,
	/// See `x`.
	pub y: f64,
	/// Velocity applied at the next integration.
	pub vx: f64,
	/// See `vx`.
	pub vy: f64,
	/// Fixed coordinates while pinned.
	pub fx: Option<f64>,
	/// See `fx`.
	pub fy: Option<f64>,
}

impl SimNode {
	fn at(id: String, x: f64, y: f64) -> Self {
		Self {
			id,
			x,
			y,
			vx: 0.0,
			vy: 0.0,
			fx: None,
			fy: None,
		}
	}

	/// Whether either coordinate is fixed.
	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

/// A spring between two [`SimNode`] indices.
#[derive(Clone, Debug, PartialEq)]
pub struct SimLink {
	/// Id of the graph edge this projects.
	pub edge_id: String,
	/// Node index of the edge source.
	pub source: usize,
	/// Node index of the edge target.
	pub target: usize,
	strength: f64,
	bias: f64,
}

/// Axis-aligned box around node positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	/// Smallest x of any point.
	pub min_x: f64,
	/// Smallest y of any point.
	pub min_y: f64,
	/// Largest x of any point.
	pub max_x: f64,
	/// Largest y of any point.
	pub max_y: f64,
}

impl Bounds {
	/// Smallest box holding every point; `None` when there are none.
	pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
		let mut points = points.into_iter();
		let (x, y) = points.next()?;
		let mut b = Bounds {
			min_x: x,
			min_y: y,
			max_x: x,
			max_y: y,
		};
		for (x, y) in points {
			b.min_x = b.min_x.min(x);
			b.min_y = b.min_y.min(y);
			b.max_x = b.max_x.max(x);
			b.max_y = b.max_y.max(y);
		}
		Some(b)
	}

	/// Horizontal extent.
	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	/// Vertical extent.
	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}

	/// Midpoint of the box.
	pub fn center(&self) -> (f64, f64) {
		((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
	}
}

/// A running layout over one graph snapshot.
pub struct Simulation {
	nodes: Vec<SimNode>,
	links: Vec<SimLink>,
	index: HashMap<String, usize>,
	config: LayoutConfig,
	center: (f64, f64),
	alpha: f64,
	alpha_target: f64,
	rng: StdRng,
	ticks: u64,
	diagnostics: Vec<Diagnostic>,
}

impl Simulation {
	/// Project `graph` into a fresh simulation centred in a `width`×`height`
	/// viewport. Placed nodes keep their position; the rest are scattered
	/// around the centre. Edges with a missing endpoint are skipped.
	pub fn new(graph: &Graph, width: f64, height: f64, config: LayoutConfig) -> Self {
		Self::build(graph, width, height, config, |_| None)
	}

	/// Like [`Simulation::new`], but nodes that `previous` is still laying out
	/// start from where they are now and count as placed, even if the graph
	/// never received their position.
	pub fn carry_over(previous: &Simulation, graph: &Graph, width: f64, height: f64, config: LayoutConfig) -> Self {
		Self::build(graph, width, height, config, |id| {
			previous.node_index(id).map(|i| {
				let n = &previous.nodes[i];
				Position { x: n.x, y: n.y }
			})
		})
	}

	fn build(
		graph: &Graph,
		width: f64,
		height: f64,
		config: LayoutConfig,
		current: impl Fn(&str) -> Option<Position>,
	) -> Self {
		let config = config.clamped();
		let center = (width / 2.0, height / 2.0);
		let mut rng = StdRng::seed_from_u64(config.seed);

		let mut nodes = Vec::with_capacity(graph.nodes.len());
		let mut index = HashMap::with_capacity(graph.nodes.len());
		for node in &graph.nodes {
			let placed = current(&node.id).or(node.position);
			let mut sim = match placed {
				Some(p) => SimNode::at(node.id.clone(), p.x, p.y),
				None => {
					let dx = (rng.random::<f64>() - 0.5) * 2.0 * config.seed_jitter;
					let dy = (rng.random::<f64>() - 0.5) * 2.0 * config.seed_jitter;
					SimNode::at(node.id.clone(), center.0 + dx, center.1 + dy)
				}
			};
			if placed.is_some() && (node.pinned || config.anchor_placed_nodes) {
				sim.fx = Some(sim.x);
				sim.fy = Some(sim.y);
			}
			index.insert(node.id.clone(), nodes.len());
			nodes.push(sim);
		}

		let mut diagnostics = Vec::new();
		let mut pairs = Vec::with_capacity(graph.edges.len());
		for edge in &graph.edges {
			match (index.get(&edge.source), index.get(&edge.target)) {
				(Some(&s), Some(&t)) => pairs.push((edge.id.clone(), s, t)),
				(s, _) => {
					let missing = if s.is_none() { &edge.source } else { &edge.target };
					let diagnostic = Diagnostic::DanglingEdge {
						edge_id: edge.id.clone(),
						missing: missing.clone(),
					};
					warn!("layout skipping {diagnostic}");
					diagnostics.push(diagnostic);
				}
			}
		}
		let links = build_links(pairs, nodes.len());

		let alpha = if nodes.is_empty() { 0.0 } else { 1.0 };
		debug!(
			"simulation built: {} nodes, {} links, {} skipped",
			nodes.len(),
			links.len(),
			diagnostics.len()
		);
		Self {
			nodes,
			links,
			index,
			config,
			center,
			alpha,
			alpha_target: 0.0,
			rng,
			ticks: 0,
			diagnostics,
		}
	}

	/// Node state in graph order.
	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	/// Links for every edge with both endpoints present.
	pub fn links(&self) -> &[SimLink] {
		&self.links
	}

	/// Index of the node with `id`.
	pub fn node_index(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Current temperature.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Ticks run since the simulation was built.
	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	/// Edges excluded when the simulation was built.
	pub fn diagnostics(&self) -> &[Diagnostic] {
		&self.diagnostics
	}

	/// False once alpha has cooled below `alpha_min` (or there is nothing to lay out).
	pub fn is_running(&self) -> bool {
		!self.nodes.is_empty() && self.alpha >= self.config.alpha_min
	}

	/// Advance one tick. Returns whether another tick is wanted.
	pub fn step(&mut self) -> bool {
		if !self.is_running() {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		let alpha = self.alpha;

		apply_links(
			&mut self.nodes,
			&self.links,
			self.config.link_distance,
			alpha,
			&mut self.rng,
		);
		apply_charge(
			&mut self.nodes,
			self.config.charge_strength,
			self.config.charge_distance_min,
			alpha,
			&mut self.rng,
		);
		apply_center(&mut self.nodes, self.center, self.config.center_strength);
		apply_collision(&mut self.nodes, self.config.collision_radius, &mut self.rng);
		integrate(&mut self.nodes, self.config.velocity_decay);

		let reset = recover_non_finite(&mut self.nodes, self.center);
		if reset > 0 {
			warn!("tick {}: reset {reset} node(s) with non-finite state", self.ticks);
		}

		self.ticks += 1;
		let running = self.is_running();
		if !running {
			debug!("simulation settled after {} ticks", self.ticks);
		}
		running
	}

	/// Tick until settled or `max_ticks` have run; returns ticks taken.
	pub fn run(&mut self, max_ticks: usize) -> usize {
		let mut n = 0;
		while n < max_ticks && self.step() {
			n += 1;
		}
		n
	}

	/// Restart energetic relaxation.
	pub fn reheat(&mut self) {
		if !self.nodes.is_empty() {
			self.alpha = self.alpha.max(self.config.reheat_alpha);
		}
	}

	/// Halt immediately, e.g. when the view is going away.
	pub fn stop(&mut self) {
		self.alpha = 0.0;
		self.alpha_target = 0.0;
	}

	/// Fix node `i` at `(x, y)`.
	pub fn pin(&mut self, i: usize, x: f64, y: f64) {
		if let Some(node) = self.nodes.get_mut(i) {
			node.fx = Some(x);
			node.fy = Some(y);
			node.x = x;
			node.y = y;
		}
	}

	/// Let node `i` move freely again.
	pub fn unpin(&mut self, i: usize) {
		if let Some(node) = self.nodes.get_mut(i) {
			node.fx = None;
			node.fy = None;
		}
	}

	/// A drag grabbed node `i`: pin it and keep the layout warm.
	pub fn begin_drag(&mut self, i: usize, x: f64, y: f64) {
		self.alpha_target = self.config.reheat_alpha;
		self.reheat();
		self.pin(i, x, y);
	}

	/// Move the dragged node `i`.
	pub fn drag_to(&mut self, i: usize, x: f64, y: f64) {
		self.pin(i, x, y);
	}

	/// The drag let go: release node `i` and let the layout cool again.
	pub fn end_drag(&mut self, i: usize) {
		self.alpha_target = 0.0;
		self.unpin(i);
	}

	/// Index of the last node whose centre lies within `radius` of `(x, y)`.
	pub fn node_at(&self, x: f64, y: f64, radius: f64) -> Option<usize> {
		let r2 = radius * radius;
		self.nodes
			.iter()
			.rposition(|n| (n.x - x).powi(2) + (n.y - y).powi(2) < r2)
	}

	/// Index of the link passing closest to `(x, y)`, if within `tolerance`.
	pub fn link_at(&self, x: f64, y: f64, tolerance: f64) -> Option<usize> {
		self.links
			.iter()
			.enumerate()
			.filter(|(_, l)| l.source != l.target)
			.map(|(i, l)| {
				let (s, t) = (&self.nodes[l.source], &self.nodes[l.target]);
				(i, segment_distance(x, y, s.x, s.y, t.x, t.y))
			})
			.filter(|&(_, d)| d <= tolerance)
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(i, _)| i)
	}

	/// Box around every node; `None` with no nodes.
	pub fn bounds(&self) -> Option<Bounds> {
		Bounds::from_points(self.nodes.iter().map(|n| (n.x, n.y)))
	}

	/// Current position of every node, by id.
	pub fn positions(&self) -> impl Iterator<Item = (&str, Position)> {
		self.nodes
			.iter()
			.map(|n| (n.id.as_str(), Position { x: n.x, y: n.y }))
	}
}

/// Strength `1/min(deg)` and bias `deg(s)/(deg(s)+deg(t))` per link so hubs
/// are not pulled apart by their many springs.
fn build_links(pairs: Vec<(String, usize, usize)>, node_count: usize) -> Vec<SimLink> {
	let mut count = vec![0usize; node_count];
	for (_, s, t) in &pairs {
		count[*s] += 1;
		count[*t] += 1;
	}
	pairs
		.into_iter()
		.map(|(edge_id, source, target)| {
			let (cs, ct) = (count[source] as f64, count[target] as f64);
			SimLink {
				edge_id,
				source,
				target,
				strength: 1.0 / cs.min(ct),
				bias: cs / (cs + ct),
			}
		})
		.collect()
}

fn jiggle(rng: &mut StdRng) -> f64 {
	(rng.random::<f64>() - 0.5) * JIGGLE
}

/// Spring toward `distance` along each link, using predicted positions.
pub fn apply_links(nodes: &mut [SimNode], links: &[SimLink], distance: f64, alpha: f64, rng: &mut StdRng) {
	for link in links {
		if link.source == link.target {
			continue;
		}
		let (s, t) = (&nodes[link.source], &nodes[link.target]);
		let mut x = t.x + t.vx - s.x - s.vx;
		let mut y = t.y + t.vy - s.y - s.vy;
		if x == 0.0 {
			x = jiggle(rng);
		}
		if y == 0.0 {
			y = jiggle(rng);
		}
		let l = (x * x + y * y).sqrt();
		let k = (l - distance) / l * alpha * link.strength;
		x *= k;
		y *= k;

		let t = &mut nodes[link.target];
		t.vx -= x * link.bias;
		t.vy -= y * link.bias;
		let s = &mut nodes[link.source];
		s.vx += x * (1.0 - link.bias);
		s.vy += y * (1.0 - link.bias);
	}
}

/// Pairwise inverse-distance force; negative `strength` repels.
pub fn apply_charge(nodes: &mut [SimNode], strength: f64, distance_min: f64, alpha: f64, rng: &mut StdRng) {
	let d2_min = distance_min * distance_min;
	for i in 0..nodes.len() {
		let (mut dvx, mut dvy) = (0.0, 0.0);
		for j in 0..nodes.len() {
			if i == j {
				continue;
			}
			let mut x = nodes[j].x - nodes[i].x;
			let mut y = nodes[j].y - nodes[i].y;
			let mut l = x * x + y * y;
			if x == 0.0 {
				x = jiggle(rng);
				l += x * x;
			}
			if y == 0.0 {
				y = jiggle(rng);
				l += y * y;
			}
			if l < d2_min {
				l = (d2_min * l).sqrt();
			}
			dvx += x * strength * alpha / l;
			dvy += y * strength * alpha / l;
		}
		nodes[i].vx += dvx;
		nodes[i].vy += dvy;
	}
}

/// Translate the layout so its mean moves toward `center`.
pub fn apply_center(nodes: &mut [SimNode], center: (f64, f64), strength: f64) {
	if nodes.is_empty() {
		return;
	}
	let n = nodes.len() as f64;
	let (sx, sy) = nodes
		.iter()
		.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
	let dx = (sx / n - center.0) * strength;
	let dy = (sy / n - center.1) * strength;
	for node in nodes {
		node.x -= dx;
		node.y -= dy;
	}
}

/// Push apart any two nodes closer than `2 * radius`, using predicted positions.
pub fn apply_collision(nodes: &mut [SimNode], radius: f64, rng: &mut StdRng) {
	if radius <= 0.0 {
		return;
	}
	let r = radius * 2.0;
	for i in 0..nodes.len() {
		let xi = nodes[i].x + nodes[i].vx;
		let yi = nodes[i].y + nodes[i].vy;
		for j in (i + 1)..nodes.len() {
			let mut x = xi - nodes[j].x - nodes[j].vx;
			let mut y = yi - nodes[j].y - nodes[j].vy;
			let mut l = x * x + y * y;
			if l >= r * r {
				continue;
			}
			if x == 0.0 {
				x = jiggle(rng);
				l += x * x;
			}
			if y == 0.0 {
				y = jiggle(rng);
				l += y * y;
			}
			let d = l.sqrt();
			let k = (r - d) / d * COLLISION_STRENGTH;
			x *= k;
			y *= k;
			// equal radii share the correction evenly
			nodes[i].vx += x * 0.5;
			nodes[i].vy += y * 0.5;
			nodes[j].vx -= x * 0.5;
			nodes[j].vy -= y * 0.5;
		}
	}
}

/// Damp velocities and move; pinned nodes snap to their fixed coordinates.
pub fn integrate(nodes: &mut [SimNode], velocity_decay: f64) {
	let keep = 1.0 - velocity_decay;
	for node in nodes {
		match node.fx {
			Some(fx) => {
				node.x = fx;
				node.vx = 0.0;
			}
			None => {
				node.vx *= keep;
				node.x += node.vx;
			}
		}
		match node.fy {
			Some(fy) => {
				node.y = fy;
				node.vy = 0.0;
			}
			None => {
				node.vy *= keep;
				node.y += node.vy;
			}
		}
	}
}

fn recover_non_finite(nodes: &mut [SimNode], center: (f64, f64)) -> usize {
	let mut reset = 0;
	for node in nodes {
		if !(node.x.is_finite() && node.y.is_finite() && node.vx.is_finite() && node.vy.is_finite()) {
			node.x = node.fx.unwrap_or(center.0);
			node.y = node.fy.unwrap_or(center.1);
			node.vx = 0.0;
			node.vy = 0.0;
			reset += 1;
		}
	}
	reset
}

fn segment_distance(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
	let (dx, dy) = (bx - ax, by - ay);
	let len2 = dx * dx + dy * dy;
	let t = if len2 == 0.0 {
		0.0
	} else {
		(((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
	};
	let (cx, cy) = (ax + t * dx, ay + t * dy);
	((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}
