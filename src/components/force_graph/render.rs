use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::interaction::NODE_RADIUS;
use super::state::ForceGraphState;
use super::types::SelectionTarget;
use super::viewport::ease_out_cubic;

const BACKGROUND: &str = "#1a1a2e";

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (width, height) = state.viewport.size();
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);

	if state.simulation.nodes().is_empty() {
		draw_empty(ctx, width, height);
		return;
	}

	let transform = state.viewport.transform();
	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_empty(ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	ctx.set_fill_style_str("rgba(255, 255, 255, 0.5)");
	ctx.set_font("14px sans-serif");
	ctx.set_text_align("center");
	let _ = ctx.fill_text("No graph data", width / 2.0, height / 2.0);
	ctx.set_text_align("start");
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.viewport.transform().k;
	let (line_width, arrow_size) = (1.5 / k, 8.0 / k);
	let t = ease_out_cubic(state.highlight.t);
	let nodes = state.simulation.nodes();

	for (i, link) in state.simulation.links().iter().enumerate() {
		let (n1, n2) = (&nodes[link.source], &nodes[link.target]);
		let (dx, dy) = (n2.x - n1.x, n2.y - n1.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let is_highlighted = match state.highlight.link {
			Some(selected) => selected == i,
			None => {
				state.has_highlight()
					&& state.is_highlighted(link.source)
					&& state.is_highlighted(link.target)
			}
		};

		// t=0: every edge at base, t=1: highlighted edges brighten, others dim
		let (edge_alpha, arrow_alpha, width) = if is_highlighted {
			(0.6 + 0.3 * t, 0.8 + 0.1 * t, line_width * (1.0 + 0.3 * t))
		} else {
			(0.6 - 0.45 * t, 0.8 - 0.45 * t, line_width * (1.0 - 0.3 * t))
		};

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {})", edge_alpha));
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(n1.x + ux * NODE_RADIUS, n1.y + uy * NODE_RADIUS);
		ctx.line_to(
			n2.x - ux * (NODE_RADIUS + arrow_size),
			n2.y - uy * (NODE_RADIUS + arrow_size),
		);
		ctx.stroke();

		ctx.set_fill_style_str(&format!("rgba(100, 180, 255, {})", arrow_alpha));
		let (tip_x, tip_y) = (n2.x - ux * NODE_RADIUS, n2.y - uy * NODE_RADIUS);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();

		if is_highlighted && t > 0.01 {
			if let Some(label) = state.edge_labels.get(i).filter(|l| !l.is_empty()) {
				ctx.set_fill_style_str(&format!("rgba(200, 220, 255, {})", 0.9 * t));
				ctx.set_font(&format!("{}px sans-serif", 9.0 / k.max(0.5)));
				ctx.set_text_align("center");
				let _ = ctx.fill_text(label, (n1.x + n2.x) / 2.0, (n1.y + n2.y) / 2.0 - 3.0 / k);
				ctx.set_text_align("start");
			}
		}
	}
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_highlight() || state.highlight.t > 0.0,
		ease_out_cubic(state.highlight.t),
		state.viewport.transform().k,
	);
	let nodes = state.simulation.nodes();
	let selected = match &state.highlight.selection {
		Some(SelectionTarget::Node(id)) => state.simulation.node_index(id),
		_ => None,
	};

	for (i, node) in nodes.iter().enumerate() {
		if has_highlight && state.is_highlighted(i) {
			continue;
		}
		let (alpha, radius) = if has_highlight {
			(1.0 - 0.7 * t, NODE_RADIUS * (1.0 - 0.15 * t))
		} else {
			(1.0, NODE_RADIUS)
		};

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(state.node_color(i));
		ctx.fill();
		ctx.set_global_alpha(1.0);

		draw_label(state, ctx, i, node.x + radius + 3.0, node.y + 3.0, alpha * 0.8, k);
	}

	if !has_highlight {
		return;
	}

	for i in state.highlight.nodes.iter().copied() {
		let Some(node) = nodes.get(i) else {
			continue;
		};
		let is_selected = selected == Some(i);
		let (radius, glow_radius) = if is_selected {
			(NODE_RADIUS * (1.0 + 0.35 * t), NODE_RADIUS * (1.8 + 1.2 * t))
		} else {
			(NODE_RADIUS * (1.0 + 0.2 * t), NODE_RADIUS * (1.4 + 0.6 * t))
		};

		if t > 0.01 {
			if let Ok(gradient) =
				ctx.create_radial_gradient(node.x, node.y, radius * 0.3, node.x, node.y, glow_radius)
			{
				let alpha = if is_selected { 0.35 * t } else { 0.2 * t };
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", alpha));
				let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(node.x, node.y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(state.node_color(i));
		ctx.fill();

		if is_selected && t > 0.01 {
			ctx.begin_path();
			let _ = ctx.arc(node.x, node.y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		draw_label(state, ctx, i, node.x + radius + 3.0, node.y + 3.0, 1.0, k);
	}
}

fn draw_label(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, i: usize, x: f64, y: f64, alpha: f64, k: f64) {
	let Some(info) = state.nodes.get(i) else {
		return;
	};
	ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha));
	ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
	let _ = ctx.fill_text(&info.label, x, y);
}
