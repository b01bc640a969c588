use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::ForceGraphState;
use super::types::{Selected, Transform, ViewCommand};
use crate::graph::colors::ColorMap;
use crate::graph::{Graph, Position};
use crate::settings::CanvasSettings;

type SharedState = Rc<RefCell<Option<ForceGraphState>>>;
type SharedClosure = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

const FALLBACK_SIZE: (f64, f64) = (800.0, 600.0);

fn window_size(window: &Window) -> Option<(f64, f64)> {
	let w = window.inner_width().ok()?.as_f64()?;
	let h = window.inner_height().ok()?.as_f64()?;
	Some((w, h))
}

fn pointer_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Interactive force-directed view of `graph`.
///
/// The simulation is rebuilt whenever `graph` changes. Clicks report the
/// clicked node or edge (or `None` for the background) through `on_select`;
/// `on_settled` receives node positions each time the layout comes to rest.
#[component]
pub fn ForceGraphCanvas(
	/// The graph to lay out.
	#[prop(into)]
	graph: Signal<Graph>,
	/// Node colours by type; the built-in table when absent.
	#[prop(optional, into)]
	colors: Option<Signal<ColorMap>>,
	/// Layout and viewport tunables.
	#[prop(optional)]
	settings: CanvasSettings,
	/// Set to issue a zoom or fit request.
	#[prop(optional, into)]
	command: Option<Signal<Option<ViewCommand>>>,
	/// While true the layout does not tick (e.g. a replacement graph is on its way).
	#[prop(optional, into)]
	paused: Option<Signal<bool>>,
	/// Called on every click.
	#[prop(optional, into)]
	on_select: Option<Callback<Option<Selected>>>,
	/// Called whenever the drawn transform changes.
	#[prop(optional, into)]
	on_transform: Option<Callback<Transform>>,
	/// Called with every node position when the layout comes to rest.
	#[prop(optional, into)]
	on_settled: Option<Callback<Vec<(String, Position)>>>,
	/// Size the canvas to the window and follow resizes.
	#[prop(default = false)]
	fullscreen: bool,
	/// Canvas width when not fullscreen; the parent's width by default.
	#[prop(default = None)]
	width: Option<f64>,
	/// Canvas height when not fullscreen; the parent's height by default.
	#[prop(default = None)]
	height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: SharedClosure = Rc::new(RefCell::new(None));
	let resize_cb: SharedClosure = Rc::new(RefCell::new(None));
	let alive = Arc::new(AtomicBool::new(true));
	{
		let alive = alive.clone();
		on_cleanup(move || alive.store(false, Ordering::Relaxed));
	}

	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or(FALLBACK_SIZE)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(FALLBACK_SIZE.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(FALLBACK_SIZE.1)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("2d canvas context unavailable; graph view disabled");
			return;
		};

		let colors_now = colors.map(|c| c.get_untracked()).unwrap_or_default();
		let mut initial = graph.with_untracked(|g| ForceGraphState::new(g, w, h, settings.clone(), colors_now));
		initial.paused = paused.is_some_and(|p| p.get_untracked());
		*state_init.borrow_mut() = Some(initial);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(s) = state_resize.borrow_mut().as_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(cb) = resize_cb_init.borrow().as_ref() {
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner, resize_anim, alive_anim) = (
			state_init.clone(),
			animate_init.clone(),
			resize_cb_init.clone(),
			alive.clone(),
		);
		let mut last = js_sys::Date::now();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let Some(window) = web_sys::window() else {
				return;
			};
			if !alive_anim.load(Ordering::Relaxed) {
				if let Some(s) = state_anim.borrow_mut().as_mut() {
					s.stop();
				}
				if let Some(cb) = resize_anim.borrow().as_ref() {
					let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
				debug!("graph canvas unmounted, animation loop stopped");
				return;
			}

			let now = js_sys::Date::now();
			let dt = now - last;
			last = now;
			let report = state_anim.borrow_mut().as_mut().map(|s| {
				let report = s.frame(dt);
				render::render(s, &ctx);
				report
			});
			if let Some(report) = report {
				if let (Some(cb), Some(t)) = (on_transform, report.transform) {
					cb.run(t);
				}
				if let (Some(cb), Some(positions)) = (on_settled, report.settled) {
					cb.run(positions);
				}
			}

			if let Some(cb) = animate_inner.borrow().as_ref() {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(cb) = animate_init.borrow().as_ref() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// A new graph replaces the simulation; the first run only subscribes.
	let state_graph = state.clone();
	Effect::new(move |prev: Option<()>| {
		graph.with(|g| {
			if prev.is_some() {
				if let Some(s) = state_graph.borrow_mut().as_mut() {
					s.rebuild(g);
				}
			}
		});
	});

	if let Some(colors) = colors {
		let state_colors = state.clone();
		Effect::new(move |_| {
			let map = colors.get();
			if let Some(s) = state_colors.borrow_mut().as_mut() {
				s.colors = map;
			}
		});
	}

	if let Some(paused) = paused {
		let state_paused = state.clone();
		Effect::new(move |_| {
			let paused = paused.get();
			if let Some(s) = state_paused.borrow_mut().as_mut() {
				s.paused = paused;
			}
		});
	}

	if let Some(command) = command {
		let state_command = state.clone();
		Effect::new(move |_| {
			let Some(command) = command.get() else {
				return;
			};
			if let Some(s) = state_command.borrow_mut().as_mut() {
				s.apply_command(command);
			}
		});
	}

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(s) = state_md.borrow_mut().as_mut() {
			s.pointer_down(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(s) = state_mm.borrow_mut().as_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let click = state_mu.borrow_mut().as_mut().and_then(|s| s.pointer_up());
		if let (Some(target), Some(cb)) = (click, on_select) {
			let selected = target.and_then(|t| graph.with_untracked(|g| t.resolve(g)));
			cb.run(selected);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(s) = state_ml.borrow_mut().as_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(s) = state_wh.borrow_mut().as_mut() {
			s.wheel(ev.delta_y(), x, y);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
