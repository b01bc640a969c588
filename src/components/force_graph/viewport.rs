//! Pan/zoom state between simulation space and canvas pixels.

use log::debug;

use super::simulation::Bounds;
use super::types::{Transform, ViewCommand};
use crate::settings::ViewportConfig;

pub(crate) fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

#[derive(Clone, Debug)]
struct Transition {
	from: Transform,
	to: Transform,
	elapsed: f64,
}

/// Current and target transform for one canvas, plus its size in pixels.
#[derive(Clone, Debug)]
pub struct Viewport {
	width: f64,
	height: f64,
	current: Transform,
	transition: Option<Transition>,
	config: ViewportConfig,
}

impl Viewport {
	/// Identity transform over a `width`×`height` canvas.
	pub fn new(width: f64, height: f64, config: ViewportConfig) -> Self {
		Self {
			width,
			height,
			current: Transform::IDENTITY,
			transition: None,
			config: config.clamped(),
		}
	}

	/// The transform to draw with right now.
	pub fn transform(&self) -> Transform {
		self.current
	}

	/// Where the view ends up once any running transition finishes.
	pub fn target(&self) -> Transform {
		self.transition.as_ref().map_or(self.current, |t| t.to)
	}

	/// Whether a transition is still running.
	pub fn is_animating(&self) -> bool {
		self.transition.is_some()
	}

	/// Canvas size in pixels.
	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	/// Track a canvas resize; the transform is left alone.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Canvas pixel to simulation coordinates under the drawn transform.
	pub fn screen_to_sim(&self, sx: f64, sy: f64) -> (f64, f64) {
		self.current.to_sim(sx, sy)
	}

	fn clamp_scale(&self, k: f64) -> f64 {
		if k.is_finite() {
			k.clamp(self.config.min_scale, self.config.max_scale)
		} else {
			self.target().k
		}
	}

	/// Animate to absolute scale `k`, keeping the point under the viewport
	/// centre where it is.
	pub fn zoom(&mut self, k: f64) {
		let from = self.target();
		let k = self.clamp_scale(k);
		let (cx, cy) = (self.width / 2.0, self.height / 2.0);
		let (px, py) = from.to_sim(cx, cy);
		self.animate_to(Transform {
			x: cx - px * k,
			y: cy - py * k,
			k,
		});
	}

	/// Animate to the target scale times `factor`.
	pub fn zoom_by(&mut self, factor: f64) {
		self.zoom(self.target().k * factor);
	}

	/// Immediate zoom about a screen point (wheel).
	pub fn zoom_at(&mut self, factor: f64, sx: f64, sy: f64) {
		self.transition = None;
		let t = self.current;
		let k = self.clamp_scale(t.k * factor);
		let ratio = k / t.k;
		self.current = Transform {
			x: sx - (sx - t.x) * ratio,
			y: sy - (sy - t.y) * ratio,
			k,
		};
	}

	/// Immediate translation by a screen delta.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.transition = None;
		self.current.x += dx;
		self.current.y += dy;
	}

	/// Animate to an arbitrary transform; scale is clamped.
	pub fn pan_and_zoom_to(&mut self, to: Transform) {
		let to = Transform {
			k: self.clamp_scale(to.k),
			..to
		};
		self.animate_to(to);
	}

	/// Set the transform without animating.
	pub fn jump_to(&mut self, to: Transform) {
		self.transition = None;
		self.current = Transform {
			k: self.clamp_scale(to.k),
			..to
		};
	}

	/// Frame the padded bounding box of `bounds`. Returns false (and leaves
	/// the transform alone) when there is nothing to frame or the box is
	/// degenerate.
	pub fn fit_to_view(&mut self, bounds: Option<Bounds>) -> bool {
		let Some(b) = bounds else {
			return false;
		};
		if !(b.width() > 0.0 && b.height() > 0.0) {
			debug!("fit-to-view skipped: degenerate bounds {b:?}");
			return false;
		}
		let pad = self.config.fit_padding;
		let (bw, bh) = (b.width() + 2.0 * pad, b.height() + 2.0 * pad);
		let k = self.clamp_scale((self.width / bw).min(self.height / bh).min(self.config.max_scale));
		let (cx, cy) = b.center();
		self.animate_to(Transform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		});
		true
	}

	/// Run a host command. `bounds` is only consulted by fit-to-view.
	pub fn apply(&mut self, command: ViewCommand, bounds: Option<Bounds>) {
		match command {
			ViewCommand::ZoomTo(k) => self.zoom(k),
			ViewCommand::ZoomIn => self.zoom_by(self.config.zoom_step),
			ViewCommand::ZoomOut => self.zoom_by(1.0 / self.config.zoom_step),
			ViewCommand::FitToView => {
				self.fit_to_view(bounds);
			}
		}
	}

	/// Advance the running transition by `dt_ms`. Returns whether the
	/// transform changed.
	pub fn advance(&mut self, dt_ms: f64) -> bool {
		let Some(tr) = self.transition.as_mut() else {
			return false;
		};
		tr.elapsed += dt_ms.max(0.0);
		let t = (tr.elapsed / self.config.transition_ms).min(1.0);
		let e = ease_out_cubic(t);
		self.current = Transform {
			x: tr.from.x + (tr.to.x - tr.from.x) * e,
			y: tr.from.y + (tr.to.y - tr.from.y) * e,
			k: tr.from.k + (tr.to.k - tr.from.k) * e,
		};
		if t >= 1.0 {
			self.current = tr.to;
			self.transition = None;
		}
		true
	}

	fn animate_to(&mut self, to: Transform) {
		if self.config.transition_ms <= 0.0 {
			self.current = to;
			self.transition = None;
			return;
		}
		self.transition = Some(Transition {
			from: self.current,
			to,
			elapsed: 0.0,
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn viewport() -> Viewport {
		Viewport::new(800.0, 600.0, ViewportConfig::default())
	}

	fn settle(v: &mut Viewport) {
		while v.is_animating() {
			v.advance(16.0);
		}
	}

	#[test]
	fn fit_is_noop_without_nodes_or_extent() {
		let mut v = viewport();
		v.jump_to(Transform { x: 5.0, y: 6.0, k: 2.0 });
		let before = v.transform();

		assert!(!v.fit_to_view(None));
		let single = Bounds::from_points([(10.0, 10.0)]);
		assert!(!v.fit_to_view(single));
		let flat = Bounds::from_points([(0.0, 10.0), (100.0, 10.0)]);
		assert!(!v.fit_to_view(flat));

		assert!(!v.is_animating());
		assert_eq!(v.transform(), before);
	}

	#[test]
	fn fit_centres_padded_box_and_caps_scale() {
		let mut v = viewport();
		let b = Bounds::from_points([(0.0, 0.0), (300.0, 100.0)]);
		assert!(v.fit_to_view(b));
		assert!(v.is_animating());
		settle(&mut v);
		let t = v.transform();
		// padded box is 400 x 200, width-limited
		assert!((t.k - 2.0).abs() < 1e-9);
		assert_eq!(t.to_screen(150.0, 50.0), (400.0, 300.0));

		let tiny = Bounds::from_points([(0.0, 0.0), (1.0, 1.0)]);
		let mut v = Viewport::new(
			800.0,
			600.0,
			ViewportConfig {
				fit_padding: 0.0,
				..ViewportConfig::default()
			},
		);
		v.fit_to_view(tiny);
		settle(&mut v);
		assert_eq!(v.transform().k, 4.0);
	}

	#[test]
	fn zoom_keeps_centre_and_clamps() {
		let mut v = viewport();
		v.jump_to(Transform { x: 100.0, y: 50.0, k: 1.0 });
		let centre = v.screen_to_sim(400.0, 300.0);

		v.zoom(2.0);
		settle(&mut v);
		assert_eq!(v.transform().k, 2.0);
		let (sx, sy) = v.transform().to_screen(centre.0, centre.1);
		assert!((sx - 400.0).abs() < 1e-9 && (sy - 300.0).abs() < 1e-9);

		v.zoom(100.0);
		settle(&mut v);
		assert_eq!(v.transform().k, 4.0);
		v.zoom(0.0);
		settle(&mut v);
		assert_eq!(v.transform().k, 0.1);
	}

	#[test]
	fn transition_eases_then_lands_exactly() {
		let mut v = viewport();
		v.pan_and_zoom_to(Transform { x: 100.0, y: 0.0, k: 1.0 });
		assert_eq!(v.transform(), Transform::IDENTITY);
		assert!(v.advance(250.0));
		let mid = v.transform().x;
		// ease-out is past the linear midpoint
		assert!(mid > 50.0 && mid < 100.0);
		v.advance(250.0);
		assert!(!v.is_animating());
		assert_eq!(v.transform().x, 100.0);
		assert!(!v.advance(16.0));
	}

	#[test]
	fn consecutive_zoom_steps_compound_from_target() {
		let mut v = viewport();
		v.apply(ViewCommand::ZoomIn, None);
		v.apply(ViewCommand::ZoomIn, None);
		assert!((v.target().k - 1.44).abs() < 1e-9);
		v.apply(ViewCommand::ZoomOut, None);
		settle(&mut v);
		assert!((v.transform().k - 1.2).abs() < 1e-9);
	}

	#[test]
	fn wheel_zoom_and_pan_are_immediate() {
		let mut v = viewport();
		v.zoom_at(2.0, 100.0, 100.0);
		assert!(!v.is_animating());
		assert_eq!(v.transform(), Transform { x: -100.0, y: -100.0, k: 2.0 });
		v.pan_by(10.0, -5.0);
		assert_eq!(v.transform(), Transform { x: -90.0, y: -105.0, k: 2.0 });
		v.zoom_at(1000.0, 0.0, 0.0);
		assert_eq!(v.transform().k, 4.0);
	}

	#[test]
	fn zero_duration_applies_instantly() {
		let mut v = Viewport::new(
			800.0,
			600.0,
			ViewportConfig {
				transition_ms: 0.0,
				..ViewportConfig::default()
			},
		);
		v.zoom(2.0);
		assert!(!v.is_animating());
		assert_eq!(v.transform().k, 2.0);
	}
}
