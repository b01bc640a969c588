//! Tunables for the layout simulation and the viewport.

use serde::{Deserialize, Serialize};

use crate::graph::GraphError;

/// Allowed bounds for one tunable, shared by validation and UI sliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
	/// Lowest allowed value.
	pub min: f64,
	/// Highest allowed value.
	pub max: f64,
	/// Slider increment.
	pub step: f64,
}

impl SliderRange {
	/// Range from `min` to `max`.
	pub const fn new(min: f64, max: f64, step: f64) -> Self {
		Self { min, max, step }
	}

	/// `value` forced into range; NaN becomes `min`.
	pub fn clamp(&self, value: f64) -> f64 {
		if value.is_nan() {
			return self.min;
		}
		value.clamp(self.min, self.max)
	}
}

/// [`LayoutConfig::link_distance`].
pub const LINK_DISTANCE_RANGE: SliderRange = SliderRange::new(10.0, 500.0, 5.0);
/// [`LayoutConfig::charge_strength`].
pub const CHARGE_STRENGTH_RANGE: SliderRange = SliderRange::new(-2000.0, 0.0, 10.0);
/// [`LayoutConfig::collision_radius`].
pub const COLLISION_RADIUS_RANGE: SliderRange = SliderRange::new(0.0, 200.0, 1.0);
/// Strengths, decays and alphas.
pub const UNIT_RANGE: SliderRange = SliderRange::new(0.0, 1.0, 0.01);
/// [`LayoutConfig::seed_jitter`].
pub const SEED_JITTER_RANGE: SliderRange = SliderRange::new(0.0, 200.0, 1.0);

/// Viewport scale limits.
pub const SCALE_RANGE: SliderRange = SliderRange::new(0.01, 20.0, 0.01);
/// [`ViewportConfig::fit_padding`].
pub const FIT_PADDING_RANGE: SliderRange = SliderRange::new(0.0, 400.0, 5.0);
/// [`ViewportConfig::transition_ms`].
pub const TRANSITION_MS_RANGE: SliderRange = SliderRange::new(0.0, 5000.0, 50.0);

/// Force and cooling parameters of the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Rest length of the link spring.
	pub link_distance: f64,
	/// Many-body strength; negative repels.
	pub charge_strength: f64,
	/// Below this distance the many-body force stops growing.
	pub charge_distance_min: f64,
	/// Per-node radius enforced by the collision force.
	pub collision_radius: f64,
	/// How hard the centring force recentres the mean position.
	pub center_strength: f64,
	/// Fraction of velocity lost each tick.
	pub velocity_decay: f64,
	/// The layout stops once alpha falls below this.
	pub alpha_min: f64,
	/// Fraction of the distance to the target alpha covered per tick.
	pub alpha_decay: f64,
	/// Alpha restored when a drag starts.
	pub reheat_alpha: f64,
	/// Half-width of the square unplaced nodes are scattered in.
	pub seed_jitter: f64,
	/// RNG seed for scattering and jiggle.
	pub seed: u64,
	/// Pin nodes that already have a position so only new nodes move.
	pub anchor_placed_nodes: bool,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		let alpha_min = 0.001;
		Self {
			link_distance: 100.0,
			charge_strength: -300.0,
			charge_distance_min: 1.0,
			collision_radius: 20.0,
			center_strength: 1.0,
			velocity_decay: 0.4,
			alpha_min,
			// reaches alpha_min after ~300 ticks
			alpha_decay: 1.0 - f64::powf(alpha_min, 1.0 / 300.0),
			reheat_alpha: 0.3,
			seed_jitter: 10.0,
			seed: 0x6b67,
			anchor_placed_nodes: false,
		}
	}
}

impl LayoutConfig {
	/// Every value forced into its allowed range.
	pub fn clamped(mut self) -> Self {
		self.link_distance = LINK_DISTANCE_RANGE.clamp(self.link_distance);
		self.charge_strength = CHARGE_STRENGTH_RANGE.clamp(self.charge_strength);
		self.charge_distance_min = self.charge_distance_min.max(0.01);
		self.collision_radius = COLLISION_RADIUS_RANGE.clamp(self.collision_radius);
		self.center_strength = UNIT_RANGE.clamp(self.center_strength);
		self.velocity_decay = UNIT_RANGE.clamp(self.velocity_decay);
		self.alpha_min = UNIT_RANGE.clamp(self.alpha_min);
		self.alpha_decay = UNIT_RANGE.clamp(self.alpha_decay);
		self.reheat_alpha = UNIT_RANGE.clamp(self.reheat_alpha);
		self.seed_jitter = SEED_JITTER_RANGE.clamp(self.seed_jitter);
		self
	}
}

/// Zoom limits and animation timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
	/// Smallest zoom.
	pub min_scale: f64,
	/// Largest zoom.
	pub max_scale: f64,
	/// Margin added around the node bounding box by fit-to-view.
	pub fit_padding: f64,
	/// Length of animated zooms and fits.
	pub transition_ms: f64,
	/// Factor applied per zoom-in / zoom-out command.
	pub zoom_step: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.1,
			max_scale: 4.0,
			fit_padding: 50.0,
			transition_ms: 500.0,
			zoom_step: 1.2,
		}
	}
}

impl ViewportConfig {
	/// Every value forced into its allowed range.
	pub fn clamped(mut self) -> Self {
		self.min_scale = SCALE_RANGE.clamp(self.min_scale);
		self.max_scale = SCALE_RANGE.clamp(self.max_scale).max(self.min_scale);
		self.fit_padding = FIT_PADDING_RANGE.clamp(self.fit_padding);
		self.transition_ms = TRANSITION_MS_RANGE.clamp(self.transition_ms);
		if !(self.zoom_step > 1.0) {
			self.zoom_step = Self::default().zoom_step;
		}
		self
	}
}

/// All canvas tunables, as loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
	/// Simulation parameters.
	pub layout: LayoutConfig,
	/// Viewport parameters.
	pub viewport: ViewportConfig,
}

impl CanvasSettings {
	/// Parse settings; missing fields take their defaults, values are clamped.
	pub fn from_json(json: &str) -> Result<Self, GraphError> {
		let settings: CanvasSettings = serde_json::from_str(json)?;
		Ok(settings.clamped())
	}

	/// Both halves clamped.
	pub fn clamped(self) -> Self {
		Self {
			layout: self.layout.clamped(),
			viewport: self.viewport.clamped(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_falls_back_to_defaults() {
		let settings =
			CanvasSettings::from_json(r#"{"layout": {"link_distance": 150}, "viewport": {}}"#).unwrap();
		assert_eq!(settings.layout.link_distance, 150.0);
		assert_eq!(settings.layout.charge_strength, -300.0);
		assert_eq!(settings.viewport, ViewportConfig::default());
	}

	#[test]
	fn out_of_range_values_are_clamped() {
		let settings = CanvasSettings::from_json(
			r#"{"layout": {"velocity_decay": 3.0, "charge_strength": 50},
				"viewport": {"min_scale": 2.0, "max_scale": 1.0, "zoom_step": 0.5}}"#,
		)
		.unwrap();
		assert_eq!(settings.layout.velocity_decay, 1.0);
		assert_eq!(settings.layout.charge_strength, 0.0);
		assert_eq!(settings.viewport.max_scale, 2.0);
		assert_eq!(settings.viewport.zoom_step, 1.2);
	}

	#[test]
	fn default_decay_reaches_alpha_min_in_about_300_ticks() {
		let config = LayoutConfig::default();
		let alpha = (1.0 - config.alpha_decay).powi(300);
		assert!((alpha - config.alpha_min).abs() < 1e-9);
	}
}
