//! Leptos views.

pub mod analytics_panel;
pub mod force_graph;
