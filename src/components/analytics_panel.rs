//! Dashboard for [`GraphAnalytics`].

use leptos::prelude::*;

use crate::graph::analytics::{Count, GraphAnalytics};

fn bars(counts: Vec<Count>) -> impl IntoView {
	let max = counts.iter().map(|c| c.count).max().unwrap_or(1).max(1) as f64;
	counts
		.into_iter()
		.map(|c| {
			let width = format!("width: {:.1}%;", c.count as f64 / max * 100.0);
			view! {
				<li class="bar-row">
					<span class="bar-key">{c.key}</span>
					<span class="bar" style=width></span>
					<span class="bar-count">{c.count}</span>
				</li>
			}
		})
		.collect_view()
}

/// Summary metrics, most connected nodes and type/relationship charts.
#[component]
pub fn AnalyticsPanel(
	/// Result of [`analyze`](crate::graph::analytics::analyze) for the current graph.
	#[prop(into)]
	analytics: Signal<GraphAnalytics>,
) -> impl IntoView {
	let has_data = move || analytics.with(|a| a.node_count > 0);

	view! {
		<section class="analytics-panel">
			<h2>"Analytics"</h2>
			<Show when=has_data fallback=|| view! { <p class="no-data">"No graph data to analyse."</p> }>
				<dl class="metrics">
					<dt>"Nodes"</dt>
					<dd>{move || analytics.with(|a| a.node_count)}</dd>
					<dt>"Edges"</dt>
					<dd>{move || analytics.with(|a| a.edge_count)}</dd>
					<dt>"Density"</dt>
					<dd>{move || analytics.with(|a| format!("{:.3}", a.density))}</dd>
					<dt>"Average degree"</dt>
					<dd>{move || analytics.with(|a| format!("{:.2}", a.average_degree))}</dd>
					<dt>"Isolated"</dt>
					<dd>{move || analytics.with(|a| a.isolated_nodes.len())}</dd>
				</dl>

				<h3>"Most connected"</h3>
				<ol class="central-nodes">
					{move || {
						analytics
							.with(|a| a.central_nodes.clone())
							.into_iter()
							.map(|n| {
								view! {
									<li>
										{n.label} <span class="node-type">{n.node_type}</span>
										<span class="degree">{n.degree}</span>
									</li>
								}
							})
							.collect_view()
					}}
				</ol>

				<h3>"Node types"</h3>
				<ul class="bars">{move || bars(analytics.with(|a| a.node_types.clone()))}</ul>

				<h3>"Relationships"</h3>
				<ul class="bars">{move || bars(analytics.with(|a| a.top_edge_labels.clone()))}</ul>
			</Show>
		</section>
	}
}
