use std::time::Duration;

use leptos::ev;
use leptos::prelude::*;
use log::{debug, error, info};

use crate::components::analytics_panel::AnalyticsPanel;
use crate::components::force_graph::{ForceGraphCanvas, Selected, Transform, ViewCommand};
use crate::graph::analytics::analyze;
use crate::graph::colors::ColorMap;
use crate::graph::export::{cypher_script, graph_json, gremlin_script};
use crate::graph::label::{edge_display_label, node_display_label};
use crate::graph::session::{GraphSession, MergeMode, Outcome};
use crate::graph::{Graph, GraphError, MergeReport, Position};
use crate::settings::{CanvasSettings, LayoutConfig};

const SAMPLE_GRAPH: &str = include_str!("../../data/sample_graph.json");
const APPEND_GRAPH: &str = include_str!("../../data/append_graph.json");
const ENRICHMENT_GRAPH: &str = include_str!("../../data/enrichment.json");

/// Stand-in for the extraction backend's response time.
const RESPONSE_DELAY: Duration = Duration::from_millis(400);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExportFormat {
	Json,
	Cypher,
	Gremlin,
}

impl ExportFormat {
	fn from_value(value: &str) -> Self {
		match value {
			"cypher" => ExportFormat::Cypher,
			"gremlin" => ExportFormat::Gremlin,
			_ => ExportFormat::Json,
		}
	}

	fn render(self, graph: &Graph, include_properties: bool) -> Result<String, GraphError> {
		match self {
			ExportFormat::Json => graph_json(graph, include_properties),
			ExportFormat::Cypher => Ok(cypher_script(graph, include_properties)),
			ExportFormat::Gremlin => Ok(gremlin_script(graph, include_properties)),
		}
	}
}

fn describe(report: &MergeReport) -> String {
	let mut text = format!(
		"{} new entities, {} updated; {} new relationships",
		report.added_nodes, report.merged_nodes, report.added_edges
	);
	if !report.dropped_edges.is_empty() {
		text.push_str(&format!(", {} dropped (missing endpoint)", report.dropped_edges.len()));
	}
	text
}

fn selection_details(selected: &Selected) -> (String, String, Vec<(String, String)>) {
	let (title, kind, properties) = match selected {
		Selected::Node(n) => (node_display_label(n), n.node_type.clone(), &n.properties),
		Selected::Edge(e) => (
			edge_display_label(e),
			format!("{} → {}", e.source, e.target),
			&e.properties,
		),
	};
	let rows = properties
		.iter()
		.map(|(k, v)| (k.clone(), v.as_str().map_or_else(|| v.to_string(), str::to_string)))
		.collect();
	(title, kind, rows)
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let initial = Graph::from_json(SAMPLE_GRAPH).unwrap_or_else(|err| {
		error!("sample graph rejected: {err}");
		Graph::default()
	});
	let session = StoredValue::new(GraphSession::new(initial));
	// Structural snapshots only; settled positions go to the session.
	let graph = RwSignal::new(session.with_value(|s| s.graph().clone()));
	let colors = RwSignal::new(graph.with_untracked(ColorMap::for_graph));
	let analytics = Memo::new(move |_| graph.with(analyze));

	let selection = RwSignal::new(None::<Selected>);
	let zoom = RwSignal::new(100u32);
	let command = RwSignal::new(None::<ViewCommand>);
	let loading = RwSignal::new(false);
	let append = RwSignal::new(false);
	let status = RwSignal::new(String::new());
	let export_format = RwSignal::new(ExportFormat::Json);
	let export_properties = RwSignal::new(true);

	let settings = CanvasSettings {
		layout: LayoutConfig {
			anchor_placed_nodes: true,
			..LayoutConfig::default()
		},
		..CanvasSettings::default()
	};

	let publish = move || {
		let current = session.with_value(|s| s.graph().clone());
		selection.update(|sel| *sel = sel.as_ref().and_then(|s| s.target().resolve(&current)));
		graph.set(current);
	};

	let generate = move |payload: &'static str| {
		let Some(ticket) = session.try_update_value(|s| s.begin_generation()) else {
			return;
		};
		let mode = if append.get_untracked() {
			MergeMode::Append
		} else {
			MergeMode::Replace
		};
		loading.set(true);
		set_timeout(
			move || {
				let parsed = match mode {
					MergeMode::Replace => Graph::from_json(payload),
					MergeMode::Append => Graph::fragment_from_json(payload),
				};
				let outcome = session
					.try_update_value(|s| match parsed {
						Ok(g) => Ok(s.complete_generation(ticket, g, mode)),
						Err(err) => {
							s.fail_generation(ticket);
							Err(err)
						}
					})
					.unwrap_or(Ok(Outcome::Stale));
				match outcome {
					Ok(Outcome::Applied(report)) => {
						status.set(describe(&report));
						publish();
					}
					Ok(Outcome::Stale) => debug!("superseded extraction response ignored"),
					Err(err) => {
						error!("extraction payload rejected: {err}");
						status.set(err.user_message());
					}
				}
				loading.set(session.with_value(|s| s.is_layout_suspended()));
			},
			RESPONSE_DELAY,
		);
	};

	let enrich = move |_: ev::MouseEvent| {
		let ticket = session.with_value(|s| s.begin_enrichment());
		set_timeout(
			move || {
				let result = Graph::fragment_from_json(ENRICHMENT_GRAPH).map_err(|err| GraphError::Enrichment {
					service: "Wikipedia".into(),
					message: err.to_string(),
				});
				let outcome = session
					.try_update_value(|s| s.complete_enrichment(ticket, result))
					.unwrap_or(Ok(Outcome::Stale));
				match outcome {
					Ok(Outcome::Applied(report)) => {
						status.set(describe(&report));
						publish();
					}
					Ok(Outcome::Stale) => debug!("enrichment for an older graph ignored"),
					Err(err) => status.set(err.user_message()),
				}
			},
			RESPONSE_DELAY,
		);
	};

	let on_select = Callback::new(move |selected: Option<Selected>| selection.set(selected));
	let on_transform = Callback::new(move |t: Transform| zoom.set(t.zoom_percent()));
	let on_settled = Callback::new(move |positions: Vec<(String, Position)>| {
		session.update_value(|s| s.record_positions(positions.iter().map(|(id, p)| (id.as_str(), *p))));
		info!("layout settled, {} positions recorded", positions.len());
	});

	let set_color = move |node_type: String, value: String| {
		let mut map = colors.get_untracked();
		match map.set(node_type, &value) {
			Ok(()) => colors.set(map),
			Err(err) => status.set(err.user_message()),
		}
	};

	let export_text = move || {
		let include = export_properties.get();
		let format = export_format.get();
		// read the session so recorded positions are included
		graph.track();
		session
			.with_value(|s| format.render(s.graph(), include))
			.unwrap_or_else(|err| err.user_message())
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<ForceGraphCanvas
					graph=graph
					colors=colors
					settings=settings
					command=command
					paused=loading
					on_select=on_select
					on_transform=on_transform
					on_settled=on_settled
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Knowledge Graph"</h1>
					<p class="subtitle">
						"Click to select. Drag nodes to reposition. Scroll to zoom. Drag background to pan."
					</p>
					<div class="toolbar">
						<button on:click=move |_| generate(SAMPLE_GRAPH) disabled=move || loading.get()>
							"Generate"
						</button>
						<button on:click=move |_| generate(APPEND_GRAPH) disabled=move || loading.get()>
							"Extract more"
						</button>
						<label>
							<input
								type="checkbox"
								prop:checked=move || append.get()
								on:change=move |ev| append.set(event_target_checked(&ev))
							/>
							" Append to existing graph"
						</label>
						<button on:click=enrich>"Enrich from Wikipedia"</button>
					</div>
					<div class="toolbar">
						<button on:click=move |_| command.set(Some(ViewCommand::ZoomOut))>"−"</button>
						<span class="zoom">{move || format!("{}%", zoom.get())}</span>
						<button on:click=move |_| command.set(Some(ViewCommand::ZoomIn))>"+"</button>
						<button on:click=move |_| command.set(Some(ViewCommand::ZoomTo(1.0)))>"100%"</button>
						<button on:click=move |_| command.set(Some(ViewCommand::FitToView))>"Fit"</button>
					</div>
					<p class="status">{move || status.get()}</p>
					<Show when=move || loading.get()>
						<p class="loading">"Extracting…"</p>
					</Show>

					<section class="legend">
						<h2>"Types"</h2>
						<ul>
							{move || {
								graph
									.with(|g| colors.with(|c| c.legend(g)))
									.into_iter()
									.map(|(node_type, color)| {
										let key = node_type.clone();
										view! {
											<li>
												<input
													type="color"
													prop:value=color
													on:change=move |ev| set_color(key.clone(), event_target_value(&ev))
												/>
												" "
												{node_type}
											</li>
										}
									})
									.collect_view()
							}}
						</ul>
						<button on:click=move |_| {
							colors.update(|c| graph.with_untracked(|g| c.reset(g)))
						}>"Reset colours"</button>
					</section>

					<section class="selection">
						<h2>"Selection"</h2>
						{move || match selection.get() {
							None => view! { <p class="no-data">"Nothing selected."</p> }.into_any(),
							Some(selected) => {
								let (title, kind, rows) = selection_details(&selected);
								view! {
									<h3>{title}</h3>
									<p class="kind">{kind}</p>
									<dl>
										{rows
											.into_iter()
											.map(|(k, v)| view! { <dt>{k}</dt><dd>{v}</dd> })
											.collect_view()}
									</dl>
								}
									.into_any()
							}
						}}
					</section>

					<AnalyticsPanel analytics=analytics />

					<section class="export">
						<h2>"Export"</h2>
						<select on:change=move |ev| export_format.set(ExportFormat::from_value(&event_target_value(&ev)))>
							<option value="json">"JSON"</option>
							<option value="cypher">"Cypher"</option>
							<option value="gremlin">"Gremlin"</option>
						</select>
						<label>
							<input
								type="checkbox"
								prop:checked=move || export_properties.get()
								on:change=move |ev| export_properties.set(event_target_checked(&ev))
							/>
							" Include properties"
						</label>
						<textarea readonly=true rows="12" prop:value=export_text></textarea>
					</section>
				</div>
			</div>
		</ErrorBoundary>
	}
}
