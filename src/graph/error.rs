use thiserror::Error;

/// Failures surfaced by the graph core.
///
/// Dangling edges are deliberately absent here: they are reported as
/// [`Diagnostic`](super::Diagnostic)s and never abort ingestion.
#[derive(Error, Debug)]
pub enum GraphError {
	/// The payload was not valid graph JSON, or a graph failed to serialise.
	#[error("graph JSON error: {0}")]
	Json(#[from] serde_json::Error),
	/// A node arrived with a blank `type`.
	#[error("node `{id}` has an empty type")]
	EmptyNodeType {
		/// The offending node.
		id: String,
	},
	/// Two nodes in one payload share an id.
	#[error("duplicate node id `{0}`")]
	DuplicateNodeId(String),
	/// Two edges in one payload share an id.
	#[error("duplicate edge id `{0}`")]
	DuplicateEdgeId(String),
	/// A colour override that is not `#rgb` / `#rrggbb`.
	#[error("invalid colour `{0}`, expected #rgb or #rrggbb")]
	InvalidColor(String),
	/// A third-party lookup (web search, Wikipedia) failed.
	#[error("{service} request failed: {message}")]
	Enrichment {
		/// Name shown to the user, e.g. `Wikipedia`.
		service: String,
		/// What went wrong, for the log.
		message: String,
	},
}

impl GraphError {
	/// Short text suitable for an error banner in the host UI.
	pub fn user_message(&self) -> String {
		match self {
			GraphError::Json(_) => "The graph data could not be read.".to_string(),
			GraphError::EmptyNodeType { id } => format!("Entity \"{id}\" has no type."),
			GraphError::DuplicateNodeId(id) => format!("Entity \"{id}\" appears more than once."),
			GraphError::DuplicateEdgeId(id) => {
				format!("Relationship \"{id}\" appears more than once.")
			}
			GraphError::InvalidColor(c) => format!("\"{c}\" is not a valid colour."),
			GraphError::Enrichment { service, .. } => {
				format!("{service} is unavailable right now. Please try again.")
			}
		}
	}
}
