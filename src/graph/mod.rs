//! Headless knowledge-graph core: the data model plus everything computed
//! from it without a simulation (merging, analytics, colours, exports).

pub mod analytics;
pub mod colors;
mod error;
pub mod export;
pub mod label;
mod merge;
mod model;
pub mod session;

pub use error::GraphError;
pub use merge::MergeReport;
pub use model::{Diagnostic, Edge, Graph, Node, Position, Properties};
