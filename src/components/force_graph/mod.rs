//! Canvas view of a knowledge graph. `simulation`, `viewport` and
//! `interaction` are headless; `render` and `component` are the browser side.

mod component;
pub mod interaction;
mod render;
pub mod simulation;
mod state;
mod types;
pub mod viewport;

pub use component::ForceGraphCanvas;
pub use simulation::{Bounds, Simulation};
pub use types::{Selected, SelectionTarget, Transform, ViewCommand};
pub use viewport::Viewport;
