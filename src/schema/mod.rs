//! Content model: the shapes of authored chamber graphs.

pub mod choice;
pub mod graph;
pub mod node;
pub mod value;
