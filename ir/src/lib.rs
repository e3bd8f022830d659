pub mod error;
pub mod geometry;
pub mod model;

pub use error::BakeError;
pub use model::{bake_document, bake_geometry, BakeOptions, Model};
