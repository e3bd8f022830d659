pub mod document;
pub mod dom;
pub mod effect;
pub mod error;
pub mod geometry;
pub mod image;
pub mod input;
pub mod material;
pub mod mesh;
pub mod parser;
pub mod source;
pub mod triangles;

pub type Vector2 = cgmath::Vector2<f32>;
pub type Vector3 = cgmath::Vector3<f32>;
pub type Vector4 = cgmath::Vector4<f32>;

pub use document::Collada;
pub use error::{ImportError, ParseError};

pub const SEMANTIC_VERTEX: &str = "VERTEX";
pub const SEMANTIC_POSITION: &str = "POSITION";
pub const SEMANTIC_NORMAL: &str = "NORMAL";
pub const SEMANTIC_TEXCOORD: &str = "TEXCOORD";
