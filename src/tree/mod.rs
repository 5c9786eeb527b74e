//! Tree materialization: renderable node lists with pullup flattening.

pub mod materializer;
pub mod node;
pub mod validate;

pub use materializer::TreeMaterializer;
pub use node::TreeNode;
