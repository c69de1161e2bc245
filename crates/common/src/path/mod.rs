pub mod normalize;

pub use normalize::{relative_slash_path, resolve_lexical, PathError};
