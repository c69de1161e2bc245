// codelab-common: shared types and utilities for the codelab workspace

pub mod path;
pub mod protocol;
pub mod types;
