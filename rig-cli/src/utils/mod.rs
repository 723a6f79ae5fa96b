//! Shared utilities for the rigkit CLI

pub mod settings;
pub mod table;
pub mod tree;

pub use settings::*;
pub use table::*;
pub use tree::*;
