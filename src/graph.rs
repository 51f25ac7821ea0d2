//! Dependency graph resolution, code generation and visualization.
//!
//! # Examples
//!
//! ```rust
//! use wiregraph::graph::{GeneratorOptions, DEFAULT_MAX_RESOLUTION_DEPTH};
//!
//! assert_eq!(
//! 	GeneratorOptions::default().max_resolution_depth,
//! 	DEFAULT_MAX_RESOLUTION_DEPTH
//! );
//! ```

pub use wiregraph_graph::*;
