//! # wiregraph graph
//!
//! Dependency graph resolution and wiring code generation.
//!
//! ## Pipeline
//!
//! 1. [`InstantiableRegistry`] indexes every component by each type it fulfills
//! 2. [`ScopeBuilder`] resolves a root into a tree of [`Scope`]s, validating
//!    every dependency against the registry and the ancestor chain
//! 3. [`ScopeGenerator`] orders sibling properties by what they receive from
//!    each other and emits the root's no-argument initializer
//! 4. [`DependencyTreeGenerator`] runs the above for every root and assembles
//!    the output file or a [`DependencyGraph`]
//!
//! Failures are collected rather than reported one at a time; see
//! [`GraphErrors`].
//!
//! ## Example
//!
//! ```rust
//! use wiregraph_graph::{DependencyTreeGenerator, GeneratorOptions};
//! use wiregraph_types::{Dependency, Instantiable, Property, TypeDescription};
//!
//! let root = Instantiable::new(TypeDescription::simple("AppRoot"))
//! 	.root()
//! 	.with_dependency(Dependency::instantiated(Property::parse("store", "Store")));
//! let store = Instantiable::new(TypeDescription::simple("Store"));
//!
//! let generator =
//! 	DependencyTreeGenerator::new([root, store], Vec::new(), GeneratorOptions::default()).unwrap();
//! let file = generator.generate_file().unwrap();
//! assert!(file.contains("let store = Store()"));
//! ```

pub mod cycle_detection;
pub mod error;
pub mod generator;
pub mod registry;
pub mod scope;
pub mod tree;
pub mod visualization;

pub use cycle_detection::{DEFAULT_MAX_RESOLUTION_DEPTH, ResolutionStack};
pub use error::{GraphError, GraphErrors, GraphResult};
pub use generator::{GeneratorKind, ScopeGenerator};
pub use registry::{InstantiableRegistry, resolve_fulfillment};
pub use scope::{PropertyToGenerate, Scope, ScopeBuilder};
pub use tree::{
	DependencyTreeGenerator, FILE_HEADER, GeneratedRoot, GeneratorOptions, build_and_generate,
	generate_graph_edges,
};
pub use visualization::{DependencyGraph, GraphStatistics};
