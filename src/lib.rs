//! # wiregraph
//!
//! A compile-time dependency injection graph compiler.
//!
//! wiregraph reads normalized component descriptions, validates the complete
//! dependency graph of every root component and emits source code that wires
//! the components together through plain initializer calls. Nothing is
//! resolved at runtime and no reflection is involved.
//!
//! ## Core Principles
//!
//! - **Closed world**: every component is known before generation starts
//! - **Ancestor visibility**: a component may only receive what an ancestor in
//!   its instantiation chain instantiates or forwards
//! - **Collected diagnostics**: independent problems are reported together
//!
//! ## Crates
//!
//! - [`types`]: component, dependency and type descriptions
//! - [`graph`]: registry, resolution, cycle detection and code generation
//!
//! ## Quick Example
//!
//! ```rust
//! use wiregraph::prelude::*;
//!
//! let root = Instantiable::new(TypeDescription::simple("AppRoot"))
//! 	.root()
//! 	.with_dependency(Dependency::instantiated(Property::parse("store", "Store")))
//! 	.with_dependency(Dependency::instantiated(Property::parse("feed", "Feed")));
//! let store = Instantiable::new(TypeDescription::simple("Store"));
//! let feed = Instantiable::new(TypeDescription::simple("Feed"))
//! 	.with_dependency(Dependency::received(Property::parse("store", "Store")));
//!
//! let generator = DependencyTreeGenerator::new(
//! 	[root, store, feed],
//! 	vec!["Foundation".to_string()],
//! 	GeneratorOptions::default(),
//! )
//! .unwrap();
//! let file = generator.generate_file().unwrap();
//!
//! assert!(file.contains("let store = Store()"));
//! assert!(file.contains("let feed = Feed(store: store)"));
//! ```

pub mod graph;
pub mod types;

pub use wiregraph_graph::{
	DependencyTreeGenerator, GeneratorOptions, GraphError, GraphErrors, GraphResult,
};
pub use wiregraph_types::{Dependency, Instantiable, Property, TypeDescription};

/// Commonly used types for building and generating dependency graphs.
pub mod prelude {
	pub use crate::graph::{
		DependencyGraph, DependencyTreeGenerator, FILE_HEADER, GeneratorOptions, GraphError,
		GraphErrors, GraphResult, InstantiableRegistry, build_and_generate,
	};
	pub use crate::types::{
		Argument, DeclarationType, Dependency, Initializer, Instantiable, Property, PropertyKind,
		SourceKind, TypeDescription,
	};
}
