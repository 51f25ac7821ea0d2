//! # wiregraph types
//!
//! The data model consumed by the wiregraph dependency graph compiler.
//!
//! ## Overview
//!
//! - [`TypeDescription`]: structural representation of a declared type, with a
//!   canonical text rendering and a grammar parser
//! - [`Property`] / [`PropertyKind`]: a labeled, typed slot and whether it holds
//!   a value or a deferred factory
//! - [`Dependency`] / [`SourceKind`]: a requirement and how it is satisfied
//! - [`Instantiable`]: a component description
//! - [`Initializer`]: a constructor shape and argument-list generation
//!
//! Every type is serde-serializable; a manifest of instantiables is the plain
//! JSON form of these types.
//!
//! ## Example
//!
//! ```rust
//! use wiregraph_types::{Dependency, Instantiable, Property, TypeDescription};
//!
//! let feed = Instantiable::new(TypeDescription::simple("FeedViewModel"))
//! 	.with_dependency(Dependency::instantiated(Property::parse("store", "FeedStore")))
//! 	.with_dependency(Dependency::received(Property::parse("user", "User")));
//!
//! assert_eq!(
//! 	feed.generate_argument_list().unwrap(),
//! 	"store: store, user: user"
//! );
//! ```

pub mod dependency;
pub mod initializer;
pub mod instantiable;
pub mod property;
pub mod type_description;

pub use dependency::{Dependency, SourceKind};
pub use initializer::{Argument, Initializer, InitializerError, TypeResult};
pub use instantiable::{DeclarationType, Instantiable};
pub use property::{Property, PropertyKind};
pub use type_description::{RUNTIME_MODULE, TupleElement, TypeDescription, TypeParseError, UnorderedTypes};
