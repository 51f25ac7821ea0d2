//! Component data model and type grammar.
//!
//! # Examples
//!
//! ```rust
//! use wiregraph::types::{Property, PropertyKind};
//!
//! let property = Property::parse("detailBuilder", "Instantiator<Detail>");
//! assert_eq!(property.kind(), PropertyKind::Instantiator);
//! ```

pub use wiregraph_types::*;
