//! Structural descriptions of declared types
//!
//! A [`TypeDescription`] is the key every lookup in the dependency graph is
//! made with. Two descriptions are equal when they are structurally equal,
//! independent of how the original declaration was spaced, and
//! [`TypeDescription::as_source`] renders the canonical text form.
//!
//! ## Example
//!
//! ```rust
//! use wiregraph_types::TypeDescription;
//!
//! let description = TypeDescription::parse("Instantiator< UserService >?");
//! assert_eq!(description.as_source(), "Instantiator<UserService>?");
//! assert_eq!(description, TypeDescription::parse("Instantiator<UserService>?"));
//! ```

mod parser;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::property::PropertyKind;

pub use parser::TypeParseError;

/// Module that ships the deferred wrapper types referenced by generated code.
pub const RUNTIME_MODULE: &str = "WireGraph";

/// Canonical, structural representation of a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDescription {
	/// A nominal type such as `Int` or `Array<Element>`.
	Simple {
		name: String,
		#[serde(default, skip_serializing_if = "Vec::is_empty")]
		generics: Vec<TypeDescription>,
	},
	/// A type declared inside another type, e.g. `Outer.Inner<T>`.
	Nested {
		name: String,
		parent: Box<TypeDescription>,
		#[serde(default, skip_serializing_if = "Vec::is_empty")]
		generics: Vec<TypeDescription>,
	},
	/// A protocol composition `A & B`. Member order does not matter.
	Composition(UnorderedTypes),
	/// `T?`
	Optional(Box<TypeDescription>),
	/// `T!`
	ImplicitlyUnwrappedOptional(Box<TypeDescription>),
	/// `some T`
	#[serde(rename = "some")]
	Opaque(Box<TypeDescription>),
	/// `any T`
	#[serde(rename = "any")]
	Existential(Box<TypeDescription>),
	/// `T.Type` when `is_type`, otherwise `T.Protocol`.
	Metatype {
		base: Box<TypeDescription>,
		is_type: bool,
	},
	/// A type carrying attributes and an ownership specifier, e.g.
	/// `@escaping @Sendable () -> Void` or `inout Int`.
	Attributed {
		base: Box<TypeDescription>,
		#[serde(default)]
		specifier: Option<String>,
		#[serde(default)]
		attributes: Vec<String>,
	},
	/// `[T]`
	Array(Box<TypeDescription>),
	/// `[K: V]`
	Dictionary {
		key: Box<TypeDescription>,
		value: Box<TypeDescription>,
	},
	/// `(label: T, U)`
	Tuple(Vec<TupleElement>),
	/// `(A, B) async throws -> R`
	Closure {
		arguments: Vec<TypeDescription>,
		#[serde(default)]
		is_async: bool,
		#[serde(default)]
		does_throw: bool,
		return_type: Box<TypeDescription>,
	},
	/// Text the grammar could not make sense of, kept verbatim.
	Unknown(String),
}

/// One element of a tuple type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupleElement {
	#[serde(default)]
	pub label: Option<String>,
	#[serde(rename = "type")]
	pub type_description: TypeDescription,
}

impl TupleElement {
	/// Creates a tuple element.
	pub fn new(label: Option<&str>, type_description: TypeDescription) -> Self {
		Self {
			label: label.map(str::to_string),
			type_description,
		}
	}

	fn as_source(&self) -> String {
		match &self.label {
			Some(label) => format!("{label}: {}", self.type_description.as_source()),
			None => self.type_description.as_source(),
		}
	}
}

/// Members of a protocol composition, kept flattened and in canonical order so
/// that `A & B` and `B & A` compare equal and render identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<TypeDescription>", into = "Vec<TypeDescription>")]
pub struct UnorderedTypes(Vec<TypeDescription>);

impl UnorderedTypes {
	/// Iterates the members in canonical order.
	pub fn iter(&self) -> std::slice::Iter<'_, TypeDescription> {
		self.0.iter()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<Vec<TypeDescription>> for UnorderedTypes {
	fn from(types: Vec<TypeDescription>) -> Self {
		let mut flattened = Vec::with_capacity(types.len());
		for member in types {
			match member {
				TypeDescription::Composition(nested) => flattened.extend(nested.0),
				other => flattened.push(other),
			}
		}
		flattened.sort();
		flattened.dedup();
		Self(flattened)
	}
}

impl From<UnorderedTypes> for Vec<TypeDescription> {
	fn from(types: UnorderedTypes) -> Self {
		types.0
	}
}

impl TypeDescription {
	/// Creates a non-generic nominal type.
	pub fn simple(name: impl Into<String>) -> Self {
		Self::Simple {
			name: name.into(),
			generics: Vec::new(),
		}
	}

	/// Creates a generic nominal type.
	pub fn generic(name: impl Into<String>, generics: Vec<TypeDescription>) -> Self {
		Self::Simple {
			name: name.into(),
			generics,
		}
	}

	/// Wraps `self` in an optional.
	pub fn into_optional(self) -> Self {
		Self::Optional(Box::new(self))
	}

	/// Parses type text, falling back to [`TypeDescription::Unknown`] when the
	/// text does not follow the type grammar.
	pub fn parse(text: &str) -> Self {
		parser::parse_type(text).unwrap_or_else(|_| Self::Unknown(text.trim().to_string()))
	}

	/// Renders the canonical source text of this type.
	pub fn as_source(&self) -> String {
		match self {
			Self::Simple { name, generics } => format!("{name}{}", render_generics(generics)),
			Self::Nested {
				name,
				parent,
				generics,
			} => format!("{}.{name}{}", parent.as_source(), render_generics(generics)),
			Self::Composition(types) => types
				.iter()
				.map(Self::as_grouped_source)
				.collect::<Vec<_>>()
				.join(" & "),
			Self::Optional(wrapped) => format!("{}?", wrapped.as_grouped_source()),
			Self::ImplicitlyUnwrappedOptional(wrapped) => format!("{}!", wrapped.as_grouped_source()),
			Self::Opaque(wrapped) => format!("some {}", wrapped.as_source()),
			Self::Existential(wrapped) => format!("any {}", wrapped.as_source()),
			Self::Metatype { base, is_type } => format!(
				"{}.{}",
				base.as_grouped_source(),
				if *is_type { "Type" } else { "Protocol" }
			),
			Self::Attributed {
				base,
				specifier,
				attributes,
			} => {
				let mut source = String::new();
				for attribute in attributes {
					source.push('@');
					source.push_str(attribute);
					source.push(' ');
				}
				if let Some(specifier) = specifier {
					source.push_str(specifier);
					source.push(' ');
				}
				source.push_str(&base.as_source());
				source
			}
			Self::Array(element) => format!("[{}]", element.as_source()),
			Self::Dictionary { key, value } => {
				format!("[{}: {}]", key.as_source(), value.as_source())
			}
			Self::Tuple(elements) => match elements.as_slice() {
				// A single unlabeled element is the element itself.
				[TupleElement { label: None, type_description }] => type_description.as_source(),
				_ => format!(
					"({})",
					elements
						.iter()
						.map(TupleElement::as_source)
						.collect::<Vec<_>>()
						.join(", ")
				),
			},
			Self::Closure {
				arguments,
				is_async,
				does_throw,
				return_type,
			} => format!(
				"({}){}{} -> {}",
				arguments
					.iter()
					.map(Self::as_source)
					.collect::<Vec<_>>()
					.join(", "),
				if *is_async { " async" } else { "" },
				if *does_throw { " throws" } else { "" },
				return_type.as_source()
			),
			Self::Unknown(text) => text.clone(),
		}
	}

	/// Whether the type must be parenthesized when a postfix operator or a
	/// composition member follows or surrounds it.
	fn needs_grouping(&self) -> bool {
		match self {
			Self::Composition(types) => types.len() > 1,
			Self::Opaque(_) | Self::Existential(_) | Self::Attributed { .. } | Self::Closure { .. } => {
				true
			}
			Self::Tuple(elements) => matches!(
				elements.as_slice(),
				[TupleElement { label: None, type_description }] if type_description.needs_grouping()
			),
			_ => false,
		}
	}

	fn as_grouped_source(&self) -> String {
		if self.needs_grouping() {
			format!("({})", self.as_source())
		} else {
			self.as_source()
		}
	}

	/// Generic arguments of a nominal type; empty for every other shape.
	pub fn generics(&self) -> &[TypeDescription] {
		match self {
			Self::Simple { generics, .. } | Self::Nested { generics, .. } => generics,
			_ => &[],
		}
	}

	/// Strips optionality, implicit unwrapping, `some`/`any` and attributes.
	///
	/// Used only to explain near misses; matching itself is always strict.
	pub fn strip_decorations(&self) -> &TypeDescription {
		match self {
			Self::Optional(wrapped)
			| Self::ImplicitlyUnwrappedOptional(wrapped)
			| Self::Opaque(wrapped)
			| Self::Existential(wrapped) => wrapped.strip_decorations(),
			Self::Attributed { base, .. } => base.strip_decorations(),
			_ => self,
		}
	}

	/// Classifies the type as a constant or as one of the deferred wrappers.
	pub fn property_kind(&self) -> PropertyKind {
		let (name, generics) = match self {
			Self::Simple { name, generics } => (name.as_str(), generics),
			Self::Nested {
				name,
				parent,
				generics,
			} if **parent == Self::simple(RUNTIME_MODULE) => (name.as_str(), generics),
			_ => return PropertyKind::Constant,
		};
		PropertyKind::from_wrapper(name, generics.len()).unwrap_or(PropertyKind::Constant)
	}

	/// The type a property of this type causes to be instantiated.
	///
	/// Deferred wrappers produce their last generic argument
	/// (`Instantiator<T>` and `ErasedInstantiator<Args, T>` both produce `T`);
	/// every other type produces itself.
	pub fn instantiated_type(&self) -> TypeDescription {
		if self.property_kind().is_deferred()
			&& let Some(produced) = self.generics().last()
		{
			return produced.clone();
		}
		self.clone()
	}

	/// Returns a copy with the generic argument at `index` replaced.
	pub fn with_generic_at(&self, index: usize, generic: TypeDescription) -> TypeDescription {
		let mut copy = self.clone();
		if let Self::Simple { generics, .. } | Self::Nested { generics, .. } = &mut copy
			&& let Some(slot) = generics.get_mut(index)
		{
			*slot = generic;
		}
		copy
	}
}

fn render_generics(generics: &[TypeDescription]) -> String {
	if generics.is_empty() {
		String::new()
	} else {
		format!(
			"<{}>",
			generics
				.iter()
				.map(TypeDescription::as_source)
				.collect::<Vec<_>>()
				.join(", ")
		)
	}
}

impl fmt::Display for TypeDescription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.as_source())
	}
}

impl FromStr for TypeDescription {
	type Err = TypeParseError;

	fn from_str(text: &str) -> Result<Self, Self::Err> {
		parser::parse_type(text)
	}
}

impl PartialOrd for TypeDescription {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Orders by canonical source text. Distinct structures that happen to render
/// identically fall back to their structural form so the order stays total.
impl Ord for TypeDescription {
	fn cmp(&self, other: &Self) -> Ordering {
		if self == other {
			return Ordering::Equal;
		}
		self.as_source()
			.cmp(&other.as_source())
			.then_with(|| format!("{self:?}").cmp(&format!("{other:?}")))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn boxed(description: TypeDescription) -> Box<TypeDescription> {
		Box::new(description)
	}

	#[rstest]
	#[case(TypeDescription::simple("Int"), "Int")]
	#[case(
		TypeDescription::generic("Dictionary", vec![TypeDescription::simple("String"), TypeDescription::simple("Int")]),
		"Dictionary<String, Int>"
	)]
	#[case(
		TypeDescription::Nested { name: "Inner".into(), parent: boxed(TypeDescription::simple("Outer")), generics: vec![] },
		"Outer.Inner"
	)]
	#[case(TypeDescription::simple("Thing").into_optional(), "Thing?")]
	#[case(TypeDescription::ImplicitlyUnwrappedOptional(boxed(TypeDescription::simple("Thing"))), "Thing!")]
	#[case(TypeDescription::Opaque(boxed(TypeDescription::simple("View"))), "some View")]
	#[case(TypeDescription::Existential(boxed(TypeDescription::simple("Service"))), "any Service")]
	#[case(
		TypeDescription::Metatype { base: boxed(TypeDescription::simple("Thing")), is_type: true },
		"Thing.Type"
	)]
	#[case(
		TypeDescription::Metatype { base: boxed(TypeDescription::simple("Service")), is_type: false },
		"Service.Protocol"
	)]
	#[case(TypeDescription::Array(boxed(TypeDescription::simple("Int"))), "[Int]")]
	#[case(
		TypeDescription::Dictionary { key: boxed(TypeDescription::simple("String")), value: boxed(TypeDescription::simple("Int")) },
		"[String: Int]"
	)]
	#[case(
		TypeDescription::Tuple(vec![
			TupleElement::new(Some("name"), TypeDescription::simple("String")),
			TupleElement::new(None, TypeDescription::simple("Int")),
		]),
		"(name: String, Int)"
	)]
	#[case(TypeDescription::Tuple(vec![]), "()")]
	#[case(
		TypeDescription::Closure {
			arguments: vec![TypeDescription::simple("Int")],
			is_async: true,
			does_throw: true,
			return_type: boxed(TypeDescription::simple("Void")),
		},
		"(Int) async throws -> Void"
	)]
	#[case(
		TypeDescription::Attributed {
			base: boxed(TypeDescription::Closure {
				arguments: vec![],
				is_async: false,
				does_throw: false,
				return_type: boxed(TypeDescription::simple("Void")),
			}),
			specifier: None,
			attributes: vec!["escaping".into(), "Sendable".into()],
		},
		"@escaping @Sendable () -> Void"
	)]
	#[case(TypeDescription::Unknown("Weird ^ Text".into()), "Weird ^ Text")]
	fn as_source_renders_canonical_text(#[case] description: TypeDescription, #[case] expected: &str) {
		// Act
		let rendered = description.as_source();

		// Assert
		assert_eq!(rendered, expected);
	}

	#[rstest]
	fn optional_closure_is_parenthesized() {
		// Arrange
		let closure = TypeDescription::Closure {
			arguments: vec![],
			is_async: false,
			does_throw: false,
			return_type: boxed(TypeDescription::simple("Void")),
		};

		// Act
		let rendered = closure.into_optional().as_source();

		// Assert
		assert_eq!(rendered, "(() -> Void)?");
	}

	#[rstest]
	fn composition_ignores_member_order() {
		// Arrange
		let forward = TypeDescription::Composition(
			vec![TypeDescription::simple("B"), TypeDescription::simple("A")].into(),
		);
		let backward = TypeDescription::Composition(
			vec![TypeDescription::simple("A"), TypeDescription::simple("B")].into(),
		);

		// Assert
		assert_eq!(forward, backward);
		assert_eq!(forward.as_source(), "A & B");
	}

	#[rstest]
	fn composition_members_that_need_grouping_are_parenthesized() {
		// Arrange
		let existential = TypeDescription::Existential(boxed(TypeDescription::simple("Service")));
		let sendable = TypeDescription::simple("Sendable");

		// Act
		let composition =
			TypeDescription::Composition(vec![existential.clone(), sendable.clone()].into());
		let reversed = TypeDescription::Composition(vec![sendable, existential].into());

		// Assert
		// Members sort by their own source text, before grouping.
		assert_eq!(composition.as_source(), "Sendable & (any Service)");
		assert_eq!(reversed.as_source(), composition.as_source());
	}

	#[rstest]
	#[case("Thing", PropertyKind::Constant)]
	#[case("Instantiator<Thing>", PropertyKind::Instantiator)]
	#[case("SendableInstantiator<Thing>", PropertyKind::SendableInstantiator)]
	#[case("ForwardingInstantiator<String, Thing>", PropertyKind::ForwardingInstantiator)]
	#[case("ErasedInstantiator<String, Thing>", PropertyKind::ErasedInstantiator)]
	#[case("SendableErasedInstantiator<(), Thing>", PropertyKind::SendableErasedInstantiator)]
	#[case("WireGraph.Instantiator<Thing>", PropertyKind::Instantiator)]
	#[case("Instantiator<A, B>", PropertyKind::Constant)]
	#[case("Instantiator<Thing>?", PropertyKind::Constant)]
	fn property_kind_recognizes_wrappers(#[case] text: &str, #[case] expected: PropertyKind) {
		// Act
		let kind = TypeDescription::parse(text).property_kind();

		// Assert
		assert_eq!(kind, expected);
	}

	#[rstest]
	#[case("Thing", "Thing")]
	#[case("Instantiator<Thing>", "Thing")]
	#[case("ErasedInstantiator<String, UIView>", "UIView")]
	#[case("Array<Thing>", "Array<Thing>")]
	fn instantiated_type_unwraps_deferred_wrappers(#[case] text: &str, #[case] expected: &str) {
		// Act
		let instantiated = TypeDescription::parse(text).instantiated_type();

		// Assert
		assert_eq!(instantiated.as_source(), expected);
	}

	#[rstest]
	fn strip_decorations_removes_optionality_and_erasure() {
		// Arrange
		let decorated = TypeDescription::parse("(any Service)?");

		// Act
		let stripped = decorated.strip_decorations();

		// Assert
		assert_eq!(stripped, &TypeDescription::simple("Service"));
	}

	#[rstest]
	fn ordering_follows_source_text() {
		// Arrange
		let mut types = vec![
			TypeDescription::parse("Zebra"),
			TypeDescription::parse("Apple?"),
			TypeDescription::parse("Apple"),
		];

		// Act
		types.sort();

		// Assert
		let rendered: Vec<String> = types.iter().map(TypeDescription::as_source).collect();
		assert_eq!(rendered, vec!["Apple", "Apple?", "Zebra"]);
	}

	#[rstest]
	fn with_generic_at_replaces_argument() {
		// Arrange
		let declared = TypeDescription::parse("ErasedInstantiator<Int, UIView>");

		// Act
		let corrected = declared.with_generic_at(0, TypeDescription::simple("String"));

		// Assert
		assert_eq!(corrected.as_source(), "ErasedInstantiator<String, UIView>");
	}
}
