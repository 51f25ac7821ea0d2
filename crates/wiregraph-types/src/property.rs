//! Labeled properties and the kinds of wrapper a property can be declared as

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::type_description::TypeDescription;

/// A labeled, typed slot on a component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
	pub label: String,
	#[serde(rename = "type")]
	pub type_description: TypeDescription,
}

impl Property {
	/// Creates a property from a label and a type.
	pub fn new(label: impl Into<String>, type_description: TypeDescription) -> Self {
		Self {
			label: label.into(),
			type_description,
		}
	}

	/// Creates a property, parsing the type from source text.
	pub fn parse(label: impl Into<String>, type_text: &str) -> Self {
		Self::new(label, TypeDescription::parse(type_text))
	}

	/// Renders `label: Type`.
	pub fn as_source(&self) -> String {
		format!("{}: {}", self.label, self.type_description.as_source())
	}

	/// How the property's value is produced.
	pub fn kind(&self) -> PropertyKind {
		self.type_description.property_kind()
	}
}

impl fmt::Display for Property {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.as_source())
	}
}

impl PartialOrd for Property {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Property {
	fn cmp(&self, other: &Self) -> Ordering {
		self.label
			.cmp(&other.label)
			.then_with(|| self.type_description.cmp(&other.type_description))
	}
}

/// Whether a property holds a value directly or a factory that builds one on
/// demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
	/// The value itself.
	Constant,
	/// `Instantiator<T>`
	Instantiator,
	/// `SendableInstantiator<T>`
	SendableInstantiator,
	/// `ForwardingInstantiator<Args, T>`
	ForwardingInstantiator,
	/// `ErasedInstantiator<Args, T>`
	ErasedInstantiator,
	/// `SendableErasedInstantiator<Args, T>`
	SendableErasedInstantiator,
}

impl PropertyKind {
	/// Maps a wrapper type name and its generic arity to a kind.
	pub fn from_wrapper(name: &str, generic_count: usize) -> Option<Self> {
		let kind = match name {
			"Instantiator" => Self::Instantiator,
			"SendableInstantiator" => Self::SendableInstantiator,
			"ForwardingInstantiator" => Self::ForwardingInstantiator,
			"ErasedInstantiator" => Self::ErasedInstantiator,
			"SendableErasedInstantiator" => Self::SendableErasedInstantiator,
			_ => return None,
		};
		(kind.generic_count() == generic_count).then_some(kind)
	}

	/// The wrapper type name, or `None` for constants.
	pub fn wrapper_name(self) -> Option<&'static str> {
		match self {
			Self::Constant => None,
			Self::Instantiator => Some("Instantiator"),
			Self::SendableInstantiator => Some("SendableInstantiator"),
			Self::ForwardingInstantiator => Some("ForwardingInstantiator"),
			Self::ErasedInstantiator => Some("ErasedInstantiator"),
			Self::SendableErasedInstantiator => Some("SendableErasedInstantiator"),
		}
	}

	fn generic_count(self) -> usize {
		if self.forwards_arguments_generic() { 2 } else { 1 }
	}

	/// Whether instantiation is deferred until the factory is called.
	pub fn is_deferred(self) -> bool {
		!matches!(self, Self::Constant)
	}

	/// Whether the factory closure must be `@Sendable`.
	pub fn is_sendable(self) -> bool {
		matches!(
			self,
			Self::SendableInstantiator | Self::SendableErasedInstantiator
		)
	}

	/// Whether the first generic argument names the forwarded argument type.
	pub fn forwards_arguments_generic(self) -> bool {
		matches!(
			self,
			Self::ForwardingInstantiator | Self::ErasedInstantiator | Self::SendableErasedInstantiator
		)
	}

	/// Whether the produced value is wrapped in an erasing type.
	pub fn is_erased(self) -> bool {
		matches!(
			self,
			Self::ErasedInstantiator | Self::SendableErasedInstantiator
		)
	}
}
