//! Dependencies and the ways they are satisfied

use serde::{Deserialize, Serialize};

use crate::property::Property;
use crate::type_description::TypeDescription;

/// How a dependency is satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
	/// The declaring component creates the value.
	Instantiated {
		/// Type looked up in the registry instead of the property's own type.
		#[serde(default, skip_serializing_if = "Option::is_none")]
		fulfilling_type: Option<TypeDescription>,
		/// Wrap the concrete value in the property's existential type.
		#[serde(default)]
		erased_to_concrete_existential: bool,
	},
	/// An ancestor in the scope chain supplies the value.
	Received,
	/// An ancestor (or the component itself) supplies the value under a
	/// different label or type.
	Aliased {
		fulfilling_property: Property,
		#[serde(default)]
		erased_to_concrete_existential: bool,
	},
	/// The runtime caller supplies the value.
	Forwarded,
}

/// A labeled requirement of a component together with its source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
	pub property: Property,
	pub source: SourceKind,
}

impl Dependency {
	/// A value the component creates itself.
	pub fn instantiated(property: Property) -> Self {
		Self {
			property,
			source: SourceKind::Instantiated {
				fulfilling_type: None,
				erased_to_concrete_existential: false,
			},
		}
	}

	/// A value the component creates from an explicitly named producer type.
	pub fn instantiated_by(
		property: Property,
		fulfilling_type: TypeDescription,
		erased_to_concrete_existential: bool,
	) -> Self {
		Self {
			property,
			source: SourceKind::Instantiated {
				fulfilling_type: Some(fulfilling_type),
				erased_to_concrete_existential,
			},
		}
	}

	pub fn received(property: Property) -> Self {
		Self {
			property,
			source: SourceKind::Received,
		}
	}

	pub fn aliased(
		property: Property,
		fulfilling_property: Property,
		erased_to_concrete_existential: bool,
	) -> Self {
		Self {
			property,
			source: SourceKind::Aliased {
				fulfilling_property,
				erased_to_concrete_existential,
			},
		}
	}

	pub fn forwarded(property: Property) -> Self {
		Self {
			property,
			source: SourceKind::Forwarded,
		}
	}

	/// The property an ancestor must supply, if this dependency is not
	/// created locally or forwarded.
	pub fn required_property(&self) -> Option<&Property> {
		match &self.source {
			SourceKind::Received => Some(&self.property),
			SourceKind::Aliased {
				fulfilling_property,
				..
			} => Some(fulfilling_property),
			SourceKind::Instantiated { .. } | SourceKind::Forwarded => None,
		}
	}

	/// The type the registry is queried with for an instantiated dependency.
	pub fn instantiated_type(&self) -> Option<TypeDescription> {
		match &self.source {
			SourceKind::Instantiated {
				fulfilling_type, ..
			} => Some(
				fulfilling_type
					.clone()
					.unwrap_or_else(|| self.property.type_description.instantiated_type()),
			),
			_ => None,
		}
	}

	pub fn is_instantiated(&self) -> bool {
		matches!(self.source, SourceKind::Instantiated { .. })
	}

	pub fn is_forwarded(&self) -> bool {
		matches!(self.source, SourceKind::Forwarded)
	}
}
