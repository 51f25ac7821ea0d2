//! Component descriptions eligible to be nodes of a dependency graph

use serde::{Deserialize, Serialize};

use crate::dependency::{Dependency, SourceKind};
use crate::initializer::{Initializer, TypeResult};
use crate::property::Property;
use crate::type_description::{TupleElement, TypeDescription};

/// The kind of declaration a component was discovered on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationType {
	#[default]
	Class,
	Actor,
	Struct,
	/// An extension on a type the project does not own; constructed through a
	/// static `instantiate(...)` function.
	Extension,
}

/// A component description.
///
/// `concrete_type` is the type the component builds; `additional_types` are
/// further types (usually protocols) it can fulfill.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instantiable {
	pub concrete_type: TypeDescription,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub additional_types: Vec<TypeDescription>,
	#[serde(default)]
	pub is_root: bool,
	/// `None` means the memberwise initializer.
	#[serde(default)]
	pub initializer: Option<Initializer>,
	#[serde(default)]
	pub dependencies: Vec<Dependency>,
	#[serde(default)]
	pub declaration_type: DeclarationType,
}

impl Instantiable {
	/// Creates a non-root class with no dependencies and a memberwise initializer.
	pub fn new(concrete_type: TypeDescription) -> Self {
		Self {
			concrete_type,
			additional_types: Vec::new(),
			is_root: false,
			initializer: None,
			dependencies: Vec::new(),
			declaration_type: DeclarationType::Class,
		}
	}

	pub fn root(mut self) -> Self {
		self.is_root = true;
		self
	}

	pub fn with_dependency(mut self, dependency: Dependency) -> Self {
		self.dependencies.push(dependency);
		self
	}

	pub fn with_additional_type(mut self, type_description: TypeDescription) -> Self {
		self.additional_types.push(type_description);
		self
	}

	pub fn with_initializer(mut self, initializer: Initializer) -> Self {
		self.initializer = Some(initializer);
		self
	}

	pub fn with_declaration_type(mut self, declaration_type: DeclarationType) -> Self {
		self.declaration_type = declaration_type;
		self
	}

	/// Every type this component can fulfill, concrete type first.
	pub fn instantiable_types(&self) -> impl Iterator<Item = &TypeDescription> {
		std::iter::once(&self.concrete_type).chain(self.additional_types.iter())
	}

	/// Forwarded properties ordered by label.
	pub fn forwarded_properties(&self) -> Vec<&Property> {
		let mut forwarded: Vec<&Property> = self
			.dependencies
			.iter()
			.filter(|dependency| dependency.is_forwarded())
			.map(|dependency| &dependency.property)
			.collect();
		forwarded.sort();
		forwarded
	}

	pub fn has_forwarded_dependencies(&self) -> bool {
		self.dependencies.iter().any(Dependency::is_forwarded)
	}

	/// The argument type a forwarding wrapper must declare for this component:
	/// the single forwarded type, or a labeled tuple of all of them.
	pub fn forwarded_arguments_type(&self) -> TypeDescription {
		match self.forwarded_properties().as_slice() {
			[single] => single.type_description.clone(),
			forwarded => TypeDescription::Tuple(
				forwarded
					.iter()
					.map(|property| {
						TupleElement::new(Some(&property.label), property.type_description.clone())
					})
					.collect(),
			),
		}
	}

	/// Properties this component makes visible to its descendants.
	pub fn supplied_properties(&self) -> impl Iterator<Item = &Property> {
		self.dependencies
			.iter()
			.filter(|dependency| {
				matches!(
					dependency.source,
					SourceKind::Instantiated { .. }
						| SourceKind::Forwarded
						| SourceKind::Aliased { .. }
				)
			})
			.map(|dependency| &dependency.property)
	}

	/// The callee used to construct this component.
	pub fn instantiation_expression(&self) -> String {
		match self.declaration_type {
			DeclarationType::Extension => format!("{}.instantiate", self.concrete_type),
			_ => self.concrete_type.as_source(),
		}
	}

	/// Builds the call argument list for this component's initializer.
	pub fn generate_argument_list(&self) -> TypeResult<String> {
		match &self.initializer {
			Some(initializer) => initializer.generate_argument_list(&self.dependencies),
			None => Ok(self
				.dependencies
				.iter()
				.map(|dependency| format!("{0}: {0}", dependency.property.label))
				.collect::<Vec<_>>()
				.join(", ")),
		}
	}
}
