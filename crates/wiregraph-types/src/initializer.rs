//! Constructor shapes and the argument lists generated for them

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dependency::Dependency;
use crate::property::Property;
use crate::type_description::TypeDescription;

/// Result type for initializer argument generation
pub type TypeResult<T> = Result<T, InitializerError>;

/// Reasons a discovered constructor cannot be driven by generated code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InitializerError {
	/// The initializer takes arguments but the component declares no dependencies.
	#[error("Initializer takes arguments, but the component declares no dependencies to supply them")]
	NoDependencies,

	/// Generated wiring code cannot await.
	#[error("Initializer must not be `async`")]
	AsyncInitializer,

	/// Generated wiring code cannot handle thrown errors.
	#[error("Initializer must not throw")]
	ThrowingInitializer,

	/// Generated wiring code cannot unwrap a failable initializer.
	#[error("Initializer must not be optional (`init?` or `init!`)")]
	OptionalInitializer,

	/// Generic parameters cannot be inferred by generated code.
	#[error("Initializer must not declare generic parameters")]
	GenericParameterInInitializer,

	/// Generic constraints cannot be satisfied by generated code.
	#[error("Initializer must not declare a generic `where` clause")]
	WhereClauseOnInitializer,

	/// Some dependencies have no matching initializer argument.
	#[error("Initializer is missing arguments for dependencies: {}", render_properties(.0))]
	MissingArguments(Vec<Property>),

	/// An initializer argument matches no dependency and has no default value.
	#[error("Initializer argument `{0}` does not match any dependency")]
	UnexpectedArgument(String),
}

fn render_properties(properties: &[Property]) -> String {
	properties
		.iter()
		.map(|property| format!("`{property}`"))
		.collect::<Vec<_>>()
		.join(", ")
}

/// One parameter of an initializer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Argument {
	/// External label; `_` for an unlabeled argument, `None` when it equals
	/// the inner label.
	#[serde(default)]
	pub outer_label: Option<String>,
	pub inner_label: String,
	#[serde(rename = "type")]
	pub type_description: TypeDescription,
	#[serde(default)]
	pub has_default_value: bool,
}

impl Argument {
	pub fn new(inner_label: impl Into<String>, type_description: TypeDescription) -> Self {
		Self {
			outer_label: None,
			inner_label: inner_label.into(),
			type_description,
			has_default_value: false,
		}
	}

	pub fn with_outer_label(mut self, outer_label: impl Into<String>) -> Self {
		self.outer_label = Some(outer_label.into());
		self
	}

	pub fn with_default_value(mut self) -> Self {
		self.has_default_value = true;
		self
	}

	fn matches(&self, property: &Property) -> bool {
		self.inner_label == property.label && self.type_description == property.type_description
	}

	fn as_call_argument(&self) -> String {
		match self.outer_label.as_deref() {
			Some("_") => self.inner_label.clone(),
			Some(outer) => format!("{outer}: {}", self.inner_label),
			None => format!("{0}: {0}", self.inner_label),
		}
	}

	fn as_declaration(&self) -> String {
		let label = match &self.outer_label {
			Some(outer) => format!("{outer} {}", self.inner_label),
			None => self.inner_label.clone(),
		};
		format!("{label}: {}", self.type_description)
	}
}

/// The constructor a component is built with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Initializer {
	pub arguments: Vec<Argument>,
	pub is_async: bool,
	pub does_throw: bool,
	pub is_optional: bool,
	pub has_generic_parameter: bool,
	pub has_generic_where_clause: bool,
}

impl Initializer {
	pub fn new(arguments: Vec<Argument>) -> Self {
		Self {
			arguments,
			..Self::default()
		}
	}

	/// Rejects effect and generic flags that generated code cannot satisfy.
	pub fn validate(&self) -> TypeResult<()> {
		if self.is_async {
			return Err(InitializerError::AsyncInitializer);
		}
		if self.does_throw {
			return Err(InitializerError::ThrowingInitializer);
		}
		if self.is_optional {
			return Err(InitializerError::OptionalInitializer);
		}
		if self.has_generic_parameter {
			return Err(InitializerError::GenericParameterInInitializer);
		}
		if self.has_generic_where_clause {
			return Err(InitializerError::WhereClauseOnInitializer);
		}
		Ok(())
	}

	/// Builds the call argument list, passing each dependency by its label.
	///
	/// Every dependency must match exactly one argument by label and type.
	/// Arguments with a default value may stay unmatched.
	pub fn generate_argument_list(&self, dependencies: &[Dependency]) -> TypeResult<String> {
		self.validate()?;

		if dependencies.is_empty()
			&& self
				.arguments
				.iter()
				.any(|argument| !argument.has_default_value)
		{
			return Err(InitializerError::NoDependencies);
		}

		let mut used = vec![false; dependencies.len()];
		let mut call_arguments = Vec::with_capacity(self.arguments.len());
		for argument in &self.arguments {
			let matched = dependencies
				.iter()
				.enumerate()
				.find(|(index, dependency)| !used[*index] && argument.matches(&dependency.property));
			match matched {
				Some((index, _)) => {
					used[index] = true;
					call_arguments.push(argument.as_call_argument());
				}
				None if argument.has_default_value => {}
				None => {
					return Err(InitializerError::UnexpectedArgument(
						argument.as_declaration(),
					));
				}
			}
		}

		let mut missing: Vec<Property> = dependencies
			.iter()
			.zip(&used)
			.filter(|(_, used)| !**used)
			.map(|(dependency, _)| dependency.property.clone())
			.collect();
		if !missing.is_empty() {
			missing.sort();
			return Err(InitializerError::MissingArguments(missing));
		}

		Ok(call_arguments.join(", "))
	}
}
