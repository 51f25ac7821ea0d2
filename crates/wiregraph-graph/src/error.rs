//! Graph resolution and generation errors

use std::fmt;

use thiserror::Error;
use wiregraph_types::{InitializerError, Property, TypeDescription};

/// Result type for operations that collect every independent failure
pub type GraphResult<T> = Result<T, GraphErrors>;

/// A chain of types rendered as `A -> B -> C`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeChain(pub Vec<TypeDescription>);

impl fmt::Display for TypeChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let rendered: Vec<String> = self.0.iter().map(TypeDescription::as_source).collect();
		f.write_str(&rendered.join(" -> "))
	}
}

/// A chain of properties rendered as `a: A -> b: B -> a: A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChain(pub Vec<Property>);

impl fmt::Display for PropertyChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let rendered: Vec<String> = self.0.iter().map(Property::as_source).collect();
		f.write_str(&rendered.join(" -> "))
	}
}

/// Near-miss properties offered alongside an unfulfillable received property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions(pub Vec<Property>);

impl fmt::Display for Suggestions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.0.is_empty() {
			return Ok(());
		}
		f.write_str("\nDid you mean one of the following available properties?")?;
		for property in &self.0 {
			write!(f, "\n`{property}`")?;
		}
		Ok(())
	}
}

/// Every way a dependency graph can fail to resolve or generate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GraphError {
	/// Two components claim the same type.
	#[error("`{type_description}` is fulfilled by both `{first}` and `{second}`")]
	DuplicateFulfillment {
		type_description: TypeDescription,
		first: TypeDescription,
		second: TypeDescription,
	},

	/// No registered component fulfills an instantiated property.
	#[error(
		"Property `{property}` on `{instantiable}` cannot be instantiated: no component fulfills `{fulfilling_type}`"
	)]
	UnfulfillableType {
		property: Property,
		instantiable: TypeDescription,
		fulfilling_type: TypeDescription,
	},

	/// The producer needs forwarded runtime values, so it cannot be built eagerly.
	#[error(
		"Property `{property}` on `{instantiable}` has at least one forwarded property of its own. Property should instead be of type `{expected}`."
	)]
	ForwardedPropertyOnInstantiatedDependency {
		property: Property,
		instantiable: TypeDescription,
		expected: TypeDescription,
	},

	/// No ancestor in the chain supplies a received property.
	#[error("Received property `{property}` is not instantiated or forwarded in chain: {chain}{suggestions}")]
	UnfulfillableReceivedProperty {
		property: Property,
		chain: TypeChain,
		suggestions: Suggestions,
	},

	/// Concrete types instantiate each other eagerly.
	#[error("Dependency cycle detected: {cycle}")]
	StructuralDependencyCycle { cycle: TypeChain },

	/// Sibling properties of one scope require each other.
	#[error("Property dependency cycle detected on `{instantiable}`: {cycle}")]
	PropertyDependencyCycle {
		instantiable: TypeDescription,
		cycle: PropertyChain,
	},

	/// A deferred property is received below the factory that is still
	/// building it.
	#[error(
		"Deferred dependency cycle detected: {cycle}. `{receiver}` receives `{property}` while it is still being instantiated. Change `{property}` on `{receiver}` from received to instantiated to break the cycle."
	)]
	DeferredDependencyCycle {
		property: Property,
		receiver: TypeDescription,
		cycle: TypeChain,
	},

	/// A property is received below the component that is still building it.
	#[error(
		"Property `{property}` received by `{receiver}` is instantiated by `{instantiator}` in the same chain: {chain}. It cannot be received before its instantiation completes."
	)]
	ReceivedInSameChainItIsInstantiated {
		property: Property,
		receiver: TypeDescription,
		instantiator: TypeDescription,
		chain: TypeChain,
	},

	/// A forwarding wrapper's argument generic does not match the producer's
	/// forwarded properties.
	#[error(
		"Property `{property}` on `{instantiable}` does not match the forwarded properties of its producer. Property should instead be of type `{expected}`."
	)]
	ErasedInstantiatorGenericMismatch {
		property: Property,
		instantiable: TypeDescription,
		expected: TypeDescription,
	},

	/// A component's initializer cannot be called by generated code.
	#[error("Cannot generate an initializer call for `{instantiable}`: {source}")]
	Initializer {
		instantiable: TypeDescription,
		#[source]
		source: InitializerError,
	},

	/// Roots have no caller that could forward a value.
	#[error("Root `{instantiable}` declares forwarded property `{property}`, but a root has no caller to forward it")]
	ForwardedPropertyOnRoot {
		instantiable: TypeDescription,
		property: Property,
	},

	/// The instantiation chain grew past the configured limit.
	#[error("Maximum resolution depth of {depth} exceeded in chain: {chain}")]
	MaxResolutionDepthExceeded { depth: usize, chain: TypeChain },

	/// A deferred property has no factory function to wrap.
	#[error("No factory function in scope for deferred property `{property}` of `{instantiable}`")]
	UnresolvedRecursiveReference {
		property: Property,
		instantiable: TypeDescription,
	},
}

/// A non-empty list of errors in discovery order, displayed one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphErrors(Vec<GraphError>);

impl GraphErrors {
	/// Wraps collected errors; `None` when there are none.
	pub fn from_vec(errors: Vec<GraphError>) -> Option<Self> {
		(!errors.is_empty()).then_some(Self(errors))
	}

	pub fn iter(&self) -> std::slice::Iter<'_, GraphError> {
		self.0.iter()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn extend(&mut self, other: GraphErrors) {
		self.0.extend(other.0);
	}

	pub fn into_vec(self) -> Vec<GraphError> {
		self.0
	}
}

impl From<GraphError> for GraphErrors {
	fn from(error: GraphError) -> Self {
		Self(vec![error])
	}
}

impl IntoIterator for GraphErrors {
	type Item = GraphError;
	type IntoIter = std::vec::IntoIter<GraphError>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl fmt::Display for GraphErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (index, error) in self.0.iter().enumerate() {
			if index > 0 {
				f.write_str("\n")?;
			}
			write!(f, "{error}")?;
		}
		Ok(())
	}
}

impl std::error::Error for GraphErrors {}
