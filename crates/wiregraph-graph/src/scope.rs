//! Scope building: resolving every dependency of a root to its producer
//!
//! A [`Scope`] records, for one component reachable from a root, which of its
//! properties must be generated locally and how. Received properties are not
//! scopes of their own; they are validated against the ancestor chain and
//! resolved lexically by the generated code.

use std::sync::Arc;

use tracing::{debug, trace};
use wiregraph_types::{Dependency, Instantiable, Property, SourceKind, TypeDescription};

use crate::cycle_detection::{DEFAULT_MAX_RESOLUTION_DEPTH, ReceivedLocation, ResolutionStack};
use crate::error::{GraphError, GraphErrors, GraphResult, Suggestions, TypeChain};
use crate::generator::ScopeGenerator;
use crate::registry::InstantiableRegistry;

/// The resolved dependencies of one component within one root's tree.
#[derive(Debug, Clone)]
pub struct Scope {
	pub instantiable: Arc<Instantiable>,
	pub properties_to_generate: Vec<PropertyToGenerate>,
}

impl Scope {
	fn new(instantiable: Arc<Instantiable>) -> Self {
		Self {
			instantiable,
			properties_to_generate: Vec::new(),
		}
	}
}

/// A property a scope declares in its generated body.
#[derive(Debug, Clone)]
pub enum PropertyToGenerate {
	/// Built by a child scope.
	Instantiated {
		property: Property,
		scope: Scope,
		erased_to_concrete_existential: bool,
	},
	/// A deferred property whose factory is already being defined by an
	/// enclosing scope.
	RecursiveReference {
		property: Property,
		instantiable: Arc<Instantiable>,
	},
	/// A renaming of a property visible in this scope.
	Aliased {
		property: Property,
		fulfilling_property: Property,
		erased_to_concrete_existential: bool,
	},
}

impl PropertyToGenerate {
	pub fn property(&self) -> &Property {
		match self {
			Self::Instantiated { property, .. }
			| Self::RecursiveReference { property, .. }
			| Self::Aliased { property, .. } => property,
		}
	}
}

/// Whether `errors` already holds the initializer failure of `concrete_type`.
fn reported_initializer(errors: &[GraphError], concrete_type: &TypeDescription) -> bool {
	errors.iter().any(|error| {
		matches!(
			error,
			GraphError::Initializer { instantiable, .. } if instantiable == concrete_type
		)
	})
}

/// Resolves roots against a registry.
#[derive(Debug)]
pub struct ScopeBuilder<'a> {
	registry: &'a InstantiableRegistry,
	stack: ResolutionStack,
}

impl<'a> ScopeBuilder<'a> {
	pub fn new(registry: &'a InstantiableRegistry) -> Self {
		Self::with_max_depth(registry, DEFAULT_MAX_RESOLUTION_DEPTH)
	}

	pub fn with_max_depth(registry: &'a InstantiableRegistry, max_depth: usize) -> Self {
		Self {
			registry,
			stack: ResolutionStack::new(max_depth),
		}
	}

	/// Resolves `root` and derives its code generator.
	pub fn build(&self, root: &Arc<Instantiable>) -> GraphResult<ScopeGenerator> {
		let scope = self.resolve_scope(root)?;
		ScopeGenerator::new(scope).map_err(GraphErrors::from)
	}

	/// Resolves `root` into a scope tree, collecting every independent failure.
	pub fn resolve_scope(&self, root: &Arc<Instantiable>) -> GraphResult<Scope> {
		debug!(root = %root.concrete_type, "resolving root");
		let mut errors = Vec::new();
		let scope = self.resolve(root, None, &mut errors);
		match GraphErrors::from_vec(errors) {
			Some(errors) => {
				debug!(root = %root.concrete_type, errors = errors.len(), "root failed to resolve");
				Err(errors)
			}
			None => Ok(scope),
		}
	}

	fn resolve(
		&self,
		instantiable: &Arc<Instantiable>,
		via: Option<&Property>,
		errors: &mut Vec<GraphError>,
	) -> Scope {
		let mut scope = Scope::new(Arc::clone(instantiable));
		let _guard = match self.stack.begin(instantiable, via) {
			Ok(guard) => guard,
			Err(error) => {
				errors.push(error);
				return scope;
			}
		};
		trace!(
			instantiable = %instantiable.concrete_type,
			depth = self.stack.depth(),
			"resolving instantiable"
		);

		if let Err(source) = instantiable.generate_argument_list()
			&& !reported_initializer(errors, &instantiable.concrete_type)
		{
			errors.push(GraphError::Initializer {
				instantiable: instantiable.concrete_type.clone(),
				source,
			});
		}

		let is_root = via.is_none();
		for dependency in &instantiable.dependencies {
			match &dependency.source {
				SourceKind::Forwarded => {
					if is_root {
						errors.push(GraphError::ForwardedPropertyOnRoot {
							instantiable: instantiable.concrete_type.clone(),
							property: dependency.property.clone(),
						});
					}
				}
				SourceKind::Received => {
					self.check_received(instantiable, &dependency.property, errors);
				}
				SourceKind::Aliased {
					fulfilling_property,
					erased_to_concrete_existential,
				} => {
					if !supplies_locally(instantiable, fulfilling_property) {
						self.check_received(instantiable, fulfilling_property, errors);
					}
					scope.properties_to_generate.push(PropertyToGenerate::Aliased {
						property: dependency.property.clone(),
						fulfilling_property: fulfilling_property.clone(),
						erased_to_concrete_existential: *erased_to_concrete_existential,
					});
				}
				SourceKind::Instantiated {
					erased_to_concrete_existential,
					..
				} => {
					if let Some(property_to_generate) = self.resolve_instantiated(
						instantiable,
						dependency,
						*erased_to_concrete_existential,
						errors,
					) {
						scope.properties_to_generate.push(property_to_generate);
					}
				}
			}
		}
		scope
	}

	fn resolve_instantiated(
		&self,
		instantiable: &Arc<Instantiable>,
		dependency: &Dependency,
		erased_to_concrete_existential: bool,
		errors: &mut Vec<GraphError>,
	) -> Option<PropertyToGenerate> {
		let property = &dependency.property;
		let fulfilling_type = dependency.instantiated_type()?;
		let Some(producer) = self.registry.fulfilling(&fulfilling_type) else {
			errors.push(GraphError::UnfulfillableType {
				property: property.clone(),
				instantiable: instantiable.concrete_type.clone(),
				fulfilling_type,
			});
			return None;
		};

		let kind = property.kind();
		if !kind.is_deferred() && producer.has_forwarded_dependencies() {
			errors.push(GraphError::ForwardedPropertyOnInstantiatedDependency {
				property: property.clone(),
				instantiable: instantiable.concrete_type.clone(),
				expected: TypeDescription::generic(
					"Instantiator",
					vec![property.type_description.clone()],
				),
			});
			return None;
		}

		if kind.forwards_arguments_generic() {
			let expected_arguments = producer.forwarded_arguments_type();
			if property.type_description.generics().first() != Some(&expected_arguments) {
				errors.push(GraphError::ErasedInstantiatorGenericMismatch {
					property: property.clone(),
					instantiable: instantiable.concrete_type.clone(),
					expected: property
						.type_description
						.with_generic_at(0, expected_arguments),
				});
				return None;
			}
		}

		if self
			.stack
			.contains_deferred_edge(property, &producer.concrete_type)
		{
			trace!(property = %property, "deferred property refers to an enclosing factory");
			return Some(PropertyToGenerate::RecursiveReference {
				property: property.clone(),
				instantiable: Arc::clone(producer),
			});
		}

		trace!(
			from = %instantiable.concrete_type,
			to = %producer.concrete_type,
			property = %property,
			"resolved instantiated property"
		);
		let scope = self.resolve(producer, Some(property), errors);
		Some(PropertyToGenerate::Instantiated {
			property: property.clone(),
			scope,
			erased_to_concrete_existential,
		})
	}

	fn check_received(
		&self,
		receiver: &Instantiable,
		property: &Property,
		errors: &mut Vec<GraphError>,
	) {
		match self.stack.locate_received(property) {
			ReceivedLocation::Available { .. } => {}
			ReceivedLocation::UnderConstruction {
				supplier,
				instantiator,
			} => {
				if property.kind().is_deferred() {
					let mut cycle = self.stack.edge_types_from(supplier);
					cycle.push(property.type_description.clone());
					errors.push(GraphError::DeferredDependencyCycle {
						property: property.clone(),
						receiver: receiver.concrete_type.clone(),
						cycle: TypeChain(cycle),
					});
				} else {
					errors.push(GraphError::ReceivedInSameChainItIsInstantiated {
						property: property.clone(),
						receiver: receiver.concrete_type.clone(),
						instantiator,
						chain: TypeChain(self.stack.chain()),
					});
				}
			}
			ReceivedLocation::Missing => {
				errors.push(GraphError::UnfulfillableReceivedProperty {
					property: property.clone(),
					chain: TypeChain(self.stack.chain()),
					suggestions: Suggestions(self.similar_properties(property)),
				});
			}
		}
	}

	fn similar_properties(&self, property: &Property) -> Vec<Property> {
		self.stack
			.available_properties()
			.into_iter()
			.filter(|candidate| is_similar(candidate, property))
			.collect()
	}
}

/// Whether `instantiable` itself instantiates or forwards `property`.
fn supplies_locally(instantiable: &Instantiable, property: &Property) -> bool {
	instantiable
		.dependencies
		.iter()
		.any(|dependency| {
			(dependency.is_instantiated() || dependency.is_forwarded())
				&& dependency.property == *property
		})
}

/// Same type under another label, or same label with a nearly equal type.
fn is_similar(candidate: &Property, property: &Property) -> bool {
	if candidate.type_description == property.type_description {
		return candidate.label != property.label;
	}
	candidate.label == property.label
		&& types_are_near(&candidate.type_description, &property.type_description)
}

/// Equal after stripping optionality and erasure, or one is a dotted
/// extension of the other (`Outer.Thing` and `Thing`).
fn types_are_near(first: &TypeDescription, second: &TypeDescription) -> bool {
	let (first, second) = (first.strip_decorations(), second.strip_decorations());
	if first == second {
		return true;
	}
	let (first, second) = (first.as_source(), second.as_source());
	first.ends_with(&format!(".{second}"))
		|| second.ends_with(&format!(".{first}"))
		|| first.starts_with(&format!("{second}."))
		|| second.starts_with(&format!("{first}."))
}
