//! Registry of known components, indexed by every type they fulfill

use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::debug;
use wiregraph_types::{Instantiable, TypeDescription};

use crate::error::{GraphError, GraphErrors, GraphResult};

/// The closed world of components known to one compilation run.
#[derive(Debug, Clone, Default)]
pub struct InstantiableRegistry {
	fulfillments: IndexMap<TypeDescription, Arc<Instantiable>>,
	instantiables: Vec<Arc<Instantiable>>,
}

impl InstantiableRegistry {
	/// Registers every component under each type it can fulfill.
	///
	/// A type claimed by two different components is a `DuplicateFulfillment`.
	/// All duplicates are reported and nothing is registered on failure.
	pub fn register(instantiables: impl IntoIterator<Item = Instantiable>) -> GraphResult<Self> {
		let mut registry = Self::default();
		let mut errors = Vec::new();

		for instantiable in instantiables {
			// The same declaration listed by two manifests is not a clash.
			if registry
				.instantiables
				.iter()
				.any(|registered| **registered == instantiable)
			{
				continue;
			}
			let instantiable = Arc::new(instantiable);
			for type_description in instantiable.instantiable_types() {
				match registry.fulfillments.entry(type_description.clone()) {
					// Listed twice by the same component.
					Entry::Occupied(existing) if Arc::ptr_eq(existing.get(), &instantiable) => {}
					Entry::Occupied(existing) => {
						errors.push(GraphError::DuplicateFulfillment {
							type_description: type_description.clone(),
							first: existing.get().concrete_type.clone(),
							second: instantiable.concrete_type.clone(),
						});
					}
					Entry::Vacant(vacant) => {
						vacant.insert(Arc::clone(&instantiable));
					}
				}
			}
			registry.instantiables.push(instantiable);
		}

		if let Some(errors) = GraphErrors::from_vec(errors) {
			return Err(errors);
		}
		debug!(
			instantiables = registry.instantiables.len(),
			fulfilled_types = registry.fulfillments.len(),
			"registered instantiables"
		);
		Ok(registry)
	}

	/// The component fulfilling `type_description`, if any.
	pub fn fulfilling(&self, type_description: &TypeDescription) -> Option<&Arc<Instantiable>> {
		self.fulfillments.get(type_description)
	}

	/// Root components in registration order.
	pub fn roots(&self) -> impl Iterator<Item = &Arc<Instantiable>> {
		self.instantiables
			.iter()
			.filter(|instantiable| instantiable.is_root)
	}

	/// All registered components in registration order.
	pub fn instantiables(&self) -> &[Arc<Instantiable>] {
		&self.instantiables
	}

	/// Fulfilled types with their producers, in registration order.
	pub fn fulfillments(&self) -> impl Iterator<Item = (&TypeDescription, &Arc<Instantiable>)> {
		self.fulfillments.iter()
	}

	pub fn len(&self) -> usize {
		self.instantiables.len()
	}

	pub fn is_empty(&self) -> bool {
		self.instantiables.is_empty()
	}
}

/// Maps every fulfillable type to the component that produces it.
pub fn resolve_fulfillment(
	instantiables: impl IntoIterator<Item = Instantiable>,
) -> GraphResult<IndexMap<TypeDescription, Arc<Instantiable>>> {
	InstantiableRegistry::register(instantiables).map(|registry| registry.fulfillments)
}
