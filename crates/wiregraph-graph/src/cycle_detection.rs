//! Resolution stack and cycle detection
//!
//! The scope builder pushes every component it starts resolving onto a
//! [`ResolutionStack`] together with the property it was reached through.
//! The stack answers the questions resolution needs about the chain above the
//! component currently being resolved.
//!
//! ## Features
//!
//! - **Structural cycles**: a concrete type reappearing through constant edges
//!   only is reported as `A -> B -> C -> A`
//! - **Deferred edges**: a type reappearing below a deferred edge is legal;
//!   [`ResolutionStack::contains_deferred_edge`] lets the builder stop at the
//!   repeated factory instead of recursing forever
//! - **Received lookup**: finds the nearest ancestor supplying a property and
//!   whether that ancestor is still building it
//! - **Depth limiting**: `max_depth` prevents pathological chains
//! - **RAII**: the entry is popped when its `ResolutionGuard` drops

use std::cell::RefCell;
use std::sync::Arc;

use wiregraph_types::{Instantiable, Property, TypeDescription};

use crate::error::{GraphError, TypeChain};

/// Default maximum length of an instantiation chain.
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 256;

#[derive(Debug)]
struct StackEntry {
	instantiable: Arc<Instantiable>,
	/// Property of the parent entry this component was instantiated for.
	via: Option<Property>,
}

/// Where a received property comes from, as seen from the top of the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceivedLocation {
	/// Supplied by the ancestor at `supplier`.
	Available { supplier: usize },
	/// Supplied by the ancestor at `supplier`, which is instantiating it
	/// through the chain that leads here.
	UnderConstruction {
		supplier: usize,
		instantiator: TypeDescription,
	},
	/// No ancestor supplies it.
	Missing,
}

/// The chain of components currently being resolved, root first.
#[derive(Debug)]
pub struct ResolutionStack {
	entries: RefCell<Vec<StackEntry>>,
	max_depth: usize,
}

impl ResolutionStack {
	pub fn new(max_depth: usize) -> Self {
		Self {
			entries: RefCell::new(Vec::new()),
			max_depth,
		}
	}

	/// Record the start of resolution
	///
	/// Fails when the chain is already `max_depth` long, or when `instantiable`
	/// repeats an entry of the chain and every edge since that entry is a
	/// constant (eager) edge.
	pub fn begin(
		&self,
		instantiable: &Arc<Instantiable>,
		via: Option<&Property>,
	) -> Result<ResolutionGuard<'_>, GraphError> {
		{
			let entries = self.entries.borrow();

			if entries.len() >= self.max_depth {
				let mut chain: Vec<TypeDescription> = entries
					.iter()
					.map(|entry| entry.instantiable.concrete_type.clone())
					.collect();
				chain.push(instantiable.concrete_type.clone());
				return Err(GraphError::MaxResolutionDepthExceeded {
					depth: self.max_depth,
					chain: TypeChain(chain),
				});
			}

			if let Some(start) = entries
				.iter()
				.rposition(|entry| entry.instantiable.concrete_type == instantiable.concrete_type)
			{
				let all_constant = entries[start + 1..]
					.iter()
					.filter_map(|entry| entry.via.as_ref())
					.chain(via)
					.all(|property| !property.kind().is_deferred());
				if all_constant {
					let mut cycle: Vec<TypeDescription> = entries[start..]
						.iter()
						.map(|entry| entry.instantiable.concrete_type.clone())
						.collect();
					cycle.push(instantiable.concrete_type.clone());
					return Err(GraphError::StructuralDependencyCycle {
						cycle: TypeChain(cycle),
					});
				}
			}
		}

		self.entries.borrow_mut().push(StackEntry {
			instantiable: Arc::clone(instantiable),
			via: via.cloned(),
		});
		Ok(ResolutionGuard { stack: self })
	}

	/// Number of components in the chain.
	pub fn depth(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Concrete types from the root to the top of the stack.
	pub fn chain(&self) -> Vec<TypeDescription> {
		self.entries
			.borrow()
			.iter()
			.map(|entry| entry.instantiable.concrete_type.clone())
			.collect()
	}

	/// Types of the properties that led from the entry at `index` to the top.
	pub fn edge_types_from(&self, index: usize) -> Vec<TypeDescription> {
		self.entries
			.borrow()
			.iter()
			.skip(index + 1)
			.filter_map(|entry| entry.via.as_ref())
			.map(|property| property.type_description.clone())
			.collect()
	}

	/// Whether `producer` was already reached through the deferred `property`.
	pub fn contains_deferred_edge(&self, property: &Property, producer: &TypeDescription) -> bool {
		property.kind().is_deferred()
			&& self.entries.borrow().iter().any(|entry| {
				entry.via.as_ref() == Some(property) && entry.instantiable.concrete_type == *producer
			})
	}

	/// Finds the nearest ancestor of the top entry that supplies `property`.
	pub fn locate_received(&self, property: &Property) -> ReceivedLocation {
		let entries = self.entries.borrow();
		let ancestors = entries.len().saturating_sub(1);
		for supplier in (0..ancestors).rev() {
			let supplies = entries[supplier]
				.instantiable
				.supplied_properties()
				.any(|supplied| supplied == property);
			if supplies {
				return if entries[supplier + 1].via.as_ref() == Some(property) {
					ReceivedLocation::UnderConstruction {
						supplier,
						instantiator: entries[supplier].instantiable.concrete_type.clone(),
					}
				} else {
					ReceivedLocation::Available { supplier }
				};
			}
		}
		ReceivedLocation::Missing
	}

	/// Every property the ancestors of the top entry supply, sorted.
	pub fn available_properties(&self) -> Vec<Property> {
		let entries = self.entries.borrow();
		let ancestors = entries.len().saturating_sub(1);
		let mut properties: Vec<Property> = entries[..ancestors]
			.iter()
			.flat_map(|entry| entry.instantiable.supplied_properties().cloned().collect::<Vec<_>>())
			.collect();
		properties.sort();
		properties.dedup();
		properties
	}
}

impl Default for ResolutionStack {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_RESOLUTION_DEPTH)
	}
}

/// RAII guard: pops its stack entry on drop.
#[derive(Debug)]
pub struct ResolutionGuard<'a> {
	stack: &'a ResolutionStack,
}

impl Drop for ResolutionGuard<'_> {
	fn drop(&mut self) {
		self.stack.entries.borrow_mut().pop();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use wiregraph_types::Dependency;

	fn component(name: &str) -> Arc<Instantiable> {
		Arc::new(Instantiable::new(TypeDescription::simple(name)))
	}

	#[rstest]
	fn simple_cycle_detection() {
		// Arrange
		let stack = ResolutionStack::default();
		let a = component("A");
		let b = component("B");
		let _guard_a = stack.begin(&a, None).unwrap();
		let _guard_b = stack.begin(&b, Some(&Property::parse("b", "B"))).unwrap();

		// Act
		let result = stack.begin(&a, Some(&Property::parse("a", "A")));

		// Assert
		assert_eq!(
			result.unwrap_err().to_string(),
			"Dependency cycle detected: A -> B -> A"
		);
	}

	#[rstest]
	fn deferred_edge_allows_repeat() {
		// Arrange
		let stack = ResolutionStack::default();
		let a = component("A");
		let b = component("B");
		let _guard_a = stack.begin(&a, None).unwrap();
		let _guard_b = stack
			.begin(&b, Some(&Property::parse("bBuilder", "Instantiator<B>")))
			.unwrap();

		// Act
		let result = stack.begin(&a, Some(&Property::parse("a", "A")));

		// Assert
		assert!(result.is_ok());
	}

	#[rstest]
	fn guard_drop_pops_entry() {
		// Arrange
		let stack = ResolutionStack::default();
		let a = component("A");

		// Act
		let guard = stack.begin(&a, None).unwrap();
		let depth_while_held = stack.depth();
		drop(guard);

		// Assert
		assert_eq!(depth_while_held, 1);
		assert_eq!(stack.depth(), 0);
		assert!(stack.begin(&a, None).is_ok());
	}

	#[rstest]
	fn depth_limit() {
		// Arrange
		let stack = ResolutionStack::new(2);
		let a = component("A");
		let b = component("B");
		let c = component("C");
		let _guard_a = stack.begin(&a, None).unwrap();
		let _guard_b = stack.begin(&b, Some(&Property::parse("b", "B"))).unwrap();

		// Act
		let result = stack.begin(&c, Some(&Property::parse("c", "C")));

		// Assert
		assert!(matches!(
			result,
			Err(GraphError::MaxResolutionDepthExceeded { depth: 2, .. })
		));
	}

	#[rstest]
	fn locate_received_distinguishes_property_under_construction() {
		// Arrange
		let stack = ResolutionStack::default();
		let root = Arc::new(
			Instantiable::new(TypeDescription::simple("Root"))
				.root()
				.with_dependency(Dependency::instantiated(Property::parse("a", "A")))
				.with_dependency(Dependency::instantiated(Property::parse("c", "C"))),
		);
		let a = component("A");
		let b = component("B");
		let _guard_root = stack.begin(&root, None).unwrap();
		let _guard_a = stack.begin(&a, Some(&Property::parse("a", "A"))).unwrap();
		let _guard_b = stack.begin(&b, Some(&Property::parse("b", "B"))).unwrap();

		// Act
		let under_construction = stack.locate_received(&Property::parse("a", "A"));
		let available = stack.locate_received(&Property::parse("c", "C"));
		let missing = stack.locate_received(&Property::parse("d", "D"));

		// Assert
		assert_eq!(
			under_construction,
			ReceivedLocation::UnderConstruction {
				supplier: 0,
				instantiator: TypeDescription::simple("Root"),
			}
		);
		assert_eq!(available, ReceivedLocation::Available { supplier: 0 });
		assert_eq!(missing, ReceivedLocation::Missing);
	}

	#[rstest]
	fn contains_deferred_edge_matches_property_and_producer() {
		// Arrange
		let stack = ResolutionStack::default();
		let root = component("Root");
		let a = component("A");
		let builder = Property::parse("aBuilder", "Instantiator<A>");
		let _guard_root = stack.begin(&root, None).unwrap();
		let _guard_a = stack.begin(&a, Some(&builder)).unwrap();

		// Assert
		assert!(stack.contains_deferred_edge(&builder, &TypeDescription::simple("A")));
		assert!(!stack.contains_deferred_edge(&builder, &TypeDescription::simple("B")));
		assert!(!stack.contains_deferred_edge(
			&Property::parse("other", "Instantiator<A>"),
			&TypeDescription::simple("A")
		));
	}
}
