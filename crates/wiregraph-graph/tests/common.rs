//! Common component builders for graph integration tests

// Each test binary compiles common.rs separately, causing unused code warnings.
#![allow(dead_code, unreachable_pub)]

use std::sync::Arc;

use wiregraph_graph::{
	GraphError, GraphResult, InstantiableRegistry, ScopeBuilder, ScopeGenerator, build_and_generate,
};
use wiregraph_types::{Dependency, Instantiable, Property, TypeDescription};

pub fn component(name: &str) -> Instantiable {
	Instantiable::new(TypeDescription::parse(name))
}

pub fn root(name: &str) -> Instantiable {
	component(name).root()
}

pub fn property(label: &str, type_text: &str) -> Property {
	Property::parse(label, type_text)
}

pub fn instantiated(label: &str, type_text: &str) -> Dependency {
	Dependency::instantiated(property(label, type_text))
}

pub fn instantiated_by(label: &str, type_text: &str, fulfilling_type: &str, erased: bool) -> Dependency {
	Dependency::instantiated_by(
		property(label, type_text),
		TypeDescription::parse(fulfilling_type),
		erased,
	)
}

pub fn received(label: &str, type_text: &str) -> Dependency {
	Dependency::received(property(label, type_text))
}

pub fn forwarded(label: &str, type_text: &str) -> Dependency {
	Dependency::forwarded(property(label, type_text))
}

pub fn aliased(label: &str, type_text: &str, from_label: &str, from_type: &str) -> Dependency {
	Dependency::aliased(property(label, type_text), property(from_label, from_type), false)
}

pub fn registry(instantiables: Vec<Instantiable>) -> InstantiableRegistry {
	InstantiableRegistry::register(instantiables).expect("components register without clashes")
}

fn first_root(registry: &InstantiableRegistry) -> Arc<Instantiable> {
	registry
		.roots()
		.next()
		.cloned()
		.expect("test graph declares a root")
}

/// Resolves the first root of `instantiables`.
pub fn build(instantiables: Vec<Instantiable>) -> GraphResult<ScopeGenerator> {
	let registry = registry(instantiables);
	let root = first_root(&registry);
	ScopeBuilder::new(&registry).build(&root)
}

/// Resolves and generates the first root of `instantiables`.
pub fn generate(instantiables: Vec<Instantiable>) -> GraphResult<String> {
	let registry = registry(instantiables);
	let root = first_root(&registry);
	build_and_generate(&root, &registry)
}

/// Resolution errors of the first root, in discovery order.
pub fn errors(instantiables: Vec<Instantiable>) -> Vec<GraphError> {
	build(instantiables)
		.expect_err("resolution should fail")
		.into_vec()
}
