//! Top-level orchestration across every root of a compilation run

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;
use wiregraph_types::{Instantiable, TypeDescription};

use crate::cycle_detection::DEFAULT_MAX_RESOLUTION_DEPTH;
use crate::error::{GraphErrors, GraphResult};
use crate::generator::ScopeGenerator;
use crate::registry::InstantiableRegistry;
use crate::scope::ScopeBuilder;
use crate::visualization::DependencyGraph;

/// Header written at the top of every generated file.
pub const FILE_HEADER: &str = "// This file was generated by the wiregraph dependency graph compiler.\n\
	// Any modifications made to this file will be overwritten on subsequent builds.\n";

/// Knobs the core honors; everything else is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
	/// Longest instantiation chain before resolution gives up.
	pub max_resolution_depth: usize,
	/// Resolve and generate roots concurrently.
	pub parallel: bool,
}

impl Default for GeneratorOptions {
	fn default() -> Self {
		Self {
			max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
			parallel: true,
		}
	}
}

/// The generated extension for one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRoot {
	pub root: TypeDescription,
	/// Empty when the root has no dependencies.
	pub code: String,
}

/// Builds and generates every root of a closed set of components.
#[derive(Debug)]
pub struct DependencyTreeGenerator {
	registry: InstantiableRegistry,
	imports: Vec<String>,
	options: GeneratorOptions,
}

impl DependencyTreeGenerator {
	/// Registers `instantiables` and prepares generation.
	pub fn new(
		instantiables: impl IntoIterator<Item = Instantiable>,
		imports: impl IntoIterator<Item = String>,
		options: GeneratorOptions,
	) -> GraphResult<Self> {
		let registry = InstantiableRegistry::register(instantiables)?;
		Ok(Self::from_registry(registry, imports, options))
	}

	pub fn from_registry(
		registry: InstantiableRegistry,
		imports: impl IntoIterator<Item = String>,
		options: GeneratorOptions,
	) -> Self {
		Self {
			registry,
			imports: imports.into_iter().collect(),
			options,
		}
	}

	pub fn registry(&self) -> &InstantiableRegistry {
		&self.registry
	}

	/// Resolves every root, in root-discovery order.
	pub fn root_scope_generators(&self) -> GraphResult<Vec<ScopeGenerator>> {
		let results = self.map_roots(|root| self.build_root(root));
		collect_results(results)
	}

	/// Resolves and generates every root, in root-discovery order.
	pub fn generate_code_tree(&self) -> GraphResult<Vec<GeneratedRoot>> {
		let results = self.map_roots(|root| {
			let generator = self.build_root(root)?;
			let code = generator.generate_code().map_err(GraphErrors::from)?;
			Ok(GeneratedRoot {
				root: root.concrete_type.clone(),
				code,
			})
		});
		let roots = collect_results(results)?;
		info!(
			roots = roots.len(),
			generated = roots.iter().filter(|root| !root.code.is_empty()).count(),
			"generated dependency trees"
		);
		Ok(roots)
	}

	/// Renders the complete output file: header, imports and root extensions.
	pub fn generate_file(&self) -> GraphResult<String> {
		let roots = self.generate_code_tree()?;

		let mut file = String::from(FILE_HEADER);
		let imports: BTreeSet<&str> = self
			.imports
			.iter()
			.map(|import| import.trim())
			.map(|import| import.strip_prefix("import ").unwrap_or(import).trim())
			.filter(|import| !import.is_empty())
			.collect();
		if !imports.is_empty() {
			file.push('\n');
			for import in imports {
				file.push_str(&format!("import {import}\n"));
			}
		}
		for root in roots.iter().filter(|root| !root.code.is_empty()) {
			file.push('\n');
			file.push_str(&root.code);
		}
		Ok(file)
	}

	/// Projects every resolved root tree into one graph.
	pub fn generate_dependency_graph(&self) -> GraphResult<DependencyGraph> {
		let generators = self.root_scope_generators()?;
		let graph = DependencyGraph::from_generators(&generators);
		let statistics = graph.statistics();
		info!(
			nodes = statistics.node_count,
			edges = statistics.edge_count,
			"built dependency graph"
		);
		Ok(graph)
	}

	fn build_root(&self, root: &Arc<Instantiable>) -> GraphResult<ScopeGenerator> {
		ScopeBuilder::with_max_depth(&self.registry, self.options.max_resolution_depth).build(root)
	}

	#[cfg(feature = "parallel")]
	fn map_roots<T, F>(&self, f: F) -> Vec<T>
	where
		T: Send,
		F: Fn(&Arc<Instantiable>) -> T + Sync + Send,
	{
		use rayon::prelude::*;

		let roots: Vec<Arc<Instantiable>> = self.registry.roots().cloned().collect();
		if self.options.parallel {
			roots.par_iter().map(f).collect()
		} else {
			roots.iter().map(f).collect()
		}
	}

	#[cfg(not(feature = "parallel"))]
	fn map_roots<T, F>(&self, f: F) -> Vec<T>
	where
		F: Fn(&Arc<Instantiable>) -> T,
	{
		let roots: Vec<Arc<Instantiable>> = self.registry.roots().cloned().collect();
		roots.iter().map(f).collect()
	}
}

/// Keeps every root's errors, in root order.
fn collect_results<T>(results: Vec<GraphResult<T>>) -> GraphResult<Vec<T>> {
	let mut values = Vec::with_capacity(results.len());
	let mut errors: Option<GraphErrors> = None;
	for result in results {
		match result {
			Ok(value) => values.push(value),
			Err(failure) => {
				if let Some(collected) = errors.as_mut() {
					collected.extend(failure);
				} else {
					errors = Some(failure);
				}
			}
		}
	}
	match errors {
		Some(errors) => Err(errors),
		None => Ok(values),
	}
}

/// Resolves `root` against `registry` and renders its extension.
pub fn build_and_generate(
	root: &Arc<Instantiable>,
	registry: &InstantiableRegistry,
) -> GraphResult<String> {
	let generator = ScopeBuilder::new(registry).build(root)?;
	generator.generate_code().map_err(GraphErrors::from)
}

/// Resolves `root` and lists its graph edges as `(from, to)` pairs.
pub fn generate_graph_edges(
	root: &Arc<Instantiable>,
	registry: &InstantiableRegistry,
) -> GraphResult<Vec<(TypeDescription, TypeDescription)>> {
	let generator = ScopeBuilder::new(registry).build(root)?;
	let mut graph = DependencyGraph::new();
	graph.add_root_tree(&generator);
	Ok(graph
		.edges()
		.iter()
		.map(|edge| (edge.from.clone(), edge.to.clone()))
		.collect())
}
