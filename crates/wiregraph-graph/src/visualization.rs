//! Dependency graph visualization
//!
//! A read-only projection of resolved scope trees, rendered in DOT format for
//! Graphviz.
//!
//! ## Example
//!
//! ```rust
//! use wiregraph_graph::visualization::{DependencyGraph, EdgeKind, NodeKind};
//! use wiregraph_types::TypeDescription;
//!
//! let root = TypeDescription::simple("AppRoot");
//! let store = TypeDescription::simple("Store");
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node(root.clone(), NodeKind::Root);
//! graph.add_node(store.clone(), NodeKind::Instantiated);
//! graph.add_edge(root, store, "store", EdgeKind::Instantiated);
//!
//! let dot = graph.to_dot();
//! assert!(dot.contains("\"AppRoot\" -> \"Store\""));
//! ```

use indexmap::IndexMap;
use wiregraph_types::{Property, TypeDescription};

use crate::generator::{GeneratorKind, ScopeGenerator};

/// How a node entered the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
	/// Entry point of a dependency tree.
	Root,
	/// Built eagerly by its parent.
	Instantiated,
	/// Built on demand through a factory.
	Deferred,
	/// Only referenced through an alias; built elsewhere.
	Received,
}

/// How a parent obtains a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
	Instantiated,
	Deferred,
	Alias,
}

/// A node of the dependency graph, keyed by concrete type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
	pub type_description: TypeDescription,
	pub kind: NodeKind,
}

/// An edge labeled with the property that creates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
	pub from: TypeDescription,
	pub to: TypeDescription,
	pub label: String,
	pub kind: EdgeKind,
}

/// Dependency graph for visualization
#[derive(Debug, Default)]
pub struct DependencyGraph {
	nodes: IndexMap<TypeDescription, GraphNode>,
	edges: Vec<GraphEdge>,
}

impl DependencyGraph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Projects every resolved root tree into one graph.
	pub fn from_generators<'a>(generators: impl IntoIterator<Item = &'a ScopeGenerator>) -> Self {
		let mut graph = Self::new();
		for generator in generators {
			graph.add_root_tree(generator);
		}
		graph
	}

	/// Adds a resolved tree, starting at its root.
	pub fn add_root_tree(&mut self, generator: &ScopeGenerator) {
		let Some(root) = generator.instantiable() else {
			return;
		};
		let root_type = root.concrete_type.clone();
		self.add_node(root_type.clone(), NodeKind::Root);
		self.visit(&root_type, generator, &mut Vec::new());
	}

	/// Walks the children of `generator`. `in_scope` maps each property built
	/// by an enclosing scope to the concrete type building it.
	fn visit(
		&mut self,
		parent: &TypeDescription,
		generator: &ScopeGenerator,
		in_scope: &mut Vec<(Property, TypeDescription)>,
	) {
		let enclosing = in_scope.len();
		for child in generator.children() {
			match child.kind() {
				GeneratorKind::Property {
					instantiable,
					property,
					..
				}
				| GeneratorKind::RecursiveReference {
					instantiable,
					property,
					..
				} => in_scope.push((property.clone(), instantiable.concrete_type.clone())),
				GeneratorKind::Alias { .. } | GeneratorKind::Root { .. } => {}
			}
		}

		for child in generator.children() {
			match child.kind() {
				GeneratorKind::Property {
					instantiable,
					property,
					..
				} => {
					let (node_kind, edge_kind) = if property.kind().is_deferred() {
						(NodeKind::Deferred, EdgeKind::Deferred)
					} else {
						(NodeKind::Instantiated, EdgeKind::Instantiated)
					};
					let child_type = instantiable.concrete_type.clone();
					self.add_node(child_type.clone(), node_kind);
					self.add_edge(parent.clone(), child_type.clone(), &property.label, edge_kind);
					self.visit(&child_type, child, in_scope);
				}
				GeneratorKind::RecursiveReference {
					instantiable,
					property,
					..
				} => {
					self.add_edge(
						parent.clone(),
						instantiable.concrete_type.clone(),
						&property.label,
						EdgeKind::Deferred,
					);
				}
				GeneratorKind::Alias {
					property,
					fulfilling_property,
					..
				} => {
					// Forwarded properties have no producer in the tree.
					let target = in_scope
						.iter()
						.rev()
						.find(|(supplied, _)| supplied == fulfilling_property)
						.map(|(_, concrete_type)| concrete_type.clone())
						.unwrap_or_else(|| fulfilling_property.type_description.instantiated_type());
					self.add_node(target.clone(), NodeKind::Received);
					self.add_edge(
						parent.clone(),
						target,
						&format!("{} = {}", property.label, fulfilling_property.label),
						EdgeKind::Alias,
					);
				}
				GeneratorKind::Root { .. } => {}
			}
		}
		in_scope.truncate(enclosing);
	}

	/// Adds a node. An existing node keeps its kind unless it was only known
	/// through an alias.
	pub fn add_node(&mut self, type_description: TypeDescription, kind: NodeKind) {
		self.nodes
			.entry(type_description.clone())
			.and_modify(|node| {
				if node.kind == NodeKind::Received {
					node.kind = kind;
				}
			})
			.or_insert(GraphNode {
				type_description,
				kind,
			});
	}

	/// Adds an edge unless an identical one exists.
	pub fn add_edge(
		&mut self,
		from: TypeDescription,
		to: TypeDescription,
		label: &str,
		kind: EdgeKind,
	) {
		let edge = GraphEdge {
			from,
			to,
			label: label.to_string(),
			kind,
		};
		if !self.edges.contains(&edge) {
			self.edges.push(edge);
		}
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
		self.nodes.values()
	}

	/// Edges in insertion order.
	pub fn edges(&self) -> &[GraphEdge] {
		&self.edges
	}

	/// Generate DOT format output for Graphviz
	pub fn to_dot(&self) -> String {
		let mut output = String::from("digraph DependencyGraph {\n");
		output.push_str("  rankdir=LR;\n");
		output.push_str("  node [shape=box, style=rounded];\n\n");

		for node in self.nodes.values() {
			let color = match node.kind {
				NodeKind::Root => "lightblue",
				NodeKind::Instantiated => "lightgreen",
				NodeKind::Deferred => "lightyellow",
				NodeKind::Received => "white",
			};
			let name = escape(&node.type_description.as_source());
			output.push_str(&format!(
				"  \"{name}\" [label=\"{name}\", fillcolor={color}, style=filled];\n"
			));
		}

		output.push('\n');

		for edge in &self.edges {
			let style = match edge.kind {
				EdgeKind::Instantiated => "",
				EdgeKind::Deferred => ", style=dashed",
				EdgeKind::Alias => ", style=dotted",
			};
			output.push_str(&format!(
				"  \"{}\" -> \"{}\" [label=\"{}\"{style}];\n",
				escape(&edge.from.as_source()),
				escape(&edge.to.as_source()),
				escape(&edge.label)
			));
		}

		output.push_str("}\n");
		output
	}

	/// Get statistics about the dependency graph
	pub fn statistics(&self) -> GraphStatistics {
		let count_nodes = |kind: NodeKind| self.nodes.values().filter(|node| node.kind == kind).count();
		let count_edges = |kind: EdgeKind| self.edges.iter().filter(|edge| edge.kind == kind).count();

		GraphStatistics {
			node_count: self.nodes.len(),
			edge_count: self.edges.len(),
			root_count: count_nodes(NodeKind::Root),
			instantiated_count: count_nodes(NodeKind::Instantiated),
			deferred_count: count_nodes(NodeKind::Deferred),
			received_count: count_nodes(NodeKind::Received),
			deferred_edge_count: count_edges(EdgeKind::Deferred),
			alias_edge_count: count_edges(EdgeKind::Alias),
		}
	}
}

fn escape(text: &str) -> String {
	text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Statistics about a dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStatistics {
	/// Total number of nodes
	pub node_count: usize,
	/// Total number of edges
	pub edge_count: usize,
	/// Number of root nodes
	pub root_count: usize,
	/// Number of eagerly instantiated nodes
	pub instantiated_count: usize,
	/// Number of nodes built through factories
	pub deferred_count: usize,
	/// Number of nodes only reached through aliases
	pub received_count: usize,
	/// Number of factory edges
	pub deferred_edge_count: usize,
	/// Number of alias edges
	pub alias_edge_count: usize,
}
