//! Scope code generation
//!
//! A [`ScopeGenerator`] is derived from a resolved [`Scope`] once and never
//! mutated afterwards. Its children are stored in emission order: every
//! sibling a child receives a property from is emitted before that child.
//! Generated code is computed once per generator and cached.
//!
//! Every nested function a tree declares gets a name unique within that
//! tree, so a recursive reference always binds to the factory it refers to.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use tracing::warn;
use wiregraph_types::{DeclarationType, Instantiable, Property};

use crate::error::{GraphError, PropertyChain};
use crate::scope::{PropertyToGenerate, Scope};

const INDENT: &str = "    ";
const FACTORY_PREFIX: &str = "__wg_";

/// What a generator emits.
#[derive(Debug, Clone)]
pub enum GeneratorKind {
	/// A root's public no-argument initializer.
	Root { instantiable: Arc<Instantiable> },
	/// A property built by a child scope, eagerly or through a factory.
	Property {
		instantiable: Arc<Instantiable>,
		property: Property,
		erased_to_concrete_existential: bool,
		/// Name of the nested function building the value, if one is declared.
		function_name: Option<String>,
	},
	/// A deferred property wrapping the factory of an enclosing scope.
	RecursiveReference {
		instantiable: Arc<Instantiable>,
		property: Property,
		function_name: String,
	},
	/// A renaming of a property already in scope.
	Alias {
		property: Property,
		fulfilling_property: Property,
		erased_to_concrete_existential: bool,
	},
}

/// Immutable code generator for one node of a resolved scope tree.
#[derive(Debug)]
pub struct ScopeGenerator {
	kind: GeneratorKind,
	children: Vec<ScopeGenerator>,
	required_received_properties: BTreeSet<Property>,
	code: OnceCell<String>,
}

impl ScopeGenerator {
	/// Derives the generator tree for a resolved root scope.
	///
	/// Fails with `PropertyDependencyCycle` when sibling properties of any
	/// scope require each other.
	pub fn new(scope: Scope) -> Result<Self, GraphError> {
		Self::from_scope(scope, None, &mut FactoryNames::default())
	}

	fn from_scope(
		scope: Scope,
		property: Option<(Property, bool)>,
		names: &mut FactoryNames,
	) -> Result<Self, GraphError> {
		let Scope {
			instantiable,
			properties_to_generate,
		} = scope;

		let function_name = property.as_ref().and_then(|(property, _)| {
			let declares_function =
				property.kind().is_deferred() || !properties_to_generate.is_empty();
			declares_function.then(|| names.declare(property, &instantiable))
		});

		let children = properties_to_generate
			.into_iter()
			.map(|property_to_generate| Self::from_property(property_to_generate, names))
			.collect::<Result<Vec<_>, _>>();
		if function_name.is_some() {
			names.leave();
		}
		let children = children?;
		let required_received_properties = required_received_properties(&instantiable, &children);
		let children = order_children(&instantiable, children)?;

		let kind = match property {
			Some((property, erased_to_concrete_existential)) => GeneratorKind::Property {
				instantiable,
				property,
				erased_to_concrete_existential,
				function_name,
			},
			None => GeneratorKind::Root { instantiable },
		};
		Ok(Self {
			kind,
			children,
			required_received_properties,
			code: OnceCell::new(),
		})
	}

	fn from_property(
		property_to_generate: PropertyToGenerate,
		names: &mut FactoryNames,
	) -> Result<Self, GraphError> {
		match property_to_generate {
			PropertyToGenerate::Instantiated {
				property,
				scope,
				erased_to_concrete_existential,
			} => Self::from_scope(scope, Some((property, erased_to_concrete_existential)), names),
			PropertyToGenerate::RecursiveReference {
				property,
				instantiable,
			} => {
				let function_name = names.enclosing(&property, &instantiable).ok_or_else(|| {
					GraphError::UnresolvedRecursiveReference {
						property: property.clone(),
						instantiable: instantiable.concrete_type.clone(),
					}
				})?;
				Ok(Self::leaf(
					GeneratorKind::RecursiveReference {
						instantiable,
						property,
						function_name,
					},
					BTreeSet::new(),
				))
			}
			PropertyToGenerate::Aliased {
				property,
				fulfilling_property,
				erased_to_concrete_existential,
			} => {
				let required = BTreeSet::from([fulfilling_property.clone()]);
				Ok(Self::leaf(
					GeneratorKind::Alias {
						property,
						fulfilling_property,
						erased_to_concrete_existential,
					},
					required,
				))
			}
		}
	}

	fn leaf(kind: GeneratorKind, required_received_properties: BTreeSet<Property>) -> Self {
		Self {
			kind,
			children: Vec::new(),
			required_received_properties,
			code: OnceCell::new(),
		}
	}

	pub fn kind(&self) -> &GeneratorKind {
		&self.kind
	}

	/// Child generators in emission order.
	pub fn children(&self) -> &[ScopeGenerator] {
		&self.children
	}

	/// Properties that must already be in scope where this node is emitted.
	pub fn required_received_properties(&self) -> &BTreeSet<Property> {
		&self.required_received_properties
	}

	/// The property this node declares; `None` for a root.
	pub fn property(&self) -> Option<&Property> {
		match &self.kind {
			GeneratorKind::Root { .. } => None,
			GeneratorKind::Property { property, .. }
			| GeneratorKind::RecursiveReference { property, .. }
			| GeneratorKind::Alias { property, .. } => Some(property),
		}
	}

	/// The component this node builds; `None` for an alias.
	pub fn instantiable(&self) -> Option<&Arc<Instantiable>> {
		match &self.kind {
			GeneratorKind::Root { instantiable }
			| GeneratorKind::Property { instantiable, .. }
			| GeneratorKind::RecursiveReference { instantiable, .. } => Some(instantiable),
			GeneratorKind::Alias { .. } => None,
		}
	}

	/// Renders this node's declarations; computed once and cached.
	pub fn generate_code(&self) -> Result<String, GraphError> {
		self.code.get_or_try_init(|| self.render()).cloned()
	}

	fn render(&self) -> Result<String, GraphError> {
		match &self.kind {
			GeneratorKind::Root { instantiable } => self.render_root(instantiable),
			GeneratorKind::Property {
				instantiable,
				property,
				erased_to_concrete_existential,
				function_name,
			} => self.render_property(
				instantiable,
				property,
				*erased_to_concrete_existential,
				function_name.as_deref(),
			),
			GeneratorKind::RecursiveReference {
				instantiable,
				property,
				function_name,
			} => Ok(format!(
				"let {} = {}\n",
				property.label,
				factory_expression(property, instantiable, function_name)
			)),
			GeneratorKind::Alias {
				property,
				fulfilling_property,
				erased_to_concrete_existential,
			} => Ok(render_alias(
				property,
				fulfilling_property,
				*erased_to_concrete_existential,
			)),
		}
	}

	fn render_children(&self) -> Result<String, GraphError> {
		let mut body = String::new();
		for child in &self.children {
			body.push_str(&child.generate_code()?);
		}
		Ok(body)
	}

	fn render_root(&self, instantiable: &Instantiable) -> Result<String, GraphError> {
		let type_source = instantiable.concrete_type.as_source();
		if instantiable.dependencies.is_empty() {
			warn!(root = %type_source, "root has no dependencies; no initializer generated");
			return Ok(String::new());
		}

		let body = indent(&self.render_children()?, 2);
		let arguments = argument_list(instantiable)?;
		let code = match instantiable.declaration_type {
			DeclarationType::Extension => format!(
				"extension {type_source} {{\n{INDENT}public static func instantiate() -> {type_source} {{\n{body}{INDENT}{INDENT}return {}({arguments})\n{INDENT}}}\n}}\n",
				instantiable.instantiation_expression()
			),
			declaration_type => {
				let modifier = if declaration_type == DeclarationType::Class {
					"convenience "
				} else {
					""
				};
				format!(
					"extension {type_source} {{\n{INDENT}public {modifier}init() {{\n{body}{INDENT}{INDENT}self.init({arguments})\n{INDENT}}}\n}}\n"
				)
			}
		};
		Ok(code)
	}

	fn render_property(
		&self,
		instantiable: &Instantiable,
		property: &Property,
		erased_to_concrete_existential: bool,
		function_name: Option<&str>,
	) -> Result<String, GraphError> {
		let construction = format!(
			"{}({})",
			instantiable.instantiation_expression(),
			argument_list(instantiable)?
		);
		let label = &property.label;
		let property_type = &property.type_description;
		let kind = property.kind();

		if !kind.is_deferred() {
			let value = if erased_to_concrete_existential {
				format!("{property_type}({construction})")
			} else {
				construction
			};
			let Some(function_name) = function_name else {
				let annotation =
					if !erased_to_concrete_existential && *property_type != instantiable.concrete_type {
						format!(": {property_type}")
					} else {
						String::new()
					};
				return Ok(format!("let {label}{annotation} = {value}\n"));
			};
			let body = indent(&self.render_children()?, 1);
			return Ok(format!(
				"func {function_name}() -> {property_type} {{\n{body}{INDENT}return {value}\n}}\nlet {label} = {function_name}()\n"
			));
		}

		let function_name = function_name.ok_or_else(|| GraphError::UnresolvedRecursiveReference {
			property: property.clone(),
			instantiable: instantiable.concrete_type.clone(),
		})?;
		let produced = property_type.instantiated_type();
		let value = if erased_to_concrete_existential {
			format!("{produced}({construction})")
		} else {
			construction
		};
		let parameters = instantiable
			.forwarded_properties()
			.iter()
			.map(|forwarded| forwarded.as_source())
			.collect::<Vec<_>>()
			.join(", ");
		let sendable = if kind.is_sendable() { "@Sendable " } else { "" };
		let body = indent(&self.render_children()?, 1);
		Ok(format!(
			"{sendable}func {function_name}({parameters}) -> {produced} {{\n{body}{INDENT}return {value}\n}}\nlet {label} = {}\n",
			factory_expression(property, instantiable, function_name)
		))
	}
}

/// Function names declared so far in one tree, plus the factories enclosing
/// the node under construction.
#[derive(Default)]
struct FactoryNames {
	declared: HashSet<String>,
	enclosing: Vec<(Property, Arc<Instantiable>, String)>,
}

impl FactoryNames {
	/// Reserves a fresh name for a function building `property` and enters it.
	fn declare(&mut self, property: &Property, instantiable: &Arc<Instantiable>) -> String {
		let base = format!("{FACTORY_PREFIX}{}", property.label);
		let mut name = base.clone();
		let mut suffix = 2;
		while self.declared.contains(&name) {
			name = format!("{base}_{suffix}");
			suffix += 1;
		}
		self.declared.insert(name.clone());
		self.enclosing
			.push((property.clone(), Arc::clone(instantiable), name.clone()));
		name
	}

	fn leave(&mut self) {
		self.enclosing.pop();
	}

	/// The nearest enclosing factory building `property` with `instantiable`.
	fn enclosing(&self, property: &Property, instantiable: &Instantiable) -> Option<String> {
		self.enclosing
			.iter()
			.rev()
			.find(|(enclosing_property, enclosing_instantiable, _)| {
				enclosing_property == property
					&& enclosing_instantiable.concrete_type == instantiable.concrete_type
			})
			.map(|(_, _, name)| name.clone())
	}
}

/// Received and alias-fulfilling properties of the node and its subtree that
/// the node does not supply itself.
fn required_received_properties(
	instantiable: &Instantiable,
	children: &[ScopeGenerator],
) -> BTreeSet<Property> {
	let mut required: BTreeSet<Property> = instantiable
		.dependencies
		.iter()
		.filter_map(|dependency| dependency.required_property())
		.cloned()
		.collect();
	for child in children {
		required.extend(child.required_received_properties.iter().cloned());
	}
	for supplied in instantiable.supplied_properties() {
		required.remove(supplied);
	}
	required
}

/// Depth-first fulfillment of sibling requirements over declaration order.
struct SiblingOrdering<'a> {
	instantiable: &'a Instantiable,
	children: &'a [ScopeGenerator],
	index_of: IndexMap<&'a Property, usize>,
	path: Vec<usize>,
	resolved: Vec<bool>,
	order: Vec<usize>,
}

impl SiblingOrdering<'_> {
	fn fulfill(&mut self, index: usize) -> Result<(), GraphError> {
		if self.resolved[index] {
			return Ok(());
		}
		if let Some(start) = self.path.iter().position(|&visited| visited == index) {
			let cycle = self.path[start..]
				.iter()
				.chain(std::iter::once(&index))
				.filter_map(|&member| self.children[member].property().cloned())
				.collect();
			return Err(GraphError::PropertyDependencyCycle {
				instantiable: self.instantiable.concrete_type.clone(),
				cycle: PropertyChain(cycle),
			});
		}

		self.path.push(index);
		let children = self.children;
		for required in &children[index].required_received_properties {
			if let Some(&producer) = self.index_of.get(required) {
				self.fulfill(producer)?;
			}
		}
		self.path.pop();

		self.resolved[index] = true;
		self.order.push(index);
		Ok(())
	}
}

fn order_children(
	instantiable: &Instantiable,
	children: Vec<ScopeGenerator>,
) -> Result<Vec<ScopeGenerator>, GraphError> {
	let order = {
		let mut index_of = IndexMap::with_capacity(children.len());
		for (index, child) in children.iter().enumerate() {
			if let Some(property) = child.property() {
				index_of.entry(property).or_insert(index);
			}
		}
		let mut ordering = SiblingOrdering {
			instantiable,
			children: &children,
			index_of,
			path: Vec::new(),
			resolved: vec![false; children.len()],
			order: Vec::with_capacity(children.len()),
		};
		for index in 0..children.len() {
			ordering.fulfill(index)?;
		}
		ordering.order
	};

	let mut slots: Vec<Option<ScopeGenerator>> = children.into_iter().map(Some).collect();
	Ok(order
		.into_iter()
		.filter_map(|index| slots[index].take())
		.collect())
}

fn argument_list(instantiable: &Instantiable) -> Result<String, GraphError> {
	instantiable
		.generate_argument_list()
		.map_err(|source| GraphError::Initializer {
			instantiable: instantiable.concrete_type.clone(),
			source,
		})
}

/// The wrapper construction around a factory function, adapting forwarded
/// arguments to the factory's labeled parameters.
fn factory_expression(property: &Property, instantiable: &Instantiable, function_name: &str) -> String {
	let wrapper = property.type_description.as_source();
	match instantiable.forwarded_properties().as_slice() {
		[] => format!("{wrapper}({function_name})"),
		[single] => format!(
			"{wrapper} {{ {0} in {function_name}({0}: {0}) }}",
			single.label
		),
		several => format!(
			"{wrapper} {{ forwardedProperties in {function_name}({}) }}",
			several
				.iter()
				.map(|forwarded| format!("{0}: forwardedProperties.{0}", forwarded.label))
				.collect::<Vec<_>>()
				.join(", ")
		),
	}
}

fn render_alias(
	property: &Property,
	fulfilling_property: &Property,
	erased_to_concrete_existential: bool,
) -> String {
	let label = &property.label;
	let property_type = &property.type_description;
	let source = &fulfilling_property.label;
	if erased_to_concrete_existential {
		format!("let {label} = {property_type}({source})\n")
	} else if *property_type != fulfilling_property.type_description {
		format!("let {label}: {property_type} = {source}\n")
	} else {
		format!("let {label} = {source}\n")
	}
}

/// Indents every non-empty line by `levels` indentation units.
fn indent(code: &str, levels: usize) -> String {
	let prefix = INDENT.repeat(levels);
	let mut indented = String::with_capacity(code.len() + prefix.len() * code.lines().count());
	for line in code.lines() {
		if !line.is_empty() {
			indented.push_str(&prefix);
			indented.push_str(line);
		}
		indented.push('\n');
	}
	indented
}
