//! Code generation tests: exact output of root initializers and their bodies

mod common;

use common::{aliased, component, forwarded, generate, instantiated, instantiated_by, received, root};
use proptest::prelude::*;
use rstest::rstest;
use wiregraph_graph::{DependencyTreeGenerator, FILE_HEADER, GeneratorOptions};
use wiregraph_types::{DeclarationType, Instantiable, TypeDescription};

#[rstest]
fn class_root_gets_convenience_initializer() {
	// Arrange
	let graph = vec![
		root("Root")
			.with_dependency(instantiated("a", "A"))
			.with_dependency(instantiated("b", "B")),
		component("A"),
		component("B").with_dependency(received("a", "A")),
	];

	// Act
	let code = generate(graph).unwrap();

	// Assert
	assert_eq!(
		code,
		"extension Root {
    public convenience init() {
        let a = A()
        let b = B(a: a)
        self.init(a: a, b: b)
    }
}
"
	);
}

#[rstest]
fn producer_is_emitted_before_its_consumer() {
	// Arrange
	let graph = vec![
		root("Root")
			.with_dependency(instantiated("consumer", "Consumer"))
			.with_dependency(instantiated("producer", "Producer")),
		component("Consumer").with_dependency(received("producer", "Producer")),
		component("Producer"),
	];

	// Act
	let code = generate(graph).unwrap();

	// Assert
	assert_eq!(
		code,
		"extension Root {
    public convenience init() {
        let producer = Producer()
        let consumer = Consumer(producer: producer)
        self.init(consumer: consumer, producer: producer)
    }
}
"
	);
}

#[rstest]
fn nested_scope_is_built_in_a_local_function() {
	// Arrange
	let graph = vec![
		root("Root").with_dependency(instantiated("a", "A")),
		component("A").with_dependency(instantiated("b", "B")),
		component("B"),
	];

	// Act
	let code = generate(graph).unwrap();

	// Assert
	assert_eq!(
		code,
		"extension Root {
    public convenience init() {
        func __wg_a() -> A {
            let b = B()
            return A(b: b)
        }
        let a = __wg_a()
        self.init(a: a)
    }
}
"
	);
}

#[rstest]
#[case(DeclarationType::Struct, "public init()")]
#[case(DeclarationType::Actor, "public init()")]
#[case(DeclarationType::Class, "public convenience init()")]
fn initializer_modifier_follows_declaration(
	#[case] declaration_type: DeclarationType,
	#[case] signature: &str,
) {
	// Arrange
	let graph = vec![
		root("Root")
			.with_declaration_type(declaration_type)
			.with_dependency(instantiated("a", "A")),
		component("A"),
	];

	// Act
	let code = generate(graph).unwrap();

	// Assert
	assert!(code.contains(&format!("    {signature} {{\n")));
}

#[rstest]
fn extension_root_gets_static_instantiate() {
	// Arrange
	let graph = vec![
		root("Root")
			.with_declaration_type(DeclarationType::Extension)
			.with_dependency(instantiated("a", "A")),
		component("A").with_declaration_type(DeclarationType::Extension),
	];

	// Act
	let code = generate(graph).unwrap();

	// Assert
	assert_eq!(
		code,
		"extension Root {
    public static func instantiate() -> Root {
        let a = A.instantiate()
        return Root.instantiate(a: a)
    }
}
"
	);
}

#[rstest]
fn root_without_dependencies_generates_nothing() {
	// Arrange
	let graph = vec![root("Root")];

	// Act
	let code = generate(graph).unwrap();

	// Assert
	assert_eq!(code, "");
}

#[rstest]
fn deferred_property_with_one_forwarded_property() {
	// Arrange
	let graph = vec![
		root("Root")
			.with_declaration_type(DeclarationType::Struct)
			.with_dependency(instantiated("detailBuilder", "Instantiator<Detail>")),
		component("Detail")
			.with_dependency(forwarded("id", "String"))
			.with_dependency(instantiated("store", "Store")),
		component("Store"),
	];

	// Act
	let code = generate(graph).unwrap();

	// Assert
	assert_eq!(
		code,
		"extension Root {
    public init() {
        func __wg_detailBuilder(id: String) -> Detail {
            let store = Store()
            return Detail(id: id, store: store)
        }
        let detailBuilder = Instantiator<Detail> { id in __wg_detailBuilder(id: id) }
        self.init(detailBuilder: detailBuilder)
    }
}
"
	);
}

#[rstest]
fn sendable_erased_factory_with_several_forwarded_properties() {
	// Arrange
	let graph = vec![
		root("Root").with_dependency(instantiated_by(
			"viewBuilder",
			"SendableErasedInstantiator<(name: String, userID: String), UIView>",
			"ProfileView",
			false,
		)),
		component("ProfileView")
			.with_dependency(forwarded("userID", "String"))
			.with_dependency(forwarded("name", "String")),
	];

	// Act
	let code = generate(graph).unwrap();

	// Assert
	assert_eq!(
		code,
		"extension Root {
    public convenience init() {
        @Sendable func __wg_viewBuilder(name: String, userID: String) -> UIView {
            return ProfileView(userID: userID, name: name)
        }
        let viewBuilder = SendableErasedInstantiator<(name: String, userID: String), UIView> { forwardedProperties in __wg_viewBuilder(name: forwardedProperties.name, userID: forwardedProperties.userID) }
        self.init(viewBuilder: viewBuilder)
    }
}
"
	);
}

#[rstest]
fn deferred_property_without_forwarded_properties_wraps_function() {
	// Arrange
	let graph = vec![
		root("Root").with_dependency(instantiated("storeBuilder", "SendableInstantiator<Store>")),
		component("Store"),
	];

	// Act
	let code = generate(graph).unwrap();

	// Assert
	assert!(code.contains(
		"        @Sendable func __wg_storeBuilder() -> Store {\n            return Store()\n        }\n"
	));
	assert!(code.contains(
		"        let storeBuilder = SendableInstantiator<Store>(__wg_storeBuilder)\n"
	));
}

#[rstest]
#[case(
	instantiated_by("service", "AnyService", "DefaultService", true),
	"let service = AnyService(DefaultService())"
)]
#[case(
	instantiated_by("service", "any Service", "DefaultService", false),
	"let service: any Service = DefaultService()"
)]
#[case(
	instantiated("service", "DefaultService"),
	"let service = DefaultService()"
)]
fn constant_annotation_and_erasure(
	#[case] dependency: wiregraph_types::Dependency,
	#[case] expected: &str,
) {
	// Arrange
	let graph = vec![root("Root").with_dependency(dependency), component("DefaultService")];

	// Act
	let code = generate(graph).unwrap();

	// Assert
	assert!(code.contains(&format!("        {expected}\n")), "{code}");
}

#[rstest]
fn alias_follows_the_property_it_renames() {
	// Arrange
	let graph = vec![
		root("Root")
			.with_dependency(aliased("service", "any Service", "defaultService", "DefaultService"))
			.with_dependency(instantiated("defaultService", "DefaultService")),
		component("DefaultService"),
	];

	// Act
	let code = generate(graph).unwrap();

	// Assert
	assert_eq!(
		code,
		"extension Root {
    public convenience init() {
        let defaultService = DefaultService()
        let service: any Service = defaultService
        self.init(service: service, defaultService: defaultService)
    }
}
"
	);
}

#[rstest]
fn recursive_factory_refers_to_enclosing_function() {
	// Arrange
	let graph = vec![
		root("Root").with_dependency(instantiated("a", "A")),
		component("A").with_dependency(instantiated("bBuilder", "Instantiator<B>")),
		component("B").with_dependency(instantiated("a", "A")),
	];

	// Act
	let code = generate(graph).unwrap();

	// Assert
	assert!(code.contains(
		"        func __wg_a() -> A {\n            func __wg_bBuilder() -> B {\n"
	));
	assert!(code.contains(
		"                func __wg_a_2() -> A {\n                    let bBuilder = Instantiator<B>(__wg_bBuilder)\n                    return A(bBuilder: bBuilder)\n                }\n                let a = __wg_a_2()\n"
	));
	assert!(code.ends_with("        let a = __wg_a()\n        self.init(a: a)\n    }\n}\n"));
}

#[rstest]
fn nested_factories_sharing_a_label_get_distinct_names() {
	// Arrange
	let graph = vec![
		root("Root").with_dependency(instantiated("builder", "Instantiator<A>")),
		component("A").with_dependency(instantiated("builder", "B")),
		component("B").with_dependency(instantiated("builder", "Instantiator<A>")),
	];

	// Act
	let code = generate(graph).unwrap();

	// Assert
	assert_eq!(
		code,
		"extension Root {
    public convenience init() {
        func __wg_builder() -> A {
            func __wg_builder_2() -> B {
                let builder = Instantiator<A>(__wg_builder)
                return B(builder: builder)
            }
            let builder = __wg_builder_2()
            return A(builder: builder)
        }
        let builder = Instantiator<A>(__wg_builder)
        self.init(builder: builder)
    }
}
"
	);
}

#[rstest]
fn file_has_header_sorted_imports_and_every_generated_root() {
	// Arrange
	let graph = vec![
		root("First").with_dependency(instantiated("a", "A")),
		root("Empty"),
		root("Second").with_dependency(instantiated("a", "A")),
		component("A"),
	];
	let imports = vec![
		"UIKit".to_string(),
		"import Foundation".to_string(),
		"UIKit".to_string(),
		" ".to_string(),
	];
	let generator = DependencyTreeGenerator::new(graph, imports, GeneratorOptions::default()).unwrap();

	// Act
	let file = generator.generate_file().unwrap();

	// Assert
	let expected = format!(
		"{FILE_HEADER}
import Foundation
import UIKit

extension First {{
    public convenience init() {{
        let a = A()
        self.init(a: a)
    }}
}}

extension Second {{
    public convenience init() {{
        let a = A()
        self.init(a: a)
    }}
}}
"
	);
	assert_eq!(file, expected);
}

#[rstest]
fn file_without_imports_or_roots_is_only_the_header() {
	// Arrange
	let generator =
		DependencyTreeGenerator::new([component("A")], Vec::new(), GeneratorOptions::default())
			.unwrap();

	// Act
	let file = generator.generate_file().unwrap();

	// Assert
	assert_eq!(file, FILE_HEADER);
}

#[rstest]
fn parallel_and_sequential_generation_agree() {
	// Arrange
	let graph = || {
		let mut graph: Vec<Instantiable> = (0..6)
			.map(|index| root(&format!("Root{index}")).with_dependency(instantiated("a", "A")))
			.collect();
		graph.push(component("A"));
		graph
	};
	let generate_with = |parallel: bool| {
		DependencyTreeGenerator::new(
			graph(),
			Vec::new(),
			GeneratorOptions {
				parallel,
				..GeneratorOptions::default()
			},
		)
		.unwrap()
		.generate_file()
		.unwrap()
	};

	// Act
	let parallel = generate_with(true);
	let sequential = generate_with(false);

	// Assert
	assert_eq!(parallel, sequential);
}

/// A root instantiating components `C0 .. Cn-1` in `declaration_order`,
/// where component `i` receives every `Cj` flagged in `receives[i]`
/// (always `j < i`, so the graph is acyclic).
fn acyclic_graph(receives: &[Vec<bool>], declaration_order: &[usize]) -> Vec<Instantiable> {
	let mut root_component = root("Root");
	for &index in declaration_order {
		root_component =
			root_component.with_dependency(instantiated(&format!("c{index}"), &format!("C{index}")));
	}
	let mut graph = vec![root_component];
	for (index, flags) in receives.iter().enumerate() {
		let mut component = component(&format!("C{index}"));
		for (received_index, _) in flags.iter().enumerate().filter(|(_, flag)| **flag) {
			component = component.with_dependency(received(
				&format!("c{received_index}"),
				&format!("C{received_index}"),
			));
		}
		graph.push(component);
	}
	graph
}

fn acyclic_strategy() -> impl Strategy<Value = (Vec<Vec<bool>>, Vec<usize>)> {
	(1usize..8).prop_flat_map(|size| {
		let receives = (0..size)
			.map(|index| prop::collection::vec(any::<bool>(), index))
			.collect::<Vec<_>>();
		let order = Just((0..size).collect::<Vec<_>>()).prop_shuffle();
		(receives, order)
	})
}

proptest! {
	/// Test: Every received sibling is declared before the statement that
	/// uses it, whatever order the root lists its properties in
	/// Category: Property
	#[rstest]
	fn prop_declarations_precede_uses((receives, order) in acyclic_strategy()) {
		// Arrange
		let graph = acyclic_graph(&receives, &order);

		// Act
		let code = generate(graph).unwrap();

		// Assert
		let position = |index: usize| code.find(&format!("let c{index} = "));
		for (index, flags) in receives.iter().enumerate() {
			let consumer = position(index);
			prop_assert!(consumer.is_some());
			for (received_index, _) in flags.iter().enumerate().filter(|(_, flag)| **flag) {
				prop_assert!(position(received_index) < consumer);
			}
		}
	}

	/// Test: Generation is deterministic for identical input
	/// Category: Property
	#[rstest]
	fn prop_generation_is_deterministic((receives, order) in acyclic_strategy()) {
		// Act
		let first = generate(acyclic_graph(&receives, &order)).unwrap();
		let second = generate(acyclic_graph(&receives, &order)).unwrap();

		// Assert
		prop_assert_eq!(first, second);
	}
}

#[rstest]
fn concrete_type_is_available_to_generated_roots() {
	// Arrange
	let generic_root = Instantiable::new(TypeDescription::parse("Container<Int>"))
		.root()
		.with_dependency(instantiated("a", "A"));

	// Act
	let code = generate(vec![generic_root, component("A")]).unwrap();

	// Assert
	assert!(code.starts_with("extension Container<Int> {\n"));
}
