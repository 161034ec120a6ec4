// tests/parser_tests.rs
//! Integration tests for parsing and symbol binding of the files in
//! `test_sources/`.


use bumpalo::Bump;
use cxxfront::prelude::*;
use test_harness::{TestHarness, named};

// =============================================================================
// Templates
// =============================================================================

#[test]
fn box_forward_declaration_then_definition() {
    let harness = TestHarness::new();
    let arena = Bump::new();
    let (mut session, unit) = harness.parse_clean(&arena, "box_template.cpp");

    let ast = session.unit(unit).unwrap();
    let templates: Vec<NodeId> = ast.template_declarations().map(|node| node.id()).collect();
    assert_eq!(templates.len(), 4);

    let phases: Vec<_> = templates
        .iter()
        .map(|&id| ast.template_declaration(id).unwrap().phase())
        .collect();
    assert_eq!(
        phases,
        [TemplatePhase::Open, TemplatePhase::Bound, TemplatePhase::Bound, TemplatePhase::Bound]
    );

    let forward = ast.node_ref(templates[0]);
    let definition = ast.node_ref(templates[1]);
    assert_eq!(session.owned_declaration(forward), Ok(None));
    let owned = session.owned_declaration(definition).unwrap().unwrap();
    match session.resolve(owned).unwrap().kind() {
        NodeKind::Class(class) => {
            assert_eq!(class.name, "Box");
            assert!(!class.specialization);
        }
        other => panic!("expected the class Box, found {}", other.description()),
    }

    let parameters: Vec<_> = ast
        .template_parameters(templates[1])
        .unwrap()
        .filter_map(|node| node.kind().name())
        .collect();
    assert_eq!(parameters, ["T"]);

    assert!(session.finish().is_empty());
    let ast = session.unit(unit).unwrap();
    for id in &templates {
        let decl = ast.template_declaration(*id).unwrap();
        assert_eq!(decl.phase(), TemplatePhase::Sealed);
        assert_eq!(decl.container_symbol(), ContainerRef::Template(decl.template_symbol()));
    }
    assert_eq!(session.owned_declaration(definition).unwrap(), Some(owned));
    assert_eq!(session.owned_declaration(forward), Ok(None));
}

#[test]
fn out_of_line_members_bind_into_the_class() {
    let harness = TestHarness::new();
    let arena = Bump::new();
    let (session, unit) = harness.parse_clean(&arena, "box_template.cpp");
    let ast = session.unit(unit).unwrap();
    let symbols = session.symbols();

    let getters: Vec<_> = named(ast, "get")
        .into_iter()
        .filter_map(|node| match node.kind() {
            NodeKind::Function(function) => Some(*function),
            _ => None,
        })
        .collect();
    assert_eq!(getters.len(), 2);
    assert!(!getters[0].is_definition);
    assert!(getters[1].is_definition);
    assert_eq!(getters[1].qualifier, Some("Box<T>"));

    let class = symbols.owner(symbols.owner(getters[1].symbol).unwrap()).unwrap();
    assert!(matches!(symbols[class].kind(), SymbolKind::Class(ClassKey::Class)));
    assert_eq!(symbols[class].name(), "Box");
}

#[test]
fn nested_template_prefixes() {
    let harness = TestHarness::new();
    let arena = Bump::new();
    let (session, unit) = harness.parse_clean(&arena, "nested_templates.cpp");
    let symbols = session.symbols();

    let factory = symbols.as_template_factory(symbols.root()).unwrap();
    match symbols.factory(factory).unwrap().history() {
        [
            FactoryEvent::Push(a),
            FactoryEvent::Push(b),
            FactoryEvent::Pop(popped_b),
            FactoryEvent::Pop(popped_a),
        ] => {
            assert_eq!(a, popped_a);
            assert_eq!(b, popped_b);
        }
        history => panic!("unexpected factory history {history:?}"),
    }

    let outer = symbols.lookup("f", symbols.root()).unwrap();
    let inner = symbols.templated_symbol(outer).unwrap();
    let function = symbols.templated_symbol(inner).unwrap();
    assert_eq!(symbols.template_parameters(outer).len(), 1);
    assert_eq!(symbols[symbols.template_parameters(inner)[0]].name(), "B");
    assert_eq!(symbols[function].kind(), &SymbolKind::Function);

    let ast = session.unit(unit).unwrap();
    let nodes: Vec<_> = ast.template_declarations().collect();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].parent(), Some(nodes[0].id()));
    assert!(symbols.unbalanced_factories().is_empty());
}

#[test]
fn explicit_owned_declaration_overrides_the_templated_symbol() {
    let harness = TestHarness::new();
    let arena = Bump::new();
    let (session, unit) = harness.parse_clean(&arena, "box_template.cpp");
    let ast = session.unit(unit).unwrap();
    let symbols = session.symbols();

    let forward = ast.template_declarations().next().unwrap();
    let mut decl = ast.template_declaration(forward.id()).unwrap().clone();
    assert_eq!(decl.owned_declaration(symbols), None);

    let get = named(ast, "get")[0];
    decl.set_owned_declaration(get.symbol().unwrap()).unwrap();
    assert_eq!(decl.phase(), TemplatePhase::Bound);
    assert_eq!(decl.owned_declaration(symbols), Some(ast.node_ref(get.id())));
}

// =============================================================================
// Binding and lookup
// =============================================================================

#[test]
fn duplicate_variable_is_reported_once() {
    let arena = Bump::new();
    let mut session = ParseSession::new(&arena);
    let errors = session.parse_unit("int x;\nint x;\n").unwrap_err();

    assert_eq!(errors.len(), 1);
    let error = errors.iter().next().unwrap();
    assert_eq!(error.kind, ParseErrorKind::DuplicateDeclaration);
    assert_eq!(error.span.line, 2);

    let root = session.symbols().root();
    assert_eq!(session.symbols().entries(root, "x").len(), 1);
}

#[test]
fn inner_scopes_shadow_outer_declarations() {
    let harness = TestHarness::new();
    let arena = Bump::new();
    let (session, _) = harness.parse_clean(&arena, "shadowing.cpp");
    let symbols = session.symbols();
    let root = symbols.root();

    let outer = symbols.lookup("outer", root).unwrap();
    let inner = symbols.lookup_qualified(&["outer", "inner"], root, false).unwrap();

    let global_value = symbols.lookup("value", root).unwrap();
    let outer_value = symbols.lookup("value", outer).unwrap();
    let inner_value = symbols.lookup("value", inner).unwrap();

    assert_eq!(symbols.owner(global_value), Some(root));
    assert_eq!(symbols.owner(outer_value), Some(outer));
    assert_eq!(symbols.owner(inner_value), Some(inner));
    assert_eq!(symbols[inner_value].kind(), &SymbolKind::Class(ClassKey::Struct));
    assert_eq!(symbols.qualified_name(inner_value), "outer::inner::value");
    assert_eq!(
        symbols.lookup_qualified(&["value"], root, true).unwrap(),
        global_value
    );
}

#[test]
fn declarations_bind_in_document_order() {
    let harness = TestHarness::new();
    let arena = Bump::new();
    let (session, unit) = harness.parse_clean(&arena, "geometry.cpp");
    let ast = session.unit(unit).unwrap();
    let symbols = session.symbols();
    let root = symbols.root();

    // Both `namespace geo` blocks share one symbol.
    let namespaces = named(ast, "geo");
    assert_eq!(namespaces.len(), 2);
    assert_eq!(namespaces[0].symbol(), namespaces[1].symbol());

    let circle = symbols.lookup_qualified(&["geo", "Circle"], root, false).unwrap();
    let area: Vec<_> = symbols
        .entries(circle, "area")
        .iter()
        .map(|&id| symbols[id].is_defined())
        .collect();
    assert_eq!(area, [false, true]);
    assert_eq!(symbols.entries(circle, "Circle").len(), 2);

    // `dot` lives in the inline namespace but is found from `geo`.
    let geo = symbols.lookup("geo", root).unwrap();
    let dot = symbols.lookup("dot", geo).unwrap();
    assert_eq!(symbols.qualified_name(dot), "geo::v2::dot");

    let origin = named(ast, "origin")[0];
    let NodeKind::Variable(origin) = origin.kind() else {
        panic!("origin should be a variable");
    };
    let point = symbols.lookup_qualified(&["geo", "Point"], root, false).unwrap();
    assert_eq!(origin.ty.symbol, Some(point));

    let using: Vec<_> = ast
        .iter()
        .filter_map(|node| match node.kind() {
            NodeKind::UsingDirective(directive) => Some(directive.target),
            _ => None,
        })
        .collect();
    assert_eq!(using, [symbols.lookup("geo", root).ok()]);
}

#[test]
fn offsets_are_sealed_and_nested() {
    let harness = TestHarness::new();
    let arena = Bump::new();
    for file in ["geometry.cpp", "box_template.cpp", "shadowing.cpp"] {
        let (session, unit) = harness.parse_clean(&arena, file);
        let ast = session.unit(unit).unwrap();
        for node in ast.iter() {
            assert!(node.offsets().is_sealed(), "{file}: {} not sealed", node.id());
            assert!(node.starting_offset() <= node.ending_offset());
            assert!(node.starting_line() <= node.ending_line());
            if let Some(parent) = node.parent() {
                let parent = &ast[parent];
                assert!(parent.starting_offset() <= node.starting_offset());
                assert!(node.ending_offset() <= parent.ending_offset());
            }
        }
    }
}

#[test]
fn node_at_finds_the_innermost_declaration() {
    let harness = TestHarness::new();
    let arena = Bump::new();
    let source = harness.load("geometry.cpp");
    let (session, unit) = harness.parse_clean(&arena, "geometry.cpp");
    let ast = session.unit(unit).unwrap();

    let offset = source.find("radius_;").unwrap() as u32;
    let found = ast.node_at(offset).unwrap();
    assert_eq!(ast[found].kind().name(), Some("radius_"));
    assert_eq!(ast[ast[found].parent().unwrap()].kind().name(), Some("Circle"));
}

// =============================================================================
// Recovery and dialects
// =============================================================================

#[test]
fn lenient_parse_recovers_at_declaration_boundaries() {
    let harness = TestHarness::new();
    let arena = Bump::new();
    let mut session = ParseSession::new(&arena);
    let (unit, errors) = harness.parse_into(&mut session, "recovery.cpp");

    assert!(errors.len() >= 3, "{:?}", errors.clone().into_vec());
    assert!(errors.contains_kind(ParseErrorKind::ExpectedType));
    assert!(errors.contains_kind(ParseErrorKind::IncompleteTemplate));

    let ast = session.unit(unit).unwrap();
    for name in ["before", "Broken", "ok", "after"] {
        assert_eq!(named(ast, name).len(), 1, "{name} should survive recovery");
    }
    for node in ast.iter() {
        assert!(node.offsets().is_sealed(), "{} left unsealed by recovery", node.id());
        if let Some(parent) = node.parent() {
            assert!(ast[parent].starting_offset() <= node.starting_offset());
        }
    }
    assert!(session.finish().is_empty());
}

#[test]
fn c_dialect_treats_cpp_keywords_as_identifiers() {
    let harness = TestHarness::new();
    let arena = Bump::new();
    let mut session = ParseSession::with_options(&arena, ParseOptions::c());
    let (unit, errors) = harness.parse_into(&mut session, "legacy.c");
    assert!(errors.is_empty(), "{:?}", errors.into_vec());

    let ast = session.unit(unit).unwrap();
    assert_eq!(named(ast, "class").len(), 1);
    assert_eq!(named(ast, "template").len(), 1);

    let NodeKind::Typedef(node_t) = named(ast, "node_t")[0].kind() else {
        panic!("node_t should be a typedef");
    };
    assert_eq!(node_t.ty.text, "struct node");

    let visit = named(ast, "visit")[0];
    let parameters: Vec<_> = visit
        .children()
        .iter()
        .filter_map(|&id| match ast[id].kind() {
            NodeKind::Parameter(parameter) => Some(parameter.ty.text),
            _ => None,
        })
        .collect();
    assert_eq!(parameters, ["node_t*", "void(*)(node_t*)"]);
}
