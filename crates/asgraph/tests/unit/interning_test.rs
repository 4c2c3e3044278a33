//! Unit tests for the interning factories of value-like nodes.

use asgraph::{
    Arena, ArenaConfig, AsgError, EdgeKind, EdgeSelector, Language, NodeId, NodeKind,
    ParameterKind, PointerKind, SimpleTypeKind, ROOT_COMPONENT_ID,
};

// `int` and `int*` as Type nodes.
fn create_int_types(arena: &mut Arena) -> asgraph::Result<(NodeId, NodeId)> {
    let int = arena.create_simple_type(SimpleTypeKind::Int);
    let former = arena.create_type_former_type(int)?;
    let pointer = arena.create_type_former_pointer(PointerKind::Pointer);

    let int_type = arena.create_type(&[former])?;
    let int_ptr_type = arena.create_type(&[pointer, former])?;
    Ok((int_type, int_ptr_type))
}

#[test]
fn test_simple_types_are_shared() {
    let mut arena = Arena::default();

    let a = arena.create_simple_type(SimpleTypeKind::Int);
    let b = arena.create_simple_type(SimpleTypeKind::Int);
    let c = arena.create_simple_type(SimpleTypeKind::Double);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(arena.get_ref(a).unwrap().kind(), NodeKind::SimpleType);
}

#[test]
fn test_formers_without_content_are_singletons() {
    let mut arena = Arena::default();

    assert_eq!(arena.create_type_former_array(), arena.create_type_former_array());
    assert_eq!(
        arena.create_type_former_non_type(),
        arena.create_type_former_non_type()
    );
    assert_ne!(
        arena.create_type_former_pointer(PointerKind::Pointer),
        arena.create_type_former_pointer(PointerKind::Reference)
    );
}

#[test]
fn test_type_identity_follows_former_sequence() {
    let mut arena = Arena::default();
    let (int_type, int_ptr_type) = create_int_types(&mut arena).unwrap();

    let int = arena.create_simple_type(SimpleTypeKind::Int);
    let former = arena.create_type_former_type(int).unwrap();
    let pointer = arena.create_type_former_pointer(PointerKind::Pointer);

    assert_eq!(arena.create_type(&[former]).unwrap(), int_type);
    assert_eq!(arena.create_type(&[pointer, former]).unwrap(), int_ptr_type);
    assert_ne!(arena.create_type(&[former, pointer]).unwrap(), int_ptr_type);

    let formers: Vec<NodeId> = arena
        .get_ref(int_ptr_type)
        .unwrap()
        .targets(EdgeKind::TypeHasTypeFormer)
        .collect();
    assert_eq!(formers, vec![pointer, former]);
}

#[test]
fn test_type_built_in_steps_matches_slice_form() {
    let mut arena = Arena::default();
    let (_, int_ptr_type) = create_int_types(&mut arena).unwrap();
    let int = arena.create_simple_type(SimpleTypeKind::Int);
    let former = arena.create_type_former_type(int).unwrap();
    let pointer = arena.create_type_former_pointer(PointerKind::Pointer);

    arena.begin_type();
    arena.add_type_former(pointer).unwrap();
    arena.add_type_former(former).unwrap();
    assert_eq!(arena.end_type().unwrap(), int_ptr_type);
}

#[test]
fn test_type_former_type_requires_existing_target() {
    let mut arena = Arena::default();

    assert!(matches!(
        arena.create_type_former_type(9_999),
        Err(AsgError::InvalidNodeId { id: 9_999 })
    ));
}

#[test]
fn test_add_type_former_rejects_non_formers() {
    let mut arena = Arena::default();
    let int = arena.create_simple_type(SimpleTypeKind::Int);

    assert!(arena.create_type(&[int]).is_err());
    // a failed build leaves no open frame behind
    assert!(matches!(
        arena.end_type(),
        Err(AsgError::EmptyBuildStack { .. })
    ));
}

#[test]
fn test_build_stacks_require_begin() {
    let mut arena = Arena::default();
    let (int_type, _) = create_int_types(&mut arena).unwrap();

    assert!(matches!(
        arena.add_type_former(int_type),
        Err(AsgError::EmptyBuildStack { .. })
    ));
    assert!(matches!(
        arena.set_return_type(int_type),
        Err(AsgError::EmptyBuildStack { .. })
    ));
    assert!(matches!(
        arena.end_type_former_method(),
        Err(AsgError::EmptyBuildStack { .. })
    ));
}

#[test]
fn test_method_signatures_are_shared() {
    let mut arena = Arena::default();
    let (int_type, int_ptr_type) = create_int_types(&mut arena).unwrap();

    let signature = |arena: &mut Arena, kind: ParameterKind| -> asgraph::Result<NodeId> {
        arena.begin_type_former_method();
        arena.set_return_type(int_type)?;
        arena.add_parameter_type(int_ptr_type, kind)?;
        arena.end_type_former_method()
    };

    let a = signature(&mut arena, ParameterKind::In).unwrap();
    let b = signature(&mut arena, ParameterKind::In).unwrap();
    let c = signature(&mut arena, ParameterKind::Out).unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
    let node = arena.get_ref(a).unwrap();
    assert_eq!(node.single(EdgeKind::TypeFormerMethodHasReturnType), Some(int_type));
    assert_eq!(
        node.edges(EdgeKind::TypeFormerMethodHasParameterType)[0].assoc,
        asgraph::Assoc::Parameter(ParameterKind::In)
    );
}

#[test]
fn test_method_calls_are_shared() {
    let mut arena = Arena::default();
    let method = arena.create_node(NodeKind::Method).unwrap();
    let class = arena.create_node(NodeKind::Class).unwrap();

    let call = arena.create_method_call(method).unwrap();
    assert_eq!(arena.create_method_call(method).unwrap(), call);
    assert_eq!(
        arena.get_ref(call).unwrap().single(EdgeKind::MethodCallMethod),
        Some(method)
    );
    assert!(arena.create_method_call(class).is_err());

    let unresolved = arena.create_method_call_imprint("java.util.List.add(Object)");
    assert_eq!(
        arena.create_method_call_imprint("java.util.List.add(Object)"),
        unresolved
    );
    assert_ne!(unresolved, call);
}

#[test]
fn test_attribute_access_and_friendship_are_shared() {
    let mut arena = Arena::default();
    let attribute = arena.create_node(NodeKind::Attribute).unwrap();
    let friend = arena.create_node(NodeKind::Class).unwrap();

    let access = arena.create_attribute_access(attribute).unwrap();
    assert_eq!(arena.create_attribute_access(attribute).unwrap(), access);

    let friendship = arena.create_friendship(friend).unwrap();
    assert_eq!(arena.create_friendship(friend).unwrap(), friendship);
    assert!(arena.create_friendship(attribute).is_err());
}

#[test]
fn test_components_and_comments_are_shared() {
    let mut arena = Arena::default();

    assert_eq!(arena.create_component("<System>"), ROOT_COMPONENT_ID);
    let lib = arena.create_component("lib");
    assert_eq!(arena.create_component("lib"), lib);
    assert_eq!(arena.name(lib), "lib");

    let comment = arena.create_comment("// keep in sync");
    assert_eq!(arena.create_comment("// keep in sync"), comment);
    assert_ne!(arena.create_comment("/* other */"), comment);
}

#[test]
fn test_destroyed_values_leave_the_caches() {
    let mut arena = Arena::new(ArenaConfig::for_language(Language::Cpp));
    arena.enable_reverse_edges(EdgeSelector::all()).unwrap();
    let before = arena.interned_count();

    let int = arena.create_simple_type(SimpleTypeKind::Int);
    let former = arena.create_type_former_type(int).unwrap();
    let ty = arena.create_type(&[former]).unwrap();
    assert_eq!(arena.interned_count(), before + 3);

    arena.destroy_node(ty).unwrap();
    arena.destroy_node(former).unwrap();
    assert_eq!(arena.interned_count(), before + 1);

    let former_again = arena.create_type_former_type(int).unwrap();
    let ty_again = arena.create_type(&[former_again]).unwrap();
    assert!(arena.get_exist(ty_again));
    assert_eq!(
        arena.get_ref(ty_again).unwrap().targets(EdgeKind::TypeHasTypeFormer).collect::<Vec<_>>(),
        vec![former_again]
    );
}

#[test]
fn test_method_call_cache_forgets_destroyed_callee() {
    let mut arena = Arena::default();
    arena.enable_reverse_edges(EdgeSelector::all()).unwrap();
    let method = arena.create_node(NodeKind::Method).unwrap();
    let call = arena.create_method_call(method).unwrap();

    arena.destroy_node(method).unwrap();
    let replacement = arena.create_node(NodeKind::Method).unwrap();
    assert_eq!(replacement, method);

    let new_call = arena.create_method_call(replacement).unwrap();
    assert_ne!(new_call, call);
    assert_eq!(
        arena.get_ref(new_call).unwrap().single(EdgeKind::MethodCallMethod),
        Some(replacement)
    );
}

#[test]
fn test_value_defining_edges_cannot_be_edited() {
    let mut arena = Arena::default();
    let int = arena.create_simple_type(SimpleTypeKind::Int);
    let former = arena.create_type_former_type(int).unwrap();
    let array = arena.create_type_former_array();
    let int_type = arena.create_type(&[former]).unwrap();

    let err = arena
        .add_edge(int_type, EdgeKind::TypeHasTypeFormer, array)
        .unwrap_err();
    assert!(matches!(
        err,
        AsgError::InvalidEdge { kind: EdgeKind::TypeHasTypeFormer, .. }
    ));
    assert!(matches!(
        arena.remove_edge(int_type, EdgeKind::TypeHasTypeFormer, former),
        Err(AsgError::InvalidEdge { .. })
    ));

    let method = arena.create_node(NodeKind::Method).unwrap();
    let other = arena.create_node(NodeKind::Method).unwrap();
    let call = arena.create_method_call(method).unwrap();
    assert!(arena
        .add_edge(call, EdgeKind::MethodCallMethod, other)
        .is_err());

    assert!(matches!(
        arena.get_mut(int),
        Err(AsgError::InvalidNodeKind { kind: NodeKind::SimpleType, .. })
    ));
    let component = arena.create_component("core");
    assert!(arena.set_name(component, "renamed").is_err());
    assert_eq!(arena.create_component("core"), component);

    // contents still match their keys
    assert_eq!(
        arena.get_ref(int_type).unwrap().targets(EdgeKind::TypeHasTypeFormer).collect::<Vec<_>>(),
        vec![former]
    );
    assert_eq!(arena.create_type(&[former]).unwrap(), int_type);
    let array_type = arena.create_type(&[former, array]).unwrap();
    assert_ne!(array_type, int_type);
    assert_eq!(arena.create_method_call(method).unwrap(), call);
}
