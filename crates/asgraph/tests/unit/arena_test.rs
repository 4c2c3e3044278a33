//! Unit tests for node creation, edges, destruction and id reuse.

use asgraph::{
    Arena, ArenaConfig, AsgError, DestroyObserver, EdgeKind, EdgeSelector, Language, Node,
    NodeData, NodeId, NodeKind, SimpleTypeKind, StringTable, FILE_SYSTEM_ID, MAX_NODE_ID,
    RESERVED_IDS, ROOT_COMPONENT_ID, ROOT_PACKAGE_ID,
};
use std::cell::RefCell;
use std::rc::Rc;

fn arena_with_reverse_edges() -> asgraph::Result<Arena> {
    let mut arena = Arena::new(ArenaConfig::for_language(Language::Java));
    arena.enable_reverse_edges(EdgeSelector::all())?;
    Ok(arena)
}

// Class "Shape" in the root package, owning method "area" with one parameter.
fn create_class_with_method(arena: &mut Arena) -> asgraph::Result<(NodeId, NodeId, NodeId)> {
    let class = arena.create_node(NodeKind::Class)?;
    arena.set_name(class, "Shape")?;
    arena.add_edge(ROOT_PACKAGE_ID, EdgeKind::ScopeHasMember, class)?;

    let method = arena.create_node(NodeKind::Method)?;
    arena.set_name(method, "area")?;
    arena.add_edge(class, EdgeKind::ScopeHasMember, method)?;

    let param = arena.create_node(NodeKind::Parameter)?;
    arena.set_name(param, "scale")?;
    arena.add_edge(method, EdgeKind::MethodHasParameter, param)?;

    Ok((class, method, param))
}

#[derive(Clone, Default)]
struct DestroyLog(Rc<RefCell<Vec<NodeId>>>);

impl DestroyObserver for DestroyLog {
    fn on_destroy_node(&mut self, node: &Node) {
        self.0.borrow_mut().push(node.id());
    }
}

#[test]
fn test_new_arena_has_singletons() {
    let arena = Arena::new(ArenaConfig::default().with_root_package_name("<root>"));

    assert_eq!(arena.node_count(), 3);
    assert_eq!(arena.get_ref(ROOT_PACKAGE_ID).unwrap().kind(), NodeKind::Package);
    assert_eq!(arena.get_ref(FILE_SYSTEM_ID).unwrap().kind(), NodeKind::FileSystem);
    assert_eq!(arena.get_ref(ROOT_COMPONENT_ID).unwrap().kind(), NodeKind::Component);
    assert_eq!(arena.name(ROOT_PACKAGE_ID), "<root>");
    assert_eq!(arena.name(ROOT_COMPONENT_ID), "<System>");
    assert!(arena.get_is_individual(ROOT_PACKAGE_ID));
}

#[test]
fn test_create_node_returns_exact_kind_and_id() {
    let mut arena = Arena::default();

    for kind in [NodeKind::Class, NodeKind::Method, NodeKind::Attribute, NodeKind::Folder] {
        let id = arena.create_node(kind).unwrap();
        let node = arena.get_ref(id).unwrap();
        assert_eq!(node.id(), id);
        assert_eq!(node.kind(), kind);
    }
    assert!(!arena.get_exist(0));
    assert!(!arena.get_exist(1));
}

#[test]
fn test_create_node_rejects_abstract_and_interned_kinds() {
    let mut arena = Arena::default();

    let err = arena.create_node(NodeKind::Scope).unwrap_err();
    assert!(matches!(err, AsgError::InvalidNodeKind { kind: NodeKind::Scope, .. }));

    let err = arena.create_node(NodeKind::SimpleType).unwrap_err();
    assert!(matches!(err, AsgError::InvalidNodeKind { kind: NodeKind::SimpleType, .. }));

    assert!(arena.create_node(NodeKind::Comment).is_err());
}

#[test]
fn test_create_node_with_id() {
    let mut arena = Arena::default();

    let id = arena.create_node_with_id(NodeKind::Class, 500).unwrap();
    assert_eq!(id, 500);
    assert!(arena.get_exist(500));

    assert!(matches!(
        arena.create_node_with_id(NodeKind::Method, 500),
        Err(AsgError::DuplicateNodeId { id: 500 })
    ));
    assert!(matches!(
        arena.create_node_with_id(NodeKind::Method, 1),
        Err(AsgError::InvalidNodeId { id: 1 })
    ));
    assert!(matches!(
        arena.create_node_with_id(NodeKind::Member, 600),
        Err(AsgError::InvalidNodeKind { .. })
    ));
}

#[test]
fn test_create_node_with_id_outside_the_usable_range() {
    let mut arena = Arena::default();

    assert!(matches!(
        arena.create_node_with_id(NodeKind::Class, 50),
        Err(AsgError::InvalidNodeId { id: 50 })
    ));
    assert!(matches!(
        arena.create_node_with_id(NodeKind::Class, RESERVED_IDS - 1),
        Err(AsgError::InvalidNodeId { .. })
    ));
    assert!(matches!(
        arena.create_node_with_id(NodeKind::Class, MAX_NODE_ID + 1),
        Err(AsgError::InvalidNodeId { .. })
    ));
    assert!(matches!(
        arena.create_node_with_id(NodeKind::Class, ROOT_PACKAGE_ID),
        Err(AsgError::DuplicateNodeId { .. })
    ));
    assert_eq!(arena.len(), 103);
}

#[test]
fn test_len_and_is_empty_count_slots() {
    let mut arena = Arena::default();
    assert_eq!(arena.len(), 103);
    assert!(!arena.is_empty());

    arena.create_node_with_id(NodeKind::Class, 200).unwrap();
    assert_eq!(arena.len(), 201);
    assert_eq!(arena.node_count(), 4);
    assert!(!arena.is_empty());
}

#[test]
fn test_freed_ids_are_reused_oldest_first() {
    let mut arena = arena_with_reverse_edges().unwrap();
    let a = arena.create_node(NodeKind::Class).unwrap();
    let b = arena.create_node(NodeKind::Class).unwrap();
    let c = arena.create_node(NodeKind::Class).unwrap();

    arena.destroy_node(b).unwrap();
    arena.destroy_node(a).unwrap();
    assert_eq!(arena.free_ids().collect::<Vec<_>>(), vec![b, a]);

    assert_eq!(arena.create_node(NodeKind::Method).unwrap(), b);
    assert_eq!(arena.create_node(NodeKind::Method).unwrap(), a);
    assert_eq!(arena.create_node(NodeKind::Method).unwrap(), c + 1);
}

#[test]
fn test_destroy_requires_reverse_edges() {
    let mut arena = Arena::default();
    let class = arena.create_node(NodeKind::Class).unwrap();

    assert!(matches!(
        arena.destroy_node(class),
        Err(AsgError::ReverseEdgesDisabled)
    ));
    assert!(arena.get_exist(class));
}

#[test]
fn test_double_destroy_fails() {
    let mut arena = arena_with_reverse_edges().unwrap();
    let class = arena.create_node(NodeKind::Class).unwrap();

    arena.destroy_node(class).unwrap();
    assert!(matches!(
        arena.destroy_node(class),
        Err(AsgError::NodeDoesNotExist { id }) if id == class
    ));
}

#[test]
fn test_destroy_removes_owned_subtree() {
    let mut arena = arena_with_reverse_edges().unwrap();
    let (class, method, param) = create_class_with_method(&mut arena).unwrap();

    let destroyed = arena.destroy_node(class).unwrap();

    assert_eq!(destroyed, vec![class, method, param]);
    for id in [class, method, param] {
        assert!(!arena.get_exist(id));
    }
    let root = arena.get_ref(ROOT_PACKAGE_ID).unwrap();
    assert!(root.edges(EdgeKind::ScopeHasMember).is_empty());
}

#[test]
fn test_destroy_removes_dangling_references() {
    let mut arena = arena_with_reverse_edges().unwrap();
    let (_, method, _) = create_class_with_method(&mut arena).unwrap();
    let caller = arena.create_node(NodeKind::Method).unwrap();
    let call = arena.create_method_call(method).unwrap();
    arena.add_edge(caller, EdgeKind::MethodCalls, call).unwrap();

    arena.destroy_node(method).unwrap();

    assert_eq!(arena.get_ref(call).unwrap().single(EdgeKind::MethodCallMethod), None);
    assert_eq!(
        arena.get_ref(caller).unwrap().targets(EdgeKind::MethodCalls).collect::<Vec<_>>(),
        vec![call]
    );
}

#[test]
fn test_destroy_this_node_only_keeps_children() {
    let mut arena = arena_with_reverse_edges().unwrap();
    let (class, method, param) = create_class_with_method(&mut arena).unwrap();

    arena.destroy_this_node_only(class).unwrap();

    assert!(!arena.get_exist(class));
    assert!(arena.get_is_individual(method));
    assert_eq!(arena.get_ref(param).unwrap().parent(), Some(method));
}

#[test]
fn test_destroy_observers_see_every_node() {
    let mut arena = arena_with_reverse_edges().unwrap();
    let (class, method, param) = create_class_with_method(&mut arena).unwrap();
    let log = DestroyLog::default();
    let handle = arena.register_destroy_observer(Box::new(log.clone()));

    arena.destroy_node(class).unwrap();
    assert_eq!(*log.0.borrow(), vec![class, method, param]);

    assert!(arena.unregister_destroy_observer(handle).is_some());
    let other = arena.create_node(NodeKind::Class).unwrap();
    arena.destroy_node(other).unwrap();
    assert_eq!(log.0.borrow().len(), 3);
}

#[test]
fn test_clear_notifies_and_keeps_observers() {
    let mut arena = Arena::default();
    create_class_with_method(&mut arena).unwrap();
    let log = DestroyLog::default();
    arena.register_destroy_observer(Box::new(log.clone()));

    arena.clear();

    assert_eq!(log.0.borrow().len(), 6);
    assert_eq!(arena.node_count(), 3);

    arena.enable_reverse_edges(EdgeSelector::all()).unwrap();
    let class = arena.create_node(NodeKind::Class).unwrap();
    arena.destroy_node(class).unwrap();
    assert_eq!(log.0.borrow().len(), 7);
}

#[test]
fn test_owning_edge_sets_parent_once() {
    let mut arena = Arena::default();
    let (class, method, _) = create_class_with_method(&mut arena).unwrap();
    let other = arena.create_node(NodeKind::Class).unwrap();

    assert_eq!(arena.get_ref(method).unwrap().parent(), Some(class));
    assert!(matches!(
        arena.add_edge(other, EdgeKind::ScopeHasMember, method),
        Err(AsgError::AlreadyOwned { parent, .. }) if parent == class
    ));

    assert!(arena.remove_edge(class, EdgeKind::ScopeHasMember, method).unwrap());
    assert!(arena.get_is_individual(method));
    arena.add_edge(other, EdgeKind::ScopeHasMember, method).unwrap();
    assert_eq!(arena.get_ref(method).unwrap().parent(), Some(other));
}

#[test]
fn test_ownership_cycle_is_rejected() {
    let mut arena = Arena::default();
    let outer = arena.create_node(NodeKind::Package).unwrap();
    let inner = arena.create_node(NodeKind::Package).unwrap();
    arena.add_edge(outer, EdgeKind::ScopeHasMember, inner).unwrap();

    assert!(matches!(
        arena.add_edge(inner, EdgeKind::ScopeHasMember, outer),
        Err(AsgError::InvalidEdge { .. })
    ));
}

#[test]
fn test_edge_validation() {
    let mut arena = Arena::default();
    let class = arena.create_node(NodeKind::Class).unwrap();
    let file = arena.create_file("Shape.java").unwrap();

    // source kind does not carry the edge
    assert!(matches!(
        arena.add_edge(file, EdgeKind::ScopeHasMember, class),
        Err(AsgError::InvalidEdge { .. })
    ));
    // target kind does not match
    assert!(matches!(
        arena.add_edge(class, EdgeKind::ClassIsSubclass, file),
        Err(AsgError::InvalidEdge { .. })
    ));
    // missing association data
    assert!(matches!(
        arena.add_edge(class, EdgeKind::MemberIsContainedIn, file),
        Err(AsgError::InvalidEdge { .. })
    ));
    assert!(matches!(
        arena.add_edge(class, EdgeKind::ClassIsSubclass, 9_999),
        Err(AsgError::InvalidNodeId { id: 9_999 })
    ));
}

#[test]
fn test_single_edges_replace_and_set_edges_dedup() {
    let mut arena = Arena::default();
    let int = arena.create_simple_type(SimpleTypeKind::Int);
    let long = arena.create_simple_type(SimpleTypeKind::Long);
    let int_former = arena.create_type_former_type(int).unwrap();
    let long_former = arena.create_type_former_type(long).unwrap();
    let int_type = arena.create_type(&[int_former]).unwrap();
    let long_type = arena.create_type(&[long_former]).unwrap();

    let param = arena.create_node(NodeKind::Parameter).unwrap();
    arena.add_edge(param, EdgeKind::ParameterHasType, int_type).unwrap();
    arena.add_edge(param, EdgeKind::ParameterHasType, long_type).unwrap();
    assert_eq!(
        arena.get_ref(param).unwrap().single(EdgeKind::ParameterHasType),
        Some(long_type)
    );

    let a = arena.create_file("a.c").unwrap();
    let b = arena.create_file("b.h").unwrap();
    arena.add_edge(a, EdgeKind::FileIncludes, b).unwrap();
    arena.add_edge(a, EdgeKind::FileIncludes, b).unwrap();
    assert_eq!(arena.get_ref(a).unwrap().edges(EdgeKind::FileIncludes).len(), 1);
}

#[test]
fn test_replace_node_upgrades_in_place() {
    let mut arena = Arena::default();
    let (class, method, _) = create_class_with_method(&mut arena).unwrap();

    assert_eq!(arena.replace_node(class).unwrap(), NodeKind::ClassGeneric);

    let node = arena.get_ref(class).unwrap();
    assert_eq!(node.kind(), NodeKind::ClassGeneric);
    assert!(node.is_a(NodeKind::Class));
    assert_eq!(arena.name(class), "Shape");
    assert_eq!(
        node.targets(EdgeKind::ScopeHasMember).collect::<Vec<_>>(),
        vec![method]
    );

    let generic_param = arena.create_node(NodeKind::GenericParameter).unwrap();
    arena
        .add_edge(class, EdgeKind::ClassGenericHasGenericParameter, generic_param)
        .unwrap();

    assert!(matches!(
        arena.replace_node(ROOT_PACKAGE_ID),
        Err(AsgError::ReplaceUnsupported { .. })
    ));
}

#[test]
fn test_scalar_fields_through_node_data() {
    let mut arena = Arena::default();
    let (_, method, _) = create_class_with_method(&mut arena).unwrap();

    if let NodeData::Method(data) = arena.get_mut(method).unwrap().data_mut() {
        data.is_virtual = true;
        data.num_statements = 12;
        data.member.is_static = true;
    }

    let data = arena.get_ref(method).unwrap().data();
    assert!(data.member().unwrap().is_static);
    match data {
        NodeData::Method(fields) => {
            assert!(fields.is_virtual);
            assert_eq!(fields.num_statements, 12);
        }
        other => panic!("unexpected data {other:?}"),
    }
}

#[test]
fn test_swap_string_table_rekeys_nodes() {
    let mut arena = Arena::default();
    let (class, method, _) = create_class_with_method(&mut arena).unwrap();

    let mut fresh = StringTable::new();
    fresh.set("unrelated");
    fresh.set("another");
    let old = arena.swap_string_table(fresh);

    assert!(old.find("Shape").is_some());
    assert_eq!(arena.name(class), "Shape");
    assert_eq!(arena.name(method), "area");
    assert_eq!(arena.string_table().find("unrelated"), Some(1));
}

#[test]
fn test_iter_skips_filtered_nodes() {
    let mut arena = Arena::default();
    let (class, _, _) = create_class_with_method(&mut arena).unwrap();

    arena.set_filtered(class).unwrap();
    assert_eq!(arena.iter().count(), arena.node_count() - 1);

    arena.turn_filter_off();
    assert_eq!(arena.iter().count(), arena.node_count());
}
