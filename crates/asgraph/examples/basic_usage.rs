//! Basic usage example
//!
//! Builds a small Java model, prints it with a visitor, saves it compressed
//! and loads it back.

use asgraph::{
    AlgorithmPreorder, Arena, ArenaConfig, Assoc, EdgeKind, EdgeSelector, Language, Node,
    NodeKind, SaveOptions, SimpleTypeKind, SourcePosition, VisitContext, Visitor,
};

/// Prints named nodes indented by depth.
struct Printer;

impl Visitor for Printer {
    fn visit(&mut self, node: &Node, ctx: &mut VisitContext<'_>) {
        let name = ctx.arena().name(node.id());
        if !name.is_empty() {
            println!("{}{} {name} ({})", "  ".repeat(ctx.depth()), node.kind(), node.id());
        }
    }
}

fn main() -> asgraph::Result<()> {
    let mut arena = Arena::new(ArenaConfig::for_language(Language::Java));

    let package = arena.create_node(NodeKind::Package)?;
    arena.set_name(package, "com.example")?;
    arena.add_edge(arena.root_package(), EdgeKind::ScopeHasMember, package)?;

    let class = arena.create_node(NodeKind::Class)?;
    arena.set_name(class, "Counter")?;
    arena.add_edge(package, EdgeKind::ScopeHasMember, class)?;

    let int = arena.create_simple_type(SimpleTypeKind::Int);
    let former = arena.create_type_former_type(int)?;
    let int_type = arena.create_type(&[former])?;

    let count = arena.create_node(NodeKind::Attribute)?;
    arena.set_name(count, "count")?;
    arena.add_edge(class, EdgeKind::ScopeHasMember, count)?;
    arena.add_edge(count, EdgeKind::AttributeHasType, int_type)?;

    let increment = arena.create_node(NodeKind::Method)?;
    arena.set_name(increment, "increment")?;
    arena.add_edge(class, EdgeKind::ScopeHasMember, increment)?;
    arena.add_edge(increment, EdgeKind::MethodReturns, int_type)?;
    let access = arena.create_attribute_access(count)?;
    arena.add_edge(increment, EdgeKind::MethodAccessesAttribute, access)?;

    let file = arena.create_file("src/com/example/Counter.java")?;
    let position = SourcePosition {
        line: 1,
        column: 1,
        end_line: 12,
        end_column: 2,
    };
    arena.add_edge_with(class, EdgeKind::MemberIsContainedIn, file, Assoc::Position(position))?;

    println!("Model ({} nodes):", arena.node_count());
    AlgorithmPreorder::new()
        .set_visit_special_nodes(false, false)
        .run_from(&arena, arena.root_package(), &mut [&mut Printer])?;

    arena.enable_reverse_edges(EdgeSelector::edges(&[EdgeKind::MethodReturns]))?;
    let returners = arena.reverse_edges()?.sources(int_type, EdgeKind::MethodReturns).count();
    println!("\n{returners} method(s) return int");

    let path = std::env::temp_dir().join("counter.zsi");
    arena.save(&path, SaveOptions::compressed())?;
    println!("✓ Saved to {}", path.display());

    let mut loaded = Arena::new(ArenaConfig::for_language(Language::Java));
    loaded.load(&path)?;
    println!("✓ Loaded {} nodes back", loaded.node_count());

    Ok(())
}
