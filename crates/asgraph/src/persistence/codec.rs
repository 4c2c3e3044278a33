//! Binary layout of a single node: id, kind, packed scalars, then every edge
//! list in schema order.
//!
//! Single edges are one target id (0 for "unset"). List and set edges are a
//! sequence of targets closed by a 0. Association data follows its target.

use crate::algorithms::{VisitContext, Visitor};
use crate::error::{AsgError, Result};
use crate::graph::{
    Assoc, EdgeTarget, MemberFields, NamedFields, Node, NodeData, NodeId, ScopeFields,
    SourcePosition,
};
use crate::schema::{AssocKind, EdgeKind, Multiplicity, NodeKind, ParameterKind};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

type Le = LittleEndian;

const FLAG_STATIC: u8 = 0b01;
const FLAG_COMPILER_GENERATED: u8 = 0b10;
const FLAG_ABSTRACT: u8 = 0b01;
const FLAG_VIRTUAL: u8 = 0b10;

/// A decoded node before it is placed into an arena.
pub(crate) struct NodeRecord {
    pub data: NodeData,
    pub edges: Vec<(EdgeKind, EdgeTarget)>,
}

/// Visitor appending every visited node to a byte buffer.
#[derive(Default)]
pub(crate) struct NodeWriter {
    pub out: Vec<u8>,
    pub written: usize,
    pub error: Option<AsgError>,
}

impl Visitor for NodeWriter {
    fn visit(&mut self, node: &Node, ctx: &mut VisitContext<'_>) {
        match write_node(&mut self.out, node) {
            Ok(()) => self.written += 1,
            Err(e) => {
                self.error = Some(e);
                ctx.stop();
            }
        }
    }
}

pub(crate) fn write_node<W: Write>(out: &mut W, node: &Node) -> Result<()> {
    out.write_u32::<Le>(node.id())?;
    out.write_u16::<Le>(node.kind().code())?;
    write_data(out, node.data())?;

    for &kind in node.kind().edge_kinds() {
        let edges = node.edges(kind);
        match kind.info().multiplicity {
            Multiplicity::One => match edges.first() {
                Some(edge) => {
                    out.write_u32::<Le>(edge.target)?;
                    write_assoc(out, &edge.assoc)?;
                }
                None => out.write_u32::<Le>(0)?,
            },
            Multiplicity::List | Multiplicity::Set => {
                for edge in edges {
                    out.write_u32::<Le>(edge.target)?;
                    write_assoc(out, &edge.assoc)?;
                }
                out.write_u32::<Le>(0)?;
            }
        }
    }
    Ok(())
}

/// Read the scalars and edges of a node whose id and kind were already read.
pub(crate) fn read_node<R: Read>(input: &mut R, kind: NodeKind) -> Result<NodeRecord> {
    let data = read_data(input, kind)?;
    let mut edges = Vec::new();

    for &edge_kind in kind.edge_kinds() {
        let info = edge_kind.info();
        loop {
            let target: NodeId = input.read_u32::<Le>()?;
            if target == 0 {
                break;
            }
            let assoc = read_assoc(input, info.assoc)?;
            edges.push((edge_kind, EdgeTarget { target, assoc }));
            if info.multiplicity == Multiplicity::One {
                break;
            }
        }
    }
    Ok(NodeRecord { data, edges })
}

fn write_assoc<W: Write>(out: &mut W, assoc: &Assoc) -> Result<()> {
    match assoc {
        Assoc::None => {}
        Assoc::Text(key) => out.write_u32::<Le>(*key)?,
        Assoc::Position(pos) => {
            out.write_u32::<Le>(pos.line)?;
            out.write_u32::<Le>(pos.column)?;
            out.write_u32::<Le>(pos.end_line)?;
            out.write_u32::<Le>(pos.end_column)?;
        }
        Assoc::Parameter(kind) => out.write_u8(kind.code())?,
    }
    Ok(())
}

fn read_assoc<R: Read>(input: &mut R, kind: AssocKind) -> Result<Assoc> {
    Ok(match kind {
        AssocKind::None => Assoc::None,
        AssocKind::Text => Assoc::Text(input.read_u32::<Le>()?),
        AssocKind::Position => Assoc::Position(SourcePosition {
            line: input.read_u32::<Le>()?,
            column: input.read_u32::<Le>()?,
            end_line: input.read_u32::<Le>()?,
            end_column: input.read_u32::<Le>()?,
        }),
        AssocKind::ParameterKind => {
            Assoc::Parameter(read_code(input, ParameterKind::from_code, "parameter kind")?)
        }
    })
}

fn write_named<W: Write>(out: &mut W, named: &NamedFields) -> Result<()> {
    out.write_u32::<Le>(named.name)?;
    Ok(())
}

fn read_named<R: Read>(input: &mut R) -> Result<NamedFields> {
    Ok(NamedFields {
        name: input.read_u32::<Le>()?,
    })
}

fn write_member<W: Write>(out: &mut W, member: &MemberFields) -> Result<()> {
    let mut flags = 0;
    if member.is_static {
        flags |= FLAG_STATIC;
    }
    if member.is_compiler_generated {
        flags |= FLAG_COMPILER_GENERATED;
    }
    out.write_u8(member.accessibility.code())?;
    out.write_u8(flags)?;
    out.write_u32::<Le>(member.comment_lines)?;
    out.write_u32::<Le>(member.mangled_name)?;
    out.write_u32::<Le>(member.demangled_name)?;
    Ok(())
}

fn read_member<R: Read>(input: &mut R) -> Result<MemberFields> {
    use crate::schema::AccessibilityKind;
    let accessibility = read_code(input, AccessibilityKind::from_code, "accessibility")?;
    let flags = input.read_u8()?;
    Ok(MemberFields {
        accessibility,
        is_static: flags & FLAG_STATIC != 0,
        is_compiler_generated: flags & FLAG_COMPILER_GENERATED != 0,
        comment_lines: input.read_u32::<Le>()?,
        mangled_name: input.read_u32::<Le>()?,
        demangled_name: input.read_u32::<Le>()?,
    })
}

fn write_scope<W: Write>(out: &mut W, scope: &ScopeFields) -> Result<()> {
    out.write_u8(scope.is_anonymous as u8)?;
    out.write_u32::<Le>(scope.lloc)?;
    Ok(())
}

fn read_scope<R: Read>(input: &mut R) -> Result<ScopeFields> {
    Ok(ScopeFields {
        is_anonymous: input.read_u8()? != 0,
        lloc: input.read_u32::<Le>()?,
    })
}

fn write_data<W: Write>(out: &mut W, data: &NodeData) -> Result<()> {
    match data {
        NodeData::Comment { text } => out.write_u32::<Le>(*text)?,
        NodeData::Friendship { grantor } => out.write_u32::<Le>(*grantor)?,
        NodeData::MethodCall { calls } => out.write_u32::<Le>(*calls)?,
        NodeData::Component(named) | NodeData::FileSystem(named) | NodeData::Folder(named) => {
            write_named(out, named)?
        }
        NodeData::Attribute(d) => {
            write_named(out, &d.named)?;
            write_member(out, &d.member)?;
        }
        NodeData::Class(d) | NodeData::ClassGeneric(d) => {
            write_named(out, &d.named)?;
            write_member(out, &d.member)?;
            write_scope(out, &d.scope)?;
            out.write_u8(d.class_kind.code())?;
            out.write_u8(d.is_abstract as u8)?;
        }
        NodeData::Method(d) | NodeData::MethodGeneric(d) => {
            write_named(out, &d.named)?;
            write_member(out, &d.member)?;
            write_scope(out, &d.scope)?;
            let mut flags = 0;
            if d.is_abstract {
                flags |= FLAG_ABSTRACT;
            }
            if d.is_virtual {
                flags |= FLAG_VIRTUAL;
            }
            out.write_u8(d.method_kind.code())?;
            out.write_u8(flags)?;
            out.write_u32::<Le>(d.num_statements)?;
        }
        NodeData::Package(d) => {
            write_named(out, &d.named)?;
            write_member(out, &d.member)?;
            write_scope(out, &d.scope)?;
            out.write_u8(d.package_kind.code())?;
        }
        NodeData::Parameter(d) => {
            write_named(out, &d.named)?;
            out.write_u8(d.param_kind.code())?;
        }
        NodeData::GenericParameter(d) => {
            write_named(out, &d.named)?;
            out.write_u8(d.generic_parameter_kind.code())?;
        }
        NodeData::File(d) => {
            write_named(out, &d.named)?;
            out.write_u32::<Le>(d.loc)?;
        }
        NodeData::SimpleType(kind) => out.write_u8(kind.code())?,
        NodeData::TypeFormerPointer(kind) => out.write_u8(kind.code())?,
        NodeData::ControlFlowBlock
        | NodeData::AttributeAccess
        | NodeData::Type
        | NodeData::TypeFormerArray
        | NodeData::TypeFormerMethod
        | NodeData::TypeFormerNonType
        | NodeData::TypeFormerType => {}
    }
    Ok(())
}

fn read_data<R: Read>(input: &mut R, kind: NodeKind) -> Result<NodeData> {
    use crate::schema::{
        ClassKind, GenericParameterKind, MethodKind, PackageKind, PointerKind, SimpleTypeKind,
    };

    let mut data = NodeData::new(kind).ok_or_else(|| {
        AsgError::corrupt(format!("abstract kind {kind} in node stream"))
    })?;
    match &mut data {
        NodeData::Comment { text } => *text = input.read_u32::<Le>()?,
        NodeData::Friendship { grantor } => *grantor = input.read_u32::<Le>()?,
        NodeData::MethodCall { calls } => *calls = input.read_u32::<Le>()?,
        NodeData::Component(named) | NodeData::FileSystem(named) | NodeData::Folder(named) => {
            *named = read_named(input)?
        }
        NodeData::Attribute(d) => {
            d.named = read_named(input)?;
            d.member = read_member(input)?;
        }
        NodeData::Class(d) | NodeData::ClassGeneric(d) => {
            d.named = read_named(input)?;
            d.member = read_member(input)?;
            d.scope = read_scope(input)?;
            d.class_kind = read_code(input, ClassKind::from_code, "class kind")?;
            d.is_abstract = input.read_u8()? != 0;
        }
        NodeData::Method(d) | NodeData::MethodGeneric(d) => {
            d.named = read_named(input)?;
            d.member = read_member(input)?;
            d.scope = read_scope(input)?;
            d.method_kind = read_code(input, MethodKind::from_code, "method kind")?;
            let flags = input.read_u8()?;
            d.is_abstract = flags & FLAG_ABSTRACT != 0;
            d.is_virtual = flags & FLAG_VIRTUAL != 0;
            d.num_statements = input.read_u32::<Le>()?;
        }
        NodeData::Package(d) => {
            d.named = read_named(input)?;
            d.member = read_member(input)?;
            d.scope = read_scope(input)?;
            d.package_kind = read_code(input, PackageKind::from_code, "package kind")?;
        }
        NodeData::Parameter(d) => {
            d.named = read_named(input)?;
            d.param_kind = read_code(input, ParameterKind::from_code, "parameter kind")?;
        }
        NodeData::GenericParameter(d) => {
            d.named = read_named(input)?;
            d.generic_parameter_kind =
                read_code(input, GenericParameterKind::from_code, "generic parameter kind")?;
        }
        NodeData::File(d) => {
            d.named = read_named(input)?;
            d.loc = input.read_u32::<Le>()?;
        }
        NodeData::SimpleType(k) => {
            *k = read_code(input, SimpleTypeKind::from_code, "simple type kind")?
        }
        NodeData::TypeFormerPointer(k) => {
            *k = read_code(input, PointerKind::from_code, "pointer kind")?
        }
        NodeData::ControlFlowBlock
        | NodeData::AttributeAccess
        | NodeData::Type
        | NodeData::TypeFormerArray
        | NodeData::TypeFormerMethod
        | NodeData::TypeFormerNonType
        | NodeData::TypeFormerType => {}
    }
    Ok(data)
}

fn read_code<R: Read, T>(input: &mut R, decode: fn(u8) -> Option<T>, what: &str) -> Result<T> {
    let code = input.read_u8()?;
    decode(code).ok_or_else(|| AsgError::corrupt(format!("unknown {what} code {code}")))
}
