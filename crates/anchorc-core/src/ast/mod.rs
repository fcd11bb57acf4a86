//! Abstract syntax tree.
//!
//! A single tagged `Node` enum covers every construct: declarations,
//! statements, expressions, and type expressions. Everything is
//! arena-allocated and child nodes are `&'a Node<'a>` references, so the
//! whole tree (and everything reachable from it) dies with the arena.
//!
//! `resolved_type` is the analyzer's back-pointer: `None` until pass 3
//! or 4 fills it in, `Some` afterward. It lives on every node that can
//! carry a type rather than only on expressions, because type nodes
//! themselves get resolved into concrete `Type`s during pass 3.

pub mod expression;
pub mod statement;
pub mod types;

use std::cell::Cell;

use crate::sema::type_registry::Type;
use crate::span::Span;

pub use expression::*;
pub use statement::*;
pub use types::*;

/// Slot for the analyzer's resolved-type back-pointer. A `Cell` because
/// passes mutate it through a shared `&Node` — the tree is built once
/// and then annotated in place by later passes, never restructured.
pub type ResolvedTypeSlot<'a> = Cell<Option<&'a Type<'a>>>;

pub fn empty_resolved_type<'a>() -> ResolvedTypeSlot<'a> {
    Cell::new(None)
}

/// Slot used only on `Call`/`MethodCall` nodes whose callee resolved to a
/// generic instantiation. `resolved_type` already carries the call's
/// *return* type, which isn't enough to tell the backend which mangled
/// symbol to invoke — this is where monomorphization leaves that name
///.
pub type MangledSlot<'a> = Cell<Option<&'a str>>;

#[derive(Debug)]
pub struct Node<'a> {
    pub span: Span,
    pub resolved_type: ResolvedTypeSlot<'a>,
    pub mangled: MangledSlot<'a>,
    pub kind: NodeKind<'a>,
}

impl<'a> Node<'a> {
    pub fn new(span: Span, kind: NodeKind<'a>) -> Self {
        Node {
            span,
            resolved_type: empty_resolved_type(),
            mangled: Cell::new(None),
            kind,
        }
    }
}

#[derive(Debug)]
pub enum NodeKind<'a> {
    Program(Program<'a>),

    ImportDecl(ImportDecl<'a>),
    ConstDecl(ConstDecl<'a>),
    VarDecl(VarDecl<'a>),
    FuncDecl(FuncDecl<'a>),
    StructDecl(StructDecl<'a>),
    InterfaceDecl(InterfaceDecl<'a>),
    EnumDecl(EnumDecl<'a>),

    Stmt(Stmt<'a>),
    Expr(Expr<'a>),
    TypeExpr(TypeExpr<'a>),
}

#[derive(Debug)]
pub struct Program<'a> {
    pub declarations: Vec<&'a Node<'a>>,
}

#[derive(Debug)]
pub struct ImportName<'a> {
    pub name: &'a str,
    pub span: Span,
}

#[derive(Debug)]
pub struct ImportDecl<'a> {
    pub is_export: bool,
    pub module_path: &'a str,
    pub names: Vec<ImportName<'a>>,
}

#[derive(Debug)]
pub struct ConstDecl<'a> {
    pub is_export: bool,
    pub name: &'a str,
    pub type_node: Option<&'a Node<'a>>,
    pub value: &'a Node<'a>,
}

#[derive(Debug)]
pub struct VarDecl<'a> {
    pub is_export: bool,
    pub name: &'a str,
    pub type_node: Option<&'a Node<'a>>,
    pub value: Option<&'a Node<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct TypeParam<'a> {
    pub name: &'a str,
}

#[derive(Debug)]
pub struct Param<'a> {
    pub name: &'a str,
    pub type_node: &'a Node<'a>,
    pub span: Span,
}

#[derive(Debug)]
pub struct FuncDecl<'a> {
    pub is_export: bool,
    pub is_extern: bool,
    pub name: &'a str,
    pub type_params: Vec<TypeParam<'a>>,
    pub params: Vec<Param<'a>>,
    pub return_type: Option<&'a Node<'a>>,
    pub body: Vec<&'a Node<'a>>,
}

impl<'a> FuncDecl<'a> {
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

#[derive(Debug)]
pub struct Field<'a> {
    pub name: &'a str,
    pub type_node: &'a Node<'a>,
    pub span: Span,
}

#[derive(Debug)]
pub struct StructDecl<'a> {
    pub is_export: bool,
    pub name: &'a str,
    pub type_params: Vec<TypeParam<'a>>,
    pub fields: Vec<Field<'a>>,
    pub methods: Vec<&'a Node<'a>>,
}

impl<'a> StructDecl<'a> {
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

#[derive(Debug)]
pub struct InterfaceDecl<'a> {
    pub name: &'a str,
    pub method_sigs: Vec<&'a Node<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct EnumVariant<'a> {
    pub name: &'a str,
    pub span: Span,
}

#[derive(Debug)]
pub struct EnumDecl<'a> {
    pub is_export: bool,
    pub name: &'a str,
    pub variants: Vec<EnumVariant<'a>>,
}
