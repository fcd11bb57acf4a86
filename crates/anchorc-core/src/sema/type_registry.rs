//! Resolved types, as distinct from the surface
//! `ast::TypeExpr` syntax that produces them.
//!
//! Primitives are singletons owned by `TypeRegistry`, so two fetches of
//! `int` are the same arena allocation; `type_equals` can therefore use
//! pointer identity for them instead of a `match`. Compound kinds
//! (`&T`, `*T`, arrays, slices) are allocated fresh per occurrence and
//! compared structurally. Named types — struct, interface, enum, and
//! (per this registry's contract) func — are compared by pointer
//! identity, so a function type is only equal to the exact instance it
//! was built from; nothing deduplicates them on the way in.

use std::fmt;

use crate::ast::{Field, FuncDecl, Node, NodeKind};

#[derive(Debug)]
pub struct StructType<'a> {
    pub name: &'a str,
    pub module_name: &'a str,
    pub decl: &'a Node<'a>,
}

impl<'a> StructType<'a> {
    /// Fields and methods live on the declaration node, not duplicated
    /// onto the type — a struct's type and its declaration share one
    /// arena lifetime, so borrowing through the back-pointer is safe and
    /// avoids a second copy of the member lists.
    pub fn struct_decl(&self) -> &'a crate::ast::StructDecl<'a> {
        match &self.decl.kind {
            NodeKind::StructDecl(s) => s,
            _ => unreachable!("StructType::decl must point at a StructDecl node"),
        }
    }

    pub fn find_field(&self, name: &str) -> Option<&'a Field<'a>> {
        self.struct_decl().fields.iter().find(|f| f.name == name)
    }

    pub fn find_method(&self, name: &str) -> Option<&'a Node<'a>> {
        self.struct_decl()
            .methods
            .iter()
            .copied()
            .find(|m| matches!(&m.kind, NodeKind::FuncDecl(f) if f.name == name))
    }
}

#[derive(Debug)]
pub struct InterfaceType<'a> {
    pub name: &'a str,
    pub module_name: &'a str,
    pub decl: &'a Node<'a>,
}

impl<'a> InterfaceType<'a> {
    pub fn interface_decl(&self) -> &'a crate::ast::InterfaceDecl<'a> {
        match &self.decl.kind {
            NodeKind::InterfaceDecl(i) => i,
            _ => unreachable!("InterfaceType::decl must point at an InterfaceDecl node"),
        }
    }

    pub fn method_sigs(&self) -> &[&'a Node<'a>] {
        &self.interface_decl().method_sigs
    }
}

pub fn as_func_decl<'a>(node: &'a Node<'a>) -> &'a FuncDecl<'a> {
    match &node.kind {
        NodeKind::FuncDecl(f) => f,
        _ => unreachable!("expected a FuncDecl node"),
    }
}

pub fn struct_decl_of<'a>(node: &'a Node<'a>) -> &'a crate::ast::StructDecl<'a> {
    match &node.kind {
        NodeKind::StructDecl(s) => s,
        _ => unreachable!("expected a StructDecl node"),
    }
}

pub fn interface_decl_of<'a>(node: &'a Node<'a>) -> &'a crate::ast::InterfaceDecl<'a> {
    match &node.kind {
        NodeKind::InterfaceDecl(i) => i,
        _ => unreachable!("expected an InterfaceDecl node"),
    }
}

pub fn enum_decl_of<'a>(node: &'a Node<'a>) -> &'a crate::ast::EnumDecl<'a> {
    match &node.kind {
        NodeKind::EnumDecl(e) => e,
        _ => unreachable!("expected an EnumDecl node"),
    }
}

#[derive(Debug)]
pub struct EnumType<'a> {
    pub name: &'a str,
    pub module_name: &'a str,
    pub decl: &'a Node<'a>,
}

impl<'a> EnumType<'a> {
    pub fn enum_decl(&self) -> &'a crate::ast::EnumDecl<'a> {
        match &self.decl.kind {
            NodeKind::EnumDecl(e) => e,
            _ => unreachable!("EnumType::decl must point at an EnumDecl node"),
        }
    }

    pub fn has_variant(&self, name: &str) -> bool {
        self.enum_decl().variants.iter().any(|v| v.name == name)
    }
}

#[derive(Debug)]
pub struct FuncType<'a> {
    pub params: Vec<&'a Type<'a>>,
    pub return_type: &'a Type<'a>,
}

#[derive(Debug)]
pub enum Type<'a> {
    Void,
    Bool,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Isize,
    Usize,
    Float,
    Double,
    String,
    Struct(&'a StructType<'a>),
    Interface(&'a InterfaceType<'a>),
    Enum(&'a EnumType<'a>),
    Func(&'a FuncType<'a>),
    Ref(&'a Type<'a>),
    Ptr(&'a Type<'a>),
    Array(&'a Type<'a>, u64),
    Slice(&'a Type<'a>),
}

impl<'a> Type<'a> {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Type::Byte
                | Type::Short
                | Type::UShort
                | Type::Int
                | Type::UInt
                | Type::Long
                | Type::ULong
                | Type::Isize
                | Type::Usize
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Type::Float | Type::Double)
    }

    pub fn is_pointer_like(&self) -> bool {
        matches!(self, Type::Ptr(_) | Type::Ref(_))
    }

    /// Rank used for implicit widening checks. `None` for non-integer
    /// types.
    pub fn integer_rank(&self) -> Option<u8> {
        Some(match self {
            Type::Byte => 1,
            Type::Short | Type::UShort => 2,
            Type::Int | Type::UInt => 3,
            Type::Long | Type::ULong | Type::Isize | Type::Usize => 4,
            _ => return None,
        })
    }

    /// Widening is allowed from `from` to `to` when both are integers and
    /// `rank(from) <= rank(to)`; narrowing is not permitted implicitly.
    pub fn integer_convertible(from: &Type<'a>, to: &Type<'a>) -> bool {
        match (from.integer_rank(), to.integer_rank()) {
            (Some(a), Some(b)) => a <= b,
            _ => false,
        }
    }
}

/// Structural comparison on `&T`/`*T`/arrays/slices, pointer identity on
/// everything else (primitives included, since they're singletons).
impl<'a> PartialEq for Type<'a> {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        match (self, other) {
            (Type::Void, Type::Void)
            | (Type::Bool, Type::Bool)
            | (Type::Byte, Type::Byte)
            | (Type::Short, Type::Short)
            | (Type::UShort, Type::UShort)
            | (Type::Int, Type::Int)
            | (Type::UInt, Type::UInt)
            | (Type::Long, Type::Long)
            | (Type::ULong, Type::ULong)
            | (Type::Isize, Type::Isize)
            | (Type::Usize, Type::Usize)
            | (Type::Float, Type::Float)
            | (Type::Double, Type::Double)
            | (Type::String, Type::String) => true,
            (Type::Ref(a), Type::Ref(b)) => a == b,
            (Type::Ptr(a), Type::Ptr(b)) => a == b,
            (Type::Array(a, sa), Type::Array(b, sb)) => sa == sb && a == b,
            (Type::Slice(a), Type::Slice(b)) => a == b,
            (Type::Struct(a), Type::Struct(b)) => std::ptr::eq(*a, *b),
            (Type::Interface(a), Type::Interface(b)) => std::ptr::eq(*a, *b),
            (Type::Enum(a), Type::Enum(b)) => std::ptr::eq(*a, *b),
            (Type::Func(a), Type::Func(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

impl<'a> fmt::Display for Type<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Byte => write!(f, "byte"),
            Type::Short => write!(f, "short"),
            Type::UShort => write!(f, "ushort"),
            Type::Int => write!(f, "int"),
            Type::UInt => write!(f, "uint"),
            Type::Long => write!(f, "long"),
            Type::ULong => write!(f, "ulong"),
            Type::Isize => write!(f, "isize"),
            Type::Usize => write!(f, "usize"),
            Type::Float => write!(f, "float"),
            Type::Double => write!(f, "double"),
            Type::String => write!(f, "string"),
            Type::Struct(s) => write!(f, "{}", s.name),
            Type::Interface(i) => write!(f, "{}", i.name),
            Type::Enum(e) => write!(f, "{}", e.name),
            Type::Func(func) => {
                write!(f, "(")?;
                for (i, p) in func.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {}", func.return_type)
            }
            Type::Ref(inner) => write!(f, "&{inner}"),
            Type::Ptr(inner) => write!(f, "*{inner}"),
            Type::Array(inner, size) => write!(f, "{inner}[{size}]"),
            Type::Slice(inner) => write!(f, "{inner}[]"),
        }
    }
}

/// Renders a `Type` into a C-identifier-safe fragment, used both to build
/// a generic instantiation's mangled suffix (`base__arg1__arg2…`) and to
/// rewrite a type-parameter name in a monomorphized AST to its concrete
/// type's name. Unlike `Display`, this never emits `&`, `*`, `[`, or `]`.
pub fn mangle_fragment(ty: &Type<'_>) -> String {
    match ty {
        Type::Void => "void".to_string(),
        Type::Bool => "bool".to_string(),
        Type::Byte => "byte".to_string(),
        Type::Short => "short".to_string(),
        Type::UShort => "ushort".to_string(),
        Type::Int => "int".to_string(),
        Type::UInt => "uint".to_string(),
        Type::Long => "long".to_string(),
        Type::ULong => "ulong".to_string(),
        Type::Isize => "isize".to_string(),
        Type::Usize => "usize".to_string(),
        Type::Float => "float".to_string(),
        Type::Double => "double".to_string(),
        Type::String => "string".to_string(),
        Type::Struct(s) => s.name.to_string(),
        Type::Interface(i) => i.name.to_string(),
        Type::Enum(e) => e.name.to_string(),
        Type::Func(_) => "fn".to_string(),
        Type::Ref(inner) => format!("ref_{}", mangle_fragment(inner)),
        Type::Ptr(inner) => format!("ptr_{}", mangle_fragment(inner)),
        Type::Array(inner, n) => format!("{}_{n}", mangle_fragment(inner)),
        Type::Slice(inner) => format!("{}_slice", mangle_fragment(inner)),
    }
}

/// Owns the primitive singletons; every other `Type` is allocated
/// straight out of the compiler's main arena via `Type::Struct(...)` and
/// friends constructed by the caller.
pub struct TypeRegistry<'a> {
    pub void: &'a Type<'a>,
    pub bool_: &'a Type<'a>,
    pub byte: &'a Type<'a>,
    pub short: &'a Type<'a>,
    pub ushort: &'a Type<'a>,
    pub int: &'a Type<'a>,
    pub uint: &'a Type<'a>,
    pub long: &'a Type<'a>,
    pub ulong: &'a Type<'a>,
    pub isize_: &'a Type<'a>,
    pub usize_: &'a Type<'a>,
    pub float: &'a Type<'a>,
    pub double: &'a Type<'a>,
    pub string: &'a Type<'a>,
}

impl<'a> TypeRegistry<'a> {
    pub fn new(arena: &'a crate::arena::Arena) -> Self {
        TypeRegistry {
            void: arena.alloc(Type::Void),
            bool_: arena.alloc(Type::Bool),
            byte: arena.alloc(Type::Byte),
            short: arena.alloc(Type::Short),
            ushort: arena.alloc(Type::UShort),
            int: arena.alloc(Type::Int),
            uint: arena.alloc(Type::UInt),
            long: arena.alloc(Type::Long),
            ulong: arena.alloc(Type::ULong),
            isize_: arena.alloc(Type::Isize),
            usize_: arena.alloc(Type::Usize),
            float: arena.alloc(Type::Float),
            double: arena.alloc(Type::Double),
            string: arena.alloc(Type::String),
        }
    }

    /// Resolves a primitive by name, for use when the parser/checker
    /// sees a simple type name that isn't a declared struct/interface/
    /// enum/type-parameter.
    pub fn primitive_by_name(&self, name: &str) -> Option<&'a Type<'a>> {
        Some(match name {
            "void" => self.void,
            "bool" => self.bool_,
            "byte" => self.byte,
            "short" => self.short,
            "ushort" => self.ushort,
            "int" => self.int,
            "uint" => self.uint,
            "long" => self.long,
            "ulong" => self.ulong,
            "isize" => self.isize_,
            "usize" => self.usize_,
            "float" => self.float,
            "double" => self.double,
            "string" => self.string,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;

    #[test]
    fn primitives_are_pointer_identical() {
        let arena = Arena::new();
        let reg = TypeRegistry::new(&arena);
        let a = reg.primitive_by_name("int").unwrap();
        let b = reg.primitive_by_name("int").unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a, b);
    }

    #[test]
    fn arrays_are_structural() {
        let arena = Arena::new();
        let reg = TypeRegistry::new(&arena);
        let a = arena.alloc(Type::Array(reg.int, 4));
        let b = arena.alloc(Type::Array(reg.int, 4));
        assert!(!std::ptr::eq(a, b));
        assert_eq!(a, b);
        let c = arena.alloc(Type::Array(reg.int, 5));
        assert_ne!(a, c);
    }

    #[test]
    fn integer_widening_ranks() {
        assert!(Type::integer_convertible(&Type::Byte, &Type::Int));
        assert!(!Type::integer_convertible(&Type::Long, &Type::Byte));
        assert!(Type::integer_convertible(&Type::Int, &Type::Int));
    }
}
