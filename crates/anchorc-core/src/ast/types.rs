//! Type expression nodes — the surface syntax for types, distinct from
//! the resolved `Type` values the analyzer produces (see
//! `sema::type_registry`). A `TypeExpr::Simple` might name a primitive,
//! a struct, an interface, an enum, or a generic type parameter; which
//! one it is isn't known until resolution.

use super::Node;

#[derive(Debug)]
pub enum TypeExpr<'a> {
    Simple {
        name: &'a str,
        type_args: Vec<&'a Node<'a>>,
    },
    Reference {
        inner: &'a Node<'a>,
    },
    Pointer {
        inner: &'a Node<'a>,
    },
    Array {
        inner: &'a Node<'a>,
        size_expr: &'a Node<'a>,
    },
    Slice {
        inner: &'a Node<'a>,
    },
}
