//! Expression nodes.

use super::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    BitXor,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Ref,
    Deref,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundAssignOp {
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

#[derive(Debug)]
pub struct FieldInit<'a> {
    pub name: &'a str,
    pub value: &'a Node<'a>,
}

#[derive(Debug)]
pub enum Expr<'a> {
    IntegerLiteral { text: &'a str },
    FloatLiteral { text: &'a str },
    StringLiteral { text: &'a str },
    BoolLiteral { value: bool },
    NullLiteral,
    Identifier { name: &'a str },
    SelfExpr,

    Binary {
        op: BinaryOp,
        left: &'a Node<'a>,
        right: &'a Node<'a>,
    },
    Unary {
        op: UnaryOp,
        operand: &'a Node<'a>,
    },
    Paren {
        inner: &'a Node<'a>,
    },
    Call {
        callee: &'a Node<'a>,
        type_args: Vec<&'a Node<'a>>,
        args: Vec<&'a Node<'a>>,
    },
    FieldAccess {
        object: &'a Node<'a>,
        field_name: &'a str,
    },
    MethodCall {
        object: &'a Node<'a>,
        method_name: &'a str,
        args: Vec<&'a Node<'a>>,
    },
    StructLiteral {
        struct_name: &'a str,
        type_args: Vec<&'a Node<'a>>,
        fields: Vec<FieldInit<'a>>,
    },
    Cast {
        expr: &'a Node<'a>,
        target_type: &'a Node<'a>,
    },
    Sizeof {
        type_node: &'a Node<'a>,
    },
    ArrayLiteral {
        elements: Vec<&'a Node<'a>>,
    },
    Index {
        object: &'a Node<'a>,
        index: &'a Node<'a>,
    },
}
