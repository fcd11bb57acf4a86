//! Expression lowering.

use crate::ast::{Expr, FieldInit, Node, NodeKind};
use crate::sema::type_registry::{InterfaceType, StructType, Type};

use super::Cg;

impl<'e, 'a> Cg<'e, 'a> {
    pub(crate) fn lower_expr(&self, node: &'a Node<'a>) -> String {
        let NodeKind::Expr(e) = &node.kind else {
            return String::new();
        };
        match e {
            Expr::IntegerLiteral { text } => text.to_string(),
            Expr::FloatLiteral { text } => text.to_string(),
            Expr::StringLiteral { text } => {
                let raw = &text[1..text.len() - 1];
                format!("(anc__string){{ .ptr = (uint8_t*)\"{raw}\", .len = {} }}", raw.len())
            }
            Expr::BoolLiteral { value } => if *value { "true" } else { "false" }.to_string(),
            Expr::NullLiteral => "NULL".to_string(),
            Expr::SelfExpr => "self".to_string(),
            Expr::Identifier { name } => self.lower_identifier(name),
            Expr::Binary { op, left, right } => self.lower_binary(*op, *left, *right),
            Expr::Unary { op, operand } => self.lower_unary(*op, *operand),
            Expr::Paren { inner } => format!("({})", self.lower_expr(inner)),
            Expr::Call { callee, args, .. } => self.lower_call(node, *callee, args),
            Expr::FieldAccess { object, field_name } => self.lower_field_access(*object, field_name),
            Expr::MethodCall { object, method_name, args } => {
                self.lower_method_call(node, *object, method_name, args)
            }
            Expr::StructLiteral { struct_name, fields, .. } => self.lower_struct_literal(node, struct_name, fields),
            Expr::Cast { expr, .. } => {
                let ty = node.resolved_type.get().expect("cast resolved by the analyzer");
                format!("(({}){})", self.types.c_type(ty), self.lower_expr(expr))
            }
            Expr::Sizeof { type_node } => {
                let ty = type_node.resolved_type.get().expect("sizeof operand resolved by the analyzer");
                format!("sizeof({})", self.types.c_type(ty))
            }
            Expr::ArrayLiteral { elements } => self.lower_array_literal(node, elements),
            Expr::Index { object, index } => self.lower_index(*object, *index),
        }
    }

    fn resolved(node: &'a Node<'a>) -> &'a Type<'a> {
        node.resolved_type.get().expect("node type resolved by the analyzer")
    }

    fn lower_identifier(&self, name: &'a str) -> String {
        if self.is_local(name) {
            return name.to_string();
        }
        let found = self.graph.get(self.module).symbols.borrow().get(name).map(|s| s.source);
        if let Some(owner) = found {
            let owner_dotted = self.graph.get(owner).dotted_path;
            return super::mangle::mangle_symbol(self.pkg, owner_dotted, name);
        }
        name.to_string()
    }

    fn lower_binary(&self, op: crate::ast::BinaryOp, left: &'a Node<'a>, right: &'a Node<'a>) -> String {
        use crate::ast::BinaryOp::*;
        let l = self.lower_expr(left);
        let r = self.lower_expr(right);
        let c_op = match op {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            BitXor => "^",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            Greater => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            And => "&&",
            Or => "||",
        };
        format!("({l} {c_op} {r})")
    }

    fn lower_unary(&self, op: crate::ast::UnaryOp, operand: &'a Node<'a>) -> String {
        use crate::ast::UnaryOp::*;
        let o = self.lower_expr(operand);
        match op {
            Neg => format!("(-{o})"),
            Not => format!("(!{o})"),
            Ref => format!("(&{o})"),
            Deref => format!("(*{o})"),
        }
    }

    /// `.` on struct values and on an interface carried by value
    /// (`Ref(Interface)` — itself a by-value fat-ref struct); `->` on
    /// every other pointer-like type.
    fn access_op(ty: &Type<'_>) -> &'static str {
        match ty {
            Type::Ref(Type::Interface(_)) => ".",
            Type::Ref(_) | Type::Ptr(_) => "->",
            _ => ".",
        }
    }

    fn lower_field_access(&self, object: &'a Node<'a>, field_name: &'a str) -> String {
        let op = Self::access_op(Self::resolved(object));
        format!("{}{op}{field_name}", self.lower_expr(object))
    }

    fn lower_index(&self, object: &'a Node<'a>, index: &'a Node<'a>) -> String {
        let op = Self::access_op(Self::resolved(object));
        format!("{}{op}ptr[{}]", self.lower_expr(object), self.lower_expr(index))
    }

    fn lower_call(&self, call_node: &'a Node<'a>, callee: &'a Node<'a>, args: &[&'a Node<'a>]) -> String {
        let NodeKind::Expr(Expr::Identifier { name }) = &callee.kind else {
            return "/* unsupported call target */".to_string();
        };
        if let Some(raw) = call_node.mangled.get() {
            let full = self.resolve_instantiation_symbol(raw);
            return format!("{full}({})", self.lower_plain_args(args));
        }
        let found = self
            .graph
            .get(self.module)
            .symbols
            .borrow()
            .get(name)
            .map(|s| (s.node, s.source));
        let Some((decl_node, owner)) = found else {
            return format!("{name}({})", self.lower_plain_args(args));
        };
        let owner_dotted = self.graph.get(owner).dotted_path;
        let mangled = super::mangle::mangle_symbol(self.pkg, owner_dotted, name);
        let params: Vec<&Type> = match decl_node.resolved_type.get() {
            Some(Type::Func(ft)) => ft.params.clone(),
            _ => Vec::new(),
        };
        format!("{mangled}({})", self.lower_coerced_args(&params, args))
    }

    fn lower_plain_args(&self, args: &[&'a Node<'a>]) -> String {
        args.iter().map(|a| self.lower_expr(a)).collect::<Vec<_>>().join(", ")
    }

    /// Lowers call arguments, inserting the interface fat-pointer literal
    /// wherever a `&Struct` argument satisfies an
    /// `&Interface` parameter.
    fn lower_coerced_args(&self, params: &[&'a Type<'a>], args: &[&'a Node<'a>]) -> String {
        args.iter()
            .enumerate()
            .map(|(i, a)| {
                let text = self.lower_expr(a);
                match params.get(i) {
                    Some(param_ty) => self.coerce(param_ty, Self::resolved(a), &text),
                    None => text,
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Wraps `text` in the interface ref literal when `value_ty` is a
    /// struct reference being passed where `param_ty` wants an interface
    /// reference; every other implicit conversion is a no-op in C, since
    /// primitives/pointers/slices already share representation across
    /// the conversion.
    pub(crate) fn coerce(&self, param_ty: &'a Type<'a>, value_ty: &'a Type<'a>, text: &str) -> String {
        let (Some(iface), Some(struct_ty)) = (Self::unwrap_interface(param_ty), Self::unwrap_struct(value_ty)) else {
            return text.to_string();
        };
        let vtable = super::mangle::mangle_vtable_instance(self.pkg, struct_ty.module_name, struct_ty.name, iface.name);
        let ref_ty = self.types.interface_ref_name(iface.module_name, iface.name);
        format!("({ref_ty}){{ .data = {text}, .vtable = &{vtable} }}")
    }

    fn unwrap_interface(ty: &'a Type<'a>) -> Option<&'a InterfaceType<'a>> {
        match *ty {
            Type::Ref(&Type::Interface(i)) | Type::Ptr(&Type::Interface(i)) | Type::Interface(i) => Some(i),
            _ => None,
        }
    }

    fn unwrap_struct(ty: &'a Type<'a>) -> Option<&'a StructType<'a>> {
        match *ty {
            Type::Ref(&Type::Struct(s)) | Type::Ptr(&Type::Struct(s)) | Type::Struct(s) => Some(s),
            _ => None,
        }
    }

    fn lower_struct_literal(&self, node: &'a Node<'a>, _struct_name: &str, fields: &[FieldInit<'a>]) -> String {
        let ty = Self::resolved(node);
        let c_ty = self.types.c_type(ty);
        let Type::Struct(struct_ty) = *ty else {
            return format!("({c_ty}){{ 0 }}");
        };
        let inits: Vec<String> = fields
            .iter()
            .map(|f| {
                let field_ty = struct_ty
                    .find_field(f.name)
                    .and_then(|fld| fld.type_node.resolved_type.get())
                    .expect("struct literal field resolved by the analyzer");
                let text = self.lower_expr(f.value);
                format!(".{} = {}", f.name, self.coerce(field_ty, Self::resolved(f.value), &text))
            })
            .collect();
        format!("({c_ty}){{ {} }}", inits.join(", "))
    }

    fn lower_array_literal(&self, node: &'a Node<'a>, elements: &[&'a Node<'a>]) -> String {
        let ty = Self::resolved(node);
        let Type::Array(elem, _) = ty else {
            return "{ 0 }".to_string();
        };
        let elem_c = self.types.c_type(elem);
        let slice_ty = self.types.slice_struct_name(elem);
        let items: Vec<String> = elements.iter().map(|e| self.lower_expr(e)).collect();
        format!(
            "({slice_ty}){{ .ptr = ({elem_c}[]){{ {} }}, .len = {} }}",
            items.join(", "),
            elements.len()
        )
    }

    fn lower_method_call(
        &self,
        call_node: &'a Node<'a>,
        object: &'a Node<'a>,
        method_name: &'a str,
        args: &[&'a Node<'a>],
    ) -> String {
        let obj_ty = Self::resolved(object);
        if Self::unwrap_interface(obj_ty).is_some() {
            let op = Self::access_op(obj_ty);
            let obj = self.lower_expr(object);
            let rest = self.lower_plain_args(args);
            let sep = if args.is_empty() { "" } else { ", " };
            return format!("{obj}{op}vtable->{method_name}({obj}{op}data{sep}{rest})");
        }

        if let Some(raw) = call_node.mangled.get() {
            let full = self.resolve_instantiation_symbol(raw);
            let self_arg = self.lower_self_arg(object, obj_ty);
            let rest = self.lower_plain_args(args);
            let sep = if args.is_empty() { "" } else { ", " };
            return format!("{full}({self_arg}{sep}{rest})");
        }

        let Some(struct_ty) = Self::deref_struct(obj_ty) else {
            return format!("/* unresolved method call {method_name} */");
        };
        let mangled = self.types.mangle_method_name(struct_ty.module_name, struct_ty.name, method_name);
        let self_arg = self.lower_self_arg(object, obj_ty);
        let params: Vec<&Type> = struct_ty
            .find_method(method_name)
            .and_then(|m| m.resolved_type.get())
            .map(|t| match t {
                Type::Func(ft) => ft.params.clone(),
                _ => Vec::new(),
            })
            .unwrap_or_default();
        let rest = self.lower_coerced_args(&params, args);
        let sep = if args.is_empty() { "" } else { ", " };
        format!("{mangled}({self_arg}{sep}{rest})")
    }

    fn lower_self_arg(&self, object: &'a Node<'a>, obj_ty: &'a Type<'a>) -> String {
        let text = self.lower_expr(object);
        match obj_ty {
            Type::Ref(_) | Type::Ptr(_) => text,
            _ => format!("(&{text})"),
        }
    }

    fn deref_struct(ty: &'a Type<'a>) -> Option<&'a StructType<'a>> {
        match *ty {
            Type::Struct(s) => Some(s),
            Type::Ref(inner) | Type::Ptr(inner) => Self::deref_struct(inner),
            _ => None,
        }
    }
}
