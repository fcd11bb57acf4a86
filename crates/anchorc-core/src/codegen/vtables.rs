//! Interface vtable emission.
//!
//! Each `(struct, interface)` implementation pair discovered during body
//! checking becomes a static vtable instance plus one thin wrapper per
//! interface method, unwrapping the `void* data` back to the concrete
//! struct pointer before forwarding to its real (mangled) method.

use crate::module_graph::{ImplPair, Module};
use crate::sema::type_registry::{as_func_decl, InterfaceType, StructType, Type};

use super::types::TypeLowerer;
use super::writer::Writer;

struct MethodSig<'a> {
    name: &'a str,
    params: Vec<&'a Type<'a>>,
    return_type: &'a Type<'a>,
}

fn method_sigs<'a>(iface: &InterfaceType<'a>) -> Vec<MethodSig<'a>> {
    iface
        .method_sigs()
        .iter()
        .map(|node| {
            let decl = as_func_decl(node);
            let params = decl
                .params
                .iter()
                .map(|p| p.type_node.resolved_type.get().expect("interface method param resolved"))
                .collect();
            let return_type = decl
                .return_type
                .map(|r| r.resolved_type.get().expect("interface method return type resolved"))
                .unwrap_or(match node.resolved_type.get() {
                    Some(Type::Func(ft)) => ft.return_type,
                    _ => unreachable!("interface method signature always has a function type"),
                });
            MethodSig { name: decl.name, params, return_type }
        })
        .collect()
}

/// True the first time `iface` is seen while emitting `module`'s pairs,
/// so its vtable struct/ref typedefs are only written once even though
/// several structs may implement it.
pub(crate) fn write_interface_typedefs(pkg: &str, types: &TypeLowerer, w: &mut Writer, iface: &InterfaceType) {
    let vtable_ty = types.interface_vtable_type_name(iface.module_name, iface.name);
    let ref_ty = types.interface_ref_name(iface.module_name, iface.name);
    w.writeln(&format!("typedef struct {vtable_ty} {{"));
    w.indent();
    for sig in method_sigs(iface) {
        let ret = types.c_type(sig.return_type);
        let params: Vec<String> = std::iter::once("void*".to_string())
            .chain(sig.params.iter().map(|p| types.c_type(p)))
            .collect();
        w.writeln(&format!("{ret} (*{})({});", sig.name, params.join(", ")));
    }
    w.dedent();
    w.writeln(&format!("}} {vtable_ty};"));
    w.writeln(&format!("typedef struct {{ void* data; const {vtable_ty}* vtable; }} {ref_ty};"));
    let _ = pkg;
}

/// Emits the wrapper functions and static vtable instance for one
/// `(struct, interface)` pair.
pub(crate) fn write_impl_pair(pkg: &str, types: &TypeLowerer, w: &mut Writer, pair: &ImplPair) {
    let struct_ty: &StructType = pair.struct_ty;
    let iface: &InterfaceType = pair.interface_ty;
    let vtable_ty = types.interface_vtable_type_name(iface.module_name, iface.name);
    let struct_c = types.c_type(&Type::Struct(struct_ty));

    let sigs = method_sigs(iface);
    for sig in &sigs {
        let wrapper = super::mangle::mangle_wrapper(struct_ty.name, iface.name, sig.name);
        let mangled_method = types.mangle_method_name(struct_ty.module_name, struct_ty.name, sig.name);
        let ret = types.c_type(sig.return_type);
        let mut params = vec!["void* data".to_string()];
        let mut arg_names = Vec::new();
        for (i, p) in sig.params.iter().enumerate() {
            let name = format!("a{i}");
            params.push(format!("{} {name}", types.c_type(p)));
            arg_names.push(name);
        }
        w.writeln(&format!("static {ret} {wrapper}({}) {{", params.join(", ")));
        w.indent();
        w.writeln(&format!("{struct_c}* self = ({struct_c}*)data;"));
        let args = std::iter::once("self".to_string()).chain(arg_names).collect::<Vec<_>>().join(", ");
        let call = format!("{mangled_method}({args})");
        if matches!(sig.return_type, Type::Void) {
            w.writeln(&format!("{call};"));
        } else {
            w.writeln(&format!("return {call};"));
        }
        w.dedent();
        w.writeln("}");
    }

    let instance = super::mangle::mangle_vtable_instance(pkg, struct_ty.module_name, struct_ty.name, iface.name);
    w.writeln(&format!("static const {vtable_ty} {instance} = {{"));
    w.indent();
    for sig in &sigs {
        let wrapper = super::mangle::mangle_wrapper(struct_ty.name, iface.name, sig.name);
        w.writeln(&format!(".{} = {wrapper},", sig.name));
    }
    w.dedent();
    w.writeln("};");
}

pub(crate) fn owning_interfaces<'a>(module: &Module<'a>) -> Vec<&'a InterfaceType<'a>> {
    let mut seen: Vec<&'a InterfaceType<'a>> = Vec::new();
    for pair in module.impl_pairs.borrow().iter() {
        if !seen.iter().any(|i| std::ptr::eq(*i, pair.interface_ty)) {
            seen.push(pair.interface_ty);
        }
    }
    seen
}
