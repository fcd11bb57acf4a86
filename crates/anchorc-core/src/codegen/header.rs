//! Per-module header emission.
//!
//! Only `export`ed declarations get a prototype here; everything else is
//! module-private and emitted straight into the translation unit by
//! `codegen::mod`'s `emit_translation_unit`. The struct/enum typedef
//! writers are shared between both call sites, since a private
//! declaration's typedef looks exactly like an exported one — only
//! *where* it lands differs.

use crate::ast::{FuncDecl, NodeKind, StructDecl};
use crate::module_graph::Module;
use crate::sema::type_registry::{as_func_decl, StructType, Type};

use super::mangle;
use super::types::{TypeLowerer, VOID};
use super::writer::Writer;

pub(crate) fn emit_header(pkg: &str, module: &Module, types: &TypeLowerer) -> String {
    let mut body = Writer::new();
    for decl in module.declarations() {
        match &decl.kind {
            NodeKind::StructDecl(s) if s.is_export && !s.is_generic() => {
                let struct_c = types.struct_type_name(module.dotted_path, s.name);
                emit_struct_typedef(module.dotted_path, &struct_c, types, &mut body, s);
            }
            NodeKind::EnumDecl(e) if e.is_export => emit_enum_typedef(module.dotted_path, types, &mut body, e),
            NodeKind::ConstDecl(c) if c.is_export => {
                let ty = decl.resolved_type.get().expect("const decl resolved by the analyzer");
                body.writeln(&format!(
                    "extern const {} {};",
                    types.c_type(ty),
                    mangle::mangle_symbol(pkg, module.dotted_path, c.name)
                ));
            }
            NodeKind::VarDecl(v) if v.is_export => {
                let ty = decl.resolved_type.get().expect("var decl resolved by the analyzer");
                body.writeln(&format!(
                    "extern {} {};",
                    types.c_type(ty),
                    mangle::mangle_symbol(pkg, module.dotted_path, v.name)
                ));
            }
            NodeKind::FuncDecl(f) if (f.is_export || f.is_extern) && !f.is_generic() => {
                // `extern func` is header-declaration-only regardless of
                // `export`: the symbol is supplied by code linked in
                // separately, so
                // every module that can see the declaration needs the
                // prototype, not just importers of an exported one.
                emit_func_prototype(pkg, module, types, &mut body, f);
            }
            _ => {}
        }
    }

    let mut w = Writer::new();
    let guard = mangle::include_guard(pkg, module.dotted_path);
    w.writeln(&format!("#ifndef {guard}"));
    w.writeln(&format!("#define {guard}"));
    w.blank();
    w.writeln("#include <stdint.h>");
    w.writeln("#include <stddef.h>");
    w.writeln("#include <stdbool.h>");
    w.blank();
    TypeLowerer::write_string_typedef(&mut w);
    w.blank();
    types.write_needed_slice_typedefs(&mut w);
    w.blank();
    w.write(&body.into_string());
    w.blank();
    w.writeln("#endif");
    w.into_string()
}

pub(crate) fn func_signature(types: &TypeLowerer, name: &str, self_prefix: Option<&str>, f: &FuncDecl, return_ty: &Type) -> String {
    let mut params: Vec<String> = Vec::new();
    if let Some(struct_c) = self_prefix {
        params.push(format!("{struct_c}* self"));
    }
    for p in &f.params {
        let ty = p.type_node.resolved_type.get().expect("param type resolved by the analyzer");
        params.push(format!("{} {}", types.c_type(ty), p.name));
    }
    let params = if params.is_empty() { "void".to_string() } else { params.join(", ") };
    format!("{} {name}({params})", types.c_type(return_ty))
}

fn emit_func_prototype(pkg: &str, module: &Module, types: &TypeLowerer, w: &mut Writer, f: &FuncDecl) {
    let mangled = mangle::mangle_symbol(pkg, module.dotted_path, f.name);
    let return_ty = f
        .return_type
        .map(|r| r.resolved_type.get().expect("return type resolved by the analyzer"))
        .unwrap_or(&VOID);
    w.writeln(&format!("{};", func_signature(types, &mangled, None, f, return_ty)));
}

/// Writes one `static` forward declaration ahead of a module-private
/// function or method body, using the same name/self-prefix/return-type
/// inputs the real body emission computes, so a call site earlier in
/// the translation unit (mutual recursion, or simply textual order) sees
/// a prototype before it's used.
pub(crate) fn emit_static_prototype(
    types: &TypeLowerer,
    w: &mut Writer,
    self_prefix: Option<&str>,
    mangled: &str,
    f: &FuncDecl,
    return_ty: &Type,
) {
    w.writeln(&format!("static {};", func_signature(types, mangled, self_prefix, f, return_ty)));
}

/// Writes one struct's typedef plus its methods' prototypes under the
/// already-computed C name `struct_c` — separate from `module_dotted` +
/// `s.name` so a monomorphized struct (whose `StructDecl.name` is still
/// the template's bare name, only `StructType::name` carries the mangled
/// one) can pass its real mangled name in.
pub(crate) fn emit_struct_typedef(module_dotted: &str, struct_c: &str, types: &TypeLowerer, w: &mut Writer, s: &StructDecl) {
    w.writeln(&format!("typedef struct {struct_c} {{"));
    w.indent();
    for field in &s.fields {
        let ty = field.type_node.resolved_type.get().expect("field type resolved by the analyzer");
        w.writeln(&format!("{} {};", types.c_type(ty), field.name));
    }
    w.dedent();
    w.writeln(&format!("}} {struct_c};"));

    for method in &s.methods {
        let method_decl = as_func_decl(method);
        if method_decl.is_generic() {
            continue; // monomorphized lazily; its own body/prototype is emitted at its instantiation site
        }
        let mangled = mangle::mangle_method(types.pkg, module_dotted, struct_c, method_decl.name);
        let return_ty = method_decl
            .return_type
            .map(|r| r.resolved_type.get().expect("method return type resolved by the analyzer"))
            .unwrap_or(&Type::Void);
        w.writeln(&format!("{};", func_signature(types, &mangled, Some(struct_c), method_decl, return_ty)));
    }
}

/// Non-exported struct typedef, keyed by the struct's own declared name
/// (used from the translation unit for module-private structs).
pub(crate) fn emit_private_struct_typedef(module_dotted: &str, types: &TypeLowerer, w: &mut Writer, s: &StructDecl) {
    let struct_c = types.struct_type_name(module_dotted, s.name);
    emit_struct_typedef(module_dotted, &struct_c, types, w, s);
}

/// A generic instantiation's struct typedef: `struct_ty.name` already
/// carries the mangled `base__arg1…` name, so the
/// C type name comes straight from `TypeLowerer::c_type` rather than
/// from re-mangling the declaration's own (still-generic) name.
pub(crate) fn emit_private_struct_typedef_from_decl(types: &TypeLowerer, w: &mut Writer, struct_ty: &StructType) {
    let struct_c = types.c_type(&Type::Struct(struct_ty));
    emit_struct_typedef(struct_ty.module_name, &struct_c, types, w, struct_ty.struct_decl());
}

pub(crate) fn emit_enum_typedef(module_dotted: &str, types: &TypeLowerer, w: &mut Writer, e: &crate::ast::EnumDecl) {
    let enum_c = types.enum_type_name(module_dotted, e.name);
    w.writeln(&format!("typedef enum {enum_c} {{"));
    w.indent();
    for variant in &e.variants {
        w.writeln(&format!("{},", types.enum_variant_name(module_dotted, e.name, variant.name)));
    }
    w.dedent();
    w.writeln(&format!("}} {enum_c};"));
}

pub(crate) fn emit_private_enum_typedef(module: &Module, types: &TypeLowerer, w: &mut Writer, e: &crate::ast::EnumDecl) {
    emit_enum_typedef(module.dotted_path, types, w, e);
}
