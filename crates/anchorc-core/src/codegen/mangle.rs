//! Name mangling and output file naming.
//!
//! Every C identifier the backend emits for a user-visible symbol goes
//! through one of these functions so the scheme stays in one place:
//! module-level symbols as `anc__<pkg>__<mod>__<name>`, methods as
//! `anc__<pkg>__<mod>__<struct>__<method>`, and vtable instances as
//! `anc__<pkg>__<mod_of_struct>__<struct>__<interface>__vtable`.

/// Dots in a dotted module path become underscores so the mangled name
/// stays a single valid C identifier.
pub fn flatten_module_path(dotted: &str) -> String {
    dotted.replace('.', "_")
}

pub fn mangle_symbol(pkg: &str, module_dotted: &str, name: &str) -> String {
    format!("anc__{pkg}__{}__{name}", flatten_module_path(module_dotted))
}

pub fn mangle_method(pkg: &str, module_dotted: &str, struct_name: &str, method_name: &str) -> String {
    format!("anc__{pkg}__{}__{struct_name}__{method_name}", flatten_module_path(module_dotted))
}

/// Vtable instances mangle under the struct's defining module, not the
/// interface's: emission switches the "current module" to the struct's
/// defining module when building a vtable for an implementation pair,
/// so wrapper functions reference the struct's own mangling.
pub fn mangle_vtable_instance(pkg: &str, struct_module_dotted: &str, struct_name: &str, interface_name: &str) -> String {
    format!(
        "anc__{pkg}__{}__{struct_name}__{interface_name}__vtable",
        flatten_module_path(struct_module_dotted)
    )
}

pub fn mangle_wrapper(struct_name: &str, interface_name: &str, method_name: &str) -> String {
    format!("{struct_name}__{interface_name}__{method_name}__wrapper")
}

pub fn header_file_name(pkg: &str, module_dotted: &str) -> String {
    format!("anc__{pkg}__{}.h", flatten_module_path(module_dotted))
}

pub fn unit_file_name(pkg: &str, module_dotted: &str) -> String {
    format!("anc__{pkg}__{}.c", flatten_module_path(module_dotted))
}

/// The header's own include guard, uppercased so it reads like the
/// macros a hand-written C header would use.
pub fn include_guard(pkg: &str, module_dotted: &str) -> String {
    format!("ANC__{}__{}_H", pkg.to_uppercase(), flatten_module_path(module_dotted).to_uppercase())
}
