//! Type lowering.
//!
//! Primitives map to the fixed-width C types from `<stdint.h>`. `&T`
//! lowers to `T*` except when `T` is an interface, in which case it
//! lowers to the interface's fat-pointer ref struct *by value*; `*T`
//! follows the same interface exception. `string` lowers to the shared
//! `anc__string` typedef. Arrays and slices both lower to a `{ptr, len}`
//! struct per element type — the field layout is otherwise free provided
//! `.ptr`/`.len` access compiles, and sharing one
//! struct shape for both is what makes the array-to-slice implicit
//! conversion a no-op at the C level.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::sema::type_registry::{mangle_fragment, Type};

use super::mangle::{flatten_module_path, mangle_method};

/// A function declaration with no explicit `: <type>` return annotation
/// returns `void`; this is the fallback used wherever a return-type node
/// is absent instead of allocating a fresh `Type::Void` out of an arena.
pub const VOID: Type<'static> = Type::Void;

pub struct TypeLowerer<'a> {
    pub pkg: &'a str,
    /// Distinct element-type fragments that needed a `{ptr, len}` slice
    /// struct somewhere in this module, mapped to that element's own C
    /// type text, collected as lowering happens so the caller can emit
    /// each one's typedef exactly once per file.
    pub needed_slices: RefCell<BTreeMap<String, String>>,
}

impl<'a> TypeLowerer<'a> {
    pub fn new(pkg: &'a str) -> Self {
        TypeLowerer {
            pkg,
            needed_slices: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn slice_struct_name(&self, elem: &Type<'_>) -> String {
        format!("anc__slice_{}", mangle_fragment(elem))
    }

    pub fn struct_type_name(&self, module_dotted: &str, name: &str) -> String {
        format!("anc__{}__{}__{name}", self.pkg, flatten_module_path(module_dotted))
    }

    pub fn interface_ref_name(&self, module_dotted: &str, name: &str) -> String {
        format!("{}__ref", self.struct_type_name(module_dotted, name))
    }

    pub fn interface_vtable_type_name(&self, module_dotted: &str, name: &str) -> String {
        format!("{}__vtable", self.struct_type_name(module_dotted, name))
    }

    pub fn enum_type_name(&self, module_dotted: &str, name: &str) -> String {
        self.struct_type_name(module_dotted, name)
    }

    pub fn enum_variant_name(&self, module_dotted: &str, enum_name: &str, variant: &str) -> String {
        format!("{}__{variant}", self.struct_type_name(module_dotted, enum_name))
    }

    /// The C type used for a declaration of this Anchor type: a
    /// variable's type, a field's type, a parameter's type, a return
    /// type. Interfaces carried by value (`Ref`/bare `Interface`) lower
    /// to their ref struct by value; interfaces behind an extra `Ptr`
    /// lower to a pointer to that same struct.
    pub fn c_type(&self, ty: &Type<'_>) -> String {
        match ty {
            Type::Void => "void".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Byte => "uint8_t".to_string(),
            Type::Short => "int16_t".to_string(),
            Type::UShort => "uint16_t".to_string(),
            Type::Int => "int32_t".to_string(),
            Type::UInt => "uint32_t".to_string(),
            Type::Long => "int64_t".to_string(),
            Type::ULong => "uint64_t".to_string(),
            Type::Isize => "intptr_t".to_string(),
            Type::Usize => "size_t".to_string(),
            Type::Float => "float".to_string(),
            Type::Double => "double".to_string(),
            Type::String => "anc__string".to_string(),
            Type::Struct(s) => self.struct_type_name(s.module_name, s.name),
            Type::Interface(i) => self.interface_ref_name(i.module_name, i.name),
            Type::Enum(e) => self.enum_type_name(e.module_name, e.name),
            Type::Func(_) => "void*".to_string(),
            Type::Ref(inner) => self.lower_pointer_like(inner),
            Type::Ptr(inner) => self.lower_pointer_like(inner),
            Type::Array(inner, _) | Type::Slice(inner) => {
                let frag = mangle_fragment(inner);
                let elem_c = self.c_type(inner);
                self.needed_slices.borrow_mut().insert(frag, elem_c);
                self.slice_struct_name(inner)
            }
        }
    }

    fn lower_pointer_like(&self, inner: &Type<'_>) -> String {
        match inner {
            Type::Interface(i) => format!("{}*", self.interface_ref_name(i.module_name, i.name)),
            _ => format!("{}*", self.c_type(inner)),
        }
    }

    /// True when `inner` of a `Ref`/`Ptr` is an interface, i.e. the
    /// Anchor-level reference is carried as a by-value fat pointer
    /// rather than a plain C pointer.
    pub fn is_interface_ref(ty: &Type<'_>) -> bool {
        matches!(ty, Type::Ref(Type::Interface(_)))
    }

    pub fn is_interface_ptr(ty: &Type<'_>) -> bool {
        matches!(ty, Type::Ptr(Type::Interface(_)))
    }

    /// Registers every slice/array element fragment reachable from `ty`
    /// so the caller can pre-emit each needed `{ptr, len}` typedef; does
    /// not recurse into struct/interface/enum member lists (their own
    /// emission passes register their own field types independently).
    pub fn collect_slices(&self, ty: &Type<'_>) {
        match ty {
            Type::Array(inner, _) | Type::Slice(inner) => {
                let frag = mangle_fragment(inner);
                let elem_c = self.c_type(inner);
                self.needed_slices.borrow_mut().insert(frag, elem_c);
                self.collect_slices(inner);
            }
            Type::Ref(inner) | Type::Ptr(inner) => self.collect_slices(inner),
            _ => {}
        }
    }

    /// Emits the shared fat-pointer struct for `anc__string`, guarded so
    /// a single translation unit that pulls it in via several headers
    /// only sees it once.
    pub fn write_string_typedef(w: &mut super::writer::Writer) {
        w.writeln("#ifndef ANC_STRING_DEFINED");
        w.writeln("#define ANC_STRING_DEFINED");
        w.writeln("typedef struct { uint8_t* ptr; size_t len; } anc__string;");
        w.writeln("#endif");
    }

    pub fn write_slice_typedef(&self, w: &mut super::writer::Writer, elem_frag: &str, elem_c_type: &str) {
        let guard = format!("ANC_SLICE_{}_DEFINED", elem_frag.to_uppercase());
        w.writeln(&format!("#ifndef {guard}"));
        w.writeln(&format!("#define {guard}"));
        w.writeln(&format!(
            "typedef struct {{ {elem_c_type}* ptr; size_t len; }} anc__slice_{elem_frag};"
        ));
        w.writeln("#endif");
    }

    /// Emits every slice typedef accumulated so far via `c_type`/
    /// `collect_slices`, then clears the set — called once per emitted
    /// file, after every type in it has been lowered.
    pub fn write_needed_slice_typedefs(&self, w: &mut super::writer::Writer) {
        let slices = std::mem::take(&mut *self.needed_slices.borrow_mut());
        for (frag, elem_c_type) in slices {
            self.write_slice_typedef(w, &frag, &elem_c_type);
        }
    }

    pub fn mangle_method_name(&self, module_dotted: &str, struct_name: &str, method_name: &str) -> String {
        mangle_method(self.pkg, module_dotted, struct_name, method_name)
    }
}
