//! Signatures of the runtime library entry points called from generated
//! code.

use cranelift_codegen::ir::{AbiParam, Signature, Type, types};
use cranelift_module::Module;

/// A parameter or return type of a runtime entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Ty {
    Ptr,
    I32,
}

use Ty::{I32, Ptr};

const RUNTIME: &[(&str, &[Ty], Option<Ty>)] = &[
    ("rain_new_table", &[], Some(Ptr)),
    ("rain_box_malloc", &[], Some(Ptr)),
    ("rain_get", &[Ptr, Ptr, Ptr], None),
    ("rain_put", &[Ptr, Ptr, Ptr, Ptr], Some(I32)),
    ("rain_get_ptr", &[Ptr, Ptr], Some(Ptr)),
    ("rain_truthy", &[Ptr], Some(I32)),
    ("rain_check_callable", &[Ptr, Ptr, I32], Some(I32)),
    ("rain_add", &[Ptr, Ptr, Ptr], Some(I32)),
    ("rain_sub", &[Ptr, Ptr, Ptr], Some(I32)),
    ("rain_mul", &[Ptr, Ptr, Ptr], Some(I32)),
    ("rain_div", &[Ptr, Ptr, Ptr], Some(I32)),
    ("rain_eq", &[Ptr, Ptr, Ptr], Some(I32)),
    ("rain_ne", &[Ptr, Ptr, Ptr], Some(I32)),
    ("rain_gt", &[Ptr, Ptr, Ptr], Some(I32)),
    ("rain_ge", &[Ptr, Ptr, Ptr], Some(I32)),
    ("rain_lt", &[Ptr, Ptr, Ptr], Some(I32)),
    ("rain_le", &[Ptr, Ptr, Ptr], Some(I32)),
    ("rain_string_concat", &[Ptr, Ptr, Ptr], Some(I32)),
    ("rain_neg", &[Ptr, Ptr], Some(I32)),
    ("rain_not", &[Ptr, Ptr], Some(I32)),
    ("rain_init_args", &[I32, Ptr], None),
    ("rain_main", &[Ptr, Ptr], Some(I32)),
    ("rain_box_to_exit", &[Ptr], Some(I32)),
    ("rain_report_uncaught", &[Ptr], None),
];

/// Native signature of the runtime entry point `name`, or `None` if the
/// runtime has no such function.
#[must_use]
pub fn signature(module: &dyn Module, name: &str) -> Option<Signature> {
    let (_, params, ret) = RUNTIME.iter().find(|(n, _, _)| *n == name)?;
    let ptr = module.target_config().pointer_type();
    let lower = |ty: Ty| -> Type {
        match ty {
            Ptr => ptr,
            I32 => types::I32,
        }
    };
    let mut sig = module.make_signature();
    sig.params
        .extend(params.iter().map(|&ty| AbiParam::new(lower(ty))));
    sig.returns.extend(ret.map(|ty| AbiParam::new(lower(ty))));
    Some(sig)
}

/// Signature of a Rain function with `arity` parameters: the result cell,
/// one cell per argument, and the unwind status.
#[must_use]
pub fn box_signature(module: &dyn Module, arity: u32) -> Signature {
    let ptr = module.target_config().pointer_type();
    let mut sig = module.make_signature();
    for _ in 0..=arity {
        sig.params.push(AbiParam::new(ptr));
    }
    sig.returns.push(AbiParam::new(types::I32));
    sig
}

/// Names of every runtime entry point generated code may import.
pub fn names() -> impl Iterator<Item = &'static str> {
    RUNTIME.iter().map(|(name, _, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_and_prefixed() {
        let mut seen = HashSet::new();
        for name in names() {
            assert!(name.starts_with("rain_"), "{name}");
            assert!(seen.insert(name), "duplicate {name}");
        }
    }
}
