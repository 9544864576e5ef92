//! libffi call interface for a binding's signature.

use std::ffi::{c_long, c_void};

use ffibind_core::{NativeArg, NativeValue, Signature, TypeCode};
use libffi::middle::{Arg, Cif, CodePtr, Type};
use libffi::raw::ffi_sarg;

/// Prepared call interface. Built once per binding and reused for every call.
pub(crate) struct CallInterface {
    cif: Cif,
    ret: TypeCode,
}

// SAFETY: the prepared `ffi_cif` and its type descriptors are never mutated
// after construction; `ffi_call` only reads them.
unsafe impl Send for CallInterface {}
// SAFETY: see above.
unsafe impl Sync for CallInterface {}

fn ffi_type(code: TypeCode) -> Type {
    match code {
        TypeCode::Pointer => Type::pointer(),
        TypeCode::Long => Type::c_long(),
        TypeCode::Int => Type::i32(),
        TypeCode::Void => Type::void(),
    }
}

/// Argument word held in place while libffi reads it.
enum Slot {
    Pointer(*mut c_void),
    Long(c_long),
    Int(i32),
}

impl Slot {
    fn arg(&self) -> Arg {
        match self {
            Self::Pointer(p) => Arg::new(p),
            Self::Long(v) => Arg::new(v),
            Self::Int(v) => Arg::new(v),
        }
    }
}

impl From<NativeArg> for Slot {
    fn from(arg: NativeArg) -> Self {
        match arg {
            NativeArg::Pointer(addr) => Self::Pointer(addr as *mut c_void),
            NativeArg::Long(v) => Self::Long(v),
            NativeArg::Int(v) => Self::Int(v),
        }
    }
}

impl CallInterface {
    pub(crate) fn new(signature: &Signature) -> Self {
        let params = signature.params.iter().copied().map(ffi_type);
        Self {
            cif: Cif::new(params, ffi_type(signature.ret)),
            ret: signature.ret,
        }
    }

    /// Call the function at `address`.
    ///
    /// Integral results are read through the widened return register and then
    /// truncated to the declared width.
    ///
    /// # Safety
    ///
    /// `address` must be a function whose C signature matches the one this
    /// interface was built from, and `args` must have been marshalled for it.
    /// Pointer arguments must be valid for whatever the callee does with them.
    pub(crate) unsafe fn invoke(&self, address: usize, args: &[NativeArg]) -> NativeValue {
        let slots: Vec<Slot> = args.iter().copied().map(Slot::from).collect();
        let ffi_args: Vec<Arg> = slots.iter().map(Slot::arg).collect();
        let code = CodePtr::from_ptr(address as *const c_void);

        // SAFETY: upheld by the caller; `slots` outlives the call.
        unsafe {
            match self.ret {
                TypeCode::Void => {
                    self.cif.call::<()>(code, &ffi_args);
                    NativeValue::Void
                }
                TypeCode::Int => {
                    let raw = self.cif.call::<ffi_sarg>(code, &ffi_args);
                    NativeValue::Int(raw as i32)
                }
                TypeCode::Long => {
                    let raw = self.cif.call::<ffi_sarg>(code, &ffi_args);
                    NativeValue::Long(i64::from(raw as c_long))
                }
                TypeCode::Pointer => {
                    let raw = self.cif.call::<*mut c_void>(code, &ffi_args);
                    NativeValue::Pointer(raw as usize)
                }
            }
        }
    }
}
