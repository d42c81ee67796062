/// The value types of the legacy module format.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum ValType {
    /// No value. Only legal as a signature's return slot, marking a
    /// function that produces no result; never a parameter or local type.
    Void = 0,
    /// The 32-bit integer type.
    I32 = 1,
    /// The 64-bit integer type.
    I64 = 2,
    /// The 32-bit float type.
    F32 = 3,
    /// The 64-bit float type.
    F64 = 4,
}

impl From<ValType> for u8 {
    #[inline]
    fn from(ty: ValType) -> u8 {
        ty as u8
    }
}

/// A function signature: a return type followed by its parameter types.
///
/// Signatures live in a module-wide table and are referenced everywhere else
/// by index; see [`ModuleBuilder::add_signature`].
///
/// [`ModuleBuilder::add_signature`]: crate::ModuleBuilder::add_signature
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FuncSig {
    /// The return type, [`ValType::Void`] for no result.
    pub ret: ValType,
    /// The parameter types, in declaration order.
    pub params: Vec<ValType>,
}

impl FuncSig {
    /// Create a new signature from a return type and parameter types.
    pub fn new(ret: ValType, params: impl Into<Vec<ValType>>) -> FuncSig {
        FuncSig {
            ret,
            params: params.into(),
        }
    }
}

/// A reference to a signature: either an inline [`FuncSig`] that will be
/// registered with the module on first use, or the index of a previously
/// registered one.
///
/// Indices given through [`SigRef::ByIndex`] are stored as-is and only
/// bounds-checked at serialization time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SigRef {
    /// A signature to register with the owning module.
    Inline(FuncSig),
    /// The index of an already registered signature.
    ByIndex(u32),
}

impl From<FuncSig> for SigRef {
    fn from(sig: FuncSig) -> SigRef {
        SigRef::Inline(sig)
    }
}

impl From<u32> for SigRef {
    fn from(index: u32) -> SigRef {
        SigRef::ByIndex(index)
    }
}

/// Local variable counts for a function body, partitioned by the four
/// concrete value types.
///
/// Only types with a non-zero count occupy a slot in the encoded local
/// declarations, always in the order the fields are declared here.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LocalCounts {
    /// Number of `i32` locals.
    pub i32_count: u32,
    /// Number of `i64` locals.
    pub i64_count: u32,
    /// Number of `f32` locals.
    pub f32_count: u32,
    /// Number of `f64` locals.
    pub f64_count: u32,
}
