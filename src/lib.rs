//! A builder for the legacy (pre-standard) WebAssembly binary module format.
//!
//! The main builder is the [`ModuleBuilder`]. You declare signatures,
//! imports, functions, a linear memory, an indirect-call table, data
//! segments, and raw passthrough sections on it, then call
//! [`ModuleBuilder::to_bytes`] to serialize the whole description in the
//! fixed section order legacy decoders expect. Function bodies are opaque
//! pre-encoded instruction bytes; this crate never inspects them, and it
//! only encodes; there is no parsing direction.
//!
//! # Example
//!
//! ```
//! use wasm_module_builder::{FuncSig, LocalCounts, ModuleBuilder, ValType};
//!
//! let mut module = ModuleBuilder::new();
//! module.add_memory(1, 1, false);
//!
//! // An (i32, i32) -> i32 signature, registered on first use.
//! let sig = FuncSig::new(ValType::I32, [ValType::I32, ValType::I32]);
//! module
//!     .add_function("add", sig)
//!     .locals(LocalCounts {
//!         i32_count: 1,
//!         ..LocalCounts::default()
//!     })
//!     .body([/* pre-encoded instruction bytes */ 0x00])
//!     .export_func();
//!
//! let wasm = module.to_bytes().unwrap();
//! assert_eq!(&wasm[0..4], b"\0asm");
//! ```

#![deny(missing_docs, missing_debug_implementations)]

mod function;
mod module;
mod types;

pub use function::*;
pub use module::*;
pub use types::*;

pub mod encoders;

/// The four magic bytes opening every module (`\0asm`).
pub const MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];

/// The format version this builder emits, as four little-endian bytes.
pub const VERSION: [u8; 4] = [0x0B, 0x00, 0x00, 0x00];

/// Known section declaration codes of the legacy module format.
///
/// Every section in the output is introduced by one of these bytes; the
/// module itself is terminated by [`SectionCode::End`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[repr(u8)]
pub enum SectionCode {
    /// The linear memory declaration.
    Memory = 0x00,
    /// The signature table.
    Signatures = 0x01,
    /// The merged function section of even older modules. Superseded by
    /// [`SectionCode::FunctionSignatures`] plus
    /// [`SectionCode::FunctionBodies`]; never emitted by this builder.
    Functions = 0x02,
    /// The globals section; never emitted by this builder.
    Globals = 0x03,
    /// The data segments.
    DataSegments = 0x04,
    /// The indirect-call function table.
    FunctionTable = 0x05,
    /// The end-of-module marker.
    End = 0x06,
    /// The start function index.
    StartFunction = 0x07,
    /// The import table.
    ImportTable = 0x08,
    /// The export table.
    ExportTable = 0x09,
    /// The per-function signature indices.
    FunctionSignatures = 0x0A,
    /// The per-function local declarations and body bytes.
    FunctionBodies = 0x0B,
    /// The function names.
    Names = 0x0C,
}

impl From<SectionCode> for u8 {
    #[inline]
    fn from(code: SectionCode) -> u8 {
        code as u8
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_encodes_an_empty_module() {
        let bytes = ModuleBuilder::new().to_bytes().unwrap();
        assert_eq!(
            bytes,
            [0x00, b'a', b's', b'm', 0x0B, 0x00, 0x00, 0x00, 0x06]
        );
    }
}
