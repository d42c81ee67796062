use crate::{encoders, FuncSig, FunctionBuilder, SectionCode, SigRef, ValType, MAGIC, VERSION};
use log::debug;
use thiserror::Error;

/// Errors that can occur when serializing a module.
///
/// Configuration calls never fail; everything is detected lazily by
/// [`ModuleBuilder::to_bytes`], before any output is produced.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    /// A function or import referenced a signature index that no
    /// `add_signature` call produced.
    #[error("signature index {index} is out of bounds ({count} signatures declared)")]
    SignatureIndexOutOfBounds {
        /// The offending index.
        index: u32,
        /// How many signatures the module declares.
        count: u32,
    },
    /// A function was declared but its body was never set.
    #[error("function {index} (`{name}`) has no body")]
    MissingFunctionBody {
        /// The function's index.
        index: u32,
        /// The function's display name; may be empty.
        name: String,
    },
}

/// A declared import: an external function binding the module expects the
/// host to supply at instantiation time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Import {
    /// The originating module name.
    pub module: String,
    /// The member within that module; encoded as the empty string when
    /// absent.
    pub name: Option<String>,
    /// The index of the imported function's signature.
    pub sig_index: u32,
}

/// The module's linear memory declaration. At most one per module.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Memory {
    /// Minimum size in pages.
    pub min: u32,
    /// Maximum size in pages.
    pub max: u32,
    /// Whether the memory is exported to the host.
    pub exported: bool,
}

/// A static byte range written into linear memory at instantiation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DataSegment {
    /// The target linear-memory address.
    pub addr: u32,
    /// The bytes to write there.
    pub data: Vec<u8>,
    /// Whether the segment is written at instantiation. Carried for the
    /// caller's bookkeeping; the encoding has no slot for it.
    pub init: bool,
}

/// A consumer that can instantiate a finished module binary.
///
/// The builder treats instantiation as a black box: it serializes the module
/// and forwards the bytes, an optional table of host function bindings, and
/// an optional externally supplied memory. An engine binding implements this
/// trait; see [`ModuleBuilder::instantiate`].
pub trait InstantiationSink {
    /// Host function bindings resolved against the module's imports.
    type Ffi;
    /// An externally supplied linear memory.
    type Memory;
    /// The instantiated module handle.
    type Instance;
    /// The sink's failure type.
    type Error;

    /// Instantiate `wasm`, resolving imports against `ffi` and backing the
    /// module with `memory` when one is supplied.
    fn instantiate(
        &mut self,
        wasm: &[u8],
        ffi: Option<&Self::Ffi>,
        memory: Option<&Self::Memory>,
    ) -> Result<Self::Instance, Self::Error>;
}

/// Errors from [`ModuleBuilder::instantiate`].
#[derive(Debug, Error)]
pub enum InstantiateError<E> {
    /// The module failed to serialize.
    #[error(transparent)]
    Encode(#[from] Error),
    /// The sink rejected the serialized module.
    #[error("instantiation failed")]
    Sink(#[source] E),
}

/// A builder for a legacy-format WebAssembly module.
///
/// Owns every module-level collection: the signature table, imports,
/// functions, the optional linear memory, the indirect-call function table,
/// data segments, raw explicit sections, and the optional start function.
/// [`ModuleBuilder::to_bytes`] serializes them in the fixed section order of
/// the format, regardless of the order the configuration calls were made in.
#[derive(Clone, Debug, Default)]
pub struct ModuleBuilder {
    signatures: Vec<FuncSig>,
    imports: Vec<Import>,
    functions: Vec<FunctionBuilder>,
    memory: Option<Memory>,
    function_table: Vec<u32>,
    data_segments: Vec<DataSegment>,
    explicit: Vec<Vec<u8>>,
    start_index: Option<u32>,
}

impl ModuleBuilder {
    /// Begin building a new, empty module.
    pub fn new() -> ModuleBuilder {
        ModuleBuilder::default()
    }

    /// Append a signature to the module's signature table and return its
    /// index.
    ///
    /// Identical signatures are not deduplicated; every call occupies a new
    /// slot.
    pub fn add_signature(&mut self, sig: FuncSig) -> u32 {
        self.signatures.push(sig);
        u32::try_from(self.signatures.len() - 1).unwrap()
    }

    /// Declare a function and return a handle for configuring it.
    ///
    /// An inline [`FuncSig`] is registered with [`Self::add_signature`]
    /// first; a [`SigRef::ByIndex`] is stored unchecked until serialization.
    /// The function's position in the index space is assigned here and never
    /// changes.
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        sig: impl Into<SigRef>,
    ) -> &mut FunctionBuilder {
        let sig_index = self.resolve_sig(sig.into());
        let index = u32::try_from(self.functions.len()).unwrap();
        self.functions
            .push(FunctionBuilder::new(name.into(), sig_index, index));
        self.functions.last_mut().unwrap()
    }

    /// Declare an imported function and return its index in the import
    /// space.
    ///
    /// `name` is the member within `module` to bind, or `None` to import the
    /// module binding itself.
    pub fn add_import(
        &mut self,
        module: impl Into<String>,
        name: Option<&str>,
        sig: impl Into<SigRef>,
    ) -> u32 {
        let sig_index = self.resolve_sig(sig.into());
        self.imports.push(Import {
            module: module.into(),
            name: name.map(str::to_string),
            sig_index,
        });
        u32::try_from(self.imports.len() - 1).unwrap()
    }

    /// Declare the module's linear memory, replacing any prior declaration.
    ///
    /// `min` and `max` are page counts; `exported` marks the memory as
    /// visible to the host.
    pub fn add_memory(&mut self, min: u32, max: u32, exported: bool) -> &mut ModuleBuilder {
        self.memory = Some(Memory { min, max, exported });
        self
    }

    /// Append a data segment and return its index.
    ///
    /// Segments encode in declaration order; overlapping ranges are the
    /// caller's responsibility.
    pub fn add_data_segment(&mut self, addr: u32, data: impl Into<Vec<u8>>, init: bool) -> u32 {
        self.data_segments.push(DataSegment {
            addr,
            data: data.into(),
            init,
        });
        u32::try_from(self.data_segments.len() - 1).unwrap()
    }

    /// Append function indices to the indirect-call table.
    ///
    /// Duplicates and out-of-range indices are not validated here; the
    /// consumer sees them as-is.
    pub fn append_to_function_table(&mut self, indices: &[u32]) -> &mut ModuleBuilder {
        self.function_table.extend_from_slice(indices);
        self
    }

    /// Append an already fully encoded section verbatim.
    ///
    /// Explicit sections are spliced into the output unmodified, after all
    /// structured sections and before the end marker.
    pub fn add_explicit_section(&mut self, bytes: impl Into<Vec<u8>>) -> &mut ModuleBuilder {
        self.explicit.push(bytes.into());
        self
    }

    /// Record the function invoked automatically at instantiation.
    pub fn set_start(&mut self, index: u32) -> &mut ModuleBuilder {
        self.start_index = Some(index);
        self
    }

    fn resolve_sig(&mut self, sig: SigRef) -> u32 {
        match sig {
            SigRef::Inline(sig) => self.add_signature(sig),
            SigRef::ByIndex(index) => index,
        }
    }

    /// Check every lazily validated reference, require a body on every
    /// function, and compute the values derived from the function
    /// collection: whether any function is named, and the total export-alias
    /// count. Runs before a single byte is emitted so failures leave nothing
    /// behind.
    fn validate(&self) -> Result<(bool, u32), Error> {
        let num_sigs = u32::try_from(self.signatures.len()).unwrap();
        for import in &self.imports {
            if import.sig_index >= num_sigs {
                return Err(Error::SignatureIndexOutOfBounds {
                    index: import.sig_index,
                    count: num_sigs,
                });
            }
        }
        let mut has_names = false;
        let mut num_exports = 0u32;
        for func in &self.functions {
            if func.sig_index >= num_sigs {
                return Err(Error::SignatureIndexOutOfBounds {
                    index: func.sig_index,
                    count: num_sigs,
                });
            }
            if func.body.is_none() {
                return Err(Error::MissingFunctionBody {
                    index: func.index,
                    name: func.name.clone(),
                });
            }
            has_names |= !func.name.is_empty();
            num_exports += u32::try_from(func.exports.len()).unwrap();
        }
        Ok((has_names, num_exports))
    }

    /// Serialize the module into its binary encoding.
    ///
    /// Sections are emitted in the format's fixed order and a section is
    /// skipped entirely when its backing collection is empty; only the
    /// 8-byte preamble and the end marker are unconditional. Serialization
    /// reads the builder without mutating it, so repeated calls yield
    /// identical bytes.
    ///
    /// Fails if a function's body was never set or a signature index given
    /// through [`SigRef::ByIndex`] is out of bounds; nothing is produced on
    /// failure.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let (has_names, num_exports) = self.validate()?;

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&VERSION);

        if let Some(memory) = &self.memory {
            debug!("emitting memory at offset {}", bytes.len());
            bytes.push(SectionCode::Memory.into());
            bytes.extend(encoders::varint(memory.min));
            bytes.extend(encoders::varint(memory.max));
            bytes.push(memory.exported as u8);
        }

        if !self.signatures.is_empty() {
            debug!("emitting signatures at offset {}", bytes.len());
            bytes.push(SectionCode::Signatures.into());
            bytes.extend(encoders::varint(
                u32::try_from(self.signatures.len()).unwrap(),
            ));
            for sig in &self.signatures {
                bytes.extend(encoders::varint(u32::try_from(sig.params.len()).unwrap()));
                bytes.push(sig.ret.into());
                for param in &sig.params {
                    bytes.push((*param).into());
                }
            }
        }

        if !self.imports.is_empty() {
            debug!("emitting imports at offset {}", bytes.len());
            bytes.push(SectionCode::ImportTable.into());
            bytes.extend(encoders::varint(u32::try_from(self.imports.len()).unwrap()));
            for import in &self.imports {
                bytes.extend(encoders::varint(import.sig_index));
                bytes.extend(encoders::str(&import.module));
                bytes.extend(encoders::str(import.name.as_deref().unwrap_or("")));
            }
        }

        if !self.functions.is_empty() {
            let num_functions = u32::try_from(self.functions.len()).unwrap();

            debug!("emitting function signatures at offset {}", bytes.len());
            bytes.push(SectionCode::FunctionSignatures.into());
            bytes.extend(encoders::varint(num_functions));
            for func in &self.functions {
                bytes.extend(encoders::varint(func.sig_index));
            }

            debug!("emitting function bodies at offset {}", bytes.len());
            bytes.push(SectionCode::FunctionBodies.into());
            bytes.extend(encoders::varint(num_functions));
            for func in &self.functions {
                let Some(body) = &func.body else {
                    return Err(Error::MissingFunctionBody {
                        index: func.index,
                        name: func.name.clone(),
                    });
                };

                let locals = func.locals.unwrap_or_default();
                let local_decls = [
                    (locals.i32_count, ValType::I32),
                    (locals.i64_count, ValType::I64),
                    (locals.f32_count, ValType::F32),
                    (locals.f64_count, ValType::F64),
                ];
                let num_decls = local_decls.iter().filter(|(count, _)| *count > 0).count();

                let mut header = Vec::new();
                header.extend(encoders::varint(u32::try_from(num_decls).unwrap()));
                for (count, ty) in local_decls {
                    if count > 0 {
                        header.extend(encoders::varint(count));
                        header.push(ty.into());
                    }
                }

                bytes.extend(encoders::varint(
                    u32::try_from(header.len() + body.len()).unwrap(),
                ));
                bytes.extend_from_slice(&header);
                bytes.extend_from_slice(body);
            }
        }

        if has_names {
            debug!("emitting names at offset {}", bytes.len());
            bytes.push(SectionCode::Names.into());
            bytes.extend(encoders::varint(
                u32::try_from(self.functions.len()).unwrap(),
            ));
            for func in &self.functions {
                bytes.extend(encoders::str(&func.name));
                // local names count
                bytes.push(0);
            }
        }

        if let Some(start_index) = self.start_index {
            debug!("emitting start function at offset {}", bytes.len());
            bytes.push(SectionCode::StartFunction.into());
            bytes.extend(encoders::varint(start_index));
        }

        if !self.function_table.is_empty() {
            debug!("emitting function table at offset {}", bytes.len());
            bytes.push(SectionCode::FunctionTable.into());
            bytes.extend(encoders::varint(
                u32::try_from(self.function_table.len()).unwrap(),
            ));
            for index in &self.function_table {
                bytes.extend(encoders::varint(*index));
            }
        }

        if num_exports > 0 {
            debug!("emitting exports at offset {}", bytes.len());
            bytes.push(SectionCode::ExportTable.into());
            bytes.extend(encoders::varint(num_exports));
            for func in &self.functions {
                for name in &func.exports {
                    bytes.extend(encoders::varint(func.index));
                    bytes.extend(encoders::str(name));
                }
            }
        }

        if !self.data_segments.is_empty() {
            debug!("emitting data segments at offset {}", bytes.len());
            bytes.push(SectionCode::DataSegments.into());
            bytes.extend(encoders::varint(
                u32::try_from(self.data_segments.len()).unwrap(),
            ));
            for segment in &self.data_segments {
                bytes.extend(encoders::varint(segment.addr));
                bytes.extend(encoders::varint(u32::try_from(segment.data.len()).unwrap()));
                bytes.extend_from_slice(&segment.data);
            }
        }

        for section in &self.explicit {
            debug!("emitting explicit section at offset {}", bytes.len());
            bytes.extend_from_slice(section);
        }

        debug!("emitting end at offset {}", bytes.len());
        bytes.push(SectionCode::End.into());

        Ok(bytes)
    }

    /// Serialize the module into a fixed-size buffer.
    pub fn to_buffer(&self) -> Result<Box<[u8]>, Error> {
        Ok(self.to_bytes()?.into_boxed_slice())
    }

    /// Serialize the module and hand it to `sink` for instantiation.
    pub fn instantiate<S>(
        &self,
        sink: &mut S,
        ffi: Option<&S::Ffi>,
        memory: Option<&S::Memory>,
    ) -> Result<S::Instance, InstantiateError<S::Error>>
    where
        S: InstantiationSink,
    {
        let wasm = self.to_bytes()?;
        sink.instantiate(&wasm, ffi, memory)
            .map_err(InstantiateError::Sink)
    }
}
