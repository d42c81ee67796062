use crate::LocalCounts;

/// A function declaration under construction.
///
/// Created through [`ModuleBuilder::add_function`], which hands back a
/// mutable reference for configuration; the module keeps ownership. All
/// setters return the same reference so calls can be chained. A body must be
/// set before the module is serialized (a zero-length body is fine); locals
/// and export aliases are optional.
///
/// [`ModuleBuilder::add_function`]: crate::ModuleBuilder::add_function
#[derive(Clone, Debug)]
pub struct FunctionBuilder {
    pub(crate) name: String,
    pub(crate) sig_index: u32,
    pub(crate) index: u32,
    pub(crate) locals: Option<LocalCounts>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) exports: Vec<String>,
}

impl FunctionBuilder {
    pub(crate) fn new(name: String, sig_index: u32, index: u32) -> FunctionBuilder {
        FunctionBuilder {
            name,
            sig_index,
            index,
            locals: None,
            body: None,
            exports: Vec::new(),
        }
    }

    /// Attach this function's body: pre-encoded instruction bytes, never
    /// inspected by the builder.
    ///
    /// Replaces any previously set body.
    pub fn body(&mut self, body: impl Into<Vec<u8>>) -> &mut FunctionBuilder {
        self.body = Some(body.into());
        self
    }

    /// Declare this function's local variable counts.
    pub fn locals(&mut self, locals: LocalCounts) -> &mut FunctionBuilder {
        self.locals = Some(locals);
        self
    }

    /// Export this function under `name`.
    ///
    /// A function may be exported any number of times under different names.
    pub fn export_as(&mut self, name: impl Into<String>) -> &mut FunctionBuilder {
        self.exports.push(name.into());
        self
    }

    /// Export this function under its own name.
    pub fn export_func(&mut self) -> &mut FunctionBuilder {
        let name = self.name.clone();
        self.export_as(name)
    }

    /// This function's position in the module's function index space,
    /// assigned at creation and stable thereafter.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The index of this function's signature.
    pub fn sig_index(&self) -> u32 {
        self.sig_index
    }

    /// This function's display name; may be empty.
    pub fn name(&self) -> &str {
        &self.name
    }
}
