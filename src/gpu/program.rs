// ============================================================================
// COMPUTE PROGRAM — WGSL source plus name lookups for kernels and bindings
// ============================================================================
//
// Kernels and bindings are addressed by name, resolved once when the binder
// is built.  The WGSL is parsed with naga's front end; lookups walk the
// parsed module's entry points and module-scope globals.

use crate::error::{TileError, TileResult};

/// A resolved compute entry point.  Immutable once found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelHandle {
    name: String,
    workgroup_size: [u32; 3],
}

impl KernelHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `@workgroup_size` declared on the entry point.
    pub fn workgroup_size(&self) -> [u32; 3] {
        self.workgroup_size
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ComputeProgram {
    label: &'static str,
    source: &'static str,
}

impl ComputeProgram {
    pub const fn new(label: &'static str, source: &'static str) -> Self {
        Self { label, source }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Parse the WGSL.  Syntax errors come back as [`TileError::Kernel`]
    /// with naga's annotated message.
    pub fn reflect(&self) -> TileResult<ProgramReflection> {
        let module = naga::front::wgsl::parse_str(self.source).map_err(|e| {
            TileError::kernel(format!("{}: {}", self.label, e.emit_to_string(self.source)))
        })?;
        Ok(ProgramReflection { module })
    }
}

/// Parsed program, queried by name.
pub struct ProgramReflection {
    module: naga::Module,
}

impl ProgramReflection {
    fn compute_entry_points(&self) -> impl Iterator<Item = &naga::EntryPoint> {
        self.module
            .entry_points
            .iter()
            .filter(|ep| ep.stage == naga::ShaderStage::Compute)
    }

    /// Names of every `@compute` entry point, in declaration order.
    pub fn entry_points(&self) -> Vec<&str> {
        self.compute_entry_points().map(|ep| ep.name.as_str()).collect()
    }

    /// Look up a kernel by entry-point name.
    pub fn find_kernel(&self, name: &str) -> TileResult<KernelHandle> {
        self.compute_entry_points()
            .find(|ep| ep.name == name)
            .map(|ep| KernelHandle {
                name: ep.name.clone(),
                workgroup_size: ep.workgroup_size,
            })
            .ok_or_else(|| TileError::KernelNotFound(name.to_string()))
    }

    /// `@binding` index of the module-scope variable called `name`.
    pub fn binding_slot(&self, name: &str) -> TileResult<u32> {
        self.module
            .global_variables
            .iter()
            .find(|(_, var)| var.name.as_deref() == Some(name))
            .and_then(|(_, var)| var.binding.as_ref())
            .map(|rb| rb.binding)
            .ok_or_else(|| TileError::BindingNotFound(name.to_string()))
    }
}
