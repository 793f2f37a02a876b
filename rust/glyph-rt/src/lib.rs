//! Module registry — the numerically-indexed table of native functions the
//! embedded script engine calls into.
//!
//! A [`ModuleRegistry`] is assembled once at startup from per-family sub-maps,
//! then frozen and shared read-only with the engine (wrap it in an `Arc`);
//! concurrent lookups need no synchronization. A duplicate index anywhere in
//! the assembly is a configuration defect reported to the host entry point,
//! never a runtime error surfaced to scripts.
#![warn(clippy::all)]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use glyph_core::{CallError, Frame, Value};
use thiserror::Error;

/// Registry assembly and lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("module index {0} is already registered")]
    DuplicateIndex(u32),

    #[error("no module registered at index {0}")]
    UnknownModule(u32),

    #[error("registry handle is already bound")]
    AlreadyBound,
}

/// The native function signature: a sparse argument frame in, a dynamic value
/// or a typed per-call failure out.
pub type ModuleFn = Arc<dyn Fn(Frame) -> Result<Value, CallError> + Send + Sync>;

/// A single (index, native function) pair.
#[derive(Clone)]
pub struct Module {
    index: u32,
    func: ModuleFn,
}

impl Module {
    pub fn new(index: u32, func: ModuleFn) -> Self {
        Self { index, func }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn func(&self) -> &ModuleFn {
        &self.func
    }
}

/// An injective index → function table.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<u32, ModuleFn>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function at `index`.
    ///
    /// Fails with [`RegistryError::DuplicateIndex`] if the index is taken.
    pub fn register(&mut self, index: u32, func: ModuleFn) -> Result<(), RegistryError> {
        if self.modules.contains_key(&index) {
            return Err(RegistryError::DuplicateIndex(index));
        }
        self.modules.insert(index, func);
        Ok(())
    }

    /// Register a prebuilt [`Module`] pair.
    pub fn register_module(&mut self, module: Module) -> Result<(), RegistryError> {
        self.register(module.index, module.func)
    }

    /// Union of two registries; fails on any index collision.
    pub fn merge(mut self, other: ModuleRegistry) -> Result<ModuleRegistry, RegistryError> {
        for (index, func) in other.modules {
            self.register(index, func)?;
        }
        Ok(self)
    }

    pub fn lookup(&self, index: u32) -> Result<&ModuleFn, RegistryError> {
        self.modules
            .get(&index)
            .ok_or(RegistryError::UnknownModule(index))
    }

    /// Invoke the module at `index` with `frame`.
    ///
    /// An unknown index is an engine-side wiring defect and surfaces as
    /// [`CallError::Engine`]; everything else is the module's own result.
    pub fn invoke(&self, index: u32, frame: Frame) -> Result<Value, CallError> {
        let func = self
            .lookup(index)
            .map_err(|err| CallError::Engine(err.to_string()))?;
        func(frame)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.modules.keys().copied()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("indices", &self.indices().collect::<Vec<_>>())
            .finish()
    }
}
