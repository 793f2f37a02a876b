//! Registry assembly — wires every built-in module family into one flat,
//! process-wide index table.
//!
//! Index values are an internal wiring detail: each family owns a contiguous
//! sub-range and may be renumbered freely as long as the table stays
//! injective. Assembly is fallible, not panicking: any index collision
//! surfaces as [`RegistryError::DuplicateIndex`] so the hosting process
//! decides policy.
//!
//! The pipeline family is self-referential — an engine's module-fetch
//! callback must reach the very registry being assembled. That cycle is
//! broken with a [`DeferredRegistry`]: construct the engine against the empty
//! handle, then let [`assemble`] bind the finished registry into it.
#![warn(clippy::all)]

use std::sync::Arc;

use glyph_core::engine::{Engine, GrammarMatcher};
use glyph_core::{CallError, Frame, Value};
use glyph_provider_fs::Sandbox;
use glyph_rt::{Module, ModuleRegistry, RegistryError};
use once_cell::sync::OnceCell;

/// The flat module index table.
pub mod index {
    // cast family
    pub const CAST_TO_INT: u32 = 0;
    pub const CAST_TO_UINT: u32 = 1;
    pub const CAST_TO_BOOL: u32 = 2;
    pub const CAST_TO_F32: u32 = 3;
    pub const CAST_TO_F64: u32 = 4;

    // list family
    pub const LIST_FROM_FRAME: u32 = 5;
    pub const LIST_FETCH_ELEMENT: u32 = 6;

    // file family (sandboxed)
    pub const FILE_RESOLVE: u32 = 7;
    pub const FILE_OPEN: u32 = 8;
    pub const FILE_CLOSE: u32 = 9;
    pub const FILE_LOCK: u32 = 10;
    pub const FILE_UNLOCK: u32 = 11;
    pub const FILE_INFO: u32 = 12;
    pub const FILE_READ: u32 = 13;
    pub const FILE_WRITE: u32 = 14;

    // grammar builder family
    pub const GRAMMAR_VALUE: u32 = 15;
    pub const GRAMMAR_CARDINALITY: u32 = 16;
    pub const GRAMMAR_ELEMENT: u32 = 17;
    pub const GRAMMAR_COMPOSE: u32 = 18;
    pub const GRAMMAR_CONTAINER: u32 = 19;
    pub const GRAMMAR_LINE: u32 = 20;
    pub const GRAMMAR_BLOCK: u32 = 21;
    pub const GRAMMAR_SUITE: u32 = 22;
    pub const GRAMMAR_SUITES: u32 = 23;
    pub const GRAMMAR_TOKEN: u32 = 24;
    pub const GRAMMAR_EVERYTHING: u32 = 25;
    pub const GRAMMAR_INSTANCE: u32 = 26;
    pub const GRAMMAR_EXTERNAL: u32 = 27;
    pub const GRAMMAR_CHANNEL_CONDITION: u32 = 28;
    pub const GRAMMAR_CHANNEL: u32 = 29;
    pub const GRAMMAR_CHANNELS: u32 = 30;
    pub const GRAMMAR_GRAMMAR: u32 = 31;
    pub const GRAMMAR_EXECUTE: u32 = 32;

    // vm pipeline family
    pub const VM_LEX: u32 = 33;
    pub const VM_PARSE: u32 = 34;
    pub const VM_INTERPRET: u32 = 35;
    pub const VM_RUN: u32 = 36;
    pub const VM_RUN_SINGLE: u32 = 37;
}

// ---------------------------------------------------------------------------
// Deferred registry handle
// ---------------------------------------------------------------------------

/// A registry handle that can be passed around before assembly completes.
///
/// Engines capture a clone of this handle in their module-fetch callback;
/// [`assemble`] binds the finished registry exactly once.
#[derive(Clone, Default)]
pub struct DeferredRegistry {
    cell: Arc<OnceCell<Arc<ModuleRegistry>>>,
}

impl DeferredRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bound registry, or `None` while assembly is still in progress.
    pub fn get(&self) -> Option<Arc<ModuleRegistry>> {
        self.cell.get().cloned()
    }

    /// Invoke a module through the bound registry.
    ///
    /// Calling before assembly completes is an engine-side sequencing defect
    /// and is reported as an engine error, not a panic.
    pub fn invoke(&self, index: u32, frame: Frame) -> Result<Value, CallError> {
        match self.cell.get() {
            Some(registry) => registry.invoke(index, frame),
            None => Err(CallError::Engine(
                "module registry is not assembled yet".into(),
            )),
        }
    }

    fn bind(&self, registry: Arc<ModuleRegistry>) -> Result<(), RegistryError> {
        self.cell
            .set(registry)
            .map_err(|_| RegistryError::AlreadyBound)
    }
}

// ---------------------------------------------------------------------------
// Family sub-maps
// ---------------------------------------------------------------------------

fn register_all(modules: Vec<Module>) -> Result<ModuleRegistry, RegistryError> {
    let mut registry = ModuleRegistry::new();
    for module in modules {
        registry.register_module(module)?;
    }
    Ok(registry)
}

pub fn cast_family() -> Result<ModuleRegistry, RegistryError> {
    use glyph_provider_cast as cast;
    register_all(vec![
        Module::new(index::CAST_TO_INT, cast::to_int()),
        Module::new(index::CAST_TO_UINT, cast::to_uint()),
        Module::new(index::CAST_TO_BOOL, cast::to_bool()),
        Module::new(index::CAST_TO_F32, cast::to_f32()),
        Module::new(index::CAST_TO_F64, cast::to_f64()),
    ])
}

pub fn list_family() -> Result<ModuleRegistry, RegistryError> {
    use glyph_provider_list as list;
    register_all(vec![
        Module::new(index::LIST_FROM_FRAME, list::list_from_frame()),
        Module::new(index::LIST_FETCH_ELEMENT, list::fetch_element()),
    ])
}

pub fn fs_family(sandbox: Arc<Sandbox>) -> Result<ModuleRegistry, RegistryError> {
    use glyph_provider_fs as fs;
    register_all(vec![
        Module::new(index::FILE_RESOLVE, fs::resolve(sandbox.clone())),
        Module::new(index::FILE_OPEN, fs::open(sandbox.clone())),
        Module::new(index::FILE_CLOSE, fs::close()),
        Module::new(index::FILE_LOCK, fs::lock(sandbox)),
        Module::new(index::FILE_UNLOCK, fs::unlock()),
        Module::new(index::FILE_INFO, fs::info()),
        Module::new(index::FILE_READ, fs::read()),
        Module::new(index::FILE_WRITE, fs::write()),
    ])
}

pub fn grammar_family(matcher: Arc<dyn GrammarMatcher>) -> Result<ModuleRegistry, RegistryError> {
    use glyph_provider_grammar as grammar;
    register_all(vec![
        Module::new(index::GRAMMAR_VALUE, grammar::value()),
        Module::new(index::GRAMMAR_CARDINALITY, grammar::cardinality()),
        Module::new(index::GRAMMAR_ELEMENT, grammar::element()),
        Module::new(index::GRAMMAR_COMPOSE, grammar::compose()),
        Module::new(index::GRAMMAR_CONTAINER, grammar::container()),
        Module::new(index::GRAMMAR_LINE, grammar::line()),
        Module::new(index::GRAMMAR_BLOCK, grammar::block()),
        Module::new(index::GRAMMAR_SUITE, grammar::suite()),
        Module::new(index::GRAMMAR_SUITES, grammar::suites()),
        Module::new(index::GRAMMAR_TOKEN, grammar::token()),
        Module::new(index::GRAMMAR_EVERYTHING, grammar::everything()),
        Module::new(index::GRAMMAR_INSTANCE, grammar::instance()),
        Module::new(index::GRAMMAR_EXTERNAL, grammar::external()),
        Module::new(
            index::GRAMMAR_CHANNEL_CONDITION,
            grammar::channel_condition(),
        ),
        Module::new(index::GRAMMAR_CHANNEL, grammar::channel()),
        Module::new(index::GRAMMAR_CHANNELS, grammar::channels()),
        Module::new(index::GRAMMAR_GRAMMAR, grammar::grammar()),
        Module::new(index::GRAMMAR_EXECUTE, grammar::execute(matcher)),
    ])
}

pub fn vm_family(engine: Arc<dyn Engine>) -> Result<ModuleRegistry, RegistryError> {
    use glyph_provider_vm as vm;
    register_all(vec![
        Module::new(index::VM_LEX, vm::lex(engine.clone())),
        Module::new(index::VM_PARSE, vm::parse(engine.clone())),
        Module::new(index::VM_INTERPRET, vm::interpret(engine.clone())),
        Module::new(index::VM_RUN, vm::run(engine.clone())),
        Module::new(index::VM_RUN_SINGLE, vm::run_single(engine)),
    ])
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Compose every family sub-map into the frozen process-wide registry and
/// bind it into `deferred`.
///
/// The engine handed in here is expected to capture a clone of `deferred` as
/// its module-fetch callback; scripts it runs can then call back into these
/// very modules.
pub fn assemble(
    sandbox: Arc<Sandbox>,
    engine: Arc<dyn Engine>,
    matcher: Arc<dyn GrammarMatcher>,
    deferred: &DeferredRegistry,
) -> Result<Arc<ModuleRegistry>, RegistryError> {
    let registry = cast_family()?
        .merge(list_family()?)?
        .merge(fs_family(sandbox)?)?
        .merge(grammar_family(matcher)?)?
        .merge(vm_family(engine)?)?;
    let registry = Arc::new(registry);
    deferred.bind(registry.clone())?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_core::engine::{Program, Tree};
    use glyph_core::grammar::Grammar;
    use std::fs;
    use std::path::PathBuf;

    /// Engine whose interpreter feeds its arguments back through the
    /// registry's `to_uint` module — the self-reference the deferred handle
    /// exists for.
    struct CallbackEngine {
        modules: DeferredRegistry,
    }

    impl Engine for CallbackEngine {
        fn lex(&self, script: &[u8]) -> Result<Tree, CallError> {
            Ok(Tree::new(script.to_vec()))
        }

        fn parse(&self, tree: &Tree) -> Result<(Program, Vec<u8>), CallError> {
            let bytes: &Vec<u8> = tree
                .downcast_ref()
                .ok_or_else(|| CallError::Engine("foreign tree".into()))?;
            Ok((Program::new(bytes.clone()), Vec::new()))
        }

        fn interpret(&self, args: Vec<Value>, _program: &Program) -> Result<Vec<Value>, CallError> {
            args.into_iter()
                .map(|arg| self.modules.invoke(index::CAST_TO_UINT, Frame::from(vec![arg])))
                .collect()
        }
    }

    struct NullMatcher;

    impl GrammarMatcher for NullMatcher {
        fn execute(&self, _grammar: &Grammar, input: &[u8]) -> Result<Value, CallError> {
            Ok(Value::Bytes(input.to_vec()))
        }
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("glyph_host_test_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn assembled() -> (PathBuf, DeferredRegistry, Arc<ModuleRegistry>) {
        let dir = temp_dir();
        let sandbox = Arc::new(Sandbox::new(&dir).unwrap());
        let deferred = DeferredRegistry::new();
        let engine = Arc::new(CallbackEngine {
            modules: deferred.clone(),
        });
        let registry = assemble(sandbox, engine, Arc::new(NullMatcher), &deferred).unwrap();
        (dir, deferred, registry)
    }

    #[test]
    fn all_families_land_in_one_injective_table() {
        let (dir, _deferred, registry) = assembled();
        assert_eq!(registry.len(), 38);

        // One module per family, reached through the flat index space.
        assert_eq!(
            registry
                .invoke(
                    index::CAST_TO_BOOL,
                    Frame::from(vec![Value::Bytes(b"true".to_vec())])
                )
                .unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            registry
                .invoke(
                    index::LIST_FROM_FRAME,
                    Frame::from(vec![Value::Uint(1), Value::Uint(2)])
                )
                .unwrap(),
            Value::List(vec![Value::Uint(1), Value::Uint(2)])
        );
        assert!(matches!(
            registry.invoke(
                index::GRAMMAR_VALUE,
                Frame::from(vec![Value::Uint(97), Value::Bytes(b"a".to_vec())])
            ),
            Ok(Value::GrammarValue(_))
        ));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn deferred_handle_is_empty_until_assembly() {
        let deferred = DeferredRegistry::new();
        assert!(deferred.get().is_none());
        assert!(matches!(
            deferred.invoke(index::CAST_TO_INT, Frame::new()),
            Err(CallError::Engine(_))
        ));
    }

    #[test]
    fn scripts_can_call_back_into_native_modules() {
        let (dir, _deferred, registry) = assembled();

        let args = Value::List(vec![
            Value::Bytes(b" 42 ".to_vec()),
            Value::Int(7),
        ]);
        let result = registry
            .invoke(
                index::VM_RUN,
                Frame::from(vec![Value::Bytes(b"script".to_vec()), args]),
            )
            .unwrap();
        assert_eq!(result, Value::List(vec![Value::Uint(42), Value::Uint(7)]));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn file_modules_operate_inside_the_sandbox() {
        let (dir, _deferred, registry) = assembled();
        fs::write(dir.join("note.txt"), b"payload").unwrap();

        let handle = registry
            .invoke(
                index::FILE_OPEN,
                Frame::from(vec![Value::Bytes(b"note.txt".to_vec())]),
            )
            .unwrap();
        assert_eq!(
            registry
                .invoke(index::FILE_INFO, Frame::from(vec![handle.clone()]))
                .unwrap(),
            Value::Uint(7)
        );
        assert_eq!(
            registry
                .invoke(index::FILE_READ, Frame::from(vec![handle]))
                .unwrap(),
            Value::Bytes(b"payload".to_vec())
        );
        assert!(matches!(
            registry.invoke(
                index::FILE_OPEN,
                Frame::from(vec![Value::Bytes(b"../escape.txt".to_vec())])
            ),
            Err(CallError::PathEscapesSandbox(_))
        ));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn binding_twice_is_an_assembly_defect() {
        let (dir, deferred, registry) = assembled();
        assert_eq!(
            deferred.bind(registry),
            Err(RegistryError::AlreadyBound)
        );
        fs::remove_dir_all(&dir).unwrap();
    }
}
