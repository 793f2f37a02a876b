//! Opaque boundary to the external lexer/parser/interpreter engine.
//!
//! The bridge never inspects a [`Tree`] or [`Program`]; it only carries them
//! between engine calls. Both are type-erased handles an engine implementation
//! can downcast back to its concrete representation.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::errors::CallError;
use crate::grammar::Grammar;
use crate::values::Value;

/// Engine-owned syntax tree produced by `lex`.
#[derive(Clone)]
pub struct Tree(Arc<dyn Any + Send + Sync>);

/// Engine-owned compiled program produced by `parse`.
#[derive(Clone)]
pub struct Program(Arc<dyn Any + Send + Sync>);

impl Tree {
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self(Arc::new(inner))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Program {
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self(Arc::new(inner))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Tree(..)")
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Program(..)")
    }
}

/// The embedded VM's three primitives, implemented outside this bridge.
///
/// `parse` returns the compiled program together with any unconsumed trailing
/// bytes; the pipeline modules reject a non-empty remainder.
pub trait Engine: Send + Sync {
    fn lex(&self, script: &[u8]) -> Result<Tree, CallError>;

    fn parse(&self, tree: &Tree) -> Result<(Program, Vec<u8>), CallError>;

    fn interpret(&self, args: Vec<Value>, program: &Program) -> Result<Vec<Value>, CallError>;
}

/// The external grammar-compiler/matcher the `execute` module delegates to.
pub trait GrammarMatcher: Send + Sync {
    fn execute(&self, grammar: &Grammar, input: &[u8]) -> Result<Value, CallError>;
}
