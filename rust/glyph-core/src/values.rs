//! Tagged value representation crossing the host/script boundary.
//!
//! Every argument a script passes to a host module, and every result a host
//! module hands back, is a [`Value`]. The union is closed: adding a variant
//! forces every marshalling site to handle it at compile time.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine::{Program, Tree};
use crate::grammar;

// ---------------------------------------------------------------------------
// Resource handles
// ---------------------------------------------------------------------------

/// An open file inside the sandbox.
///
/// `Arc`-backed so that [`Value`] stays `Clone` without duplicating the OS
/// resource. A handle is meant for one logical caller at a time; consuming
/// operations (`close`) require the handle to be unshared.
#[derive(Debug, Clone)]
pub struct FileHandle {
    file: Arc<File>,
    path: PathBuf,
}

impl FileHandle {
    pub fn new(file: File, path: PathBuf) -> Self {
        Self {
            file: Arc::new(file),
            path,
        }
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recover the inner [`File`], failing if the handle is still aliased.
    pub fn try_into_inner(self) -> Result<File, Self> {
        let path = self.path;
        Arc::try_unwrap(self.file).map_err(|file| Self { file, path })
    }

    fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.file, &other.file)
    }
}

/// An advisory, non-blocking file lock.
///
/// The lock is cooperative: it only excludes other callers that also acquire
/// locks through the host's lock module, not arbitrary outside processes.
#[derive(Debug, Clone)]
pub struct LockHandle {
    file: Arc<File>,
    path: PathBuf,
}

impl LockHandle {
    pub fn new(file: File, path: PathBuf) -> Self {
        Self {
            file: Arc::new(file),
            path,
        }
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recover the locked [`File`], failing if the handle is still aliased.
    pub fn try_into_inner(self) -> Result<File, Self> {
        let path = self.path;
        Arc::try_unwrap(self.file).map_err(|file| Self { file, path })
    }

    fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.file, &other.file)
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// Runtime values passed between the script engine and host modules.
///
/// Data variants compare structurally; handle and engine-owned variants
/// compare by identity.
#[derive(Debug, Clone)]
pub enum Value {
    Bytes(Vec<u8>),
    Uint(u64),
    Int(i64),
    Bool(bool),
    F32(f32),
    F64(f64),
    List(Vec<Value>),
    File(FileHandle),
    Lock(LockHandle),
    /// Engine-owned syntax tree produced by `lex`.
    Tree(Tree),
    /// Engine-owned compiled program produced by `parse`.
    Program(Program),
    GrammarValue(grammar::Value),
    Cardinality(grammar::Cardinality),
    Element(grammar::Element),
    Compose(grammar::Compose),
    Container(grammar::Container),
    Line(grammar::Line),
    Block(grammar::Block),
    Suite(grammar::Suite),
    Suites(grammar::Suites),
    Token(grammar::Token),
    Everything(grammar::Everything),
    Instance(grammar::Instance),
    External(grammar::External),
    ChannelCondition(grammar::ChannelCondition),
    Channel(grammar::Channel),
    Channels(grammar::Channels),
    Grammar(grammar::Grammar),
}

impl Value {
    /// The variant tag, for diagnostics and `TypeMismatch` errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bytes(_) => "bytes",
            Value::Uint(_) => "uint",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::List(_) => "list",
            Value::File(_) => "file",
            Value::Lock(_) => "lock",
            Value::Tree(_) => "tree",
            Value::Program(_) => "program",
            Value::GrammarValue(_) => "grammar-value",
            Value::Cardinality(_) => "cardinality",
            Value::Element(_) => "element",
            Value::Compose(_) => "compose",
            Value::Container(_) => "container",
            Value::Line(_) => "line",
            Value::Block(_) => "block",
            Value::Suite(_) => "suite",
            Value::Suites(_) => "suites",
            Value::Token(_) => "token",
            Value::Everything(_) => "everything",
            Value::Instance(_) => "instance",
            Value::External(_) => "external",
            Value::ChannelCondition(_) => "channel-condition",
            Value::Channel(_) => "channel",
            Value::Channels(_) => "channels",
            Value::Grammar(_) => "grammar",
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::Uint(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::File(a), Value::File(b)) => a.ptr_eq(b),
            (Value::Lock(a), Value::Lock(b)) => a.ptr_eq(b),
            (Value::Tree(a), Value::Tree(b)) => a.ptr_eq(b),
            (Value::Program(a), Value::Program(b)) => a.ptr_eq(b),
            (Value::GrammarValue(a), Value::GrammarValue(b)) => a == b,
            (Value::Cardinality(a), Value::Cardinality(b)) => a == b,
            (Value::Element(a), Value::Element(b)) => a == b,
            (Value::Compose(a), Value::Compose(b)) => a == b,
            (Value::Container(a), Value::Container(b)) => a == b,
            (Value::Line(a), Value::Line(b)) => a == b,
            (Value::Block(a), Value::Block(b)) => a == b,
            (Value::Suite(a), Value::Suite(b)) => a == b,
            (Value::Suites(a), Value::Suites(b)) => a == b,
            (Value::Token(a), Value::Token(b)) => a == b,
            (Value::Everything(a), Value::Everything(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a == b,
            (Value::External(a), Value::External(b)) => a == b,
            (Value::ChannelCondition(a), Value::ChannelCondition(b)) => a == b,
            (Value::Channel(a), Value::Channel(b)) => a == b,
            (Value::Channels(a), Value::Channels(b)) => a == b,
            (Value::Grammar(a), Value::Grammar(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::Uint(n) => write!(f, "{}", n),
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::F32(x) => write!(f, "{}", x),
            Value::F64(x) => write!(f, "{}", x),
            Value::List(l) => {
                let items: Vec<String> = l.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            other => write!(f, "<{}>", other.type_name()),
        }
    }
}
