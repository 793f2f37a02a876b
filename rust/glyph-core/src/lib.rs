//! Glyph core — the dynamically-typed calling convention shared by the host
//! and the embedded script engine.
//!
//! Provides the [`Value`](values::Value) tagged union, the sparse
//! [`Frame`](frame::Frame) argument bag, the [`CallError`](errors::CallError)
//! taxonomy, the immutable grammar node model with its validating builders,
//! and the opaque engine boundary traits.
#![warn(clippy::all)]

pub mod engine;
pub mod errors;
pub mod frame;
pub mod grammar;
pub mod values;

pub use errors::CallError;
pub use frame::Frame;
pub use values::Value;
