//! VM pipeline host modules — thin orchestration over the embedded engine's
//! three primitives (`lex`, `parse`, `interpret`).
//!
//! `parse` rejects a script that leaves unparsed trailing bytes
//! (`IncompleteParse`); `run` chains all three primitives and surfaces the
//! first failure; `run_single` additionally unwraps a statically-known single
//! result (`EmptyResult` when the interpreter produced none).
#![warn(clippy::all)]

use std::sync::Arc;

use glyph_core::engine::Engine;
use glyph_core::{CallError, Frame, Value};
use glyph_rt::ModuleFn;

fn take_script(frame: &mut Frame) -> Result<Vec<u8>, CallError> {
    match frame.take(0) {
        None => Err(CallError::MissingArgument(0)),
        Some(Value::Bytes(bytes)) => Ok(bytes),
        Some(other) => Err(CallError::mismatch(0, "bytes", other.type_name())),
    }
}

/// Interpreter arguments from slot 1; absent or mistyped defaults to empty.
fn take_args(frame: &mut Frame) -> Vec<Value> {
    match frame.take(1) {
        Some(Value::List(args)) => args,
        _ => Vec::new(),
    }
}

/// Lex a byte script (slot 0) into an engine-owned tree.
pub fn lex(engine: Arc<dyn Engine>) -> ModuleFn {
    Arc::new(move |mut frame| {
        let script = take_script(&mut frame)?;
        Ok(Value::Tree(engine.lex(&script)?))
    })
}

/// Parse a tree (slot 0) into a program.
///
/// Fails `IncompleteParse` when the engine reports unconsumed trailing bytes.
pub fn parse(engine: Arc<dyn Engine>) -> ModuleFn {
    Arc::new(move |mut frame| {
        let tree = match frame.take(0) {
            None => return Err(CallError::MissingArgument(0)),
            Some(Value::Tree(tree)) => tree,
            Some(other) => return Err(CallError::mismatch(0, "tree", other.type_name())),
        };
        let (program, remaining) = engine.parse(&tree)?;
        if !remaining.is_empty() {
            return Err(CallError::IncompleteParse(remaining.len()));
        }
        Ok(Value::Program(program))
    })
}

/// Interpret a program (slot 0) with arguments from slot 1 (defaults empty).
pub fn interpret(engine: Arc<dyn Engine>) -> ModuleFn {
    Arc::new(move |mut frame| {
        let program = match frame.take(0) {
            None => return Err(CallError::MissingArgument(0)),
            Some(Value::Program(program)) => program,
            Some(other) => return Err(CallError::mismatch(0, "program", other.type_name())),
        };
        let args = take_args(&mut frame);
        Ok(Value::List(engine.interpret(args, &program)?))
    })
}

/// Lex, parse and interpret a script (slot 0) with arguments from slot 1,
/// surfacing the first failure.
pub fn run(engine: Arc<dyn Engine>) -> ModuleFn {
    Arc::new(move |mut frame| {
        let results = run_pipeline(&engine, &mut frame)?;
        Ok(Value::List(results))
    })
}

/// Like [`run`], but the call site statically expects exactly one result:
/// fails `EmptyResult` on an empty result list, otherwise yields its first
/// element.
pub fn run_single(engine: Arc<dyn Engine>) -> ModuleFn {
    Arc::new(move |mut frame| {
        let mut results = run_pipeline(&engine, &mut frame)?;
        if results.is_empty() {
            return Err(CallError::EmptyResult);
        }
        Ok(results.swap_remove(0))
    })
}

fn run_pipeline(engine: &Arc<dyn Engine>, frame: &mut Frame) -> Result<Vec<Value>, CallError> {
    let script = take_script(frame)?;
    let tree = engine.lex(&script)?;
    let (program, remaining) = engine.parse(&tree)?;
    if !remaining.is_empty() {
        return Err(CallError::IncompleteParse(remaining.len()));
    }
    let args = take_args(frame);
    engine.interpret(args, &program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_core::engine::{Program, Tree};

    /// Stub engine: a "script" is the program text, optionally followed by
    /// `|trailing` which the parser reports as unconsumed remainder. The
    /// interpreter yields the uppercased program text (nothing for an empty
    /// program) followed by the call arguments.
    struct StubEngine;

    impl Engine for StubEngine {
        fn lex(&self, script: &[u8]) -> Result<Tree, CallError> {
            Ok(Tree::new(script.to_vec()))
        }

        fn parse(&self, tree: &Tree) -> Result<(Program, Vec<u8>), CallError> {
            let bytes: &Vec<u8> = tree
                .downcast_ref()
                .ok_or_else(|| CallError::Engine("foreign tree".into()))?;
            let (program, remaining) = match bytes.iter().position(|b| *b == b'|') {
                Some(split) => (bytes[..split].to_vec(), bytes[split + 1..].to_vec()),
                None => (bytes.clone(), Vec::new()),
            };
            Ok((Program::new(program), remaining))
        }

        fn interpret(&self, args: Vec<Value>, program: &Program) -> Result<Vec<Value>, CallError> {
            let bytes: &Vec<u8> = program
                .downcast_ref()
                .ok_or_else(|| CallError::Engine("foreign program".into()))?;
            let mut results = Vec::new();
            if !bytes.is_empty() {
                results.push(Value::Bytes(bytes.to_ascii_uppercase()));
            }
            results.extend(args);
            Ok(results)
        }
    }

    fn engine() -> Arc<dyn Engine> {
        Arc::new(StubEngine)
    }

    fn script(text: &str) -> Value {
        Value::Bytes(text.as_bytes().to_vec())
    }

    #[test]
    fn run_matches_manual_composition() {
        let args = Value::List(vec![Value::Uint(7)]);

        let tree = lex(engine())(Frame::from(vec![script("hello")])).unwrap();
        let program = parse(engine())(Frame::from(vec![tree])).unwrap();
        let manual = interpret(engine())(Frame::from(vec![program, args.clone()])).unwrap();

        let chained = run(engine())(Frame::from(vec![script("hello"), args])).unwrap();
        assert_eq!(manual, chained);
        assert_eq!(
            chained,
            Value::List(vec![Value::Bytes(b"HELLO".to_vec()), Value::Uint(7)])
        );
    }

    #[test]
    fn trailing_bytes_fail_incomplete_parse() {
        let err = run(engine())(Frame::from(vec![script("hello|rest")])).unwrap_err();
        assert!(matches!(err, CallError::IncompleteParse(4)));

        let tree = lex(engine())(Frame::from(vec![script("hello|rest")])).unwrap();
        let err = parse(engine())(Frame::from(vec![tree])).unwrap_err();
        assert!(matches!(err, CallError::IncompleteParse(4)));
    }

    #[test]
    fn interpret_defaults_to_empty_args() {
        let chained = run(engine())(Frame::from(vec![script("x")])).unwrap();
        assert_eq!(chained, Value::List(vec![Value::Bytes(b"X".to_vec())]));

        // Mistyped args slot counts as omitted.
        let mistyped = run(engine())(Frame::from(vec![script("x"), Value::Uint(1)])).unwrap();
        assert_eq!(mistyped, Value::List(vec![Value::Bytes(b"X".to_vec())]));
    }

    #[test]
    fn run_single_unwraps_exactly_one() {
        let single = run_single(engine())(Frame::from(vec![script("one")])).unwrap();
        assert_eq!(single, Value::Bytes(b"ONE".to_vec()));

        let err = run_single(engine())(Frame::from(vec![script("")])).unwrap_err();
        assert!(matches!(err, CallError::EmptyResult));
    }

    #[test]
    fn mistyped_script_slot_is_reported() {
        assert!(matches!(
            run(engine())(Frame::from(vec![Value::Uint(3)])),
            Err(CallError::TypeMismatch { slot: 0, .. })
        ));
        assert!(matches!(
            lex(engine())(Frame::new()),
            Err(CallError::MissingArgument(0))
        ));
    }
}
