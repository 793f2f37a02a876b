//! Grammar-AST builder host modules.
//!
//! One module per grammar node variant, all following the same best-effort
//! assembly pattern: each expected slot is attached to the node's builder only
//! when present and correctly typed (absent or mistyped *optional* fields are
//! silently skipped — that is policy, not validation), and the builder's
//! `finish()` performs the authoritative required-field check. List-valued
//! slots are the exception: every element is checked and a wrong variant fails
//! immediately, naming its index.
//!
//! `execute` hands a finished grammar plus raw input to the external
//! grammar-compiler/matcher and returns its parse result unchanged.
#![warn(clippy::all)]

use std::sync::Arc;

use glyph_core::engine::GrammarMatcher;
use glyph_core::grammar::{
    BlockBuilder, BuildError, CardinalityBuilder, ChannelBuilder, ChannelConditionBuilder,
    ChannelsBuilder, ComposeBuilder, ContainerBuilder, ElementBuilder, EverythingBuilder,
    ExternalBuilder, GrammarBuilder, InstanceBuilder, LineBuilder, Presence, SuiteBuilder,
    SuitesBuilder, TokenBuilder, ValueBuilder,
};
use glyph_core::{CallError, Frame, Value};
use glyph_rt::ModuleFn;

// ---------------------------------------------------------------------------
// Slot helpers
// ---------------------------------------------------------------------------

/// A name slot: bytes decoded as UTF-8 (lossily). Anything else is skipped.
fn optional_name(frame: &mut Frame, slot: u32) -> Option<String> {
    match frame.take(slot) {
        Some(Value::Bytes(bytes)) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        _ => None,
    }
}

fn optional_uint(frame: &mut Frame, slot: u32) -> Option<u64> {
    match frame.take(slot) {
        Some(Value::Uint(n)) => Some(n),
        _ => None,
    }
}

/// A list slot whose elements must all be the given node variant.
fn typed_list<T>(
    frame: &mut Frame,
    slot: u32,
    expected: &'static str,
    extract: impl Fn(Value) -> Result<T, &'static str>,
) -> Result<Vec<T>, CallError> {
    let items = match frame.take(slot) {
        None => return Err(CallError::MissingArgument(slot)),
        Some(Value::List(items)) => items,
        Some(other) => return Err(CallError::mismatch(slot, "list", other.type_name())),
    };
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match extract(item) {
            Ok(node) => out.push(node),
            Err(found) => {
                return Err(BuildError::InvalidElementType {
                    index,
                    expected,
                    found,
                }
                .into())
            }
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Leaf builders
// ---------------------------------------------------------------------------

/// Build a grammar value: byte payload at slot 0, name at slot 1.
pub fn value() -> ModuleFn {
    Arc::new(|mut frame| {
        let mut builder = ValueBuilder::new();
        if let Some(number) = optional_uint(&mut frame, 0) {
            builder = builder.with_number(number);
        }
        if let Some(name) = optional_name(&mut frame, 1) {
            builder = builder.with_name(name);
        }
        Ok(Value::GrammarValue(builder.finish()?))
    })
}

/// Build a cardinality: minimum at slot 0, optional maximum at slot 1.
pub fn cardinality() -> ModuleFn {
    Arc::new(|mut frame| {
        let mut builder = CardinalityBuilder::new();
        if let Some(min) = optional_uint(&mut frame, 0) {
            builder = builder.with_min(min);
        }
        if let Some(max) = optional_uint(&mut frame, 1) {
            builder = builder.with_max(max);
        }
        Ok(Value::Cardinality(builder.finish()?))
    })
}

/// Build an element: cardinality at slot 0, then exactly one of value
/// (slot 1), external (slot 2) or instance (slot 3).
pub fn element() -> ModuleFn {
    Arc::new(|mut frame| {
        let mut builder = ElementBuilder::new();
        if let Some(Value::Cardinality(card)) = frame.take(0) {
            builder = builder.with_cardinality(card);
        }
        if let Some(Value::GrammarValue(v)) = frame.take(1) {
            builder = builder.with_value(v);
        }
        if let Some(Value::External(ext)) = frame.take(2) {
            builder = builder.with_external(ext);
        }
        if let Some(Value::Instance(ins)) = frame.take(3) {
            builder = builder.with_instance(ins);
        }
        Ok(Value::Element(builder.finish()?))
    })
}

/// Build a compose branch from a list of elements at slot 0.
pub fn compose() -> ModuleFn {
    Arc::new(|mut frame| {
        let elements = typed_list(&mut frame, 0, "element", |item| match item {
            Value::Element(e) => Ok(e),
            other => Err(other.type_name()),
        })?;
        Ok(Value::Compose(
            ComposeBuilder::new().with_elements(elements).finish()?,
        ))
    })
}

/// Build a container: element at slot 0, presence code (0/1/2) at slot 1.
pub fn container() -> ModuleFn {
    Arc::new(|mut frame| {
        let mut builder = ContainerBuilder::new();
        if let Some(Value::Element(e)) = frame.take(0) {
            builder = builder.with_element(e);
        }
        if let Some(code) = optional_uint(&mut frame, 1) {
            builder = builder.with_presence(Presence::from_code(code)?);
        }
        Ok(Value::Container(builder.finish()?))
    })
}

/// Build a line from a list of containers at slot 0.
pub fn line() -> ModuleFn {
    Arc::new(|mut frame| {
        let containers = typed_list(&mut frame, 0, "container", |item| match item {
            Value::Container(c) => Ok(c),
            other => Err(other.type_name()),
        })?;
        Ok(Value::Line(
            LineBuilder::new().with_containers(containers).finish()?,
        ))
    })
}

/// Build a block from a list of lines at slot 0.
pub fn block() -> ModuleFn {
    Arc::new(|mut frame| {
        let lines = typed_list(&mut frame, 0, "line", |item| match item {
            Value::Line(l) => Ok(l),
            other => Err(other.type_name()),
        })?;
        Ok(Value::Block(BlockBuilder::new().with_lines(lines).finish()?))
    })
}

// ---------------------------------------------------------------------------
// Suites & tokens
// ---------------------------------------------------------------------------

/// Build a suite: valid compose at slot 0, optional invalid compose at slot 1.
pub fn suite() -> ModuleFn {
    Arc::new(|mut frame| {
        let mut builder = SuiteBuilder::new();
        if let Some(Value::Compose(valid)) = frame.take(0) {
            builder = builder.with_valid(valid);
        }
        if let Some(Value::Compose(invalid)) = frame.take(1) {
            builder = builder.with_invalid(invalid);
        }
        Ok(Value::Suite(builder.finish()?))
    })
}

/// Build a suites list from a list of suites at slot 0.
pub fn suites() -> ModuleFn {
    Arc::new(|mut frame| {
        let list = typed_list(&mut frame, 0, "suite", |item| match item {
            Value::Suite(s) => Ok(s),
            other => Err(other.type_name()),
        })?;
        Ok(Value::Suites(SuitesBuilder::new().with_list(list).finish()?))
    })
}

/// Build a token: name at slot 0, block at slot 1, optional suites at slot 2.
pub fn token() -> ModuleFn {
    Arc::new(|mut frame| {
        let mut builder = TokenBuilder::new();
        if let Some(name) = optional_name(&mut frame, 0) {
            builder = builder.with_name(name);
        }
        if let Some(Value::Block(b)) = frame.take(1) {
            builder = builder.with_block(b);
        }
        if let Some(Value::Suites(s)) = frame.take(2) {
            builder = builder.with_suites(s);
        }
        Ok(Value::Token(builder.finish()?))
    })
}

/// Build a catch-all: name at slot 0, exception token at slot 1, optional
/// escape token at slot 2.
pub fn everything() -> ModuleFn {
    Arc::new(|mut frame| {
        let mut builder = EverythingBuilder::new();
        if let Some(name) = optional_name(&mut frame, 0) {
            builder = builder.with_name(name);
        }
        if let Some(Value::Token(exception)) = frame.take(1) {
            builder = builder.with_exception(exception);
        }
        if let Some(Value::Token(escape)) = frame.take(2) {
            builder = builder.with_escape(escape);
        }
        Ok(Value::Everything(builder.finish()?))
    })
}

/// Build an instance: token at slot 0, optional catch-all at slot 1.
pub fn instance() -> ModuleFn {
    Arc::new(|mut frame| {
        let mut builder = InstanceBuilder::new();
        if let Some(Value::Token(t)) = frame.take(0) {
            builder = builder.with_token(t);
        }
        if let Some(Value::Everything(e)) = frame.take(1) {
            builder = builder.with_everything(e);
        }
        Ok(Value::Instance(builder.finish()?))
    })
}

/// Build an external reference: name at slot 0, sub-grammar at slot 1.
pub fn external() -> ModuleFn {
    Arc::new(|mut frame| {
        let mut builder = ExternalBuilder::new();
        if let Some(name) = optional_name(&mut frame, 0) {
            builder = builder.with_name(name);
        }
        if let Some(Value::Grammar(g)) = frame.take(1) {
            builder = builder.with_grammar(g);
        }
        Ok(Value::External(builder.finish()?))
    })
}

// ---------------------------------------------------------------------------
// Channels & grammar root
// ---------------------------------------------------------------------------

/// Build a channel condition: previous token at slot 0, next token at slot 1.
pub fn channel_condition() -> ModuleFn {
    Arc::new(|mut frame| {
        let mut builder = ChannelConditionBuilder::new();
        if let Some(Value::Token(previous)) = frame.take(0) {
            builder = builder.with_previous(previous);
        }
        if let Some(Value::Token(next)) = frame.take(1) {
            builder = builder.with_next(next);
        }
        Ok(Value::ChannelCondition(builder.finish()?))
    })
}

/// Build a channel: token at slot 0, optional condition at slot 1.
pub fn channel() -> ModuleFn {
    Arc::new(|mut frame| {
        let mut builder = ChannelBuilder::new();
        if let Some(Value::Token(t)) = frame.take(0) {
            builder = builder.with_token(t);
        }
        if let Some(Value::ChannelCondition(c)) = frame.take(1) {
            builder = builder.with_condition(c);
        }
        Ok(Value::Channel(builder.finish()?))
    })
}

/// Build a channels list from a list of channels at slot 0.
pub fn channels() -> ModuleFn {
    Arc::new(|mut frame| {
        let list = typed_list(&mut frame, 0, "channel", |item| match item {
            Value::Channel(c) => Ok(c),
            other => Err(other.type_name()),
        })?;
        Ok(Value::Channels(
            ChannelsBuilder::new().with_list(list).finish()?,
        ))
    })
}

/// Build a grammar: root token at slot 0, optional channels at slot 1.
pub fn grammar() -> ModuleFn {
    Arc::new(|mut frame| {
        let mut builder = GrammarBuilder::new();
        if let Some(Value::Token(root)) = frame.take(0) {
            builder = builder.with_root(root);
        }
        if let Some(Value::Channels(c)) = frame.take(1) {
            builder = builder.with_channels(c);
        }
        Ok(Value::Grammar(builder.finish()?))
    })
}

/// Match raw input (slot 1, bytes) against a finished grammar (slot 0),
/// delegating to the external matcher; its parse result is returned unchanged.
pub fn execute(matcher: Arc<dyn GrammarMatcher>) -> ModuleFn {
    Arc::new(move |mut frame| {
        let grammar = match frame.take(0) {
            None => return Err(CallError::MissingArgument(0)),
            Some(Value::Grammar(g)) => g,
            Some(other) => return Err(CallError::mismatch(0, "grammar", other.type_name())),
        };
        let data = match frame.take(1) {
            None => return Err(CallError::MissingArgument(1)),
            Some(Value::Bytes(bytes)) => bytes,
            Some(other) => return Err(CallError::mismatch(1, "bytes", other.type_name())),
        };
        matcher.execute(&grammar, &data)
    })
}
