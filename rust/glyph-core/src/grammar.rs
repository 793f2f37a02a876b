//! Immutable grammar node model.
//!
//! A grammar is a tree of value nodes: a root [`Token`] plus optional
//! [`Channels`] for skippable content (whitespace, comments). Each parent owns
//! its children by value — no shared mutable sub-trees, no cycles.
//!
//! Every node is produced in two phases, mirroring how host modules assemble
//! them from loosely-typed argument frames:
//!
//! 1. a mutable builder accumulates whatever well-typed fields the caller
//!    supplied (absent or mistyped optional fields are simply not set), then
//! 2. `finish()` performs the authoritative required-field validation and
//!    returns the immutable node or a [`BuildError`] naming the defect.
//!
//! Nothing mutates a node after `finish()`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Construction failures reported by a builder's `finish()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("required field {0:?} is missing")]
    MissingField(&'static str),

    #[error("byte payload {0} exceeds 255")]
    ByteOutOfRange(u64),

    #[error("cardinality maximum {max} is below minimum {min}")]
    MaxBelowMin { min: u64, max: u64 },

    #[error("{what} code {value} out of range (max {max})")]
    OutOfRange {
        what: &'static str,
        value: u64,
        max: u64,
    },

    #[error("{0} list must not be empty")]
    EmptyList(&'static str),

    #[error("element at index {index} was expected to be a {expected}, found {found}")]
    InvalidElementType {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("element content set more than once")]
    ConflictingContent,
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A named single-byte literal, the leaf of every grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    name: String,
    byte: u8,
}

impl Value {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte(&self) -> u8 {
        self.byte
    }
}

#[derive(Debug, Default)]
pub struct ValueBuilder {
    name: Option<String>,
    number: Option<u64>,
}

impl ValueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// The byte payload, still unnarrowed; `finish` rejects values > 255.
    pub fn with_number(mut self, number: u64) -> Self {
        self.number = Some(number);
        self
    }

    pub fn finish(self) -> Result<Value, BuildError> {
        let name = self.name.ok_or(BuildError::MissingField("name"))?;
        let number = self.number.ok_or(BuildError::MissingField("number"))?;
        let byte = u8::try_from(number).map_err(|_| BuildError::ByteOutOfRange(number))?;
        Ok(Value { name, byte })
    }
}

// ---------------------------------------------------------------------------
// Cardinality
// ---------------------------------------------------------------------------

/// Occurrence bounds for an element: at least `min`, at most `max` (unbounded
/// when `max` is `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cardinality {
    min: u64,
    max: Option<u64>,
}

impl Cardinality {
    /// Exactly-once, the most common cardinality.
    pub fn once() -> Self {
        Self {
            min: 1,
            max: Some(1),
        }
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> Option<u64> {
        self.max
    }
}

#[derive(Debug, Default)]
pub struct CardinalityBuilder {
    min: Option<u64>,
    max: Option<u64>,
}

impl CardinalityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min(mut self, min: u64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: u64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn finish(self) -> Result<Cardinality, BuildError> {
        let min = self.min.ok_or(BuildError::MissingField("min"))?;
        if let Some(max) = self.max {
            if max < min {
                return Err(BuildError::MaxBelowMin { min, max });
            }
        }
        Ok(Cardinality { min, max: self.max })
    }
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// What an element matches: a byte literal, an imported grammar, or a nested
/// token instance. Boxed variants break the recursion through
/// `Instance → Token → … → Element`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementContent {
    Value(Value),
    External(Box<External>),
    Instance(Box<Instance>),
}

impl ElementContent {
    pub fn kind(&self) -> &'static str {
        match self {
            ElementContent::Value(_) => "value",
            ElementContent::External(_) => "external",
            ElementContent::Instance(_) => "instance",
        }
    }
}

/// One matchable unit of a line, gated by a cardinality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    cardinality: Cardinality,
    content: ElementContent,
}

impl Element {
    pub fn cardinality(&self) -> &Cardinality {
        &self.cardinality
    }

    pub fn content(&self) -> &ElementContent {
        &self.content
    }
}

#[derive(Debug, Default)]
pub struct ElementBuilder {
    cardinality: Option<Cardinality>,
    content: Option<ElementContent>,
    conflicting: bool,
}

impl ElementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    pub fn with_value(self, value: Value) -> Self {
        self.set_content(ElementContent::Value(value))
    }

    pub fn with_external(self, external: External) -> Self {
        self.set_content(ElementContent::External(Box::new(external)))
    }

    pub fn with_instance(self, instance: Instance) -> Self {
        self.set_content(ElementContent::Instance(Box::new(instance)))
    }

    fn set_content(mut self, content: ElementContent) -> Self {
        if self.content.is_some() {
            self.conflicting = true;
        } else {
            self.content = Some(content);
        }
        self
    }

    pub fn finish(self) -> Result<Element, BuildError> {
        if self.conflicting {
            return Err(BuildError::ConflictingContent);
        }
        let cardinality = self.cardinality.ok_or(BuildError::MissingField("cardinality"))?;
        let content = self.content.ok_or(BuildError::MissingField("content"))?;
        Ok(Element {
            cardinality,
            content,
        })
    }
}

// ---------------------------------------------------------------------------
// Compose & Container
// ---------------------------------------------------------------------------

/// An ordered element composition — the payload of a suite branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compose(Vec<Element>);

impl Compose {
    pub fn elements(&self) -> &[Element] {
        &self.0
    }
}

#[derive(Debug, Default)]
pub struct ComposeBuilder {
    elements: Option<Vec<Element>>,
}

impl ComposeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elements(mut self, elements: Vec<Element>) -> Self {
        self.elements = Some(elements);
        self
    }

    pub fn finish(self) -> Result<Compose, BuildError> {
        let elements = self.elements.ok_or(BuildError::MissingField("elements"))?;
        if elements.is_empty() {
            return Err(BuildError::EmptyList("elements"));
        }
        Ok(Compose(elements))
    }
}

/// How a container composes with its siblings on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    Required,
    Optional,
    Alternate,
}

impl Presence {
    /// Decode the integer code scripts use at the call boundary.
    pub fn from_code(code: u64) -> Result<Self, BuildError> {
        match code {
            0 => Ok(Presence::Required),
            1 => Ok(Presence::Optional),
            2 => Ok(Presence::Alternate),
            _ => Err(BuildError::OutOfRange {
                what: "presence",
                value: code,
                max: 2,
            }),
        }
    }
}

/// An element together with its composition marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    element: Element,
    presence: Presence,
}

impl Container {
    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }
}

#[derive(Debug, Default)]
pub struct ContainerBuilder {
    element: Option<Element>,
    presence: Option<Presence>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn finish(self) -> Result<Container, BuildError> {
        let element = self.element.ok_or(BuildError::MissingField("element"))?;
        Ok(Container {
            element,
            presence: self.presence.unwrap_or(Presence::Required),
        })
    }
}

// ---------------------------------------------------------------------------
// Line & Block
// ---------------------------------------------------------------------------

/// An ordered, non-empty sequence of containers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line(Vec<Container>);

impl Line {
    pub fn containers(&self) -> &[Container] {
        &self.0
    }
}

#[derive(Debug, Default)]
pub struct LineBuilder {
    containers: Option<Vec<Container>>,
}

impl LineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_containers(mut self, containers: Vec<Container>) -> Self {
        self.containers = Some(containers);
        self
    }

    pub fn finish(self) -> Result<Line, BuildError> {
        let containers = self.containers.ok_or(BuildError::MissingField("containers"))?;
        if containers.is_empty() {
            return Err(BuildError::EmptyList("containers"));
        }
        Ok(Line(containers))
    }
}

/// Alternative lines of a token; the first line that matches wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block(Vec<Line>);

impl Block {
    pub fn lines(&self) -> &[Line] {
        &self.0
    }
}

#[derive(Debug, Default)]
pub struct BlockBuilder {
    lines: Option<Vec<Line>>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lines(mut self, lines: Vec<Line>) -> Self {
        self.lines = Some(lines);
        self
    }

    pub fn finish(self) -> Result<Block, BuildError> {
        let lines = self.lines.ok_or(BuildError::MissingField("lines"))?;
        if lines.is_empty() {
            return Err(BuildError::EmptyList("lines"));
        }
        Ok(Block(lines))
    }
}

// ---------------------------------------------------------------------------
// Suite & Suites
// ---------------------------------------------------------------------------

/// A positive/negative test branch attached to a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suite {
    valid: Compose,
    invalid: Option<Compose>,
}

impl Suite {
    pub fn valid(&self) -> &Compose {
        &self.valid
    }

    pub fn invalid(&self) -> Option<&Compose> {
        self.invalid.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct SuiteBuilder {
    valid: Option<Compose>,
    invalid: Option<Compose>,
}

impl SuiteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_valid(mut self, valid: Compose) -> Self {
        self.valid = Some(valid);
        self
    }

    pub fn with_invalid(mut self, invalid: Compose) -> Self {
        self.invalid = Some(invalid);
        self
    }

    pub fn finish(self) -> Result<Suite, BuildError> {
        let valid = self.valid.ok_or(BuildError::MissingField("valid"))?;
        Ok(Suite {
            valid,
            invalid: self.invalid,
        })
    }
}

/// Ordered list of suites; may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suites(Vec<Suite>);

impl Suites {
    pub fn list(&self) -> &[Suite] {
        &self.0
    }
}

#[derive(Debug, Default)]
pub struct SuitesBuilder {
    list: Option<Vec<Suite>>,
}

impl SuitesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(mut self, list: Vec<Suite>) -> Self {
        self.list = Some(list);
        self
    }

    pub fn finish(self) -> Result<Suites, BuildError> {
        let list = self.list.ok_or(BuildError::MissingField("list"))?;
        Ok(Suites(list))
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A named grammar production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    name: String,
    block: Block,
    suites: Option<Suites>,
}

impl Token {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn suites(&self) -> Option<&Suites> {
        self.suites.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct TokenBuilder {
    name: Option<String>,
    block: Option<Block>,
    suites: Option<Suites>,
}

impl TokenBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.block = Some(block);
        self
    }

    pub fn with_suites(mut self, suites: Suites) -> Self {
        self.suites = Some(suites);
        self
    }

    pub fn finish(self) -> Result<Token, BuildError> {
        let name = self.name.ok_or(BuildError::MissingField("name"))?;
        let block = self.block.ok_or(BuildError::MissingField("block"))?;
        Ok(Token {
            name,
            block,
            suites: self.suites,
        })
    }
}

// ---------------------------------------------------------------------------
// Everything & Instance
// ---------------------------------------------------------------------------

/// A catch-all token: matches anything until `exception`, honoring `escape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Everything {
    name: String,
    exception: Token,
    escape: Option<Token>,
}

impl Everything {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exception(&self) -> &Token {
        &self.exception
    }

    pub fn escape(&self) -> Option<&Token> {
        self.escape.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct EverythingBuilder {
    name: Option<String>,
    exception: Option<Token>,
    escape: Option<Token>,
}

impl EverythingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_exception(mut self, exception: Token) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn with_escape(mut self, escape: Token) -> Self {
        self.escape = Some(escape);
        self
    }

    pub fn finish(self) -> Result<Everything, BuildError> {
        let name = self.name.ok_or(BuildError::MissingField("name"))?;
        let exception = self.exception.ok_or(BuildError::MissingField("exception"))?;
        Ok(Everything {
            name,
            exception,
            escape: self.escape,
        })
    }
}

/// A token bound to an optional catch-all fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    token: Token,
    everything: Option<Everything>,
}

impl Instance {
    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn everything(&self) -> Option<&Everything> {
        self.everything.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct InstanceBuilder {
    token: Option<Token>,
    everything: Option<Everything>,
}

impl InstanceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_everything(mut self, everything: Everything) -> Self {
        self.everything = Some(everything);
        self
    }

    pub fn finish(self) -> Result<Instance, BuildError> {
        let token = self.token.ok_or(BuildError::MissingField("token"))?;
        Ok(Instance {
            token,
            everything: self.everything,
        })
    }
}

// ---------------------------------------------------------------------------
// External
// ---------------------------------------------------------------------------

/// A name bound to a whole sub-grammar, for grammar composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct External {
    name: String,
    grammar: Grammar,
}

impl External {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }
}

#[derive(Debug, Default)]
pub struct ExternalBuilder {
    name: Option<String>,
    grammar: Option<Grammar>,
}

impl ExternalBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_grammar(mut self, grammar: Grammar) -> Self {
        self.grammar = Some(grammar);
        self
    }

    pub fn finish(self) -> Result<External, BuildError> {
        let name = self.name.ok_or(BuildError::MissingField("name"))?;
        let grammar = self.grammar.ok_or(BuildError::MissingField("grammar"))?;
        Ok(External { name, grammar })
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Gates a channel on the surrounding tokens; at least one side must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCondition {
    previous: Option<Token>,
    next: Option<Token>,
}

impl ChannelCondition {
    pub fn previous(&self) -> Option<&Token> {
        self.previous.as_ref()
    }

    pub fn next(&self) -> Option<&Token> {
        self.next.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct ChannelConditionBuilder {
    previous: Option<Token>,
    next: Option<Token>,
}

impl ChannelConditionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_previous(mut self, previous: Token) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn with_next(mut self, next: Token) -> Self {
        self.next = Some(next);
        self
    }

    pub fn finish(self) -> Result<ChannelCondition, BuildError> {
        if self.previous.is_none() && self.next.is_none() {
            return Err(BuildError::MissingField("previous or next"));
        }
        Ok(ChannelCondition {
            previous: self.previous,
            next: self.next,
        })
    }
}

/// A skippable token (whitespace, comments), optionally gated by a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    token: Token,
    condition: Option<ChannelCondition>,
}

impl Channel {
    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn condition(&self) -> Option<&ChannelCondition> {
        self.condition.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct ChannelBuilder {
    token: Option<Token>,
    condition: Option<ChannelCondition>,
}

impl ChannelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_condition(mut self, condition: ChannelCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn finish(self) -> Result<Channel, BuildError> {
        let token = self.token.ok_or(BuildError::MissingField("token"))?;
        Ok(Channel {
            token,
            condition: self.condition,
        })
    }
}

/// Ordered list of channels; may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channels(Vec<Channel>);

impl Channels {
    pub fn list(&self) -> &[Channel] {
        &self.0
    }
}

#[derive(Debug, Default)]
pub struct ChannelsBuilder {
    list: Option<Vec<Channel>>,
}

impl ChannelsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(mut self, list: Vec<Channel>) -> Self {
        self.list = Some(list);
        self
    }

    pub fn finish(self) -> Result<Channels, BuildError> {
        let list = self.list.ok_or(BuildError::MissingField("list"))?;
        Ok(Channels(list))
    }
}

// ---------------------------------------------------------------------------
// Grammar
// ---------------------------------------------------------------------------

/// The root of a grammar description: a root token plus optional channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grammar {
    root: Token,
    channels: Option<Channels>,
}

impl Grammar {
    pub fn root(&self) -> &Token {
        &self.root
    }

    pub fn channels(&self) -> Option<&Channels> {
        self.channels.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct GrammarBuilder {
    root: Option<Token>,
    channels: Option<Channels>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: Token) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_channels(mut self, channels: Channels) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn finish(self) -> Result<Grammar, BuildError> {
        let root = self.root.ok_or(BuildError::MissingField("root"))?;
        Ok(Grammar {
            root,
            channels: self.channels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(name: &str, byte: u8) -> Value {
        ValueBuilder::new()
            .with_name(name.to_string())
            .with_number(byte as u64)
            .finish()
            .unwrap()
    }

    fn single_value_token(name: &str, byte: u8) -> Token {
        let element = ElementBuilder::new()
            .with_cardinality(Cardinality::once())
            .with_value(letter(name, byte))
            .finish()
            .unwrap();
        let container = ContainerBuilder::new()
            .with_element(element)
            .finish()
            .unwrap();
        let line = LineBuilder::new()
            .with_containers(vec![container])
            .finish()
            .unwrap();
        let block = BlockBuilder::new().with_lines(vec![line]).finish().unwrap();
        TokenBuilder::new()
            .with_name(name.to_string())
            .with_block(block)
            .finish()
            .unwrap()
    }

    #[test]
    fn value_rejects_payload_above_byte_range() {
        let err = ValueBuilder::new()
            .with_name("big".to_string())
            .with_number(256)
            .finish()
            .unwrap_err();
        assert_eq!(err, BuildError::ByteOutOfRange(256));
    }

    #[test]
    fn value_requires_name() {
        let err = ValueBuilder::new().with_number(7).finish().unwrap_err();
        assert_eq!(err, BuildError::MissingField("name"));
    }

    #[test]
    fn cardinality_rejects_max_below_min() {
        let err = CardinalityBuilder::new()
            .with_min(3)
            .with_max(2)
            .finish()
            .unwrap_err();
        assert_eq!(err, BuildError::MaxBelowMin { min: 3, max: 2 });
    }

    #[test]
    fn cardinality_unbounded_max_is_fine() {
        let card = CardinalityBuilder::new().with_min(0).finish().unwrap();
        assert_eq!(card.min(), 0);
        assert_eq!(card.max(), None);
    }

    #[test]
    fn element_requires_exactly_one_content() {
        let missing = ElementBuilder::new()
            .with_cardinality(Cardinality::once())
            .finish()
            .unwrap_err();
        assert_eq!(missing, BuildError::MissingField("content"));

        let conflicting = ElementBuilder::new()
            .with_cardinality(Cardinality::once())
            .with_value(letter("a", b'a'))
            .with_value(letter("b", b'b'))
            .finish()
            .unwrap_err();
        assert_eq!(conflicting, BuildError::ConflictingContent);
    }

    #[test]
    fn container_presence_defaults_to_required() {
        let element = ElementBuilder::new()
            .with_cardinality(Cardinality::once())
            .with_value(letter("a", b'a'))
            .finish()
            .unwrap();
        let container = ContainerBuilder::new()
            .with_element(element)
            .finish()
            .unwrap();
        assert_eq!(container.presence(), Presence::Required);
    }

    #[test]
    fn presence_code_out_of_range() {
        assert_eq!(Presence::from_code(2), Ok(Presence::Alternate));
        assert_eq!(
            Presence::from_code(3),
            Err(BuildError::OutOfRange {
                what: "presence",
                value: 3,
                max: 2
            })
        );
    }

    #[test]
    fn line_and_block_reject_empty_lists() {
        let line_err = LineBuilder::new().with_containers(vec![]).finish().unwrap_err();
        assert_eq!(line_err, BuildError::EmptyList("containers"));
        let block_err = BlockBuilder::new().with_lines(vec![]).finish().unwrap_err();
        assert_eq!(block_err, BuildError::EmptyList("lines"));
    }

    #[test]
    fn channel_condition_needs_one_side() {
        let err = ChannelConditionBuilder::new().finish().unwrap_err();
        assert_eq!(err, BuildError::MissingField("previous or next"));

        let cond = ChannelConditionBuilder::new()
            .with_next(single_value_token("x", b'x'))
            .finish()
            .unwrap();
        assert!(cond.previous().is_none());
        assert!(cond.next().is_some());
    }

    #[test]
    fn token_round_trips_its_parts() {
        let token = single_value_token("letter", b'a');
        assert_eq!(token.name(), "letter");
        assert_eq!(token.block().lines().len(), 1);

        let rebuilt = TokenBuilder::new()
            .with_name(token.name().to_string())
            .with_block(token.block().clone())
            .finish()
            .unwrap();
        assert_eq!(rebuilt, token);
    }

    #[test]
    fn everything_and_instance_finalize_requirements() {
        let exception = single_value_token("quote", b'"');
        let catch_all = EverythingBuilder::new()
            .with_name("body".to_string())
            .with_exception(exception.clone())
            .finish()
            .unwrap();
        assert_eq!(catch_all.name(), "body");
        assert!(catch_all.escape().is_none());

        let err = EverythingBuilder::new()
            .with_name("body".to_string())
            .finish()
            .unwrap_err();
        assert_eq!(err, BuildError::MissingField("exception"));
        let err = EverythingBuilder::new()
            .with_exception(exception.clone())
            .finish()
            .unwrap_err();
        assert_eq!(err, BuildError::MissingField("name"));

        let instance = InstanceBuilder::new()
            .with_token(exception)
            .with_everything(catch_all)
            .finish()
            .unwrap();
        assert!(instance.everything().is_some());
        assert_eq!(
            InstanceBuilder::new().finish().unwrap_err(),
            BuildError::MissingField("token")
        );
    }

    #[test]
    fn external_requires_name_and_grammar() {
        let sub = GrammarBuilder::new()
            .with_root(single_value_token("digit", b'0'))
            .finish()
            .unwrap();

        let ext = ExternalBuilder::new()
            .with_name("digits".to_string())
            .with_grammar(sub.clone())
            .finish()
            .unwrap();
        assert_eq!(ext.name(), "digits");
        assert_eq!(ext.grammar(), &sub);

        assert_eq!(
            ExternalBuilder::new().with_grammar(sub).finish().unwrap_err(),
            BuildError::MissingField("name")
        );
        assert_eq!(
            ExternalBuilder::new()
                .with_name("digits".to_string())
                .finish()
                .unwrap_err(),
            BuildError::MissingField("grammar")
        );
    }

    #[test]
    fn grammar_requires_root() {
        let err = GrammarBuilder::new().finish().unwrap_err();
        assert_eq!(err, BuildError::MissingField("root"));

        let grammar = GrammarBuilder::new()
            .with_root(single_value_token("root", b'r'))
            .finish()
            .unwrap();
        assert!(grammar.channels().is_none());
    }
}
