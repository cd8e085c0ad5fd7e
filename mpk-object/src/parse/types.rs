use crate::{
    api::{element_type, object_type::PROGRAMME},
    config::{KNOB_COUNT, PAD_COUNT, PROGRAMME_COUNT},
    error::ParseError,
    value::MpkValue,
};
use std::str::FromStr;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParsedValue {
    /// The programme being addressed
    ObjectType(ObjectTypeSelector),
    /// A repeated element of the programme (pad or knob)
    Element(ElementType),
    /// The one based slot of the element
    ElementIndex(usize),
    /// A field name (e.g., "arp_gate", "note", ...)
    Identifier(String),
    /// A numeric value to set
    Parameter(isize),
    /// A text value to set (e.g., a title)
    ParameterString(String),
}

impl std::fmt::Display for ParsedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ObjectType(object_type) => write!(f, "{}", object_type),
            Self::Element(element) => write!(f, "{}", element),
            Self::ElementIndex(i) => write!(f, "{}", i),
            Self::Identifier(s) => write!(f, "{}", s),
            Self::Parameter(i) => write!(f, "{}", i),
            Self::ParameterString(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ObjectTypeSelector {
    /// One based programme slot.
    Programme(usize),
}

impl std::fmt::Display for ObjectTypeSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Programme(index) => write!(f, "programme {}", index),
        }
    }
}

impl TryFrom<(&MpkValue, Option<&MpkValue>)> for ObjectTypeSelector {
    type Error = ParseError;

    fn try_from((selector, index): (&MpkValue, Option<&MpkValue>)) -> Result<Self, Self::Error> {
        let MpkValue::Symbol(selector_sym) = selector else {
            return Err(ParseError::InvalidTarget(selector.to_string()));
        };

        match selector_sym.as_str() {
            PROGRAMME => parse_indexed(index, PROGRAMME, 1..=PROGRAMME_COUNT, Self::Programme),
            other => Err(ParseError::InvalidTarget(other.to_owned())),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ElementType {
    Pad,
    Knob,
}

impl ElementType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pad => element_type::PAD,
            Self::Knob => element_type::KNOB,
        }
    }

    pub const fn slots(self) -> std::ops::RangeInclusive<usize> {
        match self {
            Self::Pad => 1..=PAD_COUNT,
            Self::Knob => 1..=KNOB_COUNT,
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ElementType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            element_type::PAD => Ok(Self::Pad),
            element_type::KNOB => Ok(Self::Knob),
            other => Err(ParseError::InvalidField(other.to_owned())),
        }
    }
}

pub fn parse_indexed<T>(
    index: Option<&MpkValue>,
    name: &'static str,
    range: std::ops::RangeInclusive<usize>,
    constructor: impl Fn(usize) -> T,
) -> Result<T, ParseError> {
    let Some(MpkValue::Int(i)) = index else {
        return Err(ParseError::IndexMissing(name));
    };

    match usize::try_from(*i) {
        Ok(slot) if range.contains(&slot) => Ok(constructor(slot)),
        _ => Err(ParseError::IndexOutOfRange {
            name,
            min: *range.start() as isize,
            max: *range.end() as isize,
            value: *i,
        }),
    }
}
