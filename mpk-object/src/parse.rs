pub mod types;

use crate::config::{knob_field, pad_field, Config, TITLE};
use crate::error::ParseError;
use crate::types::CommandType;
use crate::value::{MpkValue, MpkValueList};
use error_logger_macro::log_errors;
use lazy_static::lazy_static;
use std::collections::HashSet;
use tracing::instrument;
use types::{ElementType, ObjectTypeSelector, ParseResult, ParsedValue};

/// Parses a 'get' or 'set' command, given the values (excluding the selector)
#[instrument]
#[log_errors(warn)]
pub fn parse_command(
    values: &MpkValueList,
    command_type: CommandType,
) -> ParseResult<Vec<ParsedValue>> {
    let mut iter = values.iter().peekable();
    let mut result = Vec::new();

    let selector = iter.next().ok_or(ParseError::TargetMissing)?;
    let object_type_selector = ObjectTypeSelector::try_from((selector, iter.next()))?;
    result.push(ParsedValue::ObjectType(object_type_selector));

    parse_programme(command_type, &mut iter, &mut result)?;

    match iter.next() {
        Some(extra) => Err(ParseError::UnexpectedToken(extra.to_string())),
        None => Ok(result),
    }
}

/// Parses what follows `programme <n>`
#[instrument]
fn parse_programme<'a, I>(
    command_type: CommandType,
    iter: &mut std::iter::Peekable<I>,
    result: &mut Vec<ParsedValue>,
) -> ParseResult<()>
where
    I: Iterator<Item = &'a MpkValue> + std::fmt::Debug,
{
    let symbol = match iter.next() {
        Some(MpkValue::Symbol(s)) => s,
        Some(other) => return Err(ParseError::UnexpectedToken(other.to_string())),
        None => return Err(ParseError::UnexpectedEnd),
    };

    if let Ok(element) = symbol.parse::<ElementType>() {
        result.push(ParsedValue::Element(element));
        let slot = types::parse_indexed(iter.next(), element.name(), element.slots(), |i| i)?;
        result.push(ParsedValue::ElementIndex(slot));
        return parse_element_field(command_type, element, iter, result);
    }

    if symbol == TITLE {
        result.push(ParsedValue::Identifier(symbol.clone()));
        return parse_text_parameter(command_type, symbol, iter, result);
    }

    if !is_programme_field(symbol) {
        return Err(ParseError::InvalidField(symbol.clone()));
    }

    result.push(ParsedValue::Identifier(symbol.clone()));
    parse_number_parameter(command_type, symbol, iter, result)
}

/// Parses the field of a pad or knob
#[instrument]
fn parse_element_field<'a, I>(
    command_type: CommandType,
    element: ElementType,
    iter: &mut std::iter::Peekable<I>,
    result: &mut Vec<ParsedValue>,
) -> ParseResult<()>
where
    I: Iterator<Item = &'a MpkValue> + std::fmt::Debug,
{
    let field = match iter.next() {
        Some(MpkValue::Symbol(s)) => s,
        Some(other) => return Err(ParseError::UnexpectedToken(other.to_string())),
        None => return Err(ParseError::UnexpectedEnd),
    };

    result.push(ParsedValue::Identifier(field.clone()));

    match element {
        ElementType::Knob if field == knob_field::NAME => {
            parse_text_parameter(command_type, field, iter, result)
        }
        ElementType::Knob if knob_field::KNOB_FIELDS.contains(&field.as_str()) => {
            parse_number_parameter(command_type, field, iter, result)
        }
        ElementType::Pad if pad_field::PAD_FIELDS.contains(&field.as_str()) => {
            parse_number_parameter(command_type, field, iter, result)
        }
        _ => Err(ParseError::InvalidField(format!("{element} {field}"))),
    }
}

#[instrument]
fn parse_number_parameter<'a, I>(
    command_type: CommandType,
    field: &str,
    iter: &mut std::iter::Peekable<I>,
    result: &mut Vec<ParsedValue>,
) -> ParseResult<()>
where
    I: Iterator<Item = &'a MpkValue> + std::fmt::Debug,
{
    if command_type == CommandType::Get {
        return Ok(());
    }

    match iter.next() {
        Some(MpkValue::Int(value)) => {
            result.push(ParsedValue::Parameter(*value));
            Ok(())
        }
        // Numbers spelled like "007" or "+5" arrive as symbols.
        Some(MpkValue::Symbol(value)) => match value.parse::<isize>() {
            Ok(number) => {
                result.push(ParsedValue::Parameter(number));
                Ok(())
            }
            Err(_) => Err(ParseError::InvalidValue {
                field: field.to_owned(),
                value: value.clone(),
            }),
        },
        None => Err(ParseError::ValueMissing(field.to_owned())),
    }
}

// Text accepts anything, an all digit title stays text.
#[instrument]
fn parse_text_parameter<'a, I>(
    command_type: CommandType,
    field: &str,
    iter: &mut std::iter::Peekable<I>,
    result: &mut Vec<ParsedValue>,
) -> ParseResult<()>
where
    I: Iterator<Item = &'a MpkValue> + std::fmt::Debug,
{
    if command_type == CommandType::Get {
        return Ok(());
    }

    let mut words = Vec::new();
    for value in iter.by_ref() {
        words.push(value.to_string());
    }

    if words.is_empty() {
        return Err(ParseError::ValueMissing(field.to_owned()));
    }

    result.push(ParsedValue::ParameterString(words.join(" ")));
    Ok(())
}

/// Checks if a string names a single value of the programme
#[instrument]
fn is_programme_field(s: &str) -> bool {
    lazy_static! {
        static ref PROGRAMME_FIELDS: HashSet<&'static str> = Config::value_names().collect();
    }

    PROGRAMME_FIELDS.contains(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(values: &[&str], command_type: CommandType) -> ParseResult<Vec<ParsedValue>> {
        let values: MpkValueList = values.iter().copied().collect();
        parse_command(&values, command_type)
    }

    #[test]
    fn test_valid_programme_get_field() {
        // get programme 1 arp_gate
        let result = parse(&["programme", "1", "arp_gate"], CommandType::Get).unwrap();
        assert_eq!(
            result,
            vec![
                ParsedValue::ObjectType(ObjectTypeSelector::Programme(1)),
                ParsedValue::Identifier("arp_gate".to_string()),
            ]
        );
    }

    #[test]
    fn test_valid_programme_set_field() {
        // set programme 4 arp_tempo 140
        let result = parse(&["programme", "4", "arp_tempo", "140"], CommandType::Set).unwrap();
        assert_eq!(
            result,
            vec![
                ParsedValue::ObjectType(ObjectTypeSelector::Programme(4)),
                ParsedValue::Identifier("arp_tempo".to_string()),
                ParsedValue::Parameter(140),
            ]
        );
    }

    #[test]
    fn test_valid_pad_set() {
        // set programme 2 pad 9 note 48
        let result =
            parse(&["programme", "2", "pad", "9", "note", "48"], CommandType::Set).unwrap();
        assert_eq!(
            result,
            vec![
                ParsedValue::ObjectType(ObjectTypeSelector::Programme(2)),
                ParsedValue::Element(ElementType::Pad),
                ParsedValue::ElementIndex(9),
                ParsedValue::Identifier("note".to_string()),
                ParsedValue::Parameter(48),
            ]
        );
    }

    #[test]
    fn test_valid_knob_name_set() {
        // set programme 1 knob 3 name Filter Cutoff
        let result = parse(
            &["programme", "1", "knob", "3", "name", "Filter", "Cutoff"],
            CommandType::Set,
        )
        .unwrap();
        assert_eq!(
            result.last(),
            Some(&ParsedValue::ParameterString("Filter Cutoff".to_string()))
        );
    }

    #[test]
    fn test_valid_title_with_digits() {
        let result = parse(&["programme", "1", "title", "808"], CommandType::Set).unwrap();
        assert_eq!(
            result.last(),
            Some(&ParsedValue::ParameterString("808".to_string()))
        );
    }

    #[test]
    fn test_valid_title_keeps_number_spelling() {
        let result = parse(
            &["programme", "1", "title", "007", "+5", "-0"],
            CommandType::Set,
        )
        .unwrap();
        assert_eq!(
            result.last(),
            Some(&ParsedValue::ParameterString("007 +5 -0".to_string()))
        );
    }

    #[test]
    fn test_valid_number_with_leading_zero() {
        let result = parse(&["programme", "1", "pad", "1", "note", "048"], CommandType::Set).unwrap();
        assert_eq!(result.last(), Some(&ParsedValue::Parameter(48)));
    }

    #[test]
    fn test_invalid_target() {
        assert_eq!(
            parse(&["kit", "1", "name"], CommandType::Get),
            Err(ParseError::InvalidTarget("kit".to_string()))
        );
        assert_eq!(parse(&[], CommandType::Get), Err(ParseError::TargetMissing));
    }

    #[test]
    fn test_invalid_programme_index() {
        assert_eq!(
            parse(&["programme", "9", "arp_gate"], CommandType::Get),
            Err(ParseError::IndexOutOfRange {
                name: "programme",
                min: 1,
                max: 8,
                value: 9
            })
        );
        assert_eq!(
            parse(&["programme", "arp_gate"], CommandType::Get),
            Err(ParseError::IndexMissing("programme"))
        );
    }

    #[test]
    fn test_invalid_pad_index() {
        assert!(matches!(
            parse(&["programme", "1", "pad", "17", "note"], CommandType::Get),
            Err(ParseError::IndexOutOfRange { name: "pad", .. })
        ));
        assert!(matches!(
            parse(&["programme", "1", "knob", "0", "cc"], CommandType::Get),
            Err(ParseError::IndexOutOfRange { name: "knob", .. })
        ));
    }

    #[test]
    fn test_invalid_fields() {
        assert_eq!(
            parse(&["programme", "1", "velocity"], CommandType::Get),
            Err(ParseError::InvalidField("velocity".to_string()))
        );
        assert_eq!(
            parse(&["programme", "1", "pad", "1", "name"], CommandType::Get),
            Err(ParseError::InvalidField("pad name".to_string()))
        );
        // Structural parts of the frame are not fields.
        assert!(parse(&["programme", "1", "sysex_pad"], CommandType::Get).is_err());
    }

    #[test]
    fn test_set_needs_a_number() {
        assert_eq!(
            parse(&["programme", "1", "arp_gate"], CommandType::Set),
            Err(ParseError::ValueMissing("arp_gate".to_string()))
        );
        assert_eq!(
            parse(&["programme", "1", "arp_gate", "wide"], CommandType::Set),
            Err(ParseError::InvalidValue {
                field: "arp_gate".to_string(),
                value: "wide".to_string()
            })
        );
    }

    #[test]
    fn test_get_rejects_trailing_tokens() {
        assert_eq!(
            parse(&["programme", "1", "arp_gate", "12"], CommandType::Get),
            Err(ParseError::UnexpectedToken("12".to_string()))
        );
    }
}
