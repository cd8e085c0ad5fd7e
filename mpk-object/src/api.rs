use crate::{
    config::{knob_field, Config, TITLE},
    error::{GetError, MpkObjectError, SetError},
    parse::types::{ElementType, ParsedValue},
    types::CommandType,
    value::MpkValue,
};
use error_logger_macro::log_errors;
use tracing::instrument;

pub mod object_type {
    pub const PROGRAMME: &str = "programme";
}

pub mod element_type {
    pub const PAD: &str = "pad";
    pub const KNOB: &str = "knob";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Common {
        programme: usize,
        key: MpkValue,
        value: MpkValue,
    },
    Element {
        programme: usize,
        element_type: ElementType,
        element_index: usize,
        key: MpkValue,
        value: MpkValue,
    },
    Ok,
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Common {
                programme,
                key,
                value,
            } => write!(f, "{programme} {key} {value}"),
            Self::Element {
                programme,
                element_type,
                element_index,
                key,
                value,
            } => write!(f, "{programme} {element_type} {element_index} {key} {value}"),
            Self::Ok => write!(f, "ok"),
        }
    }
}

/// Runs parsed tokens against the programme they address.
///
/// The tokens come from [`crate::parse::parse_command`], which already made
/// sure fields exist and values are present for a set.
#[instrument(skip(config))]
#[log_errors]
pub fn handle(
    config: &mut Config,
    tokens: &[ParsedValue],
    command_type: CommandType,
) -> Result<Response, MpkObjectError> {
    let programme = match tokens.first() {
        Some(ParsedValue::ObjectType(crate::parse::types::ObjectTypeSelector::Programme(
            index,
        ))) => *index,
        _ => return Err(MpkObjectError::from("Invalid format: The command needs a programme.")),
    };

    match &tokens[1..] {
        [ParsedValue::Element(element_type), ParsedValue::ElementIndex(element_index), ParsedValue::Identifier(key), rest @ ..] => {
            let value = match command_type {
                CommandType::Get => get_element(config, *element_type, *element_index, key)?,
                CommandType::Set => {
                    set_element(config, *element_type, *element_index, key, rest.first())?;
                    return Ok(Response::Ok);
                }
            };
            Ok(Response::Element {
                programme,
                element_type: *element_type,
                element_index: *element_index,
                key: key.as_str().into(),
                value,
            })
        }
        [ParsedValue::Identifier(key), rest @ ..] => {
            let value = match command_type {
                CommandType::Get => get_common(config, key)?,
                CommandType::Set => {
                    set_common(config, key, rest.first())?;
                    return Ok(Response::Ok);
                }
            };
            Ok(Response::Common {
                programme,
                key: MpkValue::Symbol(key.clone()),
                value,
            })
        }
        _ => Err(MpkObjectError::from("Invalid format: The command needs a field.")),
    }
}

fn get_common(config: &Config, key: &str) -> Result<MpkValue, GetError> {
    if key == TITLE {
        return Ok(MpkValue::Symbol(config.title_string()));
    }
    config
        .get(key)
        .map(MpkValue::from)
        .ok_or_else(|| GetError::InvalidField(key.to_owned()))
}

fn set_common(config: &mut Config, key: &str, value: Option<&ParsedValue>) -> Result<(), SetError> {
    match value {
        Some(ParsedValue::ParameterString(title)) if key == TITLE => {
            config.set_title(title);
            Ok(())
        }
        Some(ParsedValue::Parameter(value)) => {
            let value = number(key, *value)?;
            if config.set(key, value) {
                Ok(())
            } else {
                Err(SetError::InvalidField(key.to_owned()))
            }
        }
        _ => Err(SetError::ValueMissing(key.to_owned())),
    }
}

fn get_element(
    config: &Config,
    element_type: ElementType,
    slot: usize,
    key: &str,
) -> Result<MpkValue, GetError> {
    let invalid = || GetError::InvalidField(format!("{element_type} {slot} {key}"));
    match element_type {
        ElementType::Pad => config
            .pad(slot)
            .and_then(|pad| pad.get(key))
            .map(MpkValue::from)
            .ok_or_else(invalid),
        ElementType::Knob => {
            let knob = config.knob(slot).ok_or_else(invalid)?;
            if key == knob_field::NAME {
                return Ok(MpkValue::Symbol(knob.name_string()));
            }
            knob.get(key).map(MpkValue::from).ok_or_else(invalid)
        }
    }
}

fn set_element(
    config: &mut Config,
    element_type: ElementType,
    slot: usize,
    key: &str,
    value: Option<&ParsedValue>,
) -> Result<(), SetError> {
    let invalid = || SetError::InvalidField(format!("{element_type} {slot} {key}"));
    match (element_type, value) {
        (ElementType::Knob, Some(ParsedValue::ParameterString(name))) if key == knob_field::NAME => {
            config.knob_mut(slot).ok_or_else(invalid)?.set_name(name);
            Ok(())
        }
        (ElementType::Knob, Some(ParsedValue::Parameter(value))) => {
            let value = number(key, *value)?;
            let knob = config.knob_mut(slot).ok_or_else(invalid)?;
            knob.set(key, value).then_some(()).ok_or_else(invalid)
        }
        (ElementType::Pad, Some(ParsedValue::Parameter(value))) => {
            let value = number(key, *value)?;
            let pad = config.pad_mut(slot).ok_or_else(invalid)?;
            pad.set(key, value).then_some(()).ok_or_else(invalid)
        }
        _ => Err(SetError::ValueMissing(key.to_owned())),
    }
}

// Values beyond i32 can never be serialized either, report them as a bad field value.
fn number(key: &str, value: isize) -> Result<i32, SetError> {
    i32::try_from(value).map_err(|_| SetError::InvalidField(format!("{key} {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_command;
    use crate::value::MpkValueList;

    fn run(config: &mut Config, command_type: CommandType, values: &[&str]) -> Response {
        let values: MpkValueList = values.iter().copied().collect();
        let tokens = parse_command(&values, command_type).unwrap();
        handle(config, &tokens, command_type).unwrap()
    }

    #[test]
    fn get_common_field() {
        let mut config = Config::default();
        let response = run(&mut config, CommandType::Get, &["programme", "1", "arp_gate"]);
        assert_eq!(
            response,
            Response::Common {
                programme: 1,
                key: MpkValue::Symbol("arp_gate".to_owned()),
                value: MpkValue::Int(50),
            }
        );
        assert_eq!(response.to_string(), "1 arp_gate 50");
    }

    #[test]
    fn set_and_get_title() {
        let mut config = Config::default();
        run(&mut config, CommandType::Set, &["programme", "1", "title", "Live", "Set"]);
        assert_eq!(config.title_string(), "Live Set");
        let response = run(&mut config, CommandType::Get, &["programme", "1", "title"]);
        assert_eq!(response.to_string(), "1 title Live Set");
    }

    #[test]
    fn text_keeps_number_spelling() {
        let mut config = Config::default();
        run(&mut config, CommandType::Set, &["programme", "1", "title", "007", "+5"]);
        assert_eq!(config.title_string(), "007 +5");

        run(&mut config, CommandType::Set, &["programme", "1", "knob", "4", "name", "-0"]);
        assert_eq!(config.knob(4).unwrap().name_string(), "-0");
    }

    #[test]
    fn set_tempo_in_bpm() {
        let mut config = Config::default();
        let response = run(&mut config, CommandType::Set, &["programme", "3", "arp_tempo", "150"]);
        assert_eq!(response, Response::Ok);
        assert_eq!(config.arp_tempo, [1, 22]);
    }

    #[test]
    fn pad_and_knob_fields() {
        let mut config = Config::default();
        run(&mut config, CommandType::Set, &["programme", "1", "pad", "16", "on_color", "3"]);
        assert_eq!(config.pad(16).unwrap().on_color, 3);

        run(&mut config, CommandType::Set, &["programme", "1", "knob", "2", "name", "Reso"]);
        let response = run(&mut config, CommandType::Get, &["programme", "1", "knob", "2", "name"]);
        assert_eq!(response.to_string(), "1 knob 2 name Reso");

        let response = run(&mut config, CommandType::Get, &["programme", "1", "pad", "1", "note"]);
        assert_eq!(
            response,
            Response::Element {
                programme: 1,
                element_type: ElementType::Pad,
                element_index: 1,
                key: MpkValue::Symbol("note".to_owned()),
                value: MpkValue::Int(36),
            }
        );
    }

    #[test]
    fn out_of_range_values_are_kept() {
        let mut config = Config::default();
        run(&mut config, CommandType::Set, &["programme", "1", "pad", "1", "note", "300"]);
        assert_eq!(config.pad(1).unwrap().note, 300);
    }

    #[test]
    fn huge_values_are_rejected() {
        let mut config = Config::default();
        let values: MpkValueList = ["programme", "1", "arp_gate", "99999999999"].into_iter().collect();
        let tokens = parse_command(&values, CommandType::Set).unwrap();
        assert!(matches!(
            handle(&mut config, &tokens, CommandType::Set),
            Err(MpkObjectError::Set(SetError::InvalidField(_)))
        ));
    }
}
