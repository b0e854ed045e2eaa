//! Argument coercion.
//!
//! Turns the tokens that follow a matched command structure into typed
//! [`ArgValue`]s. The matcher only performs a cheap shape check
//! ([`shape_matches`]); coercion is the strict pass and reports the first
//! offending position.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::definitions::{ParamSpec, ParamType};

/// A coerced argument value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Enum {
        type_name: String,
        variant: String,
    },
    Custom {
        type_name: String,
        value: serde_json::Value,
    },
    /// Elements collected by a variadic parameter.
    List(Vec<ArgValue>),
    /// Optional parameter that was not supplied and has no default.
    Unset,
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Enum { variant, .. } => Some(variant),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Enum { variant, .. } => write!(f, "{variant}"),
            Self::Custom { value, .. } => write!(f, "{value}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(" "))
            }
            Self::Unset => Ok(()),
        }
    }
}

/// A token could not be converted to its parameter's declared type.
///
/// Positions are zero-based indexes into the argument tokens, i.e. the
/// tokens after the command structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("Argument {position} ({name}): `{token}` is not a valid integer.")]
    InvalidInt {
        position: usize,
        name: String,
        token: String,
    },

    #[error("Argument {position} ({name}): `{token}` is not true or false.")]
    InvalidBool {
        position: usize,
        name: String,
        token: String,
    },

    #[error("Argument {position} ({name}): `{token}` is not one of {expected}.")]
    UnknownVariant {
        position: usize,
        name: String,
        token: String,
        expected: String,
    },

    #[error("Argument {position} ({name}): {message}")]
    Custom {
        position: usize,
        name: String,
        message: String,
    },

    #[error("Missing required argument {position} ({name}).")]
    MissingArgument { position: usize, name: String },
}

impl CoercionError {
    /// Zero-based argument position that failed.
    pub fn position(&self) -> usize {
        match self {
            Self::InvalidInt { position, .. }
            | Self::InvalidBool { position, .. }
            | Self::UnknownVariant { position, .. }
            | Self::Custom { position, .. }
            | Self::MissingArgument { position, .. } => *position,
        }
    }
}

/// Coerced arguments of one invocation, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Arguments {
    values: Vec<(String, ArgValue)>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgValue::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ArgValue::as_int)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ArgValue::as_bool)
    }

    pub fn list(&self, name: &str) -> Option<&[ArgValue]> {
        self.get(name).and_then(ArgValue::as_list)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Cheap shape check used while scoring candidates. Custom types are
/// accepted here and validated during coercion.
pub fn shape_matches(kind: &ParamType, token: &str) -> bool {
    match kind {
        ParamType::String | ParamType::Custom(_) => true,
        ParamType::Int => token.parse::<i64>().is_ok(),
        ParamType::Bool => parse_bool(token).is_some(),
        ParamType::Enum(ty) => ty.resolve(token).is_some(),
    }
}

/// Coerces `tokens` against `params`.
///
/// A variadic parameter collects every remaining token. Tokens beyond the
/// last declared parameter are ignored.
pub fn coerce_arguments(params: &[ParamSpec], tokens: &[String]) -> Result<Arguments, CoercionError> {
    let mut values = Vec::with_capacity(params.len());

    for (position, param) in params.iter().enumerate() {
        let value = if param.variadic {
            let rest = tokens.get(position..).unwrap_or_default();
            let items = rest
                .iter()
                .enumerate()
                .map(|(offset, token)| coerce_token(param, position + offset, token))
                .collect::<Result<Vec<_>, _>>()?;
            ArgValue::List(items)
        } else {
            match tokens.get(position) {
                Some(token) => coerce_token(param, position, token)?,
                None if param.accepts_missing() => {
                    param.default.clone().unwrap_or(ArgValue::Unset)
                }
                None => {
                    return Err(CoercionError::MissingArgument {
                        position,
                        name: param.name.clone(),
                    })
                }
            }
        };
        values.push((param.name.clone(), value));
    }

    Ok(Arguments { values })
}

fn coerce_token(param: &ParamSpec, position: usize, token: &str) -> Result<ArgValue, CoercionError> {
    match &param.kind {
        ParamType::String => Ok(ArgValue::Str(token.to_string())),
        ParamType::Int => token
            .parse::<i64>()
            .map(ArgValue::Int)
            .map_err(|_| CoercionError::InvalidInt {
                position,
                name: param.name.clone(),
                token: token.to_string(),
            }),
        ParamType::Bool => parse_bool(token)
            .map(ArgValue::Bool)
            .ok_or_else(|| CoercionError::InvalidBool {
                position,
                name: param.name.clone(),
                token: token.to_string(),
            }),
        ParamType::Enum(ty) => ty
            .resolve(token)
            .map(|variant| ArgValue::Enum {
                type_name: ty.name.clone(),
                variant: variant.to_string(),
            })
            .ok_or_else(|| CoercionError::UnknownVariant {
                position,
                name: param.name.clone(),
                token: token.to_string(),
                expected: ty.variants.join(", "),
            }),
        ParamType::Custom(custom) => custom
            .parser
            .parse(token)
            .map(|value| ArgValue::Custom {
                type_name: custom.name.clone(),
                value,
            })
            .map_err(|message| CoercionError::Custom {
                position,
                name: param.name.clone(),
                message,
            }),
    }
}

fn parse_bool(token: &str) -> Option<bool> {
    if token.eq_ignore_ascii_case("true") {
        Some(true)
    } else if token.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
