//! Preset condition expressions.
//!
//! A condition decides whether a preset is active. Conditions are written in
//! JSON as a bare boolean, `null`, or an object tagged by `"type"`:
//!
//! ```json
//! { "type": "equals", "lhs": "${hostSystemName}", "rhs": "Linux" }
//! ```
//!
//! The negated forms (`notEquals`, `notInList`, `notMatches`) are stored as
//! [`Condition::Not`] wrapped around the positive form.

use serde_json::{Map, Value};

use crate::{Error, Result};

/// A boolean expression tree attached to a preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Written as `null`. Always true.
    Null,
    Const(bool),
    Equals {
        lhs: String,
        rhs: String,
    },
    InList {
        string: String,
        list: Vec<String>,
    },
    Matches {
        string: String,
        regex: String,
    },
    /// `anyOf` (stop on `true`) and `allOf` (stop on `false`).
    AnyAllOf {
        conditions: Vec<Condition>,
        stop_value: bool,
    },
    Not(Box<Condition>),
}

/// The `"type"` discriminator of a condition object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionType {
    Const,
    Equals,
    NotEquals,
    InList,
    NotInList,
    Matches,
    NotMatches,
    AnyOf,
    AllOf,
    Not,
}

impl ConditionType {
    pub const ALL: [ConditionType; 10] = [
        ConditionType::Const,
        ConditionType::Equals,
        ConditionType::NotEquals,
        ConditionType::InList,
        ConditionType::NotInList,
        ConditionType::Matches,
        ConditionType::NotMatches,
        ConditionType::AnyOf,
        ConditionType::AllOf,
        ConditionType::Not,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionType::Const => "const",
            ConditionType::Equals => "equals",
            ConditionType::NotEquals => "notEquals",
            ConditionType::InList => "inList",
            ConditionType::NotInList => "notInList",
            ConditionType::Matches => "matches",
            ConditionType::NotMatches => "notMatches",
            ConditionType::AnyOf => "anyOf",
            ConditionType::AllOf => "allOf",
            ConditionType::Not => "not",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Object keys accepted for this type, besides `"type"`.
    fn fields(self) -> &'static [&'static str] {
        match self {
            ConditionType::Const => &["value"],
            ConditionType::Equals | ConditionType::NotEquals => &["lhs", "rhs"],
            ConditionType::InList | ConditionType::NotInList => &["string", "list"],
            ConditionType::Matches | ConditionType::NotMatches => &["string", "regex"],
            ConditionType::AnyOf | ConditionType::AllOf => &["conditions"],
            ConditionType::Not => &["condition"],
        }
    }
}

impl Condition {
    /// Bind a condition from its JSON form.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Condition::Null),
            Value::Bool(b) => Ok(Condition::Const(*b)),
            Value::Object(object) => Self::from_object(object),
            other => Err(invalid(format!("expected object, boolean or null, found {other}"))),
        }
    }

    fn from_object(object: &Map<String, Value>) -> Result<Self> {
        let type_name = match object.get("type") {
            Some(Value::String(s)) => s.as_str(),
            Some(_) => return Err(invalid("\"type\" must be a string")),
            None => return Err(invalid("missing \"type\"")),
        };
        let condition_type = ConditionType::parse(type_name)
            .ok_or_else(|| invalid(format!("unknown condition type \"{type_name}\"")))?;

        let allowed = condition_type.fields();
        if let Some(extra) = object
            .keys()
            .find(|k| k.as_str() != "type" && !allowed.contains(&k.as_str()))
        {
            return Err(invalid(format!(
                "unexpected field \"{extra}\" in \"{type_name}\" condition"
            )));
        }

        let condition = match condition_type {
            ConditionType::Const => match object.get("value") {
                Some(Value::Bool(b)) => Condition::Const(*b),
                _ => return Err(invalid("\"const\" condition needs a boolean \"value\"")),
            },
            ConditionType::Equals | ConditionType::NotEquals => Condition::Equals {
                lhs: required_string(object, "lhs")?,
                rhs: required_string(object, "rhs")?,
            },
            ConditionType::InList | ConditionType::NotInList => Condition::InList {
                string: required_string(object, "string")?,
                list: required_string_list(object, "list")?,
            },
            ConditionType::Matches | ConditionType::NotMatches => Condition::Matches {
                string: required_string(object, "string")?,
                regex: required_string(object, "regex")?,
            },
            ConditionType::AnyOf | ConditionType::AllOf => {
                let conditions = match object.get("conditions") {
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(Self::sub_condition)
                        .collect::<Result<Vec<_>>>()?,
                    _ => return Err(invalid(format!("\"{type_name}\" needs a \"conditions\" array"))),
                };
                Condition::AnyAllOf {
                    conditions,
                    stop_value: condition_type == ConditionType::AnyOf,
                }
            }
            ConditionType::Not => match object.get("condition") {
                Some(sub) => Condition::Not(Box::new(Self::sub_condition(sub)?)),
                None => return Err(invalid("\"not\" condition needs a \"condition\"")),
            },
        };

        Ok(match condition_type {
            ConditionType::NotEquals | ConditionType::NotInList | ConditionType::NotMatches => {
                Condition::Not(Box::new(condition))
            }
            _ => condition,
        })
    }

    /// Nested conditions may not be `null`.
    fn sub_condition(value: &Value) -> Result<Self> {
        match Self::from_json(value)? {
            Condition::Null => Err(invalid("nested conditions must not be null")),
            condition => Ok(condition),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Condition::Null)
    }

    /// Render the condition back to JSON.
    pub fn to_json(&self) -> Value {
        match self {
            Condition::Null => Value::Null,
            Condition::Const(b) => serde_json::json!({ "type": "const", "value": b }),
            Condition::Equals { lhs, rhs } => {
                serde_json::json!({ "type": "equals", "lhs": lhs, "rhs": rhs })
            }
            Condition::InList { string, list } => {
                serde_json::json!({ "type": "inList", "string": string, "list": list })
            }
            Condition::Matches { string, regex } => {
                serde_json::json!({ "type": "matches", "string": string, "regex": regex })
            }
            Condition::AnyAllOf {
                conditions,
                stop_value,
            } => serde_json::json!({
                "type": if *stop_value { "anyOf" } else { "allOf" },
                "conditions": conditions.iter().map(Condition::to_json).collect::<Vec<_>>(),
            }),
            Condition::Not(sub) => serde_json::json!({ "type": "not", "condition": sub.to_json() }),
        }
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidCondition(message.into())
}

fn required_string(object: &Map<String, Value>, key: &str) -> Result<String> {
    match object.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(invalid(format!("\"{key}\" must be a string"))),
        None => Err(invalid(format!("missing \"{key}\""))),
    }
}

fn required_string_list(object: &Map<String, Value>, key: &str) -> Result<Vec<String>> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(invalid(format!("\"{key}\" must contain only strings"))),
            })
            .collect(),
        Some(_) => Err(invalid(format!("\"{key}\" must be an array of strings"))),
        None => Err(invalid(format!("missing \"{key}\""))),
    }
}
