//! Condition evaluation.
//!
//! Operand strings are macro-expanded with the preset's own expander before
//! comparison. A `vendor` macro anywhere in an evaluated operand surfaces as
//! [`MacroError::VendorIgnored`] and short-circuits the whole evaluation.

use presetgraph_core::Condition;
use regex::Regex;

use crate::macros::{MacroError, MacroExpander, MacroResult};

/// Evaluate `condition`, expanding operands with `expander`.
pub fn evaluate(condition: &Condition, expander: &mut MacroExpander<'_>) -> MacroResult<bool> {
    match condition {
        Condition::Null => Ok(true),
        Condition::Const(value) => Ok(*value),
        Condition::Equals { lhs, rhs } => {
            let lhs = expander.expand(lhs)?;
            let rhs = expander.expand(rhs)?;
            Ok(lhs == rhs)
        }
        Condition::InList { string, list } => {
            let string = expander.expand(string)?;
            for item in list {
                if expander.expand(item)? == string {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Condition::Matches { string, regex } => {
            let string = expander.expand(string)?;
            let pattern = expander.expand(regex)?;
            let regex = Regex::new(&pattern).map_err(|e| MacroError::InvalidRegex {
                regex: pattern.clone(),
                message: e.to_string(),
            })?;
            Ok(regex.is_match(&string))
        }
        Condition::AnyAllOf {
            conditions,
            stop_value,
        } => {
            for condition in conditions {
                if evaluate(condition, expander)? == *stop_value {
                    return Ok(*stop_value);
                }
            }
            Ok(!*stop_value)
        }
        Condition::Not(sub) => evaluate(sub, expander).map(|value| !value),
    }
}
