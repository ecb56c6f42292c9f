use core::fmt;

use tracing::warn;

use super::error::{EvalError, EvalResult};

/// A runtime value. Every evaluation step produces a fresh one.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Int(i32),
    Float(f32),
    String(String),
    Bool(bool),
}

/// Two numeric operands after promotion: both Int, or both widened to Float.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Operands {
    Int(i32, i32),
    Float(f32, f32),
}

impl Operands {
    /// Applies the promotion rule. Bools take part as 0/1; a String operand
    /// yields `None`.
    pub fn promote(left: &Value, right: &Value) -> Option<Operands> {
        match (left.int_payload(), right.int_payload()) {
            (Some(left), Some(right)) => Some(Operands::Int(left, right)),
            _ => Some(Operands::Float(left.float_payload()?, right.float_payload()?)),
        }
    }
}

impl Value {
    pub fn make_int(value: i32) -> Self {
        Value::Int(value)
    }

    pub fn make_float(value: f32) -> Self {
        Value::Float(value)
    }

    pub fn make_bool(value: bool) -> Self {
        Value::Bool(value)
    }

    /// Builds a string from literal source text: drops one pair of
    /// surrounding double quotes and resolves `\n`, `\t`, `\\` and `\"`.
    /// Any other escape is kept as written.
    pub fn make_string(literal: &str) -> EvalResult<Self> {
        let body = literal
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap_or(literal);

        let mut text = String::new();
        text.try_reserve(body.len())
            .map_err(|_| EvalError::AllocationFailure)?;

        let mut chars = body.chars();
        while let Some(char) = chars.next() {
            if char != '\\' {
                text.push(char);
                continue;
            }
            match chars.next() {
                Some('n') => text.push('\n'),
                Some('t') => text.push('\t'),
                Some('\\') => text.push('\\'),
                Some('"') => text.push('"'),
                Some(other) => {
                    warn!(escape = %other, "unrecognized escape sequence in string literal");
                    text.push('\\');
                    text.push(other);
                }
                None => text.push('\\'),
            }
        }

        Ok(Value::String(text))
    }

    /// Builds a string from a byte range of another string.
    pub fn make_substring(bytes: &[u8]) -> EvalResult<Self> {
        let mut text = String::new();
        text.try_reserve(bytes.len())
            .map_err(|_| EvalError::AllocationFailure)?;
        text.push_str(&String::from_utf8_lossy(bytes));
        Ok(Value::String(text))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
        }
    }

    /// The integer payload of an Int or Bool.
    pub fn int_payload(&self) -> Option<i32> {
        match self {
            Value::Int(value) => Some(*value),
            Value::Bool(value) => Some(*value as i32),
            Value::Float(_) | Value::String(_) => None,
        }
    }

    fn float_payload(&self) -> Option<f32> {
        match self {
            Value::Float(value) => Some(*value),
            Value::Int(value) => Some(*value as f32),
            Value::Bool(value) => Some(*value as i32 as f32),
            Value::String(_) => None,
        }
    }

    /// Truth as used by `and`, `or` and `not`: any non-zero payload is true.
    pub fn truth(&self) -> Option<bool> {
        match self {
            Value::Float(value) => Some(*value != 0.0),
            other => other.int_payload().map(|value| value != 0),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_make_string() {
        let tests = vec![
            (r#""hello""#, "hello"),
            (r#""""#, ""),
            ("bare", "bare"),
            (r#""a\nb\tc""#, "a\nb\tc"),
            (r#""say \"hi\"""#, "say \"hi\""),
            (r#""back\\slash""#, "back\\slash"),
            (r#""keep \q as is""#, "keep \\q as is"),
            (r#""trailing\"#, "\"trailing\\"),
            ("\"", "\""),
        ];

        for (literal, expected) in tests {
            let value = Value::make_string(literal).unwrap();
            assert_eq!(value, Value::String(expected.to_string()), "{literal}");
        }
    }

    #[test]
    fn test_promotion() {
        let tests = vec![
            (Value::Int(1), Value::Int(2), Some(Operands::Int(1, 2))),
            (Value::Int(1), Value::Float(2.0), Some(Operands::Float(1.0, 2.0))),
            (Value::Float(0.5), Value::Int(2), Some(Operands::Float(0.5, 2.0))),
            (Value::Bool(true), Value::Int(2), Some(Operands::Int(1, 2))),
            (Value::String("a".to_string()), Value::Int(2), None),
            (Value::Float(1.0), Value::String("a".to_string()), None),
        ];

        for (left, right, expected) in tests {
            assert_eq!(Operands::promote(&left, &right), expected);
        }
    }

    #[test]
    fn test_display() {
        let tests = vec![
            (Value::make_int(-42), "-42"),
            (Value::make_float(3.0), "3"),
            (Value::make_float(0.1), "0.1"),
            (Value::make_float(2.5), "2.5"),
            (Value::String("no quotes".to_string()), "no quotes"),
            (Value::make_bool(true), "true"),
            (Value::make_bool(false), "false"),
        ];

        for (value, expected) in tests {
            assert_eq!(value.to_string(), expected);
        }
    }

    #[test]
    fn test_truth() {
        assert_eq!(Value::Int(0).truth(), Some(false));
        assert_eq!(Value::Int(-3).truth(), Some(true));
        assert_eq!(Value::Float(0.0).truth(), Some(false));
        assert_eq!(Value::Bool(true).truth(), Some(true));
        assert_eq!(Value::String("x".to_string()).truth(), None);
    }
}
