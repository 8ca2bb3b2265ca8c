//! Best-effort scalar coercion.
//!
//! Every coercion goes through the string form of the value first, so a JSON
//! string `"42"` and a JSON number `42` coerce identically. Failures never
//! raise; they yield the supplied default.

use serde_json::Value;

/// String form of a value: strings verbatim, `null` as empty, everything else as JSON text.
pub fn cast_string(value: &Value) -> String {
    cast_string_or(value, "")
}

pub fn cast_string_or(value: &Value, default: &str) -> String {
    match value {
        Value::Null => default.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn cast_int(value: &Value) -> i32 {
    cast_int_or(value, 0)
}

pub fn cast_int_or(value: &Value, default: i32) -> i32 {
    parse_or(value, default)
}

pub fn cast_long(value: &Value) -> i64 {
    cast_long_or(value, 0)
}

pub fn cast_long_or(value: &Value, default: i64) -> i64 {
    parse_or(value, default)
}

pub fn cast_double(value: &Value) -> f64 {
    cast_double_or(value, 0.0)
}

pub fn cast_double_or(value: &Value, default: f64) -> f64 {
    parse_or(value, default)
}

pub fn cast_bool(value: &Value) -> bool {
    cast_bool_or(value, false)
}

/// Only a case-insensitive `"true"` is true; any other non-null value is false.
pub fn cast_bool_or(value: &Value, default: bool) -> bool {
    match value {
        Value::Null => default,
        other => cast_string(other).eq_ignore_ascii_case("true"),
    }
}

fn parse_or<T: std::str::FromStr>(value: &Value, default: T) -> T {
    if value.is_null() {
        return default;
    }
    let text = cast_string(value);
    if text.is_empty() {
        return default;
    }
    text.trim().parse().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_pass_through_and_null_is_empty() {
        assert_eq!(cast_string(&json!("bob")), "bob");
        assert_eq!(cast_string(&json!(7)), "7");
        assert_eq!(cast_string(&json!(true)), "true");
        assert_eq!(cast_string(&Value::Null), "");
        assert_eq!(cast_string_or(&Value::Null, "n/a"), "n/a");
        assert_eq!(cast_string(&json!({"a": 1})), "{\"a\":1}");
    }

    #[test]
    fn numbers_parse_from_strings_and_numbers() {
        assert_eq!(cast_int(&json!("42")), 42);
        assert_eq!(cast_int(&json!(42)), 42);
        assert_eq!(cast_int_or(&json!("4x"), -1), -1);
        assert_eq!(cast_int_or(&json!(""), 9), 9);
        assert_eq!(cast_double(&json!("2.5")), 2.5);
        assert_eq!(cast_double_or(&Value::Null, 1.5), 1.5);
    }

    #[test]
    fn long_parses_non_empty_values() {
        assert_eq!(cast_long(&json!("9007199254740993")), 9_007_199_254_740_993);
        assert_eq!(cast_long_or(&json!(""), 5), 5);
        assert_eq!(cast_long_or(&json!("nope"), 5), 5);
    }

    #[test]
    fn bool_is_strict_about_true() {
        assert!(cast_bool(&json!("TRUE")));
        assert!(cast_bool(&json!(true)));
        assert!(!cast_bool(&json!("yes")));
        assert!(!cast_bool_or(&json!(1), true));
        assert!(cast_bool_or(&Value::Null, true));
    }
}
