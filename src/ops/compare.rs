//! Comparison and membership predicates
//!
//! Values compare only with values of the same tag. Everything returns
//! `None` when the comparison is undefined.

use std::cmp::Ordering;

use regex::Regex;

use crate::value::Value;

/// Orders two values of the same tag. `false < true` for Bool.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::Float(l), Value::Float(r)) => l.partial_cmp(r),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// True if `target` equals an element of `list`
pub fn in_list(target: &Value, list: &[Value]) -> Option<bool> {
    if list
        .iter()
        .any(|v| v.value_type() != target.value_type())
    {
        return None;
    }
    Some(list.iter().any(|v| v == target))
}

/// Inclusive range check over Int, Float or String
pub fn between(target: &Value, lower: &Value, upper: &Value) -> Option<bool> {
    if matches!(target, Value::Bool(_)) {
        return None;
    }
    let lo = compare(target, lower)?;
    let hi = compare(target, upper)?;
    Some(lo != Ordering::Less && hi != Ordering::Greater)
}

/// Regex search of `pattern` anywhere in `target`
pub fn like(target: &Value, pattern: &Value) -> Option<bool> {
    match (target, pattern) {
        (Value::String(t), Value::String(p)) => {
            let re = Regex::new(p).ok()?;
            Some(re.is_match(t))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_same_tag() {
        assert_eq!(compare(&Value::Int(1), &Value::Int(2)), Some(Ordering::Less));
        assert_eq!(
            compare(&Value::from("b"), &Value::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare(&Value::Bool(false), &Value::Bool(true)),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare(&Value::Float(1.5), &Value::Float(1.5)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_compare_cross_tag_undefined() {
        assert_eq!(compare(&Value::Int(1), &Value::Float(1.0)), None);
        assert_eq!(compare(&Value::Int(1), &Value::from("1")), None);
        assert_eq!(compare(&Value::Float(f64::NAN), &Value::Float(1.0)), None);
    }

    #[test]
    fn test_in_list() {
        let list = vec![Value::Int(1), Value::Int(3)];
        assert_eq!(in_list(&Value::Int(3), &list), Some(true));
        assert_eq!(in_list(&Value::Int(2), &list), Some(false));
        assert_eq!(in_list(&Value::from("1"), &list), None);
    }

    #[test]
    fn test_between_inclusive() {
        let (lo, hi) = (Value::Int(1), Value::Int(3));
        assert_eq!(between(&Value::Int(1), &lo, &hi), Some(true));
        assert_eq!(between(&Value::Int(3), &lo, &hi), Some(true));
        assert_eq!(between(&Value::Int(4), &lo, &hi), Some(false));
        assert_eq!(
            between(&Value::from("b"), &Value::from("a"), &Value::from("c")),
            Some(true)
        );
        assert_eq!(
            between(&Value::Bool(true), &Value::Bool(false), &Value::Bool(true)),
            None
        );
        assert_eq!(between(&Value::Int(1), &Value::Float(0.5), &hi), None);
    }

    #[test]
    fn test_like_is_regex_search() {
        assert_eq!(like(&Value::from("main.rs"), &Value::from(r"\.rs$")), Some(true));
        assert_eq!(like(&Value::from("main.go"), &Value::from(r"\.rs$")), Some(false));
        assert_eq!(like(&Value::from("abc"), &Value::from("(")), None);
        assert_eq!(like(&Value::Int(1), &Value::from("1")), None);
    }
}
