//! Arithmetic over Int and Float operands
//!
//! Every operation computes in `f64`. Callers fold the result back with
//! `Value::normalize`.

use crate::value::Value;

use super::errors::{OpError, OpResult};

fn operands(op: &'static str, left: &Value, right: &Value) -> OpResult<(f64, f64)> {
    let l = left
        .to_f64()
        .ok_or_else(|| OpError::invalid(op, format!("left {} is {}", left, left.value_type())))?;
    let r = right
        .to_f64()
        .ok_or_else(|| OpError::invalid(op, format!("right {} is {}", right, right.value_type())))?;
    Ok((l, r))
}

pub fn add(left: &Value, right: &Value) -> OpResult<f64> {
    let (l, r) = operands("add", left, right)?;
    Ok(l + r)
}

pub fn subtract(left: &Value, right: &Value) -> OpResult<f64> {
    let (l, r) = operands("subtract", left, right)?;
    Ok(l - r)
}

pub fn multiply(left: &Value, right: &Value) -> OpResult<f64> {
    let (l, r) = operands("multiply", left, right)?;
    Ok(l * r)
}

pub fn divide(left: &Value, right: &Value) -> OpResult<f64> {
    let (l, r) = operands("divide", left, right)?;
    if r == 0.0 {
        return Err(OpError::DivisionByZero);
    }
    Ok(l / r)
}

pub fn pow(left: &Value, right: &Value) -> OpResult<f64> {
    let (l, r) = operands("pow", left, right)?;
    Ok(l.powf(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_operands() {
        assert_eq!(add(&Value::Int(1), &Value::Float(0.5)).unwrap(), 1.5);
        assert_eq!(multiply(&Value::Int(3), &Value::Int(4)).unwrap(), 12.0);
        assert_eq!(subtract(&Value::Float(1.0), &Value::Int(3)).unwrap(), -2.0);
        assert_eq!(pow(&Value::Int(2), &Value::Int(10)).unwrap(), 1024.0);
    }

    #[test]
    fn test_divide_by_zero() {
        assert_eq!(
            divide(&Value::Int(1), &Value::Int(0)),
            Err(OpError::DivisionByZero)
        );
        assert_eq!(divide(&Value::Int(7), &Value::Int(2)).unwrap(), 3.5);
    }

    #[test]
    fn test_non_numeric_rejected() {
        let err = add(&Value::from("a"), &Value::Int(1)).unwrap_err();
        assert!(matches!(err, OpError::InvalidArgument { op: "add", .. }));
        assert!(add(&Value::Int(1), &Value::Bool(true)).is_err());
    }
}
