//! Bitwise operators
//!
//! Operands are Int, or strings of binary digits such as `"101"`.

use crate::value::Value;

use super::errors::{OpError, OpResult};

fn operand(op: &'static str, v: &Value) -> OpResult<i64> {
    match v {
        Value::Int(i) => Ok(*i),
        Value::String(s) => from_binary_string(s),
        other => Err(OpError::invalid(
            op,
            format!("{} is {}", other, other.value_type()),
        )),
    }
}

pub fn not(arg: &Value) -> OpResult<i64> {
    Ok(!operand("bit not", arg)?)
}

pub fn and(left: &Value, right: &Value) -> OpResult<i64> {
    Ok(operand("bit and", left)? & operand("bit and", right)?)
}

pub fn or(left: &Value, right: &Value) -> OpResult<i64> {
    Ok(operand("bit or", left)? | operand("bit or", right)?)
}

pub fn xor(left: &Value, right: &Value) -> OpResult<i64> {
    Ok(operand("bit xor", left)? ^ operand("bit xor", right)?)
}

/// Parses binary digits, with an optional leading `-`
pub fn from_binary_string(s: &str) -> OpResult<i64> {
    i64::from_str_radix(s, 2).map_err(|_| OpError::InvalidBinaryString(s.to_string()))
}

/// Renders binary digits; negatives get a leading `-`
pub fn to_binary_string(v: i64) -> String {
    if v < 0 {
        format!("-{:b}", v.unsigned_abs())
    } else {
        format!("{:b}", v)
    }
}
