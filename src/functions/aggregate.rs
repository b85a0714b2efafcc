//! Aggregation built-ins
//!
//! Each receives one value per member of the aggregated column.

use std::cmp::Ordering;

use crate::ops::{arithmetic, compare};
use crate::value::Value;

use super::errors::{FunctionError, FunctionResult};
use super::function::{Function, FunctionKind};

/// Names of every aggregation function
pub const AGGREGATION_NAMES: &[&str] = &["count", "min", "max", "product", "sum", "avg"];

fn non_empty(name: &'static str, args: &[Value]) -> FunctionResult<()> {
    if args.is_empty() {
        return Err(FunctionError::ArgumentCount {
            name,
            expected: "at least 1",
            got: 0,
        });
    }
    Ok(())
}

fn pick(name: &'static str, args: &[Value], keep: Ordering) -> FunctionResult<Value> {
    non_empty(name, args)?;
    let mut best = &args[0];
    for x in &args[1..] {
        match compare::compare(x, best) {
            Some(ord) if ord == keep => best = x,
            Some(_) => {}
            None => {
                return Err(FunctionError::invalid(
                    name,
                    format!("cannot compare {} and {}", best, x),
                ))
            }
        }
    }
    Ok(best.clone())
}

fn sum_of(name: &'static str, args: &[Value]) -> FunctionResult<f64> {
    non_empty(name, args)?;
    let mut acc = Value::Float(0.0);
    for a in args {
        acc = Value::Float(arithmetic::add(&acc, a)?);
    }
    Ok(acc.as_float())
}

pub struct Count;

impl Function for Count {
    fn name(&self) -> &'static str {
        "count"
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Aggregation
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        Ok(Value::Int(args.len() as i64))
    }
}

pub struct Min;

impl Function for Min {
    fn name(&self) -> &'static str {
        "min"
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Aggregation
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        pick(self.name(), args, Ordering::Less)
    }
}

pub struct Max;

impl Function for Max {
    fn name(&self) -> &'static str {
        "max"
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Aggregation
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        pick(self.name(), args, Ordering::Greater)
    }
}

pub struct Sum;

impl Function for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Aggregation
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        Ok(Value::normalize(sum_of(self.name(), args)?))
    }
}

pub struct Product;

impl Function for Product {
    fn name(&self) -> &'static str {
        "product"
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Aggregation
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        non_empty(self.name(), args)?;
        let mut acc = Value::Float(1.0);
        for a in args {
            acc = Value::Float(arithmetic::multiply(&acc, a)?);
        }
        Ok(Value::normalize(acc.as_float()))
    }
}

pub struct Avg;

impl Function for Avg {
    fn name(&self) -> &'static str {
        "avg"
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Aggregation
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        let total = sum_of(self.name(), args)?;
        Ok(Value::normalize(total / args.len() as f64))
    }
}
