//! Expression evaluator
//!
//! Walks an `Expr` against an `Environment` and produces a `Value`.
//!
//! An aggregation call such as `sum(size + 1)` runs in two phases. The
//! argument is first scanned to find the single column it reads. Then the
//! argument is evaluated once per row of that column with
//! `Mode::Aggregating { index }`, where identifiers read `column[index]`
//! instead of their normal binding. The collected values are handed to the
//! aggregation function.

use std::sync::Arc;

use crate::ast::{
    ArithmeticOp, BitExpr, BitOp, ComparisonOp, Expr, FunctionCall, Lit, Predicate, PrefixOp,
    SimpleExpr,
};
use crate::env::{Binding, Environment};
use crate::functions::{Function, FunctionError, FunctionKind, FunctionRegistry};
use crate::ops::{arithmetic, bit, compare};
use crate::value::Value;

use super::errors::{EvalError, EvalResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    /// Inside an aggregation argument, reading row `index` of the target column
    Aggregating { index: usize },
}

/// Evaluates expressions against a function registry
pub struct Evaluator<'r> {
    registry: &'r FunctionRegistry,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Evaluates `expr`. Lazy bindings read along the way are replaced by
    /// their values in `env`.
    pub fn evaluate(&self, expr: &Expr, env: &mut Environment) -> EvalResult<Value> {
        self.expr(expr, env, Mode::Normal)
    }

    /// True if `call` names a registered aggregation function
    pub fn is_aggregation(&self, call: &FunctionCall) -> bool {
        self.registry.kind_of(&call.name) == Some(FunctionKind::Aggregation)
    }

    fn expr(&self, expr: &Expr, env: &mut Environment, mode: Mode) -> EvalResult<Value> {
        match expr {
            Expr::Or(l, r) => {
                let (l, r) = self.bool_operands(l, r, env, mode)?;
                Ok(Value::Bool(l || r))
            }
            Expr::And(l, r) => {
                let (l, r) = self.bool_operands(l, r, env, mode)?;
                Ok(Value::Bool(l && r))
            }
            Expr::Xor(l, r) => {
                let (l, r) = self.bool_operands(l, r, env, mode)?;
                Ok(Value::Bool(l != r))
            }
            Expr::Not(e) => {
                let v = self.expr(e, env, mode)?;
                Ok(Value::Bool(!expect_bool(&v, e)?))
            }
            Expr::Comparison { op, left, right } => {
                let l = self.expr(left, env, mode)?;
                let r = self.predicate(right, env, mode)?;
                compare_with(*op, &l, &r)
            }
            Expr::Predicate(p) => self.predicate(p, env, mode),
        }
    }

    fn bool_operands(
        &self,
        left: &Expr,
        right: &Expr,
        env: &mut Environment,
        mode: Mode,
    ) -> EvalResult<(bool, bool)> {
        let l = self.expr(left, env, mode)?;
        let l = expect_bool(&l, left)?;
        let r = self.expr(right, env, mode)?;
        let r = expect_bool(&r, right)?;
        Ok((l, r))
    }

    fn predicate(&self, pred: &Predicate, env: &mut Environment, mode: Mode) -> EvalResult<Value> {
        let (negated, result) = match pred {
            Predicate::Bit(b) => return self.bit(b, env, mode),
            Predicate::In {
                negated,
                target,
                list,
            } => {
                let t = self.bit(target, env, mode)?;
                let mut values = Vec::with_capacity(list.len());
                for (i, e) in list.iter().enumerate() {
                    let v = self.expr(e, env, mode)?;
                    if v.value_type() != t.value_type() {
                        return Err(EvalError::TypeMismatch(format!(
                            "in list[{}] {}: expected {} but got {}",
                            i,
                            e,
                            t.value_type(),
                            v.value_type()
                        )));
                    }
                    values.push(v);
                }
                let found = compare::in_list(&t, &values).ok_or_else(|| {
                    EvalError::TypeMismatch(format!("cannot evaluate {}", pred))
                })?;
                (*negated, found)
            }
            Predicate::Between {
                negated,
                target,
                lower,
                upper,
            } => {
                let t = self.bit(target, env, mode)?;
                let lo = self.bit(lower, env, mode)?;
                let hi = self.predicate(upper, env, mode)?;
                let inside = compare::between(&t, &lo, &hi).ok_or_else(|| {
                    EvalError::TypeMismatch(format!(
                        "between over {}, {} and {}",
                        t.value_type(),
                        lo.value_type(),
                        hi.value_type()
                    ))
                })?;
                (*negated, inside)
            }
            Predicate::Like {
                negated,
                target,
                pattern,
            } => {
                let t = self.bit(target, env, mode)?;
                let p = self.simple(pattern, env, mode)?;
                let matched = match compare::like(&t, &p) {
                    Some(m) => m,
                    None if matches!((&t, &p), (Value::String(_), Value::String(_))) => {
                        return Err(EvalError::Op(crate::ops::OpError::InvalidPattern(
                            p.to_string(),
                        )))
                    }
                    None => {
                        return Err(EvalError::TypeMismatch(format!(
                            "like over {} and {}",
                            t.value_type(),
                            p.value_type()
                        )))
                    }
                };
                (*negated, matched)
            }
        };
        Ok(Value::Bool(result != negated))
    }

    fn bit(&self, expr: &BitExpr, env: &mut Environment, mode: Mode) -> EvalResult<Value> {
        match expr {
            BitExpr::Simple(s) => self.simple(s, env, mode),
            BitExpr::Bit { op, left, right } => {
                let l = self.bit(left, env, mode)?;
                let r = self.bit(right, env, mode)?;
                let v = match op {
                    BitOp::And => bit::and(&l, &r)?,
                    BitOp::Or => bit::or(&l, &r)?,
                    BitOp::Xor => bit::xor(&l, &r)?,
                };
                Ok(Value::Int(v))
            }
            BitExpr::Arithmetic { op, left, right } => {
                let l = self.bit(left, env, mode)?;
                let r = self.bit(right, env, mode)?;
                let v = match op {
                    ArithmeticOp::Add => arithmetic::add(&l, &r)?,
                    ArithmeticOp::Subtract => arithmetic::subtract(&l, &r)?,
                    ArithmeticOp::Multiply => arithmetic::multiply(&l, &r)?,
                    ArithmeticOp::Divide => arithmetic::divide(&l, &r)?,
                };
                Ok(Value::normalize(v))
            }
        }
    }

    fn simple(&self, expr: &SimpleExpr, env: &mut Environment, mode: Mode) -> EvalResult<Value> {
        match expr {
            SimpleExpr::Lit(lit) => Ok(match lit {
                Lit::Int(v) => Value::Int(*v),
                Lit::Float(v) => Value::Float(*v),
                Lit::String(v) => Value::String(v.clone()),
            }),
            SimpleExpr::Paren(e) => self.expr(e, env, mode),
            SimpleExpr::Prefix { op, expr } => {
                let v = self.simple(expr, env, mode)?;
                prefix(*op, v)
            }
            SimpleExpr::Ident(name) => match mode {
                Mode::Normal => self.ident(name, env),
                Mode::Aggregating { index } => column_at(name, env, index),
            },
            SimpleExpr::Call(call) => {
                if self.is_aggregation(call) {
                    if let Mode::Aggregating { .. } = mode {
                        return Err(EvalError::NestedAggregation(call.to_string()));
                    }
                    return self.aggregate(call, env);
                }
                let function = self.lookup(&call.name)?;
                let mut args = Vec::with_capacity(call.args.len());
                for a in &call.args {
                    args.push(self.expr(a, env, mode)?);
                }
                function.call(&args).map_err(|source| EvalError::Function {
                    name: call.name.clone(),
                    source,
                })
            }
        }
    }

    fn lookup(&self, name: &str) -> EvalResult<Arc<dyn Function>> {
        self.registry.get(name).map_err(|e| match e {
            FunctionError::NotFound(_) => {
                EvalError::UnknownExpr(format!("function {} not found", name))
            }
            source => EvalError::Function {
                name: name.to_string(),
                source,
            },
        })
    }

    fn ident(&self, name: &str, env: &mut Environment) -> EvalResult<Value> {
        let lazy = match env.get(name) {
            Some(Binding::Scalar(v)) => return Ok(v.clone()),
            Some(Binding::Lazy(e)) => Arc::clone(e),
            Some(Binding::Column(_)) => {
                return Err(EvalError::TypeMismatch(format!(
                    "{} is a column; use an aggregation function",
                    name
                )))
            }
            None => return Err(EvalError::UnknownExpr(format!("cannot find ident {}", name))),
        };

        // Unbound while evaluating, so a self-referencing alias fails instead of recursing.
        let saved = env.take(name);
        match self.expr(&lazy, env, Mode::Normal) {
            Ok(v) => {
                env.set_value(name, v.clone());
                Ok(v)
            }
            Err(e) => {
                if let Some(binding) = saved {
                    env.set(name, binding);
                }
                Err(e)
            }
        }
    }

    fn aggregate(&self, call: &FunctionCall, env: &mut Environment) -> EvalResult<Value> {
        let arg = match call.args.as_slice() {
            [arg] => arg,
            args => {
                return Err(EvalError::AggregationArgCount {
                    name: call.name.clone(),
                    got: args.len(),
                })
            }
        };

        if arg.any_call(&|c: &FunctionCall| self.is_aggregation(c)) {
            return Err(EvalError::NestedAggregation(call.to_string()));
        }
        let len = target_len(arg, env, call)?;

        let function = self.lookup(&call.name)?;
        let mut values = Vec::with_capacity(len);
        for index in 0..len {
            values.push(self.expr(arg, env, Mode::Aggregating { index })?);
        }
        function.call(&values).map_err(|source| EvalError::Function {
            name: call.name.clone(),
            source,
        })
    }
}

/// Resolves the single column an aggregation argument reads and returns its length.
/// Each identifier must be bound to a column before names are compared.
fn target_len(arg: &Expr, env: &Environment, call: &FunctionCall) -> EvalResult<usize> {
    let mut target: Option<(&str, usize)> = None;
    let mut failure: Option<EvalError> = None;

    arg.for_each_ident(&mut |name| {
        if failure.is_some() {
            return;
        }
        let len = match env.get(name) {
            Some(Binding::Column(values)) => values.len(),
            Some(other) => {
                failure = Some(EvalError::TypeMismatch(format!(
                    "aggregation target {} is a {}, not a column",
                    name,
                    other.kind()
                )));
                return;
            }
            None => {
                failure = Some(EvalError::UnknownExpr(format!("cannot find ident {}", name)));
                return;
            }
        };
        match target {
            None => target = Some((name, len)),
            Some((t, _)) if t != name => {
                failure = Some(EvalError::MixedAggregationTargets {
                    first: t.to_string(),
                    second: name.to_string(),
                })
            }
            Some(_) => {}
        }
    });
    if let Some(err) = failure {
        return Err(err);
    }

    target
        .map(|(_, len)| len)
        .ok_or_else(|| EvalError::UnknownExpr(format!("{} does not reference a column", call)))
}

fn column_at(name: &str, env: &Environment, index: usize) -> EvalResult<Value> {
    match env.get(name) {
        Some(Binding::Column(values)) => values.get(index).cloned().ok_or_else(|| {
            EvalError::UnknownExpr(format!("index {} out of range for {}", index, name))
        }),
        Some(other) => Err(EvalError::TypeMismatch(format!(
            "aggregation target {} is a {}, not a column",
            name,
            other.kind()
        ))),
        None => Err(EvalError::UnknownExpr(format!("cannot find ident {}", name))),
    }
}

fn expect_bool(v: &Value, source: &Expr) -> EvalResult<bool> {
    match v {
        Value::Bool(b) => Ok(*b),
        other => Err(EvalError::TypeMismatch(format!(
            "expected bool but got {} from {}",
            other.value_type(),
            source
        ))),
    }
}

fn compare_with(op: ComparisonOp, left: &Value, right: &Value) -> EvalResult<Value> {
    use std::cmp::Ordering::*;

    let ord = compare::compare(left, right).ok_or_else(|| {
        EvalError::TypeMismatch(format!(
            "cannot compare {} {} and {} {}",
            left.value_type(),
            left,
            right.value_type(),
            right
        ))
    })?;
    let result = match op {
        ComparisonOp::Equal => ord == Equal,
        ComparisonOp::NotEqual => ord != Equal,
        ComparisonOp::GreaterThan => ord == Greater,
        ComparisonOp::GreaterEqual => ord != Less,
        ComparisonOp::LessThan => ord == Less,
        ComparisonOp::LessEqual => ord != Greater,
    };
    Ok(Value::Bool(result))
}

fn prefix(op: PrefixOp, v: Value) -> EvalResult<Value> {
    match (op, v) {
        (PrefixOp::Plus, v) => Ok(v),
        (PrefixOp::Minus, Value::Int(i)) => Ok(Value::Int(i.wrapping_neg())),
        (PrefixOp::Minus, Value::Float(f)) => Ok(Value::Float(-f)),
        (PrefixOp::BitNot, v) => Ok(Value::Int(bit::not(&v)?)),
        (PrefixOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (op, v) => Err(EvalError::TypeMismatch(format!(
            "prefix {} over {}",
            op.as_str().trim(),
            v.value_type()
        ))),
    }
}
