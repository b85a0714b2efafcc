//! Expression tree
//!
//! One closed enum per grammar category, so the evaluator matches
//! exhaustively instead of probing node types at runtime.

use std::fmt;

use serde::Serialize;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "<>",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterEqual => ">=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessEqual => "<=",
        }
    }
}

/// Bitwise binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BitOp {
    And,
    Or,
    Xor,
}

impl BitOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BitOp::And => "&",
            BitOp::Or => "|",
            BitOp::Xor => "^",
        }
    }
}

/// Arithmetic binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
        }
    }
}

/// Unary prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixOp {
    Plus,
    Minus,
    BitNot,
    Not,
}

impl PrefixOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrefixOp::Plus => "+",
            PrefixOp::Minus => "-",
            PrefixOp::BitNot => "~",
            PrefixOp::Not => "not ",
        }
    }
}

/// Top-level boolean expression
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Xor(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Predicate>,
    },
    Predicate(Predicate),
}

/// IN / BETWEEN / LIKE predicates, or a plain bit expression
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    In {
        negated: bool,
        target: BitExpr,
        list: Vec<Expr>,
    },
    Between {
        negated: bool,
        target: BitExpr,
        lower: BitExpr,
        upper: Box<Predicate>,
    },
    Like {
        negated: bool,
        target: BitExpr,
        pattern: SimpleExpr,
    },
    Bit(BitExpr),
}

/// Bitwise and arithmetic expressions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BitExpr {
    Bit {
        op: BitOp,
        left: Box<BitExpr>,
        right: Box<BitExpr>,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<BitExpr>,
        right: Box<BitExpr>,
    },
    Simple(SimpleExpr),
}

/// Operands: literals, identifiers, calls, prefix ops and parentheses
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleExpr {
    Prefix { op: PrefixOp, expr: Box<SimpleExpr> },
    Lit(Lit),
    Ident(String),
    Call(FunctionCall),
    Paren(Box<Expr>),
}

/// A function call `name(args...)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
}

/// Literals
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lit {
    Int(i64),
    Float(f64),
    String(String),
}

impl Expr {
    /// Bare identifier expression
    pub fn ident(name: impl Into<String>) -> Self {
        SimpleExpr::Ident(name.into()).into()
    }

    /// Integer literal expression
    pub fn int(v: i64) -> Self {
        SimpleExpr::Lit(Lit::Int(v)).into()
    }

    /// Float literal expression
    pub fn float(v: f64) -> Self {
        SimpleExpr::Lit(Lit::Float(v)).into()
    }

    /// String literal expression
    pub fn string(v: impl Into<String>) -> Self {
        SimpleExpr::Lit(Lit::String(v.into())).into()
    }

    /// Function call expression
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        SimpleExpr::Call(FunctionCall {
            name: name.into(),
            args,
        })
        .into()
    }

    /// `left op right` comparison
    pub fn compare(op: ComparisonOp, left: Expr, right: Expr) -> Self {
        Expr::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right.into_predicate()),
        }
    }

    /// `left op right` arithmetic
    pub fn arithmetic(op: ArithmeticOp, left: Expr, right: Expr) -> Self {
        Expr::Predicate(Predicate::Bit(BitExpr::Arithmetic {
            op,
            left: Box::new(left.into_bit_expr()),
            right: Box::new(right.into_bit_expr()),
        }))
    }

    /// Narrows to a predicate, wrapping in parentheses when needed
    pub fn into_predicate(self) -> Predicate {
        match self {
            Expr::Predicate(p) => p,
            other => Predicate::Bit(BitExpr::Simple(SimpleExpr::Paren(Box::new(other)))),
        }
    }

    /// Narrows to a bit expression, wrapping in parentheses when needed
    pub fn into_bit_expr(self) -> BitExpr {
        match self {
            Expr::Predicate(Predicate::Bit(b)) => b,
            other => BitExpr::Simple(SimpleExpr::Paren(Box::new(other))),
        }
    }

    /// Narrows to a simple expression, wrapping in parentheses when needed
    pub fn into_simple_expr(self) -> SimpleExpr {
        match self {
            Expr::Predicate(Predicate::Bit(BitExpr::Simple(s))) => s,
            other => SimpleExpr::Paren(Box::new(other)),
        }
    }

    /// Returns the identifier name if this expression is a bare identifier
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Predicate(Predicate::Bit(BitExpr::Simple(SimpleExpr::Ident(name)))) => {
                Some(name)
            }
            Expr::Predicate(Predicate::Bit(BitExpr::Simple(SimpleExpr::Paren(inner)))) => {
                inner.as_ident()
            }
            _ => None,
        }
    }

    /// Returns true if any function call in the tree satisfies `pred`
    pub fn any_call(&self, pred: &dyn Fn(&FunctionCall) -> bool) -> bool {
        match self {
            Expr::Or(l, r) | Expr::And(l, r) | Expr::Xor(l, r) => {
                l.any_call(pred) || r.any_call(pred)
            }
            Expr::Not(e) => e.any_call(pred),
            Expr::Comparison { left, right, .. } => left.any_call(pred) || right.any_call(pred),
            Expr::Predicate(p) => p.any_call(pred),
        }
    }

    /// Visits every identifier in the tree, in evaluation order
    pub fn for_each_ident<'a>(&'a self, f: &mut dyn FnMut(&'a str)) {
        match self {
            Expr::Or(l, r) | Expr::And(l, r) | Expr::Xor(l, r) => {
                l.for_each_ident(f);
                r.for_each_ident(f);
            }
            Expr::Not(e) => e.for_each_ident(f),
            Expr::Comparison { left, right, .. } => {
                left.for_each_ident(f);
                right.for_each_ident(f);
            }
            Expr::Predicate(p) => p.for_each_ident(f),
        }
    }
}

impl Predicate {
    fn any_call(&self, pred: &dyn Fn(&FunctionCall) -> bool) -> bool {
        match self {
            Predicate::In { target, list, .. } => {
                target.any_call(pred) || list.iter().any(|e| e.any_call(pred))
            }
            Predicate::Between {
                target,
                lower,
                upper,
                ..
            } => target.any_call(pred) || lower.any_call(pred) || upper.any_call(pred),
            Predicate::Like {
                target, pattern, ..
            } => target.any_call(pred) || pattern.any_call(pred),
            Predicate::Bit(b) => b.any_call(pred),
        }
    }

    fn for_each_ident<'a>(&'a self, f: &mut dyn FnMut(&'a str)) {
        match self {
            Predicate::In { target, list, .. } => {
                target.for_each_ident(f);
                for e in list {
                    e.for_each_ident(f);
                }
            }
            Predicate::Between {
                target,
                lower,
                upper,
                ..
            } => {
                target.for_each_ident(f);
                lower.for_each_ident(f);
                upper.for_each_ident(f);
            }
            Predicate::Like {
                target, pattern, ..
            } => {
                target.for_each_ident(f);
                pattern.for_each_ident(f);
            }
            Predicate::Bit(b) => b.for_each_ident(f),
        }
    }
}

impl BitExpr {
    fn any_call(&self, pred: &dyn Fn(&FunctionCall) -> bool) -> bool {
        match self {
            BitExpr::Bit { left, right, .. } | BitExpr::Arithmetic { left, right, .. } => {
                left.any_call(pred) || right.any_call(pred)
            }
            BitExpr::Simple(s) => s.any_call(pred),
        }
    }

    fn for_each_ident<'a>(&'a self, f: &mut dyn FnMut(&'a str)) {
        match self {
            BitExpr::Bit { left, right, .. } | BitExpr::Arithmetic { left, right, .. } => {
                left.for_each_ident(f);
                right.for_each_ident(f);
            }
            BitExpr::Simple(s) => s.for_each_ident(f),
        }
    }
}

impl SimpleExpr {
    fn any_call(&self, pred: &dyn Fn(&FunctionCall) -> bool) -> bool {
        match self {
            SimpleExpr::Prefix { expr, .. } => expr.any_call(pred),
            SimpleExpr::Lit(_) | SimpleExpr::Ident(_) => false,
            SimpleExpr::Call(call) => pred(call) || call.args.iter().any(|a| a.any_call(pred)),
            SimpleExpr::Paren(e) => e.any_call(pred),
        }
    }

    fn for_each_ident<'a>(&'a self, f: &mut dyn FnMut(&'a str)) {
        match self {
            SimpleExpr::Prefix { expr, .. } => expr.for_each_ident(f),
            SimpleExpr::Lit(_) => {}
            SimpleExpr::Ident(name) => f(name),
            SimpleExpr::Call(call) => {
                for a in &call.args {
                    a.for_each_ident(f);
                }
            }
            SimpleExpr::Paren(e) => e.for_each_ident(f),
        }
    }
}

impl From<SimpleExpr> for Expr {
    fn from(s: SimpleExpr) -> Self {
        Expr::Predicate(Predicate::Bit(BitExpr::Simple(s)))
    }
}

impl From<BitExpr> for Expr {
    fn from(b: BitExpr) -> Self {
        Expr::Predicate(Predicate::Bit(b))
    }
}

impl From<Predicate> for Expr {
    fn from(p: Predicate) -> Self {
        Expr::Predicate(p)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Or(l, r) => write!(f, "{} or {}", l, r),
            Expr::And(l, r) => write!(f, "{} and {}", l, r),
            Expr::Xor(l, r) => write!(f, "{} xor {}", l, r),
            Expr::Not(e) => write!(f, "not {}", e),
            Expr::Comparison { op, left, right } => {
                write!(f, "{} {} {}", left, op.as_str(), right)
            }
            Expr::Predicate(p) => write!(f, "{}", p),
        }
    }
}

fn not_keyword(negated: bool) -> &'static str {
    if negated {
        " not"
    } else {
        ""
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::In {
                negated,
                target,
                list,
            } => {
                let items: Vec<String> = list.iter().map(|e| e.to_string()).collect();
                write!(
                    f,
                    "{}{} in ({})",
                    target,
                    not_keyword(*negated),
                    items.join(", ")
                )
            }
            Predicate::Between {
                negated,
                target,
                lower,
                upper,
            } => write!(
                f,
                "{}{} between {} and {}",
                target,
                not_keyword(*negated),
                lower,
                upper
            ),
            Predicate::Like {
                negated,
                target,
                pattern,
            } => write!(f, "{}{} like {}", target, not_keyword(*negated), pattern),
            Predicate::Bit(b) => write!(f, "{}", b),
        }
    }
}

impl fmt::Display for BitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitExpr::Bit { op, left, right } => write!(f, "{} {} {}", left, op.as_str(), right),
            BitExpr::Arithmetic { op, left, right } => {
                write!(f, "{} {} {}", left, op.as_str(), right)
            }
            BitExpr::Simple(s) => write!(f, "{}", s),
        }
    }
}

impl fmt::Display for SimpleExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleExpr::Prefix { op, expr } => write!(f, "{}{}", op.as_str(), expr),
            SimpleExpr::Lit(lit) => write!(f, "{}", lit),
            SimpleExpr::Ident(name) => write!(f, "{}", name),
            SimpleExpr::Call(call) => write!(f, "{}", call),
            SimpleExpr::Paren(e) => write!(f, "({})", e),
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        write!(f, "{}({})", self.name, args.join(", "))
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lit::Int(v) => write!(f, "{}", v),
            Lit::Float(v) => write!(f, "{:?}", v),
            Lit::String(v) => write!(f, "\"{}\"", v),
        }
    }
}
