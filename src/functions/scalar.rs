//! Scalar built-ins

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::Utc;
use regex::bytes::Regex;

use crate::ops::{arithmetic, bit, cast, CastTarget};
use crate::value::Value;

use super::errors::{FunctionError, FunctionResult};
use super::function::{expect_args, expect_string, Function};

/// `now()`: current Unix seconds
pub struct Now;

impl Function for Now {
    fn name(&self) -> &'static str {
        "now"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        expect_args(self.name(), "0", args, 0)?;
        Ok(Value::Int(Utc::now().timestamp()))
    }
}

/// `cast(v, type)`
pub struct Cast;

impl Function for Cast {
    fn name(&self) -> &'static str {
        "cast"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        expect_args(self.name(), "2", args, 2)?;
        let target: CastTarget = expect_string(self.name(), &args[1])?.parse()?;
        Ok(cast(&args[0], target)?)
    }
}

/// `int2bin(i)`: binary digits of an integer
pub struct Int2Bin;

impl Function for Int2Bin {
    fn name(&self) -> &'static str {
        "int2bin"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        expect_args(self.name(), "1", args, 1)?;
        match &args[0] {
            Value::Int(i) => Ok(Value::String(bit::to_binary_string(*i))),
            other => Err(FunctionError::invalid(
                self.name(),
                format!("want int but got {}", other.value_type()),
            )),
        }
    }
}

/// `bin2int(s)`
pub struct Bin2Int;

impl Function for Bin2Int {
    fn name(&self) -> &'static str {
        "bin2int"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        expect_args(self.name(), "1", args, 1)?;
        let s = expect_string(self.name(), &args[0])?;
        Ok(Value::Int(bit::from_binary_string(s)?))
    }
}

/// `ext(path)`: extension without the dot, empty if none
pub struct Ext;

impl Function for Ext {
    fn name(&self) -> &'static str {
        "ext"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        expect_args(self.name(), "1", args, 1)?;
        let path = expect_string(self.name(), &args[0])?;
        let ext = Path::new(path)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Value::String(ext))
    }
}

/// `dir(path)`: everything but the last element
pub struct Dir;

impl Function for Dir {
    fn name(&self) -> &'static str {
        "dir"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        expect_args(self.name(), "1", args, 1)?;
        let path = expect_string(self.name(), &args[0])?;
        let dir = match Path::new(path).parent() {
            Some(p) if p.as_os_str().is_empty() => ".".to_string(),
            Some(p) => p.to_string_lossy().into_owned(),
            None if path.is_empty() => ".".to_string(),
            None => path.to_string(),
        };
        Ok(Value::String(dir))
    }
}

/// `base(path)`: the last element
pub struct Base;

impl Function for Base {
    fn name(&self) -> &'static str {
        "base"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        expect_args(self.name(), "1", args, 1)?;
        let path = expect_string(self.name(), &args[0])?;
        let base = match Path::new(path).file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None if path.is_empty() => ".".to_string(),
            None => path.to_string(),
        };
        Ok(Value::String(base))
    }
}

/// `len(s)`: byte length
pub struct Len;

impl Function for Len {
    fn name(&self) -> &'static str {
        "len"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        expect_args(self.name(), "1", args, 1)?;
        let s = expect_string(self.name(), &args[0])?;
        Ok(Value::Int(s.len() as i64))
    }
}

fn round_with(
    name: &'static str,
    args: &[Value],
    f: fn(f64) -> f64,
) -> FunctionResult<Value> {
    expect_args(name, "1", args, 1)?;
    match &args[0] {
        Value::Int(_) => Ok(args[0].clone()),
        Value::Float(v) => Ok(Value::normalize(f(*v))),
        other => Err(FunctionError::invalid(
            name,
            format!("want int or float but got {}", other.value_type()),
        )),
    }
}

pub struct Floor;

impl Function for Floor {
    fn name(&self) -> &'static str {
        "floor"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        round_with(self.name(), args, f64::floor)
    }
}

pub struct Ceil;

impl Function for Ceil {
    fn name(&self) -> &'static str {
        "ceil"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        round_with(self.name(), args, f64::ceil)
    }
}

/// `pow(a, b)`
pub struct Pow;

impl Function for Pow {
    fn name(&self) -> &'static str {
        "pow"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        expect_args(self.name(), "2", args, 2)?;
        Ok(Value::normalize(arithmetic::pow(&args[0], &args[1])?))
    }
}

/// `grep(pattern, path)`: number of lines in the file matching `pattern`
pub struct Grep;

impl Function for Grep {
    fn name(&self) -> &'static str {
        "grep"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        expect_args(self.name(), "2", args, 2)?;
        let pattern = expect_string(self.name(), &args[0])?;
        let path = expect_string(self.name(), &args[1])?;

        let re = Regex::new(pattern)
            .map_err(|e| FunctionError::invalid(self.name(), e.to_string()))?;
        let file = File::open(path).map_err(|e| FunctionError::Io(format!("{}: {}", path, e)))?;

        let mut reader = BufReader::new(file);
        let mut line = Vec::new();
        let mut count = 0i64;
        loop {
            line.clear();
            let n = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| FunctionError::Io(format!("{}: {}", path, e)))?;
            if n == 0 {
                break;
            }
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            if re.is_match(&line) {
                count += 1;
            }
        }
        Ok(Value::Int(count))
    }
}

/// `depth(path)`: number of `/` separators
pub struct Depth;

impl Function for Depth {
    fn name(&self) -> &'static str {
        "depth"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        expect_args(self.name(), "1", args, 1)?;
        let path = expect_string(self.name(), &args[0])?;
        Ok(Value::Int(path.matches('/').count() as i64))
    }
}
