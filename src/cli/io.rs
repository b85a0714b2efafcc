//! Result writers
//!
//! - CSV through the `csv` crate, optional header row
//! - JSON lines, one object per row keyed by header
//!
//! Both reject a row whose width differs from the header count.

use std::io::Write;

use serde_json::{Map, Value as JsonValue};

use crate::value::Value;

use super::config::OutputFormat;
use super::errors::{CliError, CliResult};

/// Sink for projected rows
pub trait RowWriter {
    fn write_row(&mut self, values: &[Value]) -> CliResult<()>;

    /// Flushes buffered output
    fn finish(&mut self) -> CliResult<()>;
}

fn check_width(headers: usize, values: &[Value]) -> CliResult<()> {
    if headers != values.len() {
        return Err(CliError::width_mismatch(headers, values.len()));
    }
    Ok(())
}

pub struct CsvRowWriter<W: Write> {
    inner: csv::Writer<W>,
    width: usize,
}

impl<W: Write> CsvRowWriter<W> {
    pub fn new(out: W, headers: &[String], write_headers: bool) -> CliResult<Self> {
        let mut inner = csv::Writer::from_writer(out);
        if write_headers {
            inner.write_record(headers)?;
        }
        Ok(Self {
            inner,
            width: headers.len(),
        })
    }
}

impl<W: Write> RowWriter for CsvRowWriter<W> {
    fn write_row(&mut self, values: &[Value]) -> CliResult<()> {
        check_width(self.width, values)?;
        self.inner
            .write_record(values.iter().map(|v| v.to_string()))?;
        Ok(())
    }

    fn finish(&mut self) -> CliResult<()> {
        self.inner.flush()?;
        Ok(())
    }
}

pub struct JsonRowWriter<W: Write> {
    out: W,
    headers: Vec<String>,
}

impl<W: Write> JsonRowWriter<W> {
    pub fn new(out: W, headers: &[String]) -> Self {
        Self {
            out,
            headers: headers.to_vec(),
        }
    }
}

impl<W: Write> RowWriter for JsonRowWriter<W> {
    fn write_row(&mut self, values: &[Value]) -> CliResult<()> {
        check_width(self.headers.len(), values)?;
        let mut object = Map::with_capacity(values.len());
        for (header, value) in self.headers.iter().zip(values) {
            object.insert(header.clone(), serde_json::to_value(value)?);
        }
        serde_json::to_writer(&mut self.out, &JsonValue::Object(object))?;
        writeln!(self.out)?;
        Ok(())
    }

    fn finish(&mut self) -> CliResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Builds the writer for `format`. `write_headers` only affects CSV.
pub fn row_writer<'a, W: Write + 'a>(
    format: OutputFormat,
    out: W,
    headers: &[String],
    write_headers: bool,
) -> CliResult<Box<dyn RowWriter + 'a>> {
    Ok(match format {
        OutputFormat::Csv => Box::new(CsvRowWriter::new(out, headers, write_headers)?),
        OutputFormat::Json => Box::new(JsonRowWriter::new(out, headers)),
    })
}

/// Write a JSON document to `out` followed by a newline
pub fn write_json<W: Write>(mut out: W, document: &JsonValue) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut out, document)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliErrorCode;

    fn headers() -> Vec<String> {
        vec!["name".to_string(), "size".to_string()]
    }

    fn row(name: &str, size: i64) -> Vec<Value> {
        vec![Value::from(name), Value::Int(size)]
    }

    #[test]
    fn test_csv_with_headers() {
        let mut buf = Vec::new();
        {
            let mut w = CsvRowWriter::new(&mut buf, &headers(), true).unwrap();
            w.write_row(&row("a.txt", 1)).unwrap();
            w.write_row(&row("b, c.txt", 20)).unwrap();
            w.finish().unwrap();
        }
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "name,size\na.txt,1\n\"b, c.txt\",20\n"
        );
    }

    #[test]
    fn test_csv_without_headers() {
        let mut buf = Vec::new();
        {
            let mut w = CsvRowWriter::new(&mut buf, &headers(), false).unwrap();
            w.write_row(&[Value::Bool(true), Value::Float(1.5)]).unwrap();
            w.finish().unwrap();
        }
        assert_eq!(String::from_utf8(buf).unwrap(), "true,1.5\n");
    }

    #[test]
    fn test_json_lines() {
        let mut buf = Vec::new();
        {
            let mut w = JsonRowWriter::new(&mut buf, &headers());
            w.write_row(&row("a.txt", 1)).unwrap();
            w.write_row(&row("b", 2)).unwrap();
            w.finish().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<JsonValue> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["name"], "a.txt");
        assert_eq!(lines[1]["size"], 2);
    }

    #[test]
    fn test_width_mismatch() {
        let mut buf = Vec::new();
        let mut w = row_writer(OutputFormat::Csv, &mut buf, &headers(), true).unwrap();
        let err = w.write_row(&[Value::Int(1)]).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::WidthMismatch);

        let mut buf = Vec::new();
        let mut w = row_writer(OutputFormat::Json, &mut buf, &headers(), true).unwrap();
        assert!(w.write_row(&[Value::Int(1), Value::Int(2), Value::Int(3)]).is_err());
    }
}
