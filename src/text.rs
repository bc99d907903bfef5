//! Parenthesised float-list text format shared by patterns and signatures.

use crate::error::{Result, SimilarityError};
use std::fmt;

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | ',')
}

/// Reads floats one at a time, treating spaces, parentheses and commas as separators.
pub(crate) struct FloatReader<'a> {
    type_name: &'static str,
    source: &'a str,
    rest: &'a str,
}

impl<'a> FloatReader<'a> {
    pub(crate) fn new(type_name: &'static str, source: &'a str) -> Self {
        Self {
            type_name,
            source,
            rest: source,
        }
    }

    fn syntax_error(&self) -> SimilarityError {
        SimilarityError::InvalidSyntax {
            type_name: self.type_name,
            input: self.source.to_string(),
        }
    }

    pub(crate) fn next_float(&mut self) -> Result<f32> {
        self.rest = self.rest.trim_start_matches(is_separator);
        if self.rest.is_empty() {
            return Err(self.syntax_error());
        }

        let end = self.rest.find(is_separator).unwrap_or(self.rest.len());
        let (token, rest) = self.rest.split_at(end);
        let value = token.parse::<f32>().map_err(|_| self.syntax_error())?;
        self.rest = rest;
        Ok(value)
    }

    /// Fails if anything but separators follows the last value read.
    pub(crate) fn finish(self) -> Result<()> {
        if self.rest.trim_start_matches(is_separator).is_empty() {
            Ok(())
        } else {
            Err(self.syntax_error())
        }
    }
}

/// Writes `(v0, v1, ...)` with six fractional digits per value.
pub(crate) fn write_float_list(f: &mut fmt::Formatter<'_>, values: &[f32]) -> fmt::Result {
    f.write_str("(")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{:.6}", value)?;
    }
    f.write_str(")")
}
