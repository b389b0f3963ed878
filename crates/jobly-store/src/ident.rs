//! SQL identifier validation and quoting.
//!
//! Identifiers cannot be bound as parameters, so every column name that ends up
//! in generated SQL goes through [`Ident`]:
//!
//! - Unquoted parts must match `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow anything except NUL; `"` is escaped as `""`
//!
//! ```ignore
//! use jobly_store::Ident;
//!
//! assert_eq!(Ident::parse("jobs.title")?.to_sql(), "jobs.title");
//! assert_eq!(Ident::quoted("company_handle")?.to_sql(), r#""company_handle""#);
//! # Ok::<(), jobly_store::StoreError>(())
//! ```

use crate::error::{StoreError, StoreResult};
use std::iter::Peekable;
use std::str::Chars;

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    Unquoted(String),
    Quoted(String),
}

/// A validated SQL identifier, possibly dotted (`table.column`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Wrap `name` as a single quoted identifier.
    ///
    /// Quoting keeps reserved words and mixed-case names safe in SET lists.
    pub fn quoted(name: &str) -> StoreResult<Self> {
        if name.is_empty() {
            return Err(StoreError::validation("empty column name"));
        }
        if name.contains('\0') {
            return Err(StoreError::validation(
                "column name cannot contain NUL character",
            ));
        }
        Ok(Self {
            parts: vec![IdentPart::Quoted(name.to_string())],
        })
    }

    /// Parse `table.column`, `"Quoted"."Name"` or a mix of both.
    pub fn parse(s: &str) -> StoreResult<Self> {
        if s.is_empty() {
            return Err(StoreError::validation("identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(StoreError::validation(
                "identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();
        loop {
            parts.push(parse_part(&mut chars)?);
            match chars.next() {
                None => break,
                Some('.') if chars.peek().is_some() => {}
                Some('.') => return Err(StoreError::validation("trailing '.' in identifier")),
                Some(c) => {
                    return Err(StoreError::validation(format!(
                        "invalid character in identifier: '{c}'"
                    )));
                }
            }
        }
        Ok(Self { parts })
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    out.push_str(&s.replace('"', "\"\""));
                    out.push('"');
                }
            }
        }
    }
}

fn parse_part(chars: &mut Peekable<Chars<'_>>) -> StoreResult<IdentPart> {
    if chars.peek() == Some(&'"') {
        chars.next();
        let mut name = String::new();
        loop {
            match chars.next() {
                Some('"') if chars.peek() == Some(&'"') => {
                    chars.next();
                    name.push('"');
                }
                Some('"') => break,
                Some(c) => name.push(c),
                None => return Err(StoreError::validation("unclosed quoted identifier")),
            }
        }
        if name.is_empty() {
            return Err(StoreError::validation("empty quoted identifier"));
        }
        return Ok(IdentPart::Quoted(name));
    }

    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        let ok = if name.is_empty() {
            c == '_' || c.is_ascii_alphabetic()
        } else {
            c == '_' || c == '$' || c.is_ascii_alphanumeric()
        };
        if !ok {
            break;
        }
        name.push(c);
        chars.next();
    }
    if name.is_empty() {
        return Err(match chars.peek() {
            Some(c) => StoreError::validation(format!("invalid identifier start character: '{c}'")),
            None => StoreError::validation("empty identifier segment"),
        });
    }
    Ok(IdentPart::Unquoted(name))
}
