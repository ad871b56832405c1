//! Oracle identifier validation.
//!
//! Identifiers cannot be bound as parameters, so every column, function and
//! routine name that ends up in generated SQL passes through this module.
//!
//! - Unquoted parts must match `[A-Za-z][A-Za-z0-9_$#]*` (at most 128 bytes)
//! - Quoted parts allow any characters except NUL and `"`
//!
//! # Example
//! ```
//! use oraquery::Ident;
//!
//! let proc_name = Ident::parse("hr.pkg_payroll.close_month")?;
//! assert_eq!(proc_name.to_sql(), "hr.pkg_payroll.close_month");
//! # Ok::<(), oraquery::OrmError>(())
//! ```

use crate::error::{OrmError, OrmResult};

/// Maximum identifier length accepted by Oracle 12.2+.
pub const MAX_IDENT_BYTES: usize = 128;

/// A part of a dotted identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Unquoted identifier: must match `[A-Za-z][A-Za-z0-9_$#]*`.
    Unquoted(String),
    /// Quoted identifier: any characters except NUL and `"`.
    Quoted(String),
}

/// A possibly dotted identifier (`schema.package.routine`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

fn is_start_char(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_body_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '#'
}

/// Check that `name` is a single, valid unquoted identifier.
///
/// Used for filter columns, bind names and SQL function names.
pub fn validate_unquoted(name: &str) -> OrmResult<()> {
    if name.is_empty() {
        return Err(OrmError::validation("Identifier cannot be empty"));
    }
    if name.len() > MAX_IDENT_BYTES {
        return Err(OrmError::validation(format!(
            "Identifier '{name}' exceeds {MAX_IDENT_BYTES} bytes"
        )));
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_start_char(c) => {}
        Some(c) => {
            return Err(OrmError::validation(format!(
                "Invalid identifier start character '{c}' in '{name}'"
            )));
        }
        None => return Err(OrmError::validation("Identifier cannot be empty")),
    }
    if let Some(c) = chars.find(|c| !is_body_char(*c)) {
        return Err(OrmError::validation(format!(
            "Invalid character '{c}' in identifier '{name}'"
        )));
    }
    Ok(())
}

impl Ident {
    /// Parse an identifier string, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.package.routine`
    /// - Quoted: `"MixedCase"."Routine"`
    /// - Mixed: `hr."Pkg".run`
    pub fn parse(s: &str) -> OrmResult<Self> {
        if s.is_empty() {
            return Err(OrmError::validation("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(OrmError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(OrmError::validation("Trailing '.' in identifier"));
                        }
                    }
                    Some(c) => {
                        return Err(OrmError::validation(format!(
                            "Expected '.' between identifier parts, got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        // Oracle has no escape for '"' inside quoted names.
                        Some('"') => break,
                        Some(c) => name.push(c),
                        None => return Err(OrmError::validation("Unclosed quoted identifier")),
                    }
                }
                if name.is_empty() {
                    return Err(OrmError::validation("Empty quoted identifier"));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(OrmError::validation("Empty identifier segment"));
            }
            validate_unquoted(&name)?;
            parts.push(IdentPart::Unquoted(name));
        }

        if parts.is_empty() {
            return Err(OrmError::validation("Empty identifier"));
        }

        Ok(Self { parts })
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    out.push_str(s);
                    out.push('"');
                }
            }
        }
        out
    }
}
