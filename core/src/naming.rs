//! Column name case conversion.
//!
//! Row columns arrive in whatever case the database uses; model fields are
//! always looked up by their camelCase name. [`to_camel`] normalizes a column
//! name, [`from_camel`] goes the other way when a column list has to be
//! derived from a model.
//!
//! # Example
//!
//! ```
//! use rowbind_core::{CaseStyle, to_camel};
//!
//! assert_eq!(to_camel(CaseStyle::SnakeCase, "address_line1"), "addressLine1");
//! assert_eq!(to_camel(CaseStyle::KebabCase, "user-profile"), "userProfile");
//! assert_eq!(to_camel(CaseStyle::CamelCase, "as_is"), "as_is");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MappingError;

/// The case convention used by table column names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStyle {
    /// `addressLine1`
    CamelCase,
    /// `address_line1`
    #[default]
    SnakeCase,
    /// `ADDRESS_LINE1`
    ScreamingSnakeCase,
    /// `address-line1`
    KebabCase,
}

impl CaseStyle {
    fn separator(self) -> Option<char> {
        match self {
            CaseStyle::CamelCase => None,
            CaseStyle::SnakeCase | CaseStyle::ScreamingSnakeCase => Some('_'),
            CaseStyle::KebabCase => Some('-'),
        }
    }
}

impl fmt::Display for CaseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaseStyle::CamelCase => "CAMEL_CASE",
            CaseStyle::SnakeCase => "SNAKE_CASE",
            CaseStyle::ScreamingSnakeCase => "SCREAMING_SNAKE_CASE",
            CaseStyle::KebabCase => "KEBAB_CASE",
        };
        f.write_str(name)
    }
}

impl FromStr for CaseStyle {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "CAMEL_CASE" | "CAMEL" => Ok(CaseStyle::CamelCase),
            "SNAKE_CASE" | "SNAKE" => Ok(CaseStyle::SnakeCase),
            "SCREAMING_SNAKE_CASE" | "SCREAMING_SNAKE" => Ok(CaseStyle::ScreamingSnakeCase),
            "KEBAB_CASE" | "KEBAB" => Ok(CaseStyle::KebabCase),
            _ => Err(MappingError::InvalidModel(format!("unknown case style '{s}'"))),
        }
    }
}

/// Converts a column name in `style` to its camelCase field name.
///
/// The first segment is lower-cased entirely; every later non-empty segment
/// keeps an upper-cased first character and a lower-cased remainder. Empty
/// segments (doubled or trailing separators) are dropped.
pub fn to_camel(style: CaseStyle, name: &str) -> String {
    let Some(separator) = style.separator() else {
        return name.to_string();
    };
    if name.is_empty() {
        return String::new();
    }

    let mut parts = name.split(separator);
    let mut out = String::with_capacity(name.len());
    if let Some(first) = parts.next() {
        out.push_str(&first.to_lowercase());
    }
    for part in parts.filter(|p| !p.is_empty()) {
        push_capitalized(&mut out, part);
    }
    out
}

/// Converts a camelCase field name into a column name in `style`.
///
/// Words are found with [`split_camel_words`], so `addressLine1` becomes
/// `address_line_1` in snake case.
pub fn from_camel(style: CaseStyle, name: &str) -> String {
    let Some(separator) = style.separator() else {
        return name.to_string();
    };
    let words = split_camel_words(name);
    let mut out = String::with_capacity(name.len() + words.len());
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        if style == CaseStyle::ScreamingSnakeCase {
            out.push_str(&word.to_uppercase());
        } else {
            out.push_str(&word.to_lowercase());
        }
    }
    out
}

fn push_capitalized(out: &mut String, part: &str) {
    let mut chars = part.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(&chars.as_str().to_lowercase());
    }
}

/// Upper-cases the first character of `s`, leaving the rest alone.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turns a Rust field identifier into the camelCase name the field is
/// looked up by. Unlike [`to_camel`], existing capitals are kept, so an
/// identifier that is already camelCase passes through unchanged.
pub(crate) fn field_name(ident: &str) -> String {
    let mut parts = ident.split('_').filter(|p| !p.is_empty());
    let mut out = String::with_capacity(ident.len());
    if let Some(first) = parts.next() {
        out.push_str(first);
    }
    for part in parts {
        out.push_str(&capitalize(part));
    }
    out
}

/// Lower-cases the first character of `s`, leaving the rest alone.
pub(crate) fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Upper,
    Lower,
    Digit,
    Other,
}

fn classify(c: char) -> CharClass {
    if c.is_uppercase() {
        CharClass::Upper
    } else if c.is_lowercase() {
        CharClass::Lower
    } else if c.is_numeric() {
        CharClass::Digit
    } else {
        CharClass::Other
    }
}

/// Byte offsets where a new camelCase word starts, excluding offset 0.
///
/// A boundary sits at every change of character class, except that an
/// upper-case run followed by a lower-case letter gives its last upper-case
/// letter to the following word (`HTTPServer` splits as `HTTP`, `Server`).
pub(crate) fn word_boundaries(name: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut token_start = 0;
    let mut prev: Option<(usize, CharClass)> = None;

    for (pos, c) in name.char_indices() {
        let class = classify(c);
        match prev {
            Some((prev_pos, CharClass::Upper)) if class == CharClass::Lower => {
                if prev_pos > token_start {
                    boundaries.push(prev_pos);
                    token_start = prev_pos;
                }
            }
            Some((_, prev_class)) if prev_class != class => {
                boundaries.push(pos);
                token_start = pos;
            }
            _ => {}
        }
        prev = Some((pos, class));
    }
    boundaries
}

/// Splits a camelCase identifier into its words.
///
/// # Examples
///
/// ```
/// use rowbind_core::split_camel_words;
///
/// assert_eq!(split_camel_words("addressUserProfile"), vec!["address", "User", "Profile"]);
/// assert_eq!(split_camel_words("line1"), vec!["line", "1"]);
/// assert_eq!(split_camel_words("HTTPServer"), vec!["HTTP", "Server"]);
/// ```
pub fn split_camel_words(name: &str) -> Vec<&str> {
    if name.is_empty() {
        return Vec::new();
    }
    let mut words = Vec::new();
    let mut start = 0;
    for end in word_boundaries(name) {
        words.push(&name[start..end]);
        start = end;
    }
    words.push(&name[start..]);
    words
}
