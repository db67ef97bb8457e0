//! URI template matching.
//!
//! # Responsibilities
//! - Parse templates such as `/widgets/{id}` or `/files/{*path}`
//! - Match request paths segment by segment
//! - Extract variable values
//!
//! # Design Decisions
//! - Literal segments compare ASCII case-insensitively
//! - A trailing '/' on the request path is ignored
//! - The host supplies decoded paths; captured values are taken verbatim

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::handlers::descriptor::Variables;

/// Errors raised while parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template must start with '/'")]
    NotAbsolute,

    #[error("malformed variable segment '{0}'")]
    MalformedVariable(String),

    #[error("catch-all variable '{0}' must be the last segment")]
    CatchAllNotLast(String),

    #[error("variable '{0}' appears more than once")]
    DuplicateVariable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
    CatchAll(String),
}

/// A parsed URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    segments: Vec<Segment>,
}

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl UriTemplate {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        if !raw.starts_with('/') {
            return Err(TemplateError::NotAbsolute);
        }

        let mut segments = Vec::new();
        let mut names: Vec<String> = Vec::new();
        for part in path_segments(raw) {
            if let Some(Segment::CatchAll(name)) = segments.last() {
                return Err(TemplateError::CatchAllNotLast(name.clone()));
            }

            let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(inner) => {
                    let (name, catch_all) = match inner.strip_prefix('*') {
                        Some(name) => (name, true),
                        None => (inner, false),
                    };
                    if name.is_empty() || name.contains(['{', '}', '*']) {
                        return Err(TemplateError::MalformedVariable(part.to_string()));
                    }
                    if names.iter().any(|n| n == name) {
                        return Err(TemplateError::DuplicateVariable(name.to_string()));
                    }
                    names.push(name.to_string());
                    if catch_all {
                        Segment::CatchAll(name.to_string())
                    } else {
                        Segment::Variable(name.to_string())
                    }
                }
                None if part.contains(['{', '}']) => {
                    return Err(TemplateError::MalformedVariable(part.to_string()));
                }
                None => Segment::Literal(part.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of literal segments, used to rank overlapping templates.
    pub fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Match an absolute path, returning the captured variables.
    pub fn match_path(&self, path: &str) -> Option<Variables> {
        if !path.starts_with('/') {
            return None;
        }

        let parts: Vec<&str> = path_segments(path).collect();
        let mut variables = Variables::new();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::CatchAll(name) => {
                    variables.append(name.as_str(), parts.get(index..).unwrap_or_default().join("/"));
                    return Some(variables);
                }
                Segment::Literal(literal) => {
                    if !parts.get(index)?.eq_ignore_ascii_case(literal) {
                        return None;
                    }
                }
                Segment::Variable(name) => {
                    variables.append(name.as_str(), *parts.get(index)?);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(variables)
    }
}

impl FromStr for UriTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
