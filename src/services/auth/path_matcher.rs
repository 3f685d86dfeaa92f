//! Public path matching (which routes skip authentication).
//!
//! Patterns are Ant-style globs compiled once at startup:
//! - `*` matches any run of characters inside a single segment
//! - `?` matches exactly one character inside a single segment
//! - `**` matches zero or more whole segments; a trailing `/**` needs at least one
//!
//! Matching is anchored to the whole path and compares whole segments, so
//! `/auth/**` matches `/auth/login` but neither `/auth` nor `/authorization`.

use std::fmt;

use crate::services::wildcard;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("path pattern must start with '/': {0:?}")]
    NotAbsolute(String),
    #[error("'**' must be a whole segment: {0:?}")]
    EmbeddedDoubleStar(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Glob(String),
    AnySegments,
}

/// A single compiled public path pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.raw).finish()
    }
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let raw = raw.trim();
        if !raw.starts_with('/') {
            return Err(PatternError::NotAbsolute(raw.to_string()));
        }

        let mut segments = Vec::new();
        for part in raw.split('/').filter(|s| !s.is_empty()) {
            let segment = if part == "**" {
                Segment::AnySegments
            } else if part.contains("**") {
                return Err(PatternError::EmbeddedDoubleStar(raw.to_string()));
            } else if part.contains(['*', '?']) {
                Segment::Glob(part.to_string())
            } else {
                Segment::Literal(part.to_string())
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

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        // Trailing `**`: something must follow the prefix.
        Some((Segment::AnySegments, [])) => !path.is_empty(),
        Some((Segment::AnySegments, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((head, rest)) => match path.split_first() {
            Some((part, tail)) => segment_matches(head, part) && match_segments(rest, tail),
            None => false,
        },
    }
}

fn segment_matches(segment: &Segment, part: &str) -> bool {
    match segment {
        Segment::Literal(lit) => lit == part,
        Segment::Glob(glob) => wildcard::matches(glob, part),
        Segment::AnySegments => true,
    }
}

fn is_dot_segment(part: &str) -> bool {
    let decoded = part.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// The process-wide set of paths exempt from authentication.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct PublicPaths {
    patterns: Vec<PathPattern>,
}

impl PublicPaths {
    pub fn new(patterns: Vec<PathPattern>) -> Self {
        Self { patterns }
    }

    pub fn parse<I, S>(raw: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = raw
            .into_iter()
            .map(|p| PathPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(patterns))
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }

    pub fn is_public(&self, path: &str) -> bool {
        is_public(path, self)
    }
}

/// `true` when any rule matches `path`. An empty rule set makes nothing public.
pub fn is_public(path: &str, rules: &PublicPaths) -> bool {
    // Never exempt a path that could be normalised into a private route downstream.
    if path.split('/').any(is_dot_segment) {
        return false;
    }
    rules.patterns.iter().any(|p| p.matches(path))
}
