//! String matching strategies for conditional predicates
//!
//! A [`Comparator`] decides whether an actual value (a branch name, a tag,
//! an environment variable) matches a pattern written by the pipeline author.
//! Three strategies exist: Ant style `glob`, full-match `regexp` and plain
//! `equals`.

use crate::errors::PatternError;
use glob::{MatchOptions, Pattern};
use regex::RegexBuilder;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A named string matching strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    /// Ant style path glob (`*`, `?` within a segment, `**` across segments)
    Glob,
    /// Regular expression, matched against the whole value
    Regexp,
    /// Literal string equality
    Equals,
}

impl Comparator {
    /// Every built-in strategy, in declaration order
    pub const ALL: [Comparator; 3] = [Self::Glob, Self::Regexp, Self::Equals];

    /// Every built-in strategy
    #[must_use]
    pub fn all() -> &'static [Comparator] {
        &Self::ALL
    }

    /// Canonical name of the strategy
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Glob => "glob",
            Self::Regexp => "regexp",
            Self::Equals => "equals",
        }
    }

    /// Human readable label used in listings
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Glob => "Glob pattern (Ant style)",
            Self::Regexp => "Regular expression",
            Self::Equals => "Equals",
        }
    }

    /// Case sensitivity applied by [`compare`](Self::compare)
    #[must_use]
    pub fn default_case_sensitive(&self) -> bool {
        !matches!(self, Self::Glob)
    }

    /// Resolves a strategy by name.
    ///
    /// An absent or empty `name` yields `fallback`. A name that matches no
    /// strategy (compared case-insensitively) yields `None`, which callers
    /// treat as "cannot be evaluated".
    #[must_use]
    pub fn get(name: Option<&str>, fallback: Option<Comparator>) -> Option<Comparator> {
        match name {
            None => fallback,
            Some(n) if n.is_empty() => fallback,
            Some(n) => Self::ALL
                .into_iter()
                .find(|c| c.name().eq_ignore_ascii_case(n)),
        }
    }

    /// Compares using the strategy's default case sensitivity.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if a `regexp` pattern does not compile.
    pub fn compare(&self, pattern: &str, actual: Option<&str>) -> Result<bool, PatternError> {
        self.compare_with_case(pattern, actual, self.default_case_sensitive())
    }

    /// Compares with an explicit case sensitivity.
    ///
    /// An absent or empty `actual` never matches.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if a `regexp` pattern does not compile.
    pub fn compare_with_case(
        &self,
        pattern: &str,
        actual: Option<&str>,
        case_sensitive: bool,
    ) -> Result<bool, PatternError> {
        let Some(actual) = actual.filter(|a| !a.is_empty()) else {
            return Ok(false);
        };

        match self {
            Self::Glob => Ok(glob_matches(pattern, actual, case_sensitive)),
            Self::Regexp => regexp_matches(pattern, actual, case_sensitive),
            Self::Equals => {
                if case_sensitive {
                    Ok(actual == pattern)
                } else {
                    Ok(actual.to_lowercase() == pattern.to_lowercase())
                }
            }
        }
    }
}

fn glob_matches(pattern: &str, actual: &str, case_sensitive: bool) -> bool {
    let options = MatchOptions {
        case_sensitive,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    match Pattern::new(&ant_to_glob(pattern)) {
        Ok(p) => p.matches_with(actual, options),
        Err(_) => {
            if case_sensitive {
                pattern == actual
            } else {
                pattern.to_lowercase() == actual.to_lowercase()
            }
        }
    }
}

/// Rewrites an Ant path pattern in `glob` syntax.
///
/// Ant has no character classes, so brackets are escaped. A `**` that shares
/// its segment with other characters behaves like `*`.
fn ant_to_glob(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| {
            if segment == "**" {
                return segment.to_string();
            }
            let mut out = String::with_capacity(segment.len());
            let mut after_star = false;
            for c in segment.chars() {
                match c {
                    '*' if after_star => continue,
                    '[' | ']' => out.push_str(&Pattern::escape(&c.to_string())),
                    _ => out.push(c),
                }
                after_star = c == '*';
            }
            out
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn regexp_matches(pattern: &str, actual: &str, case_sensitive: bool) -> Result<bool, PatternError> {
    let anchored = format!("^(?:{pattern})$");
    let re = RegexBuilder::new(&anchored)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| PatternError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
    Ok(re.is_match(actual))
}

/// Checks that `pattern` is usable with `comparator` before any value is seen.
///
/// # Errors
///
/// Returns [`PatternError`] when a `regexp` pattern does not compile.
pub fn check_pattern(comparator: Comparator, pattern: &str) -> Result<(), PatternError> {
    if comparator == Comparator::Regexp {
        regexp_matches(pattern, "", true)?;
    }
    Ok(())
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::get(Some(s), None).ok_or_else(|| {
            format!(
                "Unknown comparator '{s}'. Valid comparators are: [{}]",
                Self::ALL.map(|c| c.name()).join(", ")
            )
        })
    }
}
