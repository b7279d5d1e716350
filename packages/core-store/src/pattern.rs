//! Patterns: paths in which some segments are free variables.

use std::fmt;

use crate::path::{Path, PathError};

/// One segment of a [`Pattern`].
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Term {
    /// Matches exactly this segment.
    Literal(String),
    /// Matches any key of a map or index of an array, binding it to the name.
    Var(String),
}

impl Term {
    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }
}

/// A path with zero or more free-variable segments.
///
/// The longest leading run of literal segments is the constant prefix: it
/// names the only region of the tree whose contents can affect a match.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pattern {
    terms: Vec<Term>,
}

impl Pattern {
    /// Parse a pattern such as `/a/{i}/name`.
    ///
    /// Segments wrapped in braces are variables; everything else follows
    /// [`Path::parse`].
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let path = Path::parse(s)?;
        let mut terms = Vec::with_capacity(path.len());
        for (position, component) in path.components.into_iter().enumerate() {
            let var = component
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
                .map(str::to_string);
            let term = match var {
                Some(name) if name.is_empty() => {
                    return Err(PathError::InvalidComponent {
                        component,
                        position,
                        message: "empty variable name".to_string(),
                    })
                }
                Some(name) => Term::Var(name),
                None => Term::Literal(component),
            };
            terms.push(term);
        }
        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// The literal segments before the first variable.
    pub fn constant_prefix(&self) -> Path {
        Path::from_components(self.terms.iter().map_while(|term| match term {
            Term::Literal(s) => Some(s.clone()),
            Term::Var(_) => None,
        }))
    }

    /// The terms after the constant prefix.
    pub fn tail(&self) -> &[Term] {
        let split = self
            .terms
            .iter()
            .position(Term::is_var)
            .unwrap_or(self.terms.len());
        &self.terms[split..]
    }

    pub fn has_vars(&self) -> bool {
        self.terms.iter().any(Term::is_var)
    }
}

impl From<Path> for Pattern {
    fn from(path: Path) -> Self {
        Self {
            terms: path.components.into_iter().map(Term::Literal).collect(),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "/");
        }
        for term in &self.terms {
            match term {
                Term::Literal(s) => write!(f, "/{}", s)?,
                Term::Var(name) => write!(f, "/{{{}}}", name)?,
            }
        }
        Ok(())
    }
}

/// Macro for creating patterns from literals. Panics on a malformed literal.
#[macro_export]
macro_rules! pattern {
    ($s:expr) => {
        $crate::Pattern::parse($s).expect("invalid pattern literal")
    };
}
