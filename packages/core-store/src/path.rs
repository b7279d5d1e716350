//! Path type: an ordered sequence of segments naming a location in the tree.

use std::fmt;

/// Errors related to path parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A path segment is malformed.
    InvalidComponent {
        component: String,
        position: usize,
        message: String,
    },
    /// The path string is invalid.
    InvalidPath { message: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::InvalidComponent {
                component,
                position,
                message,
            } => {
                write!(
                    f,
                    "invalid path component '{}' at position {}: {}",
                    component, position, message
                )
            }
            PathError::InvalidPath { message } => {
                write!(f, "invalid path: {}", message)
            }
        }
    }
}

impl std::error::Error for PathError {}

/// A location in the document tree.
///
/// The root is the empty sequence. Segments are plain strings; a segment that
/// parses as an unsigned integer addresses an array element when the value
/// it is applied to is an array. Equality and the prefix relation are
/// structural, segment by segment.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path {
    pub components: Vec<String>,
}

impl Path {
    /// The root path (`/`).
    pub fn root() -> Self {
        Path::default()
    }

    /// Parse a slash-separated path.
    ///
    /// # Path Syntax
    ///
    /// - The path must start with `/`; `/` alone is the root
    /// - A single trailing slash is ignored
    /// - Empty interior segments (`/a//b`) are rejected
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fedstore_core::Path;
    ///
    /// let path = Path::parse("/users/123/name").unwrap();
    /// assert_eq!(path.len(), 3);
    ///
    /// assert_eq!(Path::parse("/foo/bar/").unwrap(), Path::parse("/foo/bar").unwrap());
    /// assert!(Path::parse("/").unwrap().is_empty());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let rest = s.strip_prefix('/').ok_or_else(|| PathError::InvalidPath {
            message: format!("'{}' does not start with '/'", s),
        })?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Ok(Path::root());
        }

        let mut components = Vec::new();
        for (position, component) in rest.split('/').enumerate() {
            if component.is_empty() {
                return Err(PathError::InvalidComponent {
                    component: component.to_string(),
                    position,
                    message: "empty component".to_string(),
                });
            }
            components.push(component.to_string());
        }

        Ok(Path { components })
    }

    /// Create a path from already-split segments.
    pub fn from_components<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Path {
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if this path is the root.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Get the number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Iterate over components.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.components.iter()
    }

    /// Join this path with another.
    #[must_use]
    pub fn join(&self, other: &Path) -> Path {
        let mut components = self.components.clone();
        components.extend(other.components.iter().cloned());
        Path { components }
    }

    /// Append a single segment.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Path {
        let mut components = self.components.clone();
        components.push(segment.into());
        Path { components }
    }

    /// Check if this path has the given prefix. Every path has the root as a
    /// prefix, and every path is a prefix of itself.
    pub fn has_prefix(&self, prefix: &Path) -> bool {
        prefix.components.len() <= self.components.len()
            && prefix.components == self.components[..prefix.components.len()]
    }

    /// True if `self` lies strictly beneath `ancestor`.
    pub fn is_strict_descendant_of(&self, ancestor: &Path) -> bool {
        self.len() > ancestor.len() && self.has_prefix(ancestor)
    }

    /// Strip a prefix from this path.
    ///
    /// Returns `None` if the prefix doesn't match.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Path) -> Option<Path> {
        if self.has_prefix(prefix) {
            Some(Path {
                components: self.components[prefix.components.len()..].to_vec(),
            })
        } else {
            None
        }
    }

    /// Get a slice of components as a new path.
    pub fn slice(&self, start: usize, end: usize) -> Path {
        Path {
            components: self.components[start..end].to_vec(),
        }
    }

    /// The path without its last segment, or `None` at the root.
    pub fn parent(&self) -> Option<Path> {
        if self.is_empty() {
            None
        } else {
            Some(self.slice(0, self.len() - 1))
        }
    }

    /// The last segment, or `None` at the root.
    pub fn last(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

/// Macro for creating paths from literals.
///
/// Panics on a malformed literal.
///
/// # Example
///
/// ```rust
/// use fedstore_core::path;
///
/// let p = path!("/users/123/name");
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::Path::parse($s).expect("invalid path literal")
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_paths() {
        assert_eq!(Path::parse("/").unwrap().len(), 0);
        assert_eq!(Path::parse("/foo").unwrap().len(), 1);
        assert_eq!(Path::parse("/foo/bar").unwrap().len(), 2);
        assert_eq!(Path::parse("/foo/bar/baz").unwrap().len(), 3);
    }

    #[test]
    fn trailing_slash_normalized() {
        assert_eq!(
            Path::parse("/foo/bar/").unwrap(),
            Path::parse("/foo/bar").unwrap()
        );
    }

    #[test]
    fn leading_slash_required() {
        let err = Path::parse("foo/bar").unwrap_err();
        assert!(matches!(err, PathError::InvalidPath { .. }));
        assert!(Path::parse("").is_err());
    }

    #[test]
    fn empty_interior_component_rejected() {
        let err = Path::parse("/foo//bar").unwrap_err();
        assert!(err.to_string().contains("empty component"));
    }

    #[test]
    fn any_segment_text_allowed() {
        let p = Path::parse("/a/-/with space/0").unwrap();
        assert_eq!(p.len(), 4);
        assert_eq!(p.components[1], "-");
        assert_eq!(p.last(), Some("0"));
    }

    #[test]
    fn has_prefix_works() {
        let p = path!("/foo/bar/baz");
        assert!(p.has_prefix(&path!("/")));
        assert!(p.has_prefix(&path!("/foo")));
        assert!(p.has_prefix(&path!("/foo/bar/baz")));
        assert!(!p.has_prefix(&path!("/bar")));
        assert!(!p.has_prefix(&path!("/foo/bar/baz/qux")));
    }

    #[test]
    fn strict_descendant() {
        let p = path!("/foo/bar");
        assert!(p.is_strict_descendant_of(&path!("/foo")));
        assert!(p.is_strict_descendant_of(&Path::root()));
        assert!(!p.is_strict_descendant_of(&path!("/foo/bar")));
        assert!(!p.is_strict_descendant_of(&path!("/foo/ba")));
    }

    #[test]
    fn strip_prefix_works() {
        let p = path!("/foo/bar/baz");
        assert_eq!(p.strip_prefix(&path!("/foo")), Some(path!("/bar/baz")));
        assert_eq!(p.strip_prefix(&p), Some(Path::root()));
        assert_eq!(p.strip_prefix(&path!("/other")), None);
    }

    #[test]
    fn parent_and_last() {
        let p = path!("/a/b");
        assert_eq!(p.parent(), Some(path!("/a")));
        assert_eq!(p.last(), Some("b"));
        assert_eq!(Path::root().parent(), None);
        assert_eq!(Path::root().last(), None);
    }

    #[test]
    fn display_impl() {
        assert_eq!(path!("/foo/bar/baz").to_string(), "/foo/bar/baz");
        assert_eq!(Path::root().to_string(), "/");
    }

    #[test]
    fn join_with_root() {
        let p = path!("/foo");
        assert_eq!(p.join(&Path::root()), p);
        assert_eq!(Path::root().join(&p), p);
        assert_eq!(p.child("bar"), path!("/foo/bar"));
    }

    #[test]
    fn path_ord() {
        assert!(path!("/a/b") < path!("/a/c"));
        assert!(path!("/a/c") < path!("/b/a"));
    }
}
