use std::fmt;

/// Absolute, `/`-separated path inside a share.
///
/// The root of a share is `/`. Joining never produces `.` or `..` segments,
/// so a path built from listed entry names cannot escape its share.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RemotePath(String);

/// A segment that cannot be part of a [`RemotePath`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid remote path segment '{segment}'")]
pub struct InvalidRemotePath {
    segment: String,
}

impl RemotePath {
    /// The share root, `/`.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_owned())
    }

    /// Parses a `/`-separated path, ignoring empty segments.
    pub fn parse(path: &str) -> Result<Self, InvalidRemotePath> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(Self::root(), |acc, segment| acc.join(segment))
    }

    /// Appends one entry name.
    pub fn join(&self, name: &str) -> Result<Self, InvalidRemotePath> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(InvalidRemotePath {
                segment: name.to_owned(),
            });
        }
        let mut joined = self.0.clone();
        if !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(name);
        Ok(Self(joined))
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the share root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Iterates the non-empty segments from the root down.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|segment| !segment.is_empty())
    }
}

impl Default for RemotePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_from_root_has_single_separator() {
        let path = RemotePath::root().join("Autorun").expect("join");
        assert_eq!(path.as_str(), "/Autorun");
        let nested = path.join("Light").expect("join");
        assert_eq!(nested.as_str(), "/Autorun/Light");
    }

    #[test]
    fn join_rejects_traversal_segments() {
        let root = RemotePath::root();
        assert!(root.join("..").is_err());
        assert!(root.join(".").is_err());
        assert!(root.join("a/b").is_err());
        assert!(root.join("").is_err());
    }

    #[test]
    fn parse_normalises_separators() {
        let path = RemotePath::parse("//Plan//M31/").expect("parse");
        assert_eq!(path.as_str(), "/Plan/M31");
        assert_eq!(path.segments().collect::<Vec<_>>(), vec!["Plan", "M31"]);
        assert!(RemotePath::parse("/").expect("root").is_root());
        assert!(RemotePath::parse("/a/../b").is_err());
    }
}
