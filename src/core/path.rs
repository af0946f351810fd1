//! Hierarchical scene paths.
//!
//! A [`Path`] addresses a prim (`/world/chair`) or one of its properties
//! (`/world/chair.size`). Paths are immutable values; their string form is
//! canonical, so `Path::parse(&p.to_string()) == Ok(p)` always holds.

use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::util::{is_valid_identifier, is_valid_namespaced_identifier, Error, Result};

/// Separator between prim segments.
pub const PATH_SEPARATOR: char = '/';
/// Separator between the prim part and the property part.
pub const PROPERTY_DELIMITER: char = '.';

/// A path value used to locate prims and properties on a stage.
///
/// Ordering is structural: absolute paths compare segment by segment, a
/// parent sorts before all of its descendants, and a prim path sorts before
/// its property paths. Sorting a set of paths therefore yields a depth-first,
/// parent-before-children order.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    absolute: bool,
    segments: SmallVec<[String; 4]>,
    property: Option<String>,
}

impl Path {
    /// The absolute path representing the top of the namespace hierarchy.
    pub fn absolute_root() -> Self {
        Self {
            absolute: true,
            segments: SmallVec::new(),
            property: None,
        }
    }

    /// Parse a path string.
    ///
    /// Accepts absolute (`/a/b`) and relative (`a/b`) prim paths, optionally
    /// followed by a property part (`/a/b.attr`, `/a.xformOp:translate`).
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::path_syntax(s, "empty path"));
        }

        let absolute = s.starts_with(PATH_SEPARATOR);
        let body = if absolute { &s[1..] } else { s };

        if body.is_empty() {
            // Only "/" reaches here.
            return Ok(Self::absolute_root());
        }

        let (prim_part, property) = match body.split_once(PROPERTY_DELIMITER) {
            Some((prim_part, prop)) => {
                if !is_valid_namespaced_identifier(prop) {
                    return Err(Error::path_syntax(
                        s,
                        format!("invalid property name '{}'", prop),
                    ));
                }
                (prim_part, Some(prop.to_string()))
            }
            None => (body, None),
        };

        if prim_part.is_empty() {
            return Err(Error::path_syntax(s, "property path without an owning prim"));
        }

        let mut segments = SmallVec::new();
        for segment in prim_part.split(PATH_SEPARATOR) {
            if segment.is_empty() {
                return Err(Error::path_syntax(s, "empty path segment"));
            }
            if !is_valid_identifier(segment) {
                return Err(Error::path_syntax(
                    s,
                    format!("invalid segment '{}'", segment),
                ));
            }
            segments.push(segment.to_string());
        }

        Ok(Self {
            absolute,
            segments,
            property,
        })
    }
}

/// Querying paths.
impl Path {
    /// Returns true if this is the absolute root path `/`.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.absolute && self.segments.is_empty() && self.property.is_none()
    }

    /// Returns true if the path starts at the root.
    #[inline]
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Returns true if the path identifies a prim (including the root).
    #[inline]
    pub fn is_prim_path(&self) -> bool {
        self.property.is_none()
    }

    /// Returns true if the path identifies a property.
    #[inline]
    pub fn is_property_path(&self) -> bool {
        self.property.is_some()
    }

    /// Number of prim segments (0 for the root).
    #[inline]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Iterate the prim segments from the top down.
    pub fn segments(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().map(String::as_str)
    }

    /// The property name, if this is a property path.
    pub fn property_name(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// Name of the element identified by the path: the property name for a
    /// property path, the last segment for a prim path, and "" for the root.
    pub fn name(&self) -> &str {
        if let Some(prop) = &self.property {
            return prop;
        }
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Return the path that identifies this path's namespace parent.
    ///
    /// A property path's parent is its owning prim path. The root and
    /// single-segment relative paths have no parent.
    pub fn parent(&self) -> Option<Path> {
        if self.property.is_some() {
            return Some(self.prim_path());
        }
        if self.segments.is_empty() {
            return None;
        }
        if !self.absolute && self.segments.len() == 1 {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self {
            absolute: self.absolute,
            segments,
            property: None,
        })
    }

    /// Strip the property part, if any.
    pub fn prim_path(&self) -> Path {
        Self {
            absolute: self.absolute,
            segments: self.segments.clone(),
            property: None,
        }
    }

    /// Returns true if `prefix` is this path or one of its ancestors.
    pub fn has_prefix(&self, prefix: &Path) -> bool {
        if self.absolute != prefix.absolute || prefix.segments.len() > self.segments.len() {
            return false;
        }
        if !self.segments.starts_with(&prefix.segments) {
            return false;
        }
        match &prefix.property {
            None => true,
            Some(prop) => {
                self.segments.len() == prefix.segments.len()
                    && self.property.as_ref() == Some(prop)
            }
        }
    }

    /// All prim prefixes from the shortest to this prim path itself,
    /// excluding the root: `/a/b/c` yields `/a`, `/a/b`, `/a/b/c`.
    pub fn prefixes(&self) -> Vec<Path> {
        (1..=self.segments.len())
            .map(|n| Self {
                absolute: self.absolute,
                segments: self.segments[..n].iter().cloned().collect(),
                property: None,
            })
            .collect()
    }
}

/// Creating new paths from existing ones.
impl Path {
    /// Append one prim segment (the "join" of a parent path and a child name).
    pub fn append_child(&self, name: &str) -> Result<Path> {
        if !is_valid_identifier(name) {
            return Err(Error::InvalidSegment(name.to_string()));
        }
        if self.property.is_some() {
            return Err(Error::path_syntax(
                self.to_string(),
                "cannot append a prim segment to a property path",
            ));
        }
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self {
            absolute: self.absolute,
            segments,
            property: None,
        })
    }

    /// Append a property name to a prim path.
    pub fn append_property(&self, name: &str) -> Result<Path> {
        if !is_valid_namespaced_identifier(name) {
            return Err(Error::InvalidSegment(name.to_string()));
        }
        if self.property.is_some() || self.is_root() {
            return Err(Error::path_syntax(
                self.to_string(),
                "properties can only be appended to non-root prim paths",
            ));
        }
        Ok(Self {
            absolute: self.absolute,
            segments: self.segments.clone(),
            property: Some(name.to_string()),
        })
    }

    /// Resolve a relative path against an absolute prim path.
    pub fn make_absolute(&self, anchor: &Path) -> Result<Path> {
        if self.absolute {
            return Ok(self.clone());
        }
        if !anchor.absolute || anchor.property.is_some() {
            return Err(Error::path_syntax(
                anchor.to_string(),
                "anchor must be an absolute prim path",
            ));
        }
        let mut segments = anchor.segments.clone();
        segments.extend(self.segments.iter().cloned());
        Ok(Self {
            absolute: true,
            segments,
            property: self.property.clone(),
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
        }
        if let Some(prop) = &self.property {
            write!(f, ".{}", prop)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path(<{}>)", self)
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Path {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Conversion into a [`Path`] for APIs that accept either strings or paths.
pub trait IntoPath {
    fn into_path(self) -> Result<Path>;
}

impl IntoPath for Path {
    fn into_path(self) -> Result<Path> {
        Ok(self)
    }
}

impl IntoPath for &Path {
    fn into_path(self) -> Result<Path> {
        Ok(self.clone())
    }
}

impl IntoPath for &str {
    fn into_path(self) -> Result<Path> {
        Path::parse(self)
    }
}

impl IntoPath for String {
    fn into_path(self) -> Result<Path> {
        Path::parse(&self)
    }
}

impl IntoPath for &String {
    fn into_path(self) -> Result<Path> {
        Path::parse(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute() {
        let p = Path::parse("/hello/test").unwrap();
        assert!(p.is_absolute());
        assert!(p.is_prim_path());
        assert_eq!(p.depth(), 2);
        assert_eq!(p.name(), "test");
        assert_eq!(p.to_string(), "/hello/test");
    }

    #[test]
    fn test_parse_root_and_relative() {
        let root = Path::parse("/").unwrap();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "/");
        assert_eq!(root.name(), "");

        let rel = Path::parse("a/b").unwrap();
        assert!(!rel.is_absolute());
        assert_eq!(rel.to_string(), "a/b");
    }

    #[test]
    fn test_parse_property() {
        let p = Path::parse("/hello.xformOp:translate").unwrap();
        assert!(p.is_property_path());
        assert_eq!(p.property_name(), Some("xformOp:translate"));
        assert_eq!(p.name(), "xformOp:translate");
        assert_eq!(p.prim_path().to_string(), "/hello");
        assert_eq!(p.to_string(), "/hello.xformOp:translate");
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "//", "/a//b", "/a/", "/1a", "/a-b", "/.x", "/a.", "/a.b.c", "a b"] {
            let err = Path::parse(bad).unwrap_err();
            assert!(
                matches!(err, Error::InvalidPathSyntax { .. }),
                "expected syntax error for {:?}, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_round_trip() {
        for s in ["/", "/a", "/a/b/c", "a", "a/b", "/a/b.c", "/_x/y1.ns:attr"] {
            let p = Path::parse(s).unwrap();
            assert_eq!(p.to_string(), s);
            assert_eq!(Path::parse(&p.to_string()).unwrap(), p);
        }
    }

    #[test]
    fn test_append_child() {
        let root = Path::absolute_root();
        let a = root.append_child("a").unwrap();
        let b = a.append_child("b").unwrap();
        assert_eq!(b.to_string(), "/a/b");
        assert_eq!(b, Path::parse("/a/b").unwrap());

        assert!(matches!(a.append_child(""), Err(Error::InvalidSegment(_))));
        assert!(matches!(a.append_child("9lives"), Err(Error::InvalidSegment(_))));
        assert!(matches!(a.append_child("x/y"), Err(Error::InvalidSegment(_))));
    }

    #[test]
    fn test_append_property() {
        let a = Path::parse("/a").unwrap();
        assert_eq!(a.append_property("size").unwrap().to_string(), "/a.size");
        assert!(Path::absolute_root().append_property("size").is_err());
        assert!(matches!(a.append_property("bad name"), Err(Error::InvalidSegment(_))));
    }

    #[test]
    fn test_parent() {
        let p = Path::parse("/a/b/c").unwrap();
        assert_eq!(p.parent().unwrap().to_string(), "/a/b");
        assert_eq!(Path::parse("/a").unwrap().parent(), Some(Path::absolute_root()));
        assert_eq!(Path::absolute_root().parent(), None);
        assert_eq!(Path::parse("a").unwrap().parent(), None);
        assert_eq!(
            Path::parse("/a/b.x").unwrap().parent().unwrap().to_string(),
            "/a/b"
        );
    }

    #[test]
    fn test_ordering_is_depth_first() {
        let mut paths: Vec<Path> = ["/b", "/a/b.x", "/a/b", "/a", "/a/c", "/"]
            .iter()
            .map(|s| Path::parse(s).unwrap())
            .collect();
        paths.sort();
        let sorted: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        assert_eq!(sorted, ["/", "/a", "/a/b", "/a/b.x", "/a/c", "/b"]);
    }

    #[test]
    fn test_prefixes_and_has_prefix() {
        let p = Path::parse("/a/b/c").unwrap();
        let prefixes: Vec<String> = p.prefixes().iter().map(|p| p.to_string()).collect();
        assert_eq!(prefixes, ["/a", "/a/b", "/a/b/c"]);

        assert!(p.has_prefix(&Path::parse("/a").unwrap()));
        assert!(p.has_prefix(&Path::absolute_root()));
        assert!(p.has_prefix(&p));
        assert!(!p.has_prefix(&Path::parse("/a/bb").unwrap()));
        assert!(!Path::parse("/ab").unwrap().has_prefix(&Path::parse("/a").unwrap()));
    }

    #[test]
    fn test_make_absolute() {
        let anchor = Path::parse("/world").unwrap();
        let rel = Path::parse("chair/leg.size").unwrap();
        assert_eq!(
            rel.make_absolute(&anchor).unwrap().to_string(),
            "/world/chair/leg.size"
        );
        assert!(rel.make_absolute(&Path::parse("world").unwrap()).is_err());
    }
}
