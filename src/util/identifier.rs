//! Identifier grammar shared by prim names, path segments and property names.
//!
//! An identifier is a non-empty run of ASCII letters, digits and `_` that
//! does not start with a digit. Property names may additionally be
//! namespaced: identifiers joined with `:` (e.g. `xformOp:translate`).

/// Namespace separator inside property names.
pub const NAMESPACE_DELIMITER: char = ':';

/// Returns true if `s` is a valid identifier.
#[inline]
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns true if `s` is one or more identifiers joined by `:`.
pub fn is_valid_namespaced_identifier(s: &str) -> bool {
    !s.is_empty() && s.split(NAMESPACE_DELIMITER).all(is_valid_identifier)
}

/// Check that a layer identity looks like a file name: non-empty, no
/// surrounding whitespace, no control characters and not ending in a
/// separator.
pub fn is_valid_layer_identity(s: &str) -> bool {
    !s.is_empty()
        && s.trim() == s
        && !s.chars().any(|c| c.is_control())
        && !s.ends_with('/')
        && !s.ends_with('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_valid_identifier("hello"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("mesh_01"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1abc"));
        assert!(!is_valid_identifier("a-b"));
        assert!(!is_valid_identifier("a b"));
        assert!(!is_valid_identifier("a:b"));
    }

    #[test]
    fn test_namespaced_identifiers() {
        assert!(is_valid_namespaced_identifier("xformOp:translate"));
        assert!(is_valid_namespaced_identifier("primvars:st"));
        assert!(is_valid_namespaced_identifier("test"));
        assert!(!is_valid_namespaced_identifier("xformOp:"));
        assert!(!is_valid_namespaced_identifier(":x"));
        assert!(!is_valid_namespaced_identifier("a::b"));
    }

    #[test]
    fn test_layer_identity() {
        assert!(is_valid_layer_identity("hello.usda"));
        assert!(is_valid_layer_identity("assets/chair.usdc"));
        assert!(!is_valid_layer_identity(""));
        assert!(!is_valid_layer_identity(" hello.usda"));
        assert!(!is_valid_layer_identity("dir/"));
        assert!(!is_valid_layer_identity("bad\nname"));
    }
}
