use std::fmt;

/// An absolute, slash-delimited path to a prim inside a stage, like `/root_0/child_1`.
///
/// Paths are normalized on construction: they always start with `/`, never end with one
/// (except for the pseudo-root path `/` itself) and every element is a valid identifier.
/// Because of this two `PrimPath`s compare equal exactly when they name the same prim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimPath {
    text: String,
}

impl PrimPath {
    /// The path of the pseudo-root, `/`. The pseudo-root holds the stage's root prims but
    /// is not a prim itself.
    pub fn root() -> PrimPath {
        PrimPath {
            text: String::from("/"),
        }
    }

    /// Builds a path from its text form.
    /// # Panics
    /// Panics if the text is not an absolute path made of valid identifiers. Use
    /// `PrimPath::try_new` when the text comes from an untrusted source.
    pub fn new<T: AsRef<str>>(text: T) -> PrimPath {
        let text = text.as_ref();
        match PrimPath::try_new(text) {
            Some(path) => path,
            None => panic!("invalid prim path '{}'", text),
        }
    }

    /// Builds a path from its text form, returning `None` instead of panicking when the
    /// text is relative, has empty elements or elements that are not valid identifiers.
    pub fn try_new(text: &str) -> Option<PrimPath> {
        if text == "/" {
            return Some(PrimPath::root());
        }

        if !text.starts_with('/') {
            return None;
        }

        for element in text[1..].split('/') {
            if !is_identifier(element) {
                return None;
            }
        }

        Some(PrimPath {
            text: String::from(text),
        })
    }

    /// Returns the path of a child of this prim.
    /// # Panics
    /// Panics if `name` is not a valid identifier.
    pub fn append_child(&self, name: &str) -> PrimPath {
        if !is_identifier(name) {
            panic!("invalid prim name '{}'", name);
        }

        let text = if self.is_root() {
            format!("/{}", name)
        } else {
            format!("{}/{}", self.text, name)
        };

        PrimPath { text }
    }

    /// Returns the parent path, or `None` for the pseudo-root.
    pub fn parent(&self) -> Option<PrimPath> {
        if self.is_root() {
            return None;
        }

        // The leading slash is always there, so rfind can't fail.
        let split_at = self.text.rfind('/').expect("absolute path without a slash");

        if split_at == 0 {
            Some(PrimPath::root())
        } else {
            Some(PrimPath {
                text: String::from(&self.text[..split_at]),
            })
        }
    }

    /// The final element of the path, or an empty string for the pseudo-root.
    pub fn name(&self) -> &str {
        match self.text.rfind('/') {
            Some(split_at) => &self.text[split_at + 1..],
            None => "",
        }
    }

    pub fn is_root(&self) -> bool {
        self.text == "/"
    }

    /// Iterates over the path's elements, from the root prim down. Empty for the pseudo-root.
    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.text.split('/').filter(|element| !element.is_empty())
    }

    /// How many elements the path has. The pseudo-root has zero, `/root_0/child_1` has two.
    pub fn element_count(&self) -> usize {
        self.elements().count()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for PrimPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Prim names and prim type names follow the classic identifier rule: an ASCII letter or
/// underscore followed by ASCII letters, digits or underscores.
pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Property names are identifiers optionally joined by `:` namespace separators, like
/// `primvars:primvar0`.
pub(crate) fn is_property_identifier(text: &str) -> bool {
    !text.is_empty() && text.split(':').all(is_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_normalize_and_compare() {
        let root = PrimPath::new("/root_0");
        assert_eq!(root.as_str(), "/root_0");
        assert_eq!(root, PrimPath::root().append_child("root_0"));
        assert_eq!(root.name(), "root_0");
        assert_eq!(root.element_count(), 1);
    }

    #[test]
    fn child_and_parent_are_inverses() {
        let child = PrimPath::new("/root_0").append_child("child_1");
        assert_eq!(child.as_str(), "/root_0/child_1");
        assert_eq!(child.parent(), Some(PrimPath::new("/root_0")));
        assert_eq!(child.parent().and_then(|p| p.parent()), Some(PrimPath::root()));
        assert_eq!(PrimPath::root().parent(), None);
    }

    #[test]
    fn elements_iterate_in_order() {
        let path = PrimPath::new("/a/b/c");
        let elements: Vec<_> = path.elements().collect();
        assert_eq!(elements, vec!["a", "b", "c"]);
        assert_eq!(PrimPath::root().element_count(), 0);
    }

    #[test]
    fn invalid_paths_are_rejected() {
        assert!(PrimPath::try_new("relative/path").is_none());
        assert!(PrimPath::try_new("/double//slash").is_none());
        assert!(PrimPath::try_new("/trailing/").is_none());
        assert!(PrimPath::try_new("/1starts_with_digit").is_none());
        assert!(PrimPath::try_new("/white space").is_none());
        assert!(PrimPath::try_new("").is_none());
    }

    #[test]
    #[should_panic(expected = "invalid prim path")]
    fn new_panics_on_relative_path() {
        PrimPath::new("not/absolute");
    }

    #[test]
    #[should_panic(expected = "invalid prim name")]
    fn append_child_panics_on_bad_name() {
        PrimPath::root().append_child("bad name");
    }

    #[test]
    fn property_identifiers_allow_namespaces() {
        assert!(is_property_identifier("primvars:primvar0"));
        assert!(is_property_identifier("rel1"));
        assert!(!is_property_identifier("primvars:"));
        assert!(!is_property_identifier(":primvar0"));
        assert!(!is_property_identifier(""));
    }
}
