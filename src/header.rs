//! Request headers and scoped header application.
//!
//! [`HeaderSet`] is an ordered collection of name/value pairs with
//! case-sensitive names and remove-then-add replacement. [`HeaderScope`]
//! temporarily overlays additional headers onto a set and restores the set
//! to its exact prior state when dropped, so call-scoped headers can never
//! leak past the call that applied them, whichever way that call exits.

use snafu::Snafu;

use http::{HeaderMap, header::HeaderName, header::HeaderValue};

/// The header name was empty.
#[derive(Debug, Snafu)]
#[snafu(display("Header name may not be empty"))]
pub struct EmptyHeaderName;

/// A single header as a validated name/value pair.
///
/// The name must be non-empty; the value may be empty. Values are kept
/// verbatim, including any whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    value: String,
}

impl Header {
    /// Creates a header, rejecting an empty name.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyHeaderName`] if `name` is empty.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, EmptyHeaderName> {
        let name = name.into();
        if name.is_empty() {
            return Err(EmptyHeaderName);
        }
        Ok(Self {
            name,
            value: value.into(),
        })
    }

    /// The header name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The header value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// An ordered set of headers with case-sensitive names.
///
/// [`set`](Self::set) uses remove-then-add semantics: an existing entry with
/// the same name (exact match) is removed and the new entry is appended, so
/// each name appears at most once. Names differing only in case are distinct
/// entries here; they only collapse to one wire name when converted to a
/// [`HeaderMap`] at dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<Header>,
}

impl HeaderSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing any existing entry with the same name.
    ///
    /// The entry is appended, so a replaced header moves to the end.
    pub fn set(&mut self, header: Header) {
        self.remove(header.name());
        self.entries.push(header);
    }

    /// Removes and returns the header with the given name, if present.
    pub fn remove(&mut self, name: &str) -> Option<Header> {
        self.remove_entry(name).map(|(_, header)| header)
    }

    /// Returns the value of the header with the given name, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_str())
    }

    /// Iterates over the headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    /// The number of headers in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set contains no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts the set into a wire-level header map.
    ///
    /// Names differing only in case canonicalize to the same wire name and
    /// are appended as multiple values.
    pub(crate) fn to_header_map(&self) -> Result<HeaderMap, http::Error> {
        let mut map = HeaderMap::new();
        for header in &self.entries {
            let name = HeaderName::from_bytes(header.name.as_bytes())?;
            let value = HeaderValue::from_str(&header.value)?;
            map.append(name, value);
        }
        Ok(map)
    }

    fn remove_entry(&mut self, name: &str) -> Option<(usize, Header)> {
        let index = self.entries.iter().position(|h| h.name == name)?;
        Some((index, self.entries.remove(index)))
    }
}

impl FromIterator<Header> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        let mut set = Self::new();
        for header in iter {
            set.set(header);
        }
        set
    }
}

impl<'a> IntoIterator for &'a HeaderSet {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A scope during which extra headers overlay a [`HeaderSet`].
///
/// Created by [`HeaderScope::apply`]. While the scope is alive the set
/// contains the scoped headers, each replacing any same-named entry. On drop
/// the scoped headers are removed and every displaced entry is reinstated at
/// its original position, leaving the set identical to its pre-apply state.
/// Because restoration runs in [`Drop`], it happens on every exit path of
/// the scope's owner, including error returns.
#[must_use = "dropping the scope immediately undoes the applied headers"]
pub struct HeaderScope<'a> {
    set: &'a mut HeaderSet,
    applied: Vec<(String, Option<(usize, Header)>)>,
}

impl<'a> HeaderScope<'a> {
    /// Overlays `headers` onto `set`, replacing same-named entries.
    ///
    /// Application order is list order; a name that appears more than once
    /// ends up with the last occurrence visible, and unwinding still
    /// restores the original entry.
    pub fn apply(set: &'a mut HeaderSet, headers: &[Header]) -> Self {
        let mut applied = Vec::with_capacity(headers.len());
        for header in headers {
            let displaced = set.remove_entry(header.name());
            set.entries.push(header.clone());
            applied.push((header.name.clone(), displaced));
        }
        Self { set, applied }
    }

    /// The merged view of the set while the scope is active.
    #[must_use]
    pub fn headers(&self) -> &HeaderSet {
        self.set
    }
}

impl Drop for HeaderScope<'_> {
    fn drop(&mut self) {
        // Unwind in reverse so stacked applications of the same name
        // restore through their intermediate states correctly.
        for (name, displaced) in self.applied.drain(..).rev() {
            self.set.remove(&name);
            if let Some((index, header)) = displaced {
                let index = index.min(self.set.entries.len());
                self.set.entries.insert(index, header);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, value: &str) -> Header {
        Header::new(name, value).unwrap()
    }

    fn names(set: &HeaderSet) -> Vec<&str> {
        set.iter().map(Header::name).collect()
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(Header::new("", "v").is_err());
        assert!(Header::new("X", "").is_ok());
    }

    #[test]
    fn test_set_replaces_and_moves_to_end() {
        let mut set = HeaderSet::new();
        set.set(header("A", "1"));
        set.set(header("B", "2"));
        set.set(header("A", "3"));

        assert_eq!(set.get("A"), Some("3"));
        assert_eq!(names(&set), vec!["B", "A"]);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut set = HeaderSet::new();
        set.set(header("X-Key", "upper"));
        set.set(header("x-key", "lower"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("X-Key"), Some("upper"));
        assert_eq!(set.get("x-key"), Some("lower"));
    }

    #[test]
    fn test_remove_returns_header() {
        let mut set = HeaderSet::new();
        set.set(header("A", "1"));

        assert_eq!(set.remove("A"), Some(header("A", "1")));
        assert_eq!(set.remove("A"), None);
        assert!(set.is_empty());
    }

    #[test]
    fn test_to_header_map_canonicalizes_case_variants() {
        let mut set = HeaderSet::new();
        set.set(header("X-Key", "one"));
        set.set(header("x-key", "two"));

        let map = set.to_header_map().unwrap();
        let values: Vec<_> = map.get_all("x-key").iter().collect();
        assert_eq!(values, vec!["one", "two"]);
    }

    #[test]
    fn test_to_header_map_rejects_bad_wire_name() {
        let mut set = HeaderSet::new();
        set.set(header("bad name", "v"));

        assert!(set.to_header_map().is_err());
    }

    #[test]
    fn test_scope_overlays_and_restores() {
        let mut set = HeaderSet::new();
        set.set(header("A", "default"));
        set.set(header("B", "kept"));
        let before = set.clone();

        {
            let scope = HeaderScope::apply(&mut set, &[header("A", "scoped"), header("C", "new")]);
            assert_eq!(scope.headers().get("A"), Some("scoped"));
            assert_eq!(scope.headers().get("B"), Some("kept"));
            assert_eq!(scope.headers().get("C"), Some("new"));
        }

        assert_eq!(set, before);
    }

    #[test]
    fn test_scope_restores_original_order() {
        let mut set = HeaderSet::new();
        set.set(header("A", "1"));
        set.set(header("B", "2"));
        set.set(header("C", "3"));
        let before = set.clone();

        {
            let _scope = HeaderScope::apply(&mut set, &[header("B", "x"), header("A", "y")]);
        }

        assert_eq!(set, before);
        assert_eq!(names(&set), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_scope_unwinds_duplicate_scoped_names() {
        let mut set = HeaderSet::new();
        set.set(header("A", "default"));
        let before = set.clone();

        {
            let scope = HeaderScope::apply(&mut set, &[header("A", "first"), header("A", "second")]);
            assert_eq!(scope.headers().get("A"), Some("second"));
            assert_eq!(scope.headers().len(), 1);
        }

        assert_eq!(set, before);
    }

    #[test]
    fn test_scope_on_empty_defaults() {
        let mut set = HeaderSet::new();

        {
            let scope = HeaderScope::apply(&mut set, &[header("X", "1")]);
            assert_eq!(scope.headers().len(), 1);
        }

        assert!(set.is_empty());
    }

    #[test]
    fn test_scope_with_no_headers_is_inert() {
        let mut set = HeaderSet::new();
        set.set(header("A", "1"));
        let before = set.clone();

        {
            let _scope = HeaderScope::apply(&mut set, &[]);
        }

        assert_eq!(set, before);
    }
}
