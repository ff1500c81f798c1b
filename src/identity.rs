//! Duplicate id resolution across the three content copies.
//!
//! Copy 1 (first in document order) keeps its ids. In copies 2 and 3 every id
//! becomes `<id>--copy<n>` and every `for` / `aria-*` reference inside the same
//! copy is rewritten through the identity map. Running the resolver twice
//! changes nothing.

use std::collections::BTreeMap;

use web_sys::Element;

/// Attributes that hold element ids (the `aria-*` ones hold space-separated lists).
pub const REFERENCE_ATTRIBUTES: [&str; 4] = ["for", "aria-labelledby", "aria-describedby", "aria-controls"];

/// 1-based copy number that keeps original ids.
pub const CANONICAL_COPY: usize = 1;

pub fn copy_suffix(copy: usize) -> String {
    format!("--copy{copy}")
}

pub fn copy_id(canonical: &str, copy: usize) -> String {
    format!("{canonical}{}", copy_suffix(copy))
}

/// Arena of id rewrites: canonical id -> copy number -> id used in that copy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityMap {
    entries: BTreeMap<String, BTreeMap<usize, String>>,
}

impl IdentityMap {
    pub fn assign(&mut self, canonical: &str, copy: usize) -> String {
        let new_id = if copy == CANONICAL_COPY { canonical.to_string() } else { copy_id(canonical, copy) };
        self.entries.entry(canonical.to_string()).or_default().insert(copy, new_id.clone());
        new_id
    }

    pub fn resolve(&self, canonical: &str, copy: usize) -> Option<&str> {
        self.entries.get(canonical)?.get(&copy).map(String::as_str)
    }

    /// Id of `canonical` as it appears in `copy`, falling back to the canonical id.
    pub fn id_in_copy(&self, canonical: &str, copy: usize) -> String {
        self.resolve(canonical, copy).map(str::to_string).unwrap_or_else(|| canonical.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Minimal element surface the resolver needs. Implemented for `web_sys::Element`.
pub trait IdentityNode {
    fn id(&self) -> String;
    fn set_id(&self, id: &str);
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);
}

impl IdentityNode for Element {
    fn id(&self) -> String {
        Element::id(self)
    }

    fn set_id(&self, id: &str) {
        Element::set_id(self, id);
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if let Err(err) = Element::set_attribute(self, name, value) {
            tracing::warn!(name, ?err, "failed to rewrite reference attribute");
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub renamed: usize,
    pub references: usize,
}

#[derive(Clone, Debug, Default)]
pub struct DuplicateIdentityResolver {
    map: IdentityMap,
}

impl DuplicateIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self) -> &IdentityMap {
        &self.map
    }

    /// Rewrite ids and references for all the `nodes` of one copy.
    pub fn resolve_copy<N: IdentityNode>(&mut self, copy: usize, nodes: &[N]) -> ResolveReport {
        let mut report = ResolveReport::default();
        if copy == CANONICAL_COPY {
            for node in nodes {
                let id = node.id();
                if !id.is_empty() {
                    self.map.assign(&id, copy);
                }
            }
            return report;
        }

        let suffix = copy_suffix(copy);
        for node in nodes {
            let id = node.id();
            if id.is_empty() {
                continue;
            }
            if let Some(canonical) = id.strip_suffix(&suffix) {
                // already rewritten on an earlier pass
                self.map.assign(canonical, copy);
                continue;
            }
            let new_id = self.map.assign(&id, copy);
            node.set_id(&new_id);
            report.renamed += 1;
        }

        for node in nodes {
            for attr in REFERENCE_ATTRIBUTES {
                let Some(value) = node.attribute(attr) else { continue };
                let (rewritten, changed) = self.rewrite_tokens(&value, copy);
                if changed {
                    node.set_attribute(attr, &rewritten);
                    report.references += 1;
                }
            }
        }
        report
    }

    fn rewrite_tokens(&self, value: &str, copy: usize) -> (String, bool) {
        let mut changed = false;
        let tokens: Vec<&str> = value
            .split_whitespace()
            .map(|token| match self.map.resolve(token, copy) {
                Some(mapped) if mapped != token => {
                    changed = true;
                    mapped
                }
                _ => token,
            })
            .collect();
        (tokens.join(" "), changed)
    }

    /// Resolve ids in all copies; `copies[i]` holds the elements of copy `i + 1`.
    pub fn resolve_all<N: IdentityNode>(&mut self, copies: &[Vec<N>]) -> ResolveReport {
        let mut total = ResolveReport::default();
        for (i, nodes) in copies.iter().enumerate() {
            let r = self.resolve_copy(i + 1, nodes);
            total.renamed += r.renamed;
            total.references += r.references;
        }
        tracing::debug!(renamed = total.renamed, references = total.references, ids = self.map.len(), "ids resolved");
        total
    }

    pub fn reset(&mut self) {
        self.map.clear();
    }

    /// Undo the rewrite of one copy, putting canonical ids and references
    /// back. Used before a copy becomes the source of fresh clones.
    pub fn restore_copy<N: IdentityNode>(&mut self, copy: usize, nodes: &[N]) -> ResolveReport {
        let mut report = ResolveReport::default();
        if copy == CANONICAL_COPY {
            return report;
        }
        let suffix = copy_suffix(copy);
        for node in nodes {
            if let Some(canonical) = node.id().strip_suffix(&suffix) {
                node.set_id(canonical);
                report.renamed += 1;
            }
            for attr in REFERENCE_ATTRIBUTES {
                let Some(value) = node.attribute(attr) else { continue };
                let restored: Vec<&str> =
                    value.split_whitespace().map(|t| t.strip_suffix(&suffix).unwrap_or(t)).collect();
                let restored = restored.join(" ");
                if restored != value {
                    node.set_attribute(attr, &restored);
                    report.references += 1;
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct FakeNode {
        attrs: RefCell<BTreeMap<String, String>>,
    }

    impl FakeNode {
        fn with(pairs: &[(&str, &str)]) -> Self {
            let node = FakeNode::default();
            for (k, v) in pairs {
                node.attrs.borrow_mut().insert(k.to_string(), v.to_string());
            }
            node
        }
    }

    impl IdentityNode for FakeNode {
        fn id(&self) -> String {
            self.attribute("id").unwrap_or_default()
        }
        fn set_id(&self, id: &str) {
            self.set_attribute("id", id);
        }
        fn attribute(&self, name: &str) -> Option<String> {
            self.attrs.borrow().get(name).cloned()
        }
        fn set_attribute(&self, name: &str, value: &str) {
            self.attrs.borrow_mut().insert(name.to_string(), value.to_string());
        }
    }

    fn copy_of_form() -> Vec<FakeNode> {
        vec![
            FakeNode::with(&[("id", "email")]),
            FakeNode::with(&[("for", "email")]),
            FakeNode::with(&[("id", "hint")]),
            FakeNode::with(&[("aria-describedby", "hint email external")]),
            FakeNode::with(&[("class", "plain")]),
        ]
    }

    #[test]
    fn test_ids_are_unique_across_copies() {
        let copies = vec![copy_of_form(), copy_of_form(), copy_of_form()];
        let mut resolver = DuplicateIdentityResolver::new();
        let report = resolver.resolve_all(&copies);
        assert_eq!(report.renamed, 4);
        assert_eq!(report.references, 4);

        let mut seen = std::collections::BTreeSet::new();
        for copy in &copies {
            for node in copy {
                let id = node.id();
                if !id.is_empty() {
                    assert!(seen.insert(id.clone()), "duplicate id {id}");
                }
            }
        }
        assert_eq!(copies[0][0].id(), "email");
        assert_eq!(copies[2][0].id(), "email--copy3");
    }

    #[test]
    fn test_references_point_into_same_copy() {
        let copies = vec![copy_of_form(), copy_of_form(), copy_of_form()];
        let mut resolver = DuplicateIdentityResolver::new();
        resolver.resolve_all(&copies);
        assert_eq!(copies[1][1].attribute("for").as_deref(), Some("email--copy2"));
        assert_eq!(
            copies[1][3].attribute("aria-describedby").as_deref(),
            Some("hint--copy2 email--copy2 external")
        );
        assert_eq!(copies[0][1].attribute("for").as_deref(), Some("email"));
    }

    #[test]
    fn test_resolver_is_idempotent() {
        let copies = vec![copy_of_form(), copy_of_form(), copy_of_form()];
        let mut resolver = DuplicateIdentityResolver::new();
        resolver.resolve_all(&copies);
        let again = resolver.resolve_all(&copies);
        assert_eq!(again, ResolveReport::default());
        assert_eq!(copies[2][0].id(), "email--copy3");
        assert_eq!(copies[2][1].attribute("for").as_deref(), Some("email--copy3"));

        // a fresh resolver over already-rewritten copies also leaves them alone
        let mut fresh = DuplicateIdentityResolver::new();
        assert_eq!(fresh.resolve_all(&copies), ResolveReport::default());
        assert_eq!(fresh.map().resolve("email", 3), Some("email--copy3"));
    }

    #[test]
    fn test_restore_returns_canonical_ids() {
        let copies = vec![copy_of_form(), copy_of_form(), copy_of_form()];
        let mut resolver = DuplicateIdentityResolver::new();
        resolver.resolve_all(&copies);
        let report = resolver.restore_copy(2, &copies[1]);
        assert_eq!(report, ResolveReport { renamed: 2, references: 2 });
        assert_eq!(copies[1][0].id(), "email");
        assert_eq!(copies[1][3].attribute("aria-describedby").as_deref(), Some("hint email external"));
        assert_eq!(resolver.restore_copy(1, &copies[0]), ResolveReport::default());
    }

    #[test]
    fn test_identity_map_lookup() {
        let mut map = IdentityMap::default();
        assert_eq!(map.assign("quote-section", 2), "quote-section--copy2");
        assert_eq!(map.assign("quote-section", 1), "quote-section");
        assert_eq!(map.id_in_copy("quote-section", 2), "quote-section--copy2");
        assert_eq!(map.id_in_copy("unknown", 2), "unknown");
        assert_eq!(map.len(), 1);
    }
}
