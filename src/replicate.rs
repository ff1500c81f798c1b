//! Triplicates the page content inside the scroll container.
//!
//! The original root stays in the middle; one deep clone goes before it and
//! one after. Every clone insertion is reported as a `CopyEvent` so the
//! watcher can resolve ids and resync state without a MutationObserver.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::config::Selectors;
use crate::dom;
use crate::error::{Result, SiteError};

pub const COPY_COUNT: usize = 3;
/// 0-based document-order index of the home copy.
pub const MIDDLE_COPY: usize = 1;
pub const COPY_ATTRIBUTE: &str = "data-copy";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyEvent {
    /// A clone was inserted at this 0-based document-order index.
    CopyCreated { index: usize },
    /// An image failed or a media/style attribute changed somewhere in the copies.
    MediaChanged,
}

#[derive(Clone, Debug)]
pub struct CopySet {
    container: HtmlElement,
    copies: Vec<HtmlElement>,
}

impl CopySet {
    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    pub fn copies(&self) -> &[HtmlElement] {
        &self.copies
    }

    pub fn middle(&self) -> Option<&HtmlElement> {
        self.copies.get(MIDDLE_COPY)
    }

    /// Every element of each copy, root first, in document order.
    pub fn subtrees(&self) -> Result<Vec<Vec<Element>>> {
        self.copies.iter().map(|c| dom::subtree(c)).collect()
    }
}

pub struct ContentReplicator {
    selectors: Selectors,
}

impl ContentReplicator {
    pub fn new(selectors: &Selectors) -> Self {
        Self { selectors: selectors.clone() }
    }

    fn roots(&self, container: &HtmlElement) -> Result<Vec<HtmlElement>> {
        let selector = format!(":scope > {}", self.selectors.content_root);
        Ok(dom::query_all(container, &selector)?
            .into_iter()
            .filter_map(|el| el.dyn_into::<HtmlElement>().ok())
            .collect())
    }

    /// Build the three-copy layout. A page that already holds three copies is
    /// adopted as is and emits no events.
    pub fn replicate(&self, doc: &Document, events: &mut Vec<CopyEvent>) -> Result<CopySet> {
        let container = dom::require(doc, &self.selectors.scroll_container)?;
        let roots = self.roots(&container)?;
        if roots.len() == COPY_COUNT {
            tracing::info!("content already replicated, adopting existing copies");
            return Ok(CopySet { container, copies: roots });
        }
        let root = roots
            .into_iter()
            .next()
            .ok_or_else(|| SiteError::MissingElement(self.selectors.content_root.clone()))?;
        let copies = self.clone_around(&container, root, events)?;
        tracing::info!(copies = copies.len(), "content replicated");
        Ok(CopySet { container, copies })
    }

    fn clone_around(
        &self,
        container: &HtmlElement,
        root: HtmlElement,
        events: &mut Vec<CopyEvent>,
    ) -> Result<Vec<HtmlElement>> {
        let before = deep_clone(&root)?;
        let after = deep_clone(&root)?;
        container.insert_before(&before, Some(&root))?;
        container.insert_before(&after, root.next_sibling().as_ref())?;
        let copies = vec![before, root, after];
        for (i, copy) in copies.iter().enumerate() {
            copy.set_attribute(COPY_ATTRIBUTE, &(i + 1).to_string())?;
            if i != MIDDLE_COPY {
                copy.set_attribute("aria-hidden", "true")?;
                events.push(CopyEvent::CopyCreated { index: i });
            }
        }
        Ok(copies)
    }

    /// Drop both clones and clone the middle copy again.
    pub fn refresh(&self, set: &mut CopySet, events: &mut Vec<CopyEvent>) -> Result<()> {
        let root = self.strip_clones(set)?;
        set.copies = self.clone_around(&set.container, root, events)?;
        tracing::info!("content copies refreshed");
        Ok(())
    }

    /// Remove both clones and return to a plain, single-copy page.
    pub fn destroy(&self, mut set: CopySet) -> Result<HtmlElement> {
        let root = self.strip_clones(&mut set)?;
        set.container.set_scroll_top(0);
        tracing::info!("content copies removed");
        Ok(root)
    }

    fn strip_clones(&self, set: &mut CopySet) -> Result<HtmlElement> {
        if set.copies.len() != COPY_COUNT {
            return Err(SiteError::MissingElement(self.selectors.content_root.clone()));
        }
        let mut copies = std::mem::take(&mut set.copies);
        let root = copies.remove(MIDDLE_COPY);
        for clone in copies {
            clone.remove();
        }
        root.remove_attribute(COPY_ATTRIBUTE)?;
        Ok(root)
    }
}

fn deep_clone(root: &HtmlElement) -> Result<HtmlElement> {
    root.clone_node_with_deep(true)?
        .dyn_into::<HtmlElement>()
        .map_err(|_| SiteError::Js("cloned content root is not an element".into()))
}
