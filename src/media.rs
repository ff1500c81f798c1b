//! Media re-validation across copies.
//!
//! A cloned `<img>` can end up broken when its relative source resolves
//! differently or the first load failed. Broken images are swapped for a fresh
//! element with a corrected source, within a retry budget per attempted source. Inline
//! styles of copy 1 are also mirrored onto the other copies.

use std::collections::{BTreeMap, BTreeSet};

use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlImageElement};

use crate::dom;
use crate::error::{Result, SiteError};
use crate::replicate::CopySet;

const ORIGINAL_SRC_ATTRIBUTE: &str = "data-original-src";
const FAILED_CLASS: &str = "load-failed";

// --- Path fallbacks ----------------------------------------------------------

/// Next source to try for an image currently pointing at `src`: strip a
/// leading `./`, then add a leading `/`, then resolve `../` segments.
pub fn fallback_source(src: &str, page_path: &str) -> Option<String> {
    if let Some(rest) = src.strip_prefix("./") {
        return Some(rest.to_string());
    }
    let external = src.starts_with("http") || src.starts_with("data:") || src.starts_with("//");
    if !src.starts_with('/') && !external {
        return Some(format!("/{src}"));
    }
    if src.contains("../") && !external {
        return Some(resolve_relative_path(src, page_path));
    }
    None
}

/// Resolve `path` against the directory of `page_path`, or against the site
/// root when `path` is absolute.
pub fn resolve_relative_path(path: &str, page_path: &str) -> String {
    let dir = if path.starts_with('/') {
        ""
    } else if page_path.ends_with('/') {
        page_path
    } else {
        page_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    };
    let mut parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
    for part in path.split('/').filter(|p| !p.is_empty()) {
        match part {
            ".." => {
                parts.pop();
            }
            "." => {}
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

pub fn is_broken(complete: bool, natural_width: u32, natural_height: u32) -> bool {
    complete && (natural_width == 0 || natural_height == 0)
}

// --- Retry budget ------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct RetryBudget {
    max_retries: u32,
    attempts: BTreeMap<String, u32>,
    failed: BTreeSet<String>,
}

impl RetryBudget {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries, ..Default::default() }
    }

    /// Source to try after `current` failed to load. Each attempted source
    /// has its own budget, so every fallback step gets its turn even when the
    /// same image is broken in all copies. `None` once `current` is spent.
    pub fn next_source(&mut self, current: &str, page_path: &str) -> Option<String> {
        if self.failed.contains(current) {
            return None;
        }
        let attempts = self.attempts.entry(current.to_string()).or_insert(0);
        if *attempts >= self.max_retries {
            self.failed.insert(current.to_string());
            return None;
        }
        *attempts += 1;
        Some(fallback_source(current, page_path).unwrap_or_else(|| current.to_string()))
    }

    pub fn attempts(&self, src: &str) -> u32 {
        self.attempts.get(src).copied().unwrap_or(0)
    }

    pub fn is_failed(&self, src: &str) -> bool {
        self.failed.contains(src)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

// --- Style drift -------------------------------------------------------------

/// Tag name and inline style of one element, in subtree order.
pub type StyleSnapshot = (String, Option<String>);

/// Indices in `target` whose inline style differs from the element at the
/// same position in `reference`, with the style to apply. Positions whose
/// tags differ are skipped.
pub fn style_drift(reference: &[StyleSnapshot], target: &[StyleSnapshot]) -> Vec<(usize, Option<String>)> {
    reference
        .iter()
        .zip(target)
        .enumerate()
        .filter(|(_, ((ref_tag, ref_style), (tag, style)))| ref_tag == tag && ref_style != style)
        .map(|(i, ((_, ref_style), _))| (i, ref_style.clone()))
        .collect()
}

fn snapshot(elements: &[Element]) -> Vec<StyleSnapshot> {
    elements.iter().map(|el| (el.tag_name(), el.get_attribute("style"))).collect()
}

// --- DOM pass ----------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MediaReport {
    pub replaced: usize,
    pub failed: usize,
    pub restyled: usize,
}

pub struct MediaValidator {
    budget: RetryBudget,
}

impl MediaValidator {
    pub fn new(max_retries: u32) -> Self {
        Self { budget: RetryBudget::new(max_retries) }
    }

    pub fn budget(&self) -> &RetryBudget {
        &self.budget
    }

    pub fn revalidate(&mut self, copies: &CopySet) -> Result<MediaReport> {
        let mut report = MediaReport::default();
        let page_path = dom::window()?.location().pathname()?;
        for copy in copies.copies() {
            for el in dom::query_all(copy, "img")? {
                let Ok(img) = el.dyn_into::<HtmlImageElement>() else { continue };
                if !is_broken(img.complete(), img.natural_width(), img.natural_height()) {
                    continue;
                }
                self.fix_image(&img, &page_path, &mut report)?;
            }
        }
        report.restyled = sync_styles(copies)?;
        if report.replaced + report.failed + report.restyled > 0 {
            tracing::info!(
                replaced = report.replaced,
                failed = report.failed,
                restyled = report.restyled,
                "media revalidated"
            );
        }
        Ok(report)
    }

    fn fix_image(&mut self, img: &HtmlImageElement, page_path: &str, report: &mut MediaReport) -> Result<()> {
        let Some(current) = img.get_attribute("src").filter(|s| !s.is_empty()) else {
            return Ok(());
        };
        let original = img.get_attribute(ORIGINAL_SRC_ATTRIBUTE).unwrap_or_else(|| current.clone());
        let Some(next) = self.budget.next_source(&current, page_path) else {
            if !img.class_list().contains(FAILED_CLASS) {
                img.class_list().add_1(FAILED_CLASS)?;
                tracing::warn!(src = %original, "image failed after retries");
                report.failed += 1;
            }
            return Ok(());
        };
        let fresh = img
            .clone_node()?
            .dyn_into::<HtmlImageElement>()
            .map_err(|_| SiteError::Js("image clone is not an <img>".into()))?;
        fresh.set_attribute(ORIGINAL_SRC_ATTRIBUTE, &original)?;
        fresh.set_attribute("src", &next)?;
        if let Some(parent) = img.parent_node() {
            parent.replace_child(&fresh, img)?;
            report.replaced += 1;
            tracing::debug!(from = %current, to = %next, "image replaced");
        }
        Ok(())
    }
}

/// Mirror copy 1's inline styles onto the other copies; returns elements touched.
pub fn sync_styles(copies: &CopySet) -> Result<usize> {
    let subtrees = copies.subtrees()?;
    let Some((reference, others)) = subtrees.split_first() else { return Ok(0) };
    let reference = snapshot(reference);
    let mut touched = 0;
    for elements in others {
        for (i, style) in style_drift(&reference, &snapshot(elements)) {
            let el = &elements[i];
            match style {
                Some(style) => el.set_attribute("style", &style)?,
                None => el.remove_attribute("style")?,
            }
            touched += 1;
        }
    }
    Ok(touched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_order() {
        assert_eq!(fallback_source("./phoebe/a.png", "/"), Some("phoebe/a.png".into()));
        assert_eq!(fallback_source("phoebe/a.png", "/"), Some("/phoebe/a.png".into()));
        assert_eq!(
            fallback_source("/site/../phoebe/a.png", "/site/index.html"),
            Some("/phoebe/a.png".into())
        );
        assert_eq!(fallback_source("/phoebe/a.png", "/"), None);
        assert_eq!(fallback_source("https://cdn.example.com/a.png", "/"), None);
    }

    #[test]
    fn test_resolve_relative_against_page_directory() {
        assert_eq!(resolve_relative_path("../img/a.png", "/site/pages/index.html"), "/site/img/a.png");
        assert_eq!(resolve_relative_path("./a.png", "/site/"), "/site/a.png");
        assert_eq!(resolve_relative_path("../../../a.png", "/site/index.html"), "/a.png");
    }

    #[test]
    fn test_broken_means_complete_with_no_pixels() {
        assert!(is_broken(true, 0, 0));
        assert!(is_broken(true, 10, 0));
        assert!(!is_broken(false, 0, 0));
        assert!(!is_broken(true, 10, 10));
    }

    #[test]
    fn test_retry_budget_walks_fallbacks_then_fails() {
        let mut budget = RetryBudget::new(3);
        let first = budget.next_source("./a.png", "/").unwrap();
        assert_eq!(first, "a.png");
        let second = budget.next_source(&first, "/").unwrap();
        assert_eq!(second, "/a.png");
        for _ in 0..3 {
            assert_eq!(budget.next_source(&second, "/").as_deref(), Some("/a.png"));
        }
        assert_eq!(budget.attempts("/a.png"), 3);
        assert_eq!(budget.next_source(&second, "/"), None);
        assert!(budget.is_failed("/a.png"));
        assert!(!budget.is_failed("./a.png"));
        assert_eq!(budget.failed_count(), 1);
    }

    #[test]
    fn test_same_broken_image_in_every_copy_reaches_later_fallbacks() {
        let mut budget = RetryBudget::new(3);
        let first_sweep: Vec<Option<String>> = (0..3).map(|_| budget.next_source("./img/a.png", "/")).collect();
        assert!(first_sweep.iter().all(|src| src.as_deref() == Some("img/a.png")));
        let second_sweep: Vec<Option<String>> = (0..3).map(|_| budget.next_source("img/a.png", "/")).collect();
        assert!(second_sweep.iter().all(|src| src.as_deref() == Some("/img/a.png")));
        assert_eq!(budget.failed_count(), 0);
    }

    #[test]
    fn test_parent_segments_resolved_after_earlier_steps() {
        let mut budget = RetryBudget::new(3);
        let next = budget.next_source("/site/../img/a.png", "/site/index.html");
        assert_eq!(next.as_deref(), Some("/img/a.png"));
    }

    #[test]
    fn test_style_drift_copies_reference_styles() {
        let reference = vec![
            ("DIV".to_string(), None),
            ("P".to_string(), Some("font-size: 1.4rem".to_string())),
            ("IMG".to_string(), Some("opacity: 1".to_string())),
        ];
        let target = vec![
            ("DIV".to_string(), Some("color: red".to_string())),
            ("P".to_string(), Some("font-size: 1.4rem".to_string())),
            ("SPAN".to_string(), None),
        ];
        assert_eq!(style_drift(&reference, &target), vec![(0, None)]);
    }
}
