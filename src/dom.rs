//! Small DOM helpers shared by the browser-facing modules.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, NodeList, Window};

use crate::error::{Result, SiteError};

pub fn window() -> Result<Window> {
    web_sys::window().ok_or(SiteError::NoWindow)
}

pub fn document() -> Result<Document> {
    window()?.document().ok_or(SiteError::NoDocument)
}

/// `performance.now()` in milliseconds, or 0 outside a browser page.
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Wall clock milliseconds for host builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

pub fn elements(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn query_all(root: &Element, selector: &str) -> Result<Vec<Element>> {
    Ok(elements(root.query_selector_all(selector)?))
}

pub fn query_all_in(doc: &Document, selector: &str) -> Result<Vec<Element>> {
    Ok(elements(doc.query_selector_all(selector)?))
}

pub fn require(doc: &Document, selector: &str) -> Result<HtmlElement> {
    doc.query_selector(selector)?
        .ok_or_else(|| SiteError::MissingElement(selector.to_string()))?
        .dyn_into::<HtmlElement>()
        .map_err(|_| SiteError::MissingElement(selector.to_string()))
}

/// The element itself followed by all of its descendants in document order.
pub fn subtree(root: &Element) -> Result<Vec<Element>> {
    let mut nodes = vec![root.clone()];
    nodes.extend(query_all(root, "*")?);
    Ok(nodes)
}

pub fn set_class(el: &Element, class: &str, on: bool) -> Result<()> {
    let list = el.class_list();
    if on { list.add_1(class)? } else { list.remove_1(class)? }
    Ok(())
}

pub fn viewport_width() -> f64 {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|v| v.as_f64())
        .unwrap_or(1024.0)
}
