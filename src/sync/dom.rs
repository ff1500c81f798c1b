//! Render target over the live copies in the scroll container.

use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

use crate::content::Language;
use crate::dom;
use crate::error::Result;

use super::surface::{ElementWrite, Surface, WriteValue};
use super::view;

pub struct DomSurface {
    copies: Vec<Element>,
    body: Option<HtmlElement>,
    mobile_breakpoint_px: f64,
}

impl DomSurface {
    /// Falls back to the whole document body when no copies exist, so synced
    /// content still renders with infinite scroll disabled.
    pub fn new(copies: Vec<Element>, mobile_breakpoint_px: f64) -> Result<Self> {
        let body = dom::document()?.body();
        let copies = match (copies.is_empty(), &body) {
            (true, Some(body)) => vec![body.clone().into()],
            _ => copies,
        };
        Ok(Self { copies, body, mobile_breakpoint_px })
    }

    pub fn set_copies(&mut self, copies: Vec<Element>) {
        if !copies.is_empty() {
            self.copies = copies;
        }
    }

    fn targets(&self, copy: &Element, write: &ElementWrite) -> Result<Vec<Element>> {
        let Some(slot) = write.target.slot else {
            return dom::query_all(copy, write.target.selector);
        };
        let mut found = Vec::new();
        for (position, group) in dom::query_all(copy, slot.group)?.into_iter().enumerate() {
            if !slot.matches(position) {
                continue;
            }
            if group.matches(write.target.selector)? {
                found.push(group.clone());
            }
            found.extend(dom::query_all(&group, write.target.selector)?);
        }
        Ok(found)
    }
}

/// Language of the nearest `.content-en` / `.content-zh` ancestor.
fn block_language(el: &Element) -> Result<Option<Language>> {
    let en = el.closest(view::CONTENT_EN)?;
    let zh = el.closest(view::CONTENT_ZH)?;
    Ok(match (en, zh) {
        (Some(en), Some(zh)) => Some(if en.contains(Some(zh.as_ref())) { Language::Zh } else { Language::En }),
        (Some(_), None) => Some(Language::En),
        (None, Some(_)) => Some(Language::Zh),
        (None, None) => None,
    })
}

fn write_one(el: &Element, write: &ElementWrite) -> Result<()> {
    let lang = write.language_for(block_language(el)?);
    match &write.value {
        WriteValue::Text(text) => el.set_text_content(Some(text.get(lang).as_str())),
        WriteValue::Html(html) => el.set_inner_html(html.get(lang)),
        WriteValue::Style { property, value } => {
            if let Some(el) = el.dyn_ref::<HtmlElement>() {
                el.style().set_property(property, value.get(lang))?;
            }
        }
        WriteValue::Class { name, on } => dom::set_class(el, name, *on)?,
        WriteValue::LangData => {
            if let Some(text) = el.get_attribute(&format!("data-{}", lang.code())) {
                el.set_text_content(Some(&text));
            }
        }
    }
    Ok(())
}

impl Surface for DomSurface {
    fn apply(&mut self, write: &ElementWrite) -> Result<usize> {
        let mut touched = 0;
        for copy in &self.copies {
            for el in self.targets(copy, write)? {
                write_one(&el, write)?;
                touched += 1;
            }
        }
        Ok(touched)
    }

    fn set_root_class(&mut self, class: &str, on: bool) -> Result<()> {
        if let Some(body) = &self.body {
            dom::set_class(body, class, on)?;
        }
        Ok(())
    }

    fn is_compact(&self) -> bool {
        dom::viewport_width() <= self.mobile_breakpoint_px
    }

    fn copy_count(&self) -> usize {
        self.copies.len()
    }
}
