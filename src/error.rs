//! Crate error type. Internal code returns `Result<T, SiteError>`; the
//! `#[wasm_bindgen]` exports convert into `JsValue` at the boundary.

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("no global window")]
    NoWindow,
    #[error("window has no document")]
    NoDocument,
    #[error("element not found: {0}")]
    MissingElement(String),
    #[error("unknown easter egg `{0}`")]
    UnknownEasterEgg(String),
    #[error("unknown section `{0}`")]
    UnknownSection(String),
    #[error("index {index} out of range for {what} (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    #[error("unsupported language `{0}`")]
    UnsupportedLanguage(String),
    #[error("site is not running")]
    NotStarted,
    #[error("site state is busy")]
    Busy,
    #[error("invalid config: {0}")]
    Config(String),
    #[error("javascript error: {0}")]
    Js(String),
}

pub type Result<T, E = SiteError> = std::result::Result<T, E>;

impl From<JsValue> for SiteError {
    fn from(value: JsValue) -> Self {
        SiteError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<SiteError> for JsValue {
    fn from(err: SiteError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = SiteError::MissingElement("#infinite-scroll-container".into());
        assert_eq!(err.to_string(), "element not found: #infinite-scroll-container");
        let err = SiteError::IndexOutOfRange { what: "quotes", index: 12, len: 9 };
        assert_eq!(err.to_string(), "index 12 out of range for quotes (len 9)");
    }
}
