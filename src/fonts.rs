//! Font-size adaptation by text length.
//!
//! Each table maps a maximum character count to a desktop size and the size
//! used at or below the mobile breakpoint. Lengths count chars, so a Chinese
//! title is measured the same way a browser's `textContent.length` would for
//! BMP text.

struct Step {
    max_chars: Option<usize>,
    desktop: &'static str,
    mobile: &'static str,
}

const QUOTE_STEPS: &[Step] = &[
    Step { max_chars: Some(50), desktop: "1.4rem", mobile: "1.2rem" },
    Step { max_chars: Some(100), desktop: "1.3rem", mobile: "1.1rem" },
    Step { max_chars: Some(150), desktop: "1.2rem", mobile: "1rem" },
    Step { max_chars: Some(200), desktop: "1.1rem", mobile: "0.95rem" },
    Step { max_chars: None, desktop: "1rem", mobile: "0.9rem" },
];

const ESSENCE_TITLE_STEPS: &[Step] = &[
    Step { max_chars: Some(8), desktop: "1.7rem", mobile: "1.3rem" },
    Step { max_chars: Some(12), desktop: "1.5rem", mobile: "1.2rem" },
    Step { max_chars: Some(16), desktop: "1.3rem", mobile: "1.1rem" },
    Step { max_chars: Some(20), desktop: "1.2rem", mobile: "1rem" },
    Step { max_chars: None, desktop: "1.1rem", mobile: "0.9rem" },
];

const ESSENCE_DESC_STEPS: &[Step] = &[
    Step { max_chars: Some(6), desktop: "1.4rem", mobile: "1.1rem" },
    Step { max_chars: Some(10), desktop: "1.3rem", mobile: "1rem" },
    Step { max_chars: Some(14), desktop: "1.2rem", mobile: "0.95rem" },
    Step { max_chars: None, desktop: "1.1rem", mobile: "0.9rem" },
];

fn lookup(steps: &[Step], text: &str, mobile: bool) -> &'static str {
    let len = text.chars().count();
    let step = steps
        .iter()
        .find(|s| s.max_chars.is_none_or(|max| len <= max))
        .or(steps.last());
    match step {
        Some(s) if mobile => s.mobile,
        Some(s) => s.desktop,
        None => "1rem",
    }
}

/// `text` is the rendered quote including its author line.
pub fn quote_font_size(text: &str, mobile: bool) -> &'static str {
    lookup(QUOTE_STEPS, text, mobile)
}

pub fn essence_title_font_size(title: &str, mobile: bool) -> &'static str {
    lookup(ESSENCE_TITLE_STEPS, title, mobile)
}

pub fn essence_desc_font_size(desc: &str, mobile: bool) -> &'static str {
    lookup(ESSENCE_DESC_STEPS, desc, mobile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_boundaries() {
        assert_eq!(quote_font_size(&"a".repeat(50), false), "1.4rem");
        assert_eq!(quote_font_size(&"a".repeat(51), false), "1.3rem");
        assert_eq!(quote_font_size(&"a".repeat(200), false), "1.1rem");
        assert_eq!(quote_font_size(&"a".repeat(201), false), "1rem");
        assert_eq!(quote_font_size(&"a".repeat(201), true), "0.9rem");
    }

    #[test]
    fn test_lengths_count_chars_not_bytes() {
        // 8 chars, 24 bytes
        assert_eq!(essence_title_font_size("长夜漫漫处处险恶", false), "1.7rem");
        assert_eq!(essence_desc_font_size("权力的游戏", false), "1.4rem");
        assert_eq!(essence_desc_font_size("权力的游戏", true), "1.1rem");
    }

    #[test]
    fn test_essence_title_steps_down_on_mobile() {
        let title = "Sometimes you have to run before you can walk";
        assert_eq!(essence_title_font_size(title, false), "1.1rem");
        assert_eq!(essence_title_font_size(title, true), "0.9rem");
        assert_eq!(essence_title_font_size("Winter is coming", false), "1.3rem");
    }
}
