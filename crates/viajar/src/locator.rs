//! Locator strategies for element selection.
//!
//! A [`Selector`] is pure data: a selector language plus an expression,
//! no behavior beyond turning itself into a page query. Selectors that
//! embed runtime text (suggestion labels, expected error messages) MUST
//! be built through [`xpath_literal`], which produces a well-formed XPath
//! string literal for any input, including text containing both quote
//! kinds.

use serde::{Deserialize, Serialize};

/// Default timeout for bounded waits (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default polling interval for bounded waits (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Selector language + expression identifying zero-or-more page elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., `button.primary`)
    Css(String),
    /// XPath selector (e.g., `//input[@placeholder='Origin']`)
    XPath(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// The raw selector expression
    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }

    /// JavaScript expression resolving the selector to an array of nodes
    #[must_use]
    fn to_js_nodes(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({s:?}))"),
            Self::XPath(s) => format!(
                "(() => {{ \
                 const r = document.evaluate({s:?}, document, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                 return out; }})()"
            ),
        }
    }

    /// JavaScript expression returning a JSON snapshot of every match.
    ///
    /// Each entry carries `tag`, `text`, `visible` and `enabled`, which is
    /// everything the wait engine needs to evaluate a condition. The query
    /// is re-issued on every poll so no stale node ever survives a retry.
    #[must_use]
    pub fn to_js_snapshot_query(&self) -> String {
        format!(
            "JSON.stringify({}.map(el => {{ \
             const rect = el.getBoundingClientRect(); \
             const style = window.getComputedStyle(el); \
             return {{ \
             tag: el.tagName.toLowerCase(), \
             text: (el.textContent || '').trim(), \
             visible: rect.width > 0 && rect.height > 0 \
                 && style.visibility !== 'hidden' && style.display !== 'none', \
             enabled: !el.disabled && el.getAttribute('aria-disabled') !== 'true' \
             }}; }}))",
            self.to_js_nodes()
        )
    }

    /// JavaScript statement clicking the n-th current match
    #[must_use]
    pub fn to_js_click(&self, index: usize) -> String {
        format!("{}[{index}].click()", self.to_js_nodes())
    }

    /// JavaScript statement typing into the n-th current match.
    ///
    /// Sets the value and dispatches `input`/`change` so framework-bound
    /// inputs (the trip planner's autocomplete fields) observe the text.
    #[must_use]
    pub fn to_js_type(&self, index: usize, text: &str) -> String {
        format!(
            "(() => {{ const el = {}[{index}]; el.focus(); \
             el.value = (el.value || '') + {text:?}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); }})()",
            self.to_js_nodes()
        )
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
        }
    }
}

/// Escape arbitrary text into a valid XPath string literal.
///
/// XPath 1.0 has no escape sequences inside string literals, so text
/// containing both quote kinds has to be assembled with `concat()`.
/// Every locator that interpolates runtime text goes through this
/// function; raw concatenation would produce a malformed (or injectable)
/// expression.
#[must_use]
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{text}'")
    } else if !text.contains('"') {
        format!("\"{text}\"")
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}
