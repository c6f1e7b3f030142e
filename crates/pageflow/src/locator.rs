//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a pure value: a selection strategy plus a selector
//! string. It never caches the element it finds; resolution happens in the
//! page context at the moment of use, so a re-rendered screen is always
//! queried afresh.

use std::fmt;

/// Selection strategy for locating elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// CSS selector (e.g., "a i.fa-power-off")
    Css,
    /// XPath expression
    XPath,
    /// Element id attribute
    Id,
    /// Element name attribute
    Name,
    /// Anchor whose trimmed text equals the selector
    LinkText,
}

impl Strategy {
    /// Short name used in logs and error messages
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::Id => "id",
            Self::Name => "name",
            Self::LinkText => "link-text",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable description of how to find one element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    strategy: Strategy,
    selector: String,
}

impl Locator {
    /// Create a locator from a strategy and selector
    #[must_use]
    pub fn new(strategy: Strategy, selector: impl Into<String>) -> Self {
        Self {
            strategy,
            selector: selector.into(),
        }
    }

    /// Create a CSS locator
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Strategy::Css, selector)
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, selector)
    }

    /// Create an id locator
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::new(Strategy::Id, id)
    }

    /// Create a name-attribute locator
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::new(Strategy::Name, name)
    }

    /// Create a link-text locator
    #[must_use]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::new(Strategy::LinkText, text)
    }

    /// Get the strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Get the selector string
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// JavaScript expression yielding an array of all matches below `scope`.
    ///
    /// `scope` is itself a JavaScript expression evaluating to a node
    /// (usually `document`).
    #[must_use]
    pub fn to_query_all(&self, scope: &str) -> String {
        let s = js_string(&self.selector);
        match self.strategy {
            Strategy::Css => format!("Array.from(({scope}).querySelectorAll({s}))"),
            Strategy::XPath => format!(
                "(() => {{ const r = document.evaluate({s}, {scope}, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                 return out; }})()"
            ),
            Strategy::Id => {
                format!("Array.from(({scope}).querySelectorAll('*')).filter(el => el.id === {s})")
            }
            Strategy::Name => format!(
                "Array.from(({scope}).querySelectorAll('*')).filter(el => el.getAttribute('name') === {s})"
            ),
            Strategy::LinkText => format!(
                "Array.from(({scope}).querySelectorAll('a')).filter(el => el.textContent.trim() === {s})"
            ),
        }
    }

    /// JavaScript expression yielding the first match in the document, or null
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("({}[0] || null)", self.to_query_all("document"))
    }

    /// JavaScript expression counting matches in the document
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("{}.length", self.to_query_all("document"))
    }
}

/// Quote `text` as a JavaScript string literal
pub(crate) fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_owned()).to_string()
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.selector)
    }
}
