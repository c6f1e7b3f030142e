//! Driver boundary: the live browser session the harness talks to.
//!
//! The wire protocol behind a [`Session`] is out of scope for the core. Two
//! implementations ship with the crate:
//!
//! - [`MockSession`](crate::MockSession) - in-memory scripted DOM for unit tests
//! - `CdpSession` - real Chromium over the `DevTools` protocol (`browser` feature)
//!
//! The trait is synchronous and takes `&self`: one session serves one test
//! flow on one thread, and every page object holds a shared, non-owning
//! reference to it.

use serde::{Deserialize, Serialize};

use crate::locator::Locator;
use crate::result::{HarnessError, HarnessResult};

/// A resolved, possibly stale reference to one DOM node.
///
/// Handles are time-bound. A handle obtained before a re-render may no longer
/// refer to a live node; drivers report that as
/// [`HarnessError::StaleReference`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    id: String,
    locator: Locator,
}

impl ElementHandle {
    /// Create a handle from a driver-specific node id
    #[must_use]
    pub fn new(id: impl Into<String>, locator: Locator) -> Self {
        Self {
            id: id.into(),
            locator,
        }
    }

    /// Driver-specific node id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Locator this handle was resolved from
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }
}

/// Rendered element rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the box covers any area
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Argument passed to [`Session::execute_script`], exposed to the script as
/// `arguments[i]`
#[derive(Debug, Clone)]
pub enum ScriptArg {
    /// A resolved element
    Element(ElementHandle),
    /// A JSON value
    Value(serde_json::Value),
}

/// Live connection to a controlled browser page
pub trait Session {
    /// All elements matching `locator`, searched below `scope` or the whole
    /// document when `scope` is `None`
    fn find_elements(
        &self,
        scope: Option<&ElementHandle>,
        locator: &Locator,
    ) -> HarnessResult<Vec<ElementHandle>>;

    /// First element matching `locator`
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NoSuchElement`] if nothing matches.
    fn find_element(&self, locator: &Locator) -> HarnessResult<ElementHandle> {
        self.find_elements(None, locator)?
            .into_iter()
            .next()
            .ok_or_else(|| HarnessError::NoSuchElement {
                locator: locator.clone(),
            })
    }

    /// Whether the element is rendered visible
    fn is_displayed(&self, handle: &ElementHandle) -> HarnessResult<bool>;

    /// Whether the element accepts input
    fn is_enabled(&self, handle: &ElementHandle) -> HarnessResult<bool>;

    /// Whether a checkbox, radio or option is selected
    fn is_selected(&self, handle: &ElementHandle) -> HarnessResult<bool>;

    /// Rendered rectangle
    fn bounding_box(&self, handle: &ElementHandle) -> HarnessResult<BoundingBox>;

    /// Rendered text content
    fn text(&self, handle: &ElementHandle) -> HarnessResult<String>;

    /// Lower-case tag name
    fn tag_name(&self, handle: &ElementHandle) -> HarnessResult<String>;

    /// Dispatch a native click; fails with `NotInteractable` if the element
    /// cannot receive it right now
    fn click(&self, handle: &ElementHandle) -> HarnessResult<()>;

    /// Make `option` the chosen entry of the `select` dropdown it belongs to,
    /// firing the dropdown's `input` and `change` events. Options of a
    /// closed dropdown have no layout box, so this never goes through the
    /// pointer.
    fn select_option(&self, select: &ElementHandle, option: &ElementHandle) -> HarnessResult<()>;

    /// Append keystrokes to the element's current content
    fn send_keys(&self, handle: &ElementHandle, text: &str) -> HarnessResult<()>;

    /// Remove all content from an editable element
    fn clear(&self, handle: &ElementHandle) -> HarnessResult<()>;

    /// Run a script in the page with `arguments` bound to `args`
    fn execute_script(&self, script: &str, args: &[ScriptArg])
        -> HarnessResult<serde_json::Value>;

    /// Move the pointer to the element, scrolling it into view
    fn move_to(&self, handle: &ElementHandle) -> HarnessResult<()>;

    /// Whether a native dialog (alert, confirm, prompt) is open
    fn is_alert_present(&self) -> HarnessResult<bool>;

    /// Current page URL
    fn current_url(&self) -> HarnessResult<String>;

    /// Load a URL in the page
    fn navigate(&self, url: &str) -> HarnessResult<()>;
}
