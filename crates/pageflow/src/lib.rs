//! Pageflow: synchronization and navigation core for UI-driven admin tests
//!
//! Pageflow drives the admin web application through a browser session. It
//! guarantees that an element is in the required state before an action is
//! issued, and it models which actions are legal on which screen and where
//! they lead.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   wait    ┌────────────┐   poll    ┌─────────────────┐
//! │ Page object │──────────►│   Waiter   │──────────►│                 │
//! │ (Login,     │           └────────────┘           │    Session      │
//! │  Home,      │  resolve  ┌────────────┐   find    │ (MockSession or │
//! │  Admin,     │──────────►│PageContext │──────────►│  CdpSession)    │
//! │  News)      │           └────────────┘           │                 │
//! │             │   act     ┌────────────┐  click    │                 │
//! │             │──────────►│interaction │──────────►│                 │
//! └─────────────┘           └────────────┘           └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let session = CdpSession::from_config(&config)?;
//! let ctx = PageContext::from_config(&session, &config);
//! let admin = LoginPage::new(ctx)
//!     .enter_username("admin")?
//!     .enter_password("secret")?
//!     .sign_in()?
//!     .admin_button()?
//!     .new_admin()?
//!     .admin_username("newuser")?
//!     .admin_password("pw123")?
//!     .admin_dropdown()?
//!     .admin_save()?;
//! assert!(admin.is_alert_displayed()?);
//! ```

#![warn(missing_docs)]

/// Synthetic and wall clocks for wait polling
pub mod clock;

/// Harness configuration loaded from YAML
#[allow(clippy::missing_errors_doc)]
pub mod config;

/// Session trait and element handles
pub mod driver;

/// Primitive element actions
pub mod interaction;

/// Element selection
pub mod locator;

/// Tracing subscriber setup
pub mod logging;

/// Scripted in-memory session for deterministic tests
#[allow(clippy::missing_panics_doc)]
pub mod mock;

/// Page object base, transition table and shared context
#[allow(clippy::missing_errors_doc)]
pub mod page_object;

/// Login, Home, Admin and News page objects
#[allow(clippy::missing_errors_doc)]
pub mod pages;

/// Error types
pub mod result;

/// Explicit waits
pub mod wait;

/// Chromium backend (requires `browser` feature)
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc)]
pub mod cdp;

#[cfg(feature = "browser")]
pub use cdp::CdpSession;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{BrowserSettings, Fixtures, HarnessConfig, WaitSettings};
pub use driver::{BoundingBox, ElementHandle, ScriptArg, Session};
pub use locator::{Locator, Strategy};
pub use mock::{MockNode, MockSession, NodeChange, NodeId, Reaction};
pub use page_object::{Action, PageContext, PageObject, PageState, Transition, TRANSITIONS};
pub use pages::{
    AdminLocators, AdminPage, HomeLocators, HomePage, LoginLocators, LoginPage, NewsLocators,
    NewsPage, Page,
};
pub use result::{HarnessError, HarnessResult};
pub use wait::{
    ConditionKind, WaitCondition, WaitOptions, WaitResult, Waiter, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS,
};

/// Common imports for tests driving the admin application
pub mod prelude {
    #[cfg(feature = "browser")]
    pub use super::cdp::CdpSession;
    pub use super::clock::*;
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::interaction;
    pub use super::locator::*;
    pub use super::mock::*;
    pub use super::page_object::*;
    pub use super::pages::*;
    pub use super::result::*;
    pub use super::wait::*;
}
