//! Page object base and navigation model.
//!
//! A page object is a [`PageContext`] plus a set of immutable locators. The
//! context carries the shared session reference and the wait engine; it is
//! composed into every page rather than inherited, and it is the only place
//! where a [`Locator`] turns into an [`ElementHandle`].
//!
//! Cross-screen actions are listed once, as data, in the transition table.
//! Page methods go through [`PageContext::traverse`], which looks up the
//! precondition from that table, so the code and the table cannot drift.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{Fixtures, HarnessConfig};
use crate::driver::{ElementHandle, Session};
use crate::interaction;
use crate::locator::Locator;
use crate::result::{HarnessError, HarnessResult};
use crate::wait::{WaitCondition, WaitResult, Waiter};

/// Screen modelled by a page object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Sign-in form; the initial state
    Login,
    /// Dashboard shown after sign-in
    Home,
    /// Admin user management
    Admin,
    /// News management
    News,
}

/// Cross-screen actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Submit the sign-in form
    SignIn,
    /// Open admin management through the header menu
    AdminButton,
    /// Open admin management through its dashboard tile
    AdminInfo,
    /// Open news management through its dashboard tile
    ManageNews,
    /// Sign out
    LogOut,
    /// Go back to the dashboard from news management
    ReturnToHome,
}

impl Action {
    /// Method name of the action
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SignIn => "sign_in",
            Self::AdminButton => "admin_button",
            Self::AdminInfo => "admin_info",
            Self::ManageNews => "manage_news",
            Self::LogOut => "log_out",
            Self::ReturnToHome => "return_to_home",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the navigation graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Screen the action is legal on
    pub from: PageState,
    /// The action
    pub action: Action,
    /// Condition waited for on the action's control before clicking it
    pub precondition: Option<WaitCondition>,
    /// Screen the action leads to
    pub to: PageState,
}

/// The navigation graph. `Home::log_out` closes the cycle back to `Login`.
pub static TRANSITIONS: [Transition; 6] = [
    Transition {
        from: PageState::Login,
        action: Action::SignIn,
        precondition: Some(WaitCondition::Clickable),
        to: PageState::Home,
    },
    Transition {
        from: PageState::Home,
        action: Action::AdminButton,
        precondition: Some(WaitCondition::Clickable),
        to: PageState::Admin,
    },
    Transition {
        from: PageState::Home,
        action: Action::AdminInfo,
        precondition: None,
        to: PageState::Admin,
    },
    Transition {
        from: PageState::Home,
        action: Action::ManageNews,
        precondition: None,
        to: PageState::News,
    },
    Transition {
        from: PageState::Home,
        action: Action::LogOut,
        precondition: Some(WaitCondition::Clickable),
        to: PageState::Login,
    },
    Transition {
        from: PageState::News,
        action: Action::ReturnToHome,
        precondition: None,
        to: PageState::Home,
    },
];

impl PageState {
    /// All states, initial first
    pub const ALL: [Self; 4] = [Self::Login, Self::Home, Self::Admin, Self::News];

    /// Name used in logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Home => "home",
            Self::Admin => "admin",
            Self::News => "news",
        }
    }

    /// Transitions leaving this state
    pub fn transitions(self) -> impl Iterator<Item = &'static Transition> {
        TRANSITIONS.iter().filter(move |t| t.from == self)
    }

    /// Table row for `action` from this state
    #[must_use]
    pub fn transition(self, action: Action) -> Option<&'static Transition> {
        self.transitions().find(|t| t.action == action)
    }

    /// Where `action` leads from this state, if it is legal here
    #[must_use]
    pub fn destination(self, action: Action) -> Option<Self> {
        self.transition(action).map(|t| t.to)
    }

    /// Actions that stay on this screen and return the same page for chaining
    #[must_use]
    pub const fn same_screen_actions(self) -> &'static [&'static str] {
        match self {
            Self::Login => &["enter_username", "enter_password"],
            Self::Home => &[],
            Self::Admin => &[
                "new_admin",
                "admin_username",
                "admin_password",
                "admin_dropdown",
                "admin_save",
            ],
            Self::News => &[
                "new_news",
                "news_text",
                "save_news",
                "search_button",
                "search_text",
                "search_news",
                "reset_news",
            ],
        }
    }

    /// Every action callable on this screen, transitions first
    #[must_use]
    pub fn available_actions(self) -> Vec<&'static str> {
        self.transitions()
            .map(|t| t.action.as_str())
            .chain(self.same_screen_actions().iter().copied())
            .collect()
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session reference and services shared by every page object.
///
/// Cloning is cheap and keeps the same session, so a page handed to a
/// transition and the page it returns drive one browser.
#[derive(Clone)]
pub struct PageContext<'s> {
    session: &'s dyn Session,
    waiter: Waiter,
    fixtures: Arc<Fixtures>,
}

impl fmt::Debug for PageContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContext")
            .field("waiter", &self.waiter)
            .field("fixtures", &self.fixtures)
            .finish_non_exhaustive()
    }
}

impl<'s> PageContext<'s> {
    /// Bind a session to a waiter and fixture data
    #[must_use]
    pub fn new(session: &'s dyn Session, waiter: Waiter, fixtures: Fixtures) -> Self {
        Self {
            session,
            waiter,
            fixtures: Arc::new(fixtures),
        }
    }

    /// Bind a session using configured wait options, the system clock and
    /// configured fixtures
    #[must_use]
    pub fn from_config(session: &'s dyn Session, config: &HarnessConfig) -> Self {
        Self::new(
            session,
            Waiter::with_options(config.wait_options()),
            config.fixtures.clone(),
        )
    }

    /// The session
    #[must_use]
    pub fn session(&self) -> &'s dyn Session {
        self.session
    }

    /// The wait engine
    #[must_use]
    pub const fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// Fixture data
    #[must_use]
    pub fn fixtures(&self) -> &Fixtures {
        &self.fixtures
    }

    /// Whether both contexts drive the same session object
    #[must_use]
    pub fn same_session(&self, other: &PageContext<'_>) -> bool {
        std::ptr::eq(
            (self.session as *const dyn Session).cast::<u8>(),
            (other.session as *const dyn Session).cast::<u8>(),
        )
    }

    /// Query the live DOM for `locator`. Never cached.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NoSuchElement`] if nothing matches.
    pub fn resolve(&self, locator: &Locator) -> HarnessResult<ElementHandle> {
        let handle = self.session.find_element(locator)?;
        debug!(locator = %locator, handle = handle.id(), "resolved");
        Ok(handle)
    }

    /// Wait for `condition` on `locator` with the default timeout
    pub fn wait(&self, condition: &WaitCondition, locator: &Locator) -> HarnessResult<WaitResult> {
        self.waiter.wait(self.session, condition, Some(locator))
    }

    /// Wait for `condition` on `locator`, then resolve it afresh
    pub fn wait_and_resolve(
        &self,
        condition: &WaitCondition,
        locator: &Locator,
    ) -> HarnessResult<ElementHandle> {
        let _ = self.wait(condition, locator)?;
        self.resolve(locator)
    }

    /// Click `locator`, waiting for `precondition` first when one is given
    pub fn click(&self, locator: &Locator, precondition: Option<&WaitCondition>) -> HarnessResult<()> {
        let handle = match precondition {
            Some(condition) => self.wait_and_resolve(condition, locator)?,
            None => self.resolve(locator)?,
        };
        interaction::click(self.session, &handle)
    }

    /// Resolve `locator` and append `text` to it
    pub fn type_into(&self, locator: &Locator, text: &str) -> HarnessResult<()> {
        let handle = self.resolve(locator)?;
        interaction::type_text(self.session, &handle, text)
    }

    /// Whether `locator` matches a displayed element right now. Never waits;
    /// an absent or vanished element reads as `false`.
    pub fn is_displayed(&self, locator: &Locator) -> HarnessResult<bool> {
        let shown = self
            .resolve(locator)
            .and_then(|handle| interaction::is_displayed(self.session, &handle));
        match shown {
            Err(HarnessError::NoSuchElement { .. } | HarnessError::StaleReference { .. }) => {
                Ok(false)
            }
            other => other,
        }
    }

    /// Perform the cross-screen `action` from `from` by clicking `control`.
    ///
    /// The precondition comes from the transition table. Returns the
    /// destination state.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] if the table has no such row, plus
    /// any wait or interaction failure.
    pub fn traverse(
        &self,
        from: PageState,
        action: Action,
        control: &Locator,
    ) -> HarnessResult<PageState> {
        let transition = from.transition(action).ok_or_else(|| {
            HarnessError::config(format!("{action} is not a transition from {from}"))
        })?;
        self.click(control, transition.precondition.as_ref())?;
        info!(from = %from, to = %transition.to, action = %action, "transition");
        Ok(transition.to)
    }
}

/// A screen of the application under test.
///
/// Implementors are built by transitions and by their own constructors; a
/// constructed page makes no claim that its screen has rendered until
/// [`PageObject::wait_until_ready`] is called.
pub trait PageObject<'s>: Sized {
    /// The state this page models
    const STATE: PageState;

    /// Shared context
    fn context(&self) -> &PageContext<'s>;

    /// Element whose presence means the screen has rendered
    fn ready_marker(&self) -> &Locator;

    /// Page name for logging
    fn page_name(&self) -> &'static str {
        Self::STATE.as_str()
    }

    /// Every action callable on this page
    fn available_actions(&self) -> Vec<&'static str> {
        Self::STATE.available_actions()
    }

    /// Block until the ready marker is present
    fn wait_until_ready(self) -> HarnessResult<Self> {
        let _ = self
            .context()
            .wait(&WaitCondition::Present, self.ready_marker())?;
        Ok(self)
    }
}
