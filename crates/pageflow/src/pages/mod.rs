//! Concrete page objects for the admin application.
//!
//! Each page owns its locators and a [`PageContext`]. Same-screen actions
//! consume the page and hand it back, so calls chain with `?`; cross-screen
//! actions consume the page and return the destination page, whose type
//! names the destination state.
//!
//! ```ignore
//! let admin = LoginPage::new(ctx)
//!     .enter_username("admin")?
//!     .enter_password("secret")?
//!     .sign_in()?
//!     .admin_button()?
//!     .new_admin()?;
//! ```

mod admin;
mod home;
mod login;
mod news;

pub use admin::{AdminLocators, AdminPage};
pub use home::{HomeLocators, HomePage};
pub use login::{LoginLocators, LoginPage};
pub use news::{NewsLocators, NewsPage};

use crate::page_object::{Action, PageContext, PageObject, PageState};
use crate::result::{HarnessError, HarnessResult};

/// Any page, tagged by its state
#[derive(Debug, Clone)]
pub enum Page<'s> {
    /// Sign-in form
    Login(LoginPage<'s>),
    /// Dashboard
    Home(HomePage<'s>),
    /// Admin user management
    Admin(AdminPage<'s>),
    /// News management
    News(NewsPage<'s>),
}

impl<'s> Page<'s> {
    /// State of the wrapped page
    #[must_use]
    pub const fn state(&self) -> PageState {
        match self {
            Self::Login(_) => PageState::Login,
            Self::Home(_) => PageState::Home,
            Self::Admin(_) => PageState::Admin,
            Self::News(_) => PageState::News,
        }
    }

    /// Shared context of the wrapped page
    #[must_use]
    pub fn context(&self) -> &PageContext<'s> {
        match self {
            Self::Login(p) => p.context(),
            Self::Home(p) => p.context(),
            Self::Admin(p) => p.context(),
            Self::News(p) => p.context(),
        }
    }

    /// Every action callable on the wrapped page
    #[must_use]
    pub fn available_actions(&self) -> Vec<&'static str> {
        self.state().available_actions()
    }

    /// Perform a cross-screen action chosen at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] if `action` is not legal from the
    /// current state, plus any failure of the action itself.
    pub fn perform(self, action: Action) -> HarnessResult<Self> {
        match (self, action) {
            (Self::Login(p), Action::SignIn) => p.sign_in().map(Self::Home),
            (Self::Home(p), Action::AdminButton) => p.admin_button().map(Self::Admin),
            (Self::Home(p), Action::AdminInfo) => p.admin_info().map(Self::Admin),
            (Self::Home(p), Action::ManageNews) => p.manage_news().map(Self::News),
            (Self::Home(p), Action::LogOut) => p.log_out().map(Self::Login),
            (Self::News(p), Action::ReturnToHome) => p.return_to_home().map(Self::Home),
            (page, action) => Err(HarnessError::config(format!(
                "{action} is not a transition from {}",
                page.state()
            ))),
        }
    }

    /// Block until the wrapped page's ready marker is present
    pub fn wait_until_ready(self) -> HarnessResult<Self> {
        match self {
            Self::Login(p) => p.wait_until_ready().map(Self::Login),
            Self::Home(p) => p.wait_until_ready().map(Self::Home),
            Self::Admin(p) => p.wait_until_ready().map(Self::Admin),
            Self::News(p) => p.wait_until_ready().map(Self::News),
        }
    }
}

impl<'s> From<LoginPage<'s>> for Page<'s> {
    fn from(page: LoginPage<'s>) -> Self {
        Self::Login(page)
    }
}

impl<'s> From<HomePage<'s>> for Page<'s> {
    fn from(page: HomePage<'s>) -> Self {
        Self::Home(page)
    }
}

impl<'s> From<AdminPage<'s>> for Page<'s> {
    fn from(page: AdminPage<'s>) -> Self {
        Self::Admin(page)
    }
}

impl<'s> From<NewsPage<'s>> for Page<'s> {
    fn from(page: NewsPage<'s>) -> Self {
        Self::News(page)
    }
}
