//! Sign-in screen.

use std::sync::Arc;

use crate::locator::Locator;
use crate::page_object::{Action, PageContext, PageObject, PageState};
use crate::pages::HomePage;
use crate::result::HarnessResult;

/// Locators of the sign-in form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginLocators {
    /// Username field
    pub username: Locator,
    /// Password field
    pub password: Locator,
    /// Submit button
    pub sign_in: Locator,
}

impl Default for LoginLocators {
    fn default() -> Self {
        Self {
            username: Locator::xpath("//input[@name='username']"),
            password: Locator::xpath("//input[@name='password']"),
            sign_in: Locator::xpath("//button[@type='submit']"),
        }
    }
}

/// The sign-in form; initial state of every flow
#[derive(Debug, Clone)]
pub struct LoginPage<'s> {
    ctx: PageContext<'s>,
    locators: Arc<LoginLocators>,
}

impl<'s> LoginPage<'s> {
    /// Model the sign-in form, assuming the browser already shows it
    #[must_use]
    pub fn new(ctx: PageContext<'s>) -> Self {
        Self::with_locators(ctx, LoginLocators::default())
    }

    /// Model the sign-in form with custom locators
    #[must_use]
    pub fn with_locators(ctx: PageContext<'s>, locators: LoginLocators) -> Self {
        Self {
            ctx,
            locators: Arc::new(locators),
        }
    }

    /// Navigate the session to `url`, then model the sign-in form
    pub fn open(ctx: PageContext<'s>, url: &str) -> HarnessResult<Self> {
        ctx.session().navigate(url)?;
        Ok(Self::new(ctx))
    }

    /// Locators in use
    #[must_use]
    pub fn locators(&self) -> &LoginLocators {
        &self.locators
    }

    /// Append `username` to the username field
    pub fn enter_username(self, username: &str) -> HarnessResult<Self> {
        self.ctx.type_into(&self.locators.username, username)?;
        Ok(self)
    }

    /// Append `password` to the password field
    pub fn enter_password(self, password: &str) -> HarnessResult<Self> {
        self.ctx.type_into(&self.locators.password, password)?;
        Ok(self)
    }

    /// Submit once the button is clickable
    pub fn sign_in(self) -> HarnessResult<HomePage<'s>> {
        let _ = self
            .ctx
            .traverse(Self::STATE, Action::SignIn, &self.locators.sign_in)?;
        Ok(HomePage::new(self.ctx))
    }
}

impl<'s> PageObject<'s> for LoginPage<'s> {
    const STATE: PageState = PageState::Login;

    fn context(&self) -> &PageContext<'s> {
        &self.ctx
    }

    fn ready_marker(&self) -> &Locator {
        &self.locators.sign_in
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Fixtures;
    use crate::driver::Session;
    use crate::mock::{MockNode, MockSession};
    use crate::result::HarnessError;
    use crate::wait::Waiter;

    fn form(session: &MockSession) -> LoginLocators {
        let locators = LoginLocators::default();
        let _ = session.add(MockNode::new("input"), &[locators.username.clone()]);
        let _ = session.add(MockNode::new("input"), &[locators.password.clone()]);
        let _ = session.add(MockNode::new("button"), &[locators.sign_in.clone()]);
        locators
    }

    fn ctx(session: &MockSession) -> PageContext<'_> {
        PageContext::new(
            session,
            Waiter::new().with_clock(session.clock()),
            Fixtures::default(),
        )
    }

    #[test]
    fn test_chained_entry_types_into_fields() {
        let session = MockSession::new();
        let _ = form(&session);
        let page = LoginPage::new(ctx(&session))
            .enter_username("admin")
            .unwrap()
            .enter_password("secret")
            .unwrap();
        assert_eq!(page.page_name(), "login");
        assert!(session.was_called("send_keys:xpath=//input[@name='username']:admin"));
        assert!(session.was_called("send_keys:xpath=//input[@name='password']:secret"));
    }

    #[test]
    fn test_missing_field_fails_at_interaction() {
        let session = MockSession::new();
        let err = LoginPage::new(ctx(&session))
            .enter_username("admin")
            .unwrap_err();
        assert!(matches!(err, HarnessError::NoSuchElement { .. }));
    }

    #[test]
    fn test_open_navigates_first() {
        let session = MockSession::new();
        let page = LoginPage::open(ctx(&session), "http://localhost/admin/login").unwrap();
        assert_eq!(session.current_url().unwrap(), "http://localhost/admin/login");
        assert_eq!(page.locators(), &LoginLocators::default());
    }

    #[test]
    fn test_sign_in_times_out_on_disabled_button() {
        let session = MockSession::new();
        let locators = LoginLocators::default();
        let _ = session.add(MockNode::new("button").disabled(), &[locators.sign_in.clone()]);
        let err = LoginPage::new(ctx(&session)).sign_in().unwrap_err();
        assert!(err.is_timeout());
        assert!(!session.was_called("click:"));
    }

    #[test]
    fn test_wait_until_ready_uses_sign_in_button() {
        let session = MockSession::new();
        let _ = form(&session);
        let page = LoginPage::new(ctx(&session)).wait_until_ready().unwrap();
        assert_eq!(page.ready_marker(), &LoginLocators::default().sign_in);
    }
}
