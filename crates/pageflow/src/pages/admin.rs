//! Admin user management.

use std::sync::Arc;

use crate::interaction;
use crate::locator::Locator;
use crate::page_object::{PageContext, PageObject, PageState};
use crate::result::HarnessResult;
use crate::wait::WaitCondition;

/// Locators of the admin user screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminLocators {
    /// Opens the create form
    pub new_admin: Locator,
    /// Username field of the create form
    pub username: Locator,
    /// Password field of the create form
    pub password: Locator,
    /// User type `<select>`
    pub user_type: Locator,
    /// Submits the create form
    pub save: Locator,
    /// Success banner
    pub alert: Locator,
}

impl Default for AdminLocators {
    fn default() -> Self {
        Self {
            new_admin: Locator::xpath("//a[@class='btn btn-rounded btn-danger']"),
            username: Locator::xpath(
                "//input[@type='text' and @class='form-control' and @id='username']",
            ),
            password: Locator::xpath(
                "//input[@type='password' and @class='form-control' and @id='password']",
            ),
            user_type: Locator::xpath("//select[@class='form-control' and @id='user_type']"),
            save: Locator::xpath(
                "//button[@type='submit' and @class='btn btn-block-sm btn-danger' and @name='Create']",
            ),
            alert: Locator::xpath("//div[@class='alert alert-success alert-dismissible']"),
        }
    }
}

/// Admin user management screen
#[derive(Debug, Clone)]
pub struct AdminPage<'s> {
    ctx: PageContext<'s>,
    locators: Arc<AdminLocators>,
}

impl<'s> AdminPage<'s> {
    /// Admin screen with the default locators
    #[must_use]
    pub fn new(ctx: PageContext<'s>) -> Self {
        Self::with_locators(ctx, AdminLocators::default())
    }

    /// Admin screen with custom locators
    #[must_use]
    pub fn with_locators(ctx: PageContext<'s>, locators: AdminLocators) -> Self {
        Self {
            ctx,
            locators: Arc::new(locators),
        }
    }

    /// Locators in use
    #[must_use]
    pub fn locators(&self) -> &AdminLocators {
        &self.locators
    }

    /// Open the create form once its button is clickable
    pub fn new_admin(self) -> HarnessResult<Self> {
        self.ctx
            .click(&self.locators.new_admin, Some(&WaitCondition::Clickable))?;
        Ok(self)
    }

    /// Append `username` to the create form's username field
    pub fn admin_username(self, username: &str) -> HarnessResult<Self> {
        self.ctx.type_into(&self.locators.username, username)?;
        Ok(self)
    }

    /// Append `password` to the create form's password field
    pub fn admin_password(self, password: &str) -> HarnessResult<Self> {
        self.ctx.type_into(&self.locators.password, password)?;
        Ok(self)
    }

    /// Choose the configured user type
    pub fn admin_dropdown(self) -> HarnessResult<Self> {
        let handle = self.ctx.resolve(&self.locators.user_type)?;
        interaction::select_by_visible_text(
            self.ctx.session(),
            &handle,
            &self.ctx.fixtures().admin_user_type,
        )?;
        Ok(self)
    }

    /// Submit the create form
    pub fn admin_save(self) -> HarnessResult<Self> {
        self.ctx.click(&self.locators.save, None)?;
        Ok(self)
    }

    /// Whether the success banner is showing. Does not wait for it.
    pub fn is_alert_displayed(&self) -> HarnessResult<bool> {
        self.ctx.is_displayed(&self.locators.alert)
    }
}

impl<'s> PageObject<'s> for AdminPage<'s> {
    const STATE: PageState = PageState::Admin;

    fn context(&self) -> &PageContext<'s> {
        &self.ctx
    }

    fn ready_marker(&self) -> &Locator {
        &self.locators.new_admin
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Fixtures;
    use crate::mock::{MockNode, MockSession, NodeChange, Reaction};
    use crate::result::HarnessError;
    use crate::wait::Waiter;
    use std::time::Duration;

    fn ctx(session: &MockSession, fixtures: Fixtures) -> PageContext<'_> {
        PageContext::new(session, Waiter::new().with_clock(session.clock()), fixtures)
    }

    fn user_type(session: &MockSession, locators: &AdminLocators) -> crate::mock::NodeId {
        let select = session.add(MockNode::new("select"), &[locators.user_type.clone()]);
        let option = Locator::css("option");
        let _ = session.add_child(select, MockNode::new("option").with_text("Staff"), &[option.clone()]);
        session.add_child(select, MockNode::new("option").with_text("Admin"), &[option])
    }

    #[test]
    fn test_dropdown_uses_fixture_text() {
        let session = MockSession::new();
        let locators = AdminLocators::default();
        let admin = user_type(&session, &locators);
        let _ = AdminPage::new(ctx(&session, Fixtures::default()))
            .admin_dropdown()
            .unwrap();
        assert!(session.is_node_selected(admin));
    }

    #[test]
    fn test_dropdown_with_closed_options() {
        let session = MockSession::new();
        let locators = AdminLocators::default();
        let select = session.add(MockNode::new("select"), &[locators.user_type.clone()]);
        let option = Locator::css("option");
        let _ = session.add_child(
            select,
            MockNode::new("option").with_text("Staff").selected(true).hidden(),
            &[option.clone()],
        );
        let admin = session.add_child(
            select,
            MockNode::new("option").with_text("Admin").hidden(),
            &[option],
        );

        let _ = AdminPage::new(ctx(&session, Fixtures::default()))
            .admin_dropdown()
            .unwrap();
        assert!(session.is_node_selected(admin));
    }

    #[test]
    fn test_dropdown_unknown_fixture() {
        let session = MockSession::new();
        let locators = AdminLocators::default();
        let _ = user_type(&session, &locators);
        let fixtures = Fixtures {
            admin_user_type: "Superuser".to_string(),
            ..Fixtures::default()
        };
        let err = AdminPage::new(ctx(&session, fixtures))
            .admin_dropdown()
            .unwrap_err();
        assert!(matches!(err, HarnessError::OptionNotFound { .. }));
    }

    #[test]
    fn test_alert_query_does_not_wait() {
        let session = MockSession::new();
        let locators = AdminLocators::default();
        let save = session.add(MockNode::new("button"), &[locators.save.clone()]);
        let banner = session.add(MockNode::new("div").detached(), &[locators.alert.clone()]);
        session.on_click(
            save,
            Reaction::After(Duration::from_millis(200), vec![banner], NodeChange::Attached(true)),
        );

        let page = AdminPage::new(ctx(&session, Fixtures::default()))
            .admin_save()
            .unwrap();
        assert!(!page.is_alert_displayed().unwrap());
        assert_eq!(session.clock().now_ms(), 0);

        session.clock().advance(Duration::from_millis(200));
        assert!(page.is_alert_displayed().unwrap());
    }

    #[test]
    fn test_hidden_banner_reads_false() {
        let session = MockSession::new();
        let locators = AdminLocators::default();
        let _ = session.add(MockNode::new("div").hidden(), &[locators.alert.clone()]);
        let page = AdminPage::new(ctx(&session, Fixtures::default()));
        assert!(!page.is_alert_displayed().unwrap());
    }

    #[test]
    fn test_save_before_form_exists_fails() {
        let session = MockSession::new();
        let err = AdminPage::new(ctx(&session, Fixtures::default()))
            .admin_save()
            .unwrap_err();
        assert!(matches!(err, HarnessError::NoSuchElement { .. }));
    }
}
