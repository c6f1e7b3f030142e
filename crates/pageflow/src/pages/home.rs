//! Dashboard shown after sign-in.

use std::sync::Arc;

use crate::locator::Locator;
use crate::page_object::{Action, PageContext, PageObject, PageState};
use crate::pages::{AdminPage, LoginPage, NewsPage};
use crate::result::HarnessResult;

/// Locators of the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLocators {
    /// Header menu toggle
    pub admin_button: Locator,
    /// Sign-out icon
    pub log_out: Locator,
    /// "More info" footer of the admin users tile
    pub admin_info: Locator,
    /// "More info" footer of the news tile
    pub manage_news: Locator,
    /// Rendered once the signed-in layout is up
    pub ready: Locator,
}

impl Default for HomeLocators {
    fn default() -> Self {
        Self {
            admin_button: Locator::xpath("//a[@data-toggle='dropdown']"),
            log_out: Locator::xpath("//i[@class='ace-icon fa fa-power-off']"),
            admin_info: Locator::xpath(
                "//a[contains(@href,'/admin/list-admin') and @class='small-box-footer']",
            ),
            manage_news: Locator::xpath(
                "//a[contains(@href,'/admin/list-news') and @class='small-box-footer']",
            ),
            ready: Locator::css("a i.fa-power-off"),
        }
    }
}

/// The signed-in dashboard
#[derive(Debug, Clone)]
pub struct HomePage<'s> {
    ctx: PageContext<'s>,
    locators: Arc<HomeLocators>,
}

impl<'s> HomePage<'s> {
    /// Dashboard with the default locators
    #[must_use]
    pub fn new(ctx: PageContext<'s>) -> Self {
        Self::with_locators(ctx, HomeLocators::default())
    }

    /// Dashboard with custom locators
    #[must_use]
    pub fn with_locators(ctx: PageContext<'s>, locators: HomeLocators) -> Self {
        Self {
            ctx,
            locators: Arc::new(locators),
        }
    }

    /// Locators in use
    #[must_use]
    pub fn locators(&self) -> &HomeLocators {
        &self.locators
    }

    /// Open admin management from the header menu
    pub fn admin_button(self) -> HarnessResult<AdminPage<'s>> {
        let _ = self
            .ctx
            .traverse(Self::STATE, Action::AdminButton, &self.locators.admin_button)?;
        Ok(AdminPage::new(self.ctx))
    }

    /// Open admin management from its tile
    pub fn admin_info(self) -> HarnessResult<AdminPage<'s>> {
        let _ = self
            .ctx
            .traverse(Self::STATE, Action::AdminInfo, &self.locators.admin_info)?;
        Ok(AdminPage::new(self.ctx))
    }

    /// Open news management from its tile
    pub fn manage_news(self) -> HarnessResult<NewsPage<'s>> {
        let _ = self
            .ctx
            .traverse(Self::STATE, Action::ManageNews, &self.locators.manage_news)?;
        Ok(NewsPage::new(self.ctx))
    }

    /// Sign out
    pub fn log_out(self) -> HarnessResult<LoginPage<'s>> {
        let _ = self
            .ctx
            .traverse(Self::STATE, Action::LogOut, &self.locators.log_out)?;
        Ok(LoginPage::new(self.ctx))
    }
}

impl<'s> PageObject<'s> for HomePage<'s> {
    const STATE: PageState = PageState::Home;

    fn context(&self) -> &PageContext<'s> {
        &self.ctx
    }

    fn ready_marker(&self) -> &Locator {
        &self.locators.ready
    }
}
