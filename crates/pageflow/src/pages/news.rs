//! News management.

use std::sync::Arc;

use crate::locator::Locator;
use crate::page_object::{Action, PageContext, PageObject, PageState};
use crate::pages::HomePage;
use crate::result::HarnessResult;
use crate::wait::WaitCondition;

/// Locators of the news screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsLocators {
    /// Opens the create form
    pub new_news: Locator,
    /// Body of a new entry
    pub news_text: Locator,
    /// Submits the create form
    pub save: Locator,
    /// Opens the search panel
    pub search_button: Locator,
    /// Search query field
    pub search_field: Locator,
    /// Runs the search
    pub search_news: Locator,
    /// Breadcrumb back to the dashboard
    pub home: Locator,
    /// Clears search and form state
    pub reset: Locator,
    /// Success banner
    pub alert: Locator,
}

impl Default for NewsLocators {
    fn default() -> Self {
        Self {
            new_news: Locator::xpath("//a[@class='btn btn-rounded btn-danger']"),
            news_text: Locator::xpath("//textarea[@id='news']"),
            save: Locator::xpath("//button[@type='submit']"),
            search_button: Locator::xpath("//a[@class='btn btn-rounded btn-primary']"),
            search_field: Locator::xpath("//input[@class='form-control']"),
            search_news: Locator::xpath("//button[@class='btn btn-danger btn-fix']"),
            home: Locator::xpath("//a[text()='Home']"),
            reset: Locator::xpath("//a[@class='btn btn-rounded btn-warning']"),
            alert: Locator::xpath("//div[@class='alert alert-success alert-dismissible']"),
        }
    }
}

/// News management screen.
///
/// Entry text and search query come from the configured fixtures.
#[derive(Debug, Clone)]
pub struct NewsPage<'s> {
    ctx: PageContext<'s>,
    locators: Arc<NewsLocators>,
}

impl<'s> NewsPage<'s> {
    /// News screen with the default locators
    #[must_use]
    pub fn new(ctx: PageContext<'s>) -> Self {
        Self::with_locators(ctx, NewsLocators::default())
    }

    /// News screen with custom locators
    #[must_use]
    pub fn with_locators(ctx: PageContext<'s>, locators: NewsLocators) -> Self {
        Self {
            ctx,
            locators: Arc::new(locators),
        }
    }

    /// Locators in use
    #[must_use]
    pub fn locators(&self) -> &NewsLocators {
        &self.locators
    }

    /// Open the create form
    pub fn new_news(self) -> HarnessResult<Self> {
        self.ctx.click(&self.locators.new_news, None)?;
        Ok(self)
    }

    /// Type the fixture entry text into the create form
    pub fn news_text(self) -> HarnessResult<Self> {
        self.ctx
            .type_into(&self.locators.news_text, &self.ctx.fixtures().news_text)?;
        Ok(self)
    }

    /// Submit the create form
    pub fn save_news(self) -> HarnessResult<Self> {
        self.ctx.click(&self.locators.save, None)?;
        Ok(self)
    }

    /// Open the search panel once its button is clickable
    pub fn search_button(self) -> HarnessResult<Self> {
        self.ctx
            .click(&self.locators.search_button, Some(&WaitCondition::Clickable))?;
        Ok(self)
    }

    /// Type the fixture query into the search field
    pub fn search_text(self) -> HarnessResult<Self> {
        self.ctx
            .type_into(&self.locators.search_field, &self.ctx.fixtures().search_text)?;
        Ok(self)
    }

    /// Run the search
    pub fn search_news(self) -> HarnessResult<Self> {
        self.ctx.click(&self.locators.search_news, None)?;
        Ok(self)
    }

    /// Clear search and form state
    pub fn reset_news(self) -> HarnessResult<Self> {
        self.ctx.click(&self.locators.reset, None)?;
        Ok(self)
    }

    /// Back to the dashboard
    pub fn return_to_home(self) -> HarnessResult<HomePage<'s>> {
        let _ = self
            .ctx
            .traverse(Self::STATE, Action::ReturnToHome, &self.locators.home)?;
        Ok(HomePage::new(self.ctx))
    }

    /// Whether the success banner is showing. Does not wait for it.
    pub fn is_alert_displayed(&self) -> HarnessResult<bool> {
        self.ctx.is_displayed(&self.locators.alert)
    }
}

impl<'s> PageObject<'s> for NewsPage<'s> {
    const STATE: PageState = PageState::News;

    fn context(&self) -> &PageContext<'s> {
        &self.ctx
    }

    fn ready_marker(&self) -> &Locator {
        &self.locators.new_news
    }
}
