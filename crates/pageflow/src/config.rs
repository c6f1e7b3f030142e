//! Harness configuration.
//!
//! Everything the core treats as externally supplied lives here: the
//! default wait timeout, the polling interval, fixture data typed into the
//! forms, and browser launch settings. Values load from YAML; every field is
//! optional and falls back to its default.
//!
//! ```yaml
//! wait:
//!   timeout_ms: 5000
//!   poll_interval_ms: 50
//! fixtures:
//!   admin_user_type: Admin
//!   news_text: Breaking
//!   search_text: Breaking
//! browser:
//!   headless: true
//! base_url: https://groceryapp.uniqassosiates.com/admin/login
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::result::{HarnessError, HarnessResult};
use crate::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};

/// Wait engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    /// Default timeout for explicit waits
    pub timeout_ms: u64,
    /// Interval between predicate polls
    pub poll_interval_ms: u64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl From<WaitSettings> for WaitOptions {
    fn from(settings: WaitSettings) -> Self {
        Self::new()
            .with_timeout(settings.timeout_ms)
            .with_poll_interval(settings.poll_interval_ms)
    }
}

/// Test data typed into forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    /// Visible text of the user-type option chosen when creating an admin
    pub admin_user_type: String,
    /// Body typed into a new news entry
    pub news_text: String,
    /// Query typed into the news search field
    pub search_text: String,
}

impl Default for Fixtures {
    fn default() -> Self {
        Self {
            admin_user_type: "Admin".to_string(),
            news_text: "Breaking".to_string(),
            search_text: "Breaking".to_string(),
        }
    }
}

/// Browser launch settings, used by the `browser` feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a visible window
    pub headless: bool,
    /// Explicit Chromium binary; auto-detected when absent
    pub chromium_path: Option<PathBuf>,
    /// Keep the Chromium sandbox enabled
    pub sandbox: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            sandbox: true,
        }
    }
}

/// Complete harness configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Wait engine settings
    pub wait: WaitSettings,
    /// Fixture data
    pub fixtures: Fixtures,
    /// Browser launch settings
    pub browser: BrowserSettings,
    /// Login page URL
    pub base_url: Option<String>,
}

impl HarnessConfig {
    /// Create a configuration with all defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> HarnessResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> HarnessResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> HarnessResult<()> {
        if self.wait.poll_interval_ms == 0 {
            return Err(HarnessError::config("wait.poll_interval_ms must be positive"));
        }
        self.wait_options().validate()?;
        if self.fixtures.admin_user_type.trim().is_empty() {
            return Err(HarnessError::config("fixtures.admin_user_type must not be empty"));
        }
        if let Some(url) = &self.base_url {
            if url.trim().is_empty() {
                return Err(HarnessError::config("base_url must not be empty when set"));
            }
        }
        Ok(())
    }

    /// Wait options derived from these settings
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        self.wait.into()
    }

    /// Set the default wait timeout
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.wait.timeout_ms = timeout_ms;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.wait.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Replace fixture data
    #[must_use]
    pub fn with_fixtures(mut self, fixtures: Fixtures) -> Self {
        self.fixtures = fixtures;
        self
    }

    /// Set the login page URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Run the browser with a visible window
    #[must_use]
    pub const fn headed(mut self) -> Self {
        self.browser.headless = false;
        self
    }
}
