//! Explicit waits.
//!
//! A [`Waiter`] polls a named predicate against a live [`Session`] until it
//! holds or the timeout elapses. Polling is the only retry mechanism in the
//! harness: nothing else re-attempts a failed operation.
//!
//! Polls happen at `0, p, 2p, ...` and a poll is only scheduled if it still
//! falls inside the timeout. The poll instants of a shorter timeout are
//! therefore a prefix of those of a longer one, so for a fixed predicate
//! trajectory shortening the timeout can turn a success into a timeout but
//! never the reverse.
//!
//! A timeout must be a whole number of poll intervals, so the last poll lands
//! exactly on the deadline. Misaligned timeouts are rejected up front rather
//! than silently cut short.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::driver::Session;
use crate::locator::Locator;
use crate::result::{HarnessError, HarnessResult};

/// Default timeout for explicit waits (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Predicate kinds understood by the wait engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    /// Present, displayed and enabled
    Clickable,
    /// Present, displayed and with a non-empty rendered box
    Visible,
    /// Attached to the DOM, visible or not
    Present,
    /// Checkbox, radio or option reports selected
    Selected,
    /// Rendered text contains an expected substring
    TextPresent,
    /// A native dialog is open
    AlertPresent,
}

impl ConditionKind {
    /// Name used in logs and error messages
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Clickable => "clickable",
            Self::Visible => "visible",
            Self::Present => "present",
            Self::Selected => "selected",
            Self::TextPresent => "text-present",
            Self::AlertPresent => "alert-present",
        }
    }

    /// Whether the predicate is evaluated against an element
    #[must_use]
    pub const fn requires_target(&self) -> bool {
        !matches!(self, Self::AlertPresent)
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wait predicate, carrying the expected text where one is needed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// Element is present, displayed and enabled
    Clickable,
    /// Element is displayed with non-zero size
    Visible,
    /// Element is attached to the DOM
    Present,
    /// Element reports selected state
    Selected,
    /// Element text contains the given substring
    TextPresent(String),
    /// A native dialog is open; any target is ignored
    AlertPresent,
}

impl WaitCondition {
    /// Create a text-present condition
    #[must_use]
    pub fn text_present(text: impl Into<String>) -> Self {
        Self::TextPresent(text.into())
    }

    /// Kind of this condition
    #[must_use]
    pub const fn kind(&self) -> ConditionKind {
        match self {
            Self::Clickable => ConditionKind::Clickable,
            Self::Visible => ConditionKind::Visible,
            Self::Present => ConditionKind::Present,
            Self::Selected => ConditionKind::Selected,
            Self::TextPresent(_) => ConditionKind::TextPresent,
            Self::AlertPresent => ConditionKind::AlertPresent,
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TextPresent(text) => write!(f, "text-present({text:?})"),
            other => f.write_str(other.kind().as_str()),
        }
    }
}

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration, never shorter than one millisecond
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Check that the interval is positive and divides the timeout
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] otherwise.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(HarnessError::config("poll interval must be positive"));
        }
        check_alignment(self.timeout(), self.poll_interval())
    }
}

fn check_alignment(timeout: Duration, interval: Duration) -> HarnessResult<()> {
    if timeout.as_nanos() % interval.as_nanos() == 0 {
        Ok(())
    } else {
        Err(HarnessError::config(format!(
            "timeout of {}ms is not a multiple of the {}ms poll interval",
            timeout.as_millis(),
            interval.as_millis()
        )))
    }
}

/// Result of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of predicate evaluations
    pub polls: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

/// Polls wait conditions against a session
#[derive(Debug, Clone)]
pub struct Waiter {
    options: WaitOptions,
    clock: Arc<dyn Clock>,
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Waiter {
    /// Create a waiter with default options and the system clock
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(WaitOptions::default())
    }

    /// Create with custom options and the system clock
    #[must_use]
    pub fn with_options(options: WaitOptions) -> Self {
        Self {
            options,
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Default options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Clock used for polling
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Wait for `condition` using the default timeout
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if the predicate is false at every
    /// poll, or any non-resolution driver error raised while polling.
    pub fn wait(
        &self,
        session: &dyn Session,
        condition: &WaitCondition,
        target: Option<&Locator>,
    ) -> HarnessResult<WaitResult> {
        self.wait_for(session, condition, target, self.options.timeout())
    }

    /// Wait for `condition` with a per-call timeout
    ///
    /// # Errors
    ///
    /// See [`Waiter::wait`]. An element condition without a target, or a
    /// timeout that is not a multiple of the poll interval, fails immediately
    /// with [`HarnessError::Config`].
    pub fn wait_for(
        &self,
        session: &dyn Session,
        condition: &WaitCondition,
        target: Option<&Locator>,
        timeout: Duration,
    ) -> HarnessResult<WaitResult> {
        let kind = condition.kind();
        if kind.requires_target() && target.is_none() {
            return Err(HarnessError::config(format!(
                "{condition} needs a target locator"
            )));
        }
        check_alignment(timeout, self.options.poll_interval())?;

        let waited_for = match target {
            Some(locator) if kind.requires_target() => format!("{condition} on {locator}"),
            _ => condition.to_string(),
        };

        match self.poll(timeout, || check_condition(session, condition, target)) {
            Ok((elapsed, polls)) => {
                debug!(
                    condition = %kind,
                    elapsed_ms = elapsed.as_millis() as u64,
                    polls,
                    "wait satisfied: {waited_for}"
                );
                Ok(WaitResult {
                    elapsed,
                    polls,
                    waited_for,
                })
            }
            Err(PollError::Failed(err)) => Err(err),
            Err(PollError::TimedOut(elapsed)) => {
                warn!(
                    condition = %kind,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "wait timed out: {waited_for}"
                );
                Err(HarnessError::Timeout {
                    condition: kind,
                    locator: target.filter(|_| kind.requires_target()).cloned(),
                    elapsed,
                })
            }
        }
    }

    fn poll<F>(&self, timeout: Duration, mut predicate: F) -> Result<(Duration, u32), PollError>
    where
        F: FnMut() -> HarnessResult<bool>,
    {
        let interval = self.options.poll_interval();
        let start = self.clock.now();
        let mut polls = 0_u32;

        loop {
            polls += 1;
            if predicate().map_err(PollError::Failed)? {
                return Ok((self.clock.now().saturating_sub(start), polls));
            }

            let elapsed = self.clock.now().saturating_sub(start);
            if elapsed + interval > timeout {
                return Err(PollError::TimedOut(elapsed));
            }
            self.clock.sleep(interval);
        }
    }
}

enum PollError {
    Failed(HarnessError),
    TimedOut(Duration),
}

/// Evaluate `condition` once against the live DOM.
///
/// A target that cannot be resolved, or that went stale between resolution
/// and query, counts as "not yet".
///
/// # Errors
///
/// Propagates driver errors other than `NoSuchElement` and `StaleReference`.
pub fn check_condition(
    session: &dyn Session,
    condition: &WaitCondition,
    target: Option<&Locator>,
) -> HarnessResult<bool> {
    let Some(locator) = target.filter(|_| condition.kind().requires_target()) else {
        return match condition {
            WaitCondition::AlertPresent => session.is_alert_present(),
            other => Err(HarnessError::config(format!(
                "{other} needs a target locator"
            ))),
        };
    };

    let outcome = session.find_element(locator).and_then(|handle| match condition {
        WaitCondition::Present => Ok(true),
        WaitCondition::Clickable => {
            Ok(session.is_displayed(&handle)? && session.is_enabled(&handle)?)
        }
        WaitCondition::Visible => {
            Ok(session.is_displayed(&handle)? && session.bounding_box(&handle)?.has_area())
        }
        WaitCondition::Selected => session.is_selected(&handle),
        WaitCondition::TextPresent(expected) => {
            Ok(session.text(&handle)?.contains(expected.as_str()))
        }
        WaitCondition::AlertPresent => session.is_alert_present(),
    });

    match outcome {
        Err(HarnessError::NoSuchElement { .. } | HarnessError::StaleReference { .. }) => Ok(false),
        other => other,
    }
}
