//! Resilient navigation: load a page and wait for a marker, reloading on
//! timeout a bounded number of times.
//!
//! The retry loop is an explicit state machine rather than nested error
//! handlers, so the attempt counter and the two exhaustion outcomes are
//! visible in one place.

use crate::error::*;
use crate::selectors::Marker;
use crate::services::log;
use crate::session::PageSession;
use std::time::Duration;

/// What to do when the marker never appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnExhaust {
    /// Log and report `Ok(false)`; the caller skips this page.
    Skip,
    /// The marker is required for any further parsing; fail the run.
    Fail,
}

#[derive(Debug, Clone, Copy)]
enum NavState {
    Waiting { attempt: u32 },
    Retrying { attempt: u32 },
    Success,
    Exhausted,
}

#[derive(Debug, Clone, Copy)]
pub struct Navigator {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl Navigator {
    /// Load `url` and block until `marker` is present. Every retry reloads
    /// the page, so element handles obtained before the call went through
    /// must be re-queried by the caller.
    ///
    /// Returns `Ok(true)` on success and `Ok(false)` only for
    /// [`OnExhaust::Skip`] exhaustion.
    pub fn navigate_and_wait(
        &self,
        session: &mut dyn PageSession,
        url: &str,
        marker: &Marker,
        on_exhaust: OnExhaust,
    ) -> Result<bool> {
        session.navigate(url)?;
        let mut state = NavState::Waiting { attempt: 1 };
        loop {
            state = match state {
                NavState::Waiting { attempt } => {
                    if session.has(&marker.selector) {
                        NavState::Success
                    } else if attempt >= self.max_attempts {
                        NavState::Exhausted
                    } else {
                        NavState::Retrying { attempt }
                    }
                }
                NavState::Retrying { attempt } => {
                    log::info(
                        Some(url),
                        "wait_retry",
                        Some(&format!(
                            "{} missing (attempt {}/{})",
                            marker.name, attempt, self.max_attempts
                        )),
                    );
                    std::thread::sleep(self.retry_delay);
                    session.reload()?;
                    NavState::Waiting { attempt: attempt + 1 }
                }
                NavState::Success => return Ok(true),
                NavState::Exhausted => {
                    return match on_exhaust {
                        OnExhaust::Skip => {
                            log::error(
                                Some(url),
                                "wait_exhausted",
                                Some(&format!("{} never appeared, skipping", marker.name)),
                            );
                            Ok(false)
                        }
                        OnExhaust::Fail => Err(ScrapeError::Timeout {
                            url: url.to_string(),
                            marker: marker.name.to_string(),
                        }),
                    }
                }
            };
        }
    }
}
