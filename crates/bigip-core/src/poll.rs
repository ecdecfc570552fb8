// ── Bounded confirmation polling ──
//
// Fixed-interval re-checks against a deadline. Used after mutations the
// device applies asynchronously (license reload, shell change). Uses
// `tokio::time` so tests can run on paused time.

use std::future::Future;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::error::CoreError;

/// How a polling loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PollStatus {
    /// The condition held.
    Confirmed,
    /// The deadline passed with the condition unmet.
    TimedOut,
    /// The deadline passed and the last check errored.
    Failed { error: String },
}

/// Result of one polling loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollOutcome {
    #[serde(flatten)]
    pub status: PollStatus,
    pub attempts: u32,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
}

impl PollOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self.status, PollStatus::Confirmed)
    }

    /// One-line summary for warnings.
    pub fn describe(&self) -> String {
        let secs = self.elapsed.as_secs();
        match &self.status {
            PollStatus::Confirmed => format!("confirmed after {} attempt(s)", self.attempts),
            PollStatus::TimedOut => {
                format!("not confirmed after {} attempt(s) in {secs}s", self.attempts)
            }
            PollStatus::Failed { error } => {
                format!("failed after {} attempt(s) in {secs}s: {error}", self.attempts)
            }
        }
    }
}

fn as_secs<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

/// Run `check` every `interval` until it returns `Ok(true)` or `timeout`
/// elapses.
///
/// The first check runs immediately. Errors don't stop the loop; if the
/// final check errored the outcome is `Failed` with that error.
pub async fn poll_until<F, Fut>(interval: Duration, timeout: Duration, mut check: F) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, CoreError>>,
{
    let started = Instant::now();
    let deadline = started + timeout;
    let mut attempts = 0;

    loop {
        attempts += 1;
        let last_error = match check().await {
            Ok(true) => {
                return PollOutcome {
                    status: PollStatus::Confirmed,
                    attempts,
                    elapsed: started.elapsed(),
                };
            }
            Ok(false) => None,
            Err(e) => {
                debug!(attempt = attempts, error = %e, "poll check failed");
                Some(e.to_string())
            }
        };

        if Instant::now() + interval > deadline {
            let status = match last_error {
                Some(error) => PollStatus::Failed { error },
                None => PollStatus::TimedOut,
            };
            return PollOutcome {
                status,
                attempts,
                elapsed: started.elapsed(),
            };
        }
        sleep(interval).await;
    }
}
