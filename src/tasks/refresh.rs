//! Credential Refresh Task
//!
//! Background task that keeps the WeChat credentials fresh: the access
//! token first, then the ticket derived from it, each retried a bounded
//! number of times per cycle. Cycles are strictly sequential, so a slow
//! cycle delays the next one instead of overlapping it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::wx::WxJsSdk;

/// Extra attempts after the first failed one, per step and cycle
const MAX_EXTRA_ATTEMPTS: u32 = 3;

/// Repeats `attempt` until it reports success, allowing up to
/// `max_extra_attempts` additional tries. Returns whether any attempt
/// succeeded.
async fn retry<F, Fut>(mut attempt: F, max_extra_attempts: u32) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..=max_extra_attempts {
        if attempt().await {
            return true;
        }
    }
    false
}

/// Runs one refresh cycle: the access token, then the dependent ticket.
///
/// An exhausted token step does not skip the ticket step; without a usable
/// token the ticket attempts fail on their own and the next cycle starts
/// over from the token.
pub async fn run_refresh(sdk: &WxJsSdk) {
    if retry(|| sdk.refresh_access_token(), MAX_EXTRA_ATTEMPTS).await {
        debug!("access token refreshed");
    } else {
        warn!(
            attempts = MAX_EXTRA_ATTEMPTS + 1,
            "access token refresh exhausted its attempts"
        );
    }

    if retry(|| sdk.refresh_jsapi_ticket(), MAX_EXTRA_ATTEMPTS).await {
        debug!("jsapi ticket refreshed");
    } else {
        warn!(
            attempts = MAX_EXTRA_ATTEMPTS + 1,
            "jsapi ticket refresh exhausted its attempts"
        );
    }
}

/// Spawns the periodic credential refresh task.
///
/// The first cycle runs immediately; afterwards the task sleeps for the
/// configured interval between cycles.
///
/// # Arguments
/// * `sdk` - Shared JS-SDK instance whose credentials are kept fresh
/// * `refresh_interval_secs` - Interval in seconds between refresh cycles
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_refresh_task(sdk: Arc<WxJsSdk>, refresh_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(refresh_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting credential refresh task with interval of {} seconds",
            refresh_interval_secs
        );

        loop {
            run_refresh(&sdk).await;
            tokio::time::sleep(interval).await;
        }
    })
}
