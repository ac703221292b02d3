//! Auto-tick scheduler.
//!
//! Fires at a fixed period but reports the *measured* wall time between
//! fires, read from the monotonic clock, so the simulation advances by real
//! elapsed time and scheduler jitter never compresses or stretches it.
//! Failures inside a tick are the domain's problem (it logs and keeps going);
//! the ticker itself only stops when the domain has gone away.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::domain::GameHandle;

/// Spawn the ticker task. It runs until the serialization domain shuts down.
pub fn spawn(period_ms: u64, handle: GameHandle) -> JoinHandle<()> {
    let period = Duration::from_millis(period_ms.max(1));
    tokio::spawn(async move {
        let mut last = Instant::now();
        loop {
            tokio::time::sleep(period).await;
            let now = Instant::now();
            let delta_ms = now.duration_since(last).as_millis() as u64;
            last = now;
            if handle.auto_tick(delta_ms).await.is_err() {
                tracing::debug!("domain closed, ticker stopping");
                break;
            }
        }
    })
}
