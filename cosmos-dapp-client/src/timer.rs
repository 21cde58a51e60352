use std::sync::{Arc, Mutex, PoisonError};

use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::debug;

use crate::definitions::COUNTDOWN_TICK;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Seconds left before the action may be retried
    Tick(u64),
    Completed,
}

/// Countdown started from a `RateLimited` broadcast result.
pub struct RateLimitTimer;

impl RateLimitTimer {
    /// Emits `Tick(seconds)` right away, then one tick per second down to
    /// `Tick(0)`, followed by `Completed`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(seconds: u64, on_event: F) -> CountdownHandle
    where
        F: Fn(CountdownEvent) + Send + Sync + 'static,
    {
        let active = Arc::new(Mutex::new(true));

        let emit = {
            let active = active.clone();
            move |event: CountdownEvent| -> bool {
                let mut active = active.lock().unwrap_or_else(PoisonError::into_inner);
                if !*active {
                    return false;
                }
                if event == CountdownEvent::Completed {
                    *active = false;
                }
                on_event(event);
                true
            }
        };

        let task = tokio::spawn(async move {
            let mut ticker = interval(COUNTDOWN_TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            ticker.tick().await;
            if !emit(CountdownEvent::Tick(seconds)) {
                return;
            }

            let mut remaining = seconds;
            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                if !emit(CountdownEvent::Tick(remaining)) {
                    return;
                }
            }

            emit(CountdownEvent::Completed);
        });

        debug!(seconds, "Rate limit countdown started");

        CountdownHandle { active, task }
    }
}

/// Owner side of a running countdown. Dropping the handle cancels it.
#[derive(Debug)]
pub struct CountdownHandle {
    active: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    /// Stops the countdown. No event is delivered once this returns.
    pub fn cancel(&self) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// `3725` renders as `"1h 2m 5s"`, leading zero units are dropped.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
