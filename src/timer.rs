//! src/timer.rs
//!
//! One-shot timers backed by local tokio tasks.

use std::time::Duration;

use tokio::task::AbortHandle;

/// Handle to a pending one-shot callback. Cancelling aborts the sleeping task.
///
/// Dropping a `Timer` does not cancel it; callers clear timers explicitly, the
/// way `clearTimeout` works, so a callback can take its own slot without
/// aborting itself.
#[derive(Debug)]
pub struct Timer {
    handle: AbortHandle,
}

impl Timer {
    /// Run `f` once after `delay`. Must be called from inside a `LocalSet`.
    pub fn after<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        let task = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            f();
        });
        Self {
            handle: task.abort_handle(),
        }
    }

    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Clear the timer held in `slot`, if any.
pub fn clear(slot: &mut Option<Timer>) {
    if let Some(timer) = slot.take() {
        timer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use tokio::task::LocalSet;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_once_unless_cancelled() {
        LocalSet::new()
            .run_until(async {
                let fired = Rc::new(Cell::new(0));

                let f = fired.clone();
                let _kept = Timer::after(Duration::from_millis(100), move || f.set(f.get() + 1));
                let f = fired.clone();
                let cancelled = Timer::after(Duration::from_millis(50), move || f.set(f.get() + 10));
                cancelled.cancel();

                tokio::time::sleep(Duration::from_millis(500)).await;
                assert_eq!(fired.get(), 1);
            })
            .await;
    }
}
