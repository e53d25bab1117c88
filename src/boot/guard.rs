//! At-most-once runtime start.

use std::cell::Cell;
use std::future::Future;

use tokio::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPhase {
    #[default]
    NotRequested,
    /// Start issued, outcome pending.
    Starting,
    Started,
    Failed,
}

impl StartPhase {
    pub const fn is_requested(self) -> bool {
        !matches!(self, Self::NotRequested)
    }
}

impl std::fmt::Display for StartPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NotRequested => "not requested",
            Self::Starting => "starting",
            Self::Started => "started",
            Self::Failed => "failed",
        })
    }
}

/// Runs a start operation at most once and caches its outcome.
///
/// Every caller after the first awaits the same in-flight start (or reads the
/// finished outcome); failures are cached too and never retried.
#[derive(Debug)]
pub struct StartGuard<E> {
    phase: Cell<StartPhase>,
    outcome: OnceCell<Result<(), E>>,
}

impl<E> Default for StartGuard<E> {
    fn default() -> Self {
        Self {
            phase: Cell::new(StartPhase::NotRequested),
            outcome: OnceCell::new(),
        }
    }
}

impl<E: Clone> StartGuard<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> StartPhase {
        self.phase.get()
    }

    pub fn is_started(&self) -> bool {
        self.phase.get() == StartPhase::Started
    }

    /// Start via `start` unless a start was already issued.
    pub async fn ensure<F, Fut>(&self, start: F) -> Result<(), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        self.outcome
            .get_or_init(move || async move {
                self.phase.set(StartPhase::Starting);
                let result = start().await;
                self.phase.set(if result.is_ok() {
                    StartPhase::Started
                } else {
                    StartPhase::Failed
                });
                result
            })
            .await
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_start() {
        let guard: StartGuard<String> = StartGuard::new();
        let starts = Cell::new(0);
        let counter = &starts;
        let start = move || async move {
            counter.set(counter.get() + 1);
            tokio::task::yield_now().await;
            Ok(())
        };

        let (a, b, c) = tokio::join!(guard.ensure(start), guard.ensure(start), guard.ensure(start));
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(starts.get(), 1);
        assert_eq!(guard.phase(), StartPhase::Started);
    }

    #[tokio::test]
    async fn test_failure_is_cached() {
        let guard: StartGuard<String> = StartGuard::new();
        let attempts = Cell::new(0);
        let counter = &attempts;

        let first = guard
            .ensure(move || async move {
                counter.set(counter.get() + 1);
                Err("boom".to_string())
            })
            .await;
        assert_eq!(first, Err("boom".to_string()));
        assert_eq!(guard.phase(), StartPhase::Failed);

        let second = guard
            .ensure(move || async move {
                counter.set(counter.get() + 1);
                Ok(())
            })
            .await;
        assert_eq!(second, Err("boom".to_string()));
        assert_eq!(attempts.get(), 1);
    }
}
