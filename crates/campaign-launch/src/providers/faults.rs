use std::sync::atomic::{AtomicU32, Ordering};

const ALWAYS: u32 = u32::MAX;

/// Failure injection for an in-memory collaborator operation.
#[derive(Debug, Default)]
pub struct FaultPlan {
    remaining: AtomicU32,
}

impl FaultPlan {
    /// Fail every call from now on.
    pub fn fail_always(&self) {
        self.remaining.store(ALWAYS, Ordering::SeqCst);
    }

    /// Fail the next `times` calls, then succeed.
    pub fn fail_times(&self, times: u32) {
        self.remaining.store(times.min(ALWAYS - 1), Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.remaining.store(0, Ordering::SeqCst);
    }

    /// Consume one planned failure, if any.
    pub(crate) fn should_fail(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                match remaining {
                    0 => None,
                    ALWAYS => Some(ALWAYS),
                    n => Some(n - 1),
                }
            })
            .is_ok()
    }
}
