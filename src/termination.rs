/*
Copyright 2017 Takashi Ogura

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellable termination signal polled by planners
///
/// Cloning shares the underlying flag, so a handle kept by the caller can
/// cancel a solve running on another thread.
#[derive(Clone)]
pub struct PlannerTerminationCondition {
    inner: Arc<Inner>,
}

struct Inner {
    terminated: AtomicBool,
    deadline: Option<Instant>,
}

impl PlannerTerminationCondition {
    /// Condition that only fires when `terminate` is called
    pub fn manual() -> Self {
        PlannerTerminationCondition {
            inner: Arc::new(Inner {
                terminated: AtomicBool::new(false),
                deadline: None,
            }),
        }
    }

    /// Condition that fires after `duration`, or when `terminate` is called
    pub fn timed(duration: Duration) -> Self {
        PlannerTerminationCondition {
            inner: Arc::new(Inner {
                terminated: AtomicBool::new(false),
                deadline: Some(Instant::now() + duration),
            }),
        }
    }

    /// Condition that fires `seconds` from now; non-positive values fire
    /// immediately
    pub fn timed_seconds(seconds: f64) -> Self {
        if seconds <= 0.0 {
            let ptc = Self::manual();
            ptc.terminate();
            ptc
        } else {
            Self::timed(Duration::from_secs_f64(seconds))
        }
    }

    pub fn terminate(&self) {
        self.inner.terminated.store(true, Ordering::SeqCst);
    }

    /// True once the condition has fired
    pub fn eval(&self) -> bool {
        if self.inner.terminated.load(Ordering::SeqCst) {
            return true;
        }
        match self.inner.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn manual_fires_only_on_terminate() {
        let ptc = PlannerTerminationCondition::manual();
        assert!(!ptc.eval());
        ptc.terminate();
        assert!(ptc.eval());
    }

    #[test]
    fn timed_fires_after_deadline() {
        let ptc = PlannerTerminationCondition::timed(Duration::from_millis(20));
        assert!(!ptc.eval());
        thread::sleep(Duration::from_millis(30));
        assert!(ptc.eval());
    }

    #[test]
    fn clones_share_the_flag() {
        let ptc = PlannerTerminationCondition::manual();
        let other = ptc.clone();
        let handle = thread::spawn(move || other.terminate());
        handle.join().unwrap();
        assert!(ptc.eval());
    }

    #[test]
    fn expired_timeout_fires_immediately() {
        assert!(PlannerTerminationCondition::timed_seconds(-1.0).eval());
        assert!(PlannerTerminationCondition::timed_seconds(0.0).eval());
    }
}
