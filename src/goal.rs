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
use crate::constraints::KinematicConstraintSet;
use crate::context::ContextShared;
use crate::sampling::ConstraintSampler;
use crate::space::State;
use crate::space_information::SpaceInformation;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalType {
    SampleableRegion,
    LazySamples,
}

/// A goal region installed on the problem definition
pub trait Goal: Send + Sync {
    fn has_type(&self, goal_type: GoalType) -> bool;
    fn is_satisfied(&self, state: &[f64]) -> bool;
    fn as_sampleable(&self) -> Option<&dyn GoalSampleableRegion> {
        None
    }
    fn as_lazy(&self) -> Option<&GoalLazySamples> {
        None
    }
}

/// A goal region that can produce candidate states on demand
pub trait GoalSampleableRegion: Goal {
    fn sample_goal(&self, state: &mut State) -> bool;
    fn max_sample_count(&self) -> usize;
    fn can_sample(&self) -> bool {
        self.max_sample_count() > 0
    }
}

/// Samples goal states from one constraint set
///
/// A drawn state counts only if the merged constraints accept it and the
/// validity checker passes.
pub struct ConstrainedGoalSampler {
    si: Arc<SpaceInformation>,
    shared: Arc<ContextShared>,
    constraints: Arc<KinematicConstraintSet>,
    sampler: Arc<dyn ConstraintSampler>,
}

impl ConstrainedGoalSampler {
    pub(crate) fn new(
        si: Arc<SpaceInformation>,
        shared: Arc<ContextShared>,
        constraints: Arc<KinematicConstraintSet>,
        sampler: Arc<dyn ConstraintSampler>,
    ) -> Self {
        ConstrainedGoalSampler {
            si,
            shared,
            constraints,
            sampler,
        }
    }
}

impl Goal for ConstrainedGoalSampler {
    fn has_type(&self, goal_type: GoalType) -> bool {
        goal_type == GoalType::SampleableRegion
    }

    fn is_satisfied(&self, state: &[f64]) -> bool {
        self.constraints.decide(&self.shared.full_state_from(state))
    }

    fn as_sampleable(&self) -> Option<&dyn GoalSampleableRegion> {
        Some(self)
    }
}

impl GoalSampleableRegion for ConstrainedGoalSampler {
    fn sample_goal(&self, state: &mut State) -> bool {
        let limits = self.shared.limits();
        for _ in 0..limits.max_goal_sampling_attempts {
            if !self.sampler.sample(state, limits.max_state_sampling_attempts) {
                continue;
            }
            let full = self.shared.full_state_from(state);
            if self.constraints.decide(&full) && self.si.is_valid(state) {
                return true;
            }
        }
        false
    }

    fn max_sample_count(&self) -> usize {
        self.shared.limits().max_goal_samples
    }
}

/// Goal composed from one or more constrained samplers
///
/// With a single child no multiplexing happens; with several, each sample
/// request picks one child uniformly at random and delegates.
pub enum GoalRegion {
    Single(Arc<ConstrainedGoalSampler>),
    Mux(Vec<Arc<ConstrainedGoalSampler>>),
}

impl Goal for GoalRegion {
    fn has_type(&self, goal_type: GoalType) -> bool {
        goal_type == GoalType::SampleableRegion
    }

    fn is_satisfied(&self, state: &[f64]) -> bool {
        match self {
            GoalRegion::Single(child) => child.is_satisfied(state),
            GoalRegion::Mux(children) => children.iter().any(|c| c.is_satisfied(state)),
        }
    }

    fn as_sampleable(&self) -> Option<&dyn GoalSampleableRegion> {
        Some(self)
    }
}

impl GoalSampleableRegion for GoalRegion {
    fn sample_goal(&self, state: &mut State) -> bool {
        match self {
            GoalRegion::Single(child) => child.sample_goal(state),
            GoalRegion::Mux(children) => {
                let pick = rand::thread_rng().gen_range(0..children.len());
                children[pick].sample_goal(state)
            }
        }
    }

    fn max_sample_count(&self) -> usize {
        match self {
            GoalRegion::Single(child) => child.max_sample_count(),
            GoalRegion::Mux(children) => children.iter().map(|c| c.max_sample_count()).sum(),
        }
    }

    fn can_sample(&self) -> bool {
        match self {
            GoalRegion::Single(child) => child.can_sample(),
            GoalRegion::Mux(children) => children.iter().any(|c| c.can_sample()),
        }
    }
}

type GoalSamplingFn = Box<dyn Fn(&mut State) -> bool + Send + Sync>;

/// Goal region fed by a background sampling thread
///
/// `pre_solve` starts the thread and `post_solve` stops it; states gathered
/// so far are served round-robin.
pub struct GoalLazySamples {
    si: Arc<SpaceInformation>,
    inner: Arc<LazyShared>,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
}

struct LazyShared {
    states: Mutex<Vec<State>>,
    running: AtomicBool,
    next: AtomicUsize,
    sampler: GoalSamplingFn,
    max_samples: usize,
}

impl GoalLazySamples {
    pub fn new(si: Arc<SpaceInformation>, sampler: GoalSamplingFn, max_samples: usize) -> Self {
        GoalLazySamples {
            si,
            inner: Arc::new(LazyShared {
                states: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
                next: AtomicUsize::new(0),
                sampler,
                max_samples,
            }),
            thread: Mutex::new(None),
        }
    }

    pub fn start_sampling(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let inner = self.inner.clone();
        let handle = thread::spawn(move || {
            while inner.running.load(Ordering::SeqCst) {
                if inner.states.lock().unwrap().len() >= inner.max_samples {
                    break;
                }
                let mut state = Vec::new();
                if (inner.sampler)(&mut state) {
                    inner.states.lock().unwrap().push(state);
                } else {
                    thread::yield_now();
                }
            }
        });
        *self.thread.lock().unwrap() = Some(handle);
    }

    pub fn stop_sampling(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    pub fn is_sampling(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    pub fn samples_gathered(&self) -> usize {
        self.inner.states.lock().unwrap().len()
    }
}

impl Drop for GoalLazySamples {
    fn drop(&mut self) {
        self.stop_sampling();
    }
}

impl Goal for GoalLazySamples {
    fn has_type(&self, goal_type: GoalType) -> bool {
        matches!(goal_type, GoalType::SampleableRegion | GoalType::LazySamples)
    }

    fn is_satisfied(&self, state: &[f64]) -> bool {
        let states = self.inner.states.lock().unwrap();
        states
            .iter()
            .any(|s| self.si.space().distance(s, state) < 1e-6)
    }

    fn as_sampleable(&self) -> Option<&dyn GoalSampleableRegion> {
        Some(self)
    }

    fn as_lazy(&self) -> Option<&GoalLazySamples> {
        Some(self)
    }
}

impl GoalSampleableRegion for GoalLazySamples {
    fn sample_goal(&self, state: &mut State) -> bool {
        let states = self.inner.states.lock().unwrap();
        if states.is_empty() {
            return false;
        }
        let index = self.inner.next.fetch_add(1, Ordering::Relaxed) % states.len();
        *state = states[index].clone();
        true
    }

    fn max_sample_count(&self) -> usize {
        if self.is_sampling() {
            self.inner.max_samples
        } else {
            self.samples_gathered()
        }
    }

    fn can_sample(&self) -> bool {
        self.is_sampling() || self.samples_gathered() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::JointStateSpace;
    use crate::testing::planar_arm;
    use std::time::Duration;

    #[test]
    fn lazy_goal_gathers_in_background() {
        let model = Arc::new(planar_arm("arm", 2));
        let space = Arc::new(JointStateSpace::whole_body(model, "arm"));
        let si = Arc::new(SpaceInformation::new(space));
        si.setup();
        let goal = GoalLazySamples::new(
            si,
            Box::new(|state: &mut State| {
                *state = vec![1.0, 1.0];
                true
            }),
            8,
        );
        assert!(!goal.can_sample());
        goal.start_sampling();
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while goal.samples_gathered() == 0 && std::time::Instant::now() < deadline {
            thread::yield_now();
        }
        goal.stop_sampling();
        assert!(goal.samples_gathered() > 0);
        assert!(!goal.is_sampling());
        let mut state = Vec::new();
        assert!(goal.sample_goal(&mut state));
        assert_eq!(state, vec![1.0, 1.0]);
        assert!(goal.is_satisfied(&[1.0, 1.0]));
        assert!(!goal.is_satisfied(&[0.0, 0.0]));
    }
}
