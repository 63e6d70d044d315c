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
use crate::constraints::Constraints;
use crate::funcs;
use crate::scene::PlanningScene;
use crate::space::{JointStateSpace, State, StateSamplerAllocator};
use log::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::sync::{Arc, Mutex};

/// Draws states from the configuration space
pub trait StateSampler: Send {
    fn sample_uniform(&mut self, state: &mut State);
    fn sample_near(&mut self, state: &mut State, near: &[f64], distance: f64);
}

/// Uniform sampler over the space bounds
pub struct DefaultStateSampler {
    bounds: Vec<Option<k::joint::Range<f64>>>,
    rng: StdRng,
}

impl DefaultStateSampler {
    pub fn new(space: &JointStateSpace) -> Self {
        DefaultStateSampler {
            bounds: space.bounds(),
            rng: StdRng::from_entropy(),
        }
    }
}

impl StateSampler for DefaultStateSampler {
    fn sample_uniform(&mut self, state: &mut State) {
        *state = funcs::random_state_from_limits(&mut self.rng, &self.bounds);
    }

    fn sample_near(&mut self, state: &mut State, near: &[f64], distance: f64) {
        state.clear();
        for (value, bound) in near.iter().zip(self.bounds.iter()) {
            let (min, max) = match bound {
                Some(range) => (range.min, range.max),
                None => (-PI, PI),
            };
            let lo = (value - distance).max(min);
            let hi = (value + distance).min(max);
            state.push(if hi > lo { self.rng.gen_range(lo..hi) } else { lo });
        }
    }
}

/// Produces states satisfying one constraint set
pub trait ConstraintSampler: Send + Sync {
    /// Draw a fresh constrained state; false if no sample was found within
    /// `max_attempts`
    fn sample(&self, state: &mut State, max_attempts: usize) -> bool;
    /// Move the given state onto the constraint manifold
    fn project(&self, state: &mut State) -> bool;
}

/// Stratum sampler for the follower: constrained sampling plus projection
pub trait ValidConstrainedSampler: Send + Sync {
    fn sample(&self, state: &mut State) -> bool;
    fn project(&self, state: &mut State) -> bool;
}

/// Builds a constraint sampler for a scene/group/constraints triple
///
/// The space stands in for the group: it carries the group name and the
/// variable order samples must use.
pub trait ConstraintSamplerManager: Send + Sync {
    fn select_sampler(
        &self,
        scene: &PlanningScene,
        space: &Arc<JointStateSpace>,
        constraints: &Constraints,
    ) -> Option<Arc<dyn ConstraintSampler>>;
}

/// State sampler that prefers a constraint sampler and falls back to the
/// default sampler when the constraints cannot be sampled
pub struct ConstrainedSampler {
    default: DefaultStateSampler,
    constraint_sampler: Arc<dyn ConstraintSampler>,
    max_attempts: usize,
    constrained_success: usize,
    constrained_failure: usize,
}

impl ConstrainedSampler {
    pub fn new(
        space: &JointStateSpace,
        constraint_sampler: Arc<dyn ConstraintSampler>,
        max_attempts: usize,
    ) -> Self {
        ConstrainedSampler {
            default: DefaultStateSampler::new(space),
            constraint_sampler,
            max_attempts,
            constrained_success: 0,
            constrained_failure: 0,
        }
    }

    /// Fraction of draws the constraint sampler managed itself
    pub fn constrained_sampling_rate(&self) -> f64 {
        let total = self.constrained_success + self.constrained_failure;
        if total == 0 {
            1.0
        } else {
            self.constrained_success as f64 / total as f64
        }
    }
}

impl StateSampler for ConstrainedSampler {
    fn sample_uniform(&mut self, state: &mut State) {
        if self.constraint_sampler.sample(state, self.max_attempts) {
            self.constrained_success += 1;
        } else {
            self.constrained_failure += 1;
            self.default.sample_uniform(state);
        }
    }

    fn sample_near(&mut self, state: &mut State, near: &[f64], distance: f64) {
        // constraint samplers draw fresh states only
        self.default.sample_near(state, near, distance);
    }
}

/// Default manager: samples joint constraints as intervals
///
/// Position constraints would need an IK-backed sampler and are left to
/// custom managers; a constraint set without joint constraints on the group
/// yields no sampler.
pub struct JointConstraintSamplerManager;

impl ConstraintSamplerManager for JointConstraintSamplerManager {
    fn select_sampler(
        &self,
        _scene: &PlanningScene,
        space: &Arc<JointStateSpace>,
        constraints: &Constraints,
    ) -> Option<Arc<dyn ConstraintSampler>> {
        let bounds = space.bounds();
        let mut intervals = Vec::with_capacity(space.dimension());
        for (name, bound) in space.var_names().iter().zip(bounds.iter()) {
            let (mut lo, mut hi) = match bound {
                Some(range) => (range.min, range.max),
                None => (-PI, PI),
            };
            for jc in constraints
                .joint_constraints
                .iter()
                .filter(|jc| &jc.joint_name == name)
            {
                lo = lo.max(jc.position - jc.tolerance_below);
                hi = hi.min(jc.position + jc.tolerance_above);
            }
            if lo > hi {
                debug!("joint `{}` has an empty constrained interval", name);
                return None;
            }
            intervals.push((lo, hi));
        }
        let constrained = constraints
            .joint_constraints
            .iter()
            .any(|jc| space.var_index(&jc.joint_name).is_some());
        if !constrained {
            return None;
        }
        Some(Arc::new(JointConstraintSampler {
            intervals,
            rng: Mutex::new(StdRng::from_entropy()),
        }))
    }
}

struct JointConstraintSampler {
    intervals: Vec<(f64, f64)>,
    rng: Mutex<StdRng>,
}

impl ConstraintSampler for JointConstraintSampler {
    fn sample(&self, state: &mut State, _max_attempts: usize) -> bool {
        let mut rng = self.rng.lock().unwrap();
        state.clear();
        state.extend(self.intervals.iter().map(|(lo, hi)| {
            if hi > lo {
                rng.gen_range(*lo..*hi)
            } else {
                *lo
            }
        }));
        true
    }

    fn project(&self, state: &mut State) -> bool {
        if state.len() != self.intervals.len() {
            return false;
        }
        for (value, (lo, hi)) in state.iter_mut().zip(self.intervals.iter()) {
            *value = value.max(*lo).min(*hi);
        }
        true
    }
}

/// Precomputed sampler for one constraint message
pub struct ConstraintApproximation {
    constraints: Constraints,
    sampler_allocator: Option<StateSamplerAllocator>,
}

impl ConstraintApproximation {
    pub fn new(constraints: Constraints, sampler_allocator: Option<StateSamplerAllocator>) -> Self {
        ConstraintApproximation {
            constraints,
            sampler_allocator,
        }
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn state_sampler_allocator(&self, _msg: &Constraints) -> Option<StateSamplerAllocator> {
        self.sampler_allocator.clone()
    }
}

/// Library of precomputed approximations, keyed by the constraint message
#[derive(Default)]
pub struct ConstraintApproximationLibrary {
    entries: Vec<ConstraintApproximation>,
}

impl ConstraintApproximationLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_approximation(&mut self, approximation: ConstraintApproximation) {
        self.entries.push(approximation);
    }

    pub fn get_constraint_approximation(&self, msg: &Constraints) -> Option<&ConstraintApproximation> {
        self.entries.iter().find(|e| e.constraints() == msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::JointConstraint;
    use crate::testing::planar_arm;

    fn arm_space() -> Arc<JointStateSpace> {
        let model = Arc::new(planar_arm("arm", 2));
        Arc::new(JointStateSpace::whole_body(model, "arm"))
    }

    struct NeverSampler;
    impl ConstraintSampler for NeverSampler {
        fn sample(&self, _state: &mut State, _max_attempts: usize) -> bool {
            false
        }
        fn project(&self, _state: &mut State) -> bool {
            false
        }
    }

    #[test]
    fn default_sampler_respects_bounds() {
        let space = arm_space();
        let mut sampler = DefaultStateSampler::new(&space);
        let mut state = Vec::new();
        for _ in 0..100 {
            sampler.sample_uniform(&mut state);
            assert!(space.satisfies_bounds(&state));
        }
        sampler.sample_near(&mut state, &[0.0, 0.0], 0.1);
        assert!(state.iter().all(|v| v.abs() <= 0.1));
    }

    #[test]
    fn constrained_sampler_falls_back_to_default() {
        let space = arm_space();
        let mut sampler = ConstrainedSampler::new(&space, Arc::new(NeverSampler), 3);
        let mut state = Vec::new();
        sampler.sample_uniform(&mut state);
        assert_eq!(state.len(), 2);
        assert!(space.satisfies_bounds(&state));
        assert!(sampler.constrained_sampling_rate() < 0.5);
    }

    #[test]
    fn joint_manager_intersects_intervals() {
        let space = arm_space();
        let model = space.model().clone();
        let scene = PlanningScene::new("s", model);
        let constraints = Constraints {
            joint_constraints: vec![JointConstraint::new("j0", 1.0, 0.25)],
            ..Default::default()
        };
        let sampler = JointConstraintSamplerManager
            .select_sampler(&scene, &space, &constraints)
            .unwrap();
        let mut state = Vec::new();
        for _ in 0..50 {
            assert!(sampler.sample(&mut state, 1));
            assert!(state[0] >= 0.75 && state[0] <= 1.25);
            assert!(space.satisfies_bounds(&state));
        }
        let mut out_of_region = vec![0.0, 0.0];
        assert!(sampler.project(&mut out_of_region));
        assert!((out_of_region[0] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn joint_manager_needs_group_constraints() {
        let space = arm_space();
        let model = space.model().clone();
        let scene = PlanningScene::new("s", model);
        let unrelated = Constraints {
            joint_constraints: vec![JointConstraint::new("elsewhere", 0.0, 0.1)],
            ..Default::default()
        };
        assert!(JointConstraintSamplerManager
            .select_sampler(&scene, &space, &unrelated)
            .is_none());
        assert!(JointConstraintSamplerManager
            .select_sampler(&scene, &space, &Constraints::default())
            .is_none());
    }

    #[test]
    fn approximation_library_keys_on_message() {
        let mut library = ConstraintApproximationLibrary::new();
        let msg = Constraints {
            name: "surface".to_owned(),
            ..Default::default()
        };
        library.add_approximation(ConstraintApproximation::new(msg.clone(), None));
        assert!(library.get_constraint_approximation(&msg).is_some());
        let other = Constraints {
            name: "other".to_owned(),
            ..Default::default()
        };
        assert!(library.get_constraint_approximation(&other).is_none());
    }
}
