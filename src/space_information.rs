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
use crate::sampling::{DefaultStateSampler, StateSampler};
use crate::space::JointStateSpace;
use crate::validity::StateValidityChecker;
use log::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Fraction of the space extent used as the motion-check resolution when
/// none is configured
const DEFAULT_SEGMENT_FRACTION: f64 = 0.01;

/// String-keyed planner parameters, set from the context configuration map
#[derive(Default)]
pub struct ParamSet {
    params: HashMap<String, String>,
}

impl ParamSet {
    pub fn set_params(&mut self, params: &HashMap<String, String>) {
        for (key, value) in params {
            self.params.insert(key.clone(), value.clone());
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.params.insert(key.to_owned(), value.to_owned());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|s| s.as_str())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        let raw = self.params.get(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("parameter `{}` = `{}` is not a number", key, raw);
                None
            }
        }
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        let raw = self.params.get(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("parameter `{}` = `{}` is not an integer", key, raw);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Shared planning services over one state space: validity, motion checks
/// with counters, sampler allocation and planner parameters
pub struct SpaceInformation {
    space: Arc<JointStateSpace>,
    validity_checker: RwLock<Option<Arc<dyn StateValidityChecker>>>,
    motion_resolution: RwLock<f64>,
    valid_motions: AtomicUsize,
    invalid_motions: AtomicUsize,
    params: Mutex<ParamSet>,
    setup_done: AtomicBool,
}

impl SpaceInformation {
    pub fn new(space: Arc<JointStateSpace>) -> Self {
        SpaceInformation {
            space,
            validity_checker: RwLock::new(None),
            motion_resolution: RwLock::new(0.0),
            valid_motions: AtomicUsize::new(0),
            invalid_motions: AtomicUsize::new(0),
            params: Mutex::new(ParamSet::default()),
            setup_done: AtomicBool::new(false),
        }
    }

    pub fn space(&self) -> &Arc<JointStateSpace> {
        &self.space
    }

    /// Derive the motion resolution from the current space extent
    ///
    /// Called again after parameters change so derived values refresh.
    pub fn setup(&self) {
        let resolution = {
            let params = self.params.lock().unwrap();
            params
                .get_f64("longest_valid_segment_length")
                .unwrap_or_else(|| self.space.maximum_extent() * DEFAULT_SEGMENT_FRACTION)
        };
        *self.motion_resolution.write().unwrap() = resolution.max(1e-9);
        if self.validity_checker.read().unwrap().is_none() {
            warn!("no state validity checker is set, every state will be considered valid");
        }
        self.setup_done.store(true, Ordering::SeqCst);
    }

    pub fn is_setup(&self) -> bool {
        self.setup_done.load(Ordering::SeqCst)
    }

    pub fn motion_resolution(&self) -> f64 {
        *self.motion_resolution.read().unwrap()
    }

    pub fn set_state_validity_checker(&self, checker: Option<Arc<dyn StateValidityChecker>>) {
        *self.validity_checker.write().unwrap() = checker;
    }

    pub fn state_validity_checker(&self) -> Option<Arc<dyn StateValidityChecker>> {
        self.validity_checker.read().unwrap().clone()
    }

    pub fn is_valid(&self, state: &[f64]) -> bool {
        match self.validity_checker.read().unwrap().as_ref() {
            Some(checker) => checker.is_valid(state),
            None => true,
        }
    }

    /// Straight-line motion check at the configured resolution
    ///
    /// The far endpoint is checked first, then the interior. Outcomes feed
    /// the valid/invalid motion counters.
    pub fn check_motion(&self, from: &[f64], to: &[f64]) -> bool {
        let valid = self.check_motion_uncounted(from, to);
        if valid {
            self.valid_motions.fetch_add(1, Ordering::Relaxed);
        } else {
            self.invalid_motions.fetch_add(1, Ordering::Relaxed);
        }
        valid
    }

    fn check_motion_uncounted(&self, from: &[f64], to: &[f64]) -> bool {
        if !self.is_valid(to) {
            return false;
        }
        let resolution = self.motion_resolution();
        let steps = (self.space.distance(from, to) / resolution).ceil() as usize;
        let mut probe = Vec::with_capacity(from.len());
        for i in 1..steps {
            self.space
                .interpolate(from, to, i as f64 / steps as f64, &mut probe);
            if !self.is_valid(&probe) {
                return false;
            }
        }
        true
    }

    pub fn reset_motion_counter(&self) {
        self.valid_motions.store(0, Ordering::Relaxed);
        self.invalid_motions.store(0, Ordering::Relaxed);
    }

    pub fn valid_motion_count(&self) -> usize {
        self.valid_motions.load(Ordering::Relaxed)
    }

    pub fn invalid_motion_count(&self) -> usize {
        self.invalid_motions.load(Ordering::Relaxed)
    }

    /// Allocate a state sampler, honoring the allocator installed on the
    /// space
    pub fn alloc_state_sampler(&self) -> Box<dyn StateSampler> {
        match self.space.state_sampler_allocator() {
            Some(allocator) => allocator(&self.space),
            None => Box::new(DefaultStateSampler::new(&self.space)),
        }
    }

    pub fn set_params(&self, params: &HashMap<String, String>) {
        self.params.lock().unwrap().set_params(params);
    }

    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.params.lock().unwrap().get_f64(key)
    }

    pub fn param_usize(&self, key: &str) -> Option<usize> {
        self.params.lock().unwrap().get_usize(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::planar_arm;
    use crate::validity::FnValidityChecker;

    fn make_si() -> SpaceInformation {
        let model = Arc::new(planar_arm("arm", 2));
        let space = Arc::new(JointStateSpace::whole_body(model, "arm"));
        let si = SpaceInformation::new(space);
        si.setup();
        si
    }

    #[test]
    fn no_checker_means_everything_valid() {
        let si = make_si();
        assert!(si.is_valid(&[0.0, 0.0]));
        assert!(si.check_motion(&[0.0, 0.0], &[1.0, 1.0]));
        assert_eq!(si.valid_motion_count(), 1);
    }

    #[test]
    fn motion_check_finds_interior_blockage() {
        let si = make_si();
        // valid everywhere except a band in the middle of j0
        si.set_state_validity_checker(Some(Arc::new(FnValidityChecker::new(|state: &[f64]| {
            state[0] < 0.4 || state[0] > 0.6
        }))));
        assert!(!si.check_motion(&[0.0, 0.0], &[1.0, 0.0]));
        assert!(si.check_motion(&[0.0, 0.0], &[0.2, 0.0]));
        assert_eq!(si.invalid_motion_count(), 1);
        assert_eq!(si.valid_motion_count(), 1);
        si.reset_motion_counter();
        assert_eq!(si.valid_motion_count(), 0);
    }

    #[test]
    fn params_control_resolution() {
        let si = make_si();
        let mut params = HashMap::new();
        params.insert("longest_valid_segment_length".to_owned(), "0.5".to_owned());
        si.set_params(&params);
        si.setup();
        assert!((si.motion_resolution() - 0.5).abs() < 1e-12);
        assert_eq!(si.param_f64("longest_valid_segment_length"), Some(0.5));
        assert_eq!(si.param_f64("missing"), None);
    }
}
