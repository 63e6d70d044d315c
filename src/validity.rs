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
use crate::context::ContextShared;
use log::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Decides whether a single state is admissible
pub trait StateValidityChecker: Send + Sync {
    fn is_valid(&self, state: &[f64]) -> bool;
    fn set_verbose(&self, _verbose: bool) {}
}

/// Checker backed by a closure, mostly for tests and custom setups
pub struct FnValidityChecker<F> {
    f: F,
}

impl<F> FnValidityChecker<F>
where
    F: Fn(&[f64]) -> bool + Send + Sync,
{
    pub fn new(f: F) -> Self {
        FnValidityChecker { f }
    }
}

impl<F> StateValidityChecker for FnValidityChecker<F>
where
    F: Fn(&[f64]) -> bool + Send + Sync,
{
    fn is_valid(&self, state: &[f64]) -> bool {
        (self.f)(state)
    }
}

/// The standard checker installed by `PlanningContext::configure`
///
/// A state is valid when it is within bounds, satisfies the current path
/// constraints, and does not put the robot in collision with the scene.
pub struct ContextValidityChecker {
    shared: Arc<ContextShared>,
    verbose: AtomicBool,
}

impl ContextValidityChecker {
    pub(crate) fn new(shared: Arc<ContextShared>) -> Self {
        ContextValidityChecker {
            shared,
            verbose: AtomicBool::new(false),
        }
    }
}

impl StateValidityChecker for ContextValidityChecker {
    fn is_valid(&self, state: &[f64]) -> bool {
        let verbose = self.verbose.load(Ordering::Relaxed);
        if !self.shared.space().satisfies_bounds(state) {
            if verbose {
                info!("state is out of bounds");
            }
            return false;
        }
        let full = self.shared.full_state_from(state);
        if let Some(constraints) = self.shared.path_constraints() {
            if !constraints.decide(&full) {
                if verbose {
                    info!("state violates path constraints");
                }
                return false;
            }
        }
        if let Some(scene) = self.shared.scene() {
            if scene.is_state_colliding(&full) {
                if verbose {
                    info!("state is in collision");
                }
                return false;
            }
        }
        true
    }

    fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }
}
