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
use crate::goal::Goal;
use crate::path::PathGeometric;
use crate::space::State;
use crate::space_information::SpaceInformation;
use crate::termination::PlannerTerminationCondition;
use log::*;
use std::sync::{Arc, Mutex, RwLock};

/// One recorded solution
pub struct Solution {
    pub path: PathGeometric,
    pub approximate: bool,
    pub planner_name: String,
}

/// Start states, goal and gathered solutions for one query
pub struct ProblemDefinition {
    si: Arc<SpaceInformation>,
    start_states: RwLock<Vec<State>>,
    goal: RwLock<Option<Arc<dyn Goal>>>,
    solutions: Mutex<Vec<Solution>>,
}

impl ProblemDefinition {
    pub fn new(si: Arc<SpaceInformation>) -> Self {
        ProblemDefinition {
            si,
            start_states: RwLock::new(Vec::new()),
            goal: RwLock::new(None),
            solutions: Mutex::new(Vec::new()),
        }
    }

    pub fn space_information(&self) -> &Arc<SpaceInformation> {
        &self.si
    }

    pub fn add_start_state(&self, state: State) {
        self.start_states.write().unwrap().push(state);
    }

    pub fn clear_start_states(&self) {
        self.start_states.write().unwrap().clear();
    }

    pub fn start_states(&self) -> Vec<State> {
        self.start_states.read().unwrap().clone()
    }

    pub fn set_goal(&self, goal: Option<Arc<dyn Goal>>) {
        *self.goal.write().unwrap() = goal;
    }

    pub fn goal(&self) -> Option<Arc<dyn Goal>> {
        self.goal.read().unwrap().clone()
    }

    pub fn add_solution_path(&self, path: PathGeometric, approximate: bool, planner_name: &str) {
        if approximate {
            warn!("solution from planner {} is approximate", planner_name);
        }
        self.solutions.lock().unwrap().push(Solution {
            path,
            approximate,
            planner_name: planner_name.to_owned(),
        });
    }

    pub fn clear_solution_paths(&self) {
        self.solutions.lock().unwrap().clear();
    }

    pub fn solution_count(&self) -> usize {
        self.solutions.lock().unwrap().len()
    }

    pub fn has_solution(&self) -> bool {
        self.solution_count() > 0
    }

    /// True when the best recorded solution is approximate
    pub fn has_approximate_solution(&self) -> bool {
        let solutions = self.solutions.lock().unwrap();
        best_index(&solutions).map_or(false, |i| solutions[i].approximate)
    }

    /// Clone of the best solution path: exact beats approximate, then
    /// shortest wins
    pub fn solution_path(&self) -> Option<PathGeometric> {
        let solutions = self.solutions.lock().unwrap();
        best_index(&solutions).map(|i| solutions[i].path.clone())
    }

    /// Modify the best solution path in place
    pub fn modify_solution_path<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut PathGeometric),
    {
        let mut solutions = self.solutions.lock().unwrap();
        match best_index(&solutions) {
            Some(i) => {
                f(&mut solutions[i].path);
                true
            }
            None => false,
        }
    }
}

fn best_index(solutions: &[Solution]) -> Option<usize> {
    solutions
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (a.approximate, a.path.length())
                .partial_cmp(&(b.approximate, b.path.length()))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
}

/// Validated start and goal streams for one planner invocation
pub struct PlannerInputStates<'a> {
    pdef: &'a ProblemDefinition,
    next_start: usize,
    sampled_goals: usize,
}

impl<'a> PlannerInputStates<'a> {
    pub fn new(pdef: &'a ProblemDefinition) -> Self {
        PlannerInputStates {
            pdef,
            next_start: 0,
            sampled_goals: 0,
        }
    }

    /// Next valid start state, if any remain
    pub fn next_start(&mut self) -> Option<State> {
        let starts = self.pdef.start_states();
        while self.next_start < starts.len() {
            let state = starts[self.next_start].clone();
            self.next_start += 1;
            if self.pdef.space_information().is_valid(&state) {
                return Some(state);
            }
            warn!("skipping invalid start state");
        }
        None
    }

    /// Next valid goal sample, bounded by the goal's sample budget
    pub fn next_goal(&mut self, ptc: Option<&PlannerTerminationCondition>) -> Option<State> {
        let goal = self.pdef.goal()?;
        let goal = goal.as_sampleable()?;
        let mut state = Vec::new();
        while self.sampled_goals < goal.max_sample_count() && goal.can_sample() {
            if let Some(ptc) = ptc {
                if ptc.eval() {
                    return None;
                }
            }
            self.sampled_goals += 1;
            if goal.sample_goal(&mut state) && self.pdef.space_information().is_valid(&state) {
                return Some(state);
            }
        }
        None
    }
}
