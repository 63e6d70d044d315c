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
use crate::goal::{Goal, GoalType};
use crate::path::PathGeometric;
use crate::problem::{PlannerInputStates, ProblemDefinition};
use crate::space::State;
use crate::space_information::SpaceInformation;
use crate::termination::PlannerTerminationCondition;
use log::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

/// Outcome of one planner invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerStatus {
    ExactSolution,
    ApproximateSolution,
    Timeout,
    InvalidStart,
    InvalidGoal,
    UnrecognizedGoalType,
}

impl PlannerStatus {
    pub fn solved(self) -> bool {
        self == PlannerStatus::ExactSolution
    }
}

impl fmt::Display for PlannerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PlannerStatus::ExactSolution => "exact solution",
            PlannerStatus::ApproximateSolution => "approximate solution",
            PlannerStatus::Timeout => "timeout",
            PlannerStatus::InvalidStart => "invalid start",
            PlannerStatus::InvalidGoal => "invalid goal",
            PlannerStatus::UnrecognizedGoalType => "unrecognized goal type",
        };
        write!(f, "{}", text)
    }
}

/// A sampling planner over one problem definition
pub trait Planner: Send + Sync {
    fn name(&self) -> &str;
    fn solve(&self, ptc: &PlannerTerminationCondition) -> PlannerStatus;
    fn clear(&self) {}
}

/// Factory producing a fresh planner for a space/problem pair
pub type PlannerAllocator =
    Arc<dyn Fn(Arc<SpaceInformation>, Arc<ProblemDefinition>, &str) -> Arc<dyn Planner> + Send + Sync>;

/// Maps a planner-type string to an allocator
pub type PlannerSelector = Arc<dyn Fn(&str) -> Option<PlannerAllocator> + Send + Sync>;

pub fn rrt_connect_allocator() -> PlannerAllocator {
    Arc::new(|si, pdef, name| Arc::new(RrtConnectPlanner::new(si, pdef, name)))
}

pub fn rrt_allocator() -> PlannerAllocator {
    Arc::new(|si, pdef, name| Arc::new(RrtPlanner::new(si, pdef, name)))
}

/// Selector over the planners this crate ships
pub fn default_planner_selector() -> PlannerSelector {
    Arc::new(|planner_type: &str| match planner_type {
        "RRTConnect" => Some(rrt_connect_allocator()),
        "RRT" => Some(rrt_allocator()),
        _ => {
            error!("unknown planner type `{}`", planner_type);
            None
        }
    })
}

/// Pick a planner from the goal type: a growing lazy-sample set suits the
/// single tree, anything sampleable suits the bidirectional search
pub fn default_planner(
    si: Arc<SpaceInformation>,
    pdef: Arc<ProblemDefinition>,
    goal: &dyn Goal,
    name: &str,
) -> Arc<dyn Planner> {
    if goal.has_type(GoalType::LazySamples) {
        Arc::new(RrtPlanner::new(si, pdef, name))
    } else {
        Arc::new(RrtConnectPlanner::new(si, pdef, name))
    }
}

fn auto_range(si: &SpaceInformation) -> f64 {
    si.param_f64("range")
        .unwrap_or_else(|| si.space().maximum_extent() * 0.05)
        .max(1e-6)
}

fn collect_starts(pis: &mut PlannerInputStates<'_>) -> Vec<State> {
    let mut starts = Vec::new();
    while let Some(state) = pis.next_start() {
        starts.push(state);
    }
    starts
}

/// Bidirectional RRT, backed by the `rrt` crate's dual-tree search
///
/// Each round draws one goal state from the goal region and runs a bounded
/// dual-tree search from every start, so the termination condition is
/// polled between rounds and inside the feasibility closure.
pub struct RrtConnectPlanner {
    si: Arc<SpaceInformation>,
    pdef: Arc<ProblemDefinition>,
    name: String,
}

impl RrtConnectPlanner {
    pub fn new(si: Arc<SpaceInformation>, pdef: Arc<ProblemDefinition>, name: &str) -> Self {
        RrtConnectPlanner {
            si,
            pdef,
            name: if name.is_empty() {
                "RRTConnect".to_owned()
            } else {
                format!("RRTConnect[{}]", name)
            },
        }
    }
}

impl Planner for RrtConnectPlanner {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve(&self, ptc: &PlannerTerminationCondition) -> PlannerStatus {
        let si = &self.si;
        if !si.is_setup() {
            si.setup();
        }
        let mut pis = PlannerInputStates::new(&self.pdef);
        let starts = collect_starts(&mut pis);
        if starts.is_empty() {
            error!("{}: no valid start states", self.name);
            return PlannerStatus::InvalidStart;
        }
        match self.pdef.goal() {
            Some(goal) if goal.as_sampleable().is_some() => {}
            _ => return PlannerStatus::UnrecognizedGoalType,
        }

        let range = auto_range(si);
        let tries_per_round = si.param_usize("max_try").unwrap_or(500);
        let sampler = RefCell::new(si.alloc_state_sampler());
        let mut goal_states: Vec<State> = Vec::new();
        let mut round = 0usize;
        loop {
            if ptc.eval() {
                return PlannerStatus::Timeout;
            }
            let goal_state = match pis.next_goal(Some(ptc)) {
                Some(state) => {
                    goal_states.push(state.clone());
                    state
                }
                None => {
                    if goal_states.is_empty() {
                        error!("{}: unable to sample any valid goal state", self.name);
                        return PlannerStatus::InvalidGoal;
                    }
                    goal_states[round % goal_states.len()].clone()
                }
            };
            for start in &starts {
                if ptc.eval() {
                    return PlannerStatus::Timeout;
                }
                let result = rrt::dual_rrt_connect(
                    start,
                    &goal_state,
                    |state: &[f64]| !ptc.eval() && si.is_valid(state),
                    || {
                        let mut out = Vec::new();
                        sampler.borrow_mut().sample_uniform(&mut out);
                        out
                    },
                    range,
                    tries_per_round,
                );
                if let Ok(states) = result {
                    let path = PathGeometric::from_states(si.clone(), states);
                    self.pdef.add_solution_path(path, false, self.name());
                    return PlannerStatus::ExactSolution;
                }
            }
            round += 1;
        }
    }
}

/// Goal-biased single-tree RRT
pub struct RrtPlanner {
    si: Arc<SpaceInformation>,
    pdef: Arc<ProblemDefinition>,
    name: String,
}

impl RrtPlanner {
    pub fn new(si: Arc<SpaceInformation>, pdef: Arc<ProblemDefinition>, name: &str) -> Self {
        RrtPlanner {
            si,
            pdef,
            name: if name.is_empty() {
                "RRT".to_owned()
            } else {
                format!("RRT[{}]", name)
            },
        }
    }
}

impl Planner for RrtPlanner {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve(&self, ptc: &PlannerTerminationCondition) -> PlannerStatus {
        let si = &self.si;
        if !si.is_setup() {
            si.setup();
        }
        let mut pis = PlannerInputStates::new(&self.pdef);
        let starts = collect_starts(&mut pis);
        if starts.is_empty() {
            error!("{}: no valid start states", self.name);
            return PlannerStatus::InvalidStart;
        }
        match self.pdef.goal() {
            Some(goal) if goal.as_sampleable().is_some() => {}
            _ => return PlannerStatus::UnrecognizedGoalType,
        }

        let range = auto_range(si);
        let goal_bias = si.param_f64("goal_bias").unwrap_or(0.05).clamp(0.0, 1.0);
        let mut sampler = si.alloc_state_sampler();
        let mut rng = StdRng::from_entropy();
        let mut goal_states: Vec<State> = Vec::new();
        if let Some(state) = pis.next_goal(Some(ptc)) {
            goal_states.push(state);
        }
        if goal_states.is_empty() {
            error!("{}: unable to sample any valid goal state", self.name);
            return PlannerStatus::InvalidGoal;
        }

        let mut nodes: Vec<(State, Option<usize>)> =
            starts.iter().map(|s| (s.clone(), None)).collect();
        let mut target = Vec::new();
        let mut probe = Vec::new();
        while !ptc.eval() {
            if rng.gen_bool(goal_bias) {
                target = goal_states[rng.gen_range(0..goal_states.len())].clone();
            } else {
                sampler.sample_uniform(&mut target);
            }
            let nearest = nearest_index(si, &nodes, &target);
            let from = nodes[nearest].0.clone();
            let dist = si.space().distance(&from, &target);
            if dist < 1e-12 {
                continue;
            }
            let t = (range / dist).min(1.0);
            si.space().interpolate(&from, &target, t, &mut probe);
            if !si.check_motion(&from, &probe) {
                continue;
            }
            nodes.push((probe.clone(), Some(nearest)));
            let new_index = nodes.len() - 1;
            for goal_state in &goal_states {
                if si.space().distance(&probe, goal_state) <= range
                    && si.check_motion(&probe, goal_state)
                {
                    let mut states = vec![goal_state.clone()];
                    let mut cursor = Some(new_index);
                    while let Some(i) = cursor {
                        states.push(nodes[i].0.clone());
                        cursor = nodes[i].1;
                    }
                    states.reverse();
                    let path = PathGeometric::from_states(si.clone(), states);
                    self.pdef.add_solution_path(path, false, self.name());
                    return PlannerStatus::ExactSolution;
                }
            }
            // keep widening the goal set while samples remain
            if nodes.len() % 64 == 0 {
                if let Some(state) = pis.next_goal(Some(ptc)) {
                    goal_states.push(state);
                }
            }
        }
        PlannerStatus::Timeout
    }
}

fn nearest_index(si: &SpaceInformation, nodes: &[(State, Option<usize>)], target: &[f64]) -> usize {
    let mut min_dist = f64::INFINITY;
    let mut min_index = 0;
    for (i, (state, _)) in nodes.iter().enumerate() {
        let dist = si.space().distance(state, target);
        if dist < min_dist {
            min_dist = dist;
            min_index = i;
        }
    }
    min_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::JointStateSpace;
    use crate::testing::{planar_arm, TestGoal};
    use std::time::Duration;

    fn make_problem() -> (Arc<SpaceInformation>, Arc<ProblemDefinition>) {
        let model = Arc::new(planar_arm("arm", 2));
        let space = Arc::new(JointStateSpace::whole_body(model, "arm"));
        let si = Arc::new(SpaceInformation::new(space));
        si.setup();
        let pdef = Arc::new(ProblemDefinition::new(si.clone()));
        (si, pdef)
    }

    #[test]
    fn rrt_connect_solves_free_space() {
        let (si, pdef) = make_problem();
        pdef.add_start_state(vec![0.0, 0.0]);
        pdef.set_goal(Some(Arc::new(TestGoal::new(vec![vec![1.0, 0.0]]))));
        let planner = RrtConnectPlanner::new(si, pdef.clone(), "");
        let ptc = PlannerTerminationCondition::timed(Duration::from_secs(5));
        assert!(planner.solve(&ptc).solved());
        let path = pdef.solution_path().unwrap();
        assert!(path.state_count() >= 2);
        assert!(path.is_valid());
    }

    #[test]
    fn rrt_solves_free_space() {
        let (si, pdef) = make_problem();
        pdef.add_start_state(vec![0.0, 0.0]);
        pdef.set_goal(Some(Arc::new(TestGoal::new(vec![vec![0.5, -0.5]]))));
        let planner = RrtPlanner::new(si, pdef.clone(), "");
        let ptc = PlannerTerminationCondition::timed(Duration::from_secs(5));
        assert!(planner.solve(&ptc).solved());
        let path = pdef.solution_path().unwrap();
        assert!(path.state_count() >= 2);
        assert_eq!(path.state(0), &vec![0.0, 0.0]);
    }

    #[test]
    fn missing_start_or_goal_is_reported() {
        let (si, pdef) = make_problem();
        let planner = RrtConnectPlanner::new(si.clone(), pdef.clone(), "");
        let ptc = PlannerTerminationCondition::timed(Duration::from_secs(1));
        assert_eq!(planner.solve(&ptc), PlannerStatus::InvalidStart);
        pdef.add_start_state(vec![0.0, 0.0]);
        assert_eq!(planner.solve(&ptc), PlannerStatus::UnrecognizedGoalType);
    }

    #[test]
    fn selector_knows_shipped_planners() {
        let selector = default_planner_selector();
        assert!(selector("RRTConnect").is_some());
        assert!(selector("RRT").is_some());
        assert!(selector("SPARS").is_none());
    }
}
