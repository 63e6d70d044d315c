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
use crate::goal::GoalType;
use crate::path::PathGeometric;
use crate::planner::PlannerStatus;
use crate::problem::{PlannerInputStates, ProblemDefinition};
use crate::sampling::ValidConstrainedSampler;
use crate::space::State;
use crate::space_information::SpaceInformation;
use crate::termination::PlannerTerminationCondition;
use log::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const GOAL_BIAS: f64 = 0.05;

/// Weighted distribution over layer indices
///
/// Fenwick tree over the weights: update and sample are O(log m).
struct LayerPdf {
    tree: Vec<f64>,
    weights: Vec<f64>,
}

impl LayerPdf {
    fn new(len: usize) -> Self {
        LayerPdf {
            tree: vec![0.0; len + 1],
            weights: vec![0.0; len],
        }
    }

    fn set(&mut self, index: usize, weight: f64) {
        let delta = weight - self.weights[index];
        self.weights[index] = weight;
        let mut i = index + 1;
        while i < self.tree.len() {
            self.tree[i] += delta;
            i += i & i.wrapping_neg();
        }
    }

    fn total(&self) -> f64 {
        let mut i = self.weights.len();
        let mut sum = 0.0;
        while i > 0 {
            sum += self.tree[i];
            i -= i & i.wrapping_neg();
        }
        sum
    }

    /// Index whose cumulative weight interval contains `u * total`,
    /// for `u` in [0, 1)
    fn sample(&self, u: f64) -> usize {
        let n = self.weights.len();
        let mut remaining = u * self.total();
        let mut pos = 0usize;
        let mut bit = 1usize;
        while bit * 2 <= n {
            bit *= 2;
        }
        while bit > 0 {
            let next = pos + bit;
            if next <= n && self.tree[next] < remaining {
                pos = next;
                remaining -= self.tree[next];
            }
            bit >>= 1;
        }
        pos.min(n - 1)
    }
}

/// Layered planner threading a path through an ordered sequence of
/// constraint strata
///
/// Layer 0 holds start states, layers 1..n hold samples from the n stratum
/// samplers, layer n+1 holds goal states. Edges only point forward between
/// adjacent layers, so the connection graph is a DAG and start-reachability
/// propagates monotonically.
pub struct Follower {
    si: Arc<SpaceInformation>,
    pdef: Option<Arc<ProblemDefinition>>,
    goal_bias: f64,
    rng: StdRng,
}

impl Follower {
    pub fn new(si: Arc<SpaceInformation>) -> Self {
        Follower {
            si,
            pdef: None,
            goal_bias: GOAL_BIAS,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn space_information(&self) -> &Arc<SpaceInformation> {
        &self.si
    }

    pub fn set_problem_definition(&mut self, pdef: Arc<ProblemDefinition>) {
        self.pdef = Some(pdef);
    }

    pub fn problem_definition(&self) -> Option<&Arc<ProblemDefinition>> {
        self.pdef.as_ref()
    }

    /// Grow the layered graph until a goal state is reachable from a start,
    /// then extract one state per layer
    pub fn follow(
        &mut self,
        samplers: &[Arc<dyn ValidConstrainedSampler>],
        ptc: &PlannerTerminationCondition,
    ) -> PlannerStatus {
        let pdef = match &self.pdef {
            Some(pdef) => pdef.clone(),
            None => {
                error!("no problem definition set");
                return PlannerStatus::UnrecognizedGoalType;
            }
        };
        if !self.si.is_setup() {
            self.si.setup();
        }
        match pdef.goal() {
            Some(goal) if goal.has_type(GoalType::SampleableRegion) => {}
            _ => {
                error!("The goal region must be sampleable");
                return PlannerStatus::UnrecognizedGoalType;
            }
        }

        let layers = samplers.len() + 2;
        let mut sets: Vec<Vec<State>> = vec![Vec::new(); layers];
        let mut pis = PlannerInputStates::new(&pdef);
        while let Some(state) = pis.next_start() {
            sets[0].push(state);
        }
        if sets[0].is_empty() {
            error!("No valid start states found.");
            return PlannerStatus::InvalidStart;
        }

        let mut result = PlannerStatus::ExactSolution;
        let mut work_area: State = Vec::new();

        // seed every stratum with at least one sample, projecting the
        // previous layer's newest state first and falling back to a fresh
        // draw
        for i in 0..samplers.len() {
            if ptc.eval() {
                break;
            }
            while sets[i + 1].is_empty() && !ptc.eval() {
                let produced = if sets[i].is_empty() {
                    samplers[i].sample(&mut work_area)
                } else {
                    work_area.clear();
                    work_area.extend_from_slice(sets[i].last().unwrap());
                    samplers[i].project(&mut work_area) || samplers[i].sample(&mut work_area)
                };
                if produced && self.si.is_valid(&work_area) {
                    sets[i + 1].push(work_area.clone());
                }
            }
        }

        if ptc.eval() {
            result = PlannerStatus::Timeout;
        } else {
            match pis.next_goal(Some(ptc)) {
                Some(state) => sets[layers - 1].push(state),
                None => {
                    error!("Unable to sample any valid states for goal tree");
                    result = PlannerStatus::InvalidGoal;
                }
            }
        }

        if result == PlannerStatus::ExactSolution {
            // connections[k][i] holds the layer-(k+1) indices reachable by a
            // valid motion from state i of layer k; the goal layer has no row
            let mut connections: Vec<Vec<Vec<usize>>> = Vec::with_capacity(layers - 1);
            let mut first_sample_worked = true;
            for i in 0..layers - 1 {
                let mut rows = vec![Vec::new(); sets[i].len()];
                if self.si.check_motion(&sets[i][0], &sets[i + 1][0]) {
                    rows[0].push(0);
                } else {
                    first_sample_worked = false;
                }
                connections.push(rows);
            }

            if first_sample_worked {
                debug!(
                    "First samples were successfully connected for all sets of constraints. \
                     Solution can be reported."
                );
                self.compute_solution(&pdef, &sets, &connections);
            } else if self.grow(&mut pis, samplers, ptc, &mut sets, &mut connections) {
                self.compute_solution(&pdef, &sets, &connections);
            } else {
                result = PlannerStatus::Timeout;
            }
        }

        for (i, set) in sets.iter().enumerate() {
            debug!("Computed {} samples for constraints {}", set.len(), i);
        }
        if result.solved() {
            info!("Successfully computed follow plan");
        } else {
            info!("Unable to compute follow plan");
        }
        result
    }

    /// Probabilistic growth; true once some goal state is start-reachable
    fn grow(
        &mut self,
        pis: &mut PlannerInputStates<'_>,
        samplers: &[Arc<dyn ValidConstrainedSampler>],
        ptc: &PlannerTerminationCondition,
        sets: &mut Vec<Vec<State>>,
        connections: &mut Vec<Vec<Vec<usize>>>,
    ) -> bool {
        let layers = sets.len();
        let goal_index = layers - 1;
        let weight_offset = 1.0 / layers as f64;

        let mut pdf = LayerPdf::new(layers - 1);
        for i in 1..layers {
            pdf.set(i - 1, 1.0 / (weight_offset + sets[i].len() as f64));
        }

        // further connections from the remaining start states
        for i in 1..sets[0].len() {
            if self.si.check_motion(&sets[0][i], &sets[1][0]) {
                connections[0][i].push(0);
            }
        }

        let mut is_start: Vec<Vec<bool>> = sets.iter().map(|set| vec![false; set.len()]).collect();
        for flag in is_start[0].iter_mut() {
            *flag = true;
        }
        for i in 0..sets[0].len() {
            propagate_start_info(0, i, &mut is_start, connections);
        }

        let mut work_area: State = Vec::new();
        let mut solved = is_start[goal_index].iter().any(|flag| *flag);
        let mut adding_goals = true;
        while !ptc.eval() && !solved {
            let mut added = false;
            let mut layer = pdf.sample(self.rng.gen::<f64>()) + 1;
            if layer == goal_index || (adding_goals && self.rng.gen::<f64>() < self.goal_bias) {
                layer = goal_index;
                match pis.next_goal(None) {
                    Some(state) => {
                        sets[goal_index].push(state);
                        is_start[goal_index].push(false);
                        pdf.set(
                            goal_index - 1,
                            1.0 / (weight_offset + sets[goal_index].len() as f64),
                        );
                        added = true;
                    }
                    None => adding_goals = false,
                }
            } else if samplers[layer - 1].sample(&mut work_area) && self.si.is_valid(&work_area) {
                sets[layer].push(work_area.clone());
                connections[layer].push(Vec::new());
                is_start[layer].push(false);
                pdf.set(layer - 1, 1.0 / (weight_offset + sets[layer].len() as f64));
                added = true;
            }

            if added {
                let added_elem_index = sets[layer].len() - 1;
                let new_state = sets[layer][added_elem_index].clone();
                for i in 0..sets[layer - 1].len() {
                    if self.si.check_motion(&sets[layer - 1][i], &new_state) {
                        connections[layer - 1][i].push(added_elem_index);
                        if is_start[layer - 1][i] && !is_start[layer][added_elem_index] {
                            is_start[layer][added_elem_index] = true;
                            propagate_start_info(layer, added_elem_index, &mut is_start, connections);
                        }
                    }
                }
                if layer < goal_index {
                    for i in 0..sets[layer + 1].len() {
                        if self.si.check_motion(&new_state, &sets[layer + 1][i]) {
                            connections[layer][added_elem_index].push(i);
                            if is_start[layer][added_elem_index] && !is_start[layer + 1][i] {
                                is_start[layer + 1][i] = true;
                                propagate_start_info(layer + 1, i, &mut is_start, connections);
                            }
                        }
                    }
                }
                if is_start[goal_index].iter().any(|flag| *flag) {
                    solved = true;
                }
            }
        }
        solved
    }

    /// Depth-first extraction; the path is built goal-first and reversed
    /// once at the top
    fn compute_solution(
        &self,
        pdef: &Arc<ProblemDefinition>,
        sets: &[Vec<State>],
        connections: &[Vec<Vec<usize>>],
    ) {
        let mut states: Vec<State> = Vec::new();
        let mut found = false;
        for i in 0..sets[0].len() {
            states.clear();
            if find_solution_path(&mut states, 0, i, sets, connections) {
                found = true;
                break;
            }
        }
        if found {
            states.reverse();
            pdef.add_solution_path(
                PathGeometric::from_states(self.si.clone(), states),
                false,
                "Follower",
            );
        }
    }
}

/// Forward reachability sweep over the connection DAG
///
/// Uses an explicit work stack; the recursion depth of the original would
/// track the total sample count.
fn propagate_start_info(
    set_index: usize,
    elem_index: usize,
    is_start: &mut [Vec<bool>],
    connections: &[Vec<Vec<usize>>],
) {
    let mut stack = vec![(set_index, elem_index)];
    while let Some((k, i)) = stack.pop() {
        if k >= connections.len() {
            continue;
        }
        for &j in &connections[k][i] {
            if !is_start[k + 1][j] {
                is_start[k + 1][j] = true;
                stack.push((k + 1, j));
            }
        }
    }
}

fn find_solution_path(
    states: &mut Vec<State>,
    set_index: usize,
    elem_index: usize,
    sets: &[Vec<State>],
    connections: &[Vec<Vec<usize>>],
) -> bool {
    if set_index == connections.len() {
        // the goal layer
        states.push(sets[set_index][elem_index].clone());
        return true;
    }
    for &next in &connections[set_index][elem_index] {
        if find_solution_path(states, set_index + 1, next, sets, connections) {
            states.push(sets[set_index][elem_index].clone());
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::JointStateSpace;
    use crate::testing::{planar_arm, BoxStratumSampler, SeqStratumSampler, TestGoal};
    use crate::validity::FnValidityChecker;
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
    fn pdf_favors_sparse_layers() {
        let mut pdf = LayerPdf::new(3);
        pdf.set(0, 1.0);
        pdf.set(1, 0.0);
        pdf.set(2, 0.0);
        for i in 0..10 {
            assert_eq!(pdf.sample(i as f64 / 10.0), 0);
        }
        pdf.set(0, 0.25);
        pdf.set(2, 0.75);
        assert_eq!(pdf.sample(0.1), 0);
        assert_eq!(pdf.sample(0.9), 2);
        assert!((pdf.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn two_strata_visited_in_order() {
        let (si, pdef) = make_problem();
        pdef.add_start_state(vec![0.0, 0.0]);
        pdef.set_goal(Some(Arc::new(TestGoal::new(vec![vec![2.5, 0.0]]))));
        let r1 = BoxStratumSampler::new(&[0.9, -0.1], &[1.1, 0.1]);
        let r2 = BoxStratumSampler::new(&[1.9, -0.1], &[2.1, 0.1]);
        let samplers: Vec<Arc<dyn ValidConstrainedSampler>> = vec![Arc::new(r1), Arc::new(r2)];
        let mut follower = Follower::new(si);
        follower.set_problem_definition(pdef.clone());
        let ptc = PlannerTerminationCondition::timed(Duration::from_secs(10));
        assert!(follower.follow(&samplers, &ptc).solved());
        let path = pdef.solution_path().unwrap();
        // one state per layer: start, R1, R2, goal
        assert_eq!(path.state_count(), 4);
        assert_eq!(path.state(0), &vec![0.0, 0.0]);
        let in_r1 = path.state(1);
        assert!(in_r1[0] >= 0.9 && in_r1[0] <= 1.1 && in_r1[1].abs() <= 0.1);
        let in_r2 = path.state(2);
        assert!(in_r2[0] >= 1.9 && in_r2[0] <= 2.1 && in_r2[1].abs() <= 0.1);
        assert!(path.is_valid());
    }

    #[test]
    fn growth_loop_routes_around_blocked_first_samples() {
        let (si, pdef) = make_problem();
        // wall at j0 in (0.4, 0.6) below j1 = -0.5
        si.set_state_validity_checker(Some(Arc::new(FnValidityChecker::new(
            |state: &[f64]| !(state[0] > 0.4 && state[0] < 0.6 && state[1] < -0.5),
        ))));
        pdef.add_start_state(vec![0.0, 0.0]);
        pdef.set_goal(Some(Arc::new(TestGoal::new(vec![vec![2.0, 0.0]]))));
        // the first stratum sample sits behind the wall, later ones do not
        let stratum =
            SeqStratumSampler::new(vec![vec![1.0, -2.0]], vec![1.0, 2.0]);
        let samplers: Vec<Arc<dyn ValidConstrainedSampler>> = vec![Arc::new(stratum)];
        let mut follower = Follower::new(si);
        follower.set_problem_definition(pdef.clone());
        let ptc = PlannerTerminationCondition::timed(Duration::from_secs(10));
        assert!(follower.follow(&samplers, &ptc).solved());
        let path = pdef.solution_path().unwrap();
        assert_eq!(path.state_count(), 3);
        assert_eq!(path.state(1), &vec![1.0, 2.0]);
        assert!(path.is_valid());
    }

    #[test]
    fn unreachable_problem_times_out() {
        let (si, pdef) = make_problem();
        // nothing can cross j0 = 1.5
        si.set_state_validity_checker(Some(Arc::new(FnValidityChecker::new(
            |state: &[f64]| state[0] < 1.4 || state[0] > 1.6,
        ))));
        pdef.add_start_state(vec![0.0, 0.0]);
        pdef.set_goal(Some(Arc::new(TestGoal::new(vec![vec![2.5, 0.0]]))));
        let stratum = BoxStratumSampler::new(&[0.9, -0.1], &[1.1, 0.1]);
        let samplers: Vec<Arc<dyn ValidConstrainedSampler>> = vec![Arc::new(stratum)];
        let mut follower = Follower::new(si);
        follower.set_problem_definition(pdef.clone());
        let ptc = PlannerTerminationCondition::timed(Duration::from_millis(300));
        assert_eq!(follower.follow(&samplers, &ptc), PlannerStatus::Timeout);
        assert!(!pdef.has_solution());
    }

    #[test]
    fn degenerate_inputs_are_reported() {
        let (si, pdef) = make_problem();
        let samplers: Vec<Arc<dyn ValidConstrainedSampler>> =
            vec![Arc::new(BoxStratumSampler::new(&[0.0, 0.0], &[0.1, 0.1]))];
        let ptc = PlannerTerminationCondition::timed(Duration::from_secs(1));

        let mut follower = Follower::new(si.clone());
        assert_eq!(
            follower.follow(&samplers, &ptc),
            PlannerStatus::UnrecognizedGoalType
        );

        follower.set_problem_definition(pdef.clone());
        // goal set but no start states
        pdef.set_goal(Some(Arc::new(TestGoal::new(vec![vec![1.0, 1.0]]))));
        assert_eq!(follower.follow(&samplers, &ptc), PlannerStatus::InvalidStart);

        // start but an unsampleable goal
        pdef.add_start_state(vec![0.0, 0.0]);
        pdef.set_goal(Some(Arc::new(TestGoal::new(vec![]))));
        assert_eq!(follower.follow(&samplers, &ptc), PlannerStatus::InvalidGoal);
    }
}
