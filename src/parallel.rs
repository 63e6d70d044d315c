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
use crate::planner::{Planner, PlannerStatus};
use crate::problem::ProblemDefinition;
use crate::termination::PlannerTerminationCondition;
use log::*;
use std::sync::{Arc, Mutex};
use std::thread;

/// Runs a batch of planner instances concurrently against one problem
/// definition
///
/// Every thread records its solutions on the shared problem definition;
/// instead of the full path-hybridization of the original library, the
/// shortest recorded path simply wins when the solution is read back.
pub struct ParallelPlan {
    pdef: Arc<ProblemDefinition>,
    planners: Mutex<Vec<Arc<dyn Planner>>>,
}

impl ParallelPlan {
    pub fn new(pdef: Arc<ProblemDefinition>) -> Self {
        ParallelPlan {
            pdef,
            planners: Mutex::new(Vec::new()),
        }
    }

    pub fn add_planner(&self, planner: Arc<dyn Planner>) {
        self.planners.lock().unwrap().push(planner);
    }

    pub fn clear_planners(&self) {
        self.planners.lock().unwrap().clear();
    }

    pub fn planner_count(&self) -> usize {
        self.planners.lock().unwrap().len()
    }

    /// Run every added planner to completion or termination
    pub fn solve(&self, ptc: &PlannerTerminationCondition) -> PlannerStatus {
        let planners: Vec<Arc<dyn Planner>> = self.planners.lock().unwrap().clone();
        if planners.is_empty() {
            warn!("no planners to run");
            return PlannerStatus::Timeout;
        }
        let before = self.pdef.solution_count();
        let mut handles = Vec::with_capacity(planners.len());
        for planner in planners {
            let ptc = ptc.clone();
            handles.push(thread::spawn(move || planner.solve(&ptc)));
        }
        let mut statuses = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.join() {
                Ok(status) => statuses.push(status),
                Err(_) => error!("planner thread panicked"),
            }
        }
        let added = self.pdef.solution_count() - before;
        debug!("parallel batch produced {} solution(s)", added);
        if statuses.iter().any(|s| s.solved()) {
            PlannerStatus::ExactSolution
        } else if statuses
            .iter()
            .any(|s| *s == PlannerStatus::ApproximateSolution)
        {
            PlannerStatus::ApproximateSolution
        } else {
            statuses.pop().unwrap_or(PlannerStatus::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::RrtConnectPlanner;
    use crate::space::JointStateSpace;
    use crate::space_information::SpaceInformation;
    use crate::testing::{planar_arm, TestGoal};
    use std::time::Duration;

    #[test]
    fn batch_shares_the_problem_definition() {
        let model = Arc::new(planar_arm("arm", 2));
        let space = Arc::new(JointStateSpace::whole_body(model, "arm"));
        let si = Arc::new(SpaceInformation::new(space));
        si.setup();
        let pdef = Arc::new(ProblemDefinition::new(si.clone()));
        pdef.add_start_state(vec![0.0, 0.0]);
        pdef.set_goal(Some(Arc::new(TestGoal::new(vec![vec![1.0, 0.5]]))));

        let plan = ParallelPlan::new(pdef.clone());
        for _ in 0..3 {
            plan.add_planner(Arc::new(RrtConnectPlanner::new(si.clone(), pdef.clone(), "")));
        }
        assert_eq!(plan.planner_count(), 3);
        let ptc = PlannerTerminationCondition::timed(Duration::from_secs(10));
        assert!(plan.solve(&ptc).solved());
        assert!(pdef.solution_count() >= 1);
        plan.clear_planners();
        assert_eq!(plan.planner_count(), 0);
    }
}
