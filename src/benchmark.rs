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
use crate::planner::Planner;
use crate::problem::ProblemDefinition;
use crate::termination::PlannerTerminationCondition;
use log::*;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// One benchmark invocation
pub struct BenchmarkRequest {
    pub max_time: f64,
    pub run_count: usize,
    pub display_progress: bool,
    pub save_console_output: bool,
}

struct BenchmarkRun {
    planner: String,
    run: usize,
    solved: bool,
    approximate: bool,
    plan_time: f64,
    path_length: f64,
}

/// Repeated-solve harness writing per-run records to a log file
pub struct Benchmark {
    pdef: Arc<ProblemDefinition>,
    experiment: String,
    planners: Vec<Arc<dyn Planner>>,
    results: Vec<BenchmarkRun>,
}

impl Benchmark {
    pub fn new(pdef: Arc<ProblemDefinition>) -> Self {
        Benchmark {
            pdef,
            experiment: String::new(),
            planners: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn clear_planners(&mut self) {
        self.planners.clear();
    }

    pub fn add_planner(&mut self, planner: Arc<dyn Planner>) {
        self.planners.push(planner);
    }

    pub fn set_experiment_name(&mut self, experiment: &str) {
        self.experiment = experiment.to_owned();
    }

    pub fn experiment_name(&self) -> &str {
        &self.experiment
    }

    /// Run every planner `run_count` times with a fresh timed termination
    /// condition per run
    pub fn benchmark(&mut self, req: &BenchmarkRequest) {
        self.results.clear();
        for planner in &self.planners {
            for run in 0..req.run_count {
                self.pdef.clear_solution_paths();
                let ptc = PlannerTerminationCondition::timed_seconds(req.max_time);
                let started = Instant::now();
                let status = planner.solve(&ptc);
                let plan_time = started.elapsed().as_secs_f64();
                let path_length = self.pdef.solution_path().map_or(f64::NAN, |p| p.length());
                if req.display_progress {
                    info!(
                        "{}: run {}/{} of {} finished in {:.3}s ({})",
                        self.experiment,
                        run + 1,
                        req.run_count,
                        planner.name(),
                        plan_time,
                        status
                    );
                }
                self.results.push(BenchmarkRun {
                    planner: planner.name().to_owned(),
                    run,
                    solved: status.solved(),
                    approximate: self.pdef.has_approximate_solution(),
                    plan_time,
                    path_length,
                });
            }
        }
    }

    /// Write the gathered records; with no path, `<experiment>.log` in the
    /// working directory is used
    pub fn save_results_to_file(&self, path: Option<&Path>) -> bool {
        let default_path = PathBuf::from(format!("{}.log", self.experiment));
        let path = path.unwrap_or(&default_path);
        let mut buffer = Vec::new();
        let header = writeln!(
            buffer,
            "Experiment {}\n{} runs\nplanner run solved approximate time length",
            self.experiment,
            self.results.len()
        );
        if header.is_err() {
            return false;
        }
        for record in &self.results {
            if writeln!(
                buffer,
                "{} {} {} {} {:.6} {:.6}",
                record.planner,
                record.run,
                record.solved as u8,
                record.approximate as u8,
                record.plan_time,
                record.path_length
            )
            .is_err()
            {
                return false;
            }
        }
        match fs::write(path, &buffer) {
            Ok(()) => {
                info!("benchmark results saved to {}", path.display());
                true
            }
            Err(err) => {
                error!("unable to save benchmark results to {}: {}", path.display(), err);
                false
            }
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

    #[test]
    fn runs_and_saves_records() {
        let model = Arc::new(planar_arm("arm", 2));
        let space = Arc::new(JointStateSpace::whole_body(model, "arm"));
        let si = Arc::new(SpaceInformation::new(space));
        si.setup();
        let pdef = Arc::new(ProblemDefinition::new(si.clone()));
        pdef.add_start_state(vec![0.0, 0.0]);
        pdef.set_goal(Some(Arc::new(TestGoal::new(vec![vec![1.0, 0.0]]))));

        let mut benchmark = Benchmark::new(pdef.clone());
        benchmark.add_planner(Arc::new(RrtConnectPlanner::new(si, pdef, "")));
        benchmark.set_experiment_name("arm_arm_scene_test");
        benchmark.benchmark(&BenchmarkRequest {
            max_time: 5.0,
            run_count: 2,
            display_progress: false,
            save_console_output: false,
        });
        let path = std::env::temp_dir().join("plait_benchmark_test.log");
        assert!(benchmark.save_results_to_file(Some(&path)));
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("arm_arm_scene_test"));
        assert!(contents.lines().count() >= 5);
        let _ = fs::remove_file(&path);
    }
}
