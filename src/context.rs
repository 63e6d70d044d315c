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
use crate::constraints::{merge_constraints, Constraints, KinematicConstraintSet};
use crate::errors::*;
use crate::follower::Follower;
use crate::goal::{ConstrainedGoalSampler, GoalRegion, GoalType};
use crate::parallel::ParallelPlan;
use crate::path::RobotTrajectory;
use crate::planner::{default_planner, Planner, PlannerAllocator, PlannerSelector, PlannerStatus};
use crate::problem::ProblemDefinition;
use crate::projection::parse_projection_evaluator;
use crate::sampling::{
    ConstrainedSampler, ConstraintApproximationLibrary, ConstraintSamplerManager,
    DefaultStateSampler, StateSampler, ValidConstrainedSampler,
};
use crate::scene::PlanningScene;
use crate::space::JointStateSpace;
use crate::space_information::SpaceInformation;
use crate::termination::PlannerTerminationCondition;
use log::*;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

/// Scalar limits of one context
#[derive(Debug, Clone, Copy)]
pub struct ContextLimits {
    pub max_goal_samples: usize,
    pub max_state_sampling_attempts: usize,
    pub max_goal_sampling_attempts: usize,
    pub max_planning_threads: usize,
    /// 0.0 selects a fraction of the space extent
    pub max_solution_segment_length: f64,
    pub minimum_waypoint_count: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        ContextLimits {
            max_goal_samples: 10,
            max_state_sampling_attempts: 4,
            max_goal_sampling_attempts: 1000,
            max_planning_threads: 4,
            max_solution_segment_length: 0.0,
            minimum_waypoint_count: 2,
        }
    }
}

/// Immutable bundle a context is created from
pub struct ContextSpecification {
    pub state_space: Arc<JointStateSpace>,
    pub planner_selector: PlannerSelector,
    pub constraint_sampler_manager: Option<Arc<dyn ConstraintSamplerManager>>,
    pub constraints_library: Option<Arc<ConstraintApproximationLibrary>>,
    pub config: HashMap<String, String>,
}

/// State shared between the context and its helpers
///
/// The state sampler allocator, the validity checker and the goal samplers
/// all read from here; owning edges only point into this struct, never
/// back out, so no reference cycle exists.
pub(crate) struct ContextShared {
    name: String,
    spec: ContextSpecification,
    scene: RwLock<Option<Arc<PlanningScene>>>,
    complete_initial_state: Arc<RwLock<Vec<f64>>>,
    path_constraints: RwLock<Option<Arc<KinematicConstraintSet>>>,
    path_constraints_msg: RwLock<Option<Constraints>>,
    limits: RwLock<ContextLimits>,
}

impl ContextShared {
    pub(crate) fn space(&self) -> &Arc<JointStateSpace> {
        &self.spec.state_space
    }

    pub(crate) fn scene(&self) -> Option<Arc<PlanningScene>> {
        self.scene.read().unwrap().clone()
    }

    pub(crate) fn path_constraints(&self) -> Option<Arc<KinematicConstraintSet>> {
        self.path_constraints.read().unwrap().clone()
    }

    fn path_constraints_msg(&self) -> Option<Constraints> {
        self.path_constraints_msg.read().unwrap().clone()
    }

    pub(crate) fn limits(&self) -> ContextLimits {
        *self.limits.read().unwrap()
    }

    /// Complete robot state with the group variables overwritten
    pub(crate) fn full_state_from(&self, state: &[f64]) -> Vec<f64> {
        let space = self.space();
        let mut full = self.complete_initial_state.read().unwrap().clone();
        if full.len() != space.model().dof() {
            full = vec![0.0; space.model().dof()];
        }
        space.copy_to_robot_state(&mut full, state);
        full
    }

    /// Sampler allocation policy: precomputed approximation, then the
    /// constraint-sampler manager, then the default space sampler
    ///
    /// Called concurrently from planner threads; reads shared fields only.
    fn alloc_path_constrained_sampler(&self, space: &Arc<JointStateSpace>) -> Box<dyn StateSampler> {
        debug!(
            "{}: Allocating a new state sampler (attempts to use path constraints)",
            self.name
        );
        if let Some(path_constraints) = self.path_constraints() {
            if let (Some(library), Some(msg)) =
                (&self.spec.constraints_library, self.path_constraints_msg())
            {
                if let Some(approximation) = library.get_constraint_approximation(&msg) {
                    if let Some(allocator) = approximation.state_sampler_allocator(&msg) {
                        debug!("Using precomputed state sampler (approximated constraint space)");
                        return allocator(space);
                    }
                }
            }
            if let (Some(manager), Some(scene)) =
                (&self.spec.constraint_sampler_manager, self.scene())
            {
                if let Some(sampler) =
                    manager.select_sampler(&scene, space, path_constraints.all_constraints())
                {
                    debug!("{}: Allocating specialized state sampler for state space", self.name);
                    return Box::new(ConstrainedSampler::new(
                        space,
                        sampler,
                        self.limits().max_state_sampling_attempts,
                    ));
                }
            }
        }
        debug!("{}: Allocating default state sampler for state space", self.name);
        Box::new(DefaultStateSampler::new(space))
    }
}

/// Coordinates one planning query: configuration, goal composition, solve
/// dispatch and solution post-processing
///
/// `set_planning_scene` and `set_complete_initial_state` must precede
/// `configure`; goal constraints need the scene in place. `configure`,
/// `solve`/`follow` and `clear` must not overlap, but `terminate_solve`
/// may be called from any thread at any time.
pub struct PlanningContext {
    shared: Arc<ContextShared>,
    si: Arc<SpaceInformation>,
    pdef: Arc<ProblemDefinition>,
    space_signature: Vec<u64>,
    goal_constraints: RwLock<Vec<Arc<KinematicConstraintSet>>>,
    goal_region: RwLock<Option<Arc<GoalRegion>>>,
    follow_samplers: RwLock<Vec<Arc<dyn ValidConstrainedSampler>>>,
    planner: RwLock<Option<Arc<dyn Planner>>>,
    planner_allocator: RwLock<Option<PlannerAllocator>>,
    ptc: Mutex<Option<PlannerTerminationCondition>>,
    last_plan_time: Mutex<f64>,
    last_simplify_time: Mutex<f64>,
}

impl PlanningContext {
    pub fn new(name: &str, spec: ContextSpecification) -> Self {
        let space = spec.state_space.clone();
        let shared = Arc::new(ContextShared {
            name: name.to_owned(),
            spec,
            scene: RwLock::new(None),
            complete_initial_state: Arc::new(RwLock::new(Vec::new())),
            path_constraints: RwLock::new(None),
            path_constraints_msg: RwLock::new(None),
            limits: RwLock::new(ContextLimits::default()),
        });
        let space_signature = space.signature();
        {
            let shared = shared.clone();
            space.set_state_sampler_allocator(Arc::new(
                move |space: &Arc<JointStateSpace>| shared.alloc_path_constrained_sampler(space),
            ));
        }
        let si = Arc::new(SpaceInformation::new(space));
        let pdef = Arc::new(ProblemDefinition::new(si.clone()));
        PlanningContext {
            shared,
            si,
            pdef,
            space_signature,
            goal_constraints: RwLock::new(Vec::new()),
            goal_region: RwLock::new(None),
            follow_samplers: RwLock::new(Vec::new()),
            planner: RwLock::new(None),
            planner_allocator: RwLock::new(None),
            ptc: Mutex::new(None),
            last_plan_time: Mutex::new(0.0),
            last_simplify_time: Mutex::new(0.0),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn group_name(&self) -> &str {
        self.shared.space().group_name()
    }

    pub fn space_information(&self) -> &Arc<SpaceInformation> {
        &self.si
    }

    pub fn problem_definition(&self) -> &Arc<ProblemDefinition> {
        &self.pdef
    }

    pub fn space_signature(&self) -> &[u64] {
        &self.space_signature
    }

    pub fn limits(&self) -> ContextLimits {
        self.shared.limits()
    }

    pub fn last_plan_time(&self) -> f64 {
        *self.last_plan_time.lock().unwrap()
    }

    pub fn last_simplify_time(&self) -> f64 {
        *self.last_simplify_time.lock().unwrap()
    }

    pub fn set_maximum_goal_samples(&self, value: usize) {
        self.shared.limits.write().unwrap().max_goal_samples = value;
    }

    pub fn set_maximum_state_sampling_attempts(&self, value: usize) {
        self.shared.limits.write().unwrap().max_state_sampling_attempts = value;
    }

    pub fn set_maximum_goal_sampling_attempts(&self, value: usize) {
        self.shared.limits.write().unwrap().max_goal_sampling_attempts = value;
    }

    pub fn set_maximum_planning_threads(&self, value: usize) {
        self.shared.limits.write().unwrap().max_planning_threads = value;
    }

    pub fn set_maximum_solution_segment_length(&self, value: f64) {
        self.shared.limits.write().unwrap().max_solution_segment_length = value;
    }

    pub fn set_minimum_waypoint_count(&self, value: usize) {
        self.shared.limits.write().unwrap().minimum_waypoint_count = value;
    }

    pub fn set_planning_scene(&self, scene: Arc<PlanningScene>) {
        *self.shared.scene.write().unwrap() = Some(scene);
    }

    pub fn set_complete_initial_state(&self, full_positions: &[f64]) {
        *self.shared.complete_initial_state.write().unwrap() = full_positions.to_vec();
    }

    pub fn complete_initial_state(&self) -> Vec<f64> {
        self.shared.complete_initial_state.read().unwrap().clone()
    }

    /// Workspace bounds; only positional variables are affected
    pub fn set_planning_volume(&self, min_corner: [f64; 3], max_corner: [f64; 3]) {
        if min_corner.iter().chain(max_corner.iter()).all(|v| *v == 0.0) {
            warn!("It looks like the planning volume was not specified.");
        }
        debug!(
            "{}: Setting planning volume (affects positional joints only) to x = [{}, {}], \
             y = [{}, {}], z = [{}, {}]",
            self.name(),
            min_corner[0],
            max_corner[0],
            min_corner[1],
            max_corner[1],
            min_corner[2],
            max_corner[2]
        );
        self.shared.space().set_planning_volume(min_corner, max_corner);
    }

    /// Install path constraints; sampler allocation degrades gracefully if
    /// they cannot be sampled, so this never fails
    pub fn set_path_constraints(&self, msg: &Constraints) -> Result<()> {
        let mut kset = KinematicConstraintSet::new(self.shared.space().model().clone());
        kset.add(msg);
        *self.shared.path_constraints.write().unwrap() = Some(Arc::new(kset));
        *self.shared.path_constraints_msg.write().unwrap() = Some(msg.clone());
        Ok(())
    }

    /// Merge each goal with the path constraints, drop empty sets, and
    /// install the composed goal region
    pub fn set_goal_constraints(
        &self,
        goal_constraints: &[Constraints],
        path_constraints: Option<&Constraints>,
    ) -> Result<()> {
        let model = self.shared.space().model().clone();
        let mut ksets = Vec::new();
        for goal in goal_constraints {
            let merged = match path_constraints {
                Some(path) => merge_constraints(goal, path),
                None => goal.clone(),
            };
            let mut kset = KinematicConstraintSet::new(model.clone());
            kset.add(&merged);
            if !kset.is_empty() {
                ksets.push(Arc::new(kset));
            }
        }
        if ksets.is_empty() {
            warn!(
                "{}: No goal constraints specified. There is no problem to solve.",
                self.name()
            );
            return Err(Error::InvalidGoalConstraints);
        }
        *self.goal_constraints.write().unwrap() = ksets;
        match self.construct_goal() {
            Some(goal) => {
                *self.goal_region.write().unwrap() = Some(goal.clone());
                self.pdef.set_goal(Some(goal));
                Ok(())
            }
            None => Err(Error::InvalidGoalConstraints),
        }
    }

    /// Build the goal region from the stored constraint sets
    ///
    /// One sampler per set; several samplers multiplex uniformly.
    fn construct_goal(&self) -> Option<Arc<GoalRegion>> {
        let mut goals = Vec::new();
        let scene = self.shared.scene();
        for kset in self.goal_constraints.read().unwrap().iter() {
            let sampler = match (&self.shared.spec.constraint_sampler_manager, &scene) {
                (Some(manager), Some(scene)) => {
                    manager.select_sampler(scene, self.shared.space(), kset.all_constraints())
                }
                _ => None,
            };
            if let Some(sampler) = sampler {
                goals.push(Arc::new(ConstrainedGoalSampler::new(
                    self.si.clone(),
                    self.shared.clone(),
                    kset.clone(),
                    sampler,
                )));
            }
        }
        if goals.is_empty() {
            error!("Unable to construct goal representation");
            return None;
        }
        Some(Arc::new(if goals.len() == 1 {
            GoalRegion::Single(goals.pop().unwrap())
        } else {
            GoalRegion::Mux(goals)
        }))
    }

    /// The goal composed by the last `set_goal_constraints`
    pub fn goal_region(&self) -> Option<Arc<GoalRegion>> {
        self.goal_region.read().unwrap().clone()
    }

    /// Stratum samplers consumed by `follow`
    pub fn set_follow_samplers(&self, samplers: Vec<Arc<dyn ValidConstrainedSampler>>) {
        *self.follow_samplers.write().unwrap() = samplers;
    }

    /// Install the start state and validity checker, apply the planner
    /// configuration, and set up the space information
    pub fn configure(&self) -> Result<()> {
        let start = {
            let full = self.shared.complete_initial_state.read().unwrap();
            if full.len() != self.shared.space().model().dof() {
                return Err(Error::from(
                    "complete initial state not set; call set_complete_initial_state first",
                ));
            }
            self.shared.space().copy_from_robot_state(&full)
        };
        self.pdef.clear_start_states();
        self.pdef.add_start_state(start);
        self.si.set_state_validity_checker(Some(Arc::new(
            crate::validity::ContextValidityChecker::new(self.shared.clone()),
        )));
        self.use_config();
        // the follower drives its own setup from the stratum samplers
        if self.pdef.goal().is_some() && self.follow_samplers.read().unwrap().is_empty() {
            self.si.setup();
        }
        Ok(())
    }

    /// Consume the specification's configuration map
    fn use_config(&self) {
        if self.shared.spec.config.is_empty() {
            return;
        }
        let mut cfg = self.shared.spec.config.clone();
        if let Some(peval) = cfg.remove("projection_evaluator") {
            self.set_projection_evaluator(peval.trim());
        }
        if cfg.is_empty() {
            return;
        }
        match cfg.remove("type") {
            None => {
                if self.name() != self.group_name() {
                    warn!(
                        "{}: Attribute 'type' not specified in planner configuration",
                        self.name()
                    );
                }
            }
            Some(planner_type) => {
                if let Some(allocator) = (self.shared.spec.planner_selector)(&planner_type) {
                    *self.planner_allocator.write().unwrap() = Some(allocator);
                    info!(
                        "Planner configuration '{}' will use planner '{}'. Additional \
                         configuration parameters will be set when the planner is constructed.",
                        self.name(),
                        planner_type
                    );
                }
            }
        }
        // set the parameters after a setup so derived values exist, then
        // run setup again for possibly new values
        self.si.setup();
        self.si.set_params(&cfg);
        self.si.setup();
    }

    pub fn set_projection_evaluator(&self, peval: &str) {
        if let Some(projection) = parse_projection_evaluator(
            self.name(),
            peval,
            self.shared.space(),
            self.shared.complete_initial_state.clone(),
        ) {
            self.shared.space().register_default_projection(projection);
        }
    }

    pub fn set_verbose_state_validity_checks(&self, verbose: bool) {
        if let Some(checker) = self.si.state_validity_checker() {
            checker.set_verbose(verbose);
        }
    }

    /// Release the problem, goals, validity checker and constraints; the
    /// context stays bound to its state space and can be reconfigured
    pub fn clear(&self) {
        *self.planner.write().unwrap() = None;
        self.pdef.clear_solution_paths();
        self.pdef.clear_start_states();
        self.pdef.set_goal(None);
        self.si.set_state_validity_checker(None);
        *self.shared.path_constraints.write().unwrap() = None;
        *self.shared.path_constraints_msg.write().unwrap() = None;
        self.goal_constraints.write().unwrap().clear();
        *self.goal_region.write().unwrap() = None;
    }

    fn alloc_planner(&self) -> Result<Arc<dyn Planner>> {
        let goal = self
            .pdef
            .goal()
            .ok_or_else(|| Error::from("no goal set; call set_goal_constraints first"))?;
        Ok(match self.planner_allocator.read().unwrap().clone() {
            Some(allocator) => allocator(self.si.clone(), self.pdef.clone(), self.name()),
            None => default_planner(self.si.clone(), self.pdef.clone(), goal.as_ref(), self.name()),
        })
    }

    fn ensure_planner(&self) -> Result<Arc<dyn Planner>> {
        if let Some(planner) = self.planner.read().unwrap().clone() {
            return Ok(planner);
        }
        let planner = self.alloc_planner()?;
        *self.planner.write().unwrap() = Some(planner.clone());
        Ok(planner)
    }

    fn add_planner_instances(&self, plan: &ParallelPlan, count: usize) -> Result<()> {
        for _ in 0..count {
            plan.add_planner(self.alloc_planner()?);
        }
        Ok(())
    }

    /// Solve once, or `count` times across at most `max_planning_threads`
    /// parallel planner instances per batch
    pub fn solve(&self, timeout: f64, count: usize) -> Result<()> {
        let started = Instant::now();
        self.pre_solve();
        let result = self.dispatch_solve(timeout, count, started);
        self.post_solve();
        let status = result?;
        if status.solved() {
            Ok(())
        } else {
            Err(status.into())
        }
    }

    fn dispatch_solve(
        &self,
        timeout: f64,
        count: usize,
        started: Instant,
    ) -> Result<PlannerStatus> {
        if count <= 1 {
            debug!("{}: Solving the planning problem once...", self.name());
            let planner = self.ensure_planner()?;
            let ptc = PlannerTerminationCondition::timed_seconds(
                timeout - started.elapsed().as_secs_f64(),
            );
            self.register_termination_condition(&ptc);
            let status = planner.solve(&ptc);
            *self.last_plan_time.lock().unwrap() = started.elapsed().as_secs_f64();
            self.unregister_termination_condition();
            return Ok(status);
        }

        debug!("{}: Solving the planning problem {} times...", self.name(), count);
        let threads = self.shared.limits().max_planning_threads.max(1);
        let plan = ParallelPlan::new(self.pdef.clone());
        let ptc = PlannerTerminationCondition::timed_seconds(
            timeout - started.elapsed().as_secs_f64(),
        );
        self.register_termination_condition(&ptc);
        let status = if count <= threads {
            self.add_planner_instances(&plan, count)
                .map(|()| plan.solve(&ptc))
        } else {
            self.solve_batched(&plan, &ptc, count, threads)
        };
        *self.last_plan_time.lock().unwrap() = started.elapsed().as_secs_f64();
        self.unregister_termination_condition();
        status
    }

    /// Batches of `threads` planners, remainder last; a failed batch masks
    /// earlier successes
    fn solve_batched(
        &self,
        plan: &ParallelPlan,
        ptc: &PlannerTerminationCondition,
        count: usize,
        threads: usize,
    ) -> Result<PlannerStatus> {
        let mut status = PlannerStatus::ExactSolution;
        for _ in 0..count / threads {
            if ptc.eval() {
                break;
            }
            plan.clear_planners();
            self.add_planner_instances(plan, threads)?;
            let batch = plan.solve(ptc);
            if !batch.solved() {
                status = batch;
            }
        }
        let remainder = count % threads;
        if remainder > 0 && !ptc.eval() {
            plan.clear_planners();
            self.add_planner_instances(plan, remainder)?;
            let batch = plan.solve(ptc);
            if !batch.solved() {
                status = batch;
            }
        }
        Ok(status)
    }

    /// Thread a path through the configured stratum samplers
    pub fn follow(&self, timeout: f64, _count: usize) -> Result<()> {
        let started = Instant::now();
        self.pre_solve();
        let mut follower = Follower::new(self.si.clone());
        follower.set_problem_definition(self.pdef.clone());
        let ptc = PlannerTerminationCondition::timed_seconds(timeout);
        self.register_termination_condition(&ptc);
        let samplers = self.follow_samplers.read().unwrap().clone();
        let status = follower.follow(&samplers, &ptc);
        *self.last_plan_time.lock().unwrap() = started.elapsed().as_secs_f64();
        self.unregister_termination_condition();
        self.post_solve();
        if status.solved() {
            Ok(())
        } else {
            Err(status.into())
        }
    }

    fn pre_solve(&self) {
        self.pdef.clear_solution_paths();
        if let Some(planner) = self.planner.read().unwrap().as_ref() {
            planner.clear();
        }
        if let Some(goal) = self.pdef.goal() {
            if goal.has_type(GoalType::LazySamples) {
                if let Some(lazy) = goal.as_lazy() {
                    // just in case sampling is not started
                    lazy.start_sampling();
                }
            }
        }
        self.si.reset_motion_counter();
    }

    fn post_solve(&self) {
        if let Some(goal) = self.pdef.goal() {
            if goal.has_type(GoalType::LazySamples) {
                if let Some(lazy) = goal.as_lazy() {
                    lazy.stop_sampling();
                }
            }
        }
        debug!(
            "There were {} valid motions and {} invalid motions.",
            self.si.valid_motion_count(),
            self.si.invalid_motion_count()
        );
        if self.pdef.has_approximate_solution() {
            warn!("Computed solution is approximate");
        }
    }

    fn register_termination_condition(&self, ptc: &PlannerTerminationCondition) {
        *self.ptc.lock().unwrap() = Some(ptc.clone());
    }

    fn unregister_termination_condition(&self) {
        *self.ptc.lock().unwrap() = None;
    }

    /// Signal the termination condition of a solve in progress, if any;
    /// callable from any thread
    pub fn terminate_solve(&self) {
        if let Some(ptc) = self.ptc.lock().unwrap().as_ref() {
            ptc.terminate();
        }
    }

    /// Write the solution as a robot trajectory with zero dwell times
    pub fn get_solution_path(&self, trajectory: &mut RobotTrajectory) -> bool {
        trajectory.clear();
        let path = match self.pdef.solution_path() {
            Some(path) => path,
            None => return false,
        };
        let mut full = self.shared.complete_initial_state.read().unwrap().clone();
        if full.len() != self.shared.space().model().dof() {
            full = vec![0.0; self.shared.space().model().dof()];
        }
        for state in path.states() {
            self.shared.space().copy_to_robot_state(&mut full, state);
            trajectory.add_suffix_waypoint(full.clone(), 0.0);
        }
        true
    }

    /// Shortcut-smooth the solution within the timeout
    pub fn simplify_solution(&self, timeout: f64) {
        let started = Instant::now();
        self.pdef.modify_solution_path(|path| path.shortcut(timeout));
        *self.last_simplify_time.lock().unwrap() = started.elapsed().as_secs_f64();
    }

    /// Resample the solution to
    /// `max(round(length / max_segment_length), minimum_waypoint_count)`
    /// states
    pub fn interpolate_solution(&self) {
        let limits = self.shared.limits();
        let segment = if limits.max_solution_segment_length > 0.0 {
            limits.max_solution_segment_length
        } else {
            self.shared.space().maximum_extent() / 100.0
        };
        self.pdef.modify_solution_path(|path| {
            let count = ((path.length() / segment + 0.5).floor() as usize)
                .max(limits.minimum_waypoint_count);
            path.interpolate(count);
        });
    }

    /// Benchmark the configured planner; returns save success
    pub fn benchmark(&self, timeout: f64, count: usize, filename: &str) -> bool {
        let mut benchmark = crate::benchmark::Benchmark::new(self.pdef.clone());
        self.si.setup();
        let planner = match self.ensure_planner() {
            Ok(planner) => planner,
            Err(err) => {
                error!("{}: cannot benchmark: {}", self.name(), err);
                return false;
            }
        };
        benchmark.add_planner(planner);
        let scene_name = self
            .shared
            .scene()
            .map_or_else(|| "none".to_owned(), |s| s.name().to_owned());
        benchmark.set_experiment_name(&format!(
            "{}_{}_{}_{}",
            self.shared.space().model().name(),
            self.group_name(),
            scene_name,
            self.name()
        ));
        benchmark.benchmark(&crate::benchmark::BenchmarkRequest {
            max_time: timeout,
            run_count: count,
            display_progress: true,
            save_console_output: false,
        });
        if filename.is_empty() {
            benchmark.save_results_to_file(None)
        } else {
            benchmark.save_results_to_file(Some(Path::new(filename)))
        }
    }
}
