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
use crate::space::State;
use crate::space_information::SpaceInformation;
use std::sync::Arc;
use std::time::Instant;

/// Piecewise-linear path through the configuration space
#[derive(Clone)]
pub struct PathGeometric {
    si: Arc<SpaceInformation>,
    states: Vec<State>,
}

impl PathGeometric {
    pub fn new(si: Arc<SpaceInformation>) -> Self {
        PathGeometric {
            si,
            states: Vec::new(),
        }
    }

    pub fn from_states(si: Arc<SpaceInformation>, states: Vec<State>) -> Self {
        PathGeometric { si, states }
    }

    pub fn append(&mut self, state: State) {
        self.states.push(state);
    }

    pub fn reverse(&mut self) {
        self.states.reverse();
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, index: usize) -> &State {
        &self.states[index]
    }

    /// Sum of segment lengths
    pub fn length(&self) -> f64 {
        self.states
            .windows(2)
            .map(|pair| self.si.space().distance(&pair[0], &pair[1]))
            .sum()
    }

    /// Every consecutive pair passes the motion check
    pub fn is_valid(&self) -> bool {
        self.states.iter().all(|s| self.si.is_valid(s))
            && self
                .states
                .windows(2)
                .all(|pair| self.si.check_motion(&pair[0], &pair[1]))
    }

    /// Resample so the path has `count` states, extra states distributed
    /// over the segments in proportion to their length
    ///
    /// A request smaller than the current state count leaves the path
    /// unchanged.
    pub fn interpolate(&mut self, count: usize) {
        if self.states.len() < 2 || count <= self.states.len() {
            return;
        }
        let lengths: Vec<f64> = self
            .states
            .windows(2)
            .map(|pair| self.si.space().distance(&pair[0], &pair[1]))
            .collect();
        let total: f64 = lengths.iter().sum();
        let extra = count - self.states.len();
        // per-segment share, remainders to the longest segments first
        let mut per_segment = vec![0usize; lengths.len()];
        if total > 0.0 {
            let mut fractions: Vec<(usize, f64)> = Vec::with_capacity(lengths.len());
            for (i, length) in lengths.iter().enumerate() {
                let exact = extra as f64 * length / total;
                per_segment[i] = exact.floor() as usize;
                fractions.push((i, exact - exact.floor()));
            }
            let assigned: usize = per_segment.iter().sum();
            let mut rest = extra - assigned;
            fractions.sort_by(|a, b| {
                b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal)
            });
            for (i, _) in fractions {
                if rest == 0 {
                    break;
                }
                per_segment[i] += 1;
                rest -= 1;
            }
        } else {
            per_segment[0] = extra;
        }

        let mut states = Vec::with_capacity(count);
        let mut probe = Vec::new();
        for (i, pair) in self.states.windows(2).enumerate() {
            states.push(pair[0].clone());
            let n = per_segment[i];
            for j in 1..=n {
                self.si
                    .space()
                    .interpolate(&pair[0], &pair[1], j as f64 / (n + 1) as f64, &mut probe);
                states.push(probe.clone());
            }
        }
        states.push(self.states.last().cloned().unwrap_or_default());
        self.states = states;
    }

    /// Shortcut smoothing, bounded by `timeout` seconds
    pub fn shortcut(&mut self, timeout: f64) {
        if self.states.len() < 3 {
            return;
        }
        let start = Instant::now();
        let si = self.si.clone();
        let resolution = si.motion_resolution();
        while start.elapsed().as_secs_f64() < timeout {
            rrt::smooth_path(
                &mut self.states,
                |state: &[f64]| si.is_valid(state),
                resolution,
                10,
            );
            if self.states.len() <= 2 {
                break;
            }
        }
    }
}

/// Trajectory over the full robot, one dwell time per waypoint
#[derive(Clone, Default)]
pub struct RobotTrajectory {
    waypoints: Vec<(Vec<f64>, f64)>,
}

impl RobotTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
    }

    pub fn add_suffix_waypoint(&mut self, full_positions: Vec<f64>, dwell: f64) {
        self.waypoints.push((full_positions, dwell));
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoint(&self, index: usize) -> &[f64] {
        &self.waypoints[index].0
    }

    pub fn dwell(&self, index: usize) -> f64 {
        self.waypoints[index].1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::JointStateSpace;
    use crate::testing::planar_arm;

    fn make_si() -> Arc<SpaceInformation> {
        let model = Arc::new(planar_arm("arm", 2));
        let space = Arc::new(JointStateSpace::whole_body(model, "arm"));
        let si = Arc::new(SpaceInformation::new(space));
        si.setup();
        si
    }

    #[test]
    fn length_is_sum_of_segments() {
        let si = make_si();
        let path = PathGeometric::from_states(
            si,
            vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0]],
        );
        assert!((path.length() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn interpolate_reaches_requested_count() {
        let si = make_si();
        let mut path = PathGeometric::from_states(
            si,
            vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0]],
        );
        path.interpolate(9);
        assert_eq!(path.state_count(), 9);
        // endpoints survive
        assert_eq!(path.state(0), &vec![0.0, 0.0]);
        assert_eq!(path.state(8), &vec![1.0, 1.0]);
        // no interior jump longer than the original segments
        for pair in path.states().windows(2) {
            assert!(crate::funcs::distance(&pair[0], &pair[1]) < 0.5);
        }
        // a smaller request is a no-op
        path.interpolate(2);
        assert_eq!(path.state_count(), 9);
    }

    #[test]
    fn reverse_flips_order() {
        let si = make_si();
        let mut path =
            PathGeometric::from_states(si, vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
        path.reverse();
        assert_eq!(path.state(0), &vec![1.0, 1.0]);
    }
}
