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
//! Fixtures shared by the unit tests: programmatic robots, scripted
//! samplers and a fixed goal region.

use crate::funcs;
use crate::goal::{Goal, GoalSampleableRegion, GoalType};
use crate::model::RobotModel;
use crate::sampling::ValidConstrainedSampler;
use crate::space::State;
use nalgebra as na;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Planar arm with `n` z-rotation joints `j0..` and a fixed `tip`
pub fn planar_arm(name: &str, n: usize) -> RobotModel {
    assert!(n >= 1);
    let mut nodes: Vec<k::Node<f64>> = Vec::with_capacity(n);
    for i in 0..n {
        let node = k::NodeBuilder::new()
            .name(&format!("j{}", i))
            .joint_type(k::JointType::Rotational {
                axis: na::Vector3::z_axis(),
            })
            .translation(na::Translation3::new(
                if i == 0 { 0.0 } else { 0.5 },
                0.0,
                0.0,
            ))
            .limits(Some(k::joint::Range::new(-3.0, 3.0)))
            .into_node();
        nodes.push(node);
    }
    for i in 1..nodes.len() {
        nodes[i].set_parent(&nodes[i - 1]);
    }
    let tip = k::NodeBuilder::new()
        .name("tip")
        .joint_type(k::JointType::Fixed)
        .translation(na::Translation3::new(0.5, 0.0, 0.0))
        .into_node();
    tip.set_parent(nodes.last().unwrap());
    RobotModel::from_chain(name, k::Chain::from_root(nodes.remove(0)))
}

/// Two linear axes plus an angular wrist, for planning-volume tests
pub fn cartesian_gantry(name: &str) -> RobotModel {
    let x = k::NodeBuilder::new()
        .name("x")
        .joint_type(k::JointType::Linear {
            axis: na::Vector3::x_axis(),
        })
        .limits(Some(k::joint::Range::new(-10.0, 10.0)))
        .into_node();
    let y = k::NodeBuilder::new()
        .name("y")
        .joint_type(k::JointType::Linear {
            axis: na::Vector3::y_axis(),
        })
        .limits(Some(k::joint::Range::new(-10.0, 10.0)))
        .into_node();
    let wrist = k::NodeBuilder::new()
        .name("wrist")
        .joint_type(k::JointType::Rotational {
            axis: na::Vector3::z_axis(),
        })
        .translation(na::Translation3::new(0.0, 0.0, 0.1))
        .limits(Some(k::joint::Range::new(-3.0, 3.0)))
        .into_node();
    y.set_parent(&x);
    wrist.set_parent(&y);
    RobotModel::from_chain(name, k::Chain::from_root(x))
}

/// Sampleable goal region over a fixed list of states
pub struct TestGoal {
    states: Vec<State>,
    max_samples: usize,
    next: Mutex<usize>,
}

impl TestGoal {
    pub fn new(states: Vec<State>) -> Self {
        TestGoal {
            max_samples: states.len() * 16,
            states,
            next: Mutex::new(0),
        }
    }
}

impl Goal for TestGoal {
    fn has_type(&self, goal_type: GoalType) -> bool {
        goal_type == GoalType::SampleableRegion
    }

    fn is_satisfied(&self, state: &[f64]) -> bool {
        self.states.iter().any(|s| funcs::distance(s, state) < 1e-9)
    }

    fn as_sampleable(&self) -> Option<&dyn GoalSampleableRegion> {
        Some(self)
    }
}

impl GoalSampleableRegion for TestGoal {
    fn sample_goal(&self, state: &mut State) -> bool {
        if self.states.is_empty() {
            return false;
        }
        let mut next = self.next.lock().unwrap();
        *state = self.states[*next % self.states.len()].clone();
        *next += 1;
        true
    }

    fn max_sample_count(&self) -> usize {
        self.max_samples
    }
}

/// Stratum sampler drawing uniformly from an axis-aligned box
pub struct BoxStratumSampler {
    lo: Vec<f64>,
    hi: Vec<f64>,
    rng: Mutex<StdRng>,
}

impl BoxStratumSampler {
    pub fn new(lo: &[f64], hi: &[f64]) -> Self {
        assert_eq!(lo.len(), hi.len());
        BoxStratumSampler {
            lo: lo.to_vec(),
            hi: hi.to_vec(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl ValidConstrainedSampler for BoxStratumSampler {
    fn sample(&self, state: &mut State) -> bool {
        let mut rng = self.rng.lock().unwrap();
        state.clear();
        state.extend(
            self.lo
                .iter()
                .zip(self.hi.iter())
                .map(|(lo, hi)| if hi > lo { rng.gen_range(*lo..*hi) } else { *lo }),
        );
        true
    }

    fn project(&self, state: &mut State) -> bool {
        if state.len() != self.lo.len() {
            return false;
        }
        for ((value, lo), hi) in state.iter_mut().zip(self.lo.iter()).zip(self.hi.iter()) {
            *value = value.max(*lo).min(*hi);
        }
        true
    }
}

/// Stratum sampler that replays scripted states, then a fallback
pub struct SeqStratumSampler {
    queue: Mutex<VecDeque<State>>,
    fallback: State,
}

impl SeqStratumSampler {
    pub fn new(scripted: Vec<State>, fallback: State) -> Self {
        SeqStratumSampler {
            queue: Mutex::new(scripted.into()),
            fallback,
        }
    }
}

impl ValidConstrainedSampler for SeqStratumSampler {
    fn sample(&self, state: &mut State) -> bool {
        let mut queue = self.queue.lock().unwrap();
        *state = queue.pop_front().unwrap_or_else(|| self.fallback.clone());
        true
    }

    fn project(&self, _state: &mut State) -> bool {
        false
    }
}
