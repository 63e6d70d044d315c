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
use crate::model::RobotModel;
use log::*;
use nalgebra as na;
use std::sync::Arc;

/// Bound on a single joint: `position - tolerance_below` to
/// `position + tolerance_above`
#[derive(Debug, Clone, PartialEq)]
pub struct JointConstraint {
    pub joint_name: String,
    pub position: f64,
    pub tolerance_above: f64,
    pub tolerance_below: f64,
}

impl JointConstraint {
    pub fn new(joint_name: &str, position: f64, tolerance: f64) -> Self {
        JointConstraint {
            joint_name: joint_name.to_owned(),
            position,
            tolerance_above: tolerance,
            tolerance_below: tolerance,
        }
    }

    fn min(&self) -> f64 {
        self.position - self.tolerance_below
    }

    fn max(&self) -> f64 {
        self.position + self.tolerance_above
    }
}

/// Keeps a link's position within a sphere around a target point
#[derive(Debug, Clone, PartialEq)]
pub struct PositionConstraint {
    pub link_name: String,
    pub target: [f64; 3],
    pub tolerance: f64,
}

/// Constraint message, also used as a cache key for approximations
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Constraints {
    pub name: String,
    pub joint_constraints: Vec<JointConstraint>,
    pub position_constraints: Vec<PositionConstraint>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.joint_constraints.is_empty() && self.position_constraints.is_empty()
    }
}

/// Merge two constraint messages
///
/// Joint constraints on the same joint are intersected (the tighter interval
/// wins); everything else is concatenated. Used to fold the global path
/// constraints into each goal.
pub fn merge_constraints(first: &Constraints, second: &Constraints) -> Constraints {
    let mut merged = first.clone();
    for jc in &second.joint_constraints {
        if let Some(existing) = merged
            .joint_constraints
            .iter_mut()
            .find(|c| c.joint_name == jc.joint_name)
        {
            let min = existing.min().max(jc.min());
            let max = existing.max().min(jc.max());
            existing.position = (min + max) * 0.5;
            existing.tolerance_below = existing.position - min;
            existing.tolerance_above = max - existing.position;
        } else {
            merged.joint_constraints.push(jc.clone());
        }
    }
    merged
        .position_constraints
        .extend(second.position_constraints.iter().cloned());
    if merged.name.is_empty() {
        merged.name = second.name.clone();
    }
    merged
}

/// Constraint message bound to a model, able to decide satisfaction
pub struct KinematicConstraintSet {
    model: Arc<RobotModel>,
    constraints: Constraints,
}

impl KinematicConstraintSet {
    pub fn new(model: Arc<RobotModel>) -> Self {
        KinematicConstraintSet {
            model,
            constraints: Constraints::default(),
        }
    }

    pub fn add(&mut self, constraints: &Constraints) {
        for jc in &constraints.joint_constraints {
            if self.model.joint_index(&jc.joint_name).is_none() {
                warn!("joint constraint on unknown joint `{}`", jc.joint_name);
            }
            self.constraints.joint_constraints.push(jc.clone());
        }
        for pc in &constraints.position_constraints {
            if !self.model.has_link(&pc.link_name) {
                warn!("position constraint on unknown link `{}`", pc.link_name);
            }
            self.constraints.position_constraints.push(pc.clone());
        }
        if self.constraints.name.is_empty() {
            self.constraints.name = constraints.name.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn all_constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Decide whether a full robot state satisfies every constraint
    ///
    /// Constraints naming unknown joints or links cannot be satisfied.
    pub fn decide(&self, full_positions: &[f64]) -> bool {
        for jc in &self.constraints.joint_constraints {
            match self.model.joint_index(&jc.joint_name) {
                Some(index) => {
                    let value = full_positions[index];
                    if value < jc.min() - 1e-9 || value > jc.max() + 1e-9 {
                        return false;
                    }
                }
                None => return false,
            }
        }
        for pc in &self.constraints.position_constraints {
            match self.model.link_pose(full_positions, &pc.link_name) {
                Some(pose) => {
                    let target = na::Vector3::new(pc.target[0], pc.target[1], pc.target[2]);
                    if (pose.translation.vector - target).norm() > pc.tolerance {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::planar_arm;

    #[test]
    fn merge_intersects_joint_constraints() {
        let goal = Constraints {
            joint_constraints: vec![JointConstraint::new("j0", 1.0, 0.5)],
            ..Default::default()
        };
        let path = Constraints {
            joint_constraints: vec![
                JointConstraint::new("j0", 0.8, 0.5),
                JointConstraint::new("j1", 0.0, 0.1),
            ],
            ..Default::default()
        };
        let merged = merge_constraints(&goal, &path);
        assert_eq!(merged.joint_constraints.len(), 2);
        let j0 = &merged.joint_constraints[0];
        assert!((j0.min() - 0.5).abs() < 1e-12);
        assert!((j0.max() - 1.3).abs() < 1e-12);
    }

    #[test]
    fn decide_checks_joint_intervals() {
        let model = Arc::new(planar_arm("arm", 2));
        let mut kset = KinematicConstraintSet::new(model);
        kset.add(&Constraints {
            joint_constraints: vec![JointConstraint::new("j0", 1.0, 0.25)],
            ..Default::default()
        });
        assert!(!kset.is_empty());
        assert!(kset.decide(&[1.1, 0.0]));
        assert!(!kset.decide(&[0.5, 0.0]));
    }

    #[test]
    fn decide_checks_link_positions() {
        let model = Arc::new(planar_arm("arm", 2));
        let tip = model.link_pose(&[0.0, 0.0], "tip").unwrap();
        let mut kset = KinematicConstraintSet::new(model);
        kset.add(&Constraints {
            position_constraints: vec![PositionConstraint {
                link_name: "tip".to_owned(),
                target: [
                    tip.translation.vector[0],
                    tip.translation.vector[1],
                    tip.translation.vector[2],
                ],
                tolerance: 0.05,
            }],
            ..Default::default()
        });
        assert!(kset.decide(&[0.0, 0.0]));
        assert!(!kset.decide(&[1.5, 1.5]));
    }
}
