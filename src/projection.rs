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
use crate::space::JointStateSpace;
use log::*;
use std::sync::{Arc, RwLock};

/// Maps states to a low-dimensional euclidean projection
pub trait ProjectionEvaluator: Send + Sync {
    fn dimension(&self) -> usize;
    fn project(&self, state: &[f64]) -> Vec<f64>;
}

/// Projects onto the 3D position of one link
pub struct LinkPoseProjection {
    space: Arc<JointStateSpace>,
    link_name: String,
    reference_state: Arc<RwLock<Vec<f64>>>,
}

impl ProjectionEvaluator for LinkPoseProjection {
    fn dimension(&self) -> usize {
        3
    }

    fn project(&self, state: &[f64]) -> Vec<f64> {
        let model = self.space.model();
        let mut full = self.reference_state.read().unwrap().clone();
        if full.len() != model.dof() {
            full = vec![0.0; model.dof()];
        }
        self.space.copy_to_robot_state(&mut full, state);
        match model.link_pose(&full, &self.link_name) {
            Some(pose) => vec![
                pose.translation.vector[0],
                pose.translation.vector[1],
                pose.translation.vector[2],
            ],
            None => vec![0.0; 3],
        }
    }
}

/// Projects onto selected joint variables
pub struct JointValueProjection {
    var_indices: Vec<usize>,
}

impl ProjectionEvaluator for JointValueProjection {
    fn dimension(&self) -> usize {
        self.var_indices.len()
    }

    fn project(&self, state: &[f64]) -> Vec<f64> {
        self.var_indices.iter().map(|i| state[*i]).collect()
    }
}

/// Parse a projection description of the form `link(<name>)` or
/// `joints(<n1>,<n2>,...)`
///
/// `name` is the planner-configuration name, used only for log prefixes.
pub fn parse_projection_evaluator(
    name: &str,
    peval: &str,
    space: &Arc<JointStateSpace>,
    reference_state: Arc<RwLock<Vec<f64>>>,
) -> Option<Arc<dyn ProjectionEvaluator>> {
    let peval = peval.trim();
    if let Some(link_name) = strip_call(peval, "link") {
        if space.model().has_link(link_name) {
            return Some(Arc::new(LinkPoseProjection {
                space: space.clone(),
                link_name: link_name.to_owned(),
                reference_state,
            }));
        }
        error!(
            "Attempted to set projection evaluator with respect to position of link '{}', \
             but that link is not known to the kinematic model.",
            link_name
        );
    } else if let Some(joints) = strip_call(peval, "joints") {
        let mut var_indices = Vec::new();
        for v in joints.replace(',', " ").split_whitespace() {
            if let Some(index) = space.var_index(v) {
                var_indices.push(index);
            } else {
                match space.model().joint_dof(v) {
                    Some(0) => {
                        warn!("{}: Ignoring joint '{}' in projection since it has 0 DOF", name, v)
                    }
                    _ => error!(
                        "{}: Attempted to set projection evaluator with respect to value of joint \
                         '{}', but that joint is not known to the group '{}'.",
                        name,
                        v,
                        space.group_name()
                    ),
                }
            }
        }
        if var_indices.is_empty() {
            error!("{}: No valid joints specified for joint projection", name);
        } else {
            return Some(Arc::new(JointValueProjection { var_indices }));
        }
    } else {
        error!("Unable to allocate projection evaluator based on description: '{}'", peval);
    }
    None
}

fn strip_call<'a>(text: &'a str, function: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(function)?;
    let rest = rest.strip_prefix('(')?;
    rest.strip_suffix(')')
}
