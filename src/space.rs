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
use crate::errors::*;
use crate::funcs;
use crate::model::{RobotModel, VarKind};
use crate::projection::ProjectionEvaluator;
use crate::sampling::StateSampler;
use std::f64::consts::PI;
use std::sync::{Arc, RwLock};

/// A sample in the configuration space of one planning group
pub type State = Vec<f64>;

/// Factory for state samplers, installable on the space
pub type StateSamplerAllocator =
    Arc<dyn Fn(&Arc<JointStateSpace>) -> Box<dyn StateSampler> + Send + Sync>;

/// Configuration space over the movable joints of one planning group
///
/// Bounds, the default projection and the sampler allocator are behind
/// locks so the space can be shared between the context and the planner
/// threads once configuration is done.
pub struct JointStateSpace {
    model: Arc<RobotModel>,
    group_name: String,
    /// indices of the group's variables in the full robot state
    indices: Vec<usize>,
    var_names: Vec<String>,
    kinds: Vec<VarKind>,
    bounds: RwLock<Vec<Option<k::joint::Range<f64>>>>,
    sampler_allocator: RwLock<Option<StateSamplerAllocator>>,
    projection: RwLock<Option<Arc<dyn ProjectionEvaluator>>>,
}

impl JointStateSpace {
    /// Space over a named subset of the model's joints
    pub fn new(model: Arc<RobotModel>, group_name: &str, joint_names: &[&str]) -> Result<Self> {
        let mut indices = Vec::new();
        let mut var_names = Vec::new();
        let mut kinds = Vec::new();
        let mut bounds = Vec::new();
        for name in joint_names {
            let index = model
                .joint_index(name)
                .ok_or_else(|| Error::from(format!("joint `{}` not found in model", name)))?;
            indices.push(index);
            var_names.push((*name).to_owned());
            kinds.push(model.joint_kinds()[index]);
            bounds.push(model.joint_limits()[index].clone());
        }
        Ok(JointStateSpace {
            model,
            group_name: group_name.to_owned(),
            indices,
            var_names,
            kinds,
            bounds: RwLock::new(bounds),
            sampler_allocator: RwLock::new(None),
            projection: RwLock::new(None),
        })
    }

    /// Space over every movable joint of the model
    pub fn whole_body(model: Arc<RobotModel>, group_name: &str) -> Self {
        let names: Vec<String> = model.joint_names().to_vec();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        // every name comes from the model, so this cannot fail
        Self::new(model, group_name, &refs).expect("model joints are always known")
    }

    pub fn model(&self) -> &Arc<RobotModel> {
        &self.model
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn dimension(&self) -> usize {
        self.indices.len()
    }

    pub fn var_names(&self) -> &[String] {
        &self.var_names
    }

    pub fn var_index(&self, name: &str) -> Option<usize> {
        self.var_names.iter().position(|n| n == name)
    }

    pub fn var_kinds(&self) -> &[VarKind] {
        &self.kinds
    }

    pub fn bounds(&self) -> Vec<Option<k::joint::Range<f64>>> {
        self.bounds.read().unwrap().clone()
    }

    /// Axis-aligned workspace bounds, applied to positional variables only
    pub fn set_planning_volume(&self, min_corner: [f64; 3], max_corner: [f64; 3]) {
        let mut bounds = self.bounds.write().unwrap();
        for (bound, kind) in bounds.iter_mut().zip(self.kinds.iter()) {
            let axis = match kind {
                VarKind::PosX => 0,
                VarKind::PosY => 1,
                VarKind::PosZ => 2,
                VarKind::Angular => continue,
            };
            *bound = Some(k::joint::Range::new(min_corner[axis], max_corner[axis]));
        }
    }

    pub fn satisfies_bounds(&self, state: &[f64]) -> bool {
        funcs::satisfies_limits(state, &self.bounds.read().unwrap())
    }

    pub fn enforce_bounds(&self, state: &[f64]) -> Result<State> {
        funcs::clamped_state_from_limits(state, &self.bounds.read().unwrap())
    }

    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        funcs::distance(a, b)
    }

    pub fn interpolate(&self, from: &[f64], to: &[f64], t: f64, out: &mut State) {
        funcs::interpolate(from, to, t, out);
    }

    /// Diagonal of the bounded region; unbounded angular variables count a
    /// full revolution
    pub fn maximum_extent(&self) -> f64 {
        self.bounds
            .read()
            .unwrap()
            .iter()
            .map(|bound| match bound {
                Some(range) => range.max - range.min,
                None => 2.0 * PI,
            })
            .map(|span| span * span)
            .sum::<f64>()
            .sqrt()
    }

    /// Stable content signature, usable as a cache key
    pub fn signature(&self) -> Vec<u64> {
        let mut signature = vec![self.dimension() as u64];
        let bounds = self.bounds.read().unwrap();
        for (kind, bound) in self.kinds.iter().zip(bounds.iter()) {
            signature.push(*kind as u64);
            match bound {
                Some(range) => {
                    signature.push(range.min.to_bits());
                    signature.push(range.max.to_bits());
                }
                None => signature.push(u64::MAX),
            }
        }
        signature
    }

    /// Write a group state into a full robot state
    pub fn copy_to_robot_state(&self, full_positions: &mut [f64], state: &[f64]) {
        for (index, value) in self.indices.iter().zip(state.iter()) {
            full_positions[*index] = *value;
        }
    }

    /// Extract the group state from a full robot state
    pub fn copy_from_robot_state(&self, full_positions: &[f64]) -> State {
        self.indices.iter().map(|i| full_positions[*i]).collect()
    }

    pub fn set_state_sampler_allocator(&self, allocator: StateSamplerAllocator) {
        *self.sampler_allocator.write().unwrap() = Some(allocator);
    }

    pub fn state_sampler_allocator(&self) -> Option<StateSamplerAllocator> {
        self.sampler_allocator.read().unwrap().clone()
    }

    pub fn register_default_projection(&self, projection: Arc<dyn ProjectionEvaluator>) {
        *self.projection.write().unwrap() = Some(projection);
    }

    pub fn default_projection(&self) -> Option<Arc<dyn ProjectionEvaluator>> {
        self.projection.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cartesian_gantry, planar_arm};

    #[test]
    fn group_subsets_full_state() {
        let model = Arc::new(planar_arm("arm", 3));
        let space = JointStateSpace::new(model, "tip", &["j1", "j2"]).unwrap();
        assert_eq!(space.dimension(), 2);
        let mut full = vec![0.0; 3];
        space.copy_to_robot_state(&mut full, &[0.5, -0.5]);
        assert_eq!(full, vec![0.0, 0.5, -0.5]);
        assert_eq!(space.copy_from_robot_state(&full), vec![0.5, -0.5]);
    }

    #[test]
    fn unknown_joint_is_rejected() {
        let model = Arc::new(planar_arm("arm", 2));
        assert!(JointStateSpace::new(model, "bad", &["j0", "jX"]).is_err());
    }

    #[test]
    fn planning_volume_touches_positional_vars_only() {
        let model = Arc::new(cartesian_gantry("gantry"));
        let space = JointStateSpace::whole_body(model, "gantry");
        space.set_planning_volume([-1.0, -2.0, 0.0], [1.0, 2.0, 0.5]);
        let bounds = space.bounds();
        // x, y are linear joints, the wrist is angular
        let x = bounds[0].as_ref().unwrap();
        assert_eq!((x.min, x.max), (-1.0, 1.0));
        let y = bounds[1].as_ref().unwrap();
        assert_eq!((y.min, y.max), (-2.0, 2.0));
        let wrist = bounds[2].as_ref().unwrap();
        assert_eq!((wrist.min, wrist.max), (-3.0, 3.0));
    }

    #[test]
    fn signature_tracks_content() {
        let model = Arc::new(planar_arm("arm", 2));
        let space = JointStateSpace::whole_body(model.clone(), "arm");
        let before = space.signature();
        assert_eq!(before, space.signature());
        let other = JointStateSpace::new(model, "sub", &["j0"]).unwrap();
        assert_ne!(before, other.signature());
    }
}
