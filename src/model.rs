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
use log::*;
use nalgebra as na;
use ncollide3d::shape::{Ball, Capsule, Cuboid, Shape, ShapeHandle};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

type NameShapeMap = HashMap<String, Vec<(ShapeHandle<f64>, na::Isometry3<f64>)>>;

/// How one configuration variable moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Angular,
    PosX,
    PosY,
    PosZ,
}

impl VarKind {
    fn from_joint_type(joint_type: &k::JointType<f64>) -> Self {
        match joint_type {
            k::JointType::Linear { axis } => {
                let a = [axis[0].abs(), axis[1].abs(), axis[2].abs()];
                if a[0] >= a[1] && a[0] >= a[2] {
                    VarKind::PosX
                } else if a[1] >= a[2] {
                    VarKind::PosY
                } else {
                    VarKind::PosZ
                }
            }
            _ => VarKind::Angular,
        }
    }

    pub fn is_positional(self) -> bool {
        self != VarKind::Angular
    }
}

/// Kinematic model shared by the planning context and its helpers
///
/// Wraps a `k::Chain` with the metadata planning needs: movable joint
/// names, limits and kinds, a link-to-joint map for pose queries, and
/// per-joint collision shapes. The chain itself is guarded so forward
/// kinematics and collision queries are atomic with respect to the joint
/// positions they were asked about.
pub struct RobotModel {
    name: String,
    chain: Mutex<k::Chain<f64>>,
    joint_names: Vec<String>,
    joint_limits: Vec<Option<k::joint::Range<f64>>>,
    joint_kinds: Vec<VarKind>,
    link_joint_map: HashMap<String, String>,
    name_collision_model_map: NameShapeMap,
}

impl RobotModel {
    /// Create a model from a chain built in code
    ///
    /// Link names are taken to be the joint names (fixed joints included);
    /// there are no collision shapes, so only joint limits constrain
    /// validity.
    pub fn from_chain(name: &str, chain: k::Chain<f64>) -> Self {
        let (joint_names, joint_limits, joint_kinds) = movable_joint_info(&chain);
        let link_joint_map = chain
            .iter()
            .map(|node| {
                let joint_name = node.joint().name.clone();
                (joint_name.clone(), joint_name)
            })
            .collect();
        RobotModel {
            name: name.to_owned(),
            chain: Mutex::new(chain),
            joint_names,
            joint_limits,
            joint_kinds,
            link_joint_map,
            name_collision_model_map: HashMap::new(),
        }
    }

    /// Create a model from `urdf_rs::Robot`
    pub fn from_urdf_robot(urdf_robot: &urdf_rs::Robot) -> Self {
        let chain = k::Chain::<f64>::from(urdf_robot);
        let (joint_names, joint_limits, joint_kinds) = movable_joint_info(&chain);
        let link_joint_map = k::urdf::link_to_joint_map(urdf_robot);
        let mut name_collision_model_map = HashMap::new();
        for l in &urdf_robot.links {
            let col_pose_vec = l
                .collision
                .iter()
                .filter_map(|collision| {
                    urdf_geometry_to_shape_handle(&collision.geometry)
                        .map(|col| (col, k::urdf::isometry_from(&collision.origin)))
                })
                .collect::<Vec<_>>();
            debug!("name={}, ln={}", l.name, col_pose_vec.len());
            if !col_pose_vec.is_empty() {
                if let Some(joint_name) = link_joint_map.get(&l.name) {
                    name_collision_model_map.insert(joint_name.to_owned(), col_pose_vec);
                }
            }
        }
        RobotModel {
            name: urdf_robot.name.clone(),
            chain: Mutex::new(chain),
            joint_names,
            joint_limits,
            joint_kinds,
            link_joint_map,
            name_collision_model_map,
        }
    }

    /// Create a model from a URDF file
    pub fn from_urdf_file<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Ok(Self::from_urdf_robot(&urdf_rs::utils::read_urdf_or_xacro(
            path.as_ref(),
        )?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of movable joints
    pub fn dof(&self) -> usize {
        self.joint_names.len()
    }

    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    pub fn joint_limits(&self) -> &[Option<k::joint::Range<f64>>] {
        &self.joint_limits
    }

    pub fn joint_kinds(&self) -> &[VarKind] {
        &self.joint_kinds
    }

    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joint_names.iter().position(|n| n == name)
    }

    pub fn has_link(&self, name: &str) -> bool {
        self.link_joint_map.contains_key(name)
    }

    /// Degrees of freedom of the named joint, fixed joints included
    pub fn joint_dof(&self, name: &str) -> Option<usize> {
        let chain = self.chain.lock().unwrap();
        for node in chain.iter() {
            let joint = node.joint();
            if joint.name == name {
                return Some(match joint.joint_type {
                    k::JointType::Fixed => 0,
                    _ => 1,
                });
            }
        }
        None
    }

    /// World pose of the named link with the given full joint positions
    pub fn link_pose(&self, full_positions: &[f64], link_name: &str) -> Option<na::Isometry3<f64>> {
        let joint_name = self.link_joint_map.get(link_name)?.clone();
        self.with_positions(full_positions, |chain| {
            chain.find(&joint_name).and_then(|node| node.world_transform())
        })
        .ok()
        .flatten()
    }

    /// Check the posed robot against a single obstacle shape
    ///
    /// Walks every joint with collision geometry and reports the first pair
    /// closer than `prediction`.
    pub fn has_any_colliding(
        &self,
        full_positions: &[f64],
        target_shape: &dyn Shape<f64>,
        target_pose: &na::Isometry3<f64>,
        prediction: f64,
    ) -> bool {
        if self.name_collision_model_map.is_empty() {
            return false;
        }
        self.with_positions(full_positions, |chain| {
            for node in chain.iter() {
                let trans = match node.world_transform() {
                    Some(trans) => trans,
                    None => continue,
                };
                let joint_name = node.joint().name.clone();
                if let Some(obj_vec) = self.name_collision_model_map.get(&joint_name) {
                    for obj in obj_vec {
                        let dist = ncollide3d::query::distance(
                            &(trans * obj.1),
                            &*obj.0,
                            target_pose,
                            target_shape,
                        );
                        if dist < prediction {
                            debug!("name: {}, dist={}", joint_name, dist);
                            return true;
                        }
                    }
                }
            }
            false
        })
        .unwrap_or(false)
    }

    /// Run `f` against the chain posed at `full_positions`
    ///
    /// Out-of-range values are clamped rather than rejected; validity of the
    /// raw values is the state space's concern, not the model's.
    pub fn with_positions<F, R>(&self, full_positions: &[f64], f: F) -> Result<R>
    where
        F: FnOnce(&k::Chain<f64>) -> R,
    {
        let clamped = funcs::clamped_state_from_limits(full_positions, &self.joint_limits)?;
        let chain = self.chain.lock().unwrap();
        chain.set_joint_positions(&clamped)?;
        chain.update_transforms();
        Ok(f(&chain))
    }
}

fn movable_joint_info(
    chain: &k::Chain<f64>,
) -> (Vec<String>, Vec<Option<k::joint::Range<f64>>>, Vec<VarKind>) {
    let mut names = Vec::new();
    let mut limits = Vec::new();
    let mut kinds = Vec::new();
    for node in chain.iter() {
        let joint = node.joint();
        if let k::JointType::Fixed = joint.joint_type {
            continue;
        }
        names.push(joint.name.clone());
        limits.push(joint.limits.clone());
        kinds.push(VarKind::from_joint_type(&joint.joint_type));
    }
    (names, limits, kinds)
}

/// Convert URDF collision geometry to an `ncollide` shape
///
/// Cylinders become capsules; mesh geometry is not loaded.
pub fn urdf_geometry_to_shape_handle(geometry: &urdf_rs::Geometry) -> Option<ShapeHandle<f64>> {
    match *geometry {
        urdf_rs::Geometry::Box { ref size } => Some(ShapeHandle::new(Cuboid::new(na::Vector3::new(
            size[0] * 0.5,
            size[1] * 0.5,
            size[2] * 0.5,
        )))),
        urdf_rs::Geometry::Cylinder { radius, length } => {
            Some(ShapeHandle::new(Capsule::new(length * 0.5, radius)))
        }
        urdf_rs::Geometry::Sphere { radius } => Some(ShapeHandle::new(Ball::new(radius))),
        urdf_rs::Geometry::Mesh { ref filename, .. } => {
            warn!("mesh collision geometry is not supported, skipping {}", filename);
            None
        }
        _ => {
            warn!("unsupported collision geometry, skipping");
            None
        }
    }
}
