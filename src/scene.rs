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
use crate::model::{urdf_geometry_to_shape_handle, RobotModel};
use ncollide3d::shape::Compound;
use std::sync::Arc;

/// World the robot plans in: the model plus obstacle geometry
pub struct PlanningScene {
    name: String,
    model: Arc<RobotModel>,
    obstacles: Option<Compound<f64>>,
    /// margin length for collision check
    pub prediction: f64,
}

impl PlanningScene {
    pub fn new(name: &str, model: Arc<RobotModel>) -> Self {
        PlanningScene {
            name: name.to_owned(),
            model,
            obstacles: None,
            prediction: 0.0,
        }
    }

    pub fn with_obstacles(mut self, obstacles: Compound<f64>) -> Self {
        self.obstacles = Some(obstacles);
        self
    }

    pub fn with_margin(mut self, prediction: f64) -> Self {
        self.prediction = prediction;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &Arc<RobotModel> {
        &self.model
    }

    /// Check the robot at `full_positions` against every obstacle shape
    pub fn is_state_colliding(&self, full_positions: &[f64]) -> bool {
        if let Some(obstacles) = &self.obstacles {
            for shape in obstacles.shapes() {
                if self
                    .model
                    .has_any_colliding(full_positions, &*shape.1, &shape.0, self.prediction)
                {
                    return true;
                }
            }
        }
        false
    }
}

/// Create an obstacle `Compound` from URDF
///
/// The `<collision>` elements of every link are used as world obstacles.
pub fn obstacle_compound_from_urdf(urdf_obstacle: &urdf_rs::Robot) -> Compound<f64> {
    let compound_data = urdf_obstacle
        .links
        .iter()
        .flat_map(|l| {
            l.collision
                .iter()
                .filter_map(|collision| {
                    urdf_geometry_to_shape_handle(&collision.geometry)
                        .map(|col| (k::urdf::isometry_from(&collision.origin), col))
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    Compound::new(compound_data)
}
