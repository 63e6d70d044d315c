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
//! Constrained sampling-based motion planning for robot manipulators
//!
//! `plait` wraps a joint state space, a planning scene and a set of
//! constraint samplers into a reusable [`PlanningContext`]: configure it
//! with a start state and goal constraints, then `solve` with one or many
//! planner instances, or `follow` an ordered sequence of constraint
//! strata with the layered [`Follower`].

mod benchmark;
mod constraints;
mod context;
mod errors;
mod follower;
mod funcs;
mod goal;
mod model;
mod parallel;
mod path;
mod planner;
mod problem;
mod projection;
mod sampling;
mod scene;
mod space;
mod space_information;
mod termination;
#[cfg(test)]
pub(crate) mod testing;
mod validity;

pub use crate::benchmark::*;
pub use crate::constraints::*;
pub use crate::context::{ContextLimits, ContextSpecification, PlanningContext};
pub use crate::errors::*;
pub use crate::follower::Follower;
pub use crate::funcs::*;
pub use crate::goal::*;
pub use crate::model::*;
pub use crate::parallel::*;
pub use crate::path::*;
pub use crate::planner::*;
pub use crate::problem::*;
pub use crate::projection::*;
pub use crate::sampling::*;
pub use crate::scene::*;
pub use crate::space::*;
pub use crate::space_information::*;
pub use crate::termination::*;
pub use crate::validity::*;
