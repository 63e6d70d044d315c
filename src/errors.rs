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
use crate::planner::PlannerStatus;
use std::fmt;
use std::io;

#[derive(Debug)]
/// Error for `plait`
pub enum Error {
    Other(String),
    /// No usable goal constraint set could be built
    InvalidGoalConstraints,
    /// The planner or follower finished without an exact solution
    Planning(PlannerStatus),
    Io(io::Error),
    Urdf(urdf_rs::UrdfError),
    Joint(k::Error),
}

/// Result for `plait`
pub type Result<T> = ::std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl<'a> From<&'a str> for Error {
    fn from(err: &'a str) -> Error {
        Error::Other(err.to_owned())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Error {
        Error::Other(err)
    }
}

impl From<urdf_rs::UrdfError> for Error {
    fn from(err: urdf_rs::UrdfError) -> Error {
        Error::Urdf(err)
    }
}

impl From<k::Error> for Error {
    fn from(err: k::Error) -> Error {
        Error::Joint(err)
    }
}

impl From<PlannerStatus> for Error {
    fn from(status: PlannerStatus) -> Error {
        Error::Planning(status)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Other(msg) => write!(f, "{}", msg),
            Error::InvalidGoalConstraints => write!(f, "no valid goal constraints"),
            Error::Planning(status) => write!(f, "planning failed: {}", status),
            Error::Io(error) => error.fmt(f),
            Error::Urdf(error) => error.fmt(f),
            Error::Joint(error) => error.fmt(f),
        }
    }
}

impl ::std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(error) => Some(error),
            Error::Urdf(error) => Some(error),
            Error::Joint(error) => Some(error),
            _ => None,
        }
    }
}
