use std::time::Duration;
use thiserror::Error;

use crate::scene::NodeId;

/// Failure to fetch or parse a named asset. Never fatal: the scene keeps
/// rendering without the asset.
#[derive(Error, Debug)]
pub enum AssetLoadError {
    #[error("failed to fetch {name}: {source}")]
    Fetch {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {name}: {reason}")]
    Parse { name: String, reason: String },

    #[error("no loader handles {0}")]
    Unsupported(String),

    #[error("loading {name} timed out after {after:?}")]
    TimedOut { name: String, after: Duration },

    #[error("loader for {0} stopped before settling")]
    Abandoned(String),
}

impl AssetLoadError {
    pub fn parse(name: &str, reason: impl ToString) -> Self {
        AssetLoadError::Parse {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Name of the asset this error concerns
    pub fn asset_name(&self) -> &str {
        match self {
            AssetLoadError::Fetch { name, .. }
            | AssetLoadError::Parse { name, .. }
            | AssetLoadError::TimedOut { name, .. } => name,
            AssetLoadError::Unsupported(name) | AssetLoadError::Abandoned(name) => name,
        }
    }
}

/// Structural scene graph errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("node {0} is not in the scene")]
    NodeNotFound(NodeId),

    #[error("asset {name} has no place in this scene as a {kind}")]
    UnexpectedAsset { name: String, kind: &'static str },
}

/// A single per-node mutation that failed during a frame tick.
/// The tick skips it and carries on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameMutationError {
    #[error("node {0} is not in the scene")]
    MissingNode(NodeId),

    #[error("node {node} has no {component}")]
    MissingComponent { node: NodeId, component: &'static str },

    #[error("control {0} is not registered")]
    UnknownControl(String),

    #[error("control {name} holds a {found} value, expected {expected}")]
    ControlType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Scene(SceneError),
}

impl From<SceneError> for FrameMutationError {
    fn from(err: SceneError) -> Self {
        match err {
            SceneError::NodeNotFound(id) => FrameMutationError::MissingNode(id),
            other => FrameMutationError::Scene(other),
        }
    }
}
