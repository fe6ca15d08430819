use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// States of one build run, in the order they are entered.
///
/// `Aborted` is terminal and can follow any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Building,
    Running,
    CopyingArtifacts,
    CleaningContainer,
    Evicting,
    Done,
    Aborted,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Building => "building",
            Stage::Running => "running",
            Stage::CopyingArtifacts => "copying_artifacts",
            Stage::CleaningContainer => "cleaning_container",
            Stage::Evicting => "evicting",
            Stage::Done => "done",
            Stage::Aborted => "aborted",
        }
    }
}

/// One cached image as reported by `docker images`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

/// An image whose removal was attempted and refused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRemoval {
    pub image: String,
    pub error: String,
}

/// What one eviction pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictionReport {
    /// Images inside the grace window; never counted, never removed.
    pub young: Vec<String>,
    pub kept: Vec<String>,
    pub removed: Vec<String>,
    pub failed: Vec<FailedRemoval>,
}

/// Summary of a build run, written by `--report`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildReport {
    pub image: Option<String>,
    pub container: Option<String>,
    pub out_dir: String,
    /// Every state entered, in order.
    pub stages: Vec<Stage>,
    pub artifacts: usize,
    pub eviction: Option<EvictionReport>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
    pub success: bool,
}

impl BuildReport {
    /// The last state entered.
    pub fn stage(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Idle)
    }
}

/// Result of [`Orchestrator::run`](super::Orchestrator::run): the report plus
/// the fatal error, if any.
#[derive(Debug)]
pub struct BuildOutcome {
    pub report: BuildReport,
    pub error: Option<BuildError>,
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
