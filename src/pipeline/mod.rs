pub mod commands;
pub mod evict;
pub mod orchestrator;
mod types;

pub use evict::{EvictionPlan, ImageEvictor, YOUNG_IMAGE_GRACE_SECS, plan_eviction};
pub use orchestrator::{ContainerGuard, Orchestrator};
pub use types::{
    BuildOutcome, BuildReport, EvictionReport, FailedRemoval, ImageRecord, Stage,
};
