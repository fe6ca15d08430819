use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::docker::CommandRunner;
use crate::error::BuildError;
use crate::tag;

use super::commands::{list_images_command, remove_image_command};
use super::types::{EvictionReport, FailedRemoval, ImageRecord};

/// Images younger than this are left alone and not counted against the
/// cache size, so a concurrent build never loses its fresh image.
pub const YOUNG_IMAGE_GRACE_SECS: i64 = 60 * 60;

/// Parse one `{{.CreatedAt}}` value, e.g. `2024-03-01 14:02:11 +0100 CET`.
/// The trailing zone abbreviation is ignored; the numeric offset is used.
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let mut parts = raw.split_whitespace();
    let (date, time, offset) = (parts.next()?, parts.next()?, parts.next()?);
    let joined = format!("{date} {time} {offset}");
    DateTime::parse_from_str(&joined, "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse `docker images` output in the `repository<TAB>created` format,
/// keeping only repositories that are `{prefix}-` plus a generated suffix.
///
/// A repository listed several times (several tags) keeps its newest time.
pub fn parse_image_list(output: &str, prefix: &str) -> Vec<ImageRecord> {
    let mut newest: HashMap<&str, DateTime<Utc>> = HashMap::new();

    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        let Some((repository, created)) = line.split_once('\t') else {
            warn!("skipping unrecognised image listing line: {line:?}");
            continue;
        };
        let repository = repository.trim();
        if !tag::has_generated_suffix(repository, prefix) {
            continue;
        }
        let Some(created_at) = parse_created_at(created) else {
            warn!("skipping {repository}: cannot parse creation time {created:?}");
            continue;
        };
        newest
            .entry(repository)
            .and_modify(|t| *t = (*t).max(created_at))
            .or_insert(created_at);
    }

    newest
        .into_iter()
        .map(|(reference, created_at)| ImageRecord {
            reference: reference.to_string(),
            created_at,
        })
        .collect()
}

/// Which images an eviction pass keeps and removes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionPlan {
    pub young: Vec<ImageRecord>,
    pub keep: Vec<ImageRecord>,
    pub remove: Vec<ImageRecord>,
}

/// Decide which images to remove.
///
/// Images younger than the grace window (strictly less than an hour old at
/// `now`) are set aside. The rest are ordered newest first; the first `keep`
/// survive and everything after them is removed.
pub fn plan_eviction(images: &[ImageRecord], keep: usize, now: DateTime<Utc>) -> EvictionPlan {
    let grace = TimeDelta::seconds(YOUNG_IMAGE_GRACE_SECS);
    let (young, mut eligible): (Vec<_>, Vec<_>) = images
        .iter()
        .cloned()
        .partition(|image| now.signed_duration_since(image.created_at) < grace);

    eligible.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.reference.cmp(&b.reference))
    });
    let remove = eligible.split_off(keep.min(eligible.len()));

    EvictionPlan {
        young,
        keep: eligible,
        remove,
    }
}

/// Prunes cached images sharing a prefix, keeping the most recent ones.
pub struct ImageEvictor<'a> {
    runner: &'a dyn CommandRunner,
    global_args: &'a [String],
}

impl<'a> ImageEvictor<'a> {
    pub fn new(runner: &'a dyn CommandRunner, global_args: &'a [String]) -> Self {
        Self {
            runner,
            global_args,
        }
    }

    /// Snapshot of the cached images for `prefix`.
    pub fn list(&self, prefix: &str) -> Result<Vec<ImageRecord>, BuildError> {
        let output = self
            .runner
            .run(&list_images_command(self.global_args, prefix))
            .map_err(BuildError::ImageListingFailed)?;
        Ok(parse_image_list(&output.stdout, prefix))
    }

    /// List, plan, and remove. Each removal is attempted independently; a
    /// refused removal (e.g. image still in use) is recorded and skipped.
    pub fn evict_at(
        &self,
        prefix: &str,
        keep: usize,
        now: DateTime<Utc>,
    ) -> Result<EvictionReport, BuildError> {
        info!("Looking for old images...");
        let images = self.list(prefix)?;
        let plan = plan_eviction(&images, keep, now);
        debug!(
            young = plan.young.len(),
            keep = plan.keep.len(),
            remove = plan.remove.len(),
            "eviction plan for {prefix}"
        );

        let mut report = EvictionReport {
            young: plan.young.into_iter().map(|i| i.reference).collect(),
            kept: plan.keep.into_iter().map(|i| i.reference).collect(),
            ..EvictionReport::default()
        };

        if plan.remove.is_empty() {
            info!("No images to be removed");
            return Ok(report);
        }

        for image in plan.remove {
            info!("Removing image {}...", image.reference);
            match self
                .runner
                .run(&remove_image_command(self.global_args, &image.reference))
            {
                Ok(_) => report.removed.push(image.reference),
                Err(source) => {
                    let err = BuildError::ImageRemovalFailed {
                        image: image.reference.clone(),
                        source,
                    };
                    warn!("{err}");
                    report.failed.push(FailedRemoval {
                        image: image.reference,
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
