use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::docker::CommandRunner;
use crate::error::BuildError;
use crate::tag;

use super::commands::{
    build_command, container_source_dir, copy_command, create_command, inspect_workdir_command,
    remove_container_command, start_command,
};
use super::evict::ImageEvictor;
use super::types::{BuildOutcome, BuildReport, Stage};

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

/// A created container that must be removed before the build returns.
///
/// [`release`](Self::release) removes it and reports the result; dropping an
/// unreleased guard (early return, unwinding panic) removes it and only logs.
pub struct ContainerGuard<'a> {
    runner: &'a dyn CommandRunner,
    global_args: &'a [String],
    name: String,
    released: bool,
}

impl<'a> ContainerGuard<'a> {
    pub fn new(runner: &'a dyn CommandRunner, global_args: &'a [String], name: String) -> Self {
        Self {
            runner,
            global_args,
            name,
            released: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn release(mut self) -> Result<(), BuildError> {
        self.released = true;
        self.remove()
    }

    fn remove(&self) -> Result<(), BuildError> {
        info!("Removing container {}...", self.name);
        self.runner
            .run(&remove_container_command(self.global_args, &self.name))
            .map(|_| ())
            .map_err(|source| BuildError::ContainerRemovalFailed {
                container: self.name.clone(),
                source,
            })
    }
}

impl Drop for ContainerGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.remove() {
            warn!("{err}");
        }
    }
}

/// Drives build → run → copy → container cleanup → image eviction.
pub struct Orchestrator<'a> {
    config: &'a BuildConfig,
    runner: &'a dyn CommandRunner,
    clock: Clock,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a BuildConfig, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            runner,
            clock: Box::new(Utc::now),
        }
    }

    /// Evaluate image ages against a different clock.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Run the whole workflow once.
    ///
    /// Housekeeping (container removal, eviction) runs even when the run or
    /// copy step failed; its failures end up in `report.warnings` and never
    /// replace the primary error.
    pub fn run(&self) -> BuildOutcome {
        let cfg = self.config;
        let mut report = BuildReport {
            out_dir: cfg.out_dir.display().to_string(),
            ..BuildReport::default()
        };

        report.stages.push(Stage::Building);
        let image = tag::generate(&cfg.image_prefix);
        info!("Building {}...", cfg.dockerfile.display());
        if let Err(source) = self.runner.run(&build_command(cfg, &image)) {
            return abort(report, BuildError::BuildFailed(source));
        }
        report.image = Some(image.clone());

        let primary = self.run_and_collect(&image, &mut report);

        report.stages.push(Stage::Evicting);
        let evictor = ImageEvictor::new(self.runner, &cfg.docker_args);
        match evictor.evict_at(&cfg.image_prefix, cfg.num_cached_images, (self.clock)()) {
            Ok(eviction) => {
                report
                    .warnings
                    .extend(eviction.failed.iter().map(|f| f.error.clone()));
                report.eviction = Some(eviction);
            }
            Err(err) => {
                warn!("{err}; skipping eviction");
                report.warnings.push(err.to_string());
            }
        }

        match primary {
            Ok(()) => {
                report.stages.push(Stage::Done);
                report.success = true;
                info!("Successfully built into {}", cfg.out_dir.display());
                BuildOutcome {
                    report,
                    error: None,
                }
            }
            Err(err) => abort(report, err),
        }
    }

    /// Create and start the container, copy its artifacts, and remove it.
    /// A failed create leaves nothing to copy or remove; once created, the
    /// container is removed whatever happens next.
    fn run_and_collect(&self, image: &str, report: &mut BuildReport) -> Result<(), BuildError> {
        let cfg = self.config;

        report.stages.push(Stage::Running);
        let name = tag::generate(&cfg.image_prefix);
        info!("Creating container {name}...");
        self.runner
            .run(&create_command(cfg, image, &name))
            .map_err(BuildError::RunFailed)?;
        report.container = Some(name.clone());
        let container = ContainerGuard::new(self.runner, &cfg.docker_args, name);

        info!("Running container {}...", container.name());
        let collected = match self
            .runner
            .run(&start_command(&cfg.docker_args, container.name()))
        {
            Ok(_) => {
                report.stages.push(Stage::CopyingArtifacts);
                self.copy_artifacts(container.name())
            }
            Err(source) => Err(BuildError::RunFailed(source)),
        };
        if let Ok(count) = collected {
            report.artifacts = count;
        }

        report.stages.push(Stage::CleaningContainer);
        if let Err(err) = container.release() {
            warn!("{err}");
            report.warnings.push(err.to_string());
        }

        collected.map(|_| ())
    }

    /// Clear the output directory and copy the container's dist dir into it.
    /// Returns the number of entries copied.
    fn copy_artifacts(&self, container: &str) -> Result<usize, BuildError> {
        let cfg = self.config;
        let source_dir = if cfg.dist_dir.starts_with('/') {
            cfg.dist_dir.clone()
        } else {
            container_source_dir(&cfg.dist_dir, &self.container_workdir(container))
        };

        prepare_out_dir(&cfg.out_dir).map_err(|source| BuildError::OutputDir {
            path: cfg.out_dir.display().to_string(),
            source,
        })?;

        info!(
            "Copying build artifacts from {source_dir} to {}...",
            cfg.out_dir.display()
        );
        self.runner
            .run(&copy_command(cfg, container, &source_dir))
            .map_err(BuildError::CopyFailed)?;

        let count = count_entries(&cfg.out_dir);
        if count == 0 {
            return Err(BuildError::NoArtifacts {
                path: cfg.out_dir.display().to_string(),
            });
        }
        Ok(count)
    }

    fn container_workdir(&self, container: &str) -> String {
        match self
            .runner
            .run(&inspect_workdir_command(self.config, container))
        {
            Ok(out) if !out.stdout.trim().is_empty() => {
                let workdir = out.stdout.trim().to_string();
                info!("Workdir of {container} container is {workdir}");
                workdir
            }
            Ok(_) => {
                warn!("Could not determine workdir of container {container}, assuming '/'");
                "/".to_string()
            }
            Err(err) => {
                warn!("Could not determine workdir of container {container}, assuming '/': {err}");
                "/".to_string()
            }
        }
    }
}

fn abort(mut report: BuildReport, err: BuildError) -> BuildOutcome {
    error!("{err}");
    report.stages.push(Stage::Aborted);
    report.error = Some(err.to_string());
    report.success = false;
    BuildOutcome {
        report,
        error: Some(err),
    }
}

/// Empty `dir` (keeping the directory itself) or create it.
fn prepare_out_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        return std::fs::create_dir_all(dir);
    }
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "path exists and is not a directory",
        ));
    }
    info!("Removing old artifacts in {}...", dir.display());
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(entry.path())?;
        } else {
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

fn count_entries(dir: &Path) -> usize {
    WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .count()
}
