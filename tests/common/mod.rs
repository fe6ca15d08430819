//! Scripted stand-in for the `docker` executable.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use docker_build::config::BuildConfig;
use docker_build::docker::{CommandOutput, CommandRunner, DockerCommand};
use docker_build::error::CommandError;

const SUBCOMMANDS: &[&str] = &[
    "build", "create", "start", "inspect", "cp", "rm", "images", "rmi", "version",
];

/// Fixed "current time" used for image ages.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("valid time")
}

/// One `docker images` line for an image created `minutes_old` ago.
pub fn listing_line(name: &str, minutes_old: i64) -> String {
    let created = now() - TimeDelta::minutes(minutes_old);
    format!(
        "{name}\t{}\n",
        created.format("%Y-%m-%d %H:%M:%S +0000 UTC")
    )
}

#[derive(Default)]
pub struct FakeDocker {
    /// Subcommands that exit non-zero.
    pub fail: Vec<&'static str>,
    /// Images `rmi` refuses to remove.
    pub refuse_rmi: Vec<String>,
    /// stdout of `docker images`.
    pub images: String,
    /// stdout of `docker inspect`.
    pub container_workdir: String,
    /// Files (relative path, contents) that `docker cp` drops into its destination.
    pub artifacts: Vec<(&'static str, &'static str)>,
    pub calls: RefCell<Vec<Vec<String>>>,
}

impl FakeDocker {
    pub fn with_artifacts(artifacts: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            artifacts,
            container_workdir: "/work\n".into(),
            ..Self::default()
        }
    }

    /// All recorded invocations, global args stripped.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .map(|args| {
                let start = subcommand_index(args).unwrap_or(0);
                args[start..].to_vec()
            })
            .collect()
    }

    /// Subcommand names in call order.
    pub fn subcommands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c[0].clone()).collect()
    }

    pub fn calls_to(&self, subcommand: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| c[0] == subcommand)
            .collect()
    }
}

fn subcommand_index(args: &[String]) -> Option<usize> {
    args.iter().position(|a| SUBCOMMANDS.iter().any(|s| *s == a.as_str()))
}

impl CommandRunner for FakeDocker {
    fn run(&self, cmd: &DockerCommand) -> Result<CommandOutput, CommandError> {
        self.calls.borrow_mut().push(cmd.args.clone());
        let idx = subcommand_index(&cmd.args).expect("known subcommand");
        let sub = cmd.args[idx].as_str();
        let failed = || CommandError::CommandFailed {
            command: cmd.display(),
            code: Some(1),
        };

        if self.fail.iter().any(|f| *f == sub) {
            return Err(failed());
        }

        let stdout = match sub {
            "images" => self.images.clone(),
            "inspect" => self.container_workdir.clone(),
            "rmi" if self.refuse_rmi.contains(&cmd.args[idx + 1]) => return Err(failed()),
            "cp" => {
                let dest = PathBuf::from(cmd.args.last().expect("cp destination"));
                for (rel, contents) in &self.artifacts {
                    let path = dest.join(rel);
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent).expect("create artifact dir");
                    }
                    std::fs::write(&path, contents).expect("write artifact");
                }
                String::new()
            }
            _ => String::new(),
        };
        Ok(CommandOutput { stdout })
    }
}

/// A config rooted at `work_dir` with `dist` copied to `work_dir/out`.
pub fn config(work_dir: &Path) -> BuildConfig {
    BuildConfig {
        work_dir: work_dir.to_path_buf(),
        dockerfile: work_dir.join("Dockerfile"),
        docker_context: work_dir.to_path_buf(),
        dist_dir: "dist".into(),
        out_dir: work_dir.join("out"),
        image_prefix: "app".into(),
        num_cached_images: 5,
        pull: true,
        no_cache: false,
        build_args: Vec::new(),
        docker_args: Vec::new(),
        docker_build_args: Vec::new(),
        docker_run_args: Vec::new(),
        docker_cp_args: Vec::new(),
    }
}

/// Sorted relative paths of every file under `dir`.
pub fn files_under(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            e.path()
                .strip_prefix(dir)
                .ok()
                .map(|p| p.to_string_lossy().into_owned())
        })
        .collect();
    files.sort();
    files
}
