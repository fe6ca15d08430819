//! Workflow tests for the build orchestrator against a scripted docker.

mod common;

use common::{FakeDocker, config, files_under, listing_line, now};
use docker_build::error::BuildError;
use docker_build::pipeline::{Orchestrator, Stage};

#[test]
fn successful_build_replaces_stale_output_and_removes_container() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path());
    std::fs::create_dir_all(cfg.out_dir.join("old")).expect("mkdir");
    std::fs::write(cfg.out_dir.join("stale.txt"), "stale").expect("write stale file");
    std::fs::write(cfg.out_dir.join("old/app.bin"), "stale").expect("write stale file");

    let docker = FakeDocker::with_artifacts(vec![("app.bin", "new"), ("lib/util.so", "new")]);
    let outcome = Orchestrator::new(&cfg, &docker).with_clock(now).run();

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(files_under(&cfg.out_dir), ["app.bin", "lib/util.so"]);
    assert_eq!(
        std::fs::read_to_string(cfg.out_dir.join("app.bin")).expect("artifact"),
        "new"
    );

    assert_eq!(
        docker.subcommands(),
        ["build", "create", "start", "inspect", "cp", "rm", "images"]
    );

    let report = &outcome.report;
    assert!(report.success);
    assert_eq!(
        report.stages,
        [
            Stage::Building,
            Stage::Running,
            Stage::CopyingArtifacts,
            Stage::CleaningContainer,
            Stage::Evicting,
            Stage::Done,
        ]
    );
    assert_eq!(report.artifacts, 3);
    assert!(report.warnings.is_empty());

    let image = report.image.clone().expect("image tagged");
    let container = report.container.clone().expect("container created");
    assert!(image.starts_with("app-"));
    assert_ne!(image, container);

    let build = &docker.calls_to("build")[0];
    assert_eq!(build[build.len() - 2], image);
    let create = &docker.calls_to("create")[0];
    assert_eq!(create.last(), Some(&image));
    assert!(create.contains(&container));
    assert_eq!(
        docker.calls_to("start"),
        [vec!["start".to_string(), "--attach".into(), container.clone()]]
    );

    let cp = &docker.calls_to("cp")[0];
    assert_eq!(cp[1], format!("{container}:/work/dist/."));
    assert_eq!(docker.calls_to("rm"), [vec![
        "rm".to_string(),
        "--volumes".into(),
        "--force".into(),
        container,
    ]]);
}

#[test]
fn build_failure_aborts_before_anything_is_created() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path());
    let docker = FakeDocker {
        fail: vec!["build"],
        ..FakeDocker::with_artifacts(vec![("app.bin", "new")])
    };

    let outcome = Orchestrator::new(&cfg, &docker).with_clock(now).run();

    assert!(matches!(outcome.error, Some(BuildError::BuildFailed(_))));
    assert_eq!(docker.subcommands(), ["build"]);
    assert_eq!(outcome.report.stages, [Stage::Building, Stage::Aborted]);
    assert!(outcome.report.image.is_none());
    assert!(!cfg.out_dir.exists());
}

#[test]
fn create_failure_skips_copy_and_removal_but_still_evicts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path());
    let docker = FakeDocker {
        fail: vec!["create"],
        ..FakeDocker::with_artifacts(vec![("app.bin", "new")])
    };

    let outcome = Orchestrator::new(&cfg, &docker).with_clock(now).run();

    assert!(matches!(outcome.error, Some(BuildError::RunFailed(_))));
    assert_eq!(docker.subcommands(), ["build", "create", "images"]);
    assert!(outcome.report.container.is_none());
    assert_eq!(outcome.report.stage(), Stage::Aborted);
    assert!(!outcome.report.success);
}

#[test]
fn failing_container_process_is_removed_without_copying() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path());
    let docker = FakeDocker {
        fail: vec!["start"],
        ..FakeDocker::with_artifacts(vec![("app.bin", "new")])
    };

    let outcome = Orchestrator::new(&cfg, &docker).with_clock(now).run();

    assert!(matches!(outcome.error, Some(BuildError::RunFailed(_))));
    assert_eq!(
        docker.subcommands(),
        ["build", "create", "start", "rm", "images"]
    );
    assert!(docker.calls_to("cp").is_empty());
    let container = outcome.report.container.clone().expect("container created");
    let removals = docker.calls_to("rm");
    assert_eq!(removals.len(), 1);
    assert_eq!(removals[0].last(), Some(&container));
    assert_eq!(
        outcome.report.stages,
        [
            Stage::Building,
            Stage::Running,
            Stage::CleaningContainer,
            Stage::Evicting,
            Stage::Aborted,
        ]
    );
    assert!(!cfg.out_dir.exists());
}

#[test]
fn copy_failure_still_removes_the_container_exactly_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path());
    std::fs::create_dir_all(&cfg.out_dir).expect("mkdir");
    std::fs::write(cfg.out_dir.join("stale.txt"), "stale").expect("write");
    let docker = FakeDocker {
        fail: vec!["cp"],
        ..FakeDocker::with_artifacts(vec![("app.bin", "new")])
    };

    let outcome = Orchestrator::new(&cfg, &docker).with_clock(now).run();

    assert!(matches!(outcome.error, Some(BuildError::CopyFailed(_))));
    assert_eq!(
        docker.subcommands(),
        ["build", "create", "start", "inspect", "cp", "rm", "images"]
    );
    let container = outcome.report.container.clone().expect("container created");
    let removals = docker.calls_to("rm");
    assert_eq!(removals.len(), 1);
    assert_eq!(removals[0].last(), Some(&container));
    assert_eq!(
        outcome.report.stages,
        [
            Stage::Building,
            Stage::Running,
            Stage::CopyingArtifacts,
            Stage::CleaningContainer,
            Stage::Evicting,
            Stage::Aborted,
        ]
    );
}

#[test]
fn empty_dist_dir_is_a_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path());
    let docker = FakeDocker::with_artifacts(Vec::new());

    let outcome = Orchestrator::new(&cfg, &docker).with_clock(now).run();

    assert!(matches!(outcome.error, Some(BuildError::NoArtifacts { .. })));
    assert_eq!(docker.calls_to("rm").len(), 1);
    assert!(cfg.out_dir.is_dir());
}

#[test]
fn housekeeping_failures_are_warnings_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path());
    let docker = FakeDocker {
        fail: vec!["rm", "images"],
        ..FakeDocker::with_artifacts(vec![("app.bin", "new")])
    };

    let outcome = Orchestrator::new(&cfg, &docker).with_clock(now).run();

    assert!(outcome.is_success());
    assert_eq!(outcome.report.stage(), Stage::Done);
    assert_eq!(outcome.report.warnings.len(), 2);
    assert!(outcome.report.eviction.is_none());
}

#[test]
fn absolute_dist_dir_skips_workdir_lookup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config(dir.path());
    cfg.dist_dir = "/opt/build/".into();
    let docker = FakeDocker::with_artifacts(vec![("app.bin", "new")]);

    let outcome = Orchestrator::new(&cfg, &docker).with_clock(now).run();

    assert!(outcome.is_success());
    assert!(docker.calls_to("inspect").is_empty());
    let cp = &docker.calls_to("cp")[0];
    assert!(cp[1].ends_with(":/opt/build/."), "{}", cp[1]);
}

#[test]
fn unknown_container_workdir_falls_back_to_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path());
    let docker = FakeDocker {
        fail: vec!["inspect"],
        ..FakeDocker::with_artifacts(vec![("app.bin", "new")])
    };

    let outcome = Orchestrator::new(&cfg, &docker).with_clock(now).run();

    assert!(outcome.is_success());
    let cp = &docker.calls_to("cp")[0];
    assert!(cp[1].ends_with(":/dist/."), "{}", cp[1]);
}

#[test]
fn blank_container_workdir_falls_back_to_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path());
    let docker = FakeDocker {
        container_workdir: "\n".into(),
        ..FakeDocker::with_artifacts(vec![("app.bin", "new")])
    };

    let outcome = Orchestrator::new(&cfg, &docker).with_clock(now).run();

    assert!(outcome.is_success());
    assert_eq!(docker.calls_to("inspect").len(), 1);
    let container = outcome.report.container.clone().expect("container created");
    let cp = &docker.calls_to("cp")[0];
    assert_eq!(cp[1], format!("{container}:/dist/."));
}

#[test]
fn eviction_keeps_the_two_newest_of_five_old_images() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config(dir.path());
    cfg.num_cached_images = 2;
    let images: String = [
        ("app-aaaaaaa1", 500),
        ("app-aaaaaaa2", 400),
        ("app-aaaaaaa3", 300),
        ("app-aaaaaaa4", 200),
        ("app-aaaaaaa5", 100),
        ("app-fresh001", 1),
        ("other-aaaaaaa0", 900),
    ]
    .iter()
    .map(|(name, minutes)| listing_line(name, *minutes))
    .collect();
    let docker = FakeDocker {
        images,
        ..FakeDocker::with_artifacts(vec![("app.bin", "new")])
    };

    let outcome = Orchestrator::new(&cfg, &docker).with_clock(now).run();

    assert!(outcome.is_success());
    let removed: Vec<String> = docker
        .calls_to("rmi")
        .into_iter()
        .map(|c| c[1].clone())
        .collect();
    assert_eq!(removed, ["app-aaaaaaa3", "app-aaaaaaa2", "app-aaaaaaa1"]);

    let eviction = outcome.report.eviction.expect("eviction ran");
    assert_eq!(eviction.kept, ["app-aaaaaaa5", "app-aaaaaaa4"]);
    assert_eq!(eviction.young, ["app-fresh001"]);
}

#[test]
fn refused_image_removal_is_a_warning() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config(dir.path());
    cfg.num_cached_images = 0;
    let docker = FakeDocker {
        images: listing_line("app-inuse001", 120) + &listing_line("app-unused01", 180),
        refuse_rmi: vec!["app-inuse001".into()],
        ..FakeDocker::with_artifacts(vec![("app.bin", "new")])
    };

    let outcome = Orchestrator::new(&cfg, &docker).with_clock(now).run();

    assert!(outcome.is_success());
    assert_eq!(docker.calls_to("rmi").len(), 2);
    let eviction = outcome.report.eviction.clone().expect("eviction ran");
    assert_eq!(eviction.removed, ["app-unused01"]);
    assert_eq!(outcome.report.warnings.len(), 1);
}

#[test]
fn global_args_lead_every_invocation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config(dir.path());
    cfg.docker_args = vec!["--context".into(), "ci".into()];
    let docker = FakeDocker::with_artifacts(vec![("app.bin", "new")]);

    let outcome = Orchestrator::new(&cfg, &docker).with_clock(now).run();

    assert!(outcome.is_success());
    for args in docker.calls.borrow().iter() {
        assert_eq!(args[..2], ["--context", "ci"]);
    }
}
