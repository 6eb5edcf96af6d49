//! Unit tests for the installation pipeline.
//!
//! The decompressors, component installer and launcher are stubbed, so each
//! test exercises stage ordering and filesystem reconciliation against a
//! temporary root.

use super::{Collaborators, Pipeline, PipelineOptions};
use crate::archive::extraction::MockDecompressor;
use crate::archive::handle::ArchiveHandle;
use crate::error::InstallerError;
use crate::event::{InstallEvent, Stage};
use crate::path_settings::MockPathSettingsLauncher;
use crate::platform::HostOs;
use crate::sdkmanager::StreamMode;
use crate::test_utils::{
    RecordingLauncher, StubComponentInstaller, StubDecompressor, has_reconciled_tools,
    write_cmdline_tools,
};
use camino::{Utf8Path, Utf8PathBuf};
use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;

/// A temporary directory holding the installation root and an archive file.
struct Sandbox {
    _temp: TempDir,
    root: Utf8PathBuf,
    archive: Utf8PathBuf,
}

impl Sandbox {
    fn options(&self, handle: fn(Utf8PathBuf) -> ArchiveHandle) -> PipelineOptions {
        PipelineOptions {
            root: self.root.clone(),
            archive: handle(self.archive.clone()),
            delete_archive: true,
            install_platform_tools: false,
            open_path_settings: false,
            verbose: false,
            stream: StreamMode::Capture,
            os: HostOs::Linux,
        }
    }
}

#[fixture]
fn sandbox() -> Sandbox {
    let temp = tempfile::tempdir().expect("temp dir");
    let base = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 temp path");
    let archive = base.join("commandlinetools.zip");
    fs::write(&archive, b"zip bytes").expect("write archive");
    Sandbox {
        _temp: temp,
        root: base.join("sdk"),
        archive,
    }
}

struct Outcome {
    events: Vec<InstallEvent>,
    result: crate::error::Result<crate::layout::PathEntries>,
}

fn run_with(
    options: &PipelineOptions,
    native: &dyn crate::archive::extraction::Decompressor,
    installer: &StubComponentInstaller,
    launcher: &dyn crate::path_settings::PathSettingsLauncher,
) -> Outcome {
    let portable = StubDecompressor::unpacking("zip");
    let pipeline = Pipeline::new(Collaborators {
        native,
        portable: &portable,
        installer,
        launcher,
    });
    let mut events = Vec::new();
    let result = pipeline.run(options, &mut |event| events.push(event));
    Outcome { events, result }
}

fn run(options: &PipelineOptions) -> Outcome {
    run_with(
        options,
        &StubDecompressor::unpacking("unzip"),
        &StubComponentInstaller::succeeding(&[]),
        &RecordingLauncher::default(),
    )
}

fn stages(events: &[InstallEvent]) -> Vec<Stage> {
    let mut seen: Vec<Stage> = Vec::new();
    for stage in events.iter().map(InstallEvent::stage) {
        if seen.last() != Some(&stage) {
            seen.push(stage);
        }
    }
    seen
}

#[rstest]
fn completes_with_tools_entry_only(sandbox: Sandbox) {
    let outcome = run(&sandbox.options(ArchiveHandle::Supplied));

    let entries = outcome.result.expect("pipeline succeeds");
    assert_eq!(
        entries.as_slice(),
        &[sandbox.root.join("cmdline-tools/latest/bin")]
    );
    assert!(has_reconciled_tools(&sandbox.root));
    assert!(!sandbox.root.join("cmdline-tools/bin").exists());
    assert_eq!(
        outcome.events.last(),
        Some(&InstallEvent::Completed {
            path_entries: entries
        })
    );
    assert_eq!(
        stages(&outcome.events),
        vec![Stage::Extracting, Stage::ReconcilingLayout, Stage::Finalizing]
    );
}

#[rstest]
fn platform_tools_adds_second_entry(sandbox: Sandbox) {
    let mut options = sandbox.options(ArchiveHandle::Supplied);
    options.install_platform_tools = true;
    let installer = StubComponentInstaller::succeeding(&["Downloading platform-tools", "done"]);

    let outcome = run_with(
        &options,
        &StubDecompressor::unpacking("unzip"),
        &installer,
        &RecordingLauncher::default(),
    );

    let entries = outcome.result.expect("pipeline succeeds");
    assert_eq!(
        entries.as_slice(),
        &[
            sandbox.root.join("cmdline-tools/latest/bin"),
            sandbox.root.join("platform-tools"),
        ]
    );
    assert_eq!(
        stages(&outcome.events),
        vec![
            Stage::Extracting,
            Stage::ReconcilingLayout,
            Stage::InstallingPlatformTools,
            Stage::Finalizing,
        ]
    );
    let output: Vec<_> = outcome
        .events
        .iter()
        .filter_map(|event| match event {
            InstallEvent::PlatformToolsOutput { line } => Some(line.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(output, vec!["Downloading platform-tools", "done"]);

    let requests = installer.requests();
    assert_eq!(requests.len(), 1);
    let request = requests.first().expect("one request");
    assert_eq!(request.package, "platform-tools");
    assert_eq!(request.sdk_root, sandbox.root);
    assert_eq!(
        request.sdkmanager,
        sandbox.root.join("cmdline-tools/latest/bin/sdkmanager")
    );
}

#[rstest]
fn windows_runs_the_batch_launcher(sandbox: Sandbox) {
    let mut options = sandbox.options(ArchiveHandle::Supplied);
    options.install_platform_tools = true;
    options.os = HostOs::Windows;
    let installer = StubComponentInstaller::succeeding(&[]);

    let outcome = run_with(
        &options,
        &StubDecompressor::unpacking("tar"),
        &installer,
        &RecordingLauncher::default(),
    );

    outcome.result.expect("pipeline succeeds");
    let requests = installer.requests();
    let request = requests.first().expect("one request");
    assert_eq!(
        request.sdkmanager,
        sandbox.root.join("cmdline-tools/latest/bin/sdkmanager.bat")
    );
}

#[rstest]
fn failing_platform_tools_reports_exit_code(sandbox: Sandbox) {
    let mut options = sandbox.options(ArchiveHandle::Supplied);
    options.install_platform_tools = true;

    let outcome = run_with(
        &options,
        &StubDecompressor::unpacking("unzip"),
        &StubComponentInstaller::exiting_with(&["Error: license not accepted"], 3),
        &RecordingLauncher::default(),
    );

    let err = outcome.result.expect_err("sdkmanager fails");
    assert!(matches!(
        err,
        InstallerError::PlatformToolsInstallFailed { code: 3 }
    ));
    assert!(
        !outcome
            .events
            .iter()
            .any(|event| matches!(event, InstallEvent::Completed { .. }))
    );
    assert!(has_reconciled_tools(&sandbox.root));
}

#[rstest]
fn unavailable_native_falls_back_with_warning(sandbox: Sandbox) {
    let outcome = run_with(
        &sandbox.options(ArchiveHandle::Supplied),
        &StubDecompressor::unavailable("unzip"),
        &StubComponentInstaller::succeeding(&[]),
        &RecordingLauncher::default(),
    );

    outcome.result.expect("fallback succeeds");
    let warning = outcome
        .events
        .iter()
        .position(|event| matches!(event, InstallEvent::NativeExtractUnavailable { .. }))
        .expect("fallback warning");
    let extracted = outcome
        .events
        .iter()
        .position(|event| *event == InstallEvent::Extracted { native: false })
        .expect("extracted by portable");
    assert!(warning < extracted);
}

#[rstest]
fn failing_native_falls_back_to_portable(sandbox: Sandbox) {
    let mut native = MockDecompressor::new();
    native.expect_is_available().return_const(true);
    native.expect_name().return_const("unzip");
    native.expect_extract().times(1).returning(|_, _| {
        Err(crate::archive::extraction::ExtractionError::Exited {
            program: "unzip",
            code: 9,
            stderr: "bad zipfile".to_owned(),
        })
    });

    let outcome = run_with(
        &sandbox.options(ArchiveHandle::Supplied),
        &native,
        &StubComponentInstaller::succeeding(&[]),
        &RecordingLauncher::default(),
    );

    outcome.result.expect("fallback succeeds");
    assert!(outcome.events.iter().any(|event| matches!(
        event,
        InstallEvent::NativeExtractUnavailable { reason } if reason.contains("code 9")
    )));
    assert!(has_reconciled_tools(&sandbox.root));
}

#[rstest]
fn native_extraction_skips_the_portable_decompressor(sandbox: Sandbox) {
    let mut native = MockDecompressor::new();
    native.expect_is_available().return_const(true);
    native
        .expect_extract()
        .times(1)
        .returning(|_, dest| Ok(write_cmdline_tools(dest)?));
    let portable = StubDecompressor::unpacking("zip");
    let installer = StubComponentInstaller::succeeding(&[]);
    let launcher = RecordingLauncher::default();
    let pipeline = Pipeline::new(Collaborators {
        native: &native,
        portable: &portable,
        installer: &installer,
        launcher: &launcher,
    });
    let mut events = Vec::new();

    pipeline
        .run(&sandbox.options(ArchiveHandle::Supplied), &mut |e| events.push(e))
        .expect("pipeline succeeds");

    assert_eq!(portable.calls(), 0);
    assert!(events.contains(&InstallEvent::Extracted { native: true }));
}

#[rstest]
fn failing_portable_extraction_aborts(sandbox: Sandbox) {
    let portable = StubDecompressor::failing("zip", 5);
    let native = StubDecompressor::unavailable("unzip");
    let installer = StubComponentInstaller::succeeding(&[]);
    let launcher = RecordingLauncher::default();
    let pipeline = Pipeline::new(Collaborators {
        native: &native,
        portable: &portable,
        installer: &installer,
        launcher: &launcher,
    });
    let mut events = Vec::new();

    let err = pipeline
        .run(&sandbox.options(ArchiveHandle::Supplied), &mut |e| events.push(e))
        .expect_err("extraction fails");

    assert!(matches!(err, InstallerError::ExtractFailed { code: 5, .. }));
    assert!(
        !events
            .iter()
            .any(|event| event.stage() != Stage::Extracting)
    );
}

#[rstest]
fn latest_as_a_file_is_a_prepare_failure(sandbox: Sandbox) {
    let latest = sandbox.root.join("cmdline-tools/latest");
    fs::create_dir_all(latest.parent().expect("parent")).expect("create cmdline-tools");
    fs::write(&latest, b"not a directory").expect("write blocking file");

    let outcome = run(&sandbox.options(ArchiveHandle::Supplied));

    let err = outcome.result.expect_err("reconciliation fails");
    assert!(matches!(err, InstallerError::PrepareFailed { .. }));
    assert!(
        !outcome
            .events
            .iter()
            .any(|event| matches!(event, InstallEvent::Completed { .. }))
    );
}

#[rstest]
fn missing_unpacked_directory_is_a_prepare_failure(sandbox: Sandbox) {
    let mut native = MockDecompressor::new();
    native.expect_is_available().return_const(true);
    native.expect_extract().returning(|_, _| Ok(()));

    let outcome = run_with(
        &sandbox.options(ArchiveHandle::Supplied),
        &native,
        &StubComponentInstaller::succeeding(&[]),
        &RecordingLauncher::default(),
    );

    assert!(matches!(
        outcome.result,
        Err(InstallerError::PrepareFailed { .. })
    ));
}

#[rstest]
fn second_run_over_same_root_is_idempotent(sandbox: Sandbox) {
    let options = sandbox.options(ArchiveHandle::Supplied);

    let first = run(&options).result.expect("first run");
    let second = run(&options).result.expect("second run");

    assert_eq!(first, second);
    assert!(has_reconciled_tools(&sandbox.root));
    assert!(!sandbox.root.join("cmdline-tools/latest/latest").exists());
}

#[rstest]
fn missing_archive_is_reported_before_any_event(sandbox: Sandbox) {
    let mut options = sandbox.options(ArchiveHandle::Supplied);
    options.archive = ArchiveHandle::Supplied(sandbox.root.join("missing.zip"));

    let outcome = run(&options);

    assert!(matches!(
        outcome.result,
        Err(InstallerError::ArchiveNotFound { .. })
    ));
    assert!(outcome.events.is_empty());
}

#[rstest]
fn downloaded_archive_is_deleted(sandbox: Sandbox) {
    let outcome = run(&sandbox.options(ArchiveHandle::Downloaded));

    outcome.result.expect("pipeline succeeds");
    assert!(!sandbox.archive.exists());
    assert!(outcome.events.contains(&InstallEvent::ArchiveDeleted {
        archive: sandbox.archive.clone()
    }));
}

#[rstest]
#[case::supplied(ArchiveHandle::Supplied as fn(Utf8PathBuf) -> ArchiveHandle, true)]
#[case::downloaded(ArchiveHandle::Downloaded as fn(Utf8PathBuf) -> ArchiveHandle, false)]
fn archive_kept_when_not_owned_or_not_requested(
    sandbox: Sandbox,
    #[case] handle: fn(Utf8PathBuf) -> ArchiveHandle,
    #[case] delete_archive: bool,
) {
    let mut options = sandbox.options(handle);
    options.delete_archive = delete_archive;

    run(&options).result.expect("pipeline succeeds");

    assert!(sandbox.archive.is_file());
}

#[rstest]
#[case::supplied(ArchiveHandle::Supplied as fn(Utf8PathBuf) -> ArchiveHandle, true)]
#[case::downloaded_kept(ArchiveHandle::Downloaded as fn(Utf8PathBuf) -> ArchiveHandle, false)]
fn archive_survives_failed_extraction(
    sandbox: Sandbox,
    #[case] handle: fn(Utf8PathBuf) -> ArchiveHandle,
    #[case] delete_archive: bool,
) {
    let mut options = sandbox.options(handle);
    options.delete_archive = delete_archive;
    let native = StubDecompressor::unavailable("unzip");
    let portable = StubDecompressor::failing("zip", 9);
    let installer = StubComponentInstaller::succeeding(&[]);
    let launcher = RecordingLauncher::default();
    let pipeline = Pipeline::new(Collaborators {
        native: &native,
        portable: &portable,
        installer: &installer,
        launcher: &launcher,
    });

    let err = pipeline
        .run(&options, &mut |_| {})
        .expect_err("extraction fails");

    assert!(matches!(err, InstallerError::ExtractFailed { code: 9, .. }));
    assert!(sandbox.archive.is_file());
}

#[rstest]
#[case::downloaded_with_delete(ArchiveHandle::Downloaded as fn(Utf8PathBuf) -> ArchiveHandle, true)]
#[case::downloaded_kept(ArchiveHandle::Downloaded as fn(Utf8PathBuf) -> ArchiveHandle, false)]
#[case::supplied(ArchiveHandle::Supplied as fn(Utf8PathBuf) -> ArchiveHandle, true)]
fn archive_survives_failed_reconciliation(
    sandbox: Sandbox,
    #[case] handle: fn(Utf8PathBuf) -> ArchiveHandle,
    #[case] delete_archive: bool,
) {
    let latest = sandbox.root.join("cmdline-tools/latest");
    fs::create_dir_all(latest.parent().expect("parent")).expect("create cmdline-tools");
    fs::write(&latest, b"not a directory").expect("write blocking file");
    let mut options = sandbox.options(handle);
    options.delete_archive = delete_archive;

    let outcome = run(&options);

    assert!(matches!(
        outcome.result,
        Err(InstallerError::PrepareFailed { .. })
    ));
    assert!(sandbox.archive.is_file());
    assert!(
        !outcome
            .events
            .iter()
            .any(|event| matches!(event, InstallEvent::ArchiveDeleted { .. }))
    );
}

#[rstest]
fn path_settings_opened_when_requested(sandbox: Sandbox) {
    let mut options = sandbox.options(ArchiveHandle::Supplied);
    options.open_path_settings = true;
    let mut launcher = MockPathSettingsLauncher::new();
    launcher.expect_open().times(1).returning(|| Ok(()));

    let outcome = run_with(
        &options,
        &StubDecompressor::unpacking("unzip"),
        &StubComponentInstaller::succeeding(&[]),
        &launcher,
    );

    outcome.result.expect("pipeline succeeds");
}

#[rstest]
fn path_settings_failure_is_only_a_warning(sandbox: Sandbox) {
    let mut options = sandbox.options(ArchiveHandle::Supplied);
    options.open_path_settings = true;
    let launcher = RecordingLauncher::failing();

    let outcome = run_with(
        &options,
        &StubDecompressor::unpacking("unzip"),
        &StubComponentInstaller::succeeding(&[]),
        &launcher,
    );

    outcome.result.expect("pipeline succeeds");
    assert_eq!(launcher.opened(), 1);
    let failed = outcome
        .events
        .iter()
        .position(|event| matches!(event, InstallEvent::PathSettingsOpenFailed { .. }))
        .expect("warning event");
    let completed = outcome
        .events
        .iter()
        .position(|event| matches!(event, InstallEvent::Completed { .. }))
        .expect("completed event");
    assert!(failed < completed);
}

#[rstest]
fn path_settings_not_opened_by_default(sandbox: Sandbox) {
    let launcher = RecordingLauncher::default();

    run_with(
        &sandbox.options(ArchiveHandle::Supplied),
        &StubDecompressor::unpacking("unzip"),
        &StubComponentInstaller::succeeding(&[]),
        &launcher,
    )
    .result
    .expect("pipeline succeeds");

    assert_eq!(launcher.opened(), 0);
}

#[test]
fn existing_tools_are_replaced() {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8Path::from_path(temp.path()).expect("UTF-8 temp path");
    let stale = root.join("cmdline-tools/latest/bin/sdkmanager");
    fs::create_dir_all(stale.parent().expect("parent")).expect("create stale tree");
    fs::write(&stale, b"old").expect("write stale launcher");
    write_cmdline_tools(root).expect("write fresh tree");

    super::move_into_expected_dir(
        root.join("cmdline-tools").as_std_path(),
        root.join("cmdline-tools/latest").as_std_path(),
    )
    .expect("reconcile");

    let contents = fs::read_to_string(&stale).expect("read launcher");
    assert_eq!(contents, "stub bin/sdkmanager\n");
}
