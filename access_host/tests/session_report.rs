use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::tempdir;

fn run_host(args: &[&str]) -> Result<std::process::Output> {
    Command::new(env!("CARGO_BIN_EXE_access_host"))
        .args(args)
        .output()
        .context("running access_host")
}

fn read_report(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading report {}", path.display()))?;
    serde_json::from_str(&raw).context("parsing session report")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths should be UTF-8")
}

#[test]
fn grey_ramp_session_fades_cycles_and_ends_black() -> Result<()> {
    let temp_dir = tempdir()?;
    let report_path = temp_dir.path().join("reports").join("session.json");

    let output = run_host(&["--report-json", path_arg(&report_path)])?;
    assert!(
        output.status.success(),
        "access_host failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report = read_report(&report_path)?;
    assert_eq!(report["palette_source"], "grey-ramp");
    assert_eq!(report["width"], 320);
    assert_eq!(report["fade_in"]["status"], "finished");
    assert_eq!(report["fade_in"]["steps"], 128);
    assert_eq!(report["cycle"]["ticks"], 32);
    assert_eq!(report["cycle"]["steps"], 32);
    assert_eq!(report["cycle"]["cursor"], 224);
    assert_eq!(report["fade_out"]["status"], "finished");
    assert_eq!(report["fade_out"]["steps"], 128);
    assert_eq!(report["palette_checksum"], 0);
    assert_eq!(report["frames_presented"], 257);
    assert_eq!(report["event_polls"], 288);

    let events = report["events"]
        .as_array()
        .context("events should be an array")?;
    let first = &events[0];
    assert_eq!(first["kind"], "copy_rect");
    assert_eq!(first["width"], 320);
    assert!(events
        .iter()
        .any(|event| event["kind"] == "delay" && event["millis"] == 10));
    Ok(())
}

#[test]
fn quit_request_cancels_fade_in() -> Result<()> {
    let temp_dir = tempdir()?;
    let report_path = temp_dir.path().join("session.json");

    let output = run_host(&["--quit-after", "3", "--report-json", path_arg(&report_path)])?;
    assert!(output.status.success());

    let report = read_report(&report_path)?;
    assert_eq!(report["fade_in"]["status"], "cancelled");
    assert_eq!(report["fade_in"]["steps"], 2);
    assert!(report["cycle"].is_null());
    assert!(report["fade_out"].is_null());
    Ok(())
}

#[test]
fn palette_loads_from_container_directory() -> Result<()> {
    let temp_dir = tempdir()?;
    let ap_dir = temp_dir.path().join("data");
    fs::create_dir_all(&ap_dir)?;

    let mut container = Vec::new();
    container.extend_from_slice(&1u16.to_le_bytes());
    container.extend_from_slice(&6u32.to_le_bytes());
    container.extend_from_slice(&[10u8; 768]);
    fs::write(ap_dir.join("c00.ap"), &container)?;

    let config_path = temp_dir.path().join("screen.json");
    fs::write(&config_path, r#"{ "width": 64, "height": 40 }"#)?;

    let report_path = temp_dir.path().join("session.json");
    let output = run_host(&[
        "--ap-dir",
        path_arg(&ap_dir),
        "--palette-file",
        "0",
        "--palette-subfile",
        "0",
        "--screen-config",
        path_arg(&config_path),
        "--cycle-ticks",
        "4",
        "--report-json",
        path_arg(&report_path),
    ])?;
    assert!(
        output.status.success(),
        "access_host failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report = read_report(&report_path)?;
    let source = report["palette_source"]
        .as_str()
        .context("palette_source should be a string")?;
    assert!(source.ends_with(":0:0"), "unexpected source {source}");
    assert_eq!(report["width"], 64);
    assert_eq!(report["height"], 40);
    assert_eq!(report["fade_in"]["steps"], 5);
    assert_eq!(report["cycle"]["cursor"], 236);
    assert_eq!(report["fade_out"]["steps"], 5);
    Ok(())
}

#[test]
fn palette_flags_without_container_directory_fail() -> Result<()> {
    let output = run_host(&["--palette-file", "1", "--palette-subfile", "2"])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--ap-dir"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn missing_palette_subfile_is_reported() -> Result<()> {
    let temp_dir = tempdir()?;
    let ap_dir = temp_dir.path().join("data");
    fs::create_dir_all(&ap_dir)?;

    let mut container = Vec::new();
    container.extend_from_slice(&1u16.to_le_bytes());
    container.extend_from_slice(&6u32.to_le_bytes());
    container.extend_from_slice(&[0u8; 12]);
    fs::write(ap_dir.join("c00.ap"), &container)?;

    let output = run_host(&[
        "--ap-dir",
        path_arg(&ap_dir),
        "--palette-file",
        "0",
        "--palette-subfile",
        "0",
    ])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loading palette"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn tiny_screens_run_to_completion() -> Result<()> {
    let temp_dir = tempdir()?;
    for (width, height) in [(8, 8), (1, 1), (9, 40)] {
        let config_path = temp_dir.path().join(format!("screen_{width}x{height}.json"));
        fs::write(
            &config_path,
            format!(r#"{{ "width": {width}, "height": {height} }}"#),
        )?;
        let report_path = temp_dir.path().join(format!("session_{width}x{height}.json"));

        let output = run_host(&[
            "--screen-config",
            path_arg(&config_path),
            "--report-json",
            path_arg(&report_path),
        ])?;
        assert!(
            output.status.success(),
            "access_host failed for {width}x{height}: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let report = read_report(&report_path)?;
        assert_eq!(report["width"], width);
        assert_eq!(report["height"], height);
        assert_eq!(report["fade_out"]["status"], "finished");
    }
    Ok(())
}

#[test]
fn screen_config_with_bad_cycle_slot_is_rejected() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("screen.json");
    fs::write(&config_path, r#"{ "timer_slots": 2 }"#)?;

    let output = run_host(&["--screen-config", path_arg(&config_path)])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cycle timer slot"), "stderr: {stderr}");
    Ok(())
}
