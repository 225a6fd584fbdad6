//! End-to-end runs of the `refframe` binary on generated logs.

use std::f64::consts::PI;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const SELECTION_HEADER: &str = "ParticipantID,Movement,CircleDirection,ReferenceFrame,TargetSize,\
ActiveTargetIndex,AbsoluteTargetPositionX,AbsoluteTargetPositionY,\
AbsoluteSelectionPositionX,AbsoluteSelectionPositionY,Success,SelectionDuration";

const HIGH_FREQUENCY_HEADER: &str = "ParticipantID,Movement,CircleDirection,ReferenceFrame,TargetSize,\
SystemClockTimestampMs,HeadPositionX,HeadPositionY,HeadPositionZ,TrackPositionY,\
AllTargetsPositionX,AllTargetsPositionY,AllTargetsPositionZ,\
AllTargetsForwardX,AllTargetsForwardY,AllTargetsForwardZ,\
WalkingDirectionForwardX,WalkingDirectionForwardZ";

const MOVEMENTS: [&str; 3] = ["Standing", "Walking", "Circle"];
const FRAMES: [&str; 3] = ["Palm", "Palm w/o Rotation", "Path"];

fn refframe(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_refframe"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("failed to run refframe")
}

/// `trials` selections per Movement × ReferenceFrame × TargetSize cell
fn write_selections(dir: &Path, participant: u32, sizes: &[&str], trials: usize) {
    let mut csv = String::from(SELECTION_HEADER);
    csv.push('\n');

    for movement in MOVEMENTS {
        let direction = if movement == "Circle" { "Clockwise" } else { "" };
        for frame in FRAMES {
            for size in sizes {
                for k in 0..trials {
                    let angle = 2.0 * PI * k as f64 / 7.0;
                    let (tx, ty) = (0.1 * angle.cos(), 0.1 * angle.sin());
                    let jitter = 0.002 * ((k * 3 + participant as usize) % 5) as f64;
                    writeln!(
                        csv,
                        "{participant},{movement},{direction},{frame},{size},{k},{tx},{ty},{},{},{},{}",
                        tx + jitter,
                        ty - jitter / 2.0,
                        u8::from(k != 3),
                        450 + 20 * k
                    ).ok();
                }
            }
        }
    }

    fs::write(dir.join(format!("{participant}_selections.csv")), csv).unwrap();
}

/// One Walking block per reference frame with a continuous 600 ms head
/// bob; the clock restarts at every block
fn write_high_frequency(dir: &Path, participant: u32) {
    let mut csv = String::from(HIGH_FREQUENCY_HEADER);
    csv.push('\n');

    for (b, frame) in FRAMES.iter().enumerate() {
        for i in 0..300 {
            let t = i as f64 * 25.0;
            let global_t = (b * 300 + i) as f64 * 25.0;
            let head_y = 1.7 + 0.03 * (2.0 * PI * global_t / 600.0).sin();
            let z = 0.001 * i as f64;
            writeln!(
                csv,
                "{participant},Walking,,{frame},0.025,{t},0,{head_y},{z},0,\
                 {},1.2,{},0,0,1,0,1",
                0.05 * b as f64,
                z + 0.4
            ).ok();
        }
    }

    fs::write(dir.join(format!("{participant}_highFrequency.csv")), csv).unwrap();
}

fn output_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn test_missing_target_size_level_fails_without_output() {
    let logs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    // 28 trials keep Movement and ReferenceFrame balanced with 3 sizes
    write_selections(logs.path(), 1, &["0.015", "0.025", "0.035"], 28);

    let output = refframe(&[
        "preprocess",
        logs.path().to_str().unwrap(),
        "--start",
        "1",
        "--end",
        "1",
        "--output",
        out.path().to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ParticipantID\tMovement\tReferenceFrame\tTargetSize\tRows"));
    assert!(stderr.contains("Expected 4 levels of TargetSize, found 3"), "{stderr}");
    assert!(output_files(out.path()).is_empty());
}

#[test]
fn test_undeclared_target_size_fails_without_output() {
    let logs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_selections(logs.path(), 1, &["0.01", "0.015", "0.025", "0.035"], 7);

    let output = refframe(&[
        "preprocess",
        logs.path().to_str().unwrap(),
        "--start",
        "1",
        "--end",
        "1",
        "--output",
        out.path().to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("TargetSize levels not declared in the configuration: 0.01"),
        "{stderr}"
    );
    assert!(output_files(out.path()).is_empty());
}

#[test]
fn test_preprocess_writes_wide_and_long_tables() {
    let logs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let sizes = ["0.015", "0.025", "0.035", "0.045"];
    write_selections(logs.path(), 1, &sizes, 7);
    write_selections(logs.path(), 2, &sizes, 7);

    let output = refframe(&[
        "preprocess",
        logs.path().to_str().unwrap(),
        "--start",
        "1",
        "--end",
        "2",
        "--output",
        out.path().to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        output_files(out.path()),
        vec!["1-2_preprocessed.csv", "1-2_preprocessed_art.csv"]
    );

    let wide = fs::read_to_string(out.path().join("1-2_preprocessed.csv")).unwrap();
    let mut lines = wide.lines();
    let header: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(header[0], "ParticipantID");
    assert_eq!(header[1], "Success_Standing_Palm_0.015");
    // 8 variables x 36 condition tuples
    assert_eq!(header.len(), 1 + 8 * 36);
    assert_eq!(lines.count(), 2);

    let long = fs::read_to_string(out.path().join("1-2_preprocessed_art.csv")).unwrap();
    assert!(long.starts_with(
        "ParticipantID,Movement,CircleDirection,ReferenceFrame,TargetSize,Success,MT,dx,ae,DistanceCM,WeCM,IDe,TP"
    ));
    assert_eq!(long.lines().count(), 1 + 2 * 36);

    // Identical input reproduces identical bytes
    let again = refframe(&[
        "preprocess",
        logs.path().to_str().unwrap(),
        "--start",
        "1",
        "--end",
        "2",
        "--output",
        out.path().to_str().unwrap(),
    ]);
    assert!(again.status.success());
    assert_eq!(fs::read_to_string(out.path().join("1-2_preprocessed.csv")).unwrap(), wide);
}

#[test]
fn test_posture_summary_per_reference_frame() {
    let logs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_high_frequency(logs.path(), 3);

    let output = refframe(&[
        "posture",
        logs.path().to_str().unwrap(),
        "--start",
        "3",
        "--end",
        "3",
        "--output",
        out.path().to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let posture = fs::read_to_string(out.path().join("3-3_posture.csv")).unwrap();
    let lines: Vec<&str> = posture.lines().collect();
    assert!(lines[0].starts_with("ParticipantID,ReferenceFrame,ParticipantHeight,Decline,Depth"));
    assert_eq!(lines.len(), 1 + FRAMES.len());
    assert!(lines[1].starts_with("3,Palm,"));
    assert!(lines[3].starts_with("3,Path,"));
}

#[test]
fn test_steps_reports_cadence() {
    let logs = tempfile::tempdir().unwrap();
    write_high_frequency(logs.path(), 4);
    let file = logs.path().join("4_highFrequency.csv");

    let output = refframe(&["steps", file.to_str().unwrap(), "--per-condition"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    // 600 ms between minima
    assert!(stdout.contains("Step frequency: 100.00 steps/min"), "{stdout}");
    assert!(stdout.contains("Walking"));
}

#[test]
fn test_unknown_dependent_variable_fails() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("long.csv");
    fs::write(&csv, "ParticipantID\n").unwrap();

    let output = refframe(&["plot", csv.to_str().unwrap(), "--dependent", "Speed"]);
    assert_eq!(output.status.code(), Some(1));
}
