//! Integration tests for the run_query CLI.
//!
//! Runs the binary via `cargo run --bin run_query` with a shell decider fixture and `cat`
//! as every stage.

use std::path::PathBuf;
use std::process::Command;

fn decider() -> String {
  let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join("decider.sh");
  format!("sh {}", path.display())
}

/// Run run_query with extra env vars; STAGEPLAN_* from the caller's environment is cleared.
fn run_query_cli(args: &[&str], env_add: &[(&str, &str)]) -> std::process::Output {
  let mut cmd = Command::new("cargo");
  cmd.args(["run", "--bin", "run_query", "--"]).args(args);
  cmd.env_remove("STAGEPLAN_DECIDER_CMD");
  cmd.env_remove("STAGEPLAN_RUN_DIR");
  for (k, v) in env_add {
    cmd.env(k, v);
  }
  cmd.output().expect("run cargo run --bin run_query")
}

#[test]
fn prints_usage_without_args() {
  let out = run_query_cli(&[], &[]);
  assert!(!out.status.success());
  let stderr = String::from_utf8_lossy(&out.stderr);
  assert!(stderr.contains("Usage") || stderr.contains("usage"));
  assert!(stderr.contains("run_query") || stderr.contains("QUERY"));
}

#[test]
fn exits_1_without_decider() {
  let out = run_query_cli(&["bank caps"], &[]);
  assert_eq!(out.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&out.stderr);
  assert!(stderr.contains("no decider command"), "stderr: {}", stderr);
}

#[test]
fn exits_1_for_unregistered_stage() {
  let decider = decider();
  let out = run_query_cli(
    &[
      "--decider-cmd",
      &decider,
      "--stage",
      "synthesizer=cat",
      "--enable",
      "web_researcher,synthesizer",
      "bank caps",
    ],
    &[],
  );
  assert_eq!(out.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&out.stderr);
  assert!(stderr.contains("not registered"), "stderr: {}", stderr);
}

#[test]
fn completes_a_run_and_writes_artifacts() {
  let dir = tempfile::tempdir().expect("temp dir");
  let run_dir = dir.path().join("run");
  let decider = decider();
  let out = run_query_cli(
    &[
      "--stage",
      "web_researcher=cat",
      "--stage",
      "synthesizer=cat",
      "--enable",
      "web_researcher,synthesizer",
      "bank caps",
    ],
    &[
      ("STAGEPLAN_DECIDER_CMD", decider.as_str()),
      ("STAGEPLAN_RUN_DIR", run_dir.to_str().expect("path")),
    ],
  );
  assert!(
    out.status.success(),
    "stderr: {} stdout: {}",
    String::from_utf8_lossy(&out.stderr),
    String::from_utf8_lossy(&out.stdout)
  );
  let stdout = String::from_utf8_lossy(&out.stdout);
  assert!(stdout.contains("Run completed."));
  assert!(stdout.contains("Steps: 3"));
  assert!(stdout.contains("Replans: 0"));

  assert!(run_dir.join("checkpoint.json").exists());
  let log = std::fs::read_to_string(run_dir.join("execution.log.json")).expect("log");
  let log: serde_json::Value = serde_json::from_str(&log).expect("log json");
  assert_eq!(log["final_status"], "success");
  assert_eq!(log["steps"].as_array().expect("steps").len(), 6);

  // Resuming a finished run prints the stored result.
  let checkpoint = run_dir.join("checkpoint.json");
  let out = run_query_cli(
    &[
      "--decider-cmd",
      "false",
      "--stage",
      "web_researcher=cat",
      "--stage",
      "synthesizer=cat",
      "--resume",
      checkpoint.to_str().expect("path"),
    ],
    &[],
  );
  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
  assert!(String::from_utf8_lossy(&out.stdout).contains("Steps: 3"));
}

#[test]
fn node_ceiling_flag_aborts_the_run() {
  let decider = decider();
  let out = run_query_cli(
    &[
      "--decider-cmd",
      &decider,
      "--stage",
      "web_researcher=cat",
      "--stage",
      "synthesizer=cat",
      "--enable",
      "web_researcher,synthesizer",
      "--max-node-invocations",
      "3",
      "bank caps",
    ],
    &[],
  );
  assert_eq!(out.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&out.stderr);
  assert!(stderr.contains("exceeded 3 node invocations"), "stderr: {}", stderr);
}
