//! CLI: answer a query with the plan/supervise/execute loop.
//!
//! Decisions come from an external command (`--decider-cmd`) and each stage is an
//! external command (`--stage NAME=CMD`). Both receive one line of JSON on stdin and
//! answer on stdout.
//!
//! Usage: `run_query [OPTIONS] <QUERY>`
//! Example: run_query --decider-cmd "sh decider.sh" --stage web_researcher=cat \
//!   --stage synthesizer="sh answer.sh" --enable web_researcher,synthesizer "bank caps"
//!
//! Set RUST_LOG=stageplan=trace for TRACE-level span enter/exit and events.

use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use stageplan::{
  CommandDecisionProvider, CommandStage, DEFAULT_ENABLED_STAGES, LoopConfig, RunOptions,
  RunRequest, StageName, StageRegistry, checkpoint_io, run_query,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Answer a query with the plan/supervise/execute loop.
#[derive(Parser, Debug)]
#[command(name = "run_query")]
#[command(
  after_help = r#"Environment variables (override --decider-cmd and --run-dir when set):
  STAGEPLAN_DECIDER_CMD   Command answering plan, executor and supervisor requests.
  STAGEPLAN_RUN_DIR       Directory for checkpoint.json and execution.log.json.
  STAGEPLAN_MAX_REPLANS, STAGEPLAN_GLOBAL_REPLAN_CEILING, STAGEPLAN_MAX_RESEARCH_STEPS,
  STAGEPLAN_MAX_NODE_INVOCATIONS, STAGEPLAN_RECENT_MESSAGE_WINDOW,
  STAGEPLAN_CALL_TIMEOUT_SECS, STAGEPLAN_ENFORCE_PLAN_RULES
                          Loop bounds; applied after --config and before the flags below.

Examples:
  run_query --decider-cmd "sh decider.sh" --stage web_researcher=cat \
    --stage synthesizer="sh answer.sh" --enable web_researcher,synthesizer "bank caps"
  run_query --decider-cmd "sh decider.sh" --stage synthesizer=cat --resume .stageplan/checkpoint.json"#
)]
struct Args {
  /// Command answering decision requests. Overridden by STAGEPLAN_DECIDER_CMD if set.
  #[arg(long, value_name = "CMD")]
  decider_cmd: Option<String>,

  /// Stage implementation as NAME=CMD. Repeat for each stage.
  #[arg(long = "stage", value_name = "NAME=CMD")]
  stages: Vec<String>,

  /// Enabled stages, comma separated. Default: web_researcher,chart_generator,synthesizer
  #[arg(long, value_name = "NAMES", value_delimiter = ',')]
  enable: Vec<String>,

  /// Directory for checkpoint.json and execution.log.json. Overridden by STAGEPLAN_RUN_DIR if set.
  #[arg(long, value_name = "DIR")]
  run_dir: Option<PathBuf>,

  /// JSON file with loop bounds.
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Resume from a checkpoint file instead of starting a new run.
  #[arg(long, value_name = "FILE")]
  resume: Option<PathBuf>,

  #[arg(long, value_name = "N")]
  max_replans: Option<u32>,

  #[arg(long, value_name = "N")]
  max_node_invocations: Option<u32>,

  #[arg(long, value_name = "SECS")]
  call_timeout_secs: Option<u64>,

  /// The question to answer
  #[arg(value_name = "QUERY", required_unless_present = "resume")]
  query: Option<String>,
}

fn fail(msg: impl std::fmt::Display) -> ! {
  eprintln!("{}", msg);
  process::exit(1);
}

fn load_config(args: &Args) -> LoopConfig {
  let base = match &args.config {
    Some(path) => LoopConfig::from_json_file(path).unwrap_or_else(|e| fail(format!("Config error: {}", e))),
    None => LoopConfig::default(),
  };
  let mut config = base.with_env();
  if let Some(n) = args.max_replans {
    config.max_replans = n;
  }
  if let Some(n) = args.max_node_invocations {
    config.max_node_invocations = n;
  }
  if let Some(secs) = args.call_timeout_secs {
    config.call_timeout_secs = Some(secs);
  }
  config
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  info!("run_query starting");

  // Env vars override flags.
  let decider_cmd = env::var("STAGEPLAN_DECIDER_CMD")
    .ok()
    .or_else(|| args.decider_cmd.clone())
    .unwrap_or_else(|| fail("Error: no decider command (use --decider-cmd or STAGEPLAN_DECIDER_CMD)"));
  let run_dir = env::var("STAGEPLAN_RUN_DIR")
    .ok()
    .map(PathBuf::from)
    .or_else(|| args.run_dir.clone());
  let config = load_config(&args);

  let mut registry = StageRegistry::new();
  for arg in &args.stages {
    let stage = CommandStage::parse_arg(arg).unwrap_or_else(|e| fail(format!("Error: {}", e)));
    registry.register(Arc::new(stage));
  }
  let enabled: Vec<StageName> = if args.enable.is_empty() {
    DEFAULT_ENABLED_STAGES.iter().map(|s| StageName::from(*s)).collect()
  } else {
    args.enable.iter().map(|s| StageName::new(s.as_str())).collect()
  };

  let checkpoint = args.resume.as_ref().map(|path| {
    checkpoint_io::load_checkpoint(path)
      .unwrap_or_else(|e| fail(format!("Error reading checkpoint {}: {}", path.display(), e)))
  });

  info!(
    decider_cmd = %decider_cmd,
    run_dir = ?run_dir,
    stages = ?enabled,
    resume = checkpoint.is_some(),
    "options (env or flags)"
  );

  let request = RunRequest {
    query: args.query.clone().unwrap_or_default(),
    enabled_stages: enabled,
  };
  let options = RunOptions {
    run_dir: run_dir.as_deref(),
    resume_checkpoint: checkpoint.as_ref(),
  };
  let provider = Arc::new(CommandDecisionProvider::new(decider_cmd));

  let result = match run_query(provider, registry, config, request, options).await {
    Ok(r) => r,
    Err(e) => fail(format!("Run error: {}", e)),
  };

  info!(run_id = %result.run_id, steps = result.total_steps, "run completed");
  println!("Run completed.");
  println!("  Answer: {}", result.final_answer);
  println!("  Steps: {}", result.total_steps);
  println!("  Replans: {}", result.replan_attempts.total);
  println!("  Node invocations: {}", result.node_invocations);
}
