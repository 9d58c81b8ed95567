use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use clap_verbosity_flag::{ErrorLevel, Verbosity};
use colored::Colorize;
use log::debug;

use countdown::config::Config;
use countdown::session::{Session, TimerSpec};
use countdown::terminal::{spawn_input_reader, Terminal};
use countdown::time::parse_target;
use countdown::timeclock::LogFile;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, after_help = EXAMPLES)]
struct Args {
  /// How long to run, like "25s" or "1h30m", or a time of day like "14:15" or "2:15PM"
  ///
  /// A time of day that has already passed today means that time tomorrow.
  #[arg(allow_hyphen_values = true)]
  target: String,
  /// Count up from zero instead of down to zero
  #[arg(long, default_value_t = false)]
  up: bool,
  /// Tag the activity in the timeclock [default: "Unset", or default_tag from the config file]
  #[arg(short, long, allow_hyphen_values = true)]
  tag: Option<String>,
  /// Notes to record with the activity
  #[arg(short, long, default_value = "", allow_hyphen_values = true)]
  notes: String,
  /// Timeclock file to append timer events to
  #[arg(short, long, env = "COUNTDOWN_LOG_PATH", allow_hyphen_values = true)]
  file: Option<PathBuf>,
  /// Config file to use. [default: ${XDG_CONFIG_DIR}/countdown/config.toml]
  #[arg(long, allow_hyphen_values = true)]
  config: Option<PathBuf>,
  #[command(flatten)]
  verbose: Verbosity<ErrorLevel>,
}

const EXAMPLES: &str = "\
Examples:
  countdown 25s
  countdown -up 10m -t Work -n \"Write the report\"
  countdown 1:00PM
  countdown 14:15

Press Space to pause or resume, Esc or Ctrl-C to quit.";

/// Options whose value is the next argument
const VALUE_OPTIONS: &[&str] = &["-t", "--tag", "-n", "--notes", "-f", "--file", "--config"];

/// Accept the single-dash `-up` spelling of `--up`
///
/// An `-up` that is the value of another option is left alone.
fn normalize_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
  let mut takes_value = false;

  args
    .into_iter()
    .map(|arg| {
      let is_value = takes_value;
      takes_value = !is_value && VALUE_OPTIONS.contains(&arg.as_str());

      if arg == "-up" && !is_value { "--up".to_string() } else { arg }
    })
    .collect()
}

async fn run(args: Args) -> Result<ExitCode> {
  let config = Config::load_or_default(args.config.as_deref())?;

  let log_path = config.resolve_log_path(args.file)?;
  let log = LogFile::new(log_path);
  log.check_access()?;
  debug!("Recording to {}", log.path().display());

  let total_duration = match parse_target(&args.target, Local::now().naive_local()) {
    Ok(duration) => duration,
    Err(e) => Args::command().error(ErrorKind::ValueValidation, e).exit(),
  };

  let spec = TimerSpec {
    total_duration,
    count_up: args.up,
    tag: args.tag.unwrap_or(config.default_tag),
    notes: args.notes,
  };

  let terminal = Terminal::open()?;
  let mut inputs = spawn_input_reader();

  let mut session = Session::start(spec, terminal, log)?;
  let outcome = session.run(&mut inputs).await;

  let (terminal, _) = session.into_parts();
  terminal.close()?;

  let outcome = outcome?;
  debug!("Timer finished: {:?}", outcome);

  Ok(ExitCode::from(outcome.exit_code()))
}

#[tokio::main]
async fn main() -> ExitCode {
  human_panic::setup_panic!();

  let args = Args::parse_from(normalize_args(std::env::args()));

  env_logger::Builder::new()
    .filter_level(args.verbose.log_level_filter())
    .init();

  match run(args).await {
    Ok(code) => code,
    Err(e) => {
      eprintln!("{} {:#}", "error:".red().bold(), e);
      ExitCode::from(2)
    }
  }
}
