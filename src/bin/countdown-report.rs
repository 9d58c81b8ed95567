use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::{ErrorLevel, Verbosity};
use colored::Colorize;
use log::debug;

use countdown::config::Config;
use countdown::report::{self, Filter, Period, Unit};
use countdown::timeclock::LogFile;

/// Summarize the activities recorded in a timeclock
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Timeclock file to read
  #[arg(short, long, env = "COUNTDOWN_LOG_PATH")]
  file: Option<PathBuf>,
  /// Config file to use. [default: ${XDG_CONFIG_DIR}/countdown/config.toml]
  #[arg(long)]
  config: Option<PathBuf>,
  /// Only include activities with this tag
  #[arg(short, long)]
  tag: Option<String>,
  /// Only include activities that started at or after this date, as YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS"
  #[arg(short, long, value_parser = report::parse_bound)]
  begin: Option<chrono::NaiveDateTime>,
  /// Only include activities that ended before this date, as YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS"
  #[arg(short, long, value_parser = report::parse_bound)]
  end: Option<chrono::NaiveDateTime>,
  /// Sum durations per tag over each hour, day, week, month or year
  #[arg(short, long, value_enum)]
  group: Option<Period>,
  /// Unit to print durations in
  #[arg(short, long, value_enum, default_value = "s")]
  units: Unit,
  /// Print JSON instead of a table
  #[arg(long, default_value_t = false)]
  json: bool,
  #[command(flatten)]
  verbose: Verbosity<ErrorLevel>,
}

fn run(args: Args) -> Result<()> {
  let config = Config::load_or_default(args.config.as_deref())?;
  let log = LogFile::new(config.resolve_log_path(args.file)?);

  debug!("Reading timeclock {}", log.path().display());
  let activities = report::replay(&log.entries()?)?;

  let filter = Filter {
    tag: args.tag,
    begin: args.begin,
    end: args.end,
  };
  let activities = report::select(activities, &filter);
  debug!("{} activities match", activities.len());

  match args.group {
    Some(period) => {
      let rows = report::group(&activities, period);
      if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
      } else {
        report::group_table(&rows, args.units).printstd();
      }
    }
    None => {
      if args.json {
        println!("{}", serde_json::to_string_pretty(&activities)?);
      } else {
        report::activity_table(&activities, args.units).printstd();
      }
    }
  }

  Ok(())
}

fn main() -> ExitCode {
  human_panic::setup_panic!();

  let args = Args::parse();

  env_logger::Builder::new()
    .filter_level(args.verbose.log_level_filter())
    .init();

  match run(args) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("{} {:#}", "error:".red().bold(), e);
      ExitCode::from(2)
    }
  }
}
