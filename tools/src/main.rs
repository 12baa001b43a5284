use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use log::info;
use vesture_tools::{
    format_dump_pretty, format_report_pretty, logging, run_scenario, Scenario, StateDump,
};

#[derive(Parser)]
#[command(
    name = "vesture-tools",
    version,
    about = "vesture scenario replay and state inspection tools"
)]
struct Cli {
    /// Print debug logs (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a scenario file, or every scenario in a directory.
    Replay {
        /// Scenario JSON or a directory of them.
        path: PathBuf,
        /// Glob filter when replaying a directory.
        #[arg(long, default_value = "*.json")]
        glob: String,
        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// Write the final state dump here (single scenario only).
        #[arg(long)]
        dump: Option<PathBuf>,
        /// Exit with an error when any step was rejected.
        #[arg(long)]
        strict: bool,
    },
    /// Print a state dump written by `replay --dump`.
    Inspect {
        /// Path to the dump JSON.
        dump_path: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match cli.command {
        Command::Replay {
            path,
            glob,
            format,
            dump,
            strict,
        } => {
            let files = if path.is_dir() {
                collect_scenarios(&path, &glob)?
            } else {
                vec![path]
            };
            if dump.is_some() && files.len() != 1 {
                bail!("--dump needs exactly one scenario, found {}", files.len());
            }
            let mut rejected = 0;
            for file in &files {
                let contents = fs::read_to_string(file)
                    .with_context(|| format!("read scenario {}", file.display()))?;
                let scenario = Scenario::from_json(&contents)?;
                let report = run_scenario(&scenario)
                    .with_context(|| format!("replay {}", file.display()))?;
                rejected += report.rejected();
                if files.len() > 1 {
                    println!("== {} ==", file.display());
                }
                match format {
                    Format::Json => {
                        let json =
                            serde_json::to_string_pretty(&report).context("serialize json")?;
                        println!("{json}");
                    }
                    Format::Pretty => print!("{}", format_report_pretty(&report)),
                }
                if let Some(out) = &dump {
                    let json =
                        serde_json::to_string_pretty(&report.dump).context("serialize dump")?;
                    fs::write(out, json).with_context(|| format!("write dump {}", out.display()))?;
                    info!("wrote state dump to {}", out.display());
                }
            }
            if strict && rejected > 0 {
                bail!("{rejected} steps were rejected");
            }
        }
        Command::Inspect { dump_path, format } => {
            let contents = fs::read_to_string(&dump_path)
                .with_context(|| format!("read dump {}", dump_path.display()))?;
            let dump = StateDump::from_json(&contents)?;
            match format {
                Format::Json => {
                    let json = serde_json::to_string_pretty(&dump).context("serialize json")?;
                    println!("{json}");
                }
                Format::Pretty => print!("{}", format_dump_pretty(&dump)),
            }
        }
    }
    Ok(())
}

fn collect_scenarios(dir: &Path, glob: &str) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(glob).context("invalid glob pattern")?;
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| pattern.matches(name));
        if matches_name || pattern.matches_path(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
