//! Foreshadow CLI
//!
//! Scouting history → team profiles → Monte Carlo match prediction

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use foreshadow_cli::history_loader::DEFAULT_TEAM_COLUMN;
use foreshadow_cli::{
    load_history, render_prediction, render_profile, resolve_rules, PredictionReport,
    ProfileReport, ENV_RULES_PATH,
};
use foreshadow_core::{
    Execution, GameScoringRule, MatchSimulator, MissingDataPolicy, Season, SimulationSettings,
    StatsExtractor,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "foreshadow")]
#[command(about = "Predict 3v3 alliance matches from scouting history", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the performance profile extracted for one team
    Profile {
        #[command(flatten)]
        history: HistoryArgs,

        /// Team identifier
        #[arg(long)]
        team: String,

        #[command(flatten)]
        rules: RuleArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Simulate a match between two alliances
    Predict {
        #[command(flatten)]
        history: HistoryArgs,

        /// Red alliance, three comma-separated team identifiers
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        red: Vec<String>,

        /// Blue alliance, three comma-separated team identifiers
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        blue: Vec<String>,

        /// Number of trials (default: FORESHADOW_TRIALS or 1000)
        #[arg(long)]
        trials: Option<usize>,

        /// Entropy seed for a reproducible run (default: FORESHADOW_SEED or random)
        #[arg(long)]
        seed: Option<u64>,

        /// Run trials on one thread
        #[arg(long, default_value = "false")]
        sequential: bool,

        #[command(flatten)]
        rules: RuleArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print a season's scoring rules as YAML
    Rules {
        #[command(flatten)]
        rules: RuleArgs,
    },
}

#[derive(Args)]
struct HistoryArgs {
    /// Scouting history, CSV or JSON (by extension)
    #[arg(long)]
    history: PathBuf,

    /// CSV column holding the team identifier
    #[arg(long, default_value = DEFAULT_TEAM_COLUMN)]
    team_column: String,

    /// What to do with teams that have no rows
    #[arg(long, value_enum, default_value_t = PolicyArg::Fail)]
    policy: PolicyArg,
}

#[derive(Args)]
struct RuleArgs {
    /// Rule file (YAML or JSON); overrides FORESHADOW_RULES_PATH and --season
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Season preset
    #[arg(long, default_value = "decode-2026")]
    season: Season,
}

#[derive(Args)]
struct OutputArgs {
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write the report here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Fail,
    Zero,
}

impl From<PolicyArg> for MissingDataPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Fail => MissingDataPolicy::Fail,
            PolicyArg::Zero => MissingDataPolicy::ZeroProfile,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Profile {
            history,
            team,
            rules,
            output,
        } => {
            let rules = load_rules(&rules)?;
            let store = load_history(&history.history, &history.team_column)?;
            let profile = StatsExtractor::new(&store, &rules)
                .with_policy(history.policy.into())
                .extract(&team)?;

            let report = match output.format {
                Format::Text => render_profile(&profile, &rules),
                Format::Json => {
                    serde_json::to_string_pretty(&ProfileReport::new(profile, &rules))? + "\n"
                }
            };
            emit(&report, output.out.as_deref())?;
        }

        Commands::Predict {
            history,
            red,
            blue,
            trials,
            seed,
            sequential,
            rules,
            output,
        } => {
            let rules = load_rules(&rules)?;
            let store = load_history(&history.history, &history.team_column)?;
            let extractor = StatsExtractor::new(&store, &rules).with_policy(history.policy.into());
            let red = extractor.extract_all(&red).context("Failed to build red alliance")?;
            let blue = extractor.extract_all(&blue).context("Failed to build blue alliance")?;

            let mut settings = SimulationSettings::from_env()?;
            if let Some(trials) = trials {
                settings.trial_count = trials;
            }
            if seed.is_some() {
                settings.seed = seed;
            }
            if sequential {
                settings.execution = Execution::Sequential;
            }

            let prediction = MatchSimulator::new(rules.clone())?
                .with_settings(settings)
                .simulate(&red, &blue)?;

            let report = match output.format {
                Format::Text => render_prediction(&prediction),
                Format::Json => {
                    serde_json::to_string_pretty(&PredictionReport::new(prediction, &rules))?
                        + "\n"
                }
            };
            emit(&report, output.out.as_deref())?;
        }

        Commands::Rules { rules } => {
            print!("{}", load_rules(&rules)?.to_yaml_string()?);
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `--rules` beats `FORESHADOW_RULES_PATH`, which beats `--season`.
fn load_rules(args: &RuleArgs) -> Result<GameScoringRule> {
    let from_env = std::env::var_os(ENV_RULES_PATH)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    let path = args.rules.clone().or(from_env);
    if let Some(path) = &path {
        if !path.exists() {
            bail!("Rule file not found: {}", path.display());
        }
    }
    resolve_rules(path.as_deref(), args.season)
}

fn emit(report: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, report)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            eprintln!("📄 Report saved to: {}", path.display());
        }
        None => print!("{report}"),
    }
    Ok(())
}
