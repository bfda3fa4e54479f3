use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use gibbslda_core::types::{DEFAULT_BETA, DEFAULT_NITERS, DEFAULT_NUM_TOPICS, DEFAULT_SAVESTEP, FINAL_MODEL_NAME};
use gibbslda_core::{LdaConfig, Mode, Session};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Latent Dirichlet Allocation with collapsed Gibbs sampling")]
struct Cli {
    /// Log every sweep
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a new model; output goes next to the document file
    Est {
        #[arg(long)]
        dfile: PathBuf,
        #[arg(long, default_value_t = DEFAULT_NUM_TOPICS)]
        ntopics: usize,
        /// Defaults to 50 / ntopics
        #[arg(long)]
        alpha: Option<f64>,
        #[arg(long, default_value_t = DEFAULT_BETA)]
        beta: f64,
        #[arg(long, default_value_t = DEFAULT_SAVESTEP)]
        savestep: usize,
        #[command(flatten)]
        common: Common,
    },
    /// Continue training a saved model
    Estc {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long, default_value = FINAL_MODEL_NAME)]
        model: String,
        #[arg(long, default_value_t = DEFAULT_SAVESTEP)]
        savestep: usize,
        #[command(flatten)]
        common: Common,
    },
    /// Infer topics for new documents with a saved model
    Inf {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long, default_value = FINAL_MODEL_NAME)]
        model: String,
        /// Document file name inside --dir
        #[arg(long)]
        dfile: String,
        /// Read the documents as plain text, one per line
        #[arg(long, default_value_t = false)]
        raw: bool,
        #[command(flatten)]
        common: Common,
    },
}

#[derive(Args, Debug)]
struct Common {
    #[arg(long, default_value_t = DEFAULT_NITERS)]
    niters: usize,
    /// Top words per topic to save; 0 disables
    #[arg(long, default_value_t = 0)]
    twords: usize,
    /// Fixed seed; the clock is used otherwise
    #[arg(long)]
    seed: Option<u64>,
}

impl Common {
    fn apply(&self, config: &mut LdaConfig) {
        config.niters = self.niters;
        config.twords = self.twords;
        config.seed = self.seed;
    }
}

fn split_dfile(path: &Path) -> anyhow::Result<(PathBuf, String)> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        bail!("invalid document file {}", path.display());
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name.to_string()))
}

fn to_config(command: &Command) -> anyhow::Result<(Mode, LdaConfig)> {
    let mut config = LdaConfig::default();
    let mode = match command {
        Command::Est { dfile, ntopics, alpha, beta, savestep, common } => {
            let (dir, name) = split_dfile(dfile)?;
            config.dir = dir;
            config.dfile = name;
            config.num_topics = *ntopics;
            config.alpha = *alpha;
            config.beta = *beta;
            config.savestep = *savestep;
            common.apply(&mut config);
            Mode::Estimate
        }
        Command::Estc { dir, model, savestep, common } => {
            config.dir = dir.clone();
            config.model_name = model.clone();
            config.savestep = *savestep;
            common.apply(&mut config);
            Mode::Continue
        }
        Command::Inf { dir, model, dfile, raw, common } => {
            config.dir = dir.clone();
            config.model_name = model.clone();
            config.dfile = dfile.clone();
            config.raw_text = *raw;
            common.apply(&mut config);
            Mode::Infer
        }
    };
    Ok((mode, config))
}

/// `RUST_LOG` wins when set; otherwise both crates log at the chosen level.
fn log_filter(verbose: bool) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = if verbose { "debug" } else { "info" };
    Ok(EnvFilter::try_new(format!("gibbslda_core={level},gibbslda={level}"))?)
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(log_filter(verbose)?).init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let (mode, config) = to_config(&cli.command)?;
    let mut session = Session::init(mode, &config)
        .with_context(|| format!("cannot initialize {:?} in {}", mode, config.dir.display()))?;
    session.run().context("sampling failed")?;
    tracing::info!("done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn est_takes_directory_from_dfile() {
        let cli = Cli::try_parse_from(["gibbslda", "est", "--dfile", "data/trn.dat", "--ntopics", "20", "--seed", "3"]).unwrap();
        let (mode, config) = to_config(&cli.command).unwrap();
        assert_eq!(mode, Mode::Estimate);
        assert_eq!(config.dir, PathBuf::from("data"));
        assert_eq!(config.dfile, "trn.dat");
        assert_eq!(config.num_topics, 20);
        assert_eq!(config.effective_alpha(), 2.5);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.niters, DEFAULT_NITERS);
    }

    #[test]
    fn bare_dfile_uses_current_directory() {
        let cli = Cli::try_parse_from(["gibbslda", "est", "--dfile", "trn.dat"]).unwrap();
        let (_, config) = to_config(&cli.command).unwrap();
        assert_eq!(config.dir, PathBuf::from("."));
    }

    #[test]
    fn estc_and_inf_parse() {
        let cli = Cli::try_parse_from(["gibbslda", "--verbose", "estc", "--dir", "m", "--model", "model-00400", "--niters", "50"]).unwrap();
        assert!(cli.verbose);
        let (mode, config) = to_config(&cli.command).unwrap();
        assert_eq!(mode, Mode::Continue);
        assert_eq!(config.model_name, "model-00400");
        assert_eq!(config.niters, 50);

        let cli = Cli::try_parse_from(["gibbslda", "inf", "--dir", "m", "--dfile", "new.txt", "--raw", "--twords", "5"]).unwrap();
        let (mode, config) = to_config(&cli.command).unwrap();
        assert_eq!(mode, Mode::Infer);
        assert_eq!(config.model_name, FINAL_MODEL_NAME);
        assert!(config.raw_text);
        assert_eq!(config.twords, 5);
    }

    #[test]
    fn rust_log_overrides_default_levels() {
        std::env::set_var("RUST_LOG", "gibbslda_core=trace");
        let filter = log_filter(false).unwrap().to_string();
        assert_eq!(filter, "gibbslda_core=trace");

        std::env::remove_var("RUST_LOG");
        let filter = log_filter(true).unwrap().to_string();
        assert!(filter.contains("gibbslda_core=debug"), "{filter}");
        assert!(filter.contains("gibbslda=debug"), "{filter}");
    }

    #[test]
    fn inf_requires_dfile() {
        assert!(Cli::try_parse_from(["gibbslda", "inf", "--dir", "m"]).is_err());
    }
}
