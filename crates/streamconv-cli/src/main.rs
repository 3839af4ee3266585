use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process;
use streamconv_config::Options;
use streamconv_engine::{TrailingTrim, convert};

/// Copy a byte stream block by block, converting its text on the way.
#[derive(Parser, Debug)]
#[command(name = "streamconv", version, about)]
struct Args {
    /// File to read (default: stdin)
    #[arg(long)]
    from: Option<PathBuf>,

    /// File to write, must not exist yet (default: stdout)
    #[arg(long)]
    to: Option<PathBuf>,

    /// Bytes to skip at the start of the input
    #[arg(long)]
    offset: Option<u64>,

    /// Maximum bytes to read after the offset, 0 reads everything
    #[arg(long)]
    limit: Option<u64>,

    /// Bytes read and written per block (default: 1000)
    #[arg(long)]
    block_size: Option<usize>,

    /// Conversions to apply in order: upper_case, lower_case, trim_spaces
    #[arg(long)]
    conv: Option<String>,

    /// Trailing whitespace policy for trim_spaces: per-block or stream
    #[arg(long)]
    trailing_trim: Option<TrailingTrim>,

    /// Defaults file (default: ~/.config/streamconv/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn into_options(self) -> Options {
        Options {
            from: self.from,
            to: self.to,
            offset: self.offset,
            limit: self.limit,
            block_size: self.block_size,
            conv: self.conv,
            trailing_trim: self.trailing_trim,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let options = match load_options(args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("can not parse flags: {e:#}");
            process::exit(1);
        }
    };

    if let Err(e) = run(&options) {
        eprintln!("error while processing: {e:#}");
        process::exit(1);
    }
}

/// Combines the defaults file with command-line flags and validates the result.
fn load_options(args: Args) -> Result<Options> {
    let explicit_config = args.config.is_some();
    let config_path = args.config.clone().unwrap_or_else(Options::config_path);
    if explicit_config && !config_path.exists() {
        bail!("config file {} not found", config_path.display());
    }

    let defaults = match Options::load_from_path(&config_path)? {
        Some(defaults) => {
            log::info!("Loaded defaults from {}", config_path.display());
            defaults
        }
        None => Options::default(),
    };

    let options = defaults.merge(args.into_options());
    options.validate()?;
    Ok(options)
}

fn run(options: &Options) -> Result<()> {
    let config = options.stream_config()?;

    let source: Box<dyn Read> = match &options.from {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };

    let sink: Box<dyn Write> = match &options.to {
        Some(path) => Box::new(
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    log::debug!("Converting with {config:?}");
    let summary = convert(source, BufWriter::new(sink), &config)?;
    log::info!(
        "Read {} bytes, wrote {} bytes in {} blocks",
        summary.bytes_read,
        summary.bytes_written,
        summary.blocks
    );
    if summary.invalid_units > 0 {
        log::warn!(
            "Passed {} invalid UTF-8 sequences through unchanged",
            summary.invalid_units
        );
    }

    Ok(())
}
