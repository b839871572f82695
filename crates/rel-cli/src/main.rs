//! reltools CLI: relational algebra over tab-separated relations.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rel_core::config::RelConfig;
use rel_exec::runtime::DEFAULT_PROGRAM;
use rel_exec::{Engine, Invocation};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reltools")]
#[command(about = "Relational algebra over tab-separated relations larger than memory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Common {
    /// Input relations; `-` is standard input (at most once)
    #[arg(required = true)]
    files: Vec<String>,

    /// Output file, which must not exist (default: standard output)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Records of one group kept in memory before spilling (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    cache: Option<u64>,

    /// Directory for scratch files (overrides config)
    #[arg(long)]
    tmp_dir: Option<PathBuf>,

    /// Sort program to run (overrides config)
    #[arg(long)]
    sort: Option<String>,

    /// Buffer size passed to the sort program (overrides config)
    #[arg(long)]
    sort_buffer_size: Option<String>,

    /// Compression of cache spill files: none, zstd, lz4 (overrides config)
    #[arg(long)]
    spill_codec: Option<String>,
}

impl Common {
    fn apply(&self, config: &mut RelConfig) {
        if let Some(limit) = self.cache {
            config.cache_limit = usize::try_from(limit).unwrap_or(usize::MAX);
        }
        if let Some(dir) = &self.tmp_dir {
            config.tmp_dir = Some(dir.clone());
        }
        if let Some(sort) = &self.sort {
            config.sort_program = sort.clone();
        }
        if let Some(size) = &self.sort_buffer_size {
            config.sort_buffer_size = Some(size.clone());
        }
        if let Some(codec) = &self.spill_codec {
            config.spill_codec = codec.clone();
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Natural join on the shared fields; more than two relations are
    /// joined left to right
    Join {
        #[command(flatten)]
        common: Common,
    },

    /// Join on the shared fields, then drop them; distinct records
    Compose {
        #[command(flatten)]
        common: Common,
    },

    /// Non-shared fields of the first relation where the shared fields
    /// match the second; distinct records
    Image {
        #[command(flatten)]
        common: Common,
    },

    /// Records of the first relation whose shared fields occur in the second
    Match {
        #[command(flatten)]
        common: Common,
    },

    /// Records of the first relation whose shared fields do not occur in
    /// the second
    Miss {
        #[command(flatten)]
        common: Common,
    },

    /// Distinct records found in any relation
    Union {
        #[command(flatten)]
        common: Common,

        /// Name of the internal origin field (default: first free T0, T1, ...)
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Records found in every relation
    Meet {
        #[command(flatten)]
        common: Common,

        /// Name of the internal origin field (default: first free T0, T1, ...)
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Records found once, in the first relation only
    Sans {
        #[command(flatten)]
        common: Common,

        /// Name of the internal origin field (default: first free T0, T1, ...)
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Records found exactly once across all relations
    Symm {
        #[command(flatten)]
        common: Common,

        /// Name of the internal origin field (default: first free T0, T1, ...)
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Concatenate relations, adding a field that numbers each record's
    /// relation from 1
    Sum {
        #[command(flatten)]
        common: Common,

        /// Name of the new origin field
        #[arg(short, long)]
        tag: String,
    },
}

impl Commands {
    fn into_parts(self) -> (&'static str, Common, Option<String>) {
        match self {
            Commands::Join { common } => ("join", common, None),
            Commands::Compose { common } => ("compose", common, None),
            Commands::Image { common } => ("image", common, None),
            Commands::Match { common } => ("match", common, None),
            Commands::Miss { common } => ("miss", common, None),
            Commands::Union { common, tag } => ("union", common, tag),
            Commands::Meet { common, tag } => ("meet", common, tag),
            Commands::Sans { common, tag } => ("sans", common, tag),
            Commands::Symm { common, tag } => ("symm", common, tag),
            Commands::Sum { common, tag } => ("sum", common, Some(tag)),
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env("RELTOOLS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let (operation, common, tag) = cli.command.into_parts();

    let mut config = RelConfig::from_env();
    common.apply(&mut config);

    let mut inv = Invocation::new(operation, common.files);
    inv.out = common.out;
    inv.tag = tag;

    let engine = Engine::new(config).with_program(format!("{DEFAULT_PROGRAM} {operation}"));
    std::process::exit(engine.execute(&inv));
}
