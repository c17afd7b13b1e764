use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod diagnostics;
mod error;
mod format;
mod log;
mod model;
mod pipeline;
mod render;
mod series;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "bench-plot")]
#[command(about = "Aggregate concurrent tree benchmark logs and chart them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,

    /// Directory charts are written to.
    #[arg(long, global = true, default_value = ".")]
    out_dir: PathBuf,

    #[arg(long, global = true, value_enum, default_value_t = render::OutputFormat::Svg)]
    format: render::OutputFormat,

    /// Log progress (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the mean throughput per thread count over all given logs.
    Averages {
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Chart throughput vs. number of threads, one line per implementation.
    Lines {
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Chart geometric-mean speedups from a summary file as grouped bars.
    Bars {
        #[arg(value_enum)]
        stat: pipeline::BarStat,

        input: String,

        /// Legend labels, one per executable (whitespace-separated).
        #[arg(long, env = "RCU_HTM_PLOT_LABELS", default_value = "")]
        labels: String,

        #[arg(long, env = "RCU_HTM_EXECUTABLES", default_value = "")]
        executables: String,

        #[arg(long, env = "RCU_HTM_WORKLOADS", default_value = "")]
        workloads: String,

        #[arg(long, env = "RCU_HTM_INIT_SIZES_LABELS", default_value = "")]
        init_sizes: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("error: {}", diagnostics::one_line(&err));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let presenter = render::presenter_for(cli.format);

    match cli.cmd {
        Commands::Averages { files } => {
            for (threads, avg) in pipeline::thread_averages(&files)? {
                println!("{}", pipeline::average_line(threads, avg));
            }
        }
        Commands::Lines { files } => {
            let path = pipeline::write_line_chart(&files, &*presenter, &cli.out_dir)?;
            info!(path = %path.display(), "chart written");
            println!("Wrote {}", path.display());
        }
        Commands::Bars {
            stat,
            input,
            labels,
            executables,
            workloads,
            init_sizes,
        } => {
            // Validate the experiment matrix before touching the input.
            let config =
                config::PlotConfig::from_lists(&labels, &executables, &workloads, &init_sizes)?;
            let path = pipeline::write_bar_chart(
                &input,
                stat,
                &config,
                &*presenter,
                &cli.out_dir,
            )?;
            info!(path = %path.display(), "chart written");
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
