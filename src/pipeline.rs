//! The three end-to-end pipelines: parse → key → reduce → chart data.

use crate::Result;
use crate::config::PlotConfig;
use crate::diagnostics;
use crate::error::PipelineError;
use crate::format::prefix_large_number;
use crate::log::record::WorkloadMix;
use crate::log::{LogRecord, Summary, parse_log_file, parse_log_files, parse_summary_file};
use crate::model::{AggregationMode, Buckets, Category, Reducer, aggregate};
use crate::render::{Chart, ChartKind, Presenter};
use crate::series::{self, ClassificationTable};

use anyhow::{Context, bail};
use clap::ValueEnum;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const LINE_CHART_STEM: &str = "nthreads-VS-throughput";
pub const BAR_CHART_STEM: &str = "performance_evaluation_bars";

/// What the bar chart groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BarStat {
    #[value(name = "tree_size")]
    TreeSize,
    Workload,
    Total,
}

impl BarStat {
    pub fn as_str(self) -> &'static str {
        match self {
            BarStat::TreeSize => "tree_size",
            BarStat::Workload => "workload",
            BarStat::Total => "total",
        }
    }

    pub fn mode(self) -> AggregationMode {
        match self {
            BarStat::TreeSize => AggregationMode::TreeSize,
            BarStat::Workload => AggregationMode::Workload,
            BarStat::Total => AggregationMode::Total,
        }
    }
}

/// Mean throughput per thread count over every sample of every log,
/// ascending by thread count.
pub fn thread_averages(paths: &[String]) -> Result<Vec<(u32, f64)>> {
    let records = parse_log_files(paths)?;
    let agg = aggregate(&records, AggregationMode::Threads, Reducer::Mean)?;

    let mut out: Vec<(u32, f64)> = agg
        .iter()
        .filter_map(|(key, value)| match key.category {
            Category::Threads(n) => Some((n, value)),
            _ => None,
        })
        .collect();
    out.sort_by_key(|(n, _)| *n);
    Ok(out)
}

/// `nthreads 4: 40.0`. Means always keep their decimal point.
pub fn average_line(threads: u32, mean: f64) -> String {
    format!("nthreads {}: {:?}", threads, mean)
}

/// Throughput vs. thread count, one line per implementation. Logs sharing a
/// source identity are repeated runs and are averaged together; they must all
/// have been taken with the same workload mix and key range.
pub fn line_chart(paths: &[String]) -> Result<Chart> {
    // Bucket each file on its own, then merge: the merge is a per-key union,
    // so file order does not affect the result.
    let mut buckets = Buckets::new();
    let mut runs = RunParams::default();
    let mut last: Option<LogRecord> = None;
    for path in paths {
        let records = parse_log_file(path)?;
        for record in &records {
            runs.check(path, record)?;
        }
        buckets.merge(Buckets::collect(&records, AggregationMode::SourceThreads)?);
        if let Some(record) = records.into_iter().last() {
            last = Some(record);
        }
    }
    let Some(last) = last else {
        bail!("no throughput samples in {} log file(s)", paths.len());
    };

    let agg = buckets.reduce(Reducer::Mean)?;
    let x_categories = agg.categories();
    let series = series::build(&agg, &ClassificationTable::benchmark_logs(), &x_categories)?;
    info!(series = series.len(), points = x_categories.len(), "built line chart");

    Ok(Chart {
        kind: ChartKind::Lines,
        title: line_title(&last)?,
        x_label: Some("Number of threads".to_string()),
        y_label: "Throughput (Mops/sec)".to_string(),
        x_ticks: x_categories.iter().map(|c| c.to_string()).collect(),
        series,
    })
}

/// First-seen run parameters per source identity, with where they were seen.
#[derive(Default)]
struct RunParams {
    seen: HashMap<String, ((Option<WorkloadMix>, Option<u64>), String)>,
}

impl RunParams {
    fn check(&mut self, path: &str, record: &LogRecord) -> std::result::Result<(), PipelineError> {
        let params = (record.mix, record.max_key);
        let here = format!("{}:{}", path, record.line);
        if let Some((first, at)) = self.seen.get(&record.source) {
            if *first != params {
                return Err(PipelineError::MixedConfigurations {
                    identity: record.source.clone(),
                    first: at.clone(),
                    second: here,
                });
            }
            return Ok(());
        }
        self.seen.insert(record.source.clone(), (params, here));
        Ok(())
    }
}

/// `<keys> keys - <lookup>% lookups`, from the last run's context.
fn line_title(record: &LogRecord) -> Result<String> {
    let keys = record
        .max_key
        .map(|k| prefix_large_number(k, 1000))
        .transpose()?;
    let title = match (keys, record.mix) {
        (Some(keys), Some(mix)) => format!("{} keys - {}% lookups", keys, mix.lookup),
        (Some(keys), None) => format!("{} keys", keys),
        (None, Some(mix)) => format!("{}% lookups", mix.lookup),
        (None, None) => "Throughput vs. threads".to_string(),
    };
    Ok(title)
}

/// Speedup bars from a summary file. Buckets are combined with the geometric
/// mean over the configured executable × category matrix.
pub fn bar_chart(summary: &Summary, stat: BarStat, config: &PlotConfig) -> Result<Chart> {
    let buckets = Buckets::collect(&summary.rows, stat.mode())
        .with_context(|| format!("bucket summary file {}", summary.path))?;

    let (categories, x_ticks) = match stat {
        BarStat::TreeSize => (config.tree_size_categories(), config.init_sizes.clone()),
        BarStat::Workload => (
            config.workload_categories(),
            config.workloads.iter().map(|w| workload_tick(w)).collect(),
        ),
        BarStat::Total => (
            vec![Category::Total],
            vec![format!("{} Threads", summary.thread_count)],
        ),
    };

    let configured: BTreeSet<&str> = config.executables.iter().map(String::as_str).collect();
    let ignored: BTreeSet<&str> = buckets
        .keys()
        .filter_map(|k| k.identity.as_deref())
        .filter(|id| !configured.contains(id))
        .collect();
    for exe in ignored {
        diagnostics::warn(format!(
            "{}: executable {} is not in the configured list, its rows are ignored",
            summary.path, exe
        ));
    }

    let agg = buckets.reduce_matrix(&config.executables, &categories, Reducer::Geomean)?;
    let table = ClassificationTable::positional(&config.executables, &config.labels);
    let series = series::build(&agg, &table, &categories)?;

    Ok(Chart {
        kind: ChartKind::Bars,
        title: format!("{} Threads", summary.thread_count),
        x_label: None,
        y_label: "Speedup over serial".to_string(),
        x_ticks,
        series,
    })
}

/// `90_5_5` → `90% lookups`
fn workload_tick(workload: &str) -> String {
    let lookup = workload.split('_').next().unwrap_or(workload);
    format!("{}% lookups", lookup)
}

pub fn line_chart_file_name(ext: &str) -> String {
    format!("{}.{}", LINE_CHART_STEM, ext)
}

pub fn bar_chart_file_name(stat: BarStat, thread_count: u32, ext: &str) -> String {
    format!(
        "{}.{}.{}_threads.{}",
        BAR_CHART_STEM,
        stat.as_str(),
        thread_count,
        ext
    )
}

/// `lines` end to end. The file is created only after rendering succeeded.
pub fn write_line_chart(
    paths: &[String],
    presenter: &dyn Presenter,
    out_dir: &Path,
) -> Result<PathBuf> {
    let chart = line_chart(paths)?;
    let bytes = presenter.render(&chart)?;
    write_artifact(out_dir, &line_chart_file_name(presenter.extension()), &bytes)
}

/// `bars` end to end. The file is created only after rendering succeeded.
pub fn write_bar_chart(
    input: &str,
    stat: BarStat,
    config: &PlotConfig,
    presenter: &dyn Presenter,
    out_dir: &Path,
) -> Result<PathBuf> {
    let summary = parse_summary_file(input)?;
    let chart = bar_chart(&summary, stat, config)?;
    let bytes = presenter.render(&chart)?;
    let name = bar_chart_file_name(stat, summary.thread_count, presenter.extension());
    write_artifact(out_dir, &name, &bytes)
}

/// Write a fully rendered artifact.
pub fn write_artifact(out_dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("create output directory {}", out_dir.display()))?;
    let path = out_dir.join(name);
    fs::write(&path, bytes).with_context(|| format!("write chart {}", path.display()))?;
    Ok(path)
}
