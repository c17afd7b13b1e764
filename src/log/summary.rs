use crate::Result;
use crate::error::PipelineError;
use crate::log::record::{Summary, SummaryRow};

use anyhow::Context;
use regex::Regex;
use std::fs;

/// Parse a bar-chart summary file.
///
/// The first line carries the thread count in its third token:
/// `# threads: 44`
///
/// Remaining lines are whitespace-separated:
/// executable  init_size  workload  throughput
///
/// Example:
/// x.avl.int.rcu_htm   1K   90_5_5   17.31
pub fn parse_summary_file(path: &str) -> Result<Summary> {
    let text = fs::read_to_string(path).with_context(|| format!("read summary file {}", path))?;
    parse_summary_text(&text, path)
}

pub fn parse_summary_text(text: &str, path: &str) -> Result<Summary> {
    let malformed = |line: usize, reason: String| PipelineError::MalformedLog {
        path: path.to_string(),
        line,
        reason,
    };

    let mut lines = text.lines().enumerate();

    let header = lines
        .next()
        .map(|(_, l)| l)
        .ok_or_else(|| malformed(1, "empty summary file".to_string()))?;
    let thread_token = header
        .split_whitespace()
        .nth(2)
        .ok_or_else(|| malformed(1, format!("header has no thread count: {:?}", header)))?;
    let thread_count: u32 = thread_token
        .parse()
        .map_err(|_| malformed(1, format!("bad thread count {:?}", thread_token)))?;

    // Capture: executable, init_size, workload, throughput
    const ROW_RE: &str = r#"^\s*(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s*$"#;
    let re = Regex::new(ROW_RE)?;

    let mut rows = Vec::new();
    for (lineno, line) in lines {
        let lno = lineno + 1;

        if line.trim().is_empty() {
            continue;
        }

        let caps = re
            .captures(line)
            .ok_or_else(|| malformed(lno, format!("expected 4 fields: {:?}", line)))?;

        let throughput_str = &caps[4];
        let throughput: f64 = throughput_str
            .parse()
            .map_err(|_| malformed(lno, format!("bad throughput {:?}", throughput_str)))?;

        rows.push(SummaryRow {
            line: lno,
            executable: caps[1].to_string(),
            init_size: caps[2].to_string(),
            workload: caps[3].to_string(),
            throughput,
        });
    }

    Ok(Summary {
        path: path.to_string(),
        thread_count,
        rows,
    })
}
