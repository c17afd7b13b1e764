use crate::Result;
use crate::error::PipelineError;
use crate::log::record::{Fragment, LogRecord, WorkloadMix};

use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::{debug, info};

const THREADS_PREFIX: &str = "  num_threads:";
const LOOKUP_PREFIX: &str = "  lookup_frac:";
const INSERT_PREFIX: &str = "  insert_frac:";
const MAX_KEY_PREFIX: &str = "  max_key";
const THROUGHPUT_PREFIX: &str = "Throughput(Ops/usec):";

/// Parse every log in order and concatenate their records.
pub fn parse_log_files(paths: &[String]) -> Result<Vec<LogRecord>> {
    let mut records = Vec::new();
    for path in paths {
        let parsed = parse_log_file(path)?;
        info!(path = %path, samples = parsed.len(), "parsed benchmark log");
        records.extend(parsed);
    }
    Ok(records)
}

/// Parse one benchmark stdout log into throughput records.
pub fn parse_log_file(path: &str) -> Result<Vec<LogRecord>> {
    let file = File::open(path).with_context(|| format!("read log file {}", path))?;
    parse_log_reader(BufReader::new(file), path)
}

/// Parse an already-open log. `path` is used for the record source identity
/// and for error locations.
pub fn parse_log_reader<R: BufRead>(reader: R, path: &str) -> Result<Vec<LogRecord>> {
    let source = source_identity(path);
    let mut ctx = RunContext::default();
    let mut records = Vec::new();

    for item in Fragments::new(reader, path) {
        let (line, fragment) = item?;
        if let Some(record) = ctx.apply(&source, path, line, fragment)? {
            records.push(record);
        }
    }

    Ok(records)
}

/// Series identity of a log file: its name without the last two dot-separated
/// components (`x.avl.bronson.run1.log` → `x.avl.bronson`). Names with fewer
/// components fall back to the file stem.
pub fn source_identity(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return parts[..parts.len() - 2].join(".");
    }
    Path::new(&name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(name)
}

/// Lazy, single-pass sequence of `(line number, fragment)` pairs.
///
/// Lines without a recognized prefix are skipped.
pub struct Fragments<R> {
    lines: Lines<R>,
    path: String,
    lineno: usize,
}

impl<R: BufRead> Fragments<R> {
    pub fn new(reader: R, path: &str) -> Self {
        Self {
            lines: reader.lines(),
            path: path.to_string(),
            lineno: 0,
        }
    }

    fn malformed(&self, reason: String) -> anyhow::Error {
        PipelineError::MalformedLog {
            path: self.path.clone(),
            line: self.lineno,
            reason,
        }
        .into()
    }
}

impl<R: BufRead> Iterator for Fragments<R> {
    type Item = Result<(usize, Fragment)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(anyhow::Error::new(e).context(format!(
                        "read log file {} after line {}",
                        self.path, self.lineno
                    ))));
                }
            };
            self.lineno += 1;

            match recognize(&line) {
                Ok(Some(fragment)) => return Some(Ok((self.lineno, fragment))),
                Ok(None) => continue,
                Err(reason) => return Some(Err(self.malformed(reason))),
            }
        }
    }
}

/// Match one line against the known prefixes.
fn recognize(line: &str) -> std::result::Result<Option<Fragment>, String> {
    let fragment = if line.starts_with(THREADS_PREFIX) {
        Fragment::Threads(value_token(line, "num_threads")?)
    } else if line.starts_with(LOOKUP_PREFIX) {
        Fragment::LookupFrac(value_token(line, "lookup_frac")?)
    } else if line.starts_with(INSERT_PREFIX) {
        Fragment::InsertFrac(value_token(line, "insert_frac")?)
    } else if line.starts_with(MAX_KEY_PREFIX) {
        Fragment::MaxKey(value_token(line, "max_key")?)
    } else if line.starts_with(THROUGHPUT_PREFIX) {
        let throughput: f64 = value_token(line, "throughput")?;
        if !throughput.is_finite() {
            return Err(format!("non-finite throughput {}", throughput));
        }
        Fragment::Throughput(throughput)
    } else {
        return Ok(None);
    };
    Ok(Some(fragment))
}

/// Values always sit in the second whitespace-separated token.
fn value_token<T: std::str::FromStr>(line: &str, field: &str) -> std::result::Result<T, String> {
    let token = line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| format!("{} line has no value", field))?;
    token
        .parse()
        .map_err(|_| format!("bad {} value {:?}", field, token))
}

/// The most recently seen run parameters.
#[derive(Debug, Default)]
struct RunContext {
    thread_count: Option<u32>,
    lookup: Option<u8>,
    mix: Option<WorkloadMix>,
    max_key: Option<u64>,
}

impl RunContext {
    fn apply(
        &mut self,
        source: &str,
        path: &str,
        line: usize,
        fragment: Fragment,
    ) -> std::result::Result<Option<LogRecord>, PipelineError> {
        let malformed = |reason: String| PipelineError::MalformedLog {
            path: path.to_string(),
            line,
            reason,
        };

        match fragment {
            Fragment::Threads(n) => self.thread_count = Some(n),
            Fragment::LookupFrac(lookup) => {
                // A new lookup share invalidates the previously derived mix.
                self.lookup = Some(lookup);
                self.mix = None;
            }
            Fragment::InsertFrac(insert) => {
                let lookup = self
                    .lookup
                    .ok_or_else(|| malformed("insert_frac before any lookup_frac".to_string()))?;
                let mix = WorkloadMix::derive(lookup, insert).ok_or_else(|| {
                    malformed(format!(
                        "lookup_frac {} + insert_frac {} exceeds 100%",
                        lookup, insert
                    ))
                })?;
                self.mix = Some(mix);
            }
            Fragment::MaxKey(max_key) => self.max_key = Some(max_key),
            Fragment::Throughput(throughput) => {
                let thread_count = self.thread_count.ok_or_else(|| {
                    malformed("throughput sample before any num_threads line".to_string())
                })?;
                debug!(source, line, thread_count, throughput, "sample");
                return Ok(Some(LogRecord {
                    source: source.to_string(),
                    line,
                    thread_count,
                    mix: self.mix,
                    max_key: self.max_key,
                    throughput,
                }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};

    fn parse(text: &str) -> Result<Vec<LogRecord>> {
        parse_log_reader(Cursor::new(text.to_string()), "logs/x.avl.bronson.run1.log")
    }

    fn malformed_line(err: anyhow::Error) -> usize {
        match err.downcast::<PipelineError>() {
            Ok(PipelineError::MalformedLog { line, .. }) => line,
            other => panic!("expected MalformedLog, got {:?}", other),
        }
    }

    const RUN: &str = "\
Benchmark configuration:
  num_threads: 4
  lookup_frac: 80
  insert_frac: 10
  max_key 1000000
Running...
Throughput(Ops/usec): 12.5
Throughput(Ops/usec): 13.5
";

    #[test]
    fn samples_carry_the_active_context() {
        let records = parse(RUN).unwrap();
        let mix = WorkloadMix {
            lookup: 80,
            insert: 10,
            delete: 10,
        };
        assert_eq!(
            records,
            vec![
                LogRecord {
                    source: "x.avl.bronson".to_string(),
                    line: 7,
                    thread_count: 4,
                    mix: Some(mix),
                    max_key: Some(1_000_000),
                    throughput: 12.5,
                },
                LogRecord {
                    source: "x.avl.bronson".to_string(),
                    line: 8,
                    thread_count: 4,
                    mix: Some(mix),
                    max_key: Some(1_000_000),
                    throughput: 13.5,
                },
            ]
        );
    }

    #[test]
    fn later_lines_overwrite_the_context() {
        let text = "  num_threads: 1\nThroughput(Ops/usec): 1.0\n  num_threads: 2\nThroughput(Ops/usec): 2.0\n";
        let threads: Vec<u32> = parse(text).unwrap().iter().map(|r| r.thread_count).collect();
        assert_eq!(threads, vec![1, 2]);
    }

    #[test]
    fn lines_without_an_exact_prefix_are_ignored() {
        let text = "num_threads: 9\n  num_threads: 2\nthroughput(ops/usec): 99\nnoise\nThroughput(Ops/usec): 3.0\n";
        let records = parse(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].thread_count, 2);
        assert_eq!(records[0].mix, None);
    }

    #[test]
    fn throughput_before_thread_count_is_malformed() {
        let err = parse("header\nThroughput(Ops/usec): 3.0\n").unwrap_err();
        assert_eq!(malformed_line(err), 2);
    }

    #[test]
    fn negative_delete_fraction_is_malformed() {
        let err = parse("  lookup_frac: 90\n  insert_frac: 20\n").unwrap_err();
        assert_eq!(malformed_line(err), 2);
    }

    #[test]
    fn insert_without_lookup_is_malformed() {
        let err = parse("  insert_frac: 20\n").unwrap_err();
        assert_eq!(malformed_line(err), 1);
    }

    #[test]
    fn new_lookup_resets_the_derived_mix() {
        let text = "\
Benchmark configuration:
  num_threads: 1
  lookup_frac: 0
  insert_frac: 50
  lookup_frac: 90
Throughput(Ops/usec): 1.0
  insert_frac: 5
Throughput(Ops/usec): 2.0
";
        let mixes: Vec<Option<WorkloadMix>> = parse(text).unwrap().iter().map(|r| r.mix).collect();
        assert_eq!(
            mixes,
            vec![
                None,
                Some(WorkloadMix {
                    lookup: 90,
                    insert: 5,
                    delete: 5
                })
            ]
        );
    }

    #[test]
    fn missing_or_bad_value_token_is_malformed() {
        assert_eq!(malformed_line(parse("  num_threads:\n").unwrap_err()), 1);
        assert_eq!(
            malformed_line(parse("  num_threads: 1\nThroughput(Ops/usec): fast\n").unwrap_err()),
            2
        );
    }

    #[test]
    fn non_finite_throughput_is_malformed() {
        for bad in ["nan", "inf", "-inf", "NaN"] {
            let text = format!(
                "  num_threads: 1\nThroughput(Ops/usec): 5\nThroughput(Ops/usec): {}\n",
                bad
            );
            assert_eq!(malformed_line(parse(&text).unwrap_err()), 3, "{}", bad);
        }
    }

    #[test]
    fn fragments_are_lazy_and_numbered() {
        let mut it = Fragments::new(Cursor::new("x\n  max_key 500\n"), "mem");
        assert_eq!(it.next().unwrap().unwrap(), (2, Fragment::MaxKey(500)));
        assert!(it.next().is_none());
    }

    #[test]
    fn source_identity_strips_two_suffixes() {
        assert_eq!(source_identity("/tmp/x.avl.bronson.readonly.log"), "x.avl.bronson");
        assert_eq!(source_identity("run.log"), "run");
        assert_eq!(source_identity("plain"), "plain");
    }

    #[test]
    fn files_are_read_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for (name, body) in [
            ("x.bst.citrus.1.log", "  num_threads: 1\nThroughput(Ops/usec): 5\n"),
            ("x.bst.citrus.2.log", "  num_threads: 2\nThroughput(Ops/usec): 7\n"),
        ] {
            let path = dir.path().join(name);
            let mut f = File::create(&path).unwrap();
            f.write_all(body.as_bytes()).unwrap();
            paths.push(path.to_string_lossy().into_owned());
        }

        let records = parse_log_files(&paths).unwrap();
        let got: Vec<(&str, u32, f64)> = records
            .iter()
            .map(|r| (r.source.as_str(), r.thread_count, r.throughput))
            .collect();
        assert_eq!(got, vec![("x.bst.citrus", 1, 5.0), ("x.bst.citrus", 2, 7.0)]);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = parse_log_file("/nonexistent/run.log").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/run.log"));
    }
}
