//! Aggregation model: bucket throughput samples by configuration and reduce
//! each bucket to one value.
//!
//! Repeated runs of the same configuration are combined with the arithmetic
//! mean. Ratios across heterogeneous configurations (speedups) are combined
//! with the geometric mean. Each pipeline picks its reducer once; the two are
//! not interchangeable.

use crate::error::PipelineError;
use crate::format::prefix_large_number;
use crate::log::{LogRecord, SummaryRow};

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// The x-axis dimension of a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Threads(u32),
    Workload(String),
    TreeSize(String),
    Total,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Threads(n) => write!(f, "{}", n),
            Category::Workload(w) => f.write_str(w),
            Category::TreeSize(s) => f.write_str(s),
            Category::Total => f.write_str("total"),
        }
    }
}

/// Grouping key. `identity` names the implementation (log source or
/// executable); it is absent when all sources are pooled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BucketKey {
    pub identity: Option<String>,
    pub category: Category,
}

impl BucketKey {
    pub fn new(identity: impl Into<String>, category: Category) -> Self {
        Self {
            identity: Some(identity.into()),
            category,
        }
    }

    pub fn pooled(category: Category) -> Self {
        Self {
            identity: None,
            category,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identity {
            Some(id) => write!(f, "({}, {})", id, self.category),
            None => write!(f, "({})", self.category),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    /// Thread count alone, all sources pooled.
    Threads,
    /// (source, thread count): one line per implementation.
    SourceThreads,
    /// (executable, workload mix)
    Workload,
    /// (executable, tree-size label)
    TreeSize,
    /// Executable alone.
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Mean,
    Geomean,
}

impl Reducer {
    /// Reduce one bucket. Samples are summed in sorted order so the result
    /// depends only on the multiset of samples.
    pub fn reduce(self, key: &BucketKey, samples: &[f64]) -> Result<f64, PipelineError> {
        if samples.is_empty() {
            return Err(PipelineError::EmptyBucket {
                key: key.to_string(),
            });
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len() as f64;

        match self {
            Reducer::Mean => Ok(sorted.iter().sum::<f64>() / n),
            Reducer::Geomean => {
                if let Some(&bad) = sorted.iter().find(|v| !(**v > 0.0)) {
                    return Err(PipelineError::NonPositiveSample {
                        key: key.to_string(),
                        value: bad,
                    });
                }
                let log_sum: f64 = sorted.iter().map(|v| v.ln()).sum();
                Ok((log_sum / n).exp())
            }
        }
    }
}

/// Anything that can be bucketed: a keyed throughput value.
pub trait Sample {
    fn key(&self, mode: AggregationMode) -> Result<BucketKey, PipelineError>;
    fn value(&self) -> f64;
}

impl Sample for LogRecord {
    fn key(&self, mode: AggregationMode) -> Result<BucketKey, PipelineError> {
        let missing = |dimension| PipelineError::MissingDimension {
            source_id: self.source.clone(),
            line: self.line,
            dimension,
        };

        Ok(match mode {
            AggregationMode::Threads => BucketKey::pooled(Category::Threads(self.thread_count)),
            AggregationMode::SourceThreads => {
                BucketKey::new(&self.source, Category::Threads(self.thread_count))
            }
            AggregationMode::Workload => {
                let mix = self.mix.ok_or_else(|| missing("workload mix"))?;
                BucketKey::new(&self.source, Category::Workload(mix.to_string()))
            }
            AggregationMode::TreeSize => {
                let max_key = self.max_key.ok_or_else(|| missing("max_key"))?;
                let label = prefix_large_number(max_key, 1000)?;
                BucketKey::new(&self.source, Category::TreeSize(label))
            }
            AggregationMode::Total => BucketKey::new(&self.source, Category::Total),
        })
    }

    fn value(&self) -> f64 {
        self.throughput
    }
}

impl Sample for SummaryRow {
    fn key(&self, mode: AggregationMode) -> Result<BucketKey, PipelineError> {
        let category = match mode {
            AggregationMode::Threads | AggregationMode::SourceThreads => {
                return Err(PipelineError::MissingDimension {
                    source_id: self.executable.clone(),
                    line: self.line,
                    dimension: "per-row thread count",
                });
            }
            AggregationMode::Workload => Category::Workload(self.workload.clone()),
            AggregationMode::TreeSize => Category::TreeSize(self.init_size.clone()),
            AggregationMode::Total => Category::Total,
        };
        Ok(BucketKey::new(&self.executable, category))
    }

    fn value(&self) -> f64 {
        self.throughput
    }
}

/// Samples grouped by key, remembering the order keys were first seen.
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    order: Vec<BucketKey>,
    samples: HashMap<BucketKey, Vec<f64>>,
}

impl Buckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect<'a, S, I>(samples: I, mode: AggregationMode) -> Result<Self, PipelineError>
    where
        S: Sample + 'a,
        I: IntoIterator<Item = &'a S>,
    {
        let mut buckets = Self::new();
        for sample in samples {
            buckets.insert(sample.key(mode)?, sample.value());
        }
        Ok(buckets)
    }

    pub fn insert(&mut self, key: BucketKey, value: f64) {
        match self.samples.get_mut(&key) {
            Some(values) => values.push(value),
            None => {
                self.order.push(key.clone());
                self.samples.insert(key, vec![value]);
            }
        }
    }

    /// Union of sample sets per key. Keys new to `self` are appended in the
    /// order `other` saw them.
    pub fn merge(&mut self, other: Buckets) {
        let Buckets {
            order,
            mut samples,
        } = other;
        for key in order {
            if let Some(values) = samples.remove(&key) {
                for v in values {
                    self.insert(key.clone(), v);
                }
            }
        }
    }

    pub fn get(&self, key: &BucketKey) -> Option<&[f64]> {
        self.samples.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &BucketKey> {
        self.order.iter()
    }

    /// Reduce every observed bucket.
    pub fn reduce(&self, reducer: Reducer) -> Result<Aggregate, PipelineError> {
        let mut entries = Vec::with_capacity(self.order.len());
        for key in &self.order {
            let value = reducer.reduce(key, &self.samples[key])?;
            entries.push((key.clone(), value));
        }
        Ok(Aggregate::from_entries(entries))
    }

    /// Reduce a declared experiment matrix, identity-major. Every
    /// (identity, category) pair must have been observed.
    pub fn reduce_matrix(
        &self,
        identities: &[String],
        categories: &[Category],
        reducer: Reducer,
    ) -> Result<Aggregate, PipelineError> {
        let mut entries = Vec::with_capacity(identities.len() * categories.len());
        for identity in identities {
            for category in categories {
                let key = BucketKey::new(identity, category.clone());
                let samples = self.get(&key).unwrap_or(&[]);
                let value = reducer.reduce(&key, samples)?;
                entries.push((key, value));
            }
        }
        Ok(Aggregate::from_entries(entries))
    }
}

/// Group `samples` by `mode` and reduce each bucket.
pub fn aggregate<S: Sample>(
    samples: &[S],
    mode: AggregationMode,
    reducer: Reducer,
) -> Result<Aggregate, PipelineError> {
    Buckets::collect(samples, mode)?.reduce(reducer)
}

/// Reduced buckets in first-encounter order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregate {
    entries: Vec<(BucketKey, f64)>,
}

impl Aggregate {
    pub fn from_entries(entries: Vec<(BucketKey, f64)>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey, f64)> {
        self.entries.iter().map(|(k, v)| (k, *v))
    }

    /// Distinct categories, ascending.
    pub fn categories(&self) -> Vec<Category> {
        let mut cats: Vec<Category> = self.entries.iter().map(|(k, _)| k.category.clone()).collect();
        cats.sort();
        cats.dedup();
        cats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::record::WorkloadMix;
    use pretty_assertions::assert_eq;

    fn record(source: &str, threads: u32, throughput: f64) -> LogRecord {
        LogRecord {
            source: source.to_string(),
            line: 1,
            thread_count: threads,
            mix: None,
            max_key: None,
            throughput,
        }
    }

    fn row(exe: &str, size: &str, workload: &str, throughput: f64) -> SummaryRow {
        SummaryRow {
            line: 2,
            executable: exe.to_string(),
            init_size: size.to_string(),
            workload: workload.to_string(),
            throughput,
        }
    }

    #[test]
    fn per_thread_means() {
        let mut records = Vec::new();
        for (threads, samples) in [
            (1, [10.0, 10.0]),
            (2, [20.0, 20.0]),
            (4, [35.0, 45.0]),
            (8, [60.0, 60.0]),
        ] {
            for s in samples {
                records.push(record("a", threads, s));
            }
        }

        let agg = aggregate(&records, AggregationMode::Threads, Reducer::Mean).unwrap();
        let got: Vec<(String, f64)> = agg.iter().map(|(k, v)| (k.to_string(), v)).collect();
        assert_eq!(
            got,
            vec![
                ("(1)".to_string(), 10.0),
                ("(2)".to_string(), 20.0),
                ("(4)".to_string(), 40.0),
                ("(8)".to_string(), 60.0),
            ]
        );
    }

    #[test]
    fn mean_is_sum_over_count() {
        let key = BucketKey::pooled(Category::Total);
        let samples = [1.5, 2.25, 7.0, 3.25];
        let expected = samples.iter().sum::<f64>() / samples.len() as f64;
        assert_eq!(Reducer::Mean.reduce(&key, &samples).unwrap(), expected);
    }

    #[test]
    fn merge_order_does_not_change_the_mean() {
        let file_a = [record("s", 2, 0.1), record("s", 2, 0.7)];
        let file_b = [record("s", 2, 0.2), record("s", 2, 1e-9), record("s", 2, 3.3)];

        let mut ab = Buckets::collect(&file_a, AggregationMode::Threads).unwrap();
        ab.merge(Buckets::collect(&file_b, AggregationMode::Threads).unwrap());
        let mut ba = Buckets::collect(&file_b, AggregationMode::Threads).unwrap();
        ba.merge(Buckets::collect(&file_a, AggregationMode::Threads).unwrap());

        assert_eq!(
            ab.reduce(Reducer::Mean).unwrap(),
            ba.reduce(Reducer::Mean).unwrap()
        );
        assert_eq!(ab.get(&BucketKey::pooled(Category::Threads(2))).unwrap().len(), 5);
    }

    #[test]
    fn geomean_matches_log_mean() {
        let key = BucketKey::pooled(Category::Total);
        let samples = [2.0, 8.0, 0.5, 3.0];
        let expected = (samples.iter().map(|v: &f64| v.ln()).sum::<f64>() / 4.0).exp();
        let got = Reducer::Geomean.reduce(&key, &samples).unwrap();
        assert!((got - expected).abs() < 1e-12);
        assert!((Reducer::Geomean.reduce(&key, &[2.0, 8.0]).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn geomean_rejects_non_positive_samples() {
        let key = BucketKey::new("exe", Category::Total);
        for bad in [0.0, -1.0, f64::NAN] {
            let err = Reducer::Geomean.reduce(&key, &[1.0, bad]).unwrap_err();
            assert!(matches!(err, PipelineError::NonPositiveSample { .. }));
        }
    }

    #[test]
    fn unobserved_matrix_key_is_an_empty_bucket() {
        let rows = [row("exe.a", "1K", "90_5_5", 2.0), row("exe.b", "1K", "90_5_5", 3.0)];
        let buckets = Buckets::collect(&rows, AggregationMode::TreeSize).unwrap();

        let err = buckets
            .reduce_matrix(
                &["exe.a".to_string(), "exe.b".to_string()],
                &[Category::TreeSize("1K".into()), Category::TreeSize("1M".into())],
                Reducer::Geomean,
            )
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::EmptyBucket {
                key: "(exe.a, 1M)".to_string()
            }
        );
    }

    #[test]
    fn empty_bucket_is_rejected_by_every_reducer() {
        let key = BucketKey::pooled(Category::Threads(3));
        assert!(matches!(
            Reducer::Mean.reduce(&key, &[]),
            Err(PipelineError::EmptyBucket { .. })
        ));
        assert!(matches!(
            Reducer::Geomean.reduce(&key, &[]),
            Err(PipelineError::EmptyBucket { .. })
        ));
    }

    #[test]
    fn summary_keys_follow_the_mode() {
        let r = row("exe.a", "1M", "50_25_25", 1.0);
        assert_eq!(
            r.key(AggregationMode::Workload).unwrap(),
            BucketKey::new("exe.a", Category::Workload("50_25_25".into()))
        );
        assert_eq!(
            r.key(AggregationMode::TreeSize).unwrap(),
            BucketKey::new("exe.a", Category::TreeSize("1M".into()))
        );
        assert_eq!(
            r.key(AggregationMode::Total).unwrap(),
            BucketKey::new("exe.a", Category::Total)
        );
        assert!(r.key(AggregationMode::Threads).is_err());
    }

    #[test]
    fn log_records_key_on_their_context() {
        let mut r = record("x.bst.citrus", 8, 1.0);
        assert!(matches!(
            r.key(AggregationMode::Workload),
            Err(PipelineError::MissingDimension { .. })
        ));

        r.mix = WorkloadMix::derive(90, 5);
        r.max_key = Some(1_000_000);
        assert_eq!(
            r.key(AggregationMode::Workload).unwrap(),
            BucketKey::new("x.bst.citrus", Category::Workload("90_5_5".into()))
        );
        assert_eq!(
            r.key(AggregationMode::TreeSize).unwrap(),
            BucketKey::new("x.bst.citrus", Category::TreeSize("1M".into()))
        );
        assert_eq!(
            r.key(AggregationMode::SourceThreads).unwrap(),
            BucketKey::new("x.bst.citrus", Category::Threads(8))
        );
    }

    #[test]
    fn first_encounter_order_is_kept() {
        let records = [record("b", 4, 1.0), record("a", 1, 1.0), record("b", 1, 1.0)];
        let buckets = Buckets::collect(&records, AggregationMode::SourceThreads).unwrap();
        let keys: Vec<String> = buckets.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["(b, 4)", "(a, 1)", "(b, 1)"]);

        let agg = buckets.reduce(Reducer::Mean).unwrap();
        assert_eq!(agg.categories(), vec![Category::Threads(1), Category::Threads(4)]);
    }
}
