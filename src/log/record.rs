use serde::Serialize;
use std::fmt;

/// Lookup/insert/delete percentages of one benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WorkloadMix {
    pub lookup: u8,
    pub insert: u8,
    pub delete: u8,
}

impl WorkloadMix {
    /// Derive the delete share from the other two; `None` if they exceed 100.
    pub fn derive(lookup: u8, insert: u8) -> Option<Self> {
        let delete = 100u8.checked_sub(lookup)?.checked_sub(insert)?;
        Some(Self {
            lookup,
            insert,
            delete,
        })
    }
}

/// Same shape as the workload labels of the summary files: `90_5_5`.
impl fmt::Display for WorkloadMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.lookup, self.insert, self.delete)
    }
}

/// One value-carrying line of a benchmark log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fragment {
    Threads(u32),
    LookupFrac(u8),
    InsertFrac(u8),
    MaxKey(u64),
    Throughput(f64),
}

/// A throughput sample stamped with the run context active when it was seen.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub source: String,
    pub line: usize,
    pub thread_count: u32,
    pub mix: Option<WorkloadMix>,
    pub max_key: Option<u64>,
    /// ops/usec
    pub throughput: f64,
}

/// One data line of a bar-chart summary file.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub line: usize,
    pub executable: String,
    pub init_size: String,
    pub workload: String,
    pub throughput: f64,
}

/// A parsed summary file: the thread count from its header plus the rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub path: String,
    pub thread_count: u32,
    pub rows: Vec<SummaryRow>,
}
