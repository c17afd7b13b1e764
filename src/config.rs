//! Experiment-matrix configuration for the bar-chart pipeline.
//!
//! The lists arrive as whitespace-separated strings (flags or the
//! `RCU_HTM_*` environment variables) and are validated here, once, before any
//! file is read.

use crate::error::PipelineError;
use crate::model::Category;

use std::collections::HashSet;

/// Validated bar-chart configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    /// Legend labels, position-aligned with `executables`.
    pub labels: Vec<String>,
    pub executables: Vec<String>,
    pub workloads: Vec<String>,
    pub init_sizes: Vec<String>,
}

impl PlotConfig {
    pub fn from_lists(
        labels: &str,
        executables: &str,
        workloads: &str,
        init_sizes: &str,
    ) -> Result<Self, PipelineError> {
        let config = Self {
            labels: split_list(labels),
            executables: split_list(executables),
            workloads: split_list(workloads),
            init_sizes: split_list(init_sizes),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        for (field, list) in [
            ("plot labels", &self.labels),
            ("executables", &self.executables),
            ("workloads", &self.workloads),
            ("init sizes", &self.init_sizes),
        ] {
            if list.is_empty() {
                return Err(PipelineError::MissingConfiguration { field });
            }
        }

        for (field, list) in [
            ("executables", &self.executables),
            ("workloads", &self.workloads),
            ("init sizes", &self.init_sizes),
        ] {
            let mut seen = HashSet::new();
            if let Some(dup) = list.iter().find(|item| !seen.insert(item.as_str())) {
                return Err(PipelineError::InconsistentConfiguration(format!(
                    "{} lists {} more than once",
                    field, dup
                )));
            }
        }

        if self.labels.len() < self.executables.len() {
            return Err(PipelineError::InconsistentConfiguration(format!(
                "{} executables but only {} plot labels",
                self.executables.len(),
                self.labels.len()
            )));
        }
        Ok(())
    }

    pub fn workload_categories(&self) -> Vec<Category> {
        self.workloads
            .iter()
            .map(|w| Category::Workload(w.clone()))
            .collect()
    }

    pub fn tree_size_categories(&self) -> Vec<Category> {
        self.init_sizes
            .iter()
            .map(|s| Category::TreeSize(s.clone()))
            .collect()
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}
