//! Series construction: reduced buckets → labeled, styled series aligned to a
//! shared x axis.

pub mod classify;
pub mod style;

pub use classify::{Classification, ClassificationTable};
pub use style::{Hatch, LineStyle, Marker, Rgb, SeriesStyle};

use crate::diagnostics;
use crate::error::PipelineError;
use crate::model::{Aggregate, Category};

use serde::Serialize;
use std::collections::HashMap;

/// Identity used for buckets that pool every source.
pub const POOLED_IDENTITY: &str = "all";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedSeries {
    pub identity: String,
    pub label: String,
    pub style: SeriesStyle,
    pub classification: Classification,
    /// One point per x category, in axis order.
    pub points: Vec<(Category, f64)>,
}

impl AggregatedSeries {
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, v)| *v)
    }
}

/// Build one series per identity, in the order identities first appear in
/// `aggregate`, with values ordered by `x_categories`.
///
/// Every series must have exactly one value per declared category.
pub fn build(
    aggregate: &Aggregate,
    table: &ClassificationTable,
    x_categories: &[Category],
) -> Result<Vec<AggregatedSeries>, PipelineError> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_identity: HashMap<&str, HashMap<&Category, f64>> = HashMap::new();

    for (key, value) in aggregate.iter() {
        let identity = key.identity.as_deref().unwrap_or(POOLED_IDENTITY);
        let values = by_identity.entry(identity).or_insert_with(|| {
            order.push(identity);
            HashMap::new()
        });
        values.insert(&key.category, value);
    }

    let mut series = Vec::with_capacity(order.len());
    for identity in order {
        let values = &by_identity[identity];

        let points: Vec<(Category, f64)> = x_categories
            .iter()
            .filter_map(|cat| values.get(cat).map(|v| (cat.clone(), *v)))
            .collect();

        if points.len() != x_categories.len() || values.len() != x_categories.len() {
            return Err(PipelineError::MisalignedSeries {
                identity: identity.to_string(),
                expected: x_categories.len(),
                actual: points.len(),
            });
        }

        let resolved = table.resolve(identity);
        if resolved.classification == Classification::Unrecognized {
            diagnostics::warn(PipelineError::UnrecognizedIdentity {
                identity: identity.to_string(),
            });
        }

        series.push(AggregatedSeries {
            identity: identity.to_string(),
            label: resolved.label,
            style: resolved.style,
            classification: resolved.classification,
            points,
        });
    }

    Ok(series)
}
