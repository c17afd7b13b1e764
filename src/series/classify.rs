//! Map a source identity (log file stem or executable name) to a display label
//! and style. Rules are tried in order; the first match wins.

use crate::series::style::{Hatch, LineStyle, Marker, Rgb, SeriesStyle};

use serde::Serialize;

pub const UNRECOGNIZED_LABEL: &str = "unrecognized";

/// Style of series whose identity no rule matched.
pub const UNRECOGNIZED_STYLE: SeriesStyle =
    SeriesStyle::line(Marker::Cross, LineStyle::Dashed, Rgb::GRAY);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Known,
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub label: String,
    pub style: SeriesStyle,
    pub classification: Classification,
}

pub trait Classifier {
    fn classify(&self, identity: &str) -> Option<(String, SeriesStyle)>;
}

/// Matches identities containing `pattern`.
#[derive(Debug, Clone)]
pub struct SubstringRule {
    pub pattern: String,
    pub label: String,
    pub style: SeriesStyle,
}

impl SubstringRule {
    pub fn new(pattern: &str, label: &str, style: SeriesStyle) -> Self {
        Self {
            pattern: pattern.to_string(),
            label: label.to_string(),
            style,
        }
    }
}

impl Classifier for SubstringRule {
    fn classify(&self, identity: &str) -> Option<(String, SeriesStyle)> {
        identity
            .contains(&self.pattern)
            .then(|| (self.label.clone(), self.style))
    }
}

/// Matches one identity exactly.
#[derive(Debug, Clone)]
pub struct ExactRule {
    pub identity: String,
    pub label: String,
    pub style: SeriesStyle,
}

impl Classifier for ExactRule {
    fn classify(&self, identity: &str) -> Option<(String, SeriesStyle)> {
        (identity == self.identity).then(|| (self.label.clone(), self.style))
    }
}

#[derive(Default)]
pub struct ClassificationTable {
    rules: Vec<Box<dyn Classifier>>,
}

impl ClassificationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: impl Classifier + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// First matching rule, or the unrecognized sentinel.
    pub fn resolve(&self, identity: &str) -> Resolved {
        for rule in &self.rules {
            if let Some((label, style)) = rule.classify(identity) {
                return Resolved {
                    label,
                    style,
                    classification: Classification::Known,
                };
            }
        }
        Resolved {
            label: format!("{}: {}", UNRECOGNIZED_LABEL, identity),
            style: UNRECOGNIZED_STYLE,
            classification: Classification::Unrecognized,
        }
    }

    /// Tree implementations recognized in benchmark log file names.
    pub fn benchmark_logs() -> Self {
        use LineStyle::{Dashed, Solid};
        let line = SeriesStyle::line;

        Self::new()
            .with_rule(SubstringRule::new(
                "x.avl.bronson",
                "bronson-avl",
                line(Marker::Square, Solid, Rgb::PURPLE),
            ))
            .with_rule(SubstringRule::new(
                "x.bst.aravind",
                "natarajan-bst",
                line(Marker::Diamond, Solid, Rgb::GRAY),
            ))
            .with_rule(SubstringRule::new(
                "x.bst.citrus",
                "citrus-bst",
                line(Marker::Triangle, Solid, Rgb::BLUE),
            ))
            .with_rule(SubstringRule::new(
                "x.avl.int.rcu_sgl",
                "rcu-sgl-avl",
                line(Marker::Triangle, Solid, Rgb::YELLOW),
            ))
            .with_rule(SubstringRule::new(
                "x.avl.int.cop",
                "cop-avl",
                line(Marker::Circle, Solid, Rgb::RED),
            ))
            .with_rule(SubstringRule::new(
                "x.avl.int.rcu_htm",
                "rcu-htm-avl",
                line(Marker::Cross, Solid, Rgb::BLACK),
            ))
            .with_rule(SubstringRule::new(
                "x.rbt.int.rcu_htm",
                "rcu-htm-rbt",
                line(Marker::Cross, Dashed, Rgb::BLACK),
            ))
    }

    /// Bar-chart table: executable `i` gets label `i` and the `i`-th
    /// fill/hatch, cycling when there are more executables than patterns.
    pub fn positional(executables: &[String], labels: &[String]) -> Self {
        const FILLS: [(Rgb, Hatch); 7] = [
            (Rgb::WHITE, Hatch::None),
            (Rgb::WHITE, Hatch::Forward),
            (Rgb::WHITE, Hatch::Cross),
            (Rgb::WHITE, Hatch::Backward),
            (Rgb::WHITE, Hatch::Dots),
            (Rgb::BLACK, Hatch::None),
            (Rgb::WHITE, Hatch::Horizontal),
        ];

        executables
            .iter()
            .zip(labels)
            .enumerate()
            .fold(Self::new(), |table, (i, (exe, label))| {
                let (color, hatch) = FILLS[i % FILLS.len()];
                table.with_rule(ExactRule {
                    identity: exe.clone(),
                    label: label.clone(),
                    style: SeriesStyle::bar(color, hatch),
                })
            })
    }
}
