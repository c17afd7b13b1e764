use crate::render::{Chart, Presenter};

/// Dumps the chart data itself, for diffing runs or plotting elsewhere.
pub struct JsonPresenter;

impl Presenter for JsonPresenter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, chart: &Chart) -> anyhow::Result<Vec<u8>> {
        let mut out = serde_json::to_vec_pretty(chart)?;
        out.push(b'\n');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::render::ChartKind;
    use crate::series::{AggregatedSeries, Classification, LineStyle, Marker, Rgb, SeriesStyle};

    #[test]
    fn embeds_labels_and_values() {
        let chart = Chart {
            kind: ChartKind::Lines,
            title: "1M keys - 90% lookups".into(),
            x_label: Some("Number of threads".into()),
            y_label: "Throughput (Mops/sec)".into(),
            x_ticks: vec!["1".into(), "2".into()],
            series: vec![AggregatedSeries {
                identity: "x.bst.citrus".into(),
                label: "citrus-bst".into(),
                style: SeriesStyle::line(Marker::Triangle, LineStyle::Solid, Rgb::BLUE),
                classification: Classification::Known,
                points: vec![(Category::Threads(1), 1.5), (Category::Threads(2), 2.5)],
            }],
        };

        let bytes = JsonPresenter.render(&chart).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["kind"], "lines");
        assert_eq!(v["series"][0]["label"], "citrus-bst");
        assert_eq!(v["series"][0]["style"]["marker"], "triangle");
        assert_eq!(v["series"][0]["points"][1][1], 2.5);
        assert_eq!(v["x_ticks"][1], "2");
    }
}
