use crate::render::{Chart, ChartKind, Presenter};
use crate::series::{Hatch, LineStyle, Marker, Rgb};

use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

const TITLE_FONT_SIZE: u32 = 28;
const AXIS_LABEL_FONT_SIZE: u32 = 20;
const TICK_LABEL_FONT_SIZE: u32 = 16;
const LEGEND_FONT_SIZE: u32 = 16;

const MARKER_SIZE: i32 = 6;
const DASH_PIECES: usize = 8;
/// Bar width in x-axis units (one unit per category).
const MAX_BAR_WIDTH: f64 = 0.12;

type Plot<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Renders charts as standalone SVG documents.
pub struct SvgPresenter {
    pub height: u32,
}

impl Default for SvgPresenter {
    fn default() -> Self {
        Self { height: 480 }
    }
}

impl SvgPresenter {
    fn width(&self, chart: &Chart) -> u32 {
        match chart.kind {
            ChartKind::Lines => 800,
            ChartKind::Bars => (chart.x_ticks.len() as u32 * 260).clamp(640, 1800),
        }
    }
}

impl Presenter for SvgPresenter {
    fn extension(&self) -> &'static str {
        "svg"
    }

    fn render(&self, chart: &Chart) -> anyhow::Result<Vec<u8>> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width(chart), self.height))
                .into_drawing_area();
            root.fill(&WHITE)?;

            match chart.kind {
                ChartKind::Lines => draw_lines(&root, chart)?,
                ChartKind::Bars => draw_bars(&root, chart)?,
            }

            root.present()?;
        }
        Ok(svg.into_bytes())
    }
}

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

/// Category label for an integer tick, blank in between.
fn tick_label(ticks: &[String], x: f64) -> String {
    let idx = x.round();
    if idx < 0.0 || (x - idx).abs() > 0.3 {
        return String::new();
    }
    ticks.get(idx as usize).cloned().unwrap_or_default()
}

fn y_upper(chart: &Chart) -> f64 {
    let max = chart.max_value();
    if max > 0.0 { max * 1.15 } else { 1.0 }
}

fn draw_lines(root: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>, chart: &Chart) -> anyhow::Result<()> {
    let n = chart.x_ticks.len();
    let mut plot = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", TITLE_FONT_SIZE))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.4..(n as f64 - 0.6), 0.0..y_upper(chart))?;

    let ticks = &chart.x_ticks;
    let formatter = |x: &f64| tick_label(ticks, *x);
    let mut mesh = plot.configure_mesh();
    mesh.disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&formatter)
        .y_desc(chart.y_label.as_str())
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE));
    if let Some(x_label) = &chart.x_label {
        mesh.x_desc(x_label.as_str());
    }
    mesh.draw()?;

    for series in &chart.series {
        let rgb = color(series.style.color);
        let stroke = rgb.stroke_width(2);
        let points: Vec<(f64, f64)> = series
            .values()
            .enumerate()
            .map(|(i, v)| (i as f64, v))
            .collect();

        let anno = match series.style.line {
            LineStyle::Solid => plot.draw_series(LineSeries::new(points.clone(), stroke))?,
            LineStyle::Dashed => plot.draw_series(
                dashes(&points)
                    .into_iter()
                    .map(|piece| PathElement::new(piece, stroke)),
            )?,
        };
        anno.label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], stroke));

        draw_markers(&mut plot, &points, series.style.marker, rgb)?;
    }

    plot.configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(WHITE)
        .label_font(("sans-serif", LEGEND_FONT_SIZE))
        .draw()?;
    Ok(())
}

/// Every other piece of each segment, for dashed lines.
fn dashes(points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let mut pieces = Vec::new();
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        let at = |k: usize| {
            let t = k as f64 / DASH_PIECES as f64;
            (x0 + (x1 - x0) * t, y0 + (y1 - y0) * t)
        };
        for k in (0..DASH_PIECES).step_by(2) {
            pieces.push(vec![at(k), at(k + 1)]);
        }
    }
    pieces
}

fn draw_markers(
    plot: &mut Plot<'_, '_>,
    points: &[(f64, f64)],
    marker: Marker,
    rgb: RGBColor,
) -> anyhow::Result<()> {
    let filled = rgb.filled();
    let s = MARKER_SIZE;
    match marker {
        Marker::None => {}
        Marker::Circle => {
            plot.draw_series(points.iter().map(|&p| Circle::new(p, s, filled)))?;
        }
        Marker::Cross => {
            plot.draw_series(points.iter().map(|&p| Cross::new(p, s, rgb.stroke_width(2))))?;
        }
        Marker::Triangle => {
            plot.draw_series(points.iter().map(|&p| TriangleMarker::new(p, s + 1, filled)))?;
        }
        Marker::Square => {
            plot.draw_series(
                points
                    .iter()
                    .map(|&p| EmptyElement::at(p) + Rectangle::new([(-s, -s), (s, s)], filled)),
            )?;
        }
        Marker::Diamond => {
            plot.draw_series(points.iter().map(|&p| {
                EmptyElement::at(p)
                    + Polygon::new(vec![(0, -s - 1), (s + 1, 0), (0, s + 1), (-s - 1, 0)], filled)
            }))?;
        }
    }
    Ok(())
}

fn draw_bars(root: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>, chart: &Chart) -> anyhow::Result<()> {
    let n = chart.x_ticks.len();
    let groups = chart.series.len().max(1);
    let width = (0.8 / groups as f64).min(MAX_BAR_WIDTH);

    let mut plot = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", TITLE_FONT_SIZE))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), 0.0..y_upper(chart))?;

    let ticks = &chart.x_ticks;
    let formatter = |x: &f64| tick_label(ticks, *x);
    plot.configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&formatter)
        .y_desc(chart.y_label.as_str())
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;

    for (i, series) in chart.series.iter().enumerate() {
        let fill = color(series.style.color).filled();
        let hatch = series.style.hatch;
        let rects: Vec<[(f64, f64); 2]> = series
            .values()
            .enumerate()
            .map(|(cat, v)| {
                let left = cat as f64 - width * groups as f64 / 2.0 + width * i as f64;
                [(left, 0.0), (left + width, v)]
            })
            .collect();

        plot.draw_series(rects.iter().map(|r| Rectangle::new(*r, fill)))?
            .label(series.label.as_str())
            .legend(move |(x, y)| {
                let [a, b, c] = swatch_strokes(hatch);
                let line = BLACK.stroke_width(1);
                EmptyElement::at((x, y))
                    + Rectangle::new([(0, -5), (15, 5)], fill)
                    + Rectangle::new([(0, -5), (15, 5)], line)
                    + PathElement::new(a, line)
                    + PathElement::new(b, line)
                    + PathElement::new(c, line)
            });

        let marks = rects.iter().flat_map(|r| hatch_lines(*r, hatch));
        plot.draw_series(marks.map(|line| PathElement::new(line, BLACK.stroke_width(1))))?;
        plot.draw_series(
            rects
                .iter()
                .map(|r| Rectangle::new(*r, BLACK.stroke_width(1))),
        )?;
    }

    plot.configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(WHITE)
        .label_font(("sans-serif", LEGEND_FONT_SIZE))
        .draw()?;
    Ok(())
}

/// Hatch strokes for one bar, laid out in the bar's unit square.
fn hatch_lines(rect: [(f64, f64); 2], hatch: Hatch) -> Vec<Vec<(f64, f64)>> {
    let [(x0, y0), (x1, y1)] = rect;
    let map = |(u, v): (f64, f64)| (x0 + (x1 - x0) * u, y0 + (y1 - y0) * v);

    let mut unit: Vec<[(f64, f64); 2]> = Vec::new();
    let steps = [-0.75, -0.5, -0.25, 0.0, 0.25, 0.5, 0.75];
    let forward = |c: f64| [(f64::max(0.0, -c), f64::max(0.0, c)), (f64::min(1.0, 1.0 - c), f64::min(1.0, 1.0 + c))];
    let backward = |c: f64| {
        let [(ua, va), (ub, vb)] = forward(c);
        [(1.0 - ua, va), (1.0 - ub, vb)]
    };

    match hatch {
        Hatch::None => {}
        Hatch::Forward => unit.extend(steps.iter().map(|&c| forward(c))),
        Hatch::Backward => unit.extend(steps.iter().map(|&c| backward(c))),
        Hatch::Cross => {
            unit.extend(steps.iter().map(|&c| forward(c)));
            unit.extend(steps.iter().map(|&c| backward(c)));
        }
        Hatch::Horizontal => {
            unit.extend((1..8).map(|k| {
                let v = k as f64 / 8.0;
                [(0.0, v), (1.0, v)]
            }));
        }
        Hatch::Dots => {
            for row in 1..8 {
                for col in [0.3, 0.7] {
                    let v = row as f64 / 8.0;
                    unit.push([(col - 0.05, v), (col + 0.05, v)]);
                }
            }
        }
    }

    unit.into_iter()
        .map(|[a, b]| vec![map(a), map(b)])
        .collect()
}

/// Pattern strokes for a legend swatch, in pixels relative to its anchor.
fn swatch_strokes(hatch: Hatch) -> [Vec<(i32, i32)>; 3] {
    match hatch {
        Hatch::None => [vec![], vec![], vec![]],
        Hatch::Forward => [
            vec![(0, 5), (5, -5)],
            vec![(5, 5), (10, -5)],
            vec![(10, 5), (15, -5)],
        ],
        Hatch::Backward => [
            vec![(0, -5), (5, 5)],
            vec![(5, -5), (10, 5)],
            vec![(10, -5), (15, 5)],
        ],
        Hatch::Cross => [vec![(0, 5), (15, -5)], vec![(0, -5), (15, 5)], vec![]],
        Hatch::Horizontal => [
            vec![(0, -2), (15, -2)],
            vec![(0, 0), (15, 0)],
            vec![(0, 2), (15, 2)],
        ],
        Hatch::Dots => [
            vec![(3, 0), (4, 0)],
            vec![(7, 0), (8, 0)],
            vec![(11, 0), (12, 0)],
        ],
    }
}
