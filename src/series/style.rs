use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    None,
    Square,
    Diamond,
    Triangle,
    Circle,
    Cross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// Fill patterns for bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hatch {
    None,
    Forward,
    Cross,
    Backward,
    Dots,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const GRAY: Rgb = Rgb(128, 128, 128);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const BLUE: Rgb = Rgb(0, 0, 255);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
    pub const PURPLE: Rgb = Rgb(128, 0, 128);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesStyle {
    pub marker: Marker,
    pub line: LineStyle,
    pub color: Rgb,
    pub hatch: Hatch,
}

impl SeriesStyle {
    pub const fn line(marker: Marker, line: LineStyle, color: Rgb) -> Self {
        Self {
            marker,
            line,
            color,
            hatch: Hatch::None,
        }
    }

    pub const fn bar(color: Rgb, hatch: Hatch) -> Self {
        Self {
            marker: Marker::None,
            line: LineStyle::Solid,
            color,
            hatch,
        }
    }
}
