//! Gauge chart rendering for a single health subscore.
//!
//! Produces a self-contained SVG document: a 0-100 semicircle split into
//! colored bands with a needle at the score. Rendering is plain string
//! building with no graphics backend and no retained handles.

use std::f64::consts::PI;
use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::{Deserialize, Serialize};

const WIDTH: f64 = 300.0;
const HEIGHT: f64 = 230.0;
const CENTER_X: f64 = 150.0;
const CENTER_Y: f64 = 150.0;
const RADIUS: f64 = 110.0;
const BAND_WIDTH: f64 = 22.0;
const NEEDLE_LENGTH: f64 = RADIUS * 0.85;

/// What to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeSpec {
    pub score: f64,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
}

/// A colored score range on the dial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeBand {
    pub from: f64,
    pub to: f64,
    pub color: String,
}

/// Red below 40, amber to 70, green above.
pub fn default_bands() -> Vec<GaugeBand> {
    vec![
        GaugeBand {
            from: 0.0,
            to: 40.0,
            color: "#e74c3c".to_string(),
        },
        GaugeBand {
            from: 40.0,
            to: 70.0,
            color: "#f39c12".to_string(),
        },
        GaugeBand {
            from: 70.0,
            to: 100.0,
            color: "#2ecc71".to_string(),
        },
    ]
}

/// Clamp a score onto the dial; NaN sits at the midpoint.
fn dial_score(score: f64) -> f64 {
    if score.is_nan() {
        50.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// Point on the arc for `score` at distance `radius` from the center.
/// 0 is the far left, 100 the far right.
fn point_at(score: f64, radius: f64) -> (f64, f64) {
    let theta = PI * (1.0 - dial_score(score) / 100.0);
    (CENTER_X + radius * theta.cos(), CENTER_Y - radius * theta.sin())
}

fn band_path(band: &GaugeBand) -> String {
    let (x0, y0) = point_at(band.from, RADIUS);
    let (x1, y1) = point_at(band.to, RADIUS);
    format!(
        r#"<path d="M {:.1} {:.1} A {r:.1} {r:.1} 0 0 1 {:.1} {:.1}" fill="none" stroke="{}" stroke-width="{:.1}"/>"#,
        x0,
        y0,
        x1,
        y1,
        encode_double_quoted_attribute(&band.color),
        BAND_WIDTH,
        r = RADIUS,
    )
}

/// Render with the default bands.
pub fn render_svg(spec: &GaugeSpec) -> String {
    render_svg_with_bands(spec, &default_bands())
}

pub fn render_svg_with_bands(spec: &GaugeSpec, bands: &[GaugeBand]) -> String {
    let score = dial_score(spec.score);
    let (needle_x, needle_y) = point_at(score, NEEDLE_LENGTH);

    let mut svg = String::new();
    // Writing into a String cannot fail
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = WIDTH,
        h = HEIGHT,
    );
    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="24" text-anchor="middle" font-size="16" font-weight="bold">{}</text>"#,
        CENTER_X,
        encode_text(&spec.title)
    );
    if !spec.subtitle.is_empty() {
        let _ = write!(
            svg,
            r##"<text x="{:.1}" y="42" text-anchor="middle" font-size="12" fill="#555">{}</text>"##,
            CENTER_X,
            encode_text(&spec.subtitle)
        );
    }
    for band in bands {
        svg.push_str(&band_path(band));
    }
    let _ = write!(
        svg,
        r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#333" stroke-width="3" stroke-linecap="round"/>"##,
        CENTER_X, CENTER_Y, needle_x, needle_y
    );
    let _ = write!(
        svg,
        r##"<circle cx="{:.1}" cy="{:.1}" r="6" fill="#333"/>"##,
        CENTER_X, CENTER_Y
    );
    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="22" font-weight="bold">{:.1}</text>"#,
        CENTER_X,
        CENTER_Y + 32.0,
        score
    );
    if !spec.description.is_empty() {
        let _ = write!(
            svg,
            r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="11" fill="#777">{}</text>"##,
            CENTER_X,
            CENTER_Y + 56.0,
            encode_text(&spec.description)
        );
    }
    svg.push_str("</svg>");
    svg
}
