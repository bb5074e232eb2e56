//! Minimal SVG document builder.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::Result;

/// Escape text for use inside SVG elements and attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

/// Stroke settings for lines and outlines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke<'a> {
    pub color: &'a str,
    pub width: f64,
    pub dash: Option<&'a str>,
}

impl<'a> Stroke<'a> {
    pub fn solid(color: &'a str, width: f64) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub fn dashed(color: &'a str, width: f64) -> Self {
        Self {
            color,
            width,
            dash: Some("6,4"),
        }
    }

    fn attributes(&self) -> String {
        let mut attrs = format!(
            "stroke=\"{}\" stroke-width=\"{:.2}\"",
            self.color, self.width
        );
        if let Some(dash) = self.dash {
            let _ = write!(attrs, " stroke-dasharray=\"{dash}\"");
        }
        attrs
    }
}

/// An SVG document assembled element by element.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    width: f64,
    height: f64,
    body: String,
}

impl SvgDocument {
    /// Create a document with a white background.
    pub fn new(width: f64, height: f64) -> Self {
        let mut doc = Self {
            width,
            height,
            body: String::new(),
        };
        doc.rect(0.0, 0.0, width, height, "#ffffff", None);
        doc
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str, stroke: Option<Stroke>) {
        let stroke = stroke.map(|s| format!(" {}", s.attributes())).unwrap_or_default();
        let _ = writeln!(
            self.body,
            "  <rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{fill}\"{stroke}/>",
            w.max(0.0),
            h.max(0.0)
        );
    }

    /// A translucent filled polygon.
    pub fn polygon(&mut self, points: &[(f64, f64)], fill: &str, opacity: f64) {
        if points.is_empty() {
            return;
        }
        let _ = writeln!(
            self.body,
            "  <polygon points=\"{}\" fill=\"{fill}\" fill-opacity=\"{opacity:.2}\" stroke=\"none\"/>",
            format_points(points)
        );
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: Stroke) {
        let _ = writeln!(
            self.body,
            "  <line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" {}/>",
            stroke.attributes()
        );
    }

    /// A connected line through `points`; non-finite points are skipped.
    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: Stroke) {
        let finite: Vec<(f64, f64)> = points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        if finite.len() < 2 {
            return;
        }
        let _ = writeln!(
            self.body,
            "  <polyline points=\"{}\" fill=\"none\" {}/>",
            format_points(&finite),
            stroke.attributes()
        );
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) {
        let _ = writeln!(
            self.body,
            "  <circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{r:.2}\" fill=\"{fill}\"/>"
        );
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, size: f64, anchor: Anchor) {
        self.styled_text(x, y, content, size, anchor, "normal", "#222222");
    }

    pub fn bold_text(&mut self, x: f64, y: f64, content: &str, size: f64, anchor: Anchor) {
        self.styled_text(x, y, content, size, anchor, "bold", "#222222");
    }

    pub fn styled_text(
        &mut self,
        x: f64,
        y: f64,
        content: &str,
        size: f64,
        anchor: Anchor,
        weight: &str,
        color: &str,
    ) {
        let _ = writeln!(
            self.body,
            "  <text x=\"{x:.2}\" y=\"{y:.2}\" font-family=\"sans-serif\" font-size=\"{size:.1}\" \
             font-weight=\"{weight}\" fill=\"{color}\" text-anchor=\"{}\">{}</text>",
            anchor.as_str(),
            escape(content)
        );
    }

    /// Text rotated by -90 degrees around its anchor (for y-axis titles).
    pub fn vertical_text(&mut self, x: f64, y: f64, content: &str, size: f64) {
        let _ = writeln!(
            self.body,
            "  <text x=\"{x:.2}\" y=\"{y:.2}\" font-family=\"sans-serif\" font-size=\"{size:.1}\" \
             text-anchor=\"middle\" transform=\"rotate(-90 {x:.2} {y:.2})\">{}</text>",
            escape(content)
        );
    }

    /// Render the complete document.
    pub fn finish(&self) -> String {
        let mut svg = String::with_capacity(self.body.len() + 200);
        svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
            w = self.width,
            h = self.height
        );
        svg.push_str(&self.body);
        svg.push_str("</svg>\n");
        svg
    }

    /// Write the rendered document to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.finish())?;
        Ok(())
    }
}

fn format_points(points: &[(f64, f64)]) -> String {
    let mut out = String::with_capacity(points.len() * 16);
    for (i, (x, y)) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{x:.2},{y:.2}");
    }
    out
}

/// Linear map from a data interval onto a pixel interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl Scale {
    /// A degenerate domain is widened around its value.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        let (lo, hi) = domain;
        let domain = if (hi - lo).abs() < 1e-12 {
            let pad = if lo.abs() > 1e-12 { lo.abs() * 0.05 } else { 1.0 };
            (lo - pad, hi + pad)
        } else {
            (lo, hi)
        };
        Self { domain, range }
    }

    /// Domain covering `values` with `margin` (a fraction of the span) on each side.
    pub fn padded<'a>(values: impl IntoIterator<Item = &'a f64>, margin: f64, range: (f64, f64)) -> Self {
        let (lo, hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if !lo.is_finite() {
            return Self::new((0.0, 1.0), range);
        }
        let pad = (hi - lo) * margin;
        Self::new((lo - pad, hi + pad), range)
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn map(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }

    /// `count` evenly spaced values across the domain, ends included.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (d0, d1) = self.domain;
        if count < 2 {
            return vec![d0];
        }
        (0..count)
            .map(|i| d0 + (d1 - d0) * i as f64 / (count - 1) as f64)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn document_structure() {
        let mut doc = SvgDocument::new(200.0, 100.0);
        doc.line(0.0, 0.0, 10.0, 10.0, Stroke::dashed("#000", 1.0));
        doc.text(5.0, 5.0, "A & B", 12.0, Anchor::Middle);
        let svg = doc.finish();

        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"200\""));
        assert!(svg.contains("stroke-dasharray=\"6,4\""));
        assert!(svg.contains("A &amp; B"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn polyline_skips_non_finite_points() {
        let mut doc = SvgDocument::new(10.0, 10.0);
        doc.polyline(&[(0.0, 0.0), (1.0, f64::NAN), (2.0, 2.0)], Stroke::solid("red", 1.0));
        let svg = doc.finish();
        assert!(svg.contains("points=\"0.00,0.00 2.00,2.00\""));

        let mut empty = SvgDocument::new(10.0, 10.0);
        empty.polyline(&[(0.0, 0.0)], Stroke::solid("red", 1.0));
        assert!(!empty.finish().contains("polyline"));
    }

    #[test]
    fn escape_markup() {
        assert_eq!(escape("<a href='x'>\"q\"</a>"), "&lt;a href=&apos;x&apos;&gt;&quot;q&quot;&lt;/a&gt;");
    }

    #[test]
    fn scale_maps_and_inverts_axis() {
        let s = Scale::new((0.0, 10.0), (300.0, 100.0));
        assert_relative_eq!(s.map(0.0), 300.0);
        assert_relative_eq!(s.map(5.0), 200.0);
        assert_relative_eq!(s.map(10.0), 100.0);
        assert_eq!(s.ticks(3), vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn degenerate_domain_is_widened() {
        let s = Scale::new((4.0, 4.0), (0.0, 100.0));
        let (lo, hi) = s.domain();
        assert!(lo < 4.0 && hi > 4.0);
        assert!(s.map(4.0).is_finite());

        let p = Scale::padded(&[1.0, f64::NAN, 3.0], 0.5, (0.0, 1.0));
        assert_eq!(p.domain(), (0.0, 4.0));
    }
}
