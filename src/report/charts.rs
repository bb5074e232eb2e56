//! Diagnostic charts rendered as SVG documents.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::evaluation::{ClassificationMetrics, ConfusionMatrix, RocCurve};
use crate::features::autocorrelation::{max_acf_lags, max_pacf_lags, Correlogram};
use crate::report::svg::{Anchor, Scale, Stroke, SvgDocument};

pub const ACTUAL_COLOR: &str = "#1f77b4";
pub const SARIMA_COLOR: &str = "#ff7f0e";
pub const LSTM_COLOR: &str = "#2ca02c";
pub const ENSEMBLE_COLOR: &str = "#d62728";

const AXIS_COLOR: &str = "#444444";
const GRID_COLOR: &str = "#e5e5e5";
const BAND_COLOR: &str = "#1f77b4";

/// Plotting area inside a document, in pixels.
#[derive(Debug, Clone, Copy)]
struct Frame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn x_scale(&self, domain: (f64, f64)) -> Scale {
        Scale::new(domain, (self.left, self.right()))
    }

    fn y_scale(&self, domain: (f64, f64)) -> Scale {
        Scale::new(domain, (self.bottom(), self.top))
    }

    /// Border, horizontal grid lines and y tick labels.
    fn draw_y_axis(&self, doc: &mut SvgDocument, y: &Scale, ticks: usize, decimals: usize) {
        for value in y.ticks(ticks) {
            let py = y.map(value);
            doc.line(self.left, py, self.right(), py, Stroke::solid(GRID_COLOR, 1.0));
            doc.text(
                self.left - 6.0,
                py + 4.0,
                &format!("{value:.decimals$}"),
                11.0,
                Anchor::End,
            );
        }
        doc.rect(
            self.left,
            self.top,
            self.width,
            self.height,
            "none",
            Some(Stroke::solid(AXIS_COLOR, 1.0)),
        );
    }

    fn draw_titles(&self, doc: &mut SvgDocument, title: &str, x_title: &str, y_title: &str) {
        doc.bold_text(
            self.left + self.width / 2.0,
            self.top - 14.0,
            title,
            15.0,
            Anchor::Middle,
        );
        doc.text(
            self.left + self.width / 2.0,
            self.bottom() + 40.0,
            x_title,
            12.0,
            Anchor::Middle,
        );
        doc.vertical_text(self.left - 58.0, self.top + self.height / 2.0, y_title, 12.0);
    }
}

/// One line of [`forecast_comparison`], one value per date.
#[derive(Debug, Clone, Copy)]
pub struct LineSeries<'a> {
    pub label: &'a str,
    pub dates: &'a [DateTime<Utc>],
    pub values: &'a [f64],
    pub color: &'a str,
    pub dashed: bool,
}

/// Legend entries stacked in the top-right corner of `frame`.
fn draw_legend(doc: &mut SvgDocument, frame: &Frame, entries: &[(&str, &str, bool)]) {
    let width = 150.0;
    let x = frame.right() - width - 10.0;
    let y = frame.top + 10.0;
    doc.rect(
        x,
        y,
        width,
        8.0 + 18.0 * entries.len() as f64,
        "#ffffff",
        Some(Stroke::solid("#cccccc", 1.0)),
    );
    for (i, (label, color, dashed)) in entries.iter().enumerate() {
        let ly = y + 16.0 + 18.0 * i as f64;
        let stroke = if *dashed {
            Stroke::dashed(color, 2.0)
        } else {
            Stroke::solid(color, 2.0)
        };
        doc.line(x + 8.0, ly - 4.0, x + 34.0, ly - 4.0, stroke);
        doc.text(x + 40.0, ly, label, 11.0, Anchor::Start);
    }
}

/// Lines positioned by timestamp, so the actual history and the forecasts
/// share one time axis and gaps between dates stay visible.
pub fn forecast_comparison(lines: &[LineSeries]) -> SvgDocument {
    let mut doc = SvgDocument::new(1000.0, 500.0);
    let frame = Frame {
        left: 90.0,
        top: 50.0,
        width: 870.0,
        height: 370.0,
    };

    let (first, last) = lines
        .iter()
        .flat_map(|l| l.dates.iter())
        .fold((i64::MAX, i64::MIN), |(lo, hi), d| {
            (lo.min(d.timestamp()), hi.max(d.timestamp()))
        });
    let x_domain = if first <= last {
        (first as f64, last as f64)
    } else {
        (0.0, 1.0)
    };
    let x = frame.x_scale(x_domain);
    let y = frame.y_scale(
        Scale::padded(lines.iter().flat_map(|l| l.values.iter()), 0.05, (0.0, 1.0)).domain(),
    );

    frame.draw_y_axis(&mut doc, &y, 6, 0);
    if first <= last {
        for seconds in x.ticks(6) {
            let px = x.map(seconds);
            doc.line(px, frame.bottom(), px, frame.bottom() + 5.0, Stroke::solid(AXIS_COLOR, 1.0));
            if let Some(date) = DateTime::from_timestamp(seconds.round() as i64, 0) {
                doc.text(
                    px,
                    frame.bottom() + 20.0,
                    &date.format("%Y-%m-%d").to_string(),
                    11.0,
                    Anchor::Middle,
                );
            }
        }
    }

    for line in lines {
        let points: Vec<(f64, f64)> = line
            .dates
            .iter()
            .zip(line.values)
            .map(|(d, v)| (x.map(d.timestamp() as f64), y.map(*v)))
            .collect();
        let stroke = if line.dashed {
            Stroke::dashed(line.color, 2.0)
        } else {
            Stroke::solid(line.color, 2.0)
        };
        doc.polyline(&points, stroke);
    }

    frame.draw_titles(&mut doc, "Sales Forecast Comparison", "Date", "Sales");
    let entries: Vec<(&str, &str, bool)> =
        lines.iter().map(|l| (l.label, l.color, l.dashed)).collect();
    draw_legend(&mut doc, &frame, &entries);
    doc
}

/// Bar chart of accuracy, precision, recall and F1 with value labels.
pub fn classification_metrics(metrics: &ClassificationMetrics) -> SvgDocument {
    let mut doc = SvgDocument::new(800.0, 500.0);
    let frame = Frame {
        left: 80.0,
        top: 50.0,
        width: 680.0,
        height: 380.0,
    };
    let y = frame.y_scale((0.0, 1.1));
    frame.draw_y_axis(&mut doc, &y, 12, 1);

    let colors = ["#4c72b0", "#55a868", "#c44e52", "#8172b2"];
    let named = metrics.named();
    let slot = frame.width / named.len() as f64;
    let bar = slot * 0.6;
    for (i, (&(name, value), color)) in named.iter().zip(colors).enumerate() {
        let x = frame.left + slot * i as f64 + (slot - bar) / 2.0;
        let top = y.map(value.clamp(0.0, 1.1));
        doc.rect(x, top, bar, frame.bottom() - top, color, None);
        doc.text(x + bar / 2.0, top - 6.0, &format!("{value:.3}"), 12.0, Anchor::Middle);
        doc.text(x + bar / 2.0, frame.bottom() + 20.0, name, 12.0, Anchor::Middle);
    }

    frame.draw_titles(&mut doc, "Classification Metrics", "Metric", "Score");
    doc
}

/// Stems with a shaded confidence band around zero.
fn draw_correlogram(doc: &mut SvgDocument, frame: &Frame, correlogram: &Correlogram, title: &str) {
    let max_lag = correlogram.max_lag().max(1) as f64;
    let x = frame.x_scale((-0.5, max_lag + 0.5));
    let y = frame.y_scale((-1.1, 1.1));
    frame.draw_y_axis(doc, &y, 5, 1);
    doc.line(frame.left, y.map(0.0), frame.right(), y.map(0.0), Stroke::solid(AXIS_COLOR, 1.0));

    // band from lag 1 onwards; lag 0 has zero width
    let lags: Vec<usize> = (1..correlogram.values.len()).collect();
    if !lags.is_empty() {
        let mut polygon: Vec<(f64, f64)> = lags
            .iter()
            .map(|&k| (x.map(k as f64), y.map(correlogram.band[k])))
            .collect();
        polygon.extend(
            lags.iter()
                .rev()
                .map(|&k| (x.map(k as f64), y.map(-correlogram.band[k]))),
        );
        doc.polygon(&polygon, BAND_COLOR, 0.18);
    }

    for (k, value) in correlogram.values.iter().enumerate() {
        let px = x.map(k as f64);
        doc.line(px, y.map(0.0), px, y.map(*value), Stroke::solid(ACTUAL_COLOR, 1.5));
        doc.circle(px, y.map(*value), 3.0, ACTUAL_COLOR);
    }

    let step = (correlogram.max_lag() / 6).max(1);
    for k in (0..=correlogram.max_lag()).step_by(step) {
        doc.text(x.map(k as f64), frame.bottom() + 18.0, &k.to_string(), 11.0, Anchor::Middle);
    }
    frame.draw_titles(doc, title, "Lag", "Correlation");
}

/// ACF of forecast residuals, lags clamped to `len - 1`.
pub fn residual_acf(residuals: &[f64], lags: usize, level: f64) -> Result<SvgDocument> {
    let nlags = lags.min(max_acf_lags(residuals.len()));
    let correlogram = Correlogram::acf(residuals, nlags, level)?;

    let mut doc = SvgDocument::new(900.0, 450.0);
    let frame = Frame {
        left: 90.0,
        top: 50.0,
        width: 770.0,
        height: 320.0,
    };
    draw_correlogram(&mut doc, &frame, &correlogram, "ACF of Ensemble Residuals");
    Ok(doc)
}

/// ACF and PACF of the training series side by side.
///
/// ACF lags are clamped to `len - 1` and PACF lags to `len / 2 - 1`.
pub fn train_acf_pacf(train: &[f64], lags: usize, level: f64) -> Result<SvgDocument> {
    let acf = Correlogram::acf(train, lags.min(max_acf_lags(train.len())), level)?;
    let pacf = Correlogram::pacf(train, lags.min(max_pacf_lags(train.len())), level)?;

    let mut doc = SvgDocument::new(1400.0, 450.0);
    let left = Frame {
        left: 90.0,
        top: 50.0,
        width: 560.0,
        height: 320.0,
    };
    let right = Frame {
        left: 790.0,
        ..left
    };
    draw_correlogram(&mut doc, &left, &acf, "ACF of Training Series");
    draw_correlogram(&mut doc, &right, &pacf, "PACF of Training Series");
    Ok(doc)
}

/// 2x2 heatmap of the confusion matrix with counts in each cell.
pub fn confusion_matrix(confusion: &ConfusionMatrix) -> SvgDocument {
    let mut doc = SvgDocument::new(560.0, 500.0);
    let frame = Frame {
        left: 140.0,
        top: 60.0,
        width: 340.0,
        height: 340.0,
    };
    let rows = confusion.as_rows();
    let max = rows.iter().flatten().copied().max().unwrap_or(0).max(1) as f64;
    let cell = frame.width / 2.0;
    let names = ["Low", "High"];

    for (r, row) in rows.iter().enumerate() {
        for (c, &count) in row.iter().enumerate() {
            let intensity = count as f64 / max;
            // white to dark blue
            let shade = |lo: f64, hi: f64| (lo + (hi - lo) * intensity).round() as u8;
            let fill = format!(
                "#{:02x}{:02x}{:02x}",
                shade(247.0, 8.0),
                shade(251.0, 48.0),
                shade(255.0, 107.0)
            );
            let x = frame.left + cell * c as f64;
            let y = frame.top + cell * r as f64;
            doc.rect(x, y, cell, cell, &fill, Some(Stroke::solid("#ffffff", 2.0)));
            let color = if intensity > 0.5 { "#ffffff" } else { "#222222" };
            doc.styled_text(
                x + cell / 2.0,
                y + cell / 2.0 + 8.0,
                &count.to_string(),
                24.0,
                Anchor::Middle,
                "bold",
                color,
            );
        }
        doc.text(
            frame.left - 10.0,
            frame.top + cell * r as f64 + cell / 2.0 + 4.0,
            names[r],
            13.0,
            Anchor::End,
        );
        doc.text(
            frame.left + cell * r as f64 + cell / 2.0,
            frame.bottom() + 22.0,
            names[r],
            13.0,
            Anchor::Middle,
        );
    }

    doc.bold_text(
        frame.left + frame.width / 2.0,
        frame.top - 20.0,
        "Confusion Matrix",
        15.0,
        Anchor::Middle,
    );
    doc.text(
        frame.left + frame.width / 2.0,
        frame.bottom() + 50.0,
        "Predicted",
        12.0,
        Anchor::Middle,
    );
    doc.vertical_text(frame.left - 70.0, frame.top + frame.height / 2.0, "Actual", 12.0);
    doc
}

/// ROC curve with the chance diagonal and the AUC in the legend.
pub fn roc_curve(roc: &RocCurve) -> SvgDocument {
    let mut doc = SvgDocument::new(640.0, 600.0);
    let frame = Frame {
        left: 90.0,
        top: 50.0,
        width: 500.0,
        height: 470.0,
    };
    let x = frame.x_scale((0.0, 1.0));
    let y = frame.y_scale((0.0, 1.05));
    frame.draw_y_axis(&mut doc, &y, 8, 2);
    for value in x.ticks(6) {
        doc.text(x.map(value), frame.bottom() + 18.0, &format!("{value:.1}"), 11.0, Anchor::Middle);
    }

    doc.line(
        x.map(0.0),
        y.map(0.0),
        x.map(1.0),
        y.map(1.0),
        Stroke::dashed("#888888", 1.5),
    );
    let points: Vec<(f64, f64)> = roc
        .fpr
        .iter()
        .zip(&roc.tpr)
        .map(|(f, t)| (x.map(*f), y.map(*t)))
        .collect();
    doc.polyline(&points, Stroke::solid(ENSEMBLE_COLOR, 2.5));

    frame.draw_titles(
        &mut doc,
        "Receiver Operating Characteristic",
        "False Positive Rate",
        "True Positive Rate",
    );
    let legend = format!("ROC (AUC = {:.3})", roc.auc());
    let entries = [(legend.as_str(), ENSEMBLE_COLOR, false), ("Chance", "#888888", true)];
    let corner = Frame {
        top: frame.bottom() - 60.0,
        ..frame
    };
    draw_legend(&mut doc, &corner, &entries);
    doc
}
