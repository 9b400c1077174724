//! CSV export of the filtered records and SVG rendering of the chart data.

use crate::engine::{BarPoint, ChartData, ManagerSeries, ScatterPoint};
use crate::format::{data_type_label, format_chart_value, format_percent, quarter_label};
use crate::i18n::I18n;
use crate::types::{AssetClass, DataType, Record};
use crate::Result;
use chrono::Local;
use std::io::Write;

const WIDTH: i32 = 720;
const HEIGHT: i32 = 360;
const PADDING: f64 = 48.0;

const COLORS: [&str; 10] = [
    "#007aff", "#34c759", "#ff9500", "#ff3b30", "#af52de", "#00c7be", "#ffcc00", "#5ac8fa",
    "#ff6b6b", "#4cd964",
];

/// Localised CSV headers: date, manager, value, type.
pub fn csv_headers(i18n: &I18n) -> [String; 4] {
    [
        i18n.t("column.date"),
        i18n.t("column.manager"),
        i18n.t("column.value"),
        i18n.t("column.data_type"),
    ]
}

/// Write records as CSV, one row per record in the given order.
///
/// Dates are written as quarter labels and values with 4 decimals. Returns
/// the number of data rows written.
pub fn write_csv<W: Write>(
    writer: W,
    records: &[Record],
    data_type: DataType,
    asset_class: AssetClass,
    i18n: &I18n,
) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(csv_headers(i18n))?;

    let label = data_type_label(data_type, asset_class, i18n);
    for record in records {
        csv_writer.write_record([
            quarter_label(&record.date),
            record.manager.clone(),
            format!("{:.4}", record.value),
            label.clone(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(records.len())
}

/// Default export file name, e.g. `pension_analysis_2025-07-01.csv`.
pub fn default_file_name(i18n: &I18n, extension: &str) -> String {
    format!(
        "{}_{}.{}",
        i18n.t("export.file_prefix"),
        Local::now().format("%Y-%m-%d"),
        extension
    )
}

/// Render chart data as a standalone SVG document. Empty data renders as an
/// empty string.
pub fn render_svg(chart: &ChartData, data_type: DataType, i18n: &I18n) -> String {
    if chart.is_empty() {
        return String::new();
    }

    match chart {
        ChartData::ReturnTrend { labels, series } => {
            let mut svg = svg_header(WIDTH, HEIGHT);
            draw_line_chart(
                &mut svg,
                labels,
                series,
                &i18n.t("chart.return_trend"),
                DataType::Return,
                i18n,
            );
            svg.push_str(svg_footer());
            svg
        }
        ChartData::LevelTrend { labels, series } => {
            let mut svg = svg_header(WIDTH, HEIGHT);
            let title = data_type_label(data_type, AssetClass::default(), i18n);
            draw_line_chart(&mut svg, labels, series, &title, data_type, i18n);
            svg.push_str(svg_footer());
            svg
        }
        ChartData::CrossSection {
            end_date,
            bars,
            scatter,
        } => {
            let total_height = if scatter.is_empty() {
                HEIGHT
            } else {
                HEIGHT * 2
            };
            let mut svg = svg_header(WIDTH, total_height);
            let date = end_date.as_deref().map(quarter_label).unwrap_or_default();
            let title = i18n.format("chart.cross_section", &[("date", &date)]);
            draw_bar_chart(&mut svg, bars, &title, data_type, i18n);

            if !scatter.is_empty() {
                svg.push_str(&format!(r#"<g transform="translate(0,{HEIGHT})">"#));
                draw_scatter_chart(&mut svg, scatter, i18n);
                svg.push_str("</g>");
            }
            svg.push_str(svg_footer());
            svg
        }
    }
}

fn svg_header(width: i32, height: i32) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><style>text{{font-family:Arial,sans-serif;font-size:10px;fill:#666}}</style><rect width="{w}" height="{h}" fill="#ffffff" />"##,
        w = width,
        h = height
    )
}

fn svg_footer() -> &'static str {
    "</svg>"
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn color(idx: usize) -> &'static str {
    COLORS[idx % COLORS.len()]
}

/// Finite min/max of the values, widened to include zero when asked.
fn extent(values: impl Iterator<Item = f64>, include_zero: bool) -> Option<(f64, f64)> {
    let mut bounds: Option<(f64, f64)> = include_zero.then_some((0.0, 0.0));
    for value in values.filter(|v| v.is_finite()) {
        bounds = Some(match bounds {
            Some((min_v, max_v)) => (min_v.min(value), max_v.max(value)),
            None => (value, value),
        });
    }
    bounds
}

fn scale(value: f64, min_v: f64, max_v: f64, lo: f64, hi: f64) -> f64 {
    if (max_v - min_v).abs() < f64::EPSILON {
        return (lo + hi) / 2.0;
    }
    lo + (value - min_v) / (max_v - min_v) * (hi - lo)
}

fn x_positions(len: usize, width: f64) -> Vec<f64> {
    match len {
        0 => Vec::new(),
        1 => vec![width / 2.0],
        _ => {
            let step = (width - 2.0 * PADDING) / (len - 1) as f64;
            (0..len).map(|i| PADDING + step * i as f64).collect()
        }
    }
}

fn draw_title(svg: &mut String, title: &str) {
    svg.push_str(&format!(
        r##"<text x="{x}" y="20" text-anchor="middle" font-size="14" fill="#1d1d1f">{title}</text>"##,
        x = WIDTH / 2,
        title = escape_xml(title)
    ));
}

fn draw_y_axis(svg: &mut String, min_v: f64, max_v: f64, data_type: DataType, i18n: &I18n) {
    let height = HEIGHT as f64;
    let left = PADDING;
    svg.push_str(&format!(
        r##"<line x1="{left:.2}" y1="{top:.2}" x2="{left:.2}" y2="{bottom:.2}" stroke="#d1d1d6" />"##,
        top = PADDING,
        bottom = height - PADDING
    ));
    for (value, y) in [(max_v, PADDING), (min_v, height - PADDING)] {
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end">{label}</text>"#,
            x = left - 4.0,
            y = y + 3.0,
            label = escape_xml(&format_chart_value(value, data_type, i18n))
        ));
    }
}

fn draw_legend(svg: &mut String, names: &[&str]) {
    let mut y = PADDING + 10.0;
    let x = WIDTH as f64 - PADDING - 120.0;
    for (idx, name) in names.iter().enumerate() {
        svg.push_str(&format!(
            r#"<line x1="{x:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{color}" stroke-width="2.5" />"#,
            x2 = x + 20.0,
            y = y - 4.0,
            color = color(idx)
        ));
        svg.push_str(&format!(
            r##"<text x="{x:.2}" y="{y:.2}" text-anchor="start" fill="#333">{label}</text>"##,
            x = x + 26.0,
            label = escape_xml(name)
        ));
        y += 16.0;
    }
}

fn draw_line_chart(
    svg: &mut String,
    labels: &[String],
    series: &[ManagerSeries],
    title: &str,
    data_type: DataType,
    i18n: &I18n,
) {
    let width = WIDTH as f64;
    let height = HEIGHT as f64;
    draw_title(svg, title);

    let values = series.iter().flat_map(|s| s.points.iter().map(|p| p.value));
    let Some((min_v, max_v)) = extent(values, data_type.is_return()) else {
        return;
    };
    draw_y_axis(svg, min_v, max_v, data_type, i18n);

    let xs = x_positions(labels.len(), width);
    for (label, x) in labels.iter().zip(&xs) {
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            y = height - PADDING + 16.0,
            label = escape_xml(label)
        ));
    }

    for (idx, manager_series) in series.iter().enumerate() {
        let points: Vec<String> = manager_series
            .points
            .iter()
            .zip(&xs)
            .filter(|(p, _)| p.value.is_finite())
            .map(|(p, x)| {
                let y = scale(p.value, min_v, max_v, height - PADDING, PADDING);
                format!("{x:.2},{y:.2}")
            })
            .collect();
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{color}" stroke-width="2.5" points="{points}" />"#,
            color = color(idx),
            points = points.join(" ")
        ));
    }

    let names: Vec<&str> = series.iter().map(|s| s.manager.as_str()).collect();
    draw_legend(svg, &names);
}

fn draw_bar_chart(
    svg: &mut String,
    bars: &[BarPoint],
    title: &str,
    data_type: DataType,
    i18n: &I18n,
) {
    let width = WIDTH as f64;
    let height = HEIGHT as f64;
    draw_title(svg, title);

    let Some((min_v, max_v)) = extent(bars.iter().map(|b| b.value), true) else {
        return;
    };
    draw_y_axis(svg, min_v, max_v, data_type, i18n);

    let zero = scale(0.0, min_v, max_v, height - PADDING, PADDING);
    let slot = (width - 2.0 * PADDING) / bars.len().max(1) as f64;
    let bar_width = slot * 0.7;

    for (idx, bar) in bars.iter().enumerate() {
        let x_center = PADDING + slot * (idx as f64 + 0.5);
        let y = scale(bar.value, min_v, max_v, height - PADDING, PADDING);
        let (top, bottom) = if y < zero { (y, zero) } else { (zero, y) };
        svg.push_str(&format!(
            r#"<rect x="{x:.2}" y="{top:.2}" width="{w:.2}" height="{h:.2}" fill="{color}" fill-opacity="0.4" stroke="{color}" stroke-width="1.5" rx="6" />"#,
            x = x_center - bar_width / 2.0,
            w = bar_width,
            h = bottom - top,
            color = color(idx)
        ));
        svg.push_str(&format!(
            r#"<text x="{x_center:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            y = height - PADDING + 16.0,
            label = escape_xml(&bar.manager)
        ));
    }
}

fn draw_scatter_chart(svg: &mut String, points: &[ScatterPoint], i18n: &I18n) {
    let width = WIDTH as f64;
    let height = HEIGHT as f64;
    draw_title(svg, &i18n.t("chart.scatter_title"));

    let Some((min_x, max_x)) = extent(points.iter().map(|p| p.max_drawdown_pct), true) else {
        return;
    };
    let Some((min_y, max_y)) = extent(points.iter().map(|p| p.cumulative_return_pct), true) else {
        return;
    };
    draw_y_axis(svg, min_y, max_y, DataType::Return, i18n);

    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
        x = width / 2.0,
        y = height - 8.0,
        label = escape_xml(&format!(
            "{} [{}, {}]",
            i18n.t("chart.scatter_x"),
            format_percent(min_x, 2),
            format_percent(max_x, 2)
        ))
    ));
    svg.push_str(&format!(
        r#"<text x="12" y="{y:.2}" transform="rotate(-90 12 {y:.2})" text-anchor="middle">{label}</text>"#,
        y = height / 2.0,
        label = escape_xml(&i18n.t("chart.scatter_y"))
    ));

    for (idx, point) in points.iter().enumerate() {
        if !point.max_drawdown_pct.is_finite() || !point.cumulative_return_pct.is_finite() {
            continue;
        }
        let x = scale(point.max_drawdown_pct, min_x, max_x, PADDING, width - PADDING);
        let y = scale(point.cumulative_return_pct, min_y, max_y, height - PADDING, PADDING);
        svg.push_str(&format!(
            r#"<circle cx="{x:.2}" cy="{y:.2}" r="6" fill="{color}" fill-opacity="0.5" stroke="{color}"><title>{label}</title></circle>"#,
            color = color(idx),
            label = escape_xml(&point.manager)
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="start">{label}</text>"#,
            x = x + 8.0,
            y = y + 3.0,
            label = escape_xml(&point.manager)
        ));
    }
}
