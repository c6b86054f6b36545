//! SVG chart rendering: mid price and NAV over the backtest run.

use crate::domain::backtest::EquityPoint;
use crate::domain::candle::PriceBar;

const WIDTH: f64 = 800.0;
const PANEL_HEIGHT: f64 = 220.0;
const PADDING: f64 = 40.0;

fn polyline_points(values: &[f64], y_offset: f64) -> String {
    if values.is_empty() {
        return String::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = PANEL_HEIGHT - 2.0 * PADDING;

    let range = max - min;
    let scale_y = if range > 0.0 { plot_height / range } else { 0.0 };
    let scale_x = if values.len() > 1 {
        plot_width / (values.len() - 1) as f64
    } else {
        0.0
    };

    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let x = PADDING + i as f64 * scale_x;
            let y = y_offset + PANEL_HEIGHT - PADDING - (v - min) * scale_y;
            format!("{:.1},{:.1}", x, y)
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn panel(label: &str, values: &[f64], y_offset: f64, stroke: &str) -> String {
    let axis_y = y_offset + PANEL_HEIGHT - PADDING;
    let mut out = format!(
        r#"  <text x="{:.0}" y="{:.0}" font-size="13" font-family="sans-serif">{}</text>
  <line x1="{:.0}" y1="{:.0}" x2="{:.0}" y2="{:.0}" stroke="black" stroke-width="1"/>
  <line x1="{:.0}" y1="{:.0}" x2="{:.0}" y2="{:.0}" stroke="black" stroke-width="1"/>
"#,
        PADDING,
        y_offset + PADDING - 12.0,
        label,
        PADDING,
        y_offset + PADDING,
        PADDING,
        axis_y,
        PADDING,
        axis_y,
        WIDTH - PADDING,
        axis_y,
    );

    let points = polyline_points(values, y_offset);
    if !points.is_empty() {
        out.push_str(&format!(
            r#"  <polyline fill="none" stroke="{}" stroke-width="1.5" points="{}"/>
"#,
            stroke, points
        ));
    }
    out
}

/// Render the price path and equity curve as a standalone SVG document.
pub fn render_backtest_chart(instrument: &str, bars: &[PriceBar], equity: &[EquityPoint]) -> String {
    let mids: Vec<f64> = bars.iter().map(|b| b.mid).collect();
    let navs: Vec<f64> = equity.iter().map(|p| p.nav).collect();

    let height = 2.0 * PANEL_HEIGHT;
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}">
  <rect width="{:.0}" height="{:.0}" fill="white"/>
"#,
        WIDTH, height, WIDTH, height, WIDTH, height,
    );

    svg.push_str(&panel(
        &format!("{} mid price", instrument),
        &mids,
        0.0,
        "steelblue",
    ));
    svg.push_str(&panel("Net asset value", &navs, PANEL_HEIGHT, "darkorange"));
    svg.push_str("</svg>\n");
    svg
}
