//! Report rendering for each `--format`.

use ht_common::{OutputFormat, Result};

use super::SweepReport;

/// Options for the ASCII significance chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotOptions {
    pub width: usize,
    pub height: usize,
    /// Logarithmic alpha axis.
    pub log_scale: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            width: 60,
            height: 16,
            log_scale: false,
        }
    }
}

/// Render `report` in the requested format.
pub fn render_report(
    report: &SweepReport,
    format: OutputFormat,
    plot: &PlotOptions,
) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(report),
        OutputFormat::Summary => Ok(render_summary(report)),
        OutputFormat::Md => Ok(render_markdown(report)),
        OutputFormat::Csv => Ok(render_csv(report)),
        OutputFormat::Plot => Ok(render_plot(report, plot)),
    }
}

/// Pretty-printed JSON report.
pub fn render_json(report: &SweepReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// One-line summary.
pub fn render_summary(report: &SweepReport) -> String {
    let (first, last) = match (report.points.first(), report.points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return format!(
                "[{}] {}: no curve points (mpe={})",
                report.run_id, report.title, report.params.mpe
            )
        }
    };
    let sigma = match report.sigma_crossings.last() {
        Some(c) => format!("{}σ reached at M={}", c.sigma, c.m),
        None => "1σ not reached".to_string(),
    };
    format!(
        "[{}] {}: {} points, M={}..{}, alpha {:.4} -> {:.4}, {}",
        report.run_id,
        report.title,
        report.points.len(),
        first.m,
        last.m,
        first.alpha,
        last.alpha,
        sigma
    )
}

/// Markdown document with parameters, curve and sigma crossings.
pub fn render_markdown(report: &SweepReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", report.title));

    out.push_str("| Parameter | Value |\n|---|---|\n");
    out.push_str(&format!("| Experiments per test | {} |\n", report.params.n_exp));
    out.push_str(&format!(
        "| Max measurements per experiment | {} |\n",
        report.params.mpe
    ));
    out.push_str(&format!("| Step | {} |\n", report.params.step));
    out.push_str(&format!(
        "| Rates | {}, {} |\n",
        report.rates[0], report.rates[1]
    ));
    for input in &report.inputs {
        out.push_str(&format!(
            "| H{} input | `{}` |\n",
            input.hypothesis, input.source
        ));
    }
    out.push_str(&format!("| Run | `{}` |\n\n", report.run_id));

    out.push_str("## Significance curve\n\n");
    if report.points.is_empty() {
        out.push_str("_No curve points: mpe must be greater than 1._\n");
    } else {
        out.push_str("| M | M (thousands) | alpha |\n|---:|---:|---:|\n");
        for point in &report.points {
            out.push_str(&format!(
                "| {} | {:.3} | {:.6} |\n",
                point.m,
                point.m_thousands(),
                point.alpha
            ));
        }
    }

    if !report.sigma_crossings.is_empty() {
        out.push_str("\n## Sigma crossings\n\n");
        out.push_str("| σ | Level | M | alpha |\n|---:|---:|---:|---:|\n");
        for c in &report.sigma_crossings {
            out.push_str(&format!(
                "| {} | {:.3e} | {} | {:.6} |\n",
                c.sigma, c.level, c.m, c.alpha
            ));
        }
    }
    out
}

/// Renderer points as CSV.
pub fn render_csv(report: &SweepReport) -> String {
    let mut out = String::from("m_thousands,alpha\n");
    for (x, alpha) in &report.renderer_points {
        out.push_str(&format!("{},{}\n", x, alpha));
    }
    out
}

/// ASCII chart of alpha against thousands of measurements per experiment.
///
/// Sigma crossings are drawn as vertical `┊` markers and listed under the
/// chart. On the log axis, points with alpha = 0 sit on the bottom row.
pub fn render_plot(report: &SweepReport, options: &PlotOptions) -> String {
    let width = options.width.max(10);
    let height = options.height.max(4);
    let mut output = String::new();

    output.push_str(&format!("{}\n", report.title));
    output.push_str(&"─".repeat(width + 10));
    output.push('\n');

    let points = &report.renderer_points;
    if points.is_empty() {
        output.push_str("(no curve points)\n");
        return output;
    }

    let x_min = points.first().map(|p| p.0).unwrap_or(0.0);
    let x_max = points.last().map(|p| p.0).unwrap_or(x_min);
    let (y_bottom, y_top) = y_range(points, options.log_scale);

    let column = |x: f64| -> usize {
        let col = if x_max > x_min {
            (((x - x_min) / (x_max - x_min)) * (width - 1) as f64).round() as usize
        } else {
            0
        };
        col.min(width - 1)
    };
    let row = |alpha: f64| -> usize {
        let y = if options.log_scale {
            if alpha > 0.0 {
                alpha.log10()
            } else {
                y_bottom
            }
        } else {
            alpha
        };
        let frac = if y_top > y_bottom {
            ((y - y_bottom) / (y_top - y_bottom)).clamp(0.0, 1.0)
        } else {
            0.5
        };
        height - 1 - (frac * (height - 1) as f64).round() as usize
    };

    let mut grid = vec![vec![' '; width]; height];

    for crossing in &report.sigma_crossings {
        let x = column(crossing.m as f64 / 1000.0);
        for line in grid.iter_mut() {
            line[x] = '┊';
        }
    }
    for &(x, alpha) in points {
        grid[row(alpha)][column(x)] = '●';
    }

    for (i, line) in grid.iter().enumerate() {
        let frac = 1.0 - i as f64 / (height - 1) as f64;
        let y = y_bottom + frac * (y_top - y_bottom);
        let label = if options.log_scale {
            format!("{:.1e}", 10f64.powf(y))
        } else {
            format!("{:.3}", y)
        };
        output.push_str(&format!("{:>8} │", label));
        output.extend(line.iter());
        output.push('\n');
    }

    output.push_str(&format!("{:>8} └", ""));
    output.push_str(&"─".repeat(width));
    output.push('\n');
    let left = format!("{:.3}", x_min);
    let right = format!("{:.3}", x_max);
    let gap = width.saturating_sub(left.len() + right.len());
    output.push_str(&format!("{:>10}{}{}{}\n", "", left, " ".repeat(gap), right));
    output.push_str(&format!(
        "{:>10}1000s of Measurements/Experiment; alpha (= beta) on {} axis\n",
        "",
        if options.log_scale { "log" } else { "linear" }
    ));

    for crossing in &report.sigma_crossings {
        output.push_str(&format!(
            "  ┊ alpha = {}σ at M={} (alpha={:.3e})\n",
            crossing.sigma, crossing.m, crossing.alpha
        ));
    }

    output
}

/// `(bottom, top)` of the alpha axis; log10 units when `log_scale`.
fn y_range(points: &[(f64, f64)], log_scale: bool) -> (f64, f64) {
    if log_scale {
        let logs: Vec<f64> = points
            .iter()
            .filter(|p| p.1 > 0.0)
            .map(|p| p.1.log10())
            .collect();
        let top = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let bottom = logs.iter().copied().fold(f64::INFINITY, f64::min);
        if logs.is_empty() {
            (-1.0, 0.0)
        } else if top > bottom {
            (bottom, top)
        } else {
            (bottom - 1.0, top)
        }
    } else {
        let top = points.iter().map(|p| p.1).fold(0.0, f64::max);
        (0.0, if top > 0.0 { top } else { 1.0 })
    }
}
