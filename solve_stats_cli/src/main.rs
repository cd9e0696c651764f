use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io::{self, Write};
use std::panic;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};
use plotters::coord::combinators::WithKeyPoints;
use plotters::coord::types::RangedCoordf64;
use serde_json::json;
use solve_stats::{
    analyze, classify_lines, Analysis, LineClass, Params, SeriesPoint, StatsError, YDomain,
    ZoomDirection,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Solve time statistics CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute running mean, Ao5/Ao12 and session stats for a pasted times log
    Analyze(AnalyzeArgs),
    /// Report which lines of a times log were recognised
    Diagnose(DiagnoseArgs),
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    /// Times log to read (`-` for stdin)
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output series CSV path (`-` for stdout)
    #[arg(short, long, default_value = "solves.csv", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Output PNG chart path (defaults next to CSV)
    #[arg(long, value_hint = ValueHint::FilePath)]
    png: Option<PathBuf>,

    /// Output SVG chart path
    #[arg(long, value_hint = ValueHint::FilePath)]
    svg: Option<PathBuf>,

    /// Disable chart generation
    #[arg(long, action = ArgAction::SetTrue)]
    no_plot: bool,

    /// Write the full analysis (series, stats, domain, ticks) as JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    json: Option<PathBuf>,

    /// Display settings JSON (padding_ratio, tick_count, zoom factors)
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Number of y-axis ticks
    #[arg(long)]
    tick_count: Option<usize>,

    /// Fraction of the time range padded above and below the data
    #[arg(long)]
    padding: Option<f64>,

    /// Zoom steps applied to the default y range, in order
    #[arg(long, value_enum)]
    zoom: Vec<ZoomOpt>,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Profile major stages with timings
    #[arg(long, action = ArgAction::SetTrue)]
    profile: bool,
}

#[derive(Parser, Debug)]
struct DiagnoseArgs {
    /// Times log to inspect (`-` for stdin)
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output report path (`-` for stdout)
    #[arg(short, long, default_value = "solve_diagnostics.txt", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ZoomOpt {
    In,
    Out,
}

impl From<ZoomOpt> for ZoomDirection {
    fn from(value: ZoomOpt) -> Self {
        match value {
            ZoomOpt::In => ZoomDirection::In,
            ZoomOpt::Out => ZoomDirection::Out,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Command::Analyze(args) => args.verbose,
        Command::Diagnose(args) => args.verbose,
    };
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Diagnose(args) => handle_diagnose(args),
    }
}

fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let mut params = match args.config.as_ref() {
        Some(path) => load_params(path)?,
        None => Params::default(),
    };
    if let Some(count) = args.tick_count {
        params.tick_count = count;
    }
    if let Some(padding) = args.padding {
        params.padding_ratio = padding;
    }

    let t_parse = Instant::now();
    let text = read_input(&args.input)?;
    let mut analysis = match analyze(&text, &params) {
        Ok(analysis) => analysis,
        Err(StatsError::NoData) => {
            return Err(anyhow!(
                "no solve times found in {} (expected lines like \"1. 12.34\")",
                args.input.display()
            ))
        }
        Err(err) => return Err(err.into()),
    };
    if args.profile || args.verbose {
        info!(
            "Analyze stage: {:.1} ms ({} solves)",
            t_parse.elapsed().as_secs_f64() * 1000.0,
            analysis.records.len()
        );
    }

    for step in &args.zoom {
        analysis.zoom((*step).into(), &params);
        debug!(
            "Zoom {:?}: {:.2}..{:.2}",
            step, analysis.domain.low, analysis.domain.high
        );
    }
    let ticks = analysis.ticks(&params)?;

    info!("Solve statistics:\n{}", analysis.stats);

    if let Some(path) = args.json.as_ref() {
        write_json_report(&analysis, &params, &ticks, path)?;
        info!("Wrote analysis JSON: {}", path.display());
    }

    if args.output.as_os_str() == "-" {
        write_series_stdout(&analysis.series)?;
    } else {
        write_series_csv(&analysis.series, &args.output)?;
        info!("Wrote series CSV: {}", args.output.display());
    }

    if !args.no_plot {
        let mut targets: Vec<(PathBuf, ChartKind)> = Vec::new();
        if let Some(path) = args.png.as_ref() {
            targets.push((path.clone(), ChartKind::Png));
        } else if args.output.as_os_str() != "-" {
            let mut png_path = args.output.clone();
            png_path.set_extension("png");
            targets.push((png_path, ChartKind::Png));
        }
        if let Some(path) = args.svg.as_ref() {
            targets.push((path.clone(), ChartKind::Svg));
        }

        for (path, kind) in targets {
            let t_plot = Instant::now();
            if let Err(err) = render_chart_guard(&analysis, &ticks, &path, kind) {
                warn!("Skipping chart render ({}): {}", path.display(), err);
            } else {
                info!("Wrote chart: {}", path.display());
            }
            if args.profile || args.verbose {
                info!(
                    "Plot stage: {:.1} ms",
                    t_plot.elapsed().as_secs_f64() * 1000.0
                );
            }
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        return io::read_to_string(io::stdin()).context("failed to read stdin");
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_params(path: &Path) -> Result<Params> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let params: Params = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid settings JSON", path.display()))?;
    params.validate()?;
    Ok(params)
}

fn write_json_report(
    analysis: &Analysis,
    params: &Params,
    ticks: &[f64],
    path: &Path,
) -> Result<()> {
    let report = json!({
        "params": params,
        "analysis": analysis,
        "ticks": ticks,
    });
    let text = serde_json::to_string_pretty(&report)?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn write_series_stdout(series: &[SeriesPoint]) -> Result<()> {
    let stdout = io::stdout();
    let handle = stdout.lock();
    let mut writer = csv::Writer::from_writer(handle);
    write_series_rows(series, &mut writer)
}

fn write_series_csv(series: &[SeriesPoint], path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    write_series_rows(series, &mut writer)
}

fn write_series_rows<W: Write>(series: &[SeriesPoint], writer: &mut csv::Writer<W>) -> Result<()> {
    writer.write_record(["solve", "time_s", "mean_s", "ao5_s", "ao12_s"])?;
    for point in series {
        writer.write_record([
            point.solve.to_string(),
            point.elapsed_s.to_string(),
            format!("{:.2}", point.running_mean),
            fmt_cell(point.ao5),
            fmt_cell(point.ao12),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn fmt_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

fn handle_diagnose(args: DiagnoseArgs) -> Result<()> {
    let text = read_input(&args.input)?;
    let report = diagnose_report(&args.input, &text);
    if args.output.as_os_str() == "-" {
        io::stdout().write_all(report.as_bytes())?;
    } else {
        fs::write(&args.output, report)
            .with_context(|| format!("failed to write {}", args.output.display()))?;
        info!("Diagnostic report written: {}", args.output.display());
    }
    Ok(())
}

const MAX_LISTED_LINES: usize = 20;

fn diagnose_report(input: &Path, text: &str) -> String {
    let mut lines = 0usize;
    let mut blank = 0usize;
    let mut skipped: Vec<usize> = Vec::new();
    let mut labels: BTreeMap<u64, usize> = BTreeMap::new();
    let mut backwards = 0usize;
    let mut previous: Option<u64> = None;
    let mut times: Vec<f64> = Vec::new();

    for (idx, class) in classify_lines(text).enumerate() {
        lines += 1;
        match class {
            LineClass::Blank => blank += 1,
            LineClass::Skipped => skipped.push(idx + 1),
            LineClass::Solve(record) => {
                *labels.entry(record.solve).or_insert(0) += 1;
                if previous.is_some_and(|prev| record.solve < prev) {
                    backwards += 1;
                }
                previous = Some(record.solve);
                times.push(record.elapsed_s);
            }
        }
    }

    let mut report = String::new();
    report.push_str(&format!("FILE: {}\n", input.display()));
    report.push_str(&format!("  lines: {}\n", lines));
    report.push_str(&format!("  solves: {}\n", times.len()));
    report.push_str(&format!("  blank: {}\n", blank));
    report.push_str(&format!("  skipped: {}\n", skipped.len()));
    if !skipped.is_empty() {
        let listed: Vec<String> = skipped
            .iter()
            .take(MAX_LISTED_LINES)
            .map(|n| n.to_string())
            .collect();
        let more = if skipped.len() > MAX_LISTED_LINES {
            ", ..."
        } else {
            ""
        };
        report.push_str(&format!("  skipped_lines: {}{}\n", listed.join(", "), more));
    }

    let duplicates: Vec<String> = labels
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(label, count)| format!("{} (x{})", label, count))
        .collect();
    if !duplicates.is_empty() {
        report.push_str(&format!("  duplicate_labels: {}\n", duplicates.join(", ")));
    }
    report.push_str(&format!("  labels_out_of_order: {}\n", backwards));

    if !times.is_empty() {
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        report.push_str(&format!("  time_range_s: {:.2}..{:.2}\n", min, max));
    }
    report.push('\n');
    report
}

#[derive(Clone, Copy, Debug)]
enum ChartKind {
    Png,
    Svg,
}

const CHART_SIZE: (u32, u32) = (1280, 760);
const TIME_COLOR: RGBColor = RGBColor(139, 92, 246);
const AO5_COLOR: RGBColor = RGBColor(16, 185, 129);
const AO12_COLOR: RGBColor = RGBColor(245, 158, 11);
const MEAN_COLOR: RGBColor = RGBColor(239, 68, 68);
const REFERENCE_COLOR: RGBColor = RGBColor(75, 85, 99);

fn render_chart_guard(
    analysis: &Analysis,
    ticks: &[f64],
    path: &Path,
    kind: ChartKind,
) -> Result<(), String> {
    let render = || -> Result<(), String> {
        let result = match kind {
            ChartKind::Png => {
                let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
                draw_chart(root, analysis, ticks)
            }
            ChartKind::Svg => {
                let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
                draw_chart(root, analysis, ticks)
            }
        };
        result.map_err(|e| format!("plotting error: {}", e))
    };

    panic::catch_unwind(panic::AssertUnwindSafe(render))
        .map_err(|_| "plotting backend panicked".to_string())?
}

fn x_range(series: &[SeriesPoint]) -> (f64, f64) {
    let min = series.iter().map(|p| p.solve).min().unwrap_or(1) as f64;
    let max = series.iter().map(|p| p.solve).max().unwrap_or(1) as f64;
    if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    }
}

fn y_range(domain: YDomain) -> (f64, f64) {
    if domain.span() > f64::EPSILON {
        (domain.low, domain.high)
    } else {
        ((domain.low - 1.0).max(0.0), domain.high + 1.0)
    }
}

/// Y axis whose labels sit exactly on the generated ticks.
fn tick_axis(y_min: f64, y_max: f64, ticks: &[f64]) -> WithKeyPoints<RangedCoordf64> {
    (y_min..y_max).with_key_points(ticks.to_vec())
}

fn draw_chart<DB>(
    root: DrawingArea<DB, plotters::coord::Shift>,
    analysis: &Analysis,
    ticks: &[f64],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let series = &analysis.series;
    let stats = &analysis.stats;
    let (x_min, x_max) = x_range(series);
    let (y_min, y_max) = y_range(analysis.domain);

    let area = root;
    area.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&area)
        .margin(25)
        .caption(
            "Solve Times Analysis",
            FontDesc::new(FontFamily::SansSerif, 26.0, FontStyle::Normal),
        )
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(x_min..x_max, tick_axis(y_min, y_max, ticks))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(ticks.len())
        .x_desc("Solve Number")
        .y_desc("Time (seconds)")
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.1}", v))
        .label_style(FontDesc::new(FontFamily::SansSerif, 18.0, FontStyle::Normal))
        .draw()?;

    for &tick in ticks {
        chart.draw_series(LineSeries::new(
            [(x_min, tick), (x_max, tick)],
            BLACK.mix(0.08),
        ))?;
    }

    let in_range = |y: f64| y >= y_min && y <= y_max;

    chart
        .draw_series(
            series
                .iter()
                .filter(|p| in_range(p.elapsed_s))
                .map(|p| Circle::new((p.solve as f64, p.elapsed_s), 3, TIME_COLOR.filled())),
        )?
        .label("Solve Time")
        .legend(|(x, y)| Circle::new((x + 15, y), 3, TIME_COLOR.filled()));

    let lines: [(&str, RGBColor, Vec<(f64, f64)>); 3] = [
        (
            "Ao5",
            AO5_COLOR,
            series
                .iter()
                .filter_map(|p| p.ao5.map(|v| (p.solve as f64, v)))
                .collect(),
        ),
        (
            "Ao12",
            AO12_COLOR,
            series
                .iter()
                .filter_map(|p| p.ao12.map(|v| (p.solve as f64, v)))
                .collect(),
        ),
        (
            "Mean",
            MEAN_COLOR,
            series
                .iter()
                .map(|p| (p.solve as f64, p.running_mean))
                .collect(),
        ),
    ];
    for (label, color, points) in lines {
        if points.is_empty() {
            continue;
        }
        let style = ShapeStyle {
            color: color.to_rgba(),
            filled: false,
            stroke_width: 2,
        };
        chart
            .draw_series(LineSeries::new(points, style))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], color));
    }

    let label_font = FontDesc::new(FontFamily::SansSerif, 16.0, FontStyle::Normal);
    for (name, value) in [("Best", stats.best), ("Worst", stats.worst)] {
        if !in_range(value) {
            continue;
        }
        chart.draw_series(LineSeries::new(
            [(x_min, value), (x_max, value)],
            REFERENCE_COLOR.mix(0.6),
        ))?;
        chart.draw_series(std::iter::once(Text::new(
            format!("{}: {:.2}s", name, value),
            (x_min, value),
            label_font.clone().color(&REFERENCE_COLOR),
        )))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.7))
        .border_style(&BLACK.mix(0.3))
        .label_font(FontDesc::new(FontFamily::SansSerif, 16.0, FontStyle::Normal))
        .position(SeriesLabelPosition::LowerRight)
        .draw()?;

    area.present()?;
    Ok(())
}
