//! Three-panel position/velocity/acceleration plots.

use std::panic;
use std::path::Path;

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

use crate::font_safe::FontSafeBackend;
use crate::types::{ReferenceLines, TrajectorySeries};
use crate::{ResultsError, ResultsResult};

const FIGURE_SIZE: (u32, u32) = (1200, 1400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotFormat {
    Png,
    Svg,
}

impl PlotFormat {
    /// Format implied by the file extension, if recognised.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => Some(Self::Png),
            Some(ext) if ext.eq_ignore_ascii_case("svg") => Some(Self::Svg),
            _ => None,
        }
    }
}

/// Render position, velocity and acceleration against time, one line per pair.
///
/// The position panel also carries the drag-free fall curve and a horizontal
/// marker where the cord reaches its natural length.
pub fn render_plots(
    path: &Path,
    format: PlotFormat,
    series: &[TrajectorySeries],
    reference: &ReferenceLines,
) -> ResultsResult<()> {
    if series.iter().all(TrajectorySeries::is_empty) {
        return Err(ResultsError::Empty {
            what: "plot series".to_string(),
        });
    }
    let render = || match format {
        PlotFormat::Png => draw_figure(
            FontSafeBackend::new(BitMapBackend::new(path, FIGURE_SIZE)).into_drawing_area(),
            series,
            reference,
        )
        .map_err(|e| ResultsError::Plot(e.to_string())),
        PlotFormat::Svg => draw_figure(
            FontSafeBackend::new(SVGBackend::new(path, FIGURE_SIZE)).into_drawing_area(),
            series,
            reference,
        )
        .map_err(|e| ResultsError::Plot(e.to_string())),
    };
    panic::catch_unwind(panic::AssertUnwindSafe(render))
        .map_err(|_| ResultsError::Plot("plotting backend panicked".to_string()))?
}

type PanelResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

fn draw_figure<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    series: &[TrajectorySeries],
    reference: &ReferenceLines,
) -> PanelResult<DB> {
    root.fill(&WHITE)?;
    let panels = root.split_evenly((3, 1));

    draw_panel(
        &panels[0],
        "Position",
        "z (m)",
        series,
        |s| s.position.as_slice(),
        Some(reference),
    )?;
    draw_panel(
        &panels[1],
        "Velocity",
        "v (m/s)",
        series,
        |s| s.velocity.as_slice(),
        None,
    )?;
    draw_panel(
        &panels[2],
        "Acceleration",
        "a (m/s^2)",
        series,
        |s| s.acceleration.as_slice(),
        None,
    )?;

    root.present()?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    y_desc: &str,
    series: &[TrajectorySeries],
    select: fn(&TrajectorySeries) -> &[f64],
    reference: Option<&ReferenceLines>,
) -> PanelResult<DB> {
    let t_max = series
        .iter()
        .filter_map(|s| s.t.last().copied())
        .fold(0.0, f64::max)
        .max(f64::EPSILON);

    let mut y_values: Vec<f64> = series.iter().flat_map(|s| select(s).iter().copied()).collect();
    if let Some(refs) = reference {
        y_values.extend(refs.free_fall.iter().map(|&(_, z)| z));
        y_values.push(refs.cord_position);
    }
    let (y_min, y_max) = padded_range(&y_values);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..t_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("t (s)")
        .y_desc(y_desc)
        .draw()?;

    if let Some(refs) = reference {
        chart
            .draw_series(LineSeries::new(refs.free_fall.iter().copied(), BLACK.mix(0.5)))?
            .label("free fall")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.mix(0.5)));
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0.0, refs.cord_position), (t_max, refs.cord_position)],
                RED.mix(0.4),
            )))?
            .label("cord natural length")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.mix(0.4)));
    }

    for (i, s) in series.iter().enumerate() {
        let color = Palette99::pick(i).mix(0.9);
        let points = s.t.iter().copied().zip(select(s).iter().copied());
        let drawn = chart.draw_series(LineSeries::new(points, color))?;
        if reference.is_some() {
            drawn
                .label(s.label())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
    }

    if reference.is_some() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

fn padded_range(values: &[f64]) -> (f64, f64) {
    let (mut lo, mut hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    if (hi - lo).abs() < 1e-9 {
        lo -= 1.0;
        hi += 1.0;
    }
    let pad = 0.05 * (hi - lo);
    (lo - pad, hi + pad)
}
