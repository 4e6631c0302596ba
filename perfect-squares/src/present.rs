//! Presentation of computed statistics: SVG scatter plots and a text dump.
//!
//! Plots are drawn with [`plotters`]' SVG backend, which needs no system
//! fonts and no display, so rendering works the same on CI as on a desktop.

use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::stats::PerfectSquareInfo;

pub const COUNTS_TITLE: &str = "Number of perfect squares in Z(mod p_n).";
pub const DIFFS_TITLE: &str =
    "Increase in number of perfect squares from Z(mod p_{n-1}) to Z(mod p_n).";
pub const NORMALIZED_DIFFS_TITLE: &str =
    "Normalized increase in number of perfect squares from Z(mod p_{n-1}) to Z(mod p_n).";

const PLOT_SIZE: (u32, u32) = (1200, 800);
const POINT_RADIUS: i32 = 2;

/// Errors that can occur during plot generation.
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("no data points for '{0}'")]
    NoData(String),

    #[error("failed to draw {}: {message}", path.display())]
    Drawing { path: PathBuf, message: String },

    #[error("failed to create plot directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Human-readable dump of the residue set of each prime, one line each:
/// `p: {r1, r2, ...}`.
pub fn render_text(info: &PerfectSquareInfo) -> String {
    info.residue_sets
        .iter()
        .map(|(p, residues)| {
            let items: Vec<String> = residues.iter().map(|r| r.to_string()).collect();
            format!("{}: {{{}}}\n", p, items.join(", "))
        })
        .collect()
}

/// Scatter of residue counts against primes.
pub fn plot_counts(info: &PerfectSquareInfo, path: &Path) -> Result<(), PlotError> {
    scatter_plot(&info.count_points(), COUNTS_TITLE, "count", path)
}

/// Scatter of count differences against primes.
pub fn plot_diffs(info: &PerfectSquareInfo, path: &Path) -> Result<(), PlotError> {
    scatter_plot(&info.diff_points(), DIFFS_TITLE, "difference", path)
}

/// Scatter of gap-normalized count differences against primes.
pub fn plot_normalized_diffs(info: &PerfectSquareInfo, path: &Path) -> Result<(), PlotError> {
    scatter_plot(
        &info.normalized_diff_points(),
        NORMALIZED_DIFFS_TITLE,
        "difference / gap",
        path,
    )
}

/// Write all three plots into `dir`, returning the files written.
///
/// Series with no points (a bound below 3 has no differences) are skipped
/// with a log message rather than failing the whole run.
pub fn render_all(info: &PerfectSquareInfo, dir: &Path) -> Result<Vec<PathBuf>, PlotError> {
    std::fs::create_dir_all(dir).map_err(|source| PlotError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    type PlotFn = fn(&PerfectSquareInfo, &Path) -> Result<(), PlotError>;
    let plots: [(&str, PlotFn); 3] = [
        ("counts", plot_counts),
        ("diffs", plot_diffs),
        ("diffs_normalized", plot_normalized_diffs),
    ];

    let mut written = Vec::new();
    for (name, plot) in plots {
        let path = dir.join(format!("perfect_square_{}_{}.svg", name, info.bound));
        match plot(info, &path) {
            Ok(()) => {
                log::info!("Wrote {}", path.display());
                written.push(path);
            }
            Err(PlotError::NoData(title)) => {
                log::info!("Skipping '{}': nothing to plot for bound {}", title, info.bound);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}

fn scatter_plot(
    data: &[(f64, f64)],
    title: &str,
    y_label: &str,
    path: &Path,
) -> Result<(), PlotError> {
    if data.is_empty() {
        return Err(PlotError::NoData(title.to_string()));
    }
    let drawing = |e: &dyn std::fmt::Display| PlotError::Drawing {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let (x_range, y_range) = padded_ranges(data);

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| drawing(&e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| drawing(&e))?;

    chart
        .configure_mesh()
        .x_desc("p")
        .y_desc(y_label)
        .draw()
        .map_err(|e| drawing(&e))?;

    chart
        .draw_series(
            data.iter()
                .map(|&(x, y)| Circle::new((x, y), POINT_RADIUS, BLUE.filled())),
        )
        .map_err(|e| drawing(&e))?;

    root.present().map_err(|e| drawing(&e))?;
    Ok(())
}

/// Axis ranges covering every point with a small margin. A single point or
/// a flat series still gets a non-degenerate range.
fn padded_ranges(data: &[(f64, f64)]) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in data {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    (pad(x_min, x_max), pad(y_min, y_max))
}

fn pad(min: f64, max: f64) -> std::ops::Range<f64> {
    let margin = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - margin)..(max + margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{perfect_square_info, AggregatorConfig};

    #[test]
    fn test_render_text() {
        let info = perfect_square_info(10, &AggregatorConfig::default());
        assert_eq!(render_text(&info), "2: {1}\n3: {1}\n5: {1, 4}\n7: {1, 2, 4}\n");
    }

    #[test]
    fn test_render_text_empty() {
        let info = perfect_square_info(1, &AggregatorConfig::default());
        assert_eq!(render_text(&info), "");
    }

    #[test]
    fn test_pad_degenerate_range() {
        assert_eq!(pad(5.0, 5.0), 4.0..6.0);
        let r = pad(0.0, 100.0);
        assert!(r.start < 0.0 && r.end > 100.0);
    }

    #[test]
    fn test_plot_counts_writes_svg() {
        let tmpdir = tempfile::tempdir().unwrap();
        let info = perfect_square_info(100, &AggregatorConfig::default());
        let path = tmpdir.path().join("counts.svg");
        plot_counts(&info, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("<svg"));
        assert!(contents.contains("<circle"));
    }

    #[test]
    fn test_empty_series_is_no_data() {
        let tmpdir = tempfile::tempdir().unwrap();
        let info = perfect_square_info(2, &AggregatorConfig::default());
        let result = plot_diffs(&info, &tmpdir.path().join("diffs.svg"));
        assert!(matches!(result, Err(PlotError::NoData(_))));
    }

    #[test]
    fn test_render_all_skips_empty_series() {
        let tmpdir = tempfile::tempdir().unwrap();

        let info = perfect_square_info(50, &AggregatorConfig::default());
        let written = render_all(&info, tmpdir.path()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(written.iter().all(|p| p.exists()));

        let info = perfect_square_info(2, &AggregatorConfig::default());
        let written = render_all(&info, tmpdir.path()).unwrap();
        assert_eq!(written.len(), 1);
    }
}
