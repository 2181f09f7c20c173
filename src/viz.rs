//! Scatter plot of a clustering result using Plotters

use std::ops::Range;
use std::path::Path;

use plotters::prelude::*;

use crate::model::ClusteringResult;

/// Color palette for different clusters
const CLUSTER_COLORS: [RGBColor; 5] = [
    RGBColor(68, 1, 84),
    RGBColor(59, 82, 139),
    RGBColor(33, 145, 140),
    RGBColor(94, 201, 98),
    RGBColor(253, 231, 37),
];

/// Column indices in the feature matrix for the two plotted axes.
const X_COLUMN: usize = 0;
const Y_COLUMN: usize = 1;

pub fn cluster_color(cluster: usize) -> RGBColor {
    CLUSTER_COLORS[cluster % CLUSTER_COLORS.len()]
}

/// Axis range covering `values` with 5% padding (at least 1.0 per side).
pub fn axis_range(values: &[f64]) -> Range<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let pad = ((max - min) * 0.05).max(1.0);
    let (low, high) = (min - pad, max + pad);
    if low.is_finite() && high.is_finite() {
        low..high
    } else {
        // padding overflowed; plot the bare extent
        min..max
    }
}

/// Points of one cluster as (average purchase value, purchase frequency).
pub fn cluster_points(result: &ClusteringResult, cluster: usize) -> Vec<(f64, f64)> {
    result
        .labels
        .iter()
        .enumerate()
        .filter(|&(_, &label)| label == cluster)
        .map(|(i, _)| (result.features[[i, X_COLUMN]], result.features[[i, Y_COLUMN]]))
        .collect()
}

/// Render average purchase value against purchase frequency, one colour per
/// cluster, to a PNG at `output_path`.
pub fn create_cluster_visualization(
    result: &ClusteringResult,
    output_path: &Path,
    plot_title: Option<&str>,
) -> anyhow::Result<()> {
    let title = plot_title.unwrap_or("Customer Segments");

    let x_values = result.features.column(X_COLUMN).to_vec();
    let y_values = result.features.column(Y_COLUMN).to_vec();

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(axis_range(&x_values), axis_range(&y_values))?;

    chart
        .configure_mesh()
        .x_desc("Average Purchase Value")
        .y_desc("Purchase Frequency")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for cluster in 0..result.n_clusters {
        let points = cluster_points(result, cluster);
        if points.is_empty() {
            continue;
        }
        let color = cluster_color(cluster);

        chart
            .draw_series(
                points
                    .into_iter()
                    .map(|point| Circle::new(point, 5, color.filled())),
            )?
            .label(format!("Cluster {}", cluster))
            .legend(move |(x, y)| Circle::new((x + 5, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
