use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

/// Index of the first maximum. NaN entries never win.
pub fn argmax<'a>(values: impl IntoIterator<Item = &'a f64>) -> usize {
    let mut max: f64 = f64::NEG_INFINITY;
    let mut result: usize = 0;
    for (i, v) in values.into_iter().enumerate() {
        if *v > max {
            max = *v;
            result = i;
        }
    }
    result
}

pub fn max<'a>(values: impl IntoIterator<Item = &'a f64>) -> f64 {
    values.into_iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Picks the index whose cumulative probability first exceeds `random`.
pub fn categorical_sample(probs: &[f64], random: f64) -> usize {
    let mut b: f64 = 0.0;
    for (i, p) in probs.iter().enumerate() {
        b += p;
        if b > random {
            return i;
        }
    }
    probs.len().saturating_sub(1)
}

pub fn moving_average(window: usize, vector: &[f64]) -> Vec<f64> {
    let window = window.max(1);
    let mut aux: usize = 0;
    let mut result: Vec<f64> = vec![];
    while aux < vector.len() {
        let end: usize = if aux + window < vector.len() {
            aux + window
        } else {
            vector.len()
        };
        let slice: &[f64] = &vector[aux..end];
        let r: f64 = slice.iter().sum();
        result.push(r / slice.len() as f64);
        aux = end;
    }
    result
}

pub fn plot_moving_average(
    series: &[Vec<f64>],
    colors: &[RGBColor],
    legends: &[&str],
    title: &str,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_len: usize = series.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let (mut min_y, mut max_y) = series
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if !min_y.is_finite() || !max_y.is_finite() {
        min_y = 0.0;
        max_y = 1.0;
    }
    if max_y - min_y < 1e-9 {
        max_y = min_y + 1.0;
    }

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0..max_len, min_y..max_y)?;
    chart.configure_mesh().draw()?;

    for (i, values) in series.iter().enumerate() {
        let color: RGBColor = colors[i % colors.len()];
        let legend: &str = legends.get(i).copied().unwrap_or("");
        chart
            .draw_series(LineSeries::new(
                values.iter().enumerate().map(|(x, y)| (x, *y)),
                color.stroke_width(2),
            ))?
            .label(legend)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
