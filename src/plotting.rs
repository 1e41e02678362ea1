use image::{Rgb, RgbImage};
use ndarray::Array2;
use std::path::Path;
use textplots::{Chart, Plot};

/// Determine the best scale and unit for a given maximum value
fn determine_scale(max_value: f64) -> (f64, &'static str) {
    if max_value >= 1.0 {
        (1.0, "")
    } else if max_value >= 1e-3 {
        (1e3, "m")
    } else if max_value >= 1e-6 {
        (1e6, "μ")
    } else {
        (1e9, "n")
    }
}

/// Plot a frequency sweep as a terminal line plot with dynamic unit scaling.
///
/// # Arguments
/// * `frequencies` - Stimulus frequencies [Hz], one per amplitude
/// * `amplitudes` - Measured amplitude response [V]
/// * `title` - Optional title for the plot
pub fn plot_sweep(
    frequencies: &[f64],
    amplitudes: &[f64],
    title: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    if frequencies.is_empty() || frequencies.len() != amplitudes.len() {
        return Err("Cannot plot empty or mismatched sweep data".into());
    }

    let width = 140usize;
    let height = 60usize;

    let min_value = amplitudes.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max_value = amplitudes.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let max_abs = max_value.abs().max(min_value.abs());

    let (value_scale, value_unit) = determine_scale(max_abs);

    let frame: Vec<(f32, f32)> = frequencies
        .iter()
        .zip(amplitudes.iter())
        .map(|(&f, &a)| (f as f32, (a * value_scale) as f32))
        .collect();

    let f_min = frequencies.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let f_max = frequencies.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

    if let Some(title) = title {
        println!("{}", title);
    } else {
        println!("Amplitude Response");
    }
    println!("X-axis: Frequency [Hz] | Y-axis: {}V", value_unit);
    println!(
        "Range: {:.2} Hz to {:.2} Hz | Amplitude: {:.3} to {:.3} {}V",
        f_min,
        f_max,
        min_value * value_scale,
        max_value * value_scale,
        value_unit
    );
    println!("{}", "─".repeat(width));

    Chart::new(width as u32, height as u32, f_min as f32, f_max as f32)
        .lineplot(&textplots::Shape::Lines(&frame))
        .nice();

    println!("Frequency [Hz] →");

    Ok(())
}

/// Diverging blue → white → red colormap over a normalized value
fn diverging_color(t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: f64, b: f64, t: f64| (a + (b - a) * t) as u8;
    if t < 0.5 {
        let s = t * 2.0;
        Rgb([lerp(49.0, 255.0, s), lerp(54.0, 255.0, s), lerp(149.0, 224.0, s)])
    } else {
        let s = (t - 0.5) * 2.0;
        Rgb([lerp(255.0, 165.0, s), lerp(255.0, 0.0, s), lerp(224.0, 38.0, s)])
    }
}

/// Render a polar scan grid as a Cartesian PNG heat map.
///
/// The grid is indexed by (angular index, radial index). `r` and `theta`
/// shape only the rendered coordinate frame: `r` sets the radial extent and
/// `theta` the angular span of the image. They do not influence the grid
/// itself, which keeps the dimensions the scan produced.
pub fn render_polar_map(
    grid: &Array2<f64>,
    r: &[f64],
    theta: &[f64],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if grid.is_empty() {
        return Err("Cannot render empty scan grid".into());
    }

    let n_angular = grid.nrows();
    let n_radial = grid.ncols();

    let r_max = r
        .iter()
        .fold(f64::NEG_INFINITY, |a, &b| a.max(b))
        .max(f64::MIN_POSITIVE);
    let r_max = if r.is_empty() { (n_radial - 1) as f64 } else { r_max };

    let theta_span = match (theta.first(), theta.last()) {
        (Some(&first), Some(&last)) if last > first => last - first,
        _ => std::f64::consts::TAU,
    };

    let z_min = grid.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let z_max = grid.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let z_range = if (z_max - z_min).abs() > f64::EPSILON {
        z_max - z_min
    } else {
        1.0
    };

    const SIZE: u32 = 600;
    let center = SIZE as f64 / 2.0;
    let pixel_radius = center - 1.0;

    let mut img = RgbImage::from_pixel(SIZE, SIZE, Rgb([255, 255, 255]));

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let dx = x as f64 - center;
        let dy = center - y as f64;
        let rad = (dx * dx + dy * dy).sqrt() / pixel_radius;
        if rad > 1.0 {
            continue;
        }

        let mut ang = dy.atan2(dx);
        if ang < 0.0 {
            ang += std::f64::consts::TAU;
        }
        if ang > theta_span {
            continue;
        }

        // Nearest-cell lookup in the polar grid
        let radial_idx =
            ((rad * (n_radial - 1) as f64).round() as usize).min(n_radial - 1);
        let angular_idx = (((ang / theta_span) * n_angular as f64) as usize).min(n_angular - 1);

        let value = grid[(angular_idx, radial_idx)];
        *pixel = diverging_color((value - z_min) / z_range);
    }

    img.save(path)?;
    log::info!(
        "Polar map ({}x{} cells, r_max = {:.1}) written to {}",
        n_angular,
        n_radial,
        r_max,
        path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_determine_scale() {
        assert_eq!(determine_scale(5.0), (1.0, ""));
        assert_eq!(determine_scale(0.005), (1e3, "m"));
        assert_eq!(determine_scale(5e-6), (1e6, "μ"));
        assert_eq!(determine_scale(5e-9), (1e9, "n"));
    }

    #[test]
    fn test_plot_sweep_basic() {
        let freqs = vec![100.0, 110.0, 120.0, 130.0];
        let amps = vec![0.001, 0.004, 0.002, 0.001];
        assert!(plot_sweep(&freqs, &amps, Some("Test Sweep")).is_ok());
    }

    #[test]
    fn test_plot_sweep_rejects_mismatched_data() {
        assert!(plot_sweep(&[], &[], None).is_err());
        assert!(plot_sweep(&[1.0, 2.0], &[0.5], None).is_err());
    }

    #[test]
    fn test_diverging_color_endpoints() {
        assert_eq!(diverging_color(0.0), Rgb([49, 54, 149]));
        assert_eq!(diverging_color(1.0), Rgb([165, 0, 38]));
    }

    #[test]
    fn test_render_polar_map_writes_png() {
        let grid = Array2::from_shape_fn((18, 11), |(i, j)| (i + j) as f64);
        let r: Vec<f64> = (0..11).map(|j| j as f64 * 700.0).collect();
        let theta: Vec<f64> = (0..18)
            .map(|i| i as f64 * std::f64::consts::TAU / 18.0)
            .collect();

        let dir = std::env::temp_dir();
        let path = dir.join("moku_drum_polar_map_test.png");
        assert!(render_polar_map(&grid, &r, &theta, &path).is_ok());
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_render_polar_map_rejects_empty_grid() {
        let grid = Array2::<f64>::zeros((0, 0));
        let path = std::env::temp_dir().join("moku_drum_empty.png");
        assert!(render_polar_map(&grid, &[], &[], &path).is_err());
    }
}
