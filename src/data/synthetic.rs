// ============================================================
// Layer 4 — Synthetic Dataset
// ============================================================
// A known analytic structure → spectrum mapping, used for demo
// data (`synthesize` command) and convergence tests.
//
// Three structural parameters shape one Gaussian absorption peak
// on a 400–800 nm grid:
//
//   period_nm    ∈ [300, 600] → peak centre   400 + (period - 300) * 4/3
//   thickness_nm ∈ [40, 200]  → peak width    15 + thickness / 4
//   radius_nm    ∈ [50, 150]  → peak depth    0.2 + 0.8 * (radius - 50) / 100

use rand::Rng;

use crate::domain::table::Table;

pub const STRUCT_NAMES: [&str; 3] = ["period_nm", "thickness_nm", "radius_nm"];

const PERIOD_RANGE:    (f32, f32) = (300.0, 600.0);
const THICKNESS_RANGE: (f32, f32) = (40.0, 200.0);
const RADIUS_RANGE:    (f32, f32) = (50.0, 150.0);
const WAVELENGTH_SPAN: (f32, f32) = (400.0, 800.0);

/// Evenly spaced wavelength grid over 400–800 nm.
pub fn wavelength_grid(count: usize) -> Vec<f32> {
    let (lo, hi) = WAVELENGTH_SPAN;
    if count <= 1 {
        return vec![lo; count];
    }
    let step = (hi - lo) / (count - 1) as f32;
    (0..count).map(|i| lo + step * i as f32).collect()
}

/// Absorption spectrum produced by `structure` = [period, thickness, radius].
pub fn absorption_spectrum(structure: &[f32], wavelengths: &[f32]) -> Vec<f32> {
    let (period, thickness, radius) = (structure[0], structure[1], structure[2]);
    let centre = 400.0 + (period - PERIOD_RANGE.0) * 4.0 / 3.0;
    let width  = 15.0 + thickness / 4.0;
    let depth  = 0.2 + 0.8 * (radius - RADIUS_RANGE.0) / (RADIUS_RANGE.1 - RADIUS_RANGE.0);

    wavelengths
        .iter()
        .map(|&w| {
            let z = (w - centre) / width;
            depth * (-0.5 * z * z).exp()
        })
        .collect()
}

/// Draw `samples` random structures and their spectra.
/// Returns (structure table, spectrum table).
pub fn generate<R: Rng + ?Sized>(samples: usize, wavelengths: usize, rng: &mut R) -> (Table, Table) {
    let grid = wavelength_grid(wavelengths);

    let structures: Vec<Vec<f32>> = (0..samples)
        .map(|_| {
            vec![
                rng.gen_range(PERIOD_RANGE.0..=PERIOD_RANGE.1),
                rng.gen_range(THICKNESS_RANGE.0..=THICKNESS_RANGE.1),
                rng.gen_range(RADIUS_RANGE.0..=RADIUS_RANGE.1),
            ]
        })
        .collect();
    let spectra: Vec<Vec<f32>> = structures
        .iter()
        .map(|s| absorption_spectrum(s, &grid))
        .collect();

    let structure_table = Table {
        header: STRUCT_NAMES.iter().map(|s| s.to_string()).collect(),
        rows:   structures,
    };
    let spectrum_table = Table {
        header: grid.iter().map(|w| format!("{w:.1}")).collect(),
        rows:   spectra,
    };
    (structure_table, spectrum_table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_grid_endpoints() {
        let g = wavelength_grid(5);
        assert_eq!(g, vec![400.0, 500.0, 600.0, 700.0, 800.0]);
    }

    #[test]
    fn test_peak_sits_at_period_dependent_centre() {
        // period 375 → centre 500 nm; radius 150 → depth 1.0
        let grid     = wavelength_grid(5);
        let spectrum = absorption_spectrum(&[375.0, 100.0, 150.0], &grid);
        let peak     = spectrum.iter().cloned().fold(f32::MIN, f32::max);
        assert!((spectrum[1] - 1.0).abs() < 1e-5);
        assert_eq!(peak, spectrum[1]);
    }

    #[test]
    fn test_generate_shapes_are_consistent() {
        let (s, t) = generate(8, 20, &mut StdRng::seed_from_u64(0));
        assert_eq!(s.len(), 8);
        assert_eq!(t.len(), 8);
        assert_eq!(s.width(), 3);
        assert_eq!(t.width(), 20);
        assert!(t.rows.iter().flatten().all(|v| v.is_finite() && *v >= 0.0));
    }
}
