#[cfg(test)]
mod _tests_density_of_states {
    use super::super::density_of_states::*;
    use crate::errors::TbError;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_histogram_bins_span_range() {
        let eigenvalues = [-1.0, -0.5, 0.0, 0.25, 1.0];
        let hist = histogram(&eigenvalues, 4, None).unwrap();

        assert_eq!(hist.bin_edges.len(), 5);
        assert_relative_eq!(hist.bin_edges[0], -1.0, epsilon = TOL);
        assert_relative_eq!(hist.bin_edges[4], 1.0, epsilon = TOL);
        assert_relative_eq!(hist.bin_width(), 0.5, epsilon = TOL);
        // Maximum lands in the last bin
        assert_eq!(hist.counts, vec![1.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_histogram_total_weight() {
        let eigenvalues: Vec<f64> = (0..100).map(|i| (i as f64 * 0.37).sin()).collect();
        let hist = histogram(&eigenvalues, 17, None).unwrap();
        assert_relative_eq!(hist.counts.iter().sum::<f64>(), 100.0, epsilon = TOL);

        let weights = vec![0.25; 100];
        let weighted = histogram(&eigenvalues, 17, Some(&weights[..])).unwrap();
        assert_relative_eq!(weighted.counts.iter().sum::<f64>(), 25.0, epsilon = TOL);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let hist = histogram(&[2.0, 2.0, 2.0], 10, None).unwrap();
        assert_relative_eq!(hist.bin_edges[0], 1.5, epsilon = TOL);
        assert_relative_eq!(hist.bin_edges[10], 2.5, epsilon = TOL);
        assert_relative_eq!(hist.counts.iter().sum::<f64>(), 3.0, epsilon = TOL);
    }

    #[test]
    fn test_histogram_curve_uses_centers() {
        let hist = histogram(&[0.0, 1.0], 2, None).unwrap();
        let curve = hist.to_curve();
        assert_eq!(curve.energies, vec![0.25, 0.75]);
        assert_eq!(curve.values, vec![1.0, 1.0]);
    }

    #[test]
    fn test_histogram_invalid_inputs() {
        assert!(matches!(histogram(&[], 10, None), Err(TbError::InvalidArgument(_))));
        assert!(matches!(histogram(&[1.0], 0, None), Err(TbError::InvalidArgument(_))));
        assert!(matches!(histogram(&[f64::NAN], 4, None), Err(TbError::InvalidArgument(_))));
        assert!(matches!(
            histogram(&[0.0, 1.0], 4, Some(&[1.0][..])),
            Err(TbError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_lorentzian_peak_height() {
        let gamma = 0.1;
        let curve = lorentzian(&[-1.0, 1.0], 3, gamma, None).unwrap();

        assert_eq!(curve.energies.len(), 3);
        assert_relative_eq!(curve.energies[1], 0.0, epsilon = TOL);

        let peak = 1.0 / (PI * gamma) + (gamma / PI) / (4.0 + gamma * gamma);
        assert_relative_eq!(curve.values[0], peak, epsilon = 1e-10);
        assert_relative_eq!(curve.values[2], peak, epsilon = 1e-10);
        assert!(curve.values[1] < curve.values[0]);
    }

    #[test]
    fn test_lorentzian_integrates_to_state_count() {
        // Zero-weight sentinels widen the energy window around the real levels
        let eigenvalues = [-50.0, -0.3, 0.0, 0.4, 50.0];
        let weights = [0.0, 1.0, 1.0, 1.0, 0.0];
        let curve = lorentzian(&eigenvalues, 20001, 0.05, Some(&weights[..])).unwrap();
        let step = curve.energies[1] - curve.energies[0];
        let integral: f64 = curve.values.iter().sum::<f64>() * step;
        assert!((integral - 3.0).abs() < 0.01, "integral = {}", integral);
    }

    #[test]
    fn test_lorentzian_weights_scale_contributions() {
        let plain = lorentzian(&[0.0, 1.0], 11, 0.2, None).unwrap();
        let weighted = lorentzian(&[0.0, 1.0], 11, 0.2, Some(&[0.5, 0.5][..])).unwrap();
        for (p, w) in plain.values.iter().zip(&weighted.values) {
            assert_relative_eq!(0.5 * p, *w, epsilon = TOL);
        }
    }

    #[test]
    fn test_lorentzian_single_point() {
        let curve = lorentzian(&[-2.0, 2.0], 1, 0.1, None).unwrap();
        assert_eq!(curve.energies, vec![0.0]);
    }

    #[test]
    fn test_lorentzian_invalid_inputs() {
        assert!(matches!(lorentzian(&[0.0], 10, 0.0, None), Err(TbError::InvalidArgument(_))));
        assert!(matches!(lorentzian(&[0.0], 10, -0.1, None), Err(TbError::InvalidArgument(_))));
        assert!(matches!(lorentzian(&[0.0], 0, 0.1, None), Err(TbError::InvalidArgument(_))));
        assert!(matches!(lorentzian(&[], 10, 0.1, None), Err(TbError::InvalidArgument(_))));
    }
}
