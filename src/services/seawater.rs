//! Derived water-column quantities from CTD casts.
//!
//! Practical salinity follows the PSS-78 conductivity-ratio formulation,
//! absolute salinity applies the uniform reference-salinity factor, and
//! in-situ density uses the EOS-80 equation of state with the secant
//! bulk modulus. Pressure is taken as numerically equal to depth in
//! meters, which is adequate for the shallow coastal casts served here.

/// Conductivity of standard seawater (S=35, t=15, p=0) in mS/cm.
const C35_15_0: f64 = 42.914;

const PSS_A: [f64; 6] = [0.0080, -0.1692, 25.3851, 14.0941, -7.0261, 2.7081];
const PSS_B: [f64; 6] = [0.0005, -0.0056, -0.0066, -0.0375, 0.0636, -0.0144];
const PSS_K: f64 = 0.0162;

/// Practical salinity (PSS-78) from conductivity in mS/cm, temperature in
/// degrees C (IPTS-68), and pressure in dbar.
pub fn practical_salinity(conductivity: f64, temperature: f64, pressure: f64) -> f64 {
    let r = conductivity / C35_15_0;
    let t = temperature;
    let p = pressure;

    // rt(t): conductivity ratio of standard seawater at temperature t.
    let rt_t = 0.6766097
        + t * (2.00564e-2 + t * (1.104259e-4 + t * (-6.9698e-7 + t * 1.0031e-9)));

    // Rp: pressure correction to the conductivity ratio.
    let e = p * (2.070e-5 + p * (-6.370e-10 + p * 3.989e-15));
    let d = 1.0 + t * (3.426e-2 + t * 4.464e-4) + (4.215e-1 + t * -3.107e-3) * r;
    let rp = 1.0 + e / d;

    let rt = r / (rp * rt_t);
    let sqrt_rt = rt.max(0.0).sqrt();

    let mut sp = 0.0;
    let mut ds = 0.0;
    let mut rt_pow = 1.0;
    for i in 0..6 {
        sp += PSS_A[i] * rt_pow;
        ds += PSS_B[i] * rt_pow;
        rt_pow *= sqrt_rt;
    }
    let dt = t - 15.0;
    sp + dt / (1.0 + PSS_K * dt) * ds
}

/// Absolute salinity in g/kg from practical salinity, using the uniform
/// reference-salinity scaling. The regional anomaly correction is below
/// the sensor noise floor for the waters covered.
pub fn absolute_salinity(practical: f64) -> f64 {
    practical * (35.16504 / 35.0)
}

/// In-situ density in kg/m^3 (EOS-80) from practical salinity,
/// temperature in degrees C, and pressure in dbar.
pub fn density(salinity: f64, temperature: f64, pressure: f64) -> f64 {
    let s = salinity;
    let t = temperature;
    let s15 = s * s.max(0.0).sqrt();

    // Density of pure water and of seawater at atmospheric pressure.
    let rho_w = 999.842594
        + t * (6.793952e-2
            + t * (-9.095290e-3 + t * (1.001685e-4 + t * (-1.120083e-6 + t * 6.536332e-9))));
    let a = 8.24493e-1
        + t * (-4.0899e-3 + t * (7.6438e-5 + t * (-8.2467e-7 + t * 5.3875e-9)));
    let b = -5.72466e-3 + t * (1.0227e-4 + t * -1.6546e-6);
    let c = 4.8314e-4;
    let rho_0 = rho_w + a * s + b * s15 + c * s * s;

    // Secant bulk modulus.
    let kw = 19652.21
        + t * (148.4206 + t * (-2.327105 + t * (1.360477e-2 + t * -5.155288e-5)));
    let k0 = kw
        + s * (54.6746 + t * (-0.603459 + t * (1.09987e-2 + t * -6.1670e-5)))
        + s15 * (7.944e-2 + t * (1.6483e-2 + t * -5.3009e-4));
    let aa = 3.239908
        + t * (1.43713e-3 + t * (1.16092e-4 + t * -5.77905e-7))
        + s * (2.2838e-3 + t * (-1.0981e-5 + t * -1.6078e-6))
        + s15 * 1.91075e-4;
    let bb = 8.50935e-5
        + t * (-6.12293e-6 + t * 5.2787e-8)
        + s * (-9.9348e-7 + t * (2.0816e-8 + t * 9.1697e-10));

    let p_bar = pressure / 10.0;
    let k = k0 + p_bar * (aa + p_bar * bb);
    rho_0 / (1.0 - p_bar / k)
}

/// Derived columns for one cast, aligned to the full depth axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedColumns {
    pub practical_salinity: Vec<Option<f64>>,
    pub absolute_salinity: Vec<Option<f64>>,
    pub density: Vec<Option<f64>>,
}

/// Compute derived columns from raw conductivity and temperature arrays.
/// Cells at non-positive depths (above-surface sensor slots) or with a
/// missing or zero input remain `None`.
pub fn derive_columns(
    depths: &[f64],
    conductivity: &[Option<f64>],
    temperature: &[Option<f64>],
) -> DerivedColumns {
    let n = depths.len();
    let mut out = DerivedColumns {
        practical_salinity: vec![None; n],
        absolute_salinity: vec![None; n],
        density: vec![None; n],
    };
    for (i, &depth) in depths.iter().enumerate() {
        if depth <= 0.0 {
            continue;
        }
        let c = conductivity.get(i).copied().flatten();
        let t = temperature.get(i).copied().flatten();
        let (Some(c), Some(t)) = (c, t) else {
            continue;
        };
        if c == 0.0 || !c.is_finite() || !t.is_finite() {
            continue;
        }
        let pressure = depth;
        let sp = practical_salinity(c, t, pressure);
        out.practical_salinity[i] = Some(sp);
        out.absolute_salinity[i] = Some(absolute_salinity(sp));
        out.density[i] = Some(density(sp, t, pressure));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_seawater_reads_35() {
        let sp = practical_salinity(C35_15_0, 15.0, 0.0);
        assert!((sp - 35.0).abs() < 1e-6, "got {sp}");
    }

    #[test]
    fn salinity_increases_with_conductivity() {
        let low = practical_salinity(30.0, 10.0, 0.0);
        let high = practical_salinity(40.0, 10.0, 0.0);
        assert!(high > low);
    }

    #[test]
    fn absolute_salinity_scales_practical() {
        let sa = absolute_salinity(35.0);
        assert!((sa - 35.16504).abs() < 1e-9);
    }

    #[test]
    fn density_check_value() {
        // UNESCO 1983 check point: S=35, t=5, p=0.
        let rho = density(35.0, 5.0, 0.0);
        assert!((rho - 1027.675).abs() < 0.05, "got {rho}");
    }

    #[test]
    fn density_responds_to_state_changes() {
        let base = density(35.0, 10.0, 0.0);
        assert!(density(36.0, 10.0, 0.0) > base);
        assert!(density(35.0, 20.0, 0.0) < base);
        assert!(density(35.0, 10.0, 100.0) > base);
    }

    #[test]
    fn derived_columns_skip_surface_and_dropouts() {
        let depths = [-0.5, 2.0, 5.0];
        let cond = [Some(42.0), Some(42.0), Some(0.0)];
        let temp = [Some(14.0), Some(14.0), Some(14.0)];
        let out = derive_columns(&depths, &cond, &temp);
        assert_eq!(out.practical_salinity[0], None);
        assert!(out.practical_salinity[1].is_some());
        assert_eq!(out.density[2], None);
    }
}
