//! Periodic Perlin noise
//!
//! CPU twin of the `pnoise` function in `displace.wgsl`. Both use the
//! mod-289 permutation polynomial and the quintic fade curve, so CPU and GPU
//! agree to within float rounding. The CPU version backs the displacement
//! reference used by tests and tools.

use cgmath::Vector3;

use crate::config::NoiseConfig;

type Vec4 = [f32; 4];

#[inline]
fn mod289(x: f32) -> f32 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

/// GLSL-style `mod`: result has the sign of `y`
#[inline]
fn modulo(x: f32, y: f32) -> f32 {
    x - y * (x / y).floor()
}

#[inline]
fn fract(x: f32) -> f32 {
    x - x.floor()
}

#[inline]
fn step(edge: f32, x: f32) -> f32 {
    if x < edge {
        0.0
    } else {
        1.0
    }
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn map4(v: Vec4, f: impl Fn(f32) -> f32) -> Vec4 {
    [f(v[0]), f(v[1]), f(v[2]), f(v[3])]
}

#[inline]
fn add4(a: Vec4, b: Vec4) -> Vec4 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]]
}

#[inline]
fn permute(x: Vec4) -> Vec4 {
    map4(x, |x| mod289(((x * 34.0) + 10.0) * x))
}

#[inline]
fn taylor_inv_sqrt(r: f32) -> f32 {
    1.792_842_9 - 0.853_734_7 * r
}

#[inline]
fn dot3(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Builds the four gradient vectors of one z-slice from permuted hashes
fn gradients(ixy: Vec4) -> [[f32; 3]; 4] {
    let mut gx = map4(ixy, |v| v * (1.0 / 7.0));
    let mut gy = map4(gx, |v| fract(v.floor() * (1.0 / 7.0)) - 0.5);
    gx = map4(gx, fract);

    let mut out = [[0.0; 3]; 4];
    for i in 0..4 {
        let gz = 0.5 - gx[i].abs() - gy[i].abs();
        let sz = step(gz, 0.0);
        gx[i] -= sz * (step(0.0, gx[i]) - 0.5);
        gy[i] -= sz * (step(0.0, gy[i]) - 0.5);

        let g = [gx[i], gy[i], gz];
        let norm = taylor_inv_sqrt(dot3(g, g));
        out[i] = [g[0] * norm, g[1] * norm, g[2] * norm];
    }
    out
}

/// Classic Perlin noise, periodic variant.
///
/// `rep` is the repeat interval on each axis; the result is roughly in `[-1, 1]`.
pub fn pnoise(p: Vector3<f32>, rep: Vector3<f32>) -> f32 {
    let pi0 = [
        mod289(modulo(p.x.floor(), rep.x)),
        mod289(modulo(p.y.floor(), rep.y)),
        mod289(modulo(p.z.floor(), rep.z)),
    ];
    let pi1 = [
        mod289(modulo(modulo(p.x.floor(), rep.x) + 1.0, rep.x)),
        mod289(modulo(modulo(p.y.floor(), rep.y) + 1.0, rep.y)),
        mod289(modulo(modulo(p.z.floor(), rep.z) + 1.0, rep.z)),
    ];
    let pf0 = [fract(p.x), fract(p.y), fract(p.z)];
    let pf1 = [pf0[0] - 1.0, pf0[1] - 1.0, pf0[2] - 1.0];

    let ix = [pi0[0], pi1[0], pi0[0], pi1[0]];
    let iy = [pi0[1], pi0[1], pi1[1], pi1[1]];
    let iz0 = [pi0[2]; 4];
    let iz1 = [pi1[2]; 4];

    let ixy = permute(add4(permute(ix), iy));
    let [g000, g100, g010, g110] = gradients(permute(add4(ixy, iz0)));
    let [g001, g101, g011, g111] = gradients(permute(add4(ixy, iz1)));

    let n000 = dot3(g000, pf0);
    let n100 = dot3(g100, [pf1[0], pf0[1], pf0[2]]);
    let n010 = dot3(g010, [pf0[0], pf1[1], pf0[2]]);
    let n110 = dot3(g110, [pf1[0], pf1[1], pf0[2]]);
    let n001 = dot3(g001, [pf0[0], pf0[1], pf1[2]]);
    let n101 = dot3(g101, [pf1[0], pf0[1], pf1[2]]);
    let n011 = dot3(g011, [pf0[0], pf1[1], pf1[2]]);
    let n111 = dot3(g111, pf1);

    let fade_xyz = [fade(pf0[0]), fade(pf0[1]), fade(pf0[2])];
    let n_z = [
        lerp(n000, n001, fade_xyz[2]),
        lerp(n100, n101, fade_xyz[2]),
        lerp(n010, n011, fade_xyz[2]),
        lerp(n110, n111, fade_xyz[2]),
    ];
    let n_yz = [
        lerp(n_z[0], n_z[2], fade_xyz[1]),
        lerp(n_z[1], n_z[3], fade_xyz[1]),
    ];
    let n_xyz = lerp(n_yz[0], n_yz[1], fade_xyz[0]);
    2.2 * n_xyz
}

/// Distance a vertex at `position` is pushed along its normal at `time` seconds
pub fn displacement(position: Vector3<f32>, time: f32, config: &NoiseConfig) -> f32 {
    let shift = time / config.time_divisor;
    let sample = position + Vector3::new(shift, shift, shift);
    let period = Vector3::new(config.period, config.period, config.period);
    config.amplitude * pnoise(sample, period) / config.displacement_divisor
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const PERIOD: Vector3<f32> = Vector3 {
        x: 10.0,
        y: 10.0,
        z: 10.0,
    };

    fn random_point(rng: &mut impl Rng) -> Vector3<f32> {
        Vector3::new(
            rng.random_range(-40.0..40.0),
            rng.random_range(-40.0..40.0),
            rng.random_range(-40.0..40.0),
        )
    }

    #[test]
    fn test_zero_on_lattice_points() {
        for p in [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(-4.0, 7.0, -9.0),
        ] {
            assert!(pnoise(p, PERIOD).abs() < 1e-6, "noise at {:?}", p);
        }
    }

    #[test]
    fn test_periodic_in_each_axis() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let p = random_point(&mut rng);
            let base = pnoise(p, PERIOD);
            for shift in [
                Vector3::new(10.0, 0.0, 0.0),
                Vector3::new(0.0, 10.0, 0.0),
                Vector3::new(0.0, 0.0, 10.0),
                PERIOD,
            ] {
                let shifted = pnoise(p + shift, PERIOD);
                assert!(
                    (base - shifted).abs() < 1e-3,
                    "noise({:?}) = {} but shifted = {}",
                    p,
                    base,
                    shifted
                );
            }
        }
    }

    #[test]
    fn test_periodic_with_uneven_repeat() {
        let rep = Vector3::new(4.0, 6.0, 8.0);
        let mut rng = rand::rng();
        for _ in 0..200 {
            let p = random_point(&mut rng);
            assert!((pnoise(p, rep) - pnoise(p + rep, rep)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_continuous_across_cells() {
        let eps = 1e-3;
        // Straddle integer boundaries where the lattice hashes switch
        for k in -12..12 {
            let k = k as f32;
            for p in [
                Vector3::new(k, 0.3, 0.7),
                Vector3::new(0.4, k, 0.1),
                Vector3::new(0.6, 0.2, k),
            ] {
                let axis = if p.x == k {
                    Vector3::new(eps, 0.0, 0.0)
                } else if p.y == k {
                    Vector3::new(0.0, eps, 0.0)
                } else {
                    Vector3::new(0.0, 0.0, eps)
                };
                let below = pnoise(p - axis, PERIOD);
                let above = pnoise(p + axis, PERIOD);
                assert!((below - above).abs() < 0.05, "jump at {:?}", p);
            }
        }
    }

    #[test]
    fn test_bounded_output() {
        let mut rng = rand::rng();
        for _ in 0..2000 {
            let n = pnoise(random_point(&mut rng), PERIOD);
            assert!(n.is_finite());
            assert!(n.abs() <= 2.5, "noise out of range: {}", n);
        }
    }

    #[test]
    fn test_displacement_scales_noise() {
        let config = NoiseConfig::default();
        let p = Vector3::new(1.3, -0.4, 2.2);
        let t = 7.0;
        let shift = t / 3.5;
        let expected = 3.0 * pnoise(p + Vector3::new(shift, shift, shift), PERIOD) / 5.0;
        assert!((displacement(p, t, &config) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_displacement_time_is_periodic() {
        // Shifting time by divisor * period moves the sample by one full period
        let config = NoiseConfig::default();
        let p = Vector3::new(0.25, 0.5, 0.75);
        let a = displacement(p, 1.0, &config);
        let b = displacement(p, 1.0 + 3.5 * 10.0, &config);
        assert!((a - b).abs() < 1e-3);
    }
}
