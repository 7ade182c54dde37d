//! CPU reference for the displacement material's fragment stage

/// Colour emitted for one fragment.
///
/// `frag_coord` is the framebuffer position (top-left origin) and
/// `buffer_height` the render target height, both in physical pixels. The
/// gradient is measured from the bottom-left corner.
///
/// A sample whose alpha is exactly zero is read as "no texture bound" and
/// replaced by a screen-space gradient: `st = frag / resolution / 0.75`
/// mapped to `(st.x, st.y, 1.0, 1.0)`. A bound texture that is fully
/// transparent at this fragment takes the same branch.
pub fn shade_fragment(
    sample: [f32; 4],
    frag_coord: [f32; 2],
    buffer_height: f32,
    resolution: [f32; 2],
) -> [f32; 4] {
    if sample[3] == 0.0 {
        let frag = [frag_coord[0], buffer_height - frag_coord[1]];
        let st = [
            (frag[0] / resolution[0]) / 0.75,
            (frag[1] / resolution[1]) / 0.75,
        ];
        [st[0], st[1], 1.0, 1.0]
    } else {
        sample
    }
}

/// What an unbound texture slot samples as
pub const UNBOUND_SAMPLE: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

#[cfg(test)]
mod tests {
    use super::*;

    const RESOLUTION: [f32; 2] = [800.0, 600.0];

    #[test]
    fn test_opaque_sample_passes_through() {
        let sample = [0.2, 0.4, 0.6, 1.0];
        assert_eq!(shade_fragment(sample, [10.0, 20.0], 600.0, RESOLUTION), sample);
    }

    #[test]
    fn test_translucent_sample_passes_through() {
        let sample = [0.9, 0.1, 0.3, 0.01];
        assert_eq!(shade_fragment(sample, [0.0, 0.0], 600.0, RESOLUTION), sample);
    }

    #[test]
    fn test_unbound_texture_uses_gradient() {
        // 150px below the top is 450px above the bottom
        let color = shade_fragment(UNBOUND_SAMPLE, [300.0, 150.0], 600.0, RESOLUTION);
        assert_eq!(color, [0.5, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_gradient_green_grows_upwards() {
        let bottom = shade_fragment(UNBOUND_SAMPLE, [0.0, 600.0], 600.0, RESOLUTION);
        let top = shade_fragment(UNBOUND_SAMPLE, [0.0, 0.0], 600.0, RESOLUTION);
        assert_eq!(bottom[1], 0.0);
        assert!((top[1] - 1.0 / 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_gradient_spans_physical_pixels() {
        // At pixel ratio 2 the buffer is twice the logical resolution
        let color = shade_fragment(UNBOUND_SAMPLE, [1200.0, 300.0], 1200.0, RESOLUTION);
        assert_eq!(color[0], 2.0);
        assert_eq!(color[1], 2.0);
    }

    #[test]
    fn test_transparent_texel_is_treated_as_unbound() {
        let color = shade_fragment([1.0, 0.0, 0.0, 0.0], [0.0, 600.0], 600.0, RESOLUTION);
        assert_eq!(color, [0.0, 0.0, 1.0, 1.0]);
    }
}
