use crate::{engine::types::Lighting, renderer::Tint};

/// Darkening applied to faces hit on the X side.
pub const SIDE_X_DARKEN: u8 = 12;

/// Clamp without panicking when `lo > hi` (an inverted light range simply
/// pins the channel to `hi`).
#[inline]
pub fn clamp_channel(v: i32, lo: u8, hi: u8) -> u8 {
    v.max(lo as i32).min(hi as i32) as u8
}

/// Distance-based tint: `255 + sqrt(d) · falloff + global + bias`, clamped
/// per channel into the configured light range.
pub fn shade(distance: f64, bias: f64, light: &Lighting) -> Tint {
    let raw = 255.0 + distance.sqrt() * light.falloff + light.global_illumination + bias;
    // saturating cast; NaN lands on 0 and then on the lower bound
    let v = raw as i32;
    Tint::rgb(
        clamp_channel(v, light.min.r, light.max.r),
        clamp_channel(v, light.min.g, light.max.g),
        clamp_channel(v, light.min.b, light.max.b),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn lighting(falloff: f64, global: f64) -> Lighting {
        Lighting {
            falloff,
            global_illumination: global,
            min: Tint::rgb(10, 20, 30),
            max: Tint::rgb(200, 210, 220),
        }
    }

    #[test]
    fn near_is_bright_far_is_dark() {
        let l = lighting(-100.0, 0.0);
        assert_eq!(shade(0.0, 0.0, &l), Tint::rgb(200, 210, 220));
        assert_eq!(shade(100.0, 0.0, &l), Tint::rgb(10, 20, 30));
    }

    #[test]
    fn mid_range_passes_through() {
        let l = lighting(-10.0, 0.0);
        // 255 - 2 * 10 = 235 → clamped by max only on r (200) and g (210)
        assert_eq!(shade(4.0, 0.0, &l), Tint::rgb(200, 210, 220));
        // 255 - 10 * 10 = 155
        assert_eq!(shade(100.0, 0.0, &l), Tint::rgb(155, 155, 155));
    }

    #[test]
    fn bias_lifts_sprites_out_of_darkness() {
        let l = lighting(-100.0, 0.0);
        assert_eq!(shade(100.0, 1e6, &l), Tint::rgb(200, 210, 220));
    }

    #[test]
    fn output_always_within_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let l = lighting(rng.gen_range(-1e4..1e4), rng.gen_range(-1e4..1e4));
            let t = shade(rng.gen_range(0.0..1e6), rng.gen_range(-1e5..1e5), &l);
            assert!((l.min.r..=l.max.r).contains(&t.r));
            assert!((l.min.g..=l.max.g).contains(&t.g));
            assert!((l.min.b..=l.max.b).contains(&t.b));
        }
    }

    #[test]
    fn inverted_range_does_not_panic() {
        assert_eq!(clamp_channel(100, 200, 50), 50);
    }
}
