//! Color helpers shared by the `rgb`/`hsb` built-ins and the animation
//! tasks. Float channels are in `[0, 1]`; `to_u8` maps that range onto the
//! byte triples an [`crate::led::LedSegment`] actually stores.

pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

pub fn to_u8(channel: f32) -> u8 {
    (clamp01(channel) * 255.0).round() as u8
}

/// `h` in degrees `[0, 360)`, `s` and `b` in `[0, 1]`. Unrecognized/negative
/// hues wrap via `rem_euclid` rather than erroring — there is no invalid
/// input here, only a different color.
pub fn hsb_to_rgb(h: f32, s: f32, b: f32) -> (f32, f32, f32) {
    let s = clamp01(s);
    let b = clamp01(b);
    if s <= 0.0 {
        return (b, b, b);
    }
    let h = h.rem_euclid(360.0) / 60.0;
    let sector = h.floor() as i32;
    let frac = h - h.floor();
    let p = b * (1.0 - s);
    let q = b * (1.0 - s * frac);
    let t = b * (1.0 - s * (1.0 - frac));
    match sector {
        0 => (b, t, p),
        1 => (q, b, p),
        2 => (p, b, t),
        3 => (p, q, b),
        4 => (t, p, b),
        _ => (b, p, q),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn red_green_blue_primaries() {
        let (r, g, bl) = hsb_to_rgb(0.0, 1.0, 1.0);
        assert_eq!((to_u8(r), to_u8(g), to_u8(bl)), (255, 0, 0));

        let (r, g, bl) = hsb_to_rgb(120.0, 1.0, 1.0);
        assert_eq!((to_u8(r), to_u8(g), to_u8(bl)), (0, 255, 0));

        let (r, g, bl) = hsb_to_rgb(240.0, 1.0, 1.0);
        assert_eq!((to_u8(r), to_u8(g), to_u8(bl)), (0, 0, 255));
    }

    #[test]
    fn zero_saturation_is_gray() {
        let (r, g, b) = hsb_to_rgb(200.0, 0.0, 0.5);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn hue_wraps_past_360() {
        let a = hsb_to_rgb(10.0, 1.0, 1.0);
        let b = hsb_to_rgb(370.0, 1.0, 1.0);
        assert_eq!((to_u8(a.0), to_u8(a.1), to_u8(a.2)), (to_u8(b.0), to_u8(b.1), to_u8(b.2)));
    }

    #[test]
    fn to_u8_clamps_out_of_range() {
        assert_eq!(to_u8(-1.0), 0);
        assert_eq!(to_u8(2.0), 255);
    }
}
