use serde::{Deserialize, Serialize};

/// Linear RGB triple with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Converts hue, saturation and lightness (all in `[0, 1]`, hue wrapping)
    /// into RGB.
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let h = hue.rem_euclid(1.0);
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);

        if s <= f32::EPSILON {
            return Self::new(l, l, l);
        }

        let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        Self::new(
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
        )
    }
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-5 && (a.g - b.g).abs() < 1e-5 && (a.b - b.b).abs() < 1e-5
    }

    #[test]
    fn primary_hues() {
        assert!(close(Rgb::from_hsl(0.0, 1.0, 0.5), Rgb::new(1.0, 0.0, 0.0)));
        assert!(close(Rgb::from_hsl(1.0 / 3.0, 1.0, 0.5), Rgb::new(0.0, 1.0, 0.0)));
        assert!(close(Rgb::from_hsl(2.0 / 3.0, 1.0, 0.5), Rgb::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn zero_saturation_is_grey() {
        assert!(close(Rgb::from_hsl(0.3, 0.0, 0.25), Rgb::new(0.25, 0.25, 0.25)));
    }

    #[test]
    fn pink_band_is_red_dominant() {
        let pink = Rgb::from_hsl(0.96, 0.9, 0.5);
        assert!(pink.r > pink.b && pink.b > pink.g);
    }
}
