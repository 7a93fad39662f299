/// HSL (hue in degrees, saturation and lightness in 0.0-1.0) to 8-bit RGB.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [u8; 3] {
    let h = hue.rem_euclid(360.0) / 360.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    if s == 0.0 {
        let v = to_byte(l);
        return [v, v, v];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    [
        to_byte(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_byte(hue_to_channel(p, q, h)),
        to_byte(hue_to_channel(p, q, h - 1.0 / 3.0)),
    ]
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Rounds a 0.0-1.0 level to 0-255.
pub fn to_byte(level: f32) -> u8 {
    (level * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Rounds and clamps an arbitrary value into the 0-255 range.
pub fn clamp_byte(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Sum of absolute per-channel differences.
pub fn rgb_distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), [255, 0, 0]);
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), [0, 255, 0]);
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), [0, 0, 255]);
        assert_eq!(hsl_to_rgb(360.0, 1.0, 0.5), [255, 0, 0]);
    }

    #[test]
    fn lightness_extremes() {
        assert_eq!(hsl_to_rgb(200.0, 1.0, 0.0), [0, 0, 0]);
        assert_eq!(hsl_to_rgb(200.0, 1.0, 1.0), [255, 255, 255]);
        assert_eq!(hsl_to_rgb(200.0, 0.0, 0.5), [128, 128, 128]);
    }

    #[test]
    fn rgb_distance_sums_channel_differences() {
        assert_eq!(rgb_distance([10, 20, 30], [15, 10, 30]), 15);
        assert_eq!(rgb_distance([0, 0, 0], [255, 255, 255]), 765);
    }

    #[test]
    fn clamp_byte_rounds_and_saturates() {
        assert_eq!(clamp_byte(-3.0), 0);
        assert_eq!(clamp_byte(300.0), 255);
        assert_eq!(clamp_byte(107.1), 107);
    }
}
