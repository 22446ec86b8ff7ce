//! Integer HSV and HSL conversions used by the hue, saturation, value and color-only laws.
//!
//! HSV: hue in degrees `0..360`, saturation and value in `0..=255`.
//! HSL: all three components in `0..=255` (hue scaled so a full turn is 255).

/// `(int)(x + 0.5)`; only ever called on non-negative values.
fn round(x: f64) -> i32 {
    (x + 0.5) as i32
}

pub(crate) fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [i32; 3] {
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    let (v, min) = if r > g {
        (r.max(b), g.min(b))
    } else {
        (g.max(b), r.min(b))
    };
    let delta = v - min;

    let s = if v == 0.0 { 0.0 } else { delta * 255.0 / v };

    let h = if s == 0.0 {
        0.0
    } else {
        let mut h = if r == v {
            60.0 * (g - b) / delta
        } else if g == v {
            120.0 + 60.0 * (b - r) / delta
        } else {
            240.0 + 60.0 * (r - g) / delta
        };
        if h < 0.0 {
            h += 360.0;
        }
        if h > 360.0 {
            h -= 360.0;
        }
        h
    };

    let mut hue = round(h);
    if hue == 360 {
        hue = 0;
    }
    [hue, round(s), round(v)]
}

pub(crate) fn hsv_to_rgb(hsv: [i32; 3]) -> [u8; 3] {
    let [h, s, v] = hsv;
    if s == 0 {
        let v = v.clamp(0, 255) as u8;
        return [v, v, v];
    }

    let h = if h == 360 { 0.0 } else { f64::from(h) } / 60.0;
    let s = f64::from(s) / 255.0;
    let v = f64::from(v) / 255.0;

    let i = h.floor() as i32;
    let f = h - f64::from(i);
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match i {
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        5 => (v, p, q),
        _ => (v, t, p),
    };
    [to_byte(r), to_byte(g), to_byte(b)]
}

pub(crate) fn rgb_to_hsl(r: u8, g: u8, b: u8) -> [i32; 3] {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let (max, min) = if r > g {
        (r.max(b), g.min(b))
    } else {
        (g.max(b), r.min(b))
    };

    let l = f64::from(max + min) / 2.0;
    if max == min {
        return [0, 0, round(l)];
    }

    let delta = f64::from(max - min);
    let s = if l < 128.0 {
        255.0 * delta / f64::from(max + min)
    } else {
        255.0 * delta / f64::from(511 - max - min)
    };

    let mut h = if r == max {
        f64::from(g - b) / delta
    } else if g == max {
        2.0 + f64::from(b - r) / delta
    } else {
        4.0 + f64::from(r - g) / delta
    };
    h *= 42.5;
    if h < 0.0 {
        h += 255.0;
    } else if h > 255.0 {
        h -= 255.0;
    }

    [round(h), round(s), round(l)]
}

pub(crate) fn hsl_to_rgb(hsl: [i32; 3]) -> [u8; 3] {
    let [h, s, l] = hsl;
    if s == 0 {
        let l = l.clamp(0, 255) as u8;
        return [l, l, l];
    }

    let (h, s, l) = (f64::from(h), f64::from(s), f64::from(l));
    let m2 = if l < 128.0 {
        l * (255.0 + s) / 65025.0
    } else {
        (l + s - l * s / 255.0) / 255.0
    };
    let m1 = l / 127.5 - m2;

    [
        hsl_channel(m1, m2, h + 85.0),
        hsl_channel(m1, m2, h),
        hsl_channel(m1, m2, h - 85.0),
    ]
}

fn hsl_channel(n1: f64, n2: f64, mut hue: f64) -> u8 {
    if hue > 255.0 {
        hue -= 255.0;
    } else if hue < 0.0 {
        hue += 255.0;
    }

    let value = if hue < 42.5 {
        n1 + (n2 - n1) * (hue / 42.5)
    } else if hue < 127.5 {
        n2
    } else if hue < 170.0 {
        n1 + (n2 - n1) * ((170.0 - hue) / 42.5)
    } else {
        n1
    };
    to_byte(value)
}

fn to_byte(unit: f64) -> u8 {
    round(unit * 255.0).clamp(0, 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/color.rs"]
mod tests;
