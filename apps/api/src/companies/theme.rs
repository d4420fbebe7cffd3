//! Theme extraction — derives a small colour palette from a company logo.
//!
//! Algorithm:
//! 1. Skip pixels with alpha < 128; quantize the rest to 4 bits per channel.
//! 2. Rank buckets by pixel count; each bucket's colour is the mean of its pixels.
//! 3. primary = most frequent bucket that is neither near-white nor near-black.
//! 4. secondary = next bucket far enough from primary; accent = most saturated of the rest.
//! 5. background/text/title are derived from primary so text always stays readable.

use image::RgbaImage;

use crate::models::company::Theme;

type Rgb = [u8; 3];

const MIN_ALPHA: u8 = 128;
const DISTINCT_DISTANCE: f64 = 64.0;
const ACCENT_CANDIDATES: usize = 16;
const BACKGROUND_TINT: f64 = 0.92;
const MIN_TITLE_CONTRAST: f64 = 4.5;
const MAX_DARKEN_STEPS: usize = 10;

const DARK_TEXT: Rgb = [0x1f, 0x29, 0x37];
const LIGHT_TEXT: Rgb = [0xf9, 0xfa, 0xfb];
const WHITE: Rgb = [255, 255, 255];
const BLACK: Rgb = [0, 0, 0];

#[derive(Debug, Clone, Copy)]
struct Bucket {
    key: u16,
    count: u64,
    sum: [u64; 3],
}

impl Bucket {
    fn color(&self) -> Rgb {
        [
            (self.sum[0] / self.count) as u8,
            (self.sum[1] / self.count) as u8,
            (self.sum[2] / self.count) as u8,
        ]
    }
}

pub fn to_hex(c: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", c[0], c[1], c[2])
}

fn linear(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// WCAG relative luminance.
pub fn luminance(c: Rgb) -> f64 {
    0.2126 * linear(c[0]) + 0.7152 * linear(c[1]) + 0.0722 * linear(c[2])
}

/// WCAG contrast ratio, 1.0 – 21.0.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let (la, lb) = (luminance(a), luminance(b));
    let (hi, lo) = if la > lb { (la, lb) } else { (lb, la) };
    (hi + 0.05) / (lo + 0.05)
}

/// Linear blend: `t = 0` keeps `a`, `t = 1` yields `b`.
pub fn mix(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let blend = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round().clamp(0.0, 255.0) as u8;
    [blend(a[0], b[0]), blend(a[1], b[1]), blend(a[2], b[2])]
}

fn darken(c: Rgb, amount: f64) -> Rgb {
    mix(c, BLACK, amount)
}

fn distance(a: Rgb, b: Rgb) -> f64 {
    let d = |x: u8, y: u8| (x as f64 - y as f64).powi(2);
    (d(a[0], b[0]) + d(a[1], b[1]) + d(a[2], b[2])).sqrt()
}

fn saturation(c: Rgb) -> f64 {
    let max = *c.iter().max().unwrap_or(&0) as f64;
    let min = *c.iter().min().unwrap_or(&0) as f64;
    if max == 0.0 {
        0.0
    } else {
        (max - min) / max
    }
}

fn is_near_white(c: Rgb) -> bool {
    c.iter().all(|&v| v > 230)
}

fn is_near_black(c: Rgb) -> bool {
    c.iter().all(|&v| v < 25)
}

fn ranked_buckets(image: &RgbaImage) -> Vec<Bucket> {
    let mut buckets: Vec<Option<Bucket>> = vec![None; 4096];

    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        if a < MIN_ALPHA {
            continue;
        }
        let key = ((r as u16 >> 4) << 8) | ((g as u16 >> 4) << 4) | (b as u16 >> 4);
        let bucket = buckets[key as usize].get_or_insert(Bucket {
            key,
            count: 0,
            sum: [0; 3],
        });
        bucket.count += 1;
        bucket.sum[0] += r as u64;
        bucket.sum[1] += g as u64;
        bucket.sum[2] += b as u64;
    }

    let mut ranked: Vec<Bucket> = buckets.into_iter().flatten().collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    ranked
}

/// Builds the derived colours (background, text, title) around a primary.
fn finish_theme(primary: Rgb, secondary: Rgb, accent: Rgb) -> Theme {
    let background = mix(primary, WHITE, BACKGROUND_TINT);

    let text = if contrast_ratio(DARK_TEXT, background) >= contrast_ratio(LIGHT_TEXT, background) {
        DARK_TEXT
    } else {
        LIGHT_TEXT
    };

    let mut title = primary;
    for _ in 0..MAX_DARKEN_STEPS {
        if contrast_ratio(title, background) >= MIN_TITLE_CONTRAST {
            break;
        }
        title = darken(title, 0.1);
    }

    Theme {
        primary: to_hex(primary),
        secondary: to_hex(secondary),
        accent: to_hex(accent),
        background: to_hex(background),
        text: to_hex(text),
        title: to_hex(title),
    }
}

pub fn extract_theme(image: &RgbaImage) -> Theme {
    let ranked = ranked_buckets(image);
    if ranked.is_empty() {
        return Theme::default();
    }

    let colors: Vec<Rgb> = ranked.iter().map(Bucket::color).collect();

    let primary = colors
        .iter()
        .copied()
        .find(|c| !is_near_white(*c) && !is_near_black(*c))
        .unwrap_or(colors[0]);

    let secondary = colors
        .iter()
        .copied()
        .find(|c| distance(*c, primary) >= DISTINCT_DISTANCE)
        .unwrap_or_else(|| darken(primary, 0.2));

    let accent = colors
        .iter()
        .take(ACCENT_CANDIDATES)
        .copied()
        .filter(|c| {
            distance(*c, primary) >= DISTINCT_DISTANCE && distance(*c, secondary) >= DISTINCT_DISTANCE
        })
        .max_by(|a, b| saturation(*a).total_cmp(&saturation(*b)))
        .unwrap_or(secondary);

    finish_theme(primary, secondary, accent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn parse_hex(value: &str) -> Option<Rgb> {
        let hex = value.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some([channel(0)?, channel(2)?, channel(4)?])
    }

    fn solid(color: [u8; 4]) -> RgbaImage {
        ImageBuffer::from_pixel(10, 10, Rgba(color))
    }

    fn theme_contrast(theme: &Theme, fg: &str) -> f64 {
        contrast_ratio(parse_hex(fg).unwrap(), parse_hex(&theme.background).unwrap())
    }

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(to_hex([0x25, 0x63, 0xeb]), "#2563eb");
        assert_eq!(parse_hex("#2563eb"), Some([0x25, 0x63, 0xeb]));
        assert_eq!(parse_hex("2563eb"), None);
        assert_eq!(parse_hex("#25z3eb"), None);
        assert_eq!(parse_hex("#aébcd"), None);
    }

    #[test]
    fn test_contrast_black_on_white_is_21() {
        assert!((contrast_ratio(BLACK, WHITE) - 21.0).abs() < 0.01);
        assert!((contrast_ratio(WHITE, WHITE) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_solid_logo_primary_and_fallbacks() {
        let theme = extract_theme(&solid([255, 0, 0, 255]));
        assert_eq!(theme.primary, "#ff0000");
        assert_eq!(theme.secondary, "#cc0000");
        assert_eq!(theme.accent, theme.secondary);
        assert_eq!(theme.background, "#ffebeb");
        assert_eq!(theme.text, "#1f2937");
    }

    #[test]
    fn test_title_meets_contrast() {
        let theme = extract_theme(&solid([255, 0, 0, 255]));
        assert!(theme_contrast(&theme, &theme.title) >= MIN_TITLE_CONTRAST);
        assert!(theme_contrast(&theme, &theme.text) >= MIN_TITLE_CONTRAST);
    }

    #[test]
    fn test_white_background_does_not_become_primary() {
        let mut img: RgbaImage = ImageBuffer::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        for x in 0..4 {
            for y in 0..10 {
                img.put_pixel(x, y, Rgba([0, 0, 255, 255]));
            }
        }
        let theme = extract_theme(&img);
        assert_eq!(theme.primary, "#0000ff");
        assert_eq!(theme.secondary, "#ffffff");
    }

    #[test]
    fn test_accent_is_most_saturated_distinct_colour() {
        let mut img: RgbaImage = ImageBuffer::from_pixel(10, 10, Rgba([0, 0, 160, 255]));
        for y in 0..10 {
            for x in 0..3 {
                img.put_pixel(x, y, Rgba([128, 128, 128, 255]));
            }
            img.put_pixel(9, y, Rgba([255, 200, 0, 255]));
        }
        let theme = extract_theme(&img);
        assert_eq!(theme.primary, "#0000a0");
        assert_eq!(theme.secondary, "#808080");
        assert_eq!(theme.accent, "#ffc800");
    }

    #[test]
    fn test_transparent_image_yields_default() {
        assert_eq!(extract_theme(&solid([10, 200, 10, 0])), Theme::default());
    }
}
