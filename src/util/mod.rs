pub mod simba;
mod stats;

pub use stats::Stats;

pub type Color = rgb::RGB<f32>;

pub const BLACK: Color = Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
};

/// Clamps every channel of the color to at most `max`.
pub fn clamp_max(color: Color, max: f32) -> Color {
    Color::new(color.r.min(max), color.g.min(max), color.b.min(max))
}

/// Maps a 0-1 f32 rgb pixel to 8 bit channels, rounding and clamping to 0-255.
pub fn color_to_bytes(color: Color) -> [u8; 3] {
    [
        (color.r * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.g * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.b * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}
