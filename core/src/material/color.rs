//! Gamma conversion between linear and display-space colors.

/// Gamma used by glTF linear color factors.
pub const DEFAULT_GAMMA: f32 = 2.2;

/// Encode a linear channel into display space: `c^(1/gamma)`.
pub fn to_display(channel: f32, gamma: f32) -> f32 {
    channel.max(0.0).powf(1.0 / gamma)
}

/// Decode a display-space channel into linear space: `c^gamma`.
pub fn to_linear(channel: f32, gamma: f32) -> f32 {
    channel.max(0.0).powf(gamma)
}

/// Encode an RGB triple into display space.
pub fn rgb_to_display(rgb: [f32; 3], gamma: f32) -> [f32; 3] {
    rgb.map(|c| to_display(c, gamma))
}
