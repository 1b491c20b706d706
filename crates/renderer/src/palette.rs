//! Light color palette (paletton 7031k0kmQLddcXoiBSgqrBatyrD).

/// Linear RGB in `[0, 1]`.
pub type Color = [f32; 3];

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

pub const RED: Color = rgb(255, 86, 73);
pub const LIGHTER_RED: Color = rgb(255, 158, 150);
pub const LIGHT_RED: Color = rgb(255, 118, 107);
pub const DARK_RED: Color = rgb(255, 60, 44);
pub const DARKER_RED: Color = rgb(220, 32, 17);

pub const YELLOW: Color = rgb(255, 221, 73);
pub const LIGHTER_YELLOW: Color = rgb(255, 235, 150);
pub const LIGHT_YELLOW: Color = rgb(255, 227, 107);
pub const DARK_YELLOW: Color = rgb(255, 216, 44);
pub const DARKER_YELLOW: Color = rgb(220, 182, 17);

pub const BLUE: Color = rgb(107, 80, 216);
pub const LIGHTER_BLUE: Color = rgb(174, 157, 246);
pub const LIGHT_BLUE: Color = rgb(138, 114, 233);
pub const DARK_BLUE: Color = rgb(80, 52, 191);
pub const DARKER_BLUE: Color = rgb(53, 29, 152);

pub const GREEN: Color = rgb(65, 225, 93);
pub const LIGHTER_GREEN: Color = rgb(146, 248, 164);
pub const LIGHT_GREEN: Color = rgb(100, 239, 124);
pub const DARK_GREEN: Color = rgb(36, 207, 66);
pub const DARKER_GREEN: Color = rgb(13, 168, 40);

pub const FAINT_TEXT: Color = rgb(150, 150, 150);
pub const TEXT: Color = rgb(0, 0, 0);
pub const BACKGROUND: Color = rgb(255, 255, 255);

// axis triad
pub const X_AXIS: Color = DARKER_RED;
pub const Y_AXIS: Color = DARKER_GREEN;
pub const Z_AXIS: Color = DARKER_BLUE;

// link visuals
pub const LINK_BODY: Color = LIGHTER_BLUE;
pub const BASE_HINGE: Color = DARK_YELLOW;
pub const TIP_HINGE: Color = LIGHTER_YELLOW;
pub const PRISMATIC_TRAVEL: Color = DARKER_YELLOW;
