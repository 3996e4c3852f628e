use iced::color;
use iced::theme::Palette;
use iced::{Color, Theme};

use facelens_core::annotation::domain::drawing_surface::Rgb;
use facelens_core::annotation::domain::overlay::OverlayStyle;
use facelens_core::ui::notifications::Severity;

/// Picks the light or dark palette from the OS setting. Resolved once at
/// startup.
pub fn resolve_theme() -> Theme {
    if detect_system_dark_mode() {
        Theme::custom("FaceLens Dark", dark_palette())
    } else {
        Theme::custom("FaceLens Light", light_palette())
    }
}

fn dark_palette() -> Palette {
    Palette {
        background: color!(0x17, 0x19, 0x1c),
        text: color!(0xd8, 0xdb, 0xe0),
        primary: color!(0x4f, 0x9d, 0xf7),
        success: color!(0x3c, 0xc7, 0x6a),
        warning: color!(0xf2, 0xb8, 0x2c),
        danger: color!(0xf2, 0x55, 0x4a),
    }
}

fn light_palette() -> Palette {
    Palette {
        background: color!(0xf7, 0xf8, 0xfa),
        text: color!(0x1f, 0x23, 0x28),
        primary: color!(0x1f, 0x6f, 0xeb),
        success: color!(0x1f, 0x9d, 0x55),
        warning: color!(0xc2, 0x7c, 0x0e),
        danger: color!(0xd1, 0x24, 0x2f),
    }
}

pub fn severity_color(severity: Severity, theme: &Theme) -> Color {
    let palette = theme.palette();
    match severity {
        Severity::Info => palette.primary,
        Severity::Success => palette.success,
        Severity::Error => palette.danger,
    }
}

/// Overlay colors are drawn into the frame as raw RGB; labels reuse them.
pub fn overlay_color(rgb: Rgb) -> Color {
    Color::from_rgb8(rgb[0], rgb[1], rgb[2])
}

/// Box colors for the live overlay: the palette's success green for known
/// faces, its danger red for unknown ones.
pub fn overlay_style(theme: &Theme) -> OverlayStyle {
    let palette = theme.palette();
    OverlayStyle {
        known: to_rgb(palette.success),
        unknown: to_rgb(palette.danger),
    }
}

fn to_rgb(color: Color) -> Rgb {
    let [r, g, b, _] = color.into_rgba8();
    [r, g, b]
}

pub fn muted_color(theme: &Theme) -> Color {
    Color {
        a: 0.6,
        ..theme.palette().text
    }
}

fn detect_system_dark_mode() -> bool {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).trim() == "Dark")
            .unwrap_or(false)
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}
