// src/ui/widgets.rs
//! Drawing routines for the fixed dashboard layout
//!
//! The screen is split into a menu bar across the top (application icons on
//! the left, signal strength on the right), a bordered clock panel on the
//! left and the interactive application region on the right:
//!
//! ```text
//! +--------------------------------------------------+
//! | Themes |                                   .ıl   |  <- menu bar (y 0..25)
//! |==================================================|
//! | +------------------+  +------------------------+ |
//! | |   12             |  |                        | |
//! | |   34             |  |    application region  | |
//! | | 19 - 08 - 2025   |  |                        | |
//! | +------------------+  +------------------------+ |
//! +--------------------------------------------------+
//! ```
//!
//! Every routine draws in theme colours only and returns the display's
//! error unchanged.

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::{FONT_8X13, FONT_10X20};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle, RoundedRectangle};
use embedded_graphics::text::{Baseline, Text};
use profont::PROFONT_24_POINT;

use crate::clock::LocalTime;
use crate::config::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use crate::network::signal_bars;
use crate::ui::Theme;

/// Height of the menu bar, not counting the divider line
pub const MENU_BAR_HEIGHT: u32 = 25;

/// Thickness of the line under the menu bar
pub const MENU_DIVIDER_HEIGHT: u32 = 5;

/// Bordered panel holding the clock
pub const CLOCK_PANEL: Rectangle = Rectangle::new(Point::new(10, 35), Size::new(147, 195));

/// Area owned by the active application (cleared on activation)
pub const APP_REGION: Rectangle = Rectangle::new(Point::new(162, 35), Size::new(147, 195));

/// Right-hand interface area cut out of the layout background
const APP_CANVAS: Rectangle = Rectangle::new(Point::new(170, 40), Size::new(135, 180));

const BORDER_OUTER_RADIUS: u32 = 20;
const BORDER_INNER_RADIUS: u32 = 15;
const BORDER_THICKNESS: u32 = 5;

/// Top-left of the signal indicator; bars grow upward from `y + 7`
const SIGNAL_ORIGIN: Point = Point::new(DISPLAY_WIDTH_PX as i32 - 30, 14);
const SIGNAL_BAR_WIDTH: u32 = 3;
const SIGNAL_BAR_HEIGHT: u32 = 7;
const SIGNAL_BAR_SPACING: i32 = 2;
const SIGNAL_BAR_GROWTH: u32 = 3;

const GRID_SPACING: usize = 10;

pub fn screen_bounds() -> Rectangle {
    Rectangle::new(
        Point::zero(),
        Size::new(DISPLAY_WIDTH_PX as u32, DISPLAY_HEIGHT_PX as u32),
    )
}

/// Fill `area` with `color`.
pub fn fill_rect<D>(display: &mut D, area: Rectangle, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    area.into_styled(PrimitiveStyle::with_fill(color))
        .draw(display)
}

/// Rounded frame: an outer rounded rectangle in `border` with a smaller
/// rounded rectangle in `inner` inset by the border thickness.
pub fn draw_border<D>(
    display: &mut D,
    area: Rectangle,
    border: Rgb565,
    inner: Rgb565,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    RoundedRectangle::with_equal_corners(
        area,
        Size::new(BORDER_OUTER_RADIUS, BORDER_OUTER_RADIUS),
    )
    .into_styled(PrimitiveStyle::with_fill(border))
    .draw(display)?;

    let inset = area.offset(-(BORDER_THICKNESS as i32));
    RoundedRectangle::with_equal_corners(
        inset,
        Size::new(BORDER_INNER_RADIUS, BORDER_INNER_RADIUS),
    )
    .into_styled(PrimitiveStyle::with_fill(inner))
    .draw(display)
}

/// Draw `text` with its top-left corner at `origin`, over an opaque
/// background so it overwrites whatever was there.
pub fn draw_label<D>(
    display: &mut D,
    text: &str,
    origin: Point,
    font: &MonoFont<'_>,
    color: Rgb565,
    background: Rgb565,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let style = MonoTextStyleBuilder::new()
        .font(font)
        .text_color(color)
        .background_color(background)
        .build();
    Text::with_baseline(text, origin, style, Baseline::Top).draw(display)?;
    Ok(())
}

/// Full-screen frame: background, outer border, menu bar divider, clock
/// panel and the empty application canvas.
pub fn draw_menu_layout<D>(display: &mut D, theme: &Theme) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let screen = screen_bounds();
    fill_rect(display, screen, theme.back)?;
    draw_border(display, screen, theme.fore, theme.back)?;
    fill_rect(
        display,
        Rectangle::new(
            Point::new(0, MENU_BAR_HEIGHT as i32),
            Size::new(screen.size.width, MENU_DIVIDER_HEIGHT),
        ),
        theme.fore,
    )?;
    draw_border(display, CLOCK_PANEL, theme.fore, theme.back)?;
    fill_rect(display, APP_CANVAS, theme.back)
}

/// Clear the application region to the theme background.
pub fn clear_app_region<D>(display: &mut D, theme: &Theme) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    fill_rect(display, APP_REGION, theme.back)
}

/// Clock face: large hour and minute, AM/PM marker and the date.
pub fn draw_clock<D>(display: &mut D, theme: &Theme, time: &LocalTime) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    // Interior of the clock panel; clears digits left over from a wider hour
    let face = CLOCK_PANEL.offset(-(BORDER_THICKNESS as i32 + 2));
    fill_rect(display, face, theme.back)?;

    let mut buf: heapless::String<16> = heapless::String::new();

    let hour = time.hour12();
    let hour_x = if hour >= 10 { 40 } else { 60 };
    write!(buf, "{}", hour).ok();
    draw_label(
        display,
        &buf,
        Point::new(hour_x, 47),
        &PROFONT_24_POINT,
        theme.text,
        theme.back,
    )?;

    buf.clear();
    write!(buf, "{:02}", time.minute).ok();
    draw_label(
        display,
        &buf,
        Point::new(40, 127),
        &PROFONT_24_POINT,
        theme.text,
        theme.back,
    )?;

    draw_label(
        display,
        time.meridiem(),
        Point::new(20, 50),
        &FONT_8X13,
        theme.text,
        theme.back,
    )?;

    buf.clear();
    write!(buf, "{:02} - {:02} - {}", time.day, time.month, time.year).ok();
    draw_label(
        display,
        &buf,
        Point::new(40, 205),
        &FONT_8X13,
        theme.text,
        theme.back,
    )
}

/// Up to three bars at the right of the menu bar; `None` (no link) draws none.
pub fn draw_signal_strength<D>(
    display: &mut D,
    theme: &Theme,
    rssi: Option<i8>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let origin = SIGNAL_ORIGIN;
    fill_rect(
        display,
        Rectangle::new(origin - Point::new(0, 6), Size::new(13, 13)),
        theme.back,
    )?;

    let bars = rssi.map(signal_bars).unwrap_or(0);
    for i in 0..bars as u32 {
        let grow = i * SIGNAL_BAR_GROWTH;
        let top_left = origin
            + Point::new(
                i as i32 * (SIGNAL_BAR_WIDTH as i32 + SIGNAL_BAR_SPACING),
                -(grow as i32),
            );
        fill_rect(
            display,
            Rectangle::new(top_left, Size::new(SIGNAL_BAR_WIDTH, SIGNAL_BAR_HEIGHT + grow)),
            theme.fore,
        )?;
    }
    Ok(())
}

/// 10 px alignment grid over the whole screen, for layout work.
pub fn draw_grid<D>(display: &mut D, theme: &Theme) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let width = DISPLAY_WIDTH_PX as i32;
    let height = DISPLAY_HEIGHT_PX as i32;
    let style = PrimitiveStyle::with_stroke(theme.high, 1);

    for x in (0..width).step_by(GRID_SPACING) {
        Line::new(Point::new(x, 0), Point::new(x, height))
            .into_styled(style)
            .draw(display)?;
    }
    for y in (0..height).step_by(GRID_SPACING) {
        Line::new(Point::new(0, y), Point::new(width, y))
            .into_styled(style)
            .draw(display)?;
    }
    Ok(())
}

/// Font used for menu-bar icons and small labels
pub const LABEL_FONT: &MonoFont<'static> = &FONT_8X13;

/// Font used for prominent app controls
pub const CONTROL_FONT: &MonoFont<'static> = &FONT_10X20;
