//! Screen geometry computed once per layout.

use std::path::PathBuf;

use crate::{Color, LayoutError, Rect};

// Horizontal extents are fractions of the screen width, vertical ones of the
// screen height unless noted.
const SIDEBAR_HIGHLIGHT_LEFT: f32 = 0.08;
const SIDEBAR_HIGHLIGHT_RIGHT: f32 = 0.22;
const SIDEBAR_HIGHLIGHT_HEIGHT: f32 = 0.065;
/// Fraction of the sidebar width.
const SIDEBAR_CORNER_RADIUS: f32 = 0.012;
/// Fraction of the sidebar highlight height.
const SIDEBAR_FONT_SIZE: f32 = 0.55;
const SIDEBAR_Y_ADVANCE: f32 = 0.068;
/// Fraction of the sidebar width.
const SIDEBAR_TEXT_MARGIN: f32 = 0.07;

const CARD_LEFT_MARGIN: f32 = 0.4;
const CARD_RIGHT_MARGIN: f32 = 0.92;
const CARD_SPACING: f32 = 0.01;
const CARD_ASPECT_RATIO: f32 = 1.333_333_3;

/// Fractions of the card spacing.
const HIGHLIGHT_THICKNESS: f32 = 0.45;
const HIGHLIGHT_INNER_SPACING: f32 = 0.33;
/// Fraction of the card width.
const MENU_HIGHLIGHT_RADIUS: f32 = 0.02;

const SHADOW_BLUR_SLOPE: f32 = 0.010_121_2;
const SHADOW_BLUR_INTERCEPT: f32 = 8.93;

/// Tunables for a layout, usually filled from the user configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub columns: usize,
    pub top_margin: f32,
    pub bottom_margin: f32,
    /// Icon inset inside generated cards, fraction of the card size.
    pub icon_margin: f32,
    pub sidebar_shift_ms: u32,
    pub row_shift_ms: u32,
    pub highlight_shift_ms: u32,
    pub press_ms: u32,
    /// Deepest press inset, fraction of the card width.
    pub press_depth: f32,
    pub background_color: Color,
    pub background_image: Option<PathBuf>,
    pub sidebar_highlight_color: Color,
    pub sidebar_text_color: Color,
    pub sidebar_text_color_highlighted: Color,
    pub menu_highlight_color: Color,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            columns: 3,
            top_margin: 0.2,
            bottom_margin: 1.0,
            icon_margin: 0.10,
            sidebar_shift_ms: 200,
            row_shift_ms: 120,
            highlight_shift_ms: 100,
            press_ms: 150,
            press_depth: 0.04,
            background_color: Color::rgb(0x03, 0x01, 0x6e),
            background_image: None,
            sidebar_highlight_color: Color::WHITE,
            sidebar_text_color: Color::WHITE,
            sidebar_text_color_highlighted: Color::BLACK,
            menu_highlight_color: Color::WHITE,
        }
    }
}

/// Padding needed around an element of height `height` to fit its drop shadow.
pub fn shadow_offset(height: i32) -> i32 {
    let blur = SHADOW_BLUR_SLOPE * height as f32 + SHADOW_BLUR_INTERCEPT;
    (blur * 2.0).round() as i32
}

/// Placement of an icon of `icon_w`x`icon_h` inside a generated card texture.
///
/// Wide icons span the card width minus the margins and are centered
/// vertically; tall icons span the height and are centered horizontally.
/// The returned rect is relative to the texture, which includes the shadow
/// padding.
pub fn fit_icon(
    icon_w: f32,
    icon_h: f32,
    card_w: i32,
    card_h: i32,
    margin: f32,
    shadow_offset: i32,
) -> Rect {
    if icon_w <= 0.0 || icon_h <= 0.0 {
        return Rect::new(shadow_offset, shadow_offset, 0, 0);
    }
    let margin = margin.clamp(0.0, 0.49);
    let (w, h) = (card_w as f32, card_h as f32);

    if icon_w / icon_h > CARD_ASPECT_RATIO {
        let target_w = w * (1.0 - 2.0 * margin);
        let target_h = target_w / icon_w * icon_h;
        Rect::new(
            (margin * w).round() as i32 + shadow_offset,
            (card_h - target_h as i32) / 2 + shadow_offset,
            target_w.round() as i32,
            target_h.round() as i32,
        )
    } else {
        let target_h = h * (1.0 - 2.0 * margin);
        let target_w = target_h / icon_h * icon_w;
        Rect::new(
            (card_w - target_w as i32) / 2 + shadow_offset,
            (margin * h).round() as i32 + shadow_offset,
            target_w.round() as i32,
            target_h.round() as i32,
        )
    }
}

/// Every position and size the layout derives from the screen size.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub screen_width: i32,
    pub screen_height: i32,
    pub columns: usize,
    pub y_min: i32,
    pub y_max: i32,

    pub sidebar_width: i32,
    pub sidebar_height: i32,
    pub sidebar_corner_radius: i32,
    pub sidebar_font_size: i32,
    pub sidebar_y_advance: i32,
    pub sidebar_text_margin: i32,
    pub sidebar_shadow_offset: i32,
    /// Sidebar highlight including its shadow padding.
    pub sidebar_highlight_rect: Rect,
    pub sidebar_text_x: i32,
    pub sidebar_text_max_width: i32,

    pub card_x0: i32,
    pub card_y0: i32,
    pub card_spacing: i32,
    pub card_w: i32,
    pub card_h: i32,
    pub card_shadow_offset: i32,
    pub card_x_advance: i32,
    pub card_y_advance: i32,
    pub max_rows: usize,

    pub highlight_thickness: i32,
    pub highlight_inner_spacing: i32,
    pub highlight_corner_radius: i32,
    pub highlight_shadow_offset: i32,
    /// Menu highlight around card (0, 0), including its shadow padding.
    pub menu_highlight_rect: Rect,
}

impl Geometry {
    pub fn compute(width: i32, height: i32, options: &LayoutOptions) -> Result<Self, LayoutError> {
        if width <= 0 || height <= 0 {
            return Err(LayoutError::InvalidScreenSize(width, height));
        }
        if options.columns == 0 {
            return Err(LayoutError::InvalidColumns);
        }
        let (w, h) = (width as f32, height as f32);
        let columns = options.columns as i32;

        let y_min = (h * options.top_margin).round() as i32;
        let y_max = (h * options.bottom_margin).round() as i32;

        let sidebar_width = (w * (SIDEBAR_HIGHLIGHT_RIGHT - SIDEBAR_HIGHLIGHT_LEFT)).round() as i32;
        let sidebar_height = (h * SIDEBAR_HIGHLIGHT_HEIGHT).round() as i32;
        let sidebar_shadow_offset = shadow_offset(sidebar_height);
        let sidebar_text_margin = (sidebar_width as f32 * SIDEBAR_TEXT_MARGIN).round() as i32;
        let sidebar_highlight_rect = Rect::new(
            (w * SIDEBAR_HIGHLIGHT_LEFT).round() as i32 - sidebar_shadow_offset,
            y_min - sidebar_shadow_offset,
            sidebar_width + 2 * sidebar_shadow_offset,
            sidebar_height + 2 * sidebar_shadow_offset,
        );

        let card_x0 = (w * CARD_LEFT_MARGIN).round() as i32;
        let card_y0 = y_min;
        let card_spacing = (w * CARD_SPACING).round() as i32;
        let card_w = ((w * (CARD_RIGHT_MARGIN - CARD_LEFT_MARGIN)).round() as i32
            - (columns - 1) * card_spacing)
            / columns;
        let card_h = (card_w as f32 / CARD_ASPECT_RATIO).round() as i32;
        let card_shadow_offset = shadow_offset(card_h);
        let card_y_advance = card_h + card_spacing;
        let max_rows = if card_y_advance > 0 {
            ((y_max - y_min) / card_y_advance).max(1) as usize
        } else {
            1
        };

        let highlight_thickness = (card_spacing as f32 * HIGHLIGHT_THICKNESS).round() as i32;
        let highlight_inner_spacing =
            (card_spacing as f32 * HIGHLIGHT_INNER_SPACING).round() as i32;
        let highlight_shadow_offset = card_shadow_offset;
        let ring = highlight_thickness + highlight_inner_spacing;
        let menu_highlight_rect = Rect::new(
            card_x0 - ring - highlight_shadow_offset,
            card_y0 - ring - highlight_shadow_offset,
            card_w + 2 * ring + 2 * highlight_shadow_offset,
            card_h + 2 * ring + 2 * highlight_shadow_offset,
        );

        Ok(Self {
            screen_width: width,
            screen_height: height,
            columns: options.columns,
            y_min,
            y_max,
            sidebar_width,
            sidebar_height,
            sidebar_corner_radius: (sidebar_width as f32 * SIDEBAR_CORNER_RADIUS).round() as i32,
            sidebar_font_size: (sidebar_height as f32 * SIDEBAR_FONT_SIZE).round() as i32,
            sidebar_y_advance: (h * SIDEBAR_Y_ADVANCE).round() as i32,
            sidebar_text_margin,
            sidebar_shadow_offset,
            sidebar_highlight_rect,
            sidebar_text_x: sidebar_highlight_rect.x + sidebar_shadow_offset + sidebar_text_margin,
            sidebar_text_max_width: sidebar_width - 2 * sidebar_text_margin,
            card_x0,
            card_y0,
            card_spacing,
            card_w,
            card_h,
            card_shadow_offset,
            card_x_advance: card_w + card_spacing,
            card_y_advance,
            max_rows,
            highlight_thickness,
            highlight_inner_spacing,
            highlight_corner_radius: (card_w as f32 * MENU_HIGHLIGHT_RADIUS).round() as i32,
            highlight_shadow_offset,
            menu_highlight_rect,
        })
    }

    /// Vertical center of sidebar row `index` before any scrolling.
    pub fn sidebar_row_center(&self, index: usize) -> i32 {
        self.y_min + self.sidebar_height / 2 + index as i32 * self.sidebar_y_advance
    }

    /// Card rect, including shadow padding, at a grid position.
    pub fn card_rect(&self, row: usize, column: usize) -> Rect {
        Rect::new(
            self.card_x0 - self.card_shadow_offset + column as i32 * self.card_x_advance,
            self.card_y0 - self.card_shadow_offset + row as i32 * self.card_y_advance,
            self.card_w + 2 * self.card_shadow_offset,
            self.card_h + 2 * self.card_shadow_offset,
        )
    }

    /// Rendered height of a card grid, never less than the screen.
    pub fn menu_height(&self, total_rows: usize) -> i32 {
        let grid = self.card_y0 - self.card_shadow_offset + total_rows as i32 * self.card_y_advance;
        grid.max(self.screen_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_hd() -> Geometry {
        Geometry::compute(1920, 1080, &LayoutOptions::default()).unwrap()
    }

    #[test]
    fn test_full_hd_viewport_and_cards() {
        let g = full_hd();
        assert_eq!(g.y_min, 216);
        assert_eq!(g.y_max, 1080);
        assert_eq!(g.card_x0, 768);
        assert_eq!(g.card_spacing, 19);
        assert_eq!(g.card_w, 320);
        assert_eq!(g.card_h, 240);
        assert_eq!(g.card_shadow_offset, 23);
        assert_eq!(g.card_y_advance, 259);
        assert_eq!(g.max_rows, 3);
    }

    #[test]
    fn test_full_hd_sidebar() {
        let g = full_hd();
        assert_eq!(g.sidebar_width, 269);
        assert_eq!(g.sidebar_height, 70);
        assert_eq!(g.sidebar_font_size, 39);
        assert_eq!(g.sidebar_y_advance, 73);
        assert_eq!(g.sidebar_shadow_offset, 19);
        assert_eq!(g.sidebar_highlight_rect, Rect::new(135, 197, 307, 108));
        assert_eq!(g.sidebar_text_x, 173);
    }

    #[test]
    fn test_full_hd_highlight_and_card_rects() {
        let g = full_hd();
        assert_eq!(g.menu_highlight_rect, Rect::new(730, 178, 396, 316));
        assert_eq!(g.card_rect(0, 0), Rect::new(745, 193, 366, 286));
        assert_eq!(g.card_rect(1, 2), Rect::new(745 + 2 * 339, 193 + 259, 366, 286));
    }

    #[test]
    fn test_menu_height_is_at_least_screen() {
        let g = full_hd();
        assert_eq!(g.menu_height(1), 1080);
        assert_eq!(g.menu_height(5), 193 + 5 * 259);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            Geometry::compute(0, 1080, &LayoutOptions::default()),
            Err(LayoutError::InvalidScreenSize(0, 1080))
        ));
        let options = LayoutOptions {
            columns: 0,
            ..LayoutOptions::default()
        };
        assert!(matches!(
            Geometry::compute(1920, 1080, &options),
            Err(LayoutError::InvalidColumns)
        ));
    }

    #[test]
    fn test_shadow_offset() {
        assert_eq!(shadow_offset(240), 23);
        assert_eq!(shadow_offset(70), 19);
        assert_eq!(shadow_offset(0), 18);
    }

    #[test]
    fn test_fit_icon_wide_and_tall() {
        // Wide icon spans the width minus margins
        let wide = fit_icon(200.0, 100.0, 320, 240, 0.1, 23);
        assert_eq!(wide, Rect::new(32 + 23, (240 - 128) / 2 + 23, 256, 128));

        // Square icon spans the height minus margins
        let square = fit_icon(64.0, 64.0, 320, 240, 0.1, 0);
        assert_eq!(square, Rect::new((320 - 192) / 2, 24, 192, 192));
    }
}
