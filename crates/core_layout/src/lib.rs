//! Marquee Core Layout Engine
//!
//! Platform-agnostic navigation and animation engine for the Marquee launcher.
//!
//! The launcher shows a sidebar of menus and commands. Every menu owns a grid
//! of launch cards. This crate implements:
//! - The two-level navigation state machine (sidebar and card grid)
//! - Velocity-based shifts animating sidebar scrolling, grid paging and
//!   highlight movement
//! - The press animation played on a card before its command fires
//! - Viewport clipping for elements partially scrolled off screen
//!
//! Rasterization, fonts, audio and process launching live outside this crate;
//! they are reached through the [`Compositor`] and [`CommandSink`] traits.

mod compositor;
mod description;
mod draw;
mod geometry;
mod layout;
mod navigation;
mod press;
mod screensaver;
mod shift;

#[cfg(test)]
pub(crate) mod testing;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use compositor::{
    classify, clip_to_viewport, BlendMode, ClippedCopy, Compositor, CompositorError, TextureId,
    TextureInfo, TextureSpec, Visibility,
};
pub use description::{Background, CardArt, EntryDescription, LayoutDescription, SidebarItem};
pub use geometry::{fit_icon, shadow_offset, Geometry, LayoutOptions};
pub use layout::{
    CommandSink, Entry, Highlight, Layout, Menu, MenuId, SelectionMode, SidebarEntry, SidebarKind,
};
pub use press::{PressPhase, PressedEntry};
pub use screensaver::{Screensaver, SCREENSAVER_TRANSITION_MS};
pub use shift::{Shift, ShiftKind, ShiftQueue, ShiftStep};

/// Errors that can occur while building a layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Layout has no usable sidebar entries")]
    EmptyLayout,

    #[error("Invalid screen size {0}x{1}")]
    InvalidScreenSize(i32, i32),

    #[error("Column count must be at least 1")]
    InvalidColumns,

    #[error(transparent)]
    Compositor(#[from] CompositorError),
}

/// A rectangle in screen coordinates (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// A rectangle at the origin with the given size.
    pub fn sized(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Check if this rectangle intersects with another.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Overlapping area of two rectangles, if any.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// The same rectangle moved by an offset.
    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Shrink symmetrically by `dx` on the left/right and `dy` on the top/bottom.
    pub fn inset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.x + dx,
            self.y + dy,
            (self.width - 2 * dx).max(0),
            (self.height - 2 * dy).max(0),
        )
    }
}

/// Error returned when a color string is not `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid color '{0}', expected #rrggbb")]
pub struct ColorParseError(pub String);

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    /// Create an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// Parse a `#rrggbb` hex string.
    pub fn from_hex(value: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError(value.to_string());
        let digits = value.strip_prefix('#').ok_or_else(err)?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let hex = u32::from_str_radix(digits, 16).map_err(|_| err())?;
        Ok(Color::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Direction of a navigation step or a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The direction pointing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Whether this direction moves along the x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Sign applied to a distance travelled in this direction.
    /// Up and left decrease screen coordinates.
    pub fn sign(self) -> i32 {
        match self {
            Direction::Up | Direction::Left => -1,
            Direction::Down | Direction::Right => 1,
        }
    }
}
