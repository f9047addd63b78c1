//! Abstract 2D compositing surface consumed by the layout.
//!
//! Backends rasterize [`TextureSpec`]s into opaque [`TextureId`]s and blit
//! them onto a render target. Everything the layout draws goes through
//! [`Compositor::copy`], usually after [`clip_to_viewport`] has trimmed the
//! parts outside the vertical viewport.

use std::path::PathBuf;

use thiserror::Error;

use crate::{CardArt, Color, Rect};

/// Handle to a texture owned by a compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Size of a created texture as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub id: TextureId,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    None,
    #[default]
    Blend,
}

/// What a texture should contain. Sizes include any shadow padding.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSpec {
    /// A single line of text; the backend decides the final size.
    Text {
        text: String,
        font_size: i32,
        max_width: i32,
    },
    /// Rounded bar behind the current sidebar entry.
    SidebarHighlight {
        width: i32,
        height: i32,
        corner_radius: i32,
        color: Color,
        shadow_offset: i32,
    },
    /// Outline drawn around the selected card.
    MenuHighlight {
        width: i32,
        height: i32,
        thickness: i32,
        corner_radius: i32,
        color: Color,
        shadow_offset: i32,
    },
    /// A launch card with drop shadow.
    Card {
        art: CardArt,
        title: String,
        width: i32,
        height: i32,
        shadow_offset: i32,
        icon_margin: f32,
    },
    /// Placeholder shown for cards whose art failed to load.
    ErrorCard {
        width: i32,
        height: i32,
        shadow_offset: i32,
    },
    /// Full-screen background image.
    Background {
        path: PathBuf,
        width: i32,
        height: i32,
    },
    /// Flat color fill.
    Solid {
        color: Color,
        width: i32,
        height: i32,
    },
}

#[derive(Debug, Error)]
pub enum CompositorError {
    #[error("Failed to load asset {path}: {reason}")]
    AssetLoad { path: PathBuf, reason: String },

    #[error("Render backend error: {0}")]
    Backend(String),
}

/// Render target with blit semantics.
pub trait Compositor {
    fn create_texture(&mut self, spec: &TextureSpec) -> Result<TextureInfo, CompositorError>;

    /// Copy `src` of a texture (the whole texture when `None`) into `dst`.
    fn copy(&mut self, texture: TextureId, src: Option<Rect>, dst: Rect);

    fn set_blend_mode(&mut self, texture: TextureId, mode: BlendMode);

    /// Tint applied to the texture on subsequent copies.
    fn set_color_mod(&mut self, texture: TextureId, color: Color);

    fn set_alpha_mod(&mut self, texture: TextureId, alpha: u8);

    fn destroy_texture(&mut self, texture: TextureId);

    fn clear(&mut self, color: Color);

    fn present(&mut self) -> Result<(), CompositorError>;
}

/// Where a rectangle sits relative to a vertical viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Above,
    StraddlingTop,
    StraddlingBottom,
    Visible,
    Below,
}

/// Classify `rect` against `[y_min, y_max]`.
///
/// A rect taller than the viewport that crosses both bounds reports
/// `StraddlingTop`; [`clip_to_viewport`] trims both ends in that case.
pub fn classify(rect: &Rect, y_min: i32, y_max: i32) -> Visibility {
    if rect.bottom() <= y_min {
        Visibility::Above
    } else if rect.y >= y_max {
        Visibility::Below
    } else if rect.y < y_min {
        Visibility::StraddlingTop
    } else if rect.bottom() > y_max {
        Visibility::StraddlingBottom
    } else {
        Visibility::Visible
    }
}

/// Source and destination of a clipped copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClippedCopy {
    pub src: Rect,
    pub dst: Rect,
}

/// Trim a 1:1 copy so only the part of `dst` inside `[y_min, y_max]` is drawn.
pub fn clip_to_viewport(src: Rect, dst: Rect, y_min: i32, y_max: i32) -> Option<ClippedCopy> {
    let mut src = src;
    let mut dst = dst;

    match classify(&dst, y_min, y_max) {
        Visibility::Above | Visibility::Below => return None,
        Visibility::Visible => {}
        Visibility::StraddlingTop => {
            let cut = y_min - dst.y;
            src.y += cut;
            src.height -= cut;
            dst.y = y_min;
            dst.height -= cut;
        }
        Visibility::StraddlingBottom => {}
    }

    if dst.bottom() > y_max {
        let keep = y_max - dst.y;
        src.height = keep;
        dst.height = keep;
    }

    Some(ClippedCopy { src, dst })
}

#[cfg(test)]
mod tests {
    use super::*;

    const Y_MIN: i32 = 216;
    const Y_MAX: i32 = 1080;

    #[test]
    fn test_classify_five_cases() {
        assert_eq!(classify(&Rect::new(0, 100, 10, 116), Y_MIN, Y_MAX), Visibility::Above);
        assert_eq!(
            classify(&Rect::new(0, 200, 10, 50), Y_MIN, Y_MAX),
            Visibility::StraddlingTop
        );
        assert_eq!(
            classify(&Rect::new(0, 1050, 10, 50), Y_MIN, Y_MAX),
            Visibility::StraddlingBottom
        );
        assert_eq!(classify(&Rect::new(0, 216, 10, 864), Y_MIN, Y_MAX), Visibility::Visible);
        assert_eq!(classify(&Rect::new(0, 1080, 10, 5), Y_MIN, Y_MAX), Visibility::Below);
    }

    #[test]
    fn test_fully_visible_copy_is_unchanged() {
        let src = Rect::new(0, 0, 300, 70);
        let dst = Rect::new(173, 400, 300, 70);
        let clipped = clip_to_viewport(src, dst, Y_MIN, Y_MAX).unwrap();
        assert_eq!(clipped.src, src);
        assert_eq!(clipped.dst, dst);
    }

    #[test]
    fn test_straddling_top_keeps_bottom_part() {
        let src = Rect::new(0, 0, 300, 70);
        let dst = Rect::new(173, 200, 300, 70);
        let clipped = clip_to_viewport(src, dst, Y_MIN, Y_MAX).unwrap();

        assert_eq!(clipped.src, Rect::new(0, 16, 300, 54));
        assert_eq!(clipped.dst, Rect::new(173, Y_MIN, 300, 54));
        // Clipped height plus the truncated part is the original height
        assert_eq!(clipped.dst.height + (Y_MIN - dst.y), dst.height);
    }

    #[test]
    fn test_straddling_bottom_keeps_top_part() {
        let src = Rect::new(10, 5, 300, 70);
        let dst = Rect::new(173, 1040, 300, 70);
        let clipped = clip_to_viewport(src, dst, Y_MIN, Y_MAX).unwrap();

        assert_eq!(clipped.src, Rect::new(10, 5, 300, 40));
        assert_eq!(clipped.dst, Rect::new(173, 1040, 300, 40));
    }

    #[test]
    fn test_rect_taller_than_viewport_is_trimmed_both_ends() {
        let src = Rect::new(0, 0, 100, 1000);
        let dst = Rect::new(0, 100, 100, 1000);
        let clipped = clip_to_viewport(src, dst, 200, 800).unwrap();
        assert_eq!(clipped.src, Rect::new(0, 100, 100, 600));
        assert_eq!(clipped.dst, Rect::new(0, 200, 100, 600));
    }

    #[test]
    fn test_outside_viewport_is_skipped() {
        let r = Rect::new(0, 0, 10, 10);
        assert_eq!(clip_to_viewport(r, r, 10, 100), None);
        assert_eq!(clip_to_viewport(r, r.translated(0, 100), 10, 100), None);
    }
}
