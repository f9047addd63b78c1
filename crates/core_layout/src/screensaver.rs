//! Idle dimming of the launcher screen.

use crate::{BlendMode, Color, Compositor, CompositorError, Rect, TextureId, TextureSpec};

/// Time for the screensaver to fade in fully.
pub const SCREENSAVER_TRANSITION_MS: u64 = 2000;

/// Fades a black overlay in after a period without input.
#[derive(Debug, Clone)]
pub struct Screensaver {
    idle_ms: u64,
    max_alpha: u8,
    active: bool,
    alpha: f32,
    last_update: u64,
    texture: Option<TextureId>,
    area: Rect,
}

impl Screensaver {
    /// `intensity` is the final overlay opacity, clamped to `0.1..=1.0`.
    pub fn new(idle_ms: u64, intensity: f32) -> Self {
        let max_alpha = (255.0 * intensity.clamp(0.1, 1.0)).round() as u8;
        Self {
            idle_ms,
            max_alpha,
            active: false,
            alpha: 0.0,
            last_update: 0,
            texture: None,
            area: Rect::default(),
        }
    }

    /// Create the overlay texture covering a `width`x`height` screen.
    pub fn load(
        &mut self,
        compositor: &mut dyn Compositor,
        width: i32,
        height: i32,
    ) -> Result<(), CompositorError> {
        let info = compositor.create_texture(&TextureSpec::Solid {
            color: Color::BLACK,
            width,
            height,
        })?;
        compositor.set_blend_mode(info.id, BlendMode::Blend);
        compositor.set_alpha_mod(info.id, 0);
        self.texture = Some(info.id);
        self.area = Rect::sized(width, height);
        Ok(())
    }

    pub fn release(&mut self, compositor: &mut dyn Compositor) {
        if let Some(id) = self.texture.take() {
            compositor.destroy_texture(id);
        }
    }

    /// Activate, fade or deactivate based on the time since the last input.
    pub fn update(&mut self, now: u64, last_input: u64) {
        let idle = now.saturating_sub(last_input) >= self.idle_ms;
        match (idle, self.active) {
            (true, false) => {
                tracing::debug!("Screensaver activated");
                self.active = true;
                self.alpha = 0.0;
            }
            (true, true) => {
                let elapsed = now.saturating_sub(self.last_update) as f32;
                let rate = self.max_alpha as f32 / SCREENSAVER_TRANSITION_MS as f32;
                self.alpha = (self.alpha + rate * elapsed).min(self.max_alpha as f32);
            }
            (false, true) => {
                tracing::debug!("Screensaver deactivated");
                self.active = false;
                self.alpha = 0.0;
            }
            (false, false) => {}
        }
        self.last_update = now;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn alpha(&self) -> u8 {
        self.alpha.round() as u8
    }

    /// Draw the overlay on top of the current frame.
    pub fn draw(&self, compositor: &mut dyn Compositor) {
        let Some(texture) = self.texture else {
            return;
        };
        if !self.active || self.alpha() == 0 {
            return;
        }
        compositor.set_alpha_mod(texture, self.alpha());
        compositor.copy(texture, None, self.area);
    }
}
