//! Press feedback played on a card before its command fires.

use crate::Rect;

/// Phase of a press animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressPhase {
    /// The card shrinks toward its deepest inset.
    Ascending,
    /// The card grows back to its original bounds.
    Descending,
}

/// A card being pressed. At most one exists at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct PressedEntry {
    /// Sidebar index of the menu owning the card.
    pub menu: usize,
    /// Index of the card within the menu.
    pub entry: usize,
    pub phase: PressPhase,
    /// Current horizontal inset in pixels.
    pub current: f32,
    /// Deepest inset in pixels.
    pub total: f32,
    /// Pixels per millisecond, shared by both phases.
    pub velocity: f32,
    pub start_time: u64,
    last_tick: u64,
    finished: bool,
}

impl PressedEntry {
    /// Start a press on `entry` of `menu`.
    ///
    /// `depth` is the deepest inset as a fraction of the card width and
    /// `duration_ms` covers both phases.
    pub fn new(
        menu: usize,
        entry: usize,
        card_width: i32,
        depth: f32,
        duration_ms: u32,
        now: u64,
    ) -> Self {
        let total = (card_width as f32 * depth.clamp(0.0, 0.5)).round();
        let velocity = 2.0 * total / duration_ms.max(1) as f32;
        Self {
            menu,
            entry,
            phase: PressPhase::Ascending,
            current: 0.0,
            total,
            velocity,
            start_time: now,
            last_tick: now,
            finished: false,
        }
    }

    /// Advance the animation. Returns true on the one update where the card
    /// is back at its original size; the caller then fires the command.
    pub fn update(&mut self, now: u64) -> bool {
        if self.finished {
            return false;
        }
        let delta = self.velocity * now.saturating_sub(self.last_tick) as f32;
        self.last_tick = now;

        match self.phase {
            PressPhase::Ascending => {
                self.current += delta;
                if self.current >= self.total {
                    let overshoot = self.current - self.total;
                    self.current = self.total - overshoot;
                    self.phase = PressPhase::Descending;
                    if self.current <= 0.0 {
                        return self.finish();
                    }
                }
                false
            }
            PressPhase::Descending => {
                self.current -= delta;
                if self.current <= 0.0 {
                    return self.finish();
                }
                false
            }
        }
    }

    fn finish(&mut self) -> bool {
        self.current = 0.0;
        self.finished = true;
        true
    }

    /// The card rectangle inset by the current displacement, keeping its
    /// aspect ratio.
    pub fn apply(&self, rect: Rect) -> Rect {
        if rect.width <= 0 {
            return rect;
        }
        let dx = self.current.round() as i32;
        let dy = (self.current * rect.height as f32 / rect.width as f32).round() as i32;
        rect.inset(dx, dy)
    }
}
