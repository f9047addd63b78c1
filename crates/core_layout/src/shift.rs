//! Velocity-based shift scheduler.
//!
//! A [`Shift`] moves one animatable property by `target` pixels at a constant
//! velocity. The [`ShiftQueue`] owns every in-flight shift, merges requests on
//! the same channel and reports the per-tick movement as [`ShiftStep`]s which
//! the layout applies to its rectangles.

use crate::Direction;

/// What a shift animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftKind {
    /// Sidebar texts and the sidebar highlight.
    Sidebar,
    /// Vertical offset of the menu at this sidebar index.
    Menu(usize),
    /// The menu selection highlight.
    Highlight,
}

/// One in-flight animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Shift {
    pub kind: ShiftKind,
    pub direction: Direction,
    /// Clock value (ms) at which the shift was created or last retargeted.
    pub start_time: u64,
    /// Pixels per millisecond.
    pub velocity: f32,
    /// Distance travelled so far, always within `0..=target`.
    pub total: i32,
    pub target: i32,
    last_tick: u64,
    progress: f32,
}

impl Shift {
    fn new(kind: ShiftKind, direction: Direction, target: i32, velocity: f32, now: u64) -> Self {
        Self {
            kind,
            direction,
            start_time: now,
            velocity,
            total: 0,
            target,
            last_tick: now,
            progress: 0.0,
        }
    }

    /// Distance still to travel.
    pub fn remaining(&self) -> i32 {
        self.target - self.total
    }

    /// Whether this shift occupies the same channel as a request.
    /// Highlight shifts are independent per axis.
    fn same_channel(&self, kind: ShiftKind, direction: Direction) -> bool {
        self.kind == kind
            && (kind != ShiftKind::Highlight
                || self.direction.is_horizontal() == direction.is_horizontal())
    }
}

/// Movement produced by one shift during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftStep {
    pub kind: ShiftKind,
    pub direction: Direction,
    /// Pixels travelled this tick (unsigned).
    pub amount: i32,
    /// The shift reached its target and has been removed.
    pub finished: bool,
}

impl ShiftStep {
    /// Screen-space delta, negative for up and left.
    pub fn delta(&self) -> i32 {
        self.amount * self.direction.sign()
    }
}

/// Ordered collection of in-flight shifts.
#[derive(Debug, Default, Clone)]
pub struct ShiftQueue {
    shifts: Vec<Shift>,
}

impl ShiftQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shift> {
        self.shifts.iter()
    }

    /// The live shift for a channel, if any.
    pub fn find(&self, kind: ShiftKind, direction: Direction) -> Option<&Shift> {
        self.shifts.iter().find(|s| s.same_channel(kind, direction))
    }

    /// Request a movement of `target` pixels over `duration_ms`.
    ///
    /// An opposite-direction shift on the same channel is retargeted in place
    /// to `target - remaining`, keeping its velocity so the motion does not
    /// snap. A same-direction shift absorbs the request as extra distance.
    pub fn add(
        &mut self,
        kind: ShiftKind,
        direction: Direction,
        target: i32,
        duration_ms: u32,
        now: u64,
    ) {
        if target <= 0 {
            return;
        }
        let duration = duration_ms.max(1) as f32;

        let Some(index) = self
            .shifts
            .iter()
            .position(|s| s.same_channel(kind, direction))
        else {
            let velocity = target as f32 / duration;
            tracing::trace!(?kind, ?direction, target, velocity, "Shift queued");
            self.shifts
                .push(Shift::new(kind, direction, target, velocity, now));
            return;
        };

        let live = &self.shifts[index];
        let remaining = live.remaining();

        let (new_direction, new_target, velocity) = if live.direction == direction.opposite() {
            let net = target - remaining;
            let velocity = if live.velocity > 0.0 {
                live.velocity
            } else {
                target as f32 / duration
            };
            if net >= 0 {
                (direction, net, velocity)
            } else {
                (live.direction, -net, velocity)
            }
        } else {
            let combined = remaining + target;
            (direction, combined, combined as f32 / duration)
        };

        tracing::trace!(
            ?kind,
            ?new_direction,
            new_target,
            "Shift merged with live shift"
        );

        if new_target == 0 {
            self.shifts.remove(index);
        } else {
            self.shifts[index] = Shift::new(kind, new_direction, new_target, velocity, now);
        }
    }

    /// Advance every shift to `now`, returning the movement to apply in
    /// insertion order. Finished shifts are removed.
    pub fn advance(&mut self, now: u64) -> Vec<ShiftStep> {
        let mut steps = Vec::with_capacity(self.shifts.len());

        self.shifts.retain_mut(|shift| {
            let elapsed = now.saturating_sub(shift.last_tick);
            shift.last_tick = now;

            shift.progress += shift.velocity * elapsed as f32;
            let whole = shift.progress.floor();
            shift.progress -= whole;

            let amount = (whole as i32).min(shift.remaining()).max(0);
            shift.total += amount;
            let finished = shift.total >= shift.target;

            if amount != 0 || finished {
                steps.push(ShiftStep {
                    kind: shift.kind,
                    direction: shift.direction,
                    amount,
                    finished,
                });
            }
            !finished
        });

        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_end(queue: &mut ShiftQueue, mut now: u64, step_ms: u64) -> (u64, i32) {
        let mut moved = 0;
        for _ in 0..100_000 {
            if queue.is_empty() {
                break;
            }
            now += step_ms;
            for step in queue.advance(now) {
                moved += step.delta();
            }
        }
        (now, moved)
    }

    #[test]
    fn test_shift_terminates_at_target() {
        let mut queue = ShiftQueue::new();
        queue.add(ShiftKind::Sidebar, Direction::Up, 73, 200, 0);

        let mut now = 0;
        let mut seen = 0;
        while !queue.is_empty() {
            now += 16;
            for step in queue.advance(now) {
                seen += step.amount;
            }
            for shift in queue.iter() {
                assert!(shift.total <= shift.target);
            }
        }
        assert_eq!(seen, 73);
        assert!(now >= 200);
    }

    #[test]
    fn test_slow_shift_still_terminates() {
        let mut queue = ShiftQueue::new();
        // 5px over 2s is far below one pixel per tick
        queue.add(ShiftKind::Highlight, Direction::Right, 5, 2000, 0);
        let (now, moved) = run_to_end(&mut queue, 0, 1);
        assert!(queue.is_empty());
        assert_eq!(moved, 5);
        assert!(now <= 2010);
    }

    #[test]
    fn test_no_movement_in_creation_frame() {
        let mut queue = ShiftQueue::new();
        queue.add(ShiftKind::Sidebar, Direction::Down, 50, 100, 1000);
        assert!(queue.advance(1000).is_empty());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_large_elapsed_is_clamped() {
        let mut queue = ShiftQueue::new();
        queue.add(ShiftKind::Menu(2), Direction::Up, 1080, 200, 0);
        let steps = queue.advance(10_000);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].amount, 1080);
        assert_eq!(steps[0].delta(), -1080);
        assert!(steps[0].finished);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_opposite_merge_nets_remaining_distance() {
        let mut queue = ShiftQueue::new();
        queue.add(ShiftKind::Menu(1), Direction::Up, 1080, 200, 0);
        queue.advance(50);
        let live = queue.find(ShiftKind::Menu(1), Direction::Up).cloned().unwrap();
        let (t, a) = (live.target, live.total);
        assert_eq!(a, 270);

        queue.add(ShiftKind::Menu(1), Direction::Down, 1080, 200, 50);

        assert_eq!(queue.len(), 1);
        let merged = queue.iter().next().unwrap();
        assert_eq!(merged.direction, Direction::Down);
        assert_eq!(merged.target, 1080 - (t - a));
        assert_eq!(merged.total, 0);
        assert_eq!(merged.velocity, live.velocity);
    }

    #[test]
    fn test_reversal_returns_to_start() {
        let mut queue = ShiftQueue::new();
        let mut offset = 0;
        queue.add(ShiftKind::Menu(0), Direction::Up, 1080, 200, 0);
        for step in queue.advance(80) {
            offset += step.delta();
        }
        queue.add(ShiftKind::Menu(0), Direction::Down, 1080, 200, 80);
        let (_, moved) = run_to_end(&mut queue, 80, 16);
        offset += moved;
        // Up 1080 then down 1080 nets to zero
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_negative_merge_flips_direction() {
        let mut queue = ShiftQueue::new();
        queue.add(ShiftKind::Sidebar, Direction::Up, 100, 100, 0);
        queue.add(ShiftKind::Sidebar, Direction::Down, 30, 100, 0);

        let shift = queue.iter().next().unwrap();
        assert_eq!(shift.direction, Direction::Up);
        assert_eq!(shift.target, 70);
        assert!(shift.total <= shift.target);
    }

    #[test]
    fn test_exact_cancel_removes_shift() {
        let mut queue = ShiftQueue::new();
        queue.add(ShiftKind::Highlight, Direction::Left, 40, 100, 0);
        queue.add(ShiftKind::Highlight, Direction::Right, 40, 100, 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_same_direction_extends_target() {
        let mut queue = ShiftQueue::new();
        queue.add(ShiftKind::Highlight, Direction::Down, 100, 100, 0);
        queue.advance(40);
        queue.add(ShiftKind::Highlight, Direction::Down, 100, 100, 40);

        assert_eq!(queue.len(), 1);
        let shift = queue.iter().next().unwrap();
        assert_eq!(shift.target, 160);
        let (_, moved) = run_to_end(&mut queue, 40, 10);
        assert_eq!(moved, 160);
    }

    #[test]
    fn test_highlight_axes_are_independent() {
        let mut queue = ShiftQueue::new();
        queue.add(ShiftKind::Highlight, Direction::Right, 100, 100, 0);
        queue.add(ShiftKind::Highlight, Direction::Down, 100, 100, 0);
        assert_eq!(queue.len(), 2);

        queue.add(ShiftKind::Highlight, Direction::Left, 100, 100, 0);
        assert_eq!(queue.len(), 1);
        assert!(queue.find(ShiftKind::Highlight, Direction::Up).is_some());
    }

    #[test]
    fn test_menu_channels_are_per_menu() {
        let mut queue = ShiftQueue::new();
        queue.add(ShiftKind::Menu(0), Direction::Up, 1080, 200, 0);
        queue.add(ShiftKind::Menu(1), Direction::Down, 1080, 200, 0);
        assert_eq!(queue.len(), 2);

        // Reversing menu 1 leaves menu 0 alone
        queue.add(ShiftKind::Menu(1), Direction::Up, 1080, 200, 0);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.iter().next().unwrap().kind, ShiftKind::Menu(0));
    }

    #[test]
    fn test_zero_target_is_ignored() {
        let mut queue = ShiftQueue::new();
        queue.add(ShiftKind::Sidebar, Direction::Up, 0, 200, 0);
        assert!(queue.is_empty());
    }
}
