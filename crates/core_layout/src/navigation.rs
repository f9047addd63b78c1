//! Navigation between the sidebar and the card grids.
//!
//! Every operation is a no-op when its precondition fails. Moves take the
//! current clock so the shifts they queue start at the right time.

use crate::{CommandSink, Direction, Layout, MenuId, PressedEntry, SelectionMode, ShiftKind};

impl Layout {
    pub fn move_up(&mut self, now: u64) {
        match self.selection_mode {
            SelectionMode::Sidebar => self.sidebar_step(Direction::Up, now),
            SelectionMode::Menu => self.menu_row_step(Direction::Up, now),
        }
    }

    pub fn move_down(&mut self, now: u64) {
        match self.selection_mode {
            SelectionMode::Sidebar => self.sidebar_step(Direction::Down, now),
            SelectionMode::Menu => self.menu_row_step(Direction::Down, now),
        }
    }

    pub fn move_left(&mut self, now: u64) {
        if self.selection_mode != SelectionMode::Menu {
            return;
        }
        let Some(id) = self.current_menu else {
            return;
        };
        let column = self.menu(id).map_or(0, |m| m.column);

        if column > 0 {
            if let Some(menu) = self.menu_mut(id) {
                menu.column -= 1;
            }
            let distance = self.geometry.card_x_advance;
            self.shifts.add(
                ShiftKind::Highlight,
                Direction::Left,
                distance,
                self.options.highlight_shift_ms,
                now,
            );
            return;
        }

        if !self.shifts.is_empty() {
            tracing::trace!("Leaving menu suppressed while shifts are in flight");
            return;
        }
        self.leave_menu(id, now);
    }

    pub fn move_right(&mut self, now: u64) {
        match self.selection_mode {
            SelectionMode::Sidebar => self.enter_menu(),
            SelectionMode::Menu => {
                let Some(id) = self.current_menu else {
                    return;
                };
                let Some(menu) = self.menu_mut(id) else {
                    return;
                };
                if menu.column + 1 >= menu.columns_in_row(menu.row) {
                    return;
                }
                menu.column += 1;
                let distance = self.geometry.card_x_advance;
                self.shifts.add(
                    ShiftKind::Highlight,
                    Direction::Right,
                    distance,
                    self.options.highlight_shift_ms,
                    now,
                );
            }
        }
    }

    /// Activate the current item. Sidebar commands run immediately, cards
    /// start a press animation and run when it completes.
    pub fn select(&mut self, now: u64, sink: &mut dyn CommandSink) {
        match self.selection_mode {
            SelectionMode::Sidebar => {
                if let Some(command) = self.current_command() {
                    tracing::info!("Executing '{}'", command);
                    sink.execute_command(&command);
                } else {
                    self.enter_menu();
                }
            }
            SelectionMode::Menu => {
                if self.pressed.is_some() {
                    return;
                }
                let Some(id) = self.current_menu else {
                    return;
                };
                let Some(entry) = self.menu(id).map(|m| m.current_entry()) else {
                    return;
                };
                tracing::debug!("Pressing card {} of menu {}", entry, id);
                self.pressed = Some(PressedEntry::new(
                    id,
                    entry,
                    self.geometry.card_w,
                    self.options.press_depth,
                    self.options.press_ms,
                    now,
                ));
            }
        }
    }

    fn current_command(&self) -> Option<String> {
        match &self.entries[self.current].kind {
            crate::SidebarKind::Command(command) => Some(command.clone()),
            crate::SidebarKind::Menu(_) => None,
        }
    }

    fn enter_menu(&mut self) {
        if self.current_menu.is_none() {
            return;
        }
        if !self.shifts.is_empty() {
            tracing::trace!("Entering menu suppressed while shifts are in flight");
            return;
        }
        tracing::debug!("Focus moved to menu '{}'", self.entries[self.current].title);
        self.selection_mode = SelectionMode::Menu;
    }

    fn leave_menu(&mut self, id: MenuId, now: u64) {
        self.selection_mode = SelectionMode::Sidebar;
        self.menu_highlight.rect = self.geometry.menu_highlight_rect;

        let advance = self.geometry.card_y_advance;
        let mut shift_count = 0;
        if let Some(menu) = self.menu_mut(id) {
            menu.row = 0;
            menu.column = 0;
            shift_count = menu.shift_count;
            menu.shift_count = 0;
        }
        if shift_count > 0 {
            self.shifts.add(
                ShiftKind::Menu(id),
                Direction::Down,
                shift_count as i32 * advance,
                self.options.highlight_shift_ms,
                now,
            );
        }
        tracing::debug!("Focus moved to sidebar");
    }

    fn sidebar_step(&mut self, direction: Direction, now: u64) {
        let next = match direction {
            Direction::Down if self.current + 1 < self.entries.len() => self.current + 1,
            Direction::Up if self.current > 0 => self.current - 1,
            _ => return,
        };
        let duration = self.options.sidebar_shift_ms;
        let menu_direction = direction.opposite();

        let previous_menu = self.current_menu;
        self.current = next;
        self.current_menu = self.entries[next].menu().map(|_| next);
        self.sidebar_highlight.rect.y += direction.sign() * self.geometry.sidebar_y_advance;

        if let Some(id) = previous_menu {
            let height = self.menu(id).map_or(0, |m| m.height);
            self.shifts
                .add(ShiftKind::Menu(id), menu_direction, height, duration, now);
            self.settle_menu(id);
        }

        if let Some(id) = self.current_menu {
            let seed = direction.sign();
            let entering = !self.visible_menus.contains(&id);
            let height = match self.menu_mut(id) {
                Some(menu) => {
                    if entering {
                        menu.y_offset = seed * menu.height;
                    }
                    menu.height
                }
                None => 0,
            };
            self.visible_menus.insert(id);
            self.shifts
                .add(ShiftKind::Menu(id), menu_direction, height, duration, now);
        }

        let advance = self.geometry.sidebar_y_advance;
        if let Some(max_visible) = self.max_sidebar_entries {
            match direction {
                Direction::Down if self.current >= self.sidebar_shift_count + max_visible => {
                    self.shifts
                        .add(ShiftKind::Sidebar, Direction::Up, advance, duration, now);
                    self.sidebar_shift_count += 1;
                }
                Direction::Up if self.current < self.sidebar_shift_count => {
                    self.shifts
                        .add(ShiftKind::Sidebar, Direction::Down, advance, duration, now);
                    self.sidebar_shift_count -= 1;
                }
                _ => {}
            }
        }

        tracing::trace!(
            "Sidebar moved to {} ('{}')",
            self.current,
            self.entries[self.current].title
        );
    }

    fn menu_row_step(&mut self, direction: Direction, now: u64) {
        let Some(id) = self.current_menu else {
            return;
        };
        let max_rows = self.geometry.max_rows;
        let Some(menu) = self.menu_mut(id) else {
            return;
        };

        let page = match direction {
            Direction::Down => {
                if menu.current_entry() + menu.max_columns >= menu.num_entries() {
                    return;
                }
                menu.row += 1;
                // Page until the last row is on screen, then move the highlight
                let page = menu.total_rows > max_rows
                    && menu.shift_count < menu.total_rows - max_rows;
                if page {
                    menu.shift_count += 1;
                }
                page
            }
            Direction::Up => {
                if menu.row == 0 {
                    return;
                }
                menu.row -= 1;
                let page = menu.row < menu.shift_count;
                if page {
                    menu.shift_count -= 1;
                }
                page
            }
            Direction::Left | Direction::Right => return,
        };

        let advance = self.geometry.card_y_advance;
        if page {
            self.shifts.add(
                ShiftKind::Menu(id),
                direction.opposite(),
                advance,
                self.options.row_shift_ms,
                now,
            );
        } else {
            self.shifts.add(
                ShiftKind::Highlight,
                direction,
                advance,
                self.options.highlight_shift_ms,
                now,
            );
        }
    }
}
