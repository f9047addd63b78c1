//! The layout: sidebar entries, menus, highlights and the animation state
//! tying them together.

use std::collections::BTreeSet;

use crate::{
    CardArt, Compositor, CompositorError, Geometry, LayoutDescription, LayoutError, LayoutOptions,
    PressedEntry, Rect, ShiftKind, ShiftQueue, ShiftStep, SidebarItem, TextureId, TextureSpec,
};

/// Sidebar index of a menu.
pub type MenuId = usize;

/// Where keyboard focus is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Sidebar,
    Menu,
}

/// Receives the commands of selected cards and sidebar commands.
pub trait CommandSink {
    fn execute_command(&mut self, command: &str);
}

impl CommandSink for Vec<String> {
    fn execute_command(&mut self, command: &str) {
        self.push(command.to_string());
    }
}

/// A highlight texture and where it is drawn. `rect` includes the shadow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub texture: TextureId,
    pub rect: Rect,
    pub shadow_offset: i32,
}

/// A launch card.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub title: String,
    pub command: String,
    pub art: CardArt,
    /// Position at zero menu offset, including shadow padding.
    pub rect: Rect,
    pub texture: TextureId,
    /// The art failed to load and `texture` is the shared error card.
    pub card_error: bool,
}

/// A grid of cards owned by a sidebar entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    pub entries: Vec<Entry>,
    /// Vertical animation offset applied to every card.
    pub y_offset: i32,
    pub row: usize,
    pub column: usize,
    pub total_rows: usize,
    pub max_columns: usize,
    /// Rows currently paged past the top of the viewport.
    pub shift_count: usize,
    pub height: i32,
}

impl Menu {
    fn new(entries: Vec<Entry>, columns: usize, geometry: &Geometry) -> Self {
        let max_columns = columns.min(entries.len()).max(1);
        let total_rows = entries.len().div_ceil(max_columns);
        Self {
            entries,
            y_offset: 0,
            row: 0,
            column: 0,
            total_rows,
            max_columns,
            shift_count: 0,
            height: geometry.menu_height(total_rows),
        }
    }

    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// Index of the highlighted card.
    pub fn current_entry(&self) -> usize {
        self.row * self.max_columns + self.column
    }

    /// Number of cards in `row`; the last row may be partial.
    pub fn columns_in_row(&self, row: usize) -> usize {
        self.num_entries()
            .saturating_sub(row * self.max_columns)
            .min(self.max_columns)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SidebarKind {
    Menu(Menu),
    Command(String),
}

/// One sidebar row.
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarEntry {
    pub title: String,
    pub texture: TextureId,
    pub src_rect: Rect,
    /// Moved by sidebar shifts.
    pub dst_rect: Rect,
    pub kind: SidebarKind,
}

impl SidebarEntry {
    pub fn menu(&self) -> Option<&Menu> {
        match &self.kind {
            SidebarKind::Menu(menu) => Some(menu),
            SidebarKind::Command(_) => None,
        }
    }

    fn menu_mut(&mut self) -> Option<&mut Menu> {
        match &mut self.kind {
            SidebarKind::Menu(menu) => Some(menu),
            SidebarKind::Command(_) => None,
        }
    }
}

/// Navigation and animation state of the launcher screen.
#[derive(Debug)]
pub struct Layout {
    pub(crate) options: LayoutOptions,
    pub(crate) geometry: Geometry,
    pub(crate) entries: Vec<SidebarEntry>,
    pub(crate) current: usize,
    pub(crate) current_menu: Option<MenuId>,
    pub(crate) selection_mode: SelectionMode,
    pub(crate) visible_menus: BTreeSet<MenuId>,
    pub(crate) shifts: ShiftQueue,
    pub(crate) sidebar_shift_count: usize,
    pub(crate) max_sidebar_entries: Option<usize>,
    pub(crate) sidebar_highlight: Highlight,
    pub(crate) menu_highlight: Highlight,
    pub(crate) pressed: Option<PressedEntry>,
    pub(crate) background: Option<TextureId>,
    pub(crate) error_texture: Option<TextureId>,
}

impl Layout {
    /// Build the layout and all of its textures.
    pub fn new(
        description: &LayoutDescription,
        options: LayoutOptions,
        width: i32,
        height: i32,
        compositor: &mut dyn Compositor,
    ) -> Result<Self, LayoutError> {
        let geometry = Geometry::compute(width, height, &options)?;

        let items: Vec<&SidebarItem> = description
            .items
            .iter()
            .filter(|item| match item {
                SidebarItem::Menu { title, entries } if entries.is_empty() => {
                    tracing::warn!("Menu '{}' has no entries, skipping", title);
                    false
                }
                _ => true,
            })
            .collect();
        if items.is_empty() {
            return Err(LayoutError::EmptyLayout);
        }

        let sidebar_highlight = Highlight {
            texture: compositor
                .create_texture(&TextureSpec::SidebarHighlight {
                    width: geometry.sidebar_highlight_rect.width,
                    height: geometry.sidebar_highlight_rect.height,
                    corner_radius: geometry.sidebar_corner_radius,
                    color: options.sidebar_highlight_color,
                    shadow_offset: geometry.sidebar_shadow_offset,
                })?
                .id,
            rect: geometry.sidebar_highlight_rect,
            shadow_offset: geometry.sidebar_shadow_offset,
        };

        let mut error_texture = None;
        let mut entries = Vec::with_capacity(items.len());
        let mut max_sidebar_entries = None;

        for (index, item) in items.into_iter().enumerate() {
            let text = compositor.create_texture(&TextureSpec::Text {
                text: item.title().to_string(),
                font_size: geometry.sidebar_font_size,
                max_width: geometry.sidebar_text_max_width,
            })?;
            let text_width = text.width.min(geometry.sidebar_text_max_width);
            let src_rect = Rect::sized(text_width, text.height);
            let dst_rect = Rect::new(
                geometry.sidebar_text_x,
                geometry.sidebar_row_center(index) - text.height / 2,
                text_width,
                text.height,
            );
            if max_sidebar_entries.is_none() && dst_rect.bottom() > geometry.y_max {
                max_sidebar_entries = Some(index.max(1));
            }

            let kind = match item {
                SidebarItem::Command { command, .. } => SidebarKind::Command(command.clone()),
                SidebarItem::Menu {
                    title,
                    entries: descs,
                } => {
                    let mut cards = Vec::with_capacity(descs.len());
                    for (i, desc) in descs.iter().enumerate() {
                        let rect = geometry.card_rect(i / options.columns, i % options.columns);
                        let (texture, card_error) = match compositor.create_texture(
                            &TextureSpec::Card {
                                art: desc.card.clone(),
                                title: desc.title.clone(),
                                width: rect.width,
                                height: rect.height,
                                shadow_offset: geometry.card_shadow_offset,
                                icon_margin: options.icon_margin,
                            },
                        ) {
                            Ok(info) => (info.id, false),
                            Err(e) => {
                                tracing::warn!(
                                    "Card '{}' in menu '{}' failed to load: {}",
                                    desc.title,
                                    title,
                                    e
                                );
                                let id = match error_texture {
                                    Some(id) => id,
                                    None => {
                                        let id = compositor
                                            .create_texture(&TextureSpec::ErrorCard {
                                                width: rect.width,
                                                height: rect.height,
                                                shadow_offset: geometry.card_shadow_offset,
                                            })?
                                            .id;
                                        error_texture = Some(id);
                                        id
                                    }
                                };
                                (id, true)
                            }
                        };
                        cards.push(Entry {
                            title: desc.title.clone(),
                            command: desc.command.clone(),
                            art: desc.card.clone(),
                            rect,
                            texture,
                            card_error,
                        });
                    }
                    SidebarKind::Menu(Menu::new(cards, options.columns, &geometry))
                }
            };

            entries.push(SidebarEntry {
                title: item.title().to_string(),
                texture: text.id,
                src_rect,
                dst_rect,
                kind,
            });
        }

        let menu_highlight = Highlight {
            texture: compositor
                .create_texture(&TextureSpec::MenuHighlight {
                    width: geometry.menu_highlight_rect.width,
                    height: geometry.menu_highlight_rect.height,
                    thickness: geometry.highlight_thickness,
                    corner_radius: geometry.highlight_corner_radius,
                    color: options.menu_highlight_color,
                    shadow_offset: geometry.highlight_shadow_offset,
                })?
                .id,
            rect: geometry.menu_highlight_rect,
            shadow_offset: geometry.highlight_shadow_offset,
        };

        let background = match &options.background_image {
            Some(path) => match compositor.create_texture(&TextureSpec::Background {
                path: path.clone(),
                width,
                height,
            }) {
                Ok(info) => Some(info.id),
                Err(e) => {
                    tracing::warn!("Background image unavailable: {}", e);
                    None
                }
            },
            None => None,
        };

        let mut visible_menus = BTreeSet::new();
        let current_menu = entries[0].menu().map(|_| 0);
        if let Some(id) = current_menu {
            visible_menus.insert(id);
        }

        tracing::debug!(
            "Layout built: {} sidebar entries, {} max visible, {} card errors",
            entries.len(),
            max_sidebar_entries.map_or("all".to_string(), |n| n.to_string()),
            entries
                .iter()
                .filter_map(SidebarEntry::menu)
                .flat_map(|m| &m.entries)
                .filter(|e| e.card_error)
                .count()
        );

        Ok(Self {
            options,
            geometry,
            entries,
            current: 0,
            current_menu,
            selection_mode: SelectionMode::Sidebar,
            visible_menus,
            shifts: ShiftQueue::new(),
            sidebar_shift_count: 0,
            max_sidebar_entries,
            sidebar_highlight,
            menu_highlight,
            pressed: None,
            background,
            error_texture,
        })
    }

    /// Return every texture to the compositor.
    pub fn release(self, compositor: &mut dyn Compositor) {
        for entry in &self.entries {
            compositor.destroy_texture(entry.texture);
            if let Some(menu) = entry.menu() {
                for card in menu.entries.iter().filter(|c| !c.card_error) {
                    compositor.destroy_texture(card.texture);
                }
            }
        }
        compositor.destroy_texture(self.sidebar_highlight.texture);
        compositor.destroy_texture(self.menu_highlight.texture);
        if let Some(id) = self.background {
            compositor.destroy_texture(id);
        }
        if let Some(id) = self.error_texture {
            compositor.destroy_texture(id);
        }
    }

    /// Advance shifts and the press animation to `now`. A finished press
    /// sends its card's command to `sink`.
    pub fn tick(&mut self, now: u64, sink: &mut dyn CommandSink) {
        for step in self.shifts.advance(now) {
            self.apply_step(step);
        }

        let Some(pressed) = self.pressed.as_mut() else {
            return;
        };
        if pressed.update(now) {
            let (menu, entry) = (pressed.menu, pressed.entry);
            self.pressed = None;
            let command = self
                .menu(menu)
                .and_then(|m| m.entries.get(entry))
                .map(|e| e.command.clone());
            if let Some(command) = command {
                tracing::info!("Executing '{}'", command);
                sink.execute_command(&command);
            }
        }
    }

    fn apply_step(&mut self, step: ShiftStep) {
        let delta = step.delta();
        match step.kind {
            ShiftKind::Sidebar => {
                self.sidebar_highlight.rect.y += delta;
                for entry in &mut self.entries {
                    entry.dst_rect.y += delta;
                }
            }
            ShiftKind::Menu(id) => {
                if let Some(menu) = self.menu_mut(id) {
                    menu.y_offset += delta;
                }
                if step.finished {
                    self.settle_menu(id);
                }
            }
            ShiftKind::Highlight => {
                if step.direction.is_horizontal() {
                    self.menu_highlight.rect.x += delta;
                } else {
                    self.menu_highlight.rect.y += delta;
                }
            }
        }
    }

    /// Take a menu off screen once it has no live shift and is not current.
    pub(crate) fn settle_menu(&mut self, id: MenuId) {
        if self.current_menu == Some(id) {
            return;
        }
        if self.shifts.iter().any(|s| s.kind == ShiftKind::Menu(id)) {
            return;
        }
        if let Some(menu) = self.menu_mut(id) {
            menu.y_offset = 0;
        }
        self.visible_menus.remove(&id);
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn entries(&self) -> &[SidebarEntry] {
        &self.entries
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    /// Index of the highlighted sidebar entry.
    pub fn sidebar_pos(&self) -> usize {
        self.current
    }

    pub fn current_entry(&self) -> &SidebarEntry {
        &self.entries[self.current]
    }

    pub fn current_menu_id(&self) -> Option<MenuId> {
        self.current_menu
    }

    pub fn current_menu(&self) -> Option<&Menu> {
        self.current_menu.and_then(|id| self.menu(id))
    }

    pub fn menu(&self, id: MenuId) -> Option<&Menu> {
        self.entries.get(id).and_then(SidebarEntry::menu)
    }

    pub(crate) fn menu_mut(&mut self, id: MenuId) -> Option<&mut Menu> {
        self.entries.get_mut(id).and_then(SidebarEntry::menu_mut)
    }

    pub fn visible_menus(&self) -> &BTreeSet<MenuId> {
        &self.visible_menus
    }

    pub fn shifts(&self) -> &ShiftQueue {
        &self.shifts
    }

    pub fn pressed(&self) -> Option<&PressedEntry> {
        self.pressed.as_ref()
    }

    pub fn sidebar_highlight(&self) -> &Highlight {
        &self.sidebar_highlight
    }

    pub fn menu_highlight(&self) -> &Highlight {
        &self.menu_highlight
    }

    pub fn sidebar_shift_count(&self) -> usize {
        self.sidebar_shift_count
    }

    /// Rows that fit in the sidebar viewport, `None` when all of them do.
    pub fn max_sidebar_entries(&self) -> Option<usize> {
        self.max_sidebar_entries
    }

    pub fn background(&self) -> Option<TextureId> {
        self.background
    }

    pub fn error_texture(&self) -> Option<TextureId> {
        self.error_texture
    }

    /// Whether any shift or press animation is in flight.
    pub fn is_animating(&self) -> bool {
        !self.shifts.is_empty() || self.pressed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{command, description, menu, RecordingCompositor};
    use crate::SidebarItem;

    fn build(items: Vec<SidebarItem>, compositor: &mut RecordingCompositor) -> Layout {
        Layout::new(
            &description(items),
            LayoutOptions::default(),
            1920,
            1080,
            compositor,
        )
        .unwrap()
    }

    #[test]
    fn test_menu_grid_dimensions() {
        let mut compositor = RecordingCompositor::new();
        let layout = build(vec![menu("Games", 7)], &mut compositor);
        let menu = layout.menu(0).unwrap();

        assert_eq!(menu.num_entries(), 7);
        assert_eq!(menu.max_columns, 3);
        assert_eq!(menu.total_rows, 3);
        assert_eq!(menu.columns_in_row(0), 3);
        assert_eq!(menu.columns_in_row(2), 1);
        assert_eq!(menu.height, 1080);
        assert_eq!(menu.entries[4].rect, layout.geometry().card_rect(1, 1));
    }

    #[test]
    fn test_small_menu_has_fewer_columns() {
        let mut compositor = RecordingCompositor::new();
        let layout = build(vec![menu("Tools", 2)], &mut compositor);
        let menu = layout.menu(0).unwrap();
        assert_eq!(menu.max_columns, 2);
        assert_eq!(menu.total_rows, 1);
    }

    #[test]
    fn test_empty_menus_are_skipped() {
        let mut compositor = RecordingCompositor::new();
        let layout = build(
            vec![menu("Empty", 0), menu("Games", 3), command("Quit", ":quit")],
            &mut compositor,
        );
        assert_eq!(layout.entries().len(), 2);
        assert_eq!(layout.entries()[0].title, "Games");
    }

    #[test]
    fn test_empty_layout_is_an_error() {
        let mut compositor = RecordingCompositor::new();
        let result = Layout::new(
            &description(vec![menu("Empty", 0)]),
            LayoutOptions::default(),
            1920,
            1080,
            &mut compositor,
        );
        assert!(matches!(result, Err(LayoutError::EmptyLayout)));
    }

    #[test]
    fn test_initial_state() {
        let mut compositor = RecordingCompositor::new();
        let layout = build(vec![menu("Games", 4), command("Quit", ":quit")], &mut compositor);

        assert_eq!(layout.selection_mode(), SelectionMode::Sidebar);
        assert_eq!(layout.sidebar_pos(), 0);
        assert_eq!(layout.current_menu_id(), Some(0));
        assert!(layout.visible_menus().contains(&0));
        assert!(!layout.is_animating());
        assert_eq!(layout.max_sidebar_entries(), None);
        assert_eq!(layout.sidebar_highlight().rect, Rect::new(135, 197, 307, 108));
        assert_eq!(layout.menu_highlight().rect, Rect::new(730, 178, 396, 316));
    }

    #[test]
    fn test_sidebar_text_positions() {
        let mut compositor = RecordingCompositor::new();
        let layout = build(vec![command("Quit", ":quit"), command("Sleep", ":sleep")], &mut compositor);
        let first = &layout.entries()[0];
        let second = &layout.entries()[1];

        // Recording backend: 4 chars * 39 / 2 wide, 39 high
        assert_eq!(first.src_rect, Rect::sized(78, 39));
        assert_eq!(first.dst_rect, Rect::new(173, 216 + 35 - 19, 78, 39));
        assert_eq!(second.dst_rect.y - first.dst_rect.y, 73);
        assert_eq!(layout.current_menu_id(), None);
    }

    #[test]
    fn test_long_sidebar_limits_visible_rows() {
        let mut compositor = RecordingCompositor::new();
        let items = (0..20).map(|i| command(&format!("Cmd {i}"), "true")).collect();
        let layout = build(items, &mut compositor);
        // Row 12 is the first whose bottom passes 1080
        assert_eq!(layout.max_sidebar_entries(), Some(12));
    }

    #[test]
    fn test_failed_cards_share_error_texture() {
        let mut compositor = RecordingCompositor::new()
            .fail_on("Games/1.png")
            .fail_on("Games/3.png");
        let layout = build(vec![menu("Games", 5)], &mut compositor);
        let menu = layout.menu(0).unwrap();

        assert!(menu.entries[1].card_error);
        assert!(menu.entries[3].card_error);
        assert!(!menu.entries[0].card_error);
        assert_eq!(menu.entries[1].texture, menu.entries[3].texture);
        assert_eq!(Some(menu.entries[1].texture), layout.error_texture());
        assert_ne!(menu.entries[0].texture, menu.entries[1].texture);

        let error_cards = compositor
            .textures
            .values()
            .filter(|spec| matches!(spec, TextureSpec::ErrorCard { .. }))
            .count();
        assert_eq!(error_cards, 1);
    }

    #[test]
    fn test_no_error_texture_without_failures() {
        let mut compositor = RecordingCompositor::new();
        let layout = build(vec![menu("Games", 5)], &mut compositor);
        assert_eq!(layout.error_texture(), None);
    }

    #[test]
    fn test_release_destroys_every_texture() {
        let mut compositor = RecordingCompositor::new().fail_on("Games/0.png");
        let layout = build(vec![menu("Games", 3), command("Quit", ":quit")], &mut compositor);
        layout.release(&mut compositor);
        assert_eq!(compositor.live_textures(), 0);
    }

    #[test]
    fn test_missing_background_falls_back_to_clear_color() {
        struct NoImages(RecordingCompositor);
        impl Compositor for NoImages {
            fn create_texture(
                &mut self,
                spec: &TextureSpec,
            ) -> Result<crate::TextureInfo, CompositorError> {
                if let TextureSpec::Background { path, .. } = spec {
                    return Err(CompositorError::AssetLoad {
                        path: path.clone(),
                        reason: "missing".to_string(),
                    });
                }
                self.0.create_texture(spec)
            }
            fn copy(&mut self, texture: TextureId, src: Option<Rect>, dst: Rect) {
                self.0.copy(texture, src, dst)
            }
            fn set_blend_mode(&mut self, texture: TextureId, mode: crate::BlendMode) {
                self.0.set_blend_mode(texture, mode)
            }
            fn set_color_mod(&mut self, texture: TextureId, color: crate::Color) {
                self.0.set_color_mod(texture, color)
            }
            fn set_alpha_mod(&mut self, texture: TextureId, alpha: u8) {
                self.0.set_alpha_mod(texture, alpha)
            }
            fn destroy_texture(&mut self, texture: TextureId) {
                self.0.destroy_texture(texture)
            }
            fn clear(&mut self, color: crate::Color) {
                self.0.clear(color)
            }
            fn present(&mut self) -> Result<(), CompositorError> {
                self.0.present()
            }
        }

        let mut compositor = NoImages(RecordingCompositor::new());
        let options = LayoutOptions {
            background_image: Some("/nowhere/bg.png".into()),
            ..LayoutOptions::default()
        };
        let layout = Layout::new(
            &description(vec![menu("Games", 1)]),
            options,
            1920,
            1080,
            &mut compositor,
        )
        .unwrap();
        assert_eq!(layout.background(), None);
    }

    #[test]
    fn test_vec_sink_collects_commands() {
        let mut sink: Vec<String> = Vec::new();
        sink.execute_command("echo hi");
        assert_eq!(sink, vec!["echo hi".to_string()]);
    }
}
