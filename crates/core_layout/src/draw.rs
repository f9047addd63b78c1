//! Frame composition.

use crate::{
    clip_to_viewport, classify, ClippedCopy, Compositor, Layout, MenuId, Rect, SelectionMode,
    Visibility,
};

impl Layout {
    /// Draw the whole layout. The caller presents the frame.
    pub fn draw(&self, compositor: &mut dyn Compositor) {
        let g = &self.geometry;
        compositor.clear(self.options.background_color);

        if let Some(background) = self.background {
            compositor.copy(background, None, Rect::sized(g.screen_width, g.screen_height));
        }

        if self.selection_mode == SelectionMode::Sidebar {
            let highlight = &self.sidebar_highlight;
            let src = Rect::sized(highlight.rect.width, highlight.rect.height);
            if let Some(clip) = clip_to_viewport(
                src,
                highlight.rect,
                g.y_min - highlight.shadow_offset,
                g.y_max,
            ) {
                compositor.copy(highlight.texture, Some(clip.src), clip.dst);
            }
        }

        for (index, entry) in self.entries.iter().enumerate() {
            let color = if self.selection_mode == SelectionMode::Sidebar && index == self.current {
                self.options.sidebar_text_color_highlighted
            } else {
                self.options.sidebar_text_color
            };
            compositor.set_color_mod(entry.texture, color);
            if let Some(clip) = clip_to_viewport(entry.src_rect, entry.dst_rect, g.y_min, g.y_max) {
                compositor.copy(entry.texture, Some(clip.src), clip.dst);
            }
        }

        for &id in &self.visible_menus {
            self.draw_menu(id, compositor);
        }

        if self.selection_mode == SelectionMode::Menu {
            compositor.copy(self.menu_highlight.texture, None, self.menu_highlight.rect);
        }
    }

    fn draw_menu(&self, id: MenuId, compositor: &mut dyn Compositor) {
        let Some(menu) = self.menu(id) else {
            return;
        };
        let y_min = self.geometry.y_min - self.geometry.card_shadow_offset;
        let y_max = self.geometry.y_max;

        for (index, entry) in menu.entries.iter().enumerate() {
            let dst = entry.rect.translated(0, menu.y_offset);
            let src = Rect::sized(entry.rect.width, entry.rect.height);

            if let Some(pressed) = self
                .pressed
                .as_ref()
                .filter(|p| p.menu == id && p.entry == index)
            {
                let inset = pressed.apply(dst);
                if classify(&inset, y_min, y_max) == Visibility::Visible {
                    compositor.copy(entry.texture, None, inset);
                } else if let Some(clip) = clip_scaled(src, inset, y_min, y_max) {
                    compositor.copy(entry.texture, Some(clip.src), clip.dst);
                }
                continue;
            }

            if let Some(clip) = clip_to_viewport(src, dst, y_min, y_max) {
                compositor.copy(entry.texture, Some(clip.src), clip.dst);
            }
        }
    }
}

/// Clip a copy that scales all of `src` into `dst`, mapping the kept rows
/// of `dst` back onto `src`.
fn clip_scaled(src: Rect, dst: Rect, y_min: i32, y_max: i32) -> Option<ClippedCopy> {
    if dst.height <= 0 {
        return None;
    }
    let clip = clip_to_viewport(Rect::sized(dst.width, dst.height), dst, y_min, y_max)?;
    let scale = src.height as f32 / dst.height as f32;
    let top = ((clip.dst.y - dst.y) as f32 * scale).round() as i32;
    let height = ((clip.dst.height as f32 * scale).round() as i32).min(src.height - top);
    Some(ClippedCopy {
        src: Rect::new(src.x, src.y + top, src.width, height),
        dst: clip.dst,
    })
}

#[cfg(test)]
mod tests {
    use super::clip_scaled;
    use crate::testing::{command, description, menu, RecordingCompositor};
    use crate::{Layout, LayoutOptions, PressedEntry, Rect, SidebarItem};

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
    fn test_sidebar_frame() {
        let mut compositor = RecordingCompositor::new();
        let layout = build(vec![menu("Games", 4), command("Quit", ":quit")], &mut compositor);
        compositor.reset_frame();
        layout.draw(&mut compositor);

        assert_eq!(compositor.clears, 1);
        assert_eq!(compositor.presents, 0);

        let highlight = layout.sidebar_highlight();
        assert_eq!(
            compositor.copies_of(highlight.texture),
            vec![crate::testing::CopyCall {
                texture: highlight.texture,
                src: Some(Rect::sized(307, 108)),
                dst: highlight.rect,
            }]
        );
        assert!(compositor.copies_of(layout.menu_highlight().texture).is_empty());

        // Four cards of the only visible menu
        let menu = layout.menu(0).unwrap();
        for entry in &menu.entries {
            assert_eq!(compositor.copies_of(entry.texture).len(), 1);
        }

        let options = layout.options();
        assert_eq!(
            compositor.color_mods[&layout.entries()[0].texture],
            options.sidebar_text_color_highlighted
        );
        assert_eq!(
            compositor.color_mods[&layout.entries()[1].texture],
            options.sidebar_text_color
        );
    }

    #[test]
    fn test_menu_frame_uses_menu_highlight() {
        let mut compositor = RecordingCompositor::new();
        let mut layout = build(vec![menu("Games", 4)], &mut compositor);
        layout.move_right(0);
        compositor.reset_frame();
        layout.draw(&mut compositor);

        assert!(compositor.copies_of(layout.sidebar_highlight().texture).is_empty());
        let copies = compositor.copies_of(layout.menu_highlight().texture);
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].src, None);
        assert_eq!(copies[0].dst, layout.menu_highlight().rect);
        // No sidebar entry is tinted as highlighted in menu mode
        assert_eq!(
            compositor.color_mods[&layout.entries()[0].texture],
            layout.options().sidebar_text_color
        );
    }

    #[test]
    fn test_offscreen_cards_are_clipped() {
        let mut compositor = RecordingCompositor::new();
        let layout = build(vec![menu("Games", 15)], &mut compositor);
        compositor.reset_frame();
        layout.draw(&mut compositor);

        let menu = layout.menu(0).unwrap();
        // Rows 0..=2 fit, row 3 straddles the bottom, row 4 is below
        let row3 = compositor.copies_of(menu.entries[9].texture);
        assert_eq!(row3.len(), 1);
        let dst = row3[0].dst;
        assert_eq!(dst.y, 193 + 3 * 259);
        assert_eq!(dst.bottom(), 1080);
        assert_eq!(row3[0].src, Some(Rect::sized(366, 1080 - dst.y)));
        assert!(compositor.copies_of(menu.entries[12].texture).is_empty());

        let row0 = compositor.copies_of(menu.entries[0].texture);
        assert_eq!(row0[0].src, Some(Rect::sized(366, 286)));
        assert_eq!(row0[0].dst, menu.entries[0].rect);
    }

    #[test]
    fn test_sliding_menu_is_clipped_at_top() {
        let mut compositor = RecordingCompositor::new();
        let mut layout = build(vec![menu("A", 3), menu("B", 3)], &mut compositor);
        let mut sink = Vec::new();
        layout.move_down(0);
        layout.tick(20, &mut sink);
        let offset = layout.menu(0).unwrap().y_offset;
        assert_eq!(offset, -108);

        compositor.reset_frame();
        layout.draw(&mut compositor);
        let card = &layout.menu(0).unwrap().entries[0];
        let copies = compositor.copies_of(card.texture);
        assert_eq!(copies.len(), 1);
        let y_min = 216 - 23;
        assert_eq!(copies[0].dst.y, y_min);
        assert_eq!(copies[0].src.unwrap().y, 108);
        assert_eq!(copies[0].dst.height + 108, 286);

        // Menu B is still below the screen
        let b = layout.menu(1).unwrap();
        assert!(compositor.copies_of(b.entries[0].texture).is_empty());
    }

    #[test]
    fn test_pressed_card_is_drawn_inset() {
        let mut compositor = RecordingCompositor::new();
        let mut layout = build(vec![menu("Games", 3)], &mut compositor);
        let mut sink = Vec::new();
        layout.move_right(0);
        layout.select(0, &mut sink);
        layout.tick(40, &mut sink);

        compositor.reset_frame();
        layout.draw(&mut compositor);
        let card = &layout.menu(0).unwrap().entries[0];
        let copies = compositor.copies_of(card.texture);
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].src, None);
        assert!(copies[0].dst.width < card.rect.width);
        assert!(copies[0].dst.x > card.rect.x);
    }

    #[test]
    fn test_pressed_card_straddling_bottom_is_inset_then_clipped() {
        let mut compositor = RecordingCompositor::new();
        let mut layout = build(vec![menu("Games", 15)], &mut compositor);
        let card_w = layout.geometry().card_w;
        // Card 9 sits on row 3, across the bottom of the screen
        let mut press = PressedEntry::new(0, 9, card_w, 0.04, 150, 0);
        press.update(40);
        layout.pressed = Some(press);

        compositor.reset_frame();
        layout.draw(&mut compositor);
        let card = &layout.menu(0).unwrap().entries[9];
        let copies = compositor.copies_of(card.texture);
        assert_eq!(copies.len(), 1);
        // Inset by 7px horizontally and 5px vertically, cut at the screen edge
        assert_eq!(copies[0].dst, Rect::new(card.rect.x + 7, card.rect.y + 5, 352, 105));
        // The kept 105 rows map back onto the top of the full texture
        assert_eq!(copies[0].src, Some(Rect::new(0, 0, 366, 109)));
    }

    #[test]
    fn test_clip_scaled_maps_rows_onto_source() {
        let src = Rect::sized(100, 200);
        // Drawn at half size, top 20 rows above the viewport
        let clip = clip_scaled(src, Rect::new(0, 80, 50, 100), 100, 1000).unwrap();
        assert_eq!(clip.dst, Rect::new(0, 100, 50, 80));
        assert_eq!(clip.src, Rect::new(0, 40, 100, 160));
        assert_eq!(clip_scaled(src, Rect::new(0, 0, 50, 100), 100, 1000), None);
    }

    #[test]
    fn test_background_drawn_first() {
        let mut compositor = RecordingCompositor::new();
        let options = LayoutOptions {
            background_image: Some("bg.png".into()),
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
        compositor.reset_frame();
        layout.draw(&mut compositor);

        let background = layout.background().unwrap();
        assert_eq!(compositor.copies[0].texture, background);
        assert_eq!(compositor.copies[0].dst, Rect::sized(1920, 1080));
    }
}
