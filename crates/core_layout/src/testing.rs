//! In-memory compositor that records every call.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::{
    BlendMode, CardArt, Color, Compositor, CompositorError, EntryDescription, LayoutDescription,
    Rect, SidebarItem, TextureId, TextureInfo, TextureSpec,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CopyCall {
    pub texture: TextureId,
    pub src: Option<Rect>,
    pub dst: Rect,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingCompositor {
    next_id: u32,
    pub textures: HashMap<TextureId, TextureSpec>,
    pub copies: Vec<CopyCall>,
    pub color_mods: HashMap<TextureId, Color>,
    pub alpha_mods: HashMap<TextureId, u8>,
    pub destroyed: Vec<TextureId>,
    pub failing: Vec<PathBuf>,
    pub clears: usize,
    pub presents: usize,
}

impl RecordingCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make card textures referencing `path` fail to load.
    pub fn fail_on(mut self, path: &str) -> Self {
        self.failing.push(PathBuf::from(path));
        self
    }

    pub fn reset_frame(&mut self) {
        self.copies.clear();
    }

    pub fn copies_of(&self, texture: TextureId) -> Vec<CopyCall> {
        self.copies
            .iter()
            .filter(|c| c.texture == texture)
            .copied()
            .collect()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len() - self.destroyed.len()
    }
}

impl Compositor for RecordingCompositor {
    fn create_texture(&mut self, spec: &TextureSpec) -> Result<TextureInfo, CompositorError> {
        let (width, height) = match spec {
            TextureSpec::Text {
                text,
                font_size,
                max_width,
            } => {
                let width = (text.chars().count() as i32 * font_size / 2).min(*max_width);
                (width, *font_size)
            }
            TextureSpec::Card {
                art,
                width,
                height,
                ..
            } => {
                let path = match art {
                    CardArt::Custom { image } => image,
                    CardArt::Generated { icon, .. } => icon,
                };
                if self.failing.contains(path) {
                    return Err(CompositorError::AssetLoad {
                        path: path.clone(),
                        reason: "not found".to_string(),
                    });
                }
                (*width, *height)
            }
            TextureSpec::SidebarHighlight { width, height, .. }
            | TextureSpec::MenuHighlight { width, height, .. }
            | TextureSpec::ErrorCard { width, height, .. }
            | TextureSpec::Background { width, height, .. }
            | TextureSpec::Solid { width, height, .. } => (*width, *height),
        };
        self.next_id += 1;
        let id = TextureId(self.next_id);
        self.textures.insert(id, spec.clone());
        Ok(TextureInfo { id, width, height })
    }

    fn copy(&mut self, texture: TextureId, src: Option<Rect>, dst: Rect) {
        self.copies.push(CopyCall { texture, src, dst });
    }

    fn set_blend_mode(&mut self, _texture: TextureId, _mode: BlendMode) {}

    fn set_color_mod(&mut self, texture: TextureId, color: Color) {
        self.color_mods.insert(texture, color);
    }

    fn set_alpha_mod(&mut self, texture: TextureId, alpha: u8) {
        self.alpha_mods.insert(texture, alpha);
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.destroyed.push(texture);
    }

    fn clear(&mut self, _color: Color) {
        self.clears += 1;
    }

    fn present(&mut self) -> Result<(), CompositorError> {
        self.presents += 1;
        Ok(())
    }
}

pub(crate) fn entry(title: &str, image: &str) -> EntryDescription {
    EntryDescription {
        title: title.to_string(),
        command: format!("run {title}"),
        card: CardArt::Custom {
            image: PathBuf::from(image),
        },
    }
}

pub(crate) fn menu(title: &str, count: usize) -> SidebarItem {
    SidebarItem::Menu {
        title: title.to_string(),
        entries: (0..count)
            .map(|i| entry(&format!("{title} {i}"), &format!("{title}/{i}.png")))
            .collect(),
    }
}

pub(crate) fn command(title: &str, command: &str) -> SidebarItem {
    SidebarItem::Command {
        title: title.to_string(),
        command: command.to_string(),
    }
}

pub(crate) fn description(items: Vec<SidebarItem>) -> LayoutDescription {
    LayoutDescription { items }
}
