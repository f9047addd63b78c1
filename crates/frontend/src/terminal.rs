//! Terminal preview compositor.
//!
//! Implements [`Compositor`] on top of ratatui. The logical screen is scaled
//! onto the terminal's cell grid: highlights and cards become colored blocks,
//! text textures become tinted labels and alpha-modulated fills darken the
//! cells beneath them.

use marquee_core_layout::{
    fit_icon, Background, BlendMode, CardArt, Color, Compositor, CompositorError, Rect,
    TextureId, TextureInfo, TextureSpec,
};
use ratatui::backend::Backend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect as CellRect;
use ratatui::style::Color as CellColor;
use ratatui::widgets::Widget;
use ratatui::Terminal;
use std::collections::HashMap;
use std::path::Path;

/// Card color when the art gives none.
const IMAGE_CARD_COLOR: Color = Color::rgb(0x3a, 0x3a, 0x4a);
const ERROR_CARD_COLOR: Color = Color::rgb(0x8b, 0x10, 0x10);
/// How strongly the icon block stands out from the card background.
const ICON_SHADE: u8 = 64;

#[derive(Debug, Clone)]
enum TextureKind {
    Text(String),
    Fill(Color),
    Outline(Color),
    Card {
        color: Color,
        title: String,
        /// Icon placement in texture space, for generated cards.
        icon: Option<Rect>,
    },
    Error,
}

#[derive(Debug, Clone)]
struct TerminalTexture {
    kind: TextureKind,
    width: i32,
    height: i32,
    /// Padding around the drawn content.
    shadow_offset: i32,
    tint: Option<Color>,
    alpha: u8,
    blend: BlendMode,
}

impl TerminalTexture {
    fn new(kind: TextureKind, width: i32, height: i32, shadow_offset: i32) -> Self {
        Self {
            kind,
            width,
            height,
            shadow_offset,
            tint: None,
            alpha: u8::MAX,
            blend: BlendMode::default(),
        }
    }

    fn content(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height).inset(self.shadow_offset, self.shadow_offset)
    }
}

/// A [`Compositor`] drawing into a ratatui terminal.
pub struct TerminalCompositor<B: Backend> {
    terminal: Terminal<B>,
    screen_width: i32,
    screen_height: i32,
    textures: HashMap<TextureId, TerminalTexture>,
    next_id: u32,
    canvas: Buffer,
}

impl<B: Backend> TerminalCompositor<B> {
    /// `screen_width`x`screen_height` is the logical screen the layout uses.
    pub fn new(terminal: Terminal<B>, screen_width: i32, screen_height: i32) -> Self {
        Self {
            terminal,
            screen_width: screen_width.max(1),
            screen_height: screen_height.max(1),
            textures: HashMap::new(),
            next_id: 1,
            canvas: Buffer::empty(CellRect::default()),
        }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    /// Number of textures not yet destroyed.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn insert(&mut self, texture: TerminalTexture) -> TextureInfo {
        let id = TextureId(self.next_id);
        self.next_id += 1;
        let info = TextureInfo {
            id,
            width: texture.width,
            height: texture.height,
        };
        self.textures.insert(id, texture);
        info
    }

    /// Cell range covered by a logical rect, clipped to the canvas.
    fn cells(&self, rect: Rect) -> Option<CellRect> {
        let area = self.canvas.area;
        if rect.width <= 0 || rect.height <= 0 || area.width == 0 || area.height == 0 {
            return None;
        }
        let scale_x = |x: i32| (x as i64 * area.width as i64).div_euclid(self.screen_width as i64);
        let scale_y = |y: i32| (y as i64 * area.height as i64).div_euclid(self.screen_height as i64);

        let x0 = scale_x(rect.x).max(0);
        let y0 = scale_y(rect.y).max(0);
        let x1 = scale_x(rect.right()).max(x0 + 1).min(area.width as i64);
        let y1 = scale_y(rect.bottom()).max(y0 + 1).min(area.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(CellRect::new(
            area.x + x0 as u16,
            area.y + y0 as u16,
            (x1 - x0) as u16,
            (y1 - y0) as u16,
        ))
    }

    fn fill(&mut self, cells: CellRect, color: Color, alpha: u8) {
        for y in cells.top()..cells.bottom() {
            for x in cells.left()..cells.right() {
                let cell = self.canvas.get_mut(x, y);
                if alpha == u8::MAX {
                    cell.set_symbol(" ").set_bg(to_cell_color(color));
                } else {
                    let bg = mix(cell.bg, color, alpha);
                    let fg = mix(cell.fg, color, alpha);
                    cell.set_bg(bg).set_fg(fg);
                }
            }
        }
    }

    fn outline(&mut self, cells: CellRect, color: Color) {
        let color = to_cell_color(color);
        for y in cells.top()..cells.bottom() {
            for x in cells.left()..cells.right() {
                let edge = y == cells.top()
                    || y + 1 == cells.bottom()
                    || x == cells.left()
                    || x + 1 == cells.right();
                if edge {
                    self.canvas.get_mut(x, y).set_symbol(" ").set_bg(color);
                }
            }
        }
    }

    /// Write `text` starting at the left of `cells`, on its middle row.
    fn label(&mut self, cells: CellRect, text: &str, color: Color, centered: bool) {
        let width = cells.width as usize;
        let chars: Vec<char> = text.chars().take(width).collect();
        let offset = if centered {
            (width - chars.len()) / 2
        } else {
            0
        };
        let y = cells.y + cells.height / 2;
        let fg = to_cell_color(color);
        for (i, c) in chars.iter().enumerate() {
            let cell = self.canvas.get_mut(cells.x + (offset + i) as u16, y);
            cell.set_char(*c).set_fg(fg);
        }
    }
}

/// Map `inner`, a rect in texture space, through the copy `src` -> `dst`.
fn map_rect(inner: Rect, src: Rect, dst: Rect) -> Option<Rect> {
    let visible = inner.intersection(&src)?;
    if src.width <= 0 || src.height <= 0 {
        return None;
    }
    let map_x = |x: i32| dst.x + ((x - src.x) as i64 * dst.width as i64 / src.width as i64) as i32;
    let map_y = |y: i32| dst.y + ((y - src.y) as i64 * dst.height as i64 / src.height as i64) as i32;
    let x = map_x(visible.x);
    let y = map_y(visible.y);
    Some(Rect::new(
        x,
        y,
        map_x(visible.right()) - x,
        map_y(visible.bottom()) - y,
    ))
}

fn to_cell_color(color: Color) -> CellColor {
    CellColor::Rgb(color.r, color.g, color.b)
}

fn mix(under: CellColor, over: Color, alpha: u8) -> CellColor {
    let (r, g, b) = match under {
        CellColor::Rgb(r, g, b) => (r, g, b),
        CellColor::White => (0xff, 0xff, 0xff),
        _ => (0, 0, 0),
    };
    let a = alpha as u16;
    let blend = |u: u8, o: u8| ((u as u16 * (255 - a) + o as u16 * a) / 255) as u8;
    CellColor::Rgb(blend(r, over.r), blend(g, over.g), blend(b, over.b))
}

fn require_file(path: &Path) -> Result<(), CompositorError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CompositorError::AssetLoad {
            path: path.to_path_buf(),
            reason: "file not found".to_string(),
        })
    }
}

fn card_color(art: &CardArt) -> Result<Color, CompositorError> {
    match art {
        CardArt::Custom { image } => {
            require_file(image)?;
            Ok(IMAGE_CARD_COLOR)
        }
        CardArt::Generated {
            background, icon, ..
        } => {
            require_file(icon)?;
            match background {
                Background::Color(color) => Ok(*color),
                Background::Image(path) => {
                    require_file(path)?;
                    Ok(IMAGE_CARD_COLOR)
                }
            }
        }
    }
}

/// Where a generated card's icon goes. Icons are not decoded here, so they
/// are placed as squares.
fn icon_rect(
    art: &CardArt,
    width: i32,
    height: i32,
    shadow_offset: i32,
    icon_margin: f32,
) -> Option<Rect> {
    let CardArt::Generated { margin, .. } = art else {
        return None;
    };
    Some(fit_icon(
        1.0,
        1.0,
        width - 2 * shadow_offset,
        height - 2 * shadow_offset,
        margin.unwrap_or(icon_margin),
        shadow_offset,
    ))
}

/// Readable label color on top of `background`.
fn contrast(background: Color) -> Color {
    let luma = 299 * background.r as u32 + 587 * background.g as u32 + 114 * background.b as u32;
    if luma > 128_000 {
        Color::BLACK
    } else {
        Color::WHITE
    }
}

impl<B: Backend> Compositor for TerminalCompositor<B> {
    fn create_texture(&mut self, spec: &TextureSpec) -> Result<TextureInfo, CompositorError> {
        let texture = match spec {
            TextureSpec::Text {
                text,
                font_size,
                max_width,
            } => {
                let width = (text.chars().count() as i32 * font_size / 2).min(*max_width);
                TerminalTexture::new(TextureKind::Text(text.clone()), width, *font_size, 0)
            }
            TextureSpec::SidebarHighlight {
                width,
                height,
                color,
                shadow_offset,
                ..
            } => TerminalTexture::new(TextureKind::Fill(*color), *width, *height, *shadow_offset),
            TextureSpec::MenuHighlight {
                width,
                height,
                color,
                shadow_offset,
                ..
            } => TerminalTexture::new(TextureKind::Outline(*color), *width, *height, *shadow_offset),
            TextureSpec::Card {
                art,
                title,
                width,
                height,
                shadow_offset,
                icon_margin,
            } => {
                let color = card_color(art)?;
                TerminalTexture::new(
                    TextureKind::Card {
                        color,
                        title: title.clone(),
                        icon: icon_rect(art, *width, *height, *shadow_offset, *icon_margin),
                    },
                    *width,
                    *height,
                    *shadow_offset,
                )
            }
            TextureSpec::ErrorCard {
                width,
                height,
                shadow_offset,
            } => TerminalTexture::new(TextureKind::Error, *width, *height, *shadow_offset),
            TextureSpec::Background {
                path,
                width,
                height,
            } => {
                require_file(path)?;
                TerminalTexture::new(TextureKind::Fill(IMAGE_CARD_COLOR), *width, *height, 0)
            }
            TextureSpec::Solid {
                color,
                width,
                height,
            } => TerminalTexture::new(TextureKind::Fill(*color), *width, *height, 0),
        };
        Ok(self.insert(texture))
    }

    fn copy(&mut self, texture: TextureId, src: Option<Rect>, dst: Rect) {
        let Some(tex) = self.textures.get(&texture).cloned() else {
            tracing::warn!("Copy from unknown texture {:?}", texture);
            return;
        };
        let src = src.unwrap_or(Rect::sized(tex.width, tex.height));
        let Some(content) = map_rect(tex.content(), src, dst) else {
            return;
        };
        let Some(cells) = self.cells(content) else {
            return;
        };

        let alpha = match tex.blend {
            BlendMode::None => u8::MAX,
            BlendMode::Blend => tex.alpha,
        };
        match tex.kind {
            TextureKind::Text(text) => {
                // Only draw a label whose middle line is on screen
                let middle = tex.height / 2;
                if src.y <= middle && middle < src.bottom() {
                    self.label(cells, &text, tex.tint.unwrap_or(Color::WHITE), false);
                }
            }
            TextureKind::Fill(color) => self.fill(cells, color, alpha),
            TextureKind::Outline(color) => self.outline(cells, color),
            TextureKind::Card { color, title, icon } => {
                self.fill(cells, color, alpha);
                let icon_cells = icon
                    .and_then(|icon| map_rect(icon, src, dst))
                    .and_then(|icon| self.cells(icon));
                match icon_cells {
                    Some(icon_cells) => {
                        let shade = (ICON_SHADE as u16 * alpha as u16 / 255) as u8;
                        self.fill(icon_cells, contrast(color), shade);
                        self.label(icon_cells, &title, contrast(color), true);
                    }
                    None => self.label(cells, &title, contrast(color), true),
                }
            }
            TextureKind::Error => {
                self.fill(cells, ERROR_CARD_COLOR, alpha);
                self.label(cells, "!", Color::WHITE, true);
            }
        }
    }

    fn set_blend_mode(&mut self, texture: TextureId, mode: BlendMode) {
        if let Some(tex) = self.textures.get_mut(&texture) {
            tex.blend = mode;
        }
    }

    fn set_color_mod(&mut self, texture: TextureId, color: Color) {
        if let Some(tex) = self.textures.get_mut(&texture) {
            tex.tint = Some(color);
        }
    }

    fn set_alpha_mod(&mut self, texture: TextureId, alpha: u8) {
        if let Some(tex) = self.textures.get_mut(&texture) {
            tex.alpha = alpha;
        }
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }

    fn clear(&mut self, color: Color) {
        let area = match self.terminal.size() {
            Ok(area) => area,
            Err(e) => {
                tracing::debug!("Failed to query terminal size: {}", e);
                self.canvas.area
            }
        };
        if self.canvas.area != area {
            self.canvas.resize(area);
        }
        self.canvas.reset();
        let bg = to_cell_color(color);
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                self.canvas.get_mut(x, y).set_bg(bg);
            }
        }
    }

    fn present(&mut self) -> Result<(), CompositorError> {
        let canvas = &self.canvas;
        self.terminal
            .draw(|frame| frame.render_widget(CanvasWidget(canvas), frame.size()))
            .map_err(|e| CompositorError::Backend(e.to_string()))?;
        Ok(())
    }
}

/// Copies a prepared buffer into the frame.
struct CanvasWidget<'a>(&'a Buffer);

impl Widget for CanvasWidget<'_> {
    fn render(self, area: CellRect, buf: &mut Buffer) {
        let area = area.intersection(self.0.area);
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                *buf.get_mut(x, y) = self.0.get(x, y).clone();
            }
        }
    }
}
