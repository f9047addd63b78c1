//! Parsed layout description: the sidebar items and their cards.
//!
//! The structures deserialize directly from the layout file so the frontend
//! only has to find and read it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Color;

/// The whole layout as written by the user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutDescription {
    #[serde(rename = "sidebar", default)]
    pub items: Vec<SidebarItem>,
}

/// One sidebar row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SidebarItem {
    Menu {
        title: String,
        #[serde(default)]
        entries: Vec<EntryDescription>,
    },
    Command {
        title: String,
        command: String,
    },
}

impl SidebarItem {
    pub fn title(&self) -> &str {
        match self {
            SidebarItem::Menu { title, .. } | SidebarItem::Command { title, .. } => title,
        }
    }
}

/// A launch card inside a menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDescription {
    pub title: String,
    pub command: String,
    pub card: CardArt,
}

/// How a card is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CardArt {
    /// A single user supplied image.
    Custom { image: PathBuf },
    /// A background with a centered icon.
    Generated {
        background: Background,
        icon: PathBuf,
        /// Overrides the default icon margin.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        margin: Option<f32>,
    },
}

impl CardArt {
    /// Resolve relative asset paths against `base`.
    pub fn rebase(&mut self, base: &Path) {
        match self {
            CardArt::Custom { image } => rebase_path(image, base),
            CardArt::Generated {
                background, icon, ..
            } => {
                rebase_path(icon, base);
                if let Background::Image(path) = background {
                    rebase_path(path, base);
                }
            }
        }
    }
}

/// Background of a generated card: a `#rrggbb` color or an image path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Background {
    Color(Color),
    Image(PathBuf),
}

impl From<String> for Background {
    fn from(value: String) -> Self {
        match Color::from_hex(&value) {
            Ok(color) => Background::Color(color),
            Err(_) => Background::Image(PathBuf::from(value)),
        }
    }
}

impl From<Background> for String {
    fn from(background: Background) -> Self {
        match background {
            Background::Color(color) => color.to_string(),
            Background::Image(path) => path.to_string_lossy().into_owned(),
        }
    }
}

fn rebase_path(path: &mut PathBuf, base: &Path) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

impl LayoutDescription {
    /// Resolve every relative asset path against the layout file directory.
    pub fn rebase(&mut self, base: &Path) {
        for item in &mut self.items {
            if let SidebarItem::Menu { entries, .. } = item {
                for entry in entries {
                    entry.card.rebase(base);
                }
            }
        }
    }
}
