//! Built-in memorial page templates.
//!
//! Template block ids are placeholders; [`BlockEditor::load_template`]
//! replaces them when a template is applied.
//!
//! [`BlockEditor::load_template`]: super::BlockEditor::load_template

use serde::Serialize;

use super::{Block, BlockId, BlockKind, Heading, ImageBlock, TextBlock, VideoBlock};

/// A named starting layout.
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub blocks: Vec<Block>,
}

/// Template names in display order.
pub const TEMPLATES: &[&str] = &["classic", "life-story", "gallery"];

fn heading(n: usize, level: u8, content: &str) -> Block {
    Block::new(
        BlockId::from(format!("tpl-{}", n)),
        BlockKind::Heading(Heading {
            content: content.into(),
            level,
        }),
    )
}

fn text(n: usize, content: &str) -> Block {
    Block::new(
        BlockId::from(format!("tpl-{}", n)),
        BlockKind::Text(TextBlock {
            content: content.into(),
        }),
    )
}

fn image(n: usize, alt: &str) -> Block {
    Block::new(
        BlockId::from(format!("tpl-{}", n)),
        BlockKind::Image(ImageBlock {
            url: None,
            alt: Some(alt.into()),
        }),
    )
}

fn video(n: usize) -> Block {
    Block::new(
        BlockId::from(format!("tpl-{}", n)),
        BlockKind::Video(VideoBlock { url: None }),
    )
}

/// Look up a template by name.
pub fn by_name(name: &str) -> Option<Template> {
    match name {
        "classic" => Some(Template {
            name: "classic",
            label: "Classic",
            description: "Name, portrait, dates and a short obituary",
            blocks: vec![
                heading(0, 1, "In Loving Memory"),
                image(1, "Portrait"),
                heading(2, 2, "Full Name"),
                text(3, "<p>Date of birth – Date of passing</p>"),
                text(
                    4,
                    "<p>Write a few words about the life and legacy of your loved one.</p>",
                ),
            ],
        }),
        "life-story" => Some(Template {
            name: "life-story",
            label: "Life Story",
            description: "Chapters from early years to family and legacy",
            blocks: vec![
                heading(0, 1, "A Life Well Lived"),
                image(1, "Portrait"),
                heading(2, 2, "Early Years"),
                text(3, "<p>Where they were born and grew up.</p>"),
                heading(4, 2, "Family"),
                text(5, "<p>The people they loved most.</p>"),
                heading(6, 2, "Work and Passions"),
                text(7, "<p>What filled their days.</p>"),
                heading(8, 2, "Legacy"),
                text(9, "<p>How they will be remembered.</p>"),
            ],
        }),
        "gallery" => Some(Template {
            name: "gallery",
            label: "Photo Gallery",
            description: "A title followed by photos and a video tribute",
            blocks: vec![
                heading(0, 1, "Cherished Moments"),
                image(1, "Photo 1"),
                image(2, "Photo 2"),
                image(3, "Photo 3"),
                heading(4, 2, "Video Tribute"),
                video(5),
            ],
        }),
        _ => None,
    }
}

/// All templates in display order.
pub fn all() -> Vec<Template> {
    TEMPLATES.iter().filter_map(|name| by_name(name)).collect()
}
