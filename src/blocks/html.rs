//! Read-only HTML rendering of blocks.
//!
//! Rich-text content is emitted as stored. Everything placed inside an
//! attribute (URLs, alt text) is escaped. Broken images hide themselves.

use super::{Block, BlockKind};

/// Escape text for use in HTML element content or attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render one block. Blocks with nothing to show (no url) render as "".
pub fn render_block(block: &Block) -> String {
    match &block.kind {
        BlockKind::Heading(h) => {
            // Editor output already carries its own heading tag.
            if h.content.trim_start().starts_with('<') {
                format!(r#"<div class="block heading">{}</div>"#, h.content)
            } else {
                format!(
                    r#"<h{lvl} class="block heading">{}</h{lvl}>"#,
                    escape(&h.content),
                    lvl = h.level
                )
            }
        }
        BlockKind::Text(t) => format!(r#"<div class="block text">{}</div>"#, t.content),
        BlockKind::Image(img) => match img.url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => format!(
                r#"<figure class="block image"><img src="{}" alt="{}" loading="lazy" onerror="this.style.display='none'"></figure>"#,
                escape(url),
                escape(img.alt.as_deref().unwrap_or(""))
            ),
            None => String::new(),
        },
        BlockKind::Video(v) => match v.url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => match embed_url(url) {
                Some(embed) => format!(
                    r#"<div class="block video"><iframe src="{}" allowfullscreen loading="lazy"></iframe></div>"#,
                    escape(&embed)
                ),
                None => format!(
                    r#"<div class="block video"><video src="{}" controls preload="metadata"></video></div>"#,
                    escape(url)
                ),
            },
            None => String::new(),
        },
    }
}

/// Render a block sequence in order.
pub fn render_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(render_block)
        .filter(|html| !html.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Embeddable player URL for YouTube and Vimeo links.
pub fn embed_url(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    if let Some(query) = rest.strip_prefix("youtube.com/watch?") {
        let id = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("v="))?;
        return video_id(id).map(|id| format!("https://www.youtube.com/embed/{}", id));
    }
    if let Some(path) = rest.strip_prefix("youtu.be/") {
        return video_id(path).map(|id| format!("https://www.youtube.com/embed/{}", id));
    }
    if let Some(path) = rest.strip_prefix("youtube.com/embed/") {
        return video_id(path).map(|id| format!("https://www.youtube.com/embed/{}", id));
    }
    if let Some(path) = rest.strip_prefix("vimeo.com/") {
        let id = video_id(path)?;
        if id.chars().all(|c| c.is_ascii_digit()) {
            return Some(format!("https://player.vimeo.com/video/{}", id));
        }
    }
    None
}

/// Leading id segment of a path, stopped at `?`, `&`, `#` or `/`.
fn video_id(s: &str) -> Option<&str> {
    let id = s.split(['?', '&', '#', '/']).next()?;
    (!id.is_empty()).then_some(id)
}
