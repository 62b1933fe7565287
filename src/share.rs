//! # Sharing View
//!
//! Read-only rendering of a saved page: an HTML document for visitors and
//! the canvas scene as a PNG. Nothing here can edit the page.

use chrono::NaiveDate;

use crate::blocks::html::{escape, render_blocks};
use crate::canvas::{AssetResolver, Scene, render};
use crate::error::MemoriaError;
use crate::persist::{PageContent, PageMeta};

const SHARE_CSS: &str = r#"<style>
  body { margin: 0; background: #f8f7f4; color: #1f2937; font-family: Georgia, 'Times New Roman', serif; }
  main { max-width: 720px; margin: 0 auto; padding: 48px 24px 96px; }
  header.memorial { text-align: center; margin-bottom: 40px; }
  header.memorial h1 { font-size: 2.4rem; margin: 0 0 8px; }
  header.memorial .name { font-size: 1.4rem; margin: 0; }
  header.memorial .dates { color: #6b7280; margin-top: 6px; letter-spacing: 0.04em; }
  .block { margin: 0 0 24px; line-height: 1.6; }
  .block.image img { max-width: 100%; border-radius: 6px; display: block; margin: 0 auto; }
  .block.video iframe, .block.video video { width: 100%; aspect-ratio: 16 / 9; border: 0; }
  .scene img { width: 100%; border-radius: 6px; box-shadow: 0 1px 4px rgba(0,0,0,0.12); }
</style>"#;

/// Human form of a stored `YYYY-MM-DD` date; other input is shown as is.
fn display_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => raw.trim().to_string(),
    }
}

fn life_span(meta: &PageMeta) -> Option<String> {
    let birth = meta.birth_date.as_deref().filter(|d| !d.trim().is_empty());
    let death = meta.death_date.as_deref().filter(|d| !d.trim().is_empty());
    match (birth, death) {
        (None, None) => None,
        (Some(b), None) => Some(format!("Born {}", display_date(b))),
        (None, Some(d)) => Some(format!("Died {}", display_date(d))),
        (Some(b), Some(d)) => Some(format!("{} – {}", display_date(b), display_date(d))),
    }
}

fn render_header(meta: &PageMeta) -> String {
    let mut html = String::from(r#"<header class="memorial">"#);
    if !meta.title.trim().is_empty() {
        html.push_str(&format!("<h1>{}</h1>", escape(meta.title.trim())));
    }
    if !meta.full_name.trim().is_empty() {
        html.push_str(&format!(
            r#"<p class="name">{}</p>"#,
            escape(meta.full_name.trim())
        ));
    }
    if let Some(span) = life_span(meta) {
        html.push_str(&format!(r#"<p class="dates">{}</p>"#, escape(&span)));
    }
    html.push_str("</header>");
    html
}

/// Full HTML document for a page.
///
/// `scene_url` points at the rendered scene image; it is only used when the
/// page has a non-empty scene.
pub fn render_page_html(content: &PageContent, scene_url: Option<&str>) -> String {
    let title = if content.meta.title.trim().is_empty() {
        "In Memory".to_string()
    } else {
        content.meta.title.trim().to_string()
    };

    let scene = match (&content.scene, scene_url) {
        (Some(scene), Some(url)) if !scene.objects.is_empty() => format!(
            r#"<figure class="block scene"><img src="{}" alt="{}"></figure>"#,
            escape(url),
            escape(&title)
        ),
        _ => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    {css}
</head>
<body>
<main>
{header}
{blocks}
{scene}
</main>
</body>
</html>"#,
        title = escape(&title),
        css = SHARE_CSS,
        header = render_header(&content.meta),
        blocks = render_blocks(&content.blocks),
        scene = scene,
    )
}

/// Resolve a scene's images and rasterize it to PNG off the async runtime.
pub async fn scene_png(scene: Scene, resolver: &AssetResolver) -> Result<Vec<u8>, MemoriaError> {
    let images = resolver.resolve(&scene).await;
    tokio::task::spawn_blocking(move || render::render_png(&scene, &images))
        .await
        .map_err(|e| MemoriaError::Render(format!("render task failed: {}", e)))?
}
