//! Item rendering: first `max` feed items through a template, joined by newlines.
//!
//! Templates are Handlebars in non-strict mode, which covers the mustache subset
//! feed templates use: `{{field}}` (HTML-escaped), `{{{field}}}` (raw) and
//! `{{#each list}}...{{/each}}`. A field the item does not carry renders as
//! empty text.

use handlebars::Handlebars;
use tracing::{debug, error, info};

use crate::contract::FeedItem;
use crate::error::RenderError;

const ITEM_TEMPLATE: &str = "item";

/// Renders feed items through one compiled template.
pub struct ItemRenderer<'reg> {
    registry: Handlebars<'reg>,
}

impl<'reg> ItemRenderer<'reg> {
    /// Compile `template`. Fails with [`RenderError::Template`] on syntax errors.
    pub fn new(template: &str) -> Result<Self, RenderError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry
            .register_template_string(ITEM_TEMPLATE, template)
            .map_err(|e| {
                error!(error = %e, "Failed to compile item template");
                RenderError::Template(e.to_string())
            })?;
        Ok(Self { registry })
    }

    /// Render a single item.
    pub fn render_item(&self, index: usize, item: &FeedItem) -> Result<String, RenderError> {
        self.registry
            .render(ITEM_TEMPLATE, item)
            .map_err(|e| RenderError::Item {
                index,
                reason: e.to_string(),
            })
    }

    /// Render each item in order, one block per item.
    pub fn render_blocks(&self, items: &[FeedItem]) -> Result<Vec<String>, RenderError> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| self.render_item(index, item))
            .collect()
    }
}

/// Take the first `max` items (fewer if the feed is shorter), render each and
/// join the blocks with a single `\n`.
///
/// Nothing to render yields empty text without compiling the template.
pub fn render_items(items: &[FeedItem], max: usize, template: &str) -> Result<String, RenderError> {
    let selected = &items[..items.len().min(max)];
    if selected.is_empty() {
        info!(available = items.len(), max, "No items selected, section will be emptied");
        return Ok(String::new());
    }

    let renderer = ItemRenderer::new(template)?;
    let blocks = renderer.render_blocks(selected)?;
    debug!(blocks = ?blocks, "Rendered blocks");
    info!(rendered = blocks.len(), available = items.len(), max, "Rendered feed items");
    Ok(blocks.join("\n"))
}
