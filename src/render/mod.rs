//! Renderer module: trait-based format dispatch.

pub mod json;
pub mod pkgbuild;

use crate::model::Document;
use crate::tables::Tables;
use anyhow::{anyhow, Result};

/// Trait for rendering a Document into a specific output format.
pub trait Renderer {
    fn render(&self, doc: &Document) -> Result<String>;
    fn name(&self) -> &str;
}

/// Create a renderer for the given format name.
pub fn create_renderer<'a>(format: &str, tables: &'a Tables) -> Result<Box<dyn Renderer + 'a>> {
    match format {
        "pkgbuild" | "text" => Ok(Box::new(pkgbuild::PkgbuildRenderer::new(tables))),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!("unknown format: {}. Use pkgbuild or json", format)),
    }
}
