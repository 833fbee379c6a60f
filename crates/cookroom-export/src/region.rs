//! Exportable view regions.
//!
//! A hosting view mounts the content it renders as an ordered list of
//! [`RegionNode`]s and keeps the returned [`RegionHandle`]. Export looks the
//! region up by handle; unmounted or unknown handles are an error rather than
//! a silent empty export.

use std::{collections::HashMap, fmt, sync::Arc};

use cookroom_api::Recipe;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ExportError, ExportResult};

/// Explicit reference to a mounted region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionHandle(Uuid);

impl RegionHandle {
    /// A handle that was never mounted anywhere
    pub fn detached() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RegionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region:{}", self.0)
    }
}

/// What a node renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Heading(String),
    Subheading(String),
    Paragraph(String),
    List { ordered: bool, items: Vec<String> },
    Image { url: String, alt: String },
    /// Interactive element such as a button
    Control(String),
}

/// One block of a region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionNode {
    pub kind: NodeKind,
    /// Left out of exported documents
    pub exclude_from_export: bool,
}

impl RegionNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            exclude_from_export: false,
        }
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Heading(text.into()))
    }

    pub fn subheading(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Subheading(text.into()))
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Paragraph(text.into()))
    }

    pub fn list(ordered: bool, items: Vec<String>) -> Self {
        Self::new(NodeKind::List { ordered, items })
    }

    pub fn image(url: impl Into<String>, alt: impl Into<String>) -> Self {
        Self::new(NodeKind::Image {
            url: url.into(),
            alt: alt.into(),
        })
    }

    /// Controls are excluded from export unless re-included explicitly
    pub fn control(label: impl Into<String>) -> Self {
        Self::new(NodeKind::Control(label.into())).excluded()
    }

    pub fn excluded(mut self) -> Self {
        self.exclude_from_export = true;
        self
    }

    pub fn included(mut self) -> Self {
        self.exclude_from_export = false;
        self
    }
}

/// Standard recipe card
#[derive(Debug, Clone)]
pub struct RecipeView<'a> {
    recipe: &'a Recipe,
    image_url: Option<String>,
    favorited: bool,
}

impl<'a> RecipeView<'a> {
    pub fn new(recipe: &'a Recipe) -> Self {
        Self {
            recipe,
            image_url: None,
            favorited: false,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_favorite(mut self, favorited: bool) -> Self {
        self.favorited = favorited;
        self
    }

    /// Title, English name, image, ingredients and instructions, followed by
    /// the favorite and download controls.
    pub fn nodes(&self) -> Vec<RegionNode> {
        let recipe = self.recipe;
        let mut nodes = vec![RegionNode::heading(&recipe.name)];

        if let Some(english) = recipe
            .english_name
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty() && *e != recipe.name)
        {
            nodes.push(RegionNode::subheading(english));
        }

        if let Some(url) = &self.image_url {
            nodes.push(RegionNode::image(url, &recipe.name));
        }

        if !recipe.ingredients.is_empty() {
            nodes.push(RegionNode::subheading("Ingredients"));
            nodes.push(RegionNode::list(false, recipe.ingredients.clone()));
        }

        let steps: Vec<String> = recipe
            .instructions
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        match steps.len() {
            0 => {}
            1 => {
                nodes.push(RegionNode::subheading("Instructions"));
                nodes.push(RegionNode::paragraph(steps.concat()));
            }
            _ => {
                nodes.push(RegionNode::subheading("Instructions"));
                nodes.push(RegionNode::list(true, steps));
            }
        }

        let favorite_label = if self.favorited { "Remove favorite" } else { "Add favorite" };
        nodes.push(RegionNode::control(favorite_label));
        nodes.push(RegionNode::control("Download PDF"));
        nodes
    }
}

/// Mounted regions, shared between views and the export pipeline
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: Arc<Mutex<HashMap<RegionHandle, Vec<RegionNode>>>>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&self, nodes: Vec<RegionNode>) -> RegionHandle {
        let handle = RegionHandle(Uuid::new_v4());
        self.regions.lock().insert(handle, nodes);
        debug!(%handle, "mounted region");
        handle
    }

    /// Replace the content of a mounted region
    pub fn update(&self, handle: RegionHandle, nodes: Vec<RegionNode>) -> ExportResult<()> {
        match self.regions.lock().get_mut(&handle) {
            Some(existing) => {
                *existing = nodes;
                Ok(())
            }
            None => Err(ExportError::RegionNotFound(handle)),
        }
    }

    pub fn unmount(&self, handle: RegionHandle) -> bool {
        let removed = self.regions.lock().remove(&handle).is_some();
        if removed {
            debug!(%handle, "unmounted region");
        }
        removed
    }

    pub fn is_mounted(&self, handle: RegionHandle) -> bool {
        self.regions.lock().contains_key(&handle)
    }

    /// Copy of the region's nodes at this instant
    pub fn snapshot(&self, handle: RegionHandle) -> ExportResult<Vec<RegionNode>> {
        self.regions
            .lock()
            .get(&handle)
            .cloned()
            .ok_or(ExportError::RegionNotFound(handle))
    }

    pub fn len(&self) -> usize {
        self.regions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curry() -> Recipe {
        Recipe::new(
            "카레",
            vec!["rice".into(), "curry roux".into()],
            "Cook rice\nSimmer roux\nServe",
        )
        .with_english_name("Curry")
    }

    #[test]
    fn test_mount_snapshot_unmount() {
        let registry = RegionRegistry::new();
        let handle = registry.mount(vec![RegionNode::heading("Soup")]);

        assert!(registry.is_mounted(handle));
        assert_eq!(registry.snapshot(handle).unwrap().len(), 1);

        registry
            .update(handle, vec![RegionNode::heading("Soup"), RegionNode::paragraph("Hot")])
            .unwrap();
        assert_eq!(registry.snapshot(handle).unwrap().len(), 2);

        assert!(registry.unmount(handle));
        assert!(!registry.unmount(handle));
        assert!(matches!(
            registry.snapshot(handle),
            Err(ExportError::RegionNotFound(h)) if h == handle
        ));
    }

    #[test]
    fn test_update_unknown_region() {
        let registry = RegionRegistry::new();
        assert!(registry.update(RegionHandle::detached(), vec![]).is_err());
    }

    #[test]
    fn test_recipe_view_layout() {
        let recipe = curry();
        let nodes = RecipeView::new(&recipe)
            .with_image("http://localhost:8000/uploads/curry.png")
            .nodes();

        assert_eq!(nodes[0].kind, NodeKind::Heading("카레".to_string()));
        assert_eq!(nodes[1].kind, NodeKind::Subheading("Curry".to_string()));
        assert!(matches!(nodes[2].kind, NodeKind::Image { .. }));
        assert!(nodes.iter().any(|n| matches!(
            &n.kind,
            NodeKind::List { ordered: true, items } if items.len() == 3
        )));

        let controls: Vec<_> = nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Control(_)))
            .collect();
        assert_eq!(controls.len(), 2);
        assert!(controls.iter().all(|n| n.exclude_from_export));
    }

    #[test]
    fn test_recipe_view_single_step_and_same_english_name() {
        let recipe = Recipe::new("Toast", vec![], "Toast the bread").with_english_name("Toast");
        let nodes = RecipeView::new(&recipe).with_favorite(true).nodes();

        assert!(!nodes
            .iter()
            .any(|n| n.kind == NodeKind::Subheading("Toast".to_string())));
        assert!(nodes
            .iter()
            .any(|n| n.kind == NodeKind::Paragraph("Toast the bread".to_string())));
        assert!(nodes
            .iter()
            .any(|n| n.kind == NodeKind::Control("Remove favorite".to_string())));
    }
}
