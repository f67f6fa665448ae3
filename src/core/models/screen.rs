//! Screens and their layouts

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids;
use super::viewport::Viewport;

/// Layout type used by [`Screen::with_grid_layout`]
pub const GRID_LAYOUT: &str = "grid";

/// How a screen's viewports are arranged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    /// Layout type, usually `grid`
    #[serde(rename = "type")]
    pub layout_type: String,
    /// Number of rows
    #[serde(default)]
    pub rows: u32,
    /// Number of columns
    #[serde(default)]
    pub columns: u32,
    /// Named layout template, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
}

impl Layout {
    /// Grid layout with the given dimensions
    #[must_use]
    pub fn grid(rows: u32, columns: u32) -> Self {
        Self {
            layout_type: GRID_LAYOUT.to_string(),
            rows,
            columns,
            template_name: None,
        }
    }

    /// Number of cells in the layout
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.rows.saturating_mul(self.columns)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::grid(1, 1)
    }
}

/// One display surface of a stage
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Viewport arrangement
    pub layout: Layout,
    /// Physical position hint for multi-monitor setups
    pub position: Option<Value>,
    /// Monitor selectors
    pub selectors: Option<Value>,
    /// Viewports in layout order
    pub viewports: Vec<Viewport>,
}

impl Screen {
    /// Empty screen with a fresh id
    pub fn new(layout: Layout, name: Option<String>) -> Self {
        Self {
            id: ids::generate_id(),
            name,
            layout,
            position: None,
            selectors: None,
            viewports: Vec::new(),
        }
    }

    /// Grid screen filled with `rows * columns` empty viewports
    pub fn with_grid_layout(rows: u32, columns: u32, name: Option<String>) -> Self {
        let mut screen = Self::new(Layout::grid(rows, columns), name);
        screen.viewports = (0..screen.layout.cell_count()).map(|_| Viewport::new()).collect();
        screen
    }

    /// Copy of the screen under a fresh id, optionally renamed
    #[must_use]
    pub fn create_clone(&self, name: Option<&str>) -> Self {
        let mut clone = self.clone();
        clone.id = ids::generate_id();
        if let Some(name) = name {
            clone.name = Some(name.to_string());
        }
        clone
    }

    /// Append a viewport
    pub fn add_viewport(&mut self, viewport: Viewport) {
        self.viewports.push(viewport);
    }

    /// Visit every viewport with its index
    pub fn for_each_viewport(&self, mut visit: impl FnMut(&Viewport, usize)) {
        for (index, viewport) in self.viewports.iter().enumerate() {
            visit(viewport, index);
        }
    }
}
