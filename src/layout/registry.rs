//! Kitchen Layout Registry
//!
//! Holds the built-in layout plus any layouts loaded from TOML files.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::definition::{KitchenLayout, RawLayoutDefinition};

/// Registry for all kitchen layouts
pub struct LayoutRegistry {
    layouts: HashMap<String, Arc<KitchenLayout>>,
}

impl LayoutRegistry {
    /// Create a registry containing only the built-in `classic` layout
    pub fn new() -> Self {
        let classic = KitchenLayout::classic();
        let mut layouts = HashMap::new();
        layouts.insert(classic.id.clone(), Arc::new(classic));
        Self { layouts }
    }

    /// Load all layout definitions from `<data_dir>/kitchens`
    pub fn load_from_directory(&mut self, data_dir: &Path) -> Result<(), String> {
        let kitchens_dir = data_dir.join("kitchens");

        if !kitchens_dir.exists() {
            warn!("Kitchens directory does not exist: {:?}", kitchens_dir);
            return Ok(());
        }

        let entries = std::fs::read_dir(&kitchens_dir)
            .map_err(|e| format!("Failed to read kitchens directory: {}", e))?;

        for entry in entries {
            let entry = entry.map_err(|e| format!("Failed to read entry: {}", e))?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "toml") {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;

                // Parse as table of layouts
                let table: HashMap<String, RawLayoutDefinition> = toml::from_str(&content)
                    .map_err(|e| format!("Failed to parse {:?}: {}", path, e))?;

                for (id, raw) in table {
                    let layout = KitchenLayout::from_raw(&id, &raw)
                        .map_err(|e| format!("Invalid layout in {:?}: {}", path, e))?;
                    if self.layouts.contains_key(&id) {
                        warn!("Duplicate kitchen ID '{}' in {:?}, overwriting", id, path);
                    }
                    info!(
                        "Loaded kitchen: {} ({}) - {} stations, {} counters",
                        layout.display_name,
                        id,
                        layout.stations().len(),
                        layout.counters.len()
                    );
                    self.layouts.insert(id, Arc::new(layout));
                }
            }
        }

        info!("Loaded {} kitchen layouts", self.len());

        Ok(())
    }

    /// Get a layout by ID
    pub fn get(&self, id: &str) -> Option<Arc<KitchenLayout>> {
        self.layouts.get(id).cloned()
    }

    /// All layouts, sorted by ID
    pub fn all(&self) -> Vec<Arc<KitchenLayout>> {
        let mut layouts: Vec<_> = self.layouts.values().cloned().collect();
        layouts.sort_by(|a, b| a.id.cmp(&b.id));
        layouts
    }

    pub fn contains(&self, id: &str) -> bool {
        self.layouts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}
