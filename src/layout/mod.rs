//! Kitchen Layouts
//!
//! Station and counter placement for a kitchen, loaded from TOML data files
//! with a built-in default.

pub mod definition;
pub mod registry;

pub use definition::{KitchenLayout, LayoutError, StationKind};
pub use registry::LayoutRegistry;
