pub mod toml_loader;

pub use toml_loader::{load_locator_map, load_locator_map_or_default};
