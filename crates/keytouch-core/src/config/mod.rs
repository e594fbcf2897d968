// Keytouch Config Module
// TOML keyboard configuration and layout descriptions

pub mod layout;
pub mod parser;

pub use layout::{parse_layout, parse_layout_file};
pub use parser::{ConfigError, KeyboardConfig};
