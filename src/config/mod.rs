//! Configuration loaded from `.cloudkeychain.toml`.

pub mod settings;

pub use settings::Settings;
