pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod genre;
pub mod similarity;

/// Audio file extensions we support (everything symphonia is built to probe).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "m4a", "aac"];

/// Application name for XDG paths
pub const APP_NAME: &str = "cuematch";
