#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Artifacts (named byte payloads, the unit of storage/transfer)
pub mod artifact;

/// Backup manager (timestamped snapshots, restore-by-copy)
pub mod backup;

/// Content codec (content.json + per-language markdown)
pub mod codec;

/// Configuration options
pub mod config;

/// Content aggregate (translations, shared fields, images)
pub mod content;

/// Error (common error types)
pub mod error;

/// Storage reconciler (mirror a prefix with minimal puts/deletes)
pub mod reconcile;

/// Site renderer (theme files + content -> index.html / index.css)
pub mod render;

/// Native sass binary style compiler
#[cfg(not(target_arch = "wasm32"))]
pub mod sass;

/// Session (load / save / deploy / download)
pub mod session;

/// Storage abstraction
pub mod store;

/// Logic-less template rendering
pub mod template;

/// Theme aggregate (template sources + favicons)
pub mod theme;
