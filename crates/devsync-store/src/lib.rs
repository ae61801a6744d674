//! # devsync-store
//!
//! Client-side state for DevSync. Each aggregate (canvases, list items,
//! presence status, theme) lives in its own store struct that callers own
//! and inject where needed; nothing here is a global.
//!
//! The [`cache`] module provides the device key/value cache the auth session
//! mirrors its state into, with an in-memory implementation and one backed
//! by a local SQLite file.

pub mod cache;
pub mod canvases;
pub mod clock;
pub mod database;
pub mod lists;
pub mod migrations;
pub mod seed;
pub mod status;
pub mod theme;

mod error;

pub use cache::{DeviceCache, MemoryCache, SqliteCache};
pub use canvases::CanvasStore;
pub use clock::{Clock, ManualClock, SystemClock};
pub use database::Database;
pub use error::{Result, StoreError};
pub use lists::ListsStore;
pub use status::StatusStore;
pub use theme::{Palette, Theme, ThemeStore};
