//! # devsync-shared
//!
//! Domain types shared by the DevSync client crates: the entity models held
//! in the local stores, the REST payloads exchanged with the backend, and the
//! realtime event names and payloads carried over Socket.IO.

pub mod constants;
pub mod error;
pub mod models;
pub mod protocol;
pub mod rest;
pub mod timestamp;
pub mod types;

pub use error::SharedError;
pub use models::*;
pub use types::*;
