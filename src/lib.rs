//! This crate provides a task backend for CalDAV servers.
//!
//! It maps task lists and tasks onto the wire protocols of a groupware server (typically Nextcloud):
//! WebDAV collections and `VTODO` items for the data itself, and the OCS JSON API for public links.
//!
//! The entry point is [`Client`], built from a [`BackendConfig`]. It implements the capability traits of the [`traits`] module:
//! every backend offers [`TaskBackend`](traits::TaskBackend), while publication, subscription and sharing are separate traits. \
//! A `Client` holds no data between calls: every operation is a fresh round trip to the server, and creations, updates and deletions
//! are idempotent, so that a sync queue can replay them safely.
//!
//! Expected outcomes a caller should branch on (e.g. "this list is already published") are reported as dedicated [`Error`] variants,
//! see [`Error::is_sentinel`].

pub mod traits;

pub mod config;
pub use config::BackendConfig;
pub mod error;
pub use error::Error;
pub mod resource;
mod transport;

pub mod task;
pub use task::{Task, TaskStatus};
pub mod calendar;
pub use calendar::TaskList;

pub mod ical;
pub mod multistatus;

pub mod client;
pub use client::Client;
pub mod ocs;
pub use ocs::{Share, ShareType};
pub mod subscription;

pub mod utils;
