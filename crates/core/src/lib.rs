#![warn(clippy::all, missing_docs)]

//! Core domain logic for the route planner.
//!
//! This crate hosts the place and route models, the mock catalog,
//! configuration handling, and the persistence layers used by the
//! terminal UI and any future frontends.

pub mod catalog;
pub mod config;
pub mod models;
pub mod notice;
pub mod persistence;
pub mod planner;
pub mod route;
pub mod storage;

pub use catalog::{CatalogError, CatalogSource};
pub use config::AppConfig;
pub use models::{Category, Place, PlaceId, SearchQuery};
pub use notice::{Notice, NoticeBoard, NoticeLevel};
pub use persistence::{Persistence, RouteSnapshot};
pub use planner::{Command, Effect, Outcome, Planner};
pub use route::{AddOutcome, Route, RouteEntry, RouteStats};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
