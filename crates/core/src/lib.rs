//! Core domain types for the Port entity exporter
//!
//! This crate defines the data structures shared by every other crate:
//! Entities, Blueprints, the export selection and the merged export set.

pub mod blueprint;
pub mod entity;
pub mod error;
pub mod export_set;
pub mod selection;

pub use blueprint::{Blueprint, BlueprintSchema};
pub use entity::Entity;
pub use error::{CoreError, Result};
pub use export_set::ExportSet;
pub use selection::{parse_list, EntityRef, ExportSelection, SelectionMode};
