//! Data models: catalog, lesson content, quiz state, saved bundles, configuration.

pub mod bundle;
pub mod catalog;
pub mod config;
pub mod lesson;
pub mod quiz;
