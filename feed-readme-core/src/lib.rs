#![doc = "feed-readme-core: core logic library for feed-readme."]

//! This crate contains the data model, trait seams and pipeline for feed-readme.
//! Network access (feed download, hosting API) lives in the binary crate behind
//! the traits in [`contract`].
//!
//! # Usage
//! Depend on this crate for rendering, section patching, update decisions and
//! the [`synchronise::synchronise`] pipeline.

pub mod config;
pub mod contract;
pub mod error;
pub mod render;
pub mod section;
pub mod synchronise;
pub mod update;
