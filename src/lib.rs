#![doc = "mission-catalog-sync: mission catalog reconciliation engine."]

//! Scans a blob-storage bucket of JSON mission definitions and reconciles
//! them against the missions catalog table: identity conflicts are resolved,
//! unique order numbers are allocated, and updates/inserts are applied
//! idempotently with per-file error isolation.
//!
//! # Usage
//! Construct implementations of the [`contract`] traits (or use the
//! [`supabase`] client) and call [`reconcile::run`].

pub mod cli;
pub mod config;
pub mod contract;
pub mod discover;
pub mod load_config;
pub mod payload;
pub mod reconcile;
pub mod supabase;
