//! File-backed helpers for store hosts.

pub mod config;
