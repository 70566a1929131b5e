//! Skein - dependency and blocking analysis for a file-backed issue tracker.
//!
//! This crate provides both a CLI application and a library. The library
//! models typed "blocks"/"requires" edges between issues, rebuilds a graph
//! from them on every query, and answers validation, blocking, impact and
//! statistics questions over that graph.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod domain;
pub mod error;
pub mod graph;
pub mod id_generation;
pub mod service;
pub mod storage;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

/// Application context for CLI command execution
pub mod app;

/// Configuration loading
pub mod config;

/// Output formatting for CLI commands
pub mod output;
