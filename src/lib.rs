//! # dbbrowse CLI
//!
//! Console tools for exploring the Sakila and Chinook SQLite sample
//! databases. Each command opens one database file, runs fixed or
//! parameterized queries, and prints the rows, optionally letting the
//! operator page through a result list and pick a row for a detail query.
//!
//! ## Features
//!
//! - **Sakila menu**: browse customers, their rentals, and customer details
//!   through a numbered menu
//! - **Chinook listings**: artists and album/artist joins printed row by row
//! - **Ad-hoc queries**: any statement with positional `?` parameters,
//!   printed or paged
//! - **Saved databases**: named database files stored in
//!   `~/.dbbrowse-cli/config.json`
//!
//! ## Modules
//!
//! - `config`: saved database names and environment overrides
//! - `db`: SQLite access and result collection
//! - `console`: line-based integer input over any reader/writer pair
//! - `pager`: the generic paged selection loop
//! - `menu`: the numbered-action read-eval loop
//! - `sakila`: rental and customer menu actions
//! - `chinook`: artist and album listings, ad-hoc queries

pub mod chinook;
pub mod config;
pub mod console;
pub mod db;
pub mod menu;
pub mod pager;
pub mod sakila;

pub use crate::config::Config;
pub use crate::console::Console;
pub use crate::db::{Database, DbError};
pub use crate::pager::browse;
