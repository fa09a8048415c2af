//! Bazaar API library.
//!
//! The REST backend as a library, so the binary, the CLI and the tests share
//! one router, one set of repositories and one configuration loader.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::app;
