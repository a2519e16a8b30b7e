//! Library exports for the portfolio site, shared between the binary and tests.

pub mod auth;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod pages;
pub mod render;
pub mod routes;
pub mod session;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
