//! Storefront website and web admin panel

pub mod admin;
pub mod intake;
pub mod pages;
pub mod server;

pub use server::{start_web_server, WebState};
