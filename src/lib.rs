//! Furniture-store website with a Telegram support bot.
//!
//! The storefront serves a JSON-file product catalog and a contact/order
//! form; the bot relays customer messages into an SQLite-backed ticketing
//! system and fans them out to the configured operators.

pub mod cli;
pub mod core;
pub mod i18n;
pub mod storage;
pub mod telegram;
pub mod web;

pub use core::{AppError, AppResult};
