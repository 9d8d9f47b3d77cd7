//! API handlers
//!
//! Author: hephaex@gmail.com

pub mod auth;
pub mod health;
pub mod posts;
pub mod users;
