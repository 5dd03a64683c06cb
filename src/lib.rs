//! Estate Admin - client core for the building, device and metering API
//!
//! This library exposes the session, resource clients and screen controllers
//! for the command-line tool and for testing.

pub mod api;
pub mod auth;
pub mod common;
pub mod config;
pub mod controller;
pub mod error;
pub mod services;
