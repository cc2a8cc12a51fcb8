//! HTTP layer for talking to the deployed platform

pub mod client;

pub use client::{ApiClient, ApiResponse, HttpError};
