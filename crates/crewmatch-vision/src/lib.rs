//! crewmatch-vision — Blocking HTTP client for a Rekognition-style vision API.
//!
//! Implements [`crewmatch_core::VisionService`] on top of three JSON
//! endpoints: `detect-faces`, `recognize-celebrities` and `compare-faces`.

pub mod client;
pub mod wire;

pub use client::{ClientConfig, ClientError, HttpVisionClient};
