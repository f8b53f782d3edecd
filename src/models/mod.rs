//! Core data models for the conversion service.
//!
//! These types describe what flows through a request: the selected
//! conversion tab, the files a client uploaded and the file produced
//! for download.

pub mod converted;
pub mod tab;
pub mod upload;
