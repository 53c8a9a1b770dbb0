//! Downloads the Evanescence remix collection described by a remote track manifest.
//!
//! Each track is streamed to a `.temp` sibling and renamed onto its final
//! `NN - Name.m4a` path only once the whole body has arrived.

pub mod app;
pub mod config;
pub mod destination;
pub mod domain;
pub mod download;
pub mod error;
pub mod http;
pub mod manifest;
pub mod output;
pub mod tagging;
