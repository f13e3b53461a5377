//! Logic Module - Detection pipeline
//!
//! - `context` - explicit shared state (model state, flag, prediction, error)
//! - `detection_loop` - cooperative per-refresh scheduler
//! - `frame/` - frame sources and preprocessing
//! - `model/` - backends, loader, decoding

pub mod config;
pub mod context;
pub mod detection_loop;
pub mod events;
pub mod frame;
pub mod labels;
pub mod model;
pub mod prediction;
