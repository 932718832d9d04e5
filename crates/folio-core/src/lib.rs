//! folio-core
//!
//! Domain types, configuration, error taxonomy and the corpus segmenter that
//! turns a flat play/sonnet text stream into citable line segments.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod interchange;
pub mod numeral;
pub mod segmenter;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use segmenter::{Segmentation, Segmenter};
