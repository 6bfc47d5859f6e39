//! Decoding of each API's responses into [`crate::Page`] attributes.

pub mod parse;
pub mod query;
pub mod rest;
pub mod wikidata;

pub use wikidata::{WIKIPROPS, property_label};
