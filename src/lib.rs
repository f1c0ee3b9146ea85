//! capref: a small documentation builder that numbers captioned figures,
//! tables and custom blocks, and fills empty links pointing at them.

pub mod build;
pub mod caption;
pub mod config;
pub mod dom;
