// src/core/mod.rs

pub mod cipher;
pub mod fmt;
pub mod metric;
pub mod properties;
pub mod symbols;
pub mod template;
