//! Common utilities shared by the package and element layers.

pub mod xml;
