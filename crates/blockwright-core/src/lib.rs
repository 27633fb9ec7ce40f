//! Core types for Blockwright.
//!
//! This crate holds the data the block renderer consumes and the primitives
//! it produces output with:
//!
//! - [`geometry`] - points, sizes and bounds in block coordinates
//! - [`color`] - CSS and hue colour parsing plus blending
//! - [`path`] - the [`SvgPath`](path::SvgPath) segment builder
//! - [`field`] - the [`Field`](field::Field) trait and the stock fields
//! - [`text`] - font-backed text measurement
//! - [`block`] and [`workspace`] - the block tree the renderer lays out

pub mod block;
pub mod color;
pub mod connection;
pub mod field;
pub mod geometry;
pub mod path;
pub mod text;
pub mod workspace;
