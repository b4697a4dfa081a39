//! Record contract and paging types shared by every repository instance.
//!
//! # Responsibility
//! - Define the `Entity` capability the generic repository is bound by.
//! - Define pagination request/response shapes.

pub mod entity;
pub mod pagination;
