//! Core types and the registration pipeline for the ProCheck guest service.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`store::GuestStore`]; the server drives [`validate`] and
//! [`rules`] in order before persisting a [`guest::GuestRecord`].

pub mod error;
pub mod guest;
pub mod id;
pub mod rules;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
