//! HTTP side of the console: one shared [`RestTransport`], the envelope adapter that
//! turns whatever the server sends into canonical shapes, and [`RestBackend`], the
//! generic [`ResourceBackend`](resource_sync::ResourceBackend) every resource runs on.

pub mod backend;
pub mod envelope;
pub mod rest;

pub use backend::{ActionCall, Expect, RestBackend, RestResource};
pub use rest::RestTransport;
