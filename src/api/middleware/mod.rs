//! Request middleware. Only bearer authentication for now; it guards the
//! routes that act on behalf of a logged-in patient.

pub mod auth;
