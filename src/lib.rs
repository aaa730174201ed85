//! Personal todo list: an owner-scoped todo API and a terminal dashboard
//! that talks to it.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod routes;
pub mod state;
pub mod store;
pub mod token;
