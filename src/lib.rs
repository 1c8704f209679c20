//! Guidely admin record service: schema-driven list/create/delete and CSV
//! bulk import/export over a hosted table store, plus the WebSocket surface
//! the admin dashboard talks to.

pub mod bulk;
pub mod catalog;
pub mod manager;
pub mod memory;
pub mod schema;
pub mod store;
pub mod web;
