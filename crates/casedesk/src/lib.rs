//! Case-management view model for incidents, warranties, internal cases, deliveries, and
//! receiving.
//!
//! The [`cases`] module holds the domain types and the list/detail view logic; [`config`],
//! [`error`], and [`telemetry`] carry the ambient pieces shared with the service binary.

pub mod cases;
pub mod config;
pub mod error;
pub mod telemetry;
