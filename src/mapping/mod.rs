//! Field mapping table
//!
//! Describes, per Monit service type, which sub-elements of a `<service>`
//! entry are extracted and which output category (tag suffix) the resulting
//! record is routed to.
//!
//! ## Key Components
//!
//! - [`ServiceType`] - Monit service type codes (`<type>` element)
//! - [`TypeMapping`] - Extraction rules plus category for one service type
//! - [`MappingTable`] - Immutable lookup built once at startup
//!
//! The table is constructed from [`MappingTable::builtin`] and optionally
//! extended from configuration, then shared behind an `Arc`.

mod service_type;
mod table;

pub use service_type::ServiceType;
pub use table::{FieldRule, MappingTable, TypeMapping};
