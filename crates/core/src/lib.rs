//! Tabula core: an in-memory table engine.
//!
//! Holds rows under a user-extensible column schema and derives the rows to
//! display through a filter, sort and paginate pipeline. Supports inline
//! edit sessions, all-or-nothing CSV import and CSV export of the filtered
//! rows. Apart from [`persist::FileStore`] nothing here performs I/O.

pub mod csv;
pub mod edit;
pub mod error;
pub mod exporter;
pub mod importer;
pub mod persist;
pub mod query;
pub mod rows;
pub mod schema;
pub mod session;
pub mod types;
pub mod view;
