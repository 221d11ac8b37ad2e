pub mod columns;
pub mod edits;
pub mod query;
pub mod rows;
pub mod transfer;
