//! Catalog domain model.
//!
//! # Responsibility
//! - Define the Area → Context → Find scope keys and stored records.
//! - Define survey path records, photo records and their storage addressing.
//! - Define action log entries for audited writes.
//!
//! # Invariants
//! - Scope tuples are immutable identifiers once a child record exists.
//! - Context and find numbers are assigned once and never change.

pub mod audit;
pub mod catalog;
pub mod photo;
pub mod scope;
pub mod survey;
