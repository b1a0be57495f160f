//! # exofop-sg1
//!
//! Validation and upload of TFOP SG1 ground-based transit-photometry packages
//! to ExoFOP.
//!
//! The hard part is not the network call: it is turning an unordered
//! directory of loosely-named files into a validated per-filter observation
//! record with derived statistics, then deciding exactly what gets uploaded
//! and in what order.
//!
//! Flow: raw listing → [`filename`] grammar → [`classify`] suffix table →
//! [`directory`] consistency and grouping → per filter [`selection`] of the
//! primary measurement table and [`statistics`] → [`report`] preview →
//! operator confirmation → [`plan`] → [`portal`] execution.

pub mod classify;
pub mod directory;
pub mod errors;
pub mod filename;
pub mod pipeline;
pub mod plan;
pub mod portal;
pub mod report;
pub mod run_context;
pub mod selection;
pub mod statistics;
pub mod table;
pub mod wcs;
