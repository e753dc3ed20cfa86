//! Shift Scheduling for fixed daily courses.
//!
//! Assigns drivers to `(date, course)` cells. A greedy first-fit generator
//! drafts a range, and operators then refine it cell by cell through a
//! staging layer that holds edits until they are committed.
//!
//! # Domain Model
//!
//! - [`Driver`](domain::Driver): Person with the set of courses they can serve
//! - [`Course`](domain::Course): Fixed daily route, filled in `order`
//! - [`DayOffRequest`](domain::DayOffRequest): Driver unavailable on a date
//! - [`ShiftAssignment`](domain::ShiftAssignment): One cell, possibly unfilled
//!
//! # Rules
//!
//! - A driver is only placed on a course they are capable of
//! - A driver is never placed on a day they requested off
//! - A driver holds at most one course per day, staged edits included

pub mod api;
pub mod config;
pub mod conflicts;
#[cfg(feature = "console")]
pub mod console;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod error;
pub mod generator;
pub mod index;
pub mod scheduler;
pub mod staging;
pub mod store;
pub mod view;
