//! Core business logic - framework-agnostic operations on sites, staff, attendance,
//! payroll and notifications.
//!
//! Every operation takes the database connection and an explicit [`access::Actor`], and
//! routes visibility and write checks through [`access`].

pub mod access;
pub mod attendance;
pub mod category;
pub mod dates;
pub mod employee;
pub mod notification;
pub mod payroll;
pub mod site;
pub mod user;
