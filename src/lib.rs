//! Squad health dashboard built from Jira Agile boards.
//!
//! [`jira::JiraClient`] pages through the Agile REST API, [`normalize`] maps
//! Jira vocabulary onto a fixed schema, and [`dashboard::DashboardAggregator`]
//! folds every board into one [`dashboard::DashboardSnapshot`], memoized in a
//! caller-owned [`cache::TtlCache`].

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod jira;
pub mod normalize;
