//! # research-agents
//!
//! Two tool-using agents that sit next to the Reddit assistant:
//!
//! - **jobs**: search the web for openings and pull `{title, link}` pairs out
//!   of the model's reply
//! - **diligence**: research a company, compile an HTML report and mail it
//!
//! ```text
//! ┌────────────┐    ┌──────────────────┐    ┌────────────────┐
//! │ JobSearch  │───►│ agent + toolkit  │───►│ extract_jobs   │
//! └────────────┘    └──────────────────┘    └────────────────┘
//! ┌────────────┐    ┌──────────────────┐    ┌────────────────┐
//! │DueDiligence│───►│ gather ► compile │───►│ ReportMailer   │
//! └────────────┘    │  (► finalize)    │    │  send_email    │
//!                   └──────────────────┘    └────────────────┘
//! ```
//!
//! Web search, LinkedIn and X lookups come from the remote toolkit; nothing
//! here talks to those services directly.

pub mod diligence;
pub mod error;
pub mod jobs;

pub use diligence::{DueDiligence, ReportMailer, ResearchReport};
pub use error::{ResearchError, Result};
pub use jobs::{JobOpening, JobSearch, JobSearchResult, extract_jobs};
