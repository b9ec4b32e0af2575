//! `mc-platform`: HTTP client for a Salesforce org running the MobileCaddy
//! package.
//!
//! # Architecture
//!
//! ```text
//! Credentials ──► soap::login ──► SessionInfo { instance_url, access_token }
//!                                      │
//!                                      ▼
//!                                HttpSession  (impl mc_core::remote::RemoteSession)
//!                                      │
//!        ┌─────────────────────────────┼──────────────────────────────┐
//!        ▼                             ▼                              ▼
//!  apexrest RPC                 tooling query                 tooling sobjects
//!  PlatformDevUtilsR001         StaticResource by Name        StaticResource POST/PATCH
//! ```
//!
//! Everything is blocking; one session serves one command invocation.

pub mod error;
pub mod session;
pub mod soap;

pub use error::PlatformError;
pub use session::HttpSession;
