//! Client layer: configuration, the `WebAv` client and the status poller.
//!
//! - [`config`] - `WebAvConfig` and credential placement
//! - [`webav`] - submission, status and listing operations
//! - [`poller`] - bounded-wait polling with an injectable clock

pub mod config;
pub mod poller;
pub mod webav;

pub use config::{CredentialPlacement, WebAvConfig, DEFAULT_BASE_URL};
pub use poller::{Clock, PollConfig, Poller, TokioClock};
pub use webav::WebAv;
