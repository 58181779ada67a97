//! `pikarama` crate: action and trigger nodes for the Pikarama
//! group-decision API.
//!
//! - [`PikaramaNode`] maps `(resource, operation)` selections onto REST calls
//!   and populates the node's dropdowns.
//! - [`PikaramaTrigger`] manages the remote webhook registration and verifies
//!   signed deliveries before they reach the workflow.

pub mod action;
pub mod client;
pub mod credentials;
pub mod error;
pub mod events;
pub mod operation;
pub mod options;
pub mod signature;
pub mod trigger;

pub use action::PikaramaNode;
pub use client::PikaramaClient;
pub use credentials::PikaramaCredentials;
pub use error::PikaramaError;
pub use events::WebhookEventType;
pub use operation::Operation;
pub use options::OptionsMethod;
pub use trigger::PikaramaTrigger;
