//! `nodes` crate: the host's node contract.
//!
//! Every integration implements [`ExecutableNode`] (actions), optionally
//! [`LoadOptions`] (dynamic dropdowns), or [`TriggerNode`] (webhook triggers).
//! The host dispatches through these trait objects and hands nodes their
//! parameters, credentials, and node-scoped [`StaticData`].

pub mod error;
pub mod mock;
pub mod parameters;
pub mod static_data;
pub mod traits;

pub use error::NodeError;
pub use parameters::{ParameterSource, Parameters, PerItemParameters};
pub use static_data::{JsonFileStaticData, MemoryStaticData, StaticData};
pub use traits::{
    ExecutableNode, ExecutionContext, HookContext, LoadOptions, NodePropertyOption, TriggerNode,
    WebhookRequest,
};
