#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Engine Action
//!
//! Integration action registry and dispatch manager (spec §4.7).
//!
//! Each integration registers its handlers by `(integration_type,
//! action_type)` in one of four flavors -- [`ActionHandler::PerItem`],
//! [`ActionHandler::PerItemMulti`], [`ActionHandler::Routable`],
//! [`ActionHandler::WholeBatch`] -- and [`invoke`] dispatches a resolved
//! handler against a batch of items per its flavor's rule.

mod handler;
mod registry;

pub use handler::{
    ActionContext, PerItemAction, PerItemMultiAction, RoutablePerItemAction, WholeBatchAction,
};
pub use registry::{ActionHandler, ActionRegistry, invoke};
