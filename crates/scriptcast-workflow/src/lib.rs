//! Client-side orchestration for scriptcast.
//!
//! - [`UploadCoordinator`] validates and uploads files, deduplicating in-flight uploads.
//! - [`GenerationWorkflow`] drives batched generation runs with cancellation and retry.
//! - [`ActivityReporter`] keeps the bounded activity log both of them write to.
//!
//! All three talk to the backend only through [`scriptcast_core::BackendGateway`].

pub mod batching;
pub mod generation;
pub mod reporter;
pub mod upload;

pub use batching::plan_batches;
pub use generation::{CancelHandle, GenerationWorkflow, RunReport, WorkflowState};
pub use reporter::{ActivityReporter, EventHandler, SubscriptionId};
pub use upload::{TrackedFile, UploadCoordinator};
