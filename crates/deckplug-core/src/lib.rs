//! # deckplug-core
//!
//! Foundation types shared by every deckplug crate:
//!
//! - **Correlation context**: [`EventContext`] carries action, instance-context
//!   and device ids alongside cancellation and an optional deadline
//! - **Event envelope**: [`Event`] wire shape, encode/decode, typed payload decoding
//! - **Payload shapes**: serde structs for the payloads the host exchanges
//! - **Errors**: envelope and payload decode errors, contract violations
//! - **Logging**: `tracing` subscriber setup and capture utilities for tests

#![deny(unsafe_code)]

pub mod context;
pub mod errors;
pub mod event;
pub mod logging;
pub mod payloads;

pub use context::{ContextField, EventContext};
pub use errors::{ContractViolation, EnvelopeDecodeError, EnvelopeEncodeError, PayloadDecodeError};
pub use event::{DeviceInfo, DeviceSize, DeviceType, Event, Payload, TypedEvent, names};
