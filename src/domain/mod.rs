//! Domain layer containing business entities and logic.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`errors`] - Resolution and enqueue outcomes
//! - [`click_event`] - Click tracking event model
//! - [`click_forwarder`] - Moves click events from the request path into the event buffer
//! - [`click_worker`] - Periodic flush of buffered clicks into durable storage
//!
//! # Click Processing Flow
//!
//! 1. Redirect handler resolves the link and builds a [`click_event::ClickEvent`]
//! 2. The event is handed to a bounded channel (non-blocking, dropped when full)
//! 3. [`click_forwarder::run_click_forwarder`] appends it to the event buffer
//! 4. [`click_worker::ClickWorker`] drains the buffer in batches, enriches each
//!    event and persists it via [`repositories::ClickRepository`]

pub mod click_event;
pub mod click_forwarder;
pub mod click_worker;
pub mod entities;
pub mod errors;
pub mod repositories;
