//! Participant-side state for the realtime drawing protocol.
//!
//! ARCHITECTURE
//! ============
//! The [`reconciler::Reconciler`] owns the local mirror of a room's operation
//! sequence and the rendered surface behind it. Strokes are applied
//! optimistically the moment the pointer moves, then reconciled against the
//! server's confirming broadcast via the `clientId` correlation key.
//!
//! Rendering and transport stay outside this crate: callers implement
//! [`surface::CanvasSurface`] for their raster backend and ship the messages
//! returned by `apply_local` over whatever channel they hold.

pub mod reconciler;
pub mod surface;
pub mod throttle;
