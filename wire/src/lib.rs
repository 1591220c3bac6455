//! Shared wire model for the realtime drawing protocol.
//!
//! This crate owns the message types used by both the server and the
//! participant-side reconciler. Messages are JSON text frames tagged by a
//! `type` field; field names are part of the external protocol and must not
//! change (`opId`, `clientId`, `prevPoint`, ...).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned by [`decode_client`] and [`decode_server`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text frame is not valid JSON for any known message shape.
    #[error("failed to decode wire message: {0}")]
    Decode(#[from] serde_json::Error),
}

// =============================================================================
// GEOMETRY & OPERATIONS
// =============================================================================

/// A canvas coordinate pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Drawing tool for a stroke segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Brush,
    Eraser,
}

/// One recorded stroke segment with durable identity and visibility flag.
///
/// `op_id` is assigned by the server's operation log at append time and is
/// strictly increasing within a room. `active` toggles with undo/redo/clear;
/// the operation itself is never removed from the log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub room: String,
    pub op_id: u64,
    /// Correlation key minted by the originating participant. Used only for
    /// client-side promotion of speculative entries, never for ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub user_id: Uuid,
    pub prev_point: Point,
    pub point: Point,
    pub color: String,
    pub size: f64,
    pub tool: Tool,
    pub active: bool,
}

/// A stroke segment as submitted by a participant, before the server has
/// assigned durable identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawDraft {
    pub prev_point: Point,
    pub point: Point,
    pub color: String,
    pub size: f64,
    pub tool: Tool,
    pub client_id: String,
}

// =============================================================================
// CLIENT → SERVER
// =============================================================================

/// Messages a participant sends to the coordinating server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Join a room, implicitly leaving the previous one.
    #[serde(rename = "join")]
    Join { room: String },
    /// Submit one stroke segment for appending to the room's operation log.
    #[serde(rename = "draw")]
    Draw(DrawDraft),
    /// Deactivate the sender's most recent active operation.
    #[serde(rename = "undo")]
    Undo,
    /// Reactivate the sender's oldest inactive operation.
    #[serde(rename = "redo")]
    Redo,
    /// Deactivate all of the sender's active operations.
    #[serde(rename = "clear")]
    Clear,
    /// Ephemeral cursor position, rebroadcast to room peers.
    #[serde(rename = "cursor")]
    Cursor { x: f64, y: f64, color: String },
    /// Store an opaque raster snapshot for the room.
    #[serde(rename = "saveSnapshot")]
    SaveSnapshot { snapshot: String },
    /// Ask for the room's most recently stored snapshot.
    #[serde(rename = "requestLatest")]
    RequestLatest,
}

// =============================================================================
// SERVER → CLIENT
// =============================================================================

/// Messages the server fans out to room participants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Full operation history for a room, active and inactive, in append
    /// order. Sent to a joining participant only.
    #[serde(rename = "canvas-history")]
    CanvasHistory { ops: Vec<Operation> },
    /// A confirmed operation with `opId` and `userId` populated.
    #[serde(rename = "draw")]
    Draw(Operation),
    /// One operation flipped inactive by its owner's undo.
    #[serde(rename = "undo-op")]
    UndoOp {
        #[serde(rename = "opId")]
        op_id: u64,
    },
    /// One operation flipped active by its owner's redo.
    #[serde(rename = "redo-op")]
    RedoOp {
        #[serde(rename = "opId")]
        op_id: u64,
    },
    /// The set of operations flipped inactive by one participant's clear.
    #[serde(rename = "clear-user-strokes")]
    ClearUserStrokes { ops: Vec<u64> },
    /// A peer's cursor position, tagged with its connection identity.
    #[serde(rename = "cursor")]
    Cursor { id: Uuid, x: f64, y: f64, color: String },
    /// The most recently stored snapshot, in reply to `requestLatest`.
    #[serde(rename = "snapshot")]
    Snapshot { snapshot: String },
    /// A pushed snapshot replacing the rendered surface.
    #[serde(rename = "setSnapshot")]
    SetSnapshot { snapshot: String },
    /// A participant disconnected; drop its cursor.
    #[serde(rename = "remove-cursor")]
    RemoveCursor { id: Uuid },
}

// =============================================================================
// CODEC
// =============================================================================

/// Encode a client message as a JSON text frame.
#[must_use]
pub fn encode_client(msg: &ClientMessage) -> String {
    // Serializing these types into a String is infallible.
    serde_json::to_string(msg).unwrap_or_default()
}

/// Decode a JSON text frame into a client message.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for frames that are not valid JSON or do
/// not match any known message shape (including draw payloads with missing
/// or non-numeric coordinates).
pub fn decode_client(text: &str) -> Result<ClientMessage, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode a server message as a JSON text frame.
#[must_use]
pub fn encode_server(msg: &ServerMessage) -> String {
    serde_json::to_string(msg).unwrap_or_default()
}

/// Decode a JSON text frame into a server message.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed frames.
pub fn decode_server(text: &str) -> Result<ServerMessage, CodecError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
