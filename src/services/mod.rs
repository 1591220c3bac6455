pub mod room;
pub mod snapshot;
pub mod strokes;
