//! The instrument model: where notes sit on the neck and which of them belong
//! to the active scale. Pure functions over fixed tables, no audio state.

/// Allowed-degree snapping for scale mode.
pub mod scale;
/// Open strings and the fret → frequency mapping.
pub mod tuning;

pub use scale::{ScaleMode, ScaleQuantizer};
pub use tuning::{FretPosition, StringTuning, STRING_COUNT};
