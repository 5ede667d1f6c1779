use thiserror::Error;

use crate::render::Phase;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum LayoutError {
    #[error("{subject} must have a positive width and height, got {width}x{height}")]
    InvalidDimension { subject: String, width: i32, height: i32 },

    #[error("cannot place {room_count} rooms from an empty catalog")]
    EmptyCatalog { room_count: i64 },

    #[error("room count must not be negative, got {0}")]
    InvalidRoomCount(i64),

    #[error("invalid layout settings: {0}")]
    InvalidSettings(String),

    #[error("{phase} phase did not converge within {iterations} iterations")]
    ConvergenceTimeout { phase: Phase, iterations: u64 },
}
