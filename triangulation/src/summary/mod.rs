//! Summary and result types shared by every arbitration stage

pub mod types;

pub use types::{
    ConfidenceLevel, ContributingResponse, ModelId, Resolution, Summary, TriangulatedResult,
};
