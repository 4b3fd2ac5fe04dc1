//! User behavior segmentation and heuristic churn scoring.

pub mod behavior;
pub mod churn;

pub use behavior::{segment_users, SegmentName, SegmentationResult, UserSegment};
pub use churn::{score_user, score_users, ChurnPrediction, ChurnReport, RiskLevel};
