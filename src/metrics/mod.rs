//! Metrics calculation modules for detection scoring.

pub mod iou;
pub mod score;

pub use iou::{align_coordinates, calculate_iou, calculate_iou_matrix, IouMatrix};
pub use score::{
    aggregate_scores, calculate_map, score_dataset, score_image, MatchCounts, ScoreAccumulator,
    ScoreReport,
};
