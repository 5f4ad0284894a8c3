// Screening - cross-participant stages
//
// Aligner (shared item order barrier) → Quality Filter (MPD outliers).

pub mod aligner;
pub mod quality_filter;

pub use aligner::align;
pub use quality_filter::{
    filter_by_mpd, flag_outliers, mean_pairwise_distance, population_mean_std, FilterOutcome,
    FilterPass,
};
