//! Writing-session flow statistics.
//!
//! A session is tracked as a list of timed segments, each carrying the words
//! added while it was open. Closing a session reduces the segments to a
//! small set of descriptive statistics.

use serde::{Deserialize, Serialize};

use crate::models::SessionSegment;

/// Descriptive statistics for a finished writing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FlowStats {
    /// Total words added across all segments.
    pub total_words: i64,
    /// Sum of segment durations in minutes (fractional).
    pub active_minutes: f64,
    /// Words per minute over the active time; 0 when no active time.
    pub mean_wpm: f64,
    /// Highest per-segment words-per-minute.
    pub peak_wpm: f64,
    /// 1 − (stddev of per-segment wpm / mean wpm), clamped to [0, 1].
    /// A single segment scores 1.0; an idle session scores 0.
    pub consistency: f64,
    /// mean_wpm × consistency — the headline number shown to the writer.
    pub flow_score: f64,
}

impl FlowStats {
    fn zero() -> Self {
        Self {
            total_words: 0,
            active_minutes: 0.0,
            mean_wpm: 0.0,
            peak_wpm: 0.0,
            consistency: 0.0,
            flow_score: 0.0,
        }
    }
}

/// Reduce a session's segments to its flow statistics.
///
/// Zero-duration segments contribute their words to the total but 0 to the
/// per-segment wpm series. Empty input yields all-zero stats.
pub fn compute_segment_flow(segments: &[SessionSegment]) -> FlowStats {
    if segments.is_empty() {
        return FlowStats::zero();
    }

    let total_words: i64 = segments.iter().map(|s| s.words_added).sum();
    let active_minutes: f64 = segments
        .iter()
        .map(|s| (s.ended_at - s.started_at).num_milliseconds().max(0) as f64 / 60_000.0)
        .sum();

    let per_segment_wpm: Vec<f64> = segments
        .iter()
        .map(|s| {
            let minutes = (s.ended_at - s.started_at).num_milliseconds().max(0) as f64 / 60_000.0;
            if minutes > 0.0 {
                s.words_added as f64 / minutes
            } else {
                0.0
            }
        })
        .collect();

    let mean_wpm = if active_minutes > 0.0 {
        total_words as f64 / active_minutes
    } else {
        0.0
    };

    let peak_wpm = per_segment_wpm.iter().cloned().fold(0.0, f64::max);

    let consistency = if mean_wpm > 0.0 {
        let series_mean = per_segment_wpm.iter().sum::<f64>() / per_segment_wpm.len() as f64;
        let variance = per_segment_wpm
            .iter()
            .map(|wpm| (wpm - series_mean).powi(2))
            .sum::<f64>()
            / per_segment_wpm.len() as f64;
        let stddev = variance.sqrt();
        if series_mean > 0.0 {
            (1.0 - (stddev / series_mean)).clamp(0.0, 1.0)
        } else {
            0.0
        }
    } else {
        0.0
    };

    FlowStats {
        total_words,
        active_minutes,
        mean_wpm,
        peak_wpm,
        consistency,
        flow_score: mean_wpm * consistency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn segment(start_min: i64, duration_min: i64, words: i64) -> SessionSegment {
        let base = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let started_at = base + Duration::minutes(start_min);
        SessionSegment {
            started_at,
            ended_at: started_at + Duration::minutes(duration_min),
            words_added: words,
        }
    }

    #[test]
    fn empty_session_is_all_zero() {
        let stats = compute_segment_flow(&[]);
        assert_eq!(stats.total_words, 0);
        assert_eq!(stats.mean_wpm, 0.0);
        assert_eq!(stats.flow_score, 0.0);
    }

    #[test]
    fn single_segment_has_full_consistency() {
        let stats = compute_segment_flow(&[segment(0, 10, 200)]);
        assert_eq!(stats.total_words, 200);
        assert!((stats.active_minutes - 10.0).abs() < 1e-9);
        assert!((stats.mean_wpm - 20.0).abs() < 1e-9);
        assert!((stats.peak_wpm - 20.0).abs() < 1e-9);
        assert!((stats.consistency - 1.0).abs() < 1e-9);
        assert!((stats.flow_score - 20.0).abs() < 1e-9);
    }

    #[test]
    fn steady_segments_keep_consistency_high() {
        let stats = compute_segment_flow(&[
            segment(0, 10, 200),
            segment(10, 10, 200),
            segment(20, 10, 200),
        ]);
        assert_eq!(stats.total_words, 600);
        assert!((stats.mean_wpm - 20.0).abs() < 1e-9);
        assert!((stats.consistency - 1.0).abs() < 1e-9);
    }

    #[test]
    fn erratic_segments_lower_consistency() {
        let steady = compute_segment_flow(&[segment(0, 10, 200), segment(10, 10, 200)]);
        let erratic = compute_segment_flow(&[segment(0, 10, 390), segment(10, 10, 10)]);
        assert_eq!(steady.total_words, erratic.total_words);
        assert!(erratic.consistency < steady.consistency);
        assert!(erratic.flow_score < steady.flow_score);
    }

    #[test]
    fn zero_duration_segment_counts_words_not_wpm() {
        let stats = compute_segment_flow(&[segment(0, 10, 100), segment(10, 0, 50)]);
        assert_eq!(stats.total_words, 150);
        // Active time comes only from the timed segment
        assert!((stats.active_minutes - 10.0).abs() < 1e-9);
        assert!((stats.peak_wpm - 10.0).abs() < 1e-9);
    }

    #[test]
    fn all_zero_duration_session_scores_zero() {
        let stats = compute_segment_flow(&[segment(0, 0, 100)]);
        assert_eq!(stats.total_words, 100);
        assert_eq!(stats.mean_wpm, 0.0);
        assert_eq!(stats.flow_score, 0.0);
    }

    #[test]
    fn peak_picks_the_fastest_segment() {
        let stats = compute_segment_flow(&[segment(0, 10, 100), segment(10, 5, 150)]);
        assert!((stats.peak_wpm - 30.0).abs() < 1e-9);
    }
}
