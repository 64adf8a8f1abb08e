//! Running per-actor counters and time-of-day bucketing.

use super::{ActorFeatureVector, RATIO_EPSILON};
use crate::events::{parse_timestamp, Event};
use chrono::Timelike;

/// Hour-of-day bucket: 0 = [0,6), 1 = [6,12), 2 = [12,18), 3 = [18,24).
pub fn time_bin(hour: u32) -> u8 {
    match hour {
        0..=5 => 0,
        6..=11 => 1,
        12..=17 => 2,
        _ => 3,
    }
}

/// Bucket of a raw timestamp; unparseable timestamps count as hour 0.
pub fn time_bin_of(raw: &str) -> u8 {
    let hour = parse_timestamp(raw).map(|ts| ts.hour()).unwrap_or(0);
    time_bin(hour)
}

#[derive(Debug, Clone, Default)]
pub struct ActorStats {
    pub total_events: u64,
    pub fail_count: u64,
    pub success_count: u64,
    pub admin_access_count: u64,
    time_bin_sum: u64,
}

impl ActorStats {
    pub fn push(&mut self, event: &Event) {
        self.total_events += 1;
        if event.is_failed() {
            self.fail_count += 1;
        } else if event.is_success() {
            self.success_count += 1;
        }
        if event.is_admin_access() {
            self.admin_access_count += 1;
        }
        self.time_bin_sum += u64::from(time_bin_of(&event.timestamp));
    }

    pub fn into_vector(self, actor_id: String) -> ActorFeatureVector {
        let avg_time_bin = if self.total_events == 0 {
            0.0
        } else {
            self.time_bin_sum as f64 / self.total_events as f64
        };
        let fail_ratio = self.fail_count as f64 / (self.total_events as f64 + RATIO_EPSILON);
        ActorFeatureVector {
            actor_id,
            total_events: self.total_events,
            fail_count: self.fail_count,
            success_count: self.success_count,
            admin_access_count: self.admin_access_count,
            avg_time_bin: finite_or_zero(avg_time_bin),
            fail_ratio: finite_or_zero(fail_ratio),
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
