//! Per-run stage timings (`read`, `sort`, `condense`, `write`).
//!
//! Collected only when `--timing` or `CONDENSE_TIMING` asks for it, and
//! reported on stderr in milliseconds.

use std::time::{Duration, Instant};

use serde_json::json;

/// Wall-clock durations of the pipeline stages of a single run.
///
/// Owned by the caller; nothing is kept in process-wide state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageTimings {
    enabled: bool,
    stages: Vec<StageTiming>,
}

/// One timed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    pub name: String,
    pub elapsed: Duration,
}

/// Returns true when `CONDENSE_TIMING` enables timing collection.
///
/// Supported truthy values: `1`, `true`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("CONDENSE_TIMING")
        .ok()
        .is_some_and(|value| is_truthy(value.as_str()))
}

impl StageTimings {
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stages: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run `f`, recording its duration under `name` when enabled.
    pub fn time<R>(&mut self, name: &str, f: impl FnOnce() -> R) -> R {
        if !self.enabled {
            return f();
        }

        let started = Instant::now();
        let result = f();
        self.record(name, started.elapsed());
        result
    }

    /// Record an externally measured duration. Ignored when disabled.
    pub fn record(&mut self, name: &str, elapsed: Duration) {
        if self.enabled {
            self.stages.push(StageTiming {
                name: name.to_string(),
                elapsed,
            });
        }
    }

    #[must_use]
    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> Duration {
        self.stages.iter().map(|s| s.elapsed).sum()
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let stages = self
            .stages
            .iter()
            .map(|s| json!({ "name": s.name, "elapsed_us": s.elapsed.as_micros() }))
            .collect::<Vec<_>>();

        json!({ "stages": stages, "total_us": self.total().as_micros() })
    }

    /// Render as a small table for stderr.
    #[must_use]
    pub fn display_table(&self) -> String {
        if self.stages.is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let mut out = String::new();
        out.push_str("stage                  elapsed\n");
        out.push_str("------------------------------\n");
        for stage in &self.stages {
            out.push_str(&format!(
                "{:<20} {:>9}\n",
                stage.name,
                format_millis(stage.elapsed)
            ));
        }
        out.push_str(&format!(
            "{:<20} {:>9}\n",
            "total",
            format_millis(self.total())
        ));
        out
    }
}

fn format_millis(duration: Duration) -> String {
    let micros = duration.as_micros();
    format!("{}.{:03}ms", micros / 1_000, micros % 1_000)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_timings_record_nothing() {
        let mut timings = StageTimings::new(false);
        let value = timings.time("sort", || 7_u8);
        timings.record("write", Duration::from_millis(3));

        assert_eq!(value, 7);
        assert!(timings.is_empty());
    }

    #[test]
    fn enabled_timings_keep_stage_order() {
        let mut timings = StageTimings::new(true);
        timings.time("read", || ());
        timings.record("sort", Duration::from_micros(1_500));

        let names: Vec<&str> = timings.stages().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["read", "sort"]);
        assert!(timings.total() >= Duration::from_micros(1_500));
    }

    #[test]
    fn table_and_json_render_stages() {
        let mut timings = StageTimings::new(true);
        timings.record("condense", Duration::from_micros(2_250));

        let table = timings.display_table();
        assert!(table.contains("condense"));
        assert!(table.contains("2.250ms"));

        let json = timings.to_json();
        assert_eq!(json["stages"][0]["name"], "condense");
        assert_eq!(json["total_us"], 2_250);
    }

    #[test]
    fn stage_durations_render_as_milliseconds() {
        assert_eq!(format_millis(Duration::from_micros(12)), "0.012ms");
        assert_eq!(format_millis(Duration::from_micros(1_234_567)), "1234.567ms");
        assert_eq!(format_millis(Duration::ZERO), "0.000ms");
    }

    #[test]
    fn timing_env_accepts_common_switch_values() {
        for on in ["1", "true", "Yes", " ON "] {
            assert!(is_truthy(on), "{on:?}");
        }
        for off in ["", "0", "off", "false", "enabled"] {
            assert!(!is_truthy(off), "{off:?}");
        }
    }
}
