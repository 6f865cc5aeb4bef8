use std::collections::HashMap;

use chrono::{Local, NaiveDate};

use crate::model::grouping::filter_valid;
use crate::model::source_entry::SourceEntry;
use crate::sync::reconciler::RunSummary;
use crate::util::duration::{format_seconds, seconds_to_hours};

const TOP_TASKS: usize = 3;

pub fn header(label: &str) -> Vec<String> {
    vec![
        format!("TrackSync v{} for {label}", env!("CARGO_PKG_VERSION")),
        "---".to_string(),
        String::new(),
    ]
}

pub fn lookback(days: u32) -> String {
    format!("Sync: {days} day{}", if days == 1 { "" } else { "s" })
}

/// Totals, today's tracked time and the tasks that took the most time.
pub fn entries(all: &[SourceEntry], today: NaiveDate) -> Vec<String> {
    let valid = filter_valid(all);
    let mut lines = vec![format!(
        "Found entries in source: **{}** (filtered: **{}**)",
        all.len(),
        valid.len()
    )];

    let todays: Vec<&SourceEntry> = all
        .iter()
        .filter(|e| e.duration_seconds > 0 && e.start_utc.with_timezone(&Local).date_naive() == today)
        .collect();
    let total: i64 = todays.iter().map(|e| e.duration_seconds).sum();
    if todays.is_empty() || total == 0 {
        lines.push("Nothing tracked today.".to_string());
    } else {
        let with_task = todays.iter().filter(|e| e.task_id().is_some()).count();
        lines.push(format!(
            "Tracked today: {} in {} entries ({}% with task id).",
            format_seconds(total),
            todays.len(),
            with_task * 100 / todays.len()
        ));
    }
    lines.push(String::new());

    if !valid.is_empty() {
        let mut per_task: HashMap<&str, i64> = HashMap::new();
        for entry in &valid {
            if let Some(task_id) = entry.task_id() {
                *per_task.entry(task_id).or_default() += entry.duration_seconds;
            }
        }
        let mut longest: Vec<(&str, i64)> = per_task.into_iter().collect();
        longest.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

        lines.push("---".to_string());
        lines.push("**Task summary**".to_string());
        lines.push("You spent most time on:".to_string());
        for (task_id, seconds) in longest.into_iter().take(TOP_TASKS) {
            lines.push(format!("- {task_id}: {} h", seconds_to_hours(seconds)));
        }
        lines.push(String::new());
    }

    lines
}

pub fn counters(summary: &RunSummary) -> String {
    let mut line = format!(
        "**{}** inserted, **{}** updated, **{}** skipped",
        summary.inserted, summary.updated, summary.skipped
    );
    if !summary.failures.is_empty() {
        line.push_str(&format!(", **{}** failed", summary.failures.len()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::reconciler::GroupFailure;
    use crate::util::task_id::TaskPatterns;
    use chrono::{TimeZone, Utc};

    fn entry(id: u64, duration: i64, day: u32, description: &str) -> SourceEntry {
        let patterns = TaskPatterns::new(&["SLUG-[0-9]+"]).unwrap();
        let start = Local.with_ymd_and_hms(2016, 1, day, 12, 0, 0).unwrap();
        SourceEntry::new(id, duration, start, description, &patterns)
    }

    #[test]
    fn lookback_pluralizes() {
        assert_eq!(lookback(1), "Sync: 1 day");
        assert_eq!(lookback(0), "Sync: 0 days");
        assert_eq!(lookback(7), "Sync: 7 days");
    }

    #[test]
    fn summarizes_entries() {
        let all = vec![
            entry(1, 3600, 2, "SLUG-1"),
            entry(2, 1800, 2, "SLUG-2"),
            entry(3, 5400, 1, "SLUG-2"),
            entry(4, 600, 2, "meeting"),
            entry(5, 1800, 1, "SLUG-3"),
            entry(6, 900, 1, "SLUG-4"),
            entry(7, -100, 2, "SLUG-5"),
        ];
        let today = NaiveDate::from_ymd_opt(2016, 1, 2).unwrap();

        let lines = entries(&all, today);

        assert_eq!(lines[0], "Found entries in source: **7** (filtered: **5**)");
        assert_eq!(lines[1], "Tracked today: 1.67 h in 3 entries (66% with task id).");
        assert_eq!(
            lines[5..9],
            ["You spent most time on:", "- SLUG-2: 2 h", "- SLUG-1: 1 h", "- SLUG-3: 0.5 h"]
        );
    }

    #[test]
    fn nothing_tracked_today() {
        let all = vec![entry(1, 3600, 1, "untracked")];
        let today = Utc.with_ymd_and_hms(2016, 1, 5, 0, 0, 0).unwrap().date_naive();
        let lines = entries(&all, today);
        assert_eq!(lines, vec![
            "Found entries in source: **1** (filtered: **0**)".to_string(),
            "Nothing tracked today.".to_string(),
            String::new(),
        ]);
    }

    #[test]
    fn counters_line() {
        let mut summary = RunSummary {
            inserted: 1,
            updated: 2,
            skipped: 3,
            failures: Vec::new(),
        };
        assert_eq!(counters(&summary), "**1** inserted, **2** updated, **3** skipped");

        summary.failures.push(GroupFailure {
            task_id: "SLUG-1".into(),
            cause: "boom".into(),
        });
        assert_eq!(counters(&summary), "**1** inserted, **2** updated, **3** skipped, **1** failed");
    }
}
