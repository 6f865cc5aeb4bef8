use std::collections::{BTreeMap, HashMap};

use crate::model::destination_entry::DestinationEntry;
use crate::model::source_entry::SourceEntry;

pub fn filter_valid(entries: &[SourceEntry]) -> Vec<&SourceEntry> {
    entries.iter().filter(|e| e.is_valid()).collect()
}

/// Groups source entries by task id, keeping their relative order inside each group.
/// Entries without a task id are dropped.
pub fn group_by_task_id<'a, I>(entries: I) -> BTreeMap<String, Vec<&'a SourceEntry>>
where
    I: IntoIterator<Item = &'a SourceEntry>,
{
    let mut groups: BTreeMap<String, Vec<&SourceEntry>> = BTreeMap::new();
    for entry in entries {
        if let Some(task_id) = entry.task_id() {
            groups.entry(task_id.to_string()).or_default().push(entry);
        }
    }
    groups
}

/// Groups destination entries by the source id embedded in their comment.
/// More than one entry under a key means the destination holds duplicates.
pub fn group_by_correlation_id<'a, I>(entries: I) -> HashMap<u64, Vec<&'a DestinationEntry>>
where
    I: IntoIterator<Item = &'a DestinationEntry>,
{
    let mut groups: HashMap<u64, Vec<&DestinationEntry>> = HashMap::new();
    for entry in entries {
        if let Some(id) = entry.correlation_id() {
            groups.entry(id).or_default().push(entry);
        }
    }
    groups
}

pub fn group_by_issue(entries: &[DestinationEntry]) -> BTreeMap<&str, Vec<&DestinationEntry>> {
    let mut groups: BTreeMap<&str, Vec<&DestinationEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.issue.as_str()).or_default().push(entry);
    }
    groups
}
