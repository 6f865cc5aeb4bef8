pub mod destination_entry;
pub mod grouping;
pub mod lookback;
pub mod source_entry;
pub mod worklog;
