use serde::{Deserialize, Serialize};

/// One calendar entry pulled out of a Notion page.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Event {
    pub title: String,
    pub role: String,
    pub location: String,
    pub date: DateInfo,
    pub remind_date: RemindDate,
    pub notification_date: NotificationDate,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct DateInfo {
    pub start: String,
    // Empty when the event is open-ended.
    pub end: String,
}

/// Earliest instant the event may be announced. Empty when the page has no
/// reminder set.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct RemindDate {
    pub notify_start_time: String,
}

/// Calendar day on which the event must be announced, independent of its start.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct NotificationDate {
    pub target_date: String,
}

impl RemindDate {
    pub fn is_set(&self) -> bool {
        !self.notify_start_time.trim().is_empty()
    }
}

impl NotificationDate {
    pub fn is_set(&self) -> bool {
        !self.target_date.trim().is_empty()
    }
}
