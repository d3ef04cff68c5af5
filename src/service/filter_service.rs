use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::models::event::{DateInfo, Event, NotificationDate, RemindDate};
use crate::service::time_service::{DateValue, Zone};

/// Which date selector made an event eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Tomorrow,
    RemindDate,
    TargetDate,
}

pub trait ScheduleFilter: Send + Sync {
    /// First selector that fires for `event`, checked in the order
    /// tomorrow, remind date, target date.
    fn trigger(&self, event: &Event) -> Option<Trigger>;

    fn should_notify_now(&self, event: &Event) -> bool {
        self.trigger(event).is_some()
    }
}

/// Eligibility rules evaluated against a fixed instant. Day boundaries come
/// from the wall-clock date of `now` in `zone`, never from a rolling window.
#[derive(Debug, Clone, Copy)]
pub struct DateFilter {
    now: DateTime<Utc>,
    zone: Zone,
}

impl DateFilter {
    pub fn new(now: DateTime<Utc>, zone: Zone) -> Self {
        Self { now, zone }
    }

    fn today(&self) -> NaiveDate {
        self.zone.day_of(&self.now)
    }

    /// True when `date.start` lands on tomorrow's calendar day.
    pub fn is_schedule_for_tomorrow(&self, date: &DateInfo) -> bool {
        let Some(start) = DateValue::parse(&date.start) else {
            return false;
        };
        match self.today().checked_add_days(Days::new(1)) {
            Some(tomorrow) => start.local_day(self.zone) == tomorrow,
            None => false,
        }
    }

    /// True once `now` has reached the reminder instant (inclusive).
    pub fn should_notify_by_remind_date(&self, remind: &RemindDate) -> bool {
        DateValue::parse(&remind.notify_start_time)
            .and_then(|value| value.earliest_instant(self.zone))
            .is_some_and(|instant| self.now >= instant)
    }

    /// An event is over once its end (or its start, when no end is set) lies
    /// before `now`. Bare days last until the end of that local day.
    pub fn is_past_event(&self, date: &DateInfo) -> bool {
        let last = if DateValue::parse(&date.end).is_some() {
            &date.end
        } else {
            &date.start
        };
        match DateValue::parse(last) {
            Some(DateValue::Day(day)) => day < self.today(),
            Some(DateValue::Instant(instant)) => instant < self.now,
            None => false,
        }
    }

    /// True while `now` falls on the target calendar day.
    pub fn should_notify_on_target_date(&self, notification: &NotificationDate) -> bool {
        DateValue::parse(&notification.target_date)
            .is_some_and(|value| value.local_day(self.zone) == self.today())
    }
}

impl ScheduleFilter for DateFilter {
    fn trigger(&self, event: &Event) -> Option<Trigger> {
        if self.is_schedule_for_tomorrow(&event.date) {
            return Some(Trigger::Tomorrow);
        }
        // Reminders stop once the event is over.
        if event.remind_date.is_set()
            && !self.is_past_event(&event.date)
            && self.should_notify_by_remind_date(&event.remind_date)
        {
            return Some(Trigger::RemindDate);
        }
        if event.notification_date.is_set()
            && self.should_notify_on_target_date(&event.notification_date)
        {
            return Some(Trigger::TargetDate);
        }
        None
    }
}
