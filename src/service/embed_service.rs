use crate::models::webhook::{Embed, Field, WebhookPayload};
use crate::service::filter_service::Trigger;

pub const EMBED_COLOR: u32 = 2859167;
pub const EMBED_TITLE: &str = "Schedule notification";
pub const UNDECIDED: &str = "TBD";
pub const BLANK: &str = "-";

/// Display-ready fields for one event. Times are already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleNotice {
    pub title: String,
    pub role: String,
    pub location: String,
    pub start: String,
    pub end: String,
    pub trigger: Trigger,
}

pub struct EmbedService;

impl EmbedService {
    pub fn build_schedule_embed(notice: &ScheduleNotice) -> WebhookPayload {
        let end = or_placeholder(&notice.end, UNDECIDED);
        let content = if notice.role.trim().is_empty() {
            String::new()
        } else {
            format!("@{}", notice.role)
        };

        let embed = Embed {
            title: EMBED_TITLE.to_string(),
            description: description_for(notice.trigger).to_string(),
            color: EMBED_COLOR,
            fields: vec![
                Field::new("Title", or_placeholder(&notice.title, BLANK)),
                Field::new("Audience", or_placeholder(&notice.role, BLANK)),
                Field::new(
                    "Start → End",
                    format!("{} -> {}", or_placeholder(&notice.start, UNDECIDED), end),
                ),
                Field::new("Location", or_placeholder(&notice.location, BLANK)),
            ],
        };

        WebhookPayload {
            content,
            embeds: vec![embed],
        }
    }
}

fn description_for(trigger: Trigger) -> &'static str {
    match trigger {
        Trigger::Tomorrow => "Here is tomorrow's schedule.",
        Trigger::RemindDate => "Reminder for an upcoming schedule.",
        Trigger::TargetDate => "Scheduled announcement for today.",
    }
}

// Discord rejects embed fields with empty values.
fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}
