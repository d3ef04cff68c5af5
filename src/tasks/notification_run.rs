use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::clients::notion_client::{CalendarSource, FetchError};
use crate::clients::webhook_client::NotificationSink;
use crate::models::event::Event;
use crate::models::project::{ProjectConfig, ProjectsConfig};
use crate::models::webhook::WebhookPayload;
use crate::service::embed_service::{EmbedService, ScheduleNotice};
use crate::service::filter_service::ScheduleFilter;
use crate::service::parser_service::{PageParser, ParseError};
use crate::service::time_service::TimeParser;

/// Failures that abort a single project.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProjectReport {
    pub parsed: usize,
    pub eligible: usize,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct ProjectOutcome {
    pub project: String,
    pub result: Result<ProjectReport, ProjectError>,
}

/// One pass over every configured project: fetch, parse, filter, format and
/// send. Nothing is remembered between runs, so running twice inside an
/// eligible window sends twice.
pub struct NotificationRun<'a> {
    pub source: &'a dyn CalendarSource,
    pub parser: &'a dyn PageParser,
    pub filter: &'a dyn ScheduleFilter,
    pub sink: &'a dyn NotificationSink,
    pub time_parser: TimeParser,
    pub dry_run: bool,
}

impl NotificationRun<'_> {
    pub async fn run_all(&self, projects: &ProjectsConfig) -> Vec<ProjectOutcome> {
        let mut outcomes = Vec::with_capacity(projects.len());
        for (name, project) in projects.iter() {
            let span = info_span!("project", project = %name);
            let result = self.run_project(project).instrument(span).await;
            match &result {
                Ok(report) => info!(
                    project = %name,
                    parsed = report.parsed,
                    eligible = report.eligible,
                    sent = report.sent,
                    failed = report.failed,
                    "project finished"
                ),
                Err(err) => error!(project = %name, error = %err, "project skipped"),
            }
            outcomes.push(ProjectOutcome {
                project: name.clone(),
                result,
            });
        }
        outcomes
    }

    pub async fn run_project(&self, project: &ProjectConfig) -> Result<ProjectReport, ProjectError> {
        let results = self
            .source
            .query_database(&project.notion_api_token, &project.notion_database_id)
            .await?;
        let events = self.parser.parse(&results, &project.properties)?;

        let mut report = ProjectReport {
            parsed: events.len(),
            ..ProjectReport::default()
        };

        for event in &events {
            let Some(notice) = self.prepare(event) else {
                continue;
            };
            report.eligible += 1;

            let payload = EmbedService::build_schedule_embed(&notice);
            if self.dry_run {
                log_dry_run(&event.title, &payload);
                report.sent += 1;
                continue;
            }

            match self.sink.send(&project.discord_webhook, &payload).await {
                Ok(()) => {
                    info!(title = %event.title, "notification sent");
                    report.sent += 1;
                }
                Err(err) => {
                    error!(title = %event.title, error = %err, "failed to send notification");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Applies the filter and resolves display times. `None` means the event
    /// is not sent this run.
    fn prepare(&self, event: &Event) -> Option<ScheduleNotice> {
        let Some(trigger) = self.filter.trigger(event) else {
            debug!(title = %event.title, "not eligible now");
            return None;
        };

        let start = match self.time_parser.format_timestamp(&event.date.start) {
            Ok(start) => start,
            Err(err) => {
                warn!(title = %event.title, field = "start", error = %err, "skipping event");
                return None;
            }
        };
        let end = self
            .time_parser
            .format_timestamp(&event.date.end)
            .unwrap_or_else(|err| {
                warn!(title = %event.title, field = "end", error = %err, "treating end as empty");
                String::new()
            });

        Some(ScheduleNotice {
            title: event.title.clone(),
            role: event.role.clone(),
            location: event.location.clone(),
            start,
            end,
            trigger,
        })
    }
}

fn log_dry_run(title: &str, payload: &WebhookPayload) {
    match serde_json::to_string(payload) {
        Ok(json) => info!(%title, payload = %json, "dry run, not sending"),
        Err(err) => warn!(%title, error = %err, "dry run, payload not serializable"),
    }
}
