use std::env;

use anyhow::Context;
use chrono::Utc;
use tracing::{Instrument, info, info_span};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::cli::Cli;
use crate::clients::build_http_client;
use crate::clients::notion_client::NotionClient;
use crate::clients::webhook_client::WebhookSender;
use crate::config::{AppConfig, Settings, load_projects};
use crate::service::filter_service::DateFilter;
use crate::service::parser_service::NotionParser;
use crate::service::time_service::TimeParser;
use crate::tasks::notification_run::{NotificationRun, ProjectOutcome};

const DEFAULT_LOG_FILTER: &str = "scheduleBot=info";

/// `RUST_LOG` wins over the `LOG_LEVEL` setting. Calling this more than once
/// keeps the first subscriber.
pub fn init_tracing(log_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| match log_level {
            Some(level) => EnvFilter::try_new(level),
            None => EnvFilter::try_new(DEFAULT_LOG_FILTER),
        })
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Loads configuration, wires the collaborators and runs every project once.
/// Errors returned here are configuration errors; per-project and per-event
/// failures only show up in the outcomes.
pub async fn run(cli: &Cli) -> anyhow::Result<Vec<ProjectOutcome>> {
    let app_config = match cli.settings.clone().or_else(|| env::var("CONFIG_FILE").ok()) {
        Some(path) => AppConfig::from_file(&path)
            .with_context(|| format!("failed to load settings from {path}"))?,
        None => AppConfig::default(),
    };
    let get_prop = |key: &str| app_config.get_or_env(key);

    let settings = Settings::resolve(get_prop).context("invalid settings")?;
    init_tracing(settings.log_level.as_deref());

    let projects_file = cli.projects.as_deref().unwrap_or(&settings.projects_file);
    let mut projects =
        load_projects(projects_file, get_prop).context("failed to load projects")?;
    projects
        .retain_named(&cli.only)
        .context("invalid --project selection")?;

    let http = build_http_client(settings.http_timeout).context("failed to build HTTP client")?;
    let source = NotionClient::with_endpoint(
        http.clone(),
        &settings.notion_api_base,
        &settings.notion_version,
    );
    let sink = WebhookSender::new(http);
    let parser = NotionParser::new();
    let now = cli.now.unwrap_or_else(Utc::now);
    let filter = DateFilter::new(now, settings.zone);

    let run = NotificationRun {
        source: &source,
        parser: &parser,
        filter: &filter,
        sink: &sink,
        time_parser: TimeParser::new(settings.zone),
        dry_run: cli.dry_run,
    };

    let run_id = Uuid::new_v4();
    let span = info_span!("run", %run_id);
    let outcomes = async {
        info!(projects = projects.len(), %now, dry_run = cli.dry_run, "starting run");
        let outcomes = run.run_all(&projects).await;
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        info!(projects = outcomes.len(), failed, "run finished");
        outcomes
    }
    .instrument(span)
    .await;

    Ok(outcomes)
}
