use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::event::{DateInfo, Event, NotificationDate, RemindDate};
use crate::models::project::PropertyNames;
use crate::service::time_service::DateValue;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected a list of pages, got {0}")]
    NotAList(&'static str),
}

/// Why a single page was skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("page is not an object")]
    NotAnObject,
    #[error("page has no properties object")]
    NoProperties,
    #[error("property {property:?} is missing")]
    Missing { property: String },
    #[error("property {property:?} has an unexpected shape: {reason}")]
    Shape { property: String, reason: String },
    #[error("property {property:?} has no entries")]
    Empty { property: String },
    #[error("page has no usable date")]
    NoDateSignal,
}

pub trait PageParser: Send + Sync {
    /// Parses the `results` array of a database query. Pages that fail are
    /// logged and left out; only a non-array input fails the whole call.
    fn parse(&self, results: &Value, names: &PropertyNames) -> Result<Vec<Event>, ParseError>;
}

#[derive(Debug, Deserialize)]
struct TitleProperty {
    title: Vec<TitleRun>,
}

#[derive(Debug, Deserialize)]
struct TitleRun {
    text: TextContent,
}

#[derive(Debug, Deserialize)]
struct TextContent {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RichTextProperty {
    rich_text: Vec<RichTextRun>,
}

#[derive(Debug, Deserialize)]
struct RichTextRun {
    plain_text: String,
}

#[derive(Debug, Deserialize)]
struct DateProperty {
    date: Option<RawDate>,
}

#[derive(Debug, Deserialize)]
struct RawDate {
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NotionParser;

impl NotionParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_page(&self, page: &Value, names: &PropertyNames) -> Result<Event, PageError> {
        let page = page.as_object().ok_or(PageError::NotAnObject)?;
        let properties = page
            .get("properties")
            .and_then(Value::as_object)
            .ok_or(PageError::NoProperties)?;

        let date = parse_date_info(properties, &names.date)?;
        let title = parse_title(properties, &names.title)?;
        let location = parse_rich_text(properties, &names.location)?;
        let role = parse_rich_text(properties, &names.role)?;
        let remind_date = RemindDate {
            notify_start_time: parse_optional_date(properties, &names.remind_date),
        };
        let notification_date = NotificationDate {
            target_date: parse_optional_date(properties, &names.notification_date),
        };

        let has_start = DateValue::parse(&date.start).is_some();
        if !has_start && !remind_date.is_set() && !notification_date.is_set() {
            return Err(PageError::NoDateSignal);
        }

        Ok(Event {
            title,
            role,
            location,
            date,
            remind_date,
            notification_date,
        })
    }
}

impl PageParser for NotionParser {
    fn parse(&self, results: &Value, names: &PropertyNames) -> Result<Vec<Event>, ParseError> {
        let pages = results.as_array().ok_or(ParseError::NotAList(kind_of(results)))?;

        let mut events = Vec::with_capacity(pages.len());
        for (page_index, page) in pages.iter().enumerate() {
            match self.parse_page(page, names) {
                Ok(event) => events.push(event),
                Err(error) => {
                    let page_id = page.get("id").and_then(Value::as_str).unwrap_or("-");
                    warn!(page_index, page_id, %error, "skipping page");
                }
            }
        }

        info!(
            pages = pages.len(),
            events = events.len(),
            "parsed calendar pages"
        );
        Ok(events)
    }
}

fn property<'a>(properties: &'a Map<String, Value>, name: &str) -> Result<&'a Value, PageError> {
    properties.get(name).ok_or_else(|| PageError::Missing {
        property: name.to_string(),
    })
}

fn decode<T: DeserializeOwned>(value: &Value, name: &str) -> Result<T, PageError> {
    T::deserialize(value).map_err(|e| PageError::Shape {
        property: name.to_string(),
        reason: e.to_string(),
    })
}

fn parse_title(properties: &Map<String, Value>, name: &str) -> Result<String, PageError> {
    let raw: TitleProperty = decode(property(properties, name)?, name)?;
    raw.title
        .into_iter()
        .next()
        .map(|run| run.text.content)
        .ok_or_else(|| PageError::Empty {
            property: name.to_string(),
        })
}

/// An empty run list is an empty string; role and location may be blank.
fn parse_rich_text(properties: &Map<String, Value>, name: &str) -> Result<String, PageError> {
    let raw: RichTextProperty = decode(property(properties, name)?, name)?;
    Ok(raw
        .rich_text
        .into_iter()
        .next()
        .map(|run| run.plain_text)
        .unwrap_or_default())
}

fn parse_date_info(properties: &Map<String, Value>, name: &str) -> Result<DateInfo, PageError> {
    let raw: DateProperty = decode(property(properties, name)?, name)?;
    let date = raw.date.unwrap_or(RawDate {
        start: None,
        end: None,
    });
    Ok(DateInfo {
        start: date.start.unwrap_or_default(),
        end: date.end.unwrap_or_default(),
    })
}

fn parse_optional_date(properties: &Map<String, Value>, name: &str) -> String {
    let Some(value) = properties.get(name) else {
        return String::new();
    };
    match decode::<DateProperty>(value, name) {
        Ok(raw) => raw.date.and_then(|d| d.start).unwrap_or_default(),
        Err(error) => {
            debug!(property = name, %error, "ignoring optional date property");
            String::new()
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(title: &str, start: &str) -> Value {
        json!({
            "id": format!("page-{title}"),
            "properties": {
                "名前": { "type": "title", "title": [ { "text": { "content": title }, "plain_text": title } ] },
                "日付": { "type": "date", "date": { "start": start, "end": null } },
                "開催場所": { "type": "rich_text", "rich_text": [ { "plain_text": "Room A" } ] },
                "ロール": { "type": "rich_text", "rich_text": [ { "plain_text": "eng" } ] }
            }
        })
    }

    fn parse(results: Value) -> Vec<Event> {
        NotionParser::new()
            .parse(&results, &PropertyNames::default())
            .unwrap()
    }

    #[test]
    fn parses_a_complete_page() {
        let events = parse(json!([page("Standup", "2025-01-16T10:00:00.000+09:00")]));
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.title, "Standup");
        assert_eq!(event.role, "eng");
        assert_eq!(event.location, "Room A");
        assert_eq!(event.date.start, "2025-01-16T10:00:00.000+09:00");
        assert_eq!(event.date.end, "");
        assert!(!event.remind_date.is_set());
        assert!(!event.notification_date.is_set());
    }

    #[test]
    fn malformed_page_is_skipped_and_order_is_kept() {
        let mut broken = page("Two", "2025-01-16T10:00:00Z");
        broken["properties"]["名前"]["title"] = json!([]);
        let events = parse(json!([
            page("One", "2025-01-16T10:00:00Z"),
            broken,
            page("Three", "2025-01-17T10:00:00Z"),
        ]));
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Three"]);
    }

    #[test]
    fn page_without_title_property_is_left_out_of_the_batch() {
        let mut untitled = page("Two", "2025-01-16T10:00:00Z");
        untitled["properties"].as_object_mut().unwrap().remove("名前");
        let events = parse(json!([
            page("One", "2025-01-16T10:00:00Z"),
            untitled,
            page("Three", "2025-01-17T10:00:00Z"),
        ]));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "One");
        assert_eq!(events[1].title, "Three");
        assert_eq!(events[1].date.start, "2025-01-17T10:00:00Z");
    }

    #[test]
    fn missing_title_property_is_reported() {
        let mut raw = page("x", "2025-01-16T10:00:00Z");
        raw["properties"].as_object_mut().unwrap().remove("名前");
        let err = NotionParser::new()
            .parse_page(&raw, &PropertyNames::default())
            .unwrap_err();
        assert_eq!(
            err,
            PageError::Missing {
                property: "名前".to_string()
            }
        );
    }

    #[test]
    fn wrong_shape_is_reported() {
        let mut raw = page("x", "2025-01-16T10:00:00Z");
        raw["properties"]["開催場所"] = json!({ "rich_text": "Room A" });
        let err = NotionParser::new()
            .parse_page(&raw, &PropertyNames::default())
            .unwrap_err();
        assert!(matches!(err, PageError::Shape { ref property, .. } if property == "開催場所"));
    }

    #[test]
    fn non_object_pages_are_skipped() {
        let events = parse(json!([42, { "no": "properties" }, page("Ok", "2025-01-16")]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Ok");
    }

    #[test]
    fn blank_role_and_location_are_tolerated() {
        let mut raw = page("x", "2025-01-16T10:00:00Z");
        raw["properties"]["ロール"]["rich_text"] = json!([]);
        raw["properties"]["開催場所"]["rich_text"] = json!([]);
        let events = parse(json!([raw]));
        assert_eq!(events[0].role, "");
        assert_eq!(events[0].location, "");
    }

    #[test]
    fn optional_selectors_are_read_when_present() {
        let mut raw = page("x", "2025-02-01T10:00:00Z");
        raw["properties"]["リマインド日時"] =
            json!({ "type": "date", "date": { "start": "2025-01-15T09:00:00Z" } });
        raw["properties"]["通知日"] = json!({ "type": "date", "date": { "start": "2025-01-20" } });
        let events = parse(json!([raw]));
        assert_eq!(events[0].remind_date.notify_start_time, "2025-01-15T09:00:00Z");
        assert_eq!(events[0].notification_date.target_date, "2025-01-20");
    }

    #[test]
    fn malformed_optional_selector_degrades_to_empty() {
        let mut raw = page("x", "2025-02-01T10:00:00Z");
        raw["properties"]["リマインド日時"] = json!("tomorrow");
        let events = parse(json!([raw]));
        assert_eq!(events.len(), 1);
        assert!(!events[0].remind_date.is_set());
    }

    #[test]
    fn page_without_any_date_signal_is_dropped() {
        let mut raw = page("x", "");
        raw["properties"]["日付"]["date"] = Value::Null;
        let err = NotionParser::new()
            .parse_page(&raw, &PropertyNames::default())
            .unwrap_err();
        assert_eq!(err, PageError::NoDateSignal);

        raw["properties"]["通知日"] = json!({ "date": { "start": "2025-01-20" } });
        let event = NotionParser::new()
            .parse_page(&raw, &PropertyNames::default())
            .unwrap();
        assert_eq!(event.date.start, "");
    }

    #[test]
    fn custom_property_names_are_honoured() {
        let names = PropertyNames {
            title: "Name".to_string(),
            date: "When".to_string(),
            location: "Where".to_string(),
            role: "Who".to_string(),
            ..PropertyNames::default()
        };
        let raw = json!({
            "properties": {
                "Name": { "title": [ { "text": { "content": "Retro" } } ] },
                "When": { "date": { "start": "2025-01-16", "end": "2025-01-17" } },
                "Where": { "rich_text": [ { "plain_text": "Online" } ] },
                "Who": { "rich_text": [ { "plain_text": "team" } ] }
            }
        });
        let events = NotionParser::new().parse(&json!([raw]), &names).unwrap();
        assert_eq!(events[0].title, "Retro");
        assert_eq!(events[0].date.end, "2025-01-17");
    }

    #[test]
    fn non_array_input_fails_the_batch() {
        let err = NotionParser::new()
            .parse(&json!({ "results": [] }), &PropertyNames::default())
            .unwrap_err();
        assert_eq!(err, ParseError::NotAList("an object"));
    }
}
