use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Environment, LoggingConfig};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};

#[derive(Default)]
struct JsonFieldVisitor {
    fields: Map<String, Value>,
}

impl JsonFieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for JsonFieldVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, Value::from(format!("{:?}", value)));
    }
}

fn take_message(fields: &mut Map<String, Value>) -> String {
    fields
        .remove("message")
        .map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_default()
}

/// Renders one `timestamp - LEVEL - message` line. Extra structured fields
/// are appended as `key=value` pairs.
fn render_line(timestamp: DateTime<Utc>, level: &Level, mut fields: Map<String, Value>) -> String {
    let mut line = format!(
        "{} - {} - {}",
        timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
        level.as_str(),
        take_message(&mut fields)
    );
    for (key, value) in fields {
        line.push(' ');
        line.push_str(&key);
        line.push('=');
        match value {
            Value::String(s) => line.push_str(&s),
            other => line.push_str(&other.to_string()),
        }
    }
    line
}

/// Renders one JSON log entry in the shape understood by the Cloud Logging agent.
fn render_json(
    timestamp: DateTime<Utc>,
    level: &Level,
    target: &str,
    service_name: &str,
    mut fields: Map<String, Value>,
) -> Value {
    let mut root = Map::new();
    root.insert(
        "timestamp".to_string(),
        Value::from(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    root.insert(
        "severity".to_string(),
        Value::from(level.as_str().to_string()),
    );
    root.insert("message".to_string(), Value::from(take_message(&mut fields)));
    fields.insert("code.target".to_string(), Value::from(target));
    fields.insert("service.name".to_string(), Value::from(service_name));
    root.insert(
        "logging.googleapis.com/labels".to_string(),
        Value::Object(fields),
    );
    Value::Object(root)
}

#[derive(Clone)]
struct PlainLineFormatter;

impl<S, N> FormatEvent<S, N> for PlainLineFormatter
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);
        let line = render_line(Utc::now(), event.metadata().level(), visitor.fields);
        writer.write_str(&line)?;
        writer.write_char('\n')
    }
}

#[derive(Clone)]
struct CloudJsonFormatter {
    service_name: String,
}

impl<S, N> FormatEvent<S, N> for CloudJsonFormatter
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        let json = render_json(
            Utc::now(),
            metadata.level(),
            metadata.target(),
            &self.service_name,
            visitor.fields,
        );
        let serialized = serde_json::to_string(&json).map_err(|_| std::fmt::Error)?;
        writer.write_str(&serialized)?;
        writer.write_char('\n')
    }
}

/// Installs the global tracing subscriber for the given environment.
///
/// - `Local`: INFO and above, appended to `logging.file`.
/// - `GcpDeployed`: ERROR only, JSON lines on stdout.
/// - no environment: nothing is installed and log macros are no-ops.
pub fn init_logging(
    environment: Option<Environment>,
    logging_config: &LoggingConfig,
) -> std::io::Result<()> {
    match environment {
        Some(Environment::Local) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&logging_config.file)?;
            let filter_layer = EnvFilter::default().add_directive(LevelFilter::INFO.into());
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file))
                        .event_format(PlainLineFormatter),
                )
                .init();
        }
        Some(Environment::GcpDeployed) => {
            let filter_layer = EnvFilter::default().add_directive(LevelFilter::ERROR.into());
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt::layer().event_format(CloudJsonFormatter {
                    service_name: logging_config.service_name.clone(),
                }))
                .init();
        }
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 15).unwrap()
    }

    #[test]
    fn local_line_has_timestamp_level_and_message() {
        let mut fields = Map::new();
        fields.insert("message".to_string(), Value::from("User login failed."));
        let line = render_line(fixed_time(), &Level::ERROR, fields);
        assert_eq!(line, "2024-05-01 09:30:15,000 - ERROR - User login failed.");
    }

    #[test]
    fn local_line_appends_extra_fields() {
        let mut fields = Map::new();
        fields.insert("message".to_string(), Value::from("dataset loaded"));
        fields.insert("tables".to_string(), Value::from(2));
        let line = render_line(fixed_time(), &Level::INFO, fields);
        assert!(line.ends_with("INFO - dataset loaded tables=2"));
    }

    #[test]
    fn cloud_entry_carries_severity_and_labels() {
        let mut fields = Map::new();
        fields.insert("message".to_string(), Value::from("boom"));
        fields.insert("prefix".to_string(), Value::from("mimic/"));
        let json = render_json(fixed_time(), &Level::ERROR, "portfolio::dataset", "svc", fields);
        assert_eq!(json["severity"], "ERROR");
        assert_eq!(json["message"], "boom");
        assert_eq!(json["timestamp"], "2024-05-01T09:30:15.000Z");
        let labels = &json["logging.googleapis.com/labels"];
        assert_eq!(labels["prefix"], "mimic/");
        assert_eq!(labels["code.target"], "portfolio::dataset");
        assert_eq!(labels["service.name"], "svc");
    }
}
