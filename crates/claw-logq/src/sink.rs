//! Tracing layer that persists events as queryable log records.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Number, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

use crate::types::{FIELD_DATA, FIELD_TRANSACTION_ID, LogRecord};
use crate::writer::RotatingWriter;

/// Field holding the event message in `tracing` macros.
const MESSAGE_FIELD: &str = "message";

/// A [`Layer`] writing every event it sees as one [`LogRecord`] line.
///
/// - The event level becomes `level` in lower case (`warn` is written as
///   `warning`).
/// - The `message` field becomes `msg`.
/// - The transaction id field is taken from the event, or else from the
///   innermost enclosing span that carries it.
/// - A `data` field holding a JSON object string is expanded into `data`;
///   every other event field is added to `data` under its own name.
pub struct RecordLayer {
    writer: Arc<RotatingWriter>,
    transaction_id_field: String,
}

impl RecordLayer {
    /// Creates a layer appending to `writer`.
    #[must_use]
    pub fn new(writer: Arc<RotatingWriter>) -> Self {
        Self {
            writer,
            transaction_id_field: FIELD_TRANSACTION_ID.to_string(),
        }
    }

    /// Sets the field name the transaction id is read from.
    #[must_use]
    pub fn with_transaction_id_field(mut self, name: impl Into<String>) -> Self {
        self.transaction_id_field = name.into();
        self
    }

    fn span_transaction_id<S>(&self, event: &Event<'_>, ctx: &Context<'_, S>) -> Option<String>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        ctx.event_scope(event)?.find_map(|span| {
            let extensions = span.extensions();
            let value = extensions
                .get::<SpanFields>()?
                .0
                .get(&self.transaction_id_field)?;
            Some(value_to_text(value))
        })
    }
}

impl fmt::Debug for RecordLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordLayer")
            .field("transaction_id_field", &self.transaction_id_field)
            .finish_non_exhaustive()
    }
}

/// Fields recorded on a span, kept in its extensions.
struct SpanFields(Map<String, Value>);

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == MESSAGE_FIELD {
            self.message = Some(value_to_text(&value));
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.insert(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }
}

impl<S> Layer<S> for RecordLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        span.extensions_mut().insert(SpanFields(visitor.fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor::default();
        values.record(&mut visitor);

        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            fields.0.extend(visitor.fields);
        } else {
            extensions.insert(SpanFields(visitor.fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let FieldVisitor {
            message,
            mut fields,
        } = visitor;

        let transaction_id = fields
            .remove(&self.transaction_id_field)
            .map(|value| value_to_text(&value))
            .or_else(|| self.span_transaction_id(event, &ctx));
        let data = build_data(fields);
        let level = level_name(*event.metadata().level());
        let msg = message.unwrap_or_default();

        let result = self.writer.append_with(|now| LogRecord {
            level: level.to_string(),
            time: now,
            msg,
            transaction_id,
            data,
        });
        if let Err(e) = result {
            // Reporting through tracing would re-enter this layer.
            eprintln!("failed to write log record: {e}");
        }
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::ERROR => "error",
        Level::WARN => "warning",
        Level::INFO => "info",
        Level::DEBUG => "debug",
        Level::TRACE => "trace",
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn build_data(mut fields: Map<String, Value>) -> Option<Map<String, Value>> {
    let mut data = match fields.remove(FIELD_DATA) {
        Some(Value::String(text)) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(object)) => object,
            _ => Map::from_iter([(FIELD_DATA.to_string(), Value::String(text))]),
        },
        Some(other) => Map::from_iter([(FIELD_DATA.to_string(), other)]),
        None => Map::new(),
    };
    data.extend(fields);
    (!data.is_empty()).then_some(data)
}
