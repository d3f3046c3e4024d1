//! Forwarding of `tracing` events to the host log.

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::api::{LogLevel, LogSink};

/// Layer that renders each event as a single line and hands it to a [`LogSink`]
pub struct HostLogLayer<L> {
    sink: L,
    max_level: LogLevel,
}

impl<L: LogSink> HostLogLayer<L> {
    pub fn new(sink: L) -> Self {
        Self {
            sink,
            max_level: LogLevel::Trace,
        }
    }

    /// Drop events more verbose than `level`
    pub fn with_max_level(mut self, level: LogLevel) -> Self {
        self.max_level = level;
        self
    }
}

impl<S, L> Layer<S> for HostLogLayer<L>
where
    S: Subscriber,
    L: LogSink,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = LogLevel::from(*event.metadata().level());
        if level > self.max_level {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.sink.log(level, &visitor.finish());
    }
}

/// Collects the `message` field followed by `key=value` pairs
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", name, value);
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }
}

/// Install a global subscriber forwarding to `sink`.
///
/// Returns `false` if a global subscriber was already set.
pub fn install<L: LogSink>(sink: L) -> bool {
    let subscriber = tracing_subscriber::registry().with(HostLogLayer::new(sink));
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
