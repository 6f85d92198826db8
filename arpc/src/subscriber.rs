use std::fmt::{Debug, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::event::Event;
use tracing::field::{Field, Visit};
use tracing::{span, Id, Level, Metadata, Subscriber};

/// Prints events at or above a level to stderr, one line each. Spans are numbered but otherwise
/// ignored.
pub struct StderrSubscriber {
    max_level: Level,
    ids: AtomicUsize,
}

impl StderrSubscriber {
    pub fn new(max_level: Level) -> Self {
        StderrSubscriber {
            max_level,
            ids: AtomicUsize::new(1),
        }
    }
}

// https://docs.rs/tracing/0.1.7/tracing/subscriber/trait.Subscriber.html
impl Subscriber for StderrSubscriber {
    // More verbose levels compare greater.
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= &self.max_level
    }

    fn new_span(&self, _span: &span::Attributes) -> Id {
        let id = self.ids.fetch_add(1, Ordering::SeqCst);
        Id::from_u64(id as u64)
    }

    fn record(&self, _span: &Id, _values: &span::Record) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event) {
        let mut line = LineVisitor::default();
        event.record(&mut line);
        let metadata = event.metadata();
        eprintln!(
            "{:>5} {}: {}",
            metadata.level(),
            metadata.target(),
            line.finish()
        );
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

// Renders the message first, then every other field as `name=value`.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            self.message + &self.fields
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_visitor_puts_message_first() {
        let line = LineVisitor {
            message: "dropping packet".to_string(),
            fields: " error=short buffer".to_string(),
        };
        assert_eq!(line.finish(), "dropping packet error=short buffer");

        let line = LineVisitor {
            message: String::new(),
            fields: " a=1 b=2".to_string(),
        };
        assert_eq!(line.finish(), "a=1 b=2");
    }
}
