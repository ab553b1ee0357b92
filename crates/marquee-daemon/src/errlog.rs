//! Append-only failure log.
//!
//! Every warning or error carrying a `component` field is written as one
//! `component: message` line, next to the regular daemon log.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;

pub struct ErrorLogLayer {
    file: Mutex<File>,
}

impl ErrorLogLayer {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S> tracing_subscriber::Layer<S> for ErrorLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = event.metadata().level();
        if !matches!(*level, Level::WARN | Level::ERROR) {
            return;
        }

        let mut visitor = FailureVisitor::default();
        event.record(&mut visitor);
        let Some(component) = visitor.component else {
            return;
        };

        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}: {}", one_line(&component), one_line(&visitor.message));
        }
    }
}

/// Response bodies carry their own line breaks; each failure stays on one line.
fn one_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

#[derive(Default)]
struct FailureVisitor {
    component: Option<String>,
    message: String,
}

impl Visit for FailureVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "component" => self.component = Some(value.to_string()),
            "message" => self.message.push_str(value),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message.push_str(&format!("{:?}", value)),
            "component" => self.component = Some(format!("{:?}", value)),
            _ => {}
        }
    }
}
