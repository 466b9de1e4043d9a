//! LogTrail - 1 回の呼び出しのイベントをテキストとして記録する `tracing` layer
//!
//! INFO 以上のイベントを 1 行ずつ記録する:
//! `<RFC3339 UTC> <LEVEL> <message> key=value ...`
//! DEBUG / TRACE（ポーリングごとの細かいログ）は含めない。

use chrono::SecondsFormat;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::ports::Clock;

#[derive(Clone)]
pub struct LogTrail {
    lines: Arc<Mutex<String>>,
    clock: Arc<dyn Clock>,
}

impl LogTrail {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            lines: Arc::new(Mutex::new(String::new())),
            clock,
        }
    }

    /// ここまでに記録した内容すべて
    pub fn contents(&self) -> String {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, level: &Level, message: &str) {
        let stamp = self.clock.now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(lines, "{stamp} {level} {message}");
    }
}

impl<S: Subscriber> Layer<S> for LogTrail {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = event.metadata().level();
        if *level > Level::INFO {
            return;
        }
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        self.push(level, &visitor.finish());
    }
}

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
            format!("{}{}", self.message, self.fields)
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

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};
    use tracing::subscriber::with_default;
    use tracing_subscriber::layer::SubscriberExt;

    fn trail() -> LogTrail {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        LogTrail::new(Arc::new(clock))
    }

    #[test]
    fn records_info_and_louder_with_timestamp() {
        let trail = trail();
        let subscriber = tracing_subscriber::registry().with(trail.clone());

        with_default(subscriber, || {
            tracing::info!("Starting create_vm");
            tracing::debug!("polling");
            tracing::error!("create_vm failed");
        });

        assert_eq!(
            trail.contents(),
            "2024-01-02T03:04:05Z INFO Starting create_vm\n\
             2024-01-02T03:04:05Z ERROR create_vm failed\n"
        );
    }

    #[test]
    fn fields_follow_the_message() {
        let trail = trail();
        let subscriber = tracing_subscriber::registry().with(trail.clone());

        with_default(subscriber, || {
            tracing::warn!(task_id = "t1", failures = 2u32, "poll failed");
        });

        assert_eq!(
            trail.contents(),
            "2024-01-02T03:04:05Z WARN poll failed task_id=t1 failures=2\n"
        );
    }
}
