//! Tracing setup for the `rulegate` binary.
//!
//! Logs always go to stderr so that `--json` reports on stdout stay
//! machine-readable.

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `level` when set. Only the first call has an effect.
pub fn init_tracing(json: bool, level: Level) {
    build_subscriber(json, level, std::io::stderr).try_init().ok();
}

/// The subscriber [`init_tracing`] installs, writing to `writer`.
///
/// `json` selects newline-delimited JSON lines, otherwise the compact format.
pub fn build_subscriber<W>(
    json: bool,
    level: Level,
    writer: W,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let layer = fmt::layer().with_target(false).with_writer(writer);

    if json {
        Box::new(tracing_subscriber::registry().with(env_filter).with(layer.json()))
    } else {
        Box::new(tracing_subscriber::registry().with(env_filter).with(layer.compact()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_json_lines_go_to_the_writer() {
        let capture = Capture::default();
        let subscriber = build_subscriber(true, Level::WARN, capture.clone());
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(ruleset = "protect-main", "payload rejected");
        });

        let text = capture.text();
        let line: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(line["level"], "WARN");
        assert_eq!(line["fields"]["message"], "payload rejected");
        assert_eq!(line["fields"]["ruleset"], "protect-main");
    }

    #[test]
    fn test_compact_format_is_plain_text() {
        let capture = Capture::default();
        let subscriber = build_subscriber(false, Level::WARN, capture.clone());
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(sha = "abc", "check runs truncated at page limit");
        });

        let text = capture.text();
        assert!(text.contains("check runs truncated at page limit"));
        assert!(serde_json::from_str::<serde_json::Value>(text.trim()).is_err());
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing(false, Level::WARN);
        init_tracing(true, Level::DEBUG);
        tracing::warn!("still logging after a second init");
    }
}
