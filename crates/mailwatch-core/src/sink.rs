//! Message consumers.

use std::sync::Arc;

use tracing::info;

use crate::decode::DecodedMessage;

/// Receives each decoded message on the listener's worker task.
///
/// Keep it quick: the listener does not return to IDLE until it returns.
pub type MessageSink = Arc<dyn Fn(&DecodedMessage) + Send + Sync>;

/// Wraps a `(subject, body)` callback as a [`MessageSink`].
#[must_use]
pub fn on_message<F>(f: F) -> MessageSink
where
    F: Fn(Option<&str>, &str) + Send + Sync + 'static,
{
    Arc::new(move |message: &DecodedMessage| f(message.subject(), message.body()))
}

/// The default sink: logs subject and body at `info`.
#[must_use]
pub fn log_sink() -> MessageSink {
    on_message(|subject, body| {
        info!(subject = subject.unwrap_or("(no subject)"), "new email");
        info!(body, "email body");
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn on_message_passes_fields() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = on_message({
            let seen = Arc::clone(&seen);
            move |subject, body| {
                seen.lock()
                    .unwrap()
                    .push((subject.map(str::to_string), body.to_string()));
            }
        });

        sink(&DecodedMessage::new(Some("Hi".into()), "there"));
        sink(&DecodedMessage::new(None, ""));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (Some("Hi".to_string()), "there".to_string()),
                (None, String::new()),
            ]
        );
    }

    #[test]
    fn log_sink_accepts_any_message() {
        let sink = log_sink();
        sink(&DecodedMessage::new(None, "body"));
    }
}
