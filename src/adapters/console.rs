use crate::core::{NamePrompt, Notification, Notifier, PromptRequest, Severity};
use async_trait::async_trait;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

/// Answers every prompt with the same name, e.g. from `--name`.
#[derive(Debug, Clone)]
pub struct FixedName(pub String);

#[async_trait]
impl NamePrompt for FixedName {
    async fn prompt(&self, _request: &PromptRequest) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Reads the name from a line of input. An empty line keeps the default,
/// end of input cancels.
pub struct LinePrompt<R> {
    reader: Mutex<R>,
}

impl LinePrompt<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> LinePrompt<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(reader),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> NamePrompt for LinePrompt<R> {
    async fn prompt(&self, request: &PromptRequest) -> Option<String> {
        let mut stderr = std::io::stderr();
        let _ = if request.default_value.is_empty() {
            write!(stderr, "{}: ", request.message)
        } else {
            write!(stderr, "{} [{}]: ", request.message, request.default_value)
        };
        let _ = stderr.flush();

        let mut line = String::new();
        let mut reader = self.reader.lock().await;
        match reader.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => {
                let answer = line.trim();
                if answer.is_empty() {
                    Some(request.default_value.clone())
                } else {
                    Some(answer.to_string())
                }
            }
            Err(e) => {
                tracing::warn!("Could not read endpoint name: {}", e);
                None
            }
        }
    }
}

/// Prints toasts as one line on stdout.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn render(notification: &Notification) -> String {
        let icon = match notification.severity {
            Severity::Success => "✅",
            Severity::Info => "ℹ️",
            Severity::Warn => "⚠️",
            Severity::Error => "❌",
        };
        format!(
            "{} {}: {}",
            icon, notification.summary, notification.detail
        )
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: &Notification) {
        tracing::info!(
            "Toast ({:?}, {}ms): {}",
            notification.severity,
            notification.life_ms,
            notification.summary
        );
        println!("{}", Self::render(notification));
    }
}
