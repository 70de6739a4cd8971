//! Task scopes: one status message per unit of work.
//!
//! A [`Task`] publishes a "Started ..." message when its scope is entered and
//! rewrites it to "Finished ..." or "Failed ..." (with the elapsed time) when
//! the scope ends. Errors flowing out of the scope are recorded in the message
//! and then handed back to the caller unchanged.
//!
//! ```rust,ignore
//! let notifier = Notifier::slack(token, "C1234567890")?;
//! notifier
//!     .task(TaskOptions::new().title("Nightly").text("Build the project"))
//!     .run(|task| {
//!         task.subtask("compile").run(|_| compile())?;
//!         task.subtask("test").run(|_| test())?;
//!         Ok(())
//!     })?;
//! ```

use crate::attachment::{Action, Attachment, Color};
use crate::error::{Error, Result};
use crate::message::{Message, MessageUpdate};
use crate::notifier::Notifier;
use crate::subtask::Subtask;
use chrono::{DateTime, Utc};
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Title of the attachment carrying the error of a failed task.
pub const FAILURE_TITLE: &str = "Previous task raised the following error:";

/// Construction options for a [`Task`].
#[derive(Debug, Clone)]
pub struct TaskOptions {
    /// Color while the task is running.
    pub color: Color,
    pub title: Option<String>,
    pub text: Option<String>,
    pub callback_id: Option<String>,
    pub actions: Option<Vec<Action>>,
    /// Prepend "Started"/"Finished"/"Failed" to the text.
    pub status_prefix: bool,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            color: Color::Warning,
            title: None,
            text: None,
            callback_id: None,
            actions: None,
            status_prefix: true,
        }
    }
}

impl TaskOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(mut self, color: impl Into<Color>) -> Self {
        self.color = color.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn callback_id(mut self, callback_id: impl Into<String>) -> Self {
        self.callback_id = Some(callback_id.into());
        self
    }

    pub fn actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn status_prefix(mut self, status_prefix: bool) -> Self {
        self.status_prefix = status_prefix;
        self
    }
}

/// Lifecycle of a [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Constructed, nothing published yet.
    Pending,
    /// Entered; the "Started" message is visible.
    Running,
    Finished,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

/// A unit of work reported as one chat message.
///
/// Tasks and their subtasks share the message through `Rc<RefCell<_>>`, so
/// they stay on the thread that created them.
pub struct Task {
    message: Rc<RefCell<Message>>,
    text: Option<String>,
    status_prefix: bool,
    done: bool,
    state: TaskState,
    started: Option<Instant>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    elapsed: Option<Duration>,
}

impl Task {
    pub fn new(notifier: Notifier, options: TaskOptions) -> Self {
        let status_prefix = options.status_prefix;
        // Lowercasing only serves the "Started"/"Finished"/"Failed" prefix;
        // without a prefix the caller's text is shown as given.
        let text = options.text.filter(|t| !t.is_empty()).map(|t| {
            if status_prefix {
                lowercase_first(&t)
            } else {
                t
            }
        });

        let initial_text = match &text {
            Some(t) if status_prefix => Some(format!("Started {t}")),
            other => other.clone(),
        };
        let main = Attachment {
            color: Some(options.color),
            title: options.title,
            text: initial_text,
            callback_id: options.callback_id,
            actions: options.actions,
            ..Default::default()
        };

        Self {
            message: Rc::new(RefCell::new(Message::new(notifier, main))),
            text,
            status_prefix,
            done: false,
            state: TaskState::Pending,
            started: None,
            started_at: None,
            finished_at: None,
            elapsed: None,
        }
    }

    /// Enter the scope: publish the initial message and start the clock.
    ///
    /// A task is entered once; entering it again fails with
    /// [`Error::AlreadyStarted`]. On a publish error the task stays pending.
    pub fn enter(&mut self) -> Result<()> {
        if self.state != TaskState::Pending {
            return Err(Error::AlreadyStarted {
                scope: "task",
                state: format!("{:?}", self.state),
            });
        }

        self.message.borrow_mut().publish()?;
        self.started = Some(Instant::now());
        self.started_at = Some(Utc::now());
        self.state = TaskState::Running;
        info!(title = ?self.title(), "task started");
        Ok(())
    }

    /// Leave the scope, classifying it by `failure`.
    ///
    /// The elapsed time is appended to the task text. Unless the task was
    /// marked done, the color and status prefix are rewritten; a failure also
    /// adds an attachment with the rendered error. The final state is
    /// published. `failure` is only observed, never consumed.
    pub fn exit(&mut self, failure: Option<&anyhow::Error>) -> Result<()> {
        if self.state != TaskState::Running {
            return Ok(());
        }

        let elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        self.elapsed = Some(elapsed);
        self.finished_at = Some(Utc::now());
        self.state = if failure.is_some() {
            TaskState::Failed
        } else {
            TaskState::Finished
        };

        let prefixed = self.status_prefix && self.text.is_some();
        let took = format_elapsed(elapsed);
        let text = match self.text.take() {
            Some(t) => format!("{t} {took}"),
            None => took,
        };
        self.text = Some(text.clone());

        let mut message = self.message.borrow_mut();
        if let Some(error) = failure {
            warn!(title = ?message.main().title, elapsed = ?elapsed, "task failed: {error:#}");
        } else {
            info!(title = ?message.main().title, elapsed = ?elapsed, "task finished");
        }

        if !self.done {
            let (color, prefix) = if failure.is_some() {
                (Color::Danger, "Failed")
            } else {
                (Color::Good, "Finished")
            };
            let text = if prefixed {
                format!("{prefix} {text}")
            } else {
                text
            };
            message.update(MessageUpdate::new().color(color).text(text));
        }
        if let Some(error) = failure {
            message.add_attachment(failure_attachment(error));
        }
        message.publish()
    }

    /// Run `body` inside the task scope.
    ///
    /// Returns whatever `body` returns. A body error is recorded in the
    /// message and then returned as-is; if publishing the final state also
    /// fails, that failure is logged and the body error wins.
    pub fn run<T, F>(&mut self, body: F) -> anyhow::Result<T>
    where
        F: FnOnce(&mut Task) -> anyhow::Result<T>,
    {
        self.enter()?;
        let result = body(self);
        let exited = self.exit(result.as_ref().err());
        settle(result, exited)
    }

    /// Publish the current message state.
    pub fn publish(&self) -> Result<()> {
        self.message.borrow_mut().publish()
    }

    /// Create a subtask reporting into this task's message.
    pub fn subtask(&self, text: impl Into<String>) -> Subtask {
        Subtask::new(Rc::clone(&self.message), text)
    }

    /// Update the message without publishing it.
    pub fn update(&self, update: MessageUpdate) {
        self.message.borrow_mut().update(update);
    }

    /// Mark the task as finalized by the caller; exit then only republishes.
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Task text, without status prefix. Carries the elapsed suffix after exit.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn title(&self) -> Option<String> {
        self.message.borrow().main().title.clone()
    }

    pub fn message(&self) -> Ref<'_, Message> {
        self.message.borrow()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Measured duration of the scope, once exited.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        if self.state != TaskState::Running {
            return;
        }
        let reason = if std::thread::panicking() {
            anyhow::anyhow!("task panicked")
        } else {
            anyhow::anyhow!("task dropped while still running")
        };
        if let Err(e) = self.exit(Some(&reason)) {
            warn!("failed to publish abandoned task: {e}");
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("text", &self.text)
            .field("state", &self.state)
            .field("done", &self.done)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

/// Combine a scope body's result with the outcome of its exit publish.
pub(crate) fn settle<T>(result: anyhow::Result<T>, exited: Result<()>) -> anyhow::Result<T> {
    match (result, exited) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(publish_err)) => {
            warn!("failed to publish scope failure: {publish_err}");
            Err(e)
        }
    }
}

/// Supplementary attachment describing a failed task.
pub fn failure_attachment(error: &anyhow::Error) -> Attachment {
    Attachment::new()
        .with_color(Color::Danger)
        .with_title(FAILURE_TITLE)
        .with_text(format!("{error:?}"))
}

/// `(took {m}m {ss.cc}s)`, rounded to hundredths of a second.
pub fn format_elapsed(elapsed: Duration) -> String {
    let centis = (elapsed.as_secs_f64() * 100.0).round() as u64;
    let minutes = centis / 6000;
    let rest = centis % 6000;
    format!("(took {}m {:02}.{:02}s)", minutes, rest / 100, rest % 100)
}

/// Lowercase the first character so the text reads naturally after a prefix.
fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
