//! Subtask scopes: one field line inside the owning task's message.

use crate::attachment::Field;
use crate::error::{Error, Result};
use crate::message::{FieldUpdate, Message};
use crate::task::settle;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

/// Glyph shown while a subtask is running.
pub const PENDING_GLYPH: &str = ":arrow_right: ";
/// Glyph shown once a subtask succeeded.
pub const SUCCESS_GLYPH: &str = ":heavy_check_mark: ";
/// Glyph shown once a subtask failed.
pub const FAILURE_GLYPH: &str = ":x: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// A step of a [`Task`](crate::Task), rendered as `glyph + text` in one field
/// of the task's message.
pub struct Subtask {
    message: Rc<RefCell<Message>>,
    text: String,
    short: bool,
    index: Option<usize>,
    glyph: &'static str,
    state: SubtaskState,
}

impl Subtask {
    pub(crate) fn new(message: Rc<RefCell<Message>>, text: impl Into<String>) -> Self {
        Self {
            message,
            text: text.into(),
            short: false,
            index: None,
            glyph: PENDING_GLYPH,
            state: SubtaskState::Pending,
        }
    }

    /// Render the field half-width so short subtasks sit side by side.
    pub fn short(mut self, short: bool) -> Self {
        self.short = short;
        self
    }

    /// Reserve a field in the task message and publish it.
    pub fn enter(&mut self) -> Result<()> {
        if self.state != SubtaskState::Pending {
            return Err(Error::AlreadyStarted {
                scope: "subtask",
                state: format!("{:?}", self.state),
            });
        }

        let mut message = self.message.borrow_mut();
        let index = message.add_field(Field::new(self.value()).with_short(self.short));
        self.index = Some(index);
        self.state = SubtaskState::Running;
        debug!(index, text = %self.text, "subtask started");
        message.publish()
    }

    /// Finalize the field glyph according to `failure` and publish.
    pub fn exit(&mut self, failure: Option<&anyhow::Error>) -> Result<()> {
        if self.state != SubtaskState::Running {
            return Ok(());
        }

        if failure.is_some() {
            self.glyph = FAILURE_GLYPH;
            self.state = SubtaskState::Failed;
        } else {
            self.glyph = SUCCESS_GLYPH;
            self.state = SubtaskState::Succeeded;
        }
        debug!(text = %self.text, state = ?self.state, "subtask finished");
        self.rewrite()
    }

    /// Run `body` inside the subtask scope, returning its result unchanged.
    pub fn run<T, F>(&mut self, body: F) -> anyhow::Result<T>
    where
        F: FnOnce(&mut Subtask) -> anyhow::Result<T>,
    {
        self.enter()?;
        let result = body(self);
        let exited = self.exit(result.as_ref().err());
        settle(result, exited)
    }

    /// Replace the subtask text, publishing only if it changed.
    ///
    /// Before the subtask is entered the text is just stored.
    pub fn update(&mut self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        if text == self.text {
            return Ok(());
        }
        self.text = text;
        if self.index.is_none() {
            return Ok(());
        }
        self.rewrite()
    }

    fn rewrite(&self) -> Result<()> {
        let Some(index) = self.index else {
            return Ok(());
        };
        let mut message = self.message.borrow_mut();
        message.update_field(index, FieldUpdate::value(self.value()))?;
        message.publish()
    }

    fn value(&self) -> String {
        format!("{}{}", self.glyph, self.text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn glyph(&self) -> &'static str {
        self.glyph
    }

    /// Field index in the task message, assigned on entry.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn state(&self) -> SubtaskState {
        self.state
    }
}

impl Drop for Subtask {
    fn drop(&mut self) {
        if self.state != SubtaskState::Running {
            return;
        }
        let reason = anyhow::anyhow!("subtask abandoned");
        if let Err(e) = self.exit(Some(&reason)) {
            warn!("failed to publish abandoned subtask: {e}");
        }
    }
}

impl std::fmt::Debug for Subtask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subtask")
            .field("text", &self.text)
            .field("short", &self.short)
            .field("index", &self.index)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::tests::{Call, recorder};
    use crate::task::TaskOptions;

    fn field_values(calls: &[Call]) -> Vec<String> {
        let attachments = match calls.last() {
            Some(Call::Create { attachments, .. }) | Some(Call::Update { attachments, .. }) => {
                attachments
            }
            None => panic!("nothing published"),
        };
        attachments[0]
            .fields
            .iter()
            .map(|f| f.value.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_enter_reserves_field_and_publishes() {
        let (rec, notifier) = recorder();
        let mut task = notifier.task(TaskOptions::new().text("Deploy"));
        task.enter().unwrap();

        let mut sub = task.subtask("compile").short(true);
        assert_eq!(sub.index(), None);
        sub.enter().unwrap();
        assert_eq!(sub.index(), Some(0));
        assert_eq!(sub.state(), SubtaskState::Running);

        let calls = rec.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(field_values(&calls), vec![":arrow_right: compile"]);
        drop(calls);

        assert_eq!(task.message().main().fields[0].short, Some(true));
        sub.exit(None).unwrap();
        task.exit(None).unwrap();
    }

    #[test]
    fn test_update_same_text_is_noop() {
        let (rec, notifier) = recorder();
        let mut task = notifier.task(TaskOptions::new().text("Deploy"));
        task.enter().unwrap();
        let mut sub = task.subtask("copy files");
        sub.enter().unwrap();
        let before = rec.calls.lock().unwrap().len();

        sub.update("copy files").unwrap();
        assert_eq!(rec.calls.lock().unwrap().len(), before);

        sub.update("copy files (3/10)").unwrap();
        let calls = rec.calls.lock().unwrap();
        assert_eq!(calls.len(), before + 1);
        assert_eq!(field_values(&calls), vec![":arrow_right: copy files (3/10)"]);
    }

    #[test]
    fn test_update_before_enter_only_stores() {
        let (rec, notifier) = recorder();
        let task = notifier.task(TaskOptions::new().text("Deploy"));
        let mut sub = task.subtask("old");
        sub.update("new").unwrap();
        assert_eq!(sub.text(), "new");
        assert!(rec.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_update_after_exit_keeps_final_glyph() {
        let (rec, notifier) = recorder();
        let mut task = notifier.task(TaskOptions::new().text("Deploy"));
        task.enter().unwrap();
        let mut sub = task.subtask("fetch");
        sub.run(|_| Ok(())).unwrap();
        sub.update("fetched 12 packages").unwrap();
        assert_eq!(
            field_values(&rec.calls.lock().unwrap()),
            vec![":heavy_check_mark: fetched 12 packages"]
        );
    }

    #[test]
    fn test_dropped_running_subtask_fails() {
        let (rec, notifier) = recorder();
        let mut task = notifier.task(TaskOptions::new().text("Deploy"));
        task.enter().unwrap();
        {
            let mut sub = task.subtask("left open");
            sub.enter().unwrap();
        }
        assert_eq!(
            field_values(&rec.calls.lock().unwrap()),
            vec![":x: left open"]
        );
    }

    #[test]
    fn test_second_run_is_rejected() {
        let (rec, notifier) = recorder();
        let mut task = notifier.task(TaskOptions::new().text("Deploy"));
        task.enter().unwrap();
        let mut sub = task.subtask("migrate");
        sub.run(|_| Ok(())).unwrap();
        let published = rec.calls.lock().unwrap().len();

        let mut ran = false;
        let err = sub
            .run(|_| {
                ran = true;
                Ok(())
            })
            .unwrap_err();

        assert!(!ran);
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::AlreadyStarted { scope: "subtask", .. })
        ));
        assert_eq!(sub.state(), SubtaskState::Succeeded);
        assert_eq!(sub.index(), Some(0));
        assert_eq!(task.message().main().fields.len(), 1);
        assert_eq!(rec.calls.lock().unwrap().len(), published);
    }
}
