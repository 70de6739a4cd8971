//! In-memory state of one remote chat message.
//!
//! A [`Message`] owns a primary attachment (color, title, text, field table,
//! actions) followed by any number of supplementary attachments. Fields and
//! supplementary attachments are append-only: the index returned when one is
//! added stays valid for the lifetime of the message.
//!
//! Nothing is sent until [`Message::publish`] is called. The first publish
//! posts a new message and remembers the returned timestamp; every later
//! publish overwrites that same message with the full current state.

use crate::attachment::{Action, Attachment, Color, Field};
use crate::error::{Error, Result};
use crate::notifier::Notifier;
use tracing::{debug, instrument};

/// Partial update of the primary attachment. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct MessageUpdate {
    pub color: Option<Color>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub actions: Option<Vec<Action>>,
}

impl MessageUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(mut self, color: impl Into<Color>) -> Self {
        self.color = Some(color.into());
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

    pub fn actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = Some(actions);
        self
    }
}

/// Partial update of one field. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct FieldUpdate {
    pub title: Option<String>,
    pub value: Option<String>,
    pub short: Option<bool>,
}

impl FieldUpdate {
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }
}

pub struct Message {
    notifier: Notifier,
    main: Attachment,
    extra: Vec<Attachment>,
    ts: Option<String>,
}

impl Message {
    pub fn new(notifier: Notifier, main: Attachment) -> Self {
        Self {
            notifier,
            main,
            extra: Vec::new(),
            ts: None,
        }
    }

    pub fn update(&mut self, update: MessageUpdate) {
        if let Some(color) = update.color {
            self.main.color = Some(color);
        }
        if let Some(title) = update.title {
            self.main.title = Some(title);
        }
        if let Some(text) = update.text {
            self.main.text = Some(text);
        }
        if let Some(actions) = update.actions {
            self.main.actions = Some(actions);
        }
    }

    /// Append a field to the primary attachment and return its index.
    pub fn add_field(&mut self, field: Field) -> usize {
        self.main.fields.push(field);
        self.main.fields.len() - 1
    }

    pub fn update_field(&mut self, index: usize, update: FieldUpdate) -> Result<()> {
        let len = self.main.fields.len();
        let field = self
            .main
            .fields
            .get_mut(index)
            .ok_or(Error::FieldOutOfRange { index, len })?;

        if let Some(title) = update.title {
            field.title = Some(title);
        }
        if let Some(value) = update.value {
            field.value = Some(value);
        }
        if let Some(short) = update.short {
            field.short = Some(short);
        }
        Ok(())
    }

    /// Append a supplementary attachment and return its index.
    pub fn add_attachment(&mut self, attachment: Attachment) -> usize {
        self.extra.push(attachment);
        self.extra.len() - 1
    }

    pub fn update_attachment(&mut self, index: usize, attachment: Attachment) -> Result<()> {
        let len = self.extra.len();
        let slot = self
            .extra
            .get_mut(index)
            .ok_or(Error::AttachmentOutOfRange { index, len })?;
        *slot = attachment;
        Ok(())
    }

    /// Send the current state to the chat API.
    ///
    /// This is the only method that performs network I/O.
    #[instrument(skip(self), fields(channel = %self.notifier.channel()))]
    pub fn publish(&mut self) -> Result<()> {
        let attachments = self.attachments();
        let api = self.notifier.api();
        if let Some(ts) = self.ts.as_deref() {
            api.update_message(self.notifier.channel(), ts, &attachments)?;
            debug!(ts, "message updated");
            return Ok(());
        }

        let ts = api.create_message(self.notifier.channel(), &attachments)?;
        debug!(ts = %ts, "message created");
        self.ts = Some(ts);
        Ok(())
    }

    /// Primary attachment followed by the supplementary ones, as published.
    pub fn attachments(&self) -> Vec<Attachment> {
        std::iter::once(&self.main)
            .chain(self.extra.iter())
            .cloned()
            .collect()
    }

    pub fn main(&self) -> &Attachment {
        &self.main
    }

    pub fn extra(&self) -> &[Attachment] {
        &self.extra
    }

    /// Remote message id, set by the first successful publish.
    pub fn ts(&self) -> Option<&str> {
        self.ts.as_deref()
    }

    pub fn is_published(&self) -> bool {
        self.ts.is_some()
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("channel", &self.notifier.channel())
            .field("main", &self.main)
            .field("extra", &self.extra)
            .field("ts", &self.ts)
            .finish()
    }
}
