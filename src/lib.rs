//! Publish Slack status messages for tasks and their subtasks.
//!
//! A [`Notifier`] is bound to one channel. Each [`Task`] it creates owns one
//! chat message that is posted when the task starts and updated in place as
//! [`Subtask`]s progress and when the task finishes or fails.

pub mod attachment;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod notifier;
pub mod subtask;
pub mod task;

pub use attachment::{Action, Attachment, Color, Field};
pub use client::{ChatApi, SlackClient};
pub use config::NotifierConfig;
pub use error::{Error, Result};
pub use message::{FieldUpdate, Message, MessageUpdate};
pub use notifier::Notifier;
pub use subtask::{Subtask, SubtaskState};
pub use task::{Task, TaskOptions, TaskState};
