//! Moderator command flow.
//!
//! scope → permission → remote read → reconcile → commit → acknowledge.
//! Every gate can end the flow early; nothing here ever returns an error to
//! the caller. Failures become a [`CommandOutcome`] and, where a human should
//! know, a reply in the thread.

use std::sync::Arc;
use std::time::Duration;

use kotatsu_schema::{InboundMessage, OutboundMessage, ThreadEdit};
use tokio::sync::oneshot;

use crate::access::PermissionEvaluator;
use crate::commands::{CommandTable, ManagedCommand};
use crate::errors::WriteError;
use crate::forum::ForumApi;
use crate::scope::{ScopeConfig, ScopeRejection};
use crate::tags::{find_status_tag, reconcile_applied_tags};
use crate::title::apply_title_prefix;

pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotACommand,
    Scope(ScopeRejection),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Ignored(IgnoreReason),
    Denied,
    /// A remote read failed; nothing was written.
    LookupFailed,
    TagNotFound { tag_name: String },
    Updated { title: String, applied_tags: Vec<u64> },
    /// The write outlived its deadline and may or may not have landed.
    TimedOut,
    Rejected(WriteError),
}

pub struct CommandRouter {
    api: Arc<dyn ForumApi>,
    commands: &'static CommandTable,
    managed_prefixes: Vec<&'static str>,
    scope: Arc<ScopeConfig>,
    evaluator: PermissionEvaluator,
    write_timeout: Duration,
}

impl CommandRouter {
    pub fn new(
        api: Arc<dyn ForumApi>,
        commands: &'static CommandTable,
        scope: Arc<ScopeConfig>,
        evaluator: PermissionEvaluator,
    ) -> Self {
        Self {
            api,
            managed_prefixes: commands.title_prefixes(),
            commands,
            scope,
            evaluator,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn commands(&self) -> &'static CommandTable {
        self.commands
    }

    pub fn is_command(&self, text: &str) -> bool {
        self.commands.parse(text).is_some()
    }

    pub async fn handle(&self, msg: &InboundMessage) -> CommandOutcome {
        if msg.author_is_bot {
            return CommandOutcome::Ignored(IgnoreReason::Scope(ScopeRejection::AutomatedAuthor));
        }
        let Some(command) = self.commands.parse(&msg.content) else {
            return CommandOutcome::Ignored(IgnoreReason::NotACommand);
        };

        let container = match self.api.fetch_container(msg.channel_id).await {
            Ok(container) => container,
            Err(e) => {
                tracing::warn!(
                    trace_id = %msg.trace_id,
                    channel_id = msg.channel_id,
                    "failed to fetch channel for .{}: {e}",
                    command.key
                );
                return CommandOutcome::LookupFailed;
            }
        };
        if let Err(rejection) = self.scope.check_command(msg.author_is_bot, &container) {
            tracing::debug!(
                trace_id = %msg.trace_id,
                channel_id = msg.channel_id,
                ?rejection,
                "command out of scope"
            );
            return CommandOutcome::Ignored(IgnoreReason::Scope(rejection));
        }

        match self
            .evaluator
            .authorize(self.api.as_ref(), msg.author_id, &container)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(
                    trace_id = %msg.trace_id,
                    user_id = msg.author_id,
                    mode = self.evaluator.policy().mode(),
                    "denied .{}",
                    command.key
                );
                self.reply(
                    msg,
                    format!("<@{}> you don't have permission to run that command.", msg.author_id),
                )
                .await;
                return CommandOutcome::Denied;
            }
            Err(e) => {
                tracing::warn!(
                    trace_id = %msg.trace_id,
                    user_id = msg.author_id,
                    "permission lookup failed, not treating as denial: {e}"
                );
                return CommandOutcome::LookupFailed;
            }
        }

        self.apply(msg, command, container.id, container.parent_id)
            .await
    }

    async fn apply(
        &self,
        msg: &InboundMessage,
        command: &'static ManagedCommand,
        thread_id: u64,
        parent_id: Option<u64>,
    ) -> CommandOutcome {
        // Scope already guarantees a parent.
        let Some(parent_id) = parent_id else {
            return CommandOutcome::Ignored(IgnoreReason::Scope(ScopeRejection::MissingParent));
        };
        let parent = match self.api.fetch_container(parent_id).await {
            Ok(parent) => parent,
            Err(e) => {
                tracing::warn!(trace_id = %msg.trace_id, parent_id, "failed to fetch forum: {e}");
                return CommandOutcome::LookupFailed;
            }
        };
        let Some(tag) = find_status_tag(&parent.available_tags, command.status_tag) else {
            tracing::info!(
                trace_id = %msg.trace_id,
                parent_id,
                tag = command.status_tag,
                "status tag missing from forum"
            );
            self.reply(
                msg,
                format!(
                    "Tag {} not found in the forum. Please create it first.",
                    command.status_tag
                ),
            )
            .await;
            return CommandOutcome::TagNotFound {
                tag_name: command.status_tag.to_string(),
            };
        };

        // Read the thread again right before computing the edit.
        let thread = match self.api.fetch_container(thread_id).await {
            Ok(thread) => thread,
            Err(e) => {
                tracing::warn!(trace_id = %msg.trace_id, thread_id, "failed to refetch thread: {e}");
                return CommandOutcome::LookupFailed;
            }
        };

        let edit = ThreadEdit {
            name: apply_title_prefix(&thread.name, command.title_prefix, &self.managed_prefixes),
            applied_tags: reconcile_applied_tags(
                &parent.available_tags,
                tag.id,
                &thread.applied_tags,
            ),
        };

        let outcome = match self.commit(msg, thread_id, &edit).await {
            Ok(()) => {
                tracing::info!(
                    trace_id = %msg.trace_id,
                    thread_id,
                    title = %edit.name,
                    applied_tags = ?edit.applied_tags,
                    "applied .{}",
                    command.key
                );
                CommandOutcome::Updated {
                    title: edit.name,
                    applied_tags: edit.applied_tags,
                }
            }
            Err(CommitError::TimedOut) => {
                tracing::warn!(
                    trace_id = %msg.trace_id,
                    thread_id,
                    timeout = ?self.write_timeout,
                    "thread update timed out"
                );
                CommandOutcome::TimedOut
            }
            Err(CommitError::Rejected(e)) => {
                tracing::warn!(trace_id = %msg.trace_id, thread_id, "thread update rejected: {e}");
                CommandOutcome::Rejected(e)
            }
        };

        if let Some(text) = feedback(&outcome) {
            self.reply(msg, text).await;
        }
        outcome
    }

    /// Races the write against the deadline. The write task keeps running
    /// after a timeout; its late result lands in a dropped receiver.
    async fn commit(
        &self,
        msg: &InboundMessage,
        thread_id: u64,
        edit: &ThreadEdit,
    ) -> Result<(), CommitError> {
        let (tx, rx) = oneshot::channel();
        let api = Arc::clone(&self.api);
        let edit = edit.clone();
        let trace_id = msg.trace_id;
        tokio::spawn(async move {
            let result = api.edit_thread(thread_id, &edit).await;
            if let Err(late) = tx.send(result) {
                tracing::debug!(%trace_id, thread_id, ?late, "discarding late thread update result");
            }
        });

        match tokio::time::timeout(self.write_timeout, rx).await {
            Ok(Ok(result)) => result.map_err(CommitError::Rejected),
            Ok(Err(_)) => Err(CommitError::Rejected(WriteError::Transport(
                "thread update task ended without a result".into(),
            ))),
            Err(_) => Err(CommitError::TimedOut),
        }
    }

    async fn reply(&self, msg: &InboundMessage, text: String) {
        if let Err(e) = self
            .api
            .send_message(msg.channel_id, &OutboundMessage::text(text))
            .await
        {
            tracing::warn!(
                trace_id = %msg.trace_id,
                channel_id = msg.channel_id,
                "failed to send reply: {e}"
            );
        }
    }
}

enum CommitError {
    TimedOut,
    Rejected(WriteError),
}

/// The reply for an outcome of the commit step.
pub fn feedback(outcome: &CommandOutcome) -> Option<String> {
    let text = match outcome {
        CommandOutcome::Updated { title, .. } => format!("Updated thread: {title}"),
        CommandOutcome::TimedOut => "Updating the thread timed out. It may still have been \
            applied, so check the thread before running the command again."
            .to_string(),
        CommandOutcome::Rejected(WriteError::Throttled(info)) => {
            format!("Rate limited while updating the thread ({info}). Try again once it resets.")
        }
        CommandOutcome::Rejected(WriteError::Forbidden { .. }) => {
            "Failed to update the thread: missing permission (Manage Threads?).".to_string()
        }
        CommandOutcome::Rejected(WriteError::NotFound { .. }) => {
            "Failed to update the thread: it no longer exists.".to_string()
        }
        CommandOutcome::Rejected(WriteError::Server { .. }) => {
            "Discord returned a server error while updating the thread. Try again later."
                .to_string()
        }
        CommandOutcome::Rejected(_) => "Failed to update the thread.".to_string(),
        _ => return None,
    };
    Some(text)
}
