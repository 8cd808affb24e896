use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::commands::{Command, ParseError};
use super::render;
use crate::config::Config;
use crate::grafana::GrafanaError;
use crate::telegram::{ChatMemberUpdated, Message, MessageSink, Update};
use crate::workflow::{ErrorKind, ProvisioningWorkflow, WorkflowError};
use crate::Result;

/// Who sent a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sender {
    pub chat_id: i64,
    pub user_id: Option<i64>,
}

impl Sender {
    pub fn of(message: &Message) -> Self {
        Self {
            chat_id: message.chat.id,
            user_id: message.from.as_ref().map(|user| user.id),
        }
    }
}

/// Turns chat updates into workflow calls and replies.
pub struct Dispatcher {
    config: Arc<Config>,
    workflow: Arc<ProvisioningWorkflow>,
    /// This bot's `@username`; commands addressed to other bots are ignored.
    bot_username: Option<String>,
}

impl Dispatcher {
    pub fn new(config: Arc<Config>, workflow: Arc<ProvisioningWorkflow>) -> Self {
        Self {
            config,
            workflow,
            bot_username: None,
        }
    }

    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    pub async fn handle_update(&self, update: &Update, sink: &dyn MessageSink) -> Result<()> {
        if let Some(message) = &update.message {
            return self.handle_message(message, sink).await;
        }
        if let Some(change) = &update.my_chat_member {
            return self.handle_membership(change, sink).await;
        }
        debug!("Ignoring update {} without a message", update.update_id);
        Ok(())
    }

    async fn handle_message(&self, message: &Message, sink: &dyn MessageSink) -> Result<()> {
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let sender = Sender::of(message);

        if !self.config.is_allowed_sender(sender.chat_id, sender.user_id) {
            warn!(
                chat_id = sender.chat_id,
                user_id = ?sender.user_id,
                "Rejected message from unauthorized sender"
            );
            return sink.send_message(sender.chat_id, render::UNAUTHORIZED).await;
        }

        match Command::parse(text, self.bot_username.as_deref()) {
            Ok(command) => self.invoke(command, sender, sink).await,
            Err(ParseError::Usage(usage)) => sink.send_message(sender.chat_id, usage).await,
            Err(ParseError::Invalid(msg)) => {
                sink.send_message(sender.chat_id, &format!("Error: {}", render::escape_html(&msg)))
                    .await
            }
            Err(ParseError::Unknown(name)) => {
                debug!("Unknown command /{}", name);
                sink.send_message(sender.chat_id, render::UNKNOWN_COMMAND).await
            }
            Err(ParseError::NotACommand) => Ok(()),
        }
    }

    /// Run an authorized command and reply to the sender's chat.
    pub async fn invoke(&self, command: Command, sender: Sender, sink: &dyn MessageSink) -> Result<()> {
        if command.is_mutating() {
            info!(chat_id = sender.chat_id, user_id = ?sender.user_id, command = ?command, "Handling command");
        } else {
            debug!(chat_id = sender.chat_id, command = ?command, "Handling command");
        }
        let chat = sender.chat_id;

        match command {
            Command::Help => sink.send_message(chat, &render::help()).await,
            Command::CreateProject { name, chat_id } => {
                sink.send_message(chat, &render::creating(&name)).await?;
                let reply = match self.workflow.create_project(&name, chat_id).await {
                    Ok(project) => render::created(&project),
                    Err(WorkflowError::Failed(failure)) => {
                        if failure.kind == ErrorKind::Auth {
                            log_auth_failure(&failure.message);
                        }
                        render::provisioning_failed(&name, &failure)
                    }
                    Err(e) => self.render_error(&e),
                };
                sink.send_message(chat, &reply).await
            }
            Command::ListProjects => {
                let reply = match self.workflow.list_projects().await {
                    Ok(projects) => render::project_list(&projects),
                    Err(e) => self.render_error(&e),
                };
                sink.send_message(chat, &reply).await
            }
            Command::DeleteProject { name } => {
                let reply = match self.workflow.delete_project(&name).await {
                    Ok(_) => render::deleted(name.trim()),
                    Err(WorkflowError::Grafana(GrafanaError::NotFound(_))) => {
                        render::not_found(name.trim())
                    }
                    Err(e) => self.render_error(&e),
                };
                sink.send_message(chat, &reply).await
            }
        }
    }

    async fn handle_membership(&self, change: &ChatMemberUpdated, sink: &dyn MessageSink) -> Result<()> {
        if !change.is_join() {
            debug!(chat_id = change.chat.id, status = %change.new_chat_member.status, "Membership change");
            return Ok(());
        }

        info!(chat_id = change.chat.id, "Bot added to chat");
        let title = change.chat.title.as_deref().unwrap_or("(untitled)");
        let notice = format!(
            "New group added!\nGroup name: <b>{}</b>\nChat ID: <code>{}</code>",
            render::escape_html(title),
            change.chat.id
        );
        sink.send_message(self.config.telegram.admin_chat_id, &notice).await
    }

    fn render_error(&self, err: &WorkflowError) -> String {
        if let WorkflowError::Grafana(GrafanaError::Auth(msg)) = err {
            log_auth_failure(msg);
        }
        render::error(err)
    }
}

fn log_auth_failure(msg: &str) {
    error!("Grafana rejected the configured credentials: {}", msg);
}
