//! Conversations (workspaces) API.

use serde::de::IgnoredAny;

use super::{endpoints, or_empty};
use crate::client::TtkiaClient;
use crate::error::Result;
use crate::types::{
    Attachment, ConversationDetail, ConversationRef, ConversationSummary, UserProfile, Workspace,
};

/// Conversations API client.
pub struct ConversationsApi {
    client: TtkiaClient,
}

impl ConversationsApi {
    pub(crate) fn new(client: TtkiaClient) -> Self {
        Self { client }
    }

    /// List the user's conversations.
    pub async fn try_list(&self) -> Result<Vec<ConversationSummary>> {
        let profile: UserProfile = self.client.get(endpoints::USER_ME).await?;
        let conversations = profile.history_chat.conversations;
        tracing::info!(count = conversations.len(), "Fetched conversations");
        Ok(conversations)
    }

    /// List the user's conversations, or an empty list on failure.
    pub async fn list(&self) -> Vec<ConversationSummary> {
        or_empty(self.try_list().await, "conversations")
    }

    /// Get a conversation's details.
    pub async fn show(&self, conversation_id: &str) -> Result<ConversationDetail> {
        let detail = self
            .client
            .post_read(endpoints::CONVERSATION_INFO, &ConversationRef { conversation_id })
            .await
            .inspect_err(|e| tracing::error!(conversation_id, error = %e, "Failed to fetch conversation"))?;
        tracing::debug!(conversation_id, "Fetched conversation");
        Ok(detail)
    }

    /// Create a new workspace.
    ///
    /// The identifier is `None` when the server's answer lacks one.
    pub async fn create(&self) -> Result<Workspace> {
        let workspace: Workspace = self
            .client
            .post_empty(endpoints::NEW_WORKSPACE)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to create workspace"))?;
        match workspace.conversation_id.as_deref() {
            Some(conversation_id) => tracing::info!(conversation_id, "Created workspace"),
            None => tracing::warn!("Workspace created without a conversation id"),
        }
        Ok(workspace)
    }

    /// Delete a conversation.
    pub async fn try_delete(&self, conversation_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .client
            .post(endpoints::FORGET, &ConversationRef { conversation_id })
            .await?;
        tracing::info!(conversation_id, "Deleted conversation");
        Ok(())
    }

    /// Delete a conversation, returning whether it succeeded.
    pub async fn delete(&self, conversation_id: &str) -> bool {
        match self.try_delete(conversation_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(conversation_id, error = %e, "Failed to delete conversation");
                false
            }
        }
    }

    /// List a conversation's file attachments.
    pub async fn try_attachments(&self, conversation_id: &str) -> Result<Vec<Attachment>> {
        let attachments = self.show(conversation_id).await?.file_attachments;
        tracing::info!(conversation_id, count = attachments.len(), "Fetched attachments");
        Ok(attachments)
    }

    /// List a conversation's file attachments, or an empty list on failure.
    pub async fn attachments(&self, conversation_id: &str) -> Vec<Attachment> {
        or_empty(self.try_attachments(conversation_id).await, "attachments")
    }
}
