//! InMemory Attachment Repository 実装

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Attachment, AttachmentId, AttachmentRepository, MessageId, NewAttachment, RepositoryError,
};

#[derive(Default)]
struct AttachmentTable {
    last_id: i64,
    rows: Vec<Attachment>,
}

/// インメモリ Attachment Repository 実装
#[derive(Default)]
pub struct InMemoryAttachmentRepository {
    table: Mutex<AttachmentTable>,
}

impl InMemoryAttachmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttachmentRepository for InMemoryAttachmentRepository {
    async fn create_attachment(
        &self,
        attachment: NewAttachment,
    ) -> Result<Attachment, RepositoryError> {
        let mut table = self.table.lock().await;
        table.last_id += 1;
        let stored = Attachment {
            id: AttachmentId::new(table.last_id),
            message_id: attachment.message_id,
            uploader_id: attachment.uploader_id,
            file_name: attachment.upload.file_name,
            file_type: attachment.upload.file_type,
            file_size: attachment.upload.file_size,
            url: attachment.upload.url,
            created_at: attachment.created_at,
        };
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn list_by_message(
        &self,
        message_id: MessageId,
    ) -> Result<Vec<Attachment>, RepositoryError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .iter()
            .filter(|a| a.message_id == message_id)
            .cloned()
            .collect())
    }
}
