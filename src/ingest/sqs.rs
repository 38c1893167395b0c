//! SQS integration
//!
//! Long-polls a queue with a fixed batch size, wait window and visibility
//! timeout, and deletes entries by receipt handle once they are handled.

use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::operation::receive_message::ReceiveMessageOutput;
use aws_sdk_sqs::types::QueueAttributeName;
use aws_sdk_sqs::Client;
use bytes::Bytes;
use tracing::info;

use crate::config::PollSettings;
use crate::errors::DripError;
use crate::ingest::{Queue, QueueMessage};

#[derive(Clone, Debug)]
pub struct SqsQueue {
    client: Client,
    queue_url: String,
    settings: PollSettings,
}

impl SqsQueue {
    pub fn new(client: Client, queue_url: &str) -> Self {
        Self {
            client,
            queue_url: queue_url.to_string(),
            settings: PollSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PollSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Fails fast on a bad URL or missing permissions before any worker starts.
    pub async fn ensure_queue(&self) -> Result<(), DripError> {
        let out = self
            .client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(|e| DripError::SourceInit(DisplayErrorContext(&e).to_string()))?;

        let depth = out
            .attributes
            .as_ref()
            .and_then(|a| a.get(&QueueAttributeName::ApproximateNumberOfMessages))
            .and_then(|v| v.parse::<u64>().ok());
        info!(queue_url = %self.queue_url, approximate_depth = ?depth, "drip queue reachable");
        Ok(())
    }

    pub async fn receive_batch(&self) -> Result<Vec<QueueMessage>, DripError> {
        let out = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(self.settings.batch_size)
            .wait_time_seconds(self.settings.wait_time_secs)
            .visibility_timeout(self.settings.visibility_timeout_secs)
            .send()
            .await
            .map_err(|e| DripError::Receive(DisplayErrorContext(&e).to_string()))?;

        Ok(parse_receive_output(out))
    }

    pub async fn delete_message(&self, receipt_handle: &str) -> Result<(), DripError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| DripError::Ack(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Queue for SqsQueue {
    async fn receive(&self) -> Result<Option<Vec<QueueMessage>>, DripError> {
        // An SQS queue never closes; an empty long poll is just an empty batch.
        self.receive_batch().await.map(Some)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), DripError> {
        self.delete_message(receipt_handle).await
    }
}

/// Flatten a `ReceiveMessage` reply into raw entries.
///
/// Entries without a receipt handle cannot be acknowledged and are dropped; a
/// missing body becomes an empty body and fails at the decode boundary.
pub fn parse_receive_output(out: ReceiveMessageOutput) -> Vec<QueueMessage> {
    let Some(messages) = out.messages else {
        return Vec::new();
    };

    messages
        .into_iter()
        .filter_map(|m| {
            let receipt_handle = m.receipt_handle?;
            let body = m.body.map(Bytes::from).unwrap_or_default();
            Some(QueueMessage {
                receipt_handle,
                body,
            })
        })
        .collect()
}
