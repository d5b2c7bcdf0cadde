use std::time::Duration;

use reqwest::Client;

use crate::error::{Error, Result};
use crate::models::task::Task;
use crate::utils::crypto::sign_payload;

pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Delivers finished tasks to the caller-supplied `callback_url`.
///
/// The body is the task JSON; `X-Signature` carries its hex HMAC-SHA256
/// under the webhook secret so receivers can authenticate it.
#[derive(Clone)]
pub struct CallbackNotifier {
    client: Client,
    secret: String,
}

impl CallbackNotifier {
    pub fn new(secret: String, client: Client) -> Self {
        Self { client, secret }
    }

    pub fn sign(&self, body: &[u8]) -> String {
        sign_payload(&self.secret, body)
    }

    pub async fn deliver(&self, url: &str, task: &Task) -> Result<()> {
        let body = serde_json::to_vec(task)?;
        let signature = self.sign(&body);
        let res = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .timeout(Duration::from_secs(15))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Error::Upstream(format!(
                "Callback {} answered {}",
                url,
                res.status()
            )));
        }
        Ok(())
    }

    /// Best effort: a failed callback never changes the task outcome.
    pub async fn notify(&self, task: &Task) {
        let Some(url) = task.callback_url.as_deref() else {
            return;
        };
        match self.deliver(url, task).await {
            Ok(()) => tracing::info!(task_id = %task.id, "task callback delivered"),
            Err(err) => {
                tracing::warn!(task_id = %task.id, url, error = %err, "task callback failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskPayload;
    use crate::utils::crypto::verify_signature;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn signature_verifies_against_serialized_task() {
        let notifier = CallbackNotifier::new("whsec".into(), Client::new());
        let task = Task::new(
            &TaskPayload::ParseJob { job_id: Uuid::new_v4() },
            Some("http://localhost/cb".into()),
            None,
            Utc::now(),
        )
        .unwrap();
        let body = serde_json::to_vec(&task).unwrap();
        let signature = notifier.sign(&body);
        assert!(verify_signature("whsec", &body, &signature));
        assert!(!verify_signature("other", &body, &signature));
    }
}
