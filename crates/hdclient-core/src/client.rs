use tracing::instrument;

use hdclient_fragio::FragmentIo;

use crate::config::ValidatedConfig;
use crate::intent::ErrorAgent;
use crate::orchestrator::{self, PutBody};
use crate::outcomes::{DeleteOutcome, GetOutcome, KeyContext, PutOutcome};

/// The full client facade: a validated config plus the two injected
/// capabilities (fragment transport, error-agent sink) everything else
/// is built from. Stateless between calls — no caches, no connection
/// pools owned here.
pub struct HdClient<F, E> {
    config: ValidatedConfig,
    fragio: F,
    error_agent: E,
}

impl<F, E> HdClient<F, E>
where
    F: FragmentIo,
    E: ErrorAgent,
{
    pub fn new(config: ValidatedConfig, fragio: F, error_agent: E) -> Self {
        HdClient {
            config,
            fragio,
            error_agent,
        }
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn fragio(&self) -> &F {
        &self.fragio
    }

    pub fn error_agent(&self) -> &E {
        &self.error_agent
    }

    #[instrument(skip(self, body), fields(bucket = %key_context.bucket_name, object = %key_context.object_key))]
    pub async fn put(&self, key_context: KeyContext, size: u64, body: PutBody) -> PutOutcome {
        let outcome = orchestrator::put(&self.config, &self.fragio, &self.error_agent, key_context, size, body).await;
        match &outcome.result {
            Ok(()) => tracing::info!(raw_key = ?outcome.raw_key, "put succeeded"),
            Err(err) => tracing::warn!(raw_key = ?outcome.raw_key, error = %err, "put failed"),
        }
        outcome
    }

    #[instrument(skip(self, raw_key))]
    pub async fn get(&self, raw_key: &str, range: Option<(u64, u64)>) -> GetOutcome {
        let outcome = orchestrator::get(&self.config, &self.fragio, &self.error_agent, raw_key, range).await;
        if let Err(err) = &outcome.body {
            tracing::warn!(error = %err, "get failed");
        }
        outcome
    }

    #[instrument(skip(self, raw_key))]
    pub async fn delete(&self, raw_key: &str) -> DeleteOutcome {
        let outcome = orchestrator::delete(&self.config, &self.fragio, &self.error_agent, raw_key).await;
        if let Err(err) = &outcome.result {
            tracing::warn!(error = %err, "delete failed");
        }
        outcome
    }
}
