use std::sync::Mutex;

use async_trait::async_trait;

use hdclient_core::{ErrorAgent, IntentRecord, IntentTopic};

#[derive(Default)]
struct State {
    next_error: Option<String>,
    sent: Vec<(IntentTopic, Vec<IntentRecord>)>,
}

/// An in-memory [`ErrorAgent`] double: every `send` succeeds and is
/// appended to an in-memory topic log, unless a one-shot `next_error`
/// has been armed — mirroring the mutable-`nextError`-plus-topic-log
/// shape tests against this surface are expected to use.
#[derive(Default)]
pub struct RecordingErrorAgent {
    state: Mutex<State>,
}

impl RecordingErrorAgent {
    pub fn new() -> Self {
        RecordingErrorAgent::default()
    }

    pub fn set_next_error(&self, message: impl Into<String>) {
        self.state.lock().unwrap().next_error = Some(message.into());
    }

    pub fn sent(&self) -> Vec<(IntentTopic, Vec<IntentRecord>)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn sent_on(&self, topic: IntentTopic) -> Vec<IntentRecord> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|(t, _)| *t == topic)
            .flat_map(|(_, records)| records.clone())
            .collect()
    }
}

#[async_trait]
impl ErrorAgent for RecordingErrorAgent {
    async fn send(&self, topic: IntentTopic, records: Vec<IntentRecord>) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        state.sent.push((topic, records));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sent_intents_by_topic() {
        let agent = RecordingErrorAgent::new();
        let record = IntentRecord {
            raw_key: "k".to_string(),
            fragments: vec![],
            version: None,
        };
        agent.send(IntentTopic::Repair, vec![record]).await.unwrap();
        assert_eq!(agent.sent_on(IntentTopic::Repair).len(), 1);
        assert!(agent.sent_on(IntentTopic::Delete).is_empty());
    }

    #[tokio::test]
    async fn next_error_fires_once() {
        let agent = RecordingErrorAgent::new();
        agent.set_next_error("kafka unavailable");
        let record = IntentRecord {
            raw_key: "k".to_string(),
            fragments: vec![],
            version: None,
        };
        assert!(agent.send(IntentTopic::Delete, vec![record.clone()]).await.is_err());
        assert!(agent.send(IntentTopic::Delete, vec![record]).await.is_ok());
    }
}
