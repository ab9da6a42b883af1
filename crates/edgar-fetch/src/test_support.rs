use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::event::{EventSink, FetchEvent};
use crate::transport::{Transport, TransportError, TransportResponse};

/// A request observed by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub locator: String,
    pub headers: BTreeMap<String, String>,
}

#[derive(Default)]
struct Script {
    replies: HashMap<String, Result<TransportResponse, TransportError>>,
    fallback: Option<Result<TransportResponse, TransportError>>,
    requests: Vec<RecordedRequest>,
}

/// In-memory transport for testing. Replies are keyed by locator; anything
/// unscripted gets the fallback, or a 404.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, locator: impl Into<String>, response: TransportResponse) {
        self.script
            .lock()
            .unwrap()
            .replies
            .insert(locator.into(), Ok(response));
    }

    pub fn fail(&self, locator: impl Into<String>, error: TransportError) {
        self.script
            .lock()
            .unwrap()
            .replies
            .insert(locator.into(), Err(error));
    }

    /// Reply used for every locator without its own script.
    pub fn respond_to_all(&self, response: TransportResponse) {
        self.script.lock().unwrap().fallback = Some(Ok(response));
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn requested_locators(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.locator).collect()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn get(
        &self,
        locator: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<TransportResponse, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(RecordedRequest {
            locator: locator.to_owned(),
            headers: headers.clone(),
        });

        script
            .replies
            .get(locator)
            .or(script.fallback.as_ref())
            .cloned()
            .unwrap_or_else(|| Ok(TransportResponse::new(404, "not found")))
    }
}

/// Event sink that keeps every event for later inspection.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<FetchEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FetchEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Only the per-task events, in task order.
    pub fn task_events(&self) -> Vec<FetchEvent> {
        self.events()
            .into_iter()
            .filter(FetchEvent::is_task_outcome)
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &FetchEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> BTreeMap<String, String> {
        BTreeMap::from([("User-Agent".to_owned(), "test".to_owned())])
    }

    #[tokio::test]
    async fn scripted_reply_is_returned() {
        let transport = ScriptedTransport::new();
        transport.respond("https://x/a", TransportResponse::new(200, "body"));

        let response = transport.get("https://x/a", &headers()).await.unwrap();
        assert_eq!(response, TransportResponse::new(200, "body"));
    }

    #[tokio::test]
    async fn unscripted_locator_is_not_found() {
        let transport = ScriptedTransport::new();
        let response = transport.get("https://x/missing", &headers()).await.unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn fallback_applies_to_unscripted_locators() {
        let transport = ScriptedTransport::new();
        transport.respond_to_all(TransportResponse::new(503, ""));
        transport.respond("https://x/ok", TransportResponse::new(200, "ok"));

        assert_eq!(transport.get("https://x/ok", &headers()).await.unwrap().status, 200);
        assert_eq!(transport.get("https://x/other", &headers()).await.unwrap().status, 503);
    }

    #[tokio::test]
    async fn records_requests_in_order() {
        let transport = ScriptedTransport::new();
        let _ = transport.get("https://x/1", &headers()).await;
        transport.fail("https://x/2", TransportError::Timeout);
        let result = transport.get("https://x/2", &headers()).await;

        assert_eq!(result, Err(TransportError::Timeout));
        assert_eq!(transport.requested_locators(), vec!["https://x/1", "https://x/2"]);
        assert_eq!(transport.requests()[0].headers, headers());
    }

    #[test]
    fn recording_sink_filters_task_events() {
        let sink = RecordingSink::new();
        sink.emit(&FetchEvent::Started { total: 0 });
        assert_eq!(sink.events().len(), 1);
        assert!(sink.task_events().is_empty());
    }
}
