//! Mock abstractive backend for testing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{AbstractiveBackend, GenerationParams, NeuralError};

/// A configurable mock response for [`MockBackend`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Return this summary.
    Summary(String),
    /// Return the first `n` words of the input.
    Lead(usize),
    /// Fail with this message.
    Error(String),
}

/// A hand-rolled mock implementing [`AbstractiveBackend`].
///
/// Records the last input and parameters so callers can assert on what
/// reached the model.
pub struct MockBackend {
    response: MockResponse,
    delay: Option<Duration>,
    call_count: AtomicUsize,
    last_input: Mutex<Option<String>>,
    last_params: Mutex<Option<GenerationParams>>,
}

impl MockBackend {
    pub fn new(response: MockResponse) -> Self {
        Self {
            response,
            delay: None,
            call_count: AtomicUsize::new(0),
            last_input: Mutex::new(None),
            last_params: Mutex::new(None),
        }
    }

    /// Set simulated inference latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn last_input(&self) -> Option<String> {
        self.last_input.lock().ok().and_then(|g| g.clone())
    }

    pub fn last_params(&self) -> Option<GenerationParams> {
        self.last_params.lock().ok().and_then(|g| *g)
    }
}

impl AbstractiveBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn summarize<'a>(
        &'a self,
        text: &'a str,
        params: &'a GenerationParams,
    ) -> Pin<Box<dyn Future<Output = Result<String, NeuralError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut g) = self.last_input.lock() {
            *g = Some(text.to_string());
        }
        if let Ok(mut g) = self.last_params.lock() {
            *g = Some(*params);
        }
        let response = self.response.clone();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            match response {
                MockResponse::Summary(s) => Ok(s),
                MockResponse::Lead(n) => Ok(text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")),
                MockResponse::Error(msg) => Err(NeuralError::Other(msg)),
            }
        })
    }
}
