use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use http::Extensions;
use lazyhttp::{Error, Result, Transport};
use reqwest::{Request, Response};

/// What the next send through a [`ScriptedTransport`] produces.
#[derive(Debug, Clone)]
pub enum Attempt {
    Status(u16),
    Fail(&'static str),
}

/// An in-memory transport that plays back a script of responses and failures, counting
/// every send. Once the script runs out every send answers 200.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Attempt>>,
    sends: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Attempt>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            sends: AtomicUsize::new(0),
        }
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn round_trip(&self, _req: Request, _extensions: &mut Extensions) -> Result<Response> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .expect("script mutex must not be poisoned")
            .pop_front()
            .unwrap_or(Attempt::Status(200));

        match next {
            Attempt::Status(status) => {
                let res = http::Response::builder()
                    .status(status)
                    .body(format!("attempt {}", self.sends()))
                    .unwrap();
                Ok(Response::from(res))
            }
            Attempt::Fail(message) => Err(Error::Transport(anyhow::anyhow!(message))),
        }
    }
}
