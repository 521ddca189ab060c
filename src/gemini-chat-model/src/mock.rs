//! Scripted model source for tests and offline runs.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::{StreamExt, stream};

use crate::{Chunk, ChunkStream, ModelError, ModelSource, Part, Result};

/// One step of a scripted stream.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Yield this chunk.
    Chunk(Chunk),
    /// Yield a failure and end the stream.
    Fail(String),
}

/// What the stream does once the script is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptEnd {
    /// End the stream.
    #[default]
    Complete,
    /// Never yield again, like an upstream that stalls.
    Hang,
}

/// A [`ModelSource`] that replays a fixed script.
///
/// Counts how many items consumers pulled from its streams, which lets tests
/// observe whether a consumer kept reading.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    steps: Vec<ScriptStep>,
    end: ScriptEnd,
    answer: Option<String>,
    fail_open: Option<String>,
    pulls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            ..Default::default()
        }
    }

    /// A script of chunks that completes normally.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self::new(chunks.into_iter().map(ScriptStep::Chunk).collect())
    }

    /// A script where every chunk holds a single answer part.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_chunks(
            texts
                .into_iter()
                .map(|t| Chunk::new(vec![Part::text(t)]))
                .collect(),
        )
    }

    /// Answer returned by [`ModelSource::generate`].
    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    /// Make both `generate` and `stream` fail before producing anything.
    pub fn failing_open(mut self, message: impl Into<String>) -> Self {
        self.fail_open = Some(message.into());
        self
    }

    pub fn ending_with(mut self, end: ScriptEnd) -> Self {
        self.end = end;
        self
    }

    /// Number of items pulled from streams created by this source.
    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    fn record(&self, prompt: &str) {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
    }

    fn open_error(&self) -> Option<ModelError> {
        self.fail_open.clone().map(ModelError::Upstream)
    }
}

#[async_trait]
impl ModelSource for ScriptedSource {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.record(prompt);
        if let Some(err) = self.open_error() {
            return Err(err);
        }

        match &self.answer {
            Some(answer) => Ok(answer.clone()),
            None => Ok(self
                .steps
                .iter()
                .filter_map(|step| match step {
                    ScriptStep::Chunk(chunk) => Some(chunk),
                    ScriptStep::Fail(_) => None,
                })
                .flat_map(|chunk| chunk.parts.iter())
                .filter(|part| !part.is_thought)
                .filter_map(|part| part.text.as_deref())
                .collect()),
        }
    }

    async fn stream(&self, prompt: &str) -> Result<ChunkStream> {
        self.record(prompt);
        if let Some(err) = self.open_error() {
            return Err(err);
        }

        let pulls = Arc::clone(&self.pulls);
        let items = self.steps.clone().into_iter().map(move |step| {
            pulls.fetch_add(1, Ordering::SeqCst);
            match step {
                ScriptStep::Chunk(chunk) => Ok(chunk),
                ScriptStep::Fail(message) => Err(ModelError::Upstream(message)),
            }
        });

        // Stop after the first failure, like a real upstream would.
        let mut failed = false;
        let scripted = stream::iter(items).take_while(move |item| {
            let keep = !failed;
            failed = item.is_err();
            futures::future::ready(keep)
        });

        match self.end {
            ScriptEnd::Complete => Ok(Box::pin(scripted)),
            ScriptEnd::Hang => Ok(Box::pin(scripted.chain(stream::pending()))),
        }
    }
}
