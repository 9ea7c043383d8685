//! Multi-step generation: smoothing, continuation after `length` finishes and
//! step framing, producing protocol parts.

use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::Result;
use crate::protocol::StreamPart;
use crate::provider::ChatModel;
use crate::smooth::WordSmoother;
use crate::types::{ChatRequest, FinishReason, StreamDelta, Usage};
use crate::{DeltaStream, PartStream};

#[derive(Debug, Clone)]
pub struct StepOptions {
    /// Total steps allowed, including the first. Zero is treated as one.
    pub max_steps: usize,
    /// Pause after each smoothed word. `None` passes deltas through unchanged.
    pub smooth_delay: Option<Duration>,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self { max_steps: 1, smooth_delay: None }
    }
}

fn message_id() -> String {
    format!("msg-{}", Uuid::new_v4().simple())
}

/// Open the first step and return the part stream.
///
/// Failing to open the first step is returned as an error so the caller can
/// answer with an HTTP status. Later failures become error parts.
pub async fn stream_generation(
    model: Arc<dyn ChatModel>,
    request: ChatRequest,
    options: StepOptions,
) -> Result<PartStream> {
    let first = model.stream(request.clone()).await?;
    let (tx, rx) = mpsc::channel::<StreamPart>(64);

    tokio::spawn(async move {
        run_steps(model, request, options, first, tx).await;
    });

    Ok(Box::pin(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|part| (part, rx))
    })))
}

struct StepEmitter {
    tx: mpsc::Sender<StreamPart>,
    smoother: Option<WordSmoother>,
    delay: Option<Duration>,
}

impl StepEmitter {
    /// Returns false once the receiver is gone.
    async fn send(&self, part: StreamPart) -> bool {
        self.tx.send(part).await.is_ok()
    }

    async fn text(&mut self, delta: String) -> bool {
        let Some(smoother) = self.smoother.as_mut() else {
            return self.send(StreamPart::Text(delta)).await;
        };
        let words = smoother.push(&delta);
        for word in words {
            if !self.send(StreamPart::Text(word)).await {
                return false;
            }
            if let Some(delay) = self.delay.filter(|d| !d.is_zero()) {
                tokio::time::sleep(delay).await;
            }
        }
        true
    }

    async fn flush(&mut self) -> bool {
        match self.smoother.as_mut().and_then(WordSmoother::flush) {
            Some(rest) => self.send(StreamPart::Text(rest)).await,
            None => true,
        }
    }
}

async fn run_steps(
    model: Arc<dyn ChatModel>,
    request: ChatRequest,
    options: StepOptions,
    first: DeltaStream,
    tx: mpsc::Sender<StreamPart>,
) {
    let max_steps = options.max_steps.max(1);
    let mut emitter = StepEmitter {
        tx,
        smoother: options.smooth_delay.map(|_| WordSmoother::new()),
        delay: options.smooth_delay,
    };
    let mut pending = Some(first);
    let mut generated = String::new();
    let mut total = Usage::default();
    let mut step_request = request.clone();

    for step in 0..max_steps {
        let mut deltas = match pending.take() {
            Some(s) => s,
            None => match model.stream(step_request.clone()).await {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(step, error = %e, "continuation step failed to open");
                    let _ = emitter.send(StreamPart::Error(e.to_string())).await;
                    let _ = emitter
                        .send(StreamPart::FinishMessage { finish_reason: FinishReason::Error, usage: total })
                        .await;
                    return;
                }
            },
        };

        if !emitter.send(StreamPart::StartStep { message_id: message_id() }).await {
            return;
        }

        let mut step_text = String::new();
        let mut finish: Option<(FinishReason, Usage)> = None;
        while let Some(item) = deltas.next().await {
            match item {
                Ok(StreamDelta::Text(text)) => {
                    step_text.push_str(&text);
                    if !emitter.text(text).await {
                        tracing::debug!(step, "client went away");
                        return;
                    }
                }
                Ok(StreamDelta::Finish { reason, usage }) => finish = Some((reason, usage)),
                Err(e) => {
                    tracing::warn!(step, error = %e, "provider stream failed");
                    if !emitter.flush().await || !emitter.send(StreamPart::Error(e.to_string())).await {
                        return;
                    }
                    finish = Some((FinishReason::Error, Usage::default()));
                    break;
                }
            }
        }
        if !emitter.flush().await {
            return;
        }

        let (reason, usage) = finish.unwrap_or_default();
        total += usage;
        let is_continued =
            reason == FinishReason::Length && step + 1 < max_steps && !step_text.is_empty();

        if !emitter
            .send(StreamPart::FinishStep { finish_reason: reason, usage, is_continued })
            .await
        {
            return;
        }

        if !is_continued {
            tracing::info!(
                provider = %model.provider(),
                model = model.model_id(),
                steps = step + 1,
                finish_reason = ?reason,
                prompt_tokens = total.prompt_tokens,
                completion_tokens = total.completion_tokens,
                "generation finished"
            );
            let _ = emitter
                .send(StreamPart::FinishMessage { finish_reason: reason, usage: total })
                .await;
            return;
        }

        tracing::debug!(step, chars = step_text.len(), "continuing after length finish");
        generated.push_str(&step_text);
        step_request = request.continued(&generated);
    }
}
