use crate::*;
use crate::gemini::{GeminiChat, GeminiEventParser};
use crate::openai::{OpenAiChat, OpenAiEventParser};
use crate::smooth::WordSmoother;
use crate::sse::{delta_stream, EventParser, SseDecoder};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tx_core::types::{Role, WireMessage};

/// Model that replays scripted steps and records the requests it saw.
struct ScriptedModel {
    steps: Mutex<VecDeque<Result<Vec<Result<StreamDelta>>>>>,
    seen: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    fn new(steps: Vec<Result<Vec<Result<StreamDelta>>>>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn stream(&self, request: ChatRequest) -> Result<DeltaStream> {
        self.seen.lock().unwrap().push(request);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted step left")?;
        Ok(Box::pin(stream::iter(step)))
    }
}

fn text(s: &str) -> Result<StreamDelta> {
    Ok(StreamDelta::Text(s.to_string()))
}

fn finish(reason: FinishReason, prompt: u64, completion: u64) -> Result<StreamDelta> {
    Ok(StreamDelta::Finish {
        reason,
        usage: Usage { prompt_tokens: prompt, completion_tokens: completion },
    })
}

fn joined_text(parts: &[StreamPart]) -> String {
    parts
        .iter()
        .filter_map(|p| match p {
            StreamPart::Text(t) => Some(t.as_str()),
            _ => None,
        })
        .collect()
}

fn codes(parts: &[StreamPart]) -> String {
    let mut out = String::new();
    let mut last_text = false;
    for p in parts {
        let is_text = matches!(p, StreamPart::Text(_));
        if !(is_text && last_text) {
            out.push(p.code());
        }
        last_text = is_text;
    }
    out
}

// ========== Registry ==========

#[test]
fn test_resolve_known_models() {
    let spec = resolve_model("gpt-4o-mini").unwrap();
    assert_eq!(spec.provider, Provider::OpenAi);
    assert_eq!(spec.model_id, "gpt-4o-mini");

    let spec = resolve_model("gemini-flash-1.5").unwrap();
    assert_eq!(spec.provider, Provider::Google);
    assert_eq!(spec.model_id, "gemini-1.5-flash-latest");

    assert_eq!(resolve_model("gemini-flash-2.0").unwrap().model_id, "gemini-2.0-flash-exp");
}

#[test]
fn test_resolve_unknown_model() {
    let err = resolve_model("gpt-5").unwrap_err();
    assert!(matches!(err, LlmError::InvalidModel(ref v) if v == "gpt-5"));
}

#[test]
fn test_model_values_match_form() {
    let values: Vec<_> = registry::model_values().collect();
    assert_eq!(values, tx_core::types::MODEL_VALUES.to_vec());
}

#[test]
fn test_http_provider_requires_key() {
    let provider = HttpModelProvider::new(Default::default()).unwrap();
    let err = provider
        .language_model(&resolve_model("gemini-flash-2.0").unwrap())
        .err()
        .unwrap();
    assert!(matches!(err, LlmError::MissingApiKey { provider: Provider::Google, .. }));
    assert!(err.to_string().contains("GOOGLE_GENERATIVE_AI_API_KEY"));
}

#[test]
fn test_http_provider_builds_model() {
    let mut cfg = tx_core::config::ProvidersConfig::default();
    cfg.openai.api_key = Some("sk-test".into());
    let provider = HttpModelProvider::new(cfg).unwrap();
    let model = provider.language_model(&resolve_model("gpt-4o-mini").unwrap()).unwrap();
    assert_eq!(model.provider(), Provider::OpenAi);
    assert_eq!(model.model_id(), "gpt-4o-mini");
}

// ========== Messages ==========

#[test]
fn test_from_wire_filters() {
    let wire = vec![
        WireMessage { id: None, role: "assistant".into(), content: "Hello!".into() },
        WireMessage { id: Some("1".into()), role: "user".into(), content: "Q".into() },
        WireMessage { id: None, role: "data".into(), content: "x".into() },
        WireMessage { id: None, role: "user".into(), content: "  ".into() },
    ];
    let msgs = ChatMessage::from_wire(&wire);
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0].role, Role::Assistant);
    assert_eq!(msgs[1], ChatMessage::user("Q"));
}

#[test]
fn test_request_continued() {
    let req = ChatRequest::new("sys").with_message(ChatMessage::user("book"));
    let next = req.continued("1. Part");
    assert_eq!(next.system.as_deref(), Some("sys"));
    assert_eq!(next.messages.len(), 2);
    assert_eq!(next.messages[1], ChatMessage::assistant("1. Part"));
    assert_eq!(req.messages.len(), 1);
}

#[test]
fn test_usage_add() {
    let mut u = Usage { prompt_tokens: 1, completion_tokens: 2 };
    u += Usage { prompt_tokens: 10, completion_tokens: 20 };
    assert_eq!(u, Usage { prompt_tokens: 11, completion_tokens: 22 });
}

// ========== SSE ==========

#[test]
fn test_sse_split_across_chunks() {
    let mut d = SseDecoder::new();
    assert!(d.push(b"data: {\"a\"").is_empty());
    assert!(d.push(b":1}\n").is_empty());
    assert_eq!(d.push(b"\n"), vec!["{\"a\":1}".to_string()]);
}

#[test]
fn test_sse_crlf_and_comments() {
    let mut d = SseDecoder::new();
    let events = d.push(b": keep-alive\r\nevent: message\r\ndata: one\r\n\r\ndata: two\r\n\r\n");
    assert_eq!(events, vec!["one".to_string(), "two".to_string()]);
}

#[test]
fn test_sse_multiline_data() {
    let mut d = SseDecoder::new();
    let events = d.push(b"data: first\ndata:second\n\n");
    assert_eq!(events, vec!["first\nsecond".to_string()]);
}

#[test]
fn test_sse_finish_flushes() {
    let mut d = SseDecoder::new();
    assert!(d.push(b"data: tail").is_empty());
    assert_eq!(d.finish(), vec!["tail".to_string()]);
    assert!(d.finish().is_empty());
}

#[test]
fn test_sse_split_utf8() {
    let mut d = SseDecoder::new();
    let bytes = "data: é\n\n".as_bytes();
    let (a, b) = bytes.split_at(7);
    assert!(d.push(a).is_empty());
    assert_eq!(d.push(b), vec!["é".to_string()]);
}

// ========== OpenAI ==========

#[test]
fn test_openai_request_body() {
    let chat = OpenAiChat::new(reqwest::Client::new(), "http://x", "k", "gpt-4o-mini");
    let req = ChatRequest::new("SYS").with_message(ChatMessage::user("hi"));
    let body = chat.request_body(&req);
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["stream"], true);
    assert_eq!(body["stream_options"]["include_usage"], true);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "SYS");
    assert_eq!(body["messages"][1]["role"], "user");
}

#[test]
fn test_openai_parser_text_and_finish() {
    let mut p = OpenAiEventParser::default();
    let d = p
        .on_event(r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":"Hel"},"finish_reason":null}]}"#)
        .unwrap();
    assert_eq!(d, vec![StreamDelta::Text("Hel".into())]);

    let d = p
        .on_event(r#"{"choices":[{"index":0,"delta":{},"finish_reason":"length"}]}"#)
        .unwrap();
    assert!(d.is_empty());

    let d = p
        .on_event(r#"{"choices":[],"usage":{"prompt_tokens":7,"completion_tokens":3,"total_tokens":10}}"#)
        .unwrap();
    assert!(d.is_empty());

    let d = p.on_event("[DONE]").unwrap();
    assert_eq!(
        d,
        vec![StreamDelta::Finish {
            reason: FinishReason::Length,
            usage: Usage { prompt_tokens: 7, completion_tokens: 3 },
        }]
    );
    assert!(p.on_end().is_empty());
}

#[test]
fn test_openai_parser_end_without_done() {
    let mut p = OpenAiEventParser::default();
    p.on_event(r#"{"choices":[{"delta":{"content":"x"},"finish_reason":"stop"}]}"#).unwrap();
    assert_eq!(
        p.on_end(),
        vec![StreamDelta::Finish { reason: FinishReason::Stop, usage: Usage::default() }]
    );
}

#[test]
fn test_openai_parser_error_event() {
    let mut p = OpenAiEventParser::default();
    let err = p.on_event(r#"{"error":{"message":"Rate limit reached"}}"#).unwrap_err();
    assert!(matches!(err, LlmError::Upstream { ref message, .. } if message == "Rate limit reached"));
}

#[test]
fn test_openai_parser_bad_json() {
    let mut p = OpenAiEventParser::default();
    assert!(matches!(p.on_event("{not json"), Err(LlmError::Parse { .. })));
}

// ========== Gemini ==========

#[test]
fn test_gemini_request_body() {
    let chat = GeminiChat::new(reqwest::Client::new(), "http://x", "k", "gemini-2.0-flash-exp");
    let req = ChatRequest::new("SYS").with_messages([
        ChatMessage::assistant("Hello!"),
        ChatMessage::new(Role::System, "extra"),
        ChatMessage::user("Q"),
    ]);
    let body = chat.request_body(&req);
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "SYS");
    assert_eq!(body["systemInstruction"]["parts"][1]["text"], "extra");
    assert_eq!(body["contents"][0]["role"], "model");
    assert_eq!(body["contents"][1]["role"], "user");
    assert_eq!(body["contents"][1]["parts"][0]["text"], "Q");
    assert_eq!(body["contents"].as_array().unwrap().len(), 2);
}

#[test]
fn test_gemini_request_without_system() {
    let chat = GeminiChat::new(reqwest::Client::new(), "http://x", "k", "m");
    let req = ChatRequest::default().with_message(ChatMessage::user("Q"));
    assert!(chat.request_body(&req).get("systemInstruction").is_none());
}

#[test]
fn test_gemini_parser() {
    let mut p = GeminiEventParser::default();
    let d = p
        .on_event(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"1. "},{"text":"World"}]}}],"usageMetadata":{"promptTokenCount":5,"candidatesTokenCount":1}}"#)
        .unwrap();
    assert_eq!(d, vec![StreamDelta::Text("1. World".into())]);

    let d = p
        .on_event(r#"{"candidates":[{"content":{"parts":[{"text":"!"}]},"finishReason":"MAX_TOKENS"}],"usageMetadata":{"promptTokenCount":5,"candidatesTokenCount":9}}"#)
        .unwrap();
    assert_eq!(d, vec![StreamDelta::Text("!".into())]);

    assert_eq!(
        p.on_end(),
        vec![StreamDelta::Finish {
            reason: FinishReason::Length,
            usage: Usage { prompt_tokens: 5, completion_tokens: 9 },
        }]
    );
}

#[test]
fn test_gemini_blocked_prompt() {
    let mut p = GeminiEventParser::default();
    let d = p.on_event(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
    assert!(d.is_empty());
    assert!(matches!(
        p.on_end()[0],
        StreamDelta::Finish { reason: FinishReason::ContentFilter, .. }
    ));
}

// ========== Delta Stream ==========

#[tokio::test]
async fn test_delta_stream_over_chunks() {
    let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\nda")),
        Ok(Bytes::from_static(b"ta: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n")),
        Ok(Bytes::from_static(b"data: [DONE]\n\n")),
    ];
    let deltas: Vec<_> = delta_stream(stream::iter(chunks), Provider::OpenAi, OpenAiEventParser::default())
        .collect()
        .await;
    assert_eq!(deltas.len(), 2);
    assert_eq!(deltas[0].as_ref().unwrap(), &StreamDelta::Text("Hi".into()));
    assert!(matches!(
        deltas[1].as_ref().unwrap(),
        StreamDelta::Finish { reason: FinishReason::Stop, .. }
    ));
}

#[tokio::test]
async fn test_delta_stream_transport_error() {
    let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n")),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
    ];
    let deltas: Vec<_> = delta_stream(stream::iter(chunks), Provider::OpenAi, OpenAiEventParser::default())
        .collect()
        .await;
    assert_eq!(deltas.len(), 2);
    assert!(matches!(deltas[1], Err(LlmError::Request { .. })));
}

// ========== Smoothing ==========

#[test]
fn test_smoother_words() {
    let mut s = WordSmoother::new();
    assert_eq!(s.push("The wor"), vec!["The ".to_string()]);
    assert!(s.push("ld").is_empty());
    assert_eq!(s.push(" is\n\n1.1 "), vec!["world ".to_string(), "is\n\n".to_string(), "1.1 ".to_string()]);
    assert_eq!(s.flush(), None);
}

#[test]
fn test_smoother_leading_whitespace_and_flush() {
    let mut s = WordSmoother::new();
    assert_eq!(s.push("  hi there"), vec!["  hi ".to_string()]);
    assert_eq!(s.flush(), Some("there".to_string()));
    assert_eq!(s.flush(), None);
}

// ========== Protocol ==========

#[test]
fn test_encode_text() {
    assert_eq!(StreamPart::Text("Hello \"world\"\n".into()).encode(), "0:\"Hello \\\"world\\\"\\n\"\n");
}

#[test]
fn test_encode_error() {
    assert_eq!(StreamPart::Error("boom".into()).encode(), "3:\"boom\"\n");
}

#[test]
fn test_encode_finish_parts() {
    let usage = Usage { prompt_tokens: 1, completion_tokens: 2 };
    assert_eq!(
        StreamPart::FinishMessage { finish_reason: FinishReason::Stop, usage }.encode(),
        "d:{\"finishReason\":\"stop\",\"usage\":{\"promptTokens\":1,\"completionTokens\":2}}\n"
    );
    assert_eq!(
        StreamPart::FinishStep { finish_reason: FinishReason::ContentFilter, usage, is_continued: false }.encode(),
        "e:{\"finishReason\":\"content-filter\",\"usage\":{\"promptTokens\":1,\"completionTokens\":2},\"isContinued\":false}\n"
    );
    assert_eq!(
        StreamPart::StartStep { message_id: "msg-1".into() }.encode(),
        "f:{\"messageId\":\"msg-1\"}\n"
    );
}

#[test]
fn test_decode_parts() {
    assert_eq!(StreamPart::decode("0:\"a:b\"\n").unwrap(), StreamPart::Text("a:b".into()));
    let part = StreamPart::decode("e:{\"finishReason\":\"length\",\"usage\":{\"promptTokens\":3,\"completionTokens\":4},\"isContinued\":true}").unwrap();
    assert_eq!(
        part,
        StreamPart::FinishStep {
            finish_reason: FinishReason::Length,
            usage: Usage { prompt_tokens: 3, completion_tokens: 4 },
            is_continued: true,
        }
    );
}

#[test]
fn test_decode_rejects_malformed() {
    assert!(matches!(StreamPart::decode("no-colon"), Err(LlmError::Protocol(_))));
    assert!(matches!(StreamPart::decode("9:\"x\""), Err(LlmError::Protocol(_))));
    assert!(matches!(StreamPart::decode("0:not-json"), Err(LlmError::Protocol(_))));
}

#[test]
fn test_part_decoder_split_lines() {
    let mut d = PartDecoder::new();
    assert!(d.push(b"0:\"He").is_empty());
    let parts = d.push(b"llo\"\n3:\"bad\"\n0:\"x\"");
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].as_ref().unwrap(), &StreamPart::Text("Hello".into()));
    assert_eq!(parts[1].as_ref().unwrap(), &StreamPart::Error("bad".into()));
    assert_eq!(d.finish().unwrap().unwrap(), StreamPart::Text("x".into()));
    assert!(d.finish().is_none());
}

#[test]
fn test_part_decoder_finish_truncated_line() {
    let mut d = PartDecoder::new();
    assert!(d.push(b"0:\"x").is_empty());
    assert!(d.finish().unwrap().is_err());
    assert!(d.finish().is_none());
}

// ========== Steps ==========

#[tokio::test]
async fn test_single_step_passthrough() {
    let model = ScriptedModel::new(vec![Ok(vec![
        text("1. The world"),
        text(" is all that is the case."),
        finish(FinishReason::Stop, 10, 5),
    ])]);
    let parts: Vec<_> = stream_generation(model.clone(), ChatRequest::new("sys"), StepOptions::default())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(codes(&parts), "f0ed");
    assert_eq!(joined_text(&parts), "1. The world is all that is the case.");
    assert_eq!(
        parts.last().unwrap(),
        &StreamPart::FinishMessage {
            finish_reason: FinishReason::Stop,
            usage: Usage { prompt_tokens: 10, completion_tokens: 5 },
        }
    );
}

#[tokio::test]
async fn test_smoothing_rechunks_words() {
    let model = ScriptedModel::new(vec![Ok(vec![
        text("Whereof one can"),
        text("not speak"),
        finish(FinishReason::Stop, 1, 1),
    ])]);
    let options = StepOptions { max_steps: 1, smooth_delay: Some(Duration::ZERO) };
    let parts: Vec<_> = stream_generation(model, ChatRequest::new("sys"), options)
        .await
        .unwrap()
        .collect()
        .await;

    let texts: Vec<_> = parts
        .iter()
        .filter_map(|p| match p {
            StreamPart::Text(t) => Some(t.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["Whereof ", "one ", "cannot ", "speak"]);
}

#[tokio::test]
async fn test_continuation_after_length() {
    let model = ScriptedModel::new(vec![
        Ok(vec![text("1. First"), finish(FinishReason::Length, 10, 100)]),
        Ok(vec![text(" 2. Second"), finish(FinishReason::Stop, 12, 20)]),
    ]);
    let request = ChatRequest::new("sys").with_message(ChatMessage::user("book"));
    let options = StepOptions { max_steps: 3, smooth_delay: None };
    let parts: Vec<_> = stream_generation(model.clone(), request, options)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(codes(&parts), "f0ef0ed");
    assert_eq!(joined_text(&parts), "1. First 2. Second");
    assert!(parts.contains(&StreamPart::FinishStep {
        finish_reason: FinishReason::Length,
        usage: Usage { prompt_tokens: 10, completion_tokens: 100 },
        is_continued: true,
    }));
    assert_eq!(
        parts.last().unwrap(),
        &StreamPart::FinishMessage {
            finish_reason: FinishReason::Stop,
            usage: Usage { prompt_tokens: 22, completion_tokens: 120 },
        }
    );

    let seen = model.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].messages.last().unwrap(), &ChatMessage::assistant("1. First"));
}

#[tokio::test]
async fn test_length_without_budget_stops() {
    let model = ScriptedModel::new(vec![Ok(vec![text("partial"), finish(FinishReason::Length, 1, 1)])]);
    let parts: Vec<_> = stream_generation(model.clone(), ChatRequest::new("s"), StepOptions::default())
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(codes(&parts), "f0ed");
    assert!(matches!(
        parts.last().unwrap(),
        StreamPart::FinishMessage { finish_reason: FinishReason::Length, .. }
    ));
    assert_eq!(model.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_mid_stream_error_becomes_part() {
    let model = ScriptedModel::new(vec![Ok(vec![
        text("1. Start"),
        Err(LlmError::Upstream { provider: Provider::OpenAi, message: "overloaded".into() }),
    ])]);
    let parts: Vec<_> = stream_generation(model, ChatRequest::new("s"), StepOptions::default())
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(codes(&parts), "f03ed");
    assert!(matches!(&parts[2], StreamPart::Error(m) if m.contains("overloaded")));
    assert!(matches!(
        parts.last().unwrap(),
        StreamPart::FinishMessage { finish_reason: FinishReason::Error, .. }
    ));
}

#[tokio::test]
async fn test_open_failure_is_error() {
    let model = ScriptedModel::new(vec![Err(LlmError::Status {
        provider: Provider::OpenAi,
        status: 401,
        body: "invalid api key".into(),
    })]);
    let result = stream_generation(model, ChatRequest::new("s"), StepOptions::default()).await;
    assert!(matches!(result, Err(LlmError::Status { status: 401, .. })));
}

#[tokio::test]
async fn test_continuation_open_failure() {
    let model = ScriptedModel::new(vec![
        Ok(vec![text("a"), finish(FinishReason::Length, 1, 1)]),
        Err(LlmError::Request { provider: Provider::OpenAi, message: "timeout".into() }),
    ]);
    let options = StepOptions { max_steps: 2, smooth_delay: None };
    let parts: Vec<_> = stream_generation(model, ChatRequest::new("s"), options)
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(codes(&parts), "f0e3d");
}
