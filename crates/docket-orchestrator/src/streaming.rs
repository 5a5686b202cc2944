//! Streaming query orchestrator (C11): the pipeline a chat query runs
//! through end to end — safety guard, session/cache lookup, concurrent
//! engine fan-out, post-LLM policing, paced token emission, and best-effort
//! persistence. Mirrors `StreamingOrchestrator.process_streaming()` from the
//! original service: a single `mpsc` consumer sees TYPING, zero or more
//! ENGINE_COMPLETE events, a run of TOKEN events, then exactly one of
//! COMPLETE or ERROR.

use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;

use docket_core::config::{CacheConfig, OrchestratorConfig, SafetyConfig};
use docket_core::errors::{DocketError, DocketResult};
use docket_core::ids::{MatterId, UserId};
use docket_core::models::{MessageRole, QueryHistoryEntry};
use docket_core::traits::KV;

use crate::safety;

/// One source document/chunk cited in a query response. Engines populate
/// these; the orchestrator only threads them through to the COMPLETE event.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReference {
    pub document_id: String,
    pub excerpt: String,
    pub page_number: Option<u32>,
}

/// A sub-engine's contribution: prose context folded into the answer
/// prompt, any sources it found, and a count used for the ENGINE_COMPLETE
/// event's `findings_count` field.
#[derive(Debug, Clone, Default)]
pub struct EngineFindings {
    pub context: String,
    pub sources: Vec<SourceReference>,
    pub findings_count: u32,
    pub confidence: Option<f64>,
}

/// Per-engine timing and outcome, emitted as one ENGINE_COMPLETE event per
/// engine once the concurrent fan-out barrier completes.
#[derive(Debug, Clone, Serialize)]
pub struct EngineTrace {
    pub engine: String,
    pub execution_time_ms: u64,
    pub findings_count: u32,
    pub success: bool,
    pub error: Option<String>,
}

/// A single sub-engine consulted during query fan-out. Implementations are
/// supplied by the caller — this crate only runs the pipeline, it doesn't
/// know what a "hybrid search" or "timeline extractor" is.
#[async_trait::async_trait]
pub trait QueryEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, matter_id: MatterId, session_context: &str, query: &str) -> DocketResult<EngineFindings>;
}

/// The final payload of a successful streamed query.
#[derive(Debug, Clone, Serialize)]
pub struct CompleteEvent {
    pub response: String,
    pub sources: Vec<SourceReference>,
    pub engine_traces: Vec<EngineTrace>,
    pub total_time_ms: u64,
    pub confidence: f64,
    pub message_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    Typing,
    EngineComplete(EngineTrace),
    Token { token: String, accumulated: String },
    Complete(CompleteEvent),
    Error { code: String, message: String },
}

/// Everything the pipeline needs besides the per-call matter/user/query
/// triple. Borrowed, not owned — callers build this once per request from
/// their own application wiring.
pub struct QueryDeps<'a> {
    pub kv: &'a dyn KV,
    pub llm: &'a dyn docket_core::traits::Llm,
    pub engines: &'a [Box<dyn QueryEngine>],
    pub safety_config: &'a SafetyConfig,
    pub orchestrator_config: &'a OrchestratorConfig,
    pub cache_config: &'a CacheConfig,
    /// Enqueues a fire-and-forget evaluation job after `COMPLETE`. `None`
    /// disables the enqueue entirely (e.g. test harnesses with no broker
    /// wired up).
    pub broker: Option<&'a dyn docket_core::traits::Broker>,
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Sends an event; `Err` means the receiver was dropped, i.e. the caller
/// cancelled the stream. Every call site treats that as "stop now, persist
/// nothing" rather than an error to propagate.
async fn emit(sender: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> bool {
    sender.send(event).await.is_ok()
}

/// Runs one streaming query end to end, sending [`StreamEvent`]s to
/// `sender` as the pipeline progresses. Returns `Ok(())` whether the query
/// completed, was blocked, errored, or was cancelled by the receiver
/// dropping — the event stream itself is the result; this return value
/// only signals an unrecoverable failure to even start.
pub async fn run_query(deps: QueryDeps<'_>, matter_id: MatterId, user_id: UserId, query: String, sender: mpsc::Sender<StreamEvent>) -> DocketResult<()> {
    let started = Instant::now();

    if !emit(&sender, StreamEvent::Typing).await {
        return Ok(());
    }

    let check = safety::check_query(&query, deps.safety_config);
    if !check.is_safe {
        emit(
            &sender,
            StreamEvent::Error {
                code: "QUERY_BLOCKED".to_string(),
                message: check.explanation.unwrap_or_else(|| "query blocked by safety guard".to_string()),
            },
        )
        .await;
        return Ok(());
    }

    if query.trim().chars().count() < deps.orchestrator_config.min_query_len {
        emit(
            &sender,
            StreamEvent::Error {
                code: "INVALID_PARAMETER".to_string(),
                message: "query too short".to_string(),
            },
        )
        .await;
        return Ok(());
    }

    let mut session = docket_memory::session::get_or_create(deps.kv, matter_id, user_id).await?;
    docket_memory::session::add_message(deps.kv, &mut session, MessageRole::User, query.clone(), Vec::new(), &[], deps.cache_config).await?;

    let session_context = docket_memory::session::recent_context(&session)
        .iter()
        .map(|m| format!("{:?}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");

    let normalized = normalize(&query);
    let hash = docket_memory::query_hash(&normalized, &[]);
    let cached = docket_memory::query_cache::get(deps.kv, matter_id, &hash).await?;

    let (response, sources, traces, confidence) = match cached {
        Some(hit) => {
            let sources: Vec<SourceReference> = serde_json::from_value(hit.response_data.get("sources").cloned().unwrap_or_default()).unwrap_or_default();
            (hit.result_summary, sources, Vec::new(), hit.confidence)
        }
        None => {
            let outcomes = run_engines(deps.engines, matter_id, &session_context, &query).await;

            let mut traces = Vec::with_capacity(outcomes.len());
            let mut context_parts = Vec::new();
            let mut sources = Vec::new();
            let mut confidences = Vec::new();

            for (name, elapsed_ms, result) in outcomes {
                let trace = match &result {
                    Ok(findings) => EngineTrace {
                        engine: name.clone(),
                        execution_time_ms: elapsed_ms,
                        findings_count: findings.findings_count,
                        success: true,
                        error: None,
                    },
                    Err(e) => EngineTrace {
                        engine: name.clone(),
                        execution_time_ms: elapsed_ms,
                        findings_count: 0,
                        success: false,
                        error: Some(e.to_string()),
                    },
                };

                if !emit(&sender, StreamEvent::EngineComplete(trace.clone())).await {
                    return Ok(());
                }
                traces.push(trace);

                if let Ok(findings) = result {
                    if !findings.context.is_empty() {
                        context_parts.push(findings.context);
                    }
                    sources.extend(findings.sources);
                    if let Some(c) = findings.confidence {
                        confidences.push(c);
                    }
                }
            }

            let prompt = build_prompt(&session_context, &query, &context_parts);
            let llm_response = deps.llm.complete(docket_core::traits::LlmRequest::new(prompt)).await?;
            let policed = safety::police_text(&llm_response.text, deps.safety_config);

            let confidence = if confidences.is_empty() {
                75.0
            } else {
                confidences.iter().sum::<f64>() / confidences.len() as f64
            };

            let cache_entry = docket_memory::query_cache::build_result(
                matter_id,
                query.clone(),
                normalized.clone(),
                policed.sanitized_text.clone(),
                deps.engines.iter().map(|e| e.name().to_string()).collect::<Vec<_>>().join(","),
                traces.iter().map(|t| t.findings_count).sum(),
                confidence,
                serde_json::json!({ "sources": sources }),
                deps.cache_config,
            );
            if let Err(e) = docket_memory::query_cache::put(deps.kv, &cache_entry, deps.cache_config).await {
                tracing::warn!(error = %e, "failed to cache query result");
            }

            (policed.sanitized_text, sources, traces, confidence)
        }
    };

    if !stream_tokens(&sender, &response, deps.orchestrator_config).await {
        return Ok(());
    }

    docket_memory::session::add_message(deps.kv, &mut session, MessageRole::Assistant, response.clone(), Vec::new(), &[], deps.cache_config)
        .await
        .unwrap_or_else(|e| tracing::warn!(error = %e, "failed to save assistant response to session"));

    let history_entry = QueryHistoryEntry {
        matter_id,
        query: query.clone(),
        engines_used: deps.engines.iter().map(|e| e.name().to_string()).collect(),
        confidence,
        prompt_tokens: 0,
        completion_tokens: 0,
        attorney_verified: false,
        created_at: Utc::now(),
    };
    if let Err(e) = docket_memory::query_history::append(deps.kv, matter_id, history_entry).await {
        tracing::warn!(error = %e, "failed to append query history");
    }

    let message_id = docket_core::ids::SessionId::new().to_string();
    emit(
        &sender,
        StreamEvent::Complete(CompleteEvent {
            response,
            sources,
            engine_traces: traces,
            total_time_ms: started.elapsed().as_millis() as u64,
            confidence,
            message_id: message_id.clone(),
        }),
    )
    .await;

    enqueue_evaluation(deps.broker, matter_id, &query, &message_id).await;

    Ok(())
}

/// Fire-and-forget evaluation enqueue after a completed response.
/// Best-effort: a missing broker or a publish failure is logged, never
/// surfaced to the caller — the response has already been streamed.
async fn enqueue_evaluation(broker: Option<&dyn docket_core::traits::Broker>, matter_id: MatterId, query: &str, message_id: &str) {
    let Some(broker) = broker else { return };
    let result = broker
        .publish(docket_core::traits::BrokerMessage {
            topic: "evaluation".to_string(),
            payload: serde_json::json!({ "matter_id": matter_id, "query": query, "message_id": message_id }),
        })
        .await;
    if let Err(e) = result {
        tracing::warn!(error = %e, "failed to enqueue evaluation job");
    }
}

/// Runs every engine concurrently on one scheduling context (`join_all`,
/// never a per-engine spawn) and returns `(name, elapsed_ms, result)` in
/// engine list order. A single engine's failure never aborts the others —
/// it surfaces as a failed [`EngineTrace`] instead.
async fn run_engines(engines: &[Box<dyn QueryEngine>], matter_id: MatterId, session_context: &str, query: &str) -> Vec<(String, u64, DocketResult<EngineFindings>)> {
    let futures = engines.iter().map(|engine| async move {
        let start = Instant::now();
        let result = engine.run(matter_id, session_context, query).await;
        (engine.name().to_string(), start.elapsed().as_millis() as u64, result)
    });
    futures::future::join_all(futures).await
}

fn build_prompt(session_context: &str, query: &str, context_parts: &[String]) -> String {
    let mut prompt = String::new();
    if !session_context.is_empty() {
        prompt.push_str("Conversation so far:\n");
        prompt.push_str(session_context);
        prompt.push_str("\n\n");
    }
    if !context_parts.is_empty() {
        prompt.push_str("Retrieved context:\n");
        prompt.push_str(&context_parts.join("\n---\n"));
        prompt.push_str("\n\n");
    }
    prompt.push_str("Question: ");
    prompt.push_str(query);
    prompt
}

/// Re-batches an already-generated response into fixed-size chunks, pacing
/// emission by `token_batch_delay_ms`. Returns `false` as soon as the
/// receiver is dropped so the caller can stop without further work.
async fn stream_tokens(sender: &mpsc::Sender<StreamEvent>, text: &str, config: &OrchestratorConfig) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let mut accumulated = String::new();

    for chunk in chars.chunks(config.token_batch_chars.max(1)) {
        let token: String = chunk.iter().collect();
        accumulated.push_str(&token);

        if !emit(
            sender,
            StreamEvent::Token {
                token,
                accumulated: accumulated.clone(),
            },
        )
        .await
        {
            return false;
        }

        if config.token_batch_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(config.token_batch_delay_ms)).await;
        }
    }

    true
}

impl From<DocketError> for StreamEvent {
    fn from(e: DocketError) -> Self {
        StreamEvent::Error {
            code: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_storage::InMemoryKv;

    struct StaticEngine {
        name: &'static str,
        findings: EngineFindings,
    }

    #[async_trait::async_trait]
    impl QueryEngine for StaticEngine {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, _matter_id: MatterId, _session_context: &str, _query: &str) -> DocketResult<EngineFindings> {
            Ok(self.findings.clone())
        }
    }

    struct FailingEngine;

    #[async_trait::async_trait]
    impl QueryEngine for FailingEngine {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn run(&self, _matter_id: MatterId, _session_context: &str, _query: &str) -> DocketResult<EngineFindings> {
            Err(DocketError::SearchFailed { message: "boom".to_string() })
        }
    }

    struct EchoLlm;

    #[async_trait::async_trait]
    impl docket_core::traits::Llm for EchoLlm {
        async fn complete(&self, request: docket_core::traits::LlmRequest) -> DocketResult<docket_core::traits::LlmResponse> {
            Ok(docket_core::traits::LlmResponse {
                text: format!("answer to: {}", request.prompt.lines().last().unwrap_or("")),
                prompt_tokens: 10,
                completion_tokens: 10,
            })
        }

        async fn stream(&self, _request: docket_core::traits::LlmRequest) -> DocketResult<futures::stream::BoxStream<'static, DocketResult<String>>> {
            unimplemented!("not used by the orchestrator, which batches complete() output itself")
        }
    }

    fn test_configs() -> (SafetyConfig, OrchestratorConfig, CacheConfig) {
        let mut orch = OrchestratorConfig::default();
        orch.token_batch_delay_ms = 0;
        (SafetyConfig::default(), orch, CacheConfig::default())
    }

    #[tokio::test]
    async fn blocked_query_emits_typing_then_error_and_nothing_else() {
        let kv = InMemoryKv::default();
        let llm = EchoLlm;
        let engines: Vec<Box<dyn QueryEngine>> = Vec::new();
        let (safety_config, orchestrator_config, cache_config) = test_configs();
        let deps = QueryDeps {
            kv: &kv,
            llm: &llm,
            engines: &engines,
            safety_config: &safety_config,
            orchestrator_config: &orchestrator_config,
            cache_config: &cache_config,
            broker: None,
        };

        let (tx, mut rx) = mpsc::channel(32);
        run_query(deps, MatterId::new(), UserId::new(), "should I file an appeal".to_string(), tx).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, StreamEvent::Typing));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second, StreamEvent::Error { ref code, .. } if code == "QUERY_BLOCKED"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn query_below_min_length_emits_error_without_running_engines() {
        let kv = InMemoryKv::default();
        let llm = EchoLlm;
        let engines: Vec<Box<dyn QueryEngine>> = vec![Box::new(FailingEngine)];
        let (safety_config, orchestrator_config, cache_config) = test_configs();
        let deps = QueryDeps {
            kv: &kv,
            llm: &llm,
            engines: &engines,
            safety_config: &safety_config,
            orchestrator_config: &orchestrator_config,
            cache_config: &cache_config,
            broker: None,
        };

        let (tx, mut rx) = mpsc::channel(32);
        run_query(deps, MatterId::new(), UserId::new(), "q".to_string(), tx).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, StreamEvent::Typing));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second, StreamEvent::Error { ref code, .. } if code == "INVALID_PARAMETER"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn safe_query_streams_tokens_matching_final_response_and_completes() {
        let kv = InMemoryKv::default();
        let llm = EchoLlm;
        let engines: Vec<Box<dyn QueryEngine>> = vec![Box::new(StaticEngine {
            name: "hybrid_search",
            findings: EngineFindings {
                context: "the lease terminates in 2027".to_string(),
                sources: vec![SourceReference {
                    document_id: "doc-1".to_string(),
                    excerpt: "terminates in 2027".to_string(),
                    page_number: Some(4),
                }],
                findings_count: 1,
                confidence: Some(90.0),
            },
        })];
        let (safety_config, orchestrator_config, cache_config) = test_configs();
        let deps = QueryDeps {
            kv: &kv,
            llm: &llm,
            engines: &engines,
            safety_config: &safety_config,
            orchestrator_config: &orchestrator_config,
            cache_config: &cache_config,
            broker: None,
        };

        let (tx, mut rx) = mpsc::channel(64);
        run_query(deps, MatterId::new(), UserId::new(), "when does the lease terminate".to_string(), tx).await.unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert!(matches!(events[0], StreamEvent::Typing));
        assert!(matches!(events[1], StreamEvent::EngineComplete(ref t) if t.engine == "hybrid_search" && t.success));

        let mut accumulated = String::new();
        let mut saw_complete = false;
        for event in &events[2..] {
            match event {
                StreamEvent::Token { accumulated: acc, .. } => accumulated = acc.clone(),
                StreamEvent::Complete(complete) => {
                    assert_eq!(complete.response, accumulated);
                    assert_eq!(complete.sources.len(), 1);
                    assert_eq!(complete.confidence, 90.0);
                    saw_complete = true;
                }
                other => panic!("unexpected event after engine trace: {other:?}"),
            }
        }
        assert!(saw_complete);
    }

    #[tokio::test]
    async fn failing_engine_still_reaches_complete() {
        let kv = InMemoryKv::default();
        let llm = EchoLlm;
        let engines: Vec<Box<dyn QueryEngine>> = vec![Box::new(FailingEngine)];
        let (safety_config, orchestrator_config, cache_config) = test_configs();
        let deps = QueryDeps {
            kv: &kv,
            llm: &llm,
            engines: &engines,
            safety_config: &safety_config,
            orchestrator_config: &orchestrator_config,
            cache_config: &cache_config,
            broker: None,
        };

        let (tx, mut rx) = mpsc::channel(64);
        run_query(deps, MatterId::new(), UserId::new(), "who are the parties".to_string(), tx).await.unwrap();

        let mut saw_failed_trace = false;
        let mut saw_complete = false;
        while let Some(event) = rx.recv().await {
            match event {
                StreamEvent::EngineComplete(t) if !t.success => saw_failed_trace = true,
                StreamEvent::Complete(_) => saw_complete = true,
                _ => {}
            }
        }
        assert!(saw_failed_trace);
        assert!(saw_complete);
    }

    #[tokio::test]
    async fn dropping_receiver_stops_pipeline_without_panicking() {
        let kv = InMemoryKv::default();
        let llm = EchoLlm;
        let engines: Vec<Box<dyn QueryEngine>> = Vec::new();
        let (safety_config, orchestrator_config, cache_config) = test_configs();
        let deps = QueryDeps {
            kv: &kv,
            llm: &llm,
            engines: &engines,
            safety_config: &safety_config,
            orchestrator_config: &orchestrator_config,
            cache_config: &cache_config,
            broker: None,
        };

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        run_query(deps, MatterId::new(), UserId::new(), "what is the termination clause".to_string(), tx).await.unwrap();
    }
}
