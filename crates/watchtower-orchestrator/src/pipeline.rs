//! Per-tick pipeline (spec.md §4.9): poll, then for each known agent,
//! fetch its card, derive signals, score, and append a transparency leaf.
//! Per-agent failures are isolated and never abort the tick; a failure
//! that won't self-heal (anything but `ErrorKind::TransientIo`) also
//! becomes a `PIPELINE_ERROR` alert.

use crate::config::OrchestratorConfig;
use tracing::{error, info, warn};
use watchtower_crypto::{canonical_json, sha256_hex, Signer};
use watchtower_db::Store;
use watchtower_fetcher::dns::DnsResolver;
use watchtower_fetcher::{fetch_agent_card, FetchOptions};
use watchtower_poller::source::EventSource;
use watchtower_poller::{poll_once, PollOutcome, PollerConfig};
use watchtower_scoring::{score, ScoringInput};
use watchtower_signals::identity::{derive_identity_signals, IdentitySignalInput};
use watchtower_types::{Alert, ErrorKind, Evidence, IdentitySnapshot, Severity, Signal, Snapshot};

#[derive(Debug, Default)]
pub struct TickReport {
    pub poll_outcome: Option<String>,
    pub agents_processed: usize,
    pub pipeline_errors: usize,
}

/// Runs one full tick: poll, then walk every known agent through
/// fetch → derive → score → persist → append-leaf, in sorted `agentId`
/// order (spec.md §5's ordering guarantee).
pub async fn run_tick(
    store: &Store,
    source: &dyn EventSource,
    resolver: &dyn DnsResolver,
    signer: &impl Signer,
    config: &OrchestratorConfig,
    now: i64,
) -> TickReport {
    let mut report = TickReport::default();

    let poller_config = PollerConfig {
        chain_id: config.pipeline.chain_id as u64,
        registry_addr: config.pipeline.registry_address.clone(),
        start_block: config.pipeline.start_block,
        batch_size: config.pipeline.batch_size,
        confirmations: config.pipeline.confirmations,
        overlap_blocks: config.pipeline.overlap_blocks,
    };

    match poll_once(store, source, &poller_config, now).await {
        Ok(PollOutcome::Skipped) => {
            report.poll_outcome = Some("skipped".to_string());
        }
        Ok(PollOutcome::Ingested { from, to, event_count }) => {
            info!(from, to, event_count, "poll tick ingested events");
            report.poll_outcome = Some(format!("ingested {event_count} events [{from},{to}]"));
        }
        Err(e) => {
            let kind = e.kind();
            error!(error = %e, ?kind, "poll tick failed; continuing with previously-known agents");
            report.poll_outcome = Some(format!("error: {e}"));
            if kind.is_fatal_at_startup() {
                error!("storage is corrupt or misconfigured; aborting tick before touching any agent");
                return report;
            }
        }
    }

    let known_agents = match store.list_known_agent_ids(config.pipeline.chain_id as u64, &config.pipeline.registry_address).await {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = %e, kind = ?e.kind(), "failed to list known agents; tick produces no per-agent work");
            return report;
        }
    };

    for agent_id in known_agents {
        match process_agent(store, resolver, signer, config, &agent_id, now).await {
            Ok(()) => report.agents_processed += 1,
            Err(e) => {
                let kind = e.kind();
                warn!(agent_id = %agent_id, error = %e, ?kind, "pipeline error isolated for agent");
                report.pipeline_errors += 1;
                // A transient I/O blip is expected to clear on its own next
                // tick; only alert on errors that won't self-heal.
                if kind != ErrorKind::TransientIo {
                    emit_pipeline_error_alert(store, &agent_id, &e.to_string(), now).await;
                }
            }
        }
    }

    report
}

#[derive(Debug, thiserror::Error)]
enum AgentPipelineError {
    /// The roster (`agents`) lists this agent but `identity_events` has
    /// no row for it — the two tables are only ever written together by
    /// `append_event`, so this is a storage inconsistency, not a blip
    /// that clears on retry.
    #[error("agent not found in roster")]
    AgentNotFound,
    #[error(transparent)]
    Db(#[from] watchtower_db::DbError),
    #[error(transparent)]
    TransLog(#[from] watchtower_translog::TransLogError),
}

impl AgentPipelineError {
    fn kind(&self) -> ErrorKind {
        match self {
            AgentPipelineError::AgentNotFound => ErrorKind::Integrity,
            AgentPipelineError::Db(e) => e.kind(),
            AgentPipelineError::TransLog(e) => e.kind(),
        }
    }
}

async fn process_agent(
    store: &Store,
    resolver: &dyn DnsResolver,
    signer: &impl Signer,
    config: &OrchestratorConfig,
    agent_id: &str,
    now: i64,
) -> Result<(), AgentPipelineError> {
    let (_, _, _, first_seen_at) = store.find_agent(agent_id).await?.ok_or(AgentPipelineError::AgentNotFound)?;
    let latest_event = store.latest_event_for_agent(agent_id).await?.ok_or(AgentPipelineError::AgentNotFound)?;

    let fetch_opts = FetchOptions {
        timeout_ms: config.pipeline.fetch_timeout_ms,
        max_bytes: config.pipeline.max_card_bytes,
        allow_http: config.pipeline.allow_http,
        max_redirects: config.pipeline.max_redirects,
    };
    let outcome = fetch_agent_card(resolver, &latest_event.agent_uri, &fetch_opts).await;

    let mut snapshot = IdentitySnapshot {
        snapshot_id: String::new(),
        agent_id: agent_id.to_string(),
        agent_uri: latest_event.agent_uri.clone(),
        fetch_status: outcome.status,
        card_hash: outcome.card_hash.clone(),
        card_json: outcome.card_json.clone(),
        fetched_at: now,
        http_status: outcome.http_status,
        error: outcome.error.clone(),
    };
    snapshot.snapshot_id = sha256_hex(canonical_json(&snapshot.id_fields()));
    store.insert_identity_snapshot(&snapshot).await?;

    let distinct_hashes = store
        .distinct_card_hashes_since(agent_id, now, config.pipeline.churn_window_seconds)
        .await?
        .len();

    let mut signals: Vec<Signal> = derive_identity_signals(&IdentitySignalInput {
        agent_id: agent_id.to_string(),
        first_seen_at,
        observed_at: now,
        latest_fetch_status: Some(outcome.status),
        latest_snapshot_id: Some(snapshot.snapshot_id.clone()),
        distinct_card_hashes_in_window: distinct_hashes,
        newborn_age_seconds: config.pipeline.newborn_age_seconds,
        churn_threshold: config.pipeline.churn_threshold,
    });
    watchtower_types::sort_signals(&mut signals);

    let behavior_snapshot = Snapshot { snapshot_id: String::new(), agent_id: agent_id.to_string(), observed_at: now, signals };
    let behavior_snapshot = Snapshot {
        snapshot_id: sha256_hex(canonical_json(&behavior_snapshot.id_fields())),
        ..behavior_snapshot
    };
    store.insert_snapshot(&behavior_snapshot).await?;

    let history = store.latest_snapshots(agent_id, config.pipeline.scoring_snapshot_window).await?;
    let active_alerts = store.list_alerts(Some(agent_id), true).await?;

    let scoring_output = score(&ScoringInput {
        agent_id: agent_id.to_string(),
        generated_at: now,
        snapshots: &history,
        active_alerts: &active_alerts,
    });

    store.insert_report(&scoring_output.report).await?;
    if !scoring_output.new_alerts.is_empty() {
        store.insert_alerts(&scoring_output.new_alerts).await?;
    }

    if config.pipeline.alerts_auto_deactivate {
        let current_signal_ids: std::collections::HashSet<&str> =
            scoring_output.report.signals.iter().map(|s| s.signal_id.as_str()).collect();
        for alert in &active_alerts {
            if !current_signal_ids.contains(alert.alert_type.as_str()) {
                store.deactivate_alert(&alert.alert_id).await?;
            }
        }
    }

    watchtower_translog::append_leaf(
        &config.translog_dir,
        watchtower_translog::LeafInput {
            agent_id: agent_id.to_string(),
            risk_report_hash: scoring_output.report.report_id.clone(),
            overall_risk: scoring_output.report.overall_risk,
            receipt_id: None,
            manifest_sha256: None,
            card_hash: outcome.card_hash,
        },
        now,
        signer,
    )?;

    Ok(())
}

async fn emit_pipeline_error_alert(store: &Store, agent_id: &str, error_message: &str, now: i64) {
    let alert = Alert {
        alert_id: sha256_hex(format!("{agent_id}:PIPELINE_ERROR:tick-{now}")),
        agent_id: agent_id.to_string(),
        alert_type: "PIPELINE_ERROR".to_string(),
        severity: Severity::High,
        description: error_message.to_string(),
        evidence_links: vec![Evidence { kind: "agent".to_string(), reference: agent_id.to_string() }],
        created_at: now,
        is_active: true,
    };
    if let Err(e) = store.insert_alerts(&[alert]).await {
        error!(agent_id, error = %e, "failed to persist PIPELINE_ERROR alert");
    }
}
