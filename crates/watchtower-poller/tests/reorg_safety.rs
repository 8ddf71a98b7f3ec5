use watchtower_db::Store;
use watchtower_poller::source::FixedEventSource;
use watchtower_poller::{poll_once, PollOutcome, PollerConfig};
use watchtower_types::{EventType, RegistrationEvent};

fn event(block: u64, log_index: u64) -> RegistrationEvent {
    RegistrationEvent {
        chain_id: 1,
        registry_addr: "0xabc".to_string(),
        agent_token_id: format!("{block}-{log_index}"),
        agent_uri: "https://example.com/card.json".to_string(),
        owner_address: "0xowner".to_string(),
        event_type: EventType::Registered,
        block_number: block,
        tx_hash: format!("0x{block:x}{log_index:x}"),
        log_index,
    }
}

/// Seed scenario S5: two successive polls produce the windows the spec
/// calls out, and re-ingesting the overlap inserts zero new rows.
#[tokio::test]
async fn successive_polls_overlap_and_reingest_is_a_no_op() {
    let store = Store::open_in_memory().await.unwrap();
    let config = PollerConfig {
        chain_id: 1,
        registry_addr: "0xabc".to_string(),
        start_block: 1000,
        batch_size: 100,
        confirmations: 12,
        overlap_blocks: 50,
    };
    let events: Vec<_> = (1000..=1148).map(|b| event(b, 0)).collect();
    let source = FixedEventSource { latest_block: 1200, events };

    let first = poll_once(&store, &source, &config, 1_700_000_000).await.unwrap();
    assert_eq!(first, PollOutcome::Ingested { from: 1000, to: 1099, event_count: 100 });

    let second = poll_once(&store, &source, &config, 1_700_000_050).await.unwrap();
    assert_eq!(second, PollOutcome::Ingested { from: 1049, to: 1148, event_count: 100 });

    let known = store.list_known_agent_ids(1, "0xabc").await.unwrap();
    assert_eq!(known.len(), 149, "blocks 1049..=1099 were re-ingested but inserted zero duplicate rows");
}

#[tokio::test]
async fn nothing_confirmed_yet_is_skipped() {
    let store = Store::open_in_memory().await.unwrap();
    let config = PollerConfig {
        chain_id: 1,
        registry_addr: "0xabc".to_string(),
        start_block: 1000,
        batch_size: 100,
        confirmations: 12,
        overlap_blocks: 50,
    };
    let source = FixedEventSource { latest_block: 1005, events: vec![] };

    let outcome = poll_once(&store, &source, &config, 1_700_000_000).await.unwrap();
    assert_eq!(outcome, PollOutcome::Skipped);
}
