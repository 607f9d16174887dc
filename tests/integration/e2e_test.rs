//! End-to-end pipeline tests

use flow_tape::config::Config;
use flow_tape::flow::Normalizer;
use flow_tape::ingest::{FlowIngestor, IngestOutcome};
use flow_tape::reader::FlowReader;
use flow_tape::store::{CsvLog, FlowTable};
use tempfile::TempDir;

async fn pipeline(dir: &TempDir) -> (FlowIngestor, FlowReader) {
    let log = CsvLog::new(dir.path().join("optionstrat_flow.csv"));
    log.initialize().await.unwrap();
    let table = FlowTable::new();
    let ingestor = FlowIngestor::new(Normalizer::default(), table.clone(), log.clone());
    (ingestor, FlowReader::new(table, log, 50))
}

#[test]
fn test_config_example_parses() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    assert_eq!(config.stream.url, "wss://stream.optionstrat.com/flow/live");
    assert_eq!(config.table.snapshot_limit, 50);
    assert_eq!(config.ui.refresh_interval_secs, 10);
}

#[tokio::test]
async fn test_mixed_stream_scenario() {
    let dir = TempDir::new().unwrap();
    let (ingestor, reader) = pipeline(&dir).await;

    let frames = [
        r#"{"symbol":"AAPL","optionType":"call","side":"buy","price":2.5,"quantity":10,"strikePrice":190,"expiration":"2024-03-15","actionType":"sweep"}"#,
        r#"{"optionType":"put","side":"sell","price":1.0,"quantity":3}"#,
        r#"{"symbol":"TSLA","optionType":"put","side":"sell","price":4.1,"quantity":2,"strikePrice":"250","expiration":"2025-01-02","actionType":"block"}"#,
    ];

    let outcomes: Vec<IngestOutcome> = {
        let mut out = Vec::new();
        for frame in frames {
            out.push(ingestor.ingest_text(frame).await);
        }
        out
    };
    assert!(outcomes[0].is_appended());
    assert!(!outcomes[1].is_appended());
    assert!(outcomes[2].is_appended());

    let rows = reader.recent_rows(50).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].symbol, "AAPL");
    assert_eq!(rows[0].premium, "$2,500");
    assert_eq!(rows[0].side, "Buy");
    assert_eq!(rows[0].expiry, "Mar 15");
    assert_eq!(rows[1].symbol, "TSLA");
    assert_eq!(rows[1].expiry, "Jan 02");
    assert_eq!(rows[1].side, "Sell");
    assert_eq!(rows[1].premium, "$820");
    assert_eq!(rows[1].action_type, "BLOCK");
}

#[tokio::test]
async fn test_table_and_tape_agree_on_order() {
    let dir = TempDir::new().unwrap();
    let (ingestor, reader) = pipeline(&dir).await;

    ingestor.ingest_text(r#"{"symbol":"E1"}"#).await;
    ingestor.ingest_text(r#"{"symbol":"E2"}"#).await;

    let snapshot = reader.recent_rows(2).await;
    let symbols: Vec<&str> = snapshot.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["E1", "E2"]);

    let export = reader.export_file().await.unwrap();
    let text = String::from_utf8(export.bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "Time,Symbol,Buy/Sell,Strike,Call/Put,Expiry,Premium ($),Type"
    );
    assert!(lines[1].contains(",E1,"));
    assert!(lines[2].contains(",E2,"));
}

#[tokio::test]
async fn test_reinitializing_tape_keeps_row_count() {
    let dir = TempDir::new().unwrap();
    let log = CsvLog::new(dir.path().join("flow.csv"));

    log.initialize().await.unwrap();
    let first = log.read_all().await.unwrap();
    log.initialize().await.unwrap();
    let second = log.read_all().await.unwrap();

    assert_eq!(first, second);
    assert!(log.read_rows().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reads_run_concurrently_with_ingestion() {
    let dir = TempDir::new().unwrap();
    let (ingestor, reader) = pipeline(&dir).await;

    let writer = ingestor.clone();
    let producer = tokio::spawn(async move {
        for i in 0..100 {
            writer
                .ingest_text(&format!(r#"{{"symbol":"S{}","price":1,"quantity":1}}"#, i))
                .await;
        }
    });

    for _ in 0..20 {
        let export = reader.export_file().await.unwrap();
        let text = String::from_utf8(export.bytes).unwrap();
        // Every line is complete: header plus whole rows only
        for line in text.lines().skip(1) {
            assert_eq!(line.matches(',').count(), 7, "torn line {:?}", line);
        }
        let snapshot = reader.latest().await;
        assert!(snapshot.len() <= 50);
        tokio::task::yield_now().await;
    }

    producer.await.unwrap();
    assert_eq!(reader.recent_rows(1000).await.len(), 100);
    let rows = ingestor.log().read_rows().await.unwrap();
    assert_eq!(rows.len(), 100);
    assert_eq!(rows[99].symbol, "S99");
}
