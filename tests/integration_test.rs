use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use sheet_row_upload::{
    BatchDriver, CancellationGate, DriverSettings, Item, Mode, ProcessRequest, RemoteError,
    RemoteProcessor, Row, RunNotice, RunOutcome,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Script = dyn Fn(usize, &Row) -> Result<Vec<Row>, RemoteError> + Send + Sync;

/// 按脚本返回结果的远程服务替身
struct ScriptedProcessor {
    script: Box<Script>,
    calls: Mutex<Vec<(String, String)>>,
    cancel_after: Option<(usize, CancellationGate)>,
    slow_from: Option<usize>,
}

impl ScriptedProcessor {
    fn new(
        script: impl Fn(usize, &Row) -> Result<Vec<Row>, RemoteError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
            cancel_after: None,
            slow_from: None,
        }
    }

    /// 第 `call` 次调用返回后触发取消
    fn cancel_after_call(mut self, call: usize, gate: CancellationGate) -> Self {
        self.cancel_after = Some((call, gate));
        self
    }

    /// 从第 `call` 次调用开始一直挂起
    fn hang_from_call(mut self, call: usize) -> Self {
        self.slow_from = Some(call);
        self
    }

    fn parts_called(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    fn connection_ids(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }
}

#[async_trait]
impl RemoteProcessor for ScriptedProcessor {
    async fn process(&self, request: &ProcessRequest) -> Result<Vec<Row>, RemoteError> {
        assert_eq!(request.rows.len(), 1, "每次只发送一行");
        let row = &request.rows[0];
        let part = row.get("part").and_then(Value::as_str).unwrap_or_default().to_string();

        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((part, request.connection_id.clone()));
            calls.len()
        };

        if matches!(self.slow_from, Some(from) if call >= from) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        let result = (self.script)(call - 1, row);

        if let Some((after, gate)) = &self.cancel_after {
            if call == *after {
                gate.cancel();
            }
        }
        result
    }
}

fn rows(parts: &[&str]) -> Vec<Item> {
    Item::from_rows(
        parts
            .iter()
            .map(|p| json!({ "part": p }).as_object().cloned().unwrap())
            .collect(),
    )
}

/// 远程服务的加工结果：原始行加一列
fn remote(row: &Row) -> Row {
    let mut out = row.clone();
    out.insert("price".to_string(), json!(9.5));
    out
}

fn echo(_call: usize, row: &Row) -> Result<Vec<Row>, RemoteError> {
    Ok(vec![remote(row)])
}

fn settings() -> DriverSettings {
    DriverSettings {
        request_timeout: Duration::from_secs(5),
        inter_item_delay: Duration::ZERO,
    }
}

fn driver(processor: Arc<ScriptedProcessor>) -> BatchDriver {
    BatchDriver::new(Some(processor as Arc<dyn RemoteProcessor>), settings())
}

#[tokio::test]
async fn test_one_record_per_item_keeps_order() {
    let processor = Arc::new(ScriptedProcessor::new(echo));
    let items = rows(&["A", "B", "C", "D"]);

    let run = driver(processor.clone()).run(&items, None).await.unwrap();

    assert_eq!(run.outcome(), Some(RunOutcome::CompletedRemote));
    assert_eq!(run.mode(), Mode::Remote);
    assert_eq!(run.processed(), 4);
    assert_eq!(run.results().len(), 4);
    for (i, record) in run.results().iter().enumerate() {
        assert!(record.is_remote());
        assert_eq!(record.source_index, i);
        assert_eq!(record.row, remote(&items[i].fields));
    }
    assert_eq!(processor.parts_called(), vec!["A", "B", "C", "D"]);
}

#[tokio::test]
async fn test_same_input_same_results() {
    let items = rows(&["A", "B", "C"]);
    let script = |call: usize, row: &Row| {
        if call == 1 {
            Err(RemoteError::MalformedResponse("bad body".into()))
        } else {
            Ok(vec![remote(row)])
        }
    };

    let first = driver(Arc::new(ScriptedProcessor::new(script)))
        .run(&items, None)
        .await
        .unwrap();
    let second = driver(Arc::new(ScriptedProcessor::new(script)))
        .run(&items, None)
        .await
        .unwrap();

    assert_eq!(first.results(), second.results());
    assert_eq!(first.outcome(), second.outcome());
    assert_ne!(first.connection_id(), second.connection_id());
}

#[tokio::test]
async fn test_network_failure_flips_remainder_to_local() {
    let parts = ["A", "B", "C", "D", "E"];
    for k in 0..parts.len() {
        let processor = Arc::new(ScriptedProcessor::new(move |call, row| {
            if call == k {
                Err(RemoteError::NetworkUnavailable("connection refused".into()))
            } else {
                Ok(vec![remote(row)])
            }
        }));
        let items = rows(&parts);

        let run = driver(processor.clone()).run(&items, None).await.unwrap();

        assert_eq!(run.mode(), Mode::Local, "k = {}", k);
        assert_eq!(run.outcome(), Some(RunOutcome::CompletedMixed));
        assert_eq!(run.results().len(), parts.len());
        for (i, record) in run.results().iter().enumerate() {
            if i < k {
                assert!(record.is_remote(), "k = {}, i = {}", k, i);
                assert_eq!(record.row, remote(&items[i].fields));
            } else {
                assert!(!record.is_remote(), "k = {}, i = {}", k, i);
                assert_eq!(record.row, items[i].fields);
            }
        }
        // 切换后不再有远程调用
        assert_eq!(processor.parts_called().len(), k + 1);
        assert!(run
            .notices()
            .iter()
            .any(|n| matches!(n, RunNotice::NetworkFallback { index, .. } if *index == k)));
    }
}

#[tokio::test]
async fn test_cancel_between_items_stops_dispatch() {
    let gate = CancellationGate::new();
    let m = 2;
    let processor = Arc::new(ScriptedProcessor::new(echo).cancel_after_call(m, gate.clone()));
    let items = rows(&["A", "B", "C", "D", "E"]);

    let run = driver(processor.clone())
        .with_cancel_gate(gate)
        .run(&items, None)
        .await
        .unwrap();

    assert_eq!(run.outcome(), Some(RunOutcome::PartiallyCancelled));
    assert!(run.is_cancelled());
    assert_eq!(run.processed(), m);
    assert!(run.results().len() == m || run.results().len() == m + 1);
    assert_eq!(processor.parts_called(), vec!["A", "B"]);
    assert_eq!(
        run.notices().last(),
        Some(&RunNotice::Cancelled { at_index: m })
    );
}

#[tokio::test]
async fn test_fan_out_stays_contiguous() {
    let processor = Arc::new(ScriptedProcessor::new(|call, row| {
        if call == 1 {
            Ok((1..=3)
                .map(|n| {
                    let mut out = row.clone();
                    out.insert("variant".to_string(), json!(n));
                    out
                })
                .collect())
        } else {
            Ok(vec![remote(row)])
        }
    }));
    let items = rows(&["A", "B", "C"]);

    let run = driver(processor).run(&items, None).await.unwrap();

    let sources: Vec<usize> = run.results().iter().map(|r| r.source_index).collect();
    assert_eq!(sources, vec![0, 1, 1, 1, 2]);
    let variants: Vec<Value> = run.results()[1..4]
        .iter()
        .map(|r| r.row["variant"].clone())
        .collect();
    assert_eq!(variants, vec![json!(1), json!(2), json!(3)]);
    assert_eq!(run.results()[4].row, remote(&items[2].fields));
    assert_eq!(run.processed(), 3);
}

#[tokio::test]
async fn test_example_run_ends_mixed() {
    let processor = Arc::new(ScriptedProcessor::new(|_call, row| {
        if row["part"] == json!("C") {
            Err(RemoteError::NetworkUnavailable("Network Error".into()))
        } else {
            Ok(vec![remote(row)])
        }
    }));
    let items = rows(&["A", "B", "C"]);

    let run = driver(processor).run(&items, None).await.unwrap();

    let result_rows: Vec<&Row> = run.result_rows().collect();
    assert_eq!(result_rows[0], &remote(&items[0].fields));
    assert_eq!(result_rows[1], &remote(&items[1].fields));
    assert_eq!(result_rows[2], &items[2].fields);
    assert_eq!(run.mode(), Mode::Local);
    assert_eq!(run.outcome(), Some(RunOutcome::CompletedMixed));
}

#[tokio::test]
async fn test_timeout_and_malformed_keep_remote_mode() {
    let processor = Arc::new(ScriptedProcessor::new(|call, row| match call {
        0 => Err(RemoteError::Timeout { after_ms: 150_000 }),
        1 => Err(RemoteError::MalformedResponse("success=false".into())),
        2 => Ok(vec![]),
        _ => Ok(vec![remote(row)]),
    }));
    let items = rows(&["A", "B", "C", "D"]);

    let run = driver(processor.clone()).run(&items, None).await.unwrap();

    assert_eq!(run.mode(), Mode::Remote);
    assert_eq!(run.outcome(), Some(RunOutcome::CompletedRemote));
    assert_eq!(processor.parts_called().len(), 4);
    for i in 0..3 {
        assert!(!run.results()[i].is_remote());
        assert_eq!(run.results()[i].row, items[i].fields);
    }
    assert!(run.results()[3].is_remote());

    let substituted = run
        .notices()
        .iter()
        .filter(|n| matches!(n, RunNotice::ItemSubstituted { .. }))
        .count();
    assert_eq!(substituted, 2);
}

#[tokio::test]
async fn test_every_call_carries_the_run_connection_id() {
    let processor = Arc::new(ScriptedProcessor::new(echo));
    let run = driver(processor.clone())
        .run(&rows(&["A", "B", "C"]), None)
        .await
        .unwrap();

    let ids = processor.connection_ids();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| id == run.connection_id().as_str()));
}

#[tokio::test]
async fn test_start_streams_progress_events() {
    let processor = Arc::new(ScriptedProcessor::new(echo));
    let driver = BatchDriver::new(
        Some(processor as Arc<dyn RemoteProcessor>),
        DriverSettings {
            request_timeout: Duration::from_secs(5),
            inter_item_delay: Duration::from_millis(5),
        },
    );

    let mut handle = driver.start(rows(&["A", "B", "C"])).unwrap();
    let connection_id = handle.connection_id.clone();

    let mut events = Vec::new();
    while let Some(event) = handle.events.next().await {
        events.push(event);
    }
    let run = handle.join().await.unwrap();

    assert_eq!(
        events.iter().map(|e| e.processed).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(
        events.iter().map(|e| e.percent).collect::<Vec<_>>(),
        vec![33, 67, 100]
    );
    assert!(events.iter().all(|e| e.total == 3));
    assert_eq!(run.connection_id(), &connection_id);
    assert_eq!(run.outcome(), Some(RunOutcome::CompletedRemote));
}

#[tokio::test]
async fn test_cancel_discards_in_flight_result() {
    let processor = Arc::new(ScriptedProcessor::new(echo).hang_from_call(2));
    let driver = driver(processor.clone());

    let mut handle = driver.start(rows(&["A", "B", "C"])).unwrap();

    let first = handle.events.next().await.expect("first item completes");
    assert_eq!(first.processed, 1);
    // 第二行正在等待远程响应
    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.cancel();

    let run = tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .expect("run should stop after cancel")
        .unwrap();

    assert_eq!(run.outcome(), Some(RunOutcome::PartiallyCancelled));
    assert_eq!(run.processed(), 1);
    assert_eq!(run.results().len(), 1);
    assert_eq!(processor.parts_called(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_local_run_never_calls_remote() {
    let run = BatchDriver::new(None, settings())
        .run(&rows(&["A", "B"]), None)
        .await
        .unwrap();

    assert_eq!(run.initial_mode(), Mode::Local);
    assert_eq!(run.outcome(), Some(RunOutcome::CompletedLocal));
    assert_eq!(run.results().len(), 2);
}

#[tokio::test]
async fn test_cancelled_run_does_not_affect_next_run() {
    let processor = Arc::new(ScriptedProcessor::new(echo));
    let items = rows(&["A", "B", "C"]);

    let cancelled = driver(processor.clone());
    cancelled.cancel();
    let first = cancelled.run(&items, None).await.unwrap();

    let second = driver(processor.clone()).run(&items, None).await.unwrap();

    assert_eq!(first.outcome(), Some(RunOutcome::PartiallyCancelled));
    assert!(first.results().is_empty());
    assert_eq!(second.outcome(), Some(RunOutcome::CompletedRemote));
    assert_eq!(second.results().len(), 3);
    assert_eq!(processor.parts_called(), vec!["A", "B", "C"]);
}
