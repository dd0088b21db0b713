use anyhow::bail;
use assembly::core::{
    Channel, ChannelError, ChannelHandle, ConfigError, Emit, Node, NodeError, NodeState, Queue,
};
use assembly::registry::{NodeArgs, NodeDef};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

async fn source(name: &str, values: &[i64]) -> ChannelHandle<i64> {
    let queue = Queue::unbounded(name).handle();
    for v in values {
        queue.put(*v).await.unwrap();
    }
    queue.close();
    queue
}

fn sink(name: &str) -> ChannelHandle<i64> {
    Queue::unbounded(name).handle()
}

async fn drain(channel: &ChannelHandle<i64>) -> Vec<i64> {
    let mut values = Vec::new();
    while let Some(v) = channel.get().await {
        values.push(v);
    }
    values
}

/// Channel that records the order in which it gets closed.
struct Recording {
    inner: Queue<i64>,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Channel<i64> for Recording {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn put(&self, value: i64) -> Result<(), ChannelError> {
        self.inner.put(value).await
    }

    async fn get(&self) -> Option<i64> {
        self.inner.get().await
    }

    fn open_writer(&self) {
        self.inner.open_writer()
    }

    fn close(&self) {
        self.log.lock().unwrap().push(self.inner.name().to_string());
        self.inner.close()
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

fn recording(names: &[&str]) -> (Vec<ChannelHandle<i64>>, Arc<Mutex<Vec<String>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let channels = names
        .iter()
        .map(|name| {
            Arc::new(Recording {
                inner: Queue::unbounded(*name),
                log: log.clone(),
            }) as ChannelHandle<i64>
        })
        .collect();
    (channels, log)
}

fn sum_def() -> NodeDef<i64> {
    NodeDef::new("!sum", &["a", "b"], &["out"], |args| {
        Ok(Emit::One(*args.require("a")? + *args.require("b")?))
    })
}

fn triple_def() -> NodeDef<i64> {
    NodeDef::new("!triple", &["x"], &["a", "b", "c"], |args| {
        let x = *args.require("x")?;
        Ok(Emit::Many(vec![x, x * 2, x * 3]))
    })
}

#[tokio::test]
async fn test_sum_stops_at_shortest_input() {
    let a = source("a", &[1, 2, 3]).await;
    let b = source("b", &[10, 20, 30, 40]).await;
    let out = sink("out");

    let mut node = sum_def()
        .build(
            &NodeArgs::new("sum")
                .with_channel("a", a)
                .with_channel("b", b)
                .with_channel("out", out.clone()),
        )
        .unwrap();
    assert_eq!(node.state(), NodeState::Idle);

    node.run().await.unwrap();

    assert_eq!(node.state(), NodeState::Closed);
    assert!(out.is_closed());
    assert_eq!(drain(&out).await, vec![11, 22, 33]);
    assert_eq!(out.get().await, None);
}

#[tokio::test]
async fn test_every_output_receives_every_tuple() {
    let x = source("x", &[1, 2, 3, 4]).await;
    let (outs, _) = recording(&["a", "b", "c"]);

    let mut node = triple_def()
        .build(
            &NodeArgs::new("triple")
                .with_channel("x", x)
                .with_channel("a", outs[0].clone())
                .with_channel("b", outs[1].clone())
                .with_channel("c", outs[2].clone()),
        )
        .unwrap();
    node.run().await.unwrap();

    assert_eq!(drain(&outs[0]).await, vec![1, 2, 3, 4]);
    assert_eq!(drain(&outs[1]).await, vec![2, 4, 6, 8]);
    assert_eq!(drain(&outs[2]).await, vec![3, 6, 9, 12]);
    assert_eq!(node.metrics().tuples_joined(), 4);
    assert_eq!(node.metrics().values_emitted(), 12);
}

#[tokio::test]
async fn test_outputs_close_in_reverse_order() {
    let x = source("x", &[1]).await;
    let (outs, log) = recording(&["a", "b", "c"]);

    let mut node = triple_def()
        .build(
            &NodeArgs::new("triple")
                .with_channel("x", x)
                .with_channel("a", outs[0].clone())
                .with_channel("b", outs[1].clone())
                .with_channel("c", outs[2].clone()),
        )
        .unwrap();
    let names: Vec<&str> = node.output_names().collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    node.run().await.unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["c", "b", "a"]);
}

#[tokio::test]
async fn test_outputs_close_in_reverse_order_on_error() {
    let x = source("x", &[1, 2]).await;
    let (outs, log) = recording(&["a", "b", "c"]);

    let def = NodeDef::new("!fail", &["x"], &["a", "b", "c"], |_args| -> anyhow::Result<Emit<i64>> {
        bail!("boom")
    });
    let mut node = def
        .build(
            &NodeArgs::new("fail")
                .with_channel("x", x)
                .with_channel("a", outs[0].clone())
                .with_channel("b", outs[1].clone())
                .with_channel("c", outs[2].clone()),
        )
        .unwrap();

    let err = node.run().await.unwrap_err();

    assert!(matches!(err, NodeError::Transformation { .. }));
    assert_eq!(*log.lock().unwrap(), vec!["c", "b", "a"]);
    assert_eq!(node.state(), NodeState::Closed);
}

#[tokio::test]
async fn test_arity_mismatch_fails_first_broadcast() {
    let x = source("x", &[1, 2, 3]).await;
    let a = sink("a");
    let b = sink("b");
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let def = NodeDef::new("!wide", &["x"], &["a", "b"], move |args| {
        counter.fetch_add(1, Ordering::SeqCst);
        let x = *args.require("x")?;
        Ok(Emit::Many(vec![x, x, x]))
    });
    let mut node = def
        .build(
            &NodeArgs::new("wide")
                .with_channel("x", x)
                .with_channel("a", a.clone())
                .with_channel("b", b.clone()),
        )
        .unwrap();

    let err = node.run().await.unwrap_err();

    match err {
        NodeError::ArityMismatch {
            node,
            expected,
            actual,
        } => {
            assert_eq!(node, "!wide()");
            assert_eq!(expected, 2);
            assert_eq!(actual, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(drain(&a).await.is_empty());
    assert!(drain(&b).await.is_empty());
}

#[tokio::test]
async fn test_zero_input_node_only_closes_outputs() {
    let (outs, log) = recording(&["a", "b"]);
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let def = NodeDef::new("!nothing", &[], &["a", "b"], move |_args| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Emit::Many(vec![0, 0]))
    });
    let mut node = def
        .build(
            &NodeArgs::new("nothing")
                .with_channel("a", outs[0].clone())
                .with_channel("b", outs[1].clone()),
        )
        .unwrap();

    node.run().await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(*log.lock().unwrap(), vec!["b", "a"]);
    assert!(outs.iter().all(|c| c.is_closed()));
}

#[tokio::test]
async fn test_failure_on_second_tuple() {
    let x = source("x", &[1, 2, 3]).await;
    let out = sink("out");

    let def = NodeDef::new("!fragile", &["x"], &["out"], |args| {
        let x = *args.require("x")?;
        if x == 2 {
            bail!("cannot handle {}", x);
        }
        Ok(Emit::One(x * 10))
    });
    let mut node = def
        .build(&NodeArgs::new("fragile").with_channel("x", x).with_channel("out", out.clone()))
        .unwrap();

    let err = node.run().await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "transformation in !fragile() failed: cannot handle 2"
    );
    assert!(out.is_closed());
    assert_eq!(drain(&out).await, vec![10]);
    assert_eq!(node.metrics().errors_count(), 1);
}

#[tokio::test]
async fn test_missing_attribute() {
    let a = sink("a");
    let out = sink("out");

    let err = sum_def()
        .build(&NodeArgs::new("sum").with_channel("a", a).with_channel("out", out.clone()))
        .err()
        .unwrap();

    match err {
        ConfigError::MissingAttribute { node, name } => {
            assert_eq!(node, "!sum()");
            assert_eq!(name, "b");
        }
        other => panic!("unexpected error: {other}"),
    }
    // a failed construction registers no writer
    out.close();
    assert!(out.is_closed());
}

#[tokio::test]
async fn test_node_runs_only_once() {
    let a = source("a", &[1]).await;
    let b = source("b", &[2]).await;
    let out = sink("out");

    let mut node = sum_def()
        .build(
            &NodeArgs::new("sum")
                .with_channel("a", a)
                .with_channel("b", b)
                .with_channel("out", out),
        )
        .unwrap();
    node.run().await.unwrap();

    let err = node.run().await.unwrap_err();
    assert!(matches!(err, NodeError::InvalidState { state: "Closed", .. }));
}

#[tokio::test]
async fn test_output_closed_by_consumer() {
    let a = source("a", &[1]).await;
    let b = source("b", &[2]).await;
    let out = sink("out");
    out.close();

    let mut node = sum_def()
        .build(
            &NodeArgs::new("sum")
                .with_channel("a", a)
                .with_channel("b", b)
                .with_channel("out", out),
        )
        .unwrap();

    let err = node.run().await.unwrap_err();
    assert!(matches!(err, NodeError::ChannelClosed { .. }));
}

#[tokio::test]
async fn test_panicking_transformation_still_closes_outputs() {
    let x = source("x", &[1]).await;
    let out = sink("out");

    let def = NodeDef::new("!panics", &["x"], &["out"], |_args| -> anyhow::Result<Emit<i64>> {
        panic!("transformation bug")
    });
    let mut node = def
        .build(&NodeArgs::new("panics").with_channel("x", x).with_channel("out", out.clone()))
        .unwrap();

    let joined = tokio::spawn(async move { node.run().await }).await;

    assert!(joined.unwrap_err().is_panic());
    assert!(out.is_closed());
}

#[tokio::test]
async fn test_backpressure_on_bounded_output() {
    let x = source("x", &[1, 2, 3]).await;
    let out: ChannelHandle<i64> = Queue::bounded("out", 1).handle();

    let mut node = NodeDef::new("!id", &["x"], &["out"], |args| {
        Ok(Emit::One(*args.require("x")?))
    })
    .build(&NodeArgs::new("id").with_channel("x", x).with_channel("out", out.clone()))
    .unwrap();

    let handle = tokio::spawn(async move { node.run().await });
    sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_finished());

    assert_eq!(drain(&out).await, vec![1, 2, 3]);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shared_output_closes_after_last_producer() {
    let shared = sink("shared");
    let first_in = sink("first_in");
    let second_in = source("second_in", &[5]).await;

    let def = NodeDef::new("!id", &["x"], &["out"], |args| {
        Ok(Emit::One(*args.require("x")?))
    });
    let mut first = def
        .build(&NodeArgs::new("first").with_channel("x", first_in.clone()).with_channel("out", shared.clone()))
        .unwrap();
    let mut second = def
        .build(&NodeArgs::new("second").with_channel("x", second_in).with_channel("out", shared.clone()))
        .unwrap();

    second.run().await.unwrap();
    assert!(!shared.is_closed());

    first_in.put(7).await.unwrap();
    first_in.close();
    first.run().await.unwrap();
    assert!(shared.is_closed());

    assert_eq!(drain(&shared).await, vec![5, 7]);
}

#[tokio::test]
async fn test_unrun_producer_releases_shared_output() {
    let shared = sink("shared");
    let live_in = source("live_in", &[4]).await;

    let def = NodeDef::new("!id", &["x"], &["out"], |args| {
        Ok(Emit::One(*args.require("x")?))
    });
    let idle = def
        .build(&NodeArgs::new("idle").with_channel("x", sink("idle_in")).with_channel("out", shared.clone()))
        .unwrap();
    let mut live = def
        .build(&NodeArgs::new("live").with_channel("x", live_in).with_channel("out", shared.clone()))
        .unwrap();

    drop(idle);
    assert!(!shared.is_closed());

    live.run().await.unwrap();
    assert!(shared.is_closed());
    let drained = tokio::time::timeout(Duration::from_secs(1), drain(&shared))
        .await
        .expect("reader should see the end of the shared channel");
    assert_eq!(drained, vec![4]);
}

#[test]
fn test_display_uses_tag() {
    let node = sum_def()
        .build(
            &NodeArgs::new("sum")
                .with_channel("a", sink("a"))
                .with_channel("b", sink("b"))
                .with_channel("out", sink("out")),
        )
        .unwrap();
    assert_eq!(node.to_string(), "!sum()");
    assert_eq!(node.input_names(), ["a".to_string(), "b".to_string()]);
}
