use anyhow::Result;
use assembly::engine::Graph;
use assembly::nodes;
use assembly::registry::Registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,assembly=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut registry = Registry::new();
    nodes::register_all(&mut registry)?;
    tracing::info!(tags = ?registry.tags(), "registry ready");

    // (0..5) + (10..40 step 10) -> divmod by (3..) -> print both halves
    let config = serde_json::json!({
        "graph_config": { "channel_capacity": 4 },
        "channels": ["a", "b", "d", "sum", "quotient", { "name": "remainder", "unbounded": true }],
        "nodes": [
            { "id": "a", "tag": "!range", "bind": { "out": "a" }, "params": { "end": 5 } },
            { "id": "b", "tag": "!range", "bind": { "out": "b" }, "params": { "start": 10, "end": 40, "step": 10 } },
            { "id": "d", "tag": "!range", "bind": { "out": "d" }, "params": { "start": 3, "end": 6 } },
            { "id": "adder", "tag": "!add", "bind": { "a": "a", "b": "b", "total": "sum" } },
            {
                "id": "splitter",
                "tag": "!divmod",
                "bind": { "dividend": "sum", "divisor": "d", "quotient": "quotient", "remainder": "remainder" }
            },
            { "id": "q", "tag": "!print", "bind": { "input": "quotient" }, "params": { "label": "quotient" } },
            { "id": "r", "tag": "!print", "bind": { "input": "remainder" }, "params": { "label": "remainder" } }
        ]
    });

    let mut graph = Graph::from_json(config, &registry)?;
    graph.run().await?;

    println!("{}", graph.monitor().generate_report());
    Ok(())
}
