//! Word-count demo for the Meridian host.
//!
//! A queue of documents drives a single function that counts words, writes
//! a per-message report blob, and forwards a tally downstream. Run it to
//! watch causality thread through the whole pipeline: the second document
//! arrives pre-stamped with a parent invocation id, and every tally leaves
//! stamped with the invocation that produced it.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use meridian_host::{
    BindingRegistry, FunctionDescriptor, FunctionExecutor, FunctionRegistry, HandlerInvoker,
    HostConfig, ParameterShape, QueueTriggerExecutor,
};
use meridian_proto::{causality, QueueMessage};
use meridian_store::{BlobPath, BlobStore, MemoryBlobStore, MemoryQueueStore, QueueStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config();
    info!(
        buffer_size = config.writer.buffer_size,
        stamp_outbound = config.causality.stamp_outbound,
        "Word-count demo starting"
    );

    let blob_store = Arc::new(MemoryBlobStore::new());
    let queue_store = Arc::new(MemoryQueueStore::new());

    let bindings = BindingRegistry::standard(blob_store.clone(), queue_store.clone(), &config);
    let registry = FunctionRegistry::builder(bindings)
        .register(
            FunctionDescriptor::new("wordcount")
                .with_parameter("body", ParameterShape::TriggerText)
                .with_parameter(
                    "report",
                    ParameterShape::BlobWriter {
                        path: BlobPath::parse("reports/{message_id}.txt")?,
                    },
                )
                .with_parameter(
                    "tallies",
                    ParameterShape::QueueWriter {
                        queue: "tallies".to_string(),
                    },
                ),
            Arc::new(HandlerInvoker::new(|args| async move {
                let body = args.text(0)?;
                let words = body.split_whitespace().count();

                let writer = args.writer(1)?;
                writer.write_text(&format!("words={words}\n")).await?;
                writer.close().await?;

                args.queue(2)?
                    .add_text(serde_json::json!({ "words": words }).to_string())
                    .await;

                info!(words, "Counted document");
                Ok(())
            })),
        )?
        .build();

    seed_documents(&queue_store).await?;

    let function = registry
        .get("wordcount")
        .cloned()
        .ok_or("wordcount is not registered")?;
    let trigger = QueueTriggerExecutor::new(function, FunctionExecutor::new());

    // Drain the document queue, one invocation per message.
    let cancel = CancellationToken::new();
    let mut processed = Vec::new();
    while let Some(message) = queue_store.dequeue("documents").await? {
        let id = message.id.clone();
        let result = trigger.execute(message, &cancel).await;
        info!(succeeded = result.succeeded(), "Invocation settled");
        if let Some(id) = id {
            processed.push(id);
        }
    }

    // Show what each invocation left behind.
    for id in &processed {
        let path = BlobPath::parse(&format!("reports/{id}.txt"))?;
        if let Some(content) = blob_store.read(&path).await? {
            info!(report = %path, content = %String::from_utf8_lossy(&content).trim_end(), "Report blob");
        }
    }

    while let Some(tally) = queue_store.dequeue("tallies").await? {
        let producer = causality::get_owner(&tally)
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        info!(
            body = tally.text().unwrap_or("<binary>"),
            producer = %producer,
            "Outbound tally"
        );
    }

    info!("Word-count demo complete");
    Ok(())
}

fn load_config() -> HostConfig {
    match HostConfig::load() {
        Ok(config) => config,
        Err(e) => {
            info!(error = %e, "Failed to load meridian.toml, using default configuration");
            HostConfig::default()
        }
    }
}

/// Enqueues two documents: one plain, one stamped as if an upstream
/// invocation produced it.
async fn seed_documents(
    queue_store: &MemoryQueueStore,
) -> Result<(), Box<dyn std::error::Error>> {
    queue_store
        .enqueue(
            "documents",
            QueueMessage::from_text("the quick brown fox jumps over the lazy dog"),
        )
        .await?;

    let mut payload = serde_json::Map::new();
    payload.insert(
        "note".to_string(),
        serde_json::Value::String("stamped upstream".to_string()),
    );
    causality::set_owner(Uuid::new_v4(), &mut payload);
    queue_store
        .enqueue(
            "documents",
            QueueMessage::from_text(serde_json::Value::Object(payload).to_string()),
        )
        .await?;

    Ok(())
}
