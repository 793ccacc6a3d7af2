//! Conversion driver: orchestrates the render phase and hands output to a consumer (spec §4.7,
//! §5).
//!
//! Grounded on `noet-core::codec::compiler`'s `DocumentCompiler::parse_all` (phased orchestration
//! over a shared cache) and `noet-core::watch`'s cooperative-cancellation `AtomicBool` flag.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use tokio::task::JoinSet;

use crate::{
    diagnostics::{DiagnosticEngine, Problem},
    error::{CatalogError, Result},
    identifier::Identifier,
    topicgraph::{ContentLocation, NodeKind, TopicGraph},
};

/// A precomputed reference cache built once before the render phase (spec §4.7 step 2).
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub default_language: String,
    /// Snapshot of the topic-graph structural hash at render time, used by the round-trip law
    /// (spec §8: "re-registering the same inputs yields an identical topic-graph hash").
    pub topic_graph_hash: u64,
}

/// One rendered page, handed to the consumer (spec §4.7 step 5, §6 `consume(renderNode)`).
#[derive(Debug, Clone)]
pub struct RenderNode {
    pub identifier: Identifier,
    pub title: String,
    pub kind: NodeKind,
}

/// A page-scoped link summary, gathered alongside its render node (spec §4.7 step 5, §6
/// `consume(linkableElementSummaries[])`).
#[derive(Debug, Clone)]
pub struct LinkSummary {
    pub identifier: Identifier,
    pub title: String,
    pub kind: NodeKind,
}

/// A page-scoped indexing record (spec §4.7 step 5, §6 `consume(indexingRecords[])`), fed to an
/// external search index rather than to the renderer.
#[derive(Debug, Clone)]
pub struct IndexingRecord {
    pub identifier: Identifier,
    pub title: String,
    pub kind: NodeKind,
}

/// One page's documentation-coverage entry, gathered only when coverage is enabled (spec §6
/// `consume(documentationCoverageInfo[])`, "coverage-gated").
///
/// This crate has no doc-chunk model wired into the topic graph yet, so `has_documentation` is a
/// proxy: a page backed by authored markup (`ContentLocation::File`) has documentation; a page
/// assembled purely from a symbol graph's declarations does not.
#[derive(Debug, Clone)]
pub struct CoverageEntry {
    pub identifier: Identifier,
    pub title: String,
    pub has_documentation: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BenchmarkRecord {
    pub topic_graph_hash: u64,
    pub topic_anchor_hash: u64,
    pub external_topics_hash: u64,
    pub peak_memory_bytes: u64,
}

/// Final summary record emitted once per successful conversion (spec §4.7 step 6, §6
/// `consume(buildMetadata)`).
#[derive(Debug, Clone)]
pub struct BuildMetadata {
    pub schema_version: String,
    pub pages_rendered: usize,
    pub warnings: usize,
    pub errors: usize,
}

/// Sink for everything the driver produces (spec §6 "Output consumer interface"). Render nodes
/// arrive concurrently from many render tasks; everything else arrives from the single serial
/// emission phase.
pub trait OutputConsumer: Send + Sync {
    fn consume_problems(&self, problems: &[Problem]);
    fn consume_render_node(&self, node: RenderNode);
    /// Per-page link summaries gathered during the render phase, emitted once in identifier order
    /// (spec §4.7 step 6, §5 ordering guarantee).
    fn consume_link_summaries(&self, summaries: Vec<LinkSummary>);
    /// Per-page indexing records gathered during the render phase, emitted once in identifier
    /// order (spec §4.7 step 6, §5 ordering guarantee).
    fn consume_indexing_records(&self, records: Vec<IndexingRecord>);
    /// Per-page asset references, keyed by asset type (spec §6 `consume(assets{type →
    /// references[]})`). Always empty today: this crate has no asset-manager model (spec §1).
    fn consume_assets(&self, assets: BTreeMap<String, Vec<Identifier>>);
    fn consume_benchmarks(&self, benchmarks: BenchmarkRecord);
    /// Documentation-coverage entries, only called when coverage is enabled.
    fn consume_coverage(&self, _coverage: Vec<CoverageEntry>) {}
    fn consume_build_metadata(&self, metadata: BuildMetadata);
}

/// Orchestrates the phased pipeline described in spec §4.7.
pub struct ConversionDriver {
    cancelled: Arc<AtomicBool>,
}

impl Default for ConversionDriver {
    fn default() -> Self {
        ConversionDriver {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl ConversionDriver {
    pub fn new() -> Self {
        ConversionDriver::default()
    }

    /// A handle the caller can use to request cancellation from another thread (spec §5: "a
    /// boolean `registration-enabled` flag is polled ... between pages during conversion").
    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Run the full phased pipeline (spec §4.7). Returns `Ok(())` whether or not conversion
    /// completed normally; cancellation and fatal-error early-return are not themselves errors —
    /// they are outcomes a caller inspects via the consumer calls it already received.
    pub async fn convert(
        &self,
        topic_graph: Arc<TopicGraph>,
        diagnostics: &DiagnosticEngine,
        consumer: Arc<dyn OutputConsumer>,
        default_language: &str,
        emit_digest: bool,
        coverage_enabled: bool,
    ) -> Result<()> {
        if diagnostics.has_fatal_errors() {
            consumer.consume_problems(diagnostics.problems());
            return Ok(());
        }

        let render_context = RenderContext {
            default_language: default_language.to_string(),
            topic_graph_hash: topic_graph.structural_hash(),
        };

        if self.is_cancelled() {
            return Err(CatalogError::RegistrationCancelled);
        }

        let rendered = self
            .render_phase(topic_graph.clone(), consumer.clone(), coverage_enabled)
            .await;

        if self.is_cancelled() {
            tracing::info!("conversion cancelled mid-render, skipping serial emission phase");
            return Ok(());
        }

        if emit_digest {
            consumer.consume_problems(diagnostics.problems());
        }

        let warnings = diagnostics
            .problems()
            .iter()
            .filter(|p| matches!(p.severity, crate::diagnostics::Severity::Warning))
            .count();
        let errors = diagnostics
            .problems()
            .iter()
            .filter(|p| matches!(p.severity, crate::diagnostics::Severity::Error))
            .count();

        consumer.consume_build_metadata(BuildMetadata {
            schema_version: "1".to_string(),
            pages_rendered: rendered,
            warnings,
            errors,
        });

        consumer.consume_benchmarks(BenchmarkRecord {
            topic_graph_hash: render_context.topic_graph_hash,
            topic_anchor_hash: anchor_hash(&topic_graph),
            external_topics_hash: 0,
            peak_memory_bytes: 0,
        });

        Ok(())
    }

    /// Concurrent render phase (spec §4.7 step 5, §5 "render conversion runs as a parallel
    /// for-each over all known pages"). Polls the cancellation flag between dispatching each task.
    ///
    /// Each render task also gathers its page's link summary, indexing record, and (if enabled)
    /// coverage entry, appending them to shared buffers behind a single-writer lock (spec §4.7
    /// step 5). Once every task has joined, the buffers are sorted by identifier (spec §5
    /// ordering guarantee) and handed to the consumer in the serial emission phase.
    async fn render_phase(
        &self,
        topic_graph: Arc<TopicGraph>,
        consumer: Arc<dyn OutputConsumer>,
        coverage_enabled: bool,
    ) -> usize {
        let mut tasks = JoinSet::new();
        let mut dispatched = 0;

        let link_summaries = Arc::new(Mutex::new(Vec::new()));
        let indexing_records = Arc::new(Mutex::new(Vec::new()));
        let coverage = Arc::new(Mutex::new(Vec::new()));

        for id in topic_graph.node_ids().collect::<Vec<_>>() {
            if self.is_cancelled() {
                break;
            }
            let Some(node) = topic_graph.node(id) else { continue };
            if node.is_virtual {
                continue;
            }
            let render_node = RenderNode {
                identifier: node.reference,
                title: node.title.clone(),
                kind: node.kind.clone(),
            };
            let link_summary = LinkSummary {
                identifier: node.reference,
                title: node.title.clone(),
                kind: node.kind.clone(),
            };
            let indexing_record = IndexingRecord {
                identifier: node.reference,
                title: node.title.clone(),
                kind: node.kind.clone(),
            };
            let coverage_entry = coverage_enabled.then(|| CoverageEntry {
                identifier: node.reference,
                title: node.title.clone(),
                has_documentation: matches!(node.content_location, ContentLocation::File(_)),
            });

            let consumer = consumer.clone();
            let link_summaries = link_summaries.clone();
            let indexing_records = indexing_records.clone();
            let coverage = coverage.clone();
            tasks.spawn(async move {
                consumer.consume_render_node(render_node);
                link_summaries
                    .lock()
                    .expect("link summary buffer poisoned")
                    .push(link_summary);
                indexing_records
                    .lock()
                    .expect("indexing record buffer poisoned")
                    .push(indexing_record);
                if let Some(entry) = coverage_entry {
                    coverage.lock().expect("coverage buffer poisoned").push(entry);
                }
            });
            dispatched += 1;
        }

        while tasks.join_next().await.is_some() {}

        let mut link_summaries = Arc::try_unwrap(link_summaries)
            .expect("all render tasks joined")
            .into_inner()
            .expect("link summary buffer not poisoned");
        link_summaries.sort_by_key(|s| s.identifier);
        consumer.consume_link_summaries(link_summaries);

        let mut indexing_records = Arc::try_unwrap(indexing_records)
            .expect("all render tasks joined")
            .into_inner()
            .expect("indexing record buffer not poisoned");
        indexing_records.sort_by_key(|r| r.identifier);
        consumer.consume_indexing_records(indexing_records);

        consumer.consume_assets(BTreeMap::new());

        if coverage_enabled {
            let mut coverage = Arc::try_unwrap(coverage)
                .expect("all render tasks joined")
                .into_inner()
                .expect("coverage buffer not poisoned");
            coverage.sort_by_key(|c| c.identifier);
            consumer.consume_coverage(coverage);
        }

        dispatched
    }
}

/// Placeholder anchor-hash computation (spec §4.7 step 7 "topic-anchor hash"): a hash of every
/// node's title, sorted by identifier, standing in for the renderer's actual per-page anchor
/// table which lives outside this core.
fn anchor_hash(topic_graph: &TopicGraph) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut titles: BTreeMap<Identifier, String> = BTreeMap::new();
    for id in topic_graph.node_ids() {
        if let Some(node) = topic_graph.node(id) {
            titles.insert(id, node.title.clone());
        }
    }
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    titles.hash(&mut hasher);
    hasher.finish()
}
