use std::collections::HashMap;
use std::sync::Mutex;

use atlas_core::config::SearchLimits;
use atlas_core::traits::{Embedder, EntityLinker, GraphSource, KeywordSource, MetadataSource, NeighborSource};
use atlas_core::types::{
    ChunkHit, ChunkId, ChunkKey, ChunkNeighborhood, DocumentId, DocumentMetadata, Entity, GraphDocument, GraphEntity,
    KeywordHit,
};
use atlas_core::{Distance, Error, Result};
use atlas_graph::{CoordinateInput, GraphSnapshot, MemoryGraphStore, NodeKind};
use atlas_graph::memory::{Mention, SnapshotChunk};
use atlas_search::{SearchOutcome, SearchParams, SearchService};

struct UnitEmbedder;

impl Embedder for UnitEmbedder {
    fn dim(&self) -> usize { 1 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { Ok(vec![vec![1.0]; texts.len()]) }
}

#[derive(Default)]
struct FakeNeighbors {
    hits: Vec<ChunkHit>,
    pools: Mutex<Vec<usize>>,
}

impl NeighborSource for FakeNeighbors {
    fn nearest(&self, _query_vec: &[f32], pool: usize) -> Result<Vec<ChunkHit>> {
        self.pools.lock().unwrap().push(pool);
        let mut hits = self.hits.clone();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(pool);
        Ok(hits)
    }
}

struct DownNeighbors;

impl NeighborSource for DownNeighbors {
    fn nearest(&self, _query_vec: &[f32], _pool: usize) -> Result<Vec<ChunkHit>> {
        Err(Error::unavailable("vector store", "connection refused"))
    }
}

struct FakeMetadata(HashMap<DocumentId, DocumentMetadata>);

impl MetadataSource for FakeMetadata {
    fn documents(&self, ids: &[DocumentId]) -> Result<HashMap<DocumentId, DocumentMetadata>> {
        Ok(ids.iter().filter_map(|id| self.0.get(id).map(|m| (id.clone(), m.clone()))).collect())
    }
}

struct BrokenMetadata;

impl MetadataSource for BrokenMetadata {
    fn documents(&self, _ids: &[DocumentId]) -> Result<HashMap<DocumentId, DocumentMetadata>> {
        Err(Error::Storage("relation \"document\" does not exist".into()))
    }
}

struct DownLinker;

impl EntityLinker for DownLinker {
    fn entities_for(&self, _chunk_ids: &[ChunkId]) -> Result<HashMap<ChunkId, Vec<Entity>>> {
        Err(Error::unavailable("entity linker", "timeout"))
    }
}

struct FailingGraph(fn() -> Error);

impl GraphSource for FailingGraph {
    fn neighborhoods(&self, _keys: &[ChunkKey], _max: usize) -> Result<Vec<ChunkNeighborhood>> { Err((self.0)()) }
}

fn hit(doc: &str, ordinal: u32, distance: f64) -> ChunkHit {
    ChunkHit {
        chunk_id: format!("{doc}:{ordinal}"),
        document_id: doc.to_string(),
        ordinal,
        text: format!("passage {ordinal} of {doc}"),
        distance: Distance::new(distance),
    }
}

fn neighbors() -> FakeNeighbors {
    FakeNeighbors {
        hits: vec![hit("doc2", 1, 0.4), hit("doc1", 0, 0.1), hit("doc1", 2, 0.5), hit("doc2", 0, 0.3), hit("doc1", 1, 0.2)],
        ..Default::default()
    }
}

fn metadata() -> FakeMetadata {
    let mut m = HashMap::new();
    m.insert("doc1".to_string(), DocumentMetadata { title: Some("Rivers".into()), source_url: Some("/txt/rivers.txt".into()), content_hash: Some("h1".into()) });
    m.insert("doc2".to_string(), DocumentMetadata { title: Some("Engines".into()), source_url: None, content_hash: Some("h2".into()) });
    FakeMetadata(m)
}

fn graph_store() -> MemoryGraphStore {
    let chunk = |id: &str, h: &str, ordinal: u32| SnapshotChunk {
        chunk_id: Some(id.to_string()),
        content_hash: h.to_string(),
        ordinal,
        text: format!("passage {ordinal}"),
    };
    let mention = |h: &str, ordinal: u32, e: &str| Mention { content_hash: h.into(), ordinal, entity_id: e.into() };
    MemoryGraphStore::from_snapshot(GraphSnapshot {
        documents: vec![
            GraphDocument { content_hash: "h1".into(), title: Some("Rivers".into()), source_url: None },
            GraphDocument { content_hash: "h2".into(), title: Some("Engines".into()), source_url: None },
        ],
        chunks: vec![chunk("doc1:0", "h1", 0), chunk("doc1:1", "h1", 1), chunk("doc2:0", "h2", 0)],
        entities: vec![
            GraphEntity { id: "e1".into(), name: "Acme".into(), kind: "ORG".into() },
            GraphEntity { id: "e2".into(), name: "Bob".into(), kind: "PERSON".into() },
        ],
        mentions: vec![mention("h1", 0, "e1"), mention("h1", 1, "e1"), mention("h1", 1, "e2"), mention("h2", 0, "e2")],
    })
    .unwrap()
}

fn params(query: &str) -> SearchParams { SearchParams::with_defaults(query, &SearchLimits::default()) }

#[test]
fn documents_are_ranked_with_metadata_and_entities() {
    let (n, m, g) = (neighbors(), metadata(), graph_store());
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default()).with_linker(&g);
    let p = SearchParams { top_chunks: 2, top_docs: 2, include_entities: true, ..params("rivers") };

    let resp = svc.search_documents(&p).unwrap().ranked().unwrap();
    assert_eq!(resp.query, "rivers");
    assert_eq!(resp.top_docs, 2);
    assert_eq!(resp.results.len(), 2);

    let d1 = &resp.results[0];
    assert_eq!(d1.document_id, "doc1");
    assert!((d1.avg_distance.value() - 0.15).abs() < 1e-9);
    assert_eq!(d1.title.as_deref(), Some("Rivers"));
    assert_eq!(d1.entities, vec![Entity::new("Acme", "ORG"), Entity::new("Bob", "PERSON")]);

    let d2 = &resp.results[1];
    assert!((d2.avg_distance.value() - 0.35).abs() < 1e-9);
    assert_eq!(d2.entities, vec![Entity::new("Bob", "PERSON")]);
}

#[test]
fn entities_are_omitted_unless_requested() {
    let (n, m, g) = (neighbors(), metadata(), graph_store());
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default()).with_linker(&g);
    let resp = svc.search_documents(&params("rivers")).unwrap().ranked().unwrap();
    assert!(resp.results.iter().all(|d| d.entities.is_empty()));
}

#[test]
fn empty_pool_is_no_matches() {
    let (n, m) = (FakeNeighbors::default(), metadata());
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default());

    let outcome = svc.search_documents(&params("nothing")).unwrap();
    assert_eq!(outcome, SearchOutcome::NoMatches { query: "nothing".into() });
    assert!(svc.search_with_graph(&params("nothing")).unwrap().is_no_matches());
    assert!(svc.search_chunks("nothing", 5, false).unwrap().is_no_matches());
}

#[test]
fn pool_is_raised_to_fill_requested_shape() {
    let (n, m) = (neighbors(), metadata());
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default());
    svc.search_documents(&SearchParams { chunk_pool: 10, top_docs: 5, top_chunks: 3, ..params("q") }).unwrap();
    svc.search_documents(&SearchParams { chunk_pool: 10, top_docs: 4, top_chunks: 2, ..params("q") }).unwrap();
    assert_eq!(*n.pools.lock().unwrap(), vec![15, 10]);
}

#[test]
fn out_of_bounds_parameters_are_rejected_before_lookup() {
    let (n, m) = (neighbors(), metadata());
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default());
    let bad = [
        (SearchParams { query: "  ".into(), ..params("q") }, "query"),
        (SearchParams { top_docs: 0, ..params("q") }, "top_docs"),
        (SearchParams { top_docs: 51, ..params("q") }, "top_docs"),
        (SearchParams { top_chunks: 21, ..params("q") }, "top_chunks"),
        (SearchParams { chunk_pool: 5, ..params("q") }, "chunk_pool"),
        (SearchParams { chunk_pool: 2001, ..params("q") }, "chunk_pool"),
        (SearchParams { max_entities_per_chunk: 11, ..params("q") }, "max_entities_per_chunk"),
    ];
    for (p, field) in bad {
        match svc.search_documents(&p) {
            Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, field),
            other => panic!("expected invalid {field}, got {other:?}"),
        }
    }
    assert!(n.pools.lock().unwrap().is_empty());
}

#[test]
fn unreachable_linker_still_returns_documents() {
    let (n, m) = (neighbors(), metadata());
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default()).with_linker(&DownLinker);
    let p = SearchParams { include_entities: true, ..params("rivers") };
    let resp = svc.search_documents(&p).unwrap().ranked().unwrap();
    assert_eq!(resp.results.len(), 2);
    assert!(resp.results.iter().all(|d| d.entities.is_empty()));
}

#[test]
fn ranking_stage_failures_are_hard_errors() {
    let m = metadata();
    let svc = SearchService::new(&UnitEmbedder, &DownNeighbors, &m, SearchLimits::default());
    assert!(matches!(svc.search_documents(&params("q")), Err(Error::CollaboratorUnavailable { collaborator: "vector store", .. })));

    let n = neighbors();
    let svc = SearchService::new(&UnitEmbedder, &n, &BrokenMetadata, SearchLimits::default());
    assert!(matches!(svc.search_documents(&params("q")), Err(Error::Storage(_))));
}

#[test]
fn combined_response_flattens_and_builds_graph() {
    let (n, m, g) = (neighbors(), metadata(), graph_store());
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default()).with_graph_source(&g);
    let p = SearchParams { top_docs: 2, with_graph: true, ..params("rivers") };

    let resp = svc.search_with_graph(&p).unwrap().ranked().unwrap();
    let scores: Vec<f64> = resp.hits.iter().map(|h| h.score.value()).collect();
    assert_eq!(scores, vec![-0.1, -0.2, -0.3, -0.4, -0.5]);
    assert_eq!(resp.hits[0].content_hash.as_deref(), Some("h1"));
    assert_eq!(resp.hits[0].title.as_deref(), Some("Rivers"));

    // (h2,1) and (h1,2) are not in the graph store
    assert_eq!(resp.graph.count(NodeKind::Document), 2);
    assert_eq!(resp.graph.count(NodeKind::Chunk), 3);
    assert_eq!(resp.graph.count(NodeKind::Entity), 2);
    assert_eq!(resp.graph.edges.len(), 7);
}

#[test]
fn flatten_limit_follows_top_docs() {
    let (n, m) = (neighbors(), metadata());
    let limits = SearchLimits { flatten_multiplier: 1, ..SearchLimits::default() };
    let svc = SearchService::new(&UnitEmbedder, &n, &m, limits.clone());
    let p = SearchParams { top_docs: 2, ..SearchParams::with_defaults("q", &limits) };
    let resp = svc.search_with_graph(&p).unwrap().ranked().unwrap();
    assert_eq!(resp.hits.len(), 2);
    assert!(resp.graph.is_empty(), "graph not requested");
}

#[test]
fn unreachable_graph_store_degrades_to_empty_graph() {
    let (n, m) = (neighbors(), metadata());
    let down = FailingGraph(|| Error::unavailable("graph store", "connection refused"));
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default()).with_graph_source(&down);
    let p = SearchParams { with_graph: true, ..params("rivers") };

    let resp = svc.search_with_graph(&p).unwrap().ranked().unwrap();
    assert_eq!(resp.hits.len(), 5);
    assert!(resp.graph.is_empty());
}

#[test]
fn structural_graph_failure_is_propagated() {
    let (n, m) = (neighbors(), metadata());
    let broken = FailingGraph(|| Error::Storage("syntax error in traversal".into()));
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default()).with_graph_source(&broken);
    let p = SearchParams { with_graph: true, ..params("rivers") };
    assert!(matches!(svc.search_with_graph(&p), Err(Error::GraphAssembly(_))));
}

#[test]
fn graph_for_skips_invalid_coordinates() {
    let (n, m, g) = (neighbors(), metadata(), graph_store());
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default()).with_graph_source(&g);
    let inputs = vec![
        CoordinateInput::new("h1", 0),
        CoordinateInput::new("h1", "1"),
        CoordinateInput { content_hash: None, ordinal: Some(2.into()) },
        CoordinateInput::new("h1", "two"),
    ];

    let graph = svc.graph_for(&inputs, 1).unwrap();
    assert_eq!(graph.count(NodeKind::Document), 1);
    assert_eq!(graph.count(NodeKind::Chunk), 2);
    assert_eq!(graph.count(NodeKind::Entity), 1, "cap of one entity per chunk");

    assert!(matches!(svc.graph_for(&inputs, 11), Err(Error::InvalidParameter { .. })));
    assert!(svc.graph_for(&[], 5).unwrap().is_empty());
}

#[test]
fn graph_for_without_graph_store_is_empty() {
    let (n, m) = (neighbors(), metadata());
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default());
    assert!(svc.graph_for(&[CoordinateInput::new("h1", 0)], 5).unwrap().is_empty());
}

#[test]
fn chunk_search_lists_nearest_passages() {
    let (n, m, g) = (neighbors(), metadata(), graph_store());
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default()).with_linker(&g);

    let plain = svc.search_chunks("rivers", 3, false).unwrap().ranked().unwrap();
    assert_eq!(plain.top_k, 3);
    let ids: Vec<&str> = plain.results.iter().map(|r| r.chunk_id.as_str()).collect();
    assert_eq!(ids, vec!["doc1:0", "doc1:1", "doc2:0"]);
    assert!(plain.results.iter().all(|r| r.entities.is_none()));
    let json = serde_json::to_value(&plain.results[0]).unwrap();
    assert!(json.get("entities").is_none());

    let linked = svc.search_chunks("rivers", 3, true).unwrap().ranked().unwrap();
    assert_eq!(linked.results[1].entities.as_deref(), Some(&[Entity::new("Acme", "ORG"), Entity::new("Bob", "PERSON")][..]));
    assert_eq!(linked.results[2].entities.as_deref(), Some(&[Entity::new("Bob", "PERSON")][..]));

    assert!(matches!(svc.search_chunks("rivers", 0, false), Err(Error::InvalidParameter { name: "top_k", .. })));
}

#[test]
fn outcomes_serialize_with_status_tag() {
    let (n, m) = (neighbors(), metadata());
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default());
    let ranked = serde_json::to_value(svc.search_documents(&params("rivers")).unwrap()).unwrap();
    assert_eq!(ranked["status"], "ranked");
    assert_eq!(ranked["results"][0]["document_id"], "doc1");

    let empty = FakeNeighbors::default();
    let svc = SearchService::new(&UnitEmbedder, &empty, &m, SearchLimits::default());
    let none = serde_json::to_value(svc.search_documents(&params("rivers")).unwrap()).unwrap();
    assert_eq!(none, serde_json::json!({"status": "no_matches", "query": "rivers"}));
}

struct FakeKeywords(Vec<KeywordHit>);

impl KeywordSource for FakeKeywords {
    fn keyword_search(&self, query: &str, k: usize) -> Result<Vec<KeywordHit>> {
        let mut hits: Vec<KeywordHit> = self.0.iter().filter(|h| h.text.contains(query)).cloned().collect();
        hits.truncate(k);
        Ok(hits)
    }
}

fn passage(doc: &str, ordinal: u32, text: &str, bm25_score: f32) -> KeywordHit {
    KeywordHit {
        chunk_id: format!("{doc}:{ordinal}"),
        document_id: doc.to_string(),
        content_hash: format!("{doc}-hash"),
        ordinal,
        text: text.to_string(),
        bm25_score,
    }
}

#[test]
fn keyword_search_returns_scored_passages() {
    let (n, m) = (neighbors(), metadata());
    let kw = FakeKeywords(vec![
        passage("doc1", 2, "salmon salmon run", 2.5),
        passage("doc2", 0, "salmon swim upstream", 1.1),
        passage("doc2", 1, "diesel engines", 0.9),
    ]);
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default()).with_keyword_source(&kw);

    let found = svc.search_keywords("salmon", 5).unwrap().ranked().unwrap();
    assert_eq!(found.k, 5);
    let ids: Vec<&str> = found.results.iter().map(|h| h.chunk_id.as_str()).collect();
    assert_eq!(ids, vec!["doc1:2", "doc2:0"]);
    assert_eq!(found.results[0].bm25_score, 2.5);

    let one = svc.search_keywords("salmon", 1).unwrap().ranked().unwrap();
    assert_eq!(one.results.len(), 1);

    let json = serde_json::to_value(svc.search_keywords("salmon", 1).unwrap()).unwrap();
    assert_eq!(json["status"], "ranked");
    assert_eq!(json["results"][0]["chunk_id"], "doc1:2");
    assert_eq!(json["results"][0]["text"], "salmon salmon run");
}

#[test]
fn keyword_search_without_matches_or_index() {
    let (n, m) = (neighbors(), metadata());
    let kw = FakeKeywords(vec![passage("doc1", 0, "salmon", 1.0)]);
    let svc = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default()).with_keyword_source(&kw);
    assert!(svc.search_keywords("turbines", 3).unwrap().is_no_matches());
    assert!(matches!(svc.search_keywords("salmon", 0), Err(Error::InvalidParameter { name: "k", .. })));
    assert!(matches!(svc.search_keywords("  ", 3), Err(Error::InvalidParameter { name: "query", .. })));

    let bare = SearchService::new(&UnitEmbedder, &n, &m, SearchLimits::default());
    assert!(matches!(
        bare.search_keywords("salmon", 3),
        Err(Error::CollaboratorUnavailable { collaborator: "keyword index", .. })
    ));
}
