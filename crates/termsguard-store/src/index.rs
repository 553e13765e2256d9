//! Nearest-neighbor search over embedded rule rationales.

use async_trait::async_trait;
use termsguard_core::DomainSet;

use crate::StoreError;

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub rule_id: String,
    /// Cosine distance in `[0, 2]`: 0 identical, 1 orthogonal, 2 opposite.
    pub distance: f32,
}

/// A read-only index of rule vectors.
///
/// `filter` restricts hits to rules sharing at least one domain with it.
/// Backends that cannot evaluate a filter return [`StoreError::FilterRejected`];
/// callers retry unfiltered.
#[async_trait]
pub trait NeighborIndex: Send + Sync {
    /// Up to `k` neighbors of `vector`, ascending by distance.
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&DomainSet>,
    ) -> Result<Vec<Neighbor>, StoreError>;

    /// One result per query, in query order. A failed query does not fail
    /// the batch.
    async fn search_many(
        &self,
        queries: &[Query<'_>],
        k: usize,
    ) -> Vec<Result<Vec<Neighbor>, StoreError>> {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            results.push(self.search(query.vector, k, query.filter).await);
        }
        results
    }

    fn dim(&self) -> usize;
}

/// A single query of a [`NeighborIndex::search_many`] batch.
#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    pub vector: &'a [f32],
    pub filter: Option<&'a DomainSet>,
}

struct Entry {
    rule_id: String,
    domains: DomainSet,
    vector: Vec<f32>,
}

/// Exact brute-force cosine index. Vectors must be L2-normalized.
pub struct MemoryIndex {
    dim: usize,
    entries: Vec<Entry>,
}

impl MemoryIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    pub fn insert(
        &mut self,
        rule_id: impl Into<String>,
        domains: DomainSet,
        vector: Vec<f32>,
    ) -> Result<(), StoreError> {
        self.check_dim(&vector)?;
        self.entries.push(Entry {
            rule_id: rule_id.into(),
            domains,
            vector,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn rank(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&DomainSet>,
    ) -> Result<Vec<Neighbor>, StoreError> {
        self.check_dim(vector)?;
        if let Some(domains) = filter
            && domains.is_empty()
        {
            return Err(StoreError::FilterRejected("empty domain filter".into()));
        }

        let mut hits: Vec<Neighbor> = self
            .entries
            .iter()
            .filter(|e| filter.is_none_or(|f| !e.domains.is_disjoint(f)))
            .map(|e| Neighbor {
                rule_id: e.rule_id.clone(),
                distance: cosine_distance(vector, &e.vector),
            })
            .collect();
        // Stable sort keeps insertion order among ties.
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    fn check_dim(&self, vector: &[f32]) -> Result<(), StoreError> {
        if vector.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NeighborIndex for MemoryIndex {
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&DomainSet>,
    ) -> Result<Vec<Neighbor>, StoreError> {
        self.rank(vector, k, filter)
    }

    async fn search_many(
        &self,
        queries: &[Query<'_>],
        k: usize,
    ) -> Vec<Result<Vec<Neighbor>, StoreError>> {
        queries
            .iter()
            .map(|q| self.rank(q.vector, k, q.filter))
            .collect()
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

/// `1 - a·b` for normalized vectors, clamped to `[0, 2]`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    (1.0 - dot).clamp(0.0, 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use termsguard_core::Domain;

    fn index() -> MemoryIndex {
        let mut idx = MemoryIndex::new(3);
        idx.insert("RET", [Domain::DataRetention].into(), vec![1.0, 0.0, 0.0])
            .unwrap();
        idx.insert("SHARE", [Domain::DataSharing].into(), vec![0.0, 1.0, 0.0])
            .unwrap();
        idx.insert(
            "BOTH",
            [Domain::DataRetention, Domain::DataSharing].into(),
            vec![0.6, 0.8, 0.0],
        )
        .unwrap();
        idx
    }

    #[tokio::test]
    async fn ranks_by_ascending_distance() {
        let hits = index().search(&[1.0, 0.0, 0.0], 3, None).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["RET", "BOTH", "SHARE"]);
        assert!(hits[0].distance.abs() < 1e-6);
        assert!((hits[1].distance - 0.4).abs() < 1e-6);
        assert!((hits[2].distance - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn truncates_to_k() {
        let hits = index().search(&[1.0, 0.0, 0.0], 2, None).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn domain_filter_requires_overlap() {
        let filter = DomainSet::from([Domain::DataSharing]);
        let hits = index()
            .search(&[1.0, 0.0, 0.0], 3, Some(&filter))
            .await
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["BOTH", "SHARE"]);
    }

    #[tokio::test]
    async fn empty_filter_is_rejected() {
        let err = index()
            .search(&[1.0, 0.0, 0.0], 2, Some(&DomainSet::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::FilterRejected(_)));
    }

    #[tokio::test]
    async fn batch_keeps_query_order_and_isolates_failures() {
        let sharing = DomainSet::from([Domain::DataSharing]);
        let empty = DomainSet::new();
        let queries = [
            Query {
                vector: &[0.0, 1.0, 0.0],
                filter: None,
            },
            Query {
                vector: &[1.0, 0.0, 0.0],
                filter: Some(&empty),
            },
            Query {
                vector: &[1.0, 0.0, 0.0],
                filter: Some(&sharing),
            },
        ];
        let results = index().search_many(&queries, 1).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap()[0].rule_id, "SHARE");
        assert!(matches!(results[1], Err(StoreError::FilterRejected(_))));
        assert_eq!(results[2].as_ref().unwrap()[0].rule_id, "BOTH");
    }

    #[tokio::test]
    async fn dimension_mismatch() {
        let err = index().search(&[1.0, 0.0], 2, None).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));

        let mut idx = MemoryIndex::new(2);
        assert!(idx.insert("X", DomainSet::new(), vec![1.0]).is_err());
    }

    #[test]
    fn distance_range() {
        assert_eq!(cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]), 2.0);
        assert_eq!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
