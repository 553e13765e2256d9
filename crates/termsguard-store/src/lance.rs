//! LanceDB-backed rule index.
//!
//! One table, `rules`: `rule_id`, `domains` (`,A,B,` so a single `LIKE`
//! matches a whole label), `rationale`, and `vector`
//! (`FixedSizeList<Float32, dim>`). Queried with cosine distance and an SQL
//! domain prefilter.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, FixedSizeListBuilder, Float32Array, Float32Builder, RecordBatchIterator, StringArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::DistanceType;
use lancedb::query::{ExecutableQuery, QueryBase};
use termsguard_core::{DomainSet, Rule};
use tracing::info;

use crate::StoreError;
use crate::index::{Neighbor, NeighborIndex};

const RULES_TABLE: &str = "rules";
const DISTANCE_COLUMN: &str = "_distance";

pub struct LanceRuleIndex {
    table: lancedb::Table,
    dim: usize,
}

impl LanceRuleIndex {
    /// Create (or replace) the `rules` table at `path`.
    ///
    /// `vectors[i]` is the embedded rationale of `rules[i]`.
    pub async fn build(
        path: &Path,
        rules: &[Rule],
        vectors: &[Vec<f32>],
        dim: usize,
    ) -> Result<Self, StoreError> {
        if rules.is_empty() {
            return Err(StoreError::Empty);
        }
        if rules.len() != vectors.len() {
            return Err(StoreError::Other(format!(
                "{} rules but {} vectors",
                rules.len(),
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(StoreError::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }

        let db = connect(path).await?;
        let batch = rules_batch(rules, vectors, dim)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        let existing = db.table_names().execute().await?;
        if existing.iter().any(|name| name == RULES_TABLE) {
            db.drop_table(RULES_TABLE, &[]).await?;
        }
        let table = db
            .create_table(RULES_TABLE, Box::new(reader))
            .execute()
            .await?;

        info!(
            table = RULES_TABLE,
            rows = rules.len(),
            dim,
            "created LanceDB rule table"
        );
        Ok(Self { table, dim })
    }

    /// Open an existing `rules` table.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let db = connect(path).await?;
        let table = db.open_table(RULES_TABLE).execute().await?;
        let schema = table.schema().await?;
        let dim = match schema.field_with_name("vector")?.data_type() {
            DataType::FixedSizeList(_, n) => *n as usize,
            other => {
                return Err(StoreError::Other(format!(
                    "unexpected vector column type: {other:?}"
                )));
            }
        };
        Ok(Self { table, dim })
    }

    pub async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.table.count_rows(None).await?)
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        predicate: Option<&str>,
    ) -> Result<Vec<RecordBatch>, lancedb::Error> {
        let mut query = self
            .table
            .vector_search(vector)?
            .distance_type(DistanceType::Cosine)
            .limit(k);
        if let Some(predicate) = predicate {
            query = query.only_if(predicate);
        }
        query.execute().await?.try_collect().await
    }
}

#[async_trait]
impl NeighborIndex for LanceRuleIndex {
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&DomainSet>,
    ) -> Result<Vec<Neighbor>, StoreError> {
        if vector.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        let batches = match filter {
            None => self.query(vector, k, None).await?,
            Some(domains) => {
                let predicate = domain_predicate(domains)
                    .ok_or_else(|| StoreError::FilterRejected("empty domain filter".into()))?;
                self.query(vector, k, Some(&predicate))
                    .await
                    .map_err(|e| StoreError::FilterRejected(e.to_string()))?
            }
        };
        neighbors(&batches)
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

async fn connect(path: &Path) -> Result<lancedb::Connection, StoreError> {
    let uri = path
        .to_str()
        .ok_or_else(|| StoreError::Other("non-UTF8 database path".into()))?;
    Ok(lancedb::connect(uri).execute().await?)
}

/// `domains LIKE '%,A,%' OR domains LIKE '%,B,%'`, or `None` for no domains.
fn domain_predicate(domains: &DomainSet) -> Option<String> {
    if domains.is_empty() {
        return None;
    }
    let terms: Vec<String> = domains
        .iter()
        .map(|d| format!("domains LIKE '%,{},%'", d.as_str()))
        .collect();
    Some(terms.join(" OR "))
}

fn encode_domains(domains: &DomainSet) -> String {
    let mut s = String::from(",");
    for d in domains {
        s.push_str(d.as_str());
        s.push(',');
    }
    s
}

fn rules_batch(rules: &[Rule], vectors: &[Vec<f32>], dim: usize) -> Result<RecordBatch, StoreError> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("rule_id", DataType::Utf8, false),
        Field::new("domains", DataType::Utf8, false),
        Field::new("rationale", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dim as i32,
            ),
            true,
        ),
    ]));

    let mut vector_builder = FixedSizeListBuilder::new(Float32Builder::new(), dim as i32);
    for v in vectors {
        vector_builder.values().append_slice(v);
        vector_builder.append(true);
    }

    let columns: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from_iter_values(
            rules.iter().map(|r| r.rule_id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            rules.iter().map(|r| encode_domains(&r.domains)),
        )),
        Arc::new(StringArray::from_iter_values(
            rules.iter().map(|r| r.rationale.as_str()),
        )),
        Arc::new(vector_builder.finish()),
    ];
    Ok(RecordBatch::try_new(schema, columns)?)
}

fn neighbors(batches: &[RecordBatch]) -> Result<Vec<Neighbor>, StoreError> {
    let mut out = Vec::new();
    for batch in batches {
        let ids = batch
            .column_by_name("rule_id")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| StoreError::Other("missing rule_id column".into()))?;
        let distances = batch
            .column_by_name(DISTANCE_COLUMN)
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
            .ok_or_else(|| StoreError::Other("missing _distance column".into()))?;
        for i in 0..batch.num_rows() {
            out.push(Neighbor {
                rule_id: ids.value(i).to_string(),
                distance: distances.value(i).clamp(0.0, 2.0),
            });
        }
    }
    out.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    Ok(out)
}
