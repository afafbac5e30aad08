//! Corpus domain models
//!
//! Papers, authors, venues and the per-author engagement history. These are the
//! normalized shapes the analytics code works with; raw ingestion documents are
//! converted at the boundary (see [`PaperDocument`] and [`AuthorRef`]).

mod author_ref;

pub use author_ref::{normalize_author_refs, AuthorRecordRef, AuthorRef};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A paper with its author list already normalized to plain ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,

    #[serde(default)]
    pub year: Option<i32>,

    /// Citation count; absent means zero wherever citations are aggregated
    #[serde(default)]
    pub n_citation: Option<i64>,

    #[serde(default)]
    pub venue: Option<String>,

    #[serde(default)]
    pub authors: Vec<String>,
}

impl Paper {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            abstract_text: None,
            year: None,
            n_citation: None,
            venue: None,
            authors: Vec::new(),
        }
    }

    pub fn with_citations(mut self, n_citation: i64) -> Self {
        self.n_citation = Some(n_citation);
        self
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Citation count with absent (or negative) values read as zero
    pub fn citations(&self) -> u64 {
        self.n_citation.map_or(0, |n| n.max(0) as u64)
    }
}

/// Paper as it arrives from ingestion, before author normalization
#[derive(Debug, Clone, Deserialize)]
pub struct PaperDocument {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub n_citation: Option<i64>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub authors: Vec<AuthorRef>,
}

impl From<PaperDocument> for Paper {
    fn from(doc: PaperDocument) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            abstract_text: doc.abstract_text,
            year: doc.year,
            n_citation: doc.n_citation,
            venue: doc.venue,
            authors: normalize_author_refs(doc.authors),
        }
    }
}

/// Kind of engagement event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Like,
    Unlike,
}

/// One entry of an author's append-only history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub event: EventKind,

    /// Seconds since the Unix epoch
    pub time: i64,

    /// Id of the referenced paper
    pub description: String,
}

impl HistoryEvent {
    pub fn at(event: EventKind, paper_id: impl Into<String>, time: i64) -> Self {
        Self {
            event,
            time,
            description: paper_id.into(),
        }
    }

    /// A `like` stamped with the current time
    pub fn like(paper_id: impl Into<String>) -> Self {
        Self::at(EventKind::Like, paper_id, Utc::now().timestamp())
    }

    /// An `unlike` stamped with the current time
    pub fn unlike(paper_id: impl Into<String>) -> Self {
        Self::at(EventKind::Unlike, paper_id, Utc::now().timestamp())
    }

    pub fn paper_id(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Organization name
    #[serde(default)]
    pub org: Option<String>,

    #[serde(default)]
    pub gid: Option<String>,

    #[serde(default)]
    pub oid: Option<String>,

    /// Organization id
    #[serde(default)]
    pub orgid: Option<String>,

    /// Absent until computed
    #[serde(default)]
    pub h_index: Option<u32>,

    #[serde(default)]
    pub papers: Vec<String>,

    /// Per-paper embedding vectors keyed by paper id
    #[serde(default)]
    pub vectorized_papers: BTreeMap<String, Vec<f32>>,

    #[serde(default)]
    pub history: Vec<HistoryEvent>,
}

impl Author {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            org: None,
            gid: None,
            oid: None,
            orgid: None,
            h_index: None,
            papers: Vec::new(),
            vectorized_papers: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    pub fn with_papers<I, S>(mut self, papers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.papers = papers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_h_index(mut self, h_index: u32) -> Self {
        self.h_index = Some(h_index);
        self
    }

    pub fn with_paper_vector(mut self, paper_id: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectorized_papers.insert(paper_id.into(), vector);
        self
    }

    /// Mean of the per-paper embeddings.
    ///
    /// Vectors whose dimension differs from the first one are ignored.
    /// Returns `None` when the author has no usable embedding.
    pub fn mean_embedding(&self) -> Option<Vec<f32>> {
        let mut vectors = self.vectorized_papers.values().filter(|v| !v.is_empty());
        let first = vectors.next()?;
        let mut sum = first.clone();
        let mut count = 1usize;

        for vector in vectors {
            if vector.len() != sum.len() {
                continue;
            }
            for (acc, value) in sum.iter_mut().zip(vector) {
                *acc += value;
            }
            count += 1;
        }

        let n = count as f32;
        sum.iter_mut().for_each(|v| *v /= n);
        Some(sum)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    #[serde(alias = "_id")]
    pub id: String,

    /// Display name
    #[serde(default, rename = "name_d")]
    pub name: Option<String>,

    /// Raw/short name as found in the source data
    #[serde(default)]
    pub raw: Option<String>,

    #[serde(default, rename = "type")]
    pub venue_type: Option<i32>,

    #[serde(default)]
    pub papers_count: u64,
}

impl Venue {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            raw: None,
            venue_type: None,
            papers_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_citations_read_as_zero() {
        let paper = Paper::new("p1");
        assert_eq!(paper.citations(), 0);
        assert_eq!(Paper::new("p2").with_citations(-4).citations(), 0);
        assert_eq!(Paper::new("p3").with_citations(12).citations(), 12);
    }

    #[test]
    fn test_paper_document_normalizes_mixed_authors() {
        let doc: PaperDocument = serde_json::from_value(serde_json::json!({
            "_id": "p1",
            "title": "On graphs",
            "n_citation": 4,
            "authors": [
                "a1",
                {"_id": "a2", "name": "Ada", "org": "Lab"},
                {"name": "no id"},
                42,
                null,
                "a1"
            ]
        }))
        .unwrap();

        let paper = Paper::from(doc);
        assert_eq!(paper.id, "p1");
        assert_eq!(paper.authors, vec!["a1", "a2", "42"]);
    }

    #[test]
    fn test_history_event_wire_shape() {
        let event = HistoryEvent::at(EventKind::Unlike, "p9", 1_700_000_000);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"event": "unlike", "time": 1_700_000_000, "description": "p9"})
        );
    }

    #[test]
    fn test_mean_embedding() {
        let author = Author::new("a1")
            .with_paper_vector("p1", vec![1.0, 0.0])
            .with_paper_vector("p2", vec![0.0, 1.0])
            .with_paper_vector("p3", vec![5.0, 5.0, 5.0]);

        assert_eq!(author.mean_embedding(), Some(vec![0.5, 0.5]));
        assert_eq!(Author::new("a2").mean_embedding(), None);
    }
}
