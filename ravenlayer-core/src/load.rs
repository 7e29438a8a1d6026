//! Request and result shapes of a load.

use crate::{document::Document, queryable::Queryable};

/// What to load: one identifier, or a list fetched in a single batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifiers {
    Single(String),
    Many(Vec<String>),
}

impl From<&str> for Identifiers {
    fn from(id: &str) -> Self {
        Identifiers::Single(id.to_string())
    }
}

impl From<String> for Identifiers {
    fn from(id: String) -> Self {
        Identifiers::Single(id)
    }
}

impl From<&String> for Identifiers {
    fn from(id: &String) -> Self {
        Identifiers::Single(id.clone())
    }
}

impl From<Vec<String>> for Identifiers {
    fn from(ids: Vec<String>) -> Self {
        Identifiers::Many(ids)
    }
}

impl From<Vec<&str>> for Identifiers {
    fn from(ids: Vec<&str>) -> Self {
        Identifiers::Many(ids.into_iter().map(str::to_string).collect())
    }
}

impl From<&[String]> for Identifiers {
    fn from(ids: &[String]) -> Self {
        Identifiers::Many(ids.to_vec())
    }
}

impl From<&[&str]> for Identifiers {
    fn from(ids: &[&str]) -> Self {
        Identifiers::Many(ids.iter().map(|id| id.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Identifiers {
    fn from(ids: [&str; N]) -> Self {
        Identifiers::Many(ids.iter().map(|id| id.to_string()).collect())
    }
}

/// The outcome of a load: the requested documents and the resolved includes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Loaded {
    pub results: Queryable<Document>,
    pub includes: Queryable<Document>,
}

impl Loaded {
    pub(crate) fn from_results(results: Vec<Document>) -> Self {
        Self {
            results: Queryable::new(results),
            includes: Queryable::default(),
        }
    }

    /// The first primary document, which is the whole result of a single-identifier load.
    pub fn document(&self) -> Option<&Document> {
        self.results.first()
    }
}
