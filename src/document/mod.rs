//! The relational document the engine is rebuilt from.
//!
//! Documents arrive fully parsed; every rebuild consumes the whole document.

mod parse;

use std::path::Path;

use crate::error::{Error, Result};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationRecord {
    pub kind: String,
    pub target: String,
    /// `None` when the score was absent or unusable.
    pub score: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkillRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub relations: Vec<RelationRecord>,
}

/// An employee (or other referencing entity) that contributes weight to the
/// skills it references.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubjectRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub relations: Vec<RelationRecord>,
    pub skills: Vec<String>,
}

impl SubjectRecord {
    pub fn matches(&self, kind: &str, id: &str) -> bool {
        self.relations
            .iter()
            .any(|relation| relation.kind == kind && relation.target == id)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub skills: Vec<SkillRecord>,
    pub subjects: Vec<SubjectRecord>,
}

impl Document {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        parse::parse_document(raw)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|error| Error::io(path, error))?;
        Self::from_json_str(&raw)
    }

    /// Distinct `(kind, target)` pairs found on subjects, usable as focus
    /// filters (units, roles).
    pub fn subject_groups(&self) -> Vec<(String, String)> {
        let mut groups = self
            .subjects
            .iter()
            .flat_map(|subject| subject.relations.iter())
            .map(|relation| (relation.kind.clone(), relation.target.clone()))
            .collect::<Vec<_>>();
        groups.sort();
        groups.dedup();
        groups
    }
}
