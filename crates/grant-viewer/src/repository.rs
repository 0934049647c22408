use std::collections::HashMap;

use crate::classify::{classify, ResponseStatus};
use crate::error::{AppError, LoadError};
use crate::model::{Grant, GrantStatus};

/// The loaded dataset. Built once per load and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct GrantRepository {
    grants: Vec<Grant>,
    index: HashMap<String, usize>,
}

/// Sidebar entry for one grant.
#[derive(Debug, Clone, PartialEq)]
pub struct GrantSummary {
    pub id: String,
    pub name: String,
    pub foundation: String,
    pub status: GrantStatus,
    pub response_count: usize,
    pub over_limit: usize,
    pub needs_completion: usize,
    pub invalid: usize,
}

impl GrantRepository {
    /// `grants` must be in dataset order with unique ids.
    pub fn new(grants: Vec<Grant>) -> Result<Self, LoadError> {
        let mut index = HashMap::with_capacity(grants.len());
        for (pos, grant) in grants.iter().enumerate() {
            if index.insert(grant.id.clone(), pos).is_some() {
                return Err(LoadError::DuplicateGrant(grant.id.clone()));
            }
        }
        Ok(Self { grants, index })
    }

    pub fn get(&self, id: &str) -> Result<&Grant, AppError> {
        self.index
            .get(id)
            .map(|&pos| &self.grants[pos])
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Grants in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = &Grant> {
        self.grants.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.grants.iter().map(|g| g.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    pub fn list(&self) -> Vec<GrantSummary> {
        self.grants.iter().map(summarize).collect()
    }

    /// `preferred` when the dataset has it, otherwise the first grant in dataset order.
    pub fn default_selection<'a>(&'a self, preferred: Option<&'a str>) -> Option<&'a str> {
        preferred
            .filter(|id| self.contains(id))
            .or_else(|| self.ids().next())
    }
}

fn summarize(grant: &Grant) -> GrantSummary {
    let mut summary = GrantSummary {
        id: grant.id.clone(),
        name: grant.config.name.clone(),
        foundation: grant.config.foundation.clone(),
        status: grant.config.status.clone(),
        response_count: grant.response_count(),
        over_limit: 0,
        needs_completion: 0,
        invalid: 0,
    };
    for (_, response) in grant.responses() {
        match classify(response).map(|c| c.status) {
            Ok(ResponseStatus::OverLimit) => summary.over_limit += 1,
            Ok(ResponseStatus::NeedsCompletion) => summary.needs_completion += 1,
            Ok(ResponseStatus::Complete) => {}
            Err(_) => summary.invalid += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;
    use crate::ordered::OrderedMap;

    fn repo(ids: &[&str]) -> GrantRepository {
        GrantRepository::new(ids.iter().map(|id| fixtures::grant(id, id)).collect())
            .expect("unique ids")
    }

    #[test]
    fn get_returns_stored_grant() {
        let grant = fixtures::grant("pritzker", "Pritzker Innovation Fund");
        let repo = GrantRepository::new(vec![grant.clone()]).expect("unique ids");
        assert_eq!(repo.get("pritzker").expect("present"), &grant);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let repo = repo(&["a"]);
        assert!(matches!(repo.get("zzz"), Err(AppError::NotFound(id)) if id == "zzz"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = GrantRepository::new(vec![
            fixtures::grant("a", "A"),
            fixtures::grant("a", "Again"),
        ])
        .expect_err("duplicate should fail");
        assert!(matches!(err, LoadError::DuplicateGrant(id) if id == "a"));
    }

    #[test]
    fn list_preserves_dataset_order() {
        let repo = repo(&["zeta", "alpha", "nsf-cssi"]);
        let ids: Vec<String> = repo.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["zeta", "alpha", "nsf-cssi"]);
    }

    #[test]
    fn default_selection_prefers_configured_key() {
        let repo = repo(&["a", "nsf-cssi", "b"]);
        assert_eq!(repo.default_selection(Some("nsf-cssi")), Some("nsf-cssi"));
    }

    #[test]
    fn default_selection_falls_back_to_first() {
        let repo = repo(&["a", "b"]);
        assert_eq!(repo.default_selection(Some("nsf-cssi")), Some("a"));
        assert_eq!(repo.default_selection(None), Some("a"));
    }

    #[test]
    fn default_selection_of_empty_repository() {
        let repo = repo(&[]);
        assert_eq!(repo.default_selection(Some("nsf-cssi")), None);
    }

    #[test]
    fn summary_counts_flagged_responses() {
        let mut over = fixtures::response(520, Some(500));
        over.title = "Over".to_string();
        let mut pending = fixtures::response(10, Some(500));
        pending.needs_completion = Some(true);
        let broken = fixtures::response(-3, None);
        let fine = fixtures::response(100, Some(500));

        let mut grant = fixtures::grant("g", "G");
        grant.responses = Some(
            OrderedMap::from_entries(vec![
                ("over".to_string(), over),
                ("pending".to_string(), pending),
                ("broken".to_string(), broken),
                ("fine".to_string(), fine),
            ])
            .expect("unique keys"),
        );

        let repo = GrantRepository::new(vec![grant]).expect("unique ids");
        let summary = &repo.list()[0];
        assert_eq!(summary.response_count, 4);
        assert_eq!(summary.over_limit, 1);
        assert_eq!(summary.needs_completion, 1);
        assert_eq!(summary.invalid, 1);
    }
}
