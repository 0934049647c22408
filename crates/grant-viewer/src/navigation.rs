use crate::error::AppError;
use crate::model::Grant;
use crate::repository::GrantRepository;

/// Which grant opens when the user has not picked one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    preferred: Option<String>,
}

impl SelectionPolicy {
    pub fn preferring(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            preferred: Some(id).filter(|s| !s.trim().is_empty()),
        }
    }

    /// Always open the first grant in dataset order.
    #[cfg(test)]
    pub fn first() -> Self {
        Self { preferred: None }
    }

    pub fn preferred(&self) -> Option<&str> {
        self.preferred.as_deref()
    }
}

/// Resolve the grant to display. `requested` is the route parameter; `None`
/// (or blank) means "no selection yet" and applies the default policy.
pub fn resolve<'a>(
    repository: &'a GrantRepository,
    requested: Option<&str>,
    policy: &SelectionPolicy,
) -> Result<&'a Grant, AppError> {
    match requested.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => repository.get(id),
        None => {
            let id = repository
                .default_selection(policy.preferred())
                .ok_or(AppError::EmptyDataset)?;
            repository.get(id)
        }
    }
}
