use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::EvaluationCategory;

/// Which party records the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationRole {
    /// The requester, scoring at creation time.
    User,
    /// The handler, scoring after the case is picked up.
    Admin,
}

impl EvaluationRole {
    pub const fn label(self) -> &'static str {
        match self {
            EvaluationRole::User => "requester",
            EvaluationRole::Admin => "handler",
        }
    }
}

/// Selectable answer for one evaluation question. The submitted value is `points`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOption {
    pub id: String,
    pub points: u8,
    pub label: String,
}

/// Catalog row as served by the configuration endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub evaluation_type: EvaluationRole,
    pub category: EvaluationCategory,
    pub options: Vec<EvaluationOption>,
}

/// Option lists keyed by evaluation role and category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationCatalog {
    options: BTreeMap<(EvaluationRole, EvaluationCategory), Vec<EvaluationOption>>,
}

impl EvaluationCatalog {
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut options = BTreeMap::new();
        for entry in entries {
            options
                .entry((entry.evaluation_type, entry.category))
                .or_insert_with(Vec::new)
                .extend(entry.options);
        }
        Self { options }
    }

    /// Catalog built from configured entries, or [`EvaluationCatalog::standard`] when the
    /// configuration is empty.
    pub fn configured_or_standard(entries: Vec<CatalogEntry>) -> Self {
        if entries.is_empty() {
            Self::standard()
        } else {
            Self::from_entries(entries)
        }
    }

    /// Five-point scale for every scored question plus the onsite/offsite work mode.
    pub fn standard() -> Self {
        const SCALE: [&str; 5] = ["Very low", "Low", "Medium", "High", "Very high"];

        let mut entries = Vec::new();
        for role in [EvaluationRole::User, EvaluationRole::Admin] {
            for category in EvaluationCategory::SCORED {
                let options = SCALE
                    .iter()
                    .zip(1u8..)
                    .map(|(label, points)| EvaluationOption {
                        id: format!("{}-{}-{}", role.label(), category.key(), points),
                        points,
                        label: (*label).to_string(),
                    })
                    .collect();
                entries.push(CatalogEntry {
                    evaluation_type: role,
                    category,
                    options,
                });
            }
        }

        entries.push(CatalogEntry {
            evaluation_type: EvaluationRole::User,
            category: EvaluationCategory::Form,
            options: vec![
                EvaluationOption {
                    id: "requester-form-offsite".to_string(),
                    points: 1,
                    label: "Offsite".to_string(),
                },
                EvaluationOption {
                    id: "requester-form-onsite".to_string(),
                    points: 2,
                    label: "Onsite".to_string(),
                },
            ],
        });

        Self::from_entries(entries)
    }

    pub fn options(&self, role: EvaluationRole, category: EvaluationCategory) -> &[EvaluationOption] {
        self.options
            .get(&(role, category))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn option(
        &self,
        role: EvaluationRole,
        category: EvaluationCategory,
        option_id: &str,
    ) -> Option<&EvaluationOption> {
        self.options(role, category)
            .iter()
            .find(|option| option.id == option_id)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
