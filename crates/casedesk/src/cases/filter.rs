use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{CaseRecord, CaseStatus};

/// Filter controls above a case list. Unset criteria are not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default, alias = "search")]
    pub search_term: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub handler_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none_parsed")]
    pub status: Option<CaseStatus>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub type_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub customer_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none_parsed")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none_parsed")]
    pub date_to: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.search_term.trim().is_empty()
            && self.handler_id.is_none()
            && self.status.is_none()
            && self.type_name.is_none()
            && self.customer_id.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    /// AND of every set criterion.
    pub fn matches(&self, record: &CaseRecord) -> bool {
        self.matches_search(record)
            && self
                .handler_id
                .as_ref()
                .map_or(true, |handler_id| &record.handler.id == handler_id)
            && self.status.map_or(true, |status| record.status == status)
            && self
                .type_name
                .as_ref()
                .map_or(true, |type_name| record.type_name() == Some(type_name.as_str()))
            && self.customer_id.as_ref().map_or(true, |customer_id| {
                record
                    .customer
                    .as_ref()
                    .is_some_and(|customer| &customer.id == customer_id)
            })
            && self.matches_dates(record)
    }

    fn matches_search(&self, record: &CaseRecord) -> bool {
        let term = self.search_term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        let contains = |value: &str| value.to_lowercase().contains(&term);

        contains(&record.title)
            || contains(&record.description)
            || contains(&record.requester.full_name())
            || contains(&record.handler.full_name())
            || record.type_name().is_some_and(contains)
            || record.customer.as_ref().is_some_and(|customer| {
                customer.short_name.as_deref().is_some_and(contains)
                    || customer.full_name.as_deref().is_some_and(contains)
            })
    }

    /// Inclusive on both ends, compared on the calendar day of `start_date`.
    fn matches_dates(&self, record: &CaseRecord) -> bool {
        let day = record.start_date.date_naive();
        self.date_from.map_or(true, |from| from <= day) && self.date_to.map_or(true, |to| day <= to)
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }))
}

fn empty_string_as_none_parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    empty_string_as_none(deserializer)?
        .map(|raw| raw.parse::<T>().map_err(serde::de::Error::custom))
        .transpose()
}
