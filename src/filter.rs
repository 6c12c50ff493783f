use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::Dataset;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filters {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub channels: BTreeSet<String>,
}

impl Filters {
    pub fn new<I, S>(start: NaiveDate, end: NaiveDate, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            start,
            end,
            channels: channels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn defaults(dataset: &Dataset) -> Option<Self> {
        let (start, end) = dataset.date_range()?;
        Some(Self {
            start,
            end,
            channels: dataset.channels(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRequest {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub channels: Option<Vec<String>>,
}

impl FilterRequest {
    pub fn resolve(&self, dataset: &Dataset) -> Option<Filters> {
        let defaults = Filters::defaults(dataset)?;
        let start = self.start.unwrap_or(defaults.start);
        let end = self.end.unwrap_or(defaults.end);
        Some(match &self.channels {
            Some(selected) => Filters::new(start, end, selected.iter().cloned()),
            None => Filters {
                start,
                end,
                channels: defaults.channels,
            },
        })
    }
}

pub fn apply(dataset: &Dataset, filters: &Filters) -> Dataset {
    Dataset::new(
        dataset
            .records
            .iter()
            .filter(|r| r.date >= filters.start && r.date <= filters.end)
            .filter(|r| filters.channels.contains(&r.channel))
            .cloned()
            .collect(),
    )
}
