//! # Commands
//!
//! Public command vocabulary: what a view can ask a resource to do, how commands are
//! keyed while in flight, and the paging/filter payload carried by `list`.

use crate::entity::{EntityAction, SyncEntity};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// A named, parameterized request to read or mutate a resource.
#[derive(Debug)]
pub enum Command<T: SyncEntity> {
    List(ListRequest),
    Create(T::Create),
    Update { id: T::Id, update: T::Update },
    Delete { id: T::Id },
    Action(T::Action),
}

impl<T: SyncEntity> Command<T> {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::List(_) => CommandKind::List,
            Command::Create(_) => CommandKind::Create,
            Command::Update { .. } => CommandKind::Update,
            Command::Delete { .. } => CommandKind::Delete,
            Command::Action(action) => CommandKind::Action(action.name()),
        }
    }
}

/// Command type, without its payload. Also the scope of `last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandKind {
    List,
    Create,
    Update,
    Delete,
    Action(&'static str),
}

impl CommandKind {
    /// How back-to-back dispatches of this kind are treated.
    pub fn policy(&self) -> SchedulePolicy {
        match self {
            CommandKind::List => SchedulePolicy::TakeLatest,
            _ => SchedulePolicy::TakeEvery,
        }
    }
}

impl Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::List => f.write_str("list"),
            CommandKind::Create => f.write_str("create"),
            CommandKind::Update => f.write_str("update"),
            CommandKind::Delete => f.write_str("delete"),
            CommandKind::Action(name) => f.write_str(name),
        }
    }
}

impl Serialize for CommandKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Scheduling policy of a command kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePolicy {
    /// Every dispatch runs to completion and is applied; each holds its own pending count.
    TakeEvery,
    /// Only the most recently dispatched command's result is applied; dispatches share one
    /// pending slot.
    TakeLatest,
}

/// Identifies an in-flight operation: `list`, `create`, `update:7`, `retry:12`, …
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PendingKey {
    pub kind: CommandKind,
    pub target: Option<String>,
}

impl PendingKey {
    pub fn new(kind: CommandKind) -> Self {
        Self { kind, target: None }
    }

    pub fn targeting(kind: CommandKind, target: impl Display) -> Self {
        Self {
            kind,
            target: Some(target.to_string()),
        }
    }
}

impl Display for PendingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{}:{}", self.kind, target),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Serialize for PendingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Value of a list filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Flag(bool),
    Number(i64),
    /// Inclusive ISO-8601 date bounds; either side may be open.
    DateRange {
        from: Option<String>,
        to: Option<String>,
    },
}

impl FilterValue {
    /// Flattens the filter into query-string pairs.
    ///
    /// Date ranges become `<name>From` / `<name>To`; empty text produces nothing.
    pub fn query_pairs(&self, name: &str) -> Vec<(String, String)> {
        match self {
            FilterValue::Text(text) if text.trim().is_empty() => Vec::new(),
            FilterValue::Text(text) => vec![(name.to_string(), text.clone())],
            FilterValue::Flag(flag) => vec![(name.to_string(), flag.to_string())],
            FilterValue::Number(number) => vec![(name.to_string(), number.to_string())],
            FilterValue::DateRange { from, to } => {
                let mut pairs = Vec::new();
                if let Some(from) = from {
                    pairs.push((format!("{name}From"), from.clone()));
                }
                if let Some(to) = to {
                    pairs.push((format!("{name}To"), to.clone()));
                }
                pairs
            }
        }
    }
}

impl From<&str> for FilterValue {
    fn from(text: &str) -> Self {
        FilterValue::Text(text.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(text: String) -> Self {
        FilterValue::Text(text)
    }
}

impl From<bool> for FilterValue {
    fn from(flag: bool) -> Self {
        FilterValue::Flag(flag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Paging/filter payload of a `list` dispatch. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListRequest {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// `None` removes the filter.
    pub filters: BTreeMap<String, Option<FilterValue>>,
    pub sort: Option<Sort>,
}

impl ListRequest {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(name.into(), Some(value.into()));
        self
    }

    pub fn without_filter(mut self, name: impl Into<String>) -> Self {
        self.filters.insert(name.into(), None);
        self
    }

    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(Sort {
            field: field.into(),
            direction,
        });
        self
    }
}

/// Fully resolved query handed to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub filters: BTreeMap<String, FilterValue>,
    pub sort: Option<Sort>,
}

impl ListQuery {
    /// Query-string pairs in a stable order: paging, sort, then filters by name.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
        ];
        if let Some(sort) = &self.sort {
            pairs.push(("sortBy".to_string(), sort.field.clone()));
            let direction = match sort.direction {
                SortDirection::Asc => "asc",
                SortDirection::Desc => "desc",
            };
            pairs.push(("sortOrder".to_string(), direction.to_string()));
        }
        for (name, value) in &self.filters {
            pairs.extend(value.query_pairs(name));
        }
        pairs
    }
}
