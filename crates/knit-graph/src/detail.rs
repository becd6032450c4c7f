//! Detail records returned by the metadata store.
//!
//! These mirror the knitfab REST payloads: camelCase JSON keys, tags encoded as
//! `"key:value"` strings. The graph engine only reads the relationship fields
//! (upstream, downstreams, inputs, outputs, log); everything else is carried so
//! the rendering surface can show it.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifier::PortKey;

/// A `key:value` metadata tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag {
    key: String,
    value: String,
}

/// Error returned when a tag string has no `:` separator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed tag {0:?}: expected \"key:value\"")]
pub struct TagParseError(String);

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for Tag {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the first colon separates; values may contain more.
        let (key, value) = s
            .split_once(':')
            .ok_or_else(|| TagParseError(s.to_string()))?;
        Ok(Self::new(key.trim(), value.trim()))
    }
}

impl TryFrom<String> for Tag {
    type Error = TagParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.to_string()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

/// A named mount point on a plan or run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mountpoint {
    pub path: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// The log slot of a plan or run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPoint {
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub plan_id: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub entrypoint: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<String>,
}

impl PlanSummary {
    /// Human readable title: the image if present, otherwise the name.
    pub fn title(&self) -> Option<&str> {
        self.image.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exit {
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub status: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub exit: Option<Exit>,
    pub plan: PlanSummary,
}

/// A data item bound to a run port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(flatten)]
    pub mountpoint: Mountpoint,
    pub knit_id: String,
}

/// The data item recording a run's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
    #[serde(flatten)]
    pub log: LogPoint,
    pub knit_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDetail {
    #[serde(flatten)]
    pub summary: RunSummary,
    #[serde(default)]
    pub inputs: Vec<Assignment>,
    #[serde(default)]
    pub outputs: Vec<Assignment>,
    #[serde(default)]
    pub log: Option<LogSummary>,
}

impl RunDetail {
    pub fn run_id(&self) -> &str {
        &self.summary.run_id
    }

    /// A run without inputs starts a lineage (uploads and other pseudo runs).
    pub fn is_origin(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Where a data item came from: a run output port or a run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedFrom {
    pub run: RunSummary,
    #[serde(default)]
    pub mountpoint: Option<Mountpoint>,
    #[serde(default)]
    pub log: Option<LogPoint>,
}

/// A run consuming a data item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedTo {
    pub mountpoint: Mountpoint,
    pub run: RunSummary,
}

/// A plan input that would accept a data item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NominatedBy {
    #[serde(flatten)]
    pub mountpoint: Mountpoint,
    pub plan: PlanSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDetail {
    pub knit_id: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub upstream: Option<CreatedFrom>,
    #[serde(default)]
    pub downstreams: Vec<AssignedTo>,
    #[serde(default)]
    pub nomination: Vec<NominatedBy>,
}

/// A plan port feeding an input.
///
/// Exactly one of `mountpoint` and `log` is expected to be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upstream {
    pub plan: PlanSummary,
    #[serde(default)]
    pub mountpoint: Option<Mountpoint>,
    #[serde(default)]
    pub log: Option<LogPoint>,
}

impl Upstream {
    /// The upstream plan's port this reference points at.
    pub fn port_key(&self) -> Option<PortKey> {
        match (&self.mountpoint, &self.log) {
            (Some(mountpoint), _) => Some(PortKey::path(mountpoint.path.clone())),
            (None, Some(_)) => Some(PortKey::Log),
            (None, None) => None,
        }
    }
}

/// A plan input fed by an output or log port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Downstream {
    pub plan: PlanSummary,
    pub mountpoint: Mountpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    #[serde(flatten)]
    pub mountpoint: Mountpoint,
    #[serde(default)]
    pub upstreams: Vec<Upstream>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    #[serde(flatten)]
    pub mountpoint: Mountpoint,
    #[serde(default)]
    pub downstreams: Vec<Downstream>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    #[serde(flatten)]
    pub log: LogPoint,
    #[serde(default)]
    pub downstreams: Vec<Downstream>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnNode {
    #[serde(default)]
    pub may: Vec<String>,
    #[serde(default)]
    pub prefer: Vec<String>,
    #[serde(default)]
    pub must: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetail {
    #[serde(flatten)]
    pub summary: PlanSummary,
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    #[serde(default)]
    pub log: Option<Log>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub on_node: Option<OnNode>,
    #[serde(default)]
    pub resources: BTreeMap<String, String>,
    #[serde(default)]
    pub service_account: Option<String>,
}

fn default_active() -> bool {
    true
}

impl PlanDetail {
    pub fn plan_id(&self) -> &str {
        &self.summary.plan_id
    }
}
