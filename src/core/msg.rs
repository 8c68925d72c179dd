use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::{core::view::UiEvent, domain::attributes::Attributes};

/// Identifier of a backend comm, one per widget model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommId(pub String);

impl fmt::Display for CommId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Partitions a model's views by the document region that displayed them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Cell(usize),
    Detached,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Cell(index) => write!(f, "cell {index}"),
            GroupKey::Detached => f.write_str("detached"),
        }
    }
}

/// Frontend to backend sync message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SyncMsg {
    Update { data: Attributes },
    Patch { data: Attributes },
    Custom { content: Value },
}

/// Routing attached to an outbound message: which group's output area
/// receives side effects the backend produces while handling it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callbacks {
    pub output: Option<GroupKey>,
}

/// Backend to model message carried in a comm message's data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ModelMsg {
    Display {
        view_name: String,
        #[serde(default)]
        parent: Option<CommId>,
        #[serde(default)]
        cell_index: Option<usize>,
    },
    Update {
        state: Attributes,
    },
}

impl ModelMsg {
    /// Parses comm data. Payloads without a known `method` yield `None`.
    pub fn parse(data: &Value) -> Option<Self> {
        serde_json::from_value(data.clone()).ok()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Busy,
    Idle,
    Starting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMsg {
    pub execution_state: ExecutionState,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommOpen {
    pub comm_id: CommId,
    pub target_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommMsg {
    pub comm_id: CommId,
    pub data: Value,
    /// Id of the execute request that produced this message.
    #[serde(default)]
    pub parent_msg_id: Option<String>,
}

/// Everything the runtime consumes: kernel traffic plus user interaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Execute {
        cell_index: usize,
        msg_id: String,
    },
    CommOpen(CommOpen),
    CommMsg(CommMsg),
    CommClose {
        comm_id: CommId,
    },
    Status {
        comm_id: CommId,
        execution_state: ExecutionState,
    },
    Output {
        comm_id: CommId,
        text: String,
    },
    Ui {
        view: ViewId,
        event: UiEvent,
    },
    RemoveView {
        view: ViewId,
    },
}
