//! Comm transport
//!
//! A [`Comm`] is one model's bidirectional conduit to its backend
//! counterpart. Outbound traffic is fire-and-forget; the channel-backed
//! implementation pushes [`Outbound`] frames into a tokio mpsc queue that the
//! runtime drains. Inbound traffic is routed to models by comm id.

use std::collections::BTreeSet;

use color_eyre::eyre::{bail, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::core::msg::{Callbacks, CommId, SyncMsg};

pub trait Comm {
    fn id(&self) -> &CommId;
    fn send(&mut self, msg: SyncMsg, callbacks: Callbacks) -> Result<()>;
    fn close(&mut self);
    fn is_closed(&self) -> bool;
}

/// Registry of comm targets plus the factory for new comms.
pub trait CommManager {
    fn register_target(&mut self, target_name: &str);
    fn has_target(&self, target_name: &str) -> bool;
    fn new_comm(&mut self, comm_id: CommId) -> Box<dyn Comm>;
}

/// Frame leaving the frontend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    CommMsg {
        comm_id: CommId,
        data: SyncMsg,
        callbacks: Callbacks,
    },
    CommClose {
        comm_id: CommId,
    },
}

impl Outbound {
    pub fn comm_id(&self) -> &CommId {
        match self {
            Outbound::CommMsg { comm_id, .. } | Outbound::CommClose { comm_id } => comm_id,
        }
    }
}

pub struct ChannelComm {
    id: CommId,
    sender: mpsc::UnboundedSender<Outbound>,
    closed: bool,
}

impl ChannelComm {
    pub fn new(id: CommId, sender: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            id,
            sender,
            closed: false,
        }
    }
}

impl Comm for ChannelComm {
    fn id(&self) -> &CommId {
        &self.id
    }

    fn send(&mut self, msg: SyncMsg, callbacks: Callbacks) -> Result<()> {
        if self.closed {
            bail!("comm {} is closed", self.id);
        }
        self.sender.send(Outbound::CommMsg {
            comm_id: self.id.clone(),
            data: msg,
            callbacks,
        })?;
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.sender.send(Outbound::CommClose {
            comm_id: self.id.clone(),
        }) {
            tracing::warn!("Failed to send close for comm {}: {e}", self.id);
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Comm manager whose comms all write into one outbound queue.
pub struct ChannelCommManager {
    targets: BTreeSet<String>,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl ChannelCommManager {
    pub fn new(sender: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            targets: BTreeSet::new(),
            sender,
        }
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(String::as_str)
    }
}

impl CommManager for ChannelCommManager {
    fn register_target(&mut self, target_name: &str) {
        tracing::debug!("Registering comm target {target_name}");
        self.targets.insert(target_name.to_string());
    }

    fn has_target(&self, target_name: &str) -> bool {
        self.targets.contains(target_name)
    }

    fn new_comm(&mut self, comm_id: CommId) -> Box<dyn Comm> {
        Box::new(ChannelComm::new(comm_id, self.sender.clone()))
    }
}
