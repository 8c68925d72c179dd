//! Test helpers for driving models and managers without a kernel.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    core::{
        manager::WidgetManager,
        msg::{CommId, CommMsg, CommOpen, SyncMsg},
    },
    domain::document::Notebook,
    infrastructure::{
        comm::{ChannelComm, ChannelCommManager, Comm, Outbound},
        config::WidgetConfig,
    },
};

/// A comm writing into a fresh outbound queue.
pub fn channel_comm(id: &str) -> (Box<dyn Comm>, mpsc::UnboundedReceiver<Outbound>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Box::new(ChannelComm::new(CommId::from(id), tx)), rx)
}

/// Every frame queued so far.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

/// Sync payloads queued so far, ignoring routing and close frames.
pub fn drain_sync(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<SyncMsg> {
    drain(rx)
        .into_iter()
        .filter_map(|frame| match frame {
            Outbound::CommMsg { data, .. } => Some(data),
            Outbound::CommClose { .. } => None,
        })
        .collect()
}

/// Manager with the built-in widgets over a notebook of `cells` cells.
pub fn manager_with_cells(
    cells: usize,
    msg_throttle: usize,
) -> (WidgetManager, mpsc::UnboundedReceiver<Outbound>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let manager = WidgetManager::new(
        Box::new(ChannelCommManager::new(tx)),
        Box::new(Notebook::with_cells(cells)),
        &WidgetConfig { msg_throttle },
    )
    .with_default_widgets()
    .expect("built-in widgets register");
    (manager, rx)
}

pub fn open(comm_id: &str, target_name: &str) -> CommOpen {
    CommOpen {
        comm_id: CommId::from(comm_id),
        target_name: target_name.to_string(),
    }
}

pub fn comm_msg(comm_id: &str, data: Value) -> CommMsg {
    CommMsg {
        comm_id: CommId::from(comm_id),
        data,
        parent_msg_id: None,
    }
}
