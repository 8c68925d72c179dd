use color_eyre::eyre::{eyre, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    core::{
        manager::WidgetManager,
        msg::{SessionEvent, StatusMsg},
    },
    domain::document::Document,
    infrastructure::{
        comm::{ChannelCommManager, Outbound},
        config::WidgetConfig,
    },
};

/// One backend connection: feeds session events into the widget manager and
/// collects the outbound frames they produce.
pub struct Runtime {
    config: WidgetConfig,
    widget_manager: Option<WidgetManager>,
    event_tx: Option<mpsc::UnboundedSender<SessionEvent>>,
    event_rx: mpsc::UnboundedReceiver<SessionEvent>,
    outbound_tx: mpsc::UnboundedSender<Outbound>,
    outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    cancellation_token: CancellationToken,
}

impl Runtime {
    pub fn new(config: WidgetConfig) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            config,
            widget_manager: None,
            event_tx: Some(event_tx),
            event_rx,
            outbound_tx,
            outbound_rx,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Installs the widget manager for this connection. Installing twice
    /// keeps the first manager.
    pub fn install_widget_manager(
        &mut self,
        document: Box<dyn Document>,
    ) -> Result<&mut WidgetManager> {
        if self.widget_manager.is_some() {
            debug!("Widget manager already installed");
        } else {
            let comm_manager = ChannelCommManager::new(self.outbound_tx.clone());
            let manager = WidgetManager::new(Box::new(comm_manager), document, &self.config)
                .with_default_widgets()?;
            self.widget_manager = Some(manager);
        }
        self.widget_manager
            .as_mut()
            .ok_or_else(|| eyre!("widget manager unavailable"))
    }

    pub fn widget_manager(&self) -> Option<&WidgetManager> {
        self.widget_manager.as_ref()
    }

    pub fn widget_manager_mut(&mut self) -> Option<&mut WidgetManager> {
        self.widget_manager.as_mut()
    }

    /// Get sender for event transmission
    pub fn get_sender(&self) -> Option<mpsc::UnboundedSender<SessionEvent>> {
        self.event_tx.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Applies one event and returns the outbound frames it produced.
    /// Failures are logged; the connection keeps running.
    pub fn process_event(&mut self, event: SessionEvent) -> Vec<Outbound> {
        if let Err(e) = self.dispatch(event) {
            warn!("Failed to process session event: {e}");
        }
        self.drain_outbound()
    }

    fn dispatch(&mut self, event: SessionEvent) -> Result<()> {
        let manager = self
            .widget_manager
            .as_mut()
            .ok_or_else(|| eyre!("no widget manager installed"))?;
        match event {
            SessionEvent::Execute { cell_index, msg_id } => {
                manager.record_execution(cell_index, &msg_id)?;
            }
            SessionEvent::CommOpen(open) => {
                manager.handle_comm_open(&open)?;
            }
            SessionEvent::CommMsg(msg) => manager.handle_comm_msg(&msg)?,
            SessionEvent::CommClose { comm_id } => manager.handle_comm_close(&comm_id),
            SessionEvent::Status {
                comm_id,
                execution_state,
            } => manager.handle_status(&comm_id, &StatusMsg { execution_state }),
            SessionEvent::Output { comm_id, text } => manager.handle_output(&comm_id, &text),
            SessionEvent::Ui { view, event } => manager.handle_ui_event(view, &event)?,
            SessionEvent::RemoveView { view } => {
                if !manager.remove_view(view) {
                    debug!("{view} was already removed");
                }
            }
        }
        Ok(())
    }

    fn drain_outbound(&mut self) -> Vec<Outbound> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.outbound_rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Processes events until every sender is dropped or the runtime is
    /// cancelled, handing each outbound frame to `sink` in order.
    pub async fn run(&mut self, mut sink: impl FnMut(&Outbound)) -> Result<()> {
        self.event_tx = None;
        let token = self.cancellation_token.clone();
        loop {
            let event = tokio::select! {
                _ = token.cancelled() => {
                    debug!("Runtime cancelled");
                    break;
                }
                event = self.event_rx.recv() => event,
            };
            let Some(event) = event else {
                break;
            };
            for frame in self.process_event(event) {
                sink(&frame);
            }
        }
        Ok(())
    }
}
