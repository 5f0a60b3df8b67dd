//! Simple pub-sub event handler
//!
//! This module provides the plumbing that lets components of the sync engine publish events and react to them. A
//! handler only ever sees the event itself; it has no access to the internal state of the publisher.
//!
//! Handlers are async. [`EventHandler::start_handler`] fans events out onto spawned tasks, which is what host hooks
//! want. [`EventHandler::start_sequential`] awaits each handler inline, so every event is fully handled before the
//! next one is taken off the queue. The push dispatch loop relies on the latter.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// The receiving end of an event queue, paired with the handler that consumes it.
pub struct EventHandler<E: Send + Sync + 'static> {
    queue: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, queue) = mpsc::channel(buffer_size.max(1));
        Self { queue, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped, then waits for the handlers still running. Each event is handled
    /// on its own task.
    pub async fn start_handler(self) {
        let Self { mut queue, sender, handler } = self;
        // only producers may keep the queue open
        drop(sender);
        debug!("📬️ Event handler started");
        let mut running = JoinSet::new();
        while let Some(ev) = queue.recv().await {
            let handler = Arc::clone(&handler);
            running.spawn(async move { handler(ev).await });
            while let Some(done) = running.try_join_next() {
                report_task(done);
            }
        }
        if !running.is_empty() {
            debug!("📬️ Waiting for {} handler(s) to finish", running.len());
        }
        while let Some(done) = running.join_next().await {
            report_task(done);
        }
        debug!("📬️ Event handler has shut down");
    }

    /// Runs until every producer has been dropped. Events are handled one at a time, in the order they were
    /// published.
    pub async fn start_sequential(self) {
        let Self { mut queue, sender, handler } = self;
        drop(sender);
        debug!("📬️ Sequential event handler started");
        while let Some(ev) = queue.recv().await {
            handler(ev).await;
        }
        debug!("📬️ Sequential event handler has shut down");
    }
}

fn report_task(result: Result<(), tokio::task::JoinError>) {
    match result {
        Ok(()) => trace!("📬️ Event handled"),
        Err(e) => warn!("📬️ An event handler task failed: {e}"),
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }

    /// True once the receiving handler has shut down.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
