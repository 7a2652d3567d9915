// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fire-and-forget front end for the audit sink.
//!
//! Records go onto a bounded channel drained by a single writer task, so
//! records of one caller are persisted in submission order.
//!
//! - [`AuditHandle::submit`] is for sample-eligible telemetry: a full queue
//!   drops the record and bumps `courier_audit_dropped_total`.
//! - [`AuditHandle::submit_critical`] waits for queue space and never drops
//!   a record while the writer is alive.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use courier_core::{AuditRecord, AuditStream};

use crate::recording::AUDIT_DROPPED_TOTAL;
use crate::sink::AuditSink;

enum Command {
    Write(AuditStream, AuditRecord),
    Flush(oneshot::Sender<()>),
}

/// Cloneable sender side of the audit writer queue.
#[derive(Clone)]
pub struct AuditHandle {
    tx: mpsc::Sender<Command>,
}

impl AuditHandle {
    /// Start the writer task. It exits once every handle is dropped and the
    /// queue is drained.
    pub fn spawn(sink: Arc<AuditSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(capacity.max(1));
        let writer = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    Command::Write(stream, record) => {
                        sink.record(stream, record).await;
                    }
                    Command::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("audit writer stopped");
        });
        (Self { tx }, writer)
    }

    /// Queue a record, waiting for space when the queue is full.
    ///
    /// Returns `false` only when the writer task has stopped.
    pub async fn submit_critical(&self, stream: AuditStream, record: AuditRecord) -> bool {
        match self.tx.send(Command::Write(stream, record)).await {
            Ok(()) => true,
            Err(mpsc::error::SendError(command)) => {
                if let Command::Write(_, record) = command {
                    warn!(%stream, action = %record.action, "audit writer stopped, record dropped");
                }
                false
            }
        }
    }

    /// Queue a record without waiting. Returns `false` if it was dropped.
    pub fn submit(&self, stream: AuditStream, record: AuditRecord) -> bool {
        match self.tx.try_send(Command::Write(stream, record)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(Command::Write(_, record))) => {
                metrics::counter!(AUDIT_DROPPED_TOTAL).increment(1);
                warn!(%stream, action = %record.action, "audit queue full, record dropped");
                false
            }
            Err(mpsc::error::TrySendError::Full(_)) => false,
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(%stream, "audit writer stopped, record dropped");
                false
            }
        }
    }

    /// Wait until every record submitted before this call has been handled.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Command::Flush(done)).await.is_err() {
            return;
        }
        let _ = wait.await;
    }
}
