// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory, append-only message log for one conversation session.
//!
//! The store is the single merge point for three producers: the history
//! loader (seeds the log), the realtime channel (appends arrivals), and the
//! send pipeline (appends optimistic entries and confirms them). Realtime
//! arrivals that land before history has settled are buffered and flushed
//! once it does, so historical messages always render first.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tracing::debug;

use jobtalk_core::{DeliveryState, Message, SendReceipt};

struct StoreInner {
    messages: Vec<Message>,
    /// Realtime arrivals held back until history settles.
    buffered: Vec<Message>,
    history_settled: bool,
}

/// Ordered log of messages for one session. Grows only; entries change
/// identity on confirmation but are never removed.
pub struct MessageStore {
    inner: Mutex<StoreInner>,
    /// Recency window within which an inbound message may confirm a
    /// pending one from the same sender with the same body.
    echo_window: chrono::Duration,
    revision: watch::Sender<u64>,
}

impl MessageStore {
    pub fn new(echo_window: Duration) -> Self {
        let echo_window =
            chrono::Duration::from_std(echo_window).unwrap_or_else(|_| chrono::Duration::seconds(60));
        let (revision, _) = watch::channel(0);
        Self {
            inner: Mutex::new(StoreInner {
                messages: Vec::new(),
                buffered: Vec::new(),
                history_settled: false,
            }),
            echo_window,
            revision,
        }
    }

    /// Observe store revisions. The value increments on every visible change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current contents, oldest first.
    pub async fn snapshot(&self) -> Vec<Message> {
        self.inner.lock().await.messages.clone()
    }

    /// Append an optimistic entry created by the send pipeline.
    pub async fn append_local(&self, message: Message) {
        let mut inner = self.inner.lock().await;
        inner.messages.push(message);
        drop(inner);
        self.bump();
    }

    /// Ingest an inbound realtime message.
    ///
    /// Before history settles the message is buffered. Afterwards it either
    /// confirms a matching pending entry (the sender's own echo) or is
    /// appended in arrival order.
    pub async fn ingest_remote(&self, message: Message) {
        let mut inner = self.inner.lock().await;
        if !inner.history_settled {
            debug!(key = %message.display_key(), "buffering realtime message until history settles");
            inner.buffered.push(message);
            return;
        }
        self.reconcile_or_append(&mut inner, message);
        drop(inner);
        self.bump();
    }

    /// Seed the log with loaded history, oldest first, then flush any
    /// buffered realtime arrivals.
    ///
    /// The first successful seed places history before everything that
    /// arrived live. A reload merges instead: entries already present
    /// (matched by server id) are skipped and new ones go through the
    /// normal append path, so nothing duplicates or reorders.
    pub async fn seed_history(&self, history: Vec<Message>) {
        let mut inner = self.inner.lock().await;
        if inner.history_settled {
            let fresh: Vec<Message> = history
                .into_iter()
                .filter(|h| match &h.id {
                    Some(id) => !inner.messages.iter().any(|m| m.id.as_deref() == Some(id)),
                    None => true,
                })
                .collect();
            let merged = fresh.len();
            for message in fresh {
                self.reconcile_or_append(&mut inner, message);
            }
            drop(inner);
            debug!(merged, "history reloaded");
        } else {
            let mut seeded = history;
            let count = seeded.len();
            seeded.append(&mut inner.messages);
            inner.messages = seeded;
            inner.history_settled = true;

            let buffered = std::mem::take(&mut inner.buffered);
            let flushed = buffered.len();
            for message in buffered {
                self.reconcile_or_append(&mut inner, message);
            }
            drop(inner);
            debug!(seeded = count, flushed, "history settled");
        }
        self.bump();
    }

    /// Let realtime arrivals through even though history never loaded.
    /// Called when the history fetch fails; a later retry merges via
    /// [`seed_history`](Self::seed_history).
    pub async fn flush_buffered(&self) {
        let mut inner = self.inner.lock().await;
        inner.history_settled = true;
        let buffered = std::mem::take(&mut inner.buffered);
        for message in buffered {
            self.reconcile_or_append(&mut inner, message);
        }
        drop(inner);
        self.bump();
    }

    /// Confirm a pending entry from a REST send response.
    pub async fn resolve_confirmed(&self, local_id: &str, receipt: &SendReceipt) {
        let mut inner = self.inner.lock().await;
        if let Some(entry) = inner
            .messages
            .iter_mut()
            .find(|m| m.local_id.as_deref() == Some(local_id))
        {
            confirm(entry, Some(receipt.id.clone()), receipt.sent_at);
            drop(inner);
            self.bump();
        }
    }

    /// Mark a pending entry sent without new identity. Used when the
    /// realtime transport acknowledges but does not echo.
    pub async fn mark_sent(&self, local_id: &str) {
        self.set_state(local_id, DeliveryState::Sent).await;
    }

    /// Mark a pending entry failed after both delivery paths errored.
    pub async fn mark_failed(&self, local_id: &str) {
        self.set_state(local_id, DeliveryState::Failed).await;
    }

    /// Reset a failed entry to pending for a retry, refreshing its
    /// timestamp. Returns the body to resend, or `None` if no failed
    /// entry has this `local_id`.
    pub async fn reset_for_retry(&self, local_id: &str) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let entry = inner.messages.iter_mut().find(|m| {
            m.local_id.as_deref() == Some(local_id) && m.delivery_state == DeliveryState::Failed
        })?;
        entry.delivery_state = DeliveryState::Pending;
        entry.sent_at = Utc::now();
        let body = entry.body.clone();
        drop(inner);
        self.bump();
        Some(body)
    }

    async fn set_state(&self, local_id: &str, state: DeliveryState) {
        let mut inner = self.inner.lock().await;
        if let Some(entry) = inner
            .messages
            .iter_mut()
            .find(|m| m.local_id.as_deref() == Some(local_id))
        {
            entry.delivery_state = state;
            drop(inner);
            self.bump();
        }
    }

    /// Shared merge rule for inbound messages: an arrival that matches a
    /// pending entry by sender and body within the recency window confirms
    /// that entry instead of appending a duplicate.
    fn reconcile_or_append(&self, inner: &mut StoreInner, incoming: Message) {
        let matched = inner.messages.iter_mut().find(|m| {
            m.delivery_state == DeliveryState::Pending
                && m.sender_id == incoming.sender_id
                && m.body == incoming.body
                && (incoming.sent_at - m.sent_at).abs() <= self.echo_window
        });
        match matched {
            Some(entry) => {
                debug!(key = %entry.display_key(), "reconciled pending entry with inbound echo");
                confirm(entry, incoming.id, incoming.sent_at);
            }
            None => inner.messages.push(incoming),
        }
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

fn confirm(entry: &mut Message, id: Option<String>, sent_at: DateTime<Utc>) {
    if id.is_some() {
        entry.id = id;
    }
    entry.sent_at = sent_at;
    entry.delivery_state = DeliveryState::Sent;
}
