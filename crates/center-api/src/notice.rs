//! Transient, dismissible notifications for write outcomes

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// How long a notice stays visible unless dismissed.
pub const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Oldest notices are dropped past this many.
pub const MAX_NOTICES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
    pub expires_at: Instant,
}

/// Bounded notice queue shared between views.
#[derive(Debug)]
pub struct Notices {
    queue: Mutex<VecDeque<Notice>>,
    next_id: AtomicU64,
    ttl: Duration,
}

impl Default for Notices {
    fn default() -> Self {
        Self::new()
    }
}

impl Notices {
    pub fn new() -> Self {
        Self::with_ttl(NOTICE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            ttl,
        }
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Success, message.into())
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Error, message.into())
    }

    fn push(&self, level: NoticeLevel, message: String) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notice = Notice {
            id,
            level,
            message,
            expires_at: Instant::now() + self.ttl,
        };
        let mut queue = self.lock();
        queue.push_back(notice);
        while queue.len() > MAX_NOTICES {
            queue.pop_front();
        }
        id
    }

    /// Remove one notice. Returns whether it was still queued.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut queue = self.lock();
        let before = queue.len();
        queue.retain(|n| n.id != id);
        queue.len() != before
    }

    /// Notices still visible, oldest first. Expired ones are pruned.
    pub fn active(&self) -> Vec<Notice> {
        let now = Instant::now();
        let mut queue = self.lock();
        queue.retain(|n| n.expires_at > now);
        queue.iter().cloned().collect()
    }

    /// Take every visible notice, leaving the queue empty.
    pub fn drain(&self) -> Vec<Notice> {
        let now = Instant::now();
        self.lock()
            .drain(..)
            .filter(|n| n.expires_at > now)
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Notice>> {
        // Only plain pushes/retains happen under the lock; recover from poisoning
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}
