#![forbid(unsafe_code)]

//! Transient failure notices ("Couldn't move lead — status reverted").
//!
//! A small FIFO queue with content deduplication inside a short window and
//! tick-based expiry. Notices are non-blocking and self-healing: they never
//! require the user to confirm anything. Rendering the dismissible
//! affordance is the host's concern.

use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use ahash::AHashMap;
use web_time::Instant;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// The original move's confirmation failed; the board rolled back.
    MoveFailed,
    /// The restorative move issued by an undo failed; no automated recovery.
    UndoFailed,
}

/// Identity of one visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoticeId(pub u64);

/// One visible notice.
#[derive(Debug, Clone)]
pub struct Notice {
    pub id: NoticeId,
    pub kind: NoticeKind,
    pub message: String,
    deadline: Instant,
}

/// Queue tuning.
#[derive(Debug, Clone)]
pub struct NoticeConfig {
    /// Auto-dismiss lifetime (default: 5s).
    pub duration: Duration,
    /// Identical-content suppression window (default: 1s).
    pub dedup_window: Duration,
    /// Maximum simultaneously visible notices (default: 3).
    pub max_visible: usize,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(5),
            dedup_window: Duration::from_secs(1),
            max_visible: 3,
        }
    }
}

/// FIFO notice queue with dedup and tick-based expiry.
#[derive(Debug)]
pub struct NoticeQueue {
    config: NoticeConfig,
    next: u64,
    visible: VecDeque<Notice>,
    recent_hashes: AHashMap<u64, Instant>,
}

impl NoticeQueue {
    #[must_use]
    pub fn new(config: NoticeConfig) -> Self {
        Self {
            config,
            next: 0,
            visible: VecDeque::new(),
            recent_hashes: AHashMap::new(),
        }
    }

    /// Push a notice. Returns `None` when identical content was pushed
    /// within the dedup window. The oldest notice is evicted if the visible
    /// set is full.
    pub fn push(&mut self, kind: NoticeKind, message: impl Into<String>, now: Instant) -> Option<NoticeId> {
        let message = message.into();
        let hash = Self::content_hash(kind, &message);
        if self
            .recent_hashes
            .get(&hash)
            .is_some_and(|&at| now.duration_since(at) < self.config.dedup_window)
        {
            return None;
        }
        self.recent_hashes.insert(hash, now);

        self.next += 1;
        let id = NoticeId(self.next);
        self.visible.push_back(Notice {
            id,
            kind,
            message,
            deadline: now + self.config.duration,
        });
        while self.visible.len() > self.config.max_visible {
            self.visible.pop_front();
        }
        Some(id)
    }

    /// Drop expired notices, returning their ids. Call from the host tick.
    pub fn tick(&mut self, now: Instant) -> Vec<NoticeId> {
        let mut expired = Vec::new();
        self.visible.retain(|n| {
            if now > n.deadline {
                expired.push(n.id);
                false
            } else {
                true
            }
        });
        self.recent_hashes
            .retain(|_, &mut at| now.duration_since(at) < self.config.dedup_window);
        expired
    }

    /// Explicit user dismissal.
    pub fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.visible.len();
        self.visible.retain(|n| n.id != id);
        self.visible.len() != before
    }

    /// Currently visible notices, oldest first.
    #[must_use]
    pub fn visible(&self) -> impl Iterator<Item = &Notice> {
        self.visible.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    fn content_hash(kind: NoticeKind, message: &str) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        message.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::new(NoticeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_makes_notice_visible() {
        let mut q = NoticeQueue::default();
        let t = Instant::now();
        let id = q.push(NoticeKind::MoveFailed, "oops", t).unwrap();
        assert_eq!(q.len(), 1);
        assert_eq!(q.visible().next().unwrap().id, id);
    }

    #[test]
    fn identical_content_deduped_within_window() {
        let mut q = NoticeQueue::default();
        let t = Instant::now();
        assert!(q.push(NoticeKind::MoveFailed, "oops", t).is_some());
        assert!(
            q.push(NoticeKind::MoveFailed, "oops", t + Duration::from_millis(500))
                .is_none()
        );
        // Different kind is not a duplicate.
        assert!(
            q.push(NoticeKind::UndoFailed, "oops", t + Duration::from_millis(500))
                .is_some()
        );
    }

    #[test]
    fn dedup_window_expires() {
        let mut q = NoticeQueue::default();
        let t = Instant::now();
        q.push(NoticeKind::MoveFailed, "oops", t);
        assert!(
            q.push(NoticeKind::MoveFailed, "oops", t + Duration::from_millis(1500))
                .is_some()
        );
    }

    #[test]
    fn tick_expires_old_notices() {
        let mut q = NoticeQueue::default();
        let t = Instant::now();
        let id = q.push(NoticeKind::MoveFailed, "oops", t).unwrap();

        assert!(q.tick(t + Duration::from_secs(4)).is_empty());
        let expired = q.tick(t + Duration::from_secs(6));
        assert_eq!(expired, vec![id]);
        assert!(q.is_empty());
    }

    #[test]
    fn oldest_evicted_beyond_max_visible() {
        let mut q = NoticeQueue::default();
        let t = Instant::now();
        for i in 0..4 {
            q.push(NoticeKind::MoveFailed, format!("n{i}"), t);
        }
        assert_eq!(q.len(), 3);
        assert_eq!(q.visible().next().unwrap().message, "n1");
    }

    #[test]
    fn dismiss_removes_by_id() {
        let mut q = NoticeQueue::default();
        let t = Instant::now();
        let id = q.push(NoticeKind::UndoFailed, "undo failed", t).unwrap();
        assert!(q.dismiss(id));
        assert!(!q.dismiss(id));
        assert!(q.is_empty());
    }
}
