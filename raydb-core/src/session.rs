//! Per-user conversation state with idle eviction.

use std::collections::HashMap;

use time::Duration;

use crate::entities::*;

pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::minutes(10);

#[derive(Debug, Clone)]
struct Entry<S> {
    state: S,
    last_access: Timestamp,
}

/// Sessions are only evicted by an explicit [`SessionStore::sweep`],
/// the owner decides when to run it.
#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    timeout: Duration,
    entries: HashMap<UserId, Entry<S>>,
}

impl<S> Default for SessionStore<S> {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TIMEOUT)
    }
}

impl<S> SessionStore<S> {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            entries: HashMap::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, user: UserId) -> Option<&S> {
        self.entries.get(&user).map(|e| &e.state)
    }

    pub fn get_mut(&mut self, user: UserId) -> Option<&mut S> {
        self.entries.get_mut(&user).map(|e| &mut e.state)
    }

    /// Marks the session as active.
    pub fn get_or_insert_with<F>(&mut self, user: UserId, now: Timestamp, init: F) -> &mut S
    where
        F: FnOnce() -> S,
    {
        let entry = self.entries.entry(user).or_insert_with(|| Entry {
            state: init(),
            last_access: now,
        });
        entry.last_access = now;
        &mut entry.state
    }

    pub fn insert(&mut self, user: UserId, state: S, now: Timestamp) -> Option<S> {
        self.entries
            .insert(
                user,
                Entry {
                    state,
                    last_access: now,
                },
            )
            .map(|e| e.state)
    }

    pub fn touch(&mut self, user: UserId, now: Timestamp) -> bool {
        match self.entries.get_mut(&user) {
            Some(entry) => {
                entry.last_access = now;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, user: UserId) -> Option<S> {
        self.entries.remove(&user).map(|e| e.state)
    }

    /// Evicts every session that has been idle for longer than
    /// the timeout and returns the evicted users.
    pub fn sweep(&mut self, now: Timestamp) -> Vec<UserId> {
        self.sweep_filtered(now, |_| true)
    }

    /// Like [`Self::sweep`] but never evicts `current`.
    pub fn sweep_except(&mut self, now: Timestamp, current: UserId) -> Vec<UserId> {
        self.sweep_filtered(now, |user| user != current)
    }

    fn sweep_filtered(&mut self, now: Timestamp, evictable: impl Fn(UserId) -> bool) -> Vec<UserId> {
        let timeout = self.timeout;
        let mut evicted: Vec<UserId> = self
            .entries
            .iter()
            .filter(|(user, e)| evictable(**user) && now - e.last_access > timeout)
            .map(|(user, _)| *user)
            .collect();
        evicted.sort_by_key(|u| u.to_inner());
        for user in &evicted {
            self.entries.remove(user);
        }
        if !evicted.is_empty() {
            log::debug!("Evicted {} idle sessions", evicted.len());
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(minutes: i64) -> Timestamp {
        Timestamp::from_secs(1_700_000_000) + Duration::minutes(minutes)
    }

    #[test]
    fn sweep_evicts_idle_sessions() {
        let mut store = SessionStore::default();
        store.insert(UserId::new(1), "a", at(0));
        store.insert(UserId::new(2), "b", at(5));
        assert!(store.sweep(at(10)).is_empty());
        assert_eq!(vec![UserId::new(1)], store.sweep(at(11)));
        assert_eq!(Some(&"b"), store.get(UserId::new(2)));
        assert_eq!(vec![UserId::new(2)], store.sweep(at(16)));
        assert!(store.is_empty());
    }

    #[test]
    fn touch_keeps_a_session_alive() {
        let mut store = SessionStore::new(Duration::minutes(1));
        store.insert(UserId::new(1), 0, at(0));
        assert!(store.touch(UserId::new(1), at(1)));
        assert!(store.sweep(at(2)).is_empty());
        assert!(!store.touch(UserId::new(9), at(2)));
    }

    #[test]
    fn sweep_except_keeps_the_current_user() {
        let mut store = SessionStore::default();
        store.insert(UserId::new(1), (), at(0));
        store.insert(UserId::new(2), (), at(0));
        assert_eq!(vec![UserId::new(2)], store.sweep_except(at(30), UserId::new(1)));
        assert_eq!(1, store.len());
    }

    #[test]
    fn get_or_insert_with_updates_access_time() {
        let mut store = SessionStore::default();
        *store.get_or_insert_with(UserId::new(1), at(0), || 1) += 1;
        *store.get_or_insert_with(UserId::new(1), at(9), || 100) += 1;
        assert_eq!(Some(&3), store.get(UserId::new(1)));
        assert!(store.sweep(at(15)).is_empty());
        assert_eq!(Some(3), store.remove(UserId::new(1)));
    }
}
