//! Ordered notification storage with stable handles.
//!
//! `NotificationList` is an arena of slots threaded by an explicit
//! doubly-linked order (oldest at the front, most recently created or
//! updated at the back). A `NotifKey` stays valid while its notification is
//! in the list, no matter what is inserted, moved or removed around it.
//! Keys carry a slot generation, so a key to a removed notification never
//! resolves to whatever later reuses the slot.

use crate::notification::{Notification, NotificationId};

/// Stable handle to a notification held in a [`NotificationList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotifKey {
    index: usize,
    generation: u64,
}

#[derive(Debug)]
struct Entry {
    notif: Notification,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    entry: Option<Entry>,
}

/// Arena-backed, insertion-ordered list of notifications.
#[derive(Debug, Default)]
pub struct NotificationList {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl NotificationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a notification at the back (most recent position).
    pub fn push_back(&mut self, notif: Notification) -> NotifKey {
        let entry = Entry {
            notif,
            prev: None,
            next: None,
        };

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: None,
                });
                self.slots.len() - 1
            }
        };

        let generation = match self.slots.get_mut(index) {
            Some(slot) => {
                slot.entry = Some(entry);
                slot.generation
            }
            None => 0,
        };

        self.link_back(index);
        self.len += 1;

        NotifKey { index, generation }
    }

    pub fn get(&self, key: NotifKey) -> Option<&Notification> {
        self.resolve(key).and_then(|i| self.entry(i)).map(|e| &e.notif)
    }

    pub fn get_mut(&mut self, key: NotifKey) -> Option<&mut Notification> {
        let index = self.resolve(key)?;
        self.entry_mut(index).map(|e| &mut e.notif)
    }

    #[must_use]
    pub fn contains(&self, key: NotifKey) -> bool {
        self.resolve(key).is_some()
    }

    /// Removes a notification, returning it. Stale keys return `None`.
    pub fn remove(&mut self, key: NotifKey) -> Option<Notification> {
        let index = self.resolve(key)?;
        self.unlink(index);

        let slot = self.slots.get_mut(index)?;
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.len -= 1;

        Some(entry.notif)
    }

    /// Moves a notification to the back of the order.
    ///
    /// Returns `false` for a stale key.
    pub fn move_to_back(&mut self, key: NotifKey) -> bool {
        let Some(index) = self.resolve(key) else {
            return false;
        };
        if self.tail == Some(index) {
            return true;
        }
        self.unlink(index);
        self.link_back(index);
        true
    }

    /// Key of the oldest notification.
    pub fn front(&self) -> Option<NotifKey> {
        self.head.and_then(|i| self.key_at(i))
    }

    /// Key of the most recent notification.
    pub fn back(&self) -> Option<NotifKey> {
        self.tail.and_then(|i| self.key_at(i))
    }

    /// Key of the notification right after `key` (one step more recent).
    pub fn next(&self, key: NotifKey) -> Option<NotifKey> {
        let index = self.resolve(key)?;
        self.entry(index)?.next.and_then(|i| self.key_at(i))
    }

    /// Key of the notification right before `key` (one step older).
    pub fn prev(&self, key: NotifKey) -> Option<NotifKey> {
        let index = self.resolve(key)?;
        self.entry(index)?.prev.and_then(|i| self.key_at(i))
    }

    /// Finds a notification by id, searching most recent first.
    pub fn find(&self, id: NotificationId) -> Option<NotifKey> {
        let mut cursor = self.back();
        while let Some(key) = cursor {
            if self.get(key).is_some_and(|n| n.id == id) {
                return Some(key);
            }
            cursor = self.prev(key);
        }
        None
    }

    #[must_use]
    pub fn contains_id(&self, id: NotificationId) -> bool {
        self.find(id).is_some()
    }

    /// Iterates front (oldest) to back (most recent).
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.front(),
        }
    }

    /// Mutable access to every notification, in no particular order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Notification> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.entry.as_mut())
            .map(|entry| &mut entry.notif)
    }

    /// Removes every notification. All outstanding keys become stale.
    pub fn clear(&mut self) {
        let mut cursor = self.front();
        while let Some(key) = cursor {
            cursor = self.next(key);
            self.remove(key);
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn resolve(&self, key: NotifKey) -> Option<usize> {
        let slot = self.slots.get(key.index)?;
        (slot.generation == key.generation && slot.entry.is_some()).then_some(key.index)
    }

    fn key_at(&self, index: usize) -> Option<NotifKey> {
        let slot = self.slots.get(index)?;
        slot.entry.as_ref().map(|_| NotifKey {
            index,
            generation: slot.generation,
        })
    }

    fn entry(&self, index: usize) -> Option<&Entry> {
        self.slots.get(index).and_then(|s| s.entry.as_ref())
    }

    fn entry_mut(&mut self, index: usize) -> Option<&mut Entry> {
        self.slots.get_mut(index).and_then(|s| s.entry.as_mut())
    }

    fn unlink(&mut self, index: usize) {
        let (prev, next) = match self.entry(index) {
            Some(e) => (e.prev, e.next),
            None => return,
        };

        match prev.and_then(|p| self.entry_mut(p)) {
            Some(p) => p.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.entry_mut(n)) {
            Some(n) => n.prev = prev,
            None => self.tail = prev,
        }

        if let Some(e) = self.entry_mut(index) {
            e.prev = None;
            e.next = None;
        }
    }

    fn link_back(&mut self, index: usize) {
        let old_tail = self.tail;
        if let Some(e) = self.entry_mut(index) {
            e.prev = old_tail;
            e.next = None;
        }
        match old_tail.and_then(|t| self.entry_mut(t)) {
            Some(t) => t.next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
    }
}

/// Front-to-back iterator over `(key, notification)` pairs.
pub struct Iter<'a> {
    list: &'a NotificationList,
    cursor: Option<NotifKey>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (NotifKey, &'a Notification);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        let notif = self.list.get(key)?;
        self.cursor = self.list.next(key);
        Some((key, notif))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{ExpirePolicy, NotificationRevision};

    fn notif(raw_id: u32) -> Notification {
        Notification::new(
            NotificationId::new(raw_id).unwrap(),
            "test",
            "",
            NotificationRevision::new(raw_id.to_string(), "0"),
            Vec::new(),
            ExpirePolicy::Default,
        )
    }

    fn ids(list: &NotificationList) -> Vec<u32> {
        list.iter().map(|(_, n)| n.id.get()).collect()
    }

    #[test]
    fn test_push_back_keeps_insertion_order() {
        let mut list = NotificationList::new();
        assert!(list.is_empty());
        assert!(list.front().is_none());

        let a = list.push_back(notif(1));
        list.push_back(notif(2));
        let c = list.push_back(notif(3));

        assert_eq!(list.len(), 3);
        assert_eq!(ids(&list), vec![1, 2, 3]);
        assert_eq!(list.front(), Some(a));
        assert_eq!(list.back(), Some(c));
        assert!(list.prev(a).is_none());
        assert!(list.next(c).is_none());
    }

    #[test]
    fn test_move_to_back() {
        let mut list = NotificationList::new();
        let a = list.push_back(notif(1));
        let b = list.push_back(notif(2));
        list.push_back(notif(3));

        assert!(list.move_to_back(a));
        assert_eq!(ids(&list), vec![2, 3, 1]);
        assert_eq!(list.front(), Some(b));
        assert_eq!(list.back(), Some(a));

        // already at the back
        assert!(list.move_to_back(a));
        assert_eq!(ids(&list), vec![2, 3, 1]);
    }

    #[test]
    fn test_keys_survive_removal_elsewhere() {
        let mut list = NotificationList::new();
        let a = list.push_back(notif(1));
        let b = list.push_back(notif(2));
        let c = list.push_back(notif(3));

        assert_eq!(list.remove(b).unwrap().id.get(), 2);
        assert_eq!(list.get(a).unwrap().id.get(), 1);
        assert_eq!(list.get(c).unwrap().id.get(), 3);
        assert_eq!(list.next(a), Some(c));
        assert_eq!(list.prev(c), Some(a));
        assert_eq!(ids(&list), vec![1, 3]);
    }

    #[test]
    fn test_stale_key_never_resolves_to_reused_slot() {
        let mut list = NotificationList::new();
        let a = list.push_back(notif(1));
        list.remove(a);

        let d = list.push_back(notif(4));
        assert!(list.get(a).is_none());
        assert!(!list.contains(a));
        assert!(list.remove(a).is_none());
        assert!(!list.move_to_back(a));
        assert_eq!(list.get(d).unwrap().id.get(), 4);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_find_by_id() {
        let mut list = NotificationList::new();
        list.push_back(notif(5));
        let b = list.push_back(notif(9));

        assert_eq!(list.find(NotificationId::new(9).unwrap()), Some(b));
        assert!(list.find(NotificationId::new(6).unwrap()).is_none());
        assert!(list.contains_id(NotificationId::new(5).unwrap()));
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut list = NotificationList::new();
        let a = list.push_back(notif(1));
        list.push_back(notif(2));

        list.clear();
        assert!(list.is_empty());
        assert!(list.get(a).is_none());
        assert!(list.iter().next().is_none());

        list.push_back(notif(3));
        assert_eq!(ids(&list), vec![3]);
    }

    #[test]
    fn test_values_mut() {
        let mut list = NotificationList::new();
        list.push_back(notif(1));
        list.push_back(notif(2));

        for n in list.values_mut() {
            n.mark_seen();
        }
        assert!(list.iter().all(|(_, n)| n.is_seen()));
    }
}
