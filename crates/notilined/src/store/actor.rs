//! Store actor - owns the notification sequence, the cursor and the id
//! counter, and decides what the status line shows.
//!
//! Every input (producer events, closes, navigation, timer expiry) is handled
//! here one at a time, start to finish, so none of the state needs a lock.

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use notiline_core::{
    ExpirePolicy, NavCommand, NotifKey, Notification, NotificationId, NotificationList,
    NotificationRevision, NotificationView,
};

use super::commands::{NotifyRequest, StoreCommand, StoreSnapshot};
use crate::broadcast::BroadcasterHandle;
use crate::timer::{TimerExpired, TimerRequest};

/// What is on the status line.
///
/// `seeking_at` only means something while `showing` is set; when not
/// seeking, the displayed revision is always the latest one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cursor {
    showing: Option<NotifKey>,
    seeking_at: Option<usize>,
}

/// Why arbitration runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reason {
    /// The notification under the cursor changed; show it again.
    ShownChanged,
    /// Look for the first unseen notification.
    NewArrival,
}

/// The store actor.
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreCommand>,
    expired: mpsc::Receiver<TimerExpired>,
    timer: mpsc::UnboundedSender<TimerRequest>,
    broadcaster: BroadcasterHandle,

    notifications: NotificationList,
    cursor: Cursor,
    next_id: u32,

    /// Generation of the last request sent to the timer.
    timer_generation: u64,
    default_timeout_secs: u32,
    status: String,
}

impl StoreActor {
    pub fn new(
        receiver: mpsc::Receiver<StoreCommand>,
        timer: mpsc::UnboundedSender<TimerRequest>,
        expired: mpsc::Receiver<TimerExpired>,
        broadcaster: BroadcasterHandle,
        default_timeout_secs: u32,
    ) -> Self {
        Self {
            receiver,
            expired,
            timer,
            broadcaster,
            notifications: NotificationList::new(),
            cursor: Cursor::default(),
            next_id: 1,
            timer_generation: 0,
            default_timeout_secs,
            status: String::new(),
        }
    }

    /// Runs the event loop until every handle is dropped.
    pub async fn run(mut self) {
        info!(
            default_timeout_secs = self.default_timeout_secs,
            "Notification store starting"
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(expired) = self.expired.recv() => self.handle_expired(expired),
            }
        }

        info!(
            notifications = self.notifications.len(),
            "Notification store stopped"
        );
    }

    fn handle_command(&mut self, cmd: StoreCommand) {
        match cmd {
            StoreCommand::Notify {
                request,
                respond_to,
            } => {
                let id = self.handle_notify(*request);
                // The producer may have given up waiting.
                let _ = respond_to.send(id);
            }
            StoreCommand::Close { id } => self.handle_close(id),
            StoreCommand::Navigate(nav) => self.handle_navigate(nav),
            StoreCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }
        }
    }

    fn handle_navigate(&mut self, nav: NavCommand) {
        debug!(command = %nav, "Navigation command");
        match nav {
            NavCommand::NextMsg => self.seek_next_msg(),
            NavCommand::PrevMsg => self.seek_prev_msg(),
            NavCommand::NextNotif => self.seek_next_notif(),
            NavCommand::PrevNotif => self.seek_prev_notif(),
            NavCommand::Dismiss => self.dismiss_current(),
            NavCommand::DismissAll => self.dismiss_all(),
            NavCommand::Hide => self.hide_current(),
            NavCommand::HideAll => self.hide_all(),
        }
    }

    // ------------------------------------------------------------------------
    // Producer events
    // ------------------------------------------------------------------------

    fn handle_notify(&mut self, request: NotifyRequest) -> NotificationId {
        let NotifyRequest {
            app_name,
            replaces_id,
            app_icon,
            summary,
            body,
            actions,
            expire_timeout,
            received_at,
        } = request;

        let expire = ExpirePolicy::from_timeout(expire_timeout);
        let revision = NotificationRevision::with_timestamp(received_at, summary, body);

        let existing = NotificationId::new(replaces_id).and_then(|id| self.notifications.find(id));

        if let Some(key) = existing {
            if let Some(notif) = self.notifications.get_mut(key) {
                notif.apply_update(app_name, app_icon, revision, actions, expire);
                let id = notif.id;
                self.notifications.move_to_back(key);
                debug!(id = %id, "Notification updated");

                if self.cursor.showing == Some(key) {
                    self.next_status(Reason::ShownChanged);
                } else if self.nothing_shown_or_permanent() {
                    self.next_status(Reason::NewArrival);
                }
                return id;
            }
        }

        let id = self.allocate_id();
        self.notifications.push_back(Notification::new(
            id, app_name, app_icon, revision, actions, expire,
        ));
        debug!(
            id = %id,
            requested = replaces_id,
            total = self.notifications.len(),
            "Notification created"
        );

        if self.nothing_shown_or_permanent() {
            self.next_status(Reason::NewArrival);
        }
        id
    }

    /// Next free id: starts at 1, skips ids in use, wraps past `u32::MAX`.
    fn allocate_id(&mut self) -> NotificationId {
        loop {
            let candidate = NotificationId::new(self.next_id);
            self.next_id = self.next_id.checked_add(1).unwrap_or(1);

            if let Some(id) = candidate {
                if !self.notifications.contains_id(id) {
                    return id;
                }
            }
        }
    }

    /// External close: mark seen, and move on if it is on display.
    fn handle_close(&mut self, raw_id: u32) {
        let Some(key) = NotificationId::new(raw_id).and_then(|id| self.notifications.find(id))
        else {
            debug!(id = raw_id, "Close for unknown notification ignored");
            return;
        };

        if let Some(notif) = self.notifications.get_mut(key) {
            notif.mark_seen();
        }

        if self.cursor.showing == Some(key) && !self.is_seeking() {
            self.cancel_timer();
            self.next_status(Reason::NewArrival);
        }
    }

    fn handle_expired(&mut self, expired: TimerExpired) {
        if expired.generation != self.timer_generation {
            debug!(
                generation = expired.generation,
                current = self.timer_generation,
                "Stale expiry ignored"
            );
            return;
        }

        debug!("Displayed notification expired");
        self.next_status(Reason::NewArrival);
    }

    // ------------------------------------------------------------------------
    // Hide / dismiss
    // ------------------------------------------------------------------------

    fn hide_current(&mut self) {
        let Some(key) = self.shown_key() else {
            self.cursor = Cursor::default();
            return;
        };

        self.cursor.seeking_at = None;
        if let Some(notif) = self.notifications.get_mut(key) {
            notif.mark_seen();
        }
        self.cancel_timer();
        self.next_status(Reason::NewArrival);
    }

    fn hide_all(&mut self) {
        for notif in self.notifications.values_mut() {
            notif.mark_seen();
        }
        self.cancel_timer();
        self.cursor = Cursor::default();
        self.update_status();
    }

    fn dismiss_current(&mut self) {
        let Some(key) = self.shown_key() else {
            self.cursor = Cursor::default();
            return;
        };

        let successor = self.notifications.next(key);
        if let Some(removed) = self.notifications.remove(key) {
            debug!(id = %removed.id, "Notification dismissed");
        }

        match (self.is_seeking(), successor) {
            (false, Some(next)) => {
                self.cancel_timer();
                self.cursor.showing = Some(next);
                self.next_status(Reason::ShownChanged);
            }
            (true, Some(next)) => self.seek_to(next, 0),
            (_, None) => {
                self.cancel_timer();
                self.cursor = Cursor::default();
                self.next_status(Reason::NewArrival);
            }
        }
    }

    fn dismiss_all(&mut self) {
        debug!(count = self.notifications.len(), "Dismissing all notifications");
        self.notifications.clear();
        self.cursor = Cursor::default();
        self.cancel_timer();
        self.next_status(Reason::NewArrival);
    }

    // ------------------------------------------------------------------------
    // Seeking
    // ------------------------------------------------------------------------

    fn seek_prev_msg(&mut self) {
        let Some(key) = self.shown_key() else {
            self.seek_newest();
            return;
        };
        let at = self.position(key);

        if at > 0 {
            self.seek_to(key, at - 1);
        } else if let Some(prev) = self.notifications.prev(key) {
            let last = self.last_index(prev);
            self.seek_to(prev, last);
        }
    }

    fn seek_next_msg(&mut self) {
        let Some(key) = self.shown_key() else {
            return;
        };
        let at = self.position(key);

        if at < self.last_index(key) {
            self.seek_to(key, at + 1);
        } else if let Some(next) = self.notifications.next(key) {
            self.seek_to(next, 0);
        } else if self.is_seeking() {
            self.leave_seek();
        }
    }

    fn seek_next_notif(&mut self) {
        let Some(key) = self.shown_key() else {
            return;
        };

        if let Some(next) = self.notifications.next(key) {
            let last = self.last_index(next);
            self.seek_to(next, last);
        } else if self.is_seeking() {
            self.leave_seek();
        }
    }

    fn seek_prev_notif(&mut self) {
        let Some(key) = self.shown_key() else {
            self.seek_newest();
            return;
        };

        if let Some(prev) = self.notifications.prev(key) {
            let last = self.last_index(prev);
            self.seek_to(prev, last);
        }
    }

    /// Starts seeking at the newest notification's latest revision.
    fn seek_newest(&mut self) {
        if let Some(back) = self.notifications.back() {
            let last = self.last_index(back);
            self.seek_to(back, last);
        }
    }

    fn seek_to(&mut self, key: NotifKey, index: usize) {
        if !self.is_seeking() {
            self.cancel_timer();
        }

        self.cursor = Cursor {
            showing: Some(key),
            seeking_at: Some(index),
        };
        // Permanent ones stay unseen so arbitration can bring them back.
        if let Some(notif) = self.notifications.get_mut(key) {
            if index == notif.last_index() && !notif.is_permanent() {
                notif.mark_seen();
            }
        }
        self.update_status();
    }

    fn leave_seek(&mut self) {
        self.cursor.seeking_at = None;
        self.next_status(Reason::NewArrival);
    }

    // ------------------------------------------------------------------------
    // Arbitration
    // ------------------------------------------------------------------------

    /// Decides what to show next.
    ///
    /// A timed candidate is shown right away, marked seen and gets a
    /// countdown. The first unseen permanent candidate is kept as a fallback
    /// in case no timed one turns up. With neither, the display is cleared.
    fn next_status(&mut self, reason: Reason) {
        if self.is_seeking() && self.shown_key().is_some() {
            return;
        }
        self.cursor.seeking_at = None;

        let target = self.cursor.showing;
        let mut fallback = None;
        let mut timed = None;

        for (key, notif) in self.notifications.iter() {
            let selected = match reason {
                Reason::ShownChanged => Some(key) == target,
                Reason::NewArrival => !notif.is_seen(),
            };
            if !selected {
                continue;
            }

            match notif.expire.countdown_secs(self.default_timeout_secs) {
                Some(secs) => {
                    timed = Some((key, secs));
                    break;
                }
                None => {
                    if fallback.is_none() {
                        fallback = Some(key);
                    }
                }
            }
        }

        match (timed, fallback) {
            (Some((key, secs)), _) => {
                if let Some(notif) = self.notifications.get_mut(key) {
                    notif.mark_seen();
                }
                self.cursor.showing = Some(key);
                self.arm_timer(secs);
            }
            (None, Some(key)) => {
                self.cursor.showing = Some(key);
                self.cancel_timer();
            }
            (None, None) => {
                self.cursor.showing = None;
                self.cancel_timer();
            }
        }

        self.update_status();
    }

    /// Republishes the display string for the current cursor.
    fn update_status(&mut self) {
        let status = match self.shown_key().and_then(|key| self.notifications.get(key)) {
            None => String::new(),
            Some(notif) => match self.cursor.seeking_at.and_then(|i| notif.revision(i)) {
                Some(revision) => revision.seek_string(Utc::now()),
                None => notif.display_string(),
            },
        };
        self.publish(status);
    }

    fn publish(&mut self, status: String) {
        self.status.clone_from(&status);
        self.broadcaster.publish(status);
    }

    // ------------------------------------------------------------------------
    // Timer
    // ------------------------------------------------------------------------

    fn arm_timer(&mut self, secs: u32) {
        self.timer_generation = self.timer_generation.wrapping_add(1);
        let request = TimerRequest::from_secs(secs, self.timer_generation);
        debug!(secs, generation = self.timer_generation, "Arming countdown");
        let _ = self.timer.send(request);
    }

    fn cancel_timer(&mut self) {
        self.timer_generation = self.timer_generation.wrapping_add(1);
        let _ = self.timer.send(TimerRequest::Cancel);
    }

    // ------------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------------

    /// The shown notification's key, if it is still in the sequence.
    fn shown_key(&self) -> Option<NotifKey> {
        self.cursor
            .showing
            .filter(|key| self.notifications.contains(*key))
    }

    fn is_seeking(&self) -> bool {
        self.cursor.seeking_at.is_some()
    }

    fn nothing_shown_or_permanent(&self) -> bool {
        match self.shown_key().and_then(|key| self.notifications.get(key)) {
            None => true,
            Some(notif) => notif.is_permanent(),
        }
    }

    fn last_index(&self, key: NotifKey) -> usize {
        self.notifications.get(key).map_or(0, Notification::last_index)
    }

    /// Revision index the cursor is on within `key`.
    fn position(&self, key: NotifKey) -> usize {
        self.cursor
            .seeking_at
            .unwrap_or_else(|| self.last_index(key))
    }

    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            notifications: self
                .notifications
                .iter()
                .map(|(_, notif)| NotificationView::from_notification(notif))
                .collect(),
            showing: self
                .shown_key()
                .and_then(|key| self.notifications.get(key))
                .map(|notif| notif.id),
            seeking_at: self.cursor.seeking_at,
            status: self.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::BroadcastCommand;
    use tokio::sync::oneshot;

    struct Harness {
        actor: StoreActor,
        timer_rx: mpsc::UnboundedReceiver<TimerRequest>,
        broadcast_rx: mpsc::UnboundedReceiver<BroadcastCommand>,
        _cmd_tx: mpsc::Sender<StoreCommand>,
        _expired_tx: mpsc::Sender<TimerExpired>,
    }

    impl Harness {
        fn new() -> Self {
            let (cmd_tx, cmd_rx) = mpsc::channel(16);
            let (timer_tx, timer_rx) = mpsc::unbounded_channel();
            let (expired_tx, expired_rx) = mpsc::channel(4);
            let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();
            let actor = StoreActor::new(
                cmd_rx,
                timer_tx,
                expired_rx,
                BroadcasterHandle::new(broadcast_tx),
                15,
            );
            Self {
                actor,
                timer_rx,
                broadcast_rx,
                _cmd_tx: cmd_tx,
                _expired_tx: expired_tx,
            }
        }

        fn send(&mut self, request: NotifyRequest) -> u32 {
            let (tx, mut rx) = oneshot::channel();
            self.actor.handle_command(StoreCommand::Notify {
                request: Box::new(request),
                respond_to: tx,
            });
            rx.try_recv().unwrap().get()
        }

        fn notify(&mut self, replaces_id: u32, summary: &str, body: &str) -> u32 {
            self.send(
                NotifyRequest::new(summary, body)
                    .with_app("test", "")
                    .replacing(replaces_id),
            )
        }

        fn permanent(&mut self, summary: &str, body: &str) -> u32 {
            self.send(NotifyRequest::new(summary, body).with_timeout(0))
        }

        fn nav(&mut self, nav: NavCommand) {
            self.actor.handle_command(StoreCommand::Navigate(nav));
        }

        fn close(&mut self, id: u32) {
            self.actor.handle_command(StoreCommand::Close { id });
        }

        fn expire(&mut self) {
            let generation = self.actor.timer_generation;
            self.actor.handle_expired(TimerExpired { generation });
        }

        /// Drains timer requests, returning the last one.
        fn last_timer(&mut self) -> Option<TimerRequest> {
            let mut last = None;
            while let Ok(request) = self.timer_rx.try_recv() {
                last = Some(request);
            }
            last
        }

        /// Drains published statuses.
        fn published(&mut self) -> Vec<String> {
            let mut out = Vec::new();
            while let Ok(cmd) = self.broadcast_rx.try_recv() {
                if let BroadcastCommand::Publish { status } = cmd {
                    out.push(status);
                }
            }
            out
        }

        fn snapshot(&self) -> StoreSnapshot {
            self.actor.snapshot()
        }

        fn showing(&self) -> Option<u32> {
            self.snapshot().showing.map(NotificationId::get)
        }

        fn view(&self, id: u32) -> NotificationView {
            self.snapshot()
                .get(NotificationId::new(id).unwrap())
                .cloned()
                .unwrap()
        }

        fn ids(&self) -> Vec<u32> {
            self.snapshot().ids().into_iter().map(NotificationId::get).collect()
        }
    }

    fn armed_secs(request: Option<TimerRequest>) -> u32 {
        request.map_or(0, |r| r.secs())
    }

    // ========================================================================
    // End-to-end scenarios
    // ========================================================================

    #[test]
    fn test_scenario_create_update_and_expire() {
        let mut h = Harness::new();

        // A: first notification is shown and armed immediately
        let id1 = h.notify(0, "1", "0");
        assert!(id1 > 0);
        assert!(armed_secs(h.last_timer()) > 0);
        assert_eq!(h.showing(), Some(id1));
        assert!(h.view(id1).seen_by_user);
        assert_eq!(h.snapshot().seeking_at, None);
        assert_eq!(h.published(), vec!["1 | 0"]);

        // second one waits
        let id2 = h.notify(0, "2", "0");
        assert_ne!(id1, id2);
        assert_eq!(h.snapshot().len(), 2);
        assert_eq!(h.showing(), Some(id1));
        assert!(!h.view(id2).seen_by_user);
        assert!(h.last_timer().is_none());

        // background update does not disturb the display
        assert_eq!(h.notify(id2, "2", "1"), id2);
        assert_eq!(h.snapshot().len(), 2);
        assert_eq!(h.showing(), Some(id1));
        assert_eq!(h.view(id2).revision_count, 2);
        assert!(h.last_timer().is_none());
        assert!(h.published().is_empty());

        // foreground update refreshes the display and restarts the timer
        assert_eq!(h.notify(id1, "1", "1"), id1);
        assert!(armed_secs(h.last_timer()) > 0);
        assert_eq!(h.ids(), vec![id2, id1]);
        assert_eq!(h.showing(), Some(id1));
        assert_eq!(h.view(id1).revision_count, 2);
        assert_eq!(h.published(), vec!["1 | 1"]);

        // B: expiry moves on to the unseen notification
        h.expire();
        assert!(armed_secs(h.last_timer()) > 0);
        assert_eq!(h.ids(), vec![id2, id1]);
        assert_eq!(h.showing(), Some(id2));
        assert_eq!(h.snapshot().seeking_at, None);
        assert_eq!(h.published(), vec!["2 | 1"]);
    }

    #[test]
    fn test_scenario_dismiss_all_then_create() {
        let mut h = Harness::new();
        h.notify(0, "a", "1");
        h.notify(0, "b", "2");

        h.nav(NavCommand::DismissAll);
        assert!(h.snapshot().is_empty());
        assert_eq!(h.snapshot().status, "");

        let id = h.notify(0, "c", "3");
        assert_eq!(h.ids(), vec![id]);
        assert_eq!(h.showing(), Some(id));
        assert_eq!(h.snapshot().status, "c | 3");
    }

    // ========================================================================
    // Ids
    // ========================================================================

    #[test]
    fn test_ids_unique() {
        let mut h = Harness::new();
        let mut ids: Vec<u32> = (0..50).map(|i| h.notify(0, "n", &i.to_string())).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 50);
        assert!(!ids.contains(&0));
    }

    #[test]
    fn test_allocator_skips_taken_ids() {
        let mut h = Harness::new();
        let first = h.notify(0, "a", "");
        assert_eq!(first, 1);

        // an unknown replaces_id still gets a fresh allocator id
        let second = h.notify(77, "b", "");
        assert_eq!(second, 2);

        // simulate a producer-owned id sitting on the next counter value
        h.actor.next_id = 1;
        let third = h.notify(0, "c", "");
        assert_eq!(third, 3);
        assert_eq!(h.snapshot().len(), 3);
    }

    #[test]
    fn test_allocator_wraps_to_one() {
        let mut h = Harness::new();
        h.actor.next_id = u32::MAX;
        assert_eq!(h.notify(0, "a", ""), u32::MAX);
        assert_eq!(h.notify(0, "b", ""), 1);
    }

    // ========================================================================
    // Arbitration
    // ========================================================================

    #[test]
    fn test_update_of_hidden_notification_is_not_disruptive() {
        let mut h = Harness::new();
        let id1 = h.notify(0, "1", "0");
        let id2 = h.notify(0, "2", "0");
        h.last_timer();
        h.published();

        h.notify(id2, "2", "1");
        assert_eq!(h.showing(), Some(id1));
        assert!(h.last_timer().is_none());
        assert!(h.published().is_empty());
    }

    #[test]
    fn test_permanent_persists_until_hidden() {
        let mut h = Harness::new();
        let p = h.permanent("p", "0");
        assert_eq!(h.showing(), Some(p));
        assert_eq!(h.last_timer(), Some(TimerRequest::Cancel));
        assert!(!h.view(p).seen_by_user);

        // an expiry for an older countdown changes nothing
        h.actor.handle_expired(TimerExpired { generation: 0 });
        assert_eq!(h.showing(), Some(p));

        h.nav(NavCommand::Hide);
        assert!(h.view(p).seen_by_user);
        assert_eq!(h.showing(), None);
        assert_eq!(h.snapshot().status, "");
    }

    #[test]
    fn test_timed_arrival_preempts_permanent() {
        let mut h = Harness::new();
        let p = h.permanent("p", "0");
        let t = h.notify(0, "t", "0");

        assert_eq!(h.showing(), Some(t));
        assert!(armed_secs(h.last_timer()) > 0);
        assert!(!h.view(p).seen_by_user);

        // the permanent one comes back once the timed one expires
        h.expire();
        assert_eq!(h.showing(), Some(p));
        assert_eq!(h.snapshot().status, "p | 0");
    }

    #[test]
    fn test_newer_permanent_waits_its_turn() {
        let mut h = Harness::new();
        let p1 = h.permanent("p1", "");
        let p2 = h.permanent("p2", "");
        assert_eq!(h.showing(), Some(p1));

        h.nav(NavCommand::Hide);
        assert_eq!(h.showing(), Some(p2));
    }

    #[test]
    fn test_seen_timed_notifications_do_not_preempt_permanent() {
        let mut h = Harness::new();
        let t = h.notify(0, "t", "");
        h.expire();
        assert_eq!(h.showing(), None);

        let p = h.permanent("p", "");
        assert_eq!(h.showing(), Some(p));
        assert!(h.view(t).seen_by_user);
    }

    #[test]
    fn test_default_timeout_is_configurable() {
        let mut h = Harness::new();
        h.actor.default_timeout_secs = 4;
        h.notify(0, "a", "");
        assert_eq!(armed_secs(h.last_timer()), 4);

        h.send(NotifyRequest::new("b", "").with_timeout(9).replacing(1));
        assert_eq!(armed_secs(h.last_timer()), 9);
    }

    #[test]
    fn test_stale_expiry_is_ignored() {
        let mut h = Harness::new();
        let id1 = h.notify(0, "1", "");
        let stale = h.actor.timer_generation;
        h.notify(0, "2", "");

        // foreground update re-arms; the old expiry must not advance
        h.notify(id1, "1", "1");
        h.actor.handle_expired(TimerExpired { generation: stale });
        assert_eq!(h.showing(), Some(id1));
    }

    // ========================================================================
    // Close / hide
    // ========================================================================

    #[test]
    fn test_close_marks_seen_without_removing() {
        let mut h = Harness::new();
        let id1 = h.notify(0, "1", "");
        let id2 = h.notify(0, "2", "");

        h.close(id2);
        assert!(h.view(id2).seen_by_user);
        assert_eq!(h.snapshot().len(), 2);
        assert_eq!(h.showing(), Some(id1));

        // closing the displayed one moves on; nothing unseen is left
        h.close(id1);
        assert_eq!(h.showing(), None);
        assert_eq!(h.snapshot().status, "");
    }

    #[test]
    fn test_close_unknown_and_empty_are_noops() {
        let mut h = Harness::new();
        h.close(0);
        h.close(12);
        h.nav(NavCommand::Hide);
        h.nav(NavCommand::Dismiss);
        assert!(h.snapshot().is_empty());
        assert_eq!(h.showing(), None);

        let id = h.notify(0, "a", "");
        h.close(id + 1);
        assert_eq!(h.showing(), Some(id));
    }

    #[test]
    fn test_close_while_seeking_only_marks_seen() {
        let mut h = Harness::new();
        let id1 = h.notify(0, "1", "0");
        h.notify(id1, "1", "1");

        h.nav(NavCommand::PrevMsg);
        h.close(id1);
        assert_eq!(h.showing(), Some(id1));
        assert_eq!(h.snapshot().seeking_at, Some(0));
    }

    #[test]
    fn test_hide_all() {
        let mut h = Harness::new();
        let a = h.notify(0, "a", "");
        let b = h.notify(0, "b", "");
        h.last_timer();

        h.nav(NavCommand::HideAll);
        assert_eq!(h.last_timer(), Some(TimerRequest::Cancel));
        let snap = h.snapshot();
        assert_eq!(snap.showing, None);
        assert_eq!(snap.seeking_at, None);
        assert_eq!(snap.status, "");
        assert!(h.view(a).seen_by_user && h.view(b).seen_by_user);
    }

    // ========================================================================
    // Dismiss
    // ========================================================================

    #[test]
    fn test_dismiss_shows_successor() {
        let mut h = Harness::new();
        let a = h.notify(0, "a", "");
        let b = h.notify(0, "b", "");
        h.last_timer();

        h.nav(NavCommand::Dismiss);
        assert_eq!(h.ids(), vec![b]);
        assert_eq!(h.showing(), Some(b));
        assert!(armed_secs(h.last_timer()) > 0);
        assert!(h.snapshot().get(NotificationId::new(a).unwrap()).is_none());
    }

    #[test]
    fn test_dismiss_last_clears_display() {
        let mut h = Harness::new();
        h.notify(0, "a", "");
        h.nav(NavCommand::Dismiss);
        assert!(h.snapshot().is_empty());
        assert_eq!(h.showing(), None);
        assert_eq!(h.published().last().map(String::as_str), Some(""));
    }

    #[test]
    fn test_dismiss_while_seeking_advances_to_successor() {
        let mut h = Harness::new();
        let a = h.notify(0, "a", "0");
        let b = h.notify(0, "b", "0");
        h.notify(b, "b", "1");
        h.expire();
        assert_eq!(h.showing(), Some(b));

        h.nav(NavCommand::PrevNotif);
        assert_eq!(h.showing(), Some(a));
        h.nav(NavCommand::Dismiss);

        assert_eq!(h.ids(), vec![b]);
        assert_eq!(h.showing(), Some(b));
        assert_eq!(h.snapshot().seeking_at, Some(0));
    }

    // ========================================================================
    // Seeking
    // ========================================================================

    #[test]
    fn test_seek_through_revisions_and_notifications() {
        let mut h = Harness::new();
        let a = h.notify(0, "a", "0");
        h.notify(a, "a", "1");
        h.expire();
        let b = h.notify(0, "b", "0");
        h.notify(b, "b", "1");
        assert_eq!(h.ids(), vec![a, b]);
        assert_eq!(h.showing(), Some(b));
        h.last_timer();

        // entering seek cancels the countdown
        h.nav(NavCommand::PrevMsg);
        assert_eq!(h.last_timer(), Some(TimerRequest::Cancel));
        assert_eq!(h.snapshot().seeking_at, Some(0));
        assert!(h.snapshot().status.ends_with("b | 0"));
        assert!(h.snapshot().status.starts_with('('));

        // crossing into the older notification lands on its latest revision
        h.nav(NavCommand::PrevMsg);
        assert_eq!(h.showing(), Some(a));
        assert_eq!(h.snapshot().seeking_at, Some(1));

        h.nav(NavCommand::PrevMsg);
        assert_eq!(h.snapshot().seeking_at, Some(0));

        // bound: first revision of the oldest notification
        h.nav(NavCommand::PrevMsg);
        assert_eq!(h.showing(), Some(a));
        assert_eq!(h.snapshot().seeking_at, Some(0));

        // crossing into the newer notification lands on its first revision
        h.nav(NavCommand::NextMsg);
        h.nav(NavCommand::NextMsg);
        assert_eq!(h.showing(), Some(b));
        assert_eq!(h.snapshot().seeking_at, Some(0));
        assert!(h.last_timer().is_none());
    }

    #[test]
    fn test_seek_next_past_newest_leaves_seek() {
        let mut h = Harness::new();
        let a = h.notify(0, "a", "");
        h.expire();
        h.nav(NavCommand::PrevNotif);
        assert_eq!(h.snapshot().seeking_at, Some(0));
        assert_eq!(h.showing(), Some(a));

        h.nav(NavCommand::NextMsg);
        let snap = h.snapshot();
        assert_eq!(snap.seeking_at, None);
        assert_eq!(snap.showing, None);
        assert_eq!(snap.status, "");
    }

    #[test]
    fn test_next_without_seek_at_newest_is_noop() {
        let mut h = Harness::new();
        let a = h.notify(0, "a", "");
        h.last_timer();

        h.nav(NavCommand::NextMsg);
        h.nav(NavCommand::NextNotif);
        assert_eq!(h.showing(), Some(a));
        assert_eq!(h.snapshot().seeking_at, None);
        assert!(h.last_timer().is_none());
    }

    #[test]
    fn test_seek_notif_jumps_to_latest_revisions() {
        let mut h = Harness::new();
        let a = h.notify(0, "a", "0");
        h.notify(a, "a", "1");
        let b = h.notify(0, "b", "0");
        let c = h.notify(0, "c", "0");
        h.notify(c, "c", "1");
        h.notify(c, "c", "2");
        h.expire();
        assert_eq!(h.ids(), vec![a, b, c]);
        assert_eq!(h.showing(), Some(b));

        h.nav(NavCommand::PrevNotif);
        assert_eq!(h.showing(), Some(a));
        assert_eq!(h.snapshot().seeking_at, Some(1));

        h.nav(NavCommand::NextNotif);
        h.nav(NavCommand::NextNotif);
        assert_eq!(h.showing(), Some(c));
        assert_eq!(h.snapshot().seeking_at, Some(2));
        assert!(h.view(c).seen_by_user);

        // past the newest notification leaves seek mode
        h.nav(NavCommand::NextNotif);
        assert_eq!(h.snapshot().seeking_at, None);
    }

    #[test]
    fn test_seek_from_empty_display() {
        let mut h = Harness::new();
        h.nav(NavCommand::PrevMsg);
        assert_eq!(h.showing(), None);

        let a = h.notify(0, "a", "");
        h.expire();
        assert_eq!(h.showing(), None);

        h.nav(NavCommand::NextMsg);
        assert_eq!(h.showing(), None);

        h.nav(NavCommand::PrevMsg);
        assert_eq!(h.showing(), Some(a));
        assert_eq!(h.snapshot().seeking_at, Some(0));
    }

    #[test]
    fn test_permanent_returns_after_seeking_across_it() {
        let mut h = Harness::new();
        let a = h.notify(0, "a", "");
        h.expire();
        let p = h.permanent("pinned", "");
        assert_eq!(h.showing(), Some(p));

        h.nav(NavCommand::PrevNotif);
        assert_eq!(h.showing(), Some(a));
        h.nav(NavCommand::NextNotif);
        assert_eq!(h.showing(), Some(p));
        assert_eq!(h.snapshot().seeking_at, Some(0));
        assert!(!h.view(p).seen_by_user);

        // leaving seek mode brings the permanent one back
        h.nav(NavCommand::NextNotif);
        let snap = h.snapshot();
        assert_eq!(snap.seeking_at, None);
        assert_eq!(snap.showing.map(NotificationId::get), Some(p));
        assert_eq!(snap.status, "pinned | ");
        assert!(h.last_timer().is_some_and(|r| r.secs() == 0));
    }

    #[test]
    fn test_seeking_blocks_arbitration() {
        let mut h = Harness::new();
        let a = h.notify(0, "a", "0");
        h.notify(a, "a", "1");
        h.nav(NavCommand::PrevMsg);

        // new arrival, expiry and update do not interrupt the seek
        let b = h.notify(0, "b", "");
        h.expire();
        h.notify(a, "a", "2");
        assert_eq!(h.showing(), Some(a));
        assert_eq!(h.snapshot().seeking_at, Some(0));
        assert!(!h.view(b).seen_by_user);

        // hide leaves seek mode and shows what is pending
        h.nav(NavCommand::Hide);
        assert_eq!(h.snapshot().seeking_at, None);
        assert_eq!(h.showing(), Some(b));
    }
}
