use super::observable::{Callback, Observable, Source, SubscriberList, Subscription};
use crate::structural::structurally_equal;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};

type MapFn<S, R> = Arc<dyn Fn(&S) -> R + Send + Sync>;
type MemoFn<R> = Arc<dyn Fn(&R, &R) -> bool + Send + Sync>;

/// Derive a stream by mapping every value of `source`.
///
/// Consecutive outputs that are structurally equal are dropped, and the
/// latest output is replayed to every new subscriber, including ones that
/// attach long after the last emission.
pub fn select<S, R, F>(source: &Observable<S>, map: F) -> Observable<R>
where
    S: 'static,
    R: Serialize + Send + Sync + 'static,
    F: Fn(&S) -> R + Send + Sync + 'static,
{
    select_with(source, map, |previous: &R, current: &R| {
        structurally_equal(previous, current)
    })
}

/// Like [`select`], with a custom equality deciding which outputs to drop.
pub fn select_with<S, R, F, M>(source: &Observable<S>, map: F, memo: M) -> Observable<R>
where
    S: 'static,
    R: Send + Sync + 'static,
    F: Fn(&S) -> R + Send + Sync + 'static,
    M: Fn(&R, &R) -> bool + Send + Sync + 'static,
{
    let selected = Selected {
        upstream: source.clone(),
        map: Arc::new(map),
        memo: Arc::new(memo),
        replay: Mutex::new(Replay {
            latest: None,
            connection: Connection::Idle,
        }),
        subscribers: SubscriberList::new(),
    };
    Observable::new(Arc::new(selected), Arc::clone(source.gate()))
}

impl<T: 'static> Observable<T> {
    /// Method form of [`select`].
    pub fn select<R, F>(&self, map: F) -> Observable<R>
    where
        R: Serialize + Send + Sync + 'static,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        select(self, map)
    }
}

enum Connection {
    Idle,
    Connecting,
    Connected(#[allow(dead_code)] Subscription),
}

struct Replay<R> {
    latest: Option<Arc<R>>,
    connection: Connection,
}

/// Shared, replaying, deduplicating projection of an upstream stream.
///
/// The upstream is subscribed once, on first use, and stays connected for as
/// long as the stream or any of its subscriptions is alive.
struct Selected<S, R> {
    upstream: Observable<S>,
    map: MapFn<S, R>,
    memo: MemoFn<R>,
    replay: Mutex<Replay<R>>,
    subscribers: SubscriberList<R>,
}

impl<S: 'static, R: Send + Sync + 'static> Selected<S, R> {
    fn on_next(&self, value: &S) {
        let next = (self.map)(value);
        let next = {
            let mut replay = self.replay.lock();
            if let Some(previous) = &replay.latest {
                if (self.memo)(previous, &next) {
                    return;
                }
            }
            let next = Arc::new(next);
            replay.latest = Some(Arc::clone(&next));
            next
        };
        self.subscribers.notify(&next);
    }

    fn connect(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let upstream = self.upstream.subscribe(move |value| {
            if let Some(node) = weak.upgrade() {
                node.on_next(value);
            }
        });
        self.replay.lock().connection = Connection::Connected(upstream);
    }
}

impl<S: 'static, R: Send + Sync + 'static> Source<R> for Selected<S, R> {
    fn subscribe(self: Arc<Self>, callback: Callback<R>) -> Subscription {
        let id = self.subscribers.add(Arc::clone(&callback));

        let pending = {
            let mut replay = self.replay.lock();
            match replay.connection {
                Connection::Idle => {
                    replay.connection = Connection::Connecting;
                    None
                }
                _ => Some(replay.latest.clone()),
            }
        };

        match pending {
            // Connecting makes the upstream replay its current value, which
            // reaches the new subscriber through the list.
            None => self.connect(),
            Some(Some(latest)) => callback(&latest),
            Some(None) => {}
        }

        Subscription::new(move || self.subscribers.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::StoreSubject;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn drops_consecutive_duplicates() {
        let subject = StoreSubject::new((1, "a"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let _subscription = select(&subject.as_observable(), |state| state.0)
            .subscribe(move |value| seen_clone.lock().push(*value));

        subject.publish((1, "b")).unwrap();
        subject.publish((2, "b")).unwrap();
        subject.publish((2, "c")).unwrap();
        subject.publish((1, "c")).unwrap();

        assert_eq!(*seen.lock(), vec![1, 2, 1]);
    }

    #[test]
    fn late_subscribers_get_the_latest_value() {
        let subject = StoreSubject::new(0u32);
        let stream = subject.as_observable().select(|n| **n * 2);
        let _early = stream.subscribe(|_| {});

        subject.publish(5).unwrap();
        subject.publish(7).unwrap();

        assert_eq!(stream.current(), Some(14));
    }

    #[test]
    fn maps_lazily() {
        let subject = StoreSubject::new(1u32);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let stream = select(&subject.as_observable(), move |n| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            **n
        });
        subject.publish(2).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let _subscription = stream.subscribe(|_| {});
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn upstream_is_shared_between_subscribers() {
        let subject = StoreSubject::new(1u32);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let stream = select(&subject.as_observable(), move |n| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            **n
        });
        let _a = stream.subscribe(|_| {});
        let _b = stream.subscribe(|_| {});
        subject.publish(3).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn custom_memo_decides_equality() {
        let subject = StoreSubject::new(10i32);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let stream = select_with(
            &subject.as_observable(),
            |n| **n,
            |a, b| (a - b).abs() < 5,
        );
        let _subscription = stream.subscribe(move |v| seen_clone.lock().push(*v));

        subject.publish(12).unwrap();
        subject.publish(20).unwrap();

        assert_eq!(*seen.lock(), vec![10, 20]);
    }

    #[test]
    fn emits_until_the_subscription_is_dropped() {
        let subject = StoreSubject::new(0u8);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let subscription = subject
            .as_observable()
            .select(|n| **n)
            .subscribe(move |v| seen_clone.lock().push(*v));
        subject.publish(1).unwrap();

        assert_eq!(*seen.lock(), vec![0, 1]);
        drop(subscription);
        subject.publish(2).unwrap();
        assert_eq!(*seen.lock(), vec![0, 1]);
    }
}
