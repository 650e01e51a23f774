//! Observable ordered collection of items.
//!
//! A [`Repository`] owns its items and fans every structural and status
//! change out to registered [`RepositoryListener`]s. Listeners are held as
//! `Arc`s and compared by pointer, so registering the same listener twice
//! is a no-op.
//!
//! Index-based edits are bounds-checked: an out-of-range index is silently
//! ignored, since completions and UI-side index shifts can race.

use std::sync::Arc;

/// Receives change notifications from a [`Repository`].
///
/// Every method has an empty default, so listeners implement only what
/// they care about.
#[allow(unused_variables)]
pub trait RepositoryListener<T>: Send + Sync {
    /// `items` were appended, in order.
    fn on_append(&self, items: &[T]) {}
    /// `items` were inserted at the front, in order.
    fn on_prepend(&self, items: &[T]) {}
    /// The element at `index` was replaced by `item`.
    fn on_update(&self, index: usize, item: &T) {}
    /// The element at `index` was removed.
    fn on_remove(&self, index: usize) {}
    /// An element moved; indices follow [`Repository::move_item`].
    fn on_move(&self, from: usize, to: usize) {}
    /// The repository is being destroyed.
    fn on_invalidation(&self) {}
    /// A request started.
    fn on_start(&self) {}
    /// The last request failed with a user-facing message.
    fn on_error(&self, message: &str) {}
    /// The last request completed.
    fn on_finish(&self) {}
}

/// Lifecycle state of a repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepositoryStatus {
    /// No request in flight.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The last request failed.
    Error,
}

/// An ordered list of items with listener fan-out.
pub struct Repository<T> {
    items: Vec<T>,
    listeners: Vec<Arc<dyn RepositoryListener<T>>>,
    status: RepositoryStatus,
    last_error: Option<String>,
}

fn same_listener<T>(a: &Arc<dyn RepositoryListener<T>>, b: &Arc<dyn RepositoryListener<T>>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl<T> Default for Repository<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            listeners: Vec::new(),
            status: RepositoryStatus::Idle,
            last_error: None,
        }
    }
}

impl<T> Repository<T> {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the repository holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Iterate over the items in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// All items, in order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Current lifecycle state.
    pub fn status(&self) -> RepositoryStatus {
        self.status
    }

    /// Message of the last failure, if the repository is in error.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Register a listener.
    ///
    /// The listener is told about a request already in flight or a failure
    /// already recorded, so it can render the right state immediately.
    pub fn add_listener(&mut self, listener: Arc<dyn RepositoryListener<T>>) {
        if self.listeners.iter().any(|l| same_listener(l, &listener)) {
            return;
        }
        match self.status {
            RepositoryStatus::Idle => {}
            RepositoryStatus::Loading => listener.on_start(),
            RepositoryStatus::Error => {
                listener.on_error(self.last_error.as_deref().unwrap_or_default())
            }
        }
        self.listeners.push(listener);
    }

    /// Unregister a listener. Unknown listeners are ignored.
    pub fn remove_listener(&mut self, listener: &Arc<dyn RepositoryListener<T>>) {
        self.listeners.retain(|l| !same_listener(l, listener));
    }

    /// Append `items` after the existing ones.
    pub fn append(&mut self, items: Vec<T>) {
        if items.is_empty() {
            return;
        }
        let start = self.items.len();
        self.items.extend(items);
        let inserted = &self.items[start..];
        for listener in &self.listeners {
            listener.on_append(inserted);
        }
    }

    /// Insert `items` before the existing ones, keeping their order.
    pub fn prepend(&mut self, items: Vec<T>) {
        if items.is_empty() {
            return;
        }
        let count = items.len();
        self.items.splice(0..0, items);
        let inserted = &self.items[..count];
        for listener in &self.listeners {
            listener.on_prepend(inserted);
        }
    }

    /// Replace the item at `index`.
    pub fn update(&mut self, index: usize, item: T) {
        let Some(slot) = self.items.get_mut(index) else {
            return;
        };
        *slot = item;
        let updated = &self.items[index];
        for listener in &self.listeners {
            listener.on_update(index, updated);
        }
    }

    /// Remove the item at `index`.
    pub fn remove(&mut self, index: usize) {
        if index >= self.items.len() {
            return;
        }
        self.items.remove(index);
        for listener in &self.listeners {
            listener.on_remove(index);
        }
    }

    /// Move the item at `from` so that it lands before the item currently
    /// at `to`.
    ///
    /// `to` ranges over `0..=len`; `to == len` moves to the end. Moving
    /// onto itself (`to == from` or `to == from + 1`) does nothing.
    pub fn move_item(&mut self, from: usize, to: usize) {
        let len = self.items.len();
        if from >= len || to > len || to == from || to == from + 1 {
            return;
        }
        let item = self.items.remove(from);
        let destination = if to < from { to } else { to - 1 };
        self.items.insert(destination, item);
        for listener in &self.listeners {
            listener.on_move(from, to);
        }
    }

    /// A request started.
    pub fn start(&mut self) {
        self.status = RepositoryStatus::Loading;
        self.last_error = None;
        for listener in &self.listeners {
            listener.on_start();
        }
    }

    /// The request failed. Items are kept.
    pub fn error(&mut self, message: &str) {
        self.status = RepositoryStatus::Error;
        self.last_error = Some(message.to_string());
        for listener in &self.listeners {
            listener.on_error(message);
        }
    }

    /// The request completed.
    pub fn finish(&mut self) {
        self.status = RepositoryStatus::Idle;
        for listener in &self.listeners {
            listener.on_finish();
        }
    }
}

impl<T: crate::Item> Repository<T> {
    /// Index of the first item with `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }
}

impl<T> Drop for Repository<T> {
    fn drop(&mut self) {
        for listener in &self.listeners {
            listener.on_invalidation();
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("items", &self.items)
            .field("listeners", &self.listeners.len())
            .field("status", &self.status)
            .field("last_error", &self.last_error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Append(Vec<i32>),
        Prepend(Vec<i32>),
        Update(usize, i32),
        Remove(usize),
        Move(usize, usize),
        Invalidation,
        Start,
        Error(String),
        Finish,
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl RepositoryListener<i32> for Recorder {
        fn on_append(&self, items: &[i32]) {
            self.push(Event::Append(items.to_vec()));
        }
        fn on_prepend(&self, items: &[i32]) {
            self.push(Event::Prepend(items.to_vec()));
        }
        fn on_update(&self, index: usize, item: &i32) {
            self.push(Event::Update(index, *item));
        }
        fn on_remove(&self, index: usize) {
            self.push(Event::Remove(index));
        }
        fn on_move(&self, from: usize, to: usize) {
            self.push(Event::Move(from, to));
        }
        fn on_invalidation(&self) {
            self.push(Event::Invalidation);
        }
        fn on_start(&self) {
            self.push(Event::Start);
        }
        fn on_error(&self, message: &str) {
            self.push(Event::Error(message.to_string()));
        }
        fn on_finish(&self) {
            self.push(Event::Finish);
        }
    }

    fn repo_with(items: &[i32]) -> (Repository<i32>, Arc<Recorder>) {
        let mut repo = Repository::new();
        repo.append(items.to_vec());
        let recorder = Arc::new(Recorder::default());
        repo.add_listener(recorder.clone());
        (repo, recorder)
    }

    // ===========================================
    // Insertion Tests
    // ===========================================

    #[test]
    fn append_keeps_order_and_notifies_slice() {
        let (mut repo, recorder) = repo_with(&[1, 2]);
        repo.append(vec![3, 4]);
        assert_eq!(repo.items(), &[1, 2, 3, 4]);
        assert_eq!(recorder.events(), vec![Event::Append(vec![3, 4])]);
    }

    #[test]
    fn prepend_puts_items_first_in_natural_order() {
        let (mut repo, recorder) = repo_with(&[3, 4]);
        repo.prepend(vec![1, 2]);
        assert_eq!(repo.items(), &[1, 2, 3, 4]);
        assert_eq!(recorder.events(), vec![Event::Prepend(vec![1, 2])]);
    }

    #[test]
    fn empty_insertions_are_silent() {
        let (mut repo, recorder) = repo_with(&[1]);
        repo.append(Vec::new());
        repo.prepend(Vec::new());
        assert!(recorder.events().is_empty());
    }

    // ===========================================
    // Index Edit Tests
    // ===========================================

    #[test]
    fn update_in_range_replaces() {
        let (mut repo, recorder) = repo_with(&[1, 2, 3]);
        repo.update(1, 20);
        assert_eq!(repo.items(), &[1, 20, 3]);
        assert_eq!(recorder.events(), vec![Event::Update(1, 20)]);
    }

    #[test]
    fn out_of_range_edits_are_no_ops() {
        let (mut repo, recorder) = repo_with(&[1, 2, 3]);
        repo.update(3, 9);
        repo.remove(7);
        repo.move_item(5, 0);
        repo.move_item(0, 4);
        assert_eq!(repo.items(), &[1, 2, 3]);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn remove_drops_item() {
        let (mut repo, recorder) = repo_with(&[1, 2, 3]);
        repo.remove(0);
        assert_eq!(repo.items(), &[2, 3]);
        assert_eq!(recorder.events(), vec![Event::Remove(0)]);
    }

    #[test]
    fn move_forward_and_backward() {
        let (mut repo, recorder) = repo_with(&[0, 1, 2, 3]);
        repo.move_item(0, 3);
        assert_eq!(repo.items(), &[1, 2, 0, 3]);

        repo.move_item(3, 0);
        assert_eq!(repo.items(), &[3, 1, 2, 0]);

        repo.move_item(1, 4);
        assert_eq!(repo.items(), &[3, 2, 0, 1]);

        assert_eq!(
            recorder.events(),
            vec![Event::Move(0, 3), Event::Move(3, 0), Event::Move(1, 4)]
        );
    }

    #[test]
    fn move_onto_itself_is_a_no_op() {
        let (mut repo, recorder) = repo_with(&[0, 1, 2]);
        repo.move_item(1, 1);
        repo.move_item(1, 2);
        assert_eq!(repo.items(), &[0, 1, 2]);
        assert!(recorder.events().is_empty());
    }

    // ===========================================
    // Status Tests
    // ===========================================

    #[test]
    fn error_keeps_items() {
        let (mut repo, recorder) = repo_with(&[1, 2]);
        repo.start();
        repo.error("boom");
        assert_eq!(repo.items(), &[1, 2]);
        assert_eq!(repo.status(), RepositoryStatus::Error);
        assert_eq!(repo.last_error(), Some("boom"));
        assert_eq!(
            recorder.events(),
            vec![Event::Start, Event::Error("boom".into())]
        );
    }

    #[test]
    fn finish_returns_to_idle() {
        let (mut repo, _) = repo_with(&[]);
        repo.start();
        assert_eq!(repo.status(), RepositoryStatus::Loading);
        repo.finish();
        assert_eq!(repo.status(), RepositoryStatus::Idle);
    }

    #[test]
    fn late_listener_sees_current_status() {
        let mut repo: Repository<i32> = Repository::new();
        repo.start();
        let loading = Arc::new(Recorder::default());
        repo.add_listener(loading.clone());
        assert_eq!(loading.events(), vec![Event::Start]);

        repo.error("offline");
        let failed = Arc::new(Recorder::default());
        repo.add_listener(failed.clone());
        assert_eq!(failed.events(), vec![Event::Error("offline".into())]);
    }

    // ===========================================
    // Listener Registration Tests
    // ===========================================

    #[test]
    fn listeners_are_a_set() {
        let (mut repo, recorder) = repo_with(&[]);
        repo.add_listener(recorder.clone());
        assert_eq!(repo.listener_count(), 1);

        repo.append(vec![1]);
        assert_eq!(recorder.events().len(), 1);
    }

    #[test]
    fn removed_listener_stops_receiving() {
        let (mut repo, recorder) = repo_with(&[]);
        let as_dyn: Arc<dyn RepositoryListener<i32>> = recorder.clone();
        repo.remove_listener(&as_dyn);
        repo.remove_listener(&as_dyn);
        repo.append(vec![1]);
        assert_eq!(repo.listener_count(), 0);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn drop_invalidates_listeners() {
        let (repo, recorder) = repo_with(&[1]);
        drop(repo);
        assert_eq!(recorder.events(), vec![Event::Invalidation]);
    }
}
