use std::fmt;
use std::sync::Mutex;

type Listener = Box<dyn Fn() + Send + Sync>;

/// Fan-out "state changed" signal the engine fires after every mutating
/// operation.
///
/// Subscribers re-render or re-poll on their own; no ordering is guaranteed
/// across listeners.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Mutex<Vec<Listener>>,
}

impl ChangeNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for future notifications.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) {
        if let Ok(mut guard) = self.listeners.lock() {
            guard.push(Box::new(listener));
        }
    }

    /// Invoke every registered listener.
    pub fn notify(&self) {
        if let Ok(guard) = self.listeners.lock() {
            for listener in guard.iter() {
                listener();
            }
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.listeners.lock().map(|guard| guard.len()).unwrap_or(0);
        f.debug_struct("ChangeNotifier")
            .field("listeners", &count)
            .finish()
    }
}
