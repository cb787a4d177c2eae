//! Change-dispatch cell: one callback firing per *differing* assignment.

type Callback<T> = Box<dyn FnMut(&mut T) + Send>;

/// Typed observable value.
///
/// `set()` stores the new value; iff it differs (by equality) from the value
/// previously stored, the registered callback fires exactly once,
/// synchronously on the assigning thread, receiving the stored value by
/// mutable reference. Mutation inside the callback does not re-trigger.
/// Equal-value assignments are silent, which collapses repeated underlying
/// triggers into one reaction per logical state change.
pub struct EventVariable<T: PartialEq> {
    value: T,
    callback: Option<Callback<T>>,
}

impl<T: PartialEq> EventVariable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: initial,
            callback: None,
        }
    }

    pub fn with_callback(initial: T, callback: impl FnMut(&mut T) + Send + 'static) -> Self {
        Self {
            value: initial,
            callback: Some(Box::new(callback)),
        }
    }

    /// Install or replace the reaction fired on differing assignments.
    pub fn on_change(&mut self, callback: impl FnMut(&mut T) + Send + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Store `next`; fire the callback iff it differs from the stored value.
    pub fn set(&mut self, next: T) {
        let changed = self.value != next;
        self.value = next;
        if changed && let Some(cb) = self.callback.as_mut() {
            cb(&mut self.value);
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }
}

impl<T: PartialEq + Copy> EventVariable<T> {
    pub fn value(&self) -> T {
        self.value
    }
}

impl EventVariable<bool> {
    /// Flip the stored flag; always a differing assignment.
    pub fn toggle(&mut self) {
        let next = !self.value;
        self.set(next);
    }
}

impl<T: PartialEq + core::fmt::Debug> core::fmt::Debug for EventVariable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventVariable")
            .field("value", &self.value)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
