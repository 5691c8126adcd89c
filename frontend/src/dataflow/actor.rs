//! Single-value actor owning a piece of page state.

use std::future::Future;
use std::sync::Arc;
use zoon::{Mutable, Signal, Task, TaskHandle};

/// Reactive state changed only by its own processing task.
///
/// The processor future runs on the browser's single thread and may hold
/// non-`Send` values such as JS handles. Dropping the last clone stops it.
///
/// ```rust,ignore
/// let (map_idle_relay, mut map_idle_stream) = relay();
///
/// let idle_count = Actor::new(0, async move |state| {
///     while let Some(()) = map_idle_stream.next().await {
///         state.update_mut(|count| *count += 1);
///     }
/// });
///
/// map_idle_relay.send(());
/// El::new().child_signal(idle_count.signal().map(|count| count.to_string()))
/// ```
#[derive(Clone, Debug)]
pub struct Actor<T>
where
    T: Clone + 'static,
{
    state: Mutable<T>,
    #[allow(dead_code)]
    task_handle: Arc<TaskHandle>,
    #[cfg(debug_assertions)]
    #[allow(dead_code)]
    creation_location: &'static std::panic::Location<'static>,
}

impl<T> Actor<T>
where
    T: Clone + 'static,
{
    #[track_caller]
    pub fn new<F, Fut>(initial_state: T, processor: F) -> Self
    where
        F: FnOnce(Mutable<T>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let state = Mutable::new(initial_state);
        let task_handle = Arc::new(Task::start_droppable(processor(state.clone())));

        Self {
            state,
            task_handle,
            #[cfg(debug_assertions)]
            creation_location: std::panic::Location::caller(),
        }
    }

    pub fn signal(&self) -> impl Signal<Item = T> + use<T> {
        self.state.signal_cloned()
    }
}
