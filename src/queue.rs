use crossbeam::deque::{Injector, Steal};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Единица работы: замыкание без аргументов и без результата.
/// Очередь владеет задачей до момента захвата воркером.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Потокобезопасная FIFO-очередь задач поверх глобального инжектора.
pub struct TaskQueue {
    inject: Injector<Task>,
    len: AtomicUsize,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            inject: Injector::new(),
            len: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn push(&self, task: Task) {
        self.len.fetch_add(1, Ordering::Release);
        self.inject.push(task);
    }

    /// Снимает голову очереди, если она не пуста. Не блокирует.
    pub fn try_take(&self) -> Option<Task> {
        loop {
            match self.inject.steal() {
                Steal::Success(task) => {
                    self.len.fetch_sub(1, Ordering::Release);
                    return Some(task);
                }
                Steal::Empty => return None,
                Steal::Retry => {}
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inject.is_empty()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
