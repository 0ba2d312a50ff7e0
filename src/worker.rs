use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;

use crate::pool::Shared;

/// Рабочий поток пула: живой OS-поток плюс флаг активности.
///
/// Пока флаг взведён, воркер крутит цикл «забрать задачу / поспать».
/// Снятый флаг переводит воркер в слив: текущая задача дорешивается,
/// новая не захватывается, поток завершается и присоединяется.
pub struct Worker {
    active: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub(crate) fn spawn(id: usize, shared: Arc<Shared>) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let flag = active.clone();
        let handle = std::thread::Builder::new()
            .name(format!("pool-worker-{id}"))
            .spawn(move || worker_loop(&shared, &flag))
            .expect("failed to spawn worker thread");
        Self {
            active,
            handle: Some(handle),
        }
    }

    /// Помечает воркер на слив. Сам по себе не будит спящий поток,
    /// контроллер дополнительно дёргает wake-условие пула.
    pub(crate) fn signal_drain(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub(crate) fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop(shared: &Shared, active: &AtomicBool) {
    while active.load(Ordering::Acquire) {
        if let Some(task) = shared.queue.try_take() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
                log::error!(
                    "задача завершилась паникой: {}",
                    panic_message(payload.as_ref())
                );
            }
            shared.task_finished();
        } else {
            idle_wait(shared, active);
        }
    }
}

/// Пауза простаивающего воркера: condvar-ожидание с таймаутом, равным
/// интервалу опроса. Push будит спящего раньше таймаута, но даже
/// пропущенное пробуждение исправляется на следующем цикле опроса.
fn idle_wait(shared: &Shared, active: &AtomicBool) {
    shared.idle.fetch_add(1, Ordering::Release);
    let mut guard = shared.wake_lock.lock();
    // перепроверка под замком, чтобы не проспать push между try_take и wait
    if shared.queue.is_empty() && active.load(Ordering::Acquire) {
        let _ = shared.wake_cv.wait_for(&mut guard, shared.sleep_time());
    }
    drop(guard);
    shared.idle.fetch_sub(1, Ordering::Release);
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
