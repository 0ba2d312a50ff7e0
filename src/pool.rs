use super::{
    errors::PoolError,
    gate::BinaryGate,
    model::PoolMetrics,
    queue::{Task, TaskQueue},
    worker::Worker,
};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::{Condvar, Mutex};

/// Интервал опроса простаивающего воркера по умолчанию: 100 микросекунд.
pub const DEFAULT_SLEEP_NS: u64 = 100_000;

/// Возвращает количество аппаратных потоков платформы.
///
/// Чистая функция без общего состояния; используется как размер
/// пула по умолчанию.
#[inline]
pub fn hardware_threads() -> usize {
    num_cpus::get().max(1)
}

fn scale(t: i64, factor: i64) -> Result<i64, PoolError> {
    t.checked_mul(factor).ok_or_else(|| {
        PoolError::InvalidArgument(format!("sleep time {t} overflows the nanosecond range"))
    })
}

#[inline(always)]
fn unlikely(b: bool) -> bool {
    #[cold]
    fn cold() {}
    if !b {
        cold()
    }
    b
}

/// Состояние, разделяемое контроллером и всеми воркерами.
pub(crate) struct Shared {
    pub(crate) queue: TaskQueue,
    pub(crate) sleep_ns: AtomicU64,
    /// Задачи в очереди плюс задачи «в руках» воркеров.
    pub(crate) pending: AtomicUsize,
    pub(crate) idle: AtomicUsize,
    pub(crate) wake_lock: Mutex<()>,
    pub(crate) wake_cv: Condvar,
    done_lock: Mutex<()>,
    done_cv: Condvar,
}

impl Shared {
    fn new() -> Self {
        Self {
            queue: TaskQueue::new(),
            sleep_ns: AtomicU64::new(DEFAULT_SLEEP_NS),
            pending: AtomicUsize::new(0),
            idle: AtomicUsize::new(0),
            wake_lock: Mutex::new(()),
            wake_cv: Condvar::new(),
            done_lock: Mutex::new(()),
            done_cv: Condvar::new(),
        }
    }

    #[inline]
    pub(crate) fn sleep_time(&self) -> Duration {
        Duration::from_nanos(self.sleep_ns.load(Ordering::Relaxed))
    }

    /// Вызывается воркером после завершения задачи (успешного или нет).
    pub(crate) fn task_finished(&self) {
        if self.pending.fetch_sub(1, Ordering::Release) == 1 {
            let _guard = self.done_lock.lock();
            self.done_cv.notify_all();
        }
    }

    fn notify_idle(&self) {
        if unlikely(self.idle.load(Ordering::Relaxed) > 0) {
            let _guard = self.wake_lock.lock();
            self.wake_cv.notify_one();
        }
    }

    fn wake_all(&self) {
        let _guard = self.wake_lock.lock();
        self.wake_cv.notify_all();
    }
}

/// Структурное состояние пула: живые воркеры и флаги stop/awake.
/// Мьютекс вокруг него сериализует `resize`, `stop` и `awake`.
struct Structure {
    workers: Vec<Worker>,
    prev_size: usize,
    stopped: bool,
    next_id: usize,
}

/// Пул потоков с динамическим изменением размера.
///
/// Контроллер владеет коллекцией воркеров и очередью задач. Размер
/// меняется на лету (`resize`), пул останавливается целиком с
/// сохранением прежнего размера (`stop`/`awake`), вызывающий поток
/// блокируется до полного опустошения (`wait`). Для критических секций
/// внутри тел задач пул несёт бинарный семафор
/// (`synchronize`/`end_synchronize`).
///
/// Методы жизненного цикла возвращают `&Self` и выстраиваются в цепочку:
///
/// ```
/// use elastic_pool::ThreadPool;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let pool = ThreadPool::new(4).unwrap();
/// let counter = Arc::new(AtomicUsize::new(0));
/// let c = counter.clone();
/// pool.push(move || { c.fetch_add(1, Ordering::Relaxed); }).wait();
/// assert_eq!(counter.load(Ordering::Relaxed), 1);
/// ```
pub struct ThreadPool {
    shared: Arc<Shared>,
    gate: BinaryGate,
    structure: Mutex<Structure>,
    size: AtomicUsize,
    stopped: AtomicBool,
}

impl ThreadPool {
    /// Создаёт пул из `n` воркеров. Минимум один поток обязателен.
    pub fn new(n: usize) -> Result<Self, PoolError> {
        if n < 1 {
            return Err(PoolError::InvalidSize(n));
        }
        let pool = Self {
            shared: Arc::new(Shared::new()),
            gate: BinaryGate::new(),
            structure: Mutex::new(Structure {
                workers: Vec::new(),
                prev_size: n,
                stopped: false,
                next_id: 0,
            }),
            size: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
        };
        {
            let mut st = pool.structure.lock();
            pool.spawn_workers(&mut st, n);
        }
        pool.size.store(n, Ordering::Release);
        Ok(pool)
    }

    /// Создаёт пул с платформенным числом потоков.
    pub fn with_hardware_threads() -> Self {
        Self::new(hardware_threads()).expect("hardware_threads() is at least 1")
    }

    /// Текущее число живых воркеров. O(1), без блокировок.
    #[inline]
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// Меняет размер пула до `n`.
    ///
    /// Рост порождает недостающие воркеры; сжатие помечает лишние на
    /// слив и дожидается, пока каждый дорешает задачу «в руках» и
    /// завершится. Возвращает управление только в устойчивом состоянии
    /// `size() == n`. Сериализован со `stop`/`awake` и другими `resize`.
    /// На остановленном пуле возвращает его в работу.
    pub fn resize(&self, n: usize) -> Result<&Self, PoolError> {
        if n < 1 {
            return Err(PoolError::InvalidSize(n));
        }
        let mut st = self.structure.lock();
        st.stopped = false;
        self.stopped.store(false, Ordering::Release);
        let current = st.workers.len();
        if n > current {
            self.spawn_workers(&mut st, n - current);
        } else if n < current {
            let marked = st.workers.split_off(n);
            Self::drain(&self.shared, marked);
        }
        self.size.store(n, Ordering::Release);
        Ok(self)
    }

    /// Блокирует вызывающий поток, пока очередь не опустеет и ни один
    /// воркер не держит задачу. Push, пришедший до наступления этого
    /// совместного условия, будет учтён. Допускает нескольких
    /// одновременных ожидающих.
    pub fn wait(&self) -> &Self {
        let mut guard = self.shared.done_lock.lock();
        while self.shared.pending.load(Ordering::Acquire) > 0 {
            self.shared.done_cv.wait(&mut guard);
        }
        self
    }

    /// Останавливает пул: запоминает текущий размер (если пул ещё не
    /// остановлен), сливает всех воркеров до нуля. Задачи в очереди
    /// не выбрасываются и ждут `awake`.
    pub fn stop(&self) -> &Self {
        let mut st = self.structure.lock();
        if !st.stopped {
            st.prev_size = st.workers.len();
        }
        let workers = std::mem::take(&mut st.workers);
        Self::drain(&self.shared, workers);
        self.size.store(0, Ordering::Release);
        st.stopped = true;
        self.stopped.store(true, Ordering::Release);
        self
    }

    /// Будит остановленный пул: возвращает размер, записанный последним
    /// `stop`. На работающем пуле — no-op.
    pub fn awake(&self) -> &Self {
        let mut st = self.structure.lock();
        if st.stopped {
            let n = st.prev_size;
            self.spawn_workers(&mut st, n);
            st.stopped = false;
            self.stopped.store(false, Ordering::Release);
            self.size.store(n, Ordering::Release);
        }
        self
    }

    /// Ставит задачу в очередь. Работает в любом состоянии, в том числе
    /// на остановленном пуле — задача дождётся `awake`.
    pub fn push<F>(&self, f: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.push_task(Box::new(f))
    }

    fn push_task(&self, task: Task) -> &Self {
        self.shared.pending.fetch_add(1, Ordering::Release);
        self.shared.queue.push(task);
        self.shared.notify_idle();
        self
    }

    /// Захватывает бинарный семафор пула. Блокирует до освобождения.
    pub fn synchronize(&self) -> &Self {
        self.gate.acquire();
        self
    }

    /// Освобождает бинарный семафор. Вызов без парного `synchronize` —
    /// ошибка использования, см. [`BinaryGate::release`].
    pub fn end_synchronize(&self) -> &Self {
        self.gate.release();
        self
    }

    /// Интервал опроса простаивающих воркеров в наносекундах.
    /// Отрицательное значение — ошибка. Новый интервал подхватывается
    /// воркерами со следующего цикла сна; один цикл со старым значением
    /// безвреден.
    pub fn set_sleep_time_ns(&self, t: i64) -> Result<&Self, PoolError> {
        if t < 0 {
            return Err(PoolError::InvalidArgument(format!(
                "sleep time must be non-negative, got {t}"
            )));
        }
        self.shared.sleep_ns.store(t as u64, Ordering::Relaxed);
        Ok(self)
    }

    pub fn set_sleep_time_ms(&self, t: i64) -> Result<&Self, PoolError> {
        self.set_sleep_time_ns(scale(t, 1_000_000)?)
    }

    pub fn set_sleep_time_s(&self, t: i64) -> Result<&Self, PoolError> {
        self.set_sleep_time_ns(scale(t, 1_000_000_000)?)
    }

    #[inline]
    pub fn sleep_time_ns(&self) -> u64 {
        self.shared.sleep_ns.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            size: self.size(),
            pending_tasks: self.shared.pending.load(Ordering::Relaxed),
            idle_workers: self.shared.idle.load(Ordering::Relaxed),
            stopped: self.stopped.load(Ordering::Relaxed),
        }
    }

    fn spawn_workers(&self, st: &mut Structure, count: usize) {
        for _ in 0..count {
            let id = st.next_id;
            st.next_id += 1;
            st.workers.push(Worker::spawn(id, self.shared.clone()));
        }
    }

    /// Слив набора воркеров: сначала пометить всех, потом разбудить
    /// спящих, потом присоединить. Задача «в руках» дорешивается,
    /// лимита времени нет.
    fn drain(shared: &Shared, workers: Vec<Worker>) {
        for worker in &workers {
            worker.signal_drain();
        }
        shared.wake_all();
        for worker in workers {
            worker.join();
        }
    }
}

impl Drop for ThreadPool {
    /// Неявный stop-and-join: пул никогда не бросает живые потоки.
    /// Задачи, оставшиеся в очереди, при этом уничтожаются.
    fn drop(&mut self) {
        let workers = std::mem::take(&mut self.structure.lock().workers);
        Self::drain(&self.shared, workers);
    }
}
