//! Пул OS-потоков с динамическим изменением размера и явным управлением жизненным циклом
//!
//! # Features
//! - Рост и сжатие пула на лету без потери и дублирования задач
//! - Graceful drain: воркер дорешивает задачу «в руках» перед остановкой
//! - stop/awake: остановка до нуля потоков с восстановлением прежнего размера
//! - Блокирующий wait до полного опустошения очереди и воркеров
//! - Бинарный семафор для критических секций внутри тел задач
//! - Настраиваемый интервал опроса простаивающих воркеров (ns/ms/s)

pub mod errors;
pub mod gate;
pub mod model;
pub mod pool;
pub mod queue;
pub mod worker;

pub use errors::PoolError;
pub use gate::BinaryGate;
pub use model::PoolMetrics;
pub use pool::{hardware_threads, ThreadPool, DEFAULT_SLEEP_NS};
