use parking_lot::{Condvar, Mutex};

/// Бинарный семафор для взаимного исключения внутри тел задач.
///
/// В отличие от мьютекса с guard-объектом, захват и освобождение —
/// отдельные вызовы, поэтому критическая секция может быть размазана
/// по телу задачи произвольным образом. Держатель всегда ровно один.
pub struct BinaryGate {
    held: Mutex<bool>,
    available: Condvar,
}

impl BinaryGate {
    pub fn new() -> Self {
        Self {
            held: Mutex::new(false),
            available: Condvar::new(),
        }
    }

    /// Блокирует вызывающий поток, пока семафор не освободится.
    pub fn acquire(&self) {
        let mut held = self.held.lock();
        while *held {
            self.available.wait(&mut held);
        }
        *held = true;
    }

    /// Освобождает семафор и будит одного ожидающего.
    ///
    /// Вызов без парного `acquire` — ошибка использования: порядок
    /// пробуждений после такого вызова не определён.
    pub fn release(&self) {
        let mut held = self.held.lock();
        *held = false;
        drop(held);
        self.available.notify_one();
    }
}

impl Default for BinaryGate {
    fn default() -> Self {
        Self::new()
    }
}
