/// Мгновенный снимок состояния пула.
///
/// Поля читаются отдельными атомарными загрузками без общей блокировки,
/// поэтому под нагрузкой снимок может быть слегка рассогласован.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub size: usize,
    pub pending_tasks: usize,
    pub idle_workers: usize,
    pub stopped: bool,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        let busy = self.size.saturating_sub(self.idle_workers);
        busy as f64 / self.size as f64
    }
}
