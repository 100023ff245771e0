//! Кольцевой буфер фиксированного окна с текущей суммой и монотонными очередями max/min

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
    sum: f64,
    // (порядковый номер, значение), убывают по значению
    max_queue: VecDeque<(usize, f64)>,
    // (порядковый номер, значение), возрастают по значению
    min_queue: VecDeque<(usize, f64)>,
    pushed: usize,
}

impl RollingWindow {
    /// `capacity` должен быть > 0, это проверяется при валидации конфига
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: VecDeque::new(),
            sum: 0.0,
            max_queue: VecDeque::new(),
            min_queue: VecDeque::new(),
            pushed: 0,
        }
    }

    pub fn push(&mut self, value: f64) {
        let seq = self.pushed;
        self.pushed += 1;

        self.values.push_back(value);
        self.sum += value;
        if self.values.len() > self.capacity {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }

        while matches!(self.max_queue.back(), Some(&(_, v)) if v <= value) {
            self.max_queue.pop_back();
        }
        self.max_queue.push_back((seq, value));
        while matches!(self.min_queue.back(), Some(&(_, v)) if v >= value) {
            self.min_queue.pop_back();
        }
        self.min_queue.push_back((seq, value));

        let oldest = self.pushed.saturating_sub(self.capacity);
        while matches!(self.max_queue.front(), Some(&(s, _)) if s < oldest) {
            self.max_queue.pop_front();
        }
        while matches!(self.min_queue.front(), Some(&(s, _)) if s < oldest) {
            self.min_queue.pop_front();
        }
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Среднее по полному окну
    pub fn mean(&self) -> Option<f64> {
        self.is_full().then(|| self.sum / self.capacity as f64)
    }

    pub fn max(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        self.max_queue.front().map(|&(_, v)| v)
    }

    pub fn min(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        self.min_queue.front().map(|&(_, v)| v)
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.sum = 0.0;
        self.max_queue.clear();
        self.min_queue.clear();
        self.pushed = 0;
    }
}
