//! 进度统计 - 业务能力层
//!
//! 进度只来自真实完成的行数

use serde::Serialize;

/// 进度事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub processed: usize,
    pub total: usize,
    pub percent: u8,
}

/// 进度计数器
///
/// `processed` 只增不减，每完成一行加 1，不会超过 `total`
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    processed: usize,
    total: usize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            processed: 0,
            total,
        }
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }

    /// 记录完成一行，返回新的进度事件
    ///
    /// 已经全部完成时返回 `None`，保证不会发出重复的 `processed`
    pub fn advance(&mut self) -> Option<ProgressEvent> {
        if self.is_complete() {
            return None;
        }
        self.processed += 1;
        Some(self.snapshot())
    }

    pub fn snapshot(&self) -> ProgressEvent {
        ProgressEvent {
            processed: self.processed,
            total: self.total,
            percent: percent(self.processed, self.total),
        }
    }
}

/// `round(processed / total × 100)`
pub fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((processed as f64 / total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn test_advance_is_strictly_increasing_and_bounded() {
        let mut tracker = ProgressTracker::new(3);
        let events: Vec<_> = std::iter::from_fn(|| tracker.advance()).collect();

        assert_eq!(events.len(), 3);
        assert_eq!(
            events.iter().map(|e| e.processed).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(events.last().unwrap().percent, 100);
        assert!(tracker.advance().is_none());
        assert_eq!(tracker.processed(), 3);
    }
}
