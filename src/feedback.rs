//! Feedback debounce table.
//!
//! Converts instantaneous posture-fault flags into display-worthy events
//! with automatic expiry. Each feedback slot carries an active flag and a
//! consecutive-frame counter: once a slot is flagged it stays visible, its
//! counter climbing every frame, until the counter exceeds the display
//! threshold and the slot is force-hidden. A hidden slot only comes back
//! when its predicate fires again. Purely frame-counted; no clock involved.

/// Per-slot debounce state for corrective-feedback messages
#[derive(Debug, Clone)]
pub struct FeedbackTable {
    active: Vec<bool>,
    frames: Vec<u32>,
}

impl FeedbackTable {
    /// Create a table with one entry per feedback slot
    #[must_use]
    pub fn new(slot_count: usize) -> Self {
        Self {
            active: vec![false; slot_count],
            frames: vec![0; slot_count],
        }
    }

    /// Number of slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Mark a slot active for display. Out-of-range slots are ignored;
    /// profile validation keeps rule targets in range.
    pub fn flag(&mut self, slot: usize) {
        if let Some(entry) = self.active.get_mut(slot) {
            *entry = true;
        }
    }

    /// Advance one frame: every active slot's counter increments,
    /// whether or not it was re-flagged this frame.
    pub fn advance(&mut self) {
        for (frames, active) in self.frames.iter_mut().zip(&self.active) {
            if *active {
                *frames += 1;
            }
        }
    }

    /// Force-hide slots whose counter has exceeded the threshold, zeroing
    /// their counters. Runs after the frame's output snapshot so the final
    /// over-threshold frame is still shown.
    pub fn expire(&mut self, threshold: u32) {
        for (frames, active) in self.frames.iter_mut().zip(self.active.iter_mut()) {
            if *frames > threshold {
                *active = false;
                *frames = 0;
            }
        }
    }

    /// Reset every slot to the empty state
    pub fn clear(&mut self) {
        self.active.fill(false);
        self.frames.fill(0);
    }

    /// Whether a slot is currently visible
    #[must_use]
    pub fn is_active(&self, slot: usize) -> bool {
        self.active.get(slot).copied().unwrap_or(false)
    }

    /// Indices of currently visible slots
    #[must_use]
    pub fn active_slots(&self) -> Vec<usize> {
        self.active
            .iter()
            .enumerate()
            .filter_map(|(idx, active)| active.then_some(idx))
            .collect()
    }

    /// Consecutive frames a slot has been visible
    #[must_use]
    pub fn frame_count(&self, slot: usize) -> u32 {
        self.frames.get(slot).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flagged_slot_becomes_active() {
        let mut table = FeedbackTable::new(3);
        table.flag(1);
        table.advance();
        assert!(table.is_active(1));
        assert!(!table.is_active(0));
        assert_eq!(table.active_slots(), vec![1]);
    }

    #[test]
    fn test_slot_keeps_counting_without_reflag() {
        let mut table = FeedbackTable::new(2);
        table.flag(0);
        table.advance();
        table.advance();
        table.advance();
        assert_eq!(table.frame_count(0), 3);
        assert!(table.is_active(0));
    }

    #[test]
    fn test_slot_expires_after_threshold() {
        let threshold = 5;
        let mut table = FeedbackTable::new(1);
        table.flag(0);
        for frame in 1..=threshold {
            table.advance();
            table.expire(threshold);
            assert!(table.is_active(0), "still visible at frame {frame}");
        }
        // Counter goes over the threshold this frame; the snapshot between
        // advance and expire would still show it, then it hides.
        table.advance();
        assert!(table.is_active(0));
        table.expire(threshold);
        assert!(!table.is_active(0));
        assert_eq!(table.frame_count(0), 0);
    }

    #[test]
    fn test_hidden_slot_reactivates_on_reflag() {
        let mut table = FeedbackTable::new(1);
        table.flag(0);
        for _ in 0..3 {
            table.advance();
        }
        table.expire(2);
        assert!(!table.is_active(0));
        table.flag(0);
        table.advance();
        assert!(table.is_active(0));
        assert_eq!(table.frame_count(0), 1);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut table = FeedbackTable::new(4);
        table.flag(0);
        table.flag(3);
        table.advance();
        table.clear();
        assert!(table.active_slots().is_empty());
        assert_eq!(table.frame_count(0), 0);
    }
}
