/// Which way the keyboard cursor moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Keyboard cursor over the focus sequence. `None` means nothing is focused.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FocusNavigator {
    index: Option<usize>,
}

impl FocusNavigator {
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Panel opened: start at the active item, else the first item.
    pub fn open(&mut self, len: usize, active: Option<usize>) {
        self.index = match active {
            Some(position) if position < len => Some(position),
            _ if len > 0 => Some(0),
            _ => None,
        };
    }

    pub fn close(&mut self) {
        self.index = None;
    }

    /// Move one step with wraparound. From an unfocused state the cursor lands
    /// on the active item, else on the first (forward) or last (backward) item.
    pub fn step(&mut self, direction: Direction, len: usize, active: Option<usize>) {
        if len == 0 {
            return;
        }
        self.index = Some(match (self.index, direction) {
            (None, _) if active.is_some_and(|a| a < len) => active.unwrap_or(0),
            (None, Direction::Forward) => 0,
            (None, Direction::Backward) => len - 1,
            (Some(i), Direction::Forward) => (i + 1) % len,
            (Some(i), Direction::Backward) => (i + len - 1) % len,
        });
    }

    pub fn set(&mut self, position: usize, len: usize) {
        if position < len {
            self.index = Some(position);
        }
    }

    /// Keep the cursor inside a rebuilt sequence.
    pub fn clamp(&mut self, len: usize) {
        self.index = match self.index {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            other => other,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_prefers_active_then_first() {
        let mut f = FocusNavigator::default();
        f.open(5, Some(3));
        assert_eq!(f.index(), Some(3));
        f.open(5, None);
        assert_eq!(f.index(), Some(0));
        f.open(0, None);
        assert_eq!(f.index(), None);
        f.open(2, Some(7));
        assert_eq!(f.index(), Some(0));
    }

    #[test]
    fn wraps_in_both_directions() {
        for len in 1..6 {
            let mut f = FocusNavigator::default();
            f.set(len - 1, len);
            f.step(Direction::Forward, len, None);
            assert_eq!(f.index(), Some(0));
            f.step(Direction::Backward, len, None);
            assert_eq!(f.index(), Some(len - 1));
        }
    }

    #[test]
    fn unfocused_step_starts_from_active_or_ends() {
        let mut f = FocusNavigator::default();
        f.step(Direction::Forward, 4, Some(2));
        assert_eq!(f.index(), Some(2));
        f.close();
        f.step(Direction::Forward, 4, None);
        assert_eq!(f.index(), Some(0));
        f.close();
        f.step(Direction::Backward, 4, None);
        assert_eq!(f.index(), Some(3));
    }

    #[test]
    fn empty_sequence_is_a_no_op() {
        let mut f = FocusNavigator::default();
        f.step(Direction::Forward, 0, None);
        assert_eq!(f.index(), None);
    }

    #[test]
    fn clamp_after_rebuild() {
        let mut f = FocusNavigator::default();
        f.set(6, 7);
        f.clamp(3);
        assert_eq!(f.index(), Some(2));
        f.clamp(0);
        assert_eq!(f.index(), None);
    }
}
