use serde::{Deserialize, Serialize};

/// Pixels of horizontal travel required to commit a swipe.
pub const COMMIT_THRESHOLD: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

/// Interprets a pointer-capture drag into a committed swipe direction.
/// The Skip/Join buttons bypass this and commit a direction directly.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Gesture {
    dragging: bool,
    start_x: f64,
    offset: f64,
}

impl Gesture {
    pub fn pointer_down(&mut self, x: f64) {
        self.dragging = true;
        self.start_x = x;
        self.offset = 0.0;
    }

    pub fn pointer_move(&mut self, x: f64) {
        if !self.dragging {
            return;
        }
        self.offset = x - self.start_x;
    }

    /// Ends the drag. A direction is committed only past the threshold;
    /// otherwise the offset resets and the card snaps back.
    pub fn pointer_up(&mut self) -> Option<Direction> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        let offset = self.offset;
        self.offset = 0.0;
        if offset.abs() > COMMIT_THRESHOLD {
            Some(if offset > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            })
        } else {
            None
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn past_threshold_commits_the_signed_direction() {
        let mut gesture = Gesture::default();
        gesture.pointer_down(200.0);
        gesture.pointer_move(320.0);
        assert_eq!(gesture.pointer_up(), Some(Direction::Right));

        gesture.pointer_down(200.0);
        gesture.pointer_move(80.0);
        assert_eq!(gesture.pointer_up(), Some(Direction::Left));
    }

    #[test]
    fn at_or_under_threshold_snaps_back() {
        let mut gesture = Gesture::default();
        gesture.pointer_down(0.0);
        gesture.pointer_move(COMMIT_THRESHOLD);
        assert_eq!(gesture.pointer_up(), None);
        assert_eq!(gesture.offset(), 0.0);
    }

    #[test]
    fn only_the_last_position_counts() {
        let mut gesture = Gesture::default();
        gesture.pointer_down(0.0);
        gesture.pointer_move(250.0);
        gesture.pointer_move(-30.0);
        assert_eq!(gesture.pointer_up(), None);
    }

    #[test]
    fn moves_without_a_down_are_ignored() {
        let mut gesture = Gesture::default();
        gesture.pointer_move(500.0);
        assert_eq!(gesture.offset(), 0.0);
        assert_eq!(gesture.pointer_up(), None);
    }
}
