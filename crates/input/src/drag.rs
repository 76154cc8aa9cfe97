use glam::Vec2;

/// A raw pointer event in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer pressed at a position.
    Down(Vec2),
    /// Pointer moved to a position.
    Move(Vec2),
    /// Pointer released.
    Up,
}

/// Movement since the previous pointer position while pressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub dx: f32,
    pub dy: f32,
}

/// Tracks the last pressed pointer position and emits drag deltas.
#[derive(Debug, Clone, Default)]
pub struct DragTracker {
    previous: Option<Vec2>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.previous.is_some()
    }

    /// Feed one event; returns a drag when the pointer moved while pressed.
    pub fn handle(&mut self, event: PointerEvent) -> Option<Drag> {
        match event {
            PointerEvent::Down(at) => {
                self.previous = Some(at);
                None
            }
            PointerEvent::Move(at) => {
                let previous = self.previous.replace(at)?;
                let delta = at - previous;
                if delta == Vec2::ZERO {
                    return None;
                }
                tracing::trace!(dx = delta.x, dy = delta.y, "drag");
                Some(Drag {
                    dx: delta.x,
                    dy: delta.y,
                })
            }
            PointerEvent::Up => {
                self.previous = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_without_press_is_ignored() {
        let mut t = DragTracker::new();
        assert_eq!(t.handle(PointerEvent::Move(Vec2::new(5.0, 5.0))), None);
        assert!(!t.is_dragging());
    }

    #[test]
    fn deltas_are_relative_to_previous_position() {
        let mut t = DragTracker::new();
        t.handle(PointerEvent::Down(Vec2::new(10.0, 10.0)));
        let d1 = t.handle(PointerEvent::Move(Vec2::new(15.0, 8.0))).unwrap();
        assert_eq!(d1, Drag { dx: 5.0, dy: -2.0 });
        let d2 = t.handle(PointerEvent::Move(Vec2::new(16.0, 8.0))).unwrap();
        assert_eq!(d2, Drag { dx: 1.0, dy: 0.0 });
    }

    #[test]
    fn release_ends_the_drag() {
        let mut t = DragTracker::new();
        t.handle(PointerEvent::Down(Vec2::ZERO));
        t.handle(PointerEvent::Up);
        assert!(!t.is_dragging());
        assert_eq!(t.handle(PointerEvent::Move(Vec2::ONE)), None);
    }

    #[test]
    fn zero_motion_emits_nothing() {
        let mut t = DragTracker::new();
        t.handle(PointerEvent::Down(Vec2::ONE));
        assert_eq!(t.handle(PointerEvent::Move(Vec2::ONE)), None);
    }
}
