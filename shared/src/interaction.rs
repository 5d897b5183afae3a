/// Pointer position in client (screen) coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum HoverState {
    #[default]
    Idle,
    Hovering {
        county: String,
        position: PointerPosition,
    },
}

/// Pointer events delivered by the host for a rendered boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Enter {
        county: String,
        position: PointerPosition,
    },
    Move {
        county: String,
        position: PointerPosition,
    },
    Leave,
    Click {
        county: String,
    },
}

/// A county the user picked; carries the display name exactly as drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub county: String,
}

/// Hover tracking for the map. Each event overwrites the previous transient
/// state; clicks never change it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interaction {
    state: HoverState,
}

impl Interaction {
    pub fn state(&self) -> &HoverState {
        &self.state
    }

    pub fn hovered(&self) -> Option<&str> {
        match &self.state {
            HoverState::Hovering { county, .. } => Some(county),
            HoverState::Idle => None,
        }
    }

    pub fn handle(&mut self, event: PointerEvent) -> Option<Selection> {
        match event {
            PointerEvent::Enter { county, position } => {
                self.state = HoverState::Hovering { county, position };
                None
            }
            PointerEvent::Move {
                county: moved_over,
                position: next,
            } => {
                if let HoverState::Hovering { county, position } = &mut self.state
                    && *county == moved_over
                {
                    *position = next;
                }
                None
            }
            PointerEvent::Leave => {
                self.state = HoverState::Idle;
                None
            }
            PointerEvent::Click { county } => Some(Selection { county }),
        }
    }
}
