pub mod easing;
pub mod property;
pub mod scroll_trigger;
pub mod scrub;
pub mod timeline;

pub use easing::Ease;
pub use property::{AxisValues, PropertyPath, TransformProperty};
pub use scroll_trigger::{ElementRect, ScrollTrigger, TriggerRange};
pub use scrub::Scrub;
pub use timeline::{SectionSpec, Timeline, TimelineError, TimelineSpec, TweenSpec};

/// Failure to parse one of the textual animation settings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown ease `{0}`")]
    UnknownEase(String),
    #[error("unknown property path `{0}`")]
    UnknownProperty(String),
    #[error("invalid trigger anchor `{0}`, expected `<element> <viewport>`")]
    UnknownAnchor(String),
}
