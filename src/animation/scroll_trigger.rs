//! Maps a scroll offset to timeline progress from the position of a tracked element
//! relative to the viewport.

use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::animation::ParseError;

/// A point along the element or the viewport, measured from its top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Top,
    Center,
    Bottom,
    Percent(f32),
}

impl Edge {
    fn offset(&self, extent: f32) -> f32 {
        match *self {
            Edge::Top => 0.0,
            Edge::Center => extent * 0.5,
            Edge::Bottom => extent,
            Edge::Percent(percent) => extent * percent / 100.0,
        }
    }
}

/// `"<element edge> <viewport edge>"`: the trigger point is reached when the element edge
/// lines up with the viewport edge.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Anchor {
    pub element: Edge,
    pub viewport: Edge,
}

impl Anchor {
    pub const fn new(element: Edge, viewport: Edge) -> Self {
        Self { element, viewport }
    }
}

/// Vertical extent of the tracked element in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRect {
    pub top: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScrollTrigger {
    pub start: Anchor,
    pub end: Anchor,
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self {
            start: Anchor::new(Edge::Top, Edge::Top),
            end: Anchor::new(Edge::Bottom, Edge::Bottom),
        }
    }
}

/// Scroll offsets at which a trigger starts and ends for one layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerRange {
    pub start: f32,
    pub end: f32,
}

impl TriggerRange {
    pub fn progress(&self, scroll_offset: f32) -> f32 {
        let span = self.end - self.start;
        if span <= 0.0 {
            return if scroll_offset >= self.start { 1.0 } else { 0.0 };
        }

        ((scroll_offset - self.start) / span).clamp(0.0, 1.0)
    }

    /// Scroll offset at which `progress` is reached.
    pub fn offset_at(&self, progress: f32) -> f32 {
        self.start + (self.end - self.start) * progress
    }
}

impl ScrollTrigger {
    pub fn range(&self, element: ElementRect, viewport_height: f32) -> TriggerRange {
        let resolve = |anchor: &Anchor| {
            element.top + anchor.element.offset(element.height)
                - anchor.viewport.offset(viewport_height)
        };

        TriggerRange {
            start: resolve(&self.start),
            end: resolve(&self.end),
        }
    }

    pub fn progress(&self, element: ElementRect, viewport_height: f32, scroll_offset: f32) -> f32 {
        self.range(element, viewport_height).progress(scroll_offset)
    }
}

impl FromStr for Edge {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Edge::Top),
            "center" => Ok(Edge::Center),
            "bottom" => Ok(Edge::Bottom),
            other => other
                .strip_suffix('%')
                .and_then(|percent| percent.parse::<f32>().ok())
                .filter(|percent| percent.is_finite())
                .map(Edge::Percent)
                .ok_or_else(|| ParseError::UnknownAnchor(s.to_string())),
        }
    }
}

impl FromStr for Anchor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(element), Some(viewport), None) => {
                Ok(Anchor::new(element.parse()?, viewport.parse()?))
            }
            _ => Err(ParseError::UnknownAnchor(s.to_string())),
        }
    }
}

impl TryFrom<String> for Anchor {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Top => f.write_str("top"),
            Edge::Center => f.write_str("center"),
            Edge::Bottom => f.write_str("bottom"),
            Edge::Percent(percent) => write!(f, "{}%", percent),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: ElementRect = ElementRect {
        top: 0.0,
        height: 2400.0,
    };

    #[test]
    fn top_top_to_bottom_bottom_spans_the_scrollable_range() {
        let trigger = ScrollTrigger::default();
        let range = trigger.range(PAGE, 600.0);

        assert_eq!(range, TriggerRange { start: 0.0, end: 1800.0 });
        assert_eq!(trigger.progress(PAGE, 600.0, 0.0), 0.0);
        assert_eq!(trigger.progress(PAGE, 600.0, 900.0), 0.5);
        assert_eq!(trigger.progress(PAGE, 600.0, 1800.0), 1.0);
    }

    #[test]
    fn progress_is_clamped() {
        let trigger = ScrollTrigger::default();
        assert_eq!(trigger.progress(PAGE, 600.0, -50.0), 0.0);
        assert_eq!(trigger.progress(PAGE, 600.0, 5000.0), 1.0);
    }

    #[test]
    fn element_shorter_than_viewport_is_a_step() {
        let trigger = ScrollTrigger::default();
        let short = ElementRect { top: 100.0, height: 300.0 };

        assert_eq!(trigger.progress(short, 600.0, 0.0), 0.0);
        assert_eq!(trigger.progress(short, 600.0, 99.0), 0.0);
        assert_eq!(trigger.progress(short, 600.0, 100.0), 1.0);
    }

    #[test]
    fn parses_anchor_strings() {
        assert_eq!(
            "top top".parse::<Anchor>().unwrap(),
            Anchor::new(Edge::Top, Edge::Top)
        );
        assert_eq!(
            "center 80%".parse::<Anchor>().unwrap(),
            Anchor::new(Edge::Center, Edge::Percent(80.0))
        );
        assert!("top".parse::<Anchor>().is_err());
        assert!("top top top".parse::<Anchor>().is_err());
        assert!("middle top".parse::<Anchor>().is_err());
    }

    #[test]
    fn offset_at_inverts_progress() {
        let range = ScrollTrigger::default().range(PAGE, 600.0);
        assert_eq!(range.offset_at(1.0 / 3.0), 600.0);
        assert_eq!(range.progress(range.offset_at(0.25)), 0.25);
    }
}
