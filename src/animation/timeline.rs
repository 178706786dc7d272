//! Scroll-driven keyframe timeline.
//!
//! A timeline is a list of sections laid out on a time axis. Each section holds tweens that
//! move individual transform axes of named models to absolute end values. Overall scroll
//! progress in `[0, 1]` is mapped onto the whole time axis, and every animated axis is a pure
//! function of that progress: axes a section does not name keep the value the previous
//! section left them at, and axes that have not started yet hold their pre-timeline value.

use std::collections::HashMap;

use serde::Deserialize;

use crate::{
    animation::{
        easing::Ease,
        property::{AxisValues, PropertyPath, TransformProperty},
        scroll_trigger::ScrollTrigger,
    },
    assets::ModelRegistry,
    scene_graph::{ObjectId, Scene},
};

#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("section {section} animates `{name}`, which is not a loaded model")]
    MissingObject { name: String, section: usize },
    #[error("section {section} has a negative or non-finite span")]
    InvalidSpan { section: usize },
}

/// One `to(target.property, { axis: value, .. })` call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TweenSpec {
    pub target: String,
    pub property: TransformProperty,
    pub to: AxisValues,
}

impl TweenSpec {
    pub fn new(target: impl Into<String>, property: TransformProperty, to: AxisValues) -> Self {
        Self {
            target: target.into(),
            property,
            to,
        }
    }
}

/// A section of the timeline. Without an explicit `start`, section `i` starts at time `i`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SectionSpec {
    pub start: Option<f32>,
    pub duration: Option<f32>,
    pub tweens: Vec<TweenSpec>,
}

impl SectionSpec {
    pub fn with_tweens(tweens: Vec<TweenSpec>) -> Self {
        Self {
            tweens,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimelineSpec {
    pub ease: Ease,
    /// Scrub lag in seconds.
    pub scrub: f32,
    pub trigger: ScrollTrigger,
    pub markers: bool,
    pub default_duration: f32,
    pub sections: Vec<SectionSpec>,
}

impl Default for TimelineSpec {
    fn default() -> Self {
        use TransformProperty::{Position, Rotation};

        let x = |x| AxisValues {
            x: Some(x),
            ..Default::default()
        };
        let y = |y| AxisValues {
            y: Some(y),
            ..Default::default()
        };

        Self {
            ease: Ease::default(),
            scrub: 0.1,
            trigger: ScrollTrigger::default(),
            markers: true,
            default_duration: 1.0,
            sections: vec![
                SectionSpec::with_tweens(vec![
                    TweenSpec::new("box", Position, x(0.8)),
                    TweenSpec::new("box", Rotation, y(7.85)),
                ]),
                SectionSpec::with_tweens(vec![TweenSpec::new(
                    "box",
                    Position,
                    AxisValues {
                        x: Some(0.0),
                        y: Some(0.7),
                        z: Some(1.5),
                    },
                )]),
                SectionSpec::with_tweens(vec![
                    TweenSpec::new("box", Position, x(3.0)),
                    TweenSpec::new("shoes", Position, x(0.3)),
                    TweenSpec::new("shoes", Rotation, y(7.85)),
                ]),
            ],
        }
    }
}

impl TimelineSpec {
    /// Drops every tween whose target fails `keep` and returns the dropped target names.
    pub fn retain_targets(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut dropped = Vec::new();

        for section in &mut self.sections {
            section.tweens.retain(|tween| {
                let retained = keep(&tween.target);
                if !retained && !dropped.contains(&tween.target) {
                    dropped.push(tween.target.clone());
                }
                retained
            });
        }

        dropped
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionSpan {
    pub start: f32,
    pub end: f32,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    start: f32,
    end: f32,
    from: f32,
    to: f32,
}

impl Segment {
    fn value_at(&self, time: f32, ease: Ease) -> f32 {
        if time >= self.end || self.end <= self.start {
            return self.to;
        }

        let t = (time - self.start) / (self.end - self.start);
        self.from + (self.to - self.from) * ease.apply(t)
    }
}

#[derive(Debug, Clone)]
struct Track {
    object: ObjectId,
    path: PropertyPath,
    initial: f32,
    segments: Vec<Segment>,
}

impl Track {
    fn value_at(&self, time: f32, ease: Ease) -> f32 {
        let mut value = self.initial;

        for segment in &self.segments {
            if time < segment.start {
                break;
            }
            value = segment.value_at(time, ease);
        }

        value
    }
}

/// Value of one animated axis at a given progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSample {
    pub object: ObjectId,
    pub path: PropertyPath,
    pub value: f32,
}

#[derive(Debug, Clone)]
pub struct Timeline {
    ease: Ease,
    duration: f32,
    sections: Vec<SectionSpan>,
    tracks: Vec<Track>,
}

impl Timeline {
    /// Compiles `spec` against loaded models. Requiring a [`ModelRegistry`] means a timeline
    /// can only exist once its batch has finished loading. Start values are read from the
    /// scene as it is now.
    pub fn build(
        spec: &TimelineSpec,
        registry: &ModelRegistry,
        scene: &Scene,
    ) -> Result<Self, TimelineError> {
        struct PendingSegment {
            start: f32,
            end: f32,
            object: ObjectId,
            path: PropertyPath,
            to: f32,
        }

        let mut sections = Vec::with_capacity(spec.sections.len());
        let mut pending = Vec::new();

        for (index, section) in spec.sections.iter().enumerate() {
            let start = section.start.unwrap_or(index as f32);
            let duration = section.duration.unwrap_or(spec.default_duration);

            if !start.is_finite() || !duration.is_finite() || start < 0.0 || duration < 0.0 {
                return Err(TimelineError::InvalidSpan { section: index });
            }

            let end = start + duration;
            sections.push(SectionSpan { start, end });

            for tween in &section.tweens {
                let object = registry
                    .get(&tween.target)
                    .filter(|&id| scene.get_object(id).is_some())
                    .ok_or_else(|| TimelineError::MissingObject {
                        name: tween.target.clone(),
                        section: index,
                    })?;

                for (axis, to) in tween.to.iter() {
                    pending.push(PendingSegment {
                        start,
                        end,
                        object,
                        path: PropertyPath::new(tween.property, axis),
                        to,
                    });
                }
            }
        }

        // Stable, so tweens declared later at the same start win.
        pending.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut tracks: Vec<Track> = Vec::new();
        let mut track_index: HashMap<(ObjectId, PropertyPath), usize> = HashMap::new();

        for segment in pending {
            let index = *track_index
                .entry((segment.object, segment.path))
                .or_insert_with(|| {
                    let initial = scene
                        .object_property(segment.object, segment.path)
                        .unwrap_or_default();
                    tracks.push(Track {
                        object: segment.object,
                        path: segment.path,
                        initial,
                        segments: Vec::new(),
                    });
                    tracks.len() - 1
                });

            // A segment that starts while an earlier one is running takes over mid-flight.
            let track = &mut tracks[index];
            let from = track.value_at(segment.start, spec.ease);

            track.segments.push(Segment {
                start: segment.start,
                end: segment.end,
                from,
                to: segment.to,
            });
        }

        let duration = sections
            .iter()
            .map(|section| section.end)
            .fold(0.0_f32, f32::max);

        log::debug!(
            "Built timeline with {} sections, {} tracks, duration {}",
            sections.len(),
            tracks.len(),
            duration
        );

        Ok(Self {
            ease: spec.ease,
            duration,
            sections,
            tracks,
        })
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn sections(&self) -> &[SectionSpan] {
        &self.sections
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn time_at(&self, progress: f32) -> f32 {
        progress.clamp(0.0, 1.0) * self.duration
    }

    /// Progress values at which each section starts.
    pub fn section_boundaries(&self) -> Vec<f32> {
        if self.duration <= 0.0 {
            return Vec::new();
        }

        self.sections
            .iter()
            .map(|section| section.start / self.duration)
            .collect()
    }

    /// Index of the latest section that has started at `progress`.
    pub fn section_at(&self, progress: f32) -> Option<usize> {
        let time = self.time_at(progress);

        self.sections
            .iter()
            .enumerate()
            .filter(|(_, section)| section.start <= time)
            .max_by(|(_, a), (_, b)| a.start.total_cmp(&b.start))
            .map(|(index, _)| index)
    }

    pub fn sample(&self, progress: f32) -> impl Iterator<Item = TrackSample> + '_ {
        let time = self.time_at(progress);

        self.tracks.iter().map(move |track| TrackSample {
            object: track.object,
            path: track.path,
            value: track.value_at(time, self.ease),
        })
    }

    /// Writes every animated axis for `progress` into the scene. Returns how many writes
    /// reached an object.
    pub fn apply(&self, progress: f32, scene: &mut Scene) -> usize {
        let mut written = 0;

        for sample in self.sample(progress) {
            if scene.set_object_property(sample.object, sample.path, sample.value) {
                written += 1;
            } else {
                log::warn!(
                    "Timeline target {:?} is missing, skipped {}",
                    sample.object,
                    sample.path
                );
            }
        }

        written
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::scene_graph::{Object3D, Transform};

    const EPSILON: f32 = 1e-5;

    struct Fixture {
        scene: Scene,
        registry: ModelRegistry,
        boxy: ObjectId,
        shoes: ObjectId,
    }

    fn fixture() -> Fixture {
        let mut scene = Scene::new();
        let boxy = scene.add_object(Object3D {
            name: "box".into(),
            transform: Transform::from_translation(Vec3::new(-6.0, 0.1, 0.0)),
            ..Default::default()
        });
        let shoes = scene.add_object(Object3D {
            name: "shoes".into(),
            transform: Transform::from_translation(Vec3::new(-5.0, 0.2, 0.0)),
            ..Default::default()
        });

        let registry = ModelRegistry::from_entries([("box", boxy), ("shoes", shoes)]);

        Fixture {
            scene,
            registry,
            boxy,
            shoes,
        }
    }

    fn build(fixture: &Fixture) -> Timeline {
        Timeline::build(&TimelineSpec::default(), &fixture.registry, &fixture.scene).unwrap()
    }

    fn position(scene: &Scene, id: ObjectId) -> Vec3 {
        scene.get_object(id).unwrap().transform.translation()
    }

    fn rotation(scene: &Scene, id: ObjectId) -> Vec3 {
        scene.get_object(id).unwrap().transform.rotation()
    }

    #[test]
    fn sections_split_progress_evenly() {
        let fixture = fixture();
        let timeline = build(&fixture);

        assert_eq!(timeline.duration(), 3.0);
        assert_eq!(timeline.section_boundaries(), vec![0.0, 1.0 / 3.0, 2.0 / 3.0]);
        assert_eq!(timeline.section_at(0.0), Some(0));
        assert_eq!(timeline.section_at(0.5), Some(1));
        assert_eq!(timeline.section_at(1.0), Some(2));
    }

    #[test]
    fn progress_zero_shows_pre_timeline_placement() {
        let mut fixture = fixture();
        let timeline = build(&fixture);

        timeline.apply(0.0, &mut fixture.scene);

        assert_eq!(position(&fixture.scene, fixture.boxy), Vec3::new(-6.0, 0.1, 0.0));
        assert_eq!(position(&fixture.scene, fixture.shoes), Vec3::new(-5.0, 0.2, 0.0));
    }

    #[test]
    fn section_boundaries_land_on_previous_targets() {
        let mut fixture = fixture();
        let timeline = build(&fixture);

        timeline.apply(1.0 / 3.0, &mut fixture.scene);
        let boxy = position(&fixture.scene, fixture.boxy);
        assert!((boxy.x - 0.8).abs() < EPSILON);
        assert!((rotation(&fixture.scene, fixture.boxy).y - 7.85).abs() < EPSILON);

        timeline.apply(2.0 / 3.0, &mut fixture.scene);
        let boxy = position(&fixture.scene, fixture.boxy);
        assert!(boxy.abs_diff_eq(Vec3::new(0.0, 0.7, 1.5), EPSILON));

        timeline.apply(1.0, &mut fixture.scene);
        assert!((position(&fixture.scene, fixture.boxy).x - 3.0).abs() < EPSILON);
        assert!((position(&fixture.scene, fixture.shoes).x - 0.3).abs() < EPSILON);
    }

    #[test]
    fn untouched_axes_keep_their_last_value() {
        let mut fixture = fixture();
        let timeline = build(&fixture);

        timeline.apply(0.5, &mut fixture.scene);
        assert!((rotation(&fixture.scene, fixture.boxy).y - 7.85).abs() < EPSILON);
        assert_eq!(position(&fixture.scene, fixture.shoes), Vec3::new(-5.0, 0.2, 0.0));

        timeline.apply(0.9, &mut fixture.scene);
        let boxy = position(&fixture.scene, fixture.boxy);
        assert!((boxy.y - 0.7).abs() < EPSILON);
        assert!((boxy.z - 1.5).abs() < EPSILON);
    }

    #[test]
    fn scrolling_back_replays_the_same_values() {
        let mut fixture = fixture();
        let timeline = build(&fixture);

        let snapshot = |scene: &Scene| {
            [
                position(scene, fixture.boxy),
                rotation(scene, fixture.boxy),
                position(scene, fixture.shoes),
                rotation(scene, fixture.shoes),
            ]
        };

        for (p1, p2) in [(0.1, 0.8), (0.0, 1.0), (0.4, 0.45), (0.7, 0.95)] {
            timeline.apply(p1, &mut fixture.scene);
            let before = snapshot(&fixture.scene);

            timeline.apply(p2, &mut fixture.scene);
            timeline.apply(p1, &mut fixture.scene);
            let after = snapshot(&fixture.scene);

            for (a, b) in before.iter().zip(after.iter()) {
                assert!(a.abs_diff_eq(*b, EPSILON), "{p1} -> {p2}: {a} != {b}");
            }
        }
    }

    #[test]
    fn later_segments_start_from_earlier_targets() {
        let fixture = fixture();
        let timeline = build(&fixture);

        let just_after = 1.0 / 3.0 + 1e-4;
        let x = timeline
            .sample(just_after)
            .find(|sample| {
                sample.object == fixture.boxy
                    && sample.path == "position.x".parse::<PropertyPath>().unwrap()
            })
            .unwrap()
            .value;

        assert!(x < 0.8 && x > 0.7, "x = {x}");
    }

    #[test]
    fn overlapping_spans_take_over_without_a_jump() {
        let fixture = fixture();
        let to_x = |x| {
            vec![TweenSpec::new(
                "box",
                TransformProperty::Position,
                AxisValues {
                    x: Some(x),
                    ..Default::default()
                },
            )]
        };
        let spec = TimelineSpec {
            ease: Ease::Linear,
            sections: vec![
                SectionSpec {
                    start: Some(0.0),
                    duration: Some(2.0),
                    tweens: to_x(4.0),
                },
                SectionSpec {
                    start: Some(1.0),
                    duration: Some(1.0),
                    tweens: to_x(0.0),
                },
            ],
            ..Default::default()
        };
        let timeline = Timeline::build(&spec, &fixture.registry, &fixture.scene).unwrap();

        let box_x = |progress| {
            timeline
                .sample(progress)
                .find(|sample| sample.object == fixture.boxy)
                .unwrap()
                .value
        };

        assert!((box_x(0.5 - 1e-4) - box_x(0.5)).abs() < 1e-2);
        assert!((box_x(0.5) - -1.0).abs() < EPSILON);
        assert!((box_x(0.75) - -0.5).abs() < EPSILON);
        assert!((box_x(1.0) - 0.0).abs() < EPSILON);
    }

    #[test]
    fn unknown_target_is_a_missing_object() {
        let fixture = fixture();
        let mut spec = TimelineSpec::default();
        spec.sections[1]
            .tweens
            .push(TweenSpec::new("lamp", TransformProperty::Scale, AxisValues::default()));

        match Timeline::build(&spec, &fixture.registry, &fixture.scene) {
            Err(TimelineError::MissingObject { name, section }) => {
                assert_eq!(name, "lamp");
                assert_eq!(section, 1);
            }
            other => panic!("expected a missing object, got {other:?}"),
        }
    }

    #[test]
    fn explicit_spans_override_ordinal_layout() {
        let mut fixture = fixture();
        let spec = TimelineSpec {
            ease: Ease::Linear,
            sections: vec![
                SectionSpec {
                    start: Some(0.0),
                    duration: Some(2.0),
                    tweens: vec![TweenSpec::new(
                        "box",
                        TransformProperty::Position,
                        AxisValues {
                            x: Some(4.0),
                            ..Default::default()
                        },
                    )],
                },
                SectionSpec {
                    start: Some(0.0),
                    duration: Some(4.0),
                    tweens: vec![TweenSpec::new(
                        "box",
                        TransformProperty::Rotation,
                        AxisValues {
                            y: Some(2.0),
                            ..Default::default()
                        },
                    )],
                },
            ],
            ..Default::default()
        };
        let timeline = Timeline::build(&spec, &fixture.registry, &fixture.scene).unwrap();
        assert_eq!(timeline.duration(), 4.0);

        timeline.apply(0.25, &mut fixture.scene);
        assert!((position(&fixture.scene, fixture.boxy).x - -1.0).abs() < EPSILON);
        assert!((rotation(&fixture.scene, fixture.boxy).y - 0.5).abs() < EPSILON);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let fixture = fixture();
        let mut spec = TimelineSpec::default();
        spec.sections[2].duration = Some(-1.0);

        assert!(matches!(
            Timeline::build(&spec, &fixture.registry, &fixture.scene),
            Err(TimelineError::InvalidSpan { section: 2 })
        ));
    }

    #[test]
    fn retain_targets_reports_dropped_names() {
        let mut spec = TimelineSpec::default();
        let dropped = spec.retain_targets(|name| name != "shoes");

        assert_eq!(dropped, vec!["shoes".to_string()]);
        assert_eq!(spec.sections[2].tweens.len(), 1);
    }
}
