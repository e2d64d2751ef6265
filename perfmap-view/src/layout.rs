//! Artist bubble field
//!
//! One circular node per artist, sized by event count, drifting inside a
//! rectangular container and pushed away from the pointer. Positions are the
//! node's top-left corner; the node occupies `size × size`.
//!
//! Randomness is injected so layouts can be reproduced with a seeded RNG.

use rand::Rng;
use std::f64::consts::TAU;

use crate::aggregation;
use perfmap_common::Performance;

/// Node size per event
pub const SIZE_PER_EVENT: f64 = 20.0;
pub const MIN_SIZE: f64 = 40.0;
pub const MAX_SIZE: f64 = 120.0;

/// Gap kept between nodes and the container edges
pub const PADDING: f64 = 20.0;

/// Nominal frame length; elapsed time is measured in frames of this length
pub const FRAME_MS: f64 = 16.0;

/// Largest frame step applied at once after a stall
pub const MAX_FRAME_STEP: f64 = 2.0;

/// Default strength of the idle drift
pub const FLOAT_AMPLITUDE: f64 = 0.15;

/// Distance within which the pointer repels nodes
pub const POINTER_RADIUS: f64 = 150.0;
pub const POINTER_FORCE: f64 = 0.8;

const PHASE_RATE: f64 = 0.01;
const DRIFT_TIME_SCALE: f64 = 0.0005;
const FLOAT_GAIN: f64 = 0.4;
const VELOCITY_GAIN: f64 = 0.6;
const BOUNCE: f64 = -0.3;
const DAMPING: f64 = 0.98;
const INITIAL_SPEED: f64 = 0.1;

/// One artist node
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub artist: String,
    pub count: usize,
    pub size: f64,
    /// count / max count, in (0, 1]
    pub intensity: f64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub phase: f64,
}

impl Bubble {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }

    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }
}

pub fn bubble_size(count: usize) -> f64 {
    (count as f64 * SIZE_PER_EVENT).clamp(MIN_SIZE, MAX_SIZE)
}

/// Upper limit for a node's corner along one axis; collapses to the padding
/// when the container is too small for the node
fn upper_limit(extent: f64, size: f64) -> f64 {
    (extent - size - PADDING).max(PADDING)
}

/// Animated set of artist nodes inside a `width × height` container
#[derive(Debug, Clone)]
pub struct BubbleField {
    bubbles: Vec<Bubble>,
    width: f64,
    height: f64,
    float_amplitude: f64,
    last_frame_ms: Option<f64>,
}

impl BubbleField {
    /// One node per distinct artist, most frequent first
    pub fn new<R: Rng + ?Sized>(events: &[Performance], width: f64, height: f64, rng: &mut R) -> Self {
        let counts: Vec<(String, usize)> = aggregation::artist_counts(events)
            .into_iter()
            .map(|entry| (entry.label, entry.count))
            .collect();
        Self::from_counts(&counts, width, height, rng)
    }

    /// Nodes for pre-ranked `(artist, count)` pairs
    pub fn from_counts<R: Rng + ?Sized>(
        counts: &[(String, usize)],
        width: f64,
        height: f64,
        rng: &mut R,
    ) -> Self {
        let max_count = counts.iter().map(|(_, c)| *c).max().unwrap_or(1).max(1) as f64;
        let bubbles = counts
            .iter()
            .map(|(artist, count)| Bubble {
                artist: artist.clone(),
                count: *count,
                size: bubble_size(*count),
                intensity: *count as f64 / max_count,
                x: PADDING,
                y: PADDING,
                vx: rng.gen_range(-INITIAL_SPEED..INITIAL_SPEED),
                vy: rng.gen_range(-INITIAL_SPEED..INITIAL_SPEED),
                phase: rng.gen_range(0.0..TAU),
            })
            .collect();

        let mut field = Self {
            bubbles,
            width,
            height,
            float_amplitude: FLOAT_AMPLITUDE,
            last_frame_ms: None,
        };
        field.scatter(rng);
        field
    }

    /// Override the idle drift strength (0 disables it)
    pub fn with_float_amplitude(mut self, amplitude: f64) -> Self {
        self.float_amplitude = amplitude;
        self
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Change the container size and reseed every position
    pub fn resize<R: Rng + ?Sized>(&mut self, width: f64, height: f64, rng: &mut R) {
        self.width = width;
        self.height = height;
        self.scatter(rng);
    }

    /// Forget the previous frame time; the next step counts as one frame
    pub fn reset_clock(&mut self) {
        self.last_frame_ms = None;
    }

    fn scatter<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for bubble in &mut self.bubbles {
            bubble.x = rng.gen_range(PADDING..=upper_limit(self.width, bubble.size));
            bubble.y = rng.gen_range(PADDING..=upper_limit(self.height, bubble.size));
        }
    }

    /// Advance one frame at `now_ms`, with an optional pointer position
    pub fn step(&mut self, now_ms: f64, pointer: Option<(f64, f64)>) {
        let dt = match self.last_frame_ms {
            Some(last) => ((now_ms - last) / FRAME_MS).clamp(0.0, MAX_FRAME_STEP),
            None => 1.0,
        };
        self.last_frame_ms = Some(now_ms);

        let t = now_ms * DRIFT_TIME_SCALE;
        for bubble in &mut self.bubbles {
            bubble.phase = (bubble.phase + dt * PHASE_RATE) % TAU;
            let float_x = (bubble.phase + t).sin() * self.float_amplitude;
            let float_y = (bubble.phase + t * 0.8).cos() * self.float_amplitude;

            if let Some((px, py)) = pointer {
                let (cx, cy) = bubble.center();
                let (dx, dy) = (cx - px, cy - py);
                let distance = dx.hypot(dy);
                if distance > 0.0 && distance < POINTER_RADIUS {
                    let force = (1.0 - distance / POINTER_RADIUS).powi(2) * POINTER_FORCE;
                    bubble.vx += dx / distance * force;
                    bubble.vy += dy / distance * force;
                }
            }

            bubble.vx += float_x * FLOAT_GAIN;
            bubble.vy += float_y * FLOAT_GAIN;
            bubble.x += bubble.vx * VELOCITY_GAIN;
            bubble.y += bubble.vy * VELOCITY_GAIN;

            let max_x = upper_limit(self.width, bubble.size);
            let max_y = upper_limit(self.height, bubble.size);
            if bubble.x < PADDING {
                bubble.x = PADDING;
                bubble.vx *= BOUNCE;
            } else if bubble.x > max_x {
                bubble.x = max_x;
                bubble.vx *= BOUNCE;
            }
            if bubble.y < PADDING {
                bubble.y = PADDING;
                bubble.vy *= BOUNCE;
            } else if bubble.y > max_y {
                bubble.y = max_y;
                bubble.vy *= BOUNCE;
            }

            bubble.vx *= DAMPING;
            bubble.vy *= DAMPING;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn counts(pairs: &[(&str, usize)]) -> Vec<(String, usize)> {
        pairs.iter().map(|(a, c)| (a.to_string(), *c)).collect()
    }

    fn assert_inside(field: &BubbleField) {
        for b in field.bubbles() {
            assert!(b.x >= PADDING && b.x <= upper_limit(field.width(), b.size), "x = {}", b.x);
            assert!(b.y >= PADDING && b.y <= upper_limit(field.height(), b.size), "y = {}", b.y);
        }
    }

    #[test]
    fn test_size_is_clamped() {
        assert_eq!(bubble_size(1), 40.0);
        assert_eq!(bubble_size(3), 60.0);
        assert_eq!(bubble_size(6), 120.0);
        assert_eq!(bubble_size(50), 120.0);
    }

    #[test]
    fn test_initial_state() {
        let mut rng = StdRng::seed_from_u64(7);
        let field = BubbleField::from_counts(&counts(&[("A", 4), ("B", 2)]), 600.0, 400.0, &mut rng);

        let bubbles = field.bubbles();
        assert_eq!(bubbles.len(), 2);
        assert_eq!(bubbles[0].artist, "A");
        assert_eq!(bubbles[0].intensity, 1.0);
        assert_eq!(bubbles[1].intensity, 0.5);
        for b in bubbles {
            assert!(b.vx >= -0.1 && b.vx < 0.1);
            assert!(b.phase >= 0.0 && b.phase < TAU);
        }
        assert_inside(&field);
    }

    #[test]
    fn test_new_orders_by_count() {
        use chrono::Utc;
        let event = |artist: &str| Performance {
            id: 0,
            artist: artist.to_string(),
            kind: "concert".to_string(),
            province: "浙江".to_string(),
            city: None,
            venue: None,
            notes: None,
            date: None,
            poster: None,
            created_at: Utc::now(),
        };
        let events = vec![event("B"), event("A"), event("A")];
        let mut rng = StdRng::seed_from_u64(1);
        let field = BubbleField::new(&events, 500.0, 500.0, &mut rng);
        let artists: Vec<&str> = field.bubbles().iter().map(|b| b.artist.as_str()).collect();
        assert_eq!(artists, vec!["A", "B"]);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let pairs = counts(&[("A", 3), ("B", 1), ("C", 2)]);
        let a = BubbleField::from_counts(&pairs, 500.0, 300.0, &mut StdRng::seed_from_u64(42));
        let b = BubbleField::from_counts(&pairs, 500.0, 300.0, &mut StdRng::seed_from_u64(42));
        assert_eq!(a.bubbles(), b.bubbles());
    }

    #[test]
    fn test_small_container_collapses_to_padding() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = BubbleField::from_counts(&counts(&[("A", 10)]), 50.0, 50.0, &mut rng);
        assert_eq!((field.bubbles()[0].x, field.bubbles()[0].y), (PADDING, PADDING));

        field.step(0.0, None);
        assert_eq!((field.bubbles()[0].x, field.bubbles()[0].y), (PADDING, PADDING));
    }

    #[test]
    fn test_without_forces_speed_never_increases_and_nodes_stay_inside() {
        let mut rng = StdRng::seed_from_u64(11);
        let pairs = counts(&[("A", 6), ("B", 3), ("C", 1), ("D", 2), ("E", 1)]);
        let mut field = BubbleField::from_counts(&pairs, 320.0, 240.0, &mut rng).with_float_amplitude(0.0);

        let mut previous: Vec<f64> = field.bubbles().iter().map(Bubble::speed).collect();
        for frame in 0..2000 {
            field.step(frame as f64 * FRAME_MS, None);
            assert_inside(&field);
            let speeds: Vec<f64> = field.bubbles().iter().map(Bubble::speed).collect();
            for (now, before) in speeds.iter().zip(&previous) {
                assert!(now <= before, "speed grew from {} to {}", before, now);
            }
            previous = speeds;
        }
    }

    #[test]
    fn test_drift_keeps_nodes_inside() {
        let mut rng = StdRng::seed_from_u64(5);
        let pairs = counts(&[("A", 2), ("B", 5), ("C", 1)]);
        let mut field = BubbleField::from_counts(&pairs, 400.0, 300.0, &mut rng);
        for frame in 0..5000 {
            let pointer = (frame % 7 == 0).then_some((200.0, 150.0));
            field.step(frame as f64 * FRAME_MS, pointer);
            assert_inside(&field);
        }
    }

    #[test]
    fn test_drift_speed_stays_bounded() {
        let mut rng = StdRng::seed_from_u64(13);
        let pairs = counts(&[("A", 1), ("B", 4)]);
        let mut field = BubbleField::from_counts(&pairs, 2000.0, 2000.0, &mut rng);
        for frame in 0..10_000 {
            field.step(frame as f64 * FRAME_MS, None);
            for b in field.bubbles() {
                assert!(b.speed() < 5.0, "speed {} at frame {}", b.speed(), frame);
            }
        }
    }

    #[test]
    fn test_pointer_pushes_node_away() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut field = BubbleField::from_counts(&counts(&[("A", 1)]), 1000.0, 1000.0, &mut rng)
            .with_float_amplitude(0.0);
        {
            let b = &mut field.bubbles[0];
            b.x = 480.0;
            b.y = 480.0;
            b.vx = 0.0;
            b.vy = 0.0;
        }
        // Pointer left of and level with the center (500, 500)
        field.step(0.0, Some((450.0, 500.0)));

        let b = &field.bubbles()[0];
        assert!(b.vx > 0.0);
        assert!(b.vy.abs() < 1e-12);
        assert!(b.x > 480.0);
    }

    #[test]
    fn test_pointer_out_of_range_has_no_effect() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut field = BubbleField::from_counts(&counts(&[("A", 1)]), 1000.0, 1000.0, &mut rng)
            .with_float_amplitude(0.0);
        field.bubbles[0].x = 480.0;
        field.bubbles[0].y = 480.0;
        field.bubbles[0].vx = 0.0;
        field.bubbles[0].vy = 0.0;

        field.step(0.0, Some((900.0, 900.0)));
        assert_eq!(field.bubbles()[0].speed(), 0.0);
    }

    #[test]
    fn test_phase_advances_with_capped_frame_step() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut field = BubbleField::from_counts(&counts(&[("A", 1)]), 500.0, 500.0, &mut rng);
        field.bubbles[0].phase = 0.0;

        field.step(1000.0, None); // first frame counts as one
        assert!((field.bubbles()[0].phase - 0.01).abs() < 1e-12);

        field.step(1000.0 + 10.0 * FRAME_MS, None); // stall: capped at two frames
        assert!((field.bubbles()[0].phase - 0.03).abs() < 1e-12);

        field.reset_clock();
        field.step(99_999.0, None);
        assert!((field.bubbles()[0].phase - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_resize_reseeds_inside_new_bounds() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut field = BubbleField::from_counts(&counts(&[("A", 2), ("B", 1)]), 1000.0, 1000.0, &mut rng);
        field.resize(200.0, 150.0, &mut rng);
        assert_eq!((field.width(), field.height()), (200.0, 150.0));
        assert_inside(&field);
    }
}
