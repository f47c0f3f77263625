//! Progressive probabilistic Hough transform.
//!
//! Edge pixels are visited in a seeded random order and vote into a
//! (theta, rho) accumulator. As soon as one cell reaches the vote threshold,
//! the corresponding line is traced through the mask in both directions,
//! bridging gaps of up to [`MAX_LINE_GAP`] pixels. Traced pixels are removed
//! from the mask; when the traced segment is long enough it is reported and
//! its pixels' votes are withdrawn again.

use std::f64::consts::PI;

use image::GrayImage;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::lines::LineSegment;
use crate::params::{HoughParams, MAX_LINE_GAP, THETA_RESOLUTION_DEG};

/// Fixed-point fraction bits used while stepping along a line.
const SHIFT: u32 = 16;

struct Accumulator {
    /// `(cos, sin) / rho` per angle bin.
    trig: Vec<(f64, f64)>,
    num_rho: usize,
    rho_offset: i64,
    votes: Vec<i32>,
}

impl Accumulator {
    fn new(width: usize, height: usize, rho: f64) -> Self {
        let theta = THETA_RESOLUTION_DEG.to_radians();
        let num_angle = (PI / theta).round() as usize;
        let num_rho = ((((width + height) * 2 + 1) as f64) / rho).round().max(1.0) as usize;
        let irho = 1.0 / rho;
        let trig = (0..num_angle)
            .map(|n| {
                let a = n as f64 * theta;
                (a.cos() * irho, a.sin() * irho)
            })
            .collect();
        Self {
            trig,
            num_rho,
            rho_offset: (num_rho as i64 - 1) / 2,
            votes: vec![0; num_angle * num_rho],
        }
    }

    #[inline]
    fn cell(&self, n: usize, x: i64, y: i64) -> usize {
        let (c, s) = self.trig[n];
        let r = (x as f64 * c + y as f64 * s).round() as i64 + self.rho_offset;
        n * self.num_rho + r.clamp(0, self.num_rho as i64 - 1) as usize
    }

    /// Vote for `(x, y)`; returns the angle bin of the strongest cell if it
    /// reached `threshold`.
    fn vote(&mut self, x: i64, y: i64, threshold: i32) -> Option<usize> {
        let mut max_val = threshold - 1;
        let mut max_n = None;
        for n in 0..self.trig.len() {
            let idx = self.cell(n, x, y);
            self.votes[idx] += 1;
            if self.votes[idx] > max_val {
                max_val = self.votes[idx];
                max_n = Some(n);
            }
        }
        max_n
    }

    fn unvote(&mut self, x: i64, y: i64) {
        for n in 0..self.trig.len() {
            let idx = self.cell(n, x, y);
            self.votes[idx] -= 1;
        }
    }
}

/// Fixed-point walker along the line through a seed pixel.
#[derive(Clone, Copy)]
struct Walker {
    /// Step along x (one pixel per step) rather than along y.
    x_major: bool,
    x0: i64,
    y0: i64,
    dx: i64,
    dy: i64,
}

impl Walker {
    fn new(x: i64, y: i64, angle_bin: usize) -> Self {
        let theta = angle_bin as f64 * THETA_RESOLUTION_DEG.to_radians();
        // Direction along the line is perpendicular to its normal.
        let a = -theta.sin();
        let b = theta.cos();
        let one = (1i64 << SHIFT) as f64;
        let half = 1i64 << (SHIFT - 1);
        if a.abs() > b.abs() {
            Self {
                x_major: true,
                x0: x,
                y0: (y << SHIFT) + half,
                dx: if a > 0.0 { 1 } else { -1 },
                dy: (b * one / a.abs()).round() as i64,
            }
        } else {
            Self {
                x_major: false,
                x0: (x << SHIFT) + half,
                y0: y,
                dx: (a * one / b.abs()).round() as i64,
                dy: if b > 0.0 { 1 } else { -1 },
            }
        }
    }

    /// Pixels visited going forward (`dir = 0`) or backward (`dir = 1`),
    /// starting at the seed.
    fn pixels(self, dir: usize) -> impl Iterator<Item = (i64, i64)> {
        let (dx, dy) = if dir == 0 {
            (self.dx, self.dy)
        } else {
            (-self.dx, -self.dy)
        };
        (0i64..).map(move |k| {
            let x = self.x0 + k * dx;
            let y = self.y0 + k * dy;
            if self.x_major {
                (x, y >> SHIFT)
            } else {
                (x >> SHIFT, y)
            }
        })
    }
}

/// Detect line segments in a binary mask (non-zero pixels are edges).
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask, params), fields(width = mask.width(), height = mask.height()))
)]
pub fn probabilistic_hough(mask: &GrayImage, params: &HoughParams) -> Vec<LineSegment> {
    let width = mask.width() as usize;
    let height = mask.height() as usize;
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let (w, h) = (width as i64, height as i64);
    let in_bounds = |x: i64, y: i64| x >= 0 && y >= 0 && x < w && y < h;
    let at = |x: i64, y: i64| (y * w + x) as usize;

    let mut live = vec![false; width * height];
    let mut edge_pixels = Vec::new();
    for (x, y, p) in mask.enumerate_pixels() {
        if p[0] != 0 {
            let (x, y) = (x as i64, y as i64);
            live[at(x, y)] = true;
            edge_pixels.push((x, y));
        }
    }
    let mut rng = StdRng::seed_from_u64(params.seed);
    edge_pixels.shuffle(&mut rng);

    let threshold = params.threshold.min(i32::MAX as u32) as i32;
    let min_len = params.min_line_length as i64;
    let mut acc = Accumulator::new(width, height, params.rho);
    let mut segments = Vec::new();

    for (x, y) in edge_pixels {
        // Already consumed by an earlier traced line.
        if !live[at(x, y)] {
            continue;
        }
        let Some(angle_bin) = acc.vote(x, y, threshold) else {
            continue;
        };

        let walker = Walker::new(x, y, angle_bin);
        let mut ends = [(x, y); 2];
        for (dir, end) in ends.iter_mut().enumerate() {
            let mut gap = 0;
            for (px, py) in walker.pixels(dir) {
                if !in_bounds(px, py) {
                    break;
                }
                if live[at(px, py)] {
                    gap = 0;
                    *end = (px, py);
                } else {
                    gap += 1;
                    if gap > MAX_LINE_GAP {
                        break;
                    }
                }
            }
        }

        let good_line =
            (ends[1].0 - ends[0].0).abs() >= min_len || (ends[1].1 - ends[0].1).abs() >= min_len;

        for (dir, &(ex, ey)) in ends.iter().enumerate() {
            for (px, py) in walker.pixels(dir) {
                if !in_bounds(px, py) {
                    break;
                }
                let idx = at(px, py);
                if live[idx] {
                    if good_line {
                        acc.unvote(px, py);
                    }
                    live[idx] = false;
                }
                if (px, py) == (ex, ey) {
                    break;
                }
            }
        }

        if good_line {
            segments.push(LineSegment::from_coords(
                ends[0].0 as i32,
                ends[0].1 as i32,
                ends[1].0 as i32,
                ends[1].1 as i32,
            ));
        }
    }

    segments
}
