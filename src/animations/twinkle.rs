//! Grounded on `commands.cpp`'s `TwinkleTask`: each pixel chases a random
//! per-pixel target color, stepping up toward it or decaying toward black
//! when no target is pending, with a small per-frame chance of a fresh
//! spark landing on a random pixel.

use super::{Animate, LightTask};
use crate::color;
use crate::led::LedSegment;
use rand::Rng;

const UP_SPEED: i16 = 4;
const DOWN_SPEED: i16 = 2;

fn step_toward(c: u8, target: u8, amount: i16) -> u8 {
    (c as i16 + amount).clamp(0, target as i16) as u8
}

fn decay(c: u8, amount: i16) -> u8 {
    (c as i16 - amount).clamp(0, 255) as u8
}

pub struct TwinkleAnim {
    targets: Vec<(u8, u8, u8)>,
}

impl Animate for TwinkleAnim {
    fn update(&mut self, seg: &mut LedSegment) {
        for j in 0..seg.length() {
            let c = seg.get(j);
            let t = self.targets[j];
            let new = if c.0 < t.0 || c.1 < t.1 || c.2 < t.2 {
                (
                    if c.0 < t.0 { step_toward(c.0, t.0, UP_SPEED) } else { c.0 },
                    if c.1 < t.1 { step_toward(c.1, t.1, UP_SPEED) } else { c.1 },
                    if c.2 < t.2 { step_toward(c.2, t.2, UP_SPEED) } else { c.2 },
                )
            } else {
                let decayed = (decay(c.0, DOWN_SPEED), decay(c.1, DOWN_SPEED), decay(c.2, DOWN_SPEED));
                self.targets[j] = decayed;
                decayed
            };
            seg.set(j, new);
        }

        let mut rng = rand::thread_rng();
        let spark_roll: u32 = rng.gen_range(0..100) + rng.gen_range(0..100) + rng.gen_range(0..100);
        if spark_roll < 150 && seg.length() > 0 {
            let i = rng.gen_range(0..seg.length());
            let hue = rng.gen_range(0..1000) as f32 / 1000.0 * 360.0;
            let (r, g, b) = color::hsb_to_rgb(hue, 1.0, 1.0);
            self.targets[i] = (color::to_u8(r), color::to_u8(g), color::to_u8(b));
        }

        seg.send(false);
    }
}

pub type TwinkleTask = LightTask<TwinkleAnim>;

impl TwinkleTask {
    pub fn new(seg: LedSegment) -> Self {
        let len = seg.length();
        LightTask::new(seg, TwinkleAnim { targets: vec![(0, 0, 0); len] })
    }
}
