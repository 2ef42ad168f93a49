//! Grounded on `commands.cpp`'s `RainbowTask`: a moving hue gradient
//! across the strip, one full revolution of hue every `1.0/speed` frames.

use super::{Animate, LightTask};
use crate::color;
use crate::led::LedSegment;

#[derive(Clone, Copy)]
pub struct RainbowParams {
    pub speed: f32,
    pub mul: f32,
    pub saturation: f32,
    pub brightness: f32,
}

impl Default for RainbowParams {
    fn default() -> Self {
        RainbowParams { speed: 0.01, mul: 1.0, saturation: 1.0, brightness: 1.0 }
    }
}

pub struct RainbowAnim {
    params: RainbowParams,
    hue: f32,
}

impl Animate for RainbowAnim {
    fn update(&mut self, seg: &mut LedSegment) {
        let len = seg.length().max(1) as f32;
        for i in 0..seg.length() {
            let h = (self.hue + self.params.mul * i as f32 / len).rem_euclid(1.0) * 360.0;
            let (r, g, b) = color::hsb_to_rgb(h, self.params.saturation, self.params.brightness);
            seg.set(i, (color::to_u8(r), color::to_u8(g), color::to_u8(b)));
        }
        seg.send(false);
        self.hue = (self.hue - self.params.speed).rem_euclid(1.0);
    }
}

pub type RainbowTask = LightTask<RainbowAnim>;

impl RainbowTask {
    pub fn new(seg: LedSegment, params: RainbowParams) -> Self {
        LightTask::new(seg, RainbowAnim { params, hue: 0.0 })
    }
}
