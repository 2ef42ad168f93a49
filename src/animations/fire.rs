//! No original-source precedent (see `DESIGN.md`): a standard
//! heat-diffusion fire effect, implemented fresh in the same
//! periodic-`LightTask` shape as [`super::rainbow`]/[`super::twinkle`],
//! with the parameter set spec.md gives for the `fire` command.
//!
//! `rows` heat cells are cooled, diffused upward, occasionally sparked
//! near the bottom, and mapped onto the strip's pixels by dividing it
//! into `rows` contiguous bands (black -> red -> yellow -> white).

use super::{Animate, LightTask};
use crate::led::LedSegment;
use rand::Rng;

#[derive(Clone, Copy)]
pub struct FireParams {
    pub rows: u8,
    pub decay: f32,
    pub heat: f32,
    pub loss: f32,
    pub keep: f32,
    pub fps: f32,
}

impl Default for FireParams {
    fn default() -> Self {
        FireParams { rows: 15, decay: 0.2, heat: 0.6, loss: 2.0, keep: 0.3, fps: 30.0 }
    }
}

fn heat_to_rgb(heat: f32) -> (u8, u8, u8) {
    let t = (heat / 255.0).clamp(0.0, 1.0);
    if t < 1.0 / 3.0 {
        (((t * 3.0) * 255.0) as u8, 0, 0)
    } else if t < 2.0 / 3.0 {
        (255, (((t - 1.0 / 3.0) * 3.0) * 255.0) as u8, 0)
    } else {
        (255, 255, (((t - 2.0 / 3.0) * 3.0) * 255.0) as u8)
    }
}

pub struct FireAnim {
    params: FireParams,
    heat: Vec<f32>,
}

impl Animate for FireAnim {
    fn update(&mut self, seg: &mut LedSegment) {
        let rows = self.heat.len();
        for h in self.heat.iter_mut() {
            *h = (*h - self.params.loss).max(0.0);
        }
        for i in (2..rows).rev() {
            let bled = (self.heat[i - 1] + self.heat[i - 2]) / 2.0;
            self.heat[i] = self.heat[i] * (1.0 - self.params.decay) + bled * self.params.decay;
        }

        let mut rng = rand::thread_rng();
        if rows > 0 && rng.gen::<f32>() < self.params.keep {
            let spark_row = rng.gen_range(0..rows.min(2).max(1));
            let boost = self.params.heat * 255.0 * rng.gen_range(0.5..1.0);
            self.heat[spark_row] = (self.heat[spark_row] + boost).min(255.0);
        }

        let len = seg.length();
        if len > 0 && rows > 0 {
            for p in 0..len {
                let row = (p * rows) / len;
                seg.set(p, heat_to_rgb(self.heat[row]));
            }
        }
        seg.send(false);
    }
}

pub type FireTask = LightTask<FireAnim>;

impl FireTask {
    pub fn new(seg: LedSegment, params: FireParams) -> Self {
        let rows = params.rows.max(2) as usize;
        LightTask::new(seg, FireAnim { params, heat: vec![0.0; rows] })
    }
}
