use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

const CONFETTI: [char; 7] = ['✦', '✶', '●', '■', '▲', '✓', '★'];
const CHEERS: [&str; 5] = ["NAILED IT!", "SUPERSTAR!", "BRILLIANT!", "TOP MARKS!", "WELL DONE!"];
const GRAVITY: f64 = 12.0;
const STEP_SECS: f64 = 0.1;

/// One piece of confetti, or one letter of the cheer banner
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    /// Letter particles glide to a fixed slot and stay there
    pub is_letter: bool,
    pub target_x: f64,
    pub target_y: f64,
}

impl Particle {
    fn confetti<R: Rng>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-5.0..-1.5),
            symbol: *CONFETTI.choose(rng).unwrap_or(&'●'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(2.0..4.0),
            is_letter: false,
            target_x: x,
            target_y: y,
        }
    }

    fn letter<R: Rng>(from: (f64, f64), to: (f64, f64), symbol: char, rng: &mut R) -> Self {
        Self {
            x: from.0,
            y: from.1,
            vel_x: to.0 - from.0,
            vel_y: to.1 - from.1,
            symbol,
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(3.0..5.0),
            is_letter: true,
            target_x: to.0,
            target_y: to.1,
        }
    }

    /// Advance by `dt` seconds; returns false once expired
    fn update(&mut self, dt: f64) -> bool {
        if self.is_letter {
            let dist = ((self.target_x - self.x).powi(2) + (self.target_y - self.y).powi(2)).sqrt();
            if dist > 1.0 {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                self.vel_x *= 0.95;
                self.vel_y *= 0.95;
            } else {
                self.x = self.target_x;
                self.y = self.target_y;
                self.vel_x = 0.0;
                self.vel_y = 0.0;
            }
        } else {
            self.x += self.vel_x * dt;
            self.y += self.vel_y * dt;
            self.vel_y += GRAVITY * dt;
        }

        self.age += dt;
        self.age < self.max_age
    }
}

/// Confetti burst shown when a run is accepted
#[derive(Debug)]
pub struct Celebration {
    pub particles: Vec<Particle>,
    /// Monotonic reading at `start`
    pub started: Duration,
    pub duration_secs: f64,
    pub is_active: bool,
    pub width: f64,
    pub height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            started: Duration::ZERO,
            duration_secs: 3.0,
            is_active: false,
            width: 80.0,
            height: 24.0,
        }
    }

    /// `now` is a monotonic clock reading
    pub fn start(&mut self, width: u16, height: u16, now: Duration) {
        let mut rng = rand::thread_rng();

        self.particles.clear();
        self.started = now;
        self.is_active = true;
        self.width = width as f64;
        self.height = height as f64;

        let cx = self.width / 2.0;
        let cy = self.height / 2.0;

        let cheer = CHEERS.choose(&mut rng).unwrap_or(&"WELL DONE!");
        self.spell(cheer, cx, cy, &mut rng);

        for _ in 0..30 {
            let x = cx + rng.gen_range(-18.0..18.0);
            let y = cy + rng.gen_range(-8.0..8.0);
            self.particles.push(Particle::confetti(x, y, &mut rng));
        }
    }

    fn spell<R: Rng>(&mut self, text: &str, cx: f64, cy: f64, rng: &mut R) {
        let spacing = 2.0;
        let width = (text.chars().count() as f64 - 1.0) * spacing;
        let left = cx - width / 2.0;

        for (i, ch) in text.chars().enumerate().filter(|(_, c)| *c != ' ') {
            let to = (left + i as f64 * spacing, cy - 2.0);
            let from = (cx + rng.gen_range(-10.0..10.0), cy + rng.gen_range(-5.0..5.0));
            self.particles.push(Particle::letter(from, to, ch, rng));
        }
    }

    /// Called on every tick with the current monotonic reading
    pub fn update(&mut self, now: Duration) {
        if !self.is_active {
            return;
        }

        if now.saturating_sub(self.started).as_secs_f64() >= self.duration_secs {
            self.stop();
            return;
        }

        let (w, h) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            let alive = p.update(STEP_SECS);
            if p.is_letter {
                return alive;
            }
            let margin = 5.0;
            let off_screen = p.y > h + margin || p.x < -margin || p.x > w + margin;
            alive && !off_screen
        });
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.particles.clear();
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}
