//! Demo scene: scrolling stars, a ship steered by buttons, one bullet.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle, Triangle};

use crate::framebuffer::FrameBuffer;
use crate::geometry::{PanelSize, Rect};
use crate::pixel::Pixel;

pub const STAR_COUNT: usize = 48;
pub const SHIP_WIDTH: u16 = 24;
pub const SHIP_HEIGHT: u16 = 24;
pub const SHIP_SPEED: u16 = 4;
pub const BULLET_WIDTH: u16 = 2;
pub const BULLET_HEIGHT: u16 = 6;
pub const BULLET_SPEED: i32 = 6;

const SHIP_MARGIN: u16 = 4;

/// Button levels sampled for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub left: bool,
    pub right: bool,
    pub fire: bool,
}

/// Decoded image drawn in place of the vector ship.
#[derive(Clone, Copy, Debug)]
pub struct Sprite<'a> {
    pub width: u16,
    pub height: u16,
    pub pixels: &'a [Pixel],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct XorShift32(u32);

impl XorShift32 {
    fn new(seed: u32) -> Self {
        Self(if seed == 0 { 0x9E37_79B9 } else { seed })
    }

    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    fn below(&mut self, n: u16) -> u16 {
        (self.next() % n.max(1) as u32) as u16
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Star {
    pub x: u16,
    pub y: u16,
    pub speed: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bullet {
    pub x: u16,
    pub y: i32,
}

pub struct Scene {
    size: PanelSize,
    rng: XorShift32,
    stars: [Star; STAR_COUNT],
    ship_x: u16,
    ship_y: u16,
    bullet: Option<Bullet>,
}

impl Scene {
    pub fn new(size: PanelSize, seed: u32) -> Self {
        let mut rng = XorShift32::new(seed);
        let mut stars = [Star::default(); STAR_COUNT];
        for star in stars.iter_mut() {
            star.x = rng.below(size.width);
            star.y = rng.below(size.height);
            star.speed = 1 + rng.below(3);
        }
        Self {
            size,
            rng,
            stars,
            ship_x: size.width.saturating_sub(SHIP_WIDTH) / 2,
            ship_y: size.height.saturating_sub(SHIP_HEIGHT + SHIP_MARGIN),
            bullet: None,
        }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn ship(&self) -> Rect {
        Rect::new(self.ship_x, self.ship_y, SHIP_WIDTH, SHIP_HEIGHT)
    }

    pub fn bullet(&self) -> Option<Bullet> {
        self.bullet
    }

    /// Advance one frame.
    pub fn update(&mut self, controls: Controls) {
        for star in self.stars.iter_mut() {
            star.y += star.speed;
            if star.y >= self.size.height {
                star.y = 0;
                star.x = self.rng.below(self.size.width);
            }
        }

        let max_x = self.size.width.saturating_sub(SHIP_WIDTH);
        if controls.left {
            self.ship_x = self.ship_x.saturating_sub(SHIP_SPEED);
        }
        if controls.right {
            self.ship_x = (self.ship_x + SHIP_SPEED).min(max_x);
        }

        if let Some(b) = self.bullet.as_mut() {
            b.y -= BULLET_SPEED;
            if b.y + BULLET_HEIGHT as i32 <= 0 {
                self.bullet = None;
            }
        } else if controls.fire {
            self.bullet = Some(Bullet {
                x: self.ship_x + (SHIP_WIDTH - BULLET_WIDTH) / 2,
                y: self.ship_y as i32 - BULLET_HEIGHT as i32,
            });
        }
    }

    /// Render the whole scene into `fb`.
    pub fn draw(&self, fb: &mut FrameBuffer<'_>, sprite: Option<&Sprite<'_>>) {
        fb.fill(Pixel::BLACK);

        for star in &self.stars {
            let color = match star.speed {
                1 => Pixel::from_rgb888(0x60, 0x60, 0x60),
                2 => Pixel::from_rgb888(0xA0, 0xA0, 0xA0),
                _ => Pixel::WHITE,
            };
            if star.x < self.size.width && star.y < self.size.height {
                fb.set_pixel(star.x, star.y, color);
            }
        }

        let ship = self.ship();
        match sprite {
            Some(s) => {
                let at = Rect::new(ship.x, ship.y, s.width, s.height);
                fb.blit(&at, s.pixels);
            }
            None => {
                let (x, y) = (ship.x as i32, ship.y as i32);
                let (w, h) = (SHIP_WIDTH as i32, SHIP_HEIGHT as i32);
                let _ = Triangle::new(
                    Point::new(x + w / 2, y),
                    Point::new(x, y + h - 1),
                    Point::new(x + w - 1, y + h - 1),
                )
                .into_styled(PrimitiveStyle::with_fill(Rgb565::CYAN))
                .draw(fb);
            }
        }

        if let Some(b) = self.bullet {
            let _ = Rectangle::new(
                Point::new(b.x as i32, b.y),
                Size::new(BULLET_WIDTH as u32, BULLET_HEIGHT as u32),
            )
            .into_styled(PrimitiveStyle::with_fill(Rgb565::YELLOW))
            .draw(fb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL: PanelSize = PanelSize::new(320, 240);

    const FIRE: Controls = Controls { left: false, right: false, fire: true };
    const IDLE: Controls = Controls { left: false, right: false, fire: false };

    #[test]
    fn ship_is_clamped_to_the_panel() {
        let mut scene = Scene::new(PANEL, 1);
        for _ in 0..200 {
            scene.update(Controls { left: true, ..IDLE });
        }
        assert_eq!(scene.ship().x, 0);
        for _ in 0..200 {
            scene.update(Controls { right: true, ..IDLE });
        }
        assert_eq!(scene.ship().x, 320 - SHIP_WIDTH);
    }

    #[test]
    fn one_bullet_at_a_time_and_it_expires() {
        let mut scene = Scene::new(PANEL, 7);
        scene.update(FIRE);
        let first = scene.bullet().unwrap();
        assert_eq!(first.y, scene.ship().y as i32 - BULLET_HEIGHT as i32);

        scene.update(FIRE);
        assert_eq!(scene.bullet().unwrap().y, first.y - BULLET_SPEED);

        for _ in 0..100 {
            scene.update(IDLE);
        }
        assert_eq!(scene.bullet(), None);
    }

    #[test]
    fn stars_stay_on_screen_and_are_seeded() {
        let mut a = Scene::new(PANEL, 42);
        let b = Scene::new(PANEL, 42);
        assert_eq!(a.stars(), b.stars());
        for _ in 0..500 {
            a.update(IDLE);
            assert!(a.stars().iter().all(|s| s.x < 320 && s.y < 240));
        }
    }

    #[test]
    fn draw_places_sprite_and_bullet() {
        let size = PanelSize::new(64, 64);
        let mut px = vec![Pixel::BLACK; size.pixel_count()];
        let mut fb = FrameBuffer::new(&mut px, size).unwrap();
        let art = vec![Pixel::RED; (SHIP_WIDTH * SHIP_HEIGHT) as usize];
        let sprite = Sprite { width: SHIP_WIDTH, height: SHIP_HEIGHT, pixels: &art };

        let mut scene = Scene::new(size, 3);
        scene.update(FIRE);
        scene.draw(&mut fb, Some(&sprite));

        let ship = scene.ship();
        assert_eq!(fb.get_pixel(ship.x, ship.y), Some(Pixel::RED));
        assert_eq!(fb.get_pixel(ship.x + SHIP_WIDTH - 1, ship.y + SHIP_HEIGHT - 1), Some(Pixel::RED));
        let b = scene.bullet().unwrap();
        assert_eq!(fb.get_pixel(b.x, b.y as u16), Some(Pixel::YELLOW));
    }
}
