#![cfg_attr(not(test), no_std)]

pub mod bmp;
pub mod config;
pub mod error;
pub mod flip;
pub mod framebuffer;
pub mod geometry;
pub mod init;
pub mod lcd;
pub mod pixel;
pub mod scene;
pub mod streamer;
pub mod tick;
pub mod transport;
pub mod window;

#[cfg(feature = "esp32s3")]
pub mod display;
#[cfg(feature = "esp32s3")]
pub mod input;
#[cfg(feature = "esp32s3")]
pub mod wiring;

#[cfg(test)]
mod mock;

pub use config::{BufferMode, PanelConfig, PanelModel};
pub use error::{ConfigError, PanelError, TransportError};
pub use flip::{FlipController, Slot};
pub use framebuffer::FrameBuffer;
pub use geometry::{PanelSize, Rect};
pub use lcd::Lcd;
pub use pixel::Pixel;
pub use transport::{PanelTransport, SpiTransport};
