//! Bulb protocol controller

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::{BulbError, Result};

const DEFAULT_PORT: u16 = 5577;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the TCP connection to the bulb and clamps brightness to the
/// configured floor before writing color frames.
pub struct BulbController {
    addr: String,
    min_brightness: u8,
    stream: Option<TcpStream>,
}

impl BulbController {
    pub fn new(addr: &str, min_brightness: u8) -> Self {
        Self {
            addr: normalize_addr(addr),
            min_brightness,
            stream: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// One connection attempt; failure is reported, not retried.
    pub async fn connect(&mut self) -> Result<()> {
        let connect = TcpStream::connect(&self.addr);
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, connect)
            .await
            .map_err(|_| BulbError::Timeout)??;

        tracing::info!(addr = %self.addr, "Connected to bulb");
        self.stream = Some(stream);
        Ok(())
    }

    /// Push one color to the bulb. Brightness is raised to the floor and
    /// applied by scaling the channels.
    pub async fn set_color(&mut self, rgb: (u8, u8, u8), brightness: u8) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(BulbError::NotConnected)?;
        let brightness = brightness.max(self.min_brightness).min(100);
        let frame = color_frame(rgb, brightness);

        stream.write_all(&frame).await?;
        tracing::debug!(
            r = rgb.0,
            g = rgb.1,
            b = rgb.2,
            brightness,
            "Pushed color to bulb"
        );
        Ok(())
    }

    pub fn min_brightness(&self) -> u8 {
        self.min_brightness
    }
}

fn normalize_addr(addr: &str) -> String {
    if addr.contains(':') {
        addr.to_string()
    } else {
        format!("{addr}:{DEFAULT_PORT}")
    }
}

/// LEDENET color frame: command byte, scaled RGB, two reserved bytes, the
/// local-write marker, then an additive checksum.
fn color_frame(rgb: (u8, u8, u8), brightness: u8) -> [u8; 8] {
    let scale = |channel: u8| ((channel as u16 * brightness as u16) / 100) as u8;

    let mut frame = [
        0x31,
        scale(rgb.0),
        scale(rgb.1),
        scale(rgb.2),
        0x00,
        0x00,
        0x0f,
        0x00,
    ];
    frame[7] = frame[..7].iter().fold(0u8, |sum, b| sum.wrapping_add(*b));
    frame
}
