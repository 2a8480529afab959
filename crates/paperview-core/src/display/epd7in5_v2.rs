//! Waveshare 7.5" V2 (800x480) e-paper driver over `embedded-hal` 1.0.
//!
//! Blocking; the adapter runs every call on the blocking pool.
//!
//! The BUSY line is active low on this controller: low means the panel is
//! still processing the last command.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use crate::config::PanelMode;
use crate::display::{DisplayError, FrameBuffer, PanelDevice, Rect};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 480;

/// Upper bound on a single busy wait. A full refresh takes about 4 seconds.
const BUSY_TIMEOUT_MS: u32 = 30_000;
const BUSY_POLL_MS: u32 = 10;

/// Largest chunk handed to the SPI device in one transfer (spidev limit).
const SPI_CHUNK: usize = 4096;

mod cmd {
    pub const PANEL_SETTING: u8 = 0x00;
    pub const POWER_SETTING: u8 = 0x01;
    pub const POWER_OFF: u8 = 0x02;
    pub const POWER_ON: u8 = 0x04;
    pub const BOOSTER_SOFT_START: u8 = 0x06;
    pub const DEEP_SLEEP: u8 = 0x07;
    pub const DATA_START_OLD: u8 = 0x10;
    pub const DISPLAY_REFRESH: u8 = 0x12;
    pub const DATA_START_NEW: u8 = 0x13;
    pub const DUAL_SPI: u8 = 0x15;
    pub const VCOM_DATA_INTERVAL: u8 = 0x50;
    pub const TCON_SETTING: u8 = 0x60;
    pub const RESOLUTION: u8 = 0x61;
    pub const GET_STATUS: u8 = 0x71;
    pub const PARTIAL_WINDOW: u8 = 0x90;
    pub const PARTIAL_IN: u8 = 0x91;
    pub const CASCADE_SETTING: u8 = 0xE0;
    pub const FORCE_TEMPERATURE: u8 = 0xE5;
}

/// Panel driver. Generic over SPI, the DC/RST outputs, the BUSY input and a
/// delay provider.
pub struct Epd7in5V2<SPI, DC, RST, BUSY, DELAY> {
    spi: SPI,
    dc: DC,
    rst: RST,
    busy: BUSY,
    delay: DELAY,
    released: bool,
}

impl<SPI, DC, RST, BUSY, DELAY> Epd7in5V2<SPI, DC, RST, BUSY, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    DELAY: DelayNs,
{
    pub fn new(spi: SPI, dc: DC, rst: RST, busy: BUSY, delay: DELAY) -> Self {
        Self {
            spi,
            dc,
            rst,
            busy,
            delay,
            released: false,
        }
    }

    fn ensure_open(&self) -> Result<(), DisplayError> {
        if self.released {
            Err(DisplayError::Released)
        } else {
            Ok(())
        }
    }

    fn reset(&mut self) -> Result<(), DisplayError> {
        self.rst.set_high().map_err(gpio_err)?;
        self.delay.delay_ms(20);
        self.rst.set_low().map_err(gpio_err)?;
        self.delay.delay_ms(2);
        self.rst.set_high().map_err(gpio_err)?;
        self.delay.delay_ms(20);
        Ok(())
    }

    fn command(&mut self, command: u8) -> Result<(), DisplayError> {
        self.dc.set_low().map_err(gpio_err)?;
        self.spi.write(&[command]).map_err(spi_err)
    }

    fn data(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        self.dc.set_high().map_err(gpio_err)?;
        for chunk in data.chunks(SPI_CHUNK) {
            self.spi.write(chunk).map_err(spi_err)?;
        }
        Ok(())
    }

    fn command_with(&mut self, command: u8, data: &[u8]) -> Result<(), DisplayError> {
        self.command(command)?;
        self.data(data)
    }

    fn wait_until_idle(&mut self) -> Result<(), DisplayError> {
        let mut waited = 0;
        loop {
            self.command(cmd::GET_STATUS)?;
            if self.busy.is_high().map_err(gpio_err)? {
                break;
            }
            if waited >= BUSY_TIMEOUT_MS {
                return Err(DisplayError::BusyTimeout {
                    waited_ms: u64::from(waited),
                });
            }
            self.delay.delay_ms(BUSY_POLL_MS);
            waited += BUSY_POLL_MS;
        }
        self.delay.delay_ms(20);
        Ok(())
    }

    fn turn_on_display(&mut self) -> Result<(), DisplayError> {
        self.command(cmd::DISPLAY_REFRESH)?;
        self.delay.delay_ms(100);
        self.wait_until_idle()
    }

    fn write_plane(&mut self, command: u8, fill: u8) -> Result<(), DisplayError> {
        let row = [fill; (WIDTH / 8) as usize];
        self.command(command)?;
        for _ in 0..HEIGHT {
            self.data(&row)?;
        }
        Ok(())
    }
}

impl<SPI, DC, RST, BUSY, DELAY> PanelDevice for Epd7in5V2<SPI, DC, RST, BUSY, DELAY>
where
    SPI: SpiDevice + Send + 'static,
    DC: OutputPin + Send + 'static,
    RST: OutputPin + Send + 'static,
    BUSY: InputPin + Send + 'static,
    DELAY: DelayNs + Send + 'static,
{
    fn width(&self) -> u32 {
        WIDTH
    }

    fn height(&self) -> u32 {
        HEIGHT
    }

    fn init(&mut self, mode: PanelMode) -> Result<(), DisplayError> {
        self.ensure_open()?;
        self.reset()?;

        match mode {
            PanelMode::Mono => {
                self.command_with(cmd::BOOSTER_SOFT_START, &[0x17, 0x17, 0x28, 0x17])?;
                self.command_with(cmd::POWER_SETTING, &[0x07, 0x07, 0x28, 0x17])?;
            }
            PanelMode::Gray4 => {
                self.command_with(cmd::POWER_SETTING, &[0x07, 0x07, 0x3F, 0x3F])?;
                self.command_with(cmd::BOOSTER_SOFT_START, &[0x17, 0x17, 0x28, 0x17])?;
            }
        }
        self.command(cmd::POWER_ON)?;
        self.delay.delay_ms(100);
        self.wait_until_idle()?;

        self.command_with(cmd::PANEL_SETTING, &[0x1F])?;
        // 800 x 480
        self.command_with(cmd::RESOLUTION, &[0x03, 0x20, 0x01, 0xE0])?;
        self.command_with(cmd::DUAL_SPI, &[0x00])?;
        self.command_with(cmd::VCOM_DATA_INTERVAL, &[0x10, 0x07])?;
        self.command_with(cmd::TCON_SETTING, &[0x22])
    }

    fn init_partial(&mut self) -> Result<(), DisplayError> {
        self.ensure_open()?;
        self.reset()?;
        self.command_with(cmd::PANEL_SETTING, &[0x1F])?;
        self.command(cmd::POWER_ON)?;
        self.delay.delay_ms(100);
        self.wait_until_idle()?;
        self.command_with(cmd::CASCADE_SETTING, &[0x02])?;
        self.command_with(cmd::FORCE_TEMPERATURE, &[0x6E])
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.ensure_open()?;
        self.write_plane(cmd::DATA_START_OLD, 0xFF)?;
        self.write_plane(cmd::DATA_START_NEW, 0x00)?;
        self.turn_on_display()
    }

    fn write_full(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        self.ensure_open()?;
        if frame.width() != WIDTH || frame.height() != HEIGHT {
            return Err(DisplayError::BitmapSizeMismatch {
                width: WIDTH,
                height: HEIGHT,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }

        // The new-data plane is inverted relative to the old-data plane.
        let inverted: Vec<u8> = frame.as_bytes().iter().map(|b| !b).collect();
        self.command_with(cmd::DATA_START_OLD, frame.as_bytes())?;
        self.command_with(cmd::DATA_START_NEW, &inverted)?;
        self.turn_on_display()
    }

    fn write_partial(&mut self, region: Rect, data: &[u8]) -> Result<(), DisplayError> {
        self.ensure_open()?;
        let x_end = region.x + region.width - 1;
        let y_end = region.y + region.height - 1;

        self.command_with(cmd::VCOM_DATA_INTERVAL, &[0xA9, 0x07])?;
        self.command(cmd::PARTIAL_IN)?;
        self.command_with(
            cmd::PARTIAL_WINDOW,
            &[
                (region.x >> 8) as u8,
                (region.x & 0xFF) as u8,
                (x_end >> 8) as u8,
                (x_end & 0xFF) as u8,
                (region.y >> 8) as u8,
                (region.y & 0xFF) as u8,
                (y_end >> 8) as u8,
                (y_end & 0xFF) as u8,
                0x01,
            ],
        )?;

        let inverted: Vec<u8> = data.iter().map(|b| !b).collect();
        self.command_with(cmd::DATA_START_NEW, &inverted)?;
        self.turn_on_display()
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        self.ensure_open()?;
        self.command_with(cmd::VCOM_DATA_INTERVAL, &[0xF7])?;
        self.command(cmd::POWER_OFF)?;
        self.wait_until_idle()?;
        self.command_with(cmd::DEEP_SLEEP, &[0xA5])?;
        self.delay.delay_ms(2000);
        Ok(())
    }

    fn release(&mut self) -> Result<(), DisplayError> {
        if self.released {
            return Ok(());
        }
        // Hold the controller in reset and drop DC so the lines idle low.
        let rst = self.rst.set_low().map_err(gpio_err);
        let dc = self.dc.set_low().map_err(gpio_err);
        self.released = true;
        rst.and(dc)
    }
}

fn spi_err<E: core::fmt::Debug>(error: E) -> DisplayError {
    DisplayError::Spi {
        message: format!("{error:?}"),
    }
}

fn gpio_err<E: core::fmt::Debug>(error: E) -> DisplayError {
    DisplayError::Gpio {
        message: format!("{error:?}"),
    }
}
