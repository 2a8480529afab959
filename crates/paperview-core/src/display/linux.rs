//! Panel construction on Linux spidev + GPIO character devices.

use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{CdevPin, Delay, SpidevDevice};
use tracing::info;

use crate::config::DisplayConfig;
use crate::display::DisplayError;
use crate::display::epd7in5_v2::Epd7in5V2;

const SPI_SPEED_HZ: u32 = 4_000_000;
const CONSUMER: &str = "paperview";

pub type LinuxPanel = Epd7in5V2<SpidevDevice, CdevPin, CdevPin, CdevPin, Delay>;

/// Open the SPI device and claim the RST/DC/BUSY lines.
///
/// # Errors
///
/// Returns [`DisplayError::DeviceOpen`] naming the device or line that failed.
pub fn open_panel(config: &DisplayConfig) -> Result<LinuxPanel, DisplayError> {
    let spi_err = |e: &dyn std::fmt::Display| DisplayError::DeviceOpen {
        device: config.spi_device.clone(),
        message: e.to_string(),
    };
    let mut spi = SpidevDevice::open(&config.spi_device).map_err(|e| spi_err(&e))?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(SPI_SPEED_HZ)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.configure(&options).map_err(|e| spi_err(&e))?;

    let mut chip = Chip::new(&config.gpio_chip).map_err(|e| DisplayError::DeviceOpen {
        device: config.gpio_chip.clone(),
        message: e.to_string(),
    })?;

    let rst = request_line(&mut chip, config, config.rst_pin, LineRequestFlags::OUTPUT, 1)?;
    let dc = request_line(&mut chip, config, config.dc_pin, LineRequestFlags::OUTPUT, 0)?;
    let busy = request_line(&mut chip, config, config.busy_pin, LineRequestFlags::INPUT, 0)?;

    info!(
        event = "core.display.device_opened",
        spi = %config.spi_device,
        gpio_chip = %config.gpio_chip,
        rst = config.rst_pin,
        dc = config.dc_pin,
        busy = config.busy_pin,
    );

    Ok(Epd7in5V2::new(spi, dc, rst, busy, Delay))
}

fn request_line(
    chip: &mut Chip,
    config: &DisplayConfig,
    offset: u32,
    flags: LineRequestFlags,
    default: u8,
) -> Result<CdevPin, DisplayError> {
    let device = format!("{} line {}", config.gpio_chip, offset);
    let line = chip.get_line(offset).map_err(|e| DisplayError::DeviceOpen {
        device: device.clone(),
        message: e.to_string(),
    })?;
    let handle = line
        .request(flags, default, CONSUMER)
        .map_err(|e| DisplayError::DeviceOpen {
            device: device.clone(),
            message: e.to_string(),
        })?;
    CdevPin::new(handle).map_err(|e| DisplayError::DeviceOpen {
        device,
        message: e.to_string(),
    })
}
