#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_net::StackResources;
use embassy_time::{Delay, Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::rng::Rng;
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_storage::FlashStorage;
use hearth_core::Dashboard;
use hearth_core::clock::TimeZone;
use hearth_core::drivers::xpt2046::Xpt2046;
use log::{LevelFilter, info, warn};
use static_cell::StaticCell;

// Display-LCD panel specific imports
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::spi::master::{Config, Spi};
use mipidsi::interface::SpiInterface;
use mipidsi::options::{ColorOrder, Orientation, Rotation};
use mipidsi::{Builder as MipidsiBuilder, models::ILI9341Rgb565};

use hearth_firmware::flash_settings::{FlashSettings, NVS_RANGE};
use hearth_firmware::shared::{self, LINK, NetworkClock};
use hearth_firmware::{time_sync, wifi, wifi_secrets};

/// Yield between loop iterations so the network tasks get scheduled
const LOOP_YIELD: Duration = Duration::from_millis(1);

static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!(LevelFilter::Info);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!(" Embassy initialized");

    let device_config = wifi_secrets::config();
    match TimeZone::parse(device_config.time.time_zone) {
        Ok(zone) => shared::set_time_zone(zone),
        Err(err) => warn!(
            " Time zone {:?} rejected ({}), clock stays on UTC",
            device_config.time.time_zone, err
        ),
    }

    // Network: radio, station credentials, IP stack and background tasks

    let radio = RADIO.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));
    let (mut wifi_controller, interfaces) =
        esp_radio::wifi::new(radio, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi controller");
    if let Err(err) = wifi::configure(&mut wifi_controller, &device_config.internet) {
        warn!(" WiFi configuration rejected: {:?}", err);
    }

    let rng = Rng::new();
    let seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::new()),
        seed,
    );

    spawner.spawn(wifi::net_task(runner)).unwrap();
    spawner
        .spawn(wifi::connection_task(wifi_controller, stack))
        .unwrap();
    spawner
        .spawn(time_sync::time_sync_task(stack, device_config.ntp_servers()))
        .unwrap();

    // Display: ILI9341 on HSPI, rotated to landscape

    // 1. Backlight on
    let _backlight = Output::new(peripherals.GPIO21, Level::High, OutputConfig::default());

    // 2. Configure SPI bus
    let display_spi = Spi::new(
        peripherals.SPI2,
        Config::default().with_frequency(Rate::from_mhz(40)),
    )
    .unwrap()
    .with_sck(peripherals.GPIO14)
    .with_mosi(peripherals.GPIO13)
    .with_miso(peripherals.GPIO12);

    // 3. Wrap the SPI bus as a SPI device (required by embedded-hal traits)
    let display_cs = Output::new(peripherals.GPIO15, Level::High, OutputConfig::default());
    let display_device = ExclusiveDevice::new_no_delay(display_spi, display_cs).unwrap();

    // 4. Set up DC (Data/Command) pin
    let dc = Output::new(peripherals.GPIO2, Level::Low, OutputConfig::default());

    // 5. Create a buffer for SPI batching (larger = faster, uses more RAM)
    let mut spi_buffer = [0u8; 512];

    // 6. Create display interface
    let di = SpiInterface::new(display_device, dc, &mut spi_buffer);

    // 7. Build and initialize the display driver
    let mut display = MipidsiBuilder::new(ILI9341Rgb565, di)
        .orientation(Orientation::new().rotate(Rotation::Deg270).flip_horizontal())
        .color_order(ColorOrder::Bgr)
        .init(&mut Delay)
        .expect("Failed to initialize display");

    info!(" Display initialized");

    // Touch: XPT2046 on VSPI with its pen IRQ line

    let touch_spi = Spi::new(
        peripherals.SPI3,
        Config::default().with_frequency(Rate::from_mhz(2)),
    )
    .unwrap()
    .with_sck(peripherals.GPIO25)
    .with_mosi(peripherals.GPIO32)
    .with_miso(peripherals.GPIO22);
    let touch_cs = Output::new(peripherals.GPIO33, Level::High, OutputConfig::default());
    let touch_device = ExclusiveDevice::new(touch_spi, touch_cs, Delay).unwrap();
    let touch_irq = Input::new(
        peripherals.GPIO23,
        InputConfig::default().with_pull(Pull::Up),
    );
    let mut touch = Xpt2046::new(touch_device, touch_irq);

    // Settings and the dashboard itself

    let settings = FlashSettings::new(FlashStorage::new(peripherals.FLASH), NVS_RANGE);
    let mut clock = NetworkClock;
    let mut dashboard = Dashboard::new(settings, shared::now_tick());

    if let Err(err) = dashboard.start(shared::now_tick(), &mut clock, &LINK, &mut display) {
        warn!(" Initial draw failed: {:?}", err);
    }
    info!(" Dashboard started");

    loop {
        let touch_sample = match touch.sample() {
            Ok(sample) => sample,
            Err(err) => {
                warn!(" Touch read failed: {:?}", err);
                None
            }
        };

        if let Err(err) = dashboard.tick(
            shared::now_tick(),
            touch_sample,
            &mut clock,
            &LINK,
            &mut display,
        ) {
            warn!(" Draw failed: {:?}", err);
        }

        Timer::after(LOOP_YIELD).await;
    }
}
