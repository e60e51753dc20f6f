//! Gateway node: SSD1306 bring-up with a once-a-second counter.
//!
//! Wiring: SDA on GPIO21, SCL on GPIO22. Panel at 0x3C, or 0x3D with SA0 high.

#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_time::Delay;
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use log::error;

use nodecheck::board;
use nodecheck_core::config::OledNodeConfig;
use nodecheck_core::counter::CounterLoop;
use nodecheck_core::diagnostics::LogSink;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    esp_println::println!("PANIC: {}", info);
    loop {}
}

esp_bootloader_esp_idf::esp_app_desc!();

const NODE: OledNodeConfig = OledNodeConfig::DEFAULT;

// The bus below is wired to GPIO21/GPIO22; keep the config in step.
const _: () = assert!(NODE.pins.sda == 21 && NODE.pins.scl == 22);

#[allow(
    clippy::large_stack_frames,
    reason = "the display frame buffer lives in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    board::init_logger();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let node = NODE;
    let i2c = board::create_i2c_bus(
        peripherals.I2C0,
        peripherals.GPIO21,
        peripherals.GPIO22,
        node.bus_frequency_khz,
    );

    let mut delay = Delay;
    let mut sink = LogSink;
    match CounterLoop::start(i2c, node, &mut delay, &mut sink).await {
        Ok(mut counter) => counter.run(&mut delay, &mut sink).await,
        Err(e) => {
            error!("{}", e);
            board::halt().await
        }
    }
}
