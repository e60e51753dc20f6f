//! Sensor node: MPU6050 bring-up with silent reconnection.
//!
//! Wiring: SDA on GPIO22, SCL on GPIO21.

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
use nodecheck_core::config::ImuNodeConfig;
use nodecheck_core::diagnostics::LogSink;
use nodecheck_core::monitor::ReconnectMonitor;
use nodecheck_core::sensors::Mpu6050;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    esp_println::println!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

const NODE: ImuNodeConfig = ImuNodeConfig::DEFAULT;

// The bus below is wired to GPIO22/GPIO21; keep the config in step.
const _: () = assert!(NODE.pins.sda == 22 && NODE.pins.scl == 21);

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
        peripherals.GPIO22,
        peripherals.GPIO21,
        node.bus_frequency_khz,
    );

    let mut delay = Delay;
    let mut sink = LogSink;
    match ReconnectMonitor::start(Mpu6050::new(i2c, Delay), node, &mut delay, &mut sink).await {
        Ok(mut monitor) => monitor.run(&mut delay, &mut sink).await,
        Err(e) => {
            error!("{}", e);
            board::halt().await
        }
    }
}
