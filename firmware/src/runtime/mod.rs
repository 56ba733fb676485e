use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Pull;
use embassy_stm32::i2c::{self, I2c};

use dcf77_core::commit::restore_clock;

use crate::rtc::BackupRtc;
use crate::status;
use crate::telemetry;

mod capture_task;
mod decoder_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        EXTI0,
        I2C1,
        PB6,
        PB7,
        ..
    } = hal::init(config);

    // receiver output: high while the carrier is reduced
    let receiver = ExtiInput::new(PA0, EXTI0, Pull::None);
    let bus = I2c::new_blocking(I2C1, PB6, PB7, i2c::Config::default());
    let mut rtc = BackupRtc::new(bus);
    if let Err(error) = rtc.start() {
        telemetry::log_start_failure(&error);
    }
    telemetry::log_restore(&restore_clock(&mut rtc, &status::CLOCK));

    spawner
        .spawn(capture_task::run(receiver))
        .expect("failed to spawn capture task");

    spawner
        .spawn(decoder_task::run(rtc))
        .expect("failed to spawn decoder task");

    core::future::pending::<()>().await;
}
