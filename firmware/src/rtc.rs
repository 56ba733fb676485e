#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! DS1307 backup clock behind the decoder's RTC seams.
//!
//! Register access is left to the `ds1307` driver; this module only converts
//! between the decoder's two-digit timestamps and `chrono` date-times.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use dcf77_core::commit::{RtcReader, RtcTimestamp, RtcWriter};
use ds1307::{DateTimeAccess, Ds1307, Error};
use embedded_hal::i2c::I2c;

/// The DS1307 keeps a two-digit year.
const CENTURY: i32 = 2000;

pub struct BackupRtc<I2C> {
    device: Ds1307<I2C>,
}

impl<I2C, E> BackupRtc<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(bus: I2C) -> Self {
        Self {
            device: Ds1307::new(bus),
        }
    }

    /// Clears the clock-halt flag so the oscillator keeps time.
    pub fn start(&mut self) -> Result<(), Error<E>> {
        self.device.set_running()
    }

    pub fn release(self) -> I2C {
        self.device.destroy()
    }
}

impl<I2C, E> RtcWriter for BackupRtc<I2C>
where
    I2C: I2c<Error = E>,
{
    type Error = Error<E>;

    fn write_time(&mut self, timestamp: &RtcTimestamp) -> Result<(), Self::Error> {
        let datetime = to_datetime(timestamp).ok_or(Error::InvalidInputData)?;
        self.device.set_datetime(&datetime)
    }
}

impl<I2C, E> RtcReader for BackupRtc<I2C>
where
    I2C: I2c<Error = E>,
{
    type Error = Error<E>;

    fn read_time(&mut self) -> Result<RtcTimestamp, Self::Error> {
        let datetime = self.device.datetime()?;
        from_datetime(&datetime).ok_or(Error::InvalidInputData)
    }
}

fn to_datetime(timestamp: &RtcTimestamp) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(
        CENTURY + i32::from(timestamp.year),
        u32::from(timestamp.month),
        u32::from(timestamp.day),
    )?
    .and_hms_opt(
        u32::from(timestamp.hour),
        u32::from(timestamp.minute),
        u32::from(timestamp.second),
    )
}

fn from_datetime(datetime: &NaiveDateTime) -> Option<RtcTimestamp> {
    let narrow = |value: u32| u8::try_from(value).ok();
    Some(RtcTimestamp {
        second: narrow(datetime.second())?,
        minute: narrow(datetime.minute())?,
        hour: narrow(datetime.hour())?,
        weekday: narrow(datetime.weekday().number_from_monday())?,
        day: narrow(datetime.day())?,
        month: narrow(datetime.month())?,
        year: u8::try_from(datetime.year().checked_sub(CENTURY)?)
            .ok()
            .filter(|year| *year <= 99)?,
    })
}
