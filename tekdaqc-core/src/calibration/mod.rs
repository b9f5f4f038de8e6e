//! Calibration and board temperature
//!
//! - [`table`]: persisted gain correction factors and calibration sessions
//! - [`temperature`]: board temperature monitor and its validity window
//! - [`encoding`]: float to word-pair encoding for the NV store
//!
//! The two ADC routines below only drive the converter; whether the result
//! is any good is decided later from the temperature history.

pub mod encoding;
pub mod table;
pub mod temperature;

pub use table::{CalibrationTable, NEUTRAL_GAIN};
pub use temperature::{code_to_celsius, BoardTemperature, CalibrationWindow};

use crate::errors::{FunctionError, FunctionResult};
use crate::settings::{BufferSetting, Gain, Rate};
use crate::traits::AdcDriver;

/// ADC settings applied before a conversion or calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AcquisitionParams {
    /// Output data rate
    pub rate: Rate,
    /// PGA gain
    pub gain: Gain,
    /// Input buffer
    pub buffer: BufferSetting,
}

impl AcquisitionParams {
    /// Bundle the three settings
    pub const fn new(rate: Rate, gain: Gain, buffer: BufferSetting) -> Self {
        Self { rate, gain, buffer }
    }

    /// Push the settings to the converter
    pub fn apply<A: AdcDriver>(&self, adc: &mut A) -> FunctionResult<()> {
        adc.configure(self.rate, self.gain, self.buffer)
            .map_err(|_err| adc_fault("configure", _err))
    }
}

/// Run the converter's self offset calibration
pub fn compute_system_offset_calibration<A: AdcDriver>(adc: &mut A) -> FunctionResult<()> {
    adc.self_calibrate()
        .map_err(|_err| adc_fault("self calibration", _err))?;
    log_info!("system offset calibration complete");
    Ok(())
}

/// Apply `params` then run a system gain calibration on the selected input
///
/// The caller routes the reference input through the mux first.
pub fn compute_gain_calibration<A: AdcDriver>(
    adc: &mut A,
    params: AcquisitionParams,
) -> FunctionResult<()> {
    params.apply(adc)?;
    adc.sync().map_err(|_err| adc_fault("sync", _err))?;
    adc.system_gain_calibrate()
        .map_err(|_err| adc_fault("gain calibration", _err))?;
    log_info!(
        "gain calibration complete at {} SPS, {}, buffer {}",
        params.rate,
        params.gain,
        params.buffer
    );
    Ok(())
}

/// Contents of the converter's gain calibration register
pub fn read_gain_calibration<A: AdcDriver>(adc: &mut A) -> FunctionResult<u32> {
    adc.gain_calibration_register()
        .map_err(|_err| adc_fault("gain register read", _err))
}

fn adc_fault<E: core::fmt::Debug>(_step: &str, _err: E) -> FunctionError {
    log_error!("ADC {} failed: {:?}", _step, _err);
    FunctionError::AdcFault
}
