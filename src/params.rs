//! Modifier parameters
//!
//! The flat, named parameter table driving the modifier chain. All writes go
//! through [`ModifierParameters::set`], which validates the value and keeps
//! the partial Fourier / scan percentage exclusivity rule.

use std::fmt;
use std::str::FromStr;

use crate::acquisition::FillMode;
use crate::error::{KspaceError, Result};

/// Noise injection is disabled at (and only at) this SNR
pub const NOISE_OFF_SNR: f64 = 30.0;
pub const MIN_SNR: f64 = -30.0;
pub const MAX_UNDERSAMPLE: usize = 16;
pub const MIN_KSPACE_SCALE: i32 = -10;
pub const MAX_KSPACE_SCALE: i32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parameter {
    Hamming,
    PartialFourier,
    ZeroFill,
    NoiseSnr,
    ScanPercentage,
    HighPass,
    LowPass,
    Undersample,
    Compress,
    DecreaseDc,
    KspaceScale,
    Filling,
    FillingMode,
}

impl Parameter {
    pub const ALL: [Parameter; 13] = [
        Parameter::Hamming,
        Parameter::PartialFourier,
        Parameter::ZeroFill,
        Parameter::NoiseSnr,
        Parameter::ScanPercentage,
        Parameter::HighPass,
        Parameter::LowPass,
        Parameter::Undersample,
        Parameter::Compress,
        Parameter::DecreaseDc,
        Parameter::KspaceScale,
        Parameter::Filling,
        Parameter::FillingMode,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Hamming => "hamming",
            Parameter::PartialFourier => "partial_fourier",
            Parameter::ZeroFill => "zero_fill",
            Parameter::NoiseSnr => "noise_snr",
            Parameter::ScanPercentage => "scan_percentage",
            Parameter::HighPass => "high_pass",
            Parameter::LowPass => "low_pass",
            Parameter::Undersample => "undersample",
            Parameter::Compress => "compress",
            Parameter::DecreaseDc => "decrease_dc",
            Parameter::KspaceScale => "kspace_scale",
            Parameter::Filling => "filling",
            Parameter::FillingMode => "filling_mode",
        }
    }

    fn is_flag(&self) -> bool {
        matches!(self, Parameter::Hamming | Parameter::ZeroFill | Parameter::Compress)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Parameter {
    type Err = KspaceError;

    fn from_str(s: &str) -> Result<Self> {
        Parameter::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| KspaceError::invalid(s, "unknown parameter"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParameterValue {
    Flag(bool),
    Number(f64),
    Mode(FillMode),
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        ParameterValue::Flag(v)
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        ParameterValue::Number(v)
    }
}

impl From<FillMode> for ParameterValue {
    fn from(v: FillMode) -> Self {
        ParameterValue::Mode(v)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModifierParameters {
    pub hamming: bool,
    /// Percentage of the removable lower half that is acquired (100 = off)
    pub partial_fourier: f64,
    pub zero_fill: bool,
    /// Target SNR in dB; `NOISE_OFF_SNR` disables noise
    pub noise_snr: f64,
    pub scan_percentage: f64,
    /// Radius of the removed central disk, percent of half the diagonal
    pub high_pass: f64,
    /// Radius of the kept central disk, percent of half the diagonal
    pub low_pass: f64,
    /// Acceleration factor (1 = fully sampled)
    pub undersample: usize,
    pub compress: bool,
    pub decrease_dc: f64,
    /// K-space display scaling exponent (10^kspace_scale)
    pub kspace_scale: i32,
    /// Acquisition progress in percent
    pub filling: f64,
    pub filling_mode: FillMode,
    /// Seed of the current noise realisation
    pub noise_seed: u64,
}

impl Default for ModifierParameters {
    fn default() -> Self {
        Self {
            hamming: false,
            partial_fourier: 100.0,
            zero_fill: false,
            noise_snr: NOISE_OFF_SNR,
            scan_percentage: 100.0,
            high_pass: 0.0,
            low_pass: 100.0,
            undersample: 1,
            compress: false,
            decrease_dc: 0.0,
            kspace_scale: -3,
            filling: 100.0,
            filling_mode: FillMode::Linear,
            noise_seed: 0,
        }
    }
}

impl ModifierParameters {
    /// Validate and apply one parameter change
    ///
    /// On error the previous value is kept.
    pub fn set(&mut self, param: Parameter, value: impl Into<ParameterValue>) -> Result<()> {
        let value = value.into();
        let name = param.name();

        if param.is_flag() {
            let flag = match value {
                ParameterValue::Flag(b) => b,
                other => return Err(KspaceError::invalid(name, format!("expected a flag, got {:?}", other))),
            };
            match param {
                Parameter::Hamming => self.hamming = flag,
                Parameter::ZeroFill => self.zero_fill = flag,
                _ => self.compress = flag,
            }
            return Ok(());
        }

        if param == Parameter::FillingMode {
            self.filling_mode = match value {
                ParameterValue::Mode(m) => m,
                ParameterValue::Number(n) => mode_from_number(n)?,
                ParameterValue::Flag(_) => return Err(KspaceError::invalid(name, "expected a fill mode")),
            };
            return Ok(());
        }

        let number = match value {
            ParameterValue::Number(n) if n.is_finite() => n,
            other => return Err(KspaceError::invalid(name, format!("expected a finite number, got {:?}", other))),
        };

        match param {
            Parameter::PartialFourier => {
                check_range(name, number, 0.0, 100.0)?;
                if number < 100.0 && self.scan_percentage < 100.0 {
                    return Err(KspaceError::invalid(name, "disabled while scan_percentage is below 100"));
                }
                self.partial_fourier = number;
            }
            Parameter::ScanPercentage => {
                check_range(name, number, 0.0, 100.0)?;
                if number < 100.0 && self.partial_fourier < 100.0 {
                    return Err(KspaceError::invalid(name, "disabled while partial_fourier is below 100"));
                }
                self.scan_percentage = number;
            }
            Parameter::NoiseSnr => {
                check_range(name, number, MIN_SNR, NOISE_OFF_SNR)?;
                if number != self.noise_snr {
                    self.noise_seed = self.noise_seed.wrapping_add(1);
                }
                self.noise_snr = number;
            }
            Parameter::HighPass => {
                check_range(name, number, 0.0, 100.0)?;
                self.high_pass = number;
            }
            Parameter::LowPass => {
                check_range(name, number, 0.0, 100.0)?;
                self.low_pass = number;
            }
            Parameter::Undersample => {
                check_integer(name, number)?;
                check_range(name, number, 1.0, MAX_UNDERSAMPLE as f64)?;
                self.undersample = number as usize;
            }
            Parameter::DecreaseDc => {
                check_range(name, number, 0.0, 100.0)?;
                self.decrease_dc = number;
            }
            Parameter::KspaceScale => {
                check_integer(name, number)?;
                check_range(name, number, MIN_KSPACE_SCALE as f64, MAX_KSPACE_SCALE as f64)?;
                self.kspace_scale = number as i32;
            }
            Parameter::Filling => {
                check_range(name, number, 0.0, 100.0)?;
                self.filling = number;
            }
            _ => return Err(KspaceError::invalid(name, "not a numeric parameter")),
        }
        Ok(())
    }

    /// Set a parameter from its name and a plain number
    ///
    /// Flags take 0/1, the fill mode takes its index (0 linear, 1 centric,
    /// 2 single-shot EPI blipped).
    pub fn set_by_name(&mut self, name: &str, value: f64) -> Result<()> {
        let param: Parameter = name.parse()?;
        if param.is_flag() {
            let flag = if value == 0.0 {
                false
            } else if value == 1.0 {
                true
            } else {
                return Err(KspaceError::invalid(name, format!("flags take 0 or 1, got {}", value)));
            };
            return self.set(param, flag);
        }
        self.set(param, value)
    }

    /// Whether the UI control for `param` is currently usable
    pub fn is_enabled(&self, param: Parameter) -> bool {
        match param {
            Parameter::PartialFourier => self.scan_percentage >= 100.0,
            Parameter::ScanPercentage => self.partial_fourier >= 100.0,
            Parameter::ZeroFill => self.partial_fourier < 100.0,
            Parameter::Compress => self.undersample > 1,
            _ => true,
        }
    }

    /// Start a new noise realisation without changing the SNR
    pub fn reseed_noise(&mut self) {
        self.noise_seed = self.noise_seed.wrapping_add(1);
    }

    /// Multiplier applied to k-space magnitudes before log compression
    pub fn kspace_display_factor(&self) -> f64 {
        10f64.powi(self.kspace_scale)
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value < min || value > max {
        return Err(KspaceError::invalid(
            name,
            format!("must be within {}..={}, got {}", min, max, value),
        ));
    }
    Ok(())
}

fn check_integer(name: &str, value: f64) -> Result<()> {
    if value.fract() != 0.0 {
        return Err(KspaceError::invalid(name, format!("must be an integer, got {}", value)));
    }
    Ok(())
}

fn mode_from_number(n: f64) -> Result<FillMode> {
    if n.fract() == 0.0 && n >= 0.0 {
        if let Some(mode) = FillMode::from_index(n as usize) {
            return Ok(mode);
        }
    }
    Err(KspaceError::invalid("filling_mode", format!("unknown fill mode {}", n)))
}
