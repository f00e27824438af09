//! Low-pass filtering of sweep buffers.
//!
//! The primary transform is a Gaussian-kernel low-pass whose kernel width is
//! derived from the -3 dB criterion: the frequency response of a Gaussian
//! with time-domain sigma `sqrt(ln 2) / (2*pi*fc)` is exactly 1/sqrt(2) at
//! `fc`. Butterworth IIR variants are provided for callers that want the
//! steeper rolloff, using cascaded biquad sections.
//!
//! All functions here are pure; the cumulative filter history lives in
//! [`crate::session::FilterState`].

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type, Q_BUTTERWORTH_F64};
use tracing::debug;

use super::region::Region;
use super::types::{AnalysisError, AnalysisResult};

/// Gaussian kernel standard deviation, in samples, for a given cutoff.
///
/// `sigma_secs = sqrt(ln 2) / (2*pi*cutoff_hz)` places the -3 dB point of
/// the filter's frequency response at `cutoff_hz`; multiplying by the sample
/// rate converts to samples (~= 0.1325 * rate / cutoff).
pub fn gaussian_sigma_samples(sample_rate: f64, cutoff_hz: f64) -> f64 {
    (2.0f64.ln().sqrt() / (2.0 * std::f64::consts::PI)) * sample_rate / cutoff_hz
}

/// Reject cutoff/sample-rate combinations the filters cannot realize.
fn validate_cutoff(sample_rate: f64, cutoff_hz: f64) -> AnalysisResult<()> {
    if sample_rate <= 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "sample rate must be positive, got {sample_rate}"
        )));
    }
    if cutoff_hz <= 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "cutoff must be positive, got {cutoff_hz} Hz"
        )));
    }
    let nyquist = sample_rate / 2.0;
    if cutoff_hz >= nyquist {
        return Err(AnalysisError::InvalidParameter(format!(
            "cutoff {cutoff_hz} Hz >= Nyquist {nyquist} Hz"
        )));
    }
    Ok(())
}

/// Apply a Gaussian low-pass filter to the whole buffer.
///
/// Edges are handled with reflect padding so the output has the same length
/// as the input and no zero-padding artifacts.
pub fn gaussian_lowpass(
    samples: &[f64],
    sample_rate: f64,
    cutoff_hz: f64,
) -> AnalysisResult<Vec<f64>> {
    validate_cutoff(sample_rate, cutoff_hz)?;
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let sigma = gaussian_sigma_samples(sample_rate, cutoff_hz);
    debug!(cutoff_hz, sigma_samples = sigma, "applying Gaussian low-pass");
    Ok(convolve_gaussian(samples, sigma))
}

/// Apply a Gaussian low-pass filter to one region of the buffer.
///
/// Only samples inside `region` are replaced; everything else is returned
/// untouched. The filtered segment is padded with up to `6*sigma + 10` real
/// neighboring samples before filtering so the region boundary shows no
/// discontinuity beyond the filter's own smoothing.
pub fn gaussian_lowpass_region(
    samples: &[f64],
    sample_rate: f64,
    cutoff_hz: f64,
    region: &Region,
) -> AnalysisResult<Vec<f64>> {
    validate_cutoff(sample_rate, cutoff_hz)?;
    // Validates the region against this buffer as a side effect.
    region.slice(samples)?;

    let sigma = gaussian_sigma_samples(sample_rate, cutoff_hz);
    let padding_wanted = (6.0 * sigma) as usize + 10;

    let start = region.start();
    let end_excl = region.end() + 1;
    let pad_left = padding_wanted.min(start);
    let pad_right = padding_wanted.min(samples.len() - end_excl);

    let padded = &samples[start - pad_left..end_excl + pad_right];
    let filtered_padded = convolve_gaussian(padded, sigma);

    let mut out = samples.to_vec();
    out[start..end_excl].copy_from_slice(&filtered_padded[pad_left..pad_left + region.len()]);

    debug!(
        cutoff_hz,
        start,
        end = region.end(),
        pad_left,
        pad_right,
        "applied Gaussian low-pass to region"
    );
    Ok(out)
}

/// Discrete Gaussian convolution with reflect padding, kernel truncated at
/// 4 sigma.
fn convolve_gaussian(samples: &[f64], sigma: f64) -> Vec<f64> {
    let radius = ((4.0 * sigma).ceil() as usize).max(1);

    let mut kernel = Vec::with_capacity(2 * radius + 1);
    let denom = 2.0 * sigma * sigma;
    for offset in -(radius as isize)..=(radius as isize) {
        let x = offset as f64;
        kernel.push((-x * x / denom).exp());
    }
    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }

    let n = samples.len() as isize;
    (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, &w)| {
                    let j = i + k as isize - radius as isize;
                    w * samples[reflect_index(j, n)]
                })
                .sum()
        })
        .collect()
}

/// Mirror an out-of-range index back into `[0, n)` (reflect mode: the edge
/// sample is repeated, `-1 -> 0`, `n -> n-1`).
fn reflect_index(mut i: isize, n: isize) -> usize {
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - 1 - i;
        } else {
            return i as usize;
        }
    }
}

/// Apply a Butterworth low-pass filter using cascaded biquad sections.
pub fn butterworth_lowpass(
    samples: &[f64],
    sample_rate: f64,
    cutoff_hz: f64,
    order: usize,
) -> AnalysisResult<Vec<f64>> {
    validate_cutoff(sample_rate, cutoff_hz)?;
    run_biquad_cascade(samples, sample_rate, cutoff_hz, order, Type::LowPass)
}

/// Apply a Butterworth high-pass filter using cascaded biquad sections.
pub fn butterworth_highpass(
    samples: &[f64],
    sample_rate: f64,
    cutoff_hz: f64,
    order: usize,
) -> AnalysisResult<Vec<f64>> {
    validate_cutoff(sample_rate, cutoff_hz)?;
    run_biquad_cascade(samples, sample_rate, cutoff_hz, order, Type::HighPass)
}

/// Apply a Butterworth band-pass filter (high-pass then low-pass, each with
/// half the requested order).
pub fn butterworth_bandpass(
    samples: &[f64],
    sample_rate: f64,
    low_cutoff_hz: f64,
    high_cutoff_hz: f64,
    order: usize,
) -> AnalysisResult<Vec<f64>> {
    if low_cutoff_hz >= high_cutoff_hz {
        return Err(AnalysisError::InvalidParameter(format!(
            "band-pass low cutoff {low_cutoff_hz} Hz >= high cutoff {high_cutoff_hz} Hz"
        )));
    }
    let half_order = order.div_ceil(2);
    let high_passed = butterworth_highpass(samples, sample_rate, low_cutoff_hz, half_order)?;
    butterworth_lowpass(&high_passed, sample_rate, high_cutoff_hz, half_order)
}

fn run_biquad_cascade(
    samples: &[f64],
    sample_rate: f64,
    cutoff_hz: f64,
    order: usize,
    filter_type: Type<f64>,
) -> AnalysisResult<Vec<f64>> {
    if order == 0 {
        return Err(AnalysisError::InvalidParameter(
            "filter order must be at least 1".into(),
        ));
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let coeffs = Coefficients::<f64>::from_params(
        filter_type,
        sample_rate.hz(),
        cutoff_hz.hz(),
        Q_BUTTERWORTH_F64,
    )
    .map_err(|e| {
        AnalysisError::InvalidParameter(format!(
            "cannot build biquad coefficients for {cutoff_hz} Hz at {sample_rate} Hz: {e:?}"
        ))
    })?;

    // A biquad is second order; cascade enough sections to reach the
    // requested order.
    let num_sections = order.div_ceil(2).max(1);
    let mut result = samples.to_vec();
    for _ in 0..num_sections {
        let mut section = DirectForm2Transposed::<f64>::new(coeffs);
        for sample in &mut result {
            *sample = section.run(*sample);
        }
    }
    Ok(result)
}
