use image::GrayImage;
use imageproc::{contrast::equalize_histogram, filter::separable_filter_equal};
use ndarray::Array1;

/// Side length of the smoothing kernel.
pub const SMOOTHING_KERNEL_SIZE: usize = 3;

/// Normalize illumination and suppress pixel noise before projection.
///
/// Histogram equalization followed by a small Gaussian blur. The output has
/// the same dimensions as the input.
pub fn preprocess(img: &GrayImage) -> GrayImage {
    if img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    smooth(&equalize(img))
}

/// Remap intensities so their cumulative distribution is roughly uniform.
pub fn equalize(img: &GrayImage) -> GrayImage {
    if img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    equalize_histogram(img)
}

/// Separable Gaussian blur with a sigma derived from the kernel size.
pub fn smooth(img: &GrayImage) -> GrayImage {
    let kernel = gaussian_kernel(SMOOTHING_KERNEL_SIZE, 0.0);
    separable_filter_equal(img, &kernel)
}

/// Row-major intensities of `img` as a single feature row.
pub fn flatten(img: &GrayImage) -> Array1<f64> {
    img.as_raw().iter().map(|&p| f64::from(p)).collect()
}

/// Sampled, normalized 1-D Gaussian of odd length `size`.
///
/// A non-positive `sigma` is derived from `size`: `0.3 * ((size - 1) / 2 - 1) + 0.8`.
fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let center = (size / 2) as f32;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - center;
            (-(x * x) / two_sigma_sq).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for w in kernel.iter_mut() {
        *w /= sum;
    }
    kernel
}
