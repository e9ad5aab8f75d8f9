use image::RgbaImage;
use tracing::debug;

use crate::{DiffError, DimensionPolicy};

/// Red added to a changed pixel whose red channel has headroom.
const ADD_RED: u8 = 60;

/// Blend factor toward the luminance gray for unchanged pixels.
const DESATURATION: f64 = 0.8;

/// Decoded RGBA raster, row-major, four bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, DiffError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4));
        if expected != Some(data.len()) {
            return Err(DiffError::MalformedBuffer {
                len: data.len(),
                width,
                height,
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn into_image(self) -> Result<RgbaImage, DiffError> {
        let (len, width, height) = (self.data.len(), self.width, self.height);
        RgbaImage::from_raw(width, height, self.data).ok_or(DiffError::MalformedBuffer {
            len,
            width,
            height,
        })
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
        }
    }
}

/// Pixel tallies from one comparison pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffCounts {
    pub diff_pixels: u64,
    pub total_pixels: u64,
}

impl DiffCounts {
    /// Changed pixels in channel-stride units (4 per pixel).
    pub fn diff_metric(&self) -> u64 {
        self.diff_pixels * 4
    }

    /// Percentage of changed pixels, rounded to two decimals.
    pub fn score(&self) -> f64 {
        diff_score(self.diff_metric(), self.total_pixels as usize * 4)
    }
}

pub struct PixelDiff {
    /// Composited diff raster with the dimensions of the larger input.
    pub image: PixelBuffer,
    /// 0.0 = identical, 100.0 = every pixel changed.
    pub score: f64,
    pub diff_pixels: u64,
    pub total_pixels: u64,
}

/// Shift a changed pixel's color toward red without overflowing.
pub fn redden(r: u8, g: u8, b: u8) -> [u8; 3] {
    match r.checked_add(ADD_RED) {
        Some(red) => [
            red,
            g.saturating_sub(ADD_RED / 3),
            b.saturating_sub(ADD_RED / 3),
        ],
        // No headroom left in red: pull green and blue down instead.
        None => [r, g.saturating_sub(ADD_RED), b.saturating_sub(ADD_RED)],
    }
}

/// Blend a pixel most of the way toward its luminance gray.
pub fn desaturate(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let intensity = 0.3 * r + 0.59 * g + 0.11 * b;
    let blend = |c: f64| (intensity * DESATURATION + c * (1.0 - DESATURATION)).floor() as u8;
    [blend(r), blend(g), blend(b)]
}

/// `round(metric / len * 10000) / 100`, half away from zero.
pub fn diff_score(diff_metric: u64, len: usize) -> f64 {
    if len == 0 {
        return 0.0;
    }
    // Multiply before dividing so exact halves stay exact.
    (diff_metric as f64 * 10_000.0 / len as f64).round() / 100.0
}

/// Compare two raw RGBA byte buffers and composite the diff.
///
/// The longer buffer is the iteration base and sizes the output. Changed
/// pixels are reddened from the other buffer's color; unchanged pixels are
/// desaturated from the base. Pixels of the base past the end of the other
/// buffer count as changed and are reddened from the base's own color.
/// Trailing bytes of a partial quad are copied through untouched.
pub fn compare_buffers(a: &[u8], b: &[u8]) -> (Vec<u8>, DiffCounts) {
    let (base, other) = if b.len() > a.len() { (b, a) } else { (a, b) };

    let mut out = base.to_vec();
    let mut counts = DiffCounts::default();

    for (i, (src, dst)) in base
        .chunks_exact(4)
        .zip(out.chunks_exact_mut(4))
        .enumerate()
    {
        counts.total_pixels += 1;
        let offset = i * 4;
        match other.get(offset..offset + 4) {
            Some(theirs) if theirs == src => {
                let [r, g, b] = desaturate(src[0], src[1], src[2]);
                dst[..3].copy_from_slice(&[r, g, b]);
            }
            Some(theirs) => {
                counts.diff_pixels += 1;
                let [r, g, b] = redden(theirs[0], theirs[1], theirs[2]);
                dst.copy_from_slice(&[r, g, b, theirs[3]]);
            }
            None => {
                counts.diff_pixels += 1;
                let [r, g, b] = redden(src[0], src[1], src[2]);
                dst[..3].copy_from_slice(&[r, g, b]);
            }
        }
    }

    (out, counts)
}

/// Compare two decoded images under the given dimension policy.
pub fn compare(
    left: &PixelBuffer,
    right: &PixelBuffer,
    policy: DimensionPolicy,
) -> Result<PixelDiff, DiffError> {
    if left.dimensions() != right.dimensions() {
        match policy {
            DimensionPolicy::Strict => {
                return Err(DiffError::DimensionMismatch {
                    first_w: left.width,
                    first_h: left.height,
                    second_w: right.width,
                    second_h: right.height,
                });
            }
            DimensionPolicy::Lenient => debug!(
                first = ?left.dimensions(),
                second = ?right.dimensions(),
                "dimensions differ, comparing by buffer length"
            ),
        }
    }

    let (width, height) = if right.data.len() > left.data.len() {
        right.dimensions()
    } else {
        left.dimensions()
    };
    let (data, counts) = compare_buffers(&left.data, &right.data);

    Ok(PixelDiff {
        image: PixelBuffer::new(data, width, height)?,
        score: counts.score(),
        diff_pixels: counts.diff_pixels,
        total_pixels: counts.total_pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(pixels: usize, rgba: [u8; 4]) -> Vec<u8> {
        rgba.repeat(pixels)
    }

    fn quads(buf: &[u8]) -> Vec<[u8; 4]> {
        buf.chunks_exact(4)
            .map(|q| [q[0], q[1], q[2], q[3]])
            .collect()
    }

    // -- color helpers --

    #[test]
    fn redden_adds_red_and_pulls_green_blue() {
        assert_eq!(redden(100, 100, 100), [160, 80, 80]);
        assert_eq!(redden(195, 10, 30), [255, 0, 10]);
    }

    #[test]
    fn redden_saturated_red_keeps_red() {
        assert_eq!(redden(250, 100, 40), [250, 40, 0]);
        assert_eq!(redden(196, 59, 61), [196, 0, 1]);
    }

    #[test]
    fn desaturate_blends_toward_gray() {
        assert_eq!(desaturate(200, 100, 50), [139, 119, 109]);
        assert_eq!(desaturate(0, 0, 0), [0, 0, 0]);
    }

    // -- score --

    #[test]
    fn score_rounds_half_up() {
        // 2469 of 20000 pixels is a ratio of exactly 0.12345.
        assert_eq!(diff_score(2469 * 4, 20_000 * 4), 12.35);
    }

    #[test]
    fn score_of_empty_buffer_is_zero() {
        assert_eq!(diff_score(0, 0), 0.0);
        assert_eq!(DiffCounts::default().score(), 0.0);
    }

    // -- comparison loop --

    #[test]
    fn identical_buffers_desaturate_everything() {
        let img: Vec<u8> = [[200, 100, 50, 255], [10, 20, 30, 128]].concat();
        let (out, counts) = compare_buffers(&img, &img);
        assert_eq!(counts.diff_pixels, 0);
        assert_eq!(counts.total_pixels, 2);
        assert_eq!(counts.score(), 0.0);
        let [r, g, b] = desaturate(10, 20, 30);
        assert_eq!(quads(&out), vec![[139, 119, 109, 255], [r, g, b, 128]]);
    }

    #[test]
    fn every_pixel_changed_scores_hundred() {
        let a = solid(16, [0, 0, 0, 255]);
        let b = solid(16, [100, 90, 10, 200]);
        let (out, counts) = compare_buffers(&a, &b);
        assert_eq!(counts.diff_pixels, 16);
        assert_eq!(counts.score(), 100.0);
        assert!(quads(&out).iter().all(|q| *q == [160, 70, 0, 200]));
    }

    #[test]
    fn alpha_only_change_counts_as_changed() {
        let a = solid(1, [10, 10, 10, 255]);
        let b = solid(1, [10, 10, 10, 0]);
        let (out, counts) = compare_buffers(&a, &b);
        assert_eq!(counts.diff_pixels, 1);
        assert_eq!(out, vec![70, 0, 0, 0]);
    }

    #[test]
    fn recolor_uses_other_color_not_base() {
        let a = solid(1, [0, 0, 0, 255]);
        let b = solid(1, [250, 100, 40, 255]);
        let (out, _) = compare_buffers(&a, &b);
        assert_eq!(out, vec![250, 40, 0, 255]);
    }

    #[test]
    fn deterministic_output() {
        let a: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let b: Vec<u8> = a.iter().rev().copied().collect();
        let first = compare_buffers(&a, &b);
        let second = compare_buffers(&a, &b);
        assert_eq!(first, second);
    }

    #[test]
    fn inputs_are_not_mutated() {
        let a = solid(4, [1, 2, 3, 4]);
        let b = solid(4, [5, 6, 7, 8]);
        let (a_copy, b_copy) = (a.clone(), b.clone());
        let _ = compare_buffers(&a, &b);
        assert_eq!(a, a_copy);
        assert_eq!(b, b_copy);
    }

    #[test]
    fn longer_buffer_becomes_base() {
        let long = solid(1000, [20, 40, 60, 255]);
        let short = solid(500, [20, 40, 60, 255]);

        for (a, b) in [(&long, &short), (&short, &long)] {
            let (out, counts) = compare_buffers(a, b);
            assert_eq!(out.len(), 4000);
            assert_eq!(counts.total_pixels, 1000);
            // The 500 pixels past the short buffer's end count as changed.
            assert_eq!(counts.diff_pixels, 500);
            assert_eq!(counts.score(), 50.0);

            let [r, g, b] = desaturate(20, 40, 60);
            assert_eq!(&out[..4], &[r, g, b, 255]);
            // Past the end the base pixel itself is highlighted.
            assert_eq!(&out[2000..2004], &[80, 20, 40, 255]);
            assert_eq!(&out[3996..], &[80, 20, 40, 255]);
        }
    }

    #[test]
    fn partial_trailing_quad_is_copied() {
        let a = [10, 10, 10, 255, 7, 8];
        let b = [10, 10, 10, 255, 1, 2];
        let (out, counts) = compare_buffers(&a, &b);
        assert_eq!(counts.total_pixels, 1);
        assert_eq!(counts.diff_pixels, 0);
        assert_eq!(&out[4..], &[7, 8]);
    }

    #[test]
    fn empty_buffers() {
        let (out, counts) = compare_buffers(&[], &[]);
        assert!(out.is_empty());
        assert_eq!(counts.score(), 0.0);
    }

    // -- PixelBuffer + policy --

    #[test]
    fn pixel_buffer_rejects_wrong_length() {
        let err = PixelBuffer::new(vec![0; 7], 1, 2).unwrap_err();
        assert!(matches!(err, DiffError::MalformedBuffer { len: 7, .. }));
    }

    #[test]
    fn pixel_buffer_rejects_overflowing_dimensions() {
        let err = PixelBuffer::new(Vec::new(), u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(err, DiffError::MalformedBuffer { len: 0, .. }));
    }

    #[test]
    fn strict_policy_rejects_dimension_mismatch() {
        let a = PixelBuffer::new(solid(6, [0, 0, 0, 255]), 2, 3).unwrap();
        let b = PixelBuffer::new(solid(6, [0, 0, 0, 255]), 3, 2).unwrap();
        let err = compare(&a, &b, DimensionPolicy::Strict)
            .err()
            .expect("strict policy must reject");
        assert_eq!(
            err.to_string(),
            "Images not the same dimension. First: 2x3. Second: 3x2."
        );
    }

    #[test]
    fn lenient_policy_compares_by_length() {
        let a = PixelBuffer::new(solid(6, [9, 9, 9, 255]), 2, 3).unwrap();
        let b = PixelBuffer::new(solid(6, [9, 9, 9, 255]), 3, 2).unwrap();
        let diff = compare(&a, &b, DimensionPolicy::Lenient).unwrap();
        assert_eq!(diff.score, 0.0);
        assert_eq!(diff.image.dimensions(), (2, 3));
    }

    #[test]
    fn lenient_output_takes_larger_dimensions() {
        let a = PixelBuffer::new(solid(4, [9, 9, 9, 255]), 2, 2).unwrap();
        let b = PixelBuffer::new(solid(8, [9, 9, 9, 255]), 2, 4).unwrap();
        let diff = compare(&a, &b, DimensionPolicy::Lenient).unwrap();
        assert_eq!(diff.image.dimensions(), (2, 4));
        assert_eq!(diff.total_pixels, 8);
        assert_eq!(diff.diff_pixels, 4);
        assert_eq!(diff.score, 50.0);
    }

    #[test]
    fn pixel_buffer_round_trips_through_image() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4]));
        let buf = PixelBuffer::from(img.clone());
        assert_eq!(buf.dimensions(), (3, 2));
        assert_eq!(buf.into_image().unwrap(), img);
    }
}
