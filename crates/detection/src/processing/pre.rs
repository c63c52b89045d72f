use crate::config::DEFAULT_INPUT_SIZE;
use common::span;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use ndarray::{Array, IxDyn};

const LETTERBOX_COLOR: u8 = 114;

/// Letterbox geometry needed to map model coordinates back to the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxTransform {
    pub orig_width: u32,
    pub orig_height: u32,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

pub struct PreProcessor {
    pub input_size: (u32, u32),
    rgb_buffer: Vec<u8>,
    letterboxed_buffer: Vec<u8>,
}

impl PreProcessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self {
            input_size,
            rgb_buffer: Vec::new(),
            letterboxed_buffer: vec![LETTERBOX_COLOR; (input_size.0 * input_size.1 * 3) as usize],
        }
    }

    /// Resize with preserved aspect ratio, pad to the input size, and produce
    /// a `[1, 3, H, W]` tensor scaled to [0, 1].
    pub fn preprocess(
        &mut self,
        image: &RgbImage,
    ) -> anyhow::Result<(Array<f32, IxDyn>, LetterboxTransform)> {
        let _s = span!("preprocess_image");

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            anyhow::bail!("Cannot preprocess empty image ({}x{})", width, height);
        }

        tracing::trace!(width, height, "Preprocessing image dimensions");

        self.rgb_buffer.clear();
        self.rgb_buffer.extend_from_slice(image.as_raw());

        let (scale, offset_x, offset_y) = self.resize_and_letterbox(width, height)?;
        let input = self.to_tensor()?;

        Ok((
            input,
            LetterboxTransform {
                orig_width: width,
                orig_height: height,
                scale,
                offset_x,
                offset_y,
            },
        ))
    }

    fn resize_and_letterbox(&mut self, width: u32, height: u32) -> anyhow::Result<(f32, f32, f32)> {
        let _s = span!("resize_and_letterbox");

        let scale =
            (self.input_size.0 as f32 / width as f32).min(self.input_size.1 as f32 / height as f32);
        let new_width = ((width as f32 * scale) as u32).clamp(1, self.input_size.0);
        let new_height = ((height as f32 * scale) as u32).clamp(1, self.input_size.1);

        let offset_x = (self.input_size.0 - new_width) / 2;
        let offset_y = (self.input_size.1 - new_height) / 2;

        let src = Image::from_slice_u8(width, height, &mut self.rgb_buffer, PixelType::U8x3)?;
        let mut resized = Image::new(new_width, new_height, PixelType::U8x3);

        Resizer::new().resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        self.letterboxed_buffer.fill(LETTERBOX_COLOR);

        let resized_data = resized.buffer();
        let stride = self.input_size.0 * 3;

        for y in 0..new_height {
            let src_row = (y * new_width * 3) as usize;
            let dst_row = ((y + offset_y) * stride + offset_x * 3) as usize;

            self.letterboxed_buffer[dst_row..dst_row + (new_width * 3) as usize]
                .copy_from_slice(&resized_data[src_row..src_row + (new_width * 3) as usize]);
        }

        Ok((scale, offset_x as f32, offset_y as f32))
    }

    fn to_tensor(&self) -> anyhow::Result<Array<f32, IxDyn>> {
        let _s = span!("to_tensor");

        let width = self.input_size.0 as usize;
        let height = self.input_size.1 as usize;
        let spatial = width * height;

        let mut output = vec![0.0f32; 3 * spatial];

        for (i, px) in self.letterboxed_buffer.chunks_exact(3).enumerate() {
            output[i] = px[0] as f32 / 255.0;
            output[i + spatial] = px[1] as f32 / 255.0;
            output[i + 2 * spatial] = px[2] as f32 / 255.0;
        }

        Ok(Array::from_shape_vec(
            IxDyn(&[1, 3, height, width]),
            output,
        )?)
    }
}

impl Default for PreProcessor {
    fn default() -> Self {
        Self::new((DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_output_shape_matches_input_size() {
        let image = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));

        let mut preprocessor = PreProcessor::default();
        let (output, _) = preprocessor.preprocess(&image).unwrap();

        assert_eq!(output.shape(), &[1, 3, 640, 640]);
    }

    #[test]
    fn test_letterboxing_preserves_aspect_ratio() {
        // 800x600 image (4:3 aspect ratio)
        let image = RgbImage::from_pixel(800, 600, Rgb([128, 128, 128]));

        let mut preprocessor = PreProcessor::new((640, 640));
        let (output, transform) = preprocessor.preprocess(&image).unwrap();

        // Scale = min(640/800, 640/600) = 0.8, resized to 640x480
        assert_eq!(transform.scale, 0.8);
        assert_eq!(transform.offset_x, 0.0, "X offset should be 0 for wide image");
        assert_eq!(transform.offset_y, 80.0, "Y offset should center vertically");
        assert_eq!(transform.orig_width, 800);
        assert_eq!(transform.orig_height, 600);

        // Padding rows keep the letterbox color
        let pad = LETTERBOX_COLOR as f32 / 255.0;
        assert!((output[[0, 0, 10, 320]] - pad).abs() < 1e-6);
        // Image rows carry the source pixel
        assert!((output[[0, 0, 320, 320]] - 128.0 / 255.0).abs() < 0.01);
    }

    #[test]
    fn test_channels_are_planar_rgb() {
        let image = RgbImage::from_pixel(64, 64, Rgb([255, 0, 0]));

        let mut preprocessor = PreProcessor::new((64, 64));
        let (output, transform) = preprocessor.preprocess(&image).unwrap();

        assert_eq!(transform.scale, 1.0);
        assert!((output[[0, 0, 32, 32]] - 1.0).abs() < 1e-6, "R plane");
        assert!(output[[0, 1, 32, 32]].abs() < 1e-6, "G plane");
        assert!(output[[0, 2, 32, 32]].abs() < 1e-6, "B plane");
    }

    #[test]
    fn test_empty_image_rejected() {
        let image = RgbImage::new(0, 0);
        let mut preprocessor = PreProcessor::default();
        assert!(preprocessor.preprocess(&image).is_err());
    }
}
