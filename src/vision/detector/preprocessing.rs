// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the detection model

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::Array3;

use crate::config::InputFormat;

/// Output size of a shortest-edge resize
///
/// The short side is scaled to `min_size`, then the whole image is scaled
/// down again if the long side would exceed `max_size`.
pub fn shortest_edge_size(width: u32, height: u32, min_size: u32, max_size: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let (w, h) = (width as f32, height as f32);
    let short = w.min(h);
    let long = w.max(h);

    let mut scale = min_size as f32 / short;
    if long * scale > max_size as f32 {
        scale = max_size as f32 / long;
    }

    let new_w = (w * scale + 0.5).floor() as u32;
    let new_h = (h * scale + 0.5).floor() as u32;
    (new_w.max(1), new_h.max(1))
}

/// Model-ready tensor plus the factors mapping model boxes back
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// CHW float tensor with raw 0-255 values
    pub tensor: Array3<f32>,
    /// Original width / resized width
    pub scale_x: f32,
    /// Original height / resized height
    pub scale_y: f32,
}

/// Resize and convert an image for the detector
///
/// Pixel values are not normalized; the exported graph subtracts its own
/// mean and divides by its own std.
pub fn prepare_image(
    image: &DynamicImage,
    min_size: u32,
    max_size: u32,
    format: InputFormat,
) -> PreparedImage {
    let (orig_w, orig_h) = image.dimensions();
    let (new_w, new_h) = shortest_edge_size(orig_w, orig_h, min_size, max_size);

    let resized = if (new_w, new_h) == (orig_w, orig_h) {
        image.to_rgb8()
    } else {
        image
            .resize_exact(new_w, new_h, FilterType::Triangle)
            .to_rgb8()
    };

    let channel_order: [usize; 3] = match format {
        InputFormat::Rgb => [0, 1, 2],
        InputFormat::Bgr => [2, 1, 0],
    };

    let mut tensor = Array3::<f32>::zeros((3, new_h as usize, new_w as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for (c, &src) in channel_order.iter().enumerate() {
            tensor[[c, y as usize, x as usize]] = pixel[src] as f32;
        }
    }

    PreparedImage {
        tensor,
        scale_x: orig_w as f32 / new_w as f32,
        scale_y: orig_h as f32 / new_h as f32,
    }
}
