use std::{
    fs::File,
    io::{self, BufWriter, Write},
    ops::Range,
    path::Path,
};

use crate::{
    error::{SphereError, SphereResult},
    geometry::{FloatType, PlaneVector},
    util::{BLACK, Color, color_to_bytes},
};

#[derive(Clone, Debug, PartialEq)]
pub struct Pixel {
    /// Intersection of the primary ray with the camera space plane z = 1.
    pub camera_coords: PlaneVector,
    pub color: Color,
}

/// Row major grid of pixels with precomputed primary ray directions.
#[derive(Clone, Debug, Default)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl Image {
    /// Creates a black image for a camera with vertical field of view `fov` (degrees).
    pub fn new(fov: FloatType, width: u32, height: u32) -> Self {
        let w = FloatType::from(width);
        let h = FloatType::from(height);
        let ratio = w / h;
        let angle = (fov.to_radians() / 2.0).tan();

        let pixels = (0..height)
            .flat_map(|i| {
                (0..width).map(move |j| Pixel {
                    camera_coords: PlaneVector::new(
                        (2.0 * FloatType::from(j) / w - 1.0) * ratio * angle,
                        (1.0 - 2.0 * FloatType::from(i) / h) * angle,
                    ),
                    color: BLACK,
                })
            })
            .collect();

        Image {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> &Pixel {
        &self.pixels[self.offset(x, y)]
    }

    /// All pixels of a range of rows.
    pub fn rows(&self, rows: Range<u32>) -> &[Pixel] {
        &self.pixels[self.offset(0, rows.start)..self.offset(0, rows.end)]
    }

    /// Writes colors to consecutive pixels, starting at the beginning of `first_row`.
    pub fn set_colors(&mut self, first_row: u32, colors: &[Color]) {
        let start = self.offset(0, first_row);
        for (pixel, color) in self.pixels[start..start + colors.len()].iter_mut().zip(colors) {
            pixel.color = *color;
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Binary PPM (P6).
    pub fn write_ppm(&self, mut writer: impl Write) -> io::Result<()> {
        write!(writer, "P6\n{} {}\n255\n", self.width, self.height)?;
        for pixel in &self.pixels {
            writer.write_all(&color_to_bytes(pixel.color))?;
        }
        Ok(())
    }

    pub fn to_rgb_image(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width, self.height, |x, y| {
            image::Rgb(color_to_bytes(self.pixel(x, y).color))
        })
    }

    /// Saves the image, as PPM if the extension is `.ppm`, otherwise in the format
    /// the `image` crate guesses from the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> SphereResult {
        let path = path.as_ref();
        let is_ppm = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("ppm"));

        if is_ppm {
            let output_error = |source| SphereError::Output {
                path: path.to_owned(),
                source,
            };
            let mut writer = BufWriter::new(File::create(path).map_err(output_error)?);
            self.write_ppm(&mut writer).map_err(output_error)?;
            writer.flush().map_err(output_error)?;
        } else {
            self.to_rgb_image().save(path)?;
        }
        Ok(())
    }
}
