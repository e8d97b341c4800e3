#[cfg(feature = "png")]
use crate::Error;
use crate::{LinColor, RGBA};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Width of the image
    pub width: usize,
    /// Height of the image
    pub height: usize,
    /// How many elements we need to skip to get to the next row.
    pub row_stride: usize,
    /// How many elements we need to skip to get to the next column.
    pub col_stride: usize,
}

impl Shape {
    #[inline]
    pub fn offset(&self, row: usize, col: usize) -> usize {
        row * self.row_stride + col * self.col_stride
    }
}

pub trait Image {
    type Pixel;

    fn data(&self) -> &[Self::Pixel];

    fn shape(&self) -> Shape;

    fn width(&self) -> usize {
        self.shape().width
    }

    fn height(&self) -> usize {
        self.shape().height
    }

    fn get(&self, row: usize, col: usize) -> Option<&Self::Pixel> {
        let shape = self.shape();
        if row >= shape.height || col >= shape.width {
            return None;
        }
        self.data().get(shape.offset(row, col))
    }
}

pub trait ImageMut: Image {
    fn data_mut(&mut self) -> &mut [Self::Pixel];

    fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Self::Pixel> {
        let shape = self.shape();
        if row >= shape.height || col >= shape.width {
            return None;
        }
        self.data_mut().get_mut(shape.offset(row, col))
    }

    fn clear(&mut self)
    where
        Self::Pixel: Default,
    {
        let shape = self.shape();
        let data = self.data_mut();
        for row in 0..shape.height {
            for col in 0..shape.width {
                data[shape.offset(row, col)] = Default::default();
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageOwned<P> {
    shape: Shape,
    data: Vec<P>,
}

impl<P> ImageOwned<P> {
    pub fn new_default(height: usize, width: usize) -> Self
    where
        P: Default,
    {
        Self::new_with(height, width, |_, _| Default::default())
    }

    pub fn new_with<F>(height: usize, width: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> P,
    {
        let mut data = Vec::with_capacity(height * width);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col))
            }
        }
        Self {
            shape: Shape {
                width,
                height,
                row_stride: width,
                col_stride: 1,
            },
            data,
        }
    }

    pub fn to_vec(self) -> Vec<P> {
        self.data
    }
}

impl<P> Image for ImageOwned<P> {
    type Pixel = P;

    fn shape(&self) -> Shape {
        self.shape
    }

    fn data(&self) -> &[Self::Pixel] {
        &self.data
    }
}

impl<P> ImageMut for ImageOwned<P> {
    fn data_mut(&mut self) -> &mut [Self::Pixel] {
        &mut self.data
    }
}

/// Convert linear color image into packed sRGB image
pub fn image_to_rgba(image: &impl Image<Pixel = LinColor>) -> ImageOwned<RGBA> {
    ImageOwned::new_with(image.height(), image.width(), |row, col| {
        image
            .get(row, col)
            .map(|color| RGBA::from(*color))
            .unwrap_or_default()
    })
}

/// Encode image as PNG
#[cfg(feature = "png")]
pub fn write_png(
    image: &impl Image<Pixel = LinColor>,
    out: impl std::io::Write,
) -> Result<(), Error> {
    let rgba = image_to_rgba(image);
    let mut encoder = png::Encoder::new(out, rgba.width() as u32, rgba.height() as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(bytemuck::cast_slice(rgba.data()))?;
    Ok(())
}

/// Decode PNG into linear color image
#[cfg(feature = "png")]
pub fn read_png(input: impl std::io::Read) -> Result<ImageOwned<LinColor>, Error> {
    let mut decoder = png::Decoder::new(input);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buffer = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buffer)?;
    let channels = info.color_type.samples();
    let width = info.width as usize;
    let bytes = &buffer[..info.buffer_size()];
    Ok(ImageOwned::new_with(
        info.height as usize,
        width,
        |row, col| {
            let offset = (row * width + col) * channels;
            let pixel = &bytes[offset..offset + channels];
            let rgba = match channels {
                1 => RGBA::new(pixel[0], pixel[0], pixel[0], 255),
                2 => RGBA::new(pixel[0], pixel[0], pixel[0], pixel[1]),
                3 => RGBA::new(pixel[0], pixel[1], pixel[2], 255),
                _ => RGBA::new(pixel[0], pixel[1], pixel[2], pixel[3]),
            };
            rgba.into()
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_bounds() {
        let mut image = ImageOwned::new_with(2, 3, |row, col| row * 10 + col);
        assert_eq!(image.get(1, 2), Some(&12));
        assert_eq!(image.get(2, 0), None);
        assert_eq!(image.get(0, 3), None);
        if let Some(pixel) = image.get_mut(0, 1) {
            *pixel = 100;
        }
        assert_eq!(image.get(0, 1), Some(&100));
        image.clear();
        assert!(image.data().iter().all(|p| *p == 0));
    }

    #[cfg(feature = "png")]
    #[test]
    fn test_png_roundtrip() -> Result<(), Error> {
        let color: LinColor = RGBA::new(255, 0, 0, 255).into();
        let image = ImageOwned::new_with(2, 2, |_, _| color);
        let mut bytes = Vec::new();
        write_png(&image, &mut bytes)?;
        let decoded = read_png(bytes.as_slice())?;
        assert_eq!(decoded.width(), 2);
        assert_eq!(RGBA::from(*decoded.get(1, 1).unwrap()), RGBA::new(255, 0, 0, 255));
        Ok(())
    }
}
