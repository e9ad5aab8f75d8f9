use std::io::Cursor;

use image::ImageFormat;

use crate::{DiffError, PixelBuffer};

/// Decode any supported raster format into an RGBA buffer.
pub fn decode(name: &str, bytes: &[u8]) -> Result<PixelBuffer, DiffError> {
    let img = image::load_from_memory(bytes).map_err(|source| DiffError::Decode {
        name: name.to_owned(),
        source,
    })?;
    Ok(PixelBuffer::from(img.to_rgba8()))
}

/// Encode an RGBA buffer as PNG.
pub fn encode_png(buf: PixelBuffer) -> Result<Vec<u8>, DiffError> {
    let img = buf.into_image()?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(DiffError::Encode)?;
    Ok(png)
}
