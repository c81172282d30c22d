use std::fs::File;
use std::io::{self, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use image::GrayImage;
use tiff::{
    decoder::{ifd::Value, Decoder, DecodingResult},
    encoder::{colortype, compression::Lzw, Rational, TiffEncoder},
    tags::{CompressionMethod, PhotometricInterpretation, ResolutionUnit, Tag},
    ColorType, TiffError, TiffFormatError,
};
use weezl::{decode::Decoder as LzwDecoder, encode::Encoder as LzwEncoder, BitOrder};

use super::raster::{RasterBuffer, RasterImage};
use crate::common::error::ExportResult;

/// Uncompressed bytes per strip, matching the limit the tiff encoder uses.
const STRIP_BYTES: usize = 1_000_000;

// Writer
//------------------------------------------------------------------------------

/// Encodes `image` as a single page LZW TIFF with its dpi in both
/// resolution tags. Bitmap rasters are stored with one bit per pixel.
pub fn write_tiff<W: Write + Seek>(image: &RasterImage, writer: W) -> ExportResult<()> {
    let mut encoder = TiffEncoder::new(writer)?;
    let (w, h) = image.dimensions();
    let dpi = image.dpi();

    match image.buffer() {
        RasterBuffer::Bitmap(img) => write_bilevel_page(&mut encoder, img, dpi),
        RasterBuffer::Grayscale(img) => {
            write_page::<colortype::Gray8, _>(&mut encoder, w, h, dpi, img.as_raw())
        }
        RasterBuffer::Rgb(img) => write_page::<colortype::RGB8, _>(&mut encoder, w, h, dpi, img.as_raw()),
        RasterBuffer::Cmyk(img) => {
            write_page::<colortype::CMYK8, _>(&mut encoder, w, h, dpi, img.as_raw())
        }
    }
}

fn write_page<C, W>(
    encoder: &mut TiffEncoder<W>,
    w: u32,
    h: u32,
    dpi: u32,
    data: &[u8],
) -> ExportResult<()>
where
    C: colortype::ColorType<Inner = u8>,
    W: Write + Seek,
{
    let mut page = encoder.new_image_with_compression::<C, _>(w, h, Lzw::default())?;
    page.resolution(ResolutionUnit::Inch, Rational { n: dpi, d: 1 });
    page.write_data(data)?;
    Ok(())
}

/// The tiff encoder has no 1 bit color type, so the directory and the LZW
/// strips are written by hand.
fn write_bilevel_page<W: Write + Seek>(
    encoder: &mut TiffEncoder<W>,
    img: &GrayImage,
    dpi: u32,
) -> ExportResult<()> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(TiffError::FormatError(TiffFormatError::InvalidDimensions(w, h)).into());
    }
    let row_bytes = (w as usize).div_ceil(8);
    let rows_per_strip = (STRIP_BYTES / row_bytes).clamp(1, h as usize);

    let mut dir = encoder.new_directory()?;
    let mut offsets = Vec::new();
    let mut byte_counts = Vec::new();
    for rows in img.as_raw().chunks(w as usize * rows_per_strip) {
        let packed = pack_rows(rows, w as usize);
        let compressed = LzwEncoder::with_tiff_size_switch(BitOrder::Msb, 8)
            .encode(&packed)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        let offset = dir.write_data(compressed.as_slice())?;
        offsets.push(u32::try_from(offset).map_err(|_| TiffError::LimitsExceeded)?);
        byte_counts.push(u32::try_from(compressed.len()).map_err(|_| TiffError::LimitsExceeded)?);
    }

    dir.write_tag(Tag::ImageWidth, w)?;
    dir.write_tag(Tag::ImageLength, h)?;
    dir.write_tag(Tag::BitsPerSample, 1u16)?;
    dir.write_tag(Tag::Compression, CompressionMethod::LZW.to_u16())?;
    dir.write_tag(Tag::PhotometricInterpretation, PhotometricInterpretation::BlackIsZero.to_u16())?;
    dir.write_tag(Tag::StripOffsets, offsets.as_slice())?;
    dir.write_tag(Tag::SamplesPerPixel, 1u16)?;
    dir.write_tag(Tag::RowsPerStrip, rows_per_strip as u32)?;
    dir.write_tag(Tag::StripByteCounts, byte_counts.as_slice())?;
    dir.write_tag(Tag::XResolution, Rational { n: dpi, d: 1 })?;
    dir.write_tag(Tag::YResolution, Rational { n: dpi, d: 1 })?;
    dir.write_tag(Tag::ResolutionUnit, ResolutionUnit::Inch.to_u16())?;
    dir.finish()?;
    Ok(())
}

/// Packs 0/1 samples MSB first, each row padded to a whole byte.
fn pack_rows(samples: &[u8], width: usize) -> Vec<u8> {
    let row_bytes = width.div_ceil(8);
    let mut packed = vec![0u8; samples.len() / width * row_bytes];
    for (row, out) in samples.chunks(width).zip(packed.chunks_mut(row_bytes)) {
        for (x, _) in row.iter().enumerate().filter(|&(_, &v)| v != 0) {
            out[x / 8] |= 0x80 >> (x % 8);
        }
    }
    packed
}

/// Inverse of [`pack_rows`], expanding set bits to 255.
fn unpack_rows(packed: &[u8], width: usize, height: usize) -> Vec<u8> {
    let row_bytes = width.div_ceil(8);
    let mut samples = Vec::with_capacity(width * height);
    for row in packed.chunks(row_bytes).take(height) {
        samples.extend((0..width).map(|x| {
            let bit = row.get(x / 8).is_some_and(|b| b & (0x80 >> (x % 8)) != 0);
            if bit {
                255
            } else {
                0
            }
        }));
    }
    samples
}

pub fn save_tiff(image: &RasterImage, path: &Path) -> ExportResult<()> {
    log::debug!("Writing {}...", path.display());
    let file = BufWriter::new(File::create(path)?);
    write_tiff(image, file)?;
    log::info!("Saved {}", path.display());
    Ok(())
}

// Reader
//------------------------------------------------------------------------------

/// What a written file reports about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TiffInfo {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub bits_per_sample: u8,
    pub dpi: Option<f64>,
    /// Interleaved 8 bit samples, empty for other bit depths. One bit
    /// images are expanded to 0 and 255.
    pub data: Vec<u8>,
}

pub fn read_tiff_info<R: Read + Seek>(mut reader: R) -> ExportResult<TiffInfo> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let mut decoder = Decoder::new(Cursor::new(bytes.as_slice()))?;
    let (width, height) = decoder.dimensions()?;
    let color = decoder.colortype()?;
    let (channels, bits_per_sample) = match color {
        ColorType::Gray(b) => (1, b),
        ColorType::GrayA(b) => (2, b),
        ColorType::RGB(b) => (3, b),
        ColorType::RGBA(b) | ColorType::CMYK(b) => (4, b),
        _ => (0, 0),
    };
    let dpi = match decoder.find_tag(Tag::XResolution)? {
        Some(Value::Rational(n, d)) if d != 0 => Some(n as f64 / d as f64),
        _ => None,
    };
    let data = match color {
        ColorType::Gray(1) => read_bilevel(&mut decoder, &bytes, width as usize, height as usize)?,
        _ => match decoder.read_image()? {
            DecodingResult::U8(data) => data,
            _ => Vec::new(),
        },
    };
    Ok(TiffInfo { width, height, channels, bits_per_sample, dpi, data })
}

fn read_bilevel<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    bytes: &[u8],
    width: usize,
    height: usize,
) -> ExportResult<Vec<u8>> {
    let offsets = decoder.get_tag_u32_vec(Tag::StripOffsets)?;
    let byte_counts = decoder.get_tag_u32_vec(Tag::StripByteCounts)?;
    let compression = decoder.get_tag_unsigned::<u16>(Tag::Compression)?;
    let photometric = decoder.get_tag_unsigned::<u16>(Tag::PhotometricInterpretation)?;

    let mut packed = Vec::new();
    for (&offset, &count) in offsets.iter().zip(&byte_counts) {
        let strip = bytes
            .get(offset as usize..offset as usize + count as usize)
            .ok_or(TiffError::FormatError(TiffFormatError::InconsistentSizesEncountered))?;
        if compression == CompressionMethod::LZW.to_u16() {
            let data = LzwDecoder::with_tiff_size_switch(BitOrder::Msb, 8)
                .decode(strip)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
            packed.extend(data);
        } else if compression == CompressionMethod::None.to_u16() {
            packed.extend_from_slice(strip);
        } else {
            return Ok(Vec::new());
        }
    }

    let mut data = unpack_rows(&packed, width, height);
    if photometric == PhotometricInterpretation::WhiteIsZero.to_u16() {
        data.iter_mut().for_each(|v| *v = 255 - *v);
    }
    Ok(data)
}

pub fn read_tiff_info_file(path: impl AsRef<Path>) -> ExportResult<TiffInfo> {
    read_tiff_info(File::open(path)?)
}

#[cfg(test)]
mod tiff_tests {
    use std::io::Cursor;

    use test_case::test_case;

    use tiff::{decoder::Decoder, ColorType};

    use super::{pack_rows, read_tiff_info, read_tiff_info_file, unpack_rows, write_tiff};
    use crate::builder::BarcodeBuilder;
    use crate::common::metadata::{ColorMode, PixelValue};
    use crate::render::{raster::RasterImage, RenderOptions};

    #[test_case(ColorMode::Bitmap, 1, 1)]
    #[test_case(ColorMode::Grayscale, 1, 8)]
    #[test_case(ColorMode::Rgb, 3, 8)]
    #[test_case(ColorMode::Cmyk, 4, 8)]
    fn test_write_read(mode: ColorMode, channels: usize, bits: u8) {
        let img = RasterImage::new(12, 5, mode, [255, 255, 255], 600);
        let mut buf = Cursor::new(Vec::new());
        write_tiff(&img, &mut buf).unwrap();

        buf.set_position(0);
        let info = read_tiff_info(buf).unwrap();
        assert_eq!((info.width, info.height), (12, 5));
        assert_eq!((info.channels, info.bits_per_sample), (channels, bits));
        assert_eq!(info.dpi, Some(600.0));
        assert_eq!(info.data.len(), 12 * 5 * channels);
    }

    #[test]
    fn test_bitmap_stored_two_level() {
        let barcode = BarcodeBuilder::new("9787564922351").build().unwrap();
        let img = barcode.render(&RenderOptions::default()).unwrap();
        let mut buf = Cursor::new(Vec::new());
        img.write_tiff(&mut buf).unwrap();

        buf.set_position(0);
        {
            let mut decoder = Decoder::new(&mut buf).unwrap();
            assert_eq!(decoder.colortype().unwrap(), ColorType::Gray(1));
        }

        buf.set_position(0);
        let info = read_tiff_info(buf).unwrap();
        assert!(info.data.iter().all(|&v| v == 0 || v == 255));
        let (w, h) = img.dimensions();
        for (x, y) in [(0, 0), (w / 2, h / 2), (w - 1, h - 1), (w / 3, h / 2)] {
            let exp = match img.pixel(x, y) {
                PixelValue::Bit(0) => 0,
                _ => 255,
            };
            assert_eq!(info.data[(y * w + x) as usize], exp);
        }
        assert!(info.data.contains(&0) && info.data.contains(&255));
    }

    #[test]
    fn test_pack_rows_pads_each_row() {
        // 10 pixels per row need two bytes
        let samples = [1, 0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 1, 1, 1, 1, 1, 1, 1, 0, 1];
        let packed = pack_rows(&samples, 10);
        assert_eq!(packed, vec![0b1000_0001, 0b1000_0000, 0b0111_1111, 0b0100_0000]);
        let back = unpack_rows(&packed, 10, 2);
        assert_eq!(back, samples.iter().map(|&v| v * 255).collect::<Vec<u8>>());
    }

    #[test]
    fn test_bitmap_multiple_strips() {
        let mut img = RasterImage::new(9000, 1000, ColorMode::Bitmap, [255, 255, 255], 1200);
        img.fill_span(0, 990, 9000, 10, [0, 0, 0]);
        let mut buf = Cursor::new(Vec::new());
        write_tiff(&img, &mut buf).unwrap();

        buf.set_position(0);
        let info = read_tiff_info(buf).unwrap();
        assert_eq!(info.data.len(), 9000 * 1000);
        assert_eq!(info.data[9000 * 989], 255);
        assert_eq!(info.data[9000 * 990], 0);
        assert_eq!(info.data[9000 * 1000 - 1], 0);
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.tif");
        RasterImage::new(3, 3, ColorMode::Rgb, [10, 20, 30], 300).save_tiff(&path).unwrap();
        let info = read_tiff_info_file(&path).unwrap();
        assert_eq!(&info.data[..3], &[10, 20, 30]);
    }
}
