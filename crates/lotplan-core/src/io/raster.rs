//! Single-band TIFF reading and label export.
//!
//! Only the first image of a file is read. Any integer or float sample
//! format the decoder yields is widened to `f64` for bands; labels must be
//! non-negative integers.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use log::debug;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};

use crate::error::{LotplanError, Result};
use crate::raster::{BandRaster, LabelRaster};

const JPEG2000_EXTENSIONS: [&str; 2] = ["jp2", "j2k"];

pub(crate) fn is_jpeg2000(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| JPEG2000_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

pub(crate) fn jpeg2000_unsupported(path: &Path) -> LotplanError {
    LotplanError::UnsupportedFormat {
        path: path.to_path_buf(),
        reason: "JPEG 2000 bands must be converted to GeoTIFF first, e.g. with gdal_translate".into(),
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    if !path.is_file() {
        return Err(LotplanError::MissingInput(path.to_path_buf()));
    }
    if is_jpeg2000(path) {
        return Err(jpeg2000_unsupported(path));
    }
    Ok(BufReader::new(File::open(path)?))
}

/// Decode the first image into row-major `f64` samples.
fn decode<R: Read + Seek>(reader: R) -> Result<(Vec<f64>, usize, usize)> {
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let data: Vec<f64> = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        _ => return Err(LotplanError::Raster("unsupported TIFF sample format".into())),
    };

    // Multi-sample images come back interleaved; keep the first sample.
    let n = width * height;
    if n == 0 {
        return Err(LotplanError::EmptyInput("TIFF image has no pixels".into()));
    }
    if data.len() % n != 0 || data.len() < n {
        return Err(LotplanError::Raster(format!(
            "{} samples do not fit a {width}x{height} image",
            data.len()
        )));
    }
    let spp = data.len() / n;
    let data = if spp == 1 {
        data
    } else {
        data.into_iter().step_by(spp).collect()
    };
    Ok((data, width, height))
}

/// Read band 1 of a TIFF, decimated by `downsample` (1 keeps full resolution).
pub fn read_band(path: &Path, downsample: usize) -> Result<BandRaster> {
    let (data, width, height) = decode(open(path)?)?;
    let band = BandRaster::from_vec(data, width, height)?.downsample(downsample);
    debug!(
        "read {} ({}x{} → {}x{})",
        path.display(),
        width,
        height,
        band.width,
        band.height
    );
    if band.is_empty() {
        return Err(LotplanError::EmptyInput(format!(
            "{} is empty after downsampling by {downsample}",
            path.display()
        )));
    }
    Ok(band)
}

/// Read a label raster. Samples must be whole, non-negative numbers.
pub fn read_labels(path: &Path) -> Result<LabelRaster> {
    let (data, width, height) = decode(open(path)?)?;
    let labels = data
        .into_iter()
        .map(|v| {
            if v.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&v) {
                Ok(v as u32)
            } else {
                Err(LotplanError::Raster(format!(
                    "{}: label {v} is not a non-negative integer",
                    path.display()
                )))
            }
        })
        .collect::<Result<Vec<u32>>>()?;
    LabelRaster::from_vec(labels, width, height)
}

fn encode_labels<W: Write + Seek>(labels: &LabelRaster, writer: W) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer)?;
    encoder.write_image::<colortype::Gray32>(
        labels.width as u32,
        labels.height as u32,
        &labels.data,
    )?;
    Ok(())
}

/// Write a label raster as a 32-bit unsigned greyscale TIFF.
pub fn write_labels(labels: &LabelRaster, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    encode_labels(labels, BufWriter::new(file))?;
    debug!("wrote {}x{} labels to {}", labels.width, labels.height, path.display());
    Ok(())
}

/// Write a band as a 32-bit float TIFF.
pub fn write_band(band: &BandRaster, path: &Path) -> Result<()> {
    let data: Vec<f32> = band.data.iter().map(|&v| v as f32).collect();
    let mut encoder = TiffEncoder::new(BufWriter::new(File::create(path)?))?;
    encoder.write_image::<colortype::Gray32Float>(band.width as u32, band.height as u32, &data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn band_round_trips_through_tiff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("B04.tif");
        let band = BandRaster::from_vec((0..12).map(|v| v as f64 * 100.0).collect(), 4, 3).unwrap();
        write_band(&band, &path).unwrap();
        assert_eq!(read_band(&path, 1).unwrap(), band);
    }

    #[test]
    fn downsampling_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("B08.tif");
        let band = BandRaster::from_vec((0..400).map(f64::from).collect(), 20, 20).unwrap();
        write_band(&band, &path).unwrap();
        let small = read_band(&path, 10).unwrap();
        assert_eq!((small.width, small.height), (2, 2));
        // Centre of the first 10x10 block is (5, 5).
        assert_eq!(small.get(0, 0), 105.0);
    }

    #[test]
    fn u16_band_is_widened() {
        let mut buf = Vec::new();
        {
            let mut enc = TiffEncoder::new(Cursor::new(&mut buf)).unwrap();
            enc.write_image::<colortype::Gray16>(2, 1, &[1200u16, 65000]).unwrap();
        }
        let (data, w, h) = decode(Cursor::new(buf)).unwrap();
        assert_eq!((w, h), (2, 1));
        assert_eq!(data, vec![1200.0, 65000.0]);
    }

    #[test]
    fn labels_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.tif");
        let labels = LabelRaster::from_vec(vec![0, 0, 1, 7, 7, 300], 3, 2).unwrap();
        write_labels(&labels, &path).unwrap();
        assert_eq!(read_labels(&path).unwrap(), labels);
    }

    #[test]
    fn negative_label_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.tif");
        let band = BandRaster::from_vec(vec![0.0, -1.0], 2, 1).unwrap();
        write_band(&band, &path).unwrap();
        assert!(matches!(read_labels(&path), Err(LotplanError::Raster(_))));
    }

    #[test]
    fn missing_file_named_in_error() {
        let err = read_band(Path::new("/nonexistent/B04.tif"), 1).unwrap_err();
        match err {
            LotplanError::MissingInput(p) => assert!(p.ends_with("B04.tif")),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn jpeg2000_band_is_unsupported_not_garbled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("T48_B04.jp2");
        std::fs::write(&path, b"\0\0\0\x0cjP  \r\n\x87\n").unwrap();
        match read_band(&path, 1) {
            Err(LotplanError::UnsupportedFormat { path: p, reason }) => {
                assert!(p.ends_with("T48_B04.jp2"));
                assert!(reason.contains("GeoTIFF"));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
