use std::fmt;

use qrcode::render::svg;
use qrcode::{Color, EcLevel, QrCode};
use thiserror::Error;

/// Pixels per module when rasterising for the decoder.
const RASTER_SCALE: usize = 4;
/// Light border, in modules, required around a QR symbol.
const QUIET_ZONE: usize = 4;
const SVG_MIN_DIMENSION: u32 = 256;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("ticket id is empty")]
    EmptyId,

    #[error("ticket id cannot be encoded: {0}")]
    Encode(String),

    #[error("no visual code found")]
    NoCodeFound,

    #[error("visual code could not be decoded: {0}")]
    Decode(String),
}

/// A ticket id laid out as a QR symbol. The payload is the id bytes and
/// nothing else.
#[derive(Clone)]
pub struct VisualCode {
    code: QrCode,
}

impl fmt::Debug for VisualCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualCode")
            .field("width", &self.code.width())
            .finish_non_exhaustive()
    }
}

/// Encode `id` as a QR symbol. Deterministic: the same id always yields the
/// same module matrix.
pub fn encode_for_display(id: &str) -> Result<VisualCode, CodecError> {
    if id.is_empty() {
        return Err(CodecError::EmptyId);
    }

    let code = QrCode::with_error_correction_level(id.as_bytes(), EcLevel::M)
        .map_err(|e| CodecError::Encode(e.to_string()))?;

    Ok(VisualCode { code })
}

impl VisualCode {
    /// Side length of the symbol in modules, excluding the quiet zone.
    pub fn width(&self) -> usize {
        self.code.width()
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.code[(x, y)] == Color::Dark
    }

    pub fn to_svg(&self) -> String {
        self.code
            .render::<svg::Color<'_>>()
            .min_dimensions(SVG_MIN_DIMENSION, SVG_MIN_DIMENSION)
            .quiet_zone(true)
            .build()
    }

    /// Read the symbol back the way a scanner would: rasterise it with a
    /// quiet zone and run a generic QR detector over the greyscale image.
    pub fn decode(&self) -> Result<String, CodecError> {
        let width = self.width();
        let side = (width + 2 * QUIET_ZONE) * RASTER_SCALE;

        let mut image = rqrr::PreparedImage::prepare_from_greyscale(side, side, |x, y| {
            let mx = (x / RASTER_SCALE).checked_sub(QUIET_ZONE);
            let my = (y / RASTER_SCALE).checked_sub(QUIET_ZONE);
            match (mx, my) {
                (Some(mx), Some(my)) if mx < width && my < width && self.is_dark(mx, my) => 0,
                _ => 255,
            }
        });

        let grids = image.detect_grids();
        let grid = grids.first().ok_or(CodecError::NoCodeFound)?;
        let (_meta, content) = grid
            .decode()
            .map_err(|e| CodecError::Decode(e.to_string()))?;

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::mint;

    #[test]
    fn test_empty_id_is_rejected() {
        assert!(matches!(encode_for_display(""), Err(CodecError::EmptyId)));
    }

    #[test]
    fn test_decode_reproduces_minted_id() {
        for _ in 0..5 {
            let id = mint();
            let code = encode_for_display(&id).unwrap();
            assert_eq!(code.decode().unwrap(), id);
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let first = encode_for_display("TKT-1718000000000-abc123xyz").unwrap();
        let second = encode_for_display("TKT-1718000000000-abc123xyz").unwrap();

        assert_eq!(first.width(), second.width());
        for y in 0..first.width() {
            for x in 0..first.width() {
                assert_eq!(first.is_dark(x, y), second.is_dark(x, y));
            }
        }
        assert_eq!(first.to_svg(), second.to_svg());
    }

    #[test]
    fn test_debug_shows_width() {
        let code = encode_for_display("TKT-1-abc").unwrap();
        let shown = format!("{:?}", code);
        assert!(shown.starts_with("VisualCode"));
        assert!(shown.contains(&format!("width: {}", code.width())));
    }

    #[test]
    fn test_svg_render() {
        let svg = encode_for_display("TKT-1718000000000-abc123xyz")
            .unwrap()
            .to_svg();
        assert!(svg.contains("<svg"));
    }
}
