use image::GrayImage;

use super::SymbolDecoder;

/// Pure-Rust detector backed by `rqrr`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDecoder;

impl SymbolDecoder for RqrrDecoder {
    fn scan(&self, image: &GrayImage) -> Vec<Result<String, String>> {
        let (w, h) = image.dimensions();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
            image.get_pixel(x as u32, y as u32).0[0]
        });

        prepared
            .detect_grids()
            .into_iter()
            .map(|grid| {
                grid.decode()
                    .map(|(_meta, text)| text)
                    .map_err(|e| e.to_string())
            })
            .collect()
    }
}
