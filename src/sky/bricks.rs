//! Imaging-survey bricks: 0.25 degree cells in rows of constant declination.
//!
//! Row `i` is centred on `-90 + 0.25 i`; each row holds an even number of
//! bricks chosen so bricks are roughly square, with a single brick at each
//! pole. Brick ids start at 1 at the south pole and run row-major.

/// Brick side length in degrees
pub const BRICK_SIZE: f64 = 0.25;

/// Precomputed brick layout
#[derive(Debug, Clone)]
pub struct Bricks {
    ncol: Vec<i64>,
    first_id: Vec<i64>,
}

impl Default for Bricks {
    fn default() -> Self {
        Self::new()
    }
}

impl Bricks {
    /// Build the layout for 0.25 degree bricks
    pub fn new() -> Self {
        let nrow = (180.0 / BRICK_SIZE) as usize + 1;
        let mut ncol = Vec::with_capacity(nrow);
        for i in 0..nrow {
            let center = -90.0 + i as f64 * BRICK_SIZE;
            let declo = center.abs() - BRICK_SIZE / 2.0;
            let n = 360.0 / BRICK_SIZE * declo.to_radians().cos();
            ncol.push(((n / 2.0).ceil() * 2.0) as i64);
        }
        ncol[0] = 1;
        ncol[nrow - 1] = 1;

        let mut first_id = Vec::with_capacity(nrow);
        let mut total = 0i64;
        for &n in &ncol {
            first_id.push(total);
            total += n;
        }
        Self { ncol, first_id }
    }

    fn row(&self, dec: f64) -> usize {
        let row = ((dec + 90.0 + BRICK_SIZE / 2.0) / BRICK_SIZE) as i64;
        row.clamp(0, self.ncol.len() as i64 - 1) as usize
    }

    fn col(&self, ra: f64, row: usize) -> i64 {
        let ncol = self.ncol[row];
        let col = (ra.rem_euclid(360.0) / 360.0 * ncol as f64) as i64;
        col.min(ncol - 1)
    }

    /// Centre (RA, Dec) of the brick containing a position
    pub fn center(&self, ra: f64, dec: f64) -> (f64, f64) {
        let row = self.row(dec);
        let col = self.col(ra, row);
        let width = 360.0 / self.ncol[row] as f64;
        ((col as f64 + 0.5) * width, -90.0 + row as f64 * BRICK_SIZE)
    }

    /// Integer brick id (1-based)
    pub fn brickid(&self, ra: f64, dec: f64) -> i64 {
        let row = self.row(dec);
        self.first_id[row] + self.col(ra, row) + 1
    }

    /// Brick name such as `0100p100` (RA and |Dec| of the centre in tenths of a degree)
    pub fn brickname(&self, ra: f64, dec: f64) -> String {
        let (cra, cdec) = self.center(ra, dec);
        let sign = if cdec >= 0.0 { 'p' } else { 'm' };
        format!(
            "{:04}{}{:03}",
            (cra * 10.0) as i64,
            sign,
            (cdec.abs() * 10.0) as i64
        )
    }

    /// Total number of bricks on the sky
    pub fn len(&self) -> i64 {
        self.ncol.iter().sum()
    }

    /// Always false; the layout covers the whole sky
    pub fn is_empty(&self) -> bool {
        false
    }
}
