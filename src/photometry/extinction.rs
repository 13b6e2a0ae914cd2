use super::Band;
use crate::schema::columns;
use crate::sky::DustMap;
use crate::table::{Table, TableError};

/// Fraction of flux transmitted through Galactic dust in `band`
pub fn mw_transmission(ebv: f64, band: Band) -> f64 {
    10f64.powf(-0.4 * band.ext_coeff() * ebv)
}

/// Add `EBV` and `MW_TRANSMISSION_{G,R,Z,W1,W2}` to a record set with RA/DEC
pub fn add_mw_transmission(data: &mut Table, dust: &dyn DustMap) -> Result<(), TableError> {
    let ebv = dust.ebv(data.f64(columns::RA)?, data.f64(columns::DEC)?);
    for band in Band::ALL {
        let trans: Vec<f64> = ebv.iter().map(|&e| mw_transmission(e, band)).collect();
        data.push(columns::mw_transmission(band.name()), trans)?;
    }
    data.push(columns::EBV, ebv)?;
    Ok(())
}

/// Observed fluxes divided by their Galactic transmission, in [`Band::ALL`] order
pub fn unextinct_fluxes(targets: &Table) -> Result<[Vec<f64>; 5], TableError> {
    let mut out: [Vec<f64>; 5] = Default::default();
    for band in Band::ALL {
        let flux = targets.numeric(&columns::flux(band.name()))?;
        let trans = targets.numeric(&columns::mw_transmission(band.name()))?;
        out[band.index()] = flux
            .iter()
            .zip(trans.iter())
            .map(|(&f, &t)| f / t)
            .collect();
    }
    Ok(out)
}
