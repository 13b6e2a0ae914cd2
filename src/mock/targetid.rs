//! TARGETID bit packing.
//!
//! | Bits | Field |
//! |------|-------|
//! | 0-21 | OBJID |
//! | 22-41 | BRICKID |
//! | 42-57 | RELEASE |
//! | 58 | MOCK |
//! | 59 | SKY |

use super::MockError;

const OBJID_BITS: u32 = 22;
const BRICKID_BITS: u32 = 20;
const RELEASE_BITS: u32 = 16;

const BRICKID_SHIFT: u32 = OBJID_BITS;
const RELEASE_SHIFT: u32 = BRICKID_SHIFT + BRICKID_BITS;
const MOCK_SHIFT: u32 = RELEASE_SHIFT + RELEASE_BITS;
const SKY_SHIFT: u32 = MOCK_SHIFT + 1;

/// Fields packed into a TARGETID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodedTargetId {
    /// Object number within the brick
    pub objid: i64,
    /// Brick (or HEALPix cell) number
    pub brickid: i64,
    /// Data release
    pub release: i64,
    /// 1 for mock targets
    pub mock: i64,
    /// 1 for sky fibres
    pub sky: i64,
}

fn check(name: &str, value: i64, bits: u32) -> Result<i64, MockError> {
    if value < 0 || value >= (1i64 << bits) {
        return Err(MockError::violation(format!(
            "{} = {} does not fit in {} bits",
            name, value, bits
        )));
    }
    Ok(value)
}

/// Pack identifier fields into a TARGETID
pub fn encode_targetid(
    objid: i64,
    brickid: i64,
    release: i64,
    mock: i64,
    sky: i64,
) -> Result<i64, MockError> {
    let objid = check("OBJID", objid, OBJID_BITS)?;
    let brickid = check("BRICKID", brickid, BRICKID_BITS)?;
    let release = check("RELEASE", release, RELEASE_BITS)?;
    let mock = check("MOCK", mock, 1)?;
    let sky = check("SKY", sky, 1)?;
    Ok(objid
        | (brickid << BRICKID_SHIFT)
        | (release << RELEASE_SHIFT)
        | (mock << MOCK_SHIFT)
        | (sky << SKY_SHIFT))
}

/// Unpack a TARGETID
pub fn decode_targetid(targetid: i64) -> DecodedTargetId {
    let field = |shift: u32, bits: u32| (targetid >> shift) & ((1i64 << bits) - 1);
    DecodedTargetId {
        objid: field(0, OBJID_BITS),
        brickid: field(BRICKID_SHIFT, BRICKID_BITS),
        release: field(RELEASE_SHIFT, RELEASE_BITS),
        mock: field(MOCK_SHIFT, 1),
        sky: field(SKY_SHIFT, 1),
    }
}
