//! Target bitmask definitions.
//!
//! Each mask is a module of named single-bit `i64` constants plus a `BITS`
//! table used to decode a value back into names.

macro_rules! define_mask {
    ($(#[$meta:meta])* $module:ident { $($(#[$bit_meta:meta])* $name:ident = $bit:expr),+ $(,)? }) => {
        $(#[$meta])*
        pub mod $module {
            $(
                $(#[$bit_meta])*
                pub const $name: i64 = 1 << $bit;
            )+

            /// `(name, value)` for every defined bit, in bit order
            pub const BITS: &[(&str, i64)] = &[$((stringify!($name), $name)),+];

            /// Value of a bit by name
            pub fn mask(name: &str) -> Option<i64> {
                BITS.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
            }

            /// Names of the bits set in `value`
            pub fn names(value: i64) -> Vec<&'static str> {
                BITS.iter()
                    .filter(|(_, v)| value & v != 0)
                    .map(|(n, _)| *n)
                    .collect()
            }
        }
    };
}

define_mask!(
    /// Primary dark-time survey mask (`DESI_TARGET`)
    desi_mask {
        /// Luminous red galaxy
        LRG = 0,
        /// Emission line galaxy
        ELG = 1,
        /// Quasar
        QSO = 2,
        /// LRG observed in one pass
        LRG_1PASS = 3,
        /// LRG observed in two passes
        LRG_2PASS = 4,
        /// LRG, north photometry
        LRG_NORTH = 8,
        /// ELG, north photometry
        ELG_NORTH = 9,
        /// QSO, north photometry
        QSO_NORTH = 10,
        /// One-pass LRG, north photometry
        LRG_1PASS_NORTH = 11,
        /// Two-pass LRG, north photometry
        LRG_2PASS_NORTH = 12,
        /// LRG, south photometry
        LRG_SOUTH = 16,
        /// ELG, south photometry
        ELG_SOUTH = 17,
        /// QSO, south photometry
        QSO_SOUTH = 18,
        /// One-pass LRG, south photometry
        LRG_1PASS_SOUTH = 19,
        /// Two-pass LRG, south photometry
        LRG_2PASS_SOUTH = 20,
        /// Blank sky fibre
        SKY = 32,
        /// Faint standard star
        STD_FAINT = 33,
        /// White dwarf standard
        STD_WD = 34,
        /// Bright standard star
        STD_BRIGHT = 35,
        /// Any bright galaxy survey target
        BGS_ANY = 60,
        /// Any Milky Way survey target
        MWS_ANY = 61,
    }
);

define_mask!(
    /// Bright galaxy survey mask (`BGS_TARGET`)
    bgs_mask {
        /// Faint BGS
        BGS_FAINT = 0,
        /// Bright BGS
        BGS_BRIGHT = 1,
        /// Faint BGS, north photometry
        BGS_FAINT_NORTH = 8,
        /// Bright BGS, north photometry
        BGS_BRIGHT_NORTH = 9,
        /// Faint BGS, south photometry
        BGS_FAINT_SOUTH = 16,
        /// Bright BGS, south photometry
        BGS_BRIGHT_SOUTH = 17,
    }
);

define_mask!(
    /// Milky Way survey mask (`MWS_TARGET`)
    mws_mask {
        /// Main sample
        MWS_MAIN = 0,
        /// White dwarf
        MWS_WD = 1,
        /// Within 100 pc
        MWS_NEARBY = 2,
        /// Main sample, north photometry
        MWS_MAIN_NORTH = 4,
        /// Main sample, south photometry
        MWS_MAIN_SOUTH = 5,
        /// Blue main-sample star
        MWS_MAIN_BLUE = 8,
        /// Blue main-sample star, north photometry
        MWS_MAIN_BLUE_NORTH = 9,
        /// Blue main-sample star, south photometry
        MWS_MAIN_BLUE_SOUTH = 10,
        /// Red main-sample star
        MWS_MAIN_RED = 11,
        /// Red main-sample star, north photometry
        MWS_MAIN_RED_NORTH = 12,
        /// Red main-sample star, south photometry
        MWS_MAIN_RED_SOUTH = 13,
    }
);

define_mask!(
    /// Contamination mask (`CONTAM_TARGET`)
    contam_mask {
        /// Star selected as BGS
        BGS_IS_STAR = 0,
        /// Galaxy of another class selected as BGS
        BGS_IS_GALAXY = 1,
        /// Star selected as ELG
        ELG_IS_STAR = 2,
        /// Galaxy of another class selected as ELG
        ELG_IS_GALAXY = 3,
        /// Quasar selected as ELG
        ELG_IS_QSO = 4,
        /// Star selected as LRG
        LRG_IS_STAR = 5,
        /// Galaxy of another class selected as LRG
        LRG_IS_GALAXY = 6,
        /// Star selected as QSO
        QSO_IS_STAR = 7,
        /// Galaxy selected as QSO
        QSO_IS_GALAXY = 8,
        /// Any BGS contaminant
        BGS_CONTAM = 16,
        /// Any ELG contaminant
        ELG_CONTAM = 17,
        /// Any LRG contaminant
        LRG_CONTAM = 18,
        /// Any QSO contaminant
        QSO_CONTAM = 19,
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_values() {
        assert_eq!(desi_mask::LRG, 1);
        assert_eq!(desi_mask::SKY, 1 << 32);
        assert_eq!(desi_mask::MWS_ANY, 1 << 61);
        assert_eq!(bgs_mask::BGS_BRIGHT_SOUTH, 1 << 17);
        assert_eq!(mws_mask::MWS_MAIN_RED_SOUTH, 1 << 13);
        assert_eq!(contam_mask::QSO_CONTAM, 1 << 19);
    }

    #[test]
    fn test_names_roundtrip() {
        let value = desi_mask::QSO | desi_mask::QSO_SOUTH | desi_mask::STD_WD;
        assert_eq!(desi_mask::names(value), vec!["QSO", "QSO_SOUTH", "STD_WD"]);
        assert_eq!(desi_mask::mask("STD_WD"), Some(desi_mask::STD_WD));
        assert_eq!(mws_mask::mask("NOPE"), None);
    }
}
