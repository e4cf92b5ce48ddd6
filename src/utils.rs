//! Mass to charge ratio relations shared by precursor and peak types.

/// The mass of a proton, the usual charge carrier in positive mode
pub const PROTON: f64 = 1.00727646677;

/// Convert a neutral mass into an m/z at charge `z`.
///
/// A charge of zero is not meaningful here and yields `0.0` rather than
/// dividing by zero.
#[inline]
pub fn mass_charge_ratio(mass: f64, z: i32) -> f64 {
    if z == 0 {
        return 0.0;
    }
    (mass + z as f64 * PROTON) / (z.abs() as f64)
}

/// Convert an m/z at charge `z` into a neutral mass
#[inline]
pub fn neutral_mass(mz: f64, z: i32) -> f64 {
    (mz * z.abs() as f64) - z as f64 * PROTON
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mass_charge_relation() {
        let mass = 1000.0;
        let mz = mass_charge_ratio(mass, 2);
        assert!((mz - 501.00727646677).abs() < 1e-9);
        assert!((neutral_mass(mz, 2) - mass).abs() < 1e-9);

        let mz = mass_charge_ratio(mass, -2);
        assert!((neutral_mass(mz, -2) - mass).abs() < 1e-9);
    }

    #[test]
    fn test_zero_charge() {
        assert_eq!(mass_charge_ratio(1000.0, 0), 0.0);
        assert_eq!(neutral_mass(500.0, 0), 0.0);
    }
}
