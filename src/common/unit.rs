//! Unit conversion utilities.
//!
//! Slide geometry is configured in inches and points but stored in EMUs
//! (English Metric Units) inside the package. Layout maths stays in `f64`
//! inches; conversion to integer EMUs happens once, when XML is written.

pub const EMUS_PER_INCH: i64 = 914_400;
pub const EMUS_PER_PT: i64 = 12_700;
/// DrawingML stores font sizes and paragraph spacing in hundredths of a point.
pub const CENTIPOINTS_PER_PT: f64 = 100.0;

#[inline]
pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMUS_PER_INCH as f64).round() as i64
}

#[inline]
pub fn emu_to_inches(emu: i64) -> f64 {
    emu as f64 / EMUS_PER_INCH as f64
}

#[inline]
pub fn pt_to_emu_f64(pt: f64) -> i64 {
    (pt * EMUS_PER_PT as f64) as i64
}

#[inline]
pub fn emu_to_pt_f64(emu: i64) -> f64 {
    emu as f64 / EMUS_PER_PT as f64
}

/// Convert points to the `sz`/`spcPts` representation (1/100 pt).
#[inline]
pub fn pt_to_centipoints(pt: f64) -> u32 {
    (pt.max(0.0) * CENTIPOINTS_PER_PT).round() as u32
}

/// Convert a `sz`/`spcPts` attribute value back to points.
#[inline]
pub fn centipoints_to_pt(centipoints: u32) -> f64 {
    centipoints as f64 / CENTIPOINTS_PER_PT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inches_round_trip() {
        assert_eq!(inches_to_emu(1.0), 914_400);
        assert_eq!(inches_to_emu(7.5), 6_858_000);
        assert!((emu_to_inches(9_144_000) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_points() {
        assert_eq!(pt_to_emu_f64(1.0), 12_700);
        assert!((emu_to_pt_f64(12_700 * 14) - 14.0).abs() < 1e-9);
        assert_eq!(pt_to_centipoints(14.0), 1400);
        assert_eq!(pt_to_centipoints(10.5), 1050);
        assert_eq!(pt_to_centipoints(-3.0), 0);
        assert!((centipoints_to_pt(1800) - 18.0).abs() < 1e-9);
    }
}
