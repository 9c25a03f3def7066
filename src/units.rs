//! Size unit conversion
//!
//! The appliance reports volume sizes as a magnitude plus a unit label. Every
//! exported value is expressed in kibibytes, the smallest unit the appliance uses.

const MB_TO_KIB: f64 = 1024.0;
const GB_TO_KIB: f64 = 1024.0 * 1024.0;
const DEFAULT_TO_KIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Convert `size` expressed in `unit` to kibibytes
///
/// Only `"MB"` and `"GB"` are recognised. Every other label, including an
/// empty one, takes the terabyte multiplier.
pub fn to_base_units(size: f64, unit: &str) -> f64 {
    match unit {
        "MB" => size * MB_TO_KIB,
        "GB" => size * GB_TO_KIB,
        _ => size * DEFAULT_TO_KIB,
    }
}
