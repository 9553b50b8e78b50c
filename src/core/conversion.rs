/// 攝氏與絕對零度的差
pub const KELVIN_OFFSET: f64 = 273.15;

/// 攝氏轉克氏，四捨五入到小數第一位。
///
/// 使用 `f64::round`，剛好在 .5 時遠離零進位。
pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    round_to_precision(celsius + KELVIN_OFFSET, 1)
}

pub fn round_to_precision(value: f64, precision: i32) -> f64 {
    let factor = 10f64.powi(precision);
    (value * factor).round() / factor
}
