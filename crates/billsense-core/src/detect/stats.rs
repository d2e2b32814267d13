//! Small numeric helpers for detection

/// Calculate median of a slice
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Integer median; the even case rounds the midpoint down
pub(crate) fn median_i64(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]).div_euclid(2))
    } else {
        Some(sorted[mid])
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation divided by the mean; 0.0 when undefined
pub(crate) fn coefficient_of_variation(values: &[f64]) -> f64 {
    let avg = mean(values);
    if values.len() < 2 || avg <= 0.0 {
        return 0.0;
    }

    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt() / avg
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert_eq!(median(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[15.99, 15.99, 15.99]), 15.99);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_median_i64() {
        assert_eq!(median_i64(&[31, 29, 31, 30, 31]), Some(31));
        assert_eq!(median_i64(&[30, 31]), Some(30));
        assert_eq!(median_i64(&[]), None);
    }

    #[test]
    fn test_coefficient_of_variation() {
        assert_eq!(coefficient_of_variation(&[30.0, 30.0, 30.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[10.0]), 0.0);
        let cv = coefficient_of_variation(&[10.0, 20.0]);
        assert!((cv - 5.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(9.994, 2), 9.99);
        assert_eq!(round_to(0.123456, 4), 0.1235);
    }
}
