//! 부동소수점 결과 검증.
//!
//! 두 값의 차이를 두 값 중 큰 절대값에 대한 상대 오차로 비교한다.
//! `0 == 0`은 항상 통과한다.

/// `significant_bits` 비트 정밀도로 상대 오차 비교
///
/// `|ref - val| <= max(|ref|, |val|) * EPSILON * (2^bits - 1)`.
/// `2^bits`는 부동소수점으로 계산하므로 큰 비트 수에도 overflow가 없다.
pub fn check_relative(reference: f64, value: f64, significant_bits: u32) -> bool {
    let bits = i32::try_from(significant_bits).unwrap_or(i32::MAX);
    let epsilon = f64::EPSILON * (2f64.powi(bits) - 1.0);
    check_precision(reference, value, epsilon)
}

/// 명시적 epsilon으로 상대 오차 비교
///
/// `|ref - val| <= max(|ref|, |val|) * epsilon`.
pub fn check_precision(reference: f64, value: f64, epsilon: f64) -> bool {
    if reference == value {
        return true;
    }
    let diff = (reference - value).abs();
    let largest = reference.abs().max(value.abs());
    diff <= largest * epsilon
}

/// 슬라이스 전체를 인덱스별 기대값과 비교
///
/// 첫 불일치 인덱스를 반환한다. 모두 통과하면 `None`.
pub fn check_all_relative<F>(values: &[f64], significant_bits: u32, expected: F) -> Option<usize>
where
    F: Fn(usize) -> f64,
{
    values
        .iter()
        .enumerate()
        .find(|&(i, &v)| !check_relative(expected(i), v, significant_bits))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_equals_zero() {
        assert!(check_precision(0.0, 0.0, 0.0));
        assert!(check_precision(0.0, 0.0, 1e-8));
        assert!(check_relative(0.0, 0.0, 0));
    }

    #[test]
    fn identical_values_pass_any_bits() {
        for x in [1.0, -3.5, 1e300, 6.02e23, f64::MIN_POSITIVE] {
            for bits in [0, 1, 2, 24, 52] {
                assert!(check_relative(x, x, bits), "x={x} bits={bits}");
            }
        }
    }

    #[test]
    fn close_values_within_24_bits() {
        assert!(check_relative(100.0, 100.0000001, 24));
    }

    #[test]
    fn distant_values_fail_with_2_bits() {
        assert!(!check_relative(100.0, 101.0, 2));
    }

    #[test]
    fn huge_bit_count_does_not_overflow() {
        assert!(check_relative(1.0, 2.0, 1000));
        assert!(check_relative(1.0, 2.0, u32::MAX));
    }

    #[test]
    fn precision_is_symmetric() {
        assert_eq!(
            check_precision(10.0, 10.5, 0.04),
            check_precision(10.5, 10.0, 0.04)
        );
        assert!(check_precision(10.0, 10.5, 0.05));
        assert!(!check_precision(10.0, 10.5, 0.04));
    }

    #[test]
    fn slice_check_reports_first_mismatch() {
        let values = [1.0, 2.0, 3.5, 4.0];
        assert_eq!(check_all_relative(&values, 2, |i| (i + 1) as f64), Some(2));
        assert_eq!(check_all_relative(&values[..2], 2, |i| (i + 1) as f64), None);
    }
}
