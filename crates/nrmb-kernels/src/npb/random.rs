//! NAS 난수 생성기.
//!
//! `x_{k+1} = a · x_k mod 2^46`을 배정밀도 부동소수점만으로 정확히 계산한다.
//! 곱을 2^23 단위로 쪼개 각 부분곱이 53비트 가수 안에 들어가게 한다.

const R23: f64 = 1.0 / 8_388_608.0; // 2^-23
const R46: f64 = R23 * R23;
const T23: f64 = 8_388_608.0; // 2^23
const T46: f64 = T23 * T23;

/// NAS 기본 곱수 (5^13)
pub const NAS_MULTIPLIER: f64 = 1_220_703_125.0;

/// `a`를 (상위 23비트, 하위 23비트)로 분리
#[inline]
fn split(a: f64) -> (f64, f64) {
    let hi = (R23 * a).trunc();
    (hi, a - T23 * hi)
}

/// `x ← a·x mod 2^46`을 계산하고 `x · 2^-46` ∈ (0, 1) 반환
#[inline]
pub fn randlc(x: &mut f64, a: f64) -> f64 {
    let (a1, a2) = split(a);
    step(x, a1, a2)
}

#[inline]
fn step(x: &mut f64, a1: f64, a2: f64) -> f64 {
    let (x1, x2) = split(*x);
    let t1 = a1 * x2 + a2 * x1;
    let t2 = (R23 * t1).trunc();
    let z = t1 - T23 * t2;
    let t3 = T23 * z + a2 * x2;
    let t4 = (R46 * t3).trunc();
    *x = t3 - T46 * t4;
    R46 * *x
}

/// `y.len()`개의 연속 난수를 `y`에 채운다. `x`는 마지막 시드로 갱신된다.
pub fn vranlc(x: &mut f64, a: f64, y: &mut [f64]) {
    let (a1, a2) = split(a);
    for slot in y.iter_mut() {
        *slot = step(x, a1, a2);
    }
}

/// 전체 난수열을 `np`개 구간으로 나눴을 때 `kn`번째 구간의 시작 시드
///
/// 구간 하나는 `ceil(nn/4 / np) · 4`개의 난수를 소비한다.
pub fn find_my_seed(kn: usize, np: usize, nn: u64, seed: f64, a: f64) -> f64 {
    if kn == 0 || np == 0 {
        return seed;
    }

    let np = np as u64;
    let mq = (nn / 4 + np - 1) / np;
    let mut kk = mq * 4 * kn as u64;

    let mut t1 = seed;
    let mut t2 = a;
    while kk > 1 {
        let ik = kk / 2;
        if 2 * ik == kk {
            let square = t2;
            randlc(&mut t2, square);
            kk = ik;
        } else {
            randlc(&mut t1, t2);
            kk -= 1;
        }
    }
    randlc(&mut t1, t2);
    t1
}
