//! 스케줄 평가기
//!
//! 전역 스텝 카운터를 (a) 누적 윈도우 경계의 모멘텀 감쇠 게이트와
//! (b) 구간별 선형 스케줄을 거친 게이트 학습률로 변환한다.

use super::config::TigerConfig;
use std::collections::BTreeMap;

/// 구간별 선형 함수
///
/// `{1000: 1.0, 2000: 0.1}` 형태의 스케줄은 t ∈ [0, 1000]에서 0 → 1로
/// 선형 증가, [1000, 2000]에서 1 → 0.1로 선형 감소, 이후 0.1 유지를 뜻한다.
/// `from_zero`가 참이고 0 스텝 항목이 없으면 (0, 0.0)을 앞에 붙인다.
/// 첫 구간 이전은 첫 값, 마지막 구간 이후는 마지막 값으로 고정 (외삽 없음).
pub fn piecewise_linear(t: u64, schedule: &BTreeMap<u64, f32>, from_zero: bool) -> f32 {
    debug_assert!(!schedule.is_empty());

    let mut points: Vec<(u64, f32)> = Vec::with_capacity(schedule.len() + 1);
    if from_zero && !schedule.contains_key(&0) {
        points.push((0, 0.0));
    }
    points.extend(schedule.iter().map(|(&step, &mult)| (step, mult)));

    let t = t as f32;
    let (first_step, first_mult) = points[0];
    if t <= first_step as f32 {
        return first_mult;
    }
    for pair in points.windows(2) {
        let (t0, v0) = pair[0];
        let (t1, v1) = pair[1];
        if t < t1 as f32 {
            let slope = (v1 - v0) / (t1 - t0) as f32;
            return v0 + slope * (t - t0 as f32);
        }
    }
    points[points.len() - 1].1
}

/// 스텝마다 한 번 계산되어 모든 파라미터가 읽기 전용으로 공유하는 계수들
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepCoefficients {
    /// 이 계수가 계산된 스텝
    pub t: u64,
    /// 모멘텀 감쇠 게이트: 누적 윈도우 시작에서만 β, 나머지는 1.0
    pub b1: f32,
    /// 각 마이크로 스텝 그래디언트의 기여 가중치 (1-β)/k
    pub b2: f32,
    /// 게이트 학습률: 윈도우 마지막 마이크로 스텝이 아니면 0.0
    pub lr: f32,
    /// 공유 가중치 감쇠 계수
    pub weight_decay: f32,
    /// 발산 가드 수축 비율
    pub shrink_ratio: f32,
}

impl StepCoefficients {
    /// 스텝 t의 공유 계수 계산
    pub fn evaluate(config: &TigerConfig, t: u64) -> Self {
        let k = config.grad_accum_steps;
        let b1 = if t % k == 0 { config.beta } else { 1.0 };
        let b2 = (1.0 - config.beta) / k as f32;

        let mut lr = config.learning_rate
            * piecewise_linear(t, &config.lr_schedule, config.schedule_from_zero);
        // 누적 윈도우의 마지막 마이크로 스텝에서만 갱신을 실체화
        if (t + 1) % k != 0 {
            lr = 0.0;
        }

        Self {
            t,
            b1,
            b2,
            lr,
            weight_decay: config.weight_decay,
            shrink_ratio: config.shrink_ratio,
        }
    }
}
