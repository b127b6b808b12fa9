//! Tiger 옵티마이저 구성
//!
//! 구성은 옵티마이저 수명 동안 불변이며, 생성 시점에 전체 검증한다.
//! 모멘텀 슬롯은 런타임이 따로 복원하므로 스냅샷에는 파생 상태가 없다.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tiger 옵티마이저 전체 구성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TigerConfig {
    /// 기본 학습률 (> 0)
    pub learning_rate: f32,
    /// 모멘텀 계수 β (0 < β < 1, beta1 = beta2 통합)
    pub beta: f32,
    /// 분리형(decoupled) 가중치 감쇠 계수 (≥ 0)
    pub weight_decay: f32,
    /// 그래디언트 누적 윈도우 크기 k (≥ 1)
    pub grad_accum_steps: u64,
    /// 구간별 선형 학습률 스케줄: 스텝 → 배율 (최소 1개 항목)
    pub lr_schedule: BTreeMap<u64, f32>,
    /// 스케줄에 0 스텝 항목이 없으면 (0, 0.0)을 암시적으로 추가할지 여부
    pub schedule_from_zero: bool,
    /// 발산 가드의 수축 비율 s (0 < s < 1)
    pub shrink_ratio: f32,
    /// 파라미터 간 병렬 갱신 활성화 (rayon)
    pub enable_parallel: bool,
}

impl Default for TigerConfig {
    fn default() -> Self {
        let mut lr_schedule = BTreeMap::new();
        lr_schedule.insert(0, 1.0);
        Self {
            learning_rate: 1e-3,
            beta: 0.965,
            weight_decay: 0.01,
            grad_accum_steps: 1,
            lr_schedule,
            schedule_from_zero: true,
            shrink_ratio: 0.99,
            enable_parallel: true,
        }
    }
}

impl TigerConfig {
    /// 새 구성 생성 (기본값)
    pub fn new() -> Self {
        Self::default()
    }

    /// 학습률 설정
    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    /// 모멘텀 계수 설정
    pub fn with_beta(mut self, beta: f32) -> Self {
        self.beta = beta;
        self
    }

    /// 가중치 감쇠 설정
    pub fn with_weight_decay(mut self, decay: f32) -> Self {
        self.weight_decay = decay;
        self
    }

    /// 그래디언트 누적 윈도우 설정
    pub fn with_grad_accum_steps(mut self, k: u64) -> Self {
        self.grad_accum_steps = k;
        self
    }

    /// 학습률 스케줄 설정
    pub fn with_lr_schedule(mut self, schedule: impl IntoIterator<Item = (u64, f32)>) -> Self {
        self.lr_schedule = schedule.into_iter().collect();
        self
    }

    /// 암시적 영점 시작 여부 설정
    pub fn with_schedule_from_zero(mut self, from_zero: bool) -> Self {
        self.schedule_from_zero = from_zero;
        self
    }

    /// 수축 비율 설정
    pub fn with_shrink_ratio(mut self, ratio: f32) -> Self {
        self.shrink_ratio = ratio;
        self
    }

    /// 병렬 갱신 여부 설정
    pub fn with_parallel(mut self, enable: bool) -> Self {
        self.enable_parallel = enable;
        self
    }

    /// 구성 전체 검증. 잘못된 값은 보정하지 않고 즉시 실패한다.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0) || !self.learning_rate.is_finite() {
            bail!("learning_rate must be positive and finite: {}", self.learning_rate);
        }
        if !(self.beta > 0.0 && self.beta < 1.0) {
            bail!("beta must be in (0, 1): {}", self.beta);
        }
        if !(self.weight_decay >= 0.0) || !self.weight_decay.is_finite() {
            bail!("weight_decay must be non-negative and finite: {}", self.weight_decay);
        }
        if self.grad_accum_steps < 1 {
            bail!("grad_accum_steps must be at least 1");
        }
        if self.lr_schedule.is_empty() {
            bail!("lr_schedule must contain at least one entry");
        }
        for (&step, &mult) in &self.lr_schedule {
            if !(mult >= 0.0) || !mult.is_finite() {
                bail!(
                    "lr_schedule multiplier at step {} must be non-negative and finite: {}",
                    step,
                    mult
                );
            }
        }
        if !(self.shrink_ratio > 0.0 && self.shrink_ratio < 1.0) {
            bail!("shrink_ratio must be in (0, 1): {}", self.shrink_ratio);
        }
        Ok(())
    }
}
