//! 파라미터 분류기
//!
//! 파라미터 이름에서 역할(바이어스/정규화 스케일, 임베딩, 일반 가중치)을
//! 한 번 판정하고, 역할에 따라 유효 학습률과 가중치 감쇠를 조정한다.
//! LAMB 방식으로 스텝 크기를 파라미터 자신의 크기에 비례시키되,
//! 바이어스/정규화 파라미터는 크기 스케일 없이 학습률만 절반으로 줄인다.

use anyhow::{anyhow, bail, Result};
use ndarray::{ArrayD, Axis};

/// 파라미터 역할 - 이름 기반 닫힌 3분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    /// 이름에 "bias", "beta", "gamma" 포함.
    /// `toward_one`은 "gamma" 포함 여부 — 발산 수축의 중립값이 1이 된다.
    Norm { toward_one: bool },
    /// 이름에 "embeddings" 포함 — 행 단위 RMS 스케일
    Embedding,
    /// 그 외 일반 가중치 — 전체 RMS 스케일
    Weight,
}

impl ParamRole {
    /// 이름 부분 문자열 매칭 (대소문자 구분, 첫 규칙 우선)
    pub fn from_name(name: &str) -> Self {
        if name.contains("bias") || name.contains("beta") || name.contains("gamma") {
            ParamRole::Norm {
                toward_one: name.contains("gamma"),
            }
        } else if name.contains("embeddings") {
            ParamRole::Embedding
        } else {
            ParamRole::Weight
        }
    }

    /// 발산 가드가 수축시킬 중립값 c
    pub fn shrink_target(&self) -> f32 {
        match self {
            ParamRole::Norm { toward_one: true } => 1.0,
            _ => 0.0,
        }
    }
}

/// 역할 조정을 거친 유효 학습률 - 스칼라 또는 행 단위 브로드캐스트 텐서
#[derive(Debug, Clone)]
pub enum LrScale {
    Scalar(f32),
    /// 마지막 축이 1인 텐서, 파라미터 형상으로 브로드캐스트된다
    Broadcast(ArrayD<f32>),
}

/// 전체 원소에 대한 RMS = sqrt(mean(x²)). f64로 누적해 정밀도 확보.
pub fn root_mean_square(x: &ArrayD<f32>) -> f32 {
    if x.is_empty() {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for &v in x.iter() {
        acc += (v as f64) * (v as f64);
    }
    ((acc / x.len() as f64).sqrt()) as f32
}

/// 마지막 축으로 줄인 RMS, 브로드캐스트를 위해 그 축을 크기 1로 유지
pub fn root_mean_square_keepdim_last(x: &ArrayD<f32>) -> Result<ArrayD<f32>> {
    if x.ndim() == 0 {
        bail!("cannot reduce a 0-d tensor over its last axis");
    }
    let last = Axis(x.ndim() - 1);
    let mean = x
        .mapv(|v| v * v)
        .mean_axis(last)
        .ok_or_else(|| anyhow!("cannot compute RMS over an empty axis"))?;
    Ok(mean.mapv(f32::sqrt).insert_axis(last))
}

/// 역할에 따라 조정된 (유효 학습률, 유효 가중치 감쇠) 계산
pub fn effective_coefficients(
    role: ParamRole,
    lr: f32,
    weight_decay: f32,
    value: &ArrayD<f32>,
) -> Result<(LrScale, f32)> {
    match role {
        // 바이어스/정규화: 크기 스케일 없이 학습률 절반, 감쇠 비활성
        ParamRole::Norm { .. } => Ok((LrScale::Scalar(lr * 0.5), 0.0)),
        // 임베딩: 행마다 독립적인 어휘 벡터이므로 행 단위 RMS
        ParamRole::Embedding => {
            if value.is_empty() {
                bail!("embedding parameter is empty");
            }
            let rms = root_mean_square_keepdim_last(value)?;
            Ok((LrScale::Broadcast(rms.mapv(|r| r * lr)), weight_decay))
        }
        // 일반 가중치: 전체 RMS 스칼라
        ParamRole::Weight => Ok((LrScale::Scalar(lr * root_mean_square(value)), weight_decay)),
    }
}
