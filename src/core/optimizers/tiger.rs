//! Tiger 업데이트 커널
//!
//! sign-momentum + 분리형 가중치 감쇠 갱신과 NaN 발산 가드.
//! 파라미터마다 같은 형상의 모멘텀 슬롯 하나만 유지하며,
//! 스텝별 갱신은 (var, m, g, 공유 계수)만으로 결정되는 무기억 전이다.

use anyhow::{bail, Result};
use ndarray::{ArrayD, Axis};
use rayon::prelude::*;

use super::classifier::{effective_coefficients, LrScale, ParamRole};
use super::config::TigerConfig;
use super::schedule::StepCoefficients;

/// 스텝마다 외부에서 공급되는 일회성 그래디언트
#[derive(Debug, Clone)]
pub enum Gradient {
    /// 파라미터와 같은 형상의 밀집 텐서
    Dense(ArrayD<f32>),
    /// 첫 축의 행 단위 희소 갱신: values의 i번째 행이 indices[i] 행에 누적된다
    Sparse {
        indices: Vec<usize>,
        values: ArrayD<f32>,
    },
}

impl Gradient {
    /// NaN/Inf 원소 존재 여부
    fn has_non_finite(&self) -> bool {
        match self {
            Gradient::Dense(g) => g.iter().any(|v| !v.is_finite()),
            Gradient::Sparse { values, .. } => values.iter().any(|v| !v.is_finite()),
        }
    }
}

/// 등록된 파라미터 - 값, 모멘텀 슬롯, 이름에서 한 번 계산한 역할
///
/// 슬롯은 등록 시 0으로 초기화되며 값과 형상이 항상 같다.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub value: ArrayD<f32>,
    pub momentum: ArrayD<f32>,
    pub role: ParamRole,
}

impl Parameter {
    /// 파라미터 등록: 같은 형상의 0 모멘텀 슬롯 생성 + 역할 분류
    pub fn new(name: impl Into<String>, value: ArrayD<f32>) -> Self {
        let name = name.into();
        let role = ParamRole::from_name(&name);
        let momentum = ArrayD::zeros(value.raw_dim());
        Self {
            name,
            value,
            momentum,
            role,
        }
    }
}

/// Tiger 옵티마이저
///
/// 구성과 전역 스텝 카운터만 소유한다. 카운터는 `step` 호출마다 정확히
/// 한 번 증가하며, 한 스텝 안의 모든 파라미터는 같은 값을 관측한다.
#[derive(Debug, Clone)]
pub struct TigerOptimizer {
    config: TigerConfig,
    iterations: u64,
}

impl TigerOptimizer {
    /// 구성을 검증하고 옵티마이저 생성. 잘못된 구성은 즉시 실패.
    pub fn new(config: TigerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            iterations: 0,
        })
    }

    /// 현재 스텝 카운터
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// 체크포인트용 구성 스냅샷 (모멘텀 슬롯은 런타임이 따로 복원)
    pub fn get_config(&self) -> &TigerConfig {
        &self.config
    }

    /// 현재 스텝의 공유 계수
    pub fn coefficients(&self) -> StepCoefficients {
        StepCoefficients::evaluate(&self.config, self.iterations)
    }

    /// 파라미터 하나 갱신. 갱신된 값을 반환한다 (로깅/합성용).
    ///
    /// NaN/Inf 그래디언트는 오류가 아니라 발산 가드로 처리된다:
    /// 모멘텀 감쇠를 동결하고 그래디언트를 0으로 대체한 뒤,
    /// 파라미터를 중립값 c로 지수 수축시킨다.
    pub fn apply_update<'a>(
        &self,
        coeffs: &StepCoefficients,
        param: &'a mut Parameter,
        grad: &Gradient,
    ) -> Result<&'a ArrayD<f32>> {
        check_shapes(param, grad)?;

        let is_nan = grad.has_non_finite();
        // 가드: 쓰레기 갱신으로 모멘텀을 오염시키지 않도록 감쇠 동결
        let b1 = if is_nan { 1.0 } else { coeffs.b1 };
        let b2 = coeffs.b2;

        // 모멘텀 슬롯 갱신
        match grad {
            Gradient::Dense(g) => {
                if is_nan {
                    // g가 0으로 대체되므로 감쇠 항만 남는다 (b1 = 1 → 변화 없음)
                    param.momentum.mapv_inplace(|m| m * b1);
                } else {
                    param.momentum.zip_mut_with(g, |m, &g| *m = b1 * *m + b2 * g);
                }
            }
            Gradient::Sparse { indices, values } => {
                // 감쇠가 먼저 전체에 반영된 뒤에야 행 단위 누적이 보인다
                param.momentum.mapv_inplace(|m| m * b1);
                if !is_nan {
                    for (&idx, row) in indices.iter().zip(values.outer_iter()) {
                        let mut slot_row = param.momentum.index_axis_mut(Axis(0), idx);
                        slot_row.zip_mut_with(&row, |m, &g| *m += b2 * g);
                    }
                }
            }
        }

        if is_nan {
            // 발산 복구: u 대신 중립값 c를 향해 지수 수축
            let c = param.role.shrink_target();
            let s = coeffs.shrink_ratio;
            param.value.mapv_inplace(|v| (v - c) * s + c);
            return Ok(&param.value);
        }

        // 후보 갱신 u = (sign(m) + decay*var) * lr
        let (lr, decay) =
            effective_coefficients(param.role, coeffs.lr, coeffs.weight_decay, &param.value)?;
        match lr {
            LrScale::Scalar(lr) => {
                param
                    .value
                    .zip_mut_with(&param.momentum, |v, &m| *v -= (sign(m) + decay * *v) * lr);
            }
            LrScale::Broadcast(lr_rows) => {
                let mut u = param.momentum.mapv(sign);
                if decay != 0.0 {
                    u.zip_mut_with(&param.value, |u, &v| *u += decay * v);
                }
                let u = &u * &lr_rows;
                param.value -= &u;
            }
        }
        Ok(&param.value)
    }

    /// 한 논리 스텝 실행: 공유 계수를 한 번 계산해 모든 파라미터에
    /// 적용하고, 카운터를 정확히 한 번 증가시킨다.
    ///
    /// 파라미터 갱신은 서로 독립이므로 `enable_parallel`이면 rayon으로
    /// 병렬 적용한다. 형상 불일치 같은 계약 위반은 오류로 전파된다.
    pub fn step(&mut self, params: &mut [Parameter], grads: &[Gradient]) -> Result<()> {
        if params.len() != grads.len() {
            bail!(
                "parameter/gradient count mismatch: {} vs {}",
                params.len(),
                grads.len()
            );
        }

        let coeffs = self.coefficients();
        if self.config.enable_parallel {
            params
                .par_iter_mut()
                .zip(grads.par_iter())
                .try_for_each(|(param, grad)| self.apply_update(&coeffs, param, grad).map(|_| ()))?;
        } else {
            for (param, grad) in params.iter_mut().zip(grads.iter()) {
                self.apply_update(&coeffs, param, grad)?;
            }
        }

        self.iterations += 1;
        Ok(())
    }
}

/// 원소별 부호: -1/0/+1 (정확히 0일 때만 0)
#[inline]
fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// 그래디언트/슬롯/파라미터 형상 계약 검사. 위반은 외부 런타임의
/// 계약 위반이므로 복구하지 않고 오류로 전파한다.
fn check_shapes(param: &Parameter, grad: &Gradient) -> Result<()> {
    if param.momentum.shape() != param.value.shape() {
        bail!(
            "momentum slot shape {:?} does not match parameter '{}' shape {:?}",
            param.momentum.shape(),
            param.name,
            param.value.shape()
        );
    }
    match grad {
        Gradient::Dense(g) => {
            if g.shape() != param.value.shape() {
                bail!(
                    "dense gradient shape {:?} does not match parameter '{}' shape {:?}",
                    g.shape(),
                    param.name,
                    param.value.shape()
                );
            }
        }
        Gradient::Sparse { indices, values } => {
            if param.value.ndim() == 0 {
                bail!("sparse update requires at least a 1-d parameter: '{}'", param.name);
            }
            if values.ndim() != param.value.ndim() {
                bail!(
                    "sparse values rank {} does not match parameter '{}' rank {}",
                    values.ndim(),
                    param.name,
                    param.value.ndim()
                );
            }
            if values.shape()[0] != indices.len() {
                bail!(
                    "sparse row count {} does not match index count {}",
                    values.shape()[0],
                    indices.len()
                );
            }
            if values.shape()[1..] != param.value.shape()[1..] {
                bail!(
                    "sparse row shape {:?} does not match parameter '{}' row shape {:?}",
                    &values.shape()[1..],
                    param.name,
                    &param.value.shape()[1..]
                );
            }
            let rows = param.value.shape()[0];
            if let Some(&bad) = indices.iter().find(|&&idx| idx >= rows) {
                bail!(
                    "sparse index {} out of range for parameter '{}' with {} rows",
                    bad,
                    param.name,
                    rows
                );
            }
        }
    }
    Ok(())
}
